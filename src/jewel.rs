//! Landed jewel entities. The grid only knows colours; these carry the
//! per-jewel animation state the presentation layer reads.

use crate::board::Pos;
use crate::piece::Piece;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationKind {
    /// Matched jewel blinking before deletion.
    Flash,
    /// Jewel vanishing in the end-of-life mass clear.
    Shrink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Animation {
    pub kind: AnimationKind,
    /// Effects ticks since the animation started.
    pub frame: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jewel {
    pub pos: Pos,
    pub piece: Piece,
    pub animation: Option<Animation>,
}

impl Jewel {
    pub fn new(piece: Piece, pos: Pos) -> Self {
        Self {
            pos,
            piece,
            animation: None,
        }
    }

    pub fn color(&self) -> Option<u8> {
        match self.piece {
            Piece::Color(c) => Some(c),
            Piece::Wild => None,
        }
    }
}

/// Every jewel that has left the falling block and not yet been cleared.
#[derive(Debug, Clone, Default)]
pub struct JewelList {
    jewels: Vec<Jewel>,
}

impl JewelList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, jewel: Jewel) {
        self.jewels.push(jewel);
    }

    pub fn len(&self) -> usize {
        self.jewels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jewels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Jewel> {
        self.jewels.iter()
    }

    pub fn find(&self, pos: Pos) -> Option<&Jewel> {
        self.jewels.iter().find(|j| j.pos == pos)
    }

    pub fn find_mut(&mut self, pos: Pos) -> Option<&mut Jewel> {
        self.jewels.iter_mut().find(|j| j.pos == pos)
    }

    pub fn remove(&mut self, pos: Pos) -> Option<Jewel> {
        let i = self.jewels.iter().position(|j| j.pos == pos)?;
        Some(self.jewels.swap_remove(i))
    }

    pub fn clear(&mut self) {
        self.jewels.clear();
    }

    /// Advance every running animation by one effects tick.
    pub fn animate(&mut self) {
        for animation in self.jewels.iter_mut().filter_map(|j| j.animation.as_mut()) {
            animation.frame = animation.frame.wrapping_add(1);
        }
    }

    pub fn animating(&self) -> impl Iterator<Item = &Jewel> {
        self.jewels.iter().filter(|j| j.animation.is_some())
    }
}
