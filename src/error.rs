//! Engine failures. All of them are programming errors (board/entity desync or a
//! violated precondition); the only expected failure path of play, a full board,
//! is a game state and never shows up here.

use crate::board::Pos;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("no jewel entity at {0}")]
    MissingJewel(Pos),
    #[error("grid holds {found:?} at {pos} but the jewel entity has colour {expected}")]
    Desync {
        pos: Pos,
        expected: u8,
        found: Option<u8>,
    },
    #[error("{0} jewel entities do not correspond to a grid cell")]
    Orphans(usize),
    #[error("a clear-set is already waiting for deletion")]
    ClearInFlight,
    #[error("delayed task fired with no clear-set in flight")]
    NothingInFlight,
    #[error("spawn cell {0} is occupied")]
    SpawnBlocked(Pos),
}
