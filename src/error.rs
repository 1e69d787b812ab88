//! Error types

use thiserror::Error;

use crate::simulation::SimulationState;

/// Crate result type
pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable failures of the engine and of level resolution.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no source tile on the board")]
    NoSource,

    #[error("only a single source is supported, found {count}")]
    MultipleSources { count: usize },

    #[error("source emission is not normalized (total probability {probability})")]
    EmissionNotNormalized { probability: f64 },

    #[error("{operation} not allowed in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SimulationState,
    },

    #[error("unknown element: {0}")]
    UnknownElement(String),

    #[error("tile ({i}, {j}) outside of {width}x{height} board")]
    TileOutOfBounds {
        i: usize,
        j: usize,
        width: usize,
        height: usize,
    },

    #[error("rotation {rotation} out of range for {element} (max {max})")]
    InvalidRotation {
        element: String,
        rotation: usize,
        max: usize,
    },

    #[error("level json: {0}")]
    Json(#[from] serde_json::Error),
}
