//! Errors raised while loading problem definitions.
//!
//! The search itself has no failure modes: running out of bound or
//! iterations is reported through [`crate::search::SearchOutcome`].

use thiserror::Error;

/// Failure to build a problem from its JSON description
#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("maze grid is empty")]
    EmptyGrid,

    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("invalid tile {tile:?} at row {row}, column {col}")]
    InvalidTile { tile: char, row: usize, col: usize },

    #[error("maze has no start tile 'S'")]
    MissingStart,

    #[error("maze has no goal tile 'G'")]
    MissingGoal,

    #[error("second {marker:?} tile at row {row}, column {col}")]
    DuplicateMarker { marker: char, row: usize, col: usize },

    #[error("heuristic names unknown vertex {0:?}")]
    UnknownVertex(String),
}

pub type Result<T> = std::result::Result<T, ProblemError>;
