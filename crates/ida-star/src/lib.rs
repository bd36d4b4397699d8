//! Iterative deepening A* search.
//!
//! This crate finds a least-cost path from a start step to a goal step with
//! a series of cost-bounded depth-first searches, so memory stays
//! proportional to the path depth instead of the number of explored states.
//! Problems plug in through [`SearchProblem`]; two ready-made problem types
//! ([`maze::Maze`] and [`graph::Graph`]) load from JSON.

pub mod algorithm;
pub mod error;
pub mod graph;
pub mod maze;
pub mod node;
pub mod problem;
pub mod search;
pub mod state;

// Re-export main types
pub use algorithm::{Algorithm, IterativeDeepeningAStar, ObservableAlgorithm};
pub use error::ProblemError;
pub use node::Node;
pub use problem::SearchProblem;
pub use search::{
    find_path, find_path_observed, search, search_observed, SearchConfig, SearchOutcome,
    SearchResult, VisitedScope, MAX_ITERATIONS,
};
pub use state::{AlgorithmFlag, AlgorithmState, Progress};
