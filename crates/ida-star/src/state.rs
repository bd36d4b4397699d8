//! Search state passed between the bounded search and the driver, and the
//! observer interface used by the observable variant.

use std::sync::Arc;

use serde::Serialize;

use crate::node::Node;

/// Tag of an [`AlgorithmState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmFlag {
    Found,
    NotFound,
    InProgress,
}

/// Outcome of one bounded search (or of the whole run, when reported to an
/// observer).
#[derive(Debug)]
pub enum AlgorithmState<F, S> {
    /// The goal node
    Found(Arc<Node<F, S>>),
    /// Nothing within the bound and nothing pruned beyond it
    NotFound(Option<Arc<Node<F, S>>>),
    /// The minimal node that exceeded the bound
    InProgress(Arc<Node<F, S>>),
}

impl<F, S> AlgorithmState<F, S> {
    pub fn flag(&self) -> AlgorithmFlag {
        match self {
            AlgorithmState::Found(_) => AlgorithmFlag::Found,
            AlgorithmState::NotFound(_) => AlgorithmFlag::NotFound,
            AlgorithmState::InProgress(_) => AlgorithmFlag::InProgress,
        }
    }

    pub fn node(&self) -> Option<&Arc<Node<F, S>>> {
        match self {
            AlgorithmState::Found(node) | AlgorithmState::InProgress(node) => Some(node),
            AlgorithmState::NotFound(node) => node.as_ref(),
        }
    }

    pub fn into_node(self) -> Option<Arc<Node<F, S>>> {
        match self {
            AlgorithmState::Found(node) | AlgorithmState::InProgress(node) => Some(node),
            AlgorithmState::NotFound(node) => node,
        }
    }
}

impl<F, S> Clone for AlgorithmState<F, S> {
    fn clone(&self) -> Self {
        match self {
            AlgorithmState::Found(node) => AlgorithmState::Found(Arc::clone(node)),
            AlgorithmState::NotFound(node) => AlgorithmState::NotFound(node.clone()),
            AlgorithmState::InProgress(node) => AlgorithmState::InProgress(Arc::clone(node)),
        }
    }
}

/// Receives progress snapshots from an observed search.
///
/// Called synchronously on the searching thread: once for every iteration
/// that ends in progress, then exactly once with the final `Found` or
/// `NotFound` state.
pub trait Progress<F, S> {
    fn report(&mut self, state: &AlgorithmState<F, S>);
}

impl<F, S, T> Progress<F, S> for T
where
    T: FnMut(&AlgorithmState<F, S>),
{
    fn report(&mut self, state: &AlgorithmState<F, S>) {
        self(state)
    }
}
