//! Search nodes and the ancestor chain used for path reconstruction.
//!
//! A node is created by the problem as a bare candidate (no predecessor).
//! The search links it to its parent exactly once, when the candidate is
//! pushed onto the active path, and from then on the node is shared
//! read-only behind an [`Arc`].

use std::sync::Arc;

/// A state on a search path.
#[derive(Debug)]
pub struct Node<F, S> {
    step: S,
    level: usize,
    factor: F,
    previous: Option<Arc<Node<F, S>>>,
}

impl<F, S> Node<F, S> {
    /// Create an unlinked candidate node.
    pub fn new(step: S, level: usize, factor: F) -> Self {
        Self {
            step,
            level,
            factor,
            previous: None,
        }
    }

    /// The state this node represents
    pub fn step(&self) -> &S {
        &self.step
    }

    /// Depth from the root (root = 0)
    pub fn level(&self) -> usize {
        self.level
    }

    /// Ordering key, usually cost so far plus the heuristic estimate
    pub fn factor(&self) -> &F {
        &self.factor
    }

    /// Parent on the path this node was reached by
    pub fn previous(&self) -> Option<&Arc<Node<F, S>>> {
        self.previous.as_ref()
    }

    /// Link this candidate under `parent` and freeze it.
    pub fn linked_to(mut self, parent: &Arc<Node<F, S>>) -> Arc<Self> {
        self.previous = Some(Arc::clone(parent));
        Arc::new(self)
    }

    /// Iterate from this node back to the root.
    pub fn ancestors(&self) -> Ancestors<'_, F, S> {
        Ancestors { next: Some(self) }
    }

    /// Nodes from the root to this node.
    pub fn path(&self) -> Vec<&Node<F, S>> {
        let mut path: Vec<&Node<F, S>> = self.ancestors().collect();
        path.reverse();
        path
    }

    /// Steps from the root to this node.
    pub fn steps(&self) -> Vec<S>
    where
        S: Clone,
    {
        self.path().into_iter().map(|n| n.step.clone()).collect()
    }
}

impl<F, S> Drop for Node<F, S> {
    // Unwind uniquely owned ancestors in a loop so deep chains don't
    // overflow the stack through recursive drops.
    fn drop(&mut self) {
        let mut previous = self.previous.take();
        while let Some(parent) = previous {
            match Arc::try_unwrap(parent) {
                Ok(mut node) => previous = node.previous.take(),
                Err(_) => break,
            }
        }
    }
}

/// Iterator over a node and its predecessors, terminal node first.
pub struct Ancestors<'a, F, S> {
    next: Option<&'a Node<F, S>>,
}

impl<'a, F, S> Iterator for Ancestors<'a, F, S> {
    type Item = &'a Node<F, S>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.previous.as_deref();
        Some(node)
    }
}
