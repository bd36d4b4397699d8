//! The problem-definition seam consumed by the search.
//!
//! A problem supplies the start and goal steps, the ordering contract over
//! nodes, node construction, and successor generation. Step equality (for
//! goal tests and the visited set) is the step type's own `Eq` and `Hash`,
//! so a problem that wants to compare only part of its state implements
//! those by hand.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::Hash;

use crate::node::Node;

/// A search space that can be explored by the iterative deepening search.
pub trait SearchProblem {
    /// A state in the space
    type Step: Clone + Eq + Hash + Debug;
    /// Ordering key carried by every node
    type Factor: Clone + PartialOrd + Debug;

    fn start(&self) -> &Self::Step;

    fn goal(&self) -> &Self::Step;

    fn is_goal(&self, step: &Self::Step) -> bool {
        step == self.goal()
    }

    /// Total order over nodes used for pruning, sorting candidates, and
    /// picking the next bound. Must stay consistent for the whole run.
    ///
    /// The default compares factors and treats incomparable values as equal.
    fn compare(
        &self,
        a: &Node<Self::Factor, Self::Step>,
        b: &Node<Self::Factor, Self::Step>,
    ) -> Ordering {
        a.factor()
            .partial_cmp(b.factor())
            .unwrap_or(Ordering::Equal)
    }

    /// Build the candidate node(s) for `step` at `level`. Problems with
    /// several initial estimates may return more than one.
    fn to_nodes(&self, step: &Self::Step, level: usize) -> Vec<Node<Self::Factor, Self::Step>>;

    /// Generate the successors of `step`.
    ///
    /// `accept` is the visited-set filter: call it once per viable successor
    /// step and drop the successor when it returns `false`. It may record
    /// the step as a side effect, so call it last, after every other check.
    fn expand(
        &self,
        step: &Self::Step,
        level: usize,
        accept: &mut dyn FnMut(&Self::Step) -> bool,
    ) -> Vec<Node<Self::Factor, Self::Step>>;
}
