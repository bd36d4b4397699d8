//! Iterative deepening A* driver and the bounded depth-first search it runs
//! once per iteration.
//!
//! Each iteration searches depth-first from the root, pruning every node
//! whose factor exceeds the current bound. The smallest pruned node becomes
//! the next bound. The search stops when the goal is found, when an
//! iteration prunes nothing (the goal is unreachable), or when the
//! iteration cap runs out.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use smallvec::SmallVec;
use tracing::{debug, info, trace, warn};

use crate::node::Node;
use crate::problem::SearchProblem;
use crate::state::{AlgorithmState, Progress};

/// Default number of bounded iterations before giving up
pub const MAX_ITERATIONS: usize = 1024;

type NodeOf<P> = Node<<P as SearchProblem>::Factor, <P as SearchProblem>::Step>;
type StateOf<P> = AlgorithmState<<P as SearchProblem>::Factor, <P as SearchProblem>::Step>;

/// Which steps the acceptance filter rejects during an iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitedScope {
    /// A step accepted anywhere in the iteration is never expanded again
    /// during that iteration, even on sibling branches.
    #[default]
    Iteration,
    /// Only steps on the current path are rejected, so a state can be
    /// reached again through a different branch.
    Path,
}

/// Configuration for the search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Maximum number of bounded iterations
    pub max_iterations: usize,
    /// Scope of duplicate suppression
    pub visited_scope: VisitedScope,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            visited_scope: VisitedScope::default(),
        }
    }
}

/// How the search ended
#[derive(Debug)]
pub enum SearchOutcome<F, S> {
    /// Goal reached; the node carries the whole path through `previous`
    Found(Arc<Node<F, S>>),
    /// An iteration finished without pruning anything: no path exists
    Unreachable,
    /// The iteration cap ran out before the search resolved
    IterationCapExceeded { last_bound: Arc<Node<F, S>> },
}

impl<F, S> SearchOutcome<F, S> {
    pub fn name(&self) -> &'static str {
        match self {
            SearchOutcome::Found(_) => "found",
            SearchOutcome::Unreachable => "unreachable",
            SearchOutcome::IterationCapExceeded { .. } => "iteration_cap_exceeded",
        }
    }
}

/// Result of a search run
#[derive(Debug)]
pub struct SearchResult<F, S> {
    pub outcome: SearchOutcome<F, S>,
    /// Bounded iterations started
    pub iterations: usize,
    /// Nodes whose successors were generated, over all iterations
    pub nodes_expanded: u64,
    /// Time elapsed in milliseconds
    pub time_elapsed_ms: u64,
}

impl<F, S> SearchResult<F, S> {
    pub fn is_found(&self) -> bool {
        matches!(self.outcome, SearchOutcome::Found(_))
    }

    pub fn goal(&self) -> Option<&Arc<Node<F, S>>> {
        match &self.outcome {
            SearchOutcome::Found(goal) => Some(goal),
            _ => None,
        }
    }

    pub fn into_goal(self) -> Option<Arc<Node<F, S>>> {
        match self.outcome {
            SearchOutcome::Found(goal) => Some(goal),
            _ => None,
        }
    }
}

/// Steps rejected by the acceptance filter during one iteration
struct Visited<S> {
    scope: VisitedScope,
    steps: HashSet<S>,
}

impl<S: Clone + Eq + Hash> Visited<S> {
    fn new(scope: VisitedScope) -> Self {
        Self {
            scope,
            steps: HashSet::new(),
        }
    }

    /// Acceptance filter handed to the problem's successor generation
    fn accept(&mut self, step: &S) -> bool {
        match self.scope {
            VisitedScope::Iteration => self.steps.insert(step.clone()),
            VisitedScope::Path => !self.steps.contains(step),
        }
    }

    /// Step pushed onto the active path
    fn enter(&mut self, step: &S) {
        if self.scope == VisitedScope::Path {
            self.steps.insert(step.clone());
        }
    }

    /// Step popped off the active path
    fn leave(&mut self, step: &S) {
        if self.scope == VisitedScope::Path {
            self.steps.remove(step);
        }
    }
}

/// A node on the active path with the successors still to explore
struct Frame<F, S> {
    node: Arc<Node<F, S>>,
    candidates: std::vec::IntoIter<Node<F, S>>,
    /// Smallest node reported by the children explored so far
    best: Option<Arc<Node<F, S>>>,
}

/// Root-to-current sequence of frames
type ActivePath<F, S> = SmallVec<[Frame<F, S>; 32]>;

enum Entry<F, S> {
    Resolved(AlgorithmState<F, S>),
    Expanded(Frame<F, S>),
}

/// One bounded depth-first search
struct BoundedSearch<'a, P: SearchProblem> {
    problem: &'a P,
    bound: &'a NodeOf<P>,
    visited: Visited<P::Step>,
    nodes_expanded: u64,
}

impl<'a, P: SearchProblem> BoundedSearch<'a, P> {
    fn new(problem: &'a P, bound: &'a NodeOf<P>, scope: VisitedScope) -> Self {
        Self {
            problem,
            bound,
            visited: Visited::new(scope),
            nodes_expanded: 0,
        }
    }

    /// Search below `root` and report whether the goal lies within the bound.
    fn run(&mut self, root: Arc<NodeOf<P>>) -> StateOf<P> {
        let mut path: ActivePath<P::Factor, P::Step> = SmallVec::new();

        match self.descend(root) {
            Entry::Resolved(state) => return state,
            Entry::Expanded(frame) => path.push(frame),
        }

        loop {
            let Some(frame) = path.last_mut() else {
                return AlgorithmState::NotFound(None);
            };

            match frame.candidates.next() {
                Some(candidate) => {
                    trace!(
                        from = ?frame.node.step(),
                        from_level = frame.node.level(),
                        to = ?candidate.step(),
                        to_level = candidate.level(),
                        "expand"
                    );
                    let child = candidate.linked_to(&frame.node);

                    match self.descend(child) {
                        Entry::Expanded(child_frame) => path.push(child_frame),
                        Entry::Resolved(AlgorithmState::Found(goal)) => {
                            return AlgorithmState::Found(goal);
                        }
                        Entry::Resolved(state) => {
                            if let Some(frame) = path.last_mut() {
                                self.absorb(&mut frame.best, state);
                            }
                        }
                    }
                }
                None => {
                    let Some(done) = path.pop() else {
                        return AlgorithmState::NotFound(None);
                    };
                    self.visited.leave(done.node.step());

                    let state = match done.best {
                        Some(best) => AlgorithmState::InProgress(best),
                        None => AlgorithmState::NotFound(None),
                    };
                    match path.last_mut() {
                        Some(parent) => self.absorb(&mut parent.best, state),
                        None => return state,
                    }
                }
            }
        }
    }

    /// Push `node` onto the path: prune it, accept it as the goal, or
    /// generate its successors.
    fn descend(&mut self, node: Arc<NodeOf<P>>) -> Entry<P::Factor, P::Step> {
        if self.problem.compare(&node, self.bound) == Ordering::Greater {
            return Entry::Resolved(AlgorithmState::InProgress(node));
        }

        if self.problem.is_goal(node.step()) {
            return Entry::Resolved(AlgorithmState::Found(node));
        }

        self.visited.enter(node.step());

        let visited = &mut self.visited;
        let mut candidates =
            self.problem
                .expand(node.step(), node.level(), &mut |step| visited.accept(step));
        candidates.sort_by(|a, b| self.problem.compare(a, b));
        self.nodes_expanded += 1;

        Entry::Expanded(Frame {
            node,
            candidates: candidates.into_iter(),
            best: None,
        })
    }

    /// Keep the smaller of `best` and the node carried by a child's state
    fn absorb(&self, best: &mut Option<Arc<NodeOf<P>>>, state: StateOf<P>) {
        let Some(node) = state.into_node() else {
            return;
        };
        let smaller = match best {
            Some(current) => self.problem.compare(&node, current) == Ordering::Less,
            None => true,
        };
        if smaller {
            *best = Some(node);
        }
    }
}

fn run<P, O>(problem: &P, config: &SearchConfig, observer: &mut O) -> SearchResult<P::Factor, P::Step>
where
    P: SearchProblem,
    O: Progress<P::Factor, P::Step> + ?Sized,
{
    let start_time = Instant::now();

    let mut roots = problem.to_nodes(problem.start(), 0);
    roots.sort_by(|a, b| problem.compare(a, b));
    let Some(root) = roots.into_iter().next().map(Arc::new) else {
        warn!(event = "search_end", outcome = "unreachable", "start produced no nodes");
        observer.report(&AlgorithmState::NotFound(None));
        return SearchResult {
            outcome: SearchOutcome::Unreachable,
            iterations: 0,
            nodes_expanded: 0,
            time_elapsed_ms: start_time.elapsed().as_millis() as u64,
        };
    };

    info!(
        event = "search_start",
        start = ?problem.start(),
        goal = ?problem.goal(),
        max_iterations = config.max_iterations,
        visited_scope = ?config.visited_scope,
    );

    let mut bound = Arc::clone(&root);
    let mut iterations = 0;
    let mut nodes_expanded = 0;

    let outcome = loop {
        if iterations >= config.max_iterations {
            break SearchOutcome::IterationCapExceeded { last_bound: bound };
        }
        iterations += 1;

        let mut engine = BoundedSearch::new(problem, &bound, config.visited_scope);
        let state = engine.run(Arc::clone(&root));
        nodes_expanded += engine.nodes_expanded;

        debug!(
            event = "iteration_end",
            iteration = iterations,
            bound = ?bound.factor(),
            flag = ?state.flag(),
            nodes_expanded = engine.nodes_expanded,
        );

        match state {
            AlgorithmState::Found(goal) => break SearchOutcome::Found(goal),
            AlgorithmState::NotFound(_) => break SearchOutcome::Unreachable,
            AlgorithmState::InProgress(next) => {
                observer.report(&AlgorithmState::InProgress(Arc::clone(&next)));
                bound = next;
            }
        }
    };

    // Only the terminal report may carry Found or NotFound, and only once.
    let terminal = match &outcome {
        SearchOutcome::Found(goal) => AlgorithmState::Found(Arc::clone(goal)),
        SearchOutcome::Unreachable => AlgorithmState::NotFound(None),
        SearchOutcome::IterationCapExceeded { last_bound } => {
            AlgorithmState::NotFound(Some(Arc::clone(last_bound)))
        }
    };
    observer.report(&terminal);

    let duration = start_time.elapsed();
    info!(
        event = "search_end",
        outcome = outcome.name(),
        iterations = iterations,
        nodes_expanded = nodes_expanded,
        duration_ms = duration.as_millis() as u64,
    );

    SearchResult {
        outcome,
        iterations,
        nodes_expanded,
        time_elapsed_ms: duration.as_millis() as u64,
    }
}

/// Run the search.
pub fn search<P: SearchProblem>(problem: &P, config: &SearchConfig) -> SearchResult<P::Factor, P::Step> {
    run(problem, config, &mut |_: &StateOf<P>| {})
}

/// Run the search, reporting each iteration that ends in progress and then
/// the final state to `observer`. Returns the same result as [`search`].
pub fn search_observed<P, O>(
    problem: &P,
    config: &SearchConfig,
    observer: &mut O,
) -> SearchResult<P::Factor, P::Step>
where
    P: SearchProblem,
    O: Progress<P::Factor, P::Step> + ?Sized,
{
    run(problem, config, observer)
}

/// Goal node with its ancestor chain, or `None` when the search failed.
pub fn find_path<P: SearchProblem>(problem: &P) -> Option<Arc<NodeOf<P>>> {
    search(problem, &SearchConfig::default()).into_goal()
}

/// Observed counterpart of [`find_path`].
///
/// The return value only distinguishes found from not found. When the
/// iteration cap runs out, the final `NotFound` report still carries the
/// last bound node, which is the only place that node is visible; use
/// [`search_observed`] to get it as a [`SearchOutcome`] as well.
pub fn find_path_observed<P, O>(problem: &P, observer: &mut O) -> Option<Arc<NodeOf<P>>>
where
    P: SearchProblem,
    O: Progress<P::Factor, P::Step> + ?Sized,
{
    search_observed(problem, &SearchConfig::default(), observer).into_goal()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::graph::{EdgeConfig, Graph, GraphConfig, Vertex};
    use crate::state::AlgorithmFlag;

    type GraphState = AlgorithmState<u64, Vertex>;

    fn create_graph(start: &str, goal: &str, edges: &[(&str, &str, u64)]) -> Graph {
        let config = GraphConfig {
            start: start.to_string(),
            goal: goal.to_string(),
            edges: edges
                .iter()
                .map(|&(from, to, cost)| EdgeConfig {
                    from: from.to_string(),
                    to: to.to_string(),
                    cost,
                })
                .collect(),
            heuristic: Default::default(),
            directed: true,
        };
        Graph::from_config(&config).unwrap()
    }

    fn create_chain() -> Graph {
        create_graph("s", "g", &[("s", "a", 1), ("a", "b", 1), ("b", "g", 1)])
    }

    fn path_names(result: &SearchResult<u64, Vertex>) -> Vec<String> {
        result
            .goal()
            .unwrap()
            .steps()
            .into_iter()
            .map(|v| v.name)
            .collect()
    }

    /// Integer line 0..=len where every step moves one to the right.
    struct CountingLine {
        start: u32,
        goal: u32,
        len: u32,
        expansions: Cell<usize>,
        roots: Vec<u32>,
    }

    impl CountingLine {
        fn new(start: u32, goal: u32, len: u32) -> Self {
            Self {
                start,
                goal,
                len,
                expansions: Cell::new(0),
                roots: vec![0],
            }
        }
    }

    impl SearchProblem for CountingLine {
        type Step = u32;
        type Factor = u32;

        fn start(&self) -> &u32 {
            &self.start
        }

        fn goal(&self) -> &u32 {
            &self.goal
        }

        fn to_nodes(&self, step: &u32, level: usize) -> Vec<Node<u32, u32>> {
            self.roots
                .iter()
                .map(|&offset| Node::new(*step, level, offset))
                .collect()
        }

        fn expand(
            &self,
            step: &u32,
            level: usize,
            accept: &mut dyn FnMut(&u32) -> bool,
        ) -> Vec<Node<u32, u32>> {
            self.expansions.set(self.expansions.get() + 1);
            let next = step + 1;
            if next <= self.len && accept(&next) {
                vec![Node::new(next, level + 1, level as u32 + 1)]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn test_start_is_goal() {
        let problem = CountingLine::new(3, 3, 5);
        let result = search(&problem, &SearchConfig::default());

        assert!(result.is_found());
        assert_eq!(result.iterations, 1);
        assert_eq!(result.goal().unwrap().level(), 0);
        assert_eq!(result.goal().unwrap().ancestors().count(), 1);
        assert_eq!(problem.expansions.get(), 0);
    }

    #[test]
    fn test_linear_chain() {
        let graph = create_chain();
        let result = search(&graph, &SearchConfig::default());

        assert!(result.is_found());
        assert_eq!(result.iterations, 4);
        assert_eq!(path_names(&result), vec!["s", "a", "b", "g"]);
        assert_eq!(result.goal().unwrap().level(), 3);
        assert_eq!(*result.goal().unwrap().factor(), 3);
    }

    #[test]
    fn test_cheaper_of_two_paths() {
        let graph = create_graph(
            "s",
            "g",
            &[("s", "b", 2), ("b", "g", 5), ("s", "a", 1), ("a", "g", 4)],
        );
        let result = search(&graph, &SearchConfig::default());

        assert_eq!(path_names(&result), vec!["s", "a", "g"]);
        assert_eq!(*result.goal().unwrap().factor(), 5);
    }

    #[test]
    fn test_unreachable_goal() {
        let graph = create_graph("s", "g", &[("s", "a", 1), ("a", "b", 1), ("g", "s", 1)]);
        let result = search(&graph, &SearchConfig::default());

        assert!(matches!(result.outcome, SearchOutcome::Unreachable));
        assert_eq!(result.iterations, 3);
        assert!(result.iterations < MAX_ITERATIONS);
    }

    #[test]
    fn test_unreachable_with_cycle() {
        let graph = create_graph("s", "g", &[("s", "a", 1), ("a", "s", 1), ("a", "b", 2)]);
        let result = search(&graph, &SearchConfig::default());

        assert!(matches!(result.outcome, SearchOutcome::Unreachable));
    }

    #[test]
    fn test_iteration_cap() {
        let graph = create_chain();
        let config = SearchConfig {
            max_iterations: 2,
            ..SearchConfig::default()
        };
        let result = search(&graph, &config);

        assert_eq!(result.iterations, 2);
        match result.outcome {
            SearchOutcome::IterationCapExceeded { last_bound } => {
                assert_eq!(last_bound.step().name, "b");
                assert_eq!(*last_bound.factor(), 2);
            }
            other => panic!("expected cap, got {}", other.name()),
        }
        assert!(find_path(&create_chain()).is_some());
    }

    #[test]
    fn test_iteration_cap_reports_last_bound() {
        let graph = create_chain();
        let config = SearchConfig {
            max_iterations: 2,
            ..SearchConfig::default()
        };
        let mut events: Vec<(AlgorithmFlag, Option<u64>)> = Vec::new();
        let result = search_observed(&graph, &config, &mut |state: &GraphState| {
            events.push((state.flag(), state.node().map(|n| *n.factor())));
        });

        assert_eq!(
            events,
            vec![
                (AlgorithmFlag::InProgress, Some(1)),
                (AlgorithmFlag::InProgress, Some(2)),
                (AlgorithmFlag::NotFound, Some(2)),
            ]
        );
        assert_eq!(
            events
                .iter()
                .filter(|(flag, _)| *flag != AlgorithmFlag::InProgress)
                .count(),
            1
        );
        assert!(matches!(
            result.outcome,
            SearchOutcome::IterationCapExceeded { ref last_bound } if last_bound.step().name == "b"
        ));
    }

    #[test]
    fn test_find_path_observed_at_cap() {
        let problem = CountingLine::new(0, 2_000, 2_000);
        let mut in_progress = 0;
        let mut terminal = None;
        let goal = find_path_observed(&problem, &mut |state: &AlgorithmState<u32, u32>| {
            match state.flag() {
                AlgorithmFlag::InProgress => in_progress += 1,
                _ => terminal = Some(state.clone()),
            }
        });

        assert!(goal.is_none());
        assert_eq!(in_progress, MAX_ITERATIONS);
        let terminal = terminal.unwrap();
        assert_eq!(terminal.flag(), AlgorithmFlag::NotFound);
        assert_eq!(*terminal.node().unwrap().step(), MAX_ITERATIONS as u32);
    }

    #[test]
    fn test_observer_reports_each_iteration_then_found() {
        let graph = create_chain();
        let mut events: Vec<(AlgorithmFlag, Option<u64>)> = Vec::new();
        let result = search_observed(&graph, &SearchConfig::default(), &mut |state: &GraphState| {
            events.push((state.flag(), state.node().map(|n| *n.factor())));
        });

        assert_eq!(result.iterations, 4);
        assert_eq!(
            events,
            vec![
                (AlgorithmFlag::InProgress, Some(1)),
                (AlgorithmFlag::InProgress, Some(2)),
                (AlgorithmFlag::InProgress, Some(3)),
                (AlgorithmFlag::Found, Some(3)),
            ]
        );
    }

    #[test]
    fn test_observed_matches_plain() {
        let graph = create_graph(
            "s",
            "g",
            &[
                ("s", "a", 2),
                ("s", "b", 1),
                ("a", "g", 2),
                ("b", "c", 2),
                ("c", "g", 1),
            ],
        );
        let plain = search(&graph, &SearchConfig::default());

        let mut last: Option<GraphState> = None;
        let mut terminal_reports = 0;
        let observed = search_observed(&graph, &SearchConfig::default(), &mut |state: &GraphState| {
            if state.flag() != AlgorithmFlag::InProgress {
                terminal_reports += 1;
            }
            last = Some(state.clone());
        });

        assert_eq!(path_names(&plain), path_names(&observed));
        assert_eq!(plain.iterations, observed.iterations);
        assert_eq!(terminal_reports, 1);

        let last = last.unwrap();
        assert_eq!(last.flag(), AlgorithmFlag::Found);
        assert!(Arc::ptr_eq(last.node().unwrap(), observed.goal().unwrap()));
    }

    #[test]
    fn test_unreachable_reported_once() {
        let graph = create_graph("s", "g", &[("s", "a", 1)]);
        let mut flags = Vec::new();
        let goal = find_path_observed(&graph, &mut |state: &GraphState| {
            flags.push(state.flag())
        });

        assert!(goal.is_none());
        assert_eq!(flags, vec![AlgorithmFlag::InProgress, AlgorithmFlag::NotFound]);
    }

    #[test]
    fn test_bound_never_decreases() {
        let graph = create_graph(
            "s",
            "g",
            &[
                ("s", "a", 3),
                ("s", "b", 1),
                ("b", "c", 1),
                ("c", "e", 4),
                ("a", "g", 3),
            ],
        );
        let mut bounds = Vec::new();
        let result = search_observed(&graph, &SearchConfig::default(), &mut |state: &GraphState| {
            if state.flag() == AlgorithmFlag::InProgress {
                bounds.push(*state.node().unwrap().factor());
            }
        });

        assert!(result.is_found());
        assert!(bounds.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*result.goal().unwrap().factor(), 6);
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let graph = create_graph(
            "s",
            "g",
            &[("s", "a", 1), ("s", "b", 1), ("a", "g", 1), ("b", "g", 1)],
        );
        let first = search(&graph, &SearchConfig::default());
        let second = search(&graph, &SearchConfig::default());

        assert_eq!(path_names(&first), path_names(&second));
        assert_eq!(path_names(&first), vec!["s", "a", "g"]);
    }

    #[test]
    fn test_iteration_scope_blocks_cheaper_reentry() {
        // c is first accepted below a, which makes the cheaper route through b
        // invisible for the rest of that iteration.
        let edges = [
            ("s", "a", 1),
            ("s", "b", 3),
            ("a", "c", 5),
            ("b", "c", 1),
            ("c", "g", 1),
        ];
        let graph = create_graph("s", "g", &edges);

        let per_iteration = search(&graph, &SearchConfig::default());
        assert_eq!(path_names(&per_iteration), vec!["s", "a", "c", "g"]);
        assert_eq!(*per_iteration.goal().unwrap().factor(), 7);

        let config = SearchConfig {
            visited_scope: VisitedScope::Path,
            ..SearchConfig::default()
        };
        let per_path = search(&graph, &config);
        assert_eq!(path_names(&per_path), vec!["s", "b", "c", "g"]);
        assert_eq!(*per_path.goal().unwrap().factor(), 5);
    }

    #[test]
    fn test_path_scope_terminates_on_cycles() {
        let graph = create_graph(
            "s",
            "g",
            &[("s", "a", 1), ("a", "b", 1), ("b", "s", 1), ("b", "a", 1)],
        );
        let config = SearchConfig {
            visited_scope: VisitedScope::Path,
            ..SearchConfig::default()
        };
        let result = search(&graph, &config);

        assert!(matches!(result.outcome, SearchOutcome::Unreachable));
    }

    #[test]
    fn test_least_initial_node_seeds_search() {
        let mut problem = CountingLine::new(0, 2, 4);
        problem.roots = vec![5, 0, 3];
        let result = search(&problem, &SearchConfig::default());

        let goal = result.goal().unwrap();
        assert_eq!(*goal.ancestors().last().unwrap().factor(), 0);
        assert_eq!(result.iterations, 3);
    }

    #[test]
    fn test_no_initial_nodes() {
        let mut problem = CountingLine::new(0, 2, 4);
        problem.roots.clear();
        let result = search(&problem, &SearchConfig::default());

        assert!(matches!(result.outcome, SearchOutcome::Unreachable));
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_deep_path_in_one_iteration() {
        let mut problem = CountingLine::new(0, 50_000, 50_000);
        problem.roots = vec![50_000];
        let result = search(&problem, &SearchConfig::default());

        assert!(result.is_found());
        assert_eq!(result.iterations, 1);
        assert_eq!(result.goal().unwrap().level(), 50_000);
    }
}
