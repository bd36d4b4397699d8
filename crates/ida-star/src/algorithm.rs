//! Name-addressable entry points for the search.

use crate::problem::SearchProblem;
use crate::search::{search, search_observed, SearchConfig, SearchResult};
use crate::state::Progress;

/// A search strategy that can be selected by name
pub trait Algorithm {
    fn name(&self) -> &'static str;

    fn run<P: SearchProblem>(
        &self,
        problem: &P,
        config: &SearchConfig,
    ) -> SearchResult<P::Factor, P::Step>;
}

/// A strategy that can also report progress while it runs
pub trait ObservableAlgorithm: Algorithm {
    fn run_observed<P, O>(
        &self,
        problem: &P,
        config: &SearchConfig,
        observer: &mut O,
    ) -> SearchResult<P::Factor, P::Step>
    where
        P: SearchProblem,
        O: Progress<P::Factor, P::Step> + ?Sized;
}

/// Iterative deepening A*
#[derive(Debug, Clone, Copy, Default)]
pub struct IterativeDeepeningAStar;

impl Algorithm for IterativeDeepeningAStar {
    fn name(&self) -> &'static str {
        "IterativeDeepeningAStar"
    }

    fn run<P: SearchProblem>(
        &self,
        problem: &P,
        config: &SearchConfig,
    ) -> SearchResult<P::Factor, P::Step> {
        search(problem, config)
    }
}

impl ObservableAlgorithm for IterativeDeepeningAStar {
    fn run_observed<P, O>(
        &self,
        problem: &P,
        config: &SearchConfig,
        observer: &mut O,
    ) -> SearchResult<P::Factor, P::Step>
    where
        P: SearchProblem,
        O: Progress<P::Factor, P::Step> + ?Sized,
    {
        search_observed(problem, config, observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::{Maze, Position};
    use crate::state::AlgorithmState;

    #[test]
    fn test_dispatch_by_trait() {
        let maze = Maze::from_json(r#"{"grid": ["S.", ".G"]}"#).unwrap();
        let algorithm = IterativeDeepeningAStar;
        assert_eq!(algorithm.name(), "IterativeDeepeningAStar");

        let plain = algorithm.run(&maze, &SearchConfig::default());

        let mut reports = 0;
        let observed = algorithm.run_observed(
            &maze,
            &SearchConfig::default(),
            &mut |_: &AlgorithmState<u32, Position>| reports += 1,
        );

        assert_eq!(plain.goal().unwrap().steps(), observed.goal().unwrap().steps());
        assert_eq!(reports, 1);
    }
}
