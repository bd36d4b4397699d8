//! Weighted graph problems described in JSON.
//!
//! ```json
//! {
//!   "start": "s",
//!   "goal": "g",
//!   "edges": [{"from": "s", "to": "a", "cost": 2}, {"from": "a", "to": "g"}],
//!   "heuristic": {"s": 2, "a": 1},
//!   "directed": true
//! }
//! ```
//!
//! Missing edge costs default to 1 and missing heuristic entries to 0.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::{ProblemError, Result};
use crate::node::Node;
use crate::problem::SearchProblem;

fn default_cost() -> u64 {
    1
}

fn default_directed() -> bool {
    true
}

/// One edge of the graph
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeConfig {
    pub from: String,
    pub to: String,
    #[serde(default = "default_cost")]
    pub cost: u64,
}

/// Graph description as read from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    pub start: String,
    pub goal: String,
    pub edges: Vec<EdgeConfig>,
    #[serde(default)]
    pub heuristic: BTreeMap<String, u64>,
    #[serde(default = "default_directed")]
    pub directed: bool,
}

/// A vertex together with the cost of the path that reached it.
///
/// Equality and hashing look at the name only, so the visited set and the
/// goal test treat two arrivals at the same vertex as the same step.
#[derive(Debug, Clone, Serialize)]
pub struct Vertex {
    pub name: String,
    pub cost: u64,
}

impl Vertex {
    pub fn new(name: impl Into<String>, cost: u64) -> Self {
        Self {
            name: name.into(),
            cost,
        }
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Adjacency-list graph with an optional admissible heuristic
#[derive(Debug, Clone)]
pub struct Graph {
    start: Vertex,
    goal: Vertex,
    adjacency: BTreeMap<String, Vec<(String, u64)>>,
    heuristic: BTreeMap<String, u64>,
}

impl Graph {
    pub fn from_config(config: &GraphConfig) -> Result<Self> {
        let mut adjacency: BTreeMap<String, Vec<(String, u64)>> = BTreeMap::new();
        let mut vertices: BTreeSet<&str> = BTreeSet::new();
        vertices.insert(&config.start);
        vertices.insert(&config.goal);

        for edge in &config.edges {
            vertices.insert(&edge.from);
            vertices.insert(&edge.to);
            adjacency
                .entry(edge.from.clone())
                .or_default()
                .push((edge.to.clone(), edge.cost));
            if !config.directed {
                adjacency
                    .entry(edge.to.clone())
                    .or_default()
                    .push((edge.from.clone(), edge.cost));
            }
        }

        if let Some(unknown) = config
            .heuristic
            .keys()
            .find(|name| !vertices.contains(name.as_str()))
        {
            return Err(ProblemError::UnknownVertex(unknown.clone()));
        }

        Ok(Self {
            start: Vertex::new(config.start.clone(), 0),
            goal: Vertex::new(config.goal.clone(), 0),
            adjacency,
            heuristic: config.heuristic.clone(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: GraphConfig = serde_json::from_str(json)?;
        Self::from_config(&config)
    }

    /// Estimated remaining cost from `name`
    pub fn heuristic(&self, name: &str) -> u64 {
        self.heuristic.get(name).copied().unwrap_or(0)
    }

    /// Outgoing edges of `name` in declaration order
    pub fn neighbours(&self, name: &str) -> &[(String, u64)] {
        self.adjacency.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn node(&self, vertex: Vertex, level: usize) -> Node<u64, Vertex> {
        let factor = vertex.cost.saturating_add(self.heuristic(&vertex.name));
        Node::new(vertex, level, factor)
    }
}

impl SearchProblem for Graph {
    type Step = Vertex;
    type Factor = u64;

    fn start(&self) -> &Vertex {
        &self.start
    }

    fn goal(&self) -> &Vertex {
        &self.goal
    }

    fn to_nodes(&self, step: &Vertex, level: usize) -> Vec<Node<u64, Vertex>> {
        vec![self.node(step.clone(), level)]
    }

    fn expand(
        &self,
        step: &Vertex,
        level: usize,
        accept: &mut dyn FnMut(&Vertex) -> bool,
    ) -> Vec<Node<u64, Vertex>> {
        let mut successors = Vec::new();
        for (to, cost) in self.neighbours(&step.name) {
            let next = Vertex::new(to.clone(), step.cost.saturating_add(*cost));
            if accept(&next) {
                successors.push(self.node(next, level + 1));
            }
        }
        successors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{find_path, search, SearchConfig, SearchOutcome, VisitedScope};

    fn create_weighted_graph() -> Graph {
        Graph::from_json(
            r#"{
                "start": "s",
                "goal": "g",
                "edges": [
                    {"from": "s", "to": "a", "cost": 4},
                    {"from": "s", "to": "b", "cost": 1},
                    {"from": "b", "to": "a", "cost": 1},
                    {"from": "a", "to": "g", "cost": 2},
                    {"from": "b", "to": "g", "cost": 7}
                ],
                "heuristic": {"s": 3, "a": 2, "b": 3}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_vertex_equality_ignores_cost() {
        assert_eq!(Vertex::new("a", 1), Vertex::new("a", 9));
        assert_ne!(Vertex::new("a", 1), Vertex::new("b", 1));
    }

    #[test]
    fn test_defaults() {
        let graph = Graph::from_json(
            r#"{"start": "s", "goal": "g", "edges": [{"from": "s", "to": "g"}]}"#,
        )
        .unwrap();

        assert_eq!(graph.neighbours("s"), &[("g".to_string(), 1)]);
        assert!(graph.neighbours("g").is_empty());
        assert_eq!(graph.heuristic("s"), 0);
    }

    #[test]
    fn test_undirected_edges() {
        let graph = Graph::from_json(
            r#"{"start": "s", "goal": "g", "directed": false,
                "edges": [{"from": "g", "to": "s", "cost": 3}]}"#,
        )
        .unwrap();

        let goal = find_path(&graph).unwrap();
        assert_eq!(goal.step().cost, 3);
    }

    #[test]
    fn test_unknown_heuristic_vertex() {
        let err = Graph::from_json(
            r#"{"start": "s", "goal": "g", "edges": [], "heuristic": {"x": 1}}"#,
        )
        .unwrap_err();

        assert!(matches!(err, ProblemError::UnknownVertex(name) if name == "x"));
    }

    #[test]
    fn test_malformed_json() {
        let err = Graph::from_json(r#"{"start": "s"}"#).unwrap_err();
        assert!(matches!(err, ProblemError::Json(_)));
    }

    #[test]
    fn test_path_scope_finds_cheapest_route() {
        let graph = create_weighted_graph();
        let config = SearchConfig {
            visited_scope: VisitedScope::Path,
            ..SearchConfig::default()
        };
        let result = search(&graph, &config);

        let goal = result.goal().unwrap();
        let names: Vec<String> = goal.steps().into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["s", "b", "a", "g"]);
        assert_eq!(goal.step().cost, 4);
        assert_eq!(result.iterations, 2);
    }

    #[test]
    fn test_iteration_scope_keeps_first_arrival() {
        // a is accepted from s before b offers the cheaper edge into it
        let graph = create_weighted_graph();
        let result = search(&graph, &SearchConfig::default());

        let goal = result.goal().unwrap();
        let names: Vec<String> = goal.steps().into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["s", "b", "g"]);
        assert_eq!(goal.step().cost, 8);
    }

    #[test]
    fn test_isolated_goal_is_unreachable() {
        let graph = Graph::from_json(
            r#"{"start": "s", "goal": "g", "edges": [{"from": "s", "to": "a"}]}"#,
        )
        .unwrap();
        let result = search(&graph, &SearchConfig::default());

        assert!(matches!(result.outcome, SearchOutcome::Unreachable));
    }
}
