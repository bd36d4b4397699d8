//! Grid maze problems described in JSON.
//!
//! The grid is a list of equal-length rows: `S` start, `G` goal, `#` wall,
//! `.` floor. Every move costs one, so a node's factor is its level plus
//! the distance estimate to the goal.

use serde::{Deserialize, Serialize};

use crate::error::{ProblemError, Result};
use crate::node::Node;
use crate::problem::SearchProblem;

/// Maze description as read from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct MazeConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub grid: Vec<String>,
    /// Allow diagonal moves (without cutting wall corners)
    #[serde(default)]
    pub diagonal: bool,
}

/// Position on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Position {
        let (dx, dy) = direction.delta();
        Position::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn chebyshev(self, other: Position) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}

/// Move direction, in the order successors are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
    UpRight,
    DownRight,
    DownLeft,
    UpLeft,
}

impl Direction {
    pub const ORTHOGONAL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::UpRight,
        Direction::DownRight,
        Direction::DownLeft,
        Direction::UpLeft,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::UpRight => (1, -1),
            Direction::DownRight => (1, 1),
            Direction::DownLeft => (-1, 1),
            Direction::UpLeft => (-1, -1),
        }
    }

    pub fn is_diagonal(self) -> bool {
        let (dx, dy) = self.delta();
        dx != 0 && dy != 0
    }
}

/// A cell of the maze
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Floor,
    Wall,
}

/// A parsed, validated maze
#[derive(Debug, Clone)]
pub struct Maze {
    tiles: Vec<Vec<Tile>>,
    start: Position,
    goal: Position,
    diagonal: bool,
}

impl Maze {
    pub fn from_config(config: &MazeConfig) -> Result<Self> {
        let width = match config.grid.first() {
            Some(row) if !row.is_empty() => row.chars().count(),
            _ => return Err(ProblemError::EmptyGrid),
        };

        let mut tiles = Vec::with_capacity(config.grid.len());
        let mut start = None;
        let mut goal = None;

        for (y, row) in config.grid.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(ProblemError::RaggedGrid {
                    row: y,
                    expected: width,
                    found,
                });
            }

            let mut line = Vec::with_capacity(width);
            for (x, c) in row.chars().enumerate() {
                let tile = match c {
                    '.' => Tile::Floor,
                    '#' => Tile::Wall,
                    'S' | 'G' => {
                        let slot = if c == 'S' { &mut start } else { &mut goal };
                        if slot.is_some() {
                            return Err(ProblemError::DuplicateMarker {
                                marker: c,
                                row: y,
                                col: x,
                            });
                        }
                        *slot = Some(Position::new(x as i32, y as i32));
                        Tile::Floor
                    }
                    other => {
                        return Err(ProblemError::InvalidTile {
                            tile: other,
                            row: y,
                            col: x,
                        })
                    }
                };
                line.push(tile);
            }
            tiles.push(line);
        }

        Ok(Self {
            tiles,
            start: start.ok_or(ProblemError::MissingStart)?,
            goal: goal.ok_or(ProblemError::MissingGoal)?,
            diagonal: config.diagonal,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: MazeConfig = serde_json::from_str(json)?;
        Self::from_config(&config)
    }

    /// Get the tile at a position (bounds-checked)
    pub fn get_tile(&self, position: Position) -> Option<Tile> {
        if position.x < 0 || position.y < 0 {
            return None;
        }
        self.tiles
            .get(position.y as usize)
            .and_then(|row| row.get(position.x as usize))
            .copied()
    }

    pub fn is_open(&self, position: Position) -> bool {
        self.get_tile(position) == Some(Tile::Floor)
    }

    /// Lower bound on the number of moves from `position` to the goal
    pub fn estimate(&self, position: Position) -> u32 {
        if self.diagonal {
            position.chebyshev(self.goal)
        } else {
            position.manhattan(self.goal)
        }
    }

    fn directions(&self) -> &'static [Direction] {
        if self.diagonal {
            &Direction::ALL
        } else {
            &Direction::ORTHOGONAL
        }
    }

    fn can_move(&self, from: Position, direction: Direction) -> bool {
        if !self.is_open(from.step(direction)) {
            return false;
        }
        if direction.is_diagonal() {
            // no squeezing between two walls that touch at a corner
            let (dx, dy) = direction.delta();
            return self.is_open(Position::new(from.x + dx, from.y))
                && self.is_open(Position::new(from.x, from.y + dy));
        }
        true
    }

    fn node(&self, position: Position, level: usize) -> Node<u32, Position> {
        let factor = (level as u32).saturating_add(self.estimate(position));
        Node::new(position, level, factor)
    }

    /// Render the grid with `path` drawn as `*` between `S` and `G`.
    pub fn render(&self, path: &[Position]) -> Vec<String> {
        let mut rows: Vec<Vec<char>> = self
            .tiles
            .iter()
            .map(|row| {
                row.iter()
                    .map(|tile| match tile {
                        Tile::Floor => '.',
                        Tile::Wall => '#',
                    })
                    .collect()
            })
            .collect();

        for &position in path {
            if self.get_tile(position).is_some() {
                rows[position.y as usize][position.x as usize] = '*';
            }
        }
        rows[self.start.y as usize][self.start.x as usize] = 'S';
        rows[self.goal.y as usize][self.goal.x as usize] = 'G';

        rows.into_iter().map(|row| row.into_iter().collect()).collect()
    }
}

impl SearchProblem for Maze {
    type Step = Position;
    type Factor = u32;

    fn start(&self) -> &Position {
        &self.start
    }

    fn goal(&self) -> &Position {
        &self.goal
    }

    fn to_nodes(&self, step: &Position, level: usize) -> Vec<Node<u32, Position>> {
        vec![self.node(*step, level)]
    }

    fn expand(
        &self,
        step: &Position,
        level: usize,
        accept: &mut dyn FnMut(&Position) -> bool,
    ) -> Vec<Node<u32, Position>> {
        let mut successors = Vec::with_capacity(self.directions().len());
        for &direction in self.directions() {
            if !self.can_move(*step, direction) {
                continue;
            }
            let next = step.step(direction);
            if accept(&next) {
                successors.push(self.node(next, level + 1));
            }
        }
        successors
    }
}
