use crate::node::{Node, Position};
use crate::pathing_grid::PathingGrid;
use core::fmt;

pub mod dijkstra;

/// The outcome of one search: the cells in the order they were settled and the
/// shortest path from start to end inclusive, empty if the end could not be reached.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    pub explored_nodes: Vec<Position>,
    pub shortest_path: Vec<Position>,
    pub nodes_explored_count: usize,
    /// Number of steps on the path, not the number of cells.
    pub path_length: usize,
    pub path_found: bool,
}

impl Trace {
    pub fn found(explored_nodes: Vec<Position>, shortest_path: Vec<Position>) -> Trace {
        Trace {
            nodes_explored_count: explored_nodes.len(),
            path_length: shortest_path.len().saturating_sub(1),
            path_found: true,
            explored_nodes,
            shortest_path,
        }
    }

    pub fn not_found(explored_nodes: Vec<Position>) -> Trace {
        Trace {
            nodes_explored_count: explored_nodes.len(),
            path_length: 0,
            path_found: false,
            explored_nodes,
            shortest_path: Vec::new(),
        }
    }

    /// The path without its start and end cells.
    pub fn path_interior(&self) -> &[Position] {
        match self.shortest_path.len() {
            0..=2 => &[],
            n => &self.shortest_path[1..n - 1],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchError {
    /// The grid lacks a start, an end or both; the flags tell which are present.
    MissingEndpoints { start: bool, end: bool },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEndpoints { start, end } => {
                let missing = match (start, end) {
                    (false, false) => "start and end",
                    (false, true) => "start",
                    _ => "end",
                };
                write!(f, "cannot search without a {missing} cell")
            }
        }
    }
}

impl std::error::Error for SearchError {}

pub trait GridSolver {
    /// Searches from the grid's start to its end. Overwrites the search state of every
    /// cell (distance, predecessor, explored and on-path markers), which stays in place
    /// after the call for playback and rendering to read.
    fn solve(&self, grid: &mut PathingGrid) -> Result<Trace, SearchError>;

    /// Total weight of the cells entered along `path`, that is every cell but the first.
    /// Saturates at `u32::MAX`.
    fn get_path_cost(&self, grid: &PathingGrid, path: &[Position]) -> u32 {
        path.iter()
            .skip(1)
            .filter_map(|p| grid.node(*p))
            .map(Node::weight)
            .fold(0, u32::saturating_add)
    }
}
