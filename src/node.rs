use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_WEIGHT, INFINITE_DISTANCE, WEIGHT_CYCLE};

/// A 0-indexed (row, column) cell coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Position {
        Position { row, col }
    }

    /// Number of orthogonal steps between two positions.
    pub fn manhattan_distance(&self, other: &Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// What applying a role to a cell does, see [PathingGrid::set_node_role](crate::PathingGrid::set_node_role).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Moves the single start to the cell.
    #[default]
    Start,
    /// Moves the single end to the cell.
    End,
    /// Toggles a wall, unless the cell is the start or the end.
    Wall,
    /// Steps the weight through [WEIGHT_CYCLE], only on plain open cells.
    Weight,
}

/// One grid cell. The role flags and the weight are owned by the grid and change only
/// through its mutation API; the search fields are scratch state of the last run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    position: Position,
    pub(crate) is_wall: bool,
    pub(crate) is_start: bool,
    pub(crate) is_end: bool,
    pub(crate) weight: u32,
    pub(crate) distance: u32,
    pub(crate) predecessor: Option<Position>,
    pub(crate) explored: bool,
    pub(crate) on_path: bool,
}

impl Node {
    pub(crate) fn new(position: Position) -> Node {
        Node {
            position,
            is_wall: false,
            is_start: false,
            is_end: false,
            weight: DEFAULT_WEIGHT,
            distance: INFINITE_DISTANCE,
            predecessor: None,
            explored: false,
            on_path: false,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }
    pub fn is_wall(&self) -> bool {
        self.is_wall
    }
    pub fn is_start(&self) -> bool {
        self.is_start
    }
    pub fn is_end(&self) -> bool {
        self.is_end
    }
    pub fn is_endpoint(&self) -> bool {
        self.is_start || self.is_end
    }
    pub fn weight(&self) -> u32 {
        self.weight
    }
    /// Settled or tentative distance from the start, [None] while unreached.
    pub fn distance(&self) -> Option<u32> {
        (self.distance != INFINITE_DISTANCE).then_some(self.distance)
    }
    /// The cell this cell's distance was reached from.
    pub fn predecessor(&self) -> Option<Position> {
        self.predecessor
    }
    pub fn explored(&self) -> bool {
        self.explored
    }
    pub fn on_path(&self) -> bool {
        self.on_path
    }

    pub(crate) fn clear_search_state(&mut self) {
        self.distance = INFINITE_DISTANCE;
        self.predecessor = None;
        self.explored = false;
        self.on_path = false;
    }

    pub(crate) fn reset(&mut self) {
        *self = Node::new(self.position);
    }

    /// Next weight in [WEIGHT_CYCLE]. Weights outside the cycle fall back to its start.
    pub(crate) fn next_weight(&self) -> u32 {
        WEIGHT_CYCLE
            .iter()
            .position(|&w| w == self.weight)
            .map(|ix| WEIGHT_CYCLE[(ix + 1) % WEIGHT_CYCLE.len()])
            .unwrap_or(WEIGHT_CYCLE[0])
    }
}
