use crate::node::{Node, NodeRole, Position};
use crate::{MAX_GRID_SIZE, N_SMALLVEC_SIZE};
use core::fmt;
use itertools::{iproduct, Itertools};
use log::info;
use petgraph::unionfind::UnionFind;
use smallvec::SmallVec;

/// Errors raised by grid construction and cell addressing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridError {
    InvalidSize { size: usize },
    OutOfBounds { position: Position, size: usize },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSize { size } => {
                write!(f, "invalid grid size {size}, must be between 1 and {MAX_GRID_SIZE}")
            }
            Self::OutOfBounds { position, size } => {
                write!(f, "position {position} is outside the {size}x{size} grid")
            }
        }
    }
}

impl std::error::Error for GridError {}

/// [PathingGrid] owns a square, row-major matrix of [Node]s and the references to the
/// current start and end. In addition it maintains the connected components of open
/// (non-wall) cells using a [UnionFind] structure, which is joined incrementally when
/// walls are removed and flagged as dirty when walls are added.
#[derive(Clone, Debug)]
pub struct PathingGrid {
    size: usize,
    pub(crate) nodes: Vec<Node>,
    start: Option<usize>,
    end: Option<usize>,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
}

impl PathingGrid {
    /// Allocates a `size` x `size` grid of default cells: open, weight 1, no start or end.
    /// Sizes outside `1..=MAX_GRID_SIZE` are rejected before anything is allocated.
    pub fn new(size: usize) -> Result<PathingGrid, GridError> {
        if !(1..=MAX_GRID_SIZE).contains(&size) {
            return Err(GridError::InvalidSize { size });
        }
        let nodes = iproduct!(0..size, 0..size)
            .map(|(row, col)| Node::new(Position::new(row, col)))
            .collect();
        let mut grid = PathingGrid {
            size,
            nodes,
            start: None,
            end: None,
            components: UnionFind::new(size * size),
            components_dirty: false,
        };
        grid.generate_components();
        info!("Created {size}x{size} grid");
        Ok(grid)
    }

    pub fn size(&self) -> usize {
        self.size
    }
    pub fn start(&self) -> Option<Position> {
        self.start.map(|ix| self.nodes[ix].position())
    }
    pub fn end(&self) -> Option<Position> {
        self.end.map(|ix| self.nodes[ix].position())
    }
    pub fn has_endpoints(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
    pub fn node(&self, position: Position) -> Option<&Node> {
        self.get_ix(position).map(|ix| &self.nodes[ix])
    }
    /// All cells in row-major order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
    pub fn in_bounds(&self, position: Position) -> bool {
        position.row < self.size && position.col < self.size
    }

    pub(crate) fn get_ix(&self, position: Position) -> Option<usize> {
        self.in_bounds(position)
            .then(|| position.row * self.size + position.col)
    }
    pub(crate) fn start_ix(&self) -> Option<usize> {
        self.start
    }
    pub(crate) fn end_ix(&self) -> Option<usize> {
        self.end
    }
    fn require_ix(&self, position: Position) -> Result<usize, GridError> {
        self.get_ix(position).ok_or(GridError::OutOfBounds {
            position,
            size: self.size,
        })
    }

    /// Applies `role` to the cell at `position`. The cell's search state is always
    /// cleared first; the role itself may be a no-op:
    /// - [NodeRole::Start] / [NodeRole::End] move the unique start / end here. A wall on
    ///   the cell is removed and a cell cannot be start and end at once, so moving the
    ///   start onto the end unsets the end (and vice versa).
    /// - [NodeRole::Wall] toggles the wall unless the cell is the start or the end.
    /// - [NodeRole::Weight] cycles the weight unless the cell is start, end or wall.
    pub fn set_node_role(&mut self, position: Position, role: NodeRole) -> Result<(), GridError> {
        let ix = self.require_ix(position)?;
        self.nodes[ix].clear_search_state();
        match role {
            NodeRole::Start => self.place_start(ix),
            NodeRole::End => self.place_end(ix),
            NodeRole::Wall => {
                if !self.nodes[ix].is_endpoint() {
                    let blocked = !self.nodes[ix].is_wall;
                    self.set_wall(ix, blocked);
                }
            }
            NodeRole::Weight => {
                let node = &mut self.nodes[ix];
                if !node.is_endpoint() && !node.is_wall {
                    node.weight = node.next_weight();
                }
            }
        }
        Ok(())
    }

    pub(crate) fn place_start(&mut self, ix: usize) {
        if let Some(previous) = self.start.take() {
            self.nodes[previous].is_start = false;
        }
        if self.end == Some(ix) {
            self.nodes[ix].is_end = false;
            self.end = None;
        }
        self.set_wall(ix, false);
        self.nodes[ix].is_start = true;
        self.start = Some(ix);
    }

    pub(crate) fn place_end(&mut self, ix: usize) {
        if let Some(previous) = self.end.take() {
            self.nodes[previous].is_end = false;
        }
        if self.start == Some(ix) {
            self.nodes[ix].is_start = false;
            self.start = None;
        }
        self.set_wall(ix, false);
        self.nodes[ix].is_end = true;
        self.end = Some(ix);
    }

    /// Updates the wall flag of a cell. Joins newly connected components and flags the
    /// components as dirty if components are (potentially) broken apart into multiple.
    pub(crate) fn set_wall(&mut self, ix: usize, blocked: bool) {
        if self.nodes[ix].is_wall == blocked {
            return;
        }
        self.nodes[ix].is_wall = blocked;
        if blocked {
            self.components_dirty = true;
        } else {
            for n in self.neighbor_ixs(ix) {
                if !self.nodes[n].is_wall {
                    self.components.union(ix, n);
                }
            }
        }
    }

    /// Row-major indices of the up-to-4 orthogonal neighbours, in up, down, left, right
    /// order. There is no wraparound.
    pub(crate) fn neighbor_ixs(&self, ix: usize) -> SmallVec<[usize; N_SMALLVEC_SIZE]> {
        let (row, col) = (ix / self.size, ix % self.size);
        let mut neighbours = SmallVec::new();
        if row > 0 {
            neighbours.push(ix - self.size);
        }
        if row + 1 < self.size {
            neighbours.push(ix + self.size);
        }
        if col > 0 {
            neighbours.push(ix - 1);
        }
        if col + 1 < self.size {
            neighbours.push(ix + 1);
        }
        neighbours
    }

    /// The orthogonally adjacent cells of `position` that lie within the grid.
    pub fn neighbors(&self, position: Position) -> SmallVec<[&Node; N_SMALLVEC_SIZE]> {
        match self.get_ix(position) {
            Some(ix) => self
                .neighbor_ixs(ix)
                .into_iter()
                .map(|n| &self.nodes[n])
                .collect(),
            None => SmallVec::new(),
        }
    }

    /// Clears distance, predecessor and the explored / on-path markers of every cell.
    /// Walls, weights and endpoints are kept.
    pub fn reset_transient(&mut self) {
        self.nodes.iter_mut().for_each(Node::clear_search_state);
    }

    /// Resets every cell to its default, dropping walls, weights and both endpoints.
    pub fn clear_all(&mut self) {
        self.nodes.iter_mut().for_each(Node::reset);
        self.start = None;
        self.end = None;
        self.generate_components();
    }

    /// Places the start at (1, 1) and the end at (size - 2, size - 2) where they are
    /// missing. Grids of size 2 or less are left alone, and on a 3x3 grid both defaults
    /// fall on the centre so only the start is placed.
    pub fn set_default_start_end(&mut self) {
        if self.size <= 2 {
            return;
        }
        if self.start.is_none() {
            self.place_start(self.size + 1);
        }
        let corner = self.size - 2;
        let end_ix = corner * self.size + corner;
        if self.end.is_none() && self.start != Some(end_ix) {
            self.place_end(end_ix);
        }
    }

    /// Checks if two cells are on the same connected component of open cells.
    /// Regenerates the components first if they are dirty.
    pub fn connected(&mut self, a: Position, b: Position) -> bool {
        self.update();
        match (self.get_ix(a), self.get_ix(b)) {
            (Some(a), Some(b)) => {
                !self.nodes[a].is_wall && !self.nodes[b].is_wall && self.components.equiv(a, b)
            }
            _ => false,
        }
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            self.generate_components();
        }
    }

    /// Generates a new [UnionFind] structure and links up open neighbours to the same components.
    pub fn generate_components(&mut self) {
        let n = self.size;
        self.components = UnionFind::new(n * n);
        self.components_dirty = false;
        for (row, col) in iproduct!(0..n, 0..n) {
            let ix = row * n + col;
            if self.nodes[ix].is_wall {
                continue;
            }
            // Linking right and down covers every orthogonal edge exactly once
            if col + 1 < n && !self.nodes[ix + 1].is_wall {
                self.components.union(ix, ix + 1);
            }
            if row + 1 < n && !self.nodes[ix + n].is_wall {
                self.components.union(ix, ix + n);
            }
        }
    }
}

fn cell_char(node: &Node) -> char {
    if node.is_start {
        'S'
    } else if node.is_end {
        'E'
    } else if node.is_wall {
        '#'
    } else if node.on_path {
        'o'
    } else if node.explored {
        '+'
    } else if node.weight > 1 {
        char::from_digit(node.weight.min(9), 10).unwrap_or('9')
    } else {
        '.'
    }
}

impl fmt::Display for PathingGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.nodes.chunks(self.size) {
            writeln!(f, "{}", row.iter().map(cell_char).join(""))?;
        }
        Ok(())
    }
}
