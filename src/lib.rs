//! # grid_pathfinding_visualizer
//!
//! Shortest-path search over a square grid of weighted cells, built for showing a
//! human viewer how the search unfolds. A [PathingGrid] holds the cells (walls,
//! weights, a single start and a single end), the
//! [Dijkstra](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm) based
//! [DijkstraSolver] computes the order in which cells are settled together with the
//! shortest path, and the [PlaybackController] replays that [Trace] at a chosen
//! [Speed] with pause, resume and stop.
//!
//! Movement is 4-connected. Entering a cell costs that cell's weight, walls cannot be
//! entered. Like the grid library this crate grows out of, connected components of
//! open cells are tracked with a [UnionFind](petgraph::unionfind::UnionFind) so that
//! unreachable goals are detected without searching.
//!
//! The [Visualizer] ties the pieces together into one session object and reports
//! outcomes through a [Notifier] and saved grids through a [GridStore].
mod frontier;

pub mod maze;
pub mod node;
pub mod notification;
pub mod pathing_grid;
pub mod persistence;
pub mod playback;
pub mod solver;
pub mod visualizer;

pub use node::{Node, NodeRole, Position};
pub use notification::{LogNotifier, Notification, NotificationKind, Notifier, Outcome};
pub use pathing_grid::{GridError, PathingGrid};
pub use persistence::{FileStore, GridRecord, GridStore, MemoryStore, PersistError, StorageError};
pub use playback::{
    CellUpdate, EventLog, PlaybackConfig, PlaybackController, PlaybackError, PlaybackOutcome,
    PlaybackState, ProgressEvent, Renderer, RunSummary, RunningStats, Speed,
};
pub use solver::{dijkstra::DijkstraSolver, GridSolver, SearchError, Trace};
pub use visualizer::{FindPathError, SessionStats, Visualizer, VisualizerConfig};

/// Weight every cell starts out with.
pub const DEFAULT_WEIGHT: u32 = 1;
/// Weights a cell steps through when its weight is cycled; wraps back to the first.
pub const WEIGHT_CYCLE: [u32; 3] = [1, 3, 5];
/// Side length of the grid a fresh [Visualizer] starts with.
pub const DEFAULT_GRID_SIZE: usize = 10;
/// Tentative distance of a cell that has not been reached.
pub const INFINITE_DISTANCE: u32 = u32::MAX;
/// Largest side length a grid can be created with, or loaded from a record.
pub const MAX_GRID_SIZE: usize = 1024;
/// Largest weight a loaded cell may carry. A path visits each cell at most once, so
/// its cost stays below [INFINITE_DISTANCE] even on the largest grid.
pub const MAX_CELL_WEIGHT: u32 = u32::MAX / (MAX_GRID_SIZE * MAX_GRID_SIZE) as u32;
/// Inline capacity for neighbour lists, enough for a 4-connected grid.
pub(crate) const N_SMALLVEC_SIZE: usize = 4;
