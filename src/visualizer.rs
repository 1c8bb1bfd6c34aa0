//! One interactive session: the grid being edited, the selected edit mode and replay
//! speed, the statistics of the last run, and the collaborators outcomes are
//! reported to.
//!
//! Edits are ignored while a replay is in progress. The session itself is borrowed
//! mutably for the whole of [Visualizer::find_path], so pausing or stopping that
//! replay goes through the [PlaybackController] handle from [Visualizer::playback].
use core::fmt;
use std::time::Duration;

use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::maze::generate_maze;
use crate::node::{NodeRole, Position};
use crate::notification::{Notifier, Outcome};
use crate::pathing_grid::{GridError, PathingGrid};
use crate::persistence::{GridStore, PersistError};
use crate::playback::{
    PlaybackConfig, PlaybackController, PlaybackError, PlaybackOutcome, Renderer, Speed,
};
use crate::solver::{dijkstra::DijkstraSolver, GridSolver, SearchError};
use crate::DEFAULT_GRID_SIZE;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub grid_size: usize,
    pub speed: Speed,
    /// Probability of a cell becoming a wall in a generated maze.
    pub maze_wall_density: f64,
    pub playback: PlaybackConfig,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        VisualizerConfig {
            grid_size: DEFAULT_GRID_SIZE,
            speed: Speed::default(),
            maze_wall_density: 0.3,
            playback: PlaybackConfig::default(),
        }
    }
}

impl VisualizerConfig {
    pub fn from_json(json: &str) -> Result<VisualizerConfig, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Statistics of the last completed search, measured from the start of the search to
/// the end of its replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub nodes_explored: usize,
    pub path_length: usize,
    pub execution_time: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FindPathError {
    Search(SearchError),
    Playback(PlaybackError),
}

impl fmt::Display for FindPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search(err) => write!(f, "{err}"),
            Self::Playback(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for FindPathError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Search(err) => Some(err),
            Self::Playback(err) => Some(err),
        }
    }
}

impl From<SearchError> for FindPathError {
    fn from(err: SearchError) -> Self {
        FindPathError::Search(err)
    }
}

impl From<PlaybackError> for FindPathError {
    fn from(err: PlaybackError) -> Self {
        FindPathError::Playback(err)
    }
}

pub struct Visualizer<S: GridStore, N: Notifier> {
    grid: PathingGrid,
    mode: NodeRole,
    speed: Speed,
    maze_wall_density: f64,
    stats: SessionStats,
    solver: DijkstraSolver,
    playback: PlaybackController,
    store: S,
    notifier: N,
}

impl<S: GridStore, N: Notifier> Visualizer<S, N> {
    /// Starts a session on a fresh grid with the default start and end placed.
    pub fn new(config: VisualizerConfig, store: S, notifier: N) -> Result<Self, GridError> {
        let mut grid = PathingGrid::new(config.grid_size)?;
        grid.set_default_start_end();
        Ok(Visualizer {
            grid,
            mode: NodeRole::default(),
            speed: config.speed,
            maze_wall_density: config.maze_wall_density,
            stats: SessionStats::default(),
            solver: DijkstraSolver::new(),
            playback: PlaybackController::new(config.playback),
            store,
            notifier,
        })
    }

    pub fn grid(&self) -> &PathingGrid {
        &self.grid
    }
    pub fn stats(&self) -> SessionStats {
        self.stats
    }
    pub fn mode(&self) -> NodeRole {
        self.mode
    }
    pub fn speed(&self) -> Speed {
        self.speed
    }
    pub fn store(&self) -> &S {
        &self.store
    }
    pub fn notifier(&self) -> &N {
        &self.notifier
    }
    /// A handle on the replay, to pause, resume or stop it from another task.
    pub fn playback(&self) -> PlaybackController {
        self.playback.clone()
    }
    pub fn is_running(&self) -> bool {
        self.playback.is_running()
    }

    fn notify(&mut self, outcome: Outcome) {
        self.notifier.notify(outcome.notification());
    }

    fn reset_stats(&mut self) {
        self.stats = SessionStats::default();
    }

    /// Selects the role applied by [handle_cell_click](Self::handle_cell_click).
    pub fn set_mode(&mut self, mode: NodeRole) -> bool {
        if self.is_running() {
            return false;
        }
        self.mode = mode;
        true
    }

    pub fn set_speed(&mut self, speed: Speed) -> bool {
        if self.is_running() {
            return false;
        }
        self.speed = speed;
        true
    }

    /// Applies the current mode to a cell. Returns whether the click was accepted.
    pub fn handle_cell_click(&mut self, position: Position) -> Result<bool, GridError> {
        if self.is_running() {
            return Ok(false);
        }
        self.grid.set_node_role(position, self.mode)?;
        Ok(true)
    }

    /// Replaces the grid with a fresh one of the given size. An invalid size leaves the
    /// current grid as it is.
    pub fn set_grid_size(&mut self, size: usize) -> Result<bool, GridError> {
        if self.is_running() {
            return Ok(false);
        }
        let mut grid = PathingGrid::new(size)?;
        grid.set_default_start_end();
        self.grid = grid;
        self.reset_stats();
        Ok(true)
    }

    pub fn clear_path(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.grid.reset_transient();
        self.reset_stats();
        true
    }

    pub fn clear_all(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.grid.clear_all();
        self.reset_stats();
        true
    }

    pub fn generate_maze<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.is_running() {
            return false;
        }
        generate_maze(&mut self.grid, self.maze_wall_density, rng);
        self.reset_stats();
        self.notify(Outcome::MazeGenerated);
        true
    }

    /// Writes the grid layout to the store. Returns false if ignored while running.
    pub fn save_grid(&mut self) -> Result<bool, PersistError> {
        if self.is_running() {
            return Ok(false);
        }
        match self.store.save_grid(&self.grid) {
            Ok(()) => {
                self.notify(Outcome::SaveSucceeded);
                Ok(true)
            }
            Err(err) => {
                warn!("Saving grid failed: {err}");
                self.notify(Outcome::SaveFailed);
                Err(err)
            }
        }
    }

    /// Replaces the grid with the saved one. Returns whether a grid was loaded; on
    /// failure the current grid is kept.
    pub fn load_grid(&mut self) -> Result<bool, PersistError> {
        if self.is_running() {
            return Ok(false);
        }
        match self.store.load_grid() {
            Ok(Some(grid)) => {
                self.grid = grid;
                self.reset_stats();
                self.notify(Outcome::LoadSucceeded);
                Ok(true)
            }
            Ok(None) => {
                self.notify(Outcome::LoadEmpty);
                Ok(false)
            }
            Err(err) => {
                warn!("Loading grid failed: {err}");
                let malformed = matches!(err, PersistError::Malformed { .. });
                self.notify(Outcome::LoadFailed { malformed });
                Err(err)
            }
        }
    }

    /// Searches from start to end and replays the search into `renderer`. Statistics are
    /// updated and the outcome is reported once the replay completes; a stopped replay
    /// leaves the statistics cleared.
    pub async fn find_path<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
    ) -> Result<PlaybackOutcome, FindPathError> {
        if self.is_running() {
            return Err(PlaybackError::AlreadyRunning.into());
        }
        if !self.grid.has_endpoints() {
            self.notify(Outcome::MissingEndpoints);
            return Err(SearchError::MissingEndpoints {
                start: self.grid.start().is_some(),
                end: self.grid.end().is_some(),
            }
            .into());
        }
        self.clear_path();
        let begun = Instant::now();
        let trace = self.solver.solve(&mut self.grid)?;
        let outcome = self
            .playback
            .play(&self.grid, &trace, self.speed, renderer)
            .await?;

        match outcome {
            PlaybackOutcome::Completed(_) => {
                let execution_time = begun.elapsed();
                self.stats = SessionStats {
                    nodes_explored: trace.nodes_explored_count,
                    path_length: trace.path_length,
                    execution_time,
                };
                if trace.path_found {
                    self.notify(Outcome::PathFound {
                        path_length: trace.path_length,
                        execution_time,
                    });
                } else {
                    self.notify(Outcome::NoPath);
                }
            }
            PlaybackOutcome::Stopped { events_emitted } => {
                info!("Search replay stopped after {events_emitted} events");
            }
        }
        Ok(outcome)
    }
}
