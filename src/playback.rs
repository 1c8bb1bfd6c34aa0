//! Step-by-step replay of a [Trace] for a rendering collaborator.
//!
//! [PlaybackController::play] emits one [ProgressEvent::Explored] per settled cell,
//! then one [ProgressEvent::Path] per cell strictly between start and end, sleeping
//! between events. It only ever suspends at those sleeps and at a gate in front of each
//! event: while the controller is paused the gate stays closed, so a pause never drops,
//! repeats or reorders events and a resume takes effect before the next event.
//!
//! The controller is a cheap handle. Clones share the playback state, which lets one
//! task run `play` while another pauses, resumes or stops it.
use core::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{sleep, Instant};

use crate::node::{Node, Position};
use crate::pathing_grid::PathingGrid;
use crate::solver::Trace;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Slow,
    #[default]
    Medium,
    Fast,
}

/// Replay pacing. Path events wait `path_delay_factor` times as long as exploration
/// events at the same speed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub slow_delay_ms: u64,
    pub medium_delay_ms: u64,
    pub fast_delay_ms: u64,
    pub path_delay_factor: u32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            slow_delay_ms: 100,
            medium_delay_ms: 50,
            fast_delay_ms: 10,
            path_delay_factor: 2,
        }
    }
}

impl PlaybackConfig {
    /// Parses a config from JSON, missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<PlaybackConfig, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn explore_delay(&self, speed: Speed) -> Duration {
        Duration::from_millis(match speed {
            Speed::Slow => self.slow_delay_ms,
            Speed::Medium => self.medium_delay_ms,
            Speed::Fast => self.fast_delay_ms,
        })
    }

    pub fn path_delay(&self, speed: Speed) -> Duration {
        self.explore_delay(speed) * self.path_delay_factor
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

impl PlaybackState {
    /// Whether a replay is in progress, paused or not.
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackState::Running | PlaybackState::Paused)
    }
}

/// The state together with the id of the replay it belongs to, so that a stopped
/// replay can never mistake a newer replay's state for its own.
#[derive(Clone, Copy, Debug)]
struct Status {
    state: PlaybackState,
    run: u64,
}

/// What a rendering collaborator learns about one cell in one event: the flags the
/// cell shows at this point of the replay plus its fixed attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellUpdate {
    pub position: Position,
    pub explored: bool,
    pub on_path: bool,
    pub weight: u32,
    pub is_wall: bool,
    pub is_start: bool,
    pub is_end: bool,
}

impl CellUpdate {
    fn new(node: &Node, on_path: bool) -> CellUpdate {
        CellUpdate {
            position: node.position(),
            explored: true,
            on_path,
            weight: node.weight(),
            is_wall: node.is_wall(),
            is_start: node.is_start(),
            is_end: node.is_end(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    Explored(CellUpdate),
    Path(CellUpdate),
}

impl ProgressEvent {
    pub fn cell(&self) -> &CellUpdate {
        match self {
            ProgressEvent::Explored(cell) | ProgressEvent::Path(cell) => cell,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunningStats {
    pub nodes_explored: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub nodes_explored: usize,
    pub path_length: usize,
    pub execution_time: Duration,
    pub path_found: bool,
}

/// Receives the replay. Only [render](Renderer::render) is required.
pub trait Renderer {
    fn render(&mut self, event: &ProgressEvent);
    /// Called after every event with the number of explored cells shown so far, which
    /// stays put during the path phase.
    fn stats(&mut self, _stats: &RunningStats) {}
    fn finished(&mut self, _summary: &RunSummary) {}
}

/// A [Renderer] that keeps everything it is given.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventLog {
    pub events: Vec<ProgressEvent>,
    pub stats: Vec<RunningStats>,
    pub summary: Option<RunSummary>,
}

impl Renderer for EventLog {
    fn render(&mut self, event: &ProgressEvent) {
        self.events.push(*event);
    }
    fn stats(&mut self, stats: &RunningStats) {
        self.stats.push(*stats);
    }
    fn finished(&mut self, summary: &RunSummary) {
        self.summary = Some(*summary);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Completed(RunSummary),
    /// Stopped through [PlaybackController::stop] after emitting this many events.
    Stopped { events_emitted: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackError {
    AlreadyRunning,
    /// The trace names a cell the grid does not have.
    TraceMismatch { position: Position },
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "a replay is already in progress"),
            Self::TraceMismatch { position } => {
                write!(f, "trace refers to cell {position} which is not on the grid")
            }
        }
    }
}

impl std::error::Error for PlaybackError {}

/// Returns the controller to idle if a replay ends without completing, including when
/// its future is dropped half way.
struct RunGuard<'a> {
    status: &'a watch::Sender<Status>,
    run: u64,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let run = self.run;
        self.status.send_if_modified(|s| {
            if s.run == run && s.state.is_active() {
                s.state = PlaybackState::Idle;
                true
            } else {
                false
            }
        });
    }
}

#[derive(Clone)]
pub struct PlaybackController {
    config: PlaybackConfig,
    status: Arc<watch::Sender<Status>>,
}

impl Default for PlaybackController {
    fn default() -> Self {
        PlaybackController::new(PlaybackConfig::default())
    }
}

impl fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackController")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

impl PlaybackController {
    pub fn new(config: PlaybackConfig) -> PlaybackController {
        let (status, _) = watch::channel(Status {
            state: PlaybackState::Idle,
            run: 0,
        });
        PlaybackController {
            config,
            status: Arc::new(status),
        }
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }
    pub fn set_config(&mut self, config: PlaybackConfig) {
        self.config = config;
    }
    pub fn state(&self) -> PlaybackState {
        self.status.borrow().state
    }
    pub fn is_running(&self) -> bool {
        self.state().is_active()
    }

    /// Holds the replay before its next event. Returns whether a running replay was paused.
    pub fn pause(&self) -> bool {
        let paused = self.transition(PlaybackState::Running, PlaybackState::Paused);
        if paused {
            info!("Playback paused");
        }
        paused
    }

    /// Returns whether a paused replay was resumed.
    pub fn resume(&self) -> bool {
        let resumed = self.transition(PlaybackState::Paused, PlaybackState::Running);
        if resumed {
            info!("Playback resumed");
        }
        resumed
    }

    /// Ends the active replay before its next event and returns to idle. Returns
    /// whether there was an active replay.
    pub fn stop(&self) -> bool {
        let stopped = self.status.send_if_modified(|s| {
            if s.state.is_active() {
                s.state = PlaybackState::Idle;
                true
            } else {
                false
            }
        });
        if stopped {
            info!("Playback stopped");
        }
        stopped
    }

    fn transition(&self, from: PlaybackState, to: PlaybackState) -> bool {
        self.status.send_if_modified(|s| {
            if s.state == from {
                s.state = to;
                true
            } else {
                false
            }
        })
    }

    fn begin(&self) -> Result<u64, PlaybackError> {
        let mut run = None;
        self.status.send_if_modified(|s| {
            if s.state.is_active() {
                return false;
            }
            s.run += 1;
            s.state = PlaybackState::Running;
            run = Some(s.run);
            true
        });
        run.ok_or_else(|| {
            warn!("Rejected replay request, a replay is already in progress");
            PlaybackError::AlreadyRunning
        })
    }

    fn complete(&self, run: u64) -> bool {
        self.status.send_if_modified(|s| {
            if s.run == run && s.state.is_active() {
                s.state = PlaybackState::Completed;
                true
            } else {
                false
            }
        })
    }

    /// Replays `trace`, which must have been computed on `grid`, into `renderer`.
    /// Fails with [PlaybackError::AlreadyRunning] if another replay is active.
    pub async fn play<R: Renderer + ?Sized>(
        &self,
        grid: &PathingGrid,
        trace: &Trace,
        speed: Speed,
        renderer: &mut R,
    ) -> Result<PlaybackOutcome, PlaybackError> {
        let run = self.begin()?;
        let _guard = RunGuard {
            status: &self.status,
            run,
        };
        let mut gate = self.status.subscribe();
        let begun = Instant::now();
        let delay = self.config.explore_delay(speed);
        let path_delay = self.config.path_delay(speed);
        info!(
            "Replaying {} explored cells and {} path cells at {speed:?} speed",
            trace.explored_nodes.len(),
            trace.path_interior().len()
        );

        let mut events_emitted = 0;
        for (i, position) in trace.explored_nodes.iter().enumerate() {
            if !wait_until_running(&mut gate, run).await {
                return Ok(PlaybackOutcome::Stopped { events_emitted });
            }
            let node = cell(grid, *position)?;
            renderer.render(&ProgressEvent::Explored(CellUpdate::new(node, false)));
            renderer.stats(&RunningStats {
                nodes_explored: i + 1,
            });
            events_emitted += 1;
            sleep(delay).await;
        }
        for position in trace.path_interior() {
            if !wait_until_running(&mut gate, run).await {
                return Ok(PlaybackOutcome::Stopped { events_emitted });
            }
            let node = cell(grid, *position)?;
            renderer.render(&ProgressEvent::Path(CellUpdate::new(node, true)));
            renderer.stats(&RunningStats {
                nodes_explored: trace.explored_nodes.len(),
            });
            events_emitted += 1;
            sleep(path_delay).await;
        }

        if !self.complete(run) {
            return Ok(PlaybackOutcome::Stopped { events_emitted });
        }
        let summary = RunSummary {
            nodes_explored: trace.nodes_explored_count,
            path_length: trace.path_length,
            execution_time: begun.elapsed(),
            path_found: trace.path_found,
        };
        renderer.finished(&summary);
        info!("Replay completed after {events_emitted} events");
        Ok(PlaybackOutcome::Completed(summary))
    }
}

fn cell(grid: &PathingGrid, position: Position) -> Result<&Node, PlaybackError> {
    grid.node(position).ok_or_else(|| {
        warn!("Trace cell {position} is not on the {0}x{0} grid", grid.size());
        PlaybackError::TraceMismatch { position }
    })
}

/// Waits while this replay is paused. Returns false once it has been stopped.
async fn wait_until_running(gate: &mut watch::Receiver<Status>, run: u64) -> bool {
    match gate
        .wait_for(|s| s.run != run || s.state != PlaybackState::Paused)
        .await
    {
        Ok(status) => status.run == run && status.state == PlaybackState::Running,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeRole;
    use crate::solver::{dijkstra::DijkstraSolver, GridSolver};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Lets a test inspect what was rendered while the replay is still going.
    struct SharedLog(Rc<RefCell<EventLog>>);

    impl Renderer for SharedLog {
        fn render(&mut self, event: &ProgressEvent) {
            self.0.borrow_mut().render(event);
        }
        fn stats(&mut self, stats: &RunningStats) {
            self.0.borrow_mut().stats(stats);
        }
        fn finished(&mut self, summary: &RunSummary) {
            self.0.borrow_mut().finished(summary);
        }
    }

    fn solved_grid() -> (PathingGrid, Trace) {
        // |S...|
        // |.##.|
        // |...E|
        // |....|
        let mut grid = PathingGrid::new(4).unwrap();
        grid.set_node_role(Position::new(0, 0), NodeRole::Start)
            .unwrap();
        grid.set_node_role(Position::new(2, 3), NodeRole::End).unwrap();
        grid.set_node_role(Position::new(1, 1), NodeRole::Wall)
            .unwrap();
        grid.set_node_role(Position::new(1, 2), NodeRole::Wall)
            .unwrap();
        let trace = DijkstraSolver.solve(&mut grid).unwrap();
        (grid, trace)
    }

    #[tokio::test(start_paused = true)]
    async fn replays_trace_in_order() {
        let (grid, trace) = solved_grid();
        let controller = PlaybackController::default();
        let mut log = EventLog::default();
        let outcome = controller
            .play(&grid, &trace, Speed::Fast, &mut log)
            .await
            .unwrap();

        let explored: Vec<Position> = log
            .events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Explored(_)))
            .map(|e| e.cell().position)
            .collect();
        let path: Vec<Position> = log
            .events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Path(_)))
            .map(|e| e.cell().position)
            .collect();
        assert_eq!(explored, trace.explored_nodes);
        assert_eq!(path, trace.path_interior().to_vec());
        assert_eq!(log.events.len(), explored.len() + path.len());
        // All exploration events precede all path events
        assert!(log.events[..explored.len()]
            .iter()
            .all(|e| matches!(e, ProgressEvent::Explored(c) if !c.on_path)));

        // One stats update per event, holding at the explored total during the path
        let counts: Vec<usize> = log.stats.iter().map(|s| s.nodes_explored).collect();
        let explored_total = trace.explored_nodes.len();
        let expected: Vec<usize> = (1..=explored_total)
            .chain(std::iter::repeat(explored_total).take(path.len()))
            .collect();
        assert_eq!(counts, expected);

        let PlaybackOutcome::Completed(summary) = outcome else {
            panic!("replay did not complete: {outcome:?}");
        };
        assert_eq!(log.summary, Some(summary));
        assert_eq!(summary.nodes_explored, trace.nodes_explored_count);
        assert_eq!(summary.path_length, trace.path_length);
        assert!(summary.path_found);
        assert_eq!(controller.state(), PlaybackState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_per_speed() {
        let (grid, trace) = solved_grid();
        let controller = PlaybackController::default();
        let mut log = EventLog::default();
        let outcome = controller
            .play(&grid, &trace, Speed::Slow, &mut log)
            .await
            .unwrap();
        let expected = Duration::from_millis(
            100 * trace.explored_nodes.len() as u64 + 200 * trace.path_interior().len() as u64,
        );
        let PlaybackOutcome::Completed(summary) = outcome else {
            panic!("replay did not complete: {outcome:?}");
        };
        assert!(summary.execution_time >= expected);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_neither_drops_nor_reorders_events() {
        let (grid, trace) = solved_grid();
        let mut unpaused = EventLog::default();
        PlaybackController::default()
            .play(&grid, &trace, Speed::Medium, &mut unpaused)
            .await
            .unwrap();

        let controller = PlaybackController::default();
        let shared = Rc::new(RefCell::new(EventLog::default()));
        let mut renderer = SharedLog(shared.clone());
        let control = async {
            sleep(Duration::from_millis(120)).await;
            assert!(controller.pause());
            assert_eq!(controller.state(), PlaybackState::Paused);
            let shown = shared.borrow().events.len();
            sleep(Duration::from_secs(2)).await;
            assert_eq!(shared.borrow().events.len(), shown);
            assert!(controller.resume());
        };
        let (outcome, ()) = tokio::join!(
            controller.play(&grid, &trace, Speed::Medium, &mut renderer),
            control
        );
        let PlaybackOutcome::Completed(summary) = outcome.unwrap() else {
            panic!("paused replay did not complete");
        };
        assert_eq!(shared.borrow().events, unpaused.events);
        assert_eq!(shared.borrow().stats, unpaused.stats);
        assert!(summary.execution_time >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_second_replay() {
        let (grid, trace) = solved_grid();
        let controller = PlaybackController::default();
        let mut first = EventLog::default();
        let mut second = EventLog::default();
        let intruder = async {
            sleep(Duration::from_millis(30)).await;
            controller.play(&grid, &trace, Speed::Fast, &mut second).await
        };
        let (outcome, rejected) = tokio::join!(
            controller.play(&grid, &trace, Speed::Medium, &mut first),
            intruder
        );
        assert!(matches!(outcome, Ok(PlaybackOutcome::Completed(_))));
        assert_eq!(rejected, Err(PlaybackError::AlreadyRunning));
        assert!(second.events.is_empty());

        // A finished replay does not block the next one
        let mut third = EventLog::default();
        assert!(controller
            .play(&grid, &trace, Speed::Fast, &mut third)
            .await
            .is_ok());
        assert_eq!(third.events, first.events);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_replay_before_next_event() {
        let (grid, trace) = solved_grid();
        let controller = PlaybackController::default();
        let mut log = EventLog::default();
        let stopper = async {
            sleep(Duration::from_millis(120)).await;
            assert!(controller.stop());
        };
        let (outcome, ()) = tokio::join!(
            controller.play(&grid, &trace, Speed::Medium, &mut log),
            stopper
        );
        assert_eq!(
            outcome,
            Ok(PlaybackOutcome::Stopped { events_emitted: 3 })
        );
        assert_eq!(log.events.len(), 3);
        assert_eq!(log.summary, None);
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_while_paused() {
        let (grid, trace) = solved_grid();
        let controller = PlaybackController::default();
        let mut log = EventLog::default();
        let control = async {
            sleep(Duration::from_millis(70)).await;
            controller.pause();
            sleep(Duration::from_millis(500)).await;
            controller.stop();
        };
        let (outcome, ()) = tokio::join!(
            controller.play(&grid, &trace, Speed::Medium, &mut log),
            control
        );
        assert_eq!(
            outcome,
            Ok(PlaybackOutcome::Stopped { events_emitted: 2 })
        );
        assert!(!controller.resume());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_replay_returns_to_idle() {
        let (grid, trace) = solved_grid();
        let controller = PlaybackController::default();
        let mut log = EventLog::default();
        let timed_out = tokio::time::timeout(
            Duration::from_millis(75),
            controller.play(&grid, &trace, Speed::Medium, &mut log),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn mismatched_trace_is_rejected() {
        let grid = PathingGrid::new(2).unwrap();
        let trace = Trace::not_found(vec![Position::new(0, 0), Position::new(5, 5)]);
        let controller = PlaybackController::new(PlaybackConfig {
            fast_delay_ms: 0,
            ..PlaybackConfig::default()
        });
        let mut log = EventLog::default();
        let result = controller.play(&grid, &trace, Speed::Fast, &mut log).await;
        assert_eq!(
            result,
            Err(PlaybackError::TraceMismatch {
                position: Position::new(5, 5)
            })
        );
        assert_eq!(log.events.len(), 1);
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn pause_and_resume_need_a_replay() {
        let controller = PlaybackController::default();
        assert!(!controller.pause());
        assert!(!controller.resume());
        assert!(!controller.stop());
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn config_fills_in_defaults() {
        let config = PlaybackConfig::from_json(r#"{ "fast_delay_ms": 1 }"#).unwrap();
        assert_eq!(config.explore_delay(Speed::Fast), Duration::from_millis(1));
        assert_eq!(config.explore_delay(Speed::Slow), Duration::from_millis(100));
        assert_eq!(config.path_delay(Speed::Medium), Duration::from_millis(100));
    }
}
