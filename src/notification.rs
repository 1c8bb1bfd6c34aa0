use std::time::Duration;

use log::{error, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// Everything a session reports to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    PathFound {
        path_length: usize,
        execution_time: Duration,
    },
    NoPath,
    MissingEndpoints,
    MazeGenerated,
    SaveSucceeded,
    SaveFailed,
    LoadSucceeded,
    /// `malformed` tells a bad record apart from a storage failure.
    LoadFailed {
        malformed: bool,
    },
    LoadEmpty,
}

impl Outcome {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Outcome::PathFound { .. } | Outcome::SaveSucceeded | Outcome::LoadSucceeded => {
                NotificationKind::Success
            }
            Outcome::NoPath
            | Outcome::MissingEndpoints
            | Outcome::SaveFailed
            | Outcome::LoadFailed { .. } => NotificationKind::Error,
            Outcome::MazeGenerated | Outcome::LoadEmpty => NotificationKind::Info,
        }
    }

    pub fn notification(&self) -> Notification {
        let (title, message) = match self {
            Outcome::PathFound {
                path_length,
                execution_time,
            } => (
                "Success",
                format!(
                    "Found shortest path with length {path_length} in {:.2}s",
                    execution_time.as_secs_f64()
                ),
            ),
            Outcome::NoPath => (
                "No Path",
                "No path exists between the start and end points.".to_owned(),
            ),
            Outcome::MissingEndpoints => (
                "Error",
                "Please set both start and end points before finding a path.".to_owned(),
            ),
            Outcome::MazeGenerated => (
                "Maze Generated",
                "A random maze has been generated with start and end points.".to_owned(),
            ),
            Outcome::SaveSucceeded => (
                "Grid Saved",
                "Your grid configuration has been saved.".to_owned(),
            ),
            Outcome::SaveFailed => ("Save Failed", "Failed to save grid configuration.".to_owned()),
            Outcome::LoadSucceeded => (
                "Grid Loaded",
                "Your saved grid configuration has been loaded.".to_owned(),
            ),
            Outcome::LoadFailed { malformed: true } => {
                ("Load Failed", "Invalid grid data format.".to_owned())
            }
            Outcome::LoadFailed { malformed: false } => {
                ("Load Failed", "Failed to load grid configuration.".to_owned())
            }
            Outcome::LoadEmpty => (
                "No Saved Grid",
                "No saved grid configuration found.".to_owned(),
            ),
        };
        Notification {
            kind: self.kind(),
            title: title.to_owned(),
            message,
        }
    }
}

pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

/// Collects notifications, mostly useful in tests.
impl Notifier for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

/// Forwards notifications to the [log] facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, notification: Notification) {
        match notification.kind {
            NotificationKind::Error => error!("{}: {}", notification.title, notification.message),
            _ => info!("{}: {}", notification.title, notification.message),
        }
    }
}
