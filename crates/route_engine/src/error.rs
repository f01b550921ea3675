//! Route engine error types

use contracts::ContractError;
use dispatcher::DispatcherError;
use thiserror::Error;

/// Route lifecycle errors
#[derive(Debug, Error)]
pub enum RouteError {
    /// Timer could not be scheduled; the route does not start
    #[error("failed to schedule timer '{timer}': {message}")]
    Scheduling { timer: String, message: String },

    /// `start` called on a running route
    #[error("route '{route}' is already running")]
    AlreadyRunning { route: String },

    /// Sink binding failed
    #[error("dispatcher error: {0}")]
    Dispatcher(#[from] DispatcherError),

    /// Route definition is invalid
    #[error("route configuration error: {0}")]
    Contract(#[from] ContractError),

    /// Route task ended abnormally
    #[error("route '{route}' task failed: {message}")]
    Task { route: String, message: String },
}

impl RouteError {
    pub fn scheduling(timer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Scheduling {
            timer: timer.into(),
            message: message.into(),
        }
    }

    pub fn already_running(route: impl Into<String>) -> Self {
        Self::AlreadyRunning {
            route: route.into(),
        }
    }

    pub fn task(route: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Task {
            route: route.into(),
            message: message.into(),
        }
    }
}
