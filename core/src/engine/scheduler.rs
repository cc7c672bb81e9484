//! Periodic task scheduling.
//!
//! The engine never keeps time itself; the host hands it a [`Scheduler`]
//! that runs the flush off the caller's thread on a fixed interval.
//! [`ThreadScheduler`] is a plain background-thread implementation.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, StatsError};


/// A repeating job to run. Must not block indefinitely.
pub type Task = Box<dyn Fn() + Send + 'static>;


pub trait Scheduler {
    /// Run `task` every `interval`, first run one interval from now,
    /// until the returned handle is cancelled or dropped.
    fn schedule_repeating(&self, interval: Duration, task: Task) -> Result<ScheduledTask>;
}


/// Handle to a scheduled job. Cancelling (or dropping) stops future runs.
pub struct ScheduledTask {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl ScheduledTask {
    /// Wrap a host-specific cancel action.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        ScheduledTask {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing to cancel.
    pub fn detached() -> Self {
        ScheduledTask { cancel: None }
    }

    pub fn cancel(mut self) {
        self.cancel_ref();
    }

    fn cancel_ref(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel_ref();
    }
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}


/// Runs each scheduled task on its own named background thread.
#[derive(Debug, Clone)]
pub struct ThreadScheduler {
    name: String,
}

impl ThreadScheduler {
    pub fn new(name: &str) -> Self {
        ThreadScheduler {
            name: name.to_string(),
        }
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        ThreadScheduler::new("statledger-flush")
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule_repeating(&self, interval: Duration, task: Task) -> Result<ScheduledTask> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let name = self.name.clone();

        let handle = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => task(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                        debug!(thread = %name, "scheduled task stopped");
                        break;
                    }
                }
            })
            .map_err(|e| StatsError::Scheduler(format!("failed to spawn '{}': {}", self.name, e)))?;

        Ok(ScheduledTask::new(move || {
            let _ = stop_tx.send(());
            // Cancelling from inside the task itself must not join its own thread.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }))
    }
}
