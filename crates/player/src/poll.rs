// Cancellable periodic task driving progress callbacks

use lingo_core::{AudioError, Result};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

/// Roughly one display frame at 60 fps
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// How progress polling is driven while a player is playing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// A background thread polls at the given interval
    Background(Duration),
    /// The host calls `PcmPlayer::tick` from its own frame loop
    External,
}

impl Default for PollMode {
    fn default() -> Self {
        PollMode::Background(DEFAULT_POLL_INTERVAL)
    }
}

/// Returned by each frame to keep the task alive or end it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollControl {
    Continue,
    Break,
}

/// Handle to a running poll thread
/// Cancelling (or dropping) the handle wakes the thread and joins it, so no
/// frame runs after `cancel` returns
pub struct PollTask {
    cancel: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

impl PollTask {
    pub fn spawn<F>(interval: Duration, mut frame: F) -> Result<Self>
    where
        F: FnMut() -> PollControl + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("lingo-progress".to_string())
            .spawn(move || loop {
                match cancel_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if frame() == PollControl::Break {
                            break;
                        }
                    }
                    // Cancelled
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| AudioError::ThreadError(format!("Failed to spawn progress poll: {}", e)))?;

        Ok(Self {
            cancel: Some(cancel_tx),
            thread_id: handle.thread().id(),
            handle: Some(handle),
        })
    }

    /// Stop the task and wait for an in-flight frame to finish
    /// Called from inside a frame, the task ends after that frame instead
    pub fn cancel(&mut self) {
        self.cancel.take();
        if let Some(handle) = self.handle.take() {
            if thread::current().id() == self.thread_id {
                return;
            }
            if handle.join().is_err() {
                log::error!("Progress poll thread panicked");
            }
        }
    }

    #[cfg(test)]
    fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
