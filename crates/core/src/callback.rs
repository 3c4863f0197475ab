// Playback callbacks delivered by the progress poll

use std::time::{Duration, Instant};

/// Progress callback: `(current_secs, duration_secs)`
/// Implementations should return quickly; they run on the polling thread
pub type ProgressCallback = Box<dyn FnMut(f64, f64) + Send + 'static>;

/// Invoked once per non-looping playback completion
pub type EndedCallback = Box<dyn FnMut() + Send + 'static>;

/// The callback pair registered by a `play` call
#[derive(Default)]
pub struct PlaybackCallbacks {
    on_progress: Option<ProgressCallback>,
    on_ended: Option<EndedCallback>,
}

impl PlaybackCallbacks {
    pub fn new(on_progress: Option<ProgressCallback>, on_ended: Option<EndedCallback>) -> Self {
        Self {
            on_progress,
            on_ended,
        }
    }

    pub fn progress(&mut self, current_secs: f64, duration_secs: f64) {
        if let Some(callback) = self.on_progress.as_mut() {
            callback(current_secs, duration_secs);
        }
    }

    pub fn ended(&mut self) {
        if let Some(callback) = self.on_ended.as_mut() {
            callback();
        }
    }

    pub fn clear(&mut self) {
        self.on_progress = None;
        self.on_ended = None;
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.on_progress.is_none() && self.on_ended.is_none()
    }
}

/// Throttled progress wrapper
/// Limits delivery frequency for consumers that cannot keep up with the
/// per-frame poll (FFI hosts, log sinks)
pub struct ThrottledProgress {
    inner: ProgressCallback,
    last_update: Option<Instant>,
    interval: Duration,
}

impl ThrottledProgress {
    pub fn new(callback: ProgressCallback, interval_ms: u64) -> Self {
        Self {
            inner: callback,
            last_update: None,
            interval: Duration::from_millis(interval_ms),
        }
    }

    pub fn dispatch(&mut self, current_secs: f64, duration_secs: f64) {
        let due = match self.last_update {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        };
        if due {
            self.last_update = Some(Instant::now());
            (self.inner)(current_secs, duration_secs);
        }
    }

    pub fn into_callback(mut self) -> ProgressCallback {
        Box::new(move |current, duration| self.dispatch(current, duration))
    }
}
