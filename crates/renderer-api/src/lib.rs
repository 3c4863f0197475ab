// Audio output abstraction layer
// A context owns the connection to the output device and its clock; players
// start one source node at a time on it

mod virtual_output;

pub use virtual_output::{VirtualFactory, VirtualOutput};

use lingo_core::{AudioError, Result, PCM_SAMPLE_RATE};
use lingo_decode::AudioBuffer;
use std::fmt;
use std::sync::Arc;

/// Output context specification
#[derive(Debug, Clone, Copy)]
pub struct OutputSpec {
    /// Logical context rate; every source buffer is expected at this rate
    pub sample_rate: u32,
    /// Mirror host platforms that create audio suspended until a user gesture
    pub start_suspended: bool,
}

impl Default for OutputSpec {
    fn default() -> Self {
        Self {
            sample_rate: PCM_SAMPLE_RATE,
            start_suspended: true,
        }
    }
}

/// Lifecycle of an output context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created but not rendering; the clock does not advance
    Suspended,
    Running,
    Closed,
}

/// Everything a backend needs to start rendering one buffer
#[derive(Clone)]
pub struct SourceParams {
    pub buffer: Arc<AudioBuffer>,
    /// Start position in seconds
    pub offset: f64,
    pub rate: f32,
    pub looping: bool,
}

impl fmt::Debug for SourceParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceParams")
            .field("duration", &self.buffer.duration())
            .field("offset", &self.offset)
            .field("rate", &self.rate)
            .field("looping", &self.looping)
            .finish()
    }
}

/// A single rendering source, exclusively owned by one player
/// Dropping the handle stops the source
pub trait SourceNode: Send + Sync {
    /// Change the playback speed without restarting
    fn set_rate(&self, rate: f32);

    /// Halt rendering; does not count as a natural end
    fn stop(&self);

    /// True once a non-looping source has rendered its whole buffer
    fn has_ended(&self) -> bool;
}

/// Platform backend trait
/// Platform-specific implementations (cpal, headless) implement this trait
pub trait OutputBackend: Send + Sync {
    /// Logical sample rate of the context
    fn sample_rate(&self) -> u32;

    /// Context clock in seconds; only advances while running
    fn current_time(&self) -> f64;

    fn state(&self) -> ContextState;

    /// Leave the suspended state; may fail if the device is blocked
    fn resume(&self) -> Result<()>;

    fn start_source(&self, params: SourceParams) -> Result<Box<dyn SourceNode>>;

    /// Number of sources currently rendering
    fn active_sources(&self) -> usize;
}

/// Shared handle to the session's output context
/// Cloning shares the same backend; no holder may close or reconfigure it
#[derive(Clone)]
pub struct OutputContext {
    backend: Arc<dyn OutputBackend>,
}

impl OutputContext {
    pub fn new(backend: Arc<dyn OutputBackend>) -> Self {
        Self { backend }
    }

    pub fn sample_rate(&self) -> u32 {
        self.backend.sample_rate()
    }

    pub fn current_time(&self) -> f64 {
        self.backend.current_time()
    }

    pub fn state(&self) -> ContextState {
        self.backend.state()
    }

    /// Resume the context if it is suspended
    pub fn ensure_running(&self) -> Result<()> {
        match self.backend.state() {
            ContextState::Running => Ok(()),
            ContextState::Suspended => {
                log::info!("Resuming suspended output context");
                self.backend.resume()
            }
            ContextState::Closed => Err(AudioError::DeviceError(
                "Output context is closed".to_string(),
            )),
        }
    }

    pub fn start_source(&self, params: SourceParams) -> Result<Box<dyn SourceNode>> {
        self.backend.start_source(params)
    }

    pub fn active_sources(&self) -> usize {
        self.backend.active_sources()
    }

    /// Whether both handles refer to the same context
    pub fn ptr_eq(a: &OutputContext, b: &OutputContext) -> bool {
        Arc::ptr_eq(&a.backend, &b.backend)
    }
}

impl fmt::Debug for OutputContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputContext")
            .field("sample_rate", &self.sample_rate())
            .field("state", &self.state())
            .finish()
    }
}

/// Output context factory trait
/// Allows sessions to create platform-specific contexts lazily
pub trait ContextFactory: Send + Sync {
    fn create_context(&self, spec: OutputSpec) -> Result<OutputContext>;
}
