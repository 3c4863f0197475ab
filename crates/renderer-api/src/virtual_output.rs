// Headless output context driven by a manually advanced clock

use crate::{ContextFactory, ContextState, OutputBackend, OutputContext, OutputSpec, SourceNode, SourceParams};
use lingo_core::{AudioError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// Output context that renders nothing
/// Time only moves when `advance` is called, which makes transport timing
/// reproducible for headless hosts and tests
pub struct VirtualOutput {
    spec: OutputSpec,
    clock: Arc<Mutex<f64>>,
    state: Mutex<ContextState>,
    fail_resume: AtomicBool,
    resumes: AtomicUsize,
    voices: Mutex<Vec<Weak<VoiceState>>>,
}

impl VirtualOutput {
    pub fn new(spec: OutputSpec) -> Self {
        let state = if spec.start_suspended {
            ContextState::Suspended
        } else {
            ContextState::Running
        };

        Self {
            spec,
            clock: Arc::new(Mutex::new(0.0)),
            state: Mutex::new(state),
            fail_resume: AtomicBool::new(false),
            resumes: AtomicUsize::new(0),
            voices: Mutex::new(Vec::new()),
        }
    }

    /// Move the context clock forward; ignored unless running
    pub fn advance(&self, seconds: f64) {
        if *self.state.lock() != ContextState::Running {
            log::debug!("Virtual clock not running, ignoring advance of {}s", seconds);
            return;
        }
        *self.clock.lock() += seconds.max(0.0);
    }

    /// Make subsequent `resume` calls fail, as a blocked device would
    pub fn set_fail_resume(&self, fail: bool) {
        self.fail_resume.store(fail, Ordering::SeqCst);
    }

    pub fn suspend(&self) {
        let mut state = self.state.lock();
        if *state == ContextState::Running {
            *state = ContextState::Suspended;
        }
    }

    pub fn close(&self) {
        *self.state.lock() = ContextState::Closed;
    }

    pub fn resume_count(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }
}

impl OutputBackend for VirtualOutput {
    fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    fn current_time(&self) -> f64 {
        *self.clock.lock()
    }

    fn state(&self) -> ContextState {
        *self.state.lock()
    }

    fn resume(&self) -> Result<()> {
        if self.fail_resume.load(Ordering::SeqCst) {
            return Err(AudioError::DeviceError(
                "Output context resume was blocked".to_string(),
            ));
        }

        let mut state = self.state.lock();
        match *state {
            ContextState::Closed => Err(AudioError::DeviceError(
                "Output context is closed".to_string(),
            )),
            _ => {
                *state = ContextState::Running;
                self.resumes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    fn start_source(&self, params: SourceParams) -> Result<Box<dyn SourceNode>> {
        if *self.state.lock() == ContextState::Closed {
            return Err(AudioError::DeviceError(
                "Output context is closed".to_string(),
            ));
        }

        let voice = Arc::new(VoiceState {
            duration: params.buffer.duration(),
            looping: params.looping,
            clock: self.clock.clone(),
            span: Mutex::new(Span {
                offset: params.offset,
                started_at: *self.clock.lock(),
                rate: params.rate,
            }),
            stopped: AtomicBool::new(false),
        });

        let mut voices = self.voices.lock();
        voices.retain(|weak| weak.strong_count() > 0);
        voices.push(Arc::downgrade(&voice));

        Ok(Box::new(VirtualVoice(voice)))
    }

    fn active_sources(&self) -> usize {
        self.voices
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|voice| voice.is_active())
            .count()
    }
}

struct Span {
    offset: f64,
    started_at: f64,
    rate: f32,
}

struct VoiceState {
    duration: f64,
    looping: bool,
    clock: Arc<Mutex<f64>>,
    span: Mutex<Span>,
    stopped: AtomicBool,
}

impl VoiceState {
    fn position(&self) -> f64 {
        let now = *self.clock.lock();
        let span = self.span.lock();
        span.offset + (now - span.started_at) * span.rate as f64
    }

    fn ended(&self) -> bool {
        !self.looping && !self.stopped.load(Ordering::SeqCst) && self.position() >= self.duration
    }

    fn is_active(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst) && !self.ended()
    }
}

struct VirtualVoice(Arc<VoiceState>);

impl SourceNode for VirtualVoice {
    fn set_rate(&self, rate: f32) {
        let now = *self.0.clock.lock();
        let mut span = self.0.span.lock();
        span.offset += (now - span.started_at) * span.rate as f64;
        span.started_at = now;
        span.rate = rate;
    }

    fn stop(&self) {
        self.0.stopped.store(true, Ordering::SeqCst);
    }

    fn has_ended(&self) -> bool {
        self.0.ended()
    }
}

impl Drop for VirtualVoice {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Factory producing virtual contexts; keeps the last one reachable so the
/// host can drive its clock
#[derive(Default)]
pub struct VirtualFactory {
    created: AtomicUsize,
    last: Mutex<Option<Arc<VirtualOutput>>>,
}

impl VirtualFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn last_output(&self) -> Option<Arc<VirtualOutput>> {
        self.last.lock().clone()
    }
}

impl ContextFactory for VirtualFactory {
    fn create_context(&self, spec: OutputSpec) -> Result<OutputContext> {
        log::info!("Creating virtual output context at {}Hz", spec.sample_rate);
        let output = Arc::new(VirtualOutput::new(spec));
        *self.last.lock() = Some(output.clone());
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(OutputContext::new(output))
    }
}
