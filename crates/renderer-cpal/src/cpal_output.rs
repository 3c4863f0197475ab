// cpal-based output context
// The stream lives on its own thread; the context talks to it over a channel

use crate::mixer::Mixer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use lingo_core::{AudioError, Result};
use lingo_renderer_api::{
    ContextFactory, ContextState, OutputBackend, OutputContext, OutputSpec, SourceNode, SourceParams,
};
use lingo_resampler::needs_resampling;
use parking_lot::Mutex;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

enum Command {
    Resume(mpsc::Sender<Result<()>>),
}

/// Output context backed by the default cpal device
pub struct CpalOutput {
    spec: OutputSpec,
    mixer: Arc<Mixer>,
    state: Mutex<ContextState>,
    commands: Mutex<mpsc::Sender<Command>>,
}

impl CpalOutput {
    pub fn new(spec: OutputSpec) -> Result<Self> {
        log::info!("Initializing cpal output context at {}Hz", spec.sample_rate);

        let (ready_tx, ready_rx) = mpsc::channel::<Result<Arc<Mixer>>>();
        let (command_tx, command_rx) = mpsc::channel::<Command>();

        thread::Builder::new()
            .name("lingo-audio".to_string())
            .spawn(move || audio_thread(ready_tx, command_rx))
            .map_err(|e| AudioError::ThreadError(format!("Failed to spawn audio thread: {}", e)))?;

        let mixer = ready_rx.recv().map_err(|_| {
            AudioError::ThreadError("Audio thread exited during setup".to_string())
        })??;

        if needs_resampling(spec.sample_rate, mixer.device_rate(), mixer.channels()) {
            log::info!(
                "Device runs at {}Hz with {} channels; sources are converted on the fly",
                mixer.device_rate(),
                mixer.channels()
            );
        }

        let output = Self {
            spec,
            mixer,
            state: Mutex::new(ContextState::Suspended),
            commands: Mutex::new(command_tx),
        };

        if !spec.start_suspended {
            output.resume()?;
        }

        Ok(output)
    }
}

impl OutputBackend for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.mixer.current_time()
    }

    fn state(&self) -> ContextState {
        *self.state.lock()
    }

    fn resume(&self) -> Result<()> {
        let mut state = self.state.lock();
        match *state {
            ContextState::Running => return Ok(()),
            ContextState::Closed => {
                return Err(AudioError::DeviceError("Output context is closed".to_string()))
            }
            ContextState::Suspended => {}
        }

        let (reply_tx, reply_rx) = mpsc::channel();
        if self.commands.lock().send(Command::Resume(reply_tx)).is_err() {
            *state = ContextState::Closed;
            return Err(AudioError::DeviceError("Audio thread is gone".to_string()));
        }

        match reply_rx.recv() {
            Ok(Ok(())) => {
                *state = ContextState::Running;
                log::info!("Output context running");
                Ok(())
            }
            Ok(Err(e)) => {
                log::warn!("Output context resume failed: {}", e);
                Err(e)
            }
            Err(_) => {
                *state = ContextState::Closed;
                Err(AudioError::DeviceError("Audio thread is gone".to_string()))
            }
        }
    }

    fn start_source(&self, params: SourceParams) -> Result<Box<dyn SourceNode>> {
        if *self.state.lock() == ContextState::Closed {
            return Err(AudioError::DeviceError("Output context is closed".to_string()));
        }
        log::debug!("Starting source {:?}", params);
        Ok(Box::new(self.mixer.add_voice(params)))
    }

    fn active_sources(&self) -> usize {
        self.mixer.active_voices()
    }
}

fn audio_thread(ready: mpsc::Sender<Result<Arc<Mixer>>>, commands: mpsc::Receiver<Command>) {
    let stream = match build_stream() {
        Ok((stream, mixer)) => {
            if ready.send(Ok(mixer)).is_err() {
                return;
            }
            stream
        }
        Err(e) => {
            log::error!("Failed to open output device: {}", e);
            let _ = ready.send(Err(e));
            return;
        }
    };

    // Runs until the context drops its command sender
    for command in commands.iter() {
        match command {
            Command::Resume(reply) => {
                let result = stream
                    .play()
                    .map_err(|e| AudioError::DeviceError(format!("Failed to resume stream: {}", e)));
                let _ = reply.send(result);
            }
        }
    }

    log::info!("Output context released, closing stream");
    let _ = stream.pause();
}

fn build_stream() -> Result<(cpal::Stream, Arc<Mixer>)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::DeviceError("No output device available".to_string()))?;

    log::info!(
        "Using audio device: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );

    let config = device
        .default_output_config()
        .map_err(|e| AudioError::DeviceError(format!("Output config failed: {}", e)))?;

    if config.sample_format() != cpal::SampleFormat::F32 {
        return Err(AudioError::UnsupportedFormat(format!(
            "Only f32 output is supported, device offers {:?}",
            config.sample_format()
        )));
    }

    let mixer = Arc::new(Mixer::new(config.sample_rate().0, config.channels()));
    let mixer_for_cb = mixer.clone();

    let stream = device
        .build_output_stream(
            &config.config(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                mixer_for_cb.render(data);
            },
            |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::InitializationError(format!("Failed to build output stream: {}", e)))?;

    // Some hosts start streams immediately; contexts begin suspended
    let _ = stream.pause();

    Ok((stream, mixer))
}

/// Creates cpal-backed contexts
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalFactory;

impl ContextFactory for CpalFactory {
    fn create_context(&self, spec: OutputSpec) -> Result<OutputContext> {
        Ok(OutputContext::new(Arc::new(CpalOutput::new(spec)?)))
    }
}
