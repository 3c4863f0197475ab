// Voice mixing for the device callback

use lingo_decode::AudioBuffer;
use lingo_renderer_api::{SourceNode, SourceParams};
use lingo_resampler::Resampler;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// One buffer being rendered
pub(crate) struct Voice {
    buffer: Arc<AudioBuffer>,
    resampler: Resampler,
    /// Read position in source frames
    cursor: Mutex<f64>,
    rate_bits: AtomicU32,
    looping: bool,
    stopped: AtomicBool,
    ended: AtomicBool,
}

impl Voice {
    fn is_active(&self) -> bool {
        !self.stopped.load(Ordering::Relaxed) && !self.ended.load(Ordering::Relaxed)
    }

    /// Add this voice into an interleaved device buffer
    fn render_into(&self, data: &mut [f32]) {
        let samples = self.buffer.samples();
        let len = samples.len() as f64;
        let channels = self.resampler.output_channels();
        let step = self
            .resampler
            .step(f32::from_bits(self.rate_bits.load(Ordering::Relaxed)));

        let mut cursor = self.cursor.lock();
        for frame in data.chunks_exact_mut(channels) {
            if *cursor >= len {
                if self.looping && len > 0.0 {
                    *cursor %= len;
                } else {
                    break;
                }
            }
            let sample = Resampler::sample_at(samples, *cursor, self.looping);
            self.resampler.write_frame(sample, frame);
            *cursor += step;
        }

        if !self.looping && *cursor >= len {
            self.ended.store(true, Ordering::Relaxed);
        }
    }
}

/// Player-side handle of a mixer voice
pub(crate) struct MixerSource(Arc<Voice>);

impl SourceNode for MixerSource {
    fn set_rate(&self, rate: f32) {
        self.0.rate_bits.store(rate.to_bits(), Ordering::Relaxed);
    }

    fn stop(&self) {
        self.0.stopped.store(true, Ordering::Relaxed);
    }

    fn has_ended(&self) -> bool {
        self.0.ended.load(Ordering::Relaxed)
    }
}

impl Drop for MixerSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sums active voices into the device buffer and keeps the context clock
pub struct Mixer {
    voices: Mutex<Vec<Arc<Voice>>>,
    frames_rendered: AtomicU64,
    device_rate: u32,
    channels: u16,
}

impl Mixer {
    pub fn new(device_rate: u32, channels: u16) -> Self {
        Self {
            voices: Mutex::new(Vec::new()),
            frames_rendered: AtomicU64::new(0),
            device_rate: device_rate.max(1),
            channels: channels.max(1),
        }
    }

    pub fn device_rate(&self) -> u32 {
        self.device_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub(crate) fn add_voice(&self, params: SourceParams) -> MixerSource {
        let start_frame = params.offset.max(0.0) * params.buffer.sample_rate() as f64;
        let voice = Arc::new(Voice {
            resampler: Resampler::new(params.buffer.sample_rate(), self.device_rate, self.channels),
            buffer: params.buffer,
            cursor: Mutex::new(start_frame),
            rate_bits: AtomicU32::new(params.rate.to_bits()),
            looping: params.looping,
            stopped: AtomicBool::new(false),
            ended: AtomicBool::new(false),
        });
        self.voices.lock().push(voice.clone());
        MixerSource(voice)
    }

    /// Fill an interleaved device buffer; this runs on the audio thread
    pub fn render(&self, data: &mut [f32]) {
        data.fill(0.0);

        let mut voices = self.voices.lock();
        voices.retain(|voice| voice.is_active());
        for voice in voices.iter() {
            voice.render_into(data);
        }
        drop(voices);

        for sample in data.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        let frames = data.len() / self.channels as usize;
        self.frames_rendered.fetch_add(frames as u64, Ordering::Relaxed);
    }

    /// Seconds of audio handed to the device so far
    pub fn current_time(&self) -> f64 {
        self.frames_rendered.load(Ordering::Relaxed) as f64 / self.device_rate as f64
    }

    pub fn active_voices(&self) -> usize {
        self.voices.lock().iter().filter(|voice| voice.is_active()).count()
    }
}
