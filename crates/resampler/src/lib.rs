// Variable-rate reading and channel conversion for mono sources

/// Reads a mono source at an arbitrary speed into an output device's rate
/// and channel layout
#[derive(Debug, Clone, Copy)]
pub struct Resampler {
    input_rate: u32,
    output_rate: u32,
    output_channels: u16,
}

impl Resampler {
    pub fn new(input_rate: u32, output_rate: u32, output_channels: u16) -> Self {
        Self {
            input_rate: input_rate.max(1),
            output_rate: output_rate.max(1),
            output_channels: output_channels.max(1),
        }
    }

    /// Source frames consumed per output frame at playback `rate`
    pub fn step(&self, rate: f32) -> f64 {
        rate as f64 * self.input_rate as f64 / self.output_rate as f64
    }

    pub fn output_channels(&self) -> usize {
        self.output_channels as usize
    }

    /// Simple linear interpolation at a fractional source position
    /// The frame after the last one is the first frame when looping, else silence
    pub fn sample_at(input: &[f32], position: f64, looping: bool) -> f32 {
        if input.is_empty() || position < 0.0 {
            return 0.0;
        }

        let floor = position.floor() as usize;
        if floor >= input.len() {
            return 0.0;
        }

        let frac = (position - floor as f64) as f32;
        let sample1 = input[floor];
        let sample2 = match input.get(floor + 1) {
            Some(&next) => next,
            None if looping => input[0],
            None => 0.0,
        };

        sample1 + (sample2 - sample1) * frac
    }

    /// Mono to N channels: duplicate the sample into every channel
    pub fn write_frame(&self, sample: f32, frame: &mut [f32]) {
        for slot in frame.iter_mut().take(self.output_channels as usize) {
            *slot += sample;
        }
    }
}

/// Check if the device format differs from the source format
pub fn needs_resampling(input_rate: u32, output_rate: u32, output_channels: u16) -> bool {
    input_rate != output_rate || output_channels != 1
}
