// Waveform envelope rendering

use lingo_decode::AudioBuffer;

/// Min/max amplitude of one pixel column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub min: f32,
    pub max: f32,
}

impl Peak {
    fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

/// A filled rectangle in a `width x height` strip, y growing downwards
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformBar {
    pub x: u32,
    pub y: f32,
    pub height: f32,
}

/// Per-column envelope over windows of `ceil(len / width)` samples
pub fn compute_peaks(samples: &[f32], width: u32) -> Vec<Peak> {
    if width == 0 {
        return Vec::new();
    }

    let step = samples.len().div_ceil(width as usize).max(1);
    (0..width as usize)
        .map(|column| {
            let start = (column * step).min(samples.len());
            let end = (start + step).min(samples.len());
            samples[start..end].iter().fold(
                Peak { min: 1.0, max: -1.0 },
                |peak, &s| Peak {
                    min: peak.min.min(s),
                    max: peak.max.max(s),
                },
            )
        })
        .collect()
}

/// One bar per column; silent or empty columns collapse to a 1px line
pub fn render(buffer: &AudioBuffer, width: u32, height: u32) -> Vec<WaveformBar> {
    let half = height as f32 / 2.0;
    compute_peaks(buffer.samples(), width)
        .into_iter()
        .enumerate()
        .map(|(x, peak)| {
            let peak = if peak.is_empty() {
                Peak { min: 0.0, max: 0.0 }
            } else {
                peak
            };
            WaveformBar {
                x: x as u32,
                y: (1.0 + peak.min) * half,
                height: ((peak.max - peak.min) * half).max(1.0),
            }
        })
        .collect()
}
