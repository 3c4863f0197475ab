// Raw PCM decoding
// Converts signed 16-bit little-endian mono PCM into normalized f32 buffers

use lingo_core::PCM_SAMPLE_RATE;

/// Scale between i16 samples and normalized floats
const I16_SCALE: f32 = 32768.0;

/// Decoded mono audio, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Wrap already-normalized samples
    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate: sample_rate.max(1),
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode s16le mono PCM
///
/// A trailing odd byte is dropped. Never fails: empty input yields a
/// zero-duration buffer.
pub fn decode(bytes: &[u8], sample_rate: u32) -> AudioBuffer {
    if bytes.len() % 2 != 0 {
        log::debug!("Dropping trailing odd byte from {} byte PCM payload", bytes.len());
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / I16_SCALE)
        .collect();

    AudioBuffer::from_samples(samples, sample_rate)
}

/// Decode at the synthesis boundary's fixed rate (24 kHz)
pub fn decode_default(bytes: &[u8]) -> AudioBuffer {
    decode(bytes, PCM_SAMPLE_RATE)
}

/// Quantize normalized samples back to s16le
/// Out-of-range input is clamped to [-1.0, 1.0]
pub fn encode(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_decode_sample_values() {
        let bytes = le(&[0, 16384, -16384, i16::MIN, i16::MAX]);
        let buffer = decode(&bytes, 24_000);

        assert_eq!(buffer.len(), 5);
        let expected = [0.0, 0.5, -0.5, -1.0, 32767.0 / 32768.0];
        for (got, want) in buffer.samples().iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-6, "{} != {}", got, want);
        }
    }

    #[test]
    fn test_decode_every_i16_value() {
        let values: Vec<i16> = (i16::MIN..=i16::MAX).collect();
        let buffer = decode(&le(&values), 24_000);

        assert_eq!(buffer.len(), 65_536);
        for (value, sample) in values.iter().zip(buffer.samples()) {
            assert_eq!(*sample, *value as f32 / 32768.0, "sample {}", value);
            assert!((-1.0..1.0).contains(sample));
        }
    }

    #[test]
    fn test_odd_trailing_byte_is_ignored() {
        let mut bytes = le(&[100, -200, 300]);
        let even = decode(&bytes, 24_000);
        bytes.push(0x7f);
        let odd = decode(&bytes, 24_000);

        assert_eq!(odd, even);
        assert_eq!(odd.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        let buffer = decode(&[], 24_000);
        assert!(buffer.is_empty());
        assert_eq!(buffer.duration(), 0.0);

        // A single byte truncates to nothing as well
        assert!(decode(&[0xff], 24_000).is_empty());
    }

    #[test]
    fn test_duration() {
        let bytes = vec![0u8; 24_000 * 2 * 3];
        let buffer = decode_default(&bytes);
        assert_eq!(buffer.sample_rate(), 24_000);
        assert!((buffer.duration() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_encode_clamps_and_decodes_back() {
        let bytes = encode(&[0.25, 2.0, -2.0]);
        assert_eq!(bytes.len(), 6);

        let buffer = decode(&bytes, 24_000);
        assert!((buffer.samples()[0] - 0.25).abs() < 1e-4);
        assert!((buffer.samples()[1] - 32767.0 / 32768.0).abs() < 1e-6);
        assert!((buffer.samples()[2] + 32767.0 / 32768.0).abs() < 1e-6);
    }
}
