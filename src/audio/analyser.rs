use anyhow::Result;

use super::decode::AudioData;
use crate::pitch::frequency::BLOCK_SIZE;

pub const MIN_SIZE: usize = 32;
pub const MAX_SIZE: usize = 16384;

/// Snapshot of the most recent samples at one instant. Its length is fixed
/// by the [`Analyser`] that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioFrame {
    samples: Box<[f32]>,
}

impl AudioFrame {
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Hands out fixed-size waveform windows over a decoded signal, the way a
/// live analyser node would at each animation tick.
pub struct Analyser<'a> {
    audio: &'a AudioData,
    size: usize,
    block_time: f32,
}

impl<'a> Analyser<'a> {
    /// `block_time` defaults to `128 / sample_rate` seconds.
    pub fn new(audio: &'a AudioData, size: usize, block_time: Option<f32>) -> Result<Self> {
        validate_size(size)?;
        if audio.sample_rate == 0 {
            anyhow::bail!("Audio has a sample rate of zero");
        }

        let block_time = match block_time {
            Some(t) if t.is_finite() && t > 0.0 => t,
            Some(t) => anyhow::bail!("Block time must be a positive number of seconds, got {}", t),
            None => BLOCK_SIZE / audio.sample_rate as f32,
        };

        log::info!(
            "Analyser: {} samples per frame, block time {:.6}s",
            size,
            block_time
        );

        Ok(Self {
            audio,
            size,
            block_time,
        })
    }

    pub fn block_time(&self) -> f32 {
        self.block_time
    }

    pub fn duration(&self) -> f32 {
        self.audio.duration()
    }

    /// Number of video frames needed to cover the whole signal at `fps`.
    pub fn frame_count(&self, fps: u32) -> usize {
        let samples = self.audio.samples.len() as u64;
        (samples * fps as u64).div_ceil(self.audio.sample_rate as u64) as usize
    }

    /// The `size` samples ending at `elapsed_seconds`. Positions before the
    /// start of the signal read as silence; samples are clamped to [-1, 1].
    pub fn frame_at(&self, elapsed_seconds: f64) -> AudioFrame {
        let end = window_end(elapsed_seconds, self.audio.sample_rate).min(self.audio.samples.len());
        let start = end.saturating_sub(self.size);
        let available = &self.audio.samples[start..end];

        let mut samples = vec![0.0f32; self.size];
        let offset = self.size - available.len();
        for (dst, &src) in samples[offset..].iter_mut().zip(available) {
            *dst = src.clamp(-1.0, 1.0);
        }

        AudioFrame {
            samples: samples.into_boxed_slice(),
        }
    }
}

/// Sample index one past the window ending at `elapsed_seconds`.
///
/// Computed in f64: past 2^24 samples an f32 product snaps to even indices.
fn window_end(elapsed_seconds: f64, sample_rate: u32) -> usize {
    (elapsed_seconds.max(0.0) * sample_rate as f64).round() as usize
}

/// Analyser sizes are powers of two between 32 and 16384.
pub fn validate_size(size: usize) -> Result<()> {
    if !size.is_power_of_two() || !(MIN_SIZE..=MAX_SIZE).contains(&size) {
        anyhow::bail!(
            "Analyser size must be a power of two between {} and {}, got {}",
            MIN_SIZE,
            MAX_SIZE,
            size
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize, sample_rate: u32) -> AudioData {
        AudioData {
            samples: (0..len).map(|i| i as f32 / len as f32).collect(),
            sample_rate,
        }
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(validate_size(256).is_ok());
        assert!(validate_size(512).is_ok());
        assert!(validate_size(300).is_err());
        assert!(validate_size(16).is_err());
        assert!(validate_size(32768).is_err());
    }

    #[test]
    fn block_time_follows_sample_rate() {
        let audio = ramp(100, 48_000);
        let analyser = Analyser::new(&audio, 256, None).unwrap();
        assert!((analyser.block_time() - 128.0 / 48_000.0).abs() < 1e-9);

        let fixed = Analyser::new(&audio, 256, Some(0.002667)).unwrap();
        assert_eq!(fixed.block_time(), 0.002667);
        assert!(Analyser::new(&audio, 256, Some(0.0)).is_err());
    }

    #[test]
    fn frames_have_constant_length() {
        let audio = ramp(1000, 1000);
        let analyser = Analyser::new(&audio, 64, None).unwrap();
        for t in [0.0, 0.01, 0.5, 1.0, 5.0, -1.0] {
            assert_eq!(analyser.frame_at(t).len(), 64);
        }
    }

    #[test]
    fn frame_ends_at_elapsed_time() {
        let audio = ramp(1000, 1000);
        let analyser = Analyser::new(&audio, 32, None).unwrap();
        let frame = analyser.frame_at(0.5);
        assert_eq!(frame.samples().last().copied(), Some(499.0 / 1000.0));
        assert_eq!(frame.samples()[0], 468.0 / 1000.0);
    }

    #[test]
    fn early_frames_are_zero_padded() {
        let audio = ramp(1000, 1000);
        let analyser = Analyser::new(&audio, 32, None).unwrap();
        let frame = analyser.frame_at(0.010);
        assert!(frame.samples()[..22].iter().all(|&s| s == 0.0));
        assert_eq!(frame.samples()[31], 9.0 / 1000.0);

        let start = analyser.frame_at(0.0);
        assert!(start.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn window_end_stays_exact_for_long_inputs() {
        // Frame 12001 at 30 fps lands on sample 17_641_470, beyond 2^24.
        assert_eq!(window_end(12_001.0 / 30.0, 44_100), 17_641_470);
        assert_eq!(window_end(12_001.0 / 30.0 + 1.0 / 44_100.0, 44_100), 17_641_471);
        assert_eq!(window_end(-0.5, 44_100), 0);
    }

    #[test]
    fn frame_count_covers_the_tail() {
        let audio = ramp(1000, 1000);
        let analyser = Analyser::new(&audio, 32, None).unwrap();
        assert_eq!(analyser.frame_count(30), 30);

        let longer = ramp(1001, 1000);
        let analyser = Analyser::new(&longer, 32, None).unwrap();
        assert_eq!(analyser.frame_count(30), 31);
    }

    #[test]
    fn samples_are_clamped() {
        let audio = AudioData {
            samples: vec![2.0, -3.0, 0.5, 1.5],
            sample_rate: 4,
        };
        let analyser = Analyser::new(&audio, 32, None).unwrap();
        let frame = analyser.frame_at(1.0);
        assert_eq!(&frame.samples()[28..], &[1.0, -1.0, 0.5, 1.0]);
    }
}
