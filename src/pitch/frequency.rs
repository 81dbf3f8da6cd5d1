use super::wavelength::PeriodEstimate;
use super::PitchError;

/// Samples per processing block committed to by the analyser.
pub const BLOCK_SIZE: f32 = 128.0;

/// Frequency of octave 0 (roughly C0).
pub const OCTAVE_ZERO_HZ: f32 = 16.0;

pub const NOTES_PER_OCTAVE: f32 = 12.0;

pub const MIN_DISPLAY_OCTAVE: i32 = 1;
pub const MAX_DISPLAY_OCTAVE: i32 = 12;

/// Convert a period estimate into Hz: `BLOCK_SIZE / (block_time * period)`.
pub fn frequency_hz(period: Option<PeriodEstimate>, block_time: f32) -> Result<f32, PitchError> {
    let period = period.ok_or(PitchError::UndefinedFrequency)?;
    let frequency = BLOCK_SIZE / (block_time * period.samples() as f32);
    if frequency.is_finite() && frequency > 0.0 {
        Ok(frequency)
    } else {
        Err(PitchError::UndefinedFrequency)
    }
}

/// Octave bucket and note ordinal derived from a single frequency.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PitchClass {
    pub octave_real: f32,
    pub octave: i32,
    pub note: i32,
}

impl PitchClass {
    /// Classify `frequency` relative to [`OCTAVE_ZERO_HZ`].
    ///
    /// `note` uses a truncated floating-point remainder, so it lands in
    /// `1..=12` for non-negative octaves and below 1 for sub-zero octaves.
    pub fn from_frequency(frequency: f32) -> Result<Self, PitchError> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(PitchError::UndefinedFrequency);
        }

        let octave_real = (frequency / OCTAVE_ZERO_HZ).log2();
        let note_real = 1.0 + (NOTES_PER_OCTAVE * octave_real) % NOTES_PER_OCTAVE;

        Ok(Self {
            octave_real,
            octave: octave_real.floor() as i32,
            note: note_real.floor() as i32,
        })
    }

    pub fn octave_in_range(&self) -> bool {
        (MIN_DISPLAY_OCTAVE..=MAX_DISPLAY_OCTAVE).contains(&self.octave)
    }

    pub fn note_in_range(&self) -> bool {
        (1..=12).contains(&self.note)
    }

    /// `Err(OutOfRangePitch)` when the octave has no palette bucket.
    pub fn displayable(&self) -> Result<(), PitchError> {
        if self.octave_in_range() {
            Ok(())
        } else {
            Err(PitchError::OutOfRangePitch {
                octave: self.octave,
            })
        }
    }
}
