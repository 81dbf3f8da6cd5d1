pub mod color;
pub mod frequency;
pub mod wavelength;

use thiserror::Error;

use color::FrameColors;
use frequency::PitchClass;
use wavelength::PeriodEstimate;

/// Frame-local analysis failures. None of these stop rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PitchError {
    #[error("fewer than two matching extrema; period cannot be estimated")]
    InsufficientExtrema,

    #[error("frequency is undefined for this frame")]
    UndefinedFrequency,

    #[error("octave {octave} is outside the displayable range")]
    OutOfRangePitch { octave: i32 },
}

/// Lowest and highest sample seen in a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmplitudeRange {
    pub min: f32,
    pub max: f32,
}

impl AmplitudeRange {
    /// Starts from the inverted range (min = 1, max = -1), so an empty frame
    /// reports the widest possible spread.
    pub fn from_samples(samples: &[f32]) -> Self {
        samples.iter().fold(
            Self {
                min: 1.0,
                max: -1.0,
            },
            |acc, &s| Self {
                min: acc.min.min(s),
                max: acc.max.max(s),
            },
        )
    }

    /// `|max| + |min|`, in `[0, 2]` for samples in `[-1, 1]`.
    pub fn spread(&self) -> f32 {
        self.max.abs() + self.min.abs()
    }
}

/// Everything the renderer needs to know about one audio frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PitchReading {
    pub period: Result<PeriodEstimate, PitchError>,
    pub frequency: Result<f32, PitchError>,
    pub class: Result<PitchClass, PitchError>,
    pub colors: FrameColors,
    pub amplitude: AmplitudeRange,
}

impl PitchReading {
    /// Run the full pipeline over one frame of samples.
    pub fn analyze(samples: &[f32], block_time: f32) -> Self {
        let period = wavelength::estimate_period(samples);
        let frequency = frequency::frequency_hz(period.ok(), block_time);
        let class = frequency.and_then(PitchClass::from_frequency);
        let colors = FrameColors::encode(&class);

        Self {
            period,
            frequency,
            class,
            colors,
            amplitude: AmplitudeRange::from_samples(samples),
        }
    }

    /// Note ordinal when it can drive the ring dashes.
    pub fn dashes(&self) -> Option<u32> {
        self.class
            .ok()
            .filter(PitchClass::note_in_range)
            .map(|c| c.note as u32)
    }

    /// First problem with this reading, if any, for logging.
    pub fn problem(&self) -> Option<PitchError> {
        match (&self.period, &self.class) {
            (Err(e), _) => Some(*e),
            (_, Err(e)) => Some(*e),
            (_, Ok(class)) => class.displayable().err(),
        }
    }
}
