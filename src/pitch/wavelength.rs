use super::PitchError;

/// Extrema whose amplitude lies within this fraction of the leading
/// extremum's amplitude are treated as the same crest (or trough) family.
pub const ENVELOPE_TOLERANCE: f32 = 0.005;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtremumKind {
    Peak,
    Trough,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extremum {
    pub index: usize,
    pub amplitude: f32,
    pub kind: ExtremumKind,
}

impl Extremum {
    /// True when `self` lies strictly further out than `other` for its kind:
    /// higher for peaks, lower for troughs.
    fn exceeds(&self, other: &Extremum) -> bool {
        match self.kind {
            ExtremumKind::Peak => self.amplitude > other.amplitude,
            ExtremumKind::Trough => self.amplitude < other.amplitude,
        }
    }
}

/// One waveform period, in samples. Always positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeriodEstimate {
    samples: usize,
}

impl PeriodEstimate {
    pub fn new(samples: usize) -> Option<Self> {
        (samples > 0).then_some(Self { samples })
    }

    pub fn samples(&self) -> usize {
        self.samples
    }
}

/// The two most extreme members of one extremum family, ranked by amplitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Leaders {
    pub leading: Extremum,
    pub second: Option<Extremum>,
}

impl Leaders {
    /// Signed sample-index distance from the second-leading to the leading
    /// extremum. `None` until both slots are filled.
    pub fn index_gap(&self) -> Option<i64> {
        self.second
            .map(|second| self.leading.index as i64 - second.index as i64)
    }
}

/// Classify `samples` into peaks and troughs.
///
/// A run of equal samples counts as one candidate, reported at its first
/// index and judged against the samples just outside the run. Runs touching
/// one edge are judged against their single outer neighbour; a run spanning
/// the whole buffer is neither.
pub fn find_extrema(samples: &[f32]) -> Vec<Extremum> {
    let mut extrema = Vec::new();
    let mut start = 0;

    for run in samples.chunk_by(|a, b| a == b) {
        let end = start + run.len();
        let amplitude = run[0];
        let left = start.checked_sub(1).map(|i| samples[i]);
        let right = samples.get(end).copied();

        let kind = match (left, right) {
            (Some(l), Some(r)) if l < amplitude && r < amplitude => Some(ExtremumKind::Peak),
            (Some(l), Some(r)) if l > amplitude && r > amplitude => Some(ExtremumKind::Trough),
            (Some(n), None) | (None, Some(n)) if n < amplitude => Some(ExtremumKind::Peak),
            (Some(n), None) | (None, Some(n)) if n > amplitude => Some(ExtremumKind::Trough),
            _ => None,
        };

        if let Some(kind) = kind {
            extrema.push(Extremum {
                index: start,
                amplitude,
                kind,
            });
        }
        start = end;
    }

    extrema
}

/// Fold a single-kind extremum list (in scan order) into its leading and
/// second-leading members.
///
/// A newcomer strictly more extreme than the current leader demotes the
/// leader to second place. Anything else only fills an empty second slot, so
/// equal amplitudes keep the earlier extremum in front.
pub fn rank_leaders<'a, I>(extrema: I) -> Option<Leaders>
where
    I: IntoIterator<Item = &'a Extremum>,
{
    extrema.into_iter().fold(None, |acc, ext| match acc {
        None => Some(Leaders {
            leading: *ext,
            second: None,
        }),
        Some(leaders) if ext.exceeds(&leaders.leading) => Some(Leaders {
            leading: *ext,
            second: Some(leaders.leading),
        }),
        Some(Leaders {
            leading,
            second: None,
        }) => Some(Leaders {
            leading,
            second: Some(*ext),
        }),
        keep => keep,
    })
}

/// Pick the extremum family used for the period estimate.
///
/// The comparison is on index gaps, not amplitudes: troughs are used when the
/// peak gap is strictly smaller than the trough gap, peaks otherwise. A family
/// without a complete leader pair yields to the other one.
pub fn choose_family(peaks: Option<&Leaders>, troughs: Option<&Leaders>) -> Option<ExtremumKind> {
    let peak_gap = peaks.and_then(Leaders::index_gap);
    let trough_gap = troughs.and_then(Leaders::index_gap);

    match (peak_gap, trough_gap) {
        (Some(p), Some(t)) if p < t => Some(ExtremumKind::Trough),
        (Some(_), _) => Some(ExtremumKind::Peak),
        (None, Some(_)) => Some(ExtremumKind::Trough),
        (None, None) => None,
    }
}

fn within_envelope(amplitude: f32, target: f32) -> bool {
    (amplitude - target).abs() <= ENVELOPE_TOLERANCE * target.abs()
}

/// Estimate one waveform period of `samples` by extrema matching.
pub fn estimate_period(samples: &[f32]) -> Result<PeriodEstimate, PitchError> {
    let extrema = find_extrema(samples);

    let (peaks, troughs): (Vec<Extremum>, Vec<Extremum>) = extrema
        .into_iter()
        .partition(|e| e.kind == ExtremumKind::Peak);

    let peak_leaders = rank_leaders(&peaks);
    let trough_leaders = rank_leaders(&troughs);

    let (family, leaders) = match choose_family(peak_leaders.as_ref(), trough_leaders.as_ref()) {
        Some(ExtremumKind::Peak) => (&peaks, peak_leaders),
        Some(ExtremumKind::Trough) => (&troughs, trough_leaders),
        None => return Err(PitchError::InsufficientExtrema),
    };
    let leading = leaders.ok_or(PitchError::InsufficientExtrema)?.leading;

    let matched: Vec<usize> = family
        .iter()
        .filter(|e| within_envelope(e.amplitude, leading.amplitude))
        .map(|e| e.index)
        .collect();

    match matched.as_slice() {
        [.., earlier, last] => {
            PeriodEstimate::new(last - earlier).ok_or(PitchError::InsufficientExtrema)
        }
        _ => Err(PitchError::InsufficientExtrema),
    }
}
