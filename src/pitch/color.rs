use serde::Serialize;

use super::frequency::{PitchClass, MAX_DISPLAY_OCTAVE, MIN_DISPLAY_OCTAVE};
use super::PitchError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);
}

/// One color per octave bucket, lowest (octave 1) first.
pub const OCTAVE_PALETTE: [Rgb; 12] = [
    Rgb::new(0x81, 0x5D, 0xBD),
    Rgb::new(0x3E, 0x69, 0xD9),
    Rgb::new(0x00, 0x8D, 0xFE),
    Rgb::new(0x41, 0xC8, 0xFB),
    Rgb::new(0x2C, 0xE8, 0xBB),
    Rgb::new(0x7E, 0xF0, 0x3F),
    Rgb::new(0xF0, 0xED, 0x01),
    Rgb::new(0xFD, 0xB5, 0x08),
    Rgb::new(0xFC, 0x72, 0x03),
    Rgb::new(0xF7, 0x4B, 0x4D),
    Rgb::new(0xF5, 0x60, 0x8F),
    Rgb::new(0xD2, 0x57, 0xBD),
];

/// Color for an octave bucket. Octaves above 12 share the top color;
/// octaves below 1 have none.
pub fn octave_color(octave: i32) -> Option<Rgb> {
    if octave < MIN_DISPLAY_OCTAVE {
        return None;
    }
    let bucket = octave.min(MAX_DISPLAY_OCTAVE);
    Some(OCTAVE_PALETTE[(bucket - MIN_DISPLAY_OCTAVE) as usize])
}

/// The octave palette read in reverse.
pub fn note_color(note: i32) -> Option<Rgb> {
    octave_color((MAX_DISPLAY_OCTAVE + 1).saturating_sub(note))
}

/// Fill and stroke colors for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameColors {
    pub fill: Option<Rgb>,
    pub stroke: Option<Rgb>,
}

impl FrameColors {
    pub const SENTINEL: FrameColors = FrameColors {
        fill: Some(Rgb::WHITE),
        stroke: Some(Rgb::WHITE),
    };

    /// Pick colors for a classification result.
    ///
    /// Undefined pitch paints everything white so the failure is visible.
    /// A finite pitch outside the palette leaves both colors unset.
    pub fn encode(pitch: &Result<PitchClass, PitchError>) -> Self {
        match pitch {
            Ok(class) if class.octave_in_range() => FrameColors {
                fill: octave_color(class.octave),
                stroke: if class.note_in_range() {
                    note_color(class.note)
                } else {
                    None
                },
            },
            Ok(_) => FrameColors::default(),
            Err(_) => FrameColors::SENTINEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octave_palette_covers_each_bucket_once() {
        let colors: Vec<Rgb> = (1..=12).filter_map(octave_color).collect();
        assert_eq!(colors.len(), 12);
        for (i, a) in colors.iter().enumerate() {
            assert!(OCTAVE_PALETTE.contains(a));
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn octaves_above_range_use_top_color() {
        let top = octave_color(12).unwrap();
        assert_eq!(top, Rgb::new(0xD2, 0x57, 0xBD));
        for octave in [13, 20, i32::MAX] {
            assert_eq!(octave_color(octave), Some(top));
        }
    }

    #[test]
    fn octaves_below_range_have_no_color() {
        assert_eq!(octave_color(0), None);
        assert_eq!(octave_color(-3), None);
        assert_eq!(octave_color(1), Some(Rgb::new(0x81, 0x5D, 0xBD)));
    }

    #[test]
    fn note_color_reads_palette_backwards() {
        for n in 1..=12 {
            assert_eq!(note_color(n), octave_color(13 - n));
        }
        assert_eq!(note_color(1), octave_color(12));
        assert_eq!(note_color(12), octave_color(1));
    }

    #[test]
    fn octave_six_is_green() {
        assert_eq!(octave_color(6), Some(Rgb::new(0x7E, 0xF0, 0x3F)));
    }

    #[test]
    fn encode_in_range_pitch() {
        let class = PitchClass::from_frequency(1200.0).unwrap();
        let colors = FrameColors::encode(&Ok(class));
        assert_eq!(colors.fill, octave_color(6));
        assert_eq!(colors.stroke, note_color(class.note));
    }

    #[test]
    fn encode_out_of_range_pitch_leaves_colors_unset() {
        let class = PitchClass::from_frequency(8.0).unwrap();
        assert_eq!(FrameColors::encode(&Ok(class)), FrameColors::default());
    }

    #[test]
    fn encode_undefined_pitch_is_white() {
        let colors = FrameColors::encode(&Err(PitchError::UndefinedFrequency));
        assert_eq!(colors, FrameColors::SENTINEL);
        assert_eq!(colors.fill, Some(Rgb::WHITE));
    }
}
