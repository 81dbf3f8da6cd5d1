use crate::pitch::color::Rgb;
use crate::pitch::PitchReading;

use super::surface::{Point, Scope, Surface, SurfaceError};

pub const BACKGROUND: Rgb = Rgb::new(0x11, 0x10, 0x00);
pub const RING_BASE: Rgb = Rgb::new(0x11, 0x11, 0x11);

/// Side length of the rotating triangle, in pixels.
pub const TRIANGLE_SIDE: f32 = 50.0;

pub const MAX_RINGS: u32 = 20;
/// Empty ring slots inside the innermost drawn ring.
pub const RING_OFFSET: u32 = 3;
/// Angular length of one dash on a ring, in degrees.
pub const DASH_SWEEP: f32 = 15.0;

/// One revolution per second at 3600 Hz.
const HZ_PER_RPS: f32 = 60.0 * 60.0;

/// Rotation angle in degrees for a frame.
///
/// Derived from absolute elapsed time rather than accumulated per frame, so
/// the same (frequency, elapsed) pair always yields the same angle. An
/// undefined frequency does not rotate.
pub fn rotation_degrees(frequency: Option<f32>, elapsed_seconds: f32) -> f32 {
    match frequency {
        Some(f) if f.is_finite() => {
            let rps = f / HZ_PER_RPS;
            let degrees = 360.0 * rps * elapsed_seconds;
            if degrees.is_finite() {
                degrees
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Map an amplitude spread in `[0, 2]` onto a ring count in `[1, 20]`.
pub fn volume_rings(spread: f32) -> u32 {
    if !spread.is_finite() {
        return 1;
    }
    let mapped = 1.0 + (spread / 2.0) * (MAX_RINGS - 1) as f32;
    mapped.clamp(1.0, MAX_RINGS as f32).ceil() as u32
}

/// Diameter of ring `ring` (1-based): slot `ring + 3` of 23 across twice the
/// viewport height.
pub fn ring_diameter(height: f32, ring: u32) -> f32 {
    2.0 * height * (ring + RING_OFFSET) as f32 / (MAX_RINGS + RING_OFFSET) as f32
}

/// Equilateral triangle with its centroid on the origin, apex up.
fn triangle_vertices(side: f32) -> [Point; 3] {
    let sqrt3_per_6 = 3f32.sqrt() / 6.0;
    let height = side * 3f32.sqrt() / 2.0;
    let base_y = side * sqrt3_per_6;
    [
        Point::new(-side / 2.0, base_y),
        Point::new(side / 2.0, base_y),
        Point::new(0.0, -height + base_y),
    ]
}

/// Draws the pitch visual for one frame onto a [`Surface`].
#[derive(Clone, Copy, Debug)]
pub struct FrameRenderer {
    pub width: u32,
    pub height: u32,
}

impl FrameRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    fn dim(&self) -> f32 {
        self.width.min(self.height) as f32
    }

    /// Issue the drawing commands for one frame.
    ///
    /// The background is always painted first. A failing draw call aborts the
    /// rest of the frame but every opened scope is still closed.
    pub fn render<S: Surface + ?Sized>(
        &self,
        reading: &PitchReading,
        elapsed_seconds: f32,
        surface: &mut S,
    ) -> Result<(), SurfaceError> {
        let degrees = rotation_degrees(reading.frequency.ok(), elapsed_seconds);
        let (cx, cy) = self.center();

        surface.set_background(BACKGROUND)?;

        {
            let mut scope = Scope::new(&mut *surface);
            scope.set_stroke(None)?;
            scope.set_fill(reading.colors.fill)?;
            scope.translate(cx, cy)?;
            scope.rotate(-degrees)?;
            let [p1, p2, p3] = triangle_vertices(TRIANGLE_SIDE);
            scope.draw_triangle(p1, p2, p3)?;
        }

        {
            let mut scope = Scope::new(&mut *surface);
            scope.set_fill(None)?;
            scope.set_stroke_weight(self.dim() * 0.005)?;
            scope.translate(cx, cy)?;
            scope.rotate(degrees)?;

            let rings = volume_rings(reading.amplitude.spread());
            let dashes = reading.dashes();

            for ring in 1..=rings {
                let diameter = ring_diameter(self.height as f32, ring);

                scope.set_stroke(Some(RING_BASE))?;
                scope.draw_circle(diameter)?;

                scope.set_stroke(reading.colors.stroke)?;
                if let Some(dashes) = dashes {
                    let part = 360.0 / dashes as f32;
                    for _ in 0..dashes {
                        scope.rotate(part)?;
                        scope.draw_arc(diameter, -DASH_SWEEP, 0.0)?;
                    }
                }
            }
        }

        Ok(())
    }
}
