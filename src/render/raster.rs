use crate::pitch::color::Rgb;

use super::surface::{Point, Surface, SurfaceError};

/// 2D affine transform: `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Transform {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Transform {
    const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.e += self.a * x + self.c * y;
        self.f += self.b * x + self.d * y;
    }

    fn rotate(&mut self, radians: f32) {
        let (sin, cos) = radians.sin_cos();
        let (a, b, c, d) = (self.a, self.b, self.c, self.d);
        self.a = a * cos + c * sin;
        self.b = b * cos + d * sin;
        self.c = c * cos - a * sin;
        self.d = d * cos - b * sin;
    }

    /// Accumulated rotation, in degrees.
    fn rotation_degrees(&self) -> f32 {
        self.b.atan2(self.a).to_degrees()
    }
}

#[derive(Clone, Copy, Debug)]
struct DrawState {
    transform: Transform,
    fill: Option<Rgb>,
    stroke: Option<Rgb>,
    stroke_weight: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            fill: Some(Rgb::WHITE),
            stroke: Some(Rgb::new(0, 0, 0)),
            stroke_weight: 1.0,
        }
    }
}

/// Horizontal run of pixels `[x0, x1]` on row `y`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Span {
    y: usize,
    x0: usize,
    x1: usize,
}

/// CPU rasterizer producing a tightly packed RGBA8 frame.
///
/// Shapes are drawn without anti-aliasing: a pixel is painted when its
/// center falls inside the shape. Arcs are stroke-only.
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
            state: DrawState::default(),
            stack: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    #[cfg(test)]
    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    fn put(&mut self, x: usize, y: usize, color: Rgb) {
        let idx = (y * self.width as usize + x) * 4;
        self.pixels[idx] = color.r;
        self.pixels[idx + 1] = color.g;
        self.pixels[idx + 2] = color.b;
        self.pixels[idx + 3] = 255;
    }

    fn half_stroke(&self) -> Option<f32> {
        (self.state.stroke.is_some() && self.state.stroke_weight > 0.0)
            .then(|| (self.state.stroke_weight / 2.0).max(0.5))
    }

    /// Integer pixel columns whose centers lie within `[lo, hi]`.
    fn columns(&self, lo: f32, hi: f32) -> Option<(usize, usize)> {
        let first = (lo - 0.5).ceil().max(0.0);
        let last = (hi - 0.5).floor().min(self.width as f32 - 1.0);
        (first <= last).then_some((first as usize, last as usize))
    }

    /// Pixel spans covering the ring between `inner` and `outer` radius
    /// around `center`. An `inner` of zero yields a filled disc.
    fn ring_spans(&self, center: Point, inner: f32, outer: f32) -> Vec<Span> {
        let mut spans = Vec::new();
        if outer <= 0.0 || self.width == 0 {
            return spans;
        }

        let top = (center.y - outer - 0.5).floor().max(0.0) as usize;
        let bottom = (center.y + outer).ceil().min(self.height as f32) as usize;

        for y in top..bottom {
            let dy = y as f32 + 0.5 - center.y;
            if dy.abs() > outer {
                continue;
            }
            let xo = (outer * outer - dy * dy).sqrt();
            if inner > 0.0 && dy.abs() < inner {
                let xi = (inner * inner - dy * dy).sqrt();
                for (lo, hi) in [
                    (center.x - xo, center.x - xi),
                    (center.x + xi, center.x + xo),
                ] {
                    if let Some((x0, x1)) = self.columns(lo, hi) {
                        spans.push(Span { y, x0, x1 });
                    }
                }
            } else if let Some((x0, x1)) = self.columns(center.x - xo, center.x + xo) {
                spans.push(Span { y, x0, x1 });
            }
        }

        spans
    }

    fn paint_spans(&mut self, spans: &[Span], color: Rgb) {
        for span in spans {
            for x in span.x0..=span.x1 {
                self.put(x, span.y, color);
            }
        }
    }

    fn check(&self, what: &'static str, values: &[f32]) -> Result<(), SurfaceError> {
        if values.iter().all(|v| v.is_finite()) {
            Ok(())
        } else {
            Err(SurfaceError::NonFiniteGeometry(what))
        }
    }
}

fn edge(a: Point, b: Point, p: Point) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f32 {
    let (vx, vy) = (b.x - a.x, b.y - a.y);
    let len_sq = vx * vx + vy * vy;
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        (((p.x - a.x) * vx + (p.y - a.y) * vy) / len_sq).clamp(0.0, 1.0)
    };
    let (dx, dy) = (p.x - (a.x + t * vx), p.y - (a.y + t * vy));
    (dx * dx + dy * dy).sqrt()
}

impl Surface for RasterSurface {
    fn set_background(&mut self, color: Rgb) -> Result<(), SurfaceError> {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
        Ok(())
    }

    fn set_fill(&mut self, color: Option<Rgb>) -> Result<(), SurfaceError> {
        self.state.fill = color;
        Ok(())
    }

    fn set_stroke(&mut self, color: Option<Rgb>) -> Result<(), SurfaceError> {
        self.state.stroke = color;
        Ok(())
    }

    fn set_stroke_weight(&mut self, px: f32) -> Result<(), SurfaceError> {
        self.check("stroke weight", &[px])?;
        self.state.stroke_weight = px;
        Ok(())
    }

    fn translate(&mut self, x: f32, y: f32) -> Result<(), SurfaceError> {
        self.check("translate", &[x, y])?;
        self.state.transform.translate(x, y);
        Ok(())
    }

    fn rotate(&mut self, degrees: f32) -> Result<(), SurfaceError> {
        self.check("rotate", &[degrees])?;
        self.state.transform.rotate(degrees.to_radians());
        Ok(())
    }

    fn draw_triangle(&mut self, p1: Point, p2: Point, p3: Point) -> Result<(), SurfaceError> {
        let t = self.state.transform;
        let [a, b, c] = [t.apply(p1), t.apply(p2), t.apply(p3)];
        self.check("triangle", &[a.x, a.y, b.x, b.y, c.x, c.y])?;

        let fill = self.state.fill;
        let stroke = self.state.stroke.zip(self.half_stroke());
        if fill.is_none() && stroke.is_none() {
            return Ok(());
        }

        let pad = stroke.map_or(0.0, |(_, hw)| hw);
        let min_x = a.x.min(b.x).min(c.x) - pad;
        let max_x = a.x.max(b.x).max(c.x) + pad;
        let min_y = (a.y.min(b.y).min(c.y) - pad - 0.5).floor().max(0.0) as usize;
        let max_y = (a.y.max(b.y).max(c.y) + pad).ceil().min(self.height as f32) as usize;
        let Some((x0, x1)) = self.columns(min_x, max_x) else {
            return Ok(());
        };

        let area = edge(a, b, c);
        for y in min_y..max_y {
            for x in x0..=x1 {
                let p = Point::new(x as f32 + 0.5, y as f32 + 0.5);

                if let Some((color, hw)) = stroke {
                    let d = distance_to_segment(p, a, b)
                        .min(distance_to_segment(p, b, c))
                        .min(distance_to_segment(p, c, a));
                    if d <= hw {
                        self.put(x, y, color);
                        continue;
                    }
                }

                if let Some(color) = fill {
                    if area == 0.0 {
                        continue;
                    }
                    let w0 = edge(b, c, p) * area.signum();
                    let w1 = edge(c, a, p) * area.signum();
                    let w2 = edge(a, b, p) * area.signum();
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        self.put(x, y, color);
                    }
                }
            }
        }

        Ok(())
    }

    fn draw_circle(&mut self, diameter: f32) -> Result<(), SurfaceError> {
        let center = self.state.transform.apply(Point::new(0.0, 0.0));
        self.check("circle", &[diameter, center.x, center.y])?;
        let radius = diameter.abs() / 2.0;

        if let Some(color) = self.state.fill {
            let spans = self.ring_spans(center, 0.0, radius);
            self.paint_spans(&spans, color);
        }
        if let (Some(color), Some(hw)) = (self.state.stroke, self.half_stroke()) {
            let spans = self.ring_spans(center, (radius - hw).max(0.0), radius + hw);
            self.paint_spans(&spans, color);
        }

        Ok(())
    }

    fn draw_arc(&mut self, diameter: f32, start_deg: f32, end_deg: f32) -> Result<(), SurfaceError> {
        let center = self.state.transform.apply(Point::new(0.0, 0.0));
        self.check("arc", &[diameter, start_deg, end_deg, center.x, center.y])?;

        let (Some(color), Some(hw)) = (self.state.stroke, self.half_stroke()) else {
            return Ok(());
        };

        let radius = diameter.abs() / 2.0;
        let sweep = end_deg - start_deg;
        if sweep <= 0.0 {
            return Ok(());
        }
        let start = start_deg + self.state.transform.rotation_degrees();

        let spans = self.ring_spans(center, (radius - hw).max(0.0), radius + hw);
        for span in &spans {
            let dy = span.y as f32 + 0.5 - center.y;
            for x in span.x0..=span.x1 {
                let dx = x as f32 + 0.5 - center.x;
                let angle = dy.atan2(dx).to_degrees();
                if sweep >= 360.0 || (angle - start).rem_euclid(360.0) <= sweep {
                    self.put(x, span.y, color);
                }
            }
        }

        Ok(())
    }

    fn push(&mut self) {
        self.stack.push(self.state);
    }

    fn pop(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => log::warn!("pop without matching push; state left unchanged"),
        }
    }
}
