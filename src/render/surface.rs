use std::ops::{Deref, DerefMut};

use serde::Serialize;
use thiserror::Error;

use crate::pitch::color::Rgb;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SurfaceError {
    #[error("non-finite geometry in {0}")]
    NonFiniteGeometry(&'static str),
}

/// A 2D drawing target with a p5-style transform stack.
///
/// Angles are in degrees; positive rotation turns clockwise on screen
/// (y axis points down).
pub trait Surface {
    fn set_background(&mut self, color: Rgb) -> Result<(), SurfaceError>;
    fn set_fill(&mut self, color: Option<Rgb>) -> Result<(), SurfaceError>;
    fn set_stroke(&mut self, color: Option<Rgb>) -> Result<(), SurfaceError>;
    fn set_stroke_weight(&mut self, px: f32) -> Result<(), SurfaceError>;
    fn translate(&mut self, x: f32, y: f32) -> Result<(), SurfaceError>;
    fn rotate(&mut self, degrees: f32) -> Result<(), SurfaceError>;
    fn draw_triangle(&mut self, p1: Point, p2: Point, p3: Point) -> Result<(), SurfaceError>;
    /// Circle centered on the current origin.
    fn draw_circle(&mut self, diameter: f32) -> Result<(), SurfaceError>;
    /// Open arc centered on the current origin, from `start_deg` to `end_deg`.
    fn draw_arc(&mut self, diameter: f32, start_deg: f32, end_deg: f32) -> Result<(), SurfaceError>;

    /// Save transform and style state.
    fn push(&mut self);
    /// Restore the state saved by the matching [`Surface::push`].
    fn pop(&mut self);
}

/// Saves surface state on creation and restores it on drop, so an early
/// return through `?` still leaves the transform stack balanced.
pub struct Scope<'a, S: Surface + ?Sized> {
    surface: &'a mut S,
}

impl<'a, S: Surface + ?Sized> Scope<'a, S> {
    pub fn new(surface: &'a mut S) -> Self {
        surface.push();
        Self { surface }
    }
}

impl<S: Surface + ?Sized> Deref for Scope<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: Surface + ?Sized> DerefMut for Scope<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: Surface + ?Sized> Drop for Scope<'_, S> {
    fn drop(&mut self) {
        self.surface.pop();
    }
}

/// One recorded call on a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Background { color: Rgb },
    Fill { color: Option<Rgb> },
    Stroke { color: Option<Rgb> },
    StrokeWeight { px: f32 },
    Translate { x: f32, y: f32 },
    Rotate { degrees: f32 },
    Triangle { p1: Point, p2: Point, p3: Point },
    Circle { diameter: f32 },
    Arc { diameter: f32, start: f32, end: f32 },
    Push,
    Pop,
}

/// Surface that only records the commands issued to it.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    depth: usize,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    #[cfg(test)]
    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    /// Current push depth; zero once every scope has closed.
    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.depth
    }

    fn record(&mut self, command: DrawCommand) -> Result<(), SurfaceError> {
        self.commands.push(command);
        Ok(())
    }
}

impl Surface for RecordingSurface {
    fn set_background(&mut self, color: Rgb) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Background { color })
    }

    fn set_fill(&mut self, color: Option<Rgb>) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Fill { color })
    }

    fn set_stroke(&mut self, color: Option<Rgb>) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Stroke { color })
    }

    fn set_stroke_weight(&mut self, px: f32) -> Result<(), SurfaceError> {
        self.record(DrawCommand::StrokeWeight { px })
    }

    fn translate(&mut self, x: f32, y: f32) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Translate { x, y })
    }

    fn rotate(&mut self, degrees: f32) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Rotate { degrees })
    }

    fn draw_triangle(&mut self, p1: Point, p2: Point, p3: Point) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Triangle { p1, p2, p3 })
    }

    fn draw_circle(&mut self, diameter: f32) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Circle { diameter })
    }

    fn draw_arc(&mut self, diameter: f32, start_deg: f32, end_deg: f32) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Arc {
            diameter,
            start: start_deg,
            end: end_deg,
        })
    }

    fn push(&mut self) {
        self.depth += 1;
        self.commands.push(DrawCommand::Push);
    }

    fn pop(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.commands.push(DrawCommand::Pop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingCircle(RecordingSurface);

    impl Surface for FailingCircle {
        fn set_background(&mut self, color: Rgb) -> Result<(), SurfaceError> {
            self.0.set_background(color)
        }
        fn set_fill(&mut self, color: Option<Rgb>) -> Result<(), SurfaceError> {
            self.0.set_fill(color)
        }
        fn set_stroke(&mut self, color: Option<Rgb>) -> Result<(), SurfaceError> {
            self.0.set_stroke(color)
        }
        fn set_stroke_weight(&mut self, px: f32) -> Result<(), SurfaceError> {
            self.0.set_stroke_weight(px)
        }
        fn translate(&mut self, x: f32, y: f32) -> Result<(), SurfaceError> {
            self.0.translate(x, y)
        }
        fn rotate(&mut self, degrees: f32) -> Result<(), SurfaceError> {
            self.0.rotate(degrees)
        }
        fn draw_triangle(&mut self, p1: Point, p2: Point, p3: Point) -> Result<(), SurfaceError> {
            self.0.draw_triangle(p1, p2, p3)
        }
        fn draw_circle(&mut self, _diameter: f32) -> Result<(), SurfaceError> {
            Err(SurfaceError::NonFiniteGeometry("circle"))
        }
        fn draw_arc(&mut self, d: f32, s: f32, e: f32) -> Result<(), SurfaceError> {
            self.0.draw_arc(d, s, e)
        }
        fn push(&mut self) {
            self.0.push()
        }
        fn pop(&mut self) {
            self.0.pop()
        }
    }

    fn draw_in_scope<S: Surface>(surface: &mut S) -> Result<(), SurfaceError> {
        let mut scope = Scope::new(surface);
        scope.translate(10.0, 10.0)?;
        scope.draw_circle(5.0)?;
        scope.rotate(45.0)?;
        Ok(())
    }

    #[test]
    fn scope_pops_on_success() {
        let mut surface = RecordingSurface::new();
        draw_in_scope(&mut surface).unwrap();
        assert_eq!(surface.depth(), 0);
        assert_eq!(surface.commands().first(), Some(&DrawCommand::Push));
        assert_eq!(surface.commands().last(), Some(&DrawCommand::Pop));
    }

    #[test]
    fn scope_pops_when_a_draw_fails() {
        let mut surface = FailingCircle(RecordingSurface::new());
        let err = draw_in_scope(&mut surface).unwrap_err();
        assert_eq!(err, SurfaceError::NonFiniteGeometry("circle"));
        assert_eq!(surface.0.depth(), 0);
        assert_eq!(
            surface.0.commands(),
            &[
                DrawCommand::Push,
                DrawCommand::Translate { x: 10.0, y: 10.0 },
                DrawCommand::Pop,
            ]
        );
    }

    #[test]
    fn commands_serialize_with_op_tag() {
        let json = serde_json::to_string(&DrawCommand::Circle { diameter: 4.0 }).unwrap();
        assert_eq!(json, r#"{"op":"circle","diameter":4.0}"#);
        let json = serde_json::to_string(&DrawCommand::Fill { color: None }).unwrap();
        assert_eq!(json, r#"{"op":"fill","color":null}"#);
    }
}
