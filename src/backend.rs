//! Traits for rendering backends.
//!
//! The view tree never rasterizes anything itself. A frame is emitted as a sequence of calls on a
//! [`DrawSurface`], in back-to-front order, bracketed by `begin` and `end`.

use crate::color::Color;
use crate::rect::Rect;
use cgmath::{Point2, Vector2};
use core::fmt;

/// Font measurement queries.
pub trait FontMetrics: fmt::Debug + Send + Sync {
    /// Returns the size of the given string when drawn with this font.
    fn measure_string(&self, text: &str) -> Vector2<f32>;

    /// Vertical distance between two baselines.
    fn line_spacing(&self) -> f32;
}

/// A backend draw surface.
pub trait DrawSurface {
    /// Starts a batch.
    fn begin(&mut self);

    /// Draws a string.
    ///
    /// - `position`: top-left corner in window coordinates
    /// - `depth`: backend sort hint in `0.0..=1.0`. Views draw at `0.0` and are layered by call
    ///   order alone; overlays drawn outside the tree, such as the FPS label, pass a higher value.
    fn draw_text(
        &mut self,
        font: &dyn FontMetrics,
        text: &str,
        position: Point2<f32>,
        color: Color,
        depth: f32,
    );

    /// Fills a rectangle given in window coordinates.
    fn fill_rect(&mut self, rect: Rect, color: Color, depth: f32);

    /// Ends the batch and flushes it.
    fn end(&mut self);
}

/// Fixed-advance font metrics.
///
/// Useful for headless hosts and for tests, where no real font has been loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceFont {
    pub advance: f32,
    pub line_height: f32,
}

impl Default for MonospaceFont {
    fn default() -> Self {
        MonospaceFont {
            advance: 7.,
            line_height: 14.,
        }
    }
}

impl FontMetrics for MonospaceFont {
    fn measure_string(&self, text: &str) -> Vector2<f32> {
        let lines = text.lines().count().max(1);
        let widest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        Vector2::new(widest as f32 * self.advance, lines as f32 * self.line_height)
    }

    fn line_spacing(&self) -> f32 {
        self.line_height
    }
}

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Begin,
    Text {
        text: String,
        position: Point2<f32>,
        color: Color,
        depth: f32,
    },
    Rect {
        rect: Rect,
        color: Color,
        depth: f32,
    },
    End,
}

/// A surface that records every call instead of rasterizing.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    pub calls: Vec<DrawCall>,
}

impl HeadlessSurface {
    pub fn new() -> HeadlessSurface {
        HeadlessSurface::default()
    }

    /// Returns all drawn strings, in order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.calls.iter().filter_map(|call| match call {
            DrawCall::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl DrawSurface for HeadlessSurface {
    fn begin(&mut self) {
        self.calls.push(DrawCall::Begin);
    }

    fn draw_text(
        &mut self,
        _font: &dyn FontMetrics,
        text: &str,
        position: Point2<f32>,
        color: Color,
        depth: f32,
    ) {
        self.calls.push(DrawCall::Text {
            text: text.to_owned(),
            position,
            color,
            depth,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, depth: f32) {
        self.calls.push(DrawCall::Rect { rect, color, depth });
    }

    fn end(&mut self) {
        self.calls.push(DrawCall::End);
    }
}
