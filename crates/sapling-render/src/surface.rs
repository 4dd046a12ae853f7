//! The drawing surface the renderer targets, plus an in-memory recorder of draw calls.

use crate::model::{CubicCurve, LayoutPoint};
use crate::text::{DeterministicTextMeasurer, TextMeasurer, TextStyle};
use serde::Serialize;
use std::sync::Arc;

/// Drawing + measurement capability the engine targets.
///
/// Coordinates are top-left origin, Y-down pixels.
pub trait Surface {
    fn measure_text_width(&self, text: &str, style: &TextStyle) -> f64;

    /// Resizes and clears the canvas.
    fn resize(&mut self, width: f64, height: f64);

    fn set_fill_color(&mut self, color: &str);

    fn set_stroke_color(&mut self, color: &str);

    fn set_line_width(&mut self, width: f64);

    /// Draws `text` horizontally centered on `at.x` with its top edge at `at.y`.
    fn draw_text(&mut self, text: &str, at: LayoutPoint, style: &TextStyle);

    fn draw_line(&mut self, from: LayoutPoint, to: LayoutPoint);

    fn draw_triangle(&mut self, a: LayoutPoint, b: LayoutPoint, c: LayoutPoint, filled: bool);

    fn draw_curve(&mut self, curve: &CubicCurve);
}

impl<S: Surface + ?Sized> Surface for &mut S {
    fn measure_text_width(&self, text: &str, style: &TextStyle) -> f64 {
        (**self).measure_text_width(text, style)
    }

    fn resize(&mut self, width: f64, height: f64) {
        (**self).resize(width, height)
    }

    fn set_fill_color(&mut self, color: &str) {
        (**self).set_fill_color(color)
    }

    fn set_stroke_color(&mut self, color: &str) {
        (**self).set_stroke_color(color)
    }

    fn set_line_width(&mut self, width: f64) {
        (**self).set_line_width(width)
    }

    fn draw_text(&mut self, text: &str, at: LayoutPoint, style: &TextStyle) {
        (**self).draw_text(text, at, style)
    }

    fn draw_line(&mut self, from: LayoutPoint, to: LayoutPoint) {
        (**self).draw_line(from, to)
    }

    fn draw_triangle(&mut self, a: LayoutPoint, b: LayoutPoint, c: LayoutPoint, filled: bool) {
        (**self).draw_triangle(a, b, c, filled)
    }

    fn draw_curve(&mut self, curve: &CubicCurve) {
        (**self).draw_curve(curve)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    Resize {
        width: f64,
        height: f64,
    },
    FillColor {
        color: String,
    },
    StrokeColor {
        color: String,
    },
    LineWidth {
        width: f64,
    },
    Text {
        text: String,
        at: LayoutPoint,
        font_size: f64,
    },
    Line {
        from: LayoutPoint,
        to: LayoutPoint,
    },
    Triangle {
        points: [LayoutPoint; 3],
        filled: bool,
    },
    Curve {
        curve: CubicCurve,
    },
}

/// Surface that records every primitive instead of painting it.
#[derive(Clone)]
pub struct RecordingSurface {
    measurer: Arc<dyn TextMeasurer + Send + Sync>,
    ops: Vec<DrawOp>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new(Arc::new(DeterministicTextMeasurer::default()))
    }
}

impl std::fmt::Debug for RecordingSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSurface")
            .field("ops", &self.ops.len())
            .finish_non_exhaustive()
    }
}

impl RecordingSurface {
    pub fn new(measurer: Arc<dyn TextMeasurer + Send + Sync>) -> Self {
        Self {
            measurer,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&DrawOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }
}

impl Surface for RecordingSurface {
    fn measure_text_width(&self, text: &str, style: &TextStyle) -> f64 {
        self.measurer.measure_width(text, style)
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.ops.clear();
        self.ops.push(DrawOp::Resize { width, height });
    }

    fn set_fill_color(&mut self, color: &str) {
        self.ops.push(DrawOp::FillColor {
            color: color.to_string(),
        });
    }

    fn set_stroke_color(&mut self, color: &str) {
        self.ops.push(DrawOp::StrokeColor {
            color: color.to_string(),
        });
    }

    fn set_line_width(&mut self, width: f64) {
        self.ops.push(DrawOp::LineWidth { width });
    }

    fn draw_text(&mut self, text: &str, at: LayoutPoint, style: &TextStyle) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            at,
            font_size: style.font_size,
        });
    }

    fn draw_line(&mut self, from: LayoutPoint, to: LayoutPoint) {
        self.ops.push(DrawOp::Line { from, to });
    }

    fn draw_triangle(&mut self, a: LayoutPoint, b: LayoutPoint, c: LayoutPoint, filled: bool) {
        self.ops.push(DrawOp::Triangle {
            points: [a, b, c],
            filled,
        });
    }

    fn draw_curve(&mut self, curve: &CubicCurve) {
        self.ops.push(DrawOp::Curve { curve: *curve });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_discards_previous_frame() {
        let mut s = RecordingSurface::default();
        s.draw_line(LayoutPoint::new(0.0, 0.0), LayoutPoint::new(1.0, 1.0));
        s.resize(10.0, 20.0);
        assert_eq!(
            s.ops(),
            &[DrawOp::Resize {
                width: 10.0,
                height: 20.0
            }]
        );
    }

    #[test]
    fn mutable_reference_forwards_to_surface() {
        fn thicken<S: Surface>(mut surface: S) {
            surface.set_line_width(2.0);
        }

        let mut s = RecordingSurface::default();
        thicken(&mut s);
        assert_eq!(s.ops(), &[DrawOp::LineWidth { width: 2.0 }]);
    }
}
