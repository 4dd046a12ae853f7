//! SVG surface. Draw calls are written straight into an SVG document string.

use crate::model::{CubicCurve, LayoutPoint};
use crate::surface::Surface;
use crate::text::{DeterministicTextMeasurer, TextMeasurer, TextStyle};
use std::fmt::Write as _;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SvgRenderOptions {
    /// Optional root `<svg id="...">`.
    pub diagram_id: Option<String>,
    /// Background fill; `None` leaves the canvas transparent.
    pub background: Option<String>,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            diagram_id: None,
            background: Some("white".to_string()),
        }
    }
}

/// [`Surface`] that accumulates an SVG document.
#[derive(Clone)]
pub struct SvgSurface {
    measurer: Arc<dyn TextMeasurer + Send + Sync>,
    options: SvgRenderOptions,
    width: f64,
    height: f64,
    fill: String,
    stroke: String,
    line_width: f64,
    body: String,
}

impl Default for SvgSurface {
    fn default() -> Self {
        Self::new(
            Arc::new(DeterministicTextMeasurer::default()),
            SvgRenderOptions::default(),
        )
    }
}

impl std::fmt::Debug for SvgSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SvgSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl SvgSurface {
    pub fn new(measurer: Arc<dyn TextMeasurer + Send + Sync>, options: SvgRenderOptions) -> Self {
        Self {
            measurer,
            options,
            width: 0.0,
            height: 0.0,
            fill: "black".to_string(),
            stroke: "black".to_string(),
            line_width: 1.0,
            body: String::new(),
        }
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Returns the complete document for everything drawn since the last resize.
    pub fn finish(&self) -> String {
        let w = self.width.max(1.0);
        let h = self.height.max(1.0);
        let mut out = String::with_capacity(self.body.len() + 256);
        out.push_str(r#"<svg xmlns="http://www.w3.org/2000/svg""#);
        if let Some(id) = self.options.diagram_id.as_deref() {
            let _ = write!(&mut out, r#" id="{}""#, escape_attr(id));
        }
        let _ = writeln!(
            &mut out,
            r#" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            fmt(w),
            fmt(h),
            fmt(w),
            fmt(h)
        );
        if let Some(bg) = self.options.background.as_deref() {
            let _ = writeln!(
                &mut out,
                r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
                fmt(w),
                fmt(h),
                escape_attr(bg)
            );
        }
        out.push_str(&self.body);
        out.push_str("</svg>\n");
        out
    }

    fn stroke_attrs(&self) -> String {
        format!(
            r#"stroke="{}" stroke-width="{}""#,
            escape_attr(&self.stroke),
            fmt(self.line_width)
        )
    }
}

impl Surface for SvgSurface {
    fn measure_text_width(&self, text: &str, style: &TextStyle) -> f64 {
        self.measurer.measure_width(text, style)
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.body.clear();
    }

    fn set_fill_color(&mut self, color: &str) {
        self.fill = color.to_string();
    }

    fn set_stroke_color(&mut self, color: &str) {
        self.stroke = color.to_string();
    }

    fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    fn draw_text(&mut self, text: &str, at: LayoutPoint, style: &TextStyle) {
        let family = style.font_family.as_deref().unwrap_or("sans-serif");
        let _ = write!(
            &mut self.body,
            r#"<text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}" text-anchor="middle" dominant-baseline="hanging""#,
            fmt(at.x),
            fmt(at.y),
            escape_attr(family),
            fmt(style.font_size),
            escape_attr(&self.fill)
        );
        if let Some(weight) = style.font_weight.as_deref() {
            let _ = write!(&mut self.body, r#" font-weight="{}""#, escape_attr(weight));
        }
        let _ = writeln!(&mut self.body, ">{}</text>", escape_xml(text));
    }

    fn draw_line(&mut self, from: LayoutPoint, to: LayoutPoint) {
        let stroke = self.stroke_attrs();
        let _ = writeln!(
            &mut self.body,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" {stroke}/>"#,
            fmt(from.x),
            fmt(from.y),
            fmt(to.x),
            fmt(to.y)
        );
    }

    fn draw_triangle(&mut self, a: LayoutPoint, b: LayoutPoint, c: LayoutPoint, filled: bool) {
        let stroke = self.stroke_attrs();
        let fill = if filled {
            escape_attr(&self.fill)
        } else {
            "none".to_string()
        };
        let _ = writeln!(
            &mut self.body,
            r#"<polygon points="{},{} {},{} {},{}" fill="{fill}" {stroke}/>"#,
            fmt(a.x),
            fmt(a.y),
            fmt(b.x),
            fmt(b.y),
            fmt(c.x),
            fmt(c.y)
        );
    }

    fn draw_curve(&mut self, curve: &CubicCurve) {
        let stroke = self.stroke_attrs();
        let _ = writeln!(
            &mut self.body,
            r#"<path d="M{},{} C{},{} {},{} {},{}" fill="none" {stroke}/>"#,
            fmt(curve.start.x),
            fmt(curve.start.y),
            fmt(curve.control1.x),
            fmt(curve.control1.y),
            fmt(curve.control2.x),
            fmt(curve.control2.y),
            fmt(curve.end.x),
            fmt(curve.end.y)
        );
    }
}

fn fmt(v: f64) -> String {
    // Round-trippable decimal form without `-0` or tiny float noise from layout arithmetic.
    if !v.is_finite() {
        return "0".to_string();
    }

    let mut v = if v.abs() < 1e-9 { 0.0 } else { v };
    let nearest = v.round();
    if (v - nearest).abs() < 1e-6 {
        v = nearest;
    }
    let s = v.to_string();
    if s == "-0" { "0".to_string() } else { s }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    escape_xml(text)
}
