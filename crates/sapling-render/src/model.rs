use sapling_core::{Arrow, ArrowEnds};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutPoint {
    pub x: f64,
    pub y: f64,
}

impl LayoutPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset_y(self, dy: f64) -> Self {
        Self {
            x: self.x,
            y: self.y + dy,
        }
    }
}

/// Cubic Bézier segment: `start`, two control points, `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicCurve {
    pub start: LayoutPoint,
    pub control1: LayoutPoint,
    pub control2: LayoutPoint,
    pub end: LayoutPoint,
}

impl CubicCurve {
    pub fn offset_y(self, dy: f64) -> Self {
        Self {
            start: self.start.offset_y(dy),
            control1: self.control1.offset_y(dy),
            control2: self.control2.offset_y(dy),
            end: self.end.offset_y(dy),
        }
    }
}

/// Computed-geometry counterpart of one syntax tree node.
///
/// The root drawable (depth `-1`) has no label and is never drawn; its children start at depth 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawable {
    pub label: String,
    pub subscript: Option<String>,
    pub superscript: Option<String>,
    pub is_leaf: bool,
    pub depth: i32,
    pub width: f64,
    pub left: f64,
    pub top: f64,
    pub arrow: Option<Arrow>,
    pub children: Vec<Drawable>,
}

impl Drawable {
    pub fn is_root(&self) -> bool {
        self.depth < 0
    }

    pub fn center(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Subscript or superscript present (empty strings do not count).
    pub fn has_explicit_script(&self) -> bool {
        let present = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.subscript) || present(&self.superscript)
    }

    pub fn child_width(&self) -> f64 {
        self.children.iter().map(|c| c.width).sum()
    }

    /// Pre-order walk of every node below `self`.
    pub fn descendants(&self) -> Vec<&Drawable> {
        fn walk<'a>(d: &'a Drawable, out: &mut Vec<&'a Drawable>) {
            for c in &d.children {
                out.push(c);
                walk(c, out);
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// Leaves in depth-first order; index `i` is ordinal `i + 1`.
    pub fn leaves(&self) -> Vec<&Drawable> {
        let mut out: Vec<&Drawable> = self.descendants().into_iter().filter(|d| d.is_leaf).collect();
        if self.is_leaf {
            out.insert(0, self);
        }
        out
    }

    pub fn max_depth(&self) -> i32 {
        self.children
            .iter()
            .map(Drawable::max_depth)
            .fold(self.depth, i32::max)
    }
}

/// A resolved leaf-to-leaf connector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowPath {
    /// 1-based ordinal of the leaf carrying the arrow.
    pub source: u32,
    /// 1-based ordinal of the leaf the arrow points at.
    pub target: u32,
    pub ends: ArrowEnds,
    pub from: LayoutPoint,
    pub to: LayoutPoint,
    /// Sag depth shared by both control points.
    pub bottom: f64,
    pub curve: CubicCurve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeLayout {
    pub root: Drawable,
    pub arrows: Vec<ArrowPath>,
    pub width: f64,
    pub height: f64,
    pub max_depth: i32,
    pub has_arrow: bool,
}

impl TreeLayout {
    /// Every drawn node in document order.
    pub fn drawables(&self) -> Vec<&Drawable> {
        self.root.descendants()
    }

    pub fn leaves(&self) -> Vec<&Drawable> {
        self.root.leaves()
    }

    pub fn to_json_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
