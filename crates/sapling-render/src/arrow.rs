//! Arrow routing between leaves addressed by depth-first ordinal.

use crate::model::{ArrowPath, CubicCurve, Drawable, LayoutPoint};

/// Anchor sits this many font sizes below the leaf's top edge.
pub const ARROW_ANCHOR_OFFSET: f64 = 1.2;
/// Sag below the deepest spanned anchor.
pub const ARROW_SAG_FACTOR: f64 = 1.4;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrowSet {
    pub arrows: Vec<ArrowPath>,
    /// Deepest `bottom` across all arrows, or 0 when there are none.
    pub max_bottom: f64,
}

impl ArrowSet {
    /// Vertical extent to reserve for the arrow bundle.
    ///
    /// Damped by `(sqrt(m) / m)^(1/50)` so very tall bundles grow the canvas sub-linearly.
    pub fn reserved_height(&self) -> f64 {
        let m = self.max_bottom;
        if !(m.is_finite() && m > 0.0) {
            return 0.0;
        }
        let scaler = (m.sqrt() / m).powf(1.0 / 50.0);
        m * scaler
    }
}

/// Resolves a 1-based ordinal against the depth-first leaf sequence under `root`.
pub fn find_target_leaf(root: &Drawable, ordinal: u32) -> Option<&Drawable> {
    fn walk<'a>(d: &'a Drawable, ordinal: u32, count: &mut u32) -> Option<&'a Drawable> {
        if d.is_leaf {
            *count += 1;
            if *count == ordinal {
                return Some(d);
            }
        }
        for child in &d.children {
            if let Some(found) = walk(child, ordinal, count) {
                return Some(found);
            }
        }
        None
    }

    if ordinal == 0 {
        return None;
    }
    let mut count = 0;
    walk(root, ordinal, &mut count)
}

fn anchor(leaf: &Drawable, font_size: f64) -> LayoutPoint {
    LayoutPoint::new(leaf.center(), leaf.top + font_size * ARROW_ANCHOR_OFFSET)
}

/// Routes every arrow in the finished tree. Arrows whose target ordinal matches no leaf are
/// dropped.
pub fn route_arrows(root: &Drawable, font_size: f64) -> ArrowSet {
    let leaves = root.leaves();
    let mut set = ArrowSet::default();

    for (idx, leaf) in leaves.iter().enumerate() {
        let Some(arrow) = leaf.arrow else {
            continue;
        };
        let Some(target) = find_target_leaf(root, arrow.target) else {
            tracing::debug!(
                source = idx + 1,
                target = arrow.target,
                leaves = leaves.len(),
                "arrow target does not name a leaf; dropping arrow"
            );
            continue;
        };

        let from = anchor(leaf, font_size);
        let to = anchor(target, font_size);
        let lo = from.x.min(to.x);
        let hi = from.x.max(to.x);
        let deepest = leaves
            .iter()
            .filter(|l| {
                let c = l.center();
                c >= lo && c <= hi
            })
            .map(|l| anchor(l, font_size).y)
            .fold(from.y.max(to.y), f64::max);
        let bottom = deepest * ARROW_SAG_FACTOR;

        set.max_bottom = set.max_bottom.max(bottom);
        set.arrows.push(ArrowPath {
            source: (idx + 1) as u32,
            target: arrow.target,
            ends: arrow.ends,
            from,
            to,
            bottom,
            curve: CubicCurve {
                start: from,
                control1: LayoutPoint::new(from.x, bottom),
                control2: LayoutPoint::new(to.x, bottom),
                end: to,
            },
        });
    }

    set
}

/// Filled arrowhead with its tip on `tip`, opening downward toward the curve.
pub fn arrow_head(tip: LayoutPoint, font_size: f64) -> [LayoutPoint; 3] {
    let cx = font_size / 4.0;
    let cy = font_size / 2.0;
    [
        tip,
        LayoutPoint::new(tip.x - cx, tip.y + cy),
        LayoutPoint::new(tip.x + cx, tip.y + cy),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_height_is_zero_without_arrows() {
        assert_eq!(ArrowSet::default().reserved_height(), 0.0);
    }

    #[test]
    fn reserved_height_is_damped_below_max_bottom() {
        let set = ArrowSet {
            arrows: Vec::new(),
            max_bottom: 400.0,
        };
        let h = set.reserved_height();
        let expected = 400.0 * (20.0f64 / 400.0).powf(0.02);
        assert!((h - expected).abs() < 1e-9);
        assert!(h < 400.0 && h > 350.0);
    }

    #[test]
    fn ordinal_zero_never_resolves() {
        let leaf = Drawable {
            label: "x".to_string(),
            subscript: None,
            superscript: None,
            is_leaf: true,
            depth: 0,
            width: 10.0,
            left: 0.0,
            top: 0.0,
            arrow: None,
            children: Vec::new(),
        };
        assert!(find_target_leaf(&leaf, 0).is_none());
        assert!(find_target_leaf(&leaf, 1).is_some());
    }

    #[test]
    fn arrow_head_points_at_tip() {
        let [tip, left, right] = arrow_head(LayoutPoint::new(10.0, 20.0), 16.0);
        assert_eq!(tip, LayoutPoint::new(10.0, 20.0));
        assert_eq!(left, LayoutPoint::new(6.0, 28.0));
        assert_eq!(right, LayoutPoint::new(14.0, 28.0));
    }
}
