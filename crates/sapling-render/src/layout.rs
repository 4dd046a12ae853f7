//! Layout engine: syntax tree → [`Drawable`] geometry.
//!
//! Passes run in a fixed order because each one reads what the previous one settled:
//! build (intrinsic widths) → alignment (depths) → auto-subscript (labels, re-measured widths)
//! → offsets (scaled widths, `left`/`top`) → arrow routing → canvas size.

use crate::arrow::route_arrows;
use crate::model::{Drawable, TreeLayout};
use crate::surface::Surface;
use crate::text::TextStyle;
use rustc_hash::FxHashMap;
use sapling_core::{LeafAlignment, SyntaxNode, SyntaxTree, TreeConfig};

/// Horizontal padding added to every label.
pub const NODE_PADDING: f64 = 20.0;
/// Sub/superscripts are set at this fraction of the label size.
pub const SCRIPT_SCALE: f64 = 0.75;

pub fn label_style(config: &TreeConfig) -> TextStyle {
    TextStyle::new(config.font_family.clone(), config.font_size)
}

/// Runs every layout pass. `config` must already have passed [`TreeConfig::validate`]; a
/// non-positive or NaN spacing would otherwise yield degenerate geometry.
pub fn layout_tree(tree: &SyntaxTree, config: &TreeConfig, surface: &dyn Surface) -> TreeLayout {
    let style = label_style(config);
    let mut root = build_root(&tree.root, surface, &style);

    let max_depth = root.max_depth();
    match config.alignment {
        LeafAlignment::None => {}
        LeafAlignment::Bottom => move_leaves_to_bottom(&mut root, max_depth),
        LeafAlignment::BottomInternal => {
            move_leaves_to_bottom(&mut root, max_depth);
            pull_internal_nodes_down(&mut root);
        }
    }

    if config.auto_subscript && assign_auto_subscripts(&mut root) > 0 {
        refresh_intrinsic_widths(&mut root, surface, &style);
    }

    let vertical = config.vertical_spacing();
    let has_arrow = calculate_positions(&mut root, vertical);
    let arrow_set = route_arrows(&root, config.font_size);

    let width = root.child_width();
    let tree_height =
        ((max_depth + 1) as f64 * vertical).max(max_depth as f64 * vertical + 2.0 * config.font_size);
    let height = if has_arrow && !arrow_set.arrows.is_empty() {
        tree_height.max(arrow_set.reserved_height() + config.font_size / 2.0)
    } else {
        tree_height
    };

    tracing::debug!(
        nodes = root.descendants().len(),
        max_depth,
        arrows = arrow_set.arrows.len(),
        width,
        height,
        "tree layout complete"
    );

    TreeLayout {
        root,
        arrows: arrow_set.arrows,
        width,
        height,
        max_depth,
        has_arrow,
    }
}

/// Builds the root drawable. A tree whose top node is not `Root` is laid out as a root holding
/// that single node.
pub fn build_root(node: &SyntaxNode, surface: &dyn Surface, style: &TextStyle) -> Drawable {
    match node {
        SyntaxNode::Root { .. } => build_drawable(node, -1, surface, style),
        SyntaxNode::Node { .. } | SyntaxNode::Value { .. } => {
            let mut root = Drawable {
                label: String::new(),
                subscript: None,
                superscript: None,
                is_leaf: false,
                depth: -1,
                width: 0.0,
                left: 0.0,
                top: 0.0,
                arrow: None,
                children: vec![build_drawable(node, 0, surface, style)],
            };
            root.width = intrinsic_width(&root, surface, style);
            root
        }
    }
}

/// Mirrors `node` (and its subtree) into drawables, computing each intrinsic width.
pub fn build_drawable(
    node: &SyntaxNode,
    depth: i32,
    surface: &dyn Surface,
    style: &TextStyle,
) -> Drawable {
    let mut drawable = match node {
        SyntaxNode::Root { children } => Drawable {
            label: String::new(),
            subscript: None,
            superscript: None,
            is_leaf: false,
            depth,
            width: 0.0,
            left: 0.0,
            top: 0.0,
            arrow: None,
            children: children
                .iter()
                .map(|c| build_drawable(c, depth + 1, surface, style))
                .collect(),
        },
        SyntaxNode::Node {
            label,
            subscript,
            superscript,
            children,
        } => Drawable {
            label: label.clone(),
            subscript: subscript.clone(),
            superscript: superscript.clone(),
            is_leaf: false,
            depth,
            width: 0.0,
            left: 0.0,
            top: 0.0,
            arrow: None,
            children: children
                .iter()
                .map(|c| build_drawable(c, depth + 1, surface, style))
                .collect(),
        },
        SyntaxNode::Value {
            label,
            subscript,
            superscript,
            arrow,
        } => Drawable {
            label: label.clone(),
            subscript: subscript.clone(),
            superscript: superscript.clone(),
            is_leaf: true,
            depth,
            width: 0.0,
            left: 0.0,
            top: 0.0,
            arrow: *arrow,
            children: Vec::new(),
        },
    };
    drawable.width = intrinsic_width(&drawable, surface, style);
    drawable
}

/// Width of the label itself, with room reserved on both sides for any sub/superscript.
pub fn label_width(drawable: &Drawable, surface: &dyn Surface, style: &TextStyle) -> f64 {
    if drawable.is_root() {
        return 0.0;
    }
    let mut width = surface.measure_text_width(&drawable.label, style) + NODE_PADDING;
    let script_style = style.scaled(SCRIPT_SCALE);
    for script in [&drawable.subscript, &drawable.superscript] {
        if let Some(text) = script.as_deref().filter(|s| !s.is_empty()) {
            width += surface.measure_text_width(text, &script_style) * 2.0;
        }
    }
    width
}

/// `max(own label, sum of children)`; relies on the children's widths already being intrinsic.
fn intrinsic_width(drawable: &Drawable, surface: &dyn Surface, style: &TextStyle) -> f64 {
    let own = label_width(drawable, surface, style);
    if drawable.is_leaf {
        own
    } else {
        own.max(drawable.child_width())
    }
}

fn refresh_intrinsic_widths(drawable: &mut Drawable, surface: &dyn Surface, style: &TextStyle) {
    for child in &mut drawable.children {
        refresh_intrinsic_widths(child, surface, style);
    }
    drawable.width = intrinsic_width(drawable, surface, style);
}

/// Puts every leaf on the `bottom` rank.
pub fn move_leaves_to_bottom(drawable: &mut Drawable, bottom: i32) {
    if drawable.is_leaf {
        drawable.depth = bottom;
    }
    for child in &mut drawable.children {
        move_leaves_to_bottom(child, bottom);
    }
}

/// Moves each non-root internal node to one rank above its shallowest child, bottom-up.
///
/// Childless internal nodes keep their depth.
pub fn pull_internal_nodes_down(drawable: &mut Drawable) {
    for child in &mut drawable.children {
        pull_internal_nodes_down(child);
    }
    if drawable.is_leaf || drawable.is_root() {
        return;
    }
    if let Some(min_child) = drawable.children.iter().map(|c| c.depth).min() {
        drawable.depth = min_child - 1;
    }
}

/// Numbers repeated internal labels in traversal order. Returns how many subscripts were set.
///
/// Nodes that already carry a subscript or superscript neither count nor get renumbered.
pub fn assign_auto_subscripts(root: &mut Drawable) -> usize {
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    count_labels(root, &mut counts);
    counts.retain(|_, n| *n > 1);
    if counts.is_empty() {
        return 0;
    }

    let mut tally: FxHashMap<String, usize> = FxHashMap::default();
    assign_subscripts(root, &counts, &mut tally);
    tally.values().sum()
}

fn eligible_for_subscript(drawable: &Drawable) -> bool {
    !drawable.is_leaf && !drawable.is_root() && !drawable.has_explicit_script()
}

fn count_labels(drawable: &Drawable, counts: &mut FxHashMap<String, usize>) {
    if drawable.is_leaf {
        return;
    }
    if eligible_for_subscript(drawable) {
        *counts.entry(drawable.label.clone()).or_default() += 1;
    }
    for child in &drawable.children {
        count_labels(child, counts);
    }
}

fn assign_subscripts(
    drawable: &mut Drawable,
    repeated: &FxHashMap<String, usize>,
    tally: &mut FxHashMap<String, usize>,
) {
    if eligible_for_subscript(drawable) && repeated.contains_key(&drawable.label) {
        let n = tally.entry(drawable.label.clone()).or_default();
        *n += 1;
        drawable.subscript = Some(n.to_string());
    }
    for child in &mut drawable.children {
        assign_subscripts(child, repeated, tally);
    }
}

/// Assigns `left`/`top` depth-first, left to right, scaling children up so they fill any parent
/// that is wider than their combined footprint. Returns whether any node carries an arrow.
pub fn calculate_positions(drawable: &mut Drawable, vertical_spacing: f64) -> bool {
    let mut has_arrow = drawable.arrow.is_some();

    if !drawable.is_root() {
        let child_width = drawable.child_width();
        if child_width > 0.0 && drawable.width > child_width {
            let scale = drawable.width / child_width;
            for child in &mut drawable.children {
                child.width *= scale;
            }
        }
        fit_last_child(drawable);
    }

    let mut cursor = drawable.left;
    for child in &mut drawable.children {
        child.left = cursor;
        child.top = child.depth as f64 * vertical_spacing;
        if calculate_positions(child, vertical_spacing) {
            has_arrow = true;
        }
        cursor += child.width;
    }

    has_arrow
}

/// Hands the last child whatever width its siblings left over, so the children never sum past
/// the parent and the last one ends inside the parent's span. A child shrunk here by an ulp
/// refits its own children when the offset pass reaches it.
fn fit_last_child(drawable: &mut Drawable) {
    let parent_left = drawable.left;
    let parent_width = drawable.width;
    let parent_right = drawable.right();
    let Some((last, rest)) = drawable.children.split_last_mut() else {
        return;
    };
    let rest_width: f64 = rest.iter().map(|c| c.width).sum();
    let last_left = rest.iter().fold(parent_left, |cursor, c| cursor + c.width);

    let mut width = (parent_width - rest_width).max(0.0);
    // Subtraction can round up by an ulp; step down until both sums stay inside the parent.
    while width > 0.0 && (rest_width + width > parent_width || last_left + width > parent_right) {
        width = width.next_down();
    }
    last.width = width;
}
