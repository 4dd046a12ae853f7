//! Property-based invariants for the tree layout engine.
//!
//! For any generated tree and config:
//!
//! 1. Determinism: laying out twice yields identical geometry
//! 2. Fill: every internal node is as wide as its children combined, never narrower, and its
//!    last child ends inside it
//! 3. Packing: siblings abut left to right, starting at the parent's left edge
//! 4. Ranks: a child is always on a deeper rank than its parent, and `top` follows `depth`
//! 5. Canvas: every node fits inside the reported width and height
//! 6. Arrows: routed arrows name real leaves and sag below both endpoints

use proptest::prelude::*;
use sapling_core::{ArrowEnds, LeafAlignment, SyntaxNode, SyntaxTree, TreeConfig};
use sapling_render::model::{Drawable, TreeLayout};
use sapling_render::{LayoutOptions, layout_headless};

const LABELS: &[&str] = &["S", "NP", "VP", "PP", "N'", "DP"];
const WORDS: &[&str] = &["the", "dog", "saw", "a", "big cat", "with", "木"];

// ── Strategies ──────────────────────────────────────────────────────────

fn arrow_strategy() -> impl Strategy<Value = Option<(ArrowEnds, u32)>> {
    prop::option::weighted(
        0.2,
        ((any::<bool>(), any::<bool>()), 0u32..40)
            .prop_map(|((to, from), target)| (ArrowEnds { to, from }, target)),
    )
}

fn node_strategy() -> impl Strategy<Value = SyntaxNode> {
    let leaf = (prop::sample::select(WORDS), arrow_strategy()).prop_map(|(word, arrow)| {
        let leaf = SyntaxNode::value(word);
        match arrow {
            Some((ends, target)) => leaf.with_arrow(ends, target),
            None => leaf,
        }
    });

    leaf.prop_recursive(6, 64, 5, |inner| {
        (
            prop::sample::select(LABELS),
            prop::collection::vec(inner, 0..=5),
            prop::option::weighted(0.1, Just("i")),
        )
            .prop_map(|(label, children, subscript)| {
                let node = SyntaxNode::node(label, children);
                match subscript {
                    Some(s) => node.with_subscript(s),
                    None => node,
                }
            })
    })
}

fn tree_strategy() -> impl Strategy<Value = SyntaxTree> {
    prop::collection::vec(node_strategy(), 1..=3).prop_map(SyntaxTree::from_children)
}

fn config_strategy() -> impl Strategy<Value = TreeConfig> {
    (
        prop_oneof![
            Just(LeafAlignment::None),
            Just(LeafAlignment::Bottom),
            Just(LeafAlignment::BottomInternal),
        ],
        any::<bool>(),
        8.0f64..32.0,
        0.5f64..2.5,
    )
        .prop_map(|(alignment, auto_subscript, font_size, spacing)| TreeConfig {
            alignment,
            auto_subscript,
            font_size,
            spacing,
            ..TreeConfig::default()
        })
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

fn layout(tree: &SyntaxTree, config: &TreeConfig) -> TreeLayout {
    layout_headless(tree, config, &LayoutOptions::default()).expect("valid config")
}

fn all_nodes(layout: &TreeLayout) -> Vec<&Drawable> {
    let mut out = vec![&layout.root];
    out.extend(layout.drawables());
    out
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Determinism
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn layout_is_deterministic(tree in tree_strategy(), config in config_strategy()) {
        let first = layout(&tree, &config);
        let second = layout(&tree, &config);
        prop_assert_eq!(first, second);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2 + 3. Fill and packing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn children_fill_their_parent(tree in tree_strategy(), config in config_strategy()) {
        let out = layout(&tree, &config);
        for node in all_nodes(&out) {
            let Some(last) = node.children.last() else {
                continue;
            };
            prop_assert!(
                node.width >= node.child_width(),
                "children of {} span {}, past its width {}",
                node.label, node.child_width(), node.width,
            );
            prop_assert!(
                last.right() <= node.right(),
                "{} ends at {} outside {} ending at {}",
                last.label, last.right(), node.label, node.right(),
            );
            prop_assert!(
                close(node.width, node.child_width()),
                "{} is {} wide but its children span {}",
                node.label, node.width, node.child_width(),
            );
        }
    }

    #[test]
    fn siblings_abut_without_overlap(tree in tree_strategy(), config in config_strategy()) {
        let out = layout(&tree, &config);
        for node in all_nodes(&out) {
            let Some(first) = node.children.first() else {
                continue;
            };
            prop_assert!(close(first.left, node.left),
                "first child of {} starts at {} instead of {}", node.label, first.left, node.left);
            for pair in node.children.windows(2) {
                prop_assert!(close(pair[1].left, pair[0].right()),
                    "{} at {} does not follow {} ending at {}",
                    pair[1].label, pair[1].left, pair[0].label, pair[0].right());
            }
            for child in &node.children {
                prop_assert!(child.width > 0.0);
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Ranks
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn children_sit_on_deeper_ranks(tree in tree_strategy(), config in config_strategy()) {
        let out = layout(&tree, &config);
        let vertical = config.vertical_spacing();
        for node in all_nodes(&out) {
            for child in &node.children {
                prop_assert!(child.depth > node.depth,
                    "{} (depth {}) is not below {} (depth {})",
                    child.label, child.depth, node.label, node.depth);
                prop_assert!(close(child.top, f64::from(child.depth) * vertical));
                prop_assert!(child.depth <= out.max_depth);
            }
        }
    }

    #[test]
    fn bottom_alignment_shares_one_leaf_rank(tree in tree_strategy()) {
        let config = TreeConfig {
            alignment: LeafAlignment::Bottom,
            ..TreeConfig::default()
        };
        let out = layout(&tree, &config);
        for leaf in out.leaves() {
            prop_assert_eq!(leaf.depth, out.max_depth);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Canvas
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn nodes_fit_the_canvas(tree in tree_strategy(), config in config_strategy()) {
        let out = layout(&tree, &config);
        prop_assert!(close(out.width, out.root.child_width()));
        for node in out.drawables() {
            prop_assert!(node.left >= -1e-9);
            prop_assert!(node.right() <= out.width + 1e-6 * out.width.max(1.0),
                "{} ends at {} past canvas width {}", node.label, node.right(), out.width);
            prop_assert!(node.top + config.font_size <= out.height + 1e-9,
                "{} at top {} overflows canvas height {}", node.label, node.top, out.height);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Arrows
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn routed_arrows_connect_real_leaves(tree in tree_strategy(), config in config_strategy()) {
        let out = layout(&tree, &config);
        let leaf_count = out.leaves().len() as u32;
        for arrow in &out.arrows {
            prop_assert!(arrow.target >= 1 && arrow.target <= leaf_count);
            prop_assert!(arrow.source >= 1 && arrow.source <= leaf_count);
            prop_assert!(arrow.bottom >= arrow.from.y && arrow.bottom >= arrow.to.y);
            prop_assert_eq!(arrow.curve.start, arrow.from);
            prop_assert_eq!(arrow.curve.end, arrow.to);
        }
        if out.arrows.is_empty() {
            let m = f64::from(out.max_depth);
            let vertical = config.vertical_spacing();
            let tree_height = ((m + 1.0) * vertical).max(m * vertical + 2.0 * config.font_size);
            prop_assert!(close(out.height, tree_height));
        }
    }
}
