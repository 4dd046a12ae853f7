use sapling_core::{SyntaxNode, SyntaxTree, TreeConfig};
use sapling_render::Error;
use sapling_render::model::LayoutPoint;
use sapling_render::renderer::TreeRenderer;
use sapling_render::surface::{DrawOp, RecordingSurface};

fn n(label: &str, children: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::node(label, children)
}

fn v(label: &str) -> SyntaxNode {
    SyntaxNode::value(label)
}

fn draw(tree: &SyntaxTree, config: TreeConfig) -> RecordingSurface {
    let mut renderer = TreeRenderer::new(config).with_surface(RecordingSurface::default());
    renderer.draw(tree).expect("draw ok");
    renderer.into_surface().expect("surface attached")
}

fn fill_colors(surface: &RecordingSurface) -> Vec<&str> {
    surface
        .ops()
        .iter()
        .filter_map(|op| match op {
            DrawOp::FillColor { color } => Some(color.as_str()),
            _ => None,
        })
        .collect()
}

fn text_at<'a>(surface: &'a RecordingSurface, label: &str) -> Option<(&'a LayoutPoint, f64)> {
    surface.ops().iter().find_map(|op| match op {
        DrawOp::Text {
            text,
            at,
            font_size,
        } if text == label => Some((at, *font_size)),
        _ => None,
    })
}

#[test]
fn drawing_without_a_surface_fails() {
    let tree = SyntaxTree::from_children(vec![v("a")]);
    let mut renderer = TreeRenderer::<RecordingSurface>::new(TreeConfig::default());
    let err = renderer.draw(&tree).unwrap_err();
    assert!(matches!(err, Error::MissingSurface));
    assert_eq!(
        err.to_string(),
        "a drawing surface must be attached before drawing"
    );
}

#[test]
fn invalid_config_is_reported_before_drawing() {
    let tree = SyntaxTree::from_children(vec![v("a")]);
    let config = TreeConfig {
        font_size: 0.0,
        ..TreeConfig::default()
    };
    let mut renderer = TreeRenderer::new(config).with_surface(RecordingSurface::default());
    let err = renderer.draw(&tree).unwrap_err();
    assert!(matches!(err, Error::Core(sapling_core::Error::InvalidConfig { .. })));
    assert!(renderer.surface().expect("surface attached").ops().is_empty());
}

#[test]
fn canvas_is_resized_before_anything_is_drawn() {
    let tree = SyntaxTree::from_children(vec![n("S", vec![v("a")])]);
    let surface = draw(&tree, TreeConfig::default());
    match &surface.ops()[0] {
        DrawOp::Resize { width, height } => {
            assert!((width - 29.6).abs() < 1e-9);
            assert_eq!(*height, 96.0);
        }
        other => panic!("expected resize first, got {other:?}"),
    }
}

#[test]
fn labels_are_colored_by_kind() {
    let tree = SyntaxTree::from_children(vec![n("S", vec![n("NP", vec![v("a")])])]);

    let colored = draw(&tree, TreeConfig::default());
    assert_eq!(fill_colors(&colored), vec!["#0000CC", "#0000CC", "#CC0000"]);
    assert_eq!(colored.texts(), vec!["S", "NP", "a"]);

    let plain = draw(
        &tree,
        TreeConfig {
            node_color: false,
            ..TreeConfig::default()
        },
    );
    assert_eq!(fill_colors(&plain), vec!["black", "black", "black"]);
}

#[test]
fn labels_sit_below_the_top_margin() {
    let tree = SyntaxTree::from_children(vec![n("S", vec![v("a")])]);
    let surface = draw(&tree, TreeConfig::default());

    let (s, size) = text_at(&surface, "S").expect("S drawn");
    assert_eq!(size, 16.0);
    assert!((s.x - 14.8).abs() < 1e-9);
    assert_eq!(s.y, 2.0 + 8.0);

    let (a, _) = text_at(&surface, "a").expect("a drawn");
    assert_eq!(a.y, 48.0 + 2.0 + 8.0);
}

#[test]
fn multi_word_leaves_get_a_hollow_triangle() {
    let tree = SyntaxTree::from_children(vec![n(
        "S",
        vec![n("NP", vec![v("Main clause")]), n("VP", vec![v("sat")])],
    )]);

    let surface = draw(&tree, TreeConfig::default());
    let triangles: Vec<_> = surface
        .ops()
        .iter()
        .filter_map(|op| match op {
            DrawOp::Triangle { points, filled } => Some((points, *filled)),
            _ => None,
        })
        .collect();
    assert_eq!(triangles.len(), 1);
    let (points, filled) = triangles[0];
    assert!(!filled);
    // 11 columns at 9.6px: half-width 52.8, inset by 4 on each side.
    let spread = points[1].x - points[2].x;
    assert!((spread - 2.0 * 48.8).abs() < 1e-9);
    assert_eq!(points[1].y, points[2].y);
    assert_eq!(surface.count(|op| matches!(op, DrawOp::Line { .. })), 3);

    let flat = draw(
        &tree,
        TreeConfig {
            triangles: false,
            ..TreeConfig::default()
        },
    );
    assert_eq!(flat.count(|op| matches!(op, DrawOp::Triangle { .. })), 0);
    assert_eq!(flat.count(|op| matches!(op, DrawOp::Line { .. })), 4);
}

#[test]
fn connectors_run_from_under_the_parent_label_to_above_the_child() {
    let tree = SyntaxTree::from_children(vec![n("S", vec![v("a")])]);
    let surface = draw(&tree, TreeConfig::default());
    let line = surface
        .ops()
        .iter()
        .find_map(|op| match op {
            DrawOp::Line { from, to } => Some((*from, *to)),
            _ => None,
        })
        .expect("one connector");
    assert_eq!(line.0.y, 16.0 + 2.0 + 8.0);
    assert_eq!(line.1.y, 48.0 - 3.0 + 8.0);
    assert_eq!(line.0.x, line.1.x);
}

#[test]
fn scripts_are_drawn_smaller_beside_the_label() {
    let tree = SyntaxTree::from_children(vec![n(
        "S",
        vec![n("NP", vec![v("he")]).with_subscript("i").with_superscript("'")],
    )]);
    let surface = draw(&tree, TreeConfig::default());

    let (np, _) = text_at(&surface, "NP").expect("NP drawn");
    let (sub, sub_size) = text_at(&surface, "i").expect("subscript drawn");
    let (sup, sup_size) = text_at(&surface, "'").expect("superscript drawn");

    assert_eq!(sub_size, 12.0);
    assert_eq!(sup_size, 12.0);
    // Script center = label center + half label width + half script width.
    let expected_x = np.x + 2.0 * 9.6 / 2.0 + 7.2 / 2.0;
    assert!((sub.x - expected_x).abs() < 1e-9);
    assert!((sup.x - expected_x).abs() < 1e-9);
    assert_eq!(sub.y, 48.0 + 8.0 + 8.0);
    assert_eq!(sup.y, 48.0 - 4.0 + 8.0);
}

#[test]
fn single_leaf_draws_one_label_and_no_connectors() {
    let tree = SyntaxTree::new(v("alone"));
    let surface = draw(&tree, TreeConfig::default());
    assert_eq!(surface.texts(), vec!["alone"]);
    assert_eq!(surface.count(|op| matches!(op, DrawOp::Line { .. })), 0);
    assert_eq!(surface.count(|op| matches!(op, DrawOp::Triangle { .. })), 0);
}

#[test]
fn redrawing_replaces_the_previous_frame() {
    let tree = SyntaxTree::from_children(vec![n("S", vec![v("a"), v("b")])]);
    let mut renderer =
        TreeRenderer::new(TreeConfig::default()).with_surface(RecordingSurface::default());
    renderer.draw(&tree).expect("first draw");
    let first = renderer.surface().expect("surface").ops().to_vec();

    renderer.config_mut().node_color = false;
    renderer.draw(&tree).expect("second draw");
    let second = renderer.surface().expect("surface");
    assert_eq!(first.len(), second.ops().len());
    assert_eq!(fill_colors(second), vec!["black"; 3]);
}
