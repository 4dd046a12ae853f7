#![forbid(unsafe_code)]

//! `sapling` draws linguistic syntax trees headlessly.
//!
//! Input is an already-parsed bracket-notation tree (`Root` / `Node` / `Value`, usually as JSON);
//! output is tree geometry, an SVG document, or a PNG.
//!
//! # Features
//!
//! - `render`: enable layout + SVG rendering (`sapling::render`)
//! - `raster`: enable PNG output via pure-Rust SVG rasterization

pub use sapling_core::*;

#[cfg(feature = "render")]
pub mod render {
    pub use sapling_render::model::{ArrowPath, Drawable, TreeLayout};
    pub use sapling_render::renderer::TreeRenderer;
    pub use sapling_render::surface::{DrawOp, RecordingSurface, Surface};
    pub use sapling_render::svg::{SvgRenderOptions, SvgSurface};
    pub use sapling_render::text::{DeterministicTextMeasurer, TextMeasurer, TextStyle};
    pub use sapling_render::{LayoutOptions, layout_headless};

    use sapling_core::{SyntaxTree, TreeConfig};

    #[cfg(feature = "raster")]
    pub mod raster;

    #[derive(Debug, thiserror::Error)]
    pub enum HeadlessError {
        #[error(transparent)]
        Parse(#[from] sapling_core::Error),
        #[error(transparent)]
        Render(#[from] sapling_render::Error),
    }

    pub type Result<T> = std::result::Result<T, HeadlessError>;

    /// Converts an arbitrary string into a conservative SVG `id` token, so several trees can be
    /// inlined into one document.
    ///
    /// Unsupported characters become `-`, and the id always starts with an ASCII letter.
    pub fn sanitize_svg_id(raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() {
            return "tree-untitled".to_string();
        }

        let mut out = String::with_capacity(raw.len() + 5);
        for ch in raw.chars() {
            let ok = ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | ':' | '.');
            out.push(if ok { ch } else { '-' });
        }
        if !out.starts_with(|c: char| c.is_ascii_alphabetic()) {
            out.insert_str(0, "tree-");
        }
        while out.contains("--") {
            out = out.replace("--", "-");
        }
        let out = out.trim_matches('-');
        if out.is_empty() || out == "tree" {
            return "tree-untitled".to_string();
        }
        out.to_string()
    }

    /// Parses tree JSON and lays it out.
    pub fn layout_tree_sync(
        tree_json: &str,
        config: &TreeConfig,
        layout_options: &LayoutOptions,
    ) -> Result<TreeLayout> {
        let tree = SyntaxTree::from_json_str(tree_json)?;
        Ok(layout_headless(&tree, config, layout_options)?)
    }

    /// Parses tree JSON and renders it to an SVG document.
    pub fn render_svg_sync(
        tree_json: &str,
        config: &TreeConfig,
        layout_options: &LayoutOptions,
        svg_options: &SvgRenderOptions,
    ) -> Result<String> {
        let tree = SyntaxTree::from_json_str(tree_json)?;
        Ok(sapling_render::render_svg(
            &tree,
            config,
            layout_options,
            svg_options,
        )?)
    }

    /// Bundles a config and the render options so UI integrations pass one value per call.
    ///
    /// All work is CPU-bound; nothing here performs I/O.
    #[derive(Clone, Default)]
    pub struct HeadlessRenderer {
        pub config: TreeConfig,
        pub layout: LayoutOptions,
        pub svg: SvgRenderOptions,
    }

    impl HeadlessRenderer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_config(mut self, config: TreeConfig) -> Self {
            self.config = config;
            self
        }

        pub fn layout_sync(&self, tree: &SyntaxTree) -> Result<TreeLayout> {
            Ok(layout_headless(tree, &self.config, &self.layout)?)
        }

        pub fn layout_json_sync(&self, tree_json: &str) -> Result<TreeLayout> {
            layout_tree_sync(tree_json, &self.config, &self.layout)
        }

        pub fn render_svg_sync(&self, tree: &SyntaxTree) -> Result<String> {
            self.render_svg_sync_with(tree, &self.svg)
        }

        pub fn render_svg_sync_with(
            &self,
            tree: &SyntaxTree,
            svg: &SvgRenderOptions,
        ) -> Result<String> {
            Ok(sapling_render::render_svg(
                tree,
                &self.config,
                &self.layout,
                svg,
            )?)
        }

        pub fn render_svg_sync_with_diagram_id(
            &self,
            tree: &SyntaxTree,
            diagram_id: &str,
        ) -> Result<String> {
            let mut svg = self.svg.clone();
            svg.diagram_id = Some(sanitize_svg_id(diagram_id));
            self.render_svg_sync_with(tree, &svg)
        }

        #[cfg(feature = "raster")]
        pub fn render_png_sync(
            &self,
            tree: &SyntaxTree,
            raster: &raster::RasterOptions,
        ) -> raster::Result<Vec<u8>> {
            let svg = self.render_svg_sync(tree)?;
            raster::svg_to_png(&svg, raster)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn svg_ids_are_sanitized() {
            assert_eq!(sanitize_svg_id("  "), "tree-untitled");
            assert_eq!(sanitize_svg_id("my tree!"), "my-tree");
            assert_eq!(sanitize_svg_id("1st"), "tree-1st");
            assert_eq!(sanitize_svg_id("a__b"), "a__b");
        }

        #[test]
        fn json_pipeline_parses_and_lays_out() {
            let json = r#"[{"type":"node","label":"S","children":[{"type":"value","label":"a"}]}]"#;
            let layout = layout_tree_sync(json, &TreeConfig::default(), &LayoutOptions::default())
                .unwrap();
            assert_eq!(layout.drawables().len(), 2);

            let err = layout_tree_sync("42", &TreeConfig::default(), &LayoutOptions::default())
                .unwrap_err();
            assert!(matches!(err, HeadlessError::Parse(_)));
        }

        #[test]
        fn headless_renderer_applies_diagram_id() {
            let tree = SyntaxTree::from_children(vec![sapling_core::SyntaxNode::value("x")]);
            let svg = HeadlessRenderer::new()
                .render_svg_sync_with_diagram_id(&tree, "fig 1")
                .unwrap();
            assert!(svg.contains(r#"id="fig-1""#), "{svg}");
        }
    }
}
