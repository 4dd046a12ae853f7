#![forbid(unsafe_code)]

pub mod arrow;
pub mod layout;
pub mod model;
pub mod renderer;
pub mod surface;
pub mod svg;
pub mod text;

use crate::model::TreeLayout;
use crate::renderer::TreeRenderer;
use crate::surface::RecordingSurface;
use crate::svg::{SvgRenderOptions, SvgSurface};
use crate::text::{DeterministicTextMeasurer, TextMeasurer};
use sapling_core::{SyntaxTree, TreeConfig};
use std::sync::Arc;

pub use crate::layout::layout_tree;
pub use crate::renderer::render_layout;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("a drawing surface must be attached before drawing")]
    MissingSurface,
    #[error(transparent)]
    Core(#[from] sapling_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone)]
pub struct LayoutOptions {
    pub text_measurer: Arc<dyn TextMeasurer + Send + Sync>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            text_measurer: Arc::new(DeterministicTextMeasurer::default()),
        }
    }
}

/// Geometry only; nothing is painted. Fails on a config [`TreeConfig::validate`] rejects.
pub fn layout_headless(
    tree: &SyntaxTree,
    config: &TreeConfig,
    options: &LayoutOptions,
) -> Result<TreeLayout> {
    config.validate()?;
    let surface = RecordingSurface::new(options.text_measurer.clone());
    Ok(layout_tree(tree, config, &surface))
}

/// One full draw cycle onto a fresh SVG surface.
pub fn render_svg(
    tree: &SyntaxTree,
    config: &TreeConfig,
    options: &LayoutOptions,
    svg_options: &SvgRenderOptions,
) -> Result<String> {
    let surface = SvgSurface::new(options.text_measurer.clone(), svg_options.clone());
    let mut renderer = TreeRenderer::new(config.clone()).with_surface(surface);
    renderer.draw(tree)?;
    let surface = renderer.into_surface().ok_or(Error::MissingSurface)?;
    Ok(surface.finish())
}
