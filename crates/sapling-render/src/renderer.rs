//! Paints a [`TreeLayout`] onto a [`Surface`].

use crate::arrow::arrow_head;
use crate::layout::{SCRIPT_SCALE, label_style, layout_tree};
use crate::model::{Drawable, LayoutPoint, TreeLayout};
use crate::surface::Surface;
use crate::text::TextStyle;
use crate::{Error, Result};
use sapling_core::{SyntaxTree, TreeConfig};

const LEAF_COLOR: &str = "#CC0000";
const NODE_COLOR: &str = "#0000CC";
const PLAIN_COLOR: &str = "black";
const ARROW_COLOR: &str = "#909";
const PLAIN_ARROW_COLOR: &str = "#999";

/// Owns the configuration and the drawing surface for repeated draw cycles.
///
/// Every [`draw`](Self::draw) rebuilds the layout from scratch.
#[derive(Debug, Clone)]
pub struct TreeRenderer<S> {
    config: TreeConfig,
    surface: Option<S>,
}

impl<S: Surface> TreeRenderer<S> {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            surface: None,
        }
    }

    pub fn with_surface(mut self, surface: S) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn set_surface(&mut self, surface: S) {
        self.surface = Some(surface);
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn into_surface(self) -> Option<S> {
        self.surface
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TreeConfig {
        &mut self.config
    }

    pub fn draw(&mut self, tree: &SyntaxTree) -> Result<TreeLayout> {
        let surface = self.surface.as_mut().ok_or(Error::MissingSurface)?;
        self.config.validate()?;
        let layout = layout_tree(tree, &self.config, &*surface);
        render_layout(&layout, &self.config, surface);
        Ok(layout)
    }
}

/// Whether the connector into `child` is drawn as a triangle rather than a line.
pub fn uses_triangle(child: &Drawable, config: &TreeConfig) -> bool {
    config.triangles && child.is_leaf && child.label.contains(' ')
}

/// Paints a finished layout: tree first, arrows in a second pass on top.
pub fn render_layout(layout: &TreeLayout, config: &TreeConfig, surface: &mut dyn Surface) {
    let label = label_style(config);
    let mut painter = Painter {
        script: label.scaled(SCRIPT_SCALE),
        label,
        surface,
        config,
        dy: config.font_size / 2.0,
    };

    painter.surface.resize(layout.width, layout.height);
    painter.surface.set_stroke_color(PLAIN_COLOR);
    painter.surface.set_line_width(1.0);
    for child in &layout.root.children {
        painter.draw_node(child);
    }
    painter.draw_arrows(layout);
}

struct Painter<'a, 's> {
    surface: &'a mut (dyn Surface + 's),
    config: &'a TreeConfig,
    label: TextStyle,
    script: TextStyle,
    /// Top margin applied to every y coordinate.
    dy: f64,
}

impl Painter<'_, '_> {
    fn draw_node(&mut self, drawable: &Drawable) {
        self.draw_label(drawable);
        self.draw_scripts(drawable);

        for child in &drawable.children {
            self.draw_node(child);
            self.draw_connector(drawable, child);
        }
    }

    fn draw_label(&mut self, drawable: &Drawable) {
        let color = match (self.config.node_color, drawable.is_leaf) {
            (false, _) => PLAIN_COLOR,
            (true, true) => LEAF_COLOR,
            (true, false) => NODE_COLOR,
        };
        self.surface.set_fill_color(color);
        self.surface.draw_text(
            &drawable.label,
            LayoutPoint::new(drawable.center(), drawable.top + 2.0 + self.dy),
            &self.label,
        );
    }

    fn draw_scripts(&mut self, drawable: &Drawable) {
        let label_right =
            drawable.center() + self.surface.measure_text_width(&drawable.label, &self.label) / 2.0;
        let fs = self.config.font_size;
        let scripts = [
            (&drawable.subscript, drawable.top + fs / 2.0),
            (&drawable.superscript, drawable.top - fs / 4.0),
        ];
        for (script, y) in scripts {
            let Some(text) = script.as_deref().filter(|s| !s.is_empty()) else {
                continue;
            };
            let x = label_right + self.surface.measure_text_width(text, &self.script) / 2.0;
            self.surface
                .draw_text(text, LayoutPoint::new(x, y + self.dy), &self.script);
        }
    }

    fn draw_connector(&mut self, parent: &Drawable, child: &Drawable) {
        let fs = self.config.font_size;
        let top = LayoutPoint::new(parent.center(), parent.top + fs + 2.0 + self.dy);
        let child_y = child.top - 3.0 + self.dy;

        if uses_triangle(child, self.config) {
            let half = self.surface.measure_text_width(&child.label, &self.label) / 2.0;
            self.surface.draw_triangle(
                top,
                LayoutPoint::new(child.center() + half - 4.0, child_y),
                LayoutPoint::new(child.center() - half + 4.0, child_y),
                false,
            );
        } else {
            self.surface
                .draw_line(top, LayoutPoint::new(child.center(), child_y));
        }
    }

    fn draw_arrows(&mut self, layout: &TreeLayout) {
        if layout.arrows.is_empty() {
            return;
        }
        let color = if self.config.node_color {
            ARROW_COLOR
        } else {
            PLAIN_ARROW_COLOR
        };
        self.surface.set_fill_color(color);
        self.surface.set_stroke_color(color);
        self.surface.set_line_width(2.0);

        let fs = self.config.font_size;
        for arrow in &layout.arrows {
            self.surface.draw_curve(&arrow.curve.offset_y(self.dy));
            if arrow.ends.to {
                let [a, b, c] = arrow_head(arrow.to.offset_y(self.dy), fs);
                self.surface.draw_triangle(a, b, c, true);
            }
            if arrow.ends.from {
                let [a, b, c] = arrow_head(arrow.from.offset_y(self.dy), fs);
                self.surface.draw_triangle(a, b, c, true);
            }
        }
    }
}
