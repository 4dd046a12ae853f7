use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which ends of an arrow carry an arrowhead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrowEnds {
    #[serde(default)]
    pub to: bool,
    #[serde(default)]
    pub from: bool,
}

impl ArrowEnds {
    /// `->`: head at the target leaf.
    pub fn to() -> Self {
        Self {
            to: true,
            from: false,
        }
    }

    /// `<-`: head at the source leaf.
    pub fn from() -> Self {
        Self {
            to: false,
            from: true,
        }
    }

    /// `<>`: heads at both ends.
    pub fn both() -> Self {
        Self {
            to: true,
            from: true,
        }
    }
}

/// A connector from a leaf to another leaf.
///
/// `target` is the 1-based position of the target leaf in depth-first leaf order, not a node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrow {
    #[serde(default)]
    pub ends: ArrowEnds,
    pub target: u32,
}

impl Arrow {
    pub fn new(ends: ArrowEnds, target: u32) -> Self {
        Self { ends, target }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SyntaxNode {
    Root {
        #[serde(default, alias = "values")]
        children: Vec<SyntaxNode>,
    },
    Node {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subscript: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        superscript: Option<String>,
        #[serde(default, alias = "values")]
        children: Vec<SyntaxNode>,
    },
    Value {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subscript: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        superscript: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        arrow: Option<Arrow>,
    },
}

impl SyntaxNode {
    pub fn root(children: Vec<SyntaxNode>) -> Self {
        Self::Root { children }
    }

    pub fn node(label: impl Into<String>, children: Vec<SyntaxNode>) -> Self {
        Self::Node {
            label: label.into(),
            subscript: None,
            superscript: None,
            children,
        }
    }

    pub fn value(label: impl Into<String>) -> Self {
        Self::Value {
            label: label.into(),
            subscript: None,
            superscript: None,
            arrow: None,
        }
    }

    /// Sets the subscript. No-op on `Root`.
    pub fn with_subscript(mut self, text: impl Into<String>) -> Self {
        match &mut self {
            Self::Root { .. } => {}
            Self::Node { subscript, .. } | Self::Value { subscript, .. } => {
                *subscript = Some(text.into());
            }
        }
        self
    }

    /// Sets the superscript. No-op on `Root`.
    pub fn with_superscript(mut self, text: impl Into<String>) -> Self {
        match &mut self {
            Self::Root { .. } => {}
            Self::Node { superscript, .. } | Self::Value { superscript, .. } => {
                *superscript = Some(text.into());
            }
        }
        self
    }

    /// Attaches an arrow. Only leaves carry arrows, so this is a no-op unless `self` is a `Value`.
    pub fn with_arrow(mut self, ends: ArrowEnds, target: u32) -> Self {
        if let Self::Value { arrow, .. } = &mut self {
            *arrow = Some(Arrow::new(ends, target));
        }
        self
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Root { .. } => None,
            Self::Node { label, .. } | Self::Value { label, .. } => Some(label),
        }
    }

    pub fn children(&self) -> &[SyntaxNode] {
        match self {
            Self::Root { children } | Self::Node { children, .. } => children,
            Self::Value { .. } => &[],
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value { .. })
    }

    fn count_values(&self) -> usize {
        if self.is_value() {
            return 1;
        }
        self.children().iter().map(Self::count_values).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyntaxTree {
    pub root: SyntaxNode,
}

impl SyntaxTree {
    pub fn new(root: SyntaxNode) -> Self {
        Self { root }
    }

    pub fn from_children(children: Vec<SyntaxNode>) -> Self {
        Self::new(SyntaxNode::root(children))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Accepts either a tagged node object or a bare array of top-level nodes.
    pub fn from_value(value: &Value) -> Result<Self> {
        let tree = match value {
            Value::Array(items) => {
                let children = items
                    .iter()
                    .map(SyntaxNode::deserialize)
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Self::from_children(children)
            }
            Value::Object(_) => Self::new(SyntaxNode::deserialize(value)?),
            other => {
                return Err(Error::InvalidTree {
                    message: format!("expected a node object or an array of nodes, got {other}"),
                });
            }
        };
        tracing::debug!(leaves = tree.leaf_count(), "syntax tree loaded");
        Ok(tree)
    }

    /// Number of `Value` leaves, in the same depth-first order arrow targets use.
    pub fn leaf_count(&self) -> usize {
        self.root.count_values()
    }
}
