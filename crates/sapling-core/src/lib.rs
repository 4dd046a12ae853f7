#![forbid(unsafe_code)]

//! Syntax tree model + configuration (headless).
//!
//! The bracket-notation phrase is tokenized/parsed elsewhere; this crate owns the already-parsed
//! tree shape (`Root` / `Node` / `Value`), its JSON ingestion, and the layered configuration the
//! layout engine consumes.

pub mod config;
pub mod error;
pub mod model;

pub use config::{LeafAlignment, SaplingConfig, TreeConfig};
pub use error::{Error, Result};
pub use model::{Arrow, ArrowEnds, SyntaxNode, SyntaxTree};
