//! Prompt record model.
//!
//! Defines the typed shape of a prompt record (parameters, metadata,
//! examples) and the template substitution algorithms. Records are parsed
//! once at load time and immutable thereafter; rendering produces new text
//! and never mutates the template.

pub mod render;
pub mod schema;

pub use render::render_raw;
pub use schema::{Prompt, PromptExample, PromptMetadata, PromptParameter};
