//! promptforge: prompt library manager and regression-test harness.
//!
//! This library provides tools for organizing, searching, and
//! regression-testing a collection of YAML prompt templates against an
//! external text-generation service.

// Core modules
pub mod cli;
pub mod error;
pub mod library;
pub mod llm;
pub mod prompt;
pub mod tester;
pub mod validate;

// Re-export commonly used error types
pub use error::{LibraryError, LlmError, RenderError};
