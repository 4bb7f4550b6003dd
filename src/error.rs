//! Error types for promptforge operations.
//!
//! Defines error types for the major subsystems:
//! - Library loading and traversal
//! - Strict template rendering
//! - LLM API interactions

use thiserror::Error;

/// Errors that can occur during library operations.
///
/// Malformed individual record files never surface here: the loader skips
/// them and continues. Only a root directory that exists but cannot be
/// traversed raises an error.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Failed to traverse prompt directory '{path}': {message}")]
    Traversal { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during strict template rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API key: GEMINI_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Model returned no candidates")]
    EmptyResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
