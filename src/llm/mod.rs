//! External text-generation client.
//!
//! The test harness depends on this module as an opaque collaborator: a
//! request goes out, generated text or an error comes back. Providers are
//! injected behind the [`GenerateText`] trait so tests can substitute a
//! mock for the network.

pub mod gemini;

pub use gemini::{GeminiClient, GenerateText, GenerationRequest, GenerationResponse};
