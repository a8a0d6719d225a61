//! Chat completion client.
//!
//! Blocking reqwest client (no Tokio runtime required) for OpenAI-compatible
//! `chat/completions` endpoints. Implements the engine's `Completer` seam.

pub mod client;

pub use client::{CompletionError, OpenAIClient};
