//! Stock-sheet extraction boundary.
//!
//! Builds the prompt and chat-completion body that ask a model to pull the
//! medications matching a resolved search term out of a clinic's stock PDF,
//! and turns whatever the model replies into a sanitized [`ExtractionResponse`].
//! Transport is the caller's concern.

pub mod prompts;
pub mod extraction;

pub use extraction::*;
pub use prompts::*;
