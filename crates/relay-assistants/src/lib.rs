//! # relay-assistants
//!
//! Assistant service clients for Relay.

pub mod openai;

pub use openai::OpenAiAssistants;
