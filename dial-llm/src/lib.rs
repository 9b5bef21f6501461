//! Chat-completions client for DIAL-style deployments.
//!
//! Pure HTTP client plus the tool-calling orchestration loop: registered
//! tools are advertised on every request, and when the model finishes with
//! `tool_calls` their results are fed back into the conversation until a
//! final answer arrives.

mod client;
mod error;
mod types;

pub use client::DialClient;
pub use error::{DialError, Result};
pub use types::{ChatMessage, Role, ToolCall, Usage};
