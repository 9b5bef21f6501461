//! Tool capability surface for the DIAL completion client.
//!
//! Tools advertise a name, a description, and a JSON-schema parameter
//! description; the orchestrator invokes them with model-supplied arguments
//! and forwards their string results verbatim.

mod calculator;
mod error;
mod traits;

pub use calculator::CalculatorTool;
pub use error::{Result, ToolError};
pub use traits::{optional_string, require_f64, require_string, Tool, ToolSpec};
