use thiserror::Error;

pub type Result<T> = std::result::Result<T, DialError>;

#[derive(Debug, Error)]
pub enum DialError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response format: {0}")]
    ResponseFormat(String),

    #[error("invalid arguments for tool {name}: {reason}")]
    ToolArguments { name: String, reason: String },

    #[error("tool round limit of {0} reached without a final answer")]
    RoundLimit(usize),
}

impl From<reqwest::Error> for DialError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for DialError {
    fn from(e: serde_json::Error) -> Self {
        Self::ResponseFormat(e.to_string())
    }
}
