use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Malformed flow key: '{0}'")]
    MalformedKey(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Unparsable income range: '{0}'")]
    UnparsableIncomeRange(String),

    #[error("Unsupported content type: '{0}'")]
    UnsupportedContentType(String),

    #[error("JSON deserialization failed: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Text is not valid UTF-8: {0}")]
    InvalidText(#[from] std::str::Utf8Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FlowError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        FlowError::Schema(message.into())
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
