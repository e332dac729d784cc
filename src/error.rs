use crate::services::external::http::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("API key error: {0}")]
    ApiKey(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ReconError {
    /// Create a new invalid target error
    pub fn invalid_target<T: Into<String>>(msg: T) -> Self {
        Self::InvalidTarget(msg.into())
    }

    /// Create a new API key error
    pub fn api_key<T: Into<String>>(msg: T) -> Self {
        Self::ApiKey(msg.into())
    }

    /// Create a new parse error
    pub fn parse<T: Into<String>>(msg: T) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a new configuration error
    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        Self::Configuration(msg.into())
    }

    /// Numeric code carried by every error kind
    pub fn code(&self) -> u16 {
        match self {
            ReconError::InvalidTarget(_) => 1,
            ReconError::ApiKey(_) => 2,
            ReconError::Parse(_) => 3,
            ReconError::Configuration(_) => 4,
            ReconError::Transport(err) => err.code(),
        }
    }

    /// Stable label for the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ReconError::InvalidTarget(_) => "INVALID_TARGET",
            ReconError::ApiKey(_) => "API_KEY_ERROR",
            ReconError::Parse(_) => "PARSE_ERROR",
            ReconError::Configuration(_) => "CONFIG_ERROR",
            ReconError::Transport(_) => "TRANSPORT_ERROR",
        }
    }
}

impl From<serde_json::Error> for ReconError {
    fn from(err: serde_json::Error) -> Self {
        ReconError::Parse(format!("Malformed JSON response: {}", err))
    }
}

impl From<config::ConfigError> for ReconError {
    fn from(err: config::ConfigError) -> Self {
        ReconError::Configuration(err.to_string())
    }
}

/// Result type alias for reconnaissance operations
pub type ReconResult<T> = Result<T, ReconError>;
