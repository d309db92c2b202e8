use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarpError {
    #[error("API key not configured. Run 'warp config set {key} YOUR_KEY' to configure.")]
    NoApiKey { key: String },

    #[error("API key rejected: {0}")]
    InvalidApiKey(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    ApiError {
        code: String,
        message: String,
        hint: Option<String>,
    },

    #[error("Request failed with status {status}: {message}")]
    ClientError { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0} is not supported by this API")]
    NotSupported(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimit,

    #[error("Service is under maintenance: {0}")]
    Maintenance(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Max retries exceeded after {attempts} attempts: {source}")]
    MaxRetriesExceeded {
        attempts: u32,
        #[source]
        source: Box<WarpError>,
    },

    #[error("At least one source must be selected")]
    NoSourceSelected,

    #[error("All sources failed (national: {national}; local: {local})")]
    AllSourcesFailed {
        national: Box<WarpError>,
        local: Box<WarpError>,
    },

    #[error("{0}")]
    Other(String),
}

impl WarpError {
    /// Create an API error with an optional hint
    pub fn api_error(code: impl Into<String>, message: impl Into<String>, hint: Option<String>) -> Self {
        Self::ApiError {
            code: code.into(),
            message: message.into(),
            hint,
        }
    }

    /// Get user-friendly hint for the error
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NoApiKey { key } => Some(format!(
                "Visit https://open.law.go.kr to get your API key. \
                 Then run: warp config set {} YOUR_KEY",
                key
            )),
            Self::InvalidApiKey(_) => Some(
                "Check that your API key is registered at https://open.law.go.kr \
                 and that the requesting IP/domain is allowed."
                    .to_string(),
            ),
            Self::ApiError { hint, .. } => hint.clone(),
            Self::Network(_) => Some("Check your internet connection and try again.".to_string()),
            Self::RateLimit => Some("You've made too many requests. Please wait a moment.".to_string()),
            Self::Maintenance(_) => Some("The service is temporarily unavailable. Try again later.".to_string()),
            Self::AuthenticationFailed(_) => Some("Check your API key configuration.".to_string()),
            Self::MaxRetriesExceeded { source, .. } => source.hint(),
            _ => None,
        }
    }

    /// Errors that should send the user to the API key setup guide.
    /// A fan-out failure counts only when every source failed on its key.
    pub fn is_api_key_error(&self) -> bool {
        match self {
            Self::NoApiKey { .. } | Self::InvalidApiKey(_) => true,
            Self::MaxRetriesExceeded { source, .. } => source.is_api_key_error(),
            Self::AllSourcesFailed { national, local } => {
                national.is_api_key_error() && local.is_api_key_error()
            }
            _ => false,
        }
    }

    /// Whether the error was caused by cancellation or an expired deadline
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

pub type Result<T> = std::result::Result<T, WarpError>;
