use thiserror::Error;

/// Type alias for Result with GmailError
pub type Result<T> = std::result::Result<T, GmailError>;

/// Error types for the auto-reply service
#[derive(Error, Debug)]
pub enum GmailError {
    /// Gmail API returned an error
    #[error("Gmail API error: {0}")]
    ApiError(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Resource already exists (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Server returned 5xx error
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Resource not found (404)
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Invalid message format or parsing error
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    /// Label-related errors
    #[error("Label error: {0}")]
    LabelError(String),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic catch-all error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl GmailError {
    /// Check if the error is transient (a later tick may succeed)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GmailError::RateLimitExceeded(_)
                | GmailError::ServerError { .. }
                | GmailError::NetworkError(_)
        )
    }

    /// Check if the provider reported that the resource already exists
    pub fn is_conflict(&self) -> bool {
        matches!(self, GmailError::Conflict(_))
    }
}

/// Map an HTTP status code from a failed Gmail call to an error variant
fn classify_status(status_code: u16, message: String) -> GmailError {
    match status_code {
        409 => GmailError::Conflict(message),
        429 => GmailError::RateLimitExceeded(message),
        404 => GmailError::MessageNotFound("Resource not found".to_string()),
        400 => GmailError::BadRequest(message),
        403 => GmailError::Forbidden(message),
        500..=599 => GmailError::ServerError {
            status: status_code,
            message,
        },
        _ => GmailError::ApiError(message),
    }
}

impl From<google_gmail1::Error> for GmailError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            // HTTP response with status code (non-success responses)
            google_gmail1::Error::Failure(ref response) => {
                let status = response.status();
                let message = format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                );
                classify_status(status.as_u16(), message)
            }
            // Label creation conflicts surface as a structured API error body
            google_gmail1::Error::BadRequest(ref err) => {
                let code = err
                    .get("error")
                    .and_then(|e| e.get("code"))
                    .and_then(|c| c.as_u64())
                    .and_then(|c| u16::try_from(c).ok());
                match code {
                    Some(code) => classify_status(code, err.to_string()),
                    None => GmailError::BadRequest(err.to_string()),
                }
            }
            google_gmail1::Error::HttpError(ref err) => {
                GmailError::NetworkError(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => GmailError::NetworkError(err.to_string()),
            _ => GmailError::ApiError(error.to_string()),
        }
    }
}
