use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration.
        message: String,
    },

    /// Reading or mutating the canvas failed.
    #[error("Canvas error: {0}")]
    Canvas(#[from] CanvasError),

    /// The completion request failed.
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    /// The tokenizer could not be loaded or used.
    #[error("Encoder error: {0}")]
    Encoder(#[from] EncoderError),
}

/// Canvas (host graph) errors
#[derive(Debug, Error)]
pub enum CanvasError {
    /// No note with this id exists.
    #[error("Node not found: {node_id}")]
    NodeNotFound {
        /// Id that was looked up.
        node_id: String,
    },

    /// The canvas document is structurally invalid.
    #[error("Invalid canvas document: {message}")]
    InvalidDocument {
        /// What is wrong with the document.
        message: String,
    },

    /// Reading or writing the canvas file failed.
    #[error("Canvas persistence failed: {0}")]
    Io(#[from] std::io::Error),

    /// The canvas document is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Completion endpoint errors
#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP 429 from the endpoint.
    #[error("Rate limited by completion endpoint: {body}")]
    RateLimited {
        /// Response body, as returned.
        body: String,
    },

    /// Any other non-success status.
    #[error("Request failed: {status} - {body}")]
    Request {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// The client-side timeout elapsed.
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// Transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A success response body that matches none of the known reply shapes
#[derive(Debug, Error)]
#[error("Unrecognized reply shape: {message}")]
pub struct ReplyDecodeError {
    /// Description including a prefix of the body.
    pub message: String,
}

/// Tokenizer errors
#[derive(Debug, Error)]
pub enum EncoderError {
    /// The BPE tables could not be loaded.
    #[error("Failed to load encoding {encoding}: {message}")]
    Load {
        /// Encoding name.
        encoding: String,
        /// Underlying error.
        message: String,
    },

    /// Tokens did not decode to valid UTF-8.
    #[error("Failed to decode {tokens} tokens: {message}")]
    Decode {
        /// Number of tokens passed in.
        tokens: usize,
        /// Underlying error.
        message: String,
    },
}

impl CompletionError {
    /// Whether the endpoint rejected the call with HTTP 429.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CompletionError::RateLimited { .. })
    }

    /// Message suitable for showing to the person who triggered the request.
    pub fn user_message(&self) -> String {
        match self {
            CompletionError::RateLimited { .. } => {
                "Rate limit reached: the completion endpoint refused the request (HTTP 429). \
                 Wait a moment and try again, or check your plan's quota."
                    .to_string()
            }
            CompletionError::Request { status, body } => {
                format!("Error from completion endpoint ({}): {}", status, body)
            }
            CompletionError::Timeout { timeout_ms } => {
                format!("The completion request timed out after {}ms", timeout_ms)
            }
            CompletionError::Http(e) => format!("Could not reach the completion endpoint: {}", e),
        }
    }
}

impl AppError {
    /// Message suitable for showing to the person who triggered the action.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Completion(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for canvas operations
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Result type alias for completion requests
pub type CompletionResult<T> = Result<T, CompletionError>;

/// Result type alias for tokenizer operations
pub type EncoderResult<T> = Result<T, EncoderError>;
