use thiserror::Error;

/// Application-wide error types.
///
/// This enum represents all possible errors that can occur while harvesting.
/// It uses the `thiserror` crate for ergonomic error handling and automatic
/// conversion from underlying library errors.
///
/// # Error Conversion
///
/// - `serde_json::Error` → `AppError::SerializationError`
/// - `std::io::Error` → `AppError::StoreError`
///
/// Transport errors are classified by the client (see `marquee_client::TmdbClient`)
/// into `ClientError`, `NetworkError`, `Timeout`, `RateLimitExceeded`,
/// `Unauthorized` and `NotFound`.
///
/// # Examples
///
/// ```
/// use marquee_core::error::AppError;
///
/// fn example() -> Result<(), AppError> {
///     Err(AppError::PageLimitReached { page: 500, max_pages: 500 })
/// }
///
/// assert!(example().unwrap_err().is_page_limit());
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed or returned an unexpected status.
    ///
    /// This error occurs when the remote API answers with a non-success
    /// status that has no dedicated variant, or when the body cannot be decoded.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// The API rejected the bearer token (HTTP 401).
    #[error("API rejected the credential")]
    Unauthorized,

    /// The requested resource does not exist upstream (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limit exceeded. Please wait and try again.")]
    RateLimitExceeded,

    /// Network or connection error.
    ///
    /// DNS resolution failures, refused connections, or the remote server
    /// being unreachable.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No credential could be obtained for the API.
    ///
    /// Carries the name of the source that was consulted (e.g. the
    /// environment variable).
    #[error("Missing API credential: {0}")]
    MissingCredential(String),

    /// Discovery was asked to run past the configured page ceiling.
    ///
    /// Raised before any page is fetched; the checkpoint is left untouched.
    #[error("Max pages to read exceeded: next page {page}, ceiling {max_pages}")]
    PageLimitReached { page: u32, max_pages: u32 },

    /// Reading or writing a document collection failed at the I/O level.
    #[error("Store error: {0}")]
    StoreError(#[from] std::io::Error),

    /// A stored collection exists but cannot be decoded.
    ///
    /// No recovery is attempted; the collection must be repaired by hand.
    #[error("Corrupt document '{name}': {reason}")]
    CorruptDocument { name: String, reason: String },

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Unauthorized => {
                "The API rejected the token.\n   Check your MOVIE_API_TOKEN environment variable."
                    .to_string()
            }
            AppError::MissingCredential(source) => {
                format!(
                    "No API token found in {}.\n   Export it or add it to your .env file.",
                    source
                )
            }
            AppError::PageLimitReached { page, max_pages } => {
                format!(
                    "Discovery is complete: next page {} is at or beyond the ceiling of {} pages.\n   Raise max_pages in the checkpoint to keep discovering.",
                    page, max_pages
                )
            }
            AppError::NetworkError(msg) => {
                format!("Network error: {}\n   Check your internet connection.", msg)
            }
            AppError::Timeout(secs) => {
                format!(
                    "Request timed out after {} seconds.\n   The API may be overloaded. Try again later.",
                    secs
                )
            }
            AppError::RateLimitExceeded => {
                "Too many requests. Increase the pause between cycles.".to_string()
            }
            AppError::CorruptDocument { name, reason } => {
                format!(
                    "Stored collection '{}' cannot be read: {}\n   Fix or remove the file and run again.",
                    name, reason
                )
            }
            AppError::ConfigError(msg) => {
                format!(
                    "Configuration error: {}\n   Check your configuration file.",
                    msg
                )
            }
            _ => self.to_string(),
        }
    }

    /// Returns true if this error is the Discovery page ceiling.
    pub fn is_page_limit(&self) -> bool {
        matches!(self, AppError::PageLimitReached { .. })
    }

    /// Returns true if this error is likely to go away on a later cycle.
    ///
    /// The harvester never retries on its own; this only drives log levels
    /// and the wording of cycle reports.
    ///
    /// # Examples
    ///
    /// ```
    /// use marquee_core::error::AppError;
    ///
    /// assert!(AppError::Timeout(30).is_transient());
    /// assert!(!AppError::Unauthorized.is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::RateLimitExceeded => true,
            AppError::ClientError(msg) => msg.contains("HTTP 5"),
            _ => false,
        }
    }
}
