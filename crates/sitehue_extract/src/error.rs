use std::time::Duration;

use thiserror::Error;

/// Coarse classification of a fetch failure, used to pick an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    Forbidden,
    NotFound,
    Unreachable,
    Other,
}

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to start browser session: {0}")]
    Session(String),

    #[error("Browser command {command} failed: {message}")]
    Command { command: String, message: String },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Browser operation timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Empty response body")]
    EmptyBody,

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("All {} strategies failed", .0.len())]
    Exhausted(Vec<StrategyFailure>),
}

impl FetchError {
    pub fn cause(&self) -> FailureCause {
        match self {
            FetchError::Status(403) => FailureCause::Forbidden,
            FetchError::Status(404) => FailureCause::NotFound,
            FetchError::InvalidUrl(_) | FetchError::Timeout(_) | FetchError::Connect(_) => {
                FailureCause::Unreachable
            }
            FetchError::Browser(BrowserError::Timeout(_)) => FailureCause::Unreachable,
            // The first attempt with a meaningful cause decides.
            FetchError::Exhausted(attempts) => attempts
                .iter()
                .map(|attempt| attempt.error.cause())
                .find(|cause| *cause != FailureCause::Other)
                .unwrap_or(FailureCause::Other),
            _ => FailureCause::Other,
        }
    }
}

impl FetchError {
    /// Classify a reqwest error. `timeout` is the bound that was in force.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

/// One failed attempt of a fallback chain.
#[derive(Debug)]
pub struct StrategyFailure {
    pub strategy: &'static str,
    pub error: FetchError,
}

impl std::fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.strategy, self.error)
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("SVG render failed: {0}")]
    Svg(String),

    #[error("Unsupported format: {0}")]
    Unsupported(String),

    #[error("Invalid ICO: {0}")]
    Ico(String),

    #[error("Buffer too short for byte sampling ({0} bytes)")]
    TooShort(usize),
}

pub const MSG_FORBIDDEN: &str =
    "Website access forbidden. The site may be blocking automated requests.";
pub const MSG_NOT_FOUND: &str = "Website not found. Please check the URL and try again.";
pub const MSG_UNREACHABLE: &str =
    "Could not connect to the website. Please check the URL and try again.";
pub const MSG_GENERIC: &str = "Failed to extract colors";
pub const MSG_MISSING_URL: &str = "URL is required";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("URL is required")]
    MissingUrl,

    #[error("failed to extract colors: {0}")]
    Fetch(#[source] FetchError),
}

impl ExtractError {
    pub fn status_code(&self) -> u16 {
        match self {
            ExtractError::MissingUrl => 400,
            ExtractError::Fetch(err) => match err.cause() {
                FailureCause::Forbidden => 403,
                FailureCause::NotFound => 404,
                FailureCause::Unreachable => 400,
                FailureCause::Other => 500,
            },
        }
    }

    /// Message shown to API clients. Internal detail stays in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            ExtractError::MissingUrl => MSG_MISSING_URL,
            _ => match self.status_code() {
                403 => MSG_FORBIDDEN,
                404 => MSG_NOT_FOUND,
                400 => MSG_UNREACHABLE,
                _ => MSG_GENERIC,
            },
        }
    }
}

impl From<FetchError> for ExtractError {
    fn from(err: FetchError) -> Self {
        ExtractError::Fetch(err)
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn exhausted(errors: Vec<FetchError>) -> FetchError {
        FetchError::Exhausted(
            errors
                .into_iter()
                .map(|error| StrategyFailure {
                    strategy: "test",
                    error,
                })
                .collect(),
        )
    }

    #[test]
    fn test_status_classification() {
        let cases = [
            (FetchError::Status(403), 403, MSG_FORBIDDEN),
            (FetchError::Status(404), 404, MSG_NOT_FOUND),
            (FetchError::Status(502), 500, MSG_GENERIC),
            (FetchError::Connect("refused".into()), 400, MSG_UNREACHABLE),
            (FetchError::InvalidUrl("nope".into()), 400, MSG_UNREACHABLE),
            (FetchError::Timeout(Duration::from_secs(20)), 400, MSG_UNREACHABLE),
            (FetchError::Request("reset".into()), 500, MSG_GENERIC),
        ];
        for (err, status, message) in cases {
            let err = ExtractError::from(err);
            assert_eq!(err.status_code(), status, "{err}");
            assert_eq!(err.user_message(), message);
        }
    }

    #[test]
    fn test_missing_url() {
        assert_eq!(ExtractError::MissingUrl.status_code(), 400);
        assert_eq!(ExtractError::MissingUrl.user_message(), "URL is required");
    }

    #[test]
    fn test_exhausted_uses_first_meaningful_cause() {
        let err = exhausted(vec![
            FetchError::Status(403),
            FetchError::Browser(BrowserError::Navigation("net::ERR_ABORTED".into())),
        ]);
        assert_eq!(err.cause(), FailureCause::Forbidden);

        let err = exhausted(vec![
            FetchError::Browser(BrowserError::Navigation("net::ERR_ABORTED".into())),
            FetchError::Connect("refused".into()),
        ]);
        assert_eq!(err.cause(), FailureCause::Unreachable);

        let err = exhausted(vec![FetchError::EmptyBody]);
        assert_eq!(ExtractError::from(err).status_code(), 500);
    }

    #[test]
    fn test_exhausted_display_counts_attempts() {
        let err = exhausted(vec![FetchError::Status(500), FetchError::EmptyBody]);
        assert_eq!(err.to_string(), "All 2 strategies failed");
    }
}
