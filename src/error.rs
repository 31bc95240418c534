//! Error types for the connection shell

use thiserror::Error;

/// Failures of a connection attempt, as shown on the error screen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("No server address entered")]
    Validation,
    #[error("Connection timed out")]
    Timeout,
    #[error("Failed to open view: {0}")]
    Open(String),
    #[error("Failed to load: {0}")]
    Load(String),
}

impl ConnectError {
    /// Headline for the error screen
    pub fn title(&self) -> &'static str {
        match self {
            ConnectError::Validation => "Please enter your Home Assistant address",
            ConnectError::Timeout => "Connection timed out",
            ConnectError::Open(_) => "Launch failed",
            ConnectError::Load(_) => "Load failed",
        }
    }

    /// Body text for the error screen
    pub fn message(&self) -> String {
        match self {
            ConnectError::Validation => "Please provide a valid URL".to_string(),
            ConnectError::Timeout => {
                "Could not reach the Home Assistant instance in time".to_string()
            }
            ConnectError::Open(reason) => format!("Unable to open the browser: {}", reason),
            ConnectError::Load(reason) if reason.is_empty() => "Unknown error".to_string(),
            ConnectError::Load(reason) => reason.clone(),
        }
    }

    /// Validation errors are shown once; everything else goes through the retry policy.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ConnectError::Validation)
    }
}

/// Reachability probe failures. Logged, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("HTTP {code}: {reason}")]
    Status { code: u16, reason: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request timed out")]
    Timeout,
}

/// The embedded view could not be created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct OpenError(pub String);

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid store contents: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure while wiring the default components
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_validation_is_not_retryable() {
        assert!(!ConnectError::Validation.is_retryable());
        assert!(ConnectError::Timeout.is_retryable());
        assert!(ConnectError::Open("boom".into()).is_retryable());
        assert!(ConnectError::Load("net::ERR".into()).is_retryable());
    }

    #[test]
    fn test_load_error_without_reason() {
        assert_eq!(ConnectError::Load(String::new()).message(), "Unknown error");
    }

    #[test]
    fn test_http_client_build_failure_is_setup_error() {
        let err = reqwest::Client::builder()
            .user_agent("bad\nagent")
            .build()
            .unwrap_err();
        let setup: SetupError = err.into();
        assert!(matches!(setup, SetupError::HttpClient(_)));
        assert!(setup.to_string().starts_with("HTTP client error: "));
    }

    #[test]
    fn test_probe_error_display() {
        let err = ProbeError::Status {
            code: 401,
            reason: "Unauthorized".into(),
        };
        assert_eq!(err.to_string(), "HTTP 401: Unauthorized");
    }
}
