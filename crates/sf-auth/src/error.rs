//! Error types for sftools-auth.
//!
//! Error messages are designed to avoid exposing sensitive credential data.

/// Result type alias for sftools-auth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sftools-auth operations.
///
/// Error messages are sanitized to prevent accidental credential exposure.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if this error comes from missing or invalid local
    /// configuration rather than from the remote side.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Config(_) | ErrorKind::InvalidCredentials(_) | ErrorKind::EnvVar(_)
        )
    }

    /// Returns true while a device authorization is still waiting on the user.
    pub fn is_device_pending(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::DevicePending | ErrorKind::DeviceSlowDown
        )
    }
}

/// The kind of error that occurred.
///
/// Error messages avoid including credential values.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// OAuth error response from Salesforce.
    #[error("OAuth error: {error} - {description}")]
    OAuth { error: String, description: String },

    /// Device authorization not yet approved.
    #[error("Authorization pending")]
    DevicePending,

    /// Device authorization polled too quickly.
    #[error("Authorization pending, polling too fast")]
    DeviceSlowDown,

    /// Token invalid.
    #[error("Token invalid: {0}")]
    TokenInvalid(String),

    /// Invalid credentials configuration.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// HTTP error during authentication.
    #[error("HTTP error: {0}")]
    Http(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Environment variable not set.
    #[error("Environment variable not set: {0}")]
    EnvVar(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A read-only profile was asked to save; carries the rendered content.
    #[error("Refusing to save read-only profile, please update it manually:\n{0}")]
    ReadOnly(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // URLs can carry tokens in query strings
        let message = err.to_string();
        let sanitized = if message.contains("access_token") || message.contains("token=") {
            "HTTP request failed (details redacted for security)".to_string()
        } else {
            message
        };
        Error::with_source(ErrorKind::Http(sanitized), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Error::with_source(ErrorKind::Serialization(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidInput(err.to_string()), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Error::with_source(ErrorKind::EnvVar(err.to_string()), err)
    }
}

impl From<sftools_client::Error> for Error {
    fn from(err: sftools_client::Error) -> Self {
        let message = err.to_string();
        let sanitized = if message.contains("Bearer") || message.contains("token") {
            "Client error (details redacted for security)".to_string()
        } else {
            message
        };
        Error::with_source(ErrorKind::Http(sanitized), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        let err = ErrorKind::OAuth {
            error: "invalid_grant".to_string(),
            description: "expired access/refresh token".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "OAuth error: invalid_grant - expired access/refresh token"
        );
        assert_eq!(ErrorKind::DevicePending.to_string(), "Authorization pending");
    }

    #[test]
    fn test_configuration_classification() {
        assert!(Error::new(ErrorKind::Config("Missing required config: client_id".into()))
            .is_configuration());
        assert!(Error::new(ErrorKind::InvalidCredentials("no token".into())).is_configuration());
        assert!(Error::new(ErrorKind::EnvVar("SF_CLIENT_ID".into())).is_configuration());

        assert!(!Error::new(ErrorKind::OAuth {
            error: "invalid_grant".into(),
            description: "expired".into(),
        })
        .is_configuration());
        assert!(!Error::new(ErrorKind::Http("connection refused".into())).is_configuration());
    }

    #[test]
    fn test_device_pending_classification() {
        assert!(Error::new(ErrorKind::DevicePending).is_device_pending());
        assert!(Error::new(ErrorKind::DeviceSlowDown).is_device_pending());
        assert!(!Error::new(ErrorKind::Other("x".into())).is_device_pending());
    }

    #[test]
    fn test_read_only_message_includes_content() {
        let err = Error::new(ErrorKind::ReadOnly("{\"instance\": \"x\"}".into()));
        assert!(err.to_string().contains("update it manually"));
        assert!(err.to_string().contains("\"instance\""));
    }
}
