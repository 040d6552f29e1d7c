//! Error types for sftools-query.

/// Result type alias for sftools-query operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sftools-query operations.
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

    /// Shorthand for a [`ErrorKind::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation(message.into()))
    }

    /// Returns true if the remote rejected the access token.
    pub fn is_session_expired(&self) -> bool {
        matches!(self.kind, ErrorKind::SessionExpired(_))
    }

    /// Returns true if the remote rejected the request itself (HTTP 400).
    pub fn is_malformed_request(&self) -> bool {
        matches!(self.kind, ErrorKind::MalformedRequest { .. })
    }

    /// Returns true for missing local configuration (credentials, refresh
    /// token, client id).
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind, ErrorKind::Config(_))
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// The query could not be built.
    #[error("Invalid query: {0}")]
    Validation(String),

    /// The access token expired or was revoked.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// More records match than OFFSET paging can reach.
    #[error("Query matches too many results ({count})")]
    TooManyResults { count: u64 },

    /// The remote rejected the request as malformed.
    #[error("Malformed request: {error_code}: {message}")]
    MalformedRequest { error_code: String, message: String },

    /// Missing or invalid local configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token refresh failed for a reason other than configuration.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The org does not expose a queryable object with this name.
    #[error("Salesforce has no object type '{0}'")]
    UnknownType(String),

    /// Any other transport or HTTP failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl From<sftools_client::Error> for Error {
    fn from(err: sftools_client::Error) -> Self {
        use sftools_client::ErrorKind as ClientKind;

        let kind = match &err.kind {
            _ if err.is_auth_error() => ErrorKind::SessionExpired(err.to_string()),
            ClientKind::SalesforceApi {
                status: 400,
                error_code,
                message,
                ..
            } => ErrorKind::MalformedRequest {
                error_code: error_code.clone(),
                message: message.clone(),
            },
            _ => ErrorKind::Transport(err.to_string()),
        };
        Error::with_source(kind, err)
    }
}

impl From<sftools_auth::Error> for Error {
    fn from(err: sftools_auth::Error) -> Self {
        let kind = if err.is_configuration() {
            ErrorKind::Config(err.to_string())
        } else {
            ErrorKind::Auth(err.to_string())
        };
        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Transport(err.to_string()), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sftools_client::ErrorKind as ClientKind;

    fn api_error(status: u16, code: &str) -> sftools_client::Error {
        sftools_client::Error::new(ClientKind::SalesforceApi {
            status,
            error_code: code.to_string(),
            message: "boom".to_string(),
            fields: vec![],
        })
    }

    #[test]
    fn test_expired_session_classification() {
        let err: Error = api_error(401, "INVALID_SESSION_ID").into();
        assert!(err.is_session_expired());

        let err: Error =
            sftools_client::Error::new(ClientKind::Authentication("expired".into())).into();
        assert!(err.is_session_expired());
    }

    #[test]
    fn test_malformed_request_classification() {
        let err: Error = api_error(400, "MALFORMED_ID").into();
        assert!(err.is_malformed_request());
        assert!(err.to_string().contains("MALFORMED_ID"));
    }

    #[test]
    fn test_other_errors_are_transport() {
        let err: Error = api_error(500, "UNKNOWN_EXCEPTION").into();
        assert!(matches!(err.kind, ErrorKind::Transport(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_auth_configuration_maps_to_config() {
        let auth = sftools_auth::Error::new(sftools_auth::ErrorKind::Config(
            "Missing required config: client_id".into(),
        ));
        let err: Error = auth.into();
        assert!(err.is_configuration());

        let auth = sftools_auth::Error::new(sftools_auth::ErrorKind::OAuth {
            error: "invalid_grant".into(),
            description: "expired".into(),
        });
        let err: Error = auth.into();
        assert!(matches!(err.kind, ErrorKind::Auth(_)));
    }

    #[test]
    fn test_too_many_results_message_has_count() {
        let err = Error::new(ErrorKind::TooManyResults { count: 4500 });
        assert_eq!(err.to_string(), "Query matches too many results (4500)");
    }
}
