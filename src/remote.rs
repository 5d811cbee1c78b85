#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("no credentials configured; log in first")]
    MissingCredentials,
    #[error("remote rejected credentials: {0}")]
    Unauthorized(String),
    #[error("{resource} `{identifier}` not found")]
    NotFound {
        resource: String,
        identifier: String,
    },
    #[error("request `{operation}` failed: {message}")]
    Request { operation: String, message: String },
}

impl RemoteError {
    pub fn request(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            identifier: identifier.into(),
        }
    }
}
