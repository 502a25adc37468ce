use thiserror::Error;

/// ocimeta error types
#[derive(Error, Debug)]
pub enum MetaError {
    /// Malformed image reference string
    #[error("invalid image reference '{0}'")]
    InvalidReference(String),

    /// Non-200 response from a registry, with server-supplied detail
    #[error("registry returned status {status}: {messages}")]
    RegistryError { status: u16, messages: String },

    /// Malformed JSON where a well-formed document was expected
    #[error("decoding response: {0}")]
    DecodeError(String),

    /// Manifest endpoint answered with a content type we cannot dispatch on
    #[error("unexpected content type '{0}'")]
    UnsupportedContentType(String),

    /// Manifest index with no entries
    #[error("no manifests found")]
    NoManifestsFound,

    /// Nested manifest indexes past the follow limit
    #[error("manifest index nesting exceeded {0} levels")]
    IndexTooDeep(usize),

    /// Could not obtain a bearer token for the registry
    #[error("authenticating in docker registry: {0}")]
    AuthenticationFailed(String),

    /// Token service could not be reached
    #[error("auth service unavailable: {0}")]
    AuthServiceUnavailable(String),

    /// Token service answered with a non-200 status
    #[error("unexpected status code {0} from auth service")]
    UnexpectedStatus(u16),

    /// Token service answered 200 with an undecodable body
    #[error("malformed token response: {0}")]
    MalformedResponse(String),

    /// Credential file could not be read or parsed
    #[error("credential error: {0}")]
    CredentialError(String),

    /// Transport-level HTTP failure
    #[error("request failed: {0}")]
    RequestError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for MetaError {
    fn from(err: serde_json::Error) -> Self {
        MetaError::DecodeError(err.to_string())
    }
}

/// Result type alias for ocimeta operations
pub type Result<T> = std::result::Result<T, MetaError>;
