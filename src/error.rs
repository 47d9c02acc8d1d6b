//! Rich diagnostic error types for the reconciliation service.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. The top-level [`ReconcileError`] folds
//! them into the three failure classes the protocol distinguishes: bad client
//! input, an unreachable upstream, and an upstream that answered with the
//! wrong shape.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the reconciliation service.
#[derive(Debug, Error, Diagnostic)]
pub enum ReconcileError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Vocab(#[from] VocabError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Coarse failure class, used by outer layers to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something unusable. Never retryable.
    ClientRequest,
    /// The vocabulary API could not be reached or refused the call.
    UpstreamUnavailable,
    /// The vocabulary API answered, but not in the expected shape.
    UpstreamShape,
    /// Local misconfiguration.
    Config,
}

impl ReconcileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::Vocab(VocabError::Shape { .. }) => ErrorKind::UpstreamShape,
            ReconcileError::Vocab(_) => ErrorKind::UpstreamUnavailable,
            ReconcileError::Graph(GraphError::InvalidIri { .. }) => ErrorKind::ClientRequest,
            ReconcileError::Graph(_) => ErrorKind::UpstreamShape,
            ReconcileError::Protocol(_) => ErrorKind::ClientRequest,
            ReconcileError::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether repeating the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReconcileError::Vocab(VocabError::Timeout { .. }))
    }

    /// Whether the failure was an outbound call running out of time.
    pub fn is_timeout(&self) -> bool {
        self.is_retryable()
    }
}

/// Convenience result alias for top-level operations.
pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;

// ---------------------------------------------------------------------------
// Vocabulary API errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum VocabError {
    #[error("vocabulary API request to {url} failed: {message}")]
    #[diagnostic(
        code(skosrec::vocab::unreachable),
        help(
            "The vocabulary API could not be reached. Check `api_base_url` \
             in the service configuration and that the remote service is up."
        )
    )]
    Unreachable { url: String, message: String },

    #[error("vocabulary API request to {url} timed out after {timeout_secs}s")]
    #[diagnostic(
        code(skosrec::vocab::timeout),
        help("The vocabulary API did not answer in time. The request can be retried.")
    )]
    Timeout { url: String, timeout_secs: u64 },

    #[error("vocabulary API returned HTTP {status} for {url}")]
    #[diagnostic(
        code(skosrec::vocab::status),
        help(
            "The vocabulary API rejected the call. A 404 usually means an \
             unknown vocabulary id or concept URI."
        )
    )]
    Status { url: String, status: u16 },

    #[error("unexpected response from vocabulary API ({endpoint}): {message}")]
    #[diagnostic(
        code(skosrec::vocab::shape),
        help(
            "The vocabulary API answered with a payload this service cannot read. \
             Verify that `api_base_url` points at a compatible REST API version."
        )
    )]
    Shape { endpoint: String, message: String },
}

pub type VocabResult<T> = std::result::Result<T, VocabError>;

// ---------------------------------------------------------------------------
// Graph errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("failed to parse RDF/XML description of <{uri}>: {message}")]
    #[diagnostic(
        code(skosrec::graph::parse),
        help("The entity description returned by the vocabulary API is not valid RDF/XML.")
    )]
    Parse { uri: String, message: String },

    #[error("invalid entity IRI \"{iri}\": {message}")]
    #[diagnostic(
        code(skosrec::graph::invalid_iri),
        help("Entity identifiers must be absolute IRIs, e.g. http://www.yso.fi/onto/yso/p1234.")
    )]
    InvalidIri { iri: String, message: String },
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ProtocolError {
    #[error("malformed `{param}` payload: {message}")]
    #[diagnostic(
        code(skosrec::protocol::payload),
        help(
            "The `{param}` parameter must be a JSON document as described by \
             the Reconciliation Service API."
        )
    )]
    MalformedPayload { param: String, message: String },

    #[error("missing required parameter `{param}`")]
    #[diagnostic(
        code(skosrec::protocol::missing_param),
        help("Add the `{param}` parameter to the request.")
    )]
    MissingParameter { param: String },

    #[error("parameter `{param}` must be a non-negative integer, got \"{value}\"")]
    #[diagnostic(code(skosrec::protocol::invalid_number))]
    InvalidNumber { param: String, value: String },

    #[error("invalid JSONP callback name \"{callback}\"")]
    #[diagnostic(
        code(skosrec::protocol::callback),
        help("Callback names may contain only letters, digits, `_`, `$` and `.`.")
    )]
    InvalidCallback { callback: String },
}

pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read service config: {path}")]
    #[diagnostic(
        code(skosrec::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse service config: {path}: {message}")]
    #[diagnostic(
        code(skosrec::config::parse),
        help("Check the TOML syntax in the service config file.")
    )]
    Parse { path: String, message: String },

    #[error("invalid value for {key}: \"{value}\"")]
    #[diagnostic(code(skosrec::config::invalid_value))]
    InvalidValue { key: String, value: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
