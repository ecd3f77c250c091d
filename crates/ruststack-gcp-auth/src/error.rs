//! Error types for GOOG1 request signing.
//!
//! Every signing failure is represented by [`AuthError`]. All of them are
//! deterministic given identical inputs; none of them is retried internally.

/// Errors that can occur while signing an outbound request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The access key ID or the secret key is absent or empty.
    #[error("Missing credentials: access key ID and secret key are both required")]
    MissingCredentials,

    /// The secret key cannot be used as an HMAC key.
    #[error("Invalid signing key")]
    InvalidKey,

    /// A response-header override query parameter has an undecodable value.
    #[error("Malformed query parameter {name}: {value}")]
    MalformedQueryParameter {
        /// The parameter name.
        name: String,
        /// The raw (still percent-encoded) value.
        value: String,
    },

    /// A header that takes part in signing is not valid UTF-8 text.
    #[error("Invalid value for header: {0}")]
    InvalidHeaderValue(String),

    /// A pre-signed URL was requested for a snapshot without an endpoint host.
    #[error("Missing endpoint host for pre-signed URL")]
    MissingEndpoint,
}
