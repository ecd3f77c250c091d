//! Pre-signed URL generation.
//!
//! A pre-signed URL carries its credentials in query parameters instead of
//! headers, so it can be handed out and used without further signing:
//!
//! - `GoogleAccessId` - the access key ID
//! - `Expires` - expiry as Unix epoch seconds
//! - `Signature` - the percent-encoded base64 signature
//!
//! The signature is computed with the expiry in the date slot of the string to
//! sign and no date header.

use std::fmt;

use chrono::{DateTime, Utc};
use http::{HeaderName, HeaderValue};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::credentials::Credentials;
use crate::error::AuthError;
use crate::request::RequestSnapshot;
use crate::signer::compute_request_signature;
use crate::string_to_sign::PRESIGNED_EXPIRES_HEADER;

/// Query parameter carrying the access key ID.
pub const ACCESS_KEY_QUERY_PARAM: &str = "GoogleAccessId";

/// Query parameter carrying the expiry.
pub const EXPIRES_QUERY_PARAM: &str = "Expires";

/// Query parameter carrying the signature.
pub const SIGNATURE_QUERY_PARAM: &str = "Signature";

/// Everything except RFC 3986 unreserved characters is percent-encoded.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// A signed URL granting access to one request until it expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
    endpoint: String,
    path: String,
    access_key_id: String,
    expires: i64,
    signature: String,
}

impl PresignedUrl {
    /// The raw base64 signature.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Expiry as Unix epoch seconds.
    #[must_use]
    pub fn expires(&self) -> i64 {
        self.expires
    }

    /// The authentication query parameters, percent-encoded.
    #[must_use]
    pub fn query_string(&self) -> String {
        format!(
            "{ACCESS_KEY_QUERY_PARAM}={}&{EXPIRES_QUERY_PARAM}={}&{SIGNATURE_QUERY_PARAM}={}",
            utf8_percent_encode(&self.access_key_id, QUERY_ENCODE_SET),
            self.expires,
            utf8_percent_encode(&self.signature, QUERY_ENCODE_SET),
        )
    }
}

impl fmt::Display for PresignedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = match self.path.find('?') {
            None => "?",
            Some(pos) if pos + 1 == self.path.len() || self.path.ends_with('&') => "",
            Some(_) => "&",
        };
        write!(
            f,
            "https://{}{}{separator}{}",
            self.endpoint,
            self.path,
            self.query_string()
        )
    }
}

/// Pre-sign a request so that it stays valid until `expires`.
///
/// # Errors
///
/// Returns [`AuthError::MissingEndpoint`] if the snapshot has no endpoint host,
/// [`AuthError::MissingCredentials`] for an incomplete credential pair, and
/// propagates canonicalization and signature failures.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use http::Method;
/// use ruststack_gcp_auth::credentials::Credentials;
/// use ruststack_gcp_auth::presigned::presign;
/// use ruststack_gcp_auth::request::RequestSnapshot;
///
/// let snapshot = RequestSnapshot::new(Method::GET, "/mybucket/photo.jpg")
///     .with_endpoint("storage.googleapis.com");
/// let expires = Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap();
///
/// let url = presign(&snapshot, &Credentials::new("GOOGKEY", "secret"), expires).unwrap();
/// assert_eq!(
///     url.to_string(),
///     "https://storage.googleapis.com/mybucket/photo.jpg\
///      ?GoogleAccessId=GOOGKEY&Expires=1772280000&Signature=A4Lf9V9M2gYBiyCQzRJomZTH%2FGM%3D"
/// );
/// ```
pub fn presign(
    snapshot: &RequestSnapshot,
    credentials: &Credentials,
    expires: DateTime<Utc>,
) -> Result<PresignedUrl, AuthError> {
    credentials.validate()?;
    let endpoint = snapshot.endpoint().ok_or(AuthError::MissingEndpoint)?;

    let expires = expires.timestamp();
    let with_expiry = snapshot.clone().with_header(
        HeaderName::from_static(PRESIGNED_EXPIRES_HEADER),
        HeaderValue::from(expires),
    );
    let signature = compute_request_signature(&with_expiry, credentials)?;

    Ok(PresignedUrl {
        endpoint: endpoint.to_owned(),
        path: snapshot.path().to_owned(),
        access_key_id: credentials.access_key_id.clone(),
        expires,
        signature,
    })
}
