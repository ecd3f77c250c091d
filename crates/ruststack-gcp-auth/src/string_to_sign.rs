//! String-to-sign assembly.
//!
//! ```text
//! StringToSign = HTTP-Verb + "\n" +
//!                Content-MD5 + "\n" +
//!                Content-Type + "\n" +
//!                presigned-expires + "\n" +
//!                [CanonicalHeaders + "\n"] +
//!                CanonicalResource
//! ```
//!
//! The canonical headers line is dropped entirely when there are no signable
//! headers; the three optional leading fields are kept as empty lines.

use http::HeaderMap;

use crate::canonical::header_text;
use crate::error::AuthError;

/// Header carrying the expiry of a pre-signed request.
///
/// When present its value fills the date slot of the string to sign.
pub const PRESIGNED_EXPIRES_HEADER: &str = "presigned-expires";

/// Assemble the string to sign.
///
/// `Content-MD5`, `Content-Type` and `presigned-expires` are read from
/// `headers` as-is and default to empty. Nothing is hashed or validated here.
///
/// # Errors
///
/// Returns [`AuthError::InvalidHeaderValue`] if one of those three headers is
/// not valid UTF-8.
///
/// # Examples
///
/// ```
/// use http::{HeaderMap, Method};
/// use ruststack_gcp_auth::string_to_sign::build_string_to_sign;
///
/// let sts = build_string_to_sign(&Method::GET, &HeaderMap::new(), "", "/bucket/key").unwrap();
/// assert_eq!(sts, "GET\n\n\n\n/bucket/key");
/// ```
pub fn build_string_to_sign(
    method: &http::Method,
    headers: &HeaderMap,
    canonical_headers: &str,
    canonical_resource: &str,
) -> Result<String, AuthError> {
    let content_md5 = header_value(headers, "content-md5")?;
    let content_type = header_value(headers, "content-type")?;
    let expires = header_value(headers, PRESIGNED_EXPIRES_HEADER)?;

    let mut fields = vec![method.as_str(), content_md5, content_type, expires];
    if !canonical_headers.is_empty() {
        fields.push(canonical_headers);
    }
    fields.push(canonical_resource);

    Ok(fields.join("\n"))
}

/// Extract a header value as a string, returning an empty string if missing.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AuthError> {
    headers
        .get(name)
        .map_or(Ok(""), |value| header_text(name, value))
}
