//! Header and resource canonicalization for GOOG1 signing.
//!
//! Two pieces of the string to sign are derived from the request here:
//!
//! ```text
//! CanonicalHeaders  = lower(name) + ":" + value   (one line per x-goog-*/x-amz-* header,
//!                                                  sorted by name, joined with "\n")
//! CanonicalResource = ["/" + VirtualHostedBucket] + Path
//!                     ["?" + sorted whitelisted sub-resources and response overrides]
//! ```
//!
//! Header values are taken verbatim, including UTF-8 text outside ASCII.
//! Sub-resource values are kept exactly as they appear on the wire, while
//! response-header override values are percent-decoded.

use std::borrow::Cow;
use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;

use crate::error::AuthError;

/// Header name prefixes whose headers take part in signing.
///
/// `x-amz-` is accepted alongside the backend's own prefix for compatibility
/// with clients that speak the generic object-storage dialect.
pub const SIGNED_HEADER_PREFIXES: &[&str] = &["x-goog-", "x-amz-"];

/// Sub-resource query parameters included in the canonical resource with
/// their raw value.
pub const SUB_RESOURCES: &[&str] = &[
    "acl",
    "compose",
    "cors",
    "encryption",
    "lifecycle",
    "logging",
    "versioning",
    "websiteConfig",
];

/// Response-header override query parameters included in the canonical
/// resource with their percent-decoded value.
pub const RESPONSE_HEADER_OVERRIDES: &[&str] = &[
    "response-cache-control",
    "response-content-disposition",
    "response-content-encoding",
    "response-content-language",
    "response-content-type",
    "response-expires",
];

/// Whether a header with this name takes part in signing.
///
/// The comparison is case-insensitive.
///
/// # Examples
///
/// ```
/// use ruststack_gcp_auth::canonical::is_signable_header;
///
/// assert!(is_signable_header("X-Goog-Meta-Owner"));
/// assert!(is_signable_header("x-amz-acl"));
/// assert!(!is_signable_header("content-length"));
/// ```
#[must_use]
pub fn is_signable_header(name: &str) -> bool {
    SIGNED_HEADER_PREFIXES.iter().any(|prefix| {
        name.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// Build the canonical headers block.
///
/// Every `x-goog-*` and `x-amz-*` header is emitted as `name:value` with a
/// lowercase name, sorted by name and joined with `\n`. Repeated headers are
/// folded into a single line with their values joined by `,` in the order they
/// were added. Returns an empty string when no header qualifies.
///
/// Values are signed as their exact bytes, so UTF-8 metadata such as
/// `x-goog-meta-name: café` is accepted.
///
/// # Errors
///
/// Returns [`AuthError::InvalidHeaderValue`] if a qualifying header value is
/// not valid UTF-8 (e.g. Latin-1 obs-text bytes).
///
/// # Examples
///
/// ```
/// use http::HeaderMap;
/// use ruststack_gcp_auth::canonical::canonicalize_headers;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-goog-b", "2".parse().unwrap());
/// headers.insert("x-goog-a", "1".parse().unwrap());
/// headers.insert("content-length", "5".parse().unwrap());
///
/// assert_eq!(canonicalize_headers(&headers).unwrap(), "x-goog-a:1\nx-goog-b:2");
/// ```
pub fn canonicalize_headers(headers: &http::HeaderMap) -> Result<String, AuthError> {
    let mut signable: BTreeMap<String, Vec<&str>> = BTreeMap::new();

    for (name, value) in headers {
        let name = name.as_str();
        if !is_signable_header(name) {
            continue;
        }
        let value = header_text(name, value)?;
        signable
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value);
    }

    Ok(signable
        .iter()
        .map(|(name, values)| format!("{name}:{}", values.join(",")))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// View a header value as text without altering its bytes.
///
/// Unlike [`http::HeaderValue::to_str`] this accepts any UTF-8, not only
/// visible ASCII.
pub(crate) fn header_text<'a>(
    name: &str,
    value: &'a http::HeaderValue,
) -> Result<&'a str, AuthError> {
    std::str::from_utf8(value.as_bytes())
        .map_err(|_| AuthError::InvalidHeaderValue(name.to_owned()))
}

/// Build the canonical resource from a request path.
///
/// `path` may carry a query string. Only the text between the first and the
/// second `?` is read as the query; anything after a second `?` is ignored.
/// When the
/// request uses virtual-hosted addressing the bucket is re-inserted in front
/// of the path. Only whitelisted query parameters survive, sorted by name;
/// if none survive no `?` is emitted.
///
/// # Errors
///
/// Returns [`AuthError::MalformedQueryParameter`] if a response-header
/// override value is not valid percent-encoded UTF-8.
///
/// # Examples
///
/// ```
/// use ruststack_gcp_auth::canonical::canonicalize_resource;
///
/// assert_eq!(
///     canonicalize_resource("/mybucket/key?acl&uploads=1", None).unwrap(),
///     "/mybucket/key?acl"
/// );
/// assert_eq!(
///     canonicalize_resource("/key", Some("mybucket")).unwrap(),
///     "/mybucket/key"
/// );
/// ```
pub fn canonicalize_resource(
    path: &str,
    virtual_hosted_bucket: Option<&str>,
) -> Result<String, AuthError> {
    let mut segments = path.split('?');
    let base_path = segments.next().unwrap_or_default();
    let query = segments.next();

    let mut resource = String::with_capacity(path.len() + 64);

    if let Some(bucket) = virtual_hosted_bucket.filter(|b| !b.is_empty()) {
        resource.push('/');
        resource.push_str(bucket);
    }
    resource.push_str(base_path);

    if let Some(query) = query {
        let params = signable_query_params(query)?;
        if !params.is_empty() {
            let rendered: Vec<String> = params
                .iter()
                .map(|(name, value)| match value {
                    Some(value) => format!("{name}={value}"),
                    None => (*name).to_owned(),
                })
                .collect();
            resource.push('?');
            resource.push_str(&rendered.join("&"));
        }
    }

    Ok(resource)
}

/// Decode a percent-encoded query parameter value.
///
/// `+` is not treated as a space. Every `%` must introduce two hex digits and
/// the decoded bytes must be valid UTF-8.
///
/// # Errors
///
/// Returns [`AuthError::MalformedQueryParameter`] if either rule is broken.
pub fn decode_query_value(name: &str, value: &str) -> Result<String, AuthError> {
    let malformed = || AuthError::MalformedQueryParameter {
        name: name.to_owned(),
        value: value.to_owned(),
    };

    let well_formed = value.split('%').skip(1).all(|escape| {
        escape
            .as_bytes()
            .get(..2)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    if !well_formed {
        return Err(malformed());
    }

    percent_decode_str(value)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| malformed())
}

/// Filter a query string down to the parameters that are signed, sorted by name.
///
/// A parameter without `=` has no value; `name=` has an empty value. The value
/// ends at the next `=`, so `compose=a=b` keeps only `a`.
fn signable_query_params(query: &str) -> Result<Vec<(&str, Option<Cow<'_, str>>)>, AuthError> {
    let mut params = Vec::new();

    for param in query.split('&') {
        let mut pieces = param.split('=');
        let name = pieces.next().unwrap_or_default();
        let raw_value = pieces.next();

        let value = if SUB_RESOURCES.contains(&name) {
            raw_value.map(Cow::Borrowed)
        } else if RESPONSE_HEADER_OVERRIDES.contains(&name) {
            raw_value
                .map(|v| decode_query_value(name, v).map(Cow::Owned))
                .transpose()?
        } else {
            continue;
        };

        params.push((name, value));
    }

    params.sort_by(|a, b| a.0.cmp(b.0));
    Ok(params)
}
