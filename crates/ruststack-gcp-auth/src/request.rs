//! Immutable view of an outbound request at signing time.

use http::{HeaderMap, HeaderName, HeaderValue, Method};

use crate::canonical::{canonicalize_headers, canonicalize_resource};
use crate::error::AuthError;
use crate::string_to_sign::build_string_to_sign;

/// Snapshot of the parts of an outbound request that signing depends on.
///
/// Building a snapshot copies what it needs out of the request, so the
/// signer can never mutate the caller's request by accident.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    method: Method,
    path: String,
    headers: HeaderMap,
    virtual_hosted_bucket: Option<String>,
    endpoint: Option<String>,
}

impl RequestSnapshot {
    /// Create a snapshot with no headers.
    ///
    /// `path` is the request target: the URL path, optionally followed by
    /// `?` and the raw query string.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            virtual_hosted_bucket: None,
            endpoint: None,
        }
    }

    /// Snapshot the head of an `http` request.
    ///
    /// The endpoint host is taken from the `Host` header, falling back to the
    /// URI authority.
    #[must_use]
    pub fn from_parts(parts: &http::request::Parts) -> Self {
        Self::from_head(&parts.method, &parts.uri, &parts.headers)
    }

    /// Snapshot an `http` request without consuming it.
    #[must_use]
    pub fn from_request<B>(request: &http::Request<B>) -> Self {
        Self::from_head(request.method(), request.uri(), request.headers())
    }

    fn from_head(method: &Method, uri: &http::Uri, headers: &HeaderMap) -> Self {
        let path = uri
            .path_and_query()
            .map_or_else(|| "/".to_owned(), |pq| pq.as_str().to_owned());

        let endpoint = headers
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned)
            .or_else(|| uri.authority().map(|a| a.as_str().to_owned()));

        Self {
            method: method.clone(),
            path,
            headers: headers.clone(),
            virtual_hosted_bucket: None,
            endpoint,
        }
    }

    /// Set a header, replacing any existing values for that name.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace the whole header map.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the virtual-hosted bucket name explicitly.
    #[must_use]
    pub fn with_virtual_hosted_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.virtual_hosted_bucket = Some(bucket.into());
        self
    }

    /// Set the endpoint host.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Derive the virtual-hosted bucket from the endpoint host.
    ///
    /// For a `domain` of `storage.googleapis.com` and an endpoint of
    /// `mybucket.storage.googleapis.com:443` the bucket is `mybucket`. An
    /// explicitly set bucket is left untouched.
    #[must_use]
    pub fn resolve_virtual_host(mut self, domain: &str) -> Self {
        if self.virtual_hosted_bucket.is_none() {
            self.virtual_hosted_bucket = self
                .endpoint
                .as_deref()
                .and_then(|host| extract_virtual_host_bucket(host, domain));
        }
        self
    }

    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request target (path plus optional query string).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The virtual-hosted bucket, if any.
    #[must_use]
    pub fn virtual_hosted_bucket(&self) -> Option<&str> {
        self.virtual_hosted_bucket.as_deref()
    }

    /// The endpoint host, if known.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Canonical headers for this request.
    ///
    /// # Errors
    ///
    /// See [`canonicalize_headers`].
    pub fn canonical_headers(&self) -> Result<String, AuthError> {
        canonicalize_headers(&self.headers)
    }

    /// Canonical resource for this request.
    ///
    /// # Errors
    ///
    /// See [`canonicalize_resource`].
    pub fn canonical_resource(&self) -> Result<String, AuthError> {
        canonicalize_resource(&self.path, self.virtual_hosted_bucket())
    }

    /// The full string to sign for this request, exactly as it stands.
    ///
    /// # Errors
    ///
    /// Propagates canonicalization failures.
    pub fn string_to_sign(&self) -> Result<String, AuthError> {
        let canonical_headers = self.canonical_headers()?;
        let canonical_resource = self.canonical_resource()?;
        build_string_to_sign(
            &self.method,
            &self.headers,
            &canonical_headers,
            &canonical_resource,
        )
    }
}

/// Extract the bucket from a `<bucket>.<domain>[:port]` host.
///
/// Ports are ignored on both sides and host names compare case-insensitively.
/// The bucket is returned lowercased.
fn extract_virtual_host_bucket(host: &str, domain: &str) -> Option<String> {
    let host = strip_port(host);
    let domain = strip_port(domain);

    let split = host.len().checked_sub(domain.len())?;
    let (head, tail) = (host.get(..split)?, host.get(split..)?);
    if domain.is_empty() || !tail.eq_ignore_ascii_case(domain) {
        return None;
    }

    let bucket = head.strip_suffix('.')?;
    if bucket.is_empty() {
        return None;
    }
    Some(bucket.to_ascii_lowercase())
}

/// Drop a trailing `:port` from a host.
fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}
