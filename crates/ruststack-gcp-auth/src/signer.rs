//! Request authorization with the GOOG1 scheme.
//!
//! The `Authorization` header has the format:
//!
//! ```text
//! GOOG1 <AccessKeyId>:<Signature>
//! ```
//!
//! Live requests get an `x-goog-date` header stamped before signing. Because it
//! carries the vendor prefix, that header is part of the canonical headers and
//! is how the signing time enters the signature. Pre-signed requests (those
//! carrying a non-empty `presigned-expires`) are signed without a date header.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, trace};

use crate::config::GcpBackendConfig;
use crate::credentials::{CredentialProvider, Credentials};
use crate::error::AuthError;
use crate::presigned::{PresignedUrl, presign};
use crate::request::RequestSnapshot;
use crate::signature::compute_signature;
use crate::string_to_sign::PRESIGNED_EXPIRES_HEADER;

/// Scheme token at the start of the `Authorization` header.
pub const AUTH_SCHEME: &str = "GOOG1";

/// Name of the request date header stamped on live requests.
pub const DATE_HEADER: &str = "x-goog-date";

/// The two header values produced by signing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    /// Value for `x-goog-date`; `None` for pre-signed requests.
    pub date: Option<HeaderValue>,
    /// Value for `Authorization`.
    pub authorization: HeaderValue,
}

impl SignedHeaders {
    /// Write the headers into `headers`, replacing stale values from an
    /// earlier signing attempt.
    pub fn apply(&self, headers: &mut HeaderMap) {
        if let Some(date) = &self.date {
            headers.insert(HeaderName::from_static(DATE_HEADER), date.clone());
        }
        headers.insert(AUTHORIZATION, self.authorization.clone());
    }

    /// Iterate the headers as name/value pairs, date first.
    pub fn iter(&self) -> impl Iterator<Item = (HeaderName, &HeaderValue)> {
        self.date
            .iter()
            .map(|date| (HeaderName::from_static(DATE_HEADER), date))
            .chain(std::iter::once((AUTHORIZATION, &self.authorization)))
    }
}

/// Format a signing time as an RFC 822 date, e.g. `Sat, 28 Feb 2026 12:00:00 GMT`.
#[must_use]
pub fn format_request_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Sign a request snapshot.
///
/// Unless the snapshot carries a non-empty `presigned-expires`, an
/// `x-goog-date` header for `time` is stamped first and signed along with the
/// other vendor headers. The snapshot itself is left unchanged; the caller
/// applies the returned headers.
///
/// # Errors
///
/// Returns [`AuthError::MissingCredentials`] before anything is computed if
/// either half of the credential pair is empty, and propagates
/// canonicalization and signature failures.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use http::Method;
/// use ruststack_gcp_auth::credentials::Credentials;
/// use ruststack_gcp_auth::request::RequestSnapshot;
/// use ruststack_gcp_auth::signer::sign;
///
/// let snapshot = RequestSnapshot::new(Method::PUT, "/mybucket/photo.jpg");
/// let credentials = Credentials::new("GOOGKEY", "secret");
/// let time = Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap();
///
/// let signed = sign(&snapshot, &credentials, time).unwrap();
/// assert_eq!(signed.date.unwrap(), "Sat, 28 Feb 2026 12:00:00 GMT");
/// assert_eq!(signed.authorization, "GOOG1 GOOGKEY:62Qsu5CHJ0dxxvPyn4QMaYVd0z0=");
/// ```
pub fn sign(
    snapshot: &RequestSnapshot,
    credentials: &Credentials,
    time: DateTime<Utc>,
) -> Result<SignedHeaders, AuthError> {
    credentials.validate()?;

    let presigned = snapshot
        .headers()
        .get(PRESIGNED_EXPIRES_HEADER)
        .is_some_and(|expires| !expires.is_empty());

    let (date, signature) = if presigned {
        (None, compute_request_signature(snapshot, credentials)?)
    } else {
        let date = HeaderValue::from_str(&format_request_date(time))
            .map_err(|_| AuthError::InvalidHeaderValue(DATE_HEADER.to_owned()))?;
        let stamped = snapshot
            .clone()
            .with_header(HeaderName::from_static(DATE_HEADER), date.clone());
        (Some(date), compute_request_signature(&stamped, credentials)?)
    };

    let mut authorization = HeaderValue::try_from(format!(
        "{AUTH_SCHEME} {}:{signature}",
        credentials.access_key_id
    ))
    .map_err(|_| AuthError::InvalidHeaderValue(AUTHORIZATION.to_string()))?;
    authorization.set_sensitive(true);

    Ok(SignedHeaders {
        date,
        authorization,
    })
}

/// Compute the signature of a snapshot exactly as it stands.
pub(crate) fn compute_request_signature(
    snapshot: &RequestSnapshot,
    credentials: &Credentials,
) -> Result<String, AuthError> {
    let string_to_sign = snapshot.string_to_sign()?;

    debug!(
        access_key_id = %credentials.access_key_id,
        method = %snapshot.method(),
        path = %snapshot.path(),
        "Signing request with GOOG1"
    );
    trace!(string_to_sign = ?string_to_sign, "Built GOOG1 string to sign");

    compute_signature(credentials.secret_key.as_bytes(), &string_to_sign)
}

/// Sign an `http` request in place.
///
/// `time` defaults to the current time. Only the date and authorization
/// headers are touched; on error the request is left unmodified.
///
/// # Errors
///
/// See [`sign`].
pub fn authorize<B>(
    request: &mut http::Request<B>,
    credentials: &Credentials,
    time: Option<DateTime<Utc>>,
) -> Result<(), AuthError> {
    let snapshot = RequestSnapshot::from_request(request);
    let signed = sign(&snapshot, credentials, time.unwrap_or_else(Utc::now))?;
    signed.apply(request.headers_mut());
    Ok(())
}

/// A component that authorizes outbound requests before dispatch.
///
/// Signing must be the last mutation of the request head; dispatch happens
/// after it returns. A retried request has to be signed again.
pub trait RequestSigner: Send + Sync + fmt::Debug {
    /// Add authentication headers to `parts`.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] if the request cannot be signed; `parts` is
    /// then left unmodified.
    fn sign_request(&self, parts: &mut http::request::Parts) -> Result<(), AuthError>;
}

/// [`RequestSigner`] for the GOOG1 scheme.
///
/// Credentials are fetched from the provider for every request and never
/// retained.
#[derive(Debug, Clone)]
pub struct Goog1Signer {
    credential_provider: Arc<dyn CredentialProvider>,
    virtual_host_domain: Option<String>,
}

impl Goog1Signer {
    /// Create a signer that addresses buckets path-style only.
    pub fn new(credential_provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            credential_provider,
            virtual_host_domain: None,
        }
    }

    /// Create a signer from backend configuration.
    pub fn from_config(
        config: &GcpBackendConfig,
        credential_provider: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            credential_provider,
            virtual_host_domain: config.virtual_host_domain().map(ToOwned::to_owned),
        }
    }

    /// Recognize `<bucket>.<domain>` hosts as virtual-hosted buckets.
    #[must_use]
    pub fn with_virtual_host_domain(mut self, domain: impl Into<String>) -> Self {
        self.virtual_host_domain = Some(domain.into());
        self
    }

    /// Snapshot a request head, resolving its virtual-hosted bucket.
    #[must_use]
    pub fn snapshot(&self, parts: &http::request::Parts) -> RequestSnapshot {
        let snapshot = RequestSnapshot::from_parts(parts);
        match &self.virtual_host_domain {
            Some(domain) => snapshot.resolve_virtual_host(domain),
            None => snapshot,
        }
    }

    /// Sign `parts` as of `time`.
    ///
    /// # Errors
    ///
    /// See [`sign`].
    pub fn sign_at(
        &self,
        parts: &mut http::request::Parts,
        time: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let credentials = self.credential_provider.credentials()?;
        let signed = sign(&self.snapshot(parts), &credentials, time)?;
        signed.apply(&mut parts.headers);
        Ok(())
    }

    /// Produce a pre-signed URL for `parts` that expires at `expires`.
    ///
    /// # Errors
    ///
    /// See [`presign`].
    pub fn presign(
        &self,
        parts: &http::request::Parts,
        expires: DateTime<Utc>,
    ) -> Result<PresignedUrl, AuthError> {
        let credentials = self.credential_provider.credentials()?;
        presign(&self.snapshot(parts), &credentials, expires)
    }
}

impl RequestSigner for Goog1Signer {
    fn sign_request(&self, parts: &mut http::request::Parts) -> Result<(), AuthError> {
        self.sign_at(parts, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use http::Method;

    use super::*;
    use crate::credentials::StaticCredentialProvider;

    const TEST_ACCESS_KEY: &str = "GOOGKEY";
    const TEST_SECRET_KEY: &str = "secret";

    fn test_credentials() -> Credentials {
        Credentials::new(TEST_ACCESS_KEY, TEST_SECRET_KEY)
    }

    fn signing_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_should_format_rfc822_date() {
        assert_eq!(
            format_request_date(signing_time()),
            "Sat, 28 Feb 2026 12:00:00 GMT"
        );
        let padded = Utc.with_ymd_and_hms(2026, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(format_request_date(padded), "Thu, 05 Mar 2026 07:08:09 GMT");
    }

    #[test]
    fn test_should_stamp_date_and_sign_it() {
        let snapshot = RequestSnapshot::new(Method::PUT, "/mybucket/photo.jpg");

        let signed = sign(&snapshot, &test_credentials(), signing_time()).unwrap();

        assert_eq!(signed.date.as_ref().unwrap(), "Sat, 28 Feb 2026 12:00:00 GMT");
        assert_eq!(
            signed.authorization,
            "GOOG1 GOOGKEY:62Qsu5CHJ0dxxvPyn4QMaYVd0z0="
        );
        assert!(snapshot.headers().is_empty());
    }

    #[test]
    fn test_should_skip_date_for_presigned_request() {
        let snapshot = RequestSnapshot::new(Method::GET, "/mybucket/photo.jpg").with_header(
            HeaderName::from_static(PRESIGNED_EXPIRES_HEADER),
            HeaderValue::from_static("1772280000"),
        );

        let signed = sign(&snapshot, &test_credentials(), signing_time()).unwrap();

        assert_eq!(signed.date, None);
        assert_eq!(
            signed.authorization,
            "GOOG1 GOOGKEY:A4Lf9V9M2gYBiyCQzRJomZTH/GM="
        );
    }

    #[test]
    fn test_should_stamp_date_when_presigned_expires_is_empty() {
        let snapshot = RequestSnapshot::new(Method::PUT, "/mybucket/photo.jpg").with_header(
            HeaderName::from_static(PRESIGNED_EXPIRES_HEADER),
            HeaderValue::from_static(""),
        );

        let signed = sign(&snapshot, &test_credentials(), signing_time()).unwrap();

        assert_eq!(signed.date.as_ref().unwrap(), "Sat, 28 Feb 2026 12:00:00 GMT");
        // The empty expiry slot matches an absent header, so the signature does too.
        assert_eq!(
            signed.authorization,
            "GOOG1 GOOGKEY:62Qsu5CHJ0dxxvPyn4QMaYVd0z0="
        );
    }

    #[test]
    fn test_should_sign_deterministically() {
        let snapshot = RequestSnapshot::new(Method::GET, "/b/k?acl").with_header(
            HeaderName::from_static("x-goog-meta-owner"),
            HeaderValue::from_static("alice"),
        );

        let first = sign(&snapshot, &test_credentials(), signing_time()).unwrap();
        let second = sign(&snapshot, &test_credentials(), signing_time()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_should_change_signature_with_time() {
        let snapshot = RequestSnapshot::new(Method::GET, "/b/k");
        let later = signing_time() + chrono::TimeDelta::seconds(1);

        let first = sign(&snapshot, &test_credentials(), signing_time()).unwrap();
        let second = sign(&snapshot, &test_credentials(), later).unwrap();
        assert_ne!(first.authorization, second.authorization);
    }

    #[test]
    fn test_should_reject_missing_credentials() {
        let snapshot = RequestSnapshot::new(Method::GET, "/b/k");

        let no_key = Credentials::new("", TEST_SECRET_KEY);
        assert_eq!(
            sign(&snapshot, &no_key, signing_time()),
            Err(AuthError::MissingCredentials)
        );

        let no_secret = Credentials::new(TEST_ACCESS_KEY, "");
        assert_eq!(
            sign(&snapshot, &no_secret, signing_time()),
            Err(AuthError::MissingCredentials)
        );
    }

    #[test]
    fn test_should_mark_authorization_sensitive() {
        let snapshot = RequestSnapshot::new(Method::GET, "/b/k");
        let signed = sign(&snapshot, &test_credentials(), signing_time()).unwrap();
        assert!(signed.authorization.is_sensitive());
    }

    #[test]
    fn test_should_authorize_request_in_place() {
        let mut request = http::Request::builder()
            .method("PUT")
            .uri("https://storage.googleapis.com/mybucket/photo.jpg")
            .body(())
            .unwrap();

        authorize(&mut request, &test_credentials(), Some(signing_time())).unwrap();

        assert_eq!(
            request.headers()[DATE_HEADER],
            "Sat, 28 Feb 2026 12:00:00 GMT"
        );
        assert_eq!(
            request.headers()[AUTHORIZATION],
            "GOOG1 GOOGKEY:62Qsu5CHJ0dxxvPyn4QMaYVd0z0="
        );
    }

    #[test]
    fn test_should_replace_stale_headers_when_resigning() {
        let mut request = http::Request::builder()
            .method("PUT")
            .uri("/mybucket/photo.jpg")
            .header(DATE_HEADER, "Fri, 27 Feb 2026 00:00:00 GMT")
            .header(AUTHORIZATION, "GOOG1 GOOGKEY:stale")
            .body(())
            .unwrap();

        authorize(&mut request, &test_credentials(), Some(signing_time())).unwrap();

        assert_eq!(request.headers().get_all(DATE_HEADER).iter().count(), 1);
        assert_eq!(
            request.headers()[AUTHORIZATION],
            "GOOG1 GOOGKEY:62Qsu5CHJ0dxxvPyn4QMaYVd0z0="
        );
    }

    #[test]
    fn test_should_leave_request_untouched_on_error() {
        let mut request = http::Request::builder()
            .uri("/b/k?response-content-type=%zz")
            .body(())
            .unwrap();

        let result = authorize(&mut request, &test_credentials(), Some(signing_time()));

        assert!(matches!(
            result,
            Err(AuthError::MalformedQueryParameter { .. })
        ));
        assert!(request.headers().is_empty());
    }

    #[test]
    fn test_should_iterate_signed_headers() {
        let snapshot = RequestSnapshot::new(Method::GET, "/b/k");
        let signed = sign(&snapshot, &test_credentials(), signing_time()).unwrap();

        let names: Vec<HeaderName> = signed.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec![HeaderName::from_static(DATE_HEADER), AUTHORIZATION]);
    }

    #[test]
    fn test_should_sign_virtual_hosted_request_like_path_style() {
        let signer = Goog1Signer::new(Arc::new(StaticCredentialProvider::new(
            TEST_ACCESS_KEY,
            TEST_SECRET_KEY,
        )))
        .with_virtual_host_domain("storage.googleapis.com");

        let (mut parts, ()) = http::Request::builder()
            .method("PUT")
            .uri("https://mybucket.storage.googleapis.com/photo.jpg")
            .body(())
            .unwrap()
            .into_parts();

        signer.sign_at(&mut parts, signing_time()).unwrap();

        assert_eq!(
            parts.headers[AUTHORIZATION],
            "GOOG1 GOOGKEY:62Qsu5CHJ0dxxvPyn4QMaYVd0z0="
        );
    }

    #[test]
    fn test_should_sign_through_trait_object() {
        let config = GcpBackendConfig::default();
        let signer: Arc<dyn RequestSigner> = Arc::new(Goog1Signer::from_config(
            &config,
            Arc::new(StaticCredentialProvider::new(TEST_ACCESS_KEY, TEST_SECRET_KEY)),
        ));

        let (mut parts, ()) = http::Request::builder()
            .uri("https://storage.googleapis.com/b/k")
            .body(())
            .unwrap()
            .into_parts();

        signer.sign_request(&mut parts).unwrap();

        assert!(parts.headers.contains_key(DATE_HEADER));
        let auth = parts.headers[AUTHORIZATION].to_str().unwrap();
        assert!(auth.starts_with("GOOG1 GOOGKEY:"));
    }

    #[test]
    fn test_should_surface_provider_errors() {
        let signer = Goog1Signer::new(Arc::new(StaticCredentialProvider::new("", "")));
        let (mut parts, ()) = http::Request::builder()
            .uri("/b/k")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(
            signer.sign_request(&mut parts),
            Err(AuthError::MissingCredentials)
        );
        assert!(parts.headers.is_empty());
    }
}
