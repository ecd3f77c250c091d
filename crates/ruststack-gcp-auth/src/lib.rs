//! GOOG1 request signing for outbound RustStack storage gateway requests.
//!
//! This crate computes the `Authorization` header that a GOOG1 (legacy
//! shared-secret, canonicalized-request) object-storage backend expects on
//! every request. It is the client side of the scheme: given an unsent request
//! and a credential pair, it produces the headers to add before dispatch.
//!
//! # Overview
//!
//! ```text
//! Authorization = "GOOG1 " + AccessKeyId + ":" + Base64(HMAC-SHA1(SecretKey, StringToSign))
//! ```
//!
//! Signing is a pure, synchronous function of the request snapshot, the
//! credentials and the signing time. It performs no I/O and holds no shared
//! state, so independent requests can be signed concurrently from any thread.
//!
//! # Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use ruststack_gcp_auth::{Credentials, authorize};
//!
//! let mut request = http::Request::builder()
//!     .method("GET")
//!     .uri("https://storage.googleapis.com/mybucket/photo.jpg")
//!     .body(())
//!     .unwrap();
//!
//! let credentials = Credentials::new("GOOGKEY", "secret");
//! let time = Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap();
//! authorize(&mut request, &credentials, Some(time)).unwrap();
//!
//! assert!(request.headers().contains_key("x-goog-date"));
//! assert!(request.headers().contains_key("authorization"));
//! ```
//!
//! # Modules
//!
//! - [`canonical`] - Canonical headers and canonical resource
//! - [`config`] - Backend configuration loaded from the environment
//! - [`credentials`] - Credential pair and credential providers
//! - [`error`] - Signing error types
//! - [`presigned`] - Pre-signed URL generation
//! - [`request`] - Request snapshot taken at signing time
//! - [`signature`] - HMAC-SHA1 signature computation
//! - [`signer`] - Request authorization and the [`RequestSigner`] trait
//! - [`string_to_sign`] - String-to-sign assembly

pub mod canonical;
pub mod config;
pub mod credentials;
pub mod error;
pub mod presigned;
pub mod request;
pub mod signature;
pub mod signer;
pub mod string_to_sign;

pub use config::GcpBackendConfig;
pub use credentials::{
    CredentialProvider, Credentials, EnvCredentialProvider, SecretKey, StaticCredentialProvider,
};
pub use error::AuthError;
pub use presigned::{PresignedUrl, presign};
pub use request::RequestSnapshot;
pub use signature::compute_signature;
pub use signer::{Goog1Signer, RequestSigner, SignedHeaders, authorize, sign};
