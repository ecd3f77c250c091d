//! RustStack GCP Sign - GOOG1 request signing from the command line.
//!
//! Signs one outbound request the same way the storage gateway does and prints
//! the headers to attach, or prints a pre-signed URL. Useful for checking the
//! signer against the backend by hand (e.g. with `curl`).
//!
//! # Usage
//!
//! ```text
//! ruststack-gcp-sign <METHOD> <URL> [-H 'Name: value']... [--presign [SECONDS]]
//! ```
//!
//! `URL` may be absolute or a bare path; a bare path is sent to `GCP_ENDPOINT`.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GCP_ACCESS_KEY_ID` / `ACCESS_KEY` | *(required)* | Access key ID |
//! | `GCP_SECRET_ACCESS_KEY` / `SECRET_KEY` | *(required)* | Secret key |
//! | `GCP_ENDPOINT` | `storage.googleapis.com` | Backend endpoint host |
//! | `GCP_VIRTUAL_HOSTING` | `true` | Resolve `<bucket>.<endpoint>` hosts |
//! | `GCP_PRESIGN_EXPIRES` | `900` | Default pre-signed URL lifetime (seconds) |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{TimeDelta, Utc};
use clap::Parser;
use http::header::{AUTHORIZATION, HOST};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ruststack_gcp_auth::signer::DATE_HEADER;
use ruststack_gcp_auth::{EnvCredentialProvider, GcpBackendConfig, Goog1Signer, RequestSigner};

/// Tool version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sign one GOOG1 request, or print a pre-signed URL for it.
#[derive(Parser, Debug)]
#[command(name = "ruststack-gcp-sign")]
#[command(version, about, long_about = None)]
struct Cli {
    /// HTTP method (case-insensitive).
    #[arg(value_parser = parse_method)]
    method: http::Method,

    /// Absolute URL, or a bare path sent to `GCP_ENDPOINT`.
    url: String,

    /// Extra request header, `Name: value`. May be repeated.
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Print a pre-signed URL instead of headers. Defaults to
    /// `GCP_PRESIGN_EXPIRES` seconds when no lifetime is given.
    #[arg(long, value_name = "SECONDS", num_args = 0..=1)]
    presign: Option<Option<u64>>,
}

fn parse_method(raw: &str) -> Result<http::Method, String> {
    http::Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .map_err(|_| format!("invalid HTTP method: {raw}"))
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("header must be 'Name: value', got {raw:?}"))?;
    Ok((name.trim().to_owned(), value.trim_start().to_owned()))
}

/// Initialize the tracing subscriber, logging to stderr.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Build the request head to sign.
///
/// A URL without an authority is addressed to the configured endpoint.
fn build_request(cli: &Cli, config: &GcpBackendConfig) -> Result<http::request::Parts> {
    let uri: http::Uri = cli
        .url
        .parse()
        .with_context(|| format!("invalid URL: {}", cli.url))?;

    let mut builder = http::Request::builder()
        .method(cli.method.clone())
        .uri(uri.clone());
    if uri.authority().is_none() {
        builder = builder.header(HOST, config.endpoint.as_str());
    }
    for (name, value) in &cli.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let (parts, ()) = builder
        .body(())
        .context("failed to build request")?
        .into_parts();
    Ok(parts)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = GcpBackendConfig::from_env();

    init_tracing(&config.log_level)?;

    info!(
        endpoint = %config.endpoint,
        virtual_hosting = config.virtual_hosting,
        method = %cli.method,
        url = %cli.url,
        version = VERSION,
        "signing request",
    );

    let signer = Goog1Signer::from_config(&config, Arc::new(EnvCredentialProvider));
    let mut parts = build_request(&cli, &config)?;

    if let Some(secs) = cli.presign {
        let secs = secs.unwrap_or(config.presign_expires_secs);
        let ttl = i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .with_context(|| format!("pre-sign lifetime out of range: {secs}"))?;
        let url = signer
            .presign(&parts, Utc::now() + ttl)
            .context("failed to pre-sign request")?;
        debug!(expires = url.expires(), "pre-signed request");
        println!("{url}");
        return Ok(());
    }

    signer
        .sign_request(&mut parts)
        .context("failed to sign request")?;

    if let Some(date) = parts.headers.get(DATE_HEADER) {
        println!("X-Goog-Date: {}", date.to_str()?);
    }
    if let Some(auth) = parts.headers.get(AUTHORIZATION) {
        println!("Authorization: {}", auth.to_str()?);
    }

    Ok(())
}
