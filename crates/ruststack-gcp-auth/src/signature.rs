//! Signature computation: `Base64(HMAC-SHA1(SecretKey, StringToSign))`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, KeyInit, Mac};
use sha1::Sha1;

use crate::error::AuthError;

type HmacSha1 = Hmac<Sha1>;

/// Compute the GOOG1 signature of `string_to_sign`.
///
/// The raw 20-byte digest is encoded with the standard base64 alphabet,
/// padded, and never truncated.
///
/// # Errors
///
/// Returns [`AuthError::InvalidKey`] if the secret key is empty or rejected by
/// the HMAC primitive.
///
/// # Examples
///
/// ```
/// use ruststack_gcp_auth::signature::compute_signature;
///
/// let sig = compute_signature(b"secret", "GET\n\n\n\n/bucket/key").unwrap();
/// assert_eq!(sig, "gUAM0PxELXi27AXC0alWL+M2ehw=");
/// ```
pub fn compute_signature(secret_key: &[u8], string_to_sign: &str) -> Result<String, AuthError> {
    if secret_key.is_empty() {
        return Err(AuthError::InvalidKey);
    }

    let mut mac = HmacSha1::new_from_slice(secret_key).map_err(|_| AuthError::InvalidKey)?;
    mac.update(string_to_sign.as_bytes());
    let digest = mac.finalize().into_bytes();

    Ok(BASE64.encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_match_golden_signature() {
        let sig = compute_signature(b"secret", "GET\n\n\n\n/bucket/key").unwrap();
        assert_eq!(sig, "gUAM0PxELXi27AXC0alWL+M2ehw=");
    }

    #[test]
    fn test_should_match_reference_hmac_sha1() {
        assert_eq!(
            compute_signature(b"secret", "data").unwrap(),
            "mBjjMGulrCZ7XyZ5/kq9N+bNe1Q="
        );
    }

    #[test]
    fn test_should_produce_padded_untruncated_digest() {
        let sig = compute_signature(b"k", "").unwrap();
        // 20-byte SHA-1 digest in padded base64.
        assert_eq!(sig.len(), 28);
        assert!(sig.ends_with('='));
    }

    #[test]
    fn test_should_reject_empty_secret_key() {
        assert_eq!(compute_signature(b"", "GET"), Err(AuthError::InvalidKey));
    }

    #[test]
    fn test_should_accept_keys_longer_than_block_size() {
        let long_key = vec![0x5a_u8; 200];
        let sig = compute_signature(&long_key, "PUT\n\n\n\n/b/k").unwrap();
        assert_eq!(sig, compute_signature(&long_key, "PUT\n\n\n\n/b/k").unwrap());
    }
}
