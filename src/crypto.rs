use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{digest::InvalidLength, Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Expected signing key length, in bytes (256 bits).
pub const KEY_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Malformed base64 key: {0}")]
    MalformedKey(#[from] base64::DecodeError),
    #[error("Unusable HMAC key: {0}")]
    UnusableKey(#[from] InvalidLength),
}

pub fn decode_key(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    Ok(STANDARD.decode(encoded)?)
}

fn keyed_mac(key: &[u8], body: &[u8]) -> Result<HmacSha256, CryptoError> {
    let mut hmac = HmacSha256::new_from_slice(key)?;
    hmac.update(body);
    Ok(hmac)
}

/// Compute the base64-encoded HMAC-SHA-256 of `body`.
pub fn compute_signature(key: &[u8], body: &[u8]) -> Result<String, CryptoError> {
    let digest = keyed_mac(key, body)?.finalize().into_bytes();
    Ok(STANDARD.encode(digest))
}

/// Check a base64-encoded signature against `body`, in constant time.
///
/// A signature that is not valid base64 is simply invalid.
pub fn is_valid_signature(signature: &str, body: &[u8], key: &[u8]) -> Result<bool, CryptoError> {
    let hmac = keyed_mac(key, body)?;

    let decoded = match STANDARD.decode(signature) {
        Ok(d) => d,
        Err(_) => return Ok(false),
    };

    Ok(hmac.verify_slice(&decoded).is_ok())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    const ZERO_KEY: [u8; KEY_LENGTH] = [0; KEY_LENGTH];

    #[test]
    fn test_decode_key() {
        let key = decode_key("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=").unwrap();
        assert_eq!(key, ZERO_KEY.to_vec());

        assert_matches!(decode_key("not base64!"), Err(CryptoError::MalformedKey(_)));
    }

    #[test]
    fn test_signature_matches_hmac_sha256() {
        // RFC 4231, test case 2
        let signature =
            compute_signature(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(signature, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }

    #[test]
    fn test_is_valid_signature() {
        let signature = compute_signature(&ZERO_KEY, b"hello").unwrap();

        assert!(is_valid_signature(&signature, b"hello", &ZERO_KEY).unwrap());
        assert!(!is_valid_signature(&signature, b"hellp", &ZERO_KEY).unwrap());
        assert!(!is_valid_signature("", b"hello", &ZERO_KEY).unwrap());
        assert!(!is_valid_signature("%%%", b"hello", &ZERO_KEY).unwrap());
    }

    #[test]
    fn test_truncated_signature_is_invalid() {
        let signature = compute_signature(&ZERO_KEY, b"hello").unwrap();
        let digest = STANDARD.decode(&signature).unwrap();
        let truncated = STANDARD.encode(&digest[..16]);

        assert!(!is_valid_signature(&truncated, b"hello", &ZERO_KEY).unwrap());
    }
}
