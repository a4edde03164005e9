//! # Webhook Signature Verification
//!
//! Verifies the provider's signature header before any state is
//! touched. The header format is `t=<unix-seconds>,v1=<hex hmac>`; the
//! signed payload is `"{timestamp}.{raw body}"` under HMAC-SHA256 with
//! the shared endpoint secret.
//!
//! The timestamp is bounded to a five-minute window to blunt replay,
//! and the signature comparison is constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::PaymentError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age (and future skew) of a signed timestamp.
pub const TOLERANCE_SECS: i64 = 300;

/// Verifier bound to one endpoint secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The secret never appears in debug output.
        f.debug_struct("SignatureVerifier").finish_non_exhaustive()
    }
}

impl SignatureVerifier {
    /// Create a verifier for the given endpoint secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify a signature header against the raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::SignatureInvalid`] if the header is
    /// malformed, the timestamp is outside the tolerance window, or the
    /// HMAC does not match.
    pub fn verify(
        &self,
        payload: &[u8],
        header: &str,
        now_epoch_secs: i64,
    ) -> Result<(), PaymentError> {
        let (timestamp, signature_hex) = parse_header(header)?;

        if (now_epoch_secs - timestamp).abs() > TOLERANCE_SECS {
            return Err(PaymentError::SignatureInvalid(format!(
                "timestamp outside tolerance: signed at {timestamp}, now {now_epoch_secs}"
            )));
        }

        let expected = self.compute(payload, timestamp);
        let provided = hex::decode(&signature_hex).map_err(|_| {
            PaymentError::SignatureInvalid("v1 signature is not valid hex".to_string())
        })?;

        if expected.ct_eq(provided.as_slice()).into() {
            Ok(())
        } else {
            Err(PaymentError::SignatureInvalid(
                "signature mismatch".to_string(),
            ))
        }
    }

    /// Produce a signature header for a payload.
    ///
    /// Used by the test suite and local tooling to emit deliveries the
    /// verifier accepts.
    pub fn sign(&self, payload: &[u8], timestamp_epoch_secs: i64) -> String {
        let mac = self.compute(payload, timestamp_epoch_secs);
        format!("t={timestamp_epoch_secs},v1={}", hex::encode(mac))
    }

    fn compute(&self, payload: &[u8], timestamp: i64) -> Vec<u8> {
        // HMAC accepts keys of any length; new_from_slice cannot fail.
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Parse `t=<secs>,v1=<hex>` into its parts.
fn parse_header(header: &str) -> Result<(i64, String), PaymentError> {
    let mut timestamp: Option<i64> = None;
    let mut v1: Option<String> = None;

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse().ok(),
            Some(("v1", value)) => v1 = Some(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        PaymentError::SignatureInvalid("missing or invalid t= timestamp".to_string())
    })?;
    let v1 = v1.ok_or_else(|| {
        PaymentError::SignatureInvalid("missing v1= signature".to_string())
    })?;
    Ok((timestamp, v1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const PAYLOAD: &[u8] = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;

    #[test]
    fn test_sign_then_verify() {
        let verifier = SignatureVerifier::new(SECRET);
        let header = verifier.sign(PAYLOAD, 1_700_000_000);
        verifier.verify(PAYLOAD, &header, 1_700_000_000).unwrap();
    }

    #[test]
    fn test_verify_within_tolerance() {
        let verifier = SignatureVerifier::new(SECRET);
        let header = verifier.sign(PAYLOAD, 1_700_000_000);
        verifier
            .verify(PAYLOAD, &header, 1_700_000_000 + TOLERANCE_SECS)
            .unwrap();
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let verifier = SignatureVerifier::new(SECRET);
        let header = verifier.sign(PAYLOAD, 1_700_000_000);
        let result = verifier.verify(PAYLOAD, &header, 1_700_000_000 + TOLERANCE_SECS + 1);
        assert!(matches!(result, Err(PaymentError::SignatureInvalid(_))));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let header = SignatureVerifier::new("whsec_other").sign(PAYLOAD, 1_700_000_000);
        let result = SignatureVerifier::new(SECRET).verify(PAYLOAD, &header, 1_700_000_000);
        assert!(matches!(result, Err(PaymentError::SignatureInvalid(_))));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let verifier = SignatureVerifier::new(SECRET);
        let header = verifier.sign(PAYLOAD, 1_700_000_000);
        let result = verifier.verify(b"{\"id\":\"evt_2\"}", &header, 1_700_000_000);
        assert!(matches!(result, Err(PaymentError::SignatureInvalid(_))));
    }

    #[test]
    fn test_malformed_headers_rejected() {
        let verifier = SignatureVerifier::new(SECRET);
        for header in ["", "t=abc,v1=00", "v1=00", "t=1700000000", "garbage"] {
            let result = verifier.verify(PAYLOAD, header, 1_700_000_000);
            assert!(
                matches!(result, Err(PaymentError::SignatureInvalid(_))),
                "header {header:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_non_hex_signature_rejected() {
        let verifier = SignatureVerifier::new(SECRET);
        let result = verifier.verify(PAYLOAD, "t=1700000000,v1=zzzz", 1_700_000_000);
        assert!(matches!(result, Err(PaymentError::SignatureInvalid(_))));
    }

    #[test]
    fn test_debug_hides_secret() {
        let verifier = SignatureVerifier::new(SECRET);
        assert!(!format!("{verifier:?}").contains(SECRET));
    }
}
