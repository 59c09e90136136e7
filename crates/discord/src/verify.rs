use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid interaction public key: {0}")]
    InvalidPublicKey(String),
    #[error("signature header is not a 64-byte hex value")]
    MalformedSignature,
    #[error("signature does not match request body")]
    Mismatch,
}

/// Checks the Ed25519 signature Discord attaches to every interaction request.
#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    pub fn from_hex(public_key: &str) -> Result<Self, SignatureError> {
        let bytes = hex::decode(public_key.trim())
            .map_err(|error| SignatureError::InvalidPublicKey(error.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| SignatureError::InvalidPublicKey("expected 32 bytes".to_owned()))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|error| SignatureError::InvalidPublicKey(error.to_string()))?;
        Ok(Self { key })
    }

    /// The signed message is the timestamp header followed by the raw body.
    pub fn verify(
        &self,
        signature_hex: &str,
        timestamp: &str,
        body: &[u8],
    ) -> Result<(), SignatureError> {
        let signature: [u8; 64] = hex::decode(signature_hex.trim())
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or(SignatureError::MalformedSignature)?;
        let signature = Signature::from_bytes(&signature);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.key.verify(&message, &signature).map_err(|_| SignatureError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};

    use super::{SignatureError, SignatureVerifier};

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[7_u8; 32])
    }

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::from_hex(&hex::encode(signing_key().verifying_key().to_bytes()))
            .expect("valid public key")
    }

    fn sign(timestamp: &str, body: &[u8]) -> String {
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        hex::encode(signing_key().sign(&message).to_bytes())
    }

    #[test]
    fn accepts_signature_over_timestamp_and_body() {
        let body = br#"{"id":"1","type":1}"#;
        let signature = sign("1730000000", body);

        assert_eq!(verifier().verify(&signature, "1730000000", body), Ok(()));
    }

    #[test]
    fn rejects_tampered_body_and_timestamp() {
        let body = br#"{"id":"1","type":1}"#;
        let signature = sign("1730000000", body);

        assert_eq!(
            verifier().verify(&signature, "1730000000", br#"{"id":"1","type":2}"#),
            Err(SignatureError::Mismatch)
        );
        assert_eq!(
            verifier().verify(&signature, "1730000001", body),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_malformed_signature_header() {
        assert_eq!(
            verifier().verify("abc", "1730000000", b"{}"),
            Err(SignatureError::MalformedSignature)
        );
        assert_eq!(
            verifier().verify(&"zz".repeat(64), "1730000000", b"{}"),
            Err(SignatureError::MalformedSignature)
        );
    }

    #[test]
    fn rejects_public_key_of_wrong_length() {
        assert!(matches!(
            SignatureVerifier::from_hex("abcd"),
            Err(SignatureError::InvalidPublicKey(_))
        ));
    }
}
