use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use meridian_core::error::MeridianError;
use meridian_core::types::PublicKey;

/// Verify a detached Ed25519 signature over `message`.
///
/// Any defect — wrong length, non-canonical key bytes, failed equation —
/// collapses to `InvalidSignature`; callers never learn which.
pub fn verify_signature(
    public_key: &PublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), MeridianError> {
    let key = VerifyingKey::from_bytes(public_key.as_bytes())
        .map_err(|_| MeridianError::InvalidSignature)?;
    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| MeridianError::InvalidSignature)?;
    key.verify(message, &Signature::from_bytes(&sig_bytes))
        .map_err(|_| MeridianError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::KeyPair;

    #[test]
    fn round_trip() {
        let kp = KeyPair::from_seed([1u8; 32]);
        let sig = kp.sign(b"hello");
        assert!(verify_signature(&kp.public_key, b"hello", sig.as_bytes()).is_ok());
    }

    #[test]
    fn tampered_message_rejected() {
        let kp = KeyPair::from_seed([1u8; 32]);
        let sig = kp.sign(b"hello");
        assert_eq!(
            verify_signature(&kp.public_key, b"hellO", sig.as_bytes()),
            Err(MeridianError::InvalidSignature)
        );
    }

    #[test]
    fn wrong_key_rejected() {
        let kp = KeyPair::from_seed([1u8; 32]);
        let other = KeyPair::from_seed([2u8; 32]);
        let sig = kp.sign(b"hello");
        assert_eq!(
            verify_signature(&other.public_key, b"hello", sig.as_bytes()),
            Err(MeridianError::InvalidSignature)
        );
    }

    #[test]
    fn truncated_signature_rejected() {
        let kp = KeyPair::from_seed([1u8; 32]);
        let sig = kp.sign(b"hello");
        assert_eq!(
            verify_signature(&kp.public_key, b"hello", &sig.as_bytes()[..63]),
            Err(MeridianError::InvalidSignature)
        );
    }
}
