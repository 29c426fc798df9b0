use ed25519_dalek::{Signer, SigningKey};
use meridian_core::types::{PublicKey, TxSignature};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

/// An Ed25519 keypair with the derived account public key.
///
/// The signing key zeroizes its secret material on drop.
pub struct KeyPair {
    pub public_key: PublicKey,
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh keypair from the OS entropy source.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_signing_key(signing_key)
    }

    /// Restore a keypair from a 32-byte seed (e.g. loaded from a wallet
    /// file). The seed copy is wiped after key derivation.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let seed = Zeroizing::new(seed);
        Self::from_signing_key(SigningKey::from_bytes(&seed))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = PublicKey::from_bytes(signing_key.verifying_key().to_bytes());
        Self { public_key, signing_key }
    }

    /// Produce a 64-byte detached signature over `message`.
    pub fn sign(&self, message: &[u8]) -> TxSignature {
        TxSignature(self.signing_key.sign(message).to_bytes().to_vec())
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ public_key: {:?} }}", self.public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_derivation_is_deterministic() {
        let a = KeyPair::from_seed([42u8; 32]);
        let b = KeyPair::from_seed([42u8; 32]);
        assert_eq!(a.public_key, b.public_key);
        assert_eq!(a.sign(b"msg"), b.sign(b"msg"));
    }

    #[test]
    fn signatures_are_64_bytes() {
        let kp = KeyPair::generate();
        assert_eq!(kp.sign(b"payload").len(), 64);
    }
}
