//! Signing-envelope operations.
//!
//! The signature always covers the packed encoding of the inner transaction,
//! and so does the transaction hash: a transaction's identity is independent
//! of who signed it.

use meridian_core::config::ChainConfig;
use meridian_core::error::MeridianError;
use meridian_core::signed::SignedTx;
use meridian_core::tx::DataTx;
use meridian_core::types::TxHash;
use meridian_crypto::{tx_hash_from_packed, verify_signature, KeyPair};

use crate::packed::packed;

/// Sign an unsigned transaction with `keypair` and wrap it in the envelope.
pub fn sign_tx(keypair: &KeyPair, data: DataTx) -> Result<SignedTx, MeridianError> {
    let message = packed(&data)?;
    let signature = keypair.sign(&message);
    Ok(SignedTx { data, signature: Some(signature) })
}

/// Full envelope verification: intrinsic payload validity plus the
/// signature check over the packed inner bytes. Coinbase must carry no
/// signature and short-circuits the cryptographic check.
pub fn verify_tx(stx: &SignedTx, config: &ChainConfig) -> Result<(), MeridianError> {
    stx.data.static_valid(config)?;

    if stx.data.is_coinbase() {
        return match stx.signature {
            None => Ok(()),
            Some(_) => Err(MeridianError::InvalidSignature),
        };
    }

    let signature = stx.signature.as_ref().ok_or(MeridianError::InvalidSignature)?;
    if signature.len() > config.sign_max_size {
        return Err(MeridianError::InvalidSignature);
    }
    let sender = stx
        .data
        .sender
        .as_ref()
        .ok_or(MeridianError::InvalidSignature)?;
    let message = packed(&stx.data)?;
    verify_signature(sender, &message, signature.as_bytes())
}

/// Transaction identity: BLAKE3 of the packed inner transaction.
pub fn tx_hash(stx: &SignedTx) -> Result<TxHash, MeridianError> {
    Ok(tx_hash_from_packed(&packed(&stx.data)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::tx::{CoinbasePayload, SpendPayload, TxPayload};
    use meridian_core::types::{PublicKey, TxSignature};

    fn spend(keypair: &KeyPair, nonce: u64) -> DataTx {
        DataTx {
            sender: Some(keypair.public_key),
            fee: 1,
            nonce,
            payload: TxPayload::Spend(SpendPayload {
                receiver: PublicKey::from_bytes([2u8; 32]),
                amount: 40,
                version: 1,
            }),
        }
    }

    #[test]
    fn sign_then_verify() {
        let config = ChainConfig::default();
        let kp = KeyPair::from_seed([1u8; 32]);
        let stx = sign_tx(&kp, spend(&kp, 1)).unwrap();
        assert!(verify_tx(&stx, &config).is_ok());
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let config = ChainConfig::default();
        let kp = KeyPair::from_seed([1u8; 32]);
        let mut stx = sign_tx(&kp, spend(&kp, 1)).unwrap();
        stx.data.fee = 2;
        assert_eq!(verify_tx(&stx, &config), Err(MeridianError::InvalidSignature));
    }

    #[test]
    fn oversized_signature_rejected() {
        let config = ChainConfig::default();
        let kp = KeyPair::from_seed([1u8; 32]);
        let mut stx = sign_tx(&kp, spend(&kp, 1)).unwrap();
        let mut sig = stx.signature.take().unwrap().0;
        sig.push(0);
        stx.signature = Some(TxSignature(sig));
        assert_eq!(verify_tx(&stx, &config), Err(MeridianError::InvalidSignature));
    }

    #[test]
    fn coinbase_must_be_unsigned() {
        let config = ChainConfig::default();
        let data = DataTx {
            sender: None,
            fee: 0,
            nonce: 0,
            payload: TxPayload::Coinbase(CoinbasePayload {
                receiver: PublicKey::from_bytes([3u8; 32]),
                amount: 10,
                height: 1,
            }),
        };
        assert!(verify_tx(&SignedTx::unsigned(data.clone()), &config).is_ok());

        let signed = SignedTx { data, signature: Some(TxSignature(vec![0u8; 64])) };
        assert_eq!(verify_tx(&signed, &config), Err(MeridianError::InvalidSignature));
    }

    #[test]
    fn hash_ignores_signature() {
        let kp = KeyPair::from_seed([1u8; 32]);
        let other = KeyPair::from_seed([2u8; 32]);
        let data = spend(&kp, 1);
        let a = sign_tx(&kp, data.clone()).unwrap();
        let mut b = sign_tx(&kp, data).unwrap();
        b.signature = Some(other.sign(b"unrelated"));
        assert_eq!(tx_hash(&a).unwrap(), tx_hash(&b).unwrap());
    }
}
