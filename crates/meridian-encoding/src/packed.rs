//! The packed signing encoding.
//!
//! A deterministic, injective byte form of the unsigned transaction: every
//! field is a 4-byte big-endian length prefix followed by its content, in
//! the frozen per-kind field order. Integers render as minimal big-endian
//! bytes (zero is the empty string); public keys are their raw 32 bytes;
//! TTLs are one field, a type octet followed by the minimal value bytes.
//! This is the message that gets signed and hashed, so any change here is a
//! consensus change.

use meridian_core::constants::OBJECT_VERSION;
use meridian_core::error::MeridianError;
use meridian_core::tx::{DataTx, TxPayload};
use meridian_core::types::{PublicKey, Ttl};

struct PackedWriter {
    buf: Vec<u8>,
}

impl PackedWriter {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn field(&mut self, content: &[u8]) {
        self.buf.extend_from_slice(&(content.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(content);
    }

    fn uint(&mut self, value: u64) {
        self.field(&minimal_be(value));
    }

    fn key(&mut self, key: &PublicKey) {
        self.field(key.as_bytes());
    }

    fn ttl(&mut self, ttl: &Ttl) {
        let mut content = vec![ttl.ttl_type.as_octet()];
        content.extend_from_slice(&minimal_be(ttl.value));
        self.field(&content);
    }
}

/// Minimal big-endian rendering of an unsigned integer; zero is empty.
fn minimal_be(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    bytes[skip..].to_vec()
}

fn required_sender(tx: &DataTx) -> Result<&PublicKey, MeridianError> {
    tx.sender
        .as_ref()
        .ok_or_else(|| MeridianError::Encoding("sender field is required".into()))
}

/// Canonical signable bytes of an unsigned transaction.
pub fn packed(tx: &DataTx) -> Result<Vec<u8>, MeridianError> {
    let mut w = PackedWriter::new();
    w.uint(tx.payload.tag() as u64);
    // The Spend payload carries its own version in the version slot; every
    // other kind is at the shared object version.
    match &tx.payload {
        TxPayload::Spend(p) => w.uint(p.version),
        _ => w.uint(OBJECT_VERSION),
    }

    match &tx.payload {
        TxPayload::Spend(p) => {
            w.key(required_sender(tx)?);
            w.key(&p.receiver);
            w.uint(p.amount);
            w.uint(tx.fee);
            w.uint(tx.nonce);
        }
        TxPayload::Coinbase(p) => {
            if tx.sender.is_some() {
                return Err(MeridianError::Encoding("coinbase must not carry a sender".into()));
            }
            w.key(&p.receiver);
            w.uint(p.amount);
            // Block height occupies the nonce slot.
            w.uint(p.height);
        }
        TxPayload::OracleRegister(p) => {
            w.key(required_sender(tx)?);
            w.field(&[p.query_format.as_octet()]);
            w.field(&[p.response_format.as_octet()]);
            w.uint(p.query_fee);
            w.ttl(&p.ttl);
            w.uint(tx.fee);
            w.uint(tx.nonce);
        }
        TxPayload::OracleQuery(p) => {
            w.key(required_sender(tx)?);
            w.key(&p.oracle);
            w.field(&p.query_data);
            w.uint(p.query_fee);
            w.ttl(&p.query_ttl);
            w.ttl(&p.response_ttl);
            w.uint(tx.fee);
            w.uint(tx.nonce);
        }
        TxPayload::OracleResponse(p) => {
            w.key(required_sender(tx)?);
            w.field(p.query_id.as_bytes());
            w.field(&p.response_data);
            w.uint(tx.fee);
            w.uint(tx.nonce);
        }
        TxPayload::OracleExtend(p) => {
            w.key(required_sender(tx)?);
            w.ttl(&p.ttl);
            w.uint(tx.fee);
            w.uint(tx.nonce);
        }
        TxPayload::NamePreClaim(p) => {
            w.key(required_sender(tx)?);
            w.field(p.commitment.as_bytes());
            w.uint(tx.fee);
            w.uint(tx.nonce);
        }
        TxPayload::NameClaim(p) => {
            w.key(required_sender(tx)?);
            w.field(p.name.as_bytes());
            w.field(&p.name_salt);
            w.uint(tx.fee);
            w.uint(tx.nonce);
        }
    }

    Ok(w.buf)
}
