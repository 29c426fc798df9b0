//! State records kept in the naming and oracle subtrees.
//!
//! Each record has a deterministic RLP value encoding (an untagged list with
//! a fixed field order); the trie commits to these bytes, so the encodings
//! are consensus-relevant even though they never cross the wire.

use alloy_rlp::{Decodable, Encodable, Header};
use bytes::Bytes;

use meridian_core::error::MeridianError;
use meridian_core::tx::FormatSpec;
use meridian_core::types::{Balance, Height, PublicKey};

fn rlp_err(e: alloy_rlp::Error) -> MeridianError {
    MeridianError::Encoding(e.to_string())
}

fn decode_u64(buf: &mut &[u8]) -> Result<u64, MeridianError> {
    u64::decode(buf).map_err(rlp_err)
}

fn decode_key(buf: &mut &[u8]) -> Result<PublicKey, MeridianError> {
    Ok(PublicKey::from_bytes(<[u8; 32]>::decode(buf).map_err(rlp_err)?))
}

fn decode_bytes(buf: &mut &[u8]) -> Result<Vec<u8>, MeridianError> {
    Ok(Bytes::decode(buf).map_err(rlp_err)?.to_vec())
}

fn decode_format(buf: &mut &[u8]) -> Result<FormatSpec, MeridianError> {
    let octet = decode_u64(buf)?;
    u8::try_from(octet)
        .ok()
        .and_then(FormatSpec::from_octet)
        .ok_or_else(|| MeridianError::Encoding(format!("unknown format spec {octet}")))
}

fn finish_list(payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    Header { list: true, payload_length: payload.len() }.encode(&mut out);
    out.extend_from_slice(&payload);
    out
}

fn open_record(buf: &mut &[u8]) -> Result<usize, MeridianError> {
    let header = Header::decode(buf).map_err(rlp_err)?;
    if !header.list {
        return Err(MeridianError::Encoding("expected a record list".into()));
    }
    Ok(header.payload_length)
}

fn close_record(before: usize, buf: &&[u8], expected: usize) -> Result<(), MeridianError> {
    if before - buf.len() != expected || !buf.is_empty() {
        return Err(MeridianError::Encoding("record length mismatch".into()));
    }
    Ok(())
}

// ── RegisteredOracle ─────────────────────────────────────────────────────────

/// An oracle registration, keyed in the registry by the owner's public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisteredOracle {
    pub owner: PublicKey,
    pub query_format: FormatSpec,
    pub response_format: FormatSpec,
    /// Fee the oracle charges per query; queries offering less are rejected.
    pub query_fee: Balance,
    pub expires_at: Height,
}

impl RegisteredOracle {
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        self.owner.0.encode(&mut payload);
        (self.query_format.as_octet() as u64).encode(&mut payload);
        (self.response_format.as_octet() as u64).encode(&mut payload);
        self.query_fee.encode(&mut payload);
        self.expires_at.encode(&mut payload);
        finish_list(payload)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, MeridianError> {
        let b = &mut &buf[..];
        let payload_length = open_record(b)?;
        let before = b.len();
        let record = Self {
            owner: decode_key(b)?,
            query_format: decode_format(b)?,
            response_format: decode_format(b)?,
            query_fee: decode_u64(b)?,
            expires_at: decode_u64(b)?,
        };
        close_record(before, b, payload_length)?;
        Ok(record)
    }
}

// ── OracleInteraction ────────────────────────────────────────────────────────

/// A query and its (at most one) response, keyed by the derived query-id.
/// The offered query fee stays escrowed here until the oracle answers or
/// the interaction expires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleInteraction {
    pub querier: PublicKey,
    pub oracle: PublicKey,
    pub query_data: Vec<u8>,
    pub query_fee: Balance,
    pub response: Option<Vec<u8>>,
    pub query_expires_at: Height,
    pub response_expires_at: Height,
}

impl OracleInteraction {
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        self.querier.0.encode(&mut payload);
        self.oracle.0.encode(&mut payload);
        self.query_data.as_slice().encode(&mut payload);
        self.query_fee.encode(&mut payload);
        match &self.response {
            Some(data) => {
                1u64.encode(&mut payload);
                data.as_slice().encode(&mut payload);
            }
            None => {
                0u64.encode(&mut payload);
                [0u8; 0].as_slice().encode(&mut payload);
            }
        }
        self.query_expires_at.encode(&mut payload);
        self.response_expires_at.encode(&mut payload);
        finish_list(payload)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, MeridianError> {
        let b = &mut &buf[..];
        let payload_length = open_record(b)?;
        let before = b.len();
        let querier = decode_key(b)?;
        let oracle = decode_key(b)?;
        let query_data = decode_bytes(b)?;
        let query_fee = decode_u64(b)?;
        let has_response = decode_u64(b)?;
        let response_data = decode_bytes(b)?;
        let response = match has_response {
            0 => None,
            1 => Some(response_data),
            other => {
                return Err(MeridianError::Encoding(format!(
                    "invalid response flag {other}"
                )))
            }
        };
        let record = Self {
            querier,
            oracle,
            query_data,
            query_fee,
            response,
            query_expires_at: decode_u64(b)?,
            response_expires_at: decode_u64(b)?,
        };
        close_record(before, b, payload_length)?;
        Ok(record)
    }

    pub fn is_answered(&self) -> bool {
        self.response.is_some()
    }
}

// ── NameCommitment ───────────────────────────────────────────────────────────

/// A pending pre-claim, keyed by BLAKE3(name ‖ salt).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameCommitment {
    pub owner: PublicKey,
    pub created_at: Height,
}

impl NameCommitment {
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        self.owner.0.encode(&mut payload);
        self.created_at.encode(&mut payload);
        finish_list(payload)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, MeridianError> {
        let b = &mut &buf[..];
        let payload_length = open_record(b)?;
        let before = b.len();
        let record = Self { owner: decode_key(b)?, created_at: decode_u64(b)? };
        close_record(before, b, payload_length)?;
        Ok(record)
    }
}

// ── NameClaimRecord ──────────────────────────────────────────────────────────

/// A claimed name, keyed by the namehash of its normalized form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameClaimRecord {
    pub name: String,
    pub owner: PublicKey,
    pub claim_height: Height,
}

impl NameClaimRecord {
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        self.name.as_bytes().encode(&mut payload);
        self.owner.0.encode(&mut payload);
        self.claim_height.encode(&mut payload);
        finish_list(payload)
    }

    pub fn decode(buf: &[u8]) -> Result<Self, MeridianError> {
        let b = &mut &buf[..];
        let payload_length = open_record(b)?;
        let before = b.len();
        let name_bytes = decode_bytes(b)?;
        let name = String::from_utf8(name_bytes)
            .map_err(|_| MeridianError::Encoding("claimed name is not valid utf-8".into()))?;
        let record = Self { name, owner: decode_key(b)?, claim_height: decode_u64(b)? };
        close_record(before, b, payload_length)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::tx::FormatSpec;

    #[test]
    fn registered_oracle_round_trip() {
        let record = RegisteredOracle {
            owner: PublicKey::from_bytes([1u8; 32]),
            query_format: FormatSpec::Json,
            response_format: FormatSpec::Raw,
            query_fee: 5,
            expires_at: 120,
        };
        assert_eq!(RegisteredOracle::decode(&record.encode()).unwrap(), record);
    }

    #[test]
    fn interaction_round_trip_with_and_without_response() {
        let open = OracleInteraction {
            querier: PublicKey::from_bytes([1u8; 32]),
            oracle: PublicKey::from_bytes([2u8; 32]),
            query_data: b"price?".to_vec(),
            query_fee: 3,
            response: None,
            query_expires_at: 10,
            response_expires_at: 20,
        };
        assert_eq!(OracleInteraction::decode(&open.encode()).unwrap(), open);

        let answered = OracleInteraction { response: Some(b"42".to_vec()), ..open };
        assert_eq!(OracleInteraction::decode(&answered.encode()).unwrap(), answered);
    }

    #[test]
    fn name_records_round_trip() {
        let commitment = NameCommitment { owner: PublicKey::from_bytes([3u8; 32]), created_at: 7 };
        assert_eq!(NameCommitment::decode(&commitment.encode()).unwrap(), commitment);

        let claim = NameClaimRecord {
            name: "alice.chain".into(),
            owner: PublicKey::from_bytes([3u8; 32]),
            claim_height: 9,
        };
        assert_eq!(NameClaimRecord::decode(&claim.encode()).unwrap(), claim);
    }
}
