use serde::{Deserialize, Serialize};
use std::fmt;

/// Token balance. u64 covers the full supply with room to spare.
pub type Balance = u64;

/// Block height.
pub type Height = u64;

/// Transaction sequence number per account (strictly increasing).
pub type Nonce = u64;

// ── PublicKey ────────────────────────────────────────────────────────────────

/// 32-byte Ed25519 public key; doubles as the account identifier in the
/// accounts trie and as the oracle identifier in the oracle registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Base-58 encoded string representation (raw, no checksum envelope).
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", &self.to_b58()[..8])
    }
}

// ── TxHash ───────────────────────────────────────────────────────────────────

/// 32-byte transaction identifier: BLAKE3 of the packed inner transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({}…)", &self.to_hex()[..16])
    }
}

// ── QueryId ──────────────────────────────────────────────────────────────────

/// Derived identifier of an oracle interaction:
/// BLAKE3(sender ‖ nonce_be ‖ oracle).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueryId(pub [u8; 32]);

impl QueryId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryId({}…)", &hex::encode(self.0)[..16])
    }
}

// ── Commitment ───────────────────────────────────────────────────────────────

/// 32-byte name pre-claim commitment: BLAKE3(name ‖ salt).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Commitment(pub [u8; 32]);

impl Commitment {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Commitment({}…)", &hex::encode(self.0)[..16])
    }
}

// ── NameHash ─────────────────────────────────────────────────────────────────

/// 32-byte trie key of a claimed name: BLAKE3 of the normalized name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameHash(pub [u8; 32]);

impl NameHash {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameHash({}…)", &hex::encode(self.0)[..16])
    }
}

// ── TxSignature ──────────────────────────────────────────────────────────────

/// Detached Ed25519 signature over the packed inner transaction (64 bytes;
/// the protocol bound is `ChainConfig::sign_max_size`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSignature(pub Vec<u8>);

impl TxSignature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for TxSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxSignature({}b)", self.0.len())
    }
}

// ── Ttl ──────────────────────────────────────────────────────────────────────

/// Time-to-live of an oracle object, as an absolute block height or an
/// offset from a reference height. Wire form is `(type_byte, value)` with
/// type 0 = absolute, 1 = relative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TtlType {
    Absolute,
    Relative,
}

impl TtlType {
    pub fn as_octet(&self) -> u8 {
        match self {
            TtlType::Absolute => 0,
            TtlType::Relative => 1,
        }
    }

    pub fn from_octet(b: u8) -> Option<Self> {
        match b {
            0 => Some(TtlType::Absolute),
            1 => Some(TtlType::Relative),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ttl {
    pub ttl_type: TtlType,
    pub value: u64,
}

impl Ttl {
    pub fn absolute(value: u64) -> Self {
        Self { ttl_type: TtlType::Absolute, value }
    }

    pub fn relative(value: u64) -> Self {
        Self { ttl_type: TtlType::Relative, value }
    }

    /// Resolve to an absolute expiry height against `reference`.
    pub fn resolve(&self, reference: Height) -> Height {
        match self.ttl_type {
            TtlType::Absolute => self.value,
            TtlType::Relative => reference.saturating_add(self.value),
        }
    }
}
