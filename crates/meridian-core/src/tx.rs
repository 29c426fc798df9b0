//! The closed transaction variant family and the unsigned transaction body.
//!
//! Every state-changing operation on the ledger is one of the payload kinds
//! below. The kinds carry only data; the state transition semantics live in
//! the engine's single dispatch site (meridian-state), and the canonical
//! byte forms live in meridian-encoding.

use serde::{Deserialize, Serialize};

use crate::config::{ChainConfig, FeeRole};
use crate::constants::{
    MAX_NAME_BYTES, TAG_COINBASE_TX, TAG_NAME_CLAIM_TX, TAG_NAME_PRECLAIM_TX,
    TAG_ORACLE_EXTEND_TX, TAG_ORACLE_QUERY_TX, TAG_ORACLE_REGISTER_TX, TAG_ORACLE_RESPONSE_TX,
    TAG_SPEND_TX,
};
use crate::error::MeridianError;
use crate::types::{Balance, Commitment, Height, Nonce, PublicKey, QueryId, Ttl};

// ── Oracle data formats ──────────────────────────────────────────────────────

/// Declared shape of an oracle's query or response data. Wire octets:
/// Raw = 0, Utf8 = 1, Json = 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatSpec {
    /// Any byte string.
    Raw,
    /// Valid UTF-8.
    Utf8,
    /// A well-formed JSON document.
    Json,
}

impl FormatSpec {
    pub fn as_octet(&self) -> u8 {
        match self {
            FormatSpec::Raw => 0,
            FormatSpec::Utf8 => 1,
            FormatSpec::Json => 2,
        }
    }

    pub fn from_octet(b: u8) -> Option<Self> {
        match b {
            0 => Some(FormatSpec::Raw),
            1 => Some(FormatSpec::Utf8),
            2 => Some(FormatSpec::Json),
            _ => None,
        }
    }

    /// Check `data` against this format.
    pub fn conforms(&self, data: &[u8]) -> bool {
        match self {
            FormatSpec::Raw => true,
            FormatSpec::Utf8 => std::str::from_utf8(data).is_ok(),
            FormatSpec::Json => serde_json::from_slice::<serde_json::Value>(data).is_ok(),
        }
    }
}

// ── Payloads ─────────────────────────────────────────────────────────────────

/// Token transfer between two accounts. Sender and receiver may coincide.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendPayload {
    pub receiver: PublicKey,
    pub amount: Balance,
    pub version: u64,
}

/// The distinguished block-reward mint. Carries no sender and no signature;
/// the height slot occupies the nonce position on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinbasePayload {
    pub receiver: PublicKey,
    pub amount: Balance,
    pub height: Height,
}

impl CoinbasePayload {
    /// Credit the block reward to the miner's account.
    pub fn reward(&self, account: crate::account::Account) -> Result<crate::account::Account, MeridianError> {
        account.credit(self.amount)
    }
}

/// Register the sender as an oracle with declared data formats and a fee it
/// charges per query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRegisterPayload {
    pub query_format: FormatSpec,
    pub response_format: FormatSpec,
    pub query_fee: Balance,
    pub ttl: Ttl,
}

/// Ask a registered oracle a question, escrowing `query_fee` until it is
/// answered or the interaction expires.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleQueryPayload {
    pub oracle: PublicKey,
    pub query_data: Vec<u8>,
    pub query_fee: Balance,
    pub query_ttl: Ttl,
    pub response_ttl: Ttl,
}

/// An oracle's answer to an open interaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleResponsePayload {
    pub query_id: QueryId,
    pub response_data: Vec<u8>,
}

/// Push a registered oracle's expiry further into the future.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleExtendPayload {
    pub ttl: Ttl,
}

/// Publish a commitment to a future name claim without revealing the name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePreClaimPayload {
    pub commitment: Commitment,
}

/// Reveal a previously committed name and take ownership of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameClaimPayload {
    pub name: String,
    pub name_salt: Vec<u8>,
}

// ── TxPayload ────────────────────────────────────────────────────────────────

/// The closed variant family. Adding a kind is a consensus change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxPayload {
    Spend(SpendPayload),
    Coinbase(CoinbasePayload),
    OracleRegister(OracleRegisterPayload),
    OracleQuery(OracleQueryPayload),
    OracleResponse(OracleResponsePayload),
    OracleExtend(OracleExtendPayload),
    NamePreClaim(NamePreClaimPayload),
    NameClaim(NameClaimPayload),
}

impl TxPayload {
    /// Wire tag of this kind.
    pub fn tag(&self) -> u8 {
        match self {
            TxPayload::Spend(_) => TAG_SPEND_TX,
            TxPayload::Coinbase(_) => TAG_COINBASE_TX,
            TxPayload::OracleRegister(_) => TAG_ORACLE_REGISTER_TX,
            TxPayload::OracleQuery(_) => TAG_ORACLE_QUERY_TX,
            TxPayload::OracleResponse(_) => TAG_ORACLE_RESPONSE_TX,
            TxPayload::OracleExtend(_) => TAG_ORACLE_EXTEND_TX,
            TxPayload::NamePreClaim(_) => TAG_NAME_PRECLAIM_TX,
            TxPayload::NameClaim(_) => TAG_NAME_CLAIM_TX,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            TxPayload::Spend(_) => "spend",
            TxPayload::Coinbase(_) => "coinbase",
            TxPayload::OracleRegister(_) => "oracle_register",
            TxPayload::OracleQuery(_) => "oracle_query",
            TxPayload::OracleResponse(_) => "oracle_response",
            TxPayload::OracleExtend(_) => "oracle_extend",
            TxPayload::NamePreClaim(_) => "name_preclaim",
            TxPayload::NameClaim(_) => "name_claim",
        }
    }
}

// ── DataTx ───────────────────────────────────────────────────────────────────

/// The unsigned transaction body: sender, fee, nonce, and the kind-specific
/// payload. Immutable value type; its packed encoding is what gets signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTx {
    /// Absent only for Coinbase.
    pub sender: Option<PublicKey>,
    pub fee: Balance,
    pub nonce: Nonce,
    pub payload: TxPayload,
}

impl DataTx {
    /// Intrinsic validity: everything checkable without chain state.
    pub fn static_valid(&self, config: &ChainConfig) -> Result<(), MeridianError> {
        match &self.payload {
            TxPayload::Coinbase(_) => {
                if self.sender.is_some() {
                    return Err(MeridianError::MalformedTx("coinbase carries a sender".into()));
                }
                if self.fee != 0 {
                    return Err(MeridianError::MalformedTx("coinbase carries a fee".into()));
                }
                Ok(())
            }
            other => {
                if self.sender.is_none() {
                    return Err(MeridianError::MalformedTx(format!(
                        "{} requires exactly one sender",
                        other.kind_name()
                    )));
                }
                match other {
                    TxPayload::Spend(p) => {
                        if p.version != config.spend_tx_version {
                            return Err(MeridianError::MalformedTx(format!(
                                "spend version {} not accepted",
                                p.version
                            )));
                        }
                        Ok(())
                    }
                    TxPayload::OracleRegister(p) => {
                        if p.ttl.value == 0 {
                            return Err(MeridianError::MalformedTx("zero oracle ttl".into()));
                        }
                        Ok(())
                    }
                    TxPayload::OracleQuery(p) => {
                        if p.query_ttl.value == 0 {
                            return Err(MeridianError::MalformedTx("zero query ttl".into()));
                        }
                        Ok(())
                    }
                    TxPayload::OracleExtend(p) => {
                        if p.ttl.value == 0 {
                            return Err(MeridianError::MalformedTx("zero extend ttl".into()));
                        }
                        Ok(())
                    }
                    TxPayload::NameClaim(p) => {
                        normalize_name(&p.name)?;
                        if p.name_salt.len() != config.name_salt_size {
                            return Err(MeridianError::MalformedTx(format!(
                                "name salt must be exactly {} bytes",
                                config.name_salt_size
                            )));
                        }
                        Ok(())
                    }
                    TxPayload::OracleResponse(_) | TxPayload::NamePreClaim(_) => Ok(()),
                    TxPayload::Coinbase(_) => unreachable!("handled above"),
                }
            }
        }
    }

    /// Minimum fee for this transaction at `size_bytes` wire bytes under
    /// `role`. Uniform across kinds.
    pub fn min_fee(&self, size_bytes: usize, role: FeeRole, config: &ChainConfig) -> u64 {
        config.min_fee(size_bytes, role)
    }

    pub fn is_coinbase(&self) -> bool {
        matches!(self.payload, TxPayload::Coinbase(_))
    }
}

// ── Name normalization ───────────────────────────────────────────────────────

/// Normalize a registry name: ASCII case-fold, then require dot-separated
/// labels of `[a-z0-9-]` with no empty label and no leading or trailing
/// hyphen, at most `MAX_NAME_BYTES` bytes in total.
pub fn normalize_name(name: &str) -> Result<String, MeridianError> {
    let folded = name.to_ascii_lowercase();
    if folded.is_empty() {
        return Err(MeridianError::MalformedName("empty name".into()));
    }
    if folded.len() > MAX_NAME_BYTES {
        return Err(MeridianError::MalformedName(format!(
            "name exceeds {} bytes",
            MAX_NAME_BYTES
        )));
    }
    for label in folded.split('.') {
        if label.is_empty() {
            return Err(MeridianError::MalformedName("empty label".into()));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(MeridianError::MalformedName(format!(
                "label '{}' begins or ends with a hyphen",
                label
            )));
        }
        if !label.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-') {
            return Err(MeridianError::MalformedName(format!(
                "label '{}' contains characters outside [a-z0-9-]",
                label
            )));
        }
    }
    Ok(folded)
}
