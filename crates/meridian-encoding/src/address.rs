//! Human-facing identifier envelope.
//!
//! `<prefix>$<base58check(payload)>` where the two-letter prefix names the
//! artifact kind. The checksum is the 4-byte Base58Check trailer.

use meridian_core::error::MeridianError;

/// Artifact kinds carried by the address envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdKind {
    /// `ak` — account public key.
    Account,
    /// `tx` — transaction hash.
    TxHash,
    /// `bx` — block transactions root.
    TxsRoot,
    /// `sg` — detached signature.
    Signature,
    /// `bs` — chain-state root hash.
    StateRoot,
}

impl IdKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            IdKind::Account => "ak",
            IdKind::TxHash => "tx",
            IdKind::TxsRoot => "bx",
            IdKind::Signature => "sg",
            IdKind::StateRoot => "bs",
        }
    }
}

/// Render `payload` under the `kind` envelope.
pub fn encode_id(kind: IdKind, payload: &[u8]) -> String {
    format!("{}${}", kind.prefix(), bs58::encode(payload).with_check().into_string())
}

/// Parse an envelope of the expected `kind`, returning the raw payload.
pub fn decode_id(kind: IdKind, text: &str) -> Result<Vec<u8>, MeridianError> {
    let (prefix, body) = text.split_once('$').ok_or(MeridianError::MalformedEnvelope)?;
    if prefix != kind.prefix() {
        return Err(MeridianError::MalformedEnvelope);
    }
    bs58::decode(body)
        .with_check(None)
        .into_vec()
        .map_err(|_| MeridianError::MalformedEnvelope)
}
