use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeridianError {
    // ── Signature / envelope errors ──────────────────────────────────────────
    #[error("invalid signature")]
    InvalidSignature,

    #[error("malformed transaction: {0}")]
    MalformedTx(String),

    // ── Account errors ───────────────────────────────────────────────────────
    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: u64, have: u64 },

    #[error("nonce out of order: got {got}, account nonce is {current}")]
    NonceOutOfOrder { current: u64, got: u64 },

    // ── Oracle errors ────────────────────────────────────────────────────────
    #[error("unknown oracle")]
    UnknownOracle,

    #[error("oracle state conflict: {0}")]
    OracleStateConflict(String),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    // ── Naming errors ────────────────────────────────────────────────────────
    #[error("unknown pre-claim commitment")]
    UnknownPreClaim,

    #[error("pre-claim commitment owned by another account")]
    WrongPreClaimOwner,

    #[error("name already claimed")]
    NameAlreadyClaimed,

    #[error("malformed name: {0}")]
    MalformedName(String),

    // ── Encoding / storage ───────────────────────────────────────────────────
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("malformed address envelope")]
    MalformedEnvelope,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    // ── Block-level escalation ───────────────────────────────────────────────
    #[error("invalid block: {0}")]
    InvalidBlock(Box<MeridianError>),
}

impl MeridianError {
    /// Wrap a per-transaction failure as a block-level rejection.
    pub fn into_invalid_block(self) -> Self {
        MeridianError::InvalidBlock(Box::new(self))
    }
}
