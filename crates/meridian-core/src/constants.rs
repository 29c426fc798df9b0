//! ─── Meridian Protocol Constants ────────────────────────────────────────────
//!
//! Consensus-critical values: the RLP tag table, protocol versions, fee
//! parameters and the naming rules. Changing any of these forks the chain.

// ── RLP tag table ────────────────────────────────────────────────────────────
// One table shared by encode and decode.

pub const TAG_ACCOUNT: u8 = 10;
pub const TAG_SIGNED_TX: u8 = 11;
pub const TAG_SPEND_TX: u8 = 12;
pub const TAG_COINBASE_TX: u8 = 13;
pub const TAG_ORACLE_REGISTER_TX: u8 = 22;
pub const TAG_ORACLE_QUERY_TX: u8 = 23;
pub const TAG_ORACLE_RESPONSE_TX: u8 = 24;
pub const TAG_ORACLE_EXTEND_TX: u8 = 25;
pub const TAG_NAME_PRECLAIM_TX: u8 = 30;
pub const TAG_NAME_CLAIM_TX: u8 = 31;

/// Serialization version carried by every tagged object. Currently 1 for
/// every kind.
pub const OBJECT_VERSION: u64 = 1;

// ── Signatures ───────────────────────────────────────────────────────────────

/// Upper bound on detached signature size (Ed25519 signatures are exactly 64
/// bytes; anything longer is rejected at verification).
pub const DEFAULT_SIGN_MAX_SIZE: usize = 64;

// ── Transaction versions ─────────────────────────────────────────────────────

/// Accepted SpendTx payload version.
pub const DEFAULT_SPEND_TX_VERSION: u64 = 1;

// ── Fees ─────────────────────────────────────────────────────────────────────

/// Flat fee floor added to the size-proportional component.
pub const DEFAULT_MINIMUM_FEE: u64 = 1;

/// Wire bytes per fee token when judging a transaction for pool admission.
pub const DEFAULT_POOL_FEE_BYTES_PER_TOKEN: u64 = 100;

/// Wire bytes per fee token when judging a transaction for block inclusion.
pub const DEFAULT_MINER_FEE_BYTES_PER_TOKEN: u64 = 100;

// ── Naming ───────────────────────────────────────────────────────────────────

/// Exact byte size of a name-claim salt.
pub const DEFAULT_NAME_SALT_SIZE: usize = 32;

/// Maximum byte length of a normalized name.
pub const MAX_NAME_BYTES: usize = 253;

// ── Merkle tree ──────────────────────────────────────────────────────────────

/// Root hash of the empty state tree.
pub const EMPTY_TREE_ROOT: [u8; 32] = [0u8; 32];
