use meridian_core::types::{Commitment, NameHash, PublicKey, QueryId, TxHash};

/// Compute BLAKE3 hash of arbitrary bytes → 32-byte array.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Trie key of a claimed name: BLAKE3 of the normalized name.
pub fn namehash(normalized_name: &str) -> NameHash {
    NameHash::from_bytes(blake3_hash(normalized_name.as_bytes()))
}

/// Pre-claim commitment: BLAKE3(name ‖ salt) over the normalized name.
pub fn commitment_hash(normalized_name: &str, salt: &[u8]) -> Commitment {
    let mut h = blake3::Hasher::new();
    h.update(normalized_name.as_bytes());
    h.update(salt);
    Commitment::from_bytes(*h.finalize().as_bytes())
}

/// Derived key of an oracle interaction: BLAKE3(sender ‖ nonce_be ‖ oracle).
/// Deterministic, so a querier cannot open two interactions from one nonce.
pub fn query_id(sender: &PublicKey, nonce: u64, oracle: &PublicKey) -> QueryId {
    let mut h = blake3::Hasher::new();
    h.update(sender.as_bytes());
    h.update(&nonce.to_be_bytes());
    h.update(oracle.as_bytes());
    QueryId::from_bytes(*h.finalize().as_bytes())
}

/// Transaction identity: BLAKE3 of the packed inner transaction bytes.
pub fn tx_hash_from_packed(packed: &[u8]) -> TxHash {
    TxHash::from_bytes(blake3_hash(packed))
}
