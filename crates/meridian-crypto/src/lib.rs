pub mod hash;
pub mod keypair;
pub mod signature;

pub use hash::{blake3_hash, commitment_hash, namehash, query_id, tx_hash_from_packed};
pub use keypair::KeyPair;
pub use signature::verify_signature;
