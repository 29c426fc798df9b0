pub mod store;
pub mod tree;

pub use store::{KvStore, MemStore};
pub use tree::{MerkleTree, TreeKey};
