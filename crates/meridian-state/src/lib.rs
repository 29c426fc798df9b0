pub mod engine;
pub mod records;
pub mod snapshot;

pub use engine::StateEngine;
pub use records::{NameClaimRecord, NameCommitment, OracleInteraction, RegisteredOracle};
pub use snapshot::{ChainState, NamingState, OracleState};
