use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MINER_FEE_BYTES_PER_TOKEN, DEFAULT_MINIMUM_FEE, DEFAULT_NAME_SALT_SIZE,
    DEFAULT_POOL_FEE_BYTES_PER_TOKEN, DEFAULT_SIGN_MAX_SIZE, DEFAULT_SPEND_TX_VERSION,
};

/// Which admission policy a minimum-fee check is run under.
///
/// `Validation` is the consensus path: a confirmed block's transactions are
/// accepted at any fee. `Pool` and `Miner` are the stricter local policies
/// used before a transaction reaches a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeeRole {
    Pool,
    Miner,
    Validation,
}

/// Engine configuration, fixed at construction. No dynamic lookups: every
/// knob the validation path consults is enumerated here.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Maximum accepted signature size in bytes.
    pub sign_max_size: usize,
    /// Accepted SpendTx payload version.
    pub spend_tx_version: u64,
    /// Flat fee floor for pool/miner admission.
    pub minimum_fee: u64,
    /// Wire bytes per fee token under `FeeRole::Pool`.
    pub pool_fee_bytes_per_token: u64,
    /// Wire bytes per fee token under `FeeRole::Miner`.
    pub miner_fee_bytes_per_token: u64,
    /// Exact byte size of a name-claim salt.
    pub name_salt_size: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            sign_max_size: DEFAULT_SIGN_MAX_SIZE,
            spend_tx_version: DEFAULT_SPEND_TX_VERSION,
            minimum_fee: DEFAULT_MINIMUM_FEE,
            pool_fee_bytes_per_token: DEFAULT_POOL_FEE_BYTES_PER_TOKEN,
            miner_fee_bytes_per_token: DEFAULT_MINER_FEE_BYTES_PER_TOKEN,
            name_salt_size: DEFAULT_NAME_SALT_SIZE,
        }
    }
}

impl ChainConfig {
    /// Minimum fee for a transaction of `size_bytes` wire bytes under `role`.
    ///
    /// The consensus path accepts any fee; pool and miner admission require
    /// the flat floor plus a size-proportional component.
    pub fn min_fee(&self, size_bytes: usize, role: FeeRole) -> u64 {
        let per_token = match role {
            FeeRole::Pool => self.pool_fee_bytes_per_token,
            FeeRole::Miner => self.miner_fee_bytes_per_token,
            FeeRole::Validation => return 0,
        };
        self.minimum_fee + size_bytes as u64 / per_token.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_role_accepts_any_fee() {
        let config = ChainConfig::default();
        assert_eq!(config.min_fee(10_000, FeeRole::Validation), 0);
    }

    #[test]
    fn pool_fee_scales_with_size() {
        let config = ChainConfig::default();
        let small = config.min_fee(50, FeeRole::Pool);
        let large = config.min_fee(5_000, FeeRole::Pool);
        assert_eq!(small, config.minimum_fee);
        assert_eq!(large, config.minimum_fee + 50);
    }
}
