pub mod account;
pub mod config;
pub mod constants;
pub mod error;
pub mod signed;
pub mod tx;
pub mod types;

pub use account::{Account, LockedCredit};
pub use config::{ChainConfig, FeeRole};
pub use constants::*;
pub use error::MeridianError;
pub use signed::SignedTx;
pub use tx::{
    normalize_name, CoinbasePayload, DataTx, FormatSpec, NameClaimPayload, NamePreClaimPayload,
    OracleExtendPayload, OracleQueryPayload, OracleRegisterPayload, OracleResponsePayload,
    SpendPayload, TxPayload,
};
pub use types::*;
