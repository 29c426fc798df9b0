pub mod address;
pub mod envelope;
pub mod packed;
pub mod rlp;

pub use address::{decode_id, encode_id, IdKind};
pub use envelope::{sign_tx, tx_hash, verify_tx};
pub use packed::packed;
pub use rlp::{
    decode_account, decode_data_tx, decode_signed_tx, encode_account, encode_data_tx,
    encode_signed_tx,
};
