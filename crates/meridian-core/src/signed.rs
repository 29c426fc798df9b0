use serde::{Deserialize, Serialize};

use crate::tx::DataTx;
use crate::types::TxSignature;

/// A transaction bound to its authorizing signature.
///
/// The signature covers the packed encoding of `data` (see
/// meridian-encoding); verification and hashing therefore live next to the
/// encoders, in `meridian_encoding::envelope`. Coinbase is the only kind
/// with `signature == None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    pub data: DataTx,
    pub signature: Option<TxSignature>,
}

impl SignedTx {
    /// Envelope for the unsigned Coinbase kind.
    pub fn unsigned(data: DataTx) -> Self {
        Self { data, signature: None }
    }

    pub fn is_coinbase(&self) -> bool {
        self.data.is_coinbase()
    }
}
