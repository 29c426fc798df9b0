//! The on-chain account record and its pure state-update primitives.
//!
//! Accounts are created lazily on first credit (a trie miss is the default
//! account) and never destroyed. Every primitive consumes the account and
//! returns the updated value; fallible primitives return the untouched
//! invariant violation as a structured error.

use serde::{Deserialize, Serialize};

use crate::error::MeridianError;
use crate::types::{Balance, Height, Nonce};

/// A balance portion unavailable until `height` is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedCredit {
    pub height: Height,
    pub amount: Balance,
}

/// Full account state as stored in the accounts trie, keyed by the owner's
/// public key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: Balance,
    pub nonce: Nonce,
    /// Pending locked credits, sorted by maturity height.
    pub locked: Vec<LockedCredit>,
}

impl Account {
    /// Add `amount` to the spendable balance.
    pub fn credit(mut self, amount: Balance) -> Result<Self, MeridianError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| MeridianError::MalformedTx("balance overflow".into()))?;
        Ok(self)
    }

    /// Remove `amount` from the spendable balance.
    pub fn debit(self, amount: Balance) -> Result<Self, MeridianError> {
        if amount > self.balance {
            return Err(MeridianError::InsufficientBalance {
                need: amount,
                have: self.balance,
            });
        }
        Ok(Self { balance: self.balance - amount, ..self })
    }

    /// Advance the account nonce to `new_nonce`. Nonces only increase.
    pub fn bump_nonce(mut self, new_nonce: Nonce) -> Result<Self, MeridianError> {
        if new_nonce <= self.nonce {
            return Err(MeridianError::NonceOutOfOrder {
                current: self.nonce,
                got: new_nonce,
            });
        }
        self.nonce = new_nonce;
        Ok(self)
    }

    /// Schedule `amount` to become spendable at `height`.
    pub fn credit_locked(mut self, height: Height, amount: Balance) -> Self {
        let at = self
            .locked
            .iter()
            .position(|lc| lc.height > height)
            .unwrap_or(self.locked.len());
        self.locked.insert(at, LockedCredit { height, amount });
        self
    }

    /// Move every matured locked credit (maturity ≤ `current_height`) into
    /// the spendable balance. Idempotent at a fixed height.
    pub fn unlock_matured(mut self, current_height: Height) -> Self {
        let split = self
            .locked
            .iter()
            .position(|lc| lc.height > current_height)
            .unwrap_or(self.locked.len());
        let matured: Balance = self.locked.drain(..split).map(|lc| lc.amount).sum();
        self.balance = self.balance.saturating_add(matured);
        self
    }

    /// Total of balance and all pending locked credits.
    pub fn total_funds(&self) -> Balance {
        self.locked
            .iter()
            .fold(self.balance, |acc, lc| acc.saturating_add(lc.amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_then_debit() {
        let acc = Account::default().credit(100).unwrap().debit(40).unwrap();
        assert_eq!(acc.balance, 60);
    }

    #[test]
    fn overdraft_rejected() {
        let acc = Account::default().credit(10).unwrap();
        let err = acc.debit(11).unwrap_err();
        assert_eq!(err, MeridianError::InsufficientBalance { need: 11, have: 10 });
    }

    #[test]
    fn nonce_must_strictly_increase() {
        let acc = Account::default().bump_nonce(3).unwrap();
        assert_eq!(acc.nonce, 3);
        let err = acc.clone().bump_nonce(3).unwrap_err();
        assert_eq!(err, MeridianError::NonceOutOfOrder { current: 3, got: 3 });
        assert!(acc.bump_nonce(2).is_err());
    }

    #[test]
    fn locked_credits_mature_in_order() {
        let acc = Account::default()
            .credit_locked(20, 5)
            .credit_locked(10, 3)
            .credit_locked(30, 7);
        assert_eq!(acc.balance, 0);
        assert_eq!(acc.total_funds(), 15);

        let acc = acc.unlock_matured(20);
        assert_eq!(acc.balance, 8);
        assert_eq!(acc.locked, vec![LockedCredit { height: 30, amount: 7 }]);

        // Idempotent at the same height.
        let again = acc.clone().unlock_matured(20);
        assert_eq!(again, acc);
    }
}
