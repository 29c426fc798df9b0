//! Chain-state snapshots.
//!
//! A snapshot is five Merkle subtrees — accounts, name commitments, name
//! claims, the oracle registry, and its interactions — all keyed by 32-byte
//! identifiers. Snapshots are immutable values: a transition clones
//! the snapshot (cheap, structural sharing) and replaces whole subtrees.

use meridian_core::account::Account;
use meridian_core::error::MeridianError;
use meridian_core::types::{Balance, Commitment, NameHash, PublicKey, QueryId};
use meridian_encoding::rlp::{decode_account, encode_account};
use meridian_trie::MerkleTree;

use crate::records::{NameClaimRecord, NameCommitment, OracleInteraction, RegisteredOracle};

/// The naming registry: pending commitments and claimed names.
#[derive(Clone, Debug, Default)]
pub struct NamingState {
    pub commitments: MerkleTree,
    pub claims: MerkleTree,
}

/// The oracle subsystem: registered oracles and open interactions.
#[derive(Clone, Debug, Default)]
pub struct OracleState {
    pub registered: MerkleTree,
    pub interactions: MerkleTree,
}

#[derive(Clone, Debug, Default)]
pub struct ChainState {
    pub accounts: MerkleTree,
    pub naming: NamingState,
    pub oracles: OracleState,
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Accounts ─────────────────────────────────────────────────────────────

    /// Look up an account; a trie miss is the default (empty) account.
    pub fn get_account(&self, key: &PublicKey) -> Result<Account, MeridianError> {
        match self.accounts.get(key.as_bytes()) {
            Some(bytes) => decode_account(bytes),
            None => Ok(Account::default()),
        }
    }

    pub fn account_exists(&self, key: &PublicKey) -> bool {
        self.accounts.contains_key(key.as_bytes())
    }

    pub fn put_account(&mut self, key: &PublicKey, account: &Account) {
        self.accounts = self.accounts.insert(*key.as_bytes(), encode_account(account));
    }

    /// Root commitment over the serialized accounts; exposed in headers.
    pub fn accounts_root(&self) -> [u8; 32] {
        self.accounts.root_hash()
    }

    /// Combined commitment over every subtree.
    pub fn state_root(&self) -> [u8; 32] {
        let mut preimage = Vec::with_capacity(5 * 32);
        preimage.extend_from_slice(&self.accounts.root_hash());
        preimage.extend_from_slice(&self.naming.commitments.root_hash());
        preimage.extend_from_slice(&self.naming.claims.root_hash());
        preimage.extend_from_slice(&self.oracles.registered.root_hash());
        preimage.extend_from_slice(&self.oracles.interactions.root_hash());
        meridian_crypto::blake3_hash(&preimage)
    }

    /// Sum of every account's spendable and locked funds.
    pub fn total_account_funds(&self) -> Result<Balance, MeridianError> {
        self.accounts.fold(Ok(0u64), &mut |acc, _, bytes| {
            let total = acc?;
            let account = decode_account(bytes)?;
            Ok(total.saturating_add(account.total_funds()))
        })
    }

    /// Sum of query fees escrowed on unanswered interactions.
    pub fn escrowed_query_fees(&self) -> Result<Balance, MeridianError> {
        self.oracles.interactions.fold(Ok(0u64), &mut |acc, _, bytes| {
            let total = acc?;
            let interaction = OracleInteraction::decode(bytes)?;
            if interaction.is_answered() {
                Ok(total)
            } else {
                Ok(total.saturating_add(interaction.query_fee))
            }
        })
    }

    // ── Oracle registry ──────────────────────────────────────────────────────

    pub fn get_oracle(&self, key: &PublicKey) -> Result<Option<RegisteredOracle>, MeridianError> {
        self.oracles
            .registered
            .get(key.as_bytes())
            .map(RegisteredOracle::decode)
            .transpose()
    }

    pub fn put_oracle(&mut self, record: &RegisteredOracle) {
        self.oracles.registered =
            self.oracles.registered.insert(*record.owner.as_bytes(), record.encode());
    }

    pub fn delete_oracle(&mut self, key: &PublicKey) {
        self.oracles.registered = self.oracles.registered.delete(key.as_bytes());
    }

    // ── Oracle interactions ──────────────────────────────────────────────────

    pub fn get_interaction(&self, id: &QueryId) -> Result<Option<OracleInteraction>, MeridianError> {
        self.oracles
            .interactions
            .get(id.as_bytes())
            .map(OracleInteraction::decode)
            .transpose()
    }

    pub fn put_interaction(&mut self, id: &QueryId, record: &OracleInteraction) {
        self.oracles.interactions =
            self.oracles.interactions.insert(*id.as_bytes(), record.encode());
    }

    pub fn delete_interaction(&mut self, id: &QueryId) {
        self.oracles.interactions = self.oracles.interactions.delete(id.as_bytes());
    }

    // ── Naming ───────────────────────────────────────────────────────────────

    pub fn get_commitment(&self, key: &Commitment) -> Result<Option<NameCommitment>, MeridianError> {
        self.naming
            .commitments
            .get(key.as_bytes())
            .map(NameCommitment::decode)
            .transpose()
    }

    pub fn put_commitment(&mut self, key: &Commitment, record: &NameCommitment) {
        self.naming.commitments = self.naming.commitments.insert(*key.as_bytes(), record.encode());
    }

    pub fn delete_commitment(&mut self, key: &Commitment) {
        self.naming.commitments = self.naming.commitments.delete(key.as_bytes());
    }

    pub fn get_claim(&self, key: &NameHash) -> Result<Option<NameClaimRecord>, MeridianError> {
        self.naming.claims.get(key.as_bytes()).map(NameClaimRecord::decode).transpose()
    }

    pub fn put_claim(&mut self, key: &NameHash, record: &NameClaimRecord) {
        self.naming.claims = self.naming.claims.insert(*key.as_bytes(), record.encode());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::constants::EMPTY_TREE_ROOT;

    #[test]
    fn missing_account_is_the_default() {
        let state = ChainState::new();
        let account = state.get_account(&PublicKey::from_bytes([1u8; 32])).unwrap();
        assert_eq!(account, Account::default());
        assert!(!state.account_exists(&PublicKey::from_bytes([1u8; 32])));
    }

    #[test]
    fn empty_state_has_zero_roots() {
        let state = ChainState::new();
        assert_eq!(state.accounts_root(), EMPTY_TREE_ROOT);
    }

    #[test]
    fn put_account_round_trip_and_sharing() {
        let mut state = ChainState::new();
        let key = PublicKey::from_bytes([1u8; 32]);
        let account = Account::default().credit(100).unwrap();
        let before = state.clone();
        state.put_account(&key, &account);

        assert_eq!(state.get_account(&key).unwrap(), account);
        // The earlier snapshot is untouched.
        assert_eq!(before.accounts_root(), EMPTY_TREE_ROOT);
        assert_ne!(state.accounts_root(), EMPTY_TREE_ROOT);
    }

    #[test]
    fn supply_counts_balance_and_locks() {
        let mut state = ChainState::new();
        let a = PublicKey::from_bytes([1u8; 32]);
        let b = PublicKey::from_bytes([2u8; 32]);
        state.put_account(&a, &Account::default().credit(60).unwrap());
        state.put_account(&b, &Account::default().credit(30).unwrap().credit_locked(9, 10));
        assert_eq!(state.total_account_funds().unwrap(), 100);
    }
}
