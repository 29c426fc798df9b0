//! The chain-state transition engine.
//!
//! One dispatch site folds a block's transactions through signature
//! verification, per-kind preconditions and effects, then sweeps expired
//! oracle objects and hands back the committed snapshot. Preconditions run
//! in a frozen order — spendable balance, then nonce, then the kind's state
//! references — and the first failure wins. A rejected transaction leaves
//! the threaded snapshot exactly as it was before that transaction.

use tracing::{debug, info, warn};

use meridian_core::account::Account;
use meridian_core::config::ChainConfig;
use meridian_core::error::MeridianError;
use meridian_core::signed::SignedTx;
use meridian_core::tx::{
    normalize_name, CoinbasePayload, DataTx, NameClaimPayload, NamePreClaimPayload,
    OracleExtendPayload, OracleQueryPayload, OracleRegisterPayload, OracleResponsePayload,
    SpendPayload, TxPayload,
};
use meridian_core::types::{Balance, Height, PublicKey, QueryId, TtlType};
use meridian_crypto::{commitment_hash, namehash, query_id};
use meridian_encoding::envelope::verify_tx;

use crate::records::{NameClaimRecord, NameCommitment, OracleInteraction, RegisteredOracle};
use crate::snapshot::ChainState;

/// The state transition engine. Holds the enumerated protocol configuration;
/// all state flows through the call arguments as immutable snapshots.
pub struct StateEngine {
    config: ChainConfig,
}

impl StateEngine {
    pub fn new(config: ChainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    // ── Block application ─────────────────────────────────────────────────────

    /// Apply `txs` in order at `height`. The first failure aborts the whole
    /// block as `InvalidBlock`; on success the expiry sweeps run and the new
    /// snapshot is returned.
    pub fn apply_block(
        &self,
        state: &ChainState,
        height: Height,
        txs: &[SignedTx],
    ) -> Result<ChainState, MeridianError> {
        let mut current = state.clone();

        for (index, stx) in txs.iter().enumerate() {
            if stx.is_coinbase() && index != 0 {
                return Err(MeridianError::MalformedTx(
                    "coinbase must be the first transaction of a block".into(),
                )
                .into_invalid_block());
            }
            current = self
                .dispatch_apply(&current, height, stx)
                .map_err(MeridianError::into_invalid_block)?;
        }

        let current = self.expire_oracles(current, height)?;
        let current = self.expire_interactions(current, height)?;

        info!(
            height,
            tx_count = txs.len(),
            accounts_root = %hex::encode(current.accounts_root()),
            "applied block"
        );
        Ok(current)
    }

    /// Drop invalid transactions from a candidate list, threading the
    /// provisional state past every accepted transaction. Order-preserving;
    /// acceptance here implies acceptance in `apply_block` from the same
    /// starting snapshot.
    pub fn filter_valid(
        &self,
        state: &ChainState,
        height: Height,
        txs: Vec<SignedTx>,
    ) -> (ChainState, Vec<SignedTx>) {
        let mut current = state.clone();
        let mut accepted = Vec::new();

        for stx in txs {
            if stx.is_coinbase() && !accepted.is_empty() {
                warn!(kind = "coinbase", "dropping coinbase past the first position");
                continue;
            }
            match self.dispatch_apply(&current, height, &stx) {
                Ok(next) => {
                    current = next;
                    accepted.push(stx);
                }
                Err(error) => {
                    warn!(%error, kind = stx.data.payload.kind_name(), "dropping invalid transaction");
                }
            }
        }

        (current, accepted)
    }

    // ── Dispatch ─────────────────────────────────────────────────────────────

    /// Verify the envelope and apply one transaction. The single dispatch
    /// site for every payload kind.
    pub fn dispatch_apply(
        &self,
        state: &ChainState,
        height: Height,
        stx: &SignedTx,
    ) -> Result<ChainState, MeridianError> {
        verify_tx(stx, &self.config)?;
        let tx = &stx.data;
        match &tx.payload {
            TxPayload::Coinbase(p) => self.apply_coinbase(state, height, p),
            TxPayload::Spend(p) => self.apply_spend(state, height, tx, p),
            TxPayload::OracleRegister(p) => self.apply_oracle_register(state, height, tx, p),
            TxPayload::OracleQuery(p) => self.apply_oracle_query(state, height, tx, p),
            TxPayload::OracleResponse(p) => self.apply_oracle_response(state, height, tx, p),
            TxPayload::OracleExtend(p) => self.apply_oracle_extend(state, height, tx, p),
            TxPayload::NamePreClaim(p) => self.apply_name_preclaim(state, height, tx, p),
            TxPayload::NameClaim(p) => self.apply_name_claim(state, height, tx, p),
        }
    }

    /// Shared sender-side preconditions and debits, in the frozen order:
    /// spendable balance over `fee + outflow` first, then the nonce. Returns
    /// the sender key and the account with funds withdrawn and nonce bumped.
    fn withdraw_sender(
        &self,
        state: &ChainState,
        height: Height,
        tx: &DataTx,
        outflow: Balance,
    ) -> Result<(PublicKey, Account), MeridianError> {
        let sender_key = tx
            .sender
            .ok_or_else(|| MeridianError::MalformedTx("missing sender".into()))?;
        let account = state.get_account(&sender_key)?.unlock_matured(height);

        let need = tx
            .fee
            .checked_add(outflow)
            .ok_or_else(|| MeridianError::MalformedTx("fee plus amount overflows".into()))?;
        if account.balance < need {
            return Err(MeridianError::InsufficientBalance { need, have: account.balance });
        }
        if tx.nonce <= account.nonce {
            return Err(MeridianError::NonceOutOfOrder { current: account.nonce, got: tx.nonce });
        }

        let account = account.debit(need)?.bump_nonce(tx.nonce)?;
        Ok((sender_key, account))
    }

    // ── Spend / Coinbase ─────────────────────────────────────────────────────

    fn apply_spend(
        &self,
        state: &ChainState,
        height: Height,
        tx: &DataTx,
        p: &SpendPayload,
    ) -> Result<ChainState, MeridianError> {
        let (sender_key, sender) = self.withdraw_sender(state, height, tx, p.amount)?;

        let mut next = state.clone();
        next.put_account(&sender_key, &sender);
        // Re-read through the updated snapshot so sender == receiver nets to
        // a pure fee burn.
        let receiver = next.get_account(&p.receiver)?.unlock_matured(height).credit(p.amount)?;
        next.put_account(&p.receiver, &receiver);
        Ok(next)
    }

    fn apply_coinbase(
        &self,
        state: &ChainState,
        height: Height,
        p: &CoinbasePayload,
    ) -> Result<ChainState, MeridianError> {
        if p.height != height {
            return Err(MeridianError::MalformedTx(format!(
                "coinbase height {} does not match block height {}",
                p.height, height
            )));
        }
        let mut next = state.clone();
        let miner = p.reward(next.get_account(&p.receiver)?.unlock_matured(height))?;
        next.put_account(&p.receiver, &miner);
        Ok(next)
    }

    // ── Oracles ──────────────────────────────────────────────────────────────

    fn apply_oracle_register(
        &self,
        state: &ChainState,
        height: Height,
        tx: &DataTx,
        p: &OracleRegisterPayload,
    ) -> Result<ChainState, MeridianError> {
        let (sender_key, sender) = self.withdraw_sender(state, height, tx, 0)?;

        if state.get_oracle(&sender_key)?.is_some() {
            return Err(MeridianError::OracleStateConflict("oracle already registered".into()));
        }
        let expires_at = p.ttl.resolve(height);
        if expires_at <= height {
            return Err(MeridianError::MalformedTx("oracle ttl already expired".into()));
        }

        let mut next = state.clone();
        next.put_account(&sender_key, &sender);
        next.put_oracle(&RegisteredOracle {
            owner: sender_key,
            query_format: p.query_format,
            response_format: p.response_format,
            query_fee: p.query_fee,
            expires_at,
        });
        Ok(next)
    }

    fn apply_oracle_query(
        &self,
        state: &ChainState,
        height: Height,
        tx: &DataTx,
        p: &OracleQueryPayload,
    ) -> Result<ChainState, MeridianError> {
        let (sender_key, sender) = self.withdraw_sender(state, height, tx, p.query_fee)?;

        let oracle = state.get_oracle(&p.oracle)?.ok_or(MeridianError::UnknownOracle)?;
        if oracle.expires_at < height {
            return Err(MeridianError::UnknownOracle);
        }
        if p.query_fee < oracle.query_fee {
            return Err(MeridianError::OracleStateConflict(format!(
                "offered query fee {} below the oracle's fee {}",
                p.query_fee, oracle.query_fee
            )));
        }
        if !oracle.query_format.conforms(&p.query_data) {
            return Err(MeridianError::SchemaMismatch(
                "query data does not conform to the oracle's query format".into(),
            ));
        }

        let id = query_id(&sender_key, tx.nonce, &p.oracle);
        if state.get_interaction(&id)?.is_some() {
            return Err(MeridianError::OracleStateConflict("query id already exists".into()));
        }

        let query_expires_at = p.query_ttl.resolve(height);
        if query_expires_at <= height {
            return Err(MeridianError::MalformedTx("query ttl already expired".into()));
        }
        let response_expires_at = match p.response_ttl.ttl_type {
            TtlType::Absolute => p.response_ttl.value,
            TtlType::Relative => query_expires_at.saturating_add(p.response_ttl.value),
        };
        if response_expires_at < query_expires_at {
            return Err(MeridianError::MalformedTx("response ttl ends before the query ttl".into()));
        }

        let mut next = state.clone();
        next.put_account(&sender_key, &sender);
        next.put_interaction(
            &id,
            &OracleInteraction {
                querier: sender_key,
                oracle: p.oracle,
                query_data: p.query_data.clone(),
                query_fee: p.query_fee,
                response: None,
                query_expires_at,
                response_expires_at,
            },
        );
        Ok(next)
    }

    fn apply_oracle_response(
        &self,
        state: &ChainState,
        height: Height,
        tx: &DataTx,
        p: &OracleResponsePayload,
    ) -> Result<ChainState, MeridianError> {
        let (sender_key, sender) = self.withdraw_sender(state, height, tx, 0)?;

        let mut interaction = state
            .get_interaction(&p.query_id)?
            .ok_or_else(|| MeridianError::OracleStateConflict("unknown query id".into()))?;
        if interaction.is_answered() {
            return Err(MeridianError::OracleStateConflict("query already answered".into()));
        }
        if interaction.oracle != sender_key {
            return Err(MeridianError::OracleStateConflict(
                "response sent by a different oracle".into(),
            ));
        }
        if interaction.query_expires_at < height {
            return Err(MeridianError::OracleStateConflict("query has expired".into()));
        }
        let oracle = state.get_oracle(&sender_key)?.ok_or(MeridianError::UnknownOracle)?;
        if !oracle.response_format.conforms(&p.response_data) {
            return Err(MeridianError::SchemaMismatch(
                "response data does not conform to the oracle's response format".into(),
            ));
        }

        // Answering releases the escrowed query fee to the oracle.
        let sender = sender.credit(interaction.query_fee)?;
        interaction.response = Some(p.response_data.clone());

        let mut next = state.clone();
        next.put_account(&sender_key, &sender);
        next.put_interaction(&p.query_id, &interaction);
        Ok(next)
    }

    fn apply_oracle_extend(
        &self,
        state: &ChainState,
        height: Height,
        tx: &DataTx,
        p: &OracleExtendPayload,
    ) -> Result<ChainState, MeridianError> {
        let (sender_key, sender) = self.withdraw_sender(state, height, tx, 0)?;

        let mut oracle = state.get_oracle(&sender_key)?.ok_or(MeridianError::UnknownOracle)?;
        let new_expiry = match p.ttl.ttl_type {
            TtlType::Absolute => p.ttl.value,
            TtlType::Relative => oracle.expires_at.saturating_add(p.ttl.value),
        };
        if new_expiry <= oracle.expires_at {
            return Err(MeridianError::OracleStateConflict(
                "ttl does not extend the current expiry".into(),
            ));
        }
        oracle.expires_at = new_expiry;

        let mut next = state.clone();
        next.put_account(&sender_key, &sender);
        next.put_oracle(&oracle);
        Ok(next)
    }

    // ── Naming ───────────────────────────────────────────────────────────────

    fn apply_name_preclaim(
        &self,
        state: &ChainState,
        height: Height,
        tx: &DataTx,
        p: &NamePreClaimPayload,
    ) -> Result<ChainState, MeridianError> {
        let (sender_key, sender) = self.withdraw_sender(state, height, tx, 0)?;

        if state.get_commitment(&p.commitment)?.is_some() {
            return Err(MeridianError::MalformedTx("commitment already exists".into()));
        }

        let mut next = state.clone();
        next.put_account(&sender_key, &sender);
        next.put_commitment(&p.commitment, &NameCommitment { owner: sender_key, created_at: height });
        Ok(next)
    }

    fn apply_name_claim(
        &self,
        state: &ChainState,
        height: Height,
        tx: &DataTx,
        p: &NameClaimPayload,
    ) -> Result<ChainState, MeridianError> {
        let (sender_key, sender) = self.withdraw_sender(state, height, tx, 0)?;

        let name = normalize_name(&p.name)?;
        let commitment = commitment_hash(&name, &p.name_salt);
        // Existence before ownership: an absent commitment must surface as
        // UnknownPreClaim, never as an ownership failure.
        let record = state.get_commitment(&commitment)?.ok_or(MeridianError::UnknownPreClaim)?;
        if record.owner != sender_key {
            return Err(MeridianError::WrongPreClaimOwner);
        }
        let hash = namehash(&name);
        if state.get_claim(&hash)?.is_some() {
            return Err(MeridianError::NameAlreadyClaimed);
        }

        let mut next = state.clone();
        next.put_account(&sender_key, &sender);
        next.delete_commitment(&commitment);
        next.put_claim(&hash, &NameClaimRecord { name, owner: sender_key, claim_height: height });
        Ok(next)
    }

    // ── Expiry sweeps ────────────────────────────────────────────────────────

    /// Remove registered oracles whose expiry lies before `height`.
    /// Idempotent at a fixed height.
    pub fn expire_oracles(
        &self,
        state: ChainState,
        height: Height,
    ) -> Result<ChainState, MeridianError> {
        let expired = state.oracles.registered.fold(
            Ok(Vec::new()),
            &mut |acc: Result<Vec<PublicKey>, MeridianError>, key, value| {
                let mut expired = acc?;
                let record = RegisteredOracle::decode(value)?;
                if record.expires_at < height {
                    expired.push(PublicKey::from_bytes(*key));
                }
                Ok(expired)
            },
        )?;

        let mut next = state;
        for key in &expired {
            next.delete_oracle(key);
        }
        if !expired.is_empty() {
            debug!(height, count = expired.len(), "swept expired oracles");
        }
        Ok(next)
    }

    /// Remove interactions whose response expiry lies before `height`,
    /// refunding the escrowed query fee when no response ever arrived.
    /// Idempotent at a fixed height.
    pub fn expire_interactions(
        &self,
        state: ChainState,
        height: Height,
    ) -> Result<ChainState, MeridianError> {
        let expired = state.oracles.interactions.fold(
            Ok(Vec::new()),
            &mut |acc: Result<Vec<(QueryId, OracleInteraction)>, MeridianError>, key, value| {
                let mut expired = acc?;
                let record = OracleInteraction::decode(value)?;
                if record.response_expires_at < height {
                    expired.push((QueryId::from_bytes(*key), record));
                }
                Ok(expired)
            },
        )?;

        let mut next = state;
        for (id, record) in &expired {
            if !record.is_answered() && record.query_fee > 0 {
                let querier = next
                    .get_account(&record.querier)?
                    .unlock_matured(height)
                    .credit(record.query_fee)?;
                next.put_account(&record.querier, &querier);
            }
            next.delete_interaction(id);
        }
        if !expired.is_empty() {
            debug!(height, count = expired.len(), "swept expired interactions");
        }
        Ok(next)
    }
}
