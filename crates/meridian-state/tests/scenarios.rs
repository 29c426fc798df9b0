//! End-to-end scenarios for the chain-state engine.
//!
//! Deterministic, literal flows: fixed seeds, fixed heights, exact balance
//! assertions. Each scenario builds its snapshot from scratch, applies one
//! or more blocks, and checks the resulting accounts and subtree records.

use meridian_core::account::Account;
use meridian_core::config::ChainConfig;
use meridian_core::error::MeridianError;
use meridian_core::signed::SignedTx;
use meridian_core::tx::{
    CoinbasePayload, DataTx, FormatSpec, NameClaimPayload, OracleQueryPayload,
    OracleRegisterPayload, OracleResponsePayload, SpendPayload, TxPayload,
};
use meridian_core::types::{Balance, Height, PublicKey, Ttl};
use meridian_crypto::{commitment_hash, namehash, query_id, KeyPair};
use meridian_encoding::envelope::sign_tx;
use meridian_state::records::NameCommitment;
use meridian_state::{ChainState, StateEngine};

const HEIGHT: Height = 7;

fn engine() -> StateEngine {
    StateEngine::new(ChainConfig::default())
}

fn seed_account(state: &mut ChainState, kp: &KeyPair, balance: Balance) {
    state.put_account(&kp.public_key, &Account::default().credit(balance).unwrap());
}

fn spend(kp: &KeyPair, receiver: PublicKey, amount: Balance, fee: Balance, nonce: u64) -> SignedTx {
    sign_tx(
        kp,
        DataTx {
            sender: Some(kp.public_key),
            fee,
            nonce,
            payload: TxPayload::Spend(SpendPayload { receiver, amount, version: 1 }),
        },
    )
    .unwrap()
}

fn coinbase(receiver: PublicKey, amount: Balance, height: Height) -> SignedTx {
    SignedTx::unsigned(DataTx {
        sender: None,
        fee: 0,
        nonce: 0,
        payload: TxPayload::Coinbase(CoinbasePayload { receiver, amount, height }),
    })
}

// ── Scenario 1: spend accepted ───────────────────────────────────────────────

#[test]
fn spend_accepted() {
    let engine = engine();
    let a = KeyPair::from_seed([1u8; 32]);
    let b = KeyPair::from_seed([2u8; 32]);
    let mut state = ChainState::new();
    seed_account(&mut state, &a, 100);
    seed_account(&mut state, &b, 0);

    let block = vec![spend(&a, b.public_key, 40, 1, 1)];
    let next = engine.apply_block(&state, HEIGHT, &block).unwrap();

    let a_account = next.get_account(&a.public_key).unwrap();
    let b_account = next.get_account(&b.public_key).unwrap();
    assert_eq!((a_account.balance, a_account.nonce), (59, 1));
    assert_eq!((b_account.balance, b_account.nonce), (40, 0));

    // The committed root is reproducible run-to-run.
    let replay = engine.apply_block(&state, HEIGHT, &block).unwrap();
    assert_eq!(replay.accounts_root(), next.accounts_root());
    assert_eq!(replay.state_root(), next.state_root());
}

// ── Scenario 2: insufficient balance ─────────────────────────────────────────

#[test]
fn spend_insufficient_balance() {
    let engine = engine();
    let a = KeyPair::from_seed([1u8; 32]);
    let b = KeyPair::from_seed([2u8; 32]);
    let mut state = ChainState::new();
    seed_account(&mut state, &a, 100);
    seed_account(&mut state, &b, 0);

    let overdraft = spend(&a, b.public_key, 200, 1, 1);

    let err = engine.apply_block(&state, HEIGHT, &[overdraft.clone()]).unwrap_err();
    match err {
        MeridianError::InvalidBlock(inner) => {
            assert_eq!(*inner, MeridianError::InsufficientBalance { need: 201, have: 100 });
        }
        other => panic!("expected InvalidBlock, got {other:?}"),
    }

    // filter_valid drops the transaction and leaves the state untouched.
    let (filtered_state, accepted) = engine.filter_valid(&state, HEIGHT, vec![overdraft]);
    assert!(accepted.is_empty());
    assert_eq!(filtered_state.accounts_root(), state.accounts_root());
}

// ── Scenario 3: replay rejected ──────────────────────────────────────────────

#[test]
fn replay_rejected() {
    let engine = engine();
    let a = KeyPair::from_seed([1u8; 32]);
    let b = KeyPair::from_seed([2u8; 32]);
    let mut state = ChainState::new();
    seed_account(&mut state, &a, 100);

    let tx = spend(&a, b.public_key, 40, 1, 1);
    let after = engine.apply_block(&state, HEIGHT, &[tx.clone()]).unwrap();

    let err = engine.apply_block(&after, HEIGHT + 1, &[tx]).unwrap_err();
    match err {
        MeridianError::InvalidBlock(inner) => {
            assert_eq!(*inner, MeridianError::NonceOutOfOrder { current: 1, got: 1 });
        }
        other => panic!("expected InvalidBlock, got {other:?}"),
    }
}

// ── Scenario 4: coinbase ─────────────────────────────────────────────────────

#[test]
fn coinbase_mints_the_reward() {
    let engine = engine();
    let miner = KeyPair::from_seed([3u8; 32]);
    let state = ChainState::new();

    let supply_before = state.total_account_funds().unwrap();
    let next = engine
        .apply_block(&state, HEIGHT, &[coinbase(miner.public_key, 10, HEIGHT)])
        .unwrap();

    let account = next.get_account(&miner.public_key).unwrap();
    assert_eq!((account.balance, account.nonce), (10, 0));
    assert_eq!(next.total_account_funds().unwrap(), supply_before + 10);
}

// ── Scenario 5: name claim happy path ────────────────────────────────────────

#[test]
fn name_claim_happy_path() {
    let engine = engine();
    let a = KeyPair::from_seed([1u8; 32]);
    let mut state = ChainState::new();
    seed_account(&mut state, &a, 10);

    let salt = vec![5u8; 32];
    let commitment = commitment_hash("alice", &salt);
    state.put_commitment(&commitment, &NameCommitment { owner: a.public_key, created_at: 1 });

    let claim = sign_tx(
        &a,
        DataTx {
            sender: Some(a.public_key),
            fee: 1,
            nonce: 1,
            payload: TxPayload::NameClaim(NameClaimPayload {
                name: "alice".into(),
                name_salt: salt,
            }),
        },
    )
    .unwrap();
    let next = engine.apply_block(&state, HEIGHT, &[claim]).unwrap();

    assert!(next.get_commitment(&commitment).unwrap().is_none());
    let record = next.get_claim(&namehash("alice")).unwrap().unwrap();
    assert_eq!(record.owner, a.public_key);
    assert_eq!(record.claim_height, HEIGHT);

    let account = next.get_account(&a.public_key).unwrap();
    assert_eq!((account.balance, account.nonce), (9, 1));
}

// ── Scenario 6: oracle query/response cycle ──────────────────────────────────

#[test]
fn oracle_query_response_cycle() {
    let engine = engine();
    let o = KeyPair::from_seed([4u8; 32]);
    let a = KeyPair::from_seed([1u8; 32]);
    let mut state = ChainState::new();
    seed_account(&mut state, &o, 50);
    seed_account(&mut state, &a, 50);

    let register = sign_tx(
        &o,
        DataTx {
            sender: Some(o.public_key),
            fee: 1,
            nonce: 1,
            payload: TxPayload::OracleRegister(OracleRegisterPayload {
                query_format: FormatSpec::Utf8,
                response_format: FormatSpec::Utf8,
                query_fee: 2,
                ttl: Ttl::relative(100),
            }),
        },
    )
    .unwrap();
    let query = sign_tx(
        &a,
        DataTx {
            sender: Some(a.public_key),
            fee: 1,
            nonce: 1,
            payload: TxPayload::OracleQuery(OracleQueryPayload {
                oracle: o.public_key,
                query_data: b"tomorrow's weather".to_vec(),
                query_fee: 2,
                query_ttl: Ttl::relative(20),
                response_ttl: Ttl::relative(20),
            }),
        },
    )
    .unwrap();
    let state = engine.apply_block(&state, HEIGHT, &[register, query]).unwrap();

    let id = query_id(&a.public_key, 1, &o.public_key);
    assert!(!state.get_interaction(&id).unwrap().unwrap().is_answered());

    let response = |nonce| {
        sign_tx(
            &o,
            DataTx {
                sender: Some(o.public_key),
                fee: 1,
                nonce,
                payload: TxPayload::OracleResponse(OracleResponsePayload {
                    query_id: id,
                    response_data: b"sunny".to_vec(),
                }),
            },
        )
        .unwrap()
    };

    let state = engine.apply_block(&state, HEIGHT + 1, &[response(2)]).unwrap();
    let interaction = state.get_interaction(&id).unwrap().unwrap();
    assert_eq!(interaction.response.as_deref(), Some(&b"sunny"[..]));

    let err = engine.apply_block(&state, HEIGHT + 2, &[response(3)]).unwrap_err();
    match err {
        MeridianError::InvalidBlock(inner) => {
            assert!(matches!(*inner, MeridianError::OracleStateConflict(_)));
        }
        other => panic!("expected InvalidBlock, got {other:?}"),
    }
}

// ── Invariants ───────────────────────────────────────────────────────────────

#[test]
fn conservation_without_coinbase() {
    let engine = engine();
    let a = KeyPair::from_seed([1u8; 32]);
    let b = KeyPair::from_seed([2u8; 32]);
    let c = KeyPair::from_seed([3u8; 32]);
    let mut state = ChainState::new();
    seed_account(&mut state, &a, 70);
    seed_account(&mut state, &b, 30);

    let supply_before = state.total_account_funds().unwrap();
    let block = vec![
        spend(&a, b.public_key, 25, 0, 1),
        spend(&b, c.public_key, 55, 0, 1),
        spend(&c, a.public_key, 5, 0, 1),
    ];
    let next = engine.apply_block(&state, HEIGHT, &block).unwrap();
    assert_eq!(next.total_account_funds().unwrap(), supply_before);
}

#[test]
fn conservation_with_coinbase_grows_by_the_reward() {
    let engine = engine();
    let a = KeyPair::from_seed([1u8; 32]);
    let miner = KeyPair::from_seed([3u8; 32]);
    let mut state = ChainState::new();
    seed_account(&mut state, &a, 70);

    let supply_before = state.total_account_funds().unwrap();
    let block = vec![
        coinbase(miner.public_key, 25, HEIGHT),
        spend(&a, miner.public_key, 10, 0, 1),
    ];
    let next = engine.apply_block(&state, HEIGHT, &block).unwrap();
    assert_eq!(next.total_account_funds().unwrap(), supply_before + 25);
}

#[test]
fn conservation_holds_through_query_fee_escrow() {
    let engine = engine();
    let o = KeyPair::from_seed([4u8; 32]);
    let a = KeyPair::from_seed([1u8; 32]);
    let mut state = ChainState::new();
    seed_account(&mut state, &o, 50);
    seed_account(&mut state, &a, 50);

    let supply = |state: &ChainState| {
        state.total_account_funds().unwrap() + state.escrowed_query_fees().unwrap()
    };
    let supply_before = supply(&state);

    let register = sign_tx(
        &o,
        DataTx {
            sender: Some(o.public_key),
            fee: 0,
            nonce: 1,
            payload: TxPayload::OracleRegister(OracleRegisterPayload {
                query_format: FormatSpec::Utf8,
                response_format: FormatSpec::Utf8,
                query_fee: 5,
                ttl: Ttl::relative(100),
            }),
        },
    )
    .unwrap();
    let query = sign_tx(
        &a,
        DataTx {
            sender: Some(a.public_key),
            fee: 0,
            nonce: 1,
            payload: TxPayload::OracleQuery(OracleQueryPayload {
                oracle: o.public_key,
                query_data: b"height of the tide".to_vec(),
                query_fee: 5,
                query_ttl: Ttl::relative(3),
                response_ttl: Ttl::relative(3),
            }),
        },
    )
    .unwrap();
    let state = engine.apply_block(&state, HEIGHT, &[register, query]).unwrap();

    // The query fee left the querier's account but sits in escrow.
    assert_eq!(state.get_account(&a.public_key).unwrap().balance, 45);
    assert_eq!(state.escrowed_query_fees().unwrap(), 5);
    assert_eq!(supply(&state), supply_before);

    // The interaction expires unanswered; the escrow drains back to the
    // querier and the combined supply still holds.
    let expired = engine.apply_block(&state, HEIGHT + 100, &[]).unwrap();
    assert_eq!(expired.escrowed_query_fees().unwrap(), 0);
    assert_eq!(expired.get_account(&a.public_key).unwrap().balance, 50);
    assert_eq!(supply(&expired), supply_before);
}

#[test]
fn filter_output_always_applies() {
    let engine = engine();
    let a = KeyPair::from_seed([1u8; 32]);
    let b = KeyPair::from_seed([2u8; 32]);
    let mallory = KeyPair::from_seed([9u8; 32]);
    let mut state = ChainState::new();
    seed_account(&mut state, &a, 100);

    // A forged signature over someone else's account.
    let mut forged = spend(&a, mallory.public_key, 10, 1, 1);
    forged.signature = Some(mallory.sign(b"forged"));

    let candidates = vec![
        spend(&a, b.public_key, 10, 1, 1),
        forged,
        spend(&a, b.public_key, 500, 1, 2), // overdraft
        spend(&a, b.public_key, 20, 1, 2),
        spend(&a, b.public_key, 30, 1, 2), // replayed nonce
    ];

    let (filtered_state, accepted) = engine.filter_valid(&state, HEIGHT, candidates);
    assert_eq!(accepted.len(), 2);

    let applied = engine.apply_block(&state, HEIGHT, &accepted).unwrap();
    assert_eq!(applied.accounts_root(), filtered_state.accounts_root());
}

#[test]
fn nonces_never_regress() {
    let engine = engine();
    let a = KeyPair::from_seed([1u8; 32]);
    let b = KeyPair::from_seed([2u8; 32]);
    let mut state = ChainState::new();
    seed_account(&mut state, &a, 100);
    seed_account(&mut state, &b, 100);

    let block = vec![spend(&a, b.public_key, 5, 0, 3), spend(&b, a.public_key, 5, 0, 8)];
    let next = engine.apply_block(&state, HEIGHT, &block).unwrap();

    assert_eq!(next.get_account(&a.public_key).unwrap().nonce, 3);
    assert_eq!(next.get_account(&b.public_key).unwrap().nonce, 8);
}

#[test]
fn accounts_root_is_insertion_order_independent() {
    let keys: Vec<KeyPair> = (1..=6u8).map(|i| KeyPair::from_seed([i; 32])).collect();

    let mut forward = ChainState::new();
    for (i, kp) in keys.iter().enumerate() {
        seed_account(&mut forward, kp, (i as u64 + 1) * 10);
    }

    let mut backward = ChainState::new();
    for (i, kp) in keys.iter().enumerate().rev() {
        seed_account(&mut backward, kp, (i as u64 + 1) * 10);
    }

    assert_eq!(forward.accounts_root(), backward.accounts_root());
}
