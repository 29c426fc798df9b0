//! RLP wire encoding.
//!
//! Every tagged object encodes as the list `[tag, version, field₁, …]` with
//! the same frozen field order as the packed encoding. The tag table lives
//! in `meridian_core::constants` and is shared by encode and decode, so the
//! two directions cannot drift apart. Decoding is strict: unknown tags,
//! version mismatches, short reads and trailing bytes are all rejected.

use alloy_rlp::{Decodable, Encodable, Header};
use bytes::Bytes;

use meridian_core::account::{Account, LockedCredit};
use meridian_core::constants::{
    OBJECT_VERSION, TAG_ACCOUNT, TAG_COINBASE_TX, TAG_NAME_CLAIM_TX, TAG_NAME_PRECLAIM_TX,
    TAG_ORACLE_EXTEND_TX, TAG_ORACLE_QUERY_TX, TAG_ORACLE_REGISTER_TX, TAG_ORACLE_RESPONSE_TX,
    TAG_SIGNED_TX, TAG_SPEND_TX,
};
use meridian_core::error::MeridianError;
use meridian_core::signed::SignedTx;
use meridian_core::tx::{
    CoinbasePayload, DataTx, FormatSpec, NameClaimPayload, NamePreClaimPayload,
    OracleExtendPayload, OracleQueryPayload, OracleRegisterPayload, OracleResponsePayload,
    SpendPayload, TxPayload,
};
use meridian_core::types::{Commitment, PublicKey, QueryId, Ttl, TtlType, TxSignature};

fn rlp_err(e: alloy_rlp::Error) -> MeridianError {
    MeridianError::Encoding(e.to_string())
}

// ── Field helpers ────────────────────────────────────────────────────────────

fn decode_u64(buf: &mut &[u8]) -> Result<u64, MeridianError> {
    u64::decode(buf).map_err(rlp_err)
}

fn decode_key(buf: &mut &[u8]) -> Result<PublicKey, MeridianError> {
    Ok(PublicKey::from_bytes(<[u8; 32]>::decode(buf).map_err(rlp_err)?))
}

fn decode_bytes(buf: &mut &[u8]) -> Result<Vec<u8>, MeridianError> {
    Ok(Bytes::decode(buf).map_err(rlp_err)?.to_vec())
}

fn encode_ttl(ttl: &Ttl, out: &mut Vec<u8>) {
    (ttl.ttl_type.as_octet() as u64).encode(out);
    ttl.value.encode(out);
}

fn decode_ttl(buf: &mut &[u8]) -> Result<Ttl, MeridianError> {
    let octet = decode_u64(buf)?;
    let ttl_type = u8::try_from(octet)
        .ok()
        .and_then(TtlType::from_octet)
        .ok_or_else(|| MeridianError::Encoding(format!("unknown ttl type {octet}")))?;
    Ok(Ttl { ttl_type, value: decode_u64(buf)? })
}

fn encode_format(format: &FormatSpec, out: &mut Vec<u8>) {
    (format.as_octet() as u64).encode(out);
}

fn decode_format(buf: &mut &[u8]) -> Result<FormatSpec, MeridianError> {
    let octet = decode_u64(buf)?;
    u8::try_from(octet)
        .ok()
        .and_then(FormatSpec::from_octet)
        .ok_or_else(|| MeridianError::Encoding(format!("unknown format spec {octet}")))
}

/// Wrap an already-encoded field payload in a list header.
fn finish_list(payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    Header { list: true, payload_length: payload.len() }.encode(&mut out);
    out.extend_from_slice(&payload);
    out
}

/// Decode the outer list header and return the byte count its payload is
/// expected to consume.
fn open_list(buf: &mut &[u8]) -> Result<usize, MeridianError> {
    let header = Header::decode(buf).map_err(rlp_err)?;
    if !header.list {
        return Err(MeridianError::Encoding("expected a list".into()));
    }
    Ok(header.payload_length)
}

fn expect_consumed(
    before: usize,
    after: usize,
    expected: usize,
) -> Result<(), MeridianError> {
    if before - after != expected {
        return Err(MeridianError::Encoding("list length mismatch".into()));
    }
    Ok(())
}

fn expect_version(buf: &mut &[u8]) -> Result<(), MeridianError> {
    let version = decode_u64(buf)?;
    if version != OBJECT_VERSION {
        return Err(MeridianError::Encoding(format!("unsupported version {version}")));
    }
    Ok(())
}

fn required_sender(tx: &DataTx) -> Result<&PublicKey, MeridianError> {
    tx.sender
        .as_ref()
        .ok_or_else(|| MeridianError::Encoding("sender field is required".into()))
}

// ── DataTx ───────────────────────────────────────────────────────────────────

/// Encode an unsigned transaction as `[tag, version, field₁, …]`.
pub fn encode_data_tx(tx: &DataTx) -> Result<Vec<u8>, MeridianError> {
    let mut payload = Vec::new();
    (tx.payload.tag() as u64).encode(&mut payload);
    // The Spend payload carries its own version in the version slot; every
    // other kind is at the shared object version.
    match &tx.payload {
        TxPayload::Spend(p) => p.version.encode(&mut payload),
        _ => OBJECT_VERSION.encode(&mut payload),
    }

    match &tx.payload {
        TxPayload::Spend(p) => {
            required_sender(tx)?.0.encode(&mut payload);
            p.receiver.0.encode(&mut payload);
            p.amount.encode(&mut payload);
            tx.fee.encode(&mut payload);
            tx.nonce.encode(&mut payload);
        }
        TxPayload::Coinbase(p) => {
            if tx.sender.is_some() {
                return Err(MeridianError::Encoding("coinbase must not carry a sender".into()));
            }
            p.receiver.0.encode(&mut payload);
            p.amount.encode(&mut payload);
            // Block height occupies the nonce slot.
            p.height.encode(&mut payload);
        }
        TxPayload::OracleRegister(p) => {
            required_sender(tx)?.0.encode(&mut payload);
            encode_format(&p.query_format, &mut payload);
            encode_format(&p.response_format, &mut payload);
            p.query_fee.encode(&mut payload);
            encode_ttl(&p.ttl, &mut payload);
            tx.fee.encode(&mut payload);
            tx.nonce.encode(&mut payload);
        }
        TxPayload::OracleQuery(p) => {
            required_sender(tx)?.0.encode(&mut payload);
            p.oracle.0.encode(&mut payload);
            p.query_data.as_slice().encode(&mut payload);
            p.query_fee.encode(&mut payload);
            encode_ttl(&p.query_ttl, &mut payload);
            encode_ttl(&p.response_ttl, &mut payload);
            tx.fee.encode(&mut payload);
            tx.nonce.encode(&mut payload);
        }
        TxPayload::OracleResponse(p) => {
            required_sender(tx)?.0.encode(&mut payload);
            p.query_id.0.encode(&mut payload);
            p.response_data.as_slice().encode(&mut payload);
            tx.fee.encode(&mut payload);
            tx.nonce.encode(&mut payload);
        }
        TxPayload::OracleExtend(p) => {
            required_sender(tx)?.0.encode(&mut payload);
            encode_ttl(&p.ttl, &mut payload);
            tx.fee.encode(&mut payload);
            tx.nonce.encode(&mut payload);
        }
        TxPayload::NamePreClaim(p) => {
            required_sender(tx)?.0.encode(&mut payload);
            p.commitment.0.encode(&mut payload);
            tx.fee.encode(&mut payload);
            tx.nonce.encode(&mut payload);
        }
        TxPayload::NameClaim(p) => {
            required_sender(tx)?.0.encode(&mut payload);
            p.name.as_bytes().encode(&mut payload);
            p.name_salt.as_slice().encode(&mut payload);
            tx.fee.encode(&mut payload);
            tx.nonce.encode(&mut payload);
        }
    }

    Ok(finish_list(payload))
}

/// Decode an unsigned transaction, restoring every consensus-relevant field.
pub fn decode_data_tx(buf: &[u8]) -> Result<DataTx, MeridianError> {
    let b = &mut &buf[..];
    let payload_length = open_list(b)?;
    let before = b.len();

    let tag = decode_u64(b)?;
    let version = decode_u64(b)?;
    // Spend keeps its declared version (static validation judges it against
    // the configured protocol version); every other kind must be version 1.
    if u8::try_from(tag).unwrap_or(0) != TAG_SPEND_TX && version != OBJECT_VERSION {
        return Err(MeridianError::Encoding(format!("unsupported version {version}")));
    }

    let tx = match u8::try_from(tag).unwrap_or(0) {
        TAG_SPEND_TX => {
            let sender = decode_key(b)?;
            let receiver = decode_key(b)?;
            let amount = decode_u64(b)?;
            let fee = decode_u64(b)?;
            let nonce = decode_u64(b)?;
            DataTx {
                sender: Some(sender),
                fee,
                nonce,
                payload: TxPayload::Spend(SpendPayload { receiver, amount, version }),
            }
        }
        TAG_COINBASE_TX => {
            let receiver = decode_key(b)?;
            let amount = decode_u64(b)?;
            let height = decode_u64(b)?;
            DataTx {
                sender: None,
                fee: 0,
                nonce: 0,
                payload: TxPayload::Coinbase(CoinbasePayload { receiver, amount, height }),
            }
        }
        TAG_ORACLE_REGISTER_TX => {
            let sender = decode_key(b)?;
            let query_format = decode_format(b)?;
            let response_format = decode_format(b)?;
            let query_fee = decode_u64(b)?;
            let ttl = decode_ttl(b)?;
            let fee = decode_u64(b)?;
            let nonce = decode_u64(b)?;
            DataTx {
                sender: Some(sender),
                fee,
                nonce,
                payload: TxPayload::OracleRegister(OracleRegisterPayload {
                    query_format,
                    response_format,
                    query_fee,
                    ttl,
                }),
            }
        }
        TAG_ORACLE_QUERY_TX => {
            let sender = decode_key(b)?;
            let oracle = decode_key(b)?;
            let query_data = decode_bytes(b)?;
            let query_fee = decode_u64(b)?;
            let query_ttl = decode_ttl(b)?;
            let response_ttl = decode_ttl(b)?;
            let fee = decode_u64(b)?;
            let nonce = decode_u64(b)?;
            DataTx {
                sender: Some(sender),
                fee,
                nonce,
                payload: TxPayload::OracleQuery(OracleQueryPayload {
                    oracle,
                    query_data,
                    query_fee,
                    query_ttl,
                    response_ttl,
                }),
            }
        }
        TAG_ORACLE_RESPONSE_TX => {
            let sender = decode_key(b)?;
            let query_id = QueryId::from_bytes(<[u8; 32]>::decode(b).map_err(rlp_err)?);
            let response_data = decode_bytes(b)?;
            let fee = decode_u64(b)?;
            let nonce = decode_u64(b)?;
            DataTx {
                sender: Some(sender),
                fee,
                nonce,
                payload: TxPayload::OracleResponse(OracleResponsePayload { query_id, response_data }),
            }
        }
        TAG_ORACLE_EXTEND_TX => {
            let sender = decode_key(b)?;
            let ttl = decode_ttl(b)?;
            let fee = decode_u64(b)?;
            let nonce = decode_u64(b)?;
            DataTx {
                sender: Some(sender),
                fee,
                nonce,
                payload: TxPayload::OracleExtend(OracleExtendPayload { ttl }),
            }
        }
        TAG_NAME_PRECLAIM_TX => {
            let sender = decode_key(b)?;
            let commitment = Commitment::from_bytes(<[u8; 32]>::decode(b).map_err(rlp_err)?);
            let fee = decode_u64(b)?;
            let nonce = decode_u64(b)?;
            DataTx {
                sender: Some(sender),
                fee,
                nonce,
                payload: TxPayload::NamePreClaim(NamePreClaimPayload { commitment }),
            }
        }
        TAG_NAME_CLAIM_TX => {
            let sender = decode_key(b)?;
            let name_bytes = decode_bytes(b)?;
            let name = String::from_utf8(name_bytes)
                .map_err(|_| MeridianError::Encoding("name is not valid utf-8".into()))?;
            let name_salt = decode_bytes(b)?;
            let fee = decode_u64(b)?;
            let nonce = decode_u64(b)?;
            DataTx {
                sender: Some(sender),
                fee,
                nonce,
                payload: TxPayload::NameClaim(NameClaimPayload { name, name_salt }),
            }
        }
        _ => return Err(MeridianError::Encoding(format!("unknown transaction tag {tag}"))),
    };

    expect_consumed(before, b.len(), payload_length)?;
    if !b.is_empty() {
        return Err(MeridianError::Encoding("trailing bytes after transaction".into()));
    }
    Ok(tx)
}

// ── SignedTx ─────────────────────────────────────────────────────────────────

/// Encode `[11, 1, [signature…] | 0x00, rlp(inner) as bytes]`.
pub fn encode_signed_tx(stx: &SignedTx) -> Result<Vec<u8>, MeridianError> {
    let mut payload = Vec::new();
    (TAG_SIGNED_TX as u64).encode(&mut payload);
    OBJECT_VERSION.encode(&mut payload);

    match &stx.signature {
        Some(sig) => {
            let mut sigs = Vec::new();
            sig.as_bytes().encode(&mut sigs);
            Header { list: true, payload_length: sigs.len() }.encode(&mut payload);
            payload.extend_from_slice(&sigs);
        }
        // A missing signature is the single byte 0x00.
        None => [0u8].as_slice().encode(&mut payload),
    }

    let inner = encode_data_tx(&stx.data)?;
    inner.as_slice().encode(&mut payload);

    Ok(finish_list(payload))
}

/// Decode a signed-transaction envelope.
pub fn decode_signed_tx(buf: &[u8]) -> Result<SignedTx, MeridianError> {
    let b = &mut &buf[..];
    let payload_length = open_list(b)?;
    let before = b.len();

    let tag = decode_u64(b)?;
    if tag != TAG_SIGNED_TX as u64 {
        return Err(MeridianError::Encoding(format!("expected signed-tx tag, got {tag}")));
    }
    expect_version(b)?;

    let first = *b
        .first()
        .ok_or_else(|| MeridianError::Encoding("truncated signed transaction".into()))?;
    let signature = if first >= 0xc0 {
        let sig_payload = open_list(b)?;
        let sig_before = b.len();
        let sig = decode_bytes(b)?;
        expect_consumed(sig_before, b.len(), sig_payload)?;
        Some(TxSignature(sig))
    } else {
        let placeholder = decode_bytes(b)?;
        if placeholder != [0u8] {
            return Err(MeridianError::Encoding("malformed signature placeholder".into()));
        }
        None
    };

    let inner = decode_bytes(b)?;
    let data = decode_data_tx(&inner)?;

    expect_consumed(before, b.len(), payload_length)?;
    if !b.is_empty() {
        return Err(MeridianError::Encoding("trailing bytes after envelope".into()));
    }
    Ok(SignedTx { data, signature })
}

// ── Account ──────────────────────────────────────────────────────────────────

/// Encode an account as `[10, 1, balance, nonce, [[height, amount], …]]`.
/// This is the leaf value committed into the accounts trie.
pub fn encode_account(account: &Account) -> Vec<u8> {
    let mut payload = Vec::new();
    (TAG_ACCOUNT as u64).encode(&mut payload);
    OBJECT_VERSION.encode(&mut payload);
    account.balance.encode(&mut payload);
    account.nonce.encode(&mut payload);

    let mut locked = Vec::new();
    for lc in &account.locked {
        let mut pair = Vec::new();
        lc.height.encode(&mut pair);
        lc.amount.encode(&mut pair);
        Header { list: true, payload_length: pair.len() }.encode(&mut locked);
        locked.extend_from_slice(&pair);
    }
    Header { list: true, payload_length: locked.len() }.encode(&mut payload);
    payload.extend_from_slice(&locked);

    finish_list(payload)
}

pub fn decode_account(buf: &[u8]) -> Result<Account, MeridianError> {
    let b = &mut &buf[..];
    let payload_length = open_list(b)?;
    let before = b.len();

    let tag = decode_u64(b)?;
    if tag != TAG_ACCOUNT as u64 {
        return Err(MeridianError::Encoding(format!("expected account tag, got {tag}")));
    }
    expect_version(b)?;

    let balance = decode_u64(b)?;
    let nonce = decode_u64(b)?;

    let locked_payload = open_list(b)?;
    let locked_before = b.len();
    let mut locked = Vec::new();
    while locked_before - b.len() < locked_payload {
        let pair_payload = open_list(b)?;
        let pair_before = b.len();
        let height = decode_u64(b)?;
        let amount = decode_u64(b)?;
        expect_consumed(pair_before, b.len(), pair_payload)?;
        locked.push(LockedCredit { height, amount });
    }
    expect_consumed(locked_before, b.len(), locked_payload)?;

    expect_consumed(before, b.len(), payload_length)?;
    if !b.is_empty() {
        return Err(MeridianError::Encoding("trailing bytes after account".into()));
    }
    Ok(Account { balance, nonce, locked })
}
