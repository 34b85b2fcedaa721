//! L2: point lookups, paginated prefix scans, range scans, and search
//! (§4.4).

use crate::backend::{prefix_upper_bound, KvBackend};
use crate::codec::{
    scalar, AbiRecord, BalanceSnapshot, ChainObjectCodec, ContractVerification, InternalTransaction, Notification,
    SystemContractEvent, TokenHolder, TokenMetadata,
};
use crate::error::{Result, StorageError};
use crate::keys::{self, index::TopicSlot, ActiveSetKind, Address, Hash32, SysEventKind};
use num_bigint::{BigInt, BigUint};

/// Cooperative cancellation, checked between iteration steps (§5).
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

/// The default token for callers that never cancel.
pub struct NeverCancelled;

impl Cancellation for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: 100, offset: 0 }
    }
}

/// Opens `[prefix, upper(prefix))`, skips `offset`, yields up to `limit`
/// `(key, value)` pairs. Checks `cancel` on every step.
pub fn prefix_scan(
    backend: &dyn KvBackend,
    prefix: &[u8],
    page: Page,
    cancel: &dyn Cancellation,
) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
    let upper = prefix_upper_bound(prefix);
    let mut iter = backend.new_iterator(prefix, &upper)?;
    let mut skipped = 0usize;
    let mut out = Vec::new();
    while iter.valid() {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        if skipped < page.offset {
            skipped += 1;
            iter.next();
            continue;
        }
        if out.len() >= page.limit {
            break;
        }
        out.push((iter.key().to_vec(), iter.value().to_vec()));
        iter.next();
    }
    Ok(out)
}

// ---- Point lookups -------------------------------------------------------

pub fn get_block<B>(backend: &dyn KvBackend, codec: &impl ChainObjectCodec<B>, height: u64) -> Result<Option<B>> {
    match backend.get(keys::block_key(height).as_bytes())? {
        Some(bytes) => Ok(Some(codec.decode(&bytes)?)),
        None => Ok(None),
    }
}

pub fn get_transaction<T>(
    backend: &dyn KvBackend,
    codec: &impl ChainObjectCodec<T>,
    hash: &Hash32,
) -> Result<Option<(T, crate::write::TxLocation)>> {
    let Some(loc_bytes) = backend.get(keys::tx_hash_index_key(hash).as_bytes())? else {
        return Ok(None);
    };
    let height = scalar::decode_u64(&loc_bytes[0..8])?;
    let index = scalar::decode_u64(&loc_bytes[8..16])?;
    let Some(tx_bytes) = backend.get(keys::tx_key(height, index).as_bytes())? else {
        return Ok(None);
    };
    Ok(Some((codec.decode(&tx_bytes)?, crate::write::TxLocation { height, index })))
}

/// Restores `txHash` from the query key and back-fills `contractAddress`
/// from the side-store.
pub fn get_receipt<R>(
    backend: &dyn KvBackend,
    codec: &impl ChainObjectCodec<R>,
    hash: &Hash32,
) -> Result<Option<(R, Option<Address>)>> {
    let Some(bytes) = backend.get(keys::receipt_key(hash).as_bytes())? else {
        return Ok(None);
    };
    let receipt = codec.decode(&bytes)?;
    let contract_address = match backend.get(keys::contract_addr_key(hash).as_bytes())? {
        Some(addr_bytes) => {
            let s = String::from_utf8(addr_bytes)
                .map_err(|e| StorageError::codec("contractAddress", e))?;
            Some(keys::parse_address(&s)?)
        }
        None => None,
    };
    Ok(Some((receipt, contract_address)))
}

pub fn get_token_balance(backend: &dyn KvBackend, token: &Address, holder: &Address) -> Result<BigInt> {
    match backend.get(keys::token_holder_key(token, holder).as_bytes())? {
        Some(bytes) => {
            let record = TokenHolder::decode(&bytes)?;
            record
                .balance
                .parse::<BigInt>()
                .map_err(|e| StorageError::codec("TokenHolder.balance", std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())))
        }
        None => Ok(BigInt::from(0)),
    }
}

pub fn get_abi(backend: &dyn KvBackend, addr: &Address) -> Result<Option<AbiRecord>> {
    match backend.get(keys::abi_key(addr).as_bytes())? {
        Some(bytes) => Ok(Some(AbiRecord::decode(&bytes)?)),
        None => Ok(None),
    }
}

pub fn get_contract_verification(backend: &dyn KvBackend, addr: &Address) -> Result<Option<ContractVerification>> {
    match backend.get(keys::verification_key(addr).as_bytes())? {
        Some(bytes) => Ok(Some(ContractVerification::decode(&bytes)?)),
        None => Ok(None),
    }
}

pub fn get_token_metadata(backend: &dyn KvBackend, token: &Address) -> Result<Option<TokenMetadata>> {
    match backend.get(keys::token_metadata_key(token).as_bytes())? {
        Some(bytes) => Ok(Some(TokenMetadata::decode(&bytes)?)),
        None => Ok(None),
    }
}

pub fn is_active_member(backend: &dyn KvBackend, kind: ActiveSetKind, addr: &Address) -> Result<bool> {
    backend.has(keys::syscontracts_active_key(kind, addr).as_bytes())
}

pub fn get_total_supply(backend: &dyn KvBackend) -> Result<BigUint> {
    match backend.get(keys::syscontracts_total_supply_key().as_bytes())? {
        Some(bytes) => Ok(scalar::decode_biguint(&bytes)),
        None => Ok(BigUint::from(0u32)),
    }
}

/// Per-actor system-contract event listing: scans the actor secondary index
/// and re-reads each primary record.
pub fn syscontract_events_by_actor(
    backend: &dyn KvBackend,
    kind: SysEventKind,
    actor: &Address,
    page: Page,
) -> Result<Vec<SystemContractEvent>> {
    let prefix = keys::syscontracts_actor_index_prefix(kind, actor);
    let entries = prefix_scan(backend, prefix.as_bytes(), page, &NeverCancelled)?;
    entries
        .into_iter()
        .map(|(key, _)| {
            let (block, seq) = decode_syscontracts_actor_coords(&key, prefix.len())?;
            let record_bytes = backend
                .get(keys::syscontracts_event_key(kind, block, seq).as_bytes())?
                .ok_or_else(|| StorageError::invalid_argument("dangling syscontracts actor index entry"))?;
            SystemContractEvent::decode(&record_bytes)
        })
        .collect()
}

fn decode_syscontracts_actor_coords(key: &[u8], skip: usize) -> Result<(u64, u64)> {
    let rest = std::str::from_utf8(&key[skip..]).map_err(|e| StorageError::codec("SysContractsActorIndexKey", e))?;
    let (block_str, seq_str) =
        rest.split_once('/').ok_or_else(|| StorageError::invalid_argument("malformed syscontracts actor index key"))?;
    Ok((keys::parse_u64(block_str)?, keys::parse_u64(seq_str)?))
}

/// Per-address notification log, oldest first.
pub fn notifications_for_address(backend: &dyn KvBackend, addr: &Address, page: Page) -> Result<Vec<Notification>> {
    let prefix = keys::notification_prefix(addr);
    let entries = prefix_scan(backend, prefix.as_bytes(), page, &NeverCancelled)?;
    entries.into_iter().map(|(_, v)| Notification::decode(&v)).collect()
}

/// Per-address internal-transaction listing: scans the actor index and
/// re-reads each primary call-frame record.
pub fn internal_transactions_by_address(backend: &dyn KvBackend, addr: &Address, page: Page) -> Result<Vec<InternalTransaction>> {
    let prefix = keys::internaltx_by_addr_prefix(addr);
    let entries = prefix_scan(backend, prefix.as_bytes(), page, &NeverCancelled)?;
    entries
        .into_iter()
        .map(|(key, _)| {
            let (hash, index) = decode_internaltx_by_addr_coords(&key, prefix.len())?;
            let record_bytes = backend
                .get(keys::internaltx_key(&hash, index).as_bytes())?
                .ok_or_else(|| StorageError::invalid_argument("dangling internal-tx index entry"))?;
            InternalTransaction::decode(&record_bytes)
        })
        .collect()
}

fn decode_internaltx_by_addr_coords(key: &[u8], skip: usize) -> Result<(Hash32, u32)> {
    let rest = std::str::from_utf8(&key[skip..]).map_err(|e| StorageError::codec("InternalTxIndexKey", e))?;
    let (hash_str, index_str) =
        rest.split_once('/').ok_or_else(|| StorageError::invalid_argument("malformed internal-tx index key"))?;
    Ok((keys::parse_hash(hash_str)?, keys::parse_u32(index_str)?))
}

// ---- Range scans ----------------------------------------------------------

/// *Balance-at-block*: prefix-scans the address's history sub-tree, stopping
/// when `snapshot.block_number > target_block`; returns the running
/// balance. O(history) per address.
pub fn balance_at_block(backend: &dyn KvBackend, addr: &Address, target_block: u64) -> Result<BigInt> {
    let prefix = keys::balance_history_prefix(addr);
    let upper = prefix_upper_bound(prefix.as_bytes());
    let mut iter = backend.new_iterator(prefix.as_bytes(), &upper)?;
    let mut running = BigInt::from(0);
    while iter.valid() {
        let snapshot = BalanceSnapshot::decode(iter.value())?;
        if snapshot.block_number > target_block {
            break;
        }
        running = snapshot.balance.0;
        iter.next();
    }
    Ok(running)
}

/// *Blocks-by-time*: iterates `/index/time/{from}..{to+1}/...`, decoding the
/// height from each value.
pub fn blocks_by_time(backend: &dyn KvBackend, from_ts: u64, to_ts: u64, cancel: &dyn Cancellation) -> Result<Vec<u64>> {
    if from_ts > to_ts {
        return Err(StorageError::invalid_argument("fromTimestamp > toTimestamp"));
    }
    let lower = format!("{}{}", keys::time_index_range_prefix(), crate::keys::fmt_u64(from_ts));
    let upper_bound_ts = to_ts.saturating_add(1);
    let upper = format!("{}{}", keys::time_index_range_prefix(), crate::keys::fmt_u64(upper_bound_ts));
    let mut iter = backend.new_iterator(lower.as_bytes(), upper.as_bytes())?;
    let mut out = Vec::new();
    while iter.valid() {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        let key = std::str::from_utf8(iter.key()).map_err(|e| StorageError::codec("TimeIndexKey", e))?;
        let height_field = key.rsplit('/').next().ok_or_else(|| StorageError::invalid_argument("malformed time index key"))?;
        out.push(keys::parse_u64(height_field)?);
        iter.next();
    }
    Ok(out)
}

/// *Block-by-timestamp*: seeks the first time-index entry with `ts >=
/// target`; if the seek runs past the end of the index (target newer than
/// every recorded block), falls back to a full scan for the last entry.
/// Not-found (`None`) only when the index is empty.
pub fn block_by_timestamp(backend: &dyn KvBackend, target_ts: u64) -> Result<Option<u64>> {
    let lower = format!("{}{}", keys::time_index_range_prefix(), keys::fmt_u64(target_ts));
    let full_upper = prefix_upper_bound(keys::time_index_range_prefix().as_bytes());
    let mut iter = backend.new_iterator(lower.as_bytes(), &full_upper)?;
    if iter.valid() {
        return Ok(Some(decode_time_index_height(iter.key())?));
    }
    let mut scan = backend.new_iterator(keys::time_index_range_prefix().as_bytes(), &full_upper)?;
    let mut last = None;
    while scan.valid() {
        last = Some(decode_time_index_height(scan.key())?);
        scan.next();
    }
    Ok(last)
}

fn decode_time_index_height(key: &[u8]) -> Result<u64> {
    let s = std::str::from_utf8(key).map_err(|e| StorageError::codec("TimeIndexKey", e))?;
    let height_field = s.rsplit('/').next().ok_or_else(|| StorageError::invalid_argument("malformed time index key"))?;
    keys::parse_u64(height_field)
}

/// *Address-tx filtered*: scans `/index/addr/{addr}/`, decodes the stored
/// tx hash, applies `predicate`, and honors `offset` after the predicate.
pub fn address_tx_filtered(
    backend: &dyn KvBackend,
    addr: &Address,
    page: Page,
    predicate: impl Fn(&Hash32) -> bool,
    cancel: &dyn Cancellation,
) -> Result<Vec<Hash32>> {
    let prefix = keys::addr_tx_prefix(addr);
    let upper = prefix_upper_bound(prefix.as_bytes());
    let mut iter = backend.new_iterator(prefix.as_bytes(), &upper)?;
    let mut matched = 0usize;
    let mut out = Vec::new();
    while iter.valid() {
        if cancel.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        let value = iter.value();
        if value.len() == 32 {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(value);
            if predicate(&hash) {
                if matched >= page.offset {
                    if out.len() >= page.limit {
                        break;
                    }
                    out.push(hash);
                }
                matched += 1;
            }
        }
        iter.next();
    }
    Ok(out)
}

/// Logs by topic, using the most selective available index (§4.4).
pub fn logs_by_topic(backend: &dyn KvBackend, slot: TopicSlot, topic: &Hash32, page: Page) -> Result<Vec<(u64, u32, u32)>> {
    let prefix = keys::log_topic_index_prefix(slot, topic);
    let entries = prefix_scan(backend, prefix.as_bytes(), page, &NeverCancelled)?;
    entries
        .into_iter()
        .map(|(key, _)| decode_log_coords(&key, prefix.len()))
        .collect()
}

pub fn logs_by_address(backend: &dyn KvBackend, addr: &Address, page: Page) -> Result<Vec<(u64, u32, u32)>> {
    let prefix = keys::log_addr_index_prefix(addr);
    let entries = prefix_scan(backend, prefix.as_bytes(), page, &NeverCancelled)?;
    entries
        .into_iter()
        .map(|(key, _)| decode_log_coords(&key, prefix.len()))
        .collect()
}

pub fn logs_by_block(backend: &dyn KvBackend, block: u64, page: Page) -> Result<Vec<(u64, u32, u32)>> {
    let prefix = keys::log_block_index_prefix(block);
    let entries = prefix_scan(backend, prefix.as_bytes(), page, &NeverCancelled)?;
    entries
        .into_iter()
        .map(|(key, _)| decode_log_coords(&key, prefix.len()))
        .collect()
}

fn decode_log_coords(key: &[u8], skip: usize) -> Result<(u64, u32, u32)> {
    let rest = std::str::from_utf8(&key[skip..]).map_err(|e| StorageError::codec("LogIndexKey", e))?;
    let mut parts = rest.split('/');
    let block = keys::parse_u64(parts.next().ok_or_else(|| StorageError::invalid_argument("malformed log index key"))?)?;
    let tx_idx = keys::parse_u32(parts.next().ok_or_else(|| StorageError::invalid_argument("malformed log index key"))?)?;
    let log_idx = keys::parse_u32(parts.next().ok_or_else(|| StorageError::invalid_argument("malformed log index key"))?)?;
    Ok((block, tx_idx, log_idx))
}

/// *Top miners / top fee payers*: linear scan of a block range, aggregated
/// into a map, sorted descending, truncated to `limit`. `extract` pulls the
/// aggregation key (miner address, fee payer address, ...) out of each
/// decoded block.
pub fn top_by_block_range<B>(
    backend: &dyn KvBackend,
    codec: &impl ChainObjectCodec<B>,
    from_height: u64,
    to_height: u64,
    limit: usize,
    extract: impl Fn(&B) -> Address,
) -> Result<Vec<(Address, u64, f64)>> {
    let mut counts: std::collections::HashMap<Address, u64> = std::collections::HashMap::new();
    let mut total = 0u64;
    for height in from_height..=to_height {
        if let Some(block) = get_block(backend, codec, height)? {
            *counts.entry(extract(&block)).or_insert(0) += 1;
            total += 1;
        }
    }
    let mut ranked: Vec<(Address, u64, f64)> = counts
        .into_iter()
        .map(|(addr, count)| {
            let pct = if total == 0 { 0.0 } else { (count as f64 / total as f64) * 100.0 };
            (addr, count, pct)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    Ok(ranked)
}

// ---- Search -----------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResultType {
    Block,
    Transaction,
    Address,
    Contract,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub result_type: SearchResultType,
    pub value: String,
    pub label: String,
}

/// Classifies `query` and returns up to `limit` typed results per §4.4:
/// digits → block number; 64-hex → block or tx hash; 40-hex → address (plus
/// a contract result if an ABI entry is stored for it).
pub fn search(backend: &dyn KvBackend, query: &str, result_types: &[SearchResultType], limit: usize) -> Result<Vec<SearchResult>> {
    let stripped = query.strip_prefix("0x").unwrap_or(query);
    let mut out = Vec::new();

    let allows = |t: &SearchResultType| result_types.is_empty() || result_types.contains(t);

    if stripped.chars().all(|c| c.is_ascii_digit()) && !stripped.is_empty() {
        if let Ok(height) = stripped.parse::<u64>() {
            if allows(&SearchResultType::Block) && backend.has(keys::block_key(height).as_bytes())? {
                out.push(SearchResult { result_type: SearchResultType::Block, value: height.to_string(), label: format!("Block #{height}") });
            }
        }
    }

    if stripped.len() == 64 && stripped.bytes().all(|b| b.is_ascii_hexdigit()) {
        if let Ok(hash) = keys::parse_hash(&format!("0x{stripped}")) {
            if allows(&SearchResultType::Block) && backend.has(keys::block_hash_index_key(&hash).as_bytes())? {
                out.push(SearchResult {
                    result_type: SearchResultType::Block,
                    value: keys::fmt_hash(&hash),
                    label: "Block".to_string(),
                });
            }
            if allows(&SearchResultType::Transaction) && backend.has(keys::tx_hash_index_key(&hash).as_bytes())? {
                out.push(SearchResult {
                    result_type: SearchResultType::Transaction,
                    value: keys::fmt_hash(&hash),
                    label: "Transaction".to_string(),
                });
            }
        }
    }

    if stripped.len() == 40 && stripped.bytes().all(|b| b.is_ascii_hexdigit()) {
        if let Ok(addr) = keys::parse_address(&format!("0x{stripped}")) {
            if allows(&SearchResultType::Address) {
                out.push(SearchResult {
                    result_type: SearchResultType::Address,
                    value: keys::fmt_address(&addr),
                    label: "Address".to_string(),
                });
            }
            if allows(&SearchResultType::Contract) && backend.has(keys::abi_key(&addr).as_bytes())? {
                out.push(SearchResult {
                    result_type: SearchResultType::Contract,
                    value: keys::fmt_address(&addr),
                    label: "Contract".to_string(),
                });
            }
        }
    }

    out.truncate(limit);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::codec::BincodeMirrorCodec;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct FakeBlock {
        height: u64,
    }

    #[test]
    fn prefix_scan_respects_limit_and_offset() {
        let backend = MemoryBackend::default();
        for i in 0..10u64 {
            backend.set(format!("/data/x/{:03}", i).as_bytes(), b"v").unwrap();
        }
        let page = Page { limit: 3, offset: 2 };
        let results = prefix_scan(&backend, b"/data/x/", page, &NeverCancelled).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, b"/data/x/002".to_vec());
    }

    #[test]
    fn get_block_round_trips_through_codec() {
        let backend = MemoryBackend::default();
        let codec = BincodeMirrorCodec;
        backend.set(keys::block_key(5).as_bytes(), &codec.encode(&FakeBlock { height: 5 }).unwrap()).unwrap();
        let block: Option<FakeBlock> = get_block(&backend, &codec, 5).unwrap();
        assert_eq!(block, Some(FakeBlock { height: 5 }));
        let missing: Option<FakeBlock> = get_block(&backend, &codec, 6).unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn balance_at_block_stops_at_target() {
        let backend = MemoryBackend::default();
        let addr = [1u8; 20];
        for (seq, (block, bal)) in [(0u64, 10i64), (5, 20), (10, 30)].into_iter().enumerate() {
            let snap = BalanceSnapshot {
                block_number: block,
                balance: crate::codec::BigIntRecord(BigInt::from(bal)),
                seq: seq as u64,
            };
            backend.set(keys::balance_history_key(&addr, seq as u64).as_bytes(), &snap.encode().unwrap()).unwrap();
        }
        assert_eq!(balance_at_block(&backend, &addr, 7).unwrap(), BigInt::from(20));
        assert_eq!(balance_at_block(&backend, &addr, 0).unwrap(), BigInt::from(10));
        assert_eq!(balance_at_block(&backend, &addr, 100).unwrap(), BigInt::from(30));
    }

    #[test]
    fn blocks_by_time_rejects_inverted_range() {
        let backend = MemoryBackend::default();
        assert!(blocks_by_time(&backend, 10, 5, &NeverCancelled).is_err());
    }

    #[test]
    fn search_classifies_block_height() {
        let backend = MemoryBackend::default();
        backend.set(keys::block_key(42).as_bytes(), b"x").unwrap();
        let results = search(&backend, "42", &[], 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].result_type, SearchResultType::Block);
    }

    #[test]
    fn search_address_includes_contract_when_abi_present() {
        let backend = MemoryBackend::default();
        let addr = [0xABu8; 20];
        let addr_hex = &keys::fmt_address(&addr)[2..];
        backend.set(keys::abi_key(&addr).as_bytes(), b"x").unwrap();
        let results = search(&backend, addr_hex, &[], 10).unwrap();
        assert!(results.iter().any(|r| r.result_type == SearchResultType::Address));
        assert!(results.iter().any(|r| r.result_type == SearchResultType::Contract));
    }

    #[test]
    fn search_address_has_no_contract_result_without_abi() {
        let backend = MemoryBackend::default();
        let addr = [0xCDu8; 20];
        let addr_hex = &keys::fmt_address(&addr)[2..];
        let results = search(&backend, addr_hex, &[], 10).unwrap();
        assert!(results.iter().any(|r| r.result_type == SearchResultType::Address));
        assert!(!results.iter().any(|r| r.result_type == SearchResultType::Contract));
    }

    #[test]
    fn block_by_timestamp_seeks_ge_and_falls_back_to_last() {
        let backend = MemoryBackend::default();
        backend.set(keys::time_index_key(100, 1).as_bytes(), b"x").unwrap();
        backend.set(keys::time_index_key(200, 2).as_bytes(), b"x").unwrap();
        backend.set(keys::time_index_key(300, 3).as_bytes(), b"x").unwrap();

        assert_eq!(block_by_timestamp(&backend, 150).unwrap(), Some(2));
        assert_eq!(block_by_timestamp(&backend, 200).unwrap(), Some(2));
        assert_eq!(block_by_timestamp(&backend, 999).unwrap(), Some(3));
        assert_eq!(block_by_timestamp(&backend, 0).unwrap(), Some(1));
    }

    #[test]
    fn block_by_timestamp_empty_index_is_not_found() {
        let backend = MemoryBackend::default();
        assert_eq!(block_by_timestamp(&backend, 50).unwrap(), None);
    }

    #[test]
    fn abi_verification_and_token_metadata_are_point_lookups() {
        let backend = MemoryBackend::default();
        let addr = [1u8; 20];
        assert_eq!(get_abi(&backend, &addr).unwrap(), None);
        backend
            .set(
                keys::abi_key(&addr).as_bytes(),
                &AbiRecord { address: keys::fmt_address(&addr), abi_json: "[]".into(), updated_at_block: 1 }.encode().unwrap(),
            )
            .unwrap();
        assert!(get_abi(&backend, &addr).unwrap().is_some());
    }

    #[test]
    fn notifications_and_internal_transactions_list_in_order() {
        let backend = MemoryBackend::default();
        let addr = [2u8; 20];
        for seq in 0..3u64 {
            let n = Notification {
                address: keys::fmt_address(&addr),
                seq,
                kind: "transfer".into(),
                payload: "{}".into(),
                created_at_block: seq,
            };
            backend.set(keys::notification_key(&addr, seq).as_bytes(), &n.encode().unwrap()).unwrap();
        }
        let listed = notifications_for_address(&backend, &addr, Page::default()).unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].seq, 0);
        assert_eq!(listed[2].seq, 2);

        let hash = [9u8; 32];
        let record = InternalTransaction {
            tx_hash: keys::fmt_hash(&hash),
            index: 0,
            from: keys::fmt_address(&addr),
            to: None,
            value: "1".into(),
            kind: "call".into(),
        };
        backend.set(keys::internaltx_key(&hash, 0).as_bytes(), &record.encode().unwrap()).unwrap();
        backend.set(keys::internaltx_by_addr_key(&addr, &hash, 0).as_bytes(), &[1]).unwrap();
        let internal = internal_transactions_by_address(&backend, &addr, Page::default()).unwrap();
        assert_eq!(internal.len(), 1);
        assert_eq!(internal[0].from, keys::fmt_address(&addr));
    }

    #[test]
    fn active_membership_and_total_supply_round_trip() {
        let backend = MemoryBackend::default();
        let addr = [3u8; 20];
        assert!(!is_active_member(&backend, ActiveSetKind::Validator, &addr).unwrap());
        backend.set(keys::syscontracts_active_key(ActiveSetKind::Validator, &addr).as_bytes(), &[1]).unwrap();
        assert!(is_active_member(&backend, ActiveSetKind::Validator, &addr).unwrap());

        assert_eq!(get_total_supply(&backend).unwrap(), BigUint::from(0u32));
        backend.set(keys::syscontracts_total_supply_key().as_bytes(), &scalar::encode_biguint(&BigUint::from(500u32))).unwrap();
        assert_eq!(get_total_supply(&backend).unwrap(), BigUint::from(500u32));
    }

    #[test]
    fn syscontract_events_by_actor_reads_back_primary_records() {
        let backend = MemoryBackend::default();
        let actor = [4u8; 20];
        let event = SystemContractEvent::Mint { actor: keys::fmt_address(&actor), amount: "10".into() };
        backend.set(keys::syscontracts_event_key(SysEventKind::Mint, 1, 0).as_bytes(), &event.encode().unwrap()).unwrap();
        backend.set(keys::syscontracts_actor_index_key(SysEventKind::Mint, &actor, 1, 0).as_bytes(), &[1]).unwrap();

        let events = syscontract_events_by_actor(&backend, SysEventKind::Mint, &actor, Page::default()).unwrap();
        assert_eq!(events, vec![event]);
    }

    #[test]
    fn logs_by_block_decodes_coordinates() {
        let backend = MemoryBackend::default();
        backend.set(keys::log_block_index_key(5, 1, 2).as_bytes(), &[1]).unwrap();
        let results = logs_by_block(&backend, 5, Page::default()).unwrap();
        assert_eq!(results, vec![(5, 1, 2)]);
    }
}
