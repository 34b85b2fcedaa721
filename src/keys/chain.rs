//! Primary chain-object keys: blocks, transactions, receipts, and the
//! timestamp→height index (§4.2).

use super::{fmt_u32, fmt_u64, parse_u32, parse_u64, Hash32, KeyParseError};

/// `/data/blocks/{height}` — no zero-pad; blocks are iterated by explicit
/// range, never by prefix sort.
pub fn block_key(height: u64) -> String {
    format!("/data/blocks/{}", height)
}

pub fn parse_block_key(key: &str) -> Result<u64, KeyParseError> {
    let rest = key.strip_prefix("/data/blocks/").ok_or(KeyParseError::PrefixMismatch)?;
    rest.parse().map_err(|_| KeyParseError::MalformedShape)
}

/// `/index/blockh/{hash}` → height.
pub fn block_hash_index_key(hash: &Hash32) -> String {
    format!("/index/blockh/{}", super::fmt_hash(hash))
}

/// `/data/txs/{height}/{index}`.
pub fn tx_key(height: u64, index: u64) -> String {
    format!("/data/txs/{}/{}", height, index)
}

pub fn parse_tx_key(key: &str) -> Result<(u64, u64), KeyParseError> {
    let rest = key.strip_prefix("/data/txs/").ok_or(KeyParseError::PrefixMismatch)?;
    let (height, index) = rest.split_once('/').ok_or(KeyParseError::MalformedShape)?;
    let height = height.parse().map_err(|_| KeyParseError::MalformedShape)?;
    let index = index.parse().map_err(|_| KeyParseError::MalformedShape)?;
    Ok((height, index))
}

pub fn tx_prefix(height: u64) -> String {
    format!("/data/txs/{}/", height)
}

/// `/index/txh/{hash}` → (height, index).
pub fn tx_hash_index_key(hash: &Hash32) -> String {
    format!("/index/txh/{}", super::fmt_hash(hash))
}

/// `/data/receipts/{hash}`.
pub fn receipt_key(hash: &Hash32) -> String {
    format!("/data/receipts/{}", super::fmt_hash(hash))
}

/// `/data/contractaddr/{hash}` — present only when the receipt's
/// `contractAddress` is non-zero.
pub fn contract_addr_key(hash: &Hash32) -> String {
    format!("/data/contractaddr/{}", super::fmt_hash(hash))
}

/// `/index/time/{ts}/{height}`.
pub fn time_index_key(ts: u64, height: u64) -> String {
    format!("/index/time/{}/{}", fmt_u64(ts), fmt_u64(height))
}

pub fn time_index_prefix(ts: u64) -> String {
    format!("/index/time/{}/", fmt_u64(ts))
}

pub fn time_index_range_prefix() -> &'static str {
    "/index/time/"
}

/// `/data/logs/{block}/{txIdx}/{logIdx}`.
pub fn log_key(block: u64, tx_idx: u32, log_idx: u32) -> String {
    format!("/data/logs/{}/{}/{}", fmt_u64(block), fmt_u32(tx_idx), fmt_u32(log_idx))
}

pub fn parse_log_key(key: &str) -> Result<(u64, u32, u32), KeyParseError> {
    let rest = key.strip_prefix("/data/logs/").ok_or(KeyParseError::PrefixMismatch)?;
    let mut parts = rest.split('/');
    let block = parse_u64(parts.next().ok_or(KeyParseError::MalformedShape)?)?;
    let tx_idx = parse_u32(parts.next().ok_or(KeyParseError::MalformedShape)?)?;
    let log_idx = parse_u32(parts.next().ok_or(KeyParseError::MalformedShape)?)?;
    Ok((block, tx_idx, log_idx))
}

pub fn log_block_prefix(block: u64) -> String {
    format!("/data/logs/{}/", fmt_u64(block))
}
