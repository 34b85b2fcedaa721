//! L1: pure, total key-builder functions for the namespace enumerated in
//! §4.2. Every builder has a matching prefix function for range queries;
//! where parseability is needed a matching parser is provided.

pub mod chain;
pub mod contract;
pub mod index;
pub mod setcode;
pub mod syscontracts;
pub mod token;
pub mod wbft;

pub use chain::*;
pub use contract::*;
pub use index::*;
pub use setcode::*;
pub use syscontracts::*;
pub use token::*;
pub use wbft::*;

/// A 20-byte address, rendered as lowercase `0x`-prefixed hex (42 chars).
pub type Address = [u8; 20];
/// A 32-byte hash, rendered as lowercase `0x`-prefixed hex (66 chars).
pub type Hash32 = [u8; 32];

pub const META_PREFIX: &str = "/meta/";
pub const DATA_PREFIX: &str = "/data/";
pub const INDEX_PREFIX: &str = "/index/";

pub const KEY_LATEST_HEIGHT: &str = "/meta/lh";
pub const KEY_BLOCK_COUNT: &str = "/meta/bc";
pub const KEY_TX_COUNT: &str = "/meta/tc";

/// Render a 20-byte address as `0x` + 40 lowercase hex chars (42 chars
/// total).
pub fn fmt_address(addr: &Address) -> String {
    format!("0x{}", hex::encode(addr))
}

/// Render a 32-byte hash as `0x` + 64 lowercase hex chars (66 chars total).
pub fn fmt_hash(hash: &Hash32) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Parse a `0x`-prefixed 40-hex-char address.
pub fn parse_address(s: &str) -> Result<Address, KeyParseError> {
    parse_fixed_hex(s, 20).map(|bytes| {
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        out
    })
}

/// Parse a `0x`-prefixed 64-hex-char hash.
pub fn parse_hash(s: &str) -> Result<Hash32, KeyParseError> {
    parse_fixed_hex(s, 32).map(|bytes| {
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes);
        out
    })
}

fn parse_fixed_hex(s: &str, expected_len: usize) -> Result<Vec<u8>, KeyParseError> {
    let stripped = s.strip_prefix("0x").ok_or(KeyParseError::MalformedShape)?;
    if stripped.len() != expected_len * 2 {
        return Err(KeyParseError::MalformedShape);
    }
    hex::decode(stripped).map_err(|_| KeyParseError::MalformedShape)
}

/// `{u64}`: 20 decimal digits, zero-padded, so lexical order equals numeric
/// order.
pub fn fmt_u64(v: u64) -> String {
    format!("{:020}", v)
}

/// `{u32}`: 6 decimal digits, zero-padded.
pub fn fmt_u32(v: u32) -> String {
    format!("{:06}", v)
}

pub fn parse_u64(s: &str) -> Result<u64, KeyParseError> {
    if s.len() != 20 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeyParseError::MalformedShape);
    }
    s.parse().map_err(|_| KeyParseError::MalformedShape)
}

pub fn parse_u32(s: &str) -> Result<u32, KeyParseError> {
    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeyParseError::MalformedShape);
    }
    s.parse().map_err(|_| KeyParseError::MalformedShape)
}

/// Descending-height encoding: `u64::MAX - height` rendered as fixed-width
/// decimal, so ascending lexical order over the encoded field equals
/// descending logical order over `height` (§4.4, recent-first listings).
pub fn fmt_u64_desc(v: u64) -> String {
    fmt_u64(u64::MAX - v)
}

pub fn parse_u64_desc(s: &str) -> Result<u64, KeyParseError> {
    parse_u64(s).map(|encoded| u64::MAX - encoded)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum KeyParseError {
    #[error("key does not match the expected prefix")]
    PrefixMismatch,
    #[error("key field does not match the expected shape")]
    MalformedShape,
}

impl From<KeyParseError> for crate::error::StorageError {
    fn from(e: KeyParseError) -> Self {
        crate::error::StorageError::invalid_argument(e.to_string())
    }
}
