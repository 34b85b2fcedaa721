//! ABI, contract verification, token metadata, notification, and
//! internal-transaction keys — each a point lookup or a simple per-address
//! append-only log (§4.2).

use super::{fmt_address, fmt_u32, fmt_u64, Address, Hash32};

/// `/data/abi/{addr}` — raw ABI text, point lookup only.
pub fn abi_key(addr: &Address) -> String {
    format!("/data/abi/{}", fmt_address(addr))
}

/// `/data/verification/{addr}`.
pub fn verification_key(addr: &Address) -> String {
    format!("/data/verification/{}", fmt_address(addr))
}

/// `/data/tokenmeta/{token}`.
pub fn token_metadata_key(token: &Address) -> String {
    format!("/data/tokenmeta/{}", fmt_address(token))
}

/// `/data/notifications/{addr}/{u64 seq}`.
pub fn notification_key(addr: &Address, seq: u64) -> String {
    format!("/data/notifications/{}/{}", fmt_address(addr), fmt_u64(seq))
}

pub fn notification_prefix(addr: &Address) -> String {
    format!("/data/notifications/{}/", fmt_address(addr))
}

/// `/data/internaltx/{hash}/{u32 index}`.
pub fn internaltx_key(hash: &Hash32, index: u32) -> String {
    format!("/data/internaltx/{}/{}", super::fmt_hash(hash), fmt_u32(index))
}

pub fn internaltx_prefix(hash: &Hash32) -> String {
    format!("/data/internaltx/{}/", super::fmt_hash(hash))
}

/// `/index/internaltx/addr/{addr}/{hash}/{u32 index}`.
pub fn internaltx_by_addr_key(addr: &Address, hash: &Hash32, index: u32) -> String {
    format!("/index/internaltx/addr/{}/{}/{}", fmt_address(addr), super::fmt_hash(hash), fmt_u32(index))
}

pub fn internaltx_by_addr_prefix(addr: &Address) -> String {
    format!("/index/internaltx/addr/{}/", fmt_address(addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abi_and_verification_keys_are_distinct_namespaces() {
        let addr = [1u8; 20];
        assert_ne!(abi_key(&addr), verification_key(&addr));
        assert_ne!(abi_key(&addr), token_metadata_key(&addr));
    }

    #[test]
    fn notification_keys_sort_by_seq() {
        let addr = [2u8; 20];
        let a = notification_key(&addr, 0);
        let b = notification_key(&addr, 1);
        assert!(a < b);
        assert!(a.starts_with(&notification_prefix(&addr)));
    }

    #[test]
    fn internaltx_index_scoped_per_address() {
        let hash = [3u8; 32];
        let from = [4u8; 20];
        let to = [5u8; 20];
        let from_key = internaltx_by_addr_key(&from, &hash, 0);
        let to_key = internaltx_by_addr_key(&to, &hash, 0);
        assert_ne!(from_key, to_key);
        assert!(from_key.starts_with(&internaltx_by_addr_prefix(&from)));
        let primary = internaltx_key(&hash, 0);
        assert!(primary.starts_with(&internaltx_prefix(&hash)));
    }
}
