//! EIP-7702 set-code authorization keys: primary storage plus the four
//! secondary indexes (target, authority, block, tx) (§4.2).

use super::{fmt_address, Address, Hash32};

fn hex16(v: u64) -> String {
    format!("{:016x}", v)
}

fn hex8(v: u32) -> String {
    format!("{:08x}", v)
}

fn hex4(v: u16) -> String {
    format!("{:04x}", v)
}

fn dec4(v: u16) -> String {
    format!("{:04}", v)
}

/// `/data/setcode/auth/{hash}/{authIdx}` — `authIdx` is decimal, 4 digits.
pub fn setcode_auth_key(hash: &Hash32, auth_idx: u16) -> String {
    format!("/data/setcode/auth/{}/{}", super::fmt_hash(hash), dec4(auth_idx))
}

pub fn setcode_auth_prefix(hash: &Hash32) -> String {
    format!("/data/setcode/auth/{}/", super::fmt_hash(hash))
}

/// `/data/setcode/delegation/{addr}` — current delegation state.
pub fn setcode_delegation_key(addr: &Address) -> String {
    format!("/data/setcode/delegation/{}", fmt_address(addr))
}

/// `/data/setcode/stats/{addr}`.
pub fn setcode_stats_key(addr: &Address) -> String {
    format!("/data/setcode/stats/{}", fmt_address(addr))
}

/// `/index/setcode/target/{addr}/{block 16-hex}/{txIdx 8-hex}/{authIdx
/// 4-hex}`.
pub fn setcode_by_target_key(target: &Address, block: u64, tx_idx: u32, auth_idx: u16) -> String {
    format!("/index/setcode/target/{}/{}/{}/{}", fmt_address(target), hex16(block), hex8(tx_idx), hex4(auth_idx))
}

pub fn setcode_by_target_prefix(target: &Address) -> String {
    format!("/index/setcode/target/{}/", fmt_address(target))
}

/// `/index/setcode/authority/{addr}/{block 16-hex}/{txIdx 8-hex}/{authIdx
/// 4-hex}` — symmetric with by-target.
pub fn setcode_by_authority_key(authority: &Address, block: u64, tx_idx: u32, auth_idx: u16) -> String {
    format!("/index/setcode/authority/{}/{}/{}/{}", fmt_address(authority), hex16(block), hex8(tx_idx), hex4(auth_idx))
}

pub fn setcode_by_authority_prefix(authority: &Address) -> String {
    format!("/index/setcode/authority/{}/", fmt_address(authority))
}

/// `/index/setcode/block/{block 16-hex}/{txIdx 8-hex}/{authIdx 4-hex}`.
pub fn setcode_by_block_key(block: u64, tx_idx: u32, auth_idx: u16) -> String {
    format!("/index/setcode/block/{}/{}/{}", hex16(block), hex8(tx_idx), hex4(auth_idx))
}

pub fn setcode_by_block_prefix(block: u64) -> String {
    format!("/index/setcode/block/{}/", hex16(block))
}

/// `/index/setcode/tx/{hash}/{authIdx 4-hex}`.
pub fn setcode_by_tx_key(hash: &Hash32, auth_idx: u16) -> String {
    format!("/index/setcode/tx/{}/{}", super::fmt_hash(hash), hex4(auth_idx))
}

pub fn setcode_by_tx_prefix(hash: &Hash32) -> String {
    format!("/index/setcode/tx/{}/", super::fmt_hash(hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_and_authority_indexes_are_symmetric_but_distinct() {
        let addr = [1u8; 20];
        let hash = [2u8; 32];
        let _ = hash;
        let target = setcode_by_target_key(&addr, 10, 0, 0);
        let authority = setcode_by_authority_key(&addr, 10, 0, 0);
        assert_ne!(target, authority);
        assert!(target.starts_with(&setcode_by_target_prefix(&addr)));
        assert!(authority.starts_with(&setcode_by_authority_prefix(&addr)));
    }

    #[test]
    fn by_block_keys_sort_by_block_then_tx_then_auth() {
        let a = setcode_by_block_key(1, 0, 0);
        let b = setcode_by_block_key(1, 0, 1);
        let c = setcode_by_block_key(2, 0, 0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn auth_key_shares_hash_prefix() {
        let hash = [9u8; 32];
        let k0 = setcode_auth_key(&hash, 0);
        let k1 = setcode_auth_key(&hash, 1);
        assert_ne!(k0, k1);
        assert!(k0.starts_with(&setcode_auth_prefix(&hash)));
    }
}
