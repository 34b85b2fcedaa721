//! ERC20/ERC721 transfer keys and token-holder keys, including the
//! inverted-balance descending-order index (§4.2).

use super::{fmt_address, fmt_u32, Address, Hash32};
use num_bigint::BigUint;

/// `2^256 - 1`, the ceiling an ERC20 balance is subtracted from to build the
/// descending-order holder index.
fn balance_ceiling() -> BigUint {
    (BigUint::from(1u8) << 256u32) - BigUint::from(1u8)
}

/// `/data/erc20/transfer/{hash}/{logIdx}`.
pub fn erc20_transfer_key(hash: &Hash32, log_idx: u32) -> String {
    format!("/data/erc20/transfer/{}/{}", super::fmt_hash(hash), fmt_u32(log_idx))
}

/// `/index/erc20/transfer/token/{token}/{hash}/{logIdx}`.
pub fn erc20_transfer_by_token_key(token: &Address, hash: &Hash32, log_idx: u32) -> String {
    format!(
        "/index/erc20/transfer/token/{}/{}/{}",
        fmt_address(token),
        super::fmt_hash(hash),
        fmt_u32(log_idx)
    )
}

pub fn erc20_transfer_by_token_prefix(token: &Address) -> String {
    format!("/index/erc20/transfer/token/{}/", fmt_address(token))
}

/// `/index/erc20/transfer/from/{addr}/{hash}/{logIdx}`.
pub fn erc20_transfer_by_from_key(from: &Address, hash: &Hash32, log_idx: u32) -> String {
    format!("/index/erc20/transfer/from/{}/{}/{}", fmt_address(from), super::fmt_hash(hash), fmt_u32(log_idx))
}

/// `/index/erc20/transfer/to/{addr}/{hash}/{logIdx}`.
pub fn erc20_transfer_by_to_key(to: &Address, hash: &Hash32, log_idx: u32) -> String {
    format!("/index/erc20/transfer/to/{}/{}/{}", fmt_address(to), super::fmt_hash(hash), fmt_u32(log_idx))
}

/// `/index/erc721/owner/{owner}/{token}/{tokenId}`.
pub fn erc721_owner_index_key(owner: &Address, token: &Address, token_id: &BigUint) -> String {
    format!("/index/erc721/owner/{}/{}/{}", fmt_address(owner), fmt_address(token), token_id)
}

pub fn erc721_owner_index_prefix(owner: &Address) -> String {
    format!("/index/erc721/owner/{}/", fmt_address(owner))
}

/// `/index/erc721/tokenowner/{token}/{tokenId}` — current-owner map.
pub fn erc721_token_owner_key(token: &Address, token_id: &BigUint) -> String {
    format!("/index/erc721/tokenowner/{}/{}", fmt_address(token), token_id)
}

/// `/data/token/holder/{token}/{holder}`.
pub fn token_holder_key(token: &Address, holder: &Address) -> String {
    format!("/data/token/holder/{}/{}", fmt_address(token), fmt_address(holder))
}

/// `/index/token/holder/token/{token}/{inverted balance, 64-hex}/{holder}`
/// — ascending lexical order over the inverted field equals descending
/// balance order.
pub fn token_holder_by_balance_key(token: &Address, balance: &BigUint, holder: &Address) -> String {
    let inverted = balance_ceiling() - balance;
    format!("/index/token/holder/token/{}/{:064x}/{}", fmt_address(token), inverted, fmt_address(holder))
}

pub fn token_holder_by_balance_prefix(token: &Address) -> String {
    format!("/index/token/holder/token/{}/", fmt_address(token))
}

/// `/index/token/holder/holder/{holder}/{token}`.
pub fn token_holder_by_holder_key(holder: &Address, token: &Address) -> String {
    format!("/index/token/holder/holder/{}/{}", fmt_address(holder), fmt_address(token))
}

/// `/data/token/holderstats/{token}`.
pub fn token_holder_stats_key(token: &Address) -> String {
    format!("/data/token/holderstats/{}", fmt_address(token))
}
