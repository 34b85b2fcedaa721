//! Secondary indexes keyed by address, balance, and log topic (§4.2).

use super::{fmt_address, fmt_u32, fmt_u64, Address, Hash32};

/// `/index/addr/{addr}/{seq}` — per-address monotonically increasing
/// sequence allocated by the write path.
pub fn addr_tx_key(addr: &Address, seq: u64) -> String {
    format!("/index/addr/{}/{}", fmt_address(addr), fmt_u64(seq))
}

pub fn addr_tx_prefix(addr: &Address) -> String {
    format!("/index/addr/{}/", fmt_address(addr))
}

/// `/index/balance/{addr}/latest`.
pub fn balance_latest_key(addr: &Address) -> String {
    format!("/index/balance/{}/latest", fmt_address(addr))
}

/// `/index/balance/{addr}/history/{seq}`.
pub fn balance_history_key(addr: &Address, seq: u64) -> String {
    format!("/index/balance/{}/history/{}", fmt_address(addr), fmt_u64(seq))
}

pub fn balance_history_prefix(addr: &Address) -> String {
    format!("/index/balance/{}/history/", fmt_address(addr))
}

/// The four log-topic positions a log entry is indexed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicSlot {
    Topic0,
    Topic1,
    Topic2,
    Topic3,
}

impl TopicSlot {
    fn segment(self) -> &'static str {
        match self {
            TopicSlot::Topic0 => "topic0",
            TopicSlot::Topic1 => "topic1",
            TopicSlot::Topic2 => "topic2",
            TopicSlot::Topic3 => "topic3",
        }
    }
}

/// `/index/logs/topicN/{hash}/{block}/{txIdx}/{logIdx}`.
pub fn log_topic_index_key(slot: TopicSlot, topic: &Hash32, block: u64, tx_idx: u32, log_idx: u32) -> String {
    format!(
        "/index/logs/{}/{}/{}/{}/{}",
        slot.segment(),
        super::fmt_hash(topic),
        fmt_u64(block),
        fmt_u32(tx_idx),
        fmt_u32(log_idx)
    )
}

pub fn log_topic_index_prefix(slot: TopicSlot, topic: &Hash32) -> String {
    format!("/index/logs/{}/{}/", slot.segment(), super::fmt_hash(topic))
}

/// `/index/logs/addr/{addr}/{block}/{txIdx}/{logIdx}`.
pub fn log_addr_index_key(addr: &Address, block: u64, tx_idx: u32, log_idx: u32) -> String {
    format!("/index/logs/addr/{}/{}/{}/{}", fmt_address(addr), fmt_u64(block), fmt_u32(tx_idx), fmt_u32(log_idx))
}

pub fn log_addr_index_prefix(addr: &Address) -> String {
    format!("/index/logs/addr/{}/", fmt_address(addr))
}

/// `/index/logs/block/{block}/{txIdx}/{logIdx}`.
pub fn log_block_index_key(block: u64, tx_idx: u32, log_idx: u32) -> String {
    format!("/index/logs/block/{}/{}/{}", fmt_u64(block), fmt_u32(tx_idx), fmt_u32(log_idx))
}

pub fn log_block_index_prefix(block: u64) -> String {
    format!("/index/logs/block/{}/", fmt_u64(block))
}
