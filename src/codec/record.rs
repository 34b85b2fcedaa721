//! Typed records. Each pins exactly one encoding (§6.1): JSON for records
//! historically stored that way (token holder, system-contract events,
//! set-code authorizations), length-prefixed binary for the rest.

use crate::error::{Result, StorageError};
use byteorder::{BigEndian, ByteOrder};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

fn encode_len_prefixed(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + payload.len());
    let mut len_buf = [0u8; 4];
    BigEndian::write_u32(&mut len_buf, payload.len() as u32);
    out.extend_from_slice(&len_buf);
    out.extend_from_slice(payload);
    out
}

fn decode_len_prefixed<'a>(record_type: &'static str, bytes: &'a [u8]) -> Result<&'a [u8]> {
    if bytes.len() < 4 {
        return Err(StorageError::codec(record_type, LenPrefixTooShort));
    }
    let len = BigEndian::read_u32(&bytes[..4]) as usize;
    let payload = bytes
        .get(4..4 + len)
        .ok_or_else(|| StorageError::codec(record_type, LenPrefixTooShort))?;
    Ok(payload)
}

#[derive(Debug, thiserror::Error)]
#[error("length-prefixed record is shorter than its declared length")]
struct LenPrefixTooShort;

fn encode_bincode<T: Serialize>(record_type: &'static str, v: &T) -> Result<Vec<u8>> {
    let payload = bincode::serialize(v).map_err(|e| StorageError::codec(record_type, e))?;
    Ok(encode_len_prefixed(&payload))
}

fn decode_bincode<T: for<'de> Deserialize<'de>>(record_type: &'static str, bytes: &[u8]) -> Result<T> {
    let payload = decode_len_prefixed(record_type, bytes)?;
    bincode::deserialize(payload).map_err(|e| StorageError::codec(record_type, e))
}

fn encode_json<T: Serialize>(record_type: &'static str, v: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(v).map_err(|e| StorageError::codec(record_type, e))
}

fn decode_json<T: for<'de> Deserialize<'de>>(record_type: &'static str, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::codec(record_type, e))
}

/// A single balance-history snapshot (length-prefixed binary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub block_number: u64,
    pub balance: BigIntRecord,
    pub seq: u64,
}

impl BalanceSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_bincode("BalanceSnapshot", self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_bincode("BalanceSnapshot", bytes)
    }
}

/// `BigInt` wrapper carrying its own `Serialize`/`Deserialize` via decimal
/// string, so bincode can frame it without a custom visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigIntRecord(pub BigInt);

impl Serialize for BigIntRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for BigIntRecord {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<BigInt>().map(BigIntRecord).map_err(serde::de::Error::custom)
    }
}

/// Token holder data row (JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHolder {
    pub token: String,
    pub holder: String,
    pub balance: String,
    pub last_updated_block: u64,
}

impl TokenHolder {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_json("TokenHolder", self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_json("TokenHolder", bytes)
    }
}

/// Aggregate stats for a token's holder set (JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHolderStats {
    pub token: String,
    pub holder_count: u64,
    pub transfer_count: u64,
    pub last_activity_at: u64,
}

impl TokenHolderStats {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_json("TokenHolderStats", self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_json("TokenHolderStats", bytes)
    }
}

/// One EIP-7702 authorization tuple within a transaction (JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCodeAuthorization {
    pub tx_hash: String,
    pub auth_index: u16,
    pub chain_id: u64,
    pub authority: String,
    pub target: String,
    pub nonce: u64,
    pub block_number: u64,
    pub tx_index: u32,
    pub signature_r: String,
    pub signature_s: String,
    pub signature_v: u8,
    pub applied: bool,
    pub error_code: Option<String>,
}

impl SetCodeAuthorization {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_json("SetCodeAuthorization", self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_json("SetCodeAuthorization", bytes)
    }
}

/// Current delegation state for an EOA that has set code (length-prefixed
/// binary). Invariant: `has_delegation` iff `delegation_target` is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDelegationState {
    pub address: String,
    pub has_delegation: bool,
    pub delegation_target: Option<String>,
    pub last_updated_block: u64,
    pub last_updated_tx_hash: String,
}

impl AddressDelegationState {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_bincode("AddressDelegationState", self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_bincode("AddressDelegationState", bytes)
    }
}

/// Per-address set-code activity counters (length-prefixed binary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSetCodeStats {
    pub address: String,
    pub as_target_count: u64,
    pub as_authority_count: u64,
    pub current_delegation: Option<String>,
    pub last_activity_block: u64,
    pub last_activity_time: u64,
}

impl AddressSetCodeStats {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_bincode("AddressSetCodeStats", self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_bincode("AddressSetCodeStats", bytes)
    }
}

/// A decoded system-contract event (JSON, tagged by `kind`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SystemContractEvent {
    Mint { actor: String, amount: String },
    Burn { actor: String, amount: String },
    Proposal { proposer: String, proposal_id: u64 },
    Vote { voter: String, proposal_id: u64, support: bool },
    Blacklist { actor: String, added: bool },
    Member { actor: String, added: bool },
    GasTipUpdate { new_tip: String },
    EmergencyPause { paused: bool },
    DepositMintProposal { proposer: String, amount: String, recipient: String },
    ValidatorChange { actor: String, added: bool },
    MaxProposalsUpdate { new_max: u64 },
    ExecutionSkipped { proposal_id: u64, reason: String },
    AuthorizedAccount { actor: String, authorized: bool },
}

impl SystemContractEvent {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_json("SystemContractEvent", self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_json("SystemContractEvent", bytes)
    }
}

/// One ERC20 transfer event (JSON). Primary record behind the per-token/
/// from/to secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Transfer {
    pub token: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: String,
    pub block_number: u64,
}

impl Erc20Transfer {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_json("Erc20Transfer", self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_json("Erc20Transfer", bytes)
    }
}

/// A contract's ABI text, stored verbatim and opaque to the core beyond its
/// presence (JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiRecord {
    pub address: String,
    pub abi_json: String,
    pub updated_at_block: u64,
}

impl AbiRecord {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_json("AbiRecord", self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_json("AbiRecord", bytes)
    }
}

/// The result of an out-of-core source verification run (JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractVerification {
    pub address: String,
    pub source_hash: String,
    pub compiler_version: String,
    pub verified_at_block: u64,
    pub status: String,
}

impl ContractVerification {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_json("ContractVerification", self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_json("ContractVerification", bytes)
    }
}

/// Static token metadata (JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub token: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: Option<String>,
}

impl TokenMetadata {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_json("TokenMetadata", self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_json("TokenMetadata", bytes)
    }
}

/// One entry in a per-address append-only notification log (JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub address: String,
    pub seq: u64,
    pub kind: String,
    pub payload: String,
    pub created_at_block: u64,
}

impl Notification {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_json("Notification", self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_json("Notification", bytes)
    }
}

/// One call-frame record from a transaction's internal-call trace (JSON).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalTransaction {
    pub tx_hash: String,
    pub index: u32,
    pub from: String,
    pub to: Option<String>,
    pub value: String,
    pub kind: String,
}

impl InternalTransaction {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_json("InternalTransaction", self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode_json("InternalTransaction", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn balance_snapshot_round_trips() {
        let s = BalanceSnapshot { block_number: 10, balance: BigIntRecord(BigInt::from(-5)), seq: 3 };
        let encoded = s.encode().unwrap();
        assert_eq!(BalanceSnapshot::decode(&encoded).unwrap(), s);
    }

    #[test]
    fn token_holder_round_trips() {
        let h = TokenHolder {
            token: "0xabc".into(),
            holder: "0xdef".into(),
            balance: "1000".into(),
            last_updated_block: 7,
        };
        let encoded = h.encode().unwrap();
        assert_eq!(TokenHolder::decode(&encoded).unwrap(), h);
    }

    #[test]
    fn token_holder_stats_round_trips() {
        let s = TokenHolderStats { token: "0xabc".into(), holder_count: 3, transfer_count: 10, last_activity_at: 99 };
        let encoded = s.encode().unwrap();
        assert_eq!(TokenHolderStats::decode(&encoded).unwrap(), s);
    }

    #[test]
    fn setcode_authorization_round_trips() {
        let a = SetCodeAuthorization {
            tx_hash: "0x1".into(),
            auth_index: 0,
            chain_id: 1,
            authority: "0xa".into(),
            target: "0xb".into(),
            nonce: 1,
            block_number: 5,
            tx_index: 0,
            signature_r: "0xr".into(),
            signature_s: "0xs".into(),
            signature_v: 27,
            applied: true,
            error_code: None,
        };
        let encoded = a.encode().unwrap();
        assert_eq!(SetCodeAuthorization::decode(&encoded).unwrap(), a);
    }

    #[test]
    fn setcode_authorization_round_trips_with_error_code() {
        let mut a = SetCodeAuthorization {
            tx_hash: "0x1".into(),
            auth_index: 1,
            chain_id: 1,
            authority: "0xa".into(),
            target: "0xb".into(),
            nonce: 2,
            block_number: 5,
            tx_index: 0,
            signature_r: "0xr".into(),
            signature_s: "0xs".into(),
            signature_v: 28,
            applied: false,
            error_code: Some("nonce_mismatch".into()),
        };
        let encoded = a.encode().unwrap();
        assert_eq!(SetCodeAuthorization::decode(&encoded).unwrap(), a.clone());
        a.error_code = None;
        assert_ne!(SetCodeAuthorization::decode(&encoded).unwrap(), a);
    }

    #[test]
    fn delegation_state_round_trips_with_none() {
        let d = AddressDelegationState {
            address: "0xa".into(),
            has_delegation: false,
            delegation_target: None,
            last_updated_block: 0,
            last_updated_tx_hash: "0x0".into(),
        };
        let encoded = d.encode().unwrap();
        assert_eq!(AddressDelegationState::decode(&encoded).unwrap(), d);
    }

    #[test]
    fn delegation_state_round_trips_with_target() {
        let d = AddressDelegationState {
            address: "0xa".into(),
            has_delegation: true,
            delegation_target: Some("0xb".into()),
            last_updated_block: 12,
            last_updated_tx_hash: "0xdead".into(),
        };
        let encoded = d.encode().unwrap();
        assert_eq!(AddressDelegationState::decode(&encoded).unwrap(), d);
    }

    #[test]
    fn setcode_stats_round_trips() {
        let s = AddressSetCodeStats {
            address: "0xa".into(),
            as_target_count: 2,
            as_authority_count: 1,
            current_delegation: Some("0xb".into()),
            last_activity_block: 12,
            last_activity_time: 1_700_000_000,
        };
        let encoded = s.encode().unwrap();
        assert_eq!(AddressSetCodeStats::decode(&encoded).unwrap(), s);
    }

    #[test]
    fn erc20_transfer_round_trips() {
        let t = Erc20Transfer {
            token: "0xabc".into(),
            from: Some("0x1".into()),
            to: Some("0x2".into()),
            amount: "1000".into(),
            block_number: 5,
        };
        let encoded = t.encode().unwrap();
        assert_eq!(Erc20Transfer::decode(&encoded).unwrap(), t);
    }

    #[test]
    fn abi_record_round_trips() {
        let a = AbiRecord { address: "0xabc".into(), abi_json: "[]".into(), updated_at_block: 5 };
        let encoded = a.encode().unwrap();
        assert_eq!(AbiRecord::decode(&encoded).unwrap(), a);
    }

    #[test]
    fn contract_verification_round_trips() {
        let v = ContractVerification {
            address: "0xabc".into(),
            source_hash: "0xhash".into(),
            compiler_version: "0.8.24".into(),
            verified_at_block: 10,
            status: "verified".into(),
        };
        let encoded = v.encode().unwrap();
        assert_eq!(ContractVerification::decode(&encoded).unwrap(), v);
    }

    #[test]
    fn token_metadata_round_trips_with_no_supply() {
        let m = TokenMetadata { token: "0xabc".into(), name: "Coin".into(), symbol: "CN".into(), decimals: 18, total_supply: None };
        let encoded = m.encode().unwrap();
        assert_eq!(TokenMetadata::decode(&encoded).unwrap(), m);
    }

    #[test]
    fn notification_round_trips() {
        let n = Notification { address: "0xabc".into(), seq: 4, kind: "deposit".into(), payload: "{}".into(), created_at_block: 9 };
        let encoded = n.encode().unwrap();
        assert_eq!(Notification::decode(&encoded).unwrap(), n);
    }

    #[test]
    fn internal_transaction_round_trips() {
        let i = InternalTransaction {
            tx_hash: "0xabc".into(),
            index: 1,
            from: "0x1".into(),
            to: Some("0x2".into()),
            value: "10".into(),
            kind: "call".into(),
        };
        let encoded = i.encode().unwrap();
        assert_eq!(InternalTransaction::decode(&encoded).unwrap(), i);
    }

    #[test]
    fn system_contract_event_round_trips_each_variant() {
        let events = vec![
            SystemContractEvent::Mint { actor: "0xa".into(), amount: "1".into() },
            SystemContractEvent::Vote { voter: "0xb".into(), proposal_id: 1, support: true },
            SystemContractEvent::ExecutionSkipped { proposal_id: 2, reason: "quorum".into() },
        ];
        for e in events {
            let encoded = e.encode().unwrap();
            assert_eq!(SystemContractEvent::decode(&encoded).unwrap(), e);
        }
    }

    #[test]
    fn malformed_length_prefix_is_rejected() {
        assert!(BalanceSnapshot::decode(&[0xff, 0xff, 0xff, 0xff]).is_err());
    }
}
