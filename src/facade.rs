//! The public façade (§6.3): composes the backend, key schema, codec, and
//! read/write layers behind one handle. Capability groups (Base, Blocks,
//! Transactions, Receipts, Logs, ContractCreations, InternalTx,
//! ERC20Transfers, ERC721Transfers, Historical, Search, ABI,
//! ContractVerification, FeeDelegation, SystemContracts, WBFT, TokenHolders,
//! TokenMetadata, Notifications) are exposed as inherent methods on
//! [`Storage`] rather than as separate trait objects — the spec allows
//! either.

use crate::backend::{open_backend, Batch, KvBackend};
use crate::codec::{
    AbiRecord, ChainObjectCodec, ContractVerification, InternalTransaction, Notification, SetCodeAuthorization,
    SystemContractEvent, TokenMetadata,
};
use crate::config::BackendConfig;
use crate::error::{Result, StorageError};
use crate::keys::{self, index::TopicSlot, ActiveSetKind, Address, Hash32, SysEventKind};
use crate::read::{self, Cancellation, NeverCancelled, Page, SearchResult, SearchResultType};
use crate::write::{self, AddressSeq, IngestBatch, TxCounter, TxLocation};
use num_bigint::{BigInt, BigUint};

/// An open storage handle over chain-object types `B` (block), `T`
/// (transaction), `R` (receipt), encoded through `C`.
pub struct Storage<B, T, R, C> {
    backend: Box<dyn KvBackend>,
    codec: C,
    address_seq: AddressSeq,
    notification_seq: AddressSeq,
    tx_counter: TxCounter,
    _marker: std::marker::PhantomData<(B, T, R)>,
}

impl<B, T, R, C> Storage<B, T, R, C>
where
    C: ChainObjectCodec<B> + ChainObjectCodec<T> + ChainObjectCodec<R>,
{
    pub fn open(config: &BackendConfig, codec: C) -> Result<Self> {
        let backend = open_backend(config)?;
        let storage = Self {
            backend,
            codec,
            address_seq: AddressSeq::new(),
            notification_seq: AddressSeq::new(),
            tx_counter: TxCounter::uninitialized(),
            _marker: std::marker::PhantomData,
        };
        Ok(storage)
    }

    /// Migration call run on first open: scans all blocks and sums
    /// `len(transactions)` to seed `/meta/tc` and the in-memory atomic
    /// (§4.3's counter-initialization note). Callers that already trust a
    /// persisted counter should call [`Storage::seed_tx_counter`] instead.
    pub fn initialize_tx_counter_from_scan(&self, transactions_per_block: impl Fn(u64) -> Option<u64>) -> Result<()> {
        let mut total = 0u64;
        let mut height = 0u64;
        while let Some(count) = transactions_per_block(height) {
            total += count;
            height += 1;
        }
        self.seed_tx_counter(total);
        Ok(())
    }

    pub fn seed_tx_counter(&self, initial: u64) {
        self.tx_counter.seed(initial);
    }

    pub fn close(&self) -> Result<()> {
        self.backend.close()
    }

    pub fn is_read_only(&self) -> bool {
        self.backend.is_read_only()
    }

    // ---- Base -------------------------------------------------------

    pub fn new_ingest_batch(&self) -> IngestBatch<'_, B, T, R, C> {
        IngestBatch::new(self.backend.new_batch(), self.backend.as_ref(), &self.codec, &self.address_seq, &self.tx_counter)
    }

    pub fn get_latest_height(&self) -> Result<Option<u64>> {
        match self.backend.get(keys::KEY_LATEST_HEIGHT.as_bytes())? {
            Some(bytes) => Ok(Some(crate::codec::decode_u64(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_block_count(&self) -> Result<u64> {
        match self.backend.get(keys::KEY_BLOCK_COUNT.as_bytes())? {
            Some(bytes) => crate::codec::decode_u64(&bytes),
            None => Ok(0),
        }
    }

    /// `txCount == persisted value` while uninitialized; once seeded, the
    /// in-memory atomic is authoritative (§4.3, §9).
    pub fn get_transaction_count(&self) -> Result<u64> {
        if self.tx_counter.is_ready() {
            return Ok(self.tx_counter.get().max(0) as u64);
        }
        match self.backend.get(keys::KEY_TX_COUNT.as_bytes())? {
            Some(bytes) => crate::codec::decode_u64(&bytes),
            None => Ok(0),
        }
    }

    // ---- Blocks / Transactions / Receipts ----------------------------

    pub fn get_block(&self, height: u64) -> Result<Option<B>> {
        read::get_block(self.backend.as_ref(), &self.codec, height)
    }

    pub fn get_transaction(&self, hash: &Hash32) -> Result<Option<(T, TxLocation)>> {
        read::get_transaction(self.backend.as_ref(), &self.codec, hash)
    }

    pub fn get_receipt(&self, hash: &Hash32) -> Result<Option<(R, Option<Address>)>> {
        read::get_receipt(self.backend.as_ref(), &self.codec, hash)
    }

    pub fn get_receipts(&self, hashes: &[Hash32]) -> (Vec<Option<(R, Option<Address>)>>, Option<StorageError>) {
        let mut results = Vec::with_capacity(hashes.len());
        let mut first_error = None;
        for hash in hashes {
            match self.get_receipt(hash) {
                Ok(r) => results.push(r),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                    results.push(None);
                }
            }
        }
        (results, first_error)
    }

    // ---- Historical ---------------------------------------------------

    pub fn balance_at_block(&self, addr: &Address, target_block: u64) -> Result<BigInt> {
        read::balance_at_block(self.backend.as_ref(), addr, target_block)
    }

    pub fn get_address_balance(&self, addr: &Address, at_block: u64) -> Result<BigInt> {
        self.balance_at_block(addr, at_block)
    }

    pub fn blocks_by_time(&self, from_ts: u64, to_ts: u64, cancel: &dyn Cancellation) -> Result<Vec<u64>> {
        read::blocks_by_time(self.backend.as_ref(), from_ts, to_ts, cancel)
    }

    pub fn update_balance(&self, addr: &Address, block_number: u64, delta: &BigInt) -> Result<BigInt> {
        write::update_balance(self.backend.as_ref(), addr, block_number, delta, || self.address_seq.next(addr))
    }

    pub fn set_balance(&self, addr: &Address, block_number: u64, new_balance: &BigInt) -> Result<BigInt> {
        write::set_balance(self.backend.as_ref(), addr, block_number, new_balance, || self.address_seq.next(addr))
    }

    pub fn address_transactions(
        &self,
        addr: &Address,
        page: Page,
        predicate: impl Fn(&Hash32) -> bool,
        cancel: &dyn Cancellation,
    ) -> Result<Vec<Hash32>> {
        read::address_tx_filtered(self.backend.as_ref(), addr, page, predicate, cancel)
    }

    // ---- Logs -----------------------------------------------------------

    pub fn logs_by_topic(&self, slot: TopicSlot, topic: &Hash32, page: Page) -> Result<Vec<(u64, u32, u32)>> {
        read::logs_by_topic(self.backend.as_ref(), slot, topic, page)
    }

    pub fn logs_by_address(&self, addr: &Address, page: Page) -> Result<Vec<(u64, u32, u32)>> {
        read::logs_by_address(self.backend.as_ref(), addr, page)
    }

    pub fn logs_by_block(&self, block: u64, page: Page) -> Result<Vec<(u64, u32, u32)>> {
        read::logs_by_block(self.backend.as_ref(), block, page)
    }

    // ---- ERC20 / TokenHolders -------------------------------------------

    pub fn get_token_balance(&self, token: &Address, holder: &Address) -> Result<BigInt> {
        read::get_token_balance(self.backend.as_ref(), token, holder)
    }

    pub fn process_erc20_transfer(
        &self,
        token: &Address,
        from: Option<&Address>,
        to: Option<&Address>,
        amount: &BigInt,
        block_number: u64,
        block_timestamp: u64,
        tx_hash: &Hash32,
        log_idx: u32,
    ) -> Result<()> {
        write::process_erc20_transfer(self.backend.as_ref(), token, from, to, amount, block_number, block_timestamp, tx_hash, log_idx)
    }

    pub fn process_erc721_transfer(&self, token: &Address, from: Option<&Address>, to: &Address, token_id: &BigUint) -> Result<()> {
        write::process_erc721_transfer(self.backend.as_ref(), token, from, to, token_id)
    }

    pub fn get_token_holders(&self, token: &Address, page: Page) -> Result<Vec<Address>> {
        let prefix = keys::token_holder_by_balance_prefix(token);
        let entries = read::prefix_scan(self.backend.as_ref(), prefix.as_bytes(), page, &NeverCancelled)?;
        entries
            .into_iter()
            .map(|(key, _)| {
                let s = std::str::from_utf8(&key).map_err(|e| StorageError::codec("TokenHolderKey", e))?;
                let holder_hex = s.rsplit('/').next().ok_or_else(|| StorageError::invalid_argument("malformed holder key"))?;
                keys::parse_address(holder_hex).map_err(StorageError::from)
            })
            .collect()
    }

    pub fn get_token_holder_count(&self, token: &Address) -> Result<u64> {
        match self.backend.get(keys::token_holder_stats_key(token).as_bytes())? {
            Some(bytes) => Ok(crate::codec::TokenHolderStats::decode(&bytes)?.holder_count),
            None => Ok(0),
        }
    }

    // ---- FeeDelegation (EIP-7702) ---------------------------------------

    pub fn save_setcode_authorizations(&self, tx_hash: &Hash32, block_timestamp: u64, authorizations: &[SetCodeAuthorization]) -> Result<()> {
        let mut batch = self.backend.new_batch();
        write::save_setcode_authorizations(batch.as_mut(), self.backend.as_ref(), tx_hash, block_timestamp, authorizations)?;
        batch.commit()
    }

    pub fn get_setcode_stats(&self, addr: &Address) -> Result<Option<crate::codec::AddressSetCodeStats>> {
        match self.backend.get(keys::setcode_stats_key(addr).as_bytes())? {
            Some(bytes) => Ok(Some(crate::codec::AddressSetCodeStats::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_delegation_state(&self, addr: &Address) -> Result<Option<crate::codec::AddressDelegationState>> {
        match self.backend.get(keys::setcode_delegation_key(addr).as_bytes())? {
            Some(bytes) => Ok(Some(crate::codec::AddressDelegationState::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn set_delegation_state(&self, state: &crate::codec::AddressDelegationState) -> Result<()> {
        let addr = keys::parse_address(&state.address)?;
        self.backend.set(keys::setcode_delegation_key(&addr).as_bytes(), &state.encode()?)
    }

    // ---- Search -----------------------------------------------------------

    pub fn search(&self, query: &str, result_types: &[SearchResultType], limit: usize) -> Result<Vec<SearchResult>> {
        read::search(self.backend.as_ref(), query, result_types, limit)
    }

    // ---- WBFT -------------------------------------------------------------

    pub fn get_wbft_extra_bytes(&self, block: u64) -> Result<Option<Vec<u8>>> {
        self.backend.get(keys::wbft_extra_key(block).as_bytes())
    }

    pub fn set_wbft_extra_bytes(&self, block: u64, extra: &[u8]) -> Result<()> {
        self.backend.set(keys::wbft_extra_key(block).as_bytes(), extra)
    }

    // ---- Historical: block-by-timestamp ----------------------------------

    pub fn block_by_timestamp(&self, target_ts: u64) -> Result<Option<u64>> {
        read::block_by_timestamp(self.backend.as_ref(), target_ts)
    }

    // ---- SystemContracts ----------------------------------------------------

    pub fn record_syscontract_event(&self, kind: SysEventKind, actor: &Address, block: u64, seq: u64, event: &SystemContractEvent) -> Result<()> {
        let mut batch = self.backend.new_batch();
        write::record_syscontract_event(batch.as_mut(), kind, actor, block, seq, event)?;
        batch.commit()
    }

    pub fn syscontract_events_by_actor(&self, kind: SysEventKind, actor: &Address, page: Page) -> Result<Vec<SystemContractEvent>> {
        read::syscontract_events_by_actor(self.backend.as_ref(), kind, actor, page)
    }

    pub fn set_active_membership(&self, kind: ActiveSetKind, addr: &Address, active: bool) -> Result<()> {
        write::set_active_membership(self.backend.as_ref(), kind, addr, active)
    }

    pub fn is_active_member(&self, kind: ActiveSetKind, addr: &Address) -> Result<bool> {
        read::is_active_member(self.backend.as_ref(), kind, addr)
    }

    pub fn set_total_supply(&self, supply: &BigUint) -> Result<()> {
        write::set_total_supply(self.backend.as_ref(), supply)
    }

    pub fn get_total_supply(&self) -> Result<BigUint> {
        read::get_total_supply(self.backend.as_ref())
    }

    // ---- ABI / ContractVerification / TokenMetadata ------------------------

    pub fn set_abi(&self, record: &AbiRecord) -> Result<()> {
        write::set_abi(self.backend.as_ref(), record)
    }

    pub fn get_abi(&self, addr: &Address) -> Result<Option<AbiRecord>> {
        read::get_abi(self.backend.as_ref(), addr)
    }

    pub fn set_contract_verification(&self, record: &ContractVerification) -> Result<()> {
        write::set_contract_verification(self.backend.as_ref(), record)
    }

    pub fn get_contract_verification(&self, addr: &Address) -> Result<Option<ContractVerification>> {
        read::get_contract_verification(self.backend.as_ref(), addr)
    }

    pub fn set_token_metadata(&self, record: &TokenMetadata) -> Result<()> {
        write::set_token_metadata(self.backend.as_ref(), record)
    }

    pub fn get_token_metadata(&self, token: &Address) -> Result<Option<TokenMetadata>> {
        read::get_token_metadata(self.backend.as_ref(), token)
    }

    // ---- Notifications ------------------------------------------------------

    pub fn append_notification(&self, addr: &Address, kind: &str, payload: &str, created_at_block: u64) -> Result<u64> {
        write::append_notification(self.backend.as_ref(), &self.notification_seq, addr, kind, payload, created_at_block)
    }

    pub fn notifications_for_address(&self, addr: &Address, page: Page) -> Result<Vec<Notification>> {
        read::notifications_for_address(self.backend.as_ref(), addr, page)
    }

    // ---- InternalTx -----------------------------------------------------------

    pub fn add_internal_transaction(&self, tx_hash: &Hash32, record: &InternalTransaction) -> Result<()> {
        let mut batch = self.backend.new_batch();
        write::add_internal_transaction(batch.as_mut(), tx_hash, record)?;
        batch.commit()
    }

    pub fn internal_transactions_by_address(&self, addr: &Address, page: Page) -> Result<Vec<InternalTransaction>> {
        read::internal_transactions_by_address(self.backend.as_ref(), addr, page)
    }
}
