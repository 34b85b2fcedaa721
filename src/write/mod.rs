//! L2: the block-ingestion batch and the derived-state direct writes
//! (§4.3).

use crate::backend::Batch;
use crate::codec::{scalar, AbiRecord, AddressDelegationState, AddressSetCodeStats, BalanceSnapshot, BigIntRecord,
    ChainObjectCodec, ContractVerification, Erc20Transfer, InternalTransaction, Notification, SetCodeAuthorization,
    SystemContractEvent, TokenHolder, TokenHolderStats, TokenMetadata, PRESENCE_MARKER};
use crate::error::{Result, StorageError};
use crate::keys::{self, ActiveSetKind, Address, Hash32, SysEventKind};
use num_bigint::{BigInt, BigUint};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

/// Accessor seam onto an otherwise-opaque receipt type `R`, needed to
/// validate a receipt before it is staged (§3, §4.3).
pub trait ReceiptFields {
    fn status(&self) -> u8;
    fn gas_used(&self) -> u64;
    fn cumulative_gas_used(&self) -> u64;
}

/// Accessor seam onto an otherwise-opaque block type `B`, needed to recover
/// the hash a staged block deletion must also remove from the hash index.
pub trait BlockFields {
    fn block_hash(&self) -> Hash32;
}

/// Where a transaction lives: its containing block height and its index
/// within that block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxLocation {
    pub height: u64,
    pub index: u64,
}

/// Process-wide per-address transaction-index sequence allocator (§5.2).
#[derive(Default)]
pub struct AddressSeq {
    seqs: Mutex<HashMap<Address, u64>>,
}

impl AddressSeq {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate and return the next sequence number for `addr`, starting at
    /// 0.
    pub fn next(&self, addr: &Address) -> u64 {
        let mut seqs = self.seqs.lock().unwrap();
        let entry = seqs.entry(*addr).or_insert(0);
        let seq = *entry;
        *entry += 1;
        seq
    }
}

/// The transaction-count atomic cell and its "ready" flag (§4.3, §9).
pub struct TxCounter {
    value: AtomicI64,
    ready: std::sync::atomic::AtomicBool,
}

impl TxCounter {
    pub fn uninitialized() -> Self {
        Self { value: AtomicI64::new(0), ready: std::sync::atomic::AtomicBool::new(false) }
    }

    pub fn seed(&self, initial: u64) {
        self.value.store(initial as i64, Ordering::SeqCst);
        self.ready.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn add(&self, delta: i64) -> i64 {
        self.value.fetch_add(delta, Ordering::SeqCst) + delta
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }
}

/// A staged block-ingestion batch (§4.3). Not `Sync`: built and committed by
/// a single thread, so its internal bookkeeping needs no lock of its own —
/// only the address-sequence map it calls into is shared.
pub struct IngestBatch<'a, B, T, R, C> {
    inner: Box<dyn Batch + 'a>,
    backend: &'a dyn crate::backend::KvBackend,
    codec: &'a C,
    address_seq: &'a AddressSeq,
    tx_counter: &'a TxCounter,
    tx_count: i64,
    _marker: std::marker::PhantomData<(B, T, R)>,
}

impl<'a, B, T, R, C> IngestBatch<'a, B, T, R, C>
where
    C: ChainObjectCodec<B> + ChainObjectCodec<T> + ChainObjectCodec<R>,
{
    pub fn new(
        inner: Box<dyn Batch + 'a>,
        backend: &'a dyn crate::backend::KvBackend,
        codec: &'a C,
        address_seq: &'a AddressSeq,
        tx_counter: &'a TxCounter,
    ) -> Self {
        Self { inner, backend, codec, address_seq, tx_counter, tx_count: 0, _marker: std::marker::PhantomData }
    }

    pub fn set_latest_height(&mut self, height: u64) {
        self.inner.set(keys::KEY_LATEST_HEIGHT.as_bytes(), &scalar::encode_u64(height));
    }

    /// Writes block data, the block-hash→height index, and recursively
    /// stages every transaction in `transactions` (§4.3's non-reentrant
    /// recursion note: this call does not hold any lock the nested
    /// `set_transaction` calls would need, so there is nothing to release).
    pub fn set_block(&mut self, height: u64, block_hash: &Hash32, block: &B, transactions: &[(T, Hash32)]) -> Result<()> {
        let encoded = self.codec.encode(block)?;
        self.inner.set(keys::block_key(height).as_bytes(), &encoded);
        self.inner.set(keys::block_hash_index_key(block_hash).as_bytes(), &scalar::encode_u64(height));
        for (index, (tx, tx_hash)) in transactions.iter().enumerate() {
            self.set_transaction(height, index as u64, tx, tx_hash)?;
        }
        Ok(())
    }

    /// Writes tx data and the tx-hash→location index; increments the
    /// batch's `txCount` by 1.
    pub fn set_transaction(&mut self, height: u64, index: u64, tx: &T, tx_hash: &Hash32) -> Result<()> {
        let encoded = self.codec.encode(tx)?;
        self.inner.set(keys::tx_key(height, index).as_bytes(), &encoded);
        let mut loc = Vec::with_capacity(16);
        loc.extend_from_slice(&scalar::encode_u64(height));
        loc.extend_from_slice(&scalar::encode_u64(index));
        self.inner.set(keys::tx_hash_index_key(tx_hash).as_bytes(), &loc);
        self.tx_count += 1;
        Ok(())
    }

    /// Allocates the next per-address sequence and writes one key under
    /// `/index/addr/{addr}/{seq}`.
    pub fn add_transaction_to_address_index(&mut self, addr: &Address, tx_hash: &Hash32) {
        let seq = self.address_seq.next(addr);
        self.inner.set(keys::addr_tx_key(addr, seq).as_bytes(), tx_hash);
    }

    /// If `txCount > 0`, atomically adds it to the persistent counter
    /// (incrementing the in-memory atomic and writing `/meta/tc`), then
    /// commits the underlying batch durably. On failure, subtracts the
    /// delta back — the counter reflects only durable writes.
    pub fn commit(&mut self) -> Result<()> {
        let start = std::time::Instant::now();
        if self.tx_count > 0 {
            let new_total = self.tx_counter.add(self.tx_count);
            self.inner.set(keys::KEY_TX_COUNT.as_bytes(), &scalar::encode_u64(new_total as u64));
        }
        match self.inner.commit() {
            Ok(()) => {
                crate::metrics::record_batch_commit("ok", start.elapsed().as_secs_f64());
                Ok(())
            }
            Err(e) => {
                if self.tx_count > 0 {
                    self.tx_counter.add(-self.tx_count);
                    crate::metrics::record_counter_rollback();
                }
                crate::metrics::record_batch_commit("failed", start.elapsed().as_secs_f64());
                Err(e)
            }
        }
    }

    pub fn close(&mut self) {
        self.inner.close();
    }

    pub fn tx_count(&self) -> i64 {
        self.tx_count
    }
}

impl<'a, B, T, R, C> IngestBatch<'a, B, T, R, C>
where
    C: ChainObjectCodec<B> + ChainObjectCodec<T> + ChainObjectCodec<R>,
    R: ReceiptFields,
{
    /// Validates `status ∈ {0,1}`, `cumulativeGasUsed ≥ gasUsed`, and a
    /// non-zero tx hash (InvalidReceipt on failure), writes the receipt,
    /// and, if `contract_address` is non-zero, writes the contract-address
    /// side entry.
    pub fn set_receipt(&mut self, tx_hash: &Hash32, receipt: &R, contract_address: Option<&Address>) -> Result<()> {
        if receipt.status() > 1 {
            return Err(StorageError::InvalidReceipt(format!("status must be 0 or 1, got {}", receipt.status())));
        }
        if receipt.cumulative_gas_used() < receipt.gas_used() {
            return Err(StorageError::InvalidReceipt(format!(
                "cumulativeGasUsed {} is less than gasUsed {}",
                receipt.cumulative_gas_used(),
                receipt.gas_used()
            )));
        }
        if tx_hash == &[0u8; 32] {
            return Err(StorageError::InvalidReceipt("txHash must be non-zero".to_string()));
        }
        let encoded = self.codec.encode(receipt)?;
        self.inner.set(keys::receipt_key(tx_hash).as_bytes(), &encoded);
        if let Some(addr) = contract_address {
            if addr != &[0u8; 20] {
                self.inner.set(keys::contract_addr_key(tx_hash).as_bytes(), &keys::fmt_address(addr).into_bytes());
            }
        }
        Ok(())
    }
}

impl<'a, B, T, R, C> IngestBatch<'a, B, T, R, C>
where
    C: ChainObjectCodec<B> + ChainObjectCodec<T> + ChainObjectCodec<R>,
    B: BlockFields,
{
    /// Best-effort: reads the block outside the batch lock (the backend is
    /// internally synchronized, so this is a plain `get`), stages deletion
    /// of block data and the block-hash index. Not-found is success.
    pub fn delete_block(&mut self, height: u64) -> Result<()> {
        let block_bytes = self.backend.get(keys::block_key(height).as_bytes())?;
        let Some(block_bytes) = block_bytes else {
            return Ok(());
        };
        let block: B = self.codec.decode(&block_bytes)?;
        self.inner.delete(keys::block_key(height).as_bytes());
        self.inner.delete(keys::block_hash_index_key(&block.block_hash()).as_bytes());
        Ok(())
    }
}

/// *Update balance* (§4.3): read latest, compute `new = latest + delta`; if
/// negative, fail with an invariant error; append a history snapshot under
/// the next sequence; overwrite the latest cell. Not atomic across the two
/// cells — the history row is authoritative and the latest cell is a cache.
pub fn update_balance(
    backend: &dyn crate::backend::KvBackend,
    addr: &Address,
    block_number: u64,
    delta: &BigInt,
    next_seq: impl FnOnce() -> u64,
) -> Result<BigInt> {
    let latest = read_latest_balance(backend, addr)?.unwrap_or_else(|| BigInt::from(0));
    let new_balance = &latest + delta;
    if new_balance < BigInt::from(0) {
        return Err(StorageError::invalid_argument(format!(
            "balance update for {} would go negative: {} + {} = {}",
            keys::fmt_address(addr),
            latest,
            delta,
            new_balance
        )));
    }
    let seq = next_seq();
    let snapshot = BalanceSnapshot { block_number, balance: BigIntRecord(new_balance.clone()), seq };
    backend.set(keys::balance_history_key(addr, seq).as_bytes(), &snapshot.encode()?)?;
    backend.set(keys::balance_latest_key(addr).as_bytes(), &snapshot.encode()?)?;
    Ok(new_balance)
}

/// *Set balance*: computes `delta = new - current` and delegates to
/// [`update_balance`] with that delta.
pub fn set_balance(
    backend: &dyn crate::backend::KvBackend,
    addr: &Address,
    block_number: u64,
    new_balance: &BigInt,
    next_seq: impl FnOnce() -> u64,
) -> Result<BigInt> {
    let current = read_latest_balance(backend, addr)?.unwrap_or_else(|| BigInt::from(0));
    let delta = new_balance - &current;
    update_balance(backend, addr, block_number, &delta, next_seq)
}

fn read_latest_balance(backend: &dyn crate::backend::KvBackend, addr: &Address) -> Result<Option<BigInt>> {
    match backend.get(keys::balance_latest_key(addr).as_bytes())? {
        Some(bytes) => Ok(Some(BalanceSnapshot::decode(&bytes)?.balance.0)),
        None => Ok(None),
    }
}

/// *Token holder update* (§4.3): zero/negative new balance deletes the data
/// row and both indexes and decrements `holderCount`; otherwise writes the
/// new data row and indexes, incrementing `holderCount` only for a new
/// holder. All staged in one batch and committed durably by the caller.
pub fn update_token_holder(
    batch: &mut dyn Batch,
    backend: &dyn crate::backend::KvBackend,
    token: &Address,
    holder: &Address,
    old_balance: &BigInt,
    new_balance: &BigInt,
    block_number: u64,
    block_timestamp: u64,
) -> Result<()> {
    let was_holder = *old_balance > BigInt::from(0);
    let is_holder = *new_balance > BigInt::from(0);

    if !is_holder {
        batch.delete(keys::token_holder_key(token, holder).as_bytes());
        if was_holder {
            let old_unsigned = old_balance.to_biguint().unwrap_or_default();
            batch.delete(keys::token_holder_by_balance_key(token, &old_unsigned, holder).as_bytes());
        }
        batch.delete(keys::token_holder_by_holder_key(holder, token).as_bytes());
        if was_holder {
            bump_holder_count(batch, backend, token, -1, block_timestamp)?;
        }
        return Ok(());
    }

    if was_holder {
        let old_unsigned = old_balance.to_biguint().unwrap_or_default();
        batch.delete(keys::token_holder_by_balance_key(token, &old_unsigned, holder).as_bytes());
    }
    let new_unsigned = new_balance.to_biguint().unwrap_or_default();
    let record = TokenHolder {
        token: keys::fmt_address(token),
        holder: keys::fmt_address(holder),
        balance: new_balance.to_string(),
        last_updated_block: block_number,
    };
    batch.set(keys::token_holder_key(token, holder).as_bytes(), &record.encode()?);
    batch.set(keys::token_holder_by_balance_key(token, &new_unsigned, holder).as_bytes(), &[PRESENCE_MARKER]);
    batch.set(keys::token_holder_by_holder_key(holder, token).as_bytes(), &[PRESENCE_MARKER]);
    if !was_holder {
        bump_holder_count(batch, backend, token, 1, block_timestamp)?;
    }
    Ok(())
}

fn empty_holder_stats(token: &Address) -> TokenHolderStats {
    TokenHolderStats { token: keys::fmt_address(token), holder_count: 0, transfer_count: 0, last_activity_at: 0 }
}

fn bump_holder_count(
    batch: &mut dyn Batch,
    backend: &dyn crate::backend::KvBackend,
    token: &Address,
    delta: i64,
    block_timestamp: u64,
) -> Result<()> {
    let key = keys::token_holder_stats_key(token);
    let mut stats = match backend.get(key.as_bytes())? {
        Some(bytes) => TokenHolderStats::decode(&bytes)?,
        None => empty_holder_stats(token),
    };
    stats.holder_count = (stats.holder_count as i64 + delta).max(0) as u64;
    stats.last_activity_at = block_timestamp;
    batch.set(key.as_bytes(), &stats.encode()?);
    Ok(())
}

/// *ERC20 transfer processing* (§4.3): decrements the sender (clamped at 0
/// on underflow) unless this is a mint, increments the receiver unless this
/// is a burn, stages the primary transfer record plus its three secondary
/// indexes, and increments `stats.transferCount`.
pub fn process_erc20_transfer(
    backend: &dyn crate::backend::KvBackend,
    token: &Address,
    from: Option<&Address>,
    to: Option<&Address>,
    amount: &BigInt,
    block_number: u64,
    block_timestamp: u64,
    tx_hash: &Hash32,
    log_idx: u32,
) -> Result<()> {
    if let Some(from) = from {
        let current = read_token_balance(backend, token, from)?;
        let clamped_delta = if current < *amount { -current.clone() } else { -amount.clone() };
        let new_balance = &current + &clamped_delta;
        update_balance_row(backend, token, from, new_balance, block_number, block_timestamp)?;
    }
    if let Some(to) = to {
        let current = read_token_balance(backend, token, to)?;
        let new_balance = &current + amount;
        update_balance_row(backend, token, to, new_balance, block_number, block_timestamp)?;
    }

    let record = Erc20Transfer {
        token: keys::fmt_address(token),
        from: from.map(keys::fmt_address),
        to: to.map(keys::fmt_address),
        amount: amount.to_string(),
        block_number,
    };
    let mut batch = backend.new_batch();
    batch.set(keys::erc20_transfer_key(tx_hash, log_idx).as_bytes(), &record.encode()?);
    batch.set(keys::erc20_transfer_by_token_key(token, tx_hash, log_idx).as_bytes(), &[PRESENCE_MARKER]);
    if let Some(from) = from {
        batch.set(keys::erc20_transfer_by_from_key(from, tx_hash, log_idx).as_bytes(), &[PRESENCE_MARKER]);
    }
    if let Some(to) = to {
        batch.set(keys::erc20_transfer_by_to_key(to, tx_hash, log_idx).as_bytes(), &[PRESENCE_MARKER]);
    }
    batch.commit()?;

    bump_transfer_count(backend, token, block_timestamp)
}

/// *ERC721 transfer processing* (§4.3): deletes the prior owner's
/// reverse-index entry (if any), then writes the new owner's reverse-index
/// entry and the current-owner map.
pub fn process_erc721_transfer(
    backend: &dyn crate::backend::KvBackend,
    token: &Address,
    from: Option<&Address>,
    to: &Address,
    token_id: &BigUint,
) -> Result<()> {
    let mut batch = backend.new_batch();
    if let Some(from) = from {
        batch.delete(keys::erc721_owner_index_key(from, token, token_id).as_bytes());
    }
    batch.set(keys::erc721_owner_index_key(to, token, token_id).as_bytes(), &[PRESENCE_MARKER]);
    batch.set(keys::erc721_token_owner_key(token, token_id).as_bytes(), &keys::fmt_address(to).into_bytes());
    batch.commit()
}

fn read_token_balance(backend: &dyn crate::backend::KvBackend, token: &Address, holder: &Address) -> Result<BigInt> {
    match backend.get(keys::token_holder_key(token, holder).as_bytes())? {
        Some(bytes) => {
            let record = TokenHolder::decode(&bytes)?;
            record.balance.parse::<BigInt>().map_err(|e| StorageError::internal(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())))
        }
        None => Ok(BigInt::from(0)),
    }
}

fn update_balance_row(
    backend: &dyn crate::backend::KvBackend,
    token: &Address,
    holder: &Address,
    new_balance: BigInt,
    block_number: u64,
    block_timestamp: u64,
) -> Result<()> {
    let old_balance = read_token_balance(backend, token, holder)?;
    let mut batch = backend.new_batch();
    update_token_holder(batch.as_mut(), backend, token, holder, &old_balance, &new_balance, block_number, block_timestamp)?;
    batch.commit()
}

fn bump_transfer_count(backend: &dyn crate::backend::KvBackend, token: &Address, block_timestamp: u64) -> Result<()> {
    let key = keys::token_holder_stats_key(token);
    let mut stats = match backend.get(key.as_bytes())? {
        Some(bytes) => TokenHolderStats::decode(&bytes)?,
        None => empty_holder_stats(token),
    };
    stats.transfer_count += 1;
    stats.last_activity_at = block_timestamp;
    backend.set(key.as_bytes(), &stats.encode()?)
}

fn empty_setcode_stats(addr: &Address) -> AddressSetCodeStats {
    AddressSetCodeStats {
        address: keys::fmt_address(addr),
        as_target_count: 0,
        as_authority_count: 0,
        current_delegation: None,
        last_activity_block: 0,
        last_activity_time: 0,
    }
}

fn update_setcode_stats(
    batch: &mut dyn Batch,
    backend: &dyn crate::backend::KvBackend,
    addr: &Address,
    block_number: u64,
    block_timestamp: u64,
    apply: impl FnOnce(&mut AddressSetCodeStats),
) -> Result<()> {
    let key = keys::setcode_stats_key(addr);
    let mut stats = match backend.get(key.as_bytes())? {
        Some(bytes) => AddressSetCodeStats::decode(&bytes)?,
        None => empty_setcode_stats(addr),
    };
    apply(&mut stats);
    stats.last_activity_block = block_number;
    stats.last_activity_time = block_timestamp;
    batch.set(key.as_bytes(), &stats.encode()?);
    Ok(())
}

/// *SetCode authorization save* (§4.3): one primary key plus the four
/// secondary index keys (target, authority, block, tx). Loops over a slice
/// in batch mode; also updates the authority's and target's
/// `AddressSetCodeStats`, and, when the authorization was applied, the
/// target's `AddressDelegationState`.
pub fn save_setcode_authorizations(
    batch: &mut dyn Batch,
    backend: &dyn crate::backend::KvBackend,
    tx_hash: &Hash32,
    block_timestamp: u64,
    authorizations: &[SetCodeAuthorization],
) -> Result<()> {
    for auth in authorizations {
        let target = keys::parse_address(&auth.target)?;
        let authority = keys::parse_address(&auth.authority)?;
        batch.set(keys::setcode_auth_key(tx_hash, auth.auth_index).as_bytes(), &auth.encode()?);
        batch.set(
            keys::setcode_by_target_key(&target, auth.block_number, auth.tx_index, auth.auth_index).as_bytes(),
            &[PRESENCE_MARKER],
        );
        batch.set(
            keys::setcode_by_authority_key(&authority, auth.block_number, auth.tx_index, auth.auth_index).as_bytes(),
            &[PRESENCE_MARKER],
        );
        batch.set(
            keys::setcode_by_block_key(auth.block_number, auth.tx_index, auth.auth_index).as_bytes(),
            &[PRESENCE_MARKER],
        );
        batch.set(keys::setcode_by_tx_key(tx_hash, auth.auth_index).as_bytes(), &[PRESENCE_MARKER]);

        update_setcode_stats(batch, backend, &authority, auth.block_number, block_timestamp, |s| {
            s.as_authority_count += 1;
        })?;
        update_setcode_stats(batch, backend, &target, auth.block_number, block_timestamp, |s| {
            s.as_target_count += 1;
            if auth.applied {
                s.current_delegation = Some(auth.authority.clone());
            }
        })?;

        if auth.applied {
            let delegation = AddressDelegationState {
                address: auth.target.clone(),
                has_delegation: true,
                delegation_target: Some(auth.authority.clone()),
                last_updated_block: auth.block_number,
                last_updated_tx_hash: keys::fmt_hash(tx_hash),
            };
            batch.set(keys::setcode_delegation_key(&target).as_bytes(), &delegation.encode()?);
        }
    }
    Ok(())
}

/// *System-contract event record* (§4.3): one primary key under
/// `/data/syscontracts/{kind}/...` plus one per-actor secondary index key.
pub fn record_syscontract_event(
    batch: &mut dyn Batch,
    kind: SysEventKind,
    actor: &Address,
    block: u64,
    seq: u64,
    event: &SystemContractEvent,
) -> Result<()> {
    batch.set(keys::syscontracts_event_key(kind, block, seq).as_bytes(), &event.encode()?);
    batch.set(keys::syscontracts_actor_index_key(kind, actor, block, seq).as_bytes(), &[PRESENCE_MARKER]);
    Ok(())
}

/// Active-set membership: a single-key overwrite (set or delete).
pub fn set_active_membership(backend: &dyn crate::backend::KvBackend, kind: ActiveSetKind, addr: &Address, active: bool) -> Result<()> {
    let key = keys::syscontracts_active_key(kind, addr);
    if active {
        backend.set(key.as_bytes(), &[PRESENCE_MARKER])
    } else {
        backend.delete(key.as_bytes())
    }
}

/// Total supply: a single-key overwrite.
pub fn set_total_supply(backend: &dyn crate::backend::KvBackend, supply: &BigUint) -> Result<()> {
    backend.set(keys::syscontracts_total_supply_key().as_bytes(), &scalar::encode_biguint(supply))
}

/// *ABI / contract verification / token metadata set* (§4.3): a single
/// primary-key overwrite; no secondary index, point lookup only.
pub fn set_abi(backend: &dyn crate::backend::KvBackend, record: &AbiRecord) -> Result<()> {
    let addr = keys::parse_address(&record.address)?;
    backend.set(keys::abi_key(&addr).as_bytes(), &record.encode()?)
}

pub fn set_contract_verification(backend: &dyn crate::backend::KvBackend, record: &ContractVerification) -> Result<()> {
    let addr = keys::parse_address(&record.address)?;
    backend.set(keys::verification_key(&addr).as_bytes(), &record.encode()?)
}

pub fn set_token_metadata(backend: &dyn crate::backend::KvBackend, record: &TokenMetadata) -> Result<()> {
    let token = keys::parse_address(&record.token)?;
    backend.set(keys::token_metadata_key(&token).as_bytes(), &record.encode()?)
}

/// *Notification append* (§4.3): allocates the next per-address sequence
/// from `seq` (the same kind of per-address counter as the address→tx
/// index, but a distinct instance) and writes one key.
pub fn append_notification(
    backend: &dyn crate::backend::KvBackend,
    seq: &AddressSeq,
    addr: &Address,
    kind: &str,
    payload: &str,
    created_at_block: u64,
) -> Result<u64> {
    let next = seq.next(addr);
    let record = Notification {
        address: keys::fmt_address(addr),
        seq: next,
        kind: kind.to_string(),
        payload: payload.to_string(),
        created_at_block,
    };
    backend.set(keys::notification_key(addr, next).as_bytes(), &record.encode()?)?;
    Ok(next)
}

/// *Internal transaction record* (§4.3): one primary key per `(txHash,
/// index)` plus a per-address secondary index entry for each of `from` and
/// (if present) `to`.
pub fn add_internal_transaction(batch: &mut dyn Batch, tx_hash: &Hash32, record: &InternalTransaction) -> Result<()> {
    batch.set(keys::internaltx_key(tx_hash, record.index).as_bytes(), &record.encode()?);
    let from = keys::parse_address(&record.from)?;
    batch.set(keys::internaltx_by_addr_key(&from, tx_hash, record.index).as_bytes(), &[PRESENCE_MARKER]);
    if let Some(to) = &record.to {
        let to = keys::parse_address(to)?;
        batch.set(keys::internaltx_by_addr_key(&to, tx_hash, record.index).as_bytes(), &[PRESENCE_MARKER]);
    }
    Ok(())
}
