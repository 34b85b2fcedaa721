//! RocksDB-backed engine. Column families mirror the three top-level key
//! namespaces (`/meta/`, `/data/`, `/index/`) in the teacher's
//! `db_handles.rs` style of pre-validated, cached CF handles — one handle
//! lookup per namespace rather than per key-family.

use super::{Batch, KvBackend, KvIterator};
use crate::config::BackendConfig;
use crate::error::{Result, StorageError};
use rocksdb::{
    ColumnFamily, IteratorMode, Options, ReadOptions, WriteBatch as RocksWriteBatch, DB,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const CF_META: &str = "meta";
pub const CF_DATA: &str = "data";
pub const CF_INDEX: &str = "index";

const ALL_CFS: [&str; 3] = [CF_META, CF_DATA, CF_INDEX];

/// Picks the column family a key belongs to from its `/meta/`, `/data/`, or
/// `/index/` prefix. Falls back to `CF_DATA` for anything else (defensive —
/// every key builder in `keys::` emits one of the three prefixes).
fn cf_for_key(key: &[u8]) -> &'static str {
    if key.starts_with(b"/meta/") {
        CF_META
    } else if key.starts_with(b"/index/") {
        CF_INDEX
    } else {
        CF_DATA
    }
}

pub struct RocksDbBackend {
    db: Arc<DB>,
    read_only: bool,
    closed: AtomicBool,
}

impl RocksDbBackend {
    pub fn open(config: &BackendConfig) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(config.max_open_files);
        opts.increase_parallelism(config.compaction_concurrency.max(1) as i32);

        let db = if config.read_only {
            DB::open_cf_for_read_only(&opts, &config.path, ALL_CFS, false)
                .map_err(StorageError::from)?
        } else {
            DB::open_cf(&opts, &config.path, ALL_CFS).map_err(StorageError::from)?
        };

        Ok(Self { db: Arc::new(db), read_only: config.read_only, closed: AtomicBool::new(false) })
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::internal(RocksCfMissing(name.to_string())))
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StorageError::Closed);
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<()> {
        self.check_open()?;
        if self.read_only {
            return Err(StorageError::ReadOnly);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("column family not found: {0}")]
struct RocksCfMissing(String);

impl KvBackend for RocksDbBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        let cf = self.cf_handle(cf_for_key(key))?;
        Ok(self.db.get_cf(cf, key)?)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_writable()?;
        let cf = self.cf_handle(cf_for_key(key))?;
        self.db.put_cf(cf, key, value)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.check_writable()?;
        let cf = self.cf_handle(cf_for_key(key))?;
        self.db.delete_cf(cf, key)?;
        Ok(())
    }

    fn new_iterator(&self, lower: &[u8], upper: &[u8]) -> Result<Box<dyn KvIterator + '_>> {
        self.check_open()?;
        let cf = self.cf_handle(cf_for_key(lower))?;
        let mut read_opts = ReadOptions::default();
        read_opts.set_iterate_lower_bound(lower.to_vec());
        read_opts.set_iterate_upper_bound(upper.to_vec());
        let iter = self.db.iterator_cf_opt(cf, read_opts, IteratorMode::Start);
        let mut iterator = RocksIterator { inner: iter, current: None };
        iterator.advance();
        Ok(Box::new(iterator))
    }

    fn new_batch(&self) -> Box<dyn Batch + '_> {
        Box::new(RocksBatch { backend: self, batch: RocksWriteBatch::default(), pending: 0 })
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

type RocksRawIter<'a> = rocksdb::DBIteratorWithThreadMode<'a, DB>;

struct RocksIterator<'a> {
    inner: RocksRawIter<'a>,
    current: Option<(Box<[u8]>, Box<[u8]>)>,
}

impl<'a> RocksIterator<'a> {
    fn advance(&mut self) {
        self.current = match self.inner.next() {
            Some(Ok((k, v))) => Some((k, v)),
            _ => None,
        };
    }
}

impl<'a> KvIterator for RocksIterator<'a> {
    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn next(&mut self) {
        self.advance();
    }

    fn key(&self) -> &[u8] {
        &self.current.as_ref().expect("next() past end").0
    }

    fn value(&self) -> &[u8] {
        &self.current.as_ref().expect("next() past end").1
    }

    fn close(&mut self) {
        self.current = None;
    }
}

struct RocksBatch<'a> {
    backend: &'a RocksDbBackend,
    batch: RocksWriteBatch,
    pending: usize,
}

impl<'a> Batch for RocksBatch<'a> {
    fn set(&mut self, key: &[u8], value: &[u8]) {
        if let Ok(cf) = self.backend.cf_handle(cf_for_key(key)) {
            self.batch.put_cf(cf, key, value);
            self.pending += 1;
        }
    }

    fn delete(&mut self, key: &[u8]) {
        if let Ok(cf) = self.backend.cf_handle(cf_for_key(key)) {
            self.batch.delete_cf(cf, key);
            self.pending += 1;
        }
    }

    fn count(&self) -> usize {
        self.pending
    }

    fn reset(&mut self) {
        self.batch.clear();
        self.pending = 0;
    }

    fn commit(&mut self) -> Result<()> {
        self.backend.check_writable()?;
        let mut write_opts = rocksdb::WriteOptions::default();
        write_opts.set_sync(true);
        let batch = std::mem::take(&mut self.batch);
        self.backend.db.write_opt(batch, &write_opts)?;
        self.pending = 0;
        Ok(())
    }

    fn close(&mut self) {
        self.batch.clear();
        self.pending = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use tempfile::TempDir;

    fn open_backend() -> (RocksDbBackend, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut config = BackendConfig::default_for(dir.path().to_str().unwrap());
        config.backend_type = "rocksdb".to_string();
        let backend = RocksDbBackend::open(&config).unwrap();
        (backend, dir)
    }

    #[test]
    fn put_and_get_round_trips() {
        let (backend, _dir) = open_backend();
        backend.set(b"/data/blocks/1", b"block-one").unwrap();
        assert_eq!(backend.get(b"/data/blocks/1").unwrap().unwrap(), b"block-one");
    }

    #[test]
    fn batch_commit_is_durable_and_atomic() {
        let (backend, _dir) = open_backend();
        let mut batch = backend.new_batch();
        batch.set(b"/data/a", b"1");
        batch.set(b"/index/b", b"2");
        batch.set(b"/meta/c", b"3");
        batch.commit().unwrap();
        assert_eq!(backend.get(b"/data/a").unwrap().unwrap(), b"1");
        assert_eq!(backend.get(b"/index/b").unwrap().unwrap(), b"2");
        assert_eq!(backend.get(b"/meta/c").unwrap().unwrap(), b"3");
    }

    #[test]
    fn read_only_backend_rejects_writes() {
        let dir = TempDir::new().unwrap();
        {
            let config = BackendConfig::default_for(dir.path().to_str().unwrap());
            RocksDbBackend::open(&config).unwrap();
        }
        let mut ro_config = BackendConfig::default_for(dir.path().to_str().unwrap());
        ro_config.read_only = true;
        let backend = RocksDbBackend::open(&ro_config).unwrap();
        assert!(matches!(backend.set(b"/data/x", b"y"), Err(StorageError::ReadOnly)));
    }
}
