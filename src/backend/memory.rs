//! In-memory ordered backend: a `BTreeMap` guarded by a `RwLock`, registered
//! under the `"memory"` tag. Used by the test suite and by tooling that
//! should not pay for an on-disk engine (§4.1).

use super::{Batch, KvBackend, KvIterator};
use crate::error::Result;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

pub struct MemoryBackend {
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    read_only: bool,
    closed: AtomicBool,
}

impl MemoryBackend {
    pub fn new(read_only: bool) -> Self {
        Self { map: RwLock::new(BTreeMap::new()), read_only, closed: AtomicBool::new(false) }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(crate::error::StorageError::Closed);
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<()> {
        self.check_open()?;
        if self.read_only {
            return Err(crate::error::StorageError::ReadOnly);
        }
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(false)
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        Ok(self.map.read().unwrap().get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.check_writable()?;
        self.map.write().unwrap().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.check_writable()?;
        self.map.write().unwrap().remove(key);
        Ok(())
    }

    fn new_iterator(&self, lower: &[u8], upper: &[u8]) -> Result<Box<dyn KvIterator + '_>> {
        self.check_open()?;
        let snapshot: Vec<(Vec<u8>, Vec<u8>)> = self
            .map
            .read()
            .unwrap()
            .range(lower.to_vec()..upper.to_vec())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(Box::new(MemoryIterator { items: snapshot, pos: 0 }))
    }

    fn new_batch(&self) -> Box<dyn Batch + '_> {
        Box::new(MemoryBatch { backend: self, ops: Vec::new() })
    }

    fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }
}

struct MemoryIterator {
    items: Vec<(Vec<u8>, Vec<u8>)>,
    pos: usize,
}

impl KvIterator for MemoryIterator {
    fn valid(&self) -> bool {
        self.pos < self.items.len()
    }

    fn next(&mut self) {
        self.pos += 1;
    }

    fn key(&self) -> &[u8] {
        &self.items[self.pos].0
    }

    fn value(&self) -> &[u8] {
        &self.items[self.pos].1
    }

    fn close(&mut self) {
        self.pos = self.items.len();
    }
}

enum MemOp {
    Set(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

struct MemoryBatch<'a> {
    backend: &'a MemoryBackend,
    ops: Vec<MemOp>,
}

impl<'a> Batch for MemoryBatch<'a> {
    fn set(&mut self, key: &[u8], value: &[u8]) {
        self.ops.push(MemOp::Set(key.to_vec(), value.to_vec()));
    }

    fn delete(&mut self, key: &[u8]) {
        self.ops.push(MemOp::Delete(key.to_vec()));
    }

    fn count(&self) -> usize {
        self.ops.len()
    }

    fn reset(&mut self) {
        self.ops.clear();
    }

    fn commit(&mut self) -> Result<()> {
        self.backend.check_writable()?;
        let mut map = self.backend.map.write().unwrap();
        for op in self.ops.drain(..) {
            match op {
                MemOp::Set(k, v) => {
                    map.insert(k, v);
                }
                MemOp::Delete(k) => {
                    map.remove(&k);
                }
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        self.ops.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_is_atomic_on_commit() {
        let backend = MemoryBackend::default();
        let mut batch = backend.new_batch();
        batch.set(b"k1", b"v1");
        batch.set(b"k2", b"v2");
        batch.set(b"k3", b"v3");
        assert_eq!(batch.count(), 3);
        batch.commit().unwrap();
        assert_eq!(backend.get(b"k1").unwrap().unwrap(), b"v1");
        assert_eq!(backend.get(b"k2").unwrap().unwrap(), b"v2");
        assert_eq!(backend.get(b"k3").unwrap().unwrap(), b"v3");
    }

    #[test]
    fn closed_batch_without_commit_is_noop() {
        let backend = MemoryBackend::default();
        let mut batch = backend.new_batch();
        batch.set(b"keyX", b"vX");
        batch.close();
        assert!(!backend.has(b"keyX").unwrap());
    }

    #[test]
    fn iterator_visits_ascending_within_bounds() {
        let backend = MemoryBackend::default();
        for i in 0..5u8 {
            backend.set(format!("prefix:{}", i).as_bytes(), b"x").unwrap();
        }
        backend.set(b"prefix;", b"excluded").unwrap();
        let mut it = backend.new_iterator(b"prefix:", b"prefix;").unwrap();
        let mut seen = Vec::new();
        while it.valid() {
            seen.push(it.key().to_vec());
            it.next();
        }
        assert_eq!(seen.len(), 5);
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn delete_is_observable() {
        let backend = MemoryBackend::default();
        backend.set(b"k", b"v").unwrap();
        backend.delete(b"k").unwrap();
        assert!(!backend.has(b"k").unwrap());
        assert!(backend.get(b"k").unwrap().is_none());
    }

    #[test]
    fn closed_handle_rejects_operations() {
        let backend = MemoryBackend::default();
        backend.close().unwrap();
        assert!(matches!(
            backend.get(b"k"),
            Err(crate::error::StorageError::Closed)
        ));
    }

    #[test]
    fn read_only_handle_rejects_mutation() {
        let backend = MemoryBackend::new(true);
        assert!(matches!(
            backend.set(b"k", b"v"),
            Err(crate::error::StorageError::ReadOnly)
        ));
    }
}
