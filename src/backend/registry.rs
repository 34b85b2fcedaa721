//! Process-wide backend registry (§4.1): maps a backend-type tag to a
//! factory and enforces single registration per tag.

use super::{KvBackend, MemoryBackend, RocksDbBackend};
use crate::config::BackendConfig;
use crate::error::{Result, StorageError};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct BackendMetadata {
    pub name: String,
    pub description: String,
    pub version: String,
    pub features: Vec<String>,
}

pub type BackendFactory = Box<dyn Fn(&BackendConfig) -> Result<Box<dyn KvBackend>> + Send + Sync>;

struct Entry {
    metadata: BackendMetadata,
    factory: BackendFactory,
}

/// A registry instance. Tests construct fresh registries instead of reaching
/// for the process-wide default (§9).
#[derive(Default)]
pub struct BackendRegistry {
    entries: Mutex<HashMap<String, Entry>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Register a backend factory under `tag`. Fails with
    /// [`StorageError::BackendDuplicate`] if `tag` is already present.
    pub fn register(&self, tag: &str, metadata: BackendMetadata, factory: BackendFactory) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(tag) {
            return Err(StorageError::BackendDuplicate(tag.to_string()));
        }
        entries.insert(tag.to_string(), Entry { metadata, factory });
        Ok(())
    }

    /// Like [`Self::register`], but aborts the process on duplicate
    /// registration instead of returning an error. Reserved for default
    /// registration at process start — a documented programmer error if it
    /// ever fails.
    pub fn must_register(&self, tag: &str, metadata: BackendMetadata, factory: BackendFactory) {
        self.register(tag, metadata, factory)
            .unwrap_or_else(|e| panic!("must_register({tag}) failed: {e}"));
    }

    pub fn create(&self, config: &BackendConfig) -> Result<Box<dyn KvBackend>> {
        let entries = self.entries.lock().unwrap();
        match entries.get(config.backend_type.as_str()) {
            Some(entry) => (entry.factory)(config),
            None => Err(StorageError::BackendUnsupported(config.backend_type.clone())),
        }
    }

    pub fn supported_types(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    pub fn has(&self, tag: &str) -> bool {
        self.entries.lock().unwrap().contains_key(tag)
    }

    pub fn metadata(&self, tag: &str) -> Option<BackendMetadata> {
        self.entries.lock().unwrap().get(tag).map(|e| e.metadata.clone())
    }
}

fn register_defaults(registry: &BackendRegistry) {
    registry.must_register(
        "memory",
        BackendMetadata {
            name: "memory".to_string(),
            description: "In-memory ordered backend (BTreeMap-backed)".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            features: vec!["ordered-iteration".to_string()],
        },
        Box::new(|config| Ok(Box::new(MemoryBackend::new(config.read_only)))),
    );
    registry.must_register(
        "rocksdb",
        BackendMetadata {
            name: "rocksdb".to_string(),
            description: "RocksDB-backed durable LSM engine".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            features: vec!["durable".to_string(), "ordered-iteration".to_string(), "column-families".to_string()],
        },
        Box::new(|config| RocksDbBackend::open(config).map(|b| Box::new(b) as Box<dyn KvBackend>)),
    );
}

static DEFAULT_REGISTRY: OnceCell<BackendRegistry> = OnceCell::new();

/// The process-wide registry, pre-populated with the `"memory"` and
/// `"rocksdb"` backends on first access.
pub fn default_registry() -> &'static BackendRegistry {
    DEFAULT_REGISTRY.get_or_init(|| {
        let registry = BackendRegistry::new();
        register_defaults(&registry);
        registry
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_factory() -> BackendFactory {
        Box::new(|config| Ok(Box::new(MemoryBackend::new(config.read_only))))
    }

    fn meta(name: &str) -> BackendMetadata {
        BackendMetadata {
            name: name.to_string(),
            description: String::new(),
            version: "0.0.0".to_string(),
            features: vec![],
        }
    }

    #[test]
    fn register_then_has_and_create() {
        let registry = BackendRegistry::new();
        registry.register("memory", meta("memory"), memory_factory()).unwrap();
        assert!(registry.has("memory"));
        let backend = registry.create(&BackendConfig::default_for("")).unwrap();
        assert!(!backend.is_read_only());
    }

    #[test]
    fn duplicate_registration_fails() {
        let registry = BackendRegistry::new();
        registry.register("memory", meta("memory"), memory_factory()).unwrap();
        let err = registry.register("memory", meta("memory"), memory_factory()).unwrap_err();
        assert_eq!(err.kind(), crate::error::StorageErrorKind::BackendDuplicate);
    }

    #[test]
    fn create_unregistered_type_fails() {
        let registry = BackendRegistry::new();
        let mut cfg = BackendConfig::default_for("");
        cfg.backend_type = "nonexistent".to_string();
        let err = registry.create(&cfg).unwrap_err();
        assert_eq!(err.kind(), crate::error::StorageErrorKind::BackendUnsupported);
    }

    #[test]
    fn supported_types_reflects_registrations() {
        let registry = BackendRegistry::new();
        registry.register("memory", meta("memory"), memory_factory()).unwrap();
        registry.register("other", meta("other"), memory_factory()).unwrap();
        assert_eq!(registry.supported_types().len(), 2);
    }

    #[test]
    #[should_panic(expected = "must_register")]
    fn must_register_panics_on_duplicate() {
        let registry = BackendRegistry::new();
        registry.register("memory", meta("memory"), memory_factory()).unwrap();
        registry.must_register("memory", meta("memory"), memory_factory());
    }
}
