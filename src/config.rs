//! Backend configuration: the recognized fields, their defaults, and the
//! layered loading scheme (file + environment overrides) the rest of the
//! crate's binaries rely on.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;

static GLOBAL_CONFIG: OnceCell<BackendConfig> = OnceCell::new();

/// Recognized configuration fields for a KV backend (§6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend type tag, e.g. "rocksdb" or "memory".
    pub backend_type: String,
    /// Filesystem path; ignored by in-memory backends.
    pub path: String,
    /// Block cache size in MiB.
    pub cache: u64,
    pub max_open_files: i32,
    /// Write buffer size in MiB.
    pub write_buffer: u64,
    pub read_only: bool,
    pub compaction_concurrency: u32,
    /// Free-form engine-specific tuning knobs.
    pub options: HashMap<String, String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_type: "rocksdb".to_string(),
            path: String::new(),
            cache: 128,
            max_open_files: 1000,
            write_buffer: 64,
            read_only: false,
            compaction_concurrency: 0,
            options: HashMap::new(),
        }
    }
}

impl BackendConfig {
    /// `DefaultConfig(path)` from §6.2: defaults populated, path set.
    pub fn default_for(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }
}

/// Load `config.toml` (if present) layered with `INDEXER_STORAGE_*`
/// environment overrides, for standalone binaries/utilities.
pub fn load_config() -> Result<BackendConfig, Box<dyn Error>> {
    let built = config::Config::builder()
        .add_source(config::File::with_name("config.toml").required(false))
        .add_source(config::Environment::with_prefix("INDEXER_STORAGE"))
        .build()?;
    built.try_deserialize().map_err(|e| Box::new(e) as Box<dyn Error>)
}

/// Initialize the process-wide config cell exactly once. Binaries that want
/// a single ambient config call this at startup; library embedders should
/// prefer threading a `BackendConfig` value explicitly instead.
pub fn init_global_config() -> Result<(), Box<dyn Error>> {
    let cfg = load_config()?;
    GLOBAL_CONFIG.set(cfg).map_err(|_| "config already set")?;
    Ok(())
}

pub fn get_global_config() -> &'static BackendConfig {
    GLOBAL_CONFIG.get().unwrap_or_else(|| {
        eprintln!("FATAL: config not initialized - call init_global_config() first");
        std::process::exit(1);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = BackendConfig::default_for("/tmp/db");
        assert_eq!(cfg.cache, 128);
        assert_eq!(cfg.max_open_files, 1000);
        assert_eq!(cfg.write_buffer, 64);
        assert!(!cfg.read_only);
        assert_eq!(cfg.path, "/tmp/db");
    }
}
