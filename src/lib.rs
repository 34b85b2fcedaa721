//! Embedded key-value-backed storage core for a blockchain indexer.
//!
//! The crate is organized bottom-up: [`backend`] is the pluggable KV
//! contract, [`keys`] builds the bit-exact key schema over it, [`codec`]
//! encodes the values stored under those keys, [`write`]/[`read`] implement
//! the block-ingestion batch and query paths, and [`facade::Storage`] ties
//! all of it into one handle.

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod facade;
pub mod keys;
pub mod metrics;
pub mod read;
pub mod telemetry;
pub mod write;

pub use error::{Result, StorageError, StorageErrorKind};
pub use facade::Storage;
