//! L1: value encoding. Scalars and chain-object mirrors use fixed binary
//! layouts; typed records pin exactly one encoding per key-prefix family
//! per §6.1.

pub mod chain_object;
pub mod record;
pub mod scalar;
pub mod wbft_extra;

pub use chain_object::{BincodeMirrorCodec, ChainObjectCodec};
pub use record::*;
pub use scalar::*;
pub use wbft_extra::*;

/// Presence-marker value for index entries whose meaning is carried
/// entirely by the key (§6.1).
pub const PRESENCE_MARKER: u8 = 0x01;
