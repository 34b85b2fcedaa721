//! The chain-object codec seam (§6.1, §10.3): blocks, transactions, and
//! receipts are stored through whatever binary encoding the embedding
//! caller already canonicalizes; this crate ships a bincode-based mirror
//! codec for callers that do not supply one.

use crate::error::Result;
use serde::{de::DeserializeOwned, Serialize};

/// Encode/decode contract for a chain-object type `T`. Implementers
/// typically wrap the embedding chain client's own canonical RLP/SSZ/etc.
/// encoding; this crate never assumes a specific wire format beyond "bytes
/// in, bytes out".
pub trait ChainObjectCodec<T> {
    fn encode(&self, value: &T) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<T>;
}

/// Length-prefixed bincode mirror codec, used when no external codec is
/// supplied. Works for any `T: Serialize + DeserializeOwned`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodeMirrorCodec;

impl<T> ChainObjectCodec<T> for BincodeMirrorCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        let payload = bincode::serialize(value)
            .map_err(|e| crate::error::StorageError::codec("ChainObject", e))?;
        let mut out = Vec::with_capacity(4 + payload.len());
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        if bytes.len() < 4 {
            return Err(crate::error::StorageError::codec("ChainObject", ShortBuffer));
        }
        let len = u32::from_be_bytes(bytes[..4].try_into().unwrap()) as usize;
        let payload = bytes
            .get(4..4 + len)
            .ok_or_else(|| crate::error::StorageError::codec("ChainObject", ShortBuffer))?;
        bincode::deserialize(payload).map_err(|e| crate::error::StorageError::codec("ChainObject", e))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("buffer shorter than its declared length prefix")]
struct ShortBuffer;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct FakeBlock {
        height: u64,
        hash: String,
    }

    #[test]
    fn mirror_codec_round_trips() {
        let codec = BincodeMirrorCodec;
        let block = FakeBlock { height: 5, hash: "0xabc".into() };
        let encoded = codec.encode(&block).unwrap();
        let decoded: FakeBlock = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn mirror_codec_rejects_truncated_input() {
        let codec = BincodeMirrorCodec;
        let result: Result<FakeBlock> = codec.decode(&[0, 0, 0, 10, 1, 2]);
        assert!(result.is_err());
    }
}
