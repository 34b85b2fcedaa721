//! WBFT consensus extradata codec (§4.5): decodes/encodes a block header's
//! opaque `extra` bytes as a fixed-shape, length-prefixed tuple.

use crate::error::{Result, StorageError};
use byteorder::{BigEndian, ByteOrder};
use num_bigint::BigInt;

/// The minimal header shape this codec needs: just the opaque extra bytes.
/// Embedding callers adapt their own header type into this.
#[derive(Debug, Clone)]
pub struct WbftHeaderRef {
    pub extra: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedSeal {
    pub sealers: Vec<u8>,
    pub signature: [u8; 96],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub address: [u8; 20],
    pub diligence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochInfo {
    pub candidates: Vec<Candidate>,
    pub validators: Vec<u32>,
    pub bls_public_keys: Vec<[u8; 48]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WbftBlockExtra {
    pub vanity_data: Vec<u8>,
    pub randao_reveal: Vec<u8>,
    pub prev_round: u32,
    pub prev_prepared_seal: AggregatedSeal,
    pub prev_committed_seal: AggregatedSeal,
    pub round: u32,
    pub prepared_seal: AggregatedSeal,
    pub committed_seal: AggregatedSeal,
    pub gas_tip: BigInt,
    pub epoch_info: Option<EpochInfo>,
}

#[derive(Debug, thiserror::Error)]
enum WbftCodecError {
    #[error("header cannot be nil")]
    NilHeader,
    #[error("header extra data is empty")]
    EmptyExtra,
    #[error("malformed wbft extra encoding: {0}")]
    Malformed(&'static str),
    #[error("candidate address length != 20")]
    BadCandidateAddressLength,
    #[error("validator index {index} out of range for {count} candidates")]
    ValidatorIndexOutOfRange { index: u32, count: usize },
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> std::result::Result<&'a [u8], WbftCodecError> {
        let end = self.pos.checked_add(n).ok_or(WbftCodecError::Malformed("length overflow"))?;
        let slice = self.buf.get(self.pos..end).ok_or(WbftCodecError::Malformed("buffer truncated"))?;
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> std::result::Result<u32, WbftCodecError> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    fn u64(&mut self) -> std::result::Result<u64, WbftCodecError> {
        Ok(BigEndian::read_u64(self.take(8)?))
    }

    fn bytes(&mut self) -> std::result::Result<Vec<u8>, WbftCodecError> {
        let len = self.u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    fn fixed<const N: usize>(&mut self) -> std::result::Result<[u8; N], WbftCodecError> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn aggregated_seal(&mut self) -> std::result::Result<AggregatedSeal, WbftCodecError> {
        let sealers = self.bytes()?;
        let signature = self.fixed::<96>()?;
        Ok(AggregatedSeal { sealers, signature })
    }

    fn bigint(&mut self) -> std::result::Result<BigInt, WbftCodecError> {
        let magnitude = self.bytes()?;
        let sign_byte = self.take(1)?[0];
        let sign = if sign_byte == 0x01 { num_bigint::Sign::Minus } else { num_bigint::Sign::Plus };
        Ok(BigInt::from_bytes_be(sign, &magnitude))
    }

    fn epoch_info(&mut self) -> std::result::Result<Option<EpochInfo>, WbftCodecError> {
        let present = self.take(1)?[0];
        if present == 0 {
            return Ok(None);
        }
        let candidate_count = self.u32()? as usize;
        let mut candidates = Vec::with_capacity(candidate_count);
        for _ in 0..candidate_count {
            let addr_bytes = self.bytes()?;
            if addr_bytes.len() != 20 {
                return Err(WbftCodecError::BadCandidateAddressLength);
            }
            let mut address = [0u8; 20];
            address.copy_from_slice(&addr_bytes);
            let diligence = self.u64()?;
            candidates.push(Candidate { address, diligence });
        }
        let validator_count = self.u32()? as usize;
        let mut validators = Vec::with_capacity(validator_count);
        for _ in 0..validator_count {
            validators.push(self.u32()?);
        }
        let bls_count = self.u32()? as usize;
        let mut bls_public_keys = Vec::with_capacity(bls_count);
        for _ in 0..bls_count {
            bls_public_keys.push(self.fixed::<48>()?);
        }
        Ok(Some(EpochInfo { candidates, validators, bls_public_keys }))
    }
}

fn push_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}

fn push_seal(out: &mut Vec<u8>, seal: &AggregatedSeal) {
    push_bytes(out, &seal.sealers);
    out.extend_from_slice(&seal.signature);
}

fn push_bigint(out: &mut Vec<u8>, v: &BigInt) {
    let (sign, magnitude) = v.to_bytes_be();
    push_bytes(out, &magnitude);
    out.push(if sign == num_bigint::Sign::Minus { 0x01 } else { 0x00 });
}

/// Decode a header's opaque `extra` bytes into a [`WbftBlockExtra`].
pub fn parse_wbft_extra(header: Option<&WbftHeaderRef>) -> Result<WbftBlockExtra> {
    let header = header.ok_or_else(|| StorageError::codec("WbftBlockExtra", WbftCodecError::NilHeader))?;
    if header.extra.is_empty() {
        return Err(StorageError::codec("WbftBlockExtra", WbftCodecError::EmptyExtra));
    }
    let mut reader = Reader::new(&header.extra);
    let parse = |reader: &mut Reader| -> std::result::Result<WbftBlockExtra, WbftCodecError> {
        let vanity_data = reader.bytes()?;
        let randao_reveal = reader.bytes()?;
        let prev_round = reader.u32()?;
        let prev_prepared_seal = reader.aggregated_seal()?;
        let prev_committed_seal = reader.aggregated_seal()?;
        let round = reader.u32()?;
        let prepared_seal = reader.aggregated_seal()?;
        let committed_seal = reader.aggregated_seal()?;
        let gas_tip = reader.bigint()?;
        let epoch_info = reader.epoch_info()?;
        Ok(WbftBlockExtra {
            vanity_data,
            randao_reveal,
            prev_round,
            prev_prepared_seal,
            prev_committed_seal,
            round,
            prepared_seal,
            committed_seal,
            gas_tip,
            epoch_info,
        })
    };
    parse(&mut reader).map_err(|e| StorageError::codec("WbftBlockExtra", e))
}

/// Inverse of [`parse_wbft_extra`]: builds the `extra` byte string a header
/// assembler would re-serialize.
pub fn encode_wbft_extra(extra: &WbftBlockExtra) -> Vec<u8> {
    let mut out = Vec::new();
    push_bytes(&mut out, &extra.vanity_data);
    push_bytes(&mut out, &extra.randao_reveal);
    out.extend_from_slice(&extra.prev_round.to_be_bytes());
    push_seal(&mut out, &extra.prev_prepared_seal);
    push_seal(&mut out, &extra.prev_committed_seal);
    out.extend_from_slice(&extra.round.to_be_bytes());
    push_seal(&mut out, &extra.prepared_seal);
    push_seal(&mut out, &extra.committed_seal);
    push_bigint(&mut out, &extra.gas_tip);
    match &extra.epoch_info {
        None => out.push(0),
        Some(epoch) => {
            out.push(1);
            out.extend_from_slice(&(epoch.candidates.len() as u32).to_be_bytes());
            for c in &epoch.candidates {
                push_bytes(&mut out, &c.address);
                out.extend_from_slice(&c.diligence.to_be_bytes());
            }
            out.extend_from_slice(&(epoch.validators.len() as u32).to_be_bytes());
            for v in &epoch.validators {
                out.extend_from_slice(&v.to_be_bytes());
            }
            out.extend_from_slice(&(epoch.bls_public_keys.len() as u32).to_be_bytes());
            for k in &epoch.bls_public_keys {
                out.extend_from_slice(k);
            }
        }
    }
    out
}

/// Bit `i` of byte `b` (LSB-first) set means validator index `b*8 + i`
/// signed; each validator entry is an index into `candidates`.
pub fn extract_signers(sealers: &[u8], validators: &[u32], candidates: &[Candidate]) -> Result<Vec<[u8; 20]>> {
    let mut signers = Vec::new();
    for (byte_idx, byte) in sealers.iter().enumerate() {
        for bit in 0..8u32 {
            if byte & (1 << bit) == 0 {
                continue;
            }
            let validator_idx = (byte_idx as u32) * 8 + bit;
            let Some(&candidate_idx) = validators.get(validator_idx as usize) else {
                continue;
            };
            let candidate = candidates.get(candidate_idx as usize).ok_or_else(|| {
                StorageError::codec(
                    "WbftSigners",
                    WbftCodecError::ValidatorIndexOutOfRange { index: candidate_idx, count: candidates.len() },
                )
            })?;
            signers.push(candidate.address);
        }
    }
    Ok(signers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_seal() -> AggregatedSeal {
        AggregatedSeal { sealers: vec![0b0000_0101], signature: [7u8; 96] }
    }

    fn sample_extra() -> WbftBlockExtra {
        WbftBlockExtra {
            vanity_data: vec![1, 2, 3],
            randao_reveal: vec![4, 5, 6, 7],
            prev_round: 1,
            prev_prepared_seal: sample_seal(),
            prev_committed_seal: sample_seal(),
            round: 2,
            prepared_seal: sample_seal(),
            committed_seal: sample_seal(),
            gas_tip: BigInt::from(-100),
            epoch_info: Some(EpochInfo {
                candidates: vec![
                    Candidate { address: [1u8; 20], diligence: 10 },
                    Candidate { address: [2u8; 20], diligence: 20 },
                ],
                validators: vec![0, 1],
                bls_public_keys: vec![[9u8; 48]],
            }),
        }
    }

    #[test]
    fn encode_then_parse_round_trips() {
        let extra = sample_extra();
        let encoded = encode_wbft_extra(&extra);
        let header = WbftHeaderRef { extra: encoded };
        let decoded = parse_wbft_extra(Some(&header)).unwrap();
        assert_eq!(decoded, extra);
    }

    #[test]
    fn nil_header_fails() {
        let err = parse_wbft_extra(None).unwrap_err();
        assert_eq!(err.to_string(), "codec failure decoding/encoding WbftBlockExtra: header cannot be nil");
    }

    #[test]
    fn empty_extra_fails() {
        let header = WbftHeaderRef { extra: vec![] };
        let err = parse_wbft_extra(Some(&header)).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn candidate_address_length_mismatch_fails() {
        let mut extra = sample_extra();
        if let Some(epoch) = extra.epoch_info.as_mut() {
            epoch.candidates.clear();
        }
        let encoded = encode_wbft_extra(&extra);
        // Corrupt the candidate-address length field to something != 20 by
        // re-running through a hand-built epoch section.
        let mut out = Vec::new();
        push_bytes(&mut out, &extra.vanity_data);
        push_bytes(&mut out, &extra.randao_reveal);
        out.extend_from_slice(&extra.prev_round.to_be_bytes());
        push_seal(&mut out, &extra.prev_prepared_seal);
        push_seal(&mut out, &extra.prev_committed_seal);
        out.extend_from_slice(&extra.round.to_be_bytes());
        push_seal(&mut out, &extra.prepared_seal);
        push_seal(&mut out, &extra.committed_seal);
        push_bigint(&mut out, &extra.gas_tip);
        out.push(1);
        out.extend_from_slice(&1u32.to_be_bytes());
        push_bytes(&mut out, &[0u8; 19]);
        out.extend_from_slice(&0u64.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        let _ = encoded;
        let header = WbftHeaderRef { extra: out };
        let err = parse_wbft_extra(Some(&header)).unwrap_err();
        assert!(err.to_string().contains("candidate address length"));
    }

    #[test]
    fn extract_signers_reads_lsb_first_bits() {
        let candidates =
            vec![Candidate { address: [1u8; 20], diligence: 0 }, Candidate { address: [2u8; 20], diligence: 0 }];
        let validators = vec![0, 1];
        // bit0 and bit2 set => validator indices 0 and 2, but only index 0/1 map to candidates.
        let signers = extract_signers(&[0b0000_0001], &validators, &candidates).unwrap();
        assert_eq!(signers, vec![[1u8; 20]]);
    }

    #[test]
    fn extract_signers_empty_bitmap_yields_empty() {
        let signers = extract_signers(&[], &[], &[]).unwrap();
        assert!(signers.is_empty());
    }
}
