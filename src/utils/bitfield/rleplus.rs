// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! # RLE+ Bitset Encoding
//!
//! ```text
//!     <encoding>  ::= <header> <blocks>
//!       <header>  ::= <version> <bit>
//!      <version>  ::= "00"
//!       <blocks>  ::= <block> <blocks> | ""
//!        <block>  ::= <block_single> | <block_short> | <block_long>
//! <block_single>  ::= "1"
//!  <block_short>  ::= "01" <bit> <bit> <bit> <bit>
//!   <block_long>  ::= "00" <unsigned_varint>
//!          <bit>  ::= "0" | "1"
//! ```
//!
//! The header bit is the value of the first run; runs then alternate. Bits are packed least
//! significant first, and a run length of zero terminates the stream.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::BitField;

/// Maximum encoded size of a bit field.
const MAX_ENCODED_SIZE: usize = 32 << 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RlePlusError {
    #[error("incorrect RLE+ version {0}")]
    UnsupportedVersion(u8),
    #[error("varint run length is not minimally encoded")]
    NotMinimal,
    #[error("varint run length overflows u64")]
    VarintOverflow,
    #[error("bit field runs exceed the maximum index")]
    RangeOverflow,
    #[error("encoded bit field of {0} bytes exceeds the maximum size")]
    TooLarge(usize),
}

/// Writes bits least significant first.
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bits: u16,
    num_bits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the `num_bits` low bits of `byte`.
    pub fn write(&mut self, byte: u8, num_bits: u32) {
        debug_assert!(num_bits <= 8);
        let mask = ((1u16 << num_bits) - 1) as u8;
        self.bits |= u16::from(byte & mask) << self.num_bits;
        self.num_bits += num_bits;
        if self.num_bits >= 8 {
            self.bytes.push(self.bits as u8);
            self.bits >>= 8;
            self.num_bits -= 8;
        }
    }

    /// Writes one run length block.
    pub fn write_len(&mut self, len: u64) {
        debug_assert!(len > 0);
        if len == 1 {
            self.write(1, 1);
        } else if len < 16 {
            self.write(0b10, 2);
            self.write(len as u8, 4);
        } else {
            self.write(0, 2);
            let mut buf = unsigned_varint::encode::u64_buffer();
            for &byte in unsigned_varint::encode::u64(len, &mut buf) {
                self.write(byte, 8);
            }
        }
    }

    /// Flushes the remaining bits, dropping trailing zero bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.num_bits > 0 {
            self.bytes.push(self.bits as u8);
        }
        while self.bytes.last() == Some(&0) {
            self.bytes.pop();
        }
        self.bytes
    }
}

/// Reads bits least significant first. Reading past the end yields zeros.
#[derive(Debug)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn read_bit(&mut self) -> u8 {
        let byte = self.bytes.get(self.position / 8).copied().unwrap_or_default();
        let bit = (byte >> (self.position % 8)) & 1;
        self.position += 1;
        bit
    }

    /// Reads `num_bits` bits into the low bits of the result.
    pub fn read(&mut self, num_bits: u32) -> u8 {
        debug_assert!(num_bits <= 8);
        (0..num_bits).fold(0, |acc, i| acc | (self.read_bit() << i))
    }

    /// Reads one run length block, `None` marks the end of the stream.
    pub fn read_len(&mut self) -> Result<Option<u64>, RlePlusError> {
        let len = if self.read(1) == 1 {
            1
        } else if self.read(1) == 1 {
            u64::from(self.read(4))
        } else {
            let mut len = 0u64;
            let mut shift = 0;
            loop {
                let byte = self.read(8);
                if shift == 63 && byte > 1 {
                    return Err(RlePlusError::VarintOverflow);
                }
                len |= u64::from(byte & 0x7f) << shift;
                if byte & 0x80 == 0 {
                    if byte == 0 && shift > 0 {
                        return Err(RlePlusError::NotMinimal);
                    }
                    break;
                }
                shift += 7;
                if shift > 63 {
                    return Err(RlePlusError::VarintOverflow);
                }
            }
            if len != 0 && len < 16 {
                return Err(RlePlusError::NotMinimal);
            }
            len
        };
        Ok((len != 0).then_some(len))
    }
}

impl BitField {
    /// Decodes RLE+ encoded bytes into a bit field.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, RlePlusError> {
        if bytes.len() > MAX_ENCODED_SIZE {
            return Err(RlePlusError::TooLarge(bytes.len()));
        }
        let mut reader = BitReader::new(bytes);

        let version = reader.read(2);
        if version != 0 {
            return Err(RlePlusError::UnsupportedVersion(version));
        }

        let mut next_value = reader.read(1) == 1;
        let mut ranges = Vec::new();
        let mut index = 0u64;

        while let Some(len) = reader.read_len()? {
            let start = index;
            index = index.checked_add(len).ok_or(RlePlusError::RangeOverflow)?;
            if next_value {
                ranges.push(start..index);
            }
            next_value = !next_value;
        }

        Ok(Self { ranges })
    }

    /// Turns a bit field into its RLE+ encoded form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut iter = self.ranges();

        let Some(first_range) = iter.next() else {
            return Vec::new();
        };

        let mut writer = BitWriter::new();
        // version 00
        writer.write(0, 2);

        if first_range.start == 0 {
            writer.write(1, 1);
        } else {
            writer.write(0, 1);
            writer.write_len(first_range.start);
        }

        writer.write_len(first_range.end - first_range.start);
        let mut index = first_range.end;

        // zeros before each range of ones, then the ones
        for range in iter {
            writer.write_len(range.start - index);
            writer.write_len(range.end - range.start);
            index = range.end;
        }

        writer.finish()
    }
}

impl Serialize for BitField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bytes = self.to_bytes();
        if bytes.len() > MAX_ENCODED_SIZE {
            return Err(serde::ser::Error::custom(RlePlusError::TooLarge(
                bytes.len(),
            )));
        }
        serde_bytes::Serialize::serialize(&bytes, serializer)
    }
}

impl<'de> Deserialize<'de> for BitField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: serde_bytes::ByteBuf = Deserialize::deserialize(deserializer)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}
