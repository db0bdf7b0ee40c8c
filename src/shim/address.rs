// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;
use std::str::FromStr;

use data_encoding::Encoding;
use data_encoding_macro::new_encoding;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

use crate::utils::encoding::blake2b_variable;

/// Defines the encoder for base32 encoding with the provided string with no padding.
const ADDRESS_ENCODER: Encoding = new_encoding! {
    symbols: "abcdefghijklmnopqrstuvwxyz234567",
    padding: None,
};

pub const BLS_PUB_LEN: usize = 48;
pub const PAYLOAD_HASH_LEN: usize = 20;
pub const CHECKSUM_HASH_LEN: usize = 4;
const MAX_ADDRESS_LEN: usize = 84 + 2;
const MAINNET_PREFIX: &str = "f";
const TESTNET_PREFIX: &str = "t";

/// Address error
#[derive(Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Unknown address network")]
    UnknownNetwork,
    #[error("Unknown address protocol")]
    UnknownProtocol,
    #[error("Invalid address payload")]
    InvalidPayload,
    #[error("Invalid address length")]
    InvalidLength,
    #[error("Invalid payload length, wanted: {expected} got: {0}", expected = PAYLOAD_HASH_LEN)]
    InvalidPayloadLength(usize),
    #[error("Invalid BLS pub key length, wanted: {expected} got: {0}", expected = BLS_PUB_LEN)]
    InvalidBLSLength(usize),
    #[error("Invalid address checksum")]
    InvalidChecksum,
    #[error("Cannot get id from non id address")]
    NonIDAddress,
    #[error("Decoding for address failed: {0}")]
    Base32Decoding(#[from] data_encoding::DecodeError),
}

/// Address protocol, written as the first byte of the encoded address.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, FromPrimitive)]
#[repr(u8)]
pub enum Protocol {
    ID = 0,
    Secp256k1 = 1,
    Actor = 2,
    BLS = 3,
}

impl Protocol {
    fn from_byte(b: u8) -> Option<Protocol> {
        FromPrimitive::from_u8(b)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Network prefix used for the string form of an address.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    fn to_prefix(self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_PREFIX,
            Network::Testnet => TESTNET_PREFIX,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
enum Payload {
    ID(u64),
    Secp256k1([u8; PAYLOAD_HASH_LEN]),
    Actor([u8; PAYLOAD_HASH_LEN]),
    BLS([u8; BLS_PUB_LEN]),
}

/// Address is the struct that defines the protocol and data payload conversion from either
/// a public key or value
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct Address {
    payload: Payload,
}

impl Address {
    /// Generates new address using ID protocol
    pub const fn new_id(id: u64) -> Self {
        Self {
            payload: Payload::ID(id),
        }
    }

    /// Generates new address using Secp256k1 pubkey
    pub fn new_secp256k1(pubkey: &[u8]) -> Result<Self, Error> {
        if pubkey.len() != 65 {
            return Err(Error::InvalidPayloadLength(pubkey.len()));
        }
        Ok(Self {
            payload: Payload::Secp256k1(address_hash(pubkey)),
        })
    }

    /// Generates new address using the Actor protocol
    pub fn new_actor(data: &[u8]) -> Self {
        Self {
            payload: Payload::Actor(address_hash(data)),
        }
    }

    /// Generates new address using BLS pubkey
    pub fn new_bls(pubkey: &[u8]) -> Result<Self, Error> {
        let key: [u8; BLS_PUB_LEN] = pubkey
            .try_into()
            .map_err(|_| Error::InvalidBLSLength(pubkey.len()))?;
        Ok(Self {
            payload: Payload::BLS(key),
        })
    }

    /// Creates address from encoded bytes
    pub fn from_bytes(bz: &[u8]) -> Result<Self, Error> {
        let (&first, raw) = bz.split_first().ok_or(Error::InvalidLength)?;
        if raw.is_empty() {
            return Err(Error::InvalidLength);
        }
        let protocol = Protocol::from_byte(first).ok_or(Error::UnknownProtocol)?;
        let payload = match protocol {
            Protocol::ID => {
                let (id, rest) =
                    unsigned_varint::decode::u64(raw).map_err(|_| Error::InvalidPayload)?;
                if !rest.is_empty() {
                    return Err(Error::InvalidPayload);
                }
                Payload::ID(id)
            }
            Protocol::Secp256k1 => Payload::Secp256k1(
                raw.try_into()
                    .map_err(|_| Error::InvalidPayloadLength(raw.len()))?,
            ),
            Protocol::Actor => Payload::Actor(
                raw.try_into()
                    .map_err(|_| Error::InvalidPayloadLength(raw.len()))?,
            ),
            Protocol::BLS => Payload::BLS(
                raw.try_into()
                    .map_err(|_| Error::InvalidBLSLength(raw.len()))?,
            ),
        };
        Ok(Self { payload })
    }

    /// Returns protocol for Address
    pub fn protocol(&self) -> Protocol {
        match self.payload {
            Payload::ID(_) => Protocol::ID,
            Payload::Secp256k1(_) => Protocol::Secp256k1,
            Payload::Actor(_) => Protocol::Actor,
            Payload::BLS(_) => Protocol::BLS,
        }
    }

    /// Returns the raw payload bytes, without the protocol prefix.
    pub fn payload_bytes(&self) -> Vec<u8> {
        match &self.payload {
            Payload::ID(id) => {
                let mut buf = unsigned_varint::encode::u64_buffer();
                unsigned_varint::encode::u64(*id, &mut buf).to_vec()
            }
            Payload::Secp256k1(hash) | Payload::Actor(hash) => hash.to_vec(),
            Payload::BLS(key) => key.to_vec(),
        }
    }

    /// Returns encoded bytes of Address
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bz = self.payload_bytes();
        bz.insert(0, self.protocol() as u8);
        bz
    }

    /// Returns the actor id if this is an ID address.
    pub fn id(&self) -> Result<u64, Error> {
        match self.payload {
            Payload::ID(id) => Ok(id),
            _ => Err(Error::NonIDAddress),
        }
    }

    /// Public key addresses are the only ones an account actor can be created for implicitly.
    pub fn is_key_address(&self) -> bool {
        matches!(self.protocol(), Protocol::Secp256k1 | Protocol::BLS)
    }

    /// Returns encoded string of the address with the given network prefix.
    pub fn to_string_with_network(&self, network: Network) -> String {
        let prefix = network.to_prefix();
        match self.payload {
            Payload::ID(id) => format!("{prefix}{}{id}", self.protocol()),
            _ => {
                let mut bz = self.payload_bytes();
                bz.extend(checksum(&self.to_bytes()));
                format!(
                    "{prefix}{}{}",
                    self.protocol(),
                    ADDRESS_ENCODER.encode(&bz)
                )
            }
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with_network(Network::Mainnet))
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(addr: &str) -> Result<Self, Error> {
        if addr.len() > MAX_ADDRESS_LEN || addr.len() < 3 || !addr.is_ascii() {
            return Err(Error::InvalidLength);
        }
        // ensure the network character is valid before converting
        if &addr[0..1] != MAINNET_PREFIX && &addr[0..1] != TESTNET_PREFIX {
            return Err(Error::UnknownNetwork);
        }

        let protocol = match &addr[1..2] {
            "0" => Protocol::ID,
            "1" => Protocol::Secp256k1,
            "2" => Protocol::Actor,
            "3" => Protocol::BLS,
            _ => return Err(Error::UnknownProtocol),
        };

        let raw = &addr[2..];
        if protocol == Protocol::ID {
            // 20 is max u64 as string
            if raw.len() > 20 {
                return Err(Error::InvalidLength);
            }
            let id = raw.parse::<u64>().map_err(|_| Error::InvalidPayload)?;
            return Ok(Address::new_id(id));
        }

        let mut payload = ADDRESS_ENCODER.decode(raw.as_bytes())?;
        if payload.len() < CHECKSUM_HASH_LEN {
            return Err(Error::InvalidPayload);
        }
        // payload includes checksum at end, so split after decoding
        let cksm = payload.split_off(payload.len() - CHECKSUM_HASH_LEN);

        let mut ingest = payload;
        ingest.insert(0, protocol as u8);
        if checksum(&ingest) != cksm {
            return Err(Error::InvalidChecksum);
        }
        Address::from_bytes(&ingest)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_bytes::Serialize::serialize(&self.to_bytes(), s)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bz: serde_bytes::ByteBuf = Deserialize::deserialize(deserializer)?;
        Address::from_bytes(&bz).map_err(|e| match e {
            Error::UnknownProtocol => de::Error::invalid_value(
                de::Unexpected::Unsigned(bz.first().copied().unwrap_or_default().into()),
                &"an address protocol",
            ),
            _ => de::Error::invalid_length(bz.len(), &"an encoded address"),
        })
    }
}

/// Checksum calculates the 4 byte checksum hash
pub fn checksum(ingest: &[u8]) -> Vec<u8> {
    blake2b_variable(ingest, CHECKSUM_HASH_LEN)
}

fn address_hash(ingest: &[u8]) -> [u8; PAYLOAD_HASH_LEN] {
    let mut hash = [0u8; PAYLOAD_HASH_LEN];
    hash.copy_from_slice(&blake2b_variable(ingest, PAYLOAD_HASH_LEN));
    hash
}

#[cfg(test)]
impl quickcheck::Arbitrary for Address {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        match u8::arbitrary(g) % 3 {
            0 => Address::new_id(u64::arbitrary(g)),
            1 => Address::new_actor(&Vec::<u8>::arbitrary(g)),
            _ => {
                let key: Vec<u8> = (0..BLS_PUB_LEN).map(|_| u8::arbitrary(g)).collect();
                Address::from_bytes(&[&[Protocol::BLS as u8][..], &key].concat())
                    .unwrap_or(Address::new_id(0))
            }
        }
    }
}
