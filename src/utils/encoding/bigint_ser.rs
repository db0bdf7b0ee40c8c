// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Big integers are encoded as a byte string: empty for zero, otherwise a sign byte
//! (`0` positive, `1` negative) followed by the big-endian magnitude.

use num_bigint::{BigInt, Sign};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Maximum magnitude length accepted on decode.
pub const MAX_BIGINT_SIZE: usize = 128;

/// Big integer usable directly as a map value or parameter.
#[derive(Deserialize, Serialize, Clone, Default, Debug, PartialEq, Eq)]
#[serde(transparent)]
pub struct BigIntDe(#[serde(with = "self")] pub BigInt);

pub fn serialize<S>(int: &BigInt, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let (sign, mut bz) = int.to_bytes_be();
    match sign {
        Sign::Minus => bz.insert(0, 1),
        Sign::Plus => bz.insert(0, 0),
        Sign::NoSign => bz = Vec::new(),
    }
    serde_bytes::Serialize::serialize(&bz, serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigInt, D::Error>
where
    D: Deserializer<'de>,
{
    let bz: serde_bytes::ByteBuf = Deserialize::deserialize(deserializer)?;
    if bz.len() > MAX_BIGINT_SIZE {
        return Err(de::Error::custom(format!(
            "big integer magnitude of {} bytes is out of range",
            bz.len()
        )));
    }
    let Some((&sign_byte, magnitude)) = bz.split_first() else {
        return Ok(BigInt::default());
    };
    let sign = match sign_byte {
        1 => Sign::Minus,
        0 => Sign::Plus,
        other => {
            return Err(de::Error::invalid_value(
                de::Unexpected::Unsigned(other.into()),
                &"a big integer sign byte of 0 or 1",
            ));
        }
    };
    Ok(BigInt::from_bytes_be(sign, magnitude))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::encoding::{CodecErrorKind, from_slice, to_vec};
    use quickcheck_macros::quickcheck;
    use serde::Serialize;

    #[derive(Serialize, serde::Deserialize, Debug, PartialEq)]
    #[serde(transparent)]
    struct Wrapped(#[serde(with = "super")] BigInt);

    #[quickcheck]
    fn round_trip(v: i128) {
        let w = Wrapped(BigInt::from(v));
        let bz = to_vec(&w).unwrap();
        assert_eq!(from_slice::<Wrapped>(&bz).unwrap(), w);
    }

    #[test]
    fn bad_sign_byte() {
        let err = from_slice::<Wrapped>(&[0x42, 0x02, 0x01]).unwrap_err();
        assert_eq!(err.kind(), CodecErrorKind::WrongEnum);
    }
}
