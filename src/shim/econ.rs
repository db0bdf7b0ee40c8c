// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::utils::encoding::bigint_ser;

/// Number of attoFIL in one FIL.
pub const FILECOIN_PRECISION: u64 = 1_000_000_000_000_000_000;

/// A quantity of attoFIL. Encoded on chain as a big integer byte string.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::From,
    derive_more::Into,
    derive_more::Deref,
    derive_more::Display,
    derive_more::Add,
    derive_more::Sub,
    derive_more::AddAssign,
    derive_more::SubAssign,
)]
pub struct TokenAmount(BigInt);

impl TokenAmount {
    pub fn from_atto(atto: impl Into<BigInt>) -> Self {
        Self(atto.into())
    }

    pub fn from_whole(fil: impl Into<BigInt>) -> Self {
        Self(fil.into() * FILECOIN_PRECISION)
    }

    pub fn atto(&self) -> &BigInt {
        &self.0
    }

    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }
}

impl Serialize for TokenAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        bigint_ser::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        bigint_ser::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::encoding::{from_slice, to_vec};

    #[test]
    fn token_amount_encoding() {
        assert_eq!(to_vec(&TokenAmount::zero()).unwrap(), vec![0x40]);
        assert_eq!(
            to_vec(&TokenAmount::from_atto(256)).unwrap(),
            vec![0x43, 0x00, 0x01, 0x00]
        );
        assert_eq!(
            to_vec(&TokenAmount::from_atto(-1)).unwrap(),
            vec![0x42, 0x01, 0x01]
        );
        let whole = TokenAmount::from_whole(2);
        assert_eq!(
            from_slice::<TokenAmount>(&to_vec(&whole).unwrap()).unwrap(),
            whole
        );
    }

    #[test]
    fn arithmetic() {
        let mut a = TokenAmount::from_atto(10);
        a -= TokenAmount::from_atto(4);
        assert_eq!(a.clone() + TokenAmount::from_atto(1), TokenAmount::from_atto(7));
        assert!(a > TokenAmount::zero());
        assert!((TokenAmount::zero() - a).is_negative());
    }
}
