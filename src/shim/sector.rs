// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use num_derive::FromPrimitive;
use serde_repr::{Deserialize_repr, Serialize_repr};

pub type SectorNumber = u64;

/// Upper bound on sector numbers, keeps RLE+ bitfields of allocated sectors bounded.
pub const MAX_SECTOR_NUMBER: SectorNumber = i64::MAX as u64;

/// SectorSize indicates one of a set of possible sizes in the network.
#[derive(
    Clone, Debug, PartialEq, Eq, Copy, Hash, FromPrimitive, Serialize_repr, Deserialize_repr,
)]
#[repr(u64)]
pub enum SectorSize {
    _2KiB = 2 << 10,
    _8MiB = 8 << 20,
    _512MiB = 512 << 20,
    _32GiB = 32 << 30,
    _64GiB = 2 * (32 << 30),
}

/// Seal proof type. This ordering defines mappings to integers in a way which MUST never change.
#[derive(
    Clone, Debug, PartialEq, Eq, Copy, Hash, FromPrimitive, Serialize_repr, Deserialize_repr,
)]
#[repr(i64)]
pub enum RegisteredSealProof {
    StackedDRG2KiBV1 = 0,
    StackedDRG8MiBV1 = 1,
    StackedDRG512MiBV1 = 2,
    StackedDRG32GiBV1 = 3,
    StackedDRG64GiBV1 = 4,

    StackedDRG2KiBV1P1 = 5,
    StackedDRG8MiBV1P1 = 6,
    StackedDRG512MiBV1P1 = 7,
    StackedDRG32GiBV1P1 = 8,
    StackedDRG64GiBV1P1 = 9,
}

/// Proof of spacetime type, used for winning and window proofs.
#[derive(
    Clone, Debug, PartialEq, Eq, Copy, Hash, FromPrimitive, Serialize_repr, Deserialize_repr,
)]
#[repr(i64)]
pub enum RegisteredPoStProof {
    StackedDRGWinning2KiBV1 = 0,
    StackedDRGWinning8MiBV1 = 1,
    StackedDRGWinning512MiBV1 = 2,
    StackedDRGWinning32GiBV1 = 3,
    StackedDRGWinning64GiBV1 = 4,
    StackedDRGWindow2KiBV1 = 5,
    StackedDRGWindow8MiBV1 = 6,
    StackedDRGWindow512MiBV1 = 7,
    StackedDRGWindow32GiBV1 = 8,
    StackedDRGWindow64GiBV1 = 9,
}

impl RegisteredSealProof {
    /// Returns the sector size of the proof type, which is measured in bytes.
    pub fn sector_size(self) -> SectorSize {
        use RegisteredSealProof::*;
        match self {
            StackedDRG2KiBV1 | StackedDRG2KiBV1P1 => SectorSize::_2KiB,
            StackedDRG8MiBV1 | StackedDRG8MiBV1P1 => SectorSize::_8MiB,
            StackedDRG512MiBV1 | StackedDRG512MiBV1P1 => SectorSize::_512MiB,
            StackedDRG32GiBV1 | StackedDRG32GiBV1P1 => SectorSize::_32GiB,
            StackedDRG64GiBV1 | StackedDRG64GiBV1P1 => SectorSize::_64GiB,
        }
    }

    /// Returns the partition size, in sectors, associated with a proof type.
    /// The partition size is the number of sectors proven in a single PoSt proof.
    pub fn window_post_partition_sectors(self) -> u64 {
        match self.sector_size() {
            SectorSize::_2KiB | SectorSize::_8MiB | SectorSize::_512MiB => 2,
            SectorSize::_32GiB => 2349,
            SectorSize::_64GiB => 2300,
        }
    }

    /// Produces the windowed PoSt-specific proof corresponding to the receiving seal proof.
    pub fn registered_window_post_proof(self) -> RegisteredPoStProof {
        use RegisteredPoStProof::*;
        match self.sector_size() {
            SectorSize::_2KiB => StackedDRGWindow2KiBV1,
            SectorSize::_8MiB => StackedDRGWindow8MiBV1,
            SectorSize::_512MiB => StackedDRGWindow512MiBV1,
            SectorSize::_32GiB => StackedDRGWindow32GiBV1,
            SectorSize::_64GiB => StackedDRGWindow64GiBV1,
        }
    }

    /// Produces the winning PoSt-specific proof corresponding to the receiving seal proof.
    pub fn registered_winning_post_proof(self) -> RegisteredPoStProof {
        use RegisteredPoStProof::*;
        match self.sector_size() {
            SectorSize::_2KiB => StackedDRGWinning2KiBV1,
            SectorSize::_8MiB => StackedDRGWinning8MiBV1,
            SectorSize::_512MiB => StackedDRGWinning512MiBV1,
            SectorSize::_32GiB => StackedDRGWinning32GiBV1,
            SectorSize::_64GiB => StackedDRGWinning64GiBV1,
        }
    }
}

impl RegisteredPoStProof {
    pub fn sector_size(self) -> SectorSize {
        use RegisteredPoStProof::*;
        match self {
            StackedDRGWinning2KiBV1 | StackedDRGWindow2KiBV1 => SectorSize::_2KiB,
            StackedDRGWinning8MiBV1 | StackedDRGWindow8MiBV1 => SectorSize::_8MiB,
            StackedDRGWinning512MiBV1 | StackedDRGWindow512MiBV1 => SectorSize::_512MiB,
            StackedDRGWinning32GiBV1 | StackedDRGWindow32GiBV1 => SectorSize::_32GiB,
            StackedDRGWinning64GiBV1 | StackedDRGWindow64GiBV1 => SectorSize::_64GiB,
        }
    }

    /// Partition size in sectors for the sector size of this proof.
    pub fn window_post_partition_sectors(self) -> u64 {
        match self.sector_size() {
            SectorSize::_2KiB | SectorSize::_8MiB | SectorSize::_512MiB => 2,
            SectorSize::_32GiB => 2349,
            SectorSize::_64GiB => 2300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::encoding::{CodecErrorKind, from_slice, to_vec};

    #[test]
    fn proof_encoding_is_integer() {
        assert_eq!(
            to_vec(&RegisteredSealProof::StackedDRG32GiBV1P1).unwrap(),
            vec![0x08]
        );
        assert_eq!(to_vec(&SectorSize::_2KiB).unwrap(), vec![0x19, 0x08, 0x00]);
    }

    #[test]
    fn unknown_proof_is_enum_error() {
        let err = from_slice::<RegisteredSealProof>(&[0x18, 0x63]).unwrap_err();
        assert_eq!(err.kind(), CodecErrorKind::WrongEnum);
    }

    #[test]
    fn window_post_for_seal() {
        assert_eq!(
            RegisteredSealProof::StackedDRG32GiBV1.registered_window_post_proof(),
            RegisteredPoStProof::StackedDRGWindow32GiBV1
        );
        assert_eq!(
            RegisteredSealProof::StackedDRG64GiBV1P1.registered_window_post_proof(),
            RegisteredPoStProof::StackedDRGWindow64GiBV1
        );
        assert_eq!(
            RegisteredSealProof::StackedDRG2KiBV1.window_post_partition_sectors(),
            2
        );
    }
}
