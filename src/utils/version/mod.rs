// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

/// Semantic version packed into one integer as `major << 16 | minor << 8 | patch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion(pub u32);

/// Packs a semantic version into a single integer.
///
/// ```
/// # use forest_actor_vm::utils::version::make_api_version;
/// assert_eq!(make_api_version(1, 2, 3), 0x010203);
/// ```
pub fn make_api_version(major: u8, minor: u8, patch: u8) -> u32 {
    u32::from(major) << 16 | u32::from(minor) << 8 | u32::from(patch)
}

impl ApiVersion {
    pub fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self(make_api_version(major, minor, patch))
    }

    pub const fn major(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn minor(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn patch(self) -> u8 {
        self.0 as u8
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}
