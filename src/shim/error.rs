// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::fmt;

/// ExitCode defines the exit code from the VM execution.
///
/// Codes below 16 are reserved for the system; actor code may only abort with codes from
/// [`ExitCode::FIRST_ACTOR_ERROR_CODE`] up.
#[repr(u32)]
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash, FromPrimitive, strum::IntoStaticStr)]
pub enum ExitCode {
    Ok = 0,

    /// Indicates failure to find an actor in the state tree.
    SysErrSenderInvalid = 1,

    /// Indicates failure to find the code for an actor.
    SysErrSenderStateInvalid = 2,

    /// Indicates failure to find a method in an actor.
    SysErrInvalidMethod = 3,

    /// Reserved, used for catching panics in older implementations.
    SysErrReserved1 = 4,

    /// Indicates that the receiver of a message is not valid (and cannot be implicitly created).
    SysErrInvalidReceiver = 5,

    /// Indicates a message sender has insufficient funds for a message's execution.
    SysErrInsufficientFunds = 6,

    /// Indicates message execution (including subcalls) used more gas than the specified limit.
    SysErrOutOfGas = 7,

    /// Indicates a message execution is forbidden for the caller.
    SysErrForbidden = 8,

    /// Indicates actor code performed a disallowed operation. Disallowed operations include:
    /// - mutating state outside of a state acquisition block
    /// - failing to invoke caller validation
    /// - aborting with a reserved exit code (including success or a system error).
    SysErrIllegalActor = 9,

    /// Indicates an invalid argument passed to a runtime method.
    SysErrIllegalArgument = 10,

    /// Reserved exit codes, do not use.
    SysErrReserved2 = 11,
    SysErrReserved3 = 12,
    SysErrReserved4 = 13,
    SysErrReserved5 = 14,
    SysErrReserved6 = 15,

    // -------Actor Error Codes-------
    /// Indicates a method parameter is invalid.
    ErrIllegalArgument = 16,
    /// Indicates a requested resource does not exist.
    ErrNotFound = 17,
    /// Indicates an action is disallowed.
    ErrForbidden = 18,
    /// Indicates a balance of funds is insufficient.
    ErrInsufficientFunds = 19,
    /// Indicates an actor's internal state is invalid.
    ErrIllegalState = 20,
    /// Indicates de/serialization failure within actor code.
    ErrSerialization = 21,
    /// Power actor specific exit code.
    ErrTooManyProveCommits = 32,
}

impl ExitCode {
    pub const FIRST_ACTOR_ERROR_CODE: u32 = 16;

    /// returns true if the exit code was a success
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Ok)
    }

    /// Returns true for codes reserved to the system (including success).
    pub fn is_system_error(self) -> bool {
        self.value() < Self::FIRST_ACTOR_ERROR_CODE
    }

    pub fn value(self) -> u32 {
        self as u32
    }

    pub fn from_value(value: u32) -> Option<Self> {
        FromPrimitive::from_u32(value)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = self.into();
        write!(f, "{}({})", name, self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_values() {
        assert_eq!(ExitCode::ErrIllegalArgument.value(), 16);
        assert_eq!(ExitCode::from_value(7), Some(ExitCode::SysErrOutOfGas));
        assert_eq!(ExitCode::from_value(22), None);
        assert!(ExitCode::SysErrForbidden.is_system_error());
        assert!(!ExitCode::ErrForbidden.is_system_error());
        assert_eq!(ExitCode::ErrNotFound.to_string(), "ErrNotFound(17)");
    }
}
