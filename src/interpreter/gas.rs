// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use tracing::trace;

use crate::runtime::{ActorError, METHOD_SEND};
use crate::shim::MethodNum;
use crate::shim::econ::TokenAmount;
use crate::shim::error::ExitCode;

/// Single gas charge in the VM. Contains information about what gas was for, as well
/// as the amount of gas needed for computation and storage respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasCharge {
    pub name: &'static str,
    pub compute_gas: i64,
    pub storage_gas: i64,
}

impl GasCharge {
    pub fn new(name: &'static str, compute_gas: i64, storage_gas: i64) -> Self {
        Self {
            name,
            compute_gas,
            storage_gas,
        }
    }

    /// Calculates total gas charge based on compute and storage multipliers.
    pub fn total(&self) -> i64 {
        self.compute_gas.saturating_add(self.storage_gas)
    }
}

/// Flat charges applied by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceList {
    /// Charged for every invocation, including value transfers.
    pub send_base: i64,
    /// Added when the invocation carries value.
    pub send_transfer_funds: i64,
    /// Added on top of `send_transfer_funds` for a bare transfer.
    pub send_transfer_only_premium: i64,
    /// Added when a method body runs.
    pub send_invoke_method: i64,
    /// Charged per byte of parameters and return values.
    pub per_byte: i64,
    pub create_actor_compute: i64,
    pub create_actor_storage: i64,
    /// Multiplier applied to every storage charge.
    pub storage_gas_multi: i64,
}

impl Default for PriceList {
    fn default() -> Self {
        Self {
            send_base: 29233,
            send_transfer_funds: 27500,
            send_transfer_only_premium: 159672,
            send_invoke_method: -5377,
            per_byte: 1,
            create_actor_compute: 1108454,
            create_actor_storage: 36 + 40,
            storage_gas_multi: 1300,
        }
    }
}

impl PriceList {
    /// Returns the gas required for a method invocation.
    pub fn on_method_invocation(&self, value: &TokenAmount, method: MethodNum) -> GasCharge {
        let mut ret = self.send_base;
        if !value.is_zero() {
            ret += self.send_transfer_funds;
            if method == METHOD_SEND {
                ret += self.send_transfer_only_premium;
            }
        }
        if method != METHOD_SEND {
            ret += self.send_invoke_method;
        }
        GasCharge::new("OnMethodInvocation", ret, 0)
    }

    /// Returns the gas required for storing the parameters of an invocation.
    pub fn on_params(&self, size: usize) -> GasCharge {
        GasCharge::new("OnParams", 0, self.storage(size))
    }

    /// Returns the gas required for storing the response of a message in the chain.
    pub fn on_chain_return_value(&self, size: usize) -> GasCharge {
        GasCharge::new("OnChainReturnValue", 0, self.storage(size))
    }

    /// Returns the gas required for creating an actor.
    pub fn on_create_actor(&self) -> GasCharge {
        GasCharge::new(
            "OnCreateActor",
            self.create_actor_compute,
            self.create_actor_storage.saturating_mul(self.storage_gas_multi),
        )
    }

    fn storage(&self, size: usize) -> i64 {
        i64::try_from(size)
            .unwrap_or(i64::MAX)
            .saturating_mul(self.per_byte)
            .saturating_mul(self.storage_gas_multi)
    }
}

/// Tracks gas used against a fixed limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasTracker {
    gas_limit: i64,
    gas_used: i64,
}

impl GasTracker {
    pub fn new(gas_limit: i64) -> Self {
        Self {
            gas_limit,
            gas_used: 0,
        }
    }

    /// Safely consumes gas and returns an out of gas error if there is not sufficient
    /// enough gas remaining for charge. The used amount is capped at the limit.
    pub fn charge_gas(&mut self, charge: GasCharge) -> Result<(), ActorError> {
        let to_use = charge.total();
        let used = self.gas_used.saturating_add(to_use);
        trace!(name = charge.name, gas = to_use, used, limit = self.gas_limit, "charge");
        if used > self.gas_limit {
            self.gas_used = self.gas_limit;
            Err(ActorError::unchecked(
                ExitCode::SysErrOutOfGas,
                format!(
                    "not enough gas (used={used}) (limit={}) charging {}",
                    self.gas_limit, charge.name
                ),
            ))
        } else {
            self.gas_used = used;
            Ok(())
        }
    }

    pub fn gas_limit(&self) -> i64 {
        self.gas_limit
    }

    pub fn gas_used(&self) -> i64 {
        self.gas_used
    }
}
