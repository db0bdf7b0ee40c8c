// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Filecoin builtin actor execution core.
//!
//! Actor state is stored as `dag-cbor` blocks in an [`db::Ipld`] store and read back through
//! [`actors::universal::Universal`] handles that know which layout each actor version uses.
//! Method bodies run against the [`runtime::Runtime`] boundary and are dispatched by the
//! [`invoker::Invoker`] from per-version method tables. [`interpreter::Vm`] is a reference
//! runtime applying messages to a [`state_tree::StateTree`].

pub mod actors;
pub mod config;
pub mod db;
pub mod interpreter;
pub mod invoker;
pub mod ipld;
pub mod runtime;
pub mod shim;
pub mod state_tree;
pub mod utils;
