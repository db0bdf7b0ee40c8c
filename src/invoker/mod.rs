// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Method dispatch for builtin actors.
//!
//! Every `(actor kind, actor version)` pair owns an immutable [`MethodTable`]. The
//! [`Invoker`] maps an actor's code to its table, decodes the parameters with the method's
//! declared type, runs the handler and encodes its return value.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::LazyLock;

use ahash::HashMap;
use cid::Cid;
use strum::IntoEnumIterator as _;
use tracing::{debug, trace};

use crate::actors::{ActorKind, builtin, lookup_code};
use crate::runtime::{ActorError, AsActorError, Runtime};
use crate::shim::MethodNum;
use crate::shim::error::ExitCode;
use crate::shim::version::ActorVersion;
use crate::utils::encoding::{Cbor, RawBytes};

/// Type erased method body.
pub type Handler = fn(&mut dyn Runtime, &RawBytes) -> Result<RawBytes, ActorError>;

/// One entry point of an actor.
#[derive(Clone, Copy)]
pub struct MethodEntry {
    pub num: MethodNum,
    pub name: &'static str,
    pub handler: Handler,
}

impl MethodEntry {
    pub fn new(num: MethodNum, name: &'static str, handler: Handler) -> Self {
        Self { num, name, handler }
    }
}

impl std::fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodEntry")
            .field("num", &self.num)
            .field("name", &self.name)
            .finish()
    }
}

/// Methods exported by one actor kind at one actor version.
#[derive(Debug)]
pub struct MethodTable {
    kind: ActorKind,
    version: ActorVersion,
    methods: BTreeMap<MethodNum, MethodEntry>,
}

impl MethodTable {
    /// Builds a table.
    ///
    /// # Panics
    ///
    /// Panics if two entries share a method number.
    pub fn new(kind: ActorKind, version: ActorVersion, entries: Vec<MethodEntry>) -> Self {
        let mut methods = BTreeMap::new();
        for entry in entries {
            match methods.entry(entry.num) {
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
                Entry::Occupied(existing) => panic!(
                    "{kind} {version} method table declares method {} twice ({} and {})",
                    entry.num,
                    existing.get().name,
                    entry.name
                ),
            }
        }
        Self {
            kind,
            version,
            methods,
        }
    }

    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    pub fn version(&self) -> ActorVersion {
        self.version
    }

    pub fn get(&self, method: MethodNum) -> Option<&MethodEntry> {
        self.methods.get(&method)
    }

    /// Entries in ascending method number order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodEntry> {
        self.methods.values()
    }
}

/// Builds a [`MethodTable`] from a method enum and typed handlers.
///
/// Each handler is a `fn(&mut dyn Runtime, P) -> Result<R, ActorError>` where `P` and `R`
/// implement [`Cbor`].
#[macro_export]
macro_rules! method_table {
    ($kind:expr, $version:expr, $method:ident { $($variant:ident => $handler:expr),+ $(,)? }) => {
        $crate::invoker::MethodTable::new(
            $kind,
            $version,
            vec![
                $(
                    $crate::invoker::MethodEntry::new(
                        $method::$variant as $crate::shim::MethodNum,
                        stringify!($variant),
                        |rt, params| $crate::invoker::dispatch(rt, params, $handler),
                    ),
                )+
            ],
        )
    };
}

/// Decodes `params`, runs `handler` and encodes its return value. Malformed parameters
/// abort with `ErrIllegalArgument`.
pub fn dispatch<P, R>(
    rt: &mut dyn Runtime,
    params: &RawBytes,
    handler: fn(&mut dyn Runtime, P) -> Result<R, ActorError>,
) -> Result<RawBytes, ActorError>
where
    P: Cbor,
    R: Cbor,
{
    let params = P::unmarshal_cbor(params.bytes())
        .context_code(ExitCode::ErrIllegalArgument, "failed to decode parameters")?;
    trace!("ParamsDecoded");
    let ret = handler(rt, params)?;
    let bytes = ret
        .marshal_cbor()
        .context_code(ExitCode::ErrSerialization, "failed to encode return value")?;
    Ok(RawBytes::new(bytes))
}

static BUILTIN: LazyLock<Invoker> = LazyLock::new(|| {
    Invoker::new(ActorVersion::iter().flat_map(|version| {
        ActorKind::iter().map(move |kind| builtin::method_table(kind, version))
    }))
});

/// Resolves actor code to method tables and runs invocations.
#[derive(Debug)]
pub struct Invoker {
    tables: HashMap<(ActorKind, ActorVersion), MethodTable>,
}

impl Invoker {
    /// Builds an invoker over `tables`.
    ///
    /// # Panics
    ///
    /// Panics if two tables are registered for the same kind and version.
    pub fn new(tables: impl IntoIterator<Item = MethodTable>) -> Self {
        let mut map = HashMap::default();
        for table in tables {
            let key = (table.kind, table.version);
            if map.insert(key, table).is_some() {
                panic!("duplicate method table for {} {}", key.0, key.1);
            }
        }
        Self { tables: map }
    }

    /// Invoker over every builtin actor at every supported version.
    pub fn builtin() -> &'static Invoker {
        &BUILTIN
    }

    pub fn table(&self, kind: ActorKind, version: ActorVersion) -> Option<&MethodTable> {
        self.tables.get(&(kind, version))
    }

    /// Resolves `code` to its method table. Unknown code is `SysErrIllegalActor`.
    pub fn resolve(&self, code: &Cid) -> Result<&MethodTable, ActorError> {
        let (kind, version) = lookup_code(code).exit_code(ExitCode::SysErrIllegalActor)?;
        self.table(kind, version).with_context_code(ExitCode::SysErrIllegalActor, || {
            format!("no methods registered for {kind} {version}")
        })
    }

    /// Runs `method` of the actor with code `code`. An unknown method is
    /// `SysErrInvalidMethod`.
    #[tracing::instrument(level = "debug", skip_all, fields(%code, method = method))]
    pub fn invoke(
        &self,
        rt: &mut dyn Runtime,
        code: &Cid,
        method: MethodNum,
        params: &RawBytes,
    ) -> Result<RawBytes, ActorError> {
        trace!(params_len = params.bytes().len(), "Received");
        let table = self.resolve(code)?;
        let entry = table.get(method).with_context_code(ExitCode::SysErrInvalidMethod, || {
            format!("{} {} has no method {method}", table.kind, table.version)
        })?;
        trace!(kind = %table.kind, version = %table.version, name = entry.name, "Resolved");

        let res = (entry.handler)(rt, params);
        match &res {
            Ok(ret) => debug!(name = entry.name, ret_len = ret.bytes().len(), "Success"),
            Err(e) => debug!(
                name = entry.name,
                exit_code = %e.exit_code(),
                msg = e.msg(),
                "Aborted"
            ),
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::builtin_code;
    use crate::runtime::METHOD_CONSTRUCTOR;

    fn noop(_: &mut dyn Runtime, _: ()) -> Result<(), ActorError> {
        Ok(())
    }

    #[test]
    fn every_builtin_table_is_registered() {
        let invoker = Invoker::builtin();
        for version in ActorVersion::iter() {
            for kind in ActorKind::iter() {
                let table = invoker
                    .resolve(&builtin_code(kind, version).unwrap())
                    .unwrap();
                assert_eq!((table.kind(), table.version()), (kind, version));
                assert!(table.get(METHOD_CONSTRUCTOR).is_some(), "{kind} {version}");
            }
        }
    }

    #[test]
    fn method_numbers_are_unique() {
        for version in ActorVersion::iter() {
            for kind in ActorKind::iter() {
                let table = Invoker::builtin().table(kind, version).unwrap();
                let nums: Vec<_> = table.methods().map(|m| m.num).collect();
                let mut dedup = nums.clone();
                dedup.dedup();
                assert_eq!(nums, dedup);
            }
        }
    }

    #[test]
    #[should_panic(expected = "declares method 1 twice")]
    fn duplicate_method_numbers_are_fatal() {
        MethodTable::new(
            ActorKind::System,
            ActorVersion::V0,
            vec![
                MethodEntry::new(1, "A", |rt, p| dispatch(rt, p, noop)),
                MethodEntry::new(1, "B", |rt, p| dispatch(rt, p, noop)),
            ],
        );
    }

    #[test]
    #[should_panic(expected = "duplicate method table")]
    fn duplicate_tables_are_fatal() {
        Invoker::new([
            MethodTable::new(ActorKind::System, ActorVersion::V0, vec![]),
            MethodTable::new(ActorKind::System, ActorVersion::V0, vec![]),
        ]);
    }
}
