//! The registry module maps VM references to VM handles.

use crate::{AdderVm, DynStepVm, RpsVm, VmError};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, sync::Arc};

/// The [VmId] is the reference a game stores to name the VM that governs it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VmId(String);

impl VmId {
    /// Returns the reference as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VmId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for VmId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for VmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The [VmRegistry] holds every VM a game engine can adjudicate with.
#[derive(Clone, Default)]
pub struct VmRegistry {
    vms: HashMap<VmId, Arc<dyn DynStepVm>>,
}

impl fmt::Debug for VmRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids = self.vms.keys().collect::<Vec<_>>();
        ids.sort();
        f.debug_struct("VmRegistry").field("vms", &ids).finish()
    }
}

impl VmRegistry {
    /// The reference of the rock-paper-scissors VM in [VmRegistry::builtin].
    pub const RPS: &'static str = "rps";
    /// The reference of the adder VM in [VmRegistry::builtin].
    pub const ADDER: &'static str = "adder";

    /// Creates a registry holding the VMs that ship with this crate.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(Self::RPS, RpsVm);
        registry.register(Self::ADDER, AdderVm);
        registry
    }

    /// Registers a VM under `id`, replacing any VM previously registered there.
    pub fn register<V>(&mut self, id: impl Into<VmId>, vm: V)
    where
        V: DynStepVm + 'static,
    {
        self.vms.insert(id.into(), Arc::new(vm));
    }

    /// Fetches the VM registered under `id`.
    pub fn get(&self, id: &VmId) -> Result<Arc<dyn DynStepVm>, VmError> {
        self.vms
            .get(id)
            .cloned()
            .ok_or_else(|| VmError::UnknownVm(id.to_string()))
    }
}
