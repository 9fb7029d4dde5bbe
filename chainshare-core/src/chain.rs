//! Chains, slots, and user plugin inventories.
//!
//! A chain is an ordered plugin pipeline shared between users. Chains are
//! immutable once saved; editing produces a new version. Slots reference
//! plugins by identity only and are resolved through the registry at
//! evaluation time.

use crate::parameter_map::PluginId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

/// Reference to a plugin that may not resolve against the catalog (a chain
/// saved with a plugin the catalog has never seen).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginRef {
    #[serde(default)]
    pub id: Option<PluginId>,
    pub name: String,
    pub manufacturer: String,
}

impl PluginRef {
    pub fn resolved(id: PluginId, name: &str, manufacturer: &str) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
            manufacturer: manufacturer.to_string(),
        }
    }

    pub fn unresolved(name: &str, manufacturer: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            manufacturer: manufacturer.to_string(),
        }
    }
}

/// One position in a chain with the parameter snapshot captured at save
/// time (native control id -> normalized 0..1 value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSlot {
    pub position: u32,
    pub plugin: PluginRef,
    #[serde(default)]
    pub bypassed: bool,
    #[serde(default)]
    pub snapshot: HashMap<String, f64>,
    #[serde(default)]
    pub preset_name: Option<String>,
}

/// An ordered effect pipeline shared by its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub id: Uuid,
    pub version: u32,
    pub name: String,
    pub author: String,
    pub slots: Vec<ChainSlot>,
    pub created_at: u64,
}

impl Chain {
    pub fn new(name: &str, author: &str, slots: Vec<ChainSlot>) -> Self {
        Self {
            id: Uuid::new_v4(),
            version: 1,
            name: name.to_string(),
            author: author.to_string(),
            slots,
            created_at: crate::now_secs(),
        }
    }

    /// Save-as-new-version: same chain identity, bumped version, fresh
    /// timestamp. The original value is left untouched.
    pub fn with_slots(&self, slots: Vec<ChainSlot>) -> Self {
        Self {
            id: self.id,
            version: self.version + 1,
            name: self.name.clone(),
            author: self.author.clone(),
            slots,
            created_at: crate::now_secs(),
        }
    }

    pub fn active_slots(&self) -> impl Iterator<Item = &ChainSlot> {
        self.slots.iter().filter(|s| !s.bypassed)
    }
}

/// One plugin in a user's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnedPlugin {
    pub id: PluginId,
    pub name: String,
    pub manufacturer: String,
}

/// The set of plugins a user possesses, supplied by the external inventory
/// service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnedPluginSet {
    plugins: Vec<OwnedPlugin>,
}

impl OwnedPluginSet {
    pub fn new(plugins: Vec<OwnedPlugin>) -> Self {
        Self { plugins }
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn contains_id(&self, id: PluginId) -> bool {
        self.plugins.iter().any(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OwnedPlugin> {
        self.plugins.iter()
    }

    /// Stable digest over the sorted plugin ids. Combined with the chain
    /// version and registry version this forms the cache key for derived
    /// compatibility reports and substitution plans.
    pub fn fingerprint(&self) -> String {
        let mut ids: Vec<PluginId> = self.plugins.iter().map(|p| p.id).collect();
        ids.sort();
        ids.dedup();

        let mut hasher = Sha256::new();
        for id in ids {
            hasher.update(id.0.as_bytes());
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}
