pub mod chain;
pub mod parameter_map;

pub use chain::{Chain, ChainSlot, OwnedPlugin, OwnedPluginSet, PluginRef};
pub use parameter_map::{
    EffectCategory, FamilyExtras, MapProvenance, MappingCurve, ParameterDescriptor, ParameterMap,
    ParameterUnit, PluginId,
};

/// Current unix time in seconds, used for map/chain timestamps.
pub fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
