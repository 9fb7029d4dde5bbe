//! Snapshot translation between plugins.
//!
//! Given a parameter snapshot captured for one plugin and the target
//! plugin's map, produce a best-effort translated snapshot. Cross-plugin
//! translation is inherently partial: unmatched or unit-incompatible
//! parameters are dropped with a warning, never failed.

use crate::errors::EngineResult;
use crate::registry::normalize_token;
use crate::value_codec::translate;
use chainshare_core::{ParameterDescriptor, ParameterMap};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Result of translating one slot's snapshot onto a substitute plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedSlot {
    /// Target-native control id -> normalized value.
    pub snapshot: HashMap<String, f64>,
    /// translated / source parameter count; 0 is a valid result meaning no
    /// semantic overlap at all.
    pub coverage: f64,
    pub warnings: Vec<String>,
}

/// Translate every parameter in `snapshot` (source-native id -> normalized
/// value) that both maps describe under the same semantic id.
pub fn translate_chain_slot(
    snapshot: &HashMap<String, f64>,
    src_map: &ParameterMap,
    dst_map: &ParameterMap,
) -> EngineResult<TranslatedSlot> {
    let mut out = HashMap::new();
    let mut warnings = Vec::new();
    let mut translated = 0usize;

    for (native_id, value) in snapshot {
        let Some(src) = descriptor_by_native(src_map, native_id) else {
            warnings.push(format!(
                "'{}' is not described by the {} map; dropped",
                native_id, src_map.plugin_name
            ));
            continue;
        };

        let Some(dst) = dst_map.descriptor_by_semantic(&src.semantic_id) else {
            warnings.push(format!(
                "{} has no '{}' control; dropped",
                dst_map.plugin_name, src.semantic_id
            ));
            continue;
        };

        match translate(*value, src, dst) {
            Ok(normalized) => {
                if normalized.clamped {
                    warnings.push(format!(
                        "'{}' clamped to the {} range of {}",
                        src.semantic_id, dst.native_id, dst_map.plugin_name
                    ));
                }
                out.insert(dst.native_id.clone(), normalized.t);
                translated += 1;
            }
            Err(err) => {
                debug!("translation of '{}' failed: {}", src.semantic_id, err);
                warnings.push(format!("'{}' not translatable: {}", src.semantic_id, err));
            }
        }
    }

    let coverage = if snapshot.is_empty() {
        0.0
    } else {
        translated as f64 / snapshot.len() as f64
    };

    Ok(TranslatedSlot {
        snapshot: out,
        coverage,
        warnings,
    })
}

/// Exact native id match first, then the normalized form, since host
/// snapshots sometimes carry decorated labels.
fn descriptor_by_native<'a>(
    map: &'a ParameterMap,
    native_id: &str,
) -> Option<&'a ParameterDescriptor> {
    if let Some(d) = map.parameters.iter().find(|d| d.native_id == native_id) {
        return Some(d);
    }
    let needle = normalize_token(native_id);
    map.parameters
        .iter()
        .find(|d| normalize_token(&d.native_id) == needle)
}
