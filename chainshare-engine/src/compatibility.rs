//! Chain vs. inventory compatibility evaluation.

use crate::errors::{EngineError, EngineResult};
use crate::registry::normalize_token;
use chainshare_core::{Chain, OwnedPluginSet, PluginRef};
use serde::{Deserialize, Serialize};

/// Ownership verdict for one non-bypassed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCompatibility {
    pub position: u32,
    pub owned: bool,
}

/// Derived report; a pure function of chain + inventory, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub slots: Vec<SlotCompatibility>,
    pub owned_count: usize,
    pub total_count: usize,
    pub percentage: u8,
    pub can_fully_load: bool,
}

/// Evaluate how much of a chain the user can load as-is. Bypassed slots are
/// excluded from both numerator and denominator; a chain with no active
/// slots is degenerate and rejected rather than scored.
pub fn evaluate(chain: &Chain, owned: &OwnedPluginSet) -> EngineResult<CompatibilityReport> {
    let slots: Vec<SlotCompatibility> = chain
        .active_slots()
        .map(|slot| SlotCompatibility {
            position: slot.position,
            owned: owns_plugin(owned, &slot.plugin),
        })
        .collect();

    if slots.is_empty() {
        return Err(EngineError::validation(
            "slots",
            "chain has no non-bypassed slots to evaluate",
        ));
    }

    let owned_count = slots.iter().filter(|s| s.owned).count();
    let total_count = slots.len();
    let percentage = ((owned_count as f64 / total_count as f64) * 100.0).round() as u8;

    Ok(CompatibilityReport {
        slots,
        owned_count,
        total_count,
        percentage,
        can_fully_load: percentage == 100,
    })
}

/// Exact id match first; otherwise a normalized-name + manufacturer fuzzy
/// match covers slots whose host-reported label never resolved to an id.
fn owns_plugin(owned: &OwnedPluginSet, wanted: &PluginRef) -> bool {
    if let Some(id) = wanted.id {
        if owned.contains_id(id) {
            return true;
        }
    }

    let wanted_name = normalize_token(&wanted.name);
    let wanted_mfr = normalize_token(&wanted.manufacturer);
    if wanted_name.is_empty() {
        return false;
    }

    owned.iter().any(|p| {
        let name = normalize_token(&p.name);
        let name_matches =
            name == wanted_name || name.contains(&wanted_name) || wanted_name.contains(&name);
        let mfr = normalize_token(&p.manufacturer);
        let mfr_matches = mfr == wanted_mfr || mfr.contains(&wanted_mfr) || wanted_mfr.contains(&mfr);
        name_matches && mfr_matches
    })
}
