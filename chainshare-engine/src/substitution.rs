//! Substitution planning for missing chain plugins.
//!
//! For every slot the evaluator marks missing, the planner searches the
//! registry for owned plugins in the same effect family, scores semantic
//! overlap, and ranks candidates. "No substitute found" is a normal result
//! (empty candidate list), never an error.

use crate::compatibility::evaluate;
use crate::errors::EngineResult;
use crate::registry::MapStore;
use chainshare_core::{Chain, MapProvenance, OwnedPluginSet, ParameterMap, PluginId, PluginRef};
use log::debug;
use serde::{Deserialize, Serialize};

/// Scoring weights and the auto-substitute floor. Reconstructed from the
/// platform's UI breakpoints, so tunable defaults rather than a contract.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub semantic_weight: f64,
    pub verified_weight: f64,
    pub category_weight: f64,
    pub auto_substitute_floor: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            semantic_weight: 0.6,
            verified_weight: 0.25,
            category_weight: 0.15,
            auto_substitute_floor: 50.0,
        }
    }
}

/// One ranked replacement option for a missing plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionCandidate {
    pub candidate_id: PluginId,
    pub candidate_name: String,
    pub semantic_overlap_percent: f64,
    pub has_verified_map: bool,
    pub combined_score: f64,
    pub reasons: Vec<String>,
}

/// Candidates for one missing slot, best first. An empty list means no
/// owned plugin in the family covers any of the missing plugin's controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSubstitutions {
    pub position: u32,
    pub missing: PluginRef,
    pub candidates: Vec<SubstitutionCandidate>,
}

/// Derived plan; recomputed per call, cacheable by
/// (chain version, owned fingerprint, registry version).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionPlan {
    pub slots: Vec<SlotSubstitutions>,
    pub overall_confidence: f64,
    pub can_auto_substitute: bool,
}

pub struct SubstitutionPlanner<'a, S: MapStore> {
    store: &'a S,
    config: PlannerConfig,
}

impl<'a, S: MapStore> SubstitutionPlanner<'a, S> {
    pub fn new(store: &'a S, config: PlannerConfig) -> Self {
        Self { store, config }
    }

    pub fn plan(&self, chain: &Chain, owned: &OwnedPluginSet) -> EngineResult<SubstitutionPlan> {
        let report = evaluate(chain, owned)?;

        let mut slots = Vec::new();
        for verdict in report.slots.iter().filter(|s| !s.owned) {
            let Some(slot) = chain.slots.iter().find(|s| s.position == verdict.position) else {
                continue;
            };
            let candidates = match self.resolve_map(&slot.plugin) {
                Some(missing_map) => self.rank_candidates(&missing_map, owned),
                None => {
                    debug!(
                        "no map for missing plugin '{}'; no substitutes proposed",
                        slot.plugin.name
                    );
                    Vec::new()
                }
            };
            slots.push(SlotSubstitutions {
                position: slot.position,
                missing: slot.plugin.clone(),
                candidates,
            });
        }

        let floor = self.config.auto_substitute_floor;
        let can_auto_substitute = slots
            .iter()
            .all(|s| s.candidates.iter().any(|c| c.combined_score >= floor));

        let overall_confidence = if slots.is_empty() {
            100.0
        } else {
            let sum: f64 = slots
                .iter()
                .map(|s| s.candidates.first().map_or(0.0, |c| c.combined_score))
                .sum();
            sum / slots.len() as f64
        };

        Ok(SubstitutionPlan {
            slots,
            overall_confidence,
            can_auto_substitute,
        })
    }

    /// Resolve the missing plugin's own map: by id when the slot is
    /// resolved, by host-reported name otherwise.
    fn resolve_map(&self, plugin: &PluginRef) -> Option<ParameterMap> {
        if let Some(id) = plugin.id {
            if let Ok(map) = self.store.get(id) {
                return Some(map);
            }
        }
        self.store.get_by_name(&plugin.name).ok()
    }

    fn rank_candidates(
        &self,
        missing_map: &ParameterMap,
        owned: &OwnedPluginSet,
    ) -> Vec<SubstitutionCandidate> {
        let targets = missing_map.semantic_ids();
        if targets.is_empty() {
            return Vec::new();
        }

        let hits = self.store.find_by_semantic_overlap(
            missing_map.category,
            &targets,
            Some(missing_map.plugin_id),
        );

        let mut candidates: Vec<SubstitutionCandidate> = hits
            .into_iter()
            .filter(|(map, _)| owned.contains_id(map.plugin_id))
            .map(|(map, overlap)| self.score_candidate(missing_map, &map, overlap, targets.len()))
            .collect();

        // Store ordering is already deterministic; re-sorting by combined
        // score keeps verified maps ahead of equal-overlap unverified ones.
        candidates.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    b.semantic_overlap_percent
                        .partial_cmp(&a.semantic_overlap_percent)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(a.candidate_id.cmp(&b.candidate_id))
        });

        candidates
    }

    fn score_candidate(
        &self,
        missing_map: &ParameterMap,
        candidate: &ParameterMap,
        overlap: usize,
        target_count: usize,
    ) -> SubstitutionCandidate {
        let overlap_percent = overlap as f64 / target_count as f64 * 100.0;
        let has_verified_map = candidate.provenance == MapProvenance::CommunityVerified;
        // The overlap search is category-restricted, so the bonus is always
        // earned today; the term stays explicit for cross-family extensions.
        let category_bonus = if candidate.category == missing_map.category {
            100.0
        } else {
            0.0
        };

        let combined_score = self.config.semantic_weight * overlap_percent
            + self.config.verified_weight * if has_verified_map { 100.0 } else { 0.0 }
            + self.config.category_weight * category_bonus;

        let mut reasons = vec![format!(
            "Covers {} of {} semantic parameters ({:.0}%)",
            overlap, target_count, overlap_percent
        )];
        if has_verified_map {
            reasons.push("Community-verified parameter map".to_string());
        } else {
            reasons.push(format!(
                "Map confidence {}% ({:?} provenance)",
                candidate.confidence, candidate.provenance
            ));
        }
        reasons.push(format!("Same effect family ({})", candidate.category));

        SubstitutionCandidate {
            candidate_id: candidate.plugin_id,
            candidate_name: candidate.plugin_name.clone(),
            semantic_overlap_percent: overlap_percent,
            has_verified_map,
            combined_score,
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{InMemoryRegistry, MapStore};
    use chainshare_core::{
        ChainSlot, EffectCategory, FamilyExtras, MappingCurve, OwnedPlugin,
        ParameterDescriptor, ParameterUnit,
    };
    use std::collections::HashMap;

    fn comp_params(count: usize) -> Vec<ParameterDescriptor> {
        (0..count)
            .map(|i| {
                ParameterDescriptor::continuous(
                    &format!("Param {}", i),
                    &format!("comp_param_{}", i),
                    ParameterUnit::Percent,
                    MappingCurve::Linear,
                    0.0,
                    100.0,
                )
            })
            .collect()
    }

    fn comp_map(
        name: &str,
        parameters: Vec<ParameterDescriptor>,
        provenance: MapProvenance,
    ) -> ParameterMap {
        ParameterMap {
            plugin_id: PluginId::new(),
            plugin_name: name.to_string(),
            manufacturer: "Test Audio".to_string(),
            category: EffectCategory::Compressor,
            parameters,
            extras: FamilyExtras::Compressor {
                has_auto_makeup: false,
                has_parallel_mix: false,
                has_lookahead: false,
            },
            confidence: 75,
            provenance,
            contributor_count: 1,
            updated_at: 1_700_000_000,
        }
    }

    fn slot(position: u32, plugin: PluginRef) -> ChainSlot {
        ChainSlot {
            position,
            plugin,
            bypassed: false,
            snapshot: HashMap::new(),
            preset_name: None,
        }
    }

    fn owned(map: &ParameterMap) -> OwnedPlugin {
        OwnedPlugin {
            id: map.plugin_id,
            name: map.plugin_name.clone(),
            manufacturer: map.manufacturer.clone(),
        }
    }

    /// Missing Comp-B; owned Comp-D overlaps 8/10 with a verified map and
    /// Comp-E overlaps 3/10 unverified.
    fn scenario() -> (InMemoryRegistry, Chain, OwnedPluginSet) {
        let mut reg = InMemoryRegistry::new();

        let missing = comp_map("Comp-B", comp_params(10), MapProvenance::Manual);
        let comp_d = comp_map("Comp-D", comp_params(8), MapProvenance::CommunityVerified);
        let comp_e = comp_map("Comp-E", comp_params(3), MapProvenance::AiGenerated);

        let missing_ref = PluginRef::resolved(missing.plugin_id, "Comp-B", "Test Audio");
        let inventory = OwnedPluginSet::new(vec![owned(&comp_d), owned(&comp_e)]);

        for m in [missing, comp_d, comp_e] {
            reg.upsert(m).unwrap();
        }

        let chain = Chain::new("Bus", "ava", vec![slot(0, missing_ref)]);
        (reg, chain, inventory)
    }

    #[test]
    fn ranks_by_combined_score() {
        let (reg, chain, inventory) = scenario();
        let planner = SubstitutionPlanner::new(&reg, PlannerConfig::default());
        let plan = planner.plan(&chain, &inventory).unwrap();

        assert_eq!(plan.slots.len(), 1);
        let candidates = &plan.slots[0].candidates;
        assert_eq!(candidates.len(), 2);

        let best = &candidates[0];
        assert_eq!(best.candidate_name, "Comp-D");
        assert!((best.semantic_overlap_percent - 80.0).abs() < 1e-9);
        assert!(best.has_verified_map);
        // 0.6*80 + 0.25*100 + 0.15*100 = 88
        assert!((best.combined_score - 88.0).abs() < 1e-9);

        let second = &candidates[1];
        assert_eq!(second.candidate_name, "Comp-E");
        assert!((second.combined_score - 33.0).abs() < 1e-9);

        assert!(plan.can_auto_substitute);
        assert!((plan.overall_confidence - 88.0).abs() < 1e-9);
    }

    #[test]
    fn below_floor_candidates_stay_visible_but_block_auto() {
        let (reg, chain, _) = scenario();
        // Keep only the weak candidate in the inventory.
        let comp_e = reg.get_by_name("Comp-E").unwrap();
        let inventory = OwnedPluginSet::new(vec![owned(&comp_e)]);

        let planner = SubstitutionPlanner::new(&reg, PlannerConfig::default());
        let plan = planner.plan(&chain, &inventory).unwrap();

        let candidates = &plan.slots[0].candidates;
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].combined_score < 50.0);
        assert!(!plan.can_auto_substitute);

        // The floor is a tunable default.
        let lenient = PlannerConfig {
            auto_substitute_floor: 30.0,
            ..Default::default()
        };
        let plan = SubstitutionPlanner::new(&reg, lenient)
            .plan(&chain, &inventory)
            .unwrap();
        assert!(plan.can_auto_substitute);
    }

    #[test]
    fn missing_map_yields_empty_candidates() {
        let reg = InMemoryRegistry::new();
        let chain = Chain::new(
            "Bus",
            "ava",
            vec![slot(0, PluginRef::unresolved("Obscure Comp", "Boutique"))],
        );
        let planner = SubstitutionPlanner::new(&reg, PlannerConfig::default());
        let plan = planner.plan(&chain, &OwnedPluginSet::default()).unwrap();

        assert_eq!(plan.slots.len(), 1);
        assert!(plan.slots[0].candidates.is_empty());
        assert_eq!(plan.overall_confidence, 0.0);
        assert!(!plan.can_auto_substitute);
    }

    #[test]
    fn fully_owned_chain_needs_no_plan() {
        let mut reg = InMemoryRegistry::new();
        let map = comp_map("Comp-B", comp_params(4), MapProvenance::Manual);
        let plugin_ref = PluginRef::resolved(map.plugin_id, "Comp-B", "Test Audio");
        let inventory = OwnedPluginSet::new(vec![owned(&map)]);
        reg.upsert(map).unwrap();

        let chain = Chain::new("Bus", "ava", vec![slot(0, plugin_ref)]);
        let planner = SubstitutionPlanner::new(&reg, PlannerConfig::default());
        let plan = planner.plan(&chain, &inventory).unwrap();

        assert!(plan.slots.is_empty());
        assert!(plan.can_auto_substitute);
        assert_eq!(plan.overall_confidence, 100.0);
    }

    #[test]
    fn planning_is_deterministic() {
        let (reg, chain, inventory) = scenario();
        let planner = SubstitutionPlanner::new(&reg, PlannerConfig::default());
        let first = planner.plan(&chain, &inventory).unwrap();
        let second = planner.plan(&chain, &inventory).unwrap();
        assert_eq!(first, second);
    }
}
