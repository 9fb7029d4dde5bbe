//! Parameter map registry.
//!
//! The registry is the single owning arena for parameter maps: chains and
//! slots hold plugin ids only and resolve them here at evaluation time.
//! It is modeled as an injected `MapStore` interface so tests and isolated
//! processes can supply an in-memory instance with no shared global.

use crate::errors::{EngineError, EngineResult};
use chainshare_core::{
    EffectCategory, MappingCurve, ParameterMap, ParameterUnit, PluginId,
};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Outcome of an upsert, reported back to contribution pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Merged,
}

/// Store of one validated parameter map per plugin.
///
/// Everything except `upsert` is read-only. Concurrent contributors must
/// serialize upserts per store; maps are keyed independently, so a
/// single-key read-merge-write suffices.
pub trait MapStore {
    fn get(&self, plugin_id: PluginId) -> EngineResult<ParameterMap>;

    /// Case-insensitive, alias-resolving lookup for host-reported labels
    /// that differ slightly from the catalog name.
    fn get_by_name(&self, name: &str) -> EngineResult<ParameterMap>;

    fn upsert(&mut self, map: ParameterMap) -> EngineResult<UpsertOutcome>;

    /// Maps in `category` sharing at least one of `targets`, ordered by
    /// overlap desc, confidence desc, contributor count desc, plugin id asc.
    fn find_by_semantic_overlap(
        &self,
        category: EffectCategory,
        targets: &[String],
        exclude: Option<PluginId>,
    ) -> Vec<(ParameterMap, usize)>;

    /// Monotonically increasing version, bumped on every successful upsert.
    /// Part of the cache key for derived reports and plans.
    fn version(&self) -> u64;
}

/// In-memory `MapStore` backed by a plain `HashMap` arena.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    maps: HashMap<PluginId, ParameterMap>,
    aliases: HashMap<String, PluginId>,
    version: u64,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alternate host-reported label for a plugin, e.g.
    /// "VST3: Pro-Q 3 (FabFilter)" alongside the catalog name "Pro-Q 3".
    pub fn register_alias(&mut self, alias: &str, plugin_id: PluginId) {
        self.aliases.insert(normalize_token(alias), plugin_id);
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl MapStore for InMemoryRegistry {
    fn get(&self, plugin_id: PluginId) -> EngineResult<ParameterMap> {
        self.maps
            .get(&plugin_id)
            .cloned()
            .ok_or_else(|| EngineError::MapNotFound {
                plugin: plugin_id.to_string(),
            })
    }

    fn get_by_name(&self, name: &str) -> EngineResult<ParameterMap> {
        let needle = normalize_token(name);

        // Exact normalized name match first.
        if let Some(map) = self
            .maps
            .values()
            .find(|m| normalize_token(&m.plugin_name) == needle)
        {
            return Ok(map.clone());
        }

        // Then the alias table.
        if let Some(id) = self.aliases.get(&needle) {
            return self.get(*id);
        }

        // Finally a deterministic containment scan: longest matching
        // catalog name wins, plugin id breaks ties.
        let mut best: Option<&ParameterMap> = None;
        for map in self.maps.values() {
            let candidate = normalize_token(&map.plugin_name);
            if candidate.is_empty() || !(needle.contains(&candidate) || candidate.contains(&needle))
            {
                continue;
            }
            best = match best {
                None => Some(map),
                Some(current) => {
                    let cur_len = normalize_token(&current.plugin_name).len();
                    if (candidate.len(), std::cmp::Reverse(map.plugin_id))
                        > (cur_len, std::cmp::Reverse(current.plugin_id))
                    {
                        Some(map)
                    } else {
                        Some(current)
                    }
                }
            };
        }

        best.cloned().ok_or_else(|| EngineError::MapNotFound {
            plugin: name.to_string(),
        })
    }

    fn upsert(&mut self, map: ParameterMap) -> EngineResult<UpsertOutcome> {
        validate_map(&map)?;

        let outcome = match self.maps.remove(&map.plugin_id) {
            None => {
                self.maps.insert(map.plugin_id, map);
                UpsertOutcome::Inserted
            }
            Some(existing) => {
                let merged = merge_maps(existing, map);
                debug!(
                    "merged map for '{}': confidence {} ({} contributors)",
                    merged.plugin_name, merged.confidence, merged.contributor_count
                );
                self.maps.insert(merged.plugin_id, merged);
                UpsertOutcome::Merged
            }
        };

        self.version += 1;
        Ok(outcome)
    }

    fn find_by_semantic_overlap(
        &self,
        category: EffectCategory,
        targets: &[String],
        exclude: Option<PluginId>,
    ) -> Vec<(ParameterMap, usize)> {
        let wanted: HashSet<&str> = targets.iter().map(String::as_str).collect();

        let mut hits: Vec<(ParameterMap, usize)> = self
            .maps
            .values()
            .filter(|m| m.category == category && Some(m.plugin_id) != exclude)
            .filter_map(|m| {
                let overlap = m
                    .parameters
                    .iter()
                    .filter(|d| wanted.contains(d.semantic_id.as_str()))
                    .count();
                (overlap > 0).then(|| (m.clone(), overlap))
            })
            .collect();

        hits.sort_by(|(a, ao), (b, bo)| {
            bo.cmp(ao)
                .then(b.confidence.cmp(&a.confidence))
                .then(b.contributor_count.cmp(&a.contributor_count))
                .then(a.plugin_id.cmp(&b.plugin_id))
        });

        hits
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Compare-and-merge for competing submissions on the same plugin key.
/// Confidence only rises; the descriptor set follows the higher-confidence
/// submission; contributor counts sum only for community-sourced input.
fn merge_maps(existing: ParameterMap, incoming: ParameterMap) -> ParameterMap {
    let incoming_contribution = if incoming.provenance.is_community_sourced() {
        incoming.contributor_count.max(1)
    } else {
        0
    };

    let (mut base, other) = if incoming.confidence >= existing.confidence {
        (incoming.clone(), &existing)
    } else {
        (existing.clone(), &incoming)
    };

    base.confidence = base.confidence.max(other.confidence);
    if other.provenance.rank() > base.provenance.rank() {
        base.provenance = other.provenance;
    }
    base.contributor_count = existing.contributor_count + incoming_contribution;
    base.updated_at = existing.updated_at.max(incoming.updated_at);
    base
}

fn validate_map(map: &ParameterMap) -> EngineResult<()> {
    if map.confidence > 100 {
        return Err(EngineError::validation(
            "confidence",
            format!("must be 0..=100, got {}", map.confidence),
        ));
    }

    let mut seen = HashSet::new();
    for d in &map.parameters {
        if !seen.insert(d.semantic_id.as_str()) {
            return Err(EngineError::validation(
                "semantic_id",
                format!("duplicate semantic id '{}'", d.semantic_id),
            ));
        }

        match (d.unit, d.curve) {
            (ParameterUnit::Stepped, MappingCurve::Stepped) => {
                if d.step_labels.is_empty() {
                    return Err(EngineError::validation(
                        "step_labels",
                        format!("'{}' is stepped but has no labels", d.semantic_id),
                    ));
                }
            }
            (ParameterUnit::Stepped, _) => {
                return Err(EngineError::validation(
                    "curve",
                    format!("stepped unit on '{}' requires a stepped curve", d.semantic_id),
                ));
            }
            (_, MappingCurve::Stepped) => {
                return Err(EngineError::validation(
                    "unit",
                    format!("stepped curve on '{}' requires a stepped unit", d.semantic_id),
                ));
            }
            _ => {}
        }

        if d.unit != ParameterUnit::Stepped && !d.step_labels.is_empty() {
            return Err(EngineError::validation(
                "step_labels",
                format!("'{}' is not stepped but carries step labels", d.semantic_id),
            ));
        }

        if d.unit == ParameterUnit::Boolean && (d.min != 0.0 || d.max != 1.0) {
            return Err(EngineError::validation(
                "min",
                format!("boolean '{}' must span exactly 0..1", d.semantic_id),
            ));
        }

        if d.unit.is_continuous() {
            if !d.min.is_finite() || !d.max.is_finite() || d.min >= d.max {
                return Err(EngineError::validation(
                    "min",
                    format!("'{}' requires finite min < max", d.semantic_id),
                ));
            }
            if matches!(d.curve, MappingCurve::Logarithmic | MappingCurve::Exponential)
                && d.min <= 0.0
            {
                return Err(EngineError::validation(
                    "min",
                    format!("'{}' uses a {:?} curve and needs min > 0", d.semantic_id, d.curve),
                ));
            }
            if let Some(default) = d.default {
                if !(d.min..=d.max).contains(&default) {
                    return Err(EngineError::validation(
                        "default",
                        format!("default of '{}' falls outside [min, max]", d.semantic_id),
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Lowercase, alphanumeric-only form of a plugin/parameter label.
pub(crate) fn normalize_token(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}
