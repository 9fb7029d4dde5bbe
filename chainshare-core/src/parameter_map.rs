//! Canonical parameter map model.
//!
//! A `ParameterMap` describes one plugin's controls in semantic terms: what
//! each native control means, its physical unit and bounds, the response
//! curve relating a normalized 0..1 automation position to the physical
//! value, and family-specific extras used by substitution scoring.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Catalog identity of a plugin. Chains and maps hold ids only and resolve
/// them through the registry at evaluation time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PluginId(pub Uuid);

impl PluginId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PluginId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Physical unit of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterUnit {
    Hz,
    Db,
    Ms,
    Ratio,
    Percent,
    Stepped,
    Boolean,
}

impl ParameterUnit {
    /// Units whose values live on a continuous physical scale.
    pub fn is_continuous(self) -> bool {
        !matches!(self, ParameterUnit::Stepped | ParameterUnit::Boolean)
    }
}

impl fmt::Display for ParameterUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterUnit::Hz => "hz",
            ParameterUnit::Db => "db",
            ParameterUnit::Ms => "ms",
            ParameterUnit::Ratio => "ratio",
            ParameterUnit::Percent => "percent",
            ParameterUnit::Stepped => "stepped",
            ParameterUnit::Boolean => "boolean",
        };
        f.write_str(s)
    }
}

/// Response curve relating normalized position to physical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingCurve {
    Linear,
    Logarithmic,
    Exponential,
    Stepped,
}

/// One native control described in semantic terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Host-facing control label/id as the plugin exposes it.
    pub native_id: String,
    /// Canonical token, e.g. `eq_band_3_freq`, `comp_threshold`.
    pub semantic_id: String,
    pub unit: ParameterUnit,
    pub curve: MappingCurve,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub default: Option<f64>,
    /// Ordered labels; non-empty only for stepped parameters.
    #[serde(default)]
    pub step_labels: Vec<String>,
}

impl ParameterDescriptor {
    /// Continuous parameter (hz/db/ms/ratio/percent).
    pub fn continuous(
        native_id: &str,
        semantic_id: &str,
        unit: ParameterUnit,
        curve: MappingCurve,
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            native_id: native_id.to_string(),
            semantic_id: semantic_id.to_string(),
            unit,
            curve,
            min,
            max,
            default: None,
            step_labels: Vec::new(),
        }
    }

    /// Stepped parameter with ordered labels.
    pub fn stepped(native_id: &str, semantic_id: &str, labels: &[&str]) -> Self {
        Self {
            native_id: native_id.to_string(),
            semantic_id: semantic_id.to_string(),
            unit: ParameterUnit::Stepped,
            curve: MappingCurve::Stepped,
            min: 0.0,
            max: (labels.len().saturating_sub(1)) as f64,
            default: None,
            step_labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// On/off parameter.
    pub fn toggle(native_id: &str, semantic_id: &str) -> Self {
        Self {
            native_id: native_id.to_string(),
            semantic_id: semantic_id.to_string(),
            unit: ParameterUnit::Boolean,
            curve: MappingCurve::Linear,
            min: 0.0,
            max: 1.0,
            default: None,
            step_labels: Vec::new(),
        }
    }
}

/// Effect family of a plugin. Substitution candidates are only drawn from
/// the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectCategory {
    Eq,
    Compressor,
    Limiter,
    Gate,
    Reverb,
    Delay,
    Distortion,
    Modulation,
    Utility,
    Other,
}

impl fmt::Display for EffectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EffectCategory::Eq => "eq",
            EffectCategory::Compressor => "compressor",
            EffectCategory::Limiter => "limiter",
            EffectCategory::Gate => "gate",
            EffectCategory::Reverb => "reverb",
            EffectCategory::Delay => "delay",
            EffectCategory::Distortion => "distortion",
            EffectCategory::Modulation => "modulation",
            EffectCategory::Utility => "utility",
            EffectCategory::Other => "other",
        };
        f.write_str(s)
    }
}

/// Family-specific map extras. Closed union so family-aware logic is
/// exhaustively checked instead of probing optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum FamilyExtras {
    Eq {
        band_count: u8,
        /// Pattern the band semantic ids follow, e.g. `eq_band_{n}_freq`.
        band_parameter_pattern: String,
    },
    Compressor {
        has_auto_makeup: bool,
        has_parallel_mix: bool,
        has_lookahead: bool,
    },
    Generic,
}

/// Where a map submission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapProvenance {
    Manual,
    HostScanned,
    AiGenerated,
    CommunityVerified,
}

impl MapProvenance {
    /// Human submissions count toward contributor totals; automated
    /// pipelines do not, so repeated batch runs cannot inflate the count.
    pub fn is_community_sourced(self) -> bool {
        matches!(
            self,
            MapProvenance::Manual | MapProvenance::CommunityVerified
        )
    }

    /// Trust ordering used when merging submissions for the same plugin.
    pub fn rank(self) -> u8 {
        match self {
            MapProvenance::AiGenerated => 0,
            MapProvenance::HostScanned => 1,
            MapProvenance::Manual => 2,
            MapProvenance::CommunityVerified => 3,
        }
    }
}

/// Full declarative description of one plugin's controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterMap {
    pub plugin_id: PluginId,
    pub plugin_name: String,
    pub manufacturer: String,
    pub category: EffectCategory,
    /// Unique by `semantic_id`; validated on registry upsert.
    pub parameters: Vec<ParameterDescriptor>,
    pub extras: FamilyExtras,
    /// 0..=100 trust score. Merging never lowers it.
    pub confidence: u8,
    pub provenance: MapProvenance,
    pub contributor_count: u32,
    pub updated_at: u64,
}

impl ParameterMap {
    pub fn descriptor_by_semantic(&self, semantic_id: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|d| d.semantic_id == semantic_id)
    }

    pub fn semantic_ids(&self) -> Vec<String> {
        self.parameters.iter().map(|d| d.semantic_id.clone()).collect()
    }
}
