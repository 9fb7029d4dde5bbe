//! Parameter semantic mapping and cross-plugin substitution engine.
//!
//! Architecture:
//! - Registry: durable store of one declarative parameter map per plugin
//! - Value Codec: normalized position <-> physical value conversion
//! - Compatibility Evaluator: chain vs. inventory ownership scoring
//! - Substitution Planner: ranked owned replacements for missing plugins
//! - Translation Executor: best-effort snapshot translation between plugins
//!
//! Everything except `MapStore::upsert` is a pure function of its
//! arguments; reports and plans are derived values, never persisted.

mod compatibility;
mod errors;
mod registry;
mod substitution;
mod translation;
mod value_codec;

pub use compatibility::{evaluate, CompatibilityReport, SlotCompatibility};
pub use errors::{EngineError, EngineResult, ErrorResponse};
pub use registry::{InMemoryRegistry, MapStore, UpsertOutcome};
pub use substitution::{
    PlannerConfig, SlotSubstitutions, SubstitutionCandidate, SubstitutionPlan,
    SubstitutionPlanner,
};
pub use translation::{translate_chain_slot, TranslatedSlot};
pub use value_codec::{to_normalized, to_physical, translate, Normalized, PhysicalValue};
