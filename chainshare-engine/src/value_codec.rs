//! Value codec: pure conversion between normalized 0..1 automation
//! positions and physical values.
//!
//! Curve forms:
//! - linear:      p = min + t * (max - min)
//! - logarithmic: p = min * (max/min)^t                 (min > 0)
//! - exponential: p = min + (max-min) * ln(1 + t*(max-min)/min) / ln(max/min)
//!   i.e. the inverse-log transfer; fine control at the top of the range.
//! - stepped:     labels[round(t * (N-1))]
//! - boolean:     t >= 0.5

use crate::errors::{EngineError, EngineResult};
use chainshare_core::{MappingCurve, ParameterDescriptor, ParameterUnit};
use serde::{Deserialize, Serialize};

/// Physical value of a control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhysicalValue {
    Continuous(f64),
    Step { index: usize, label: String },
    Toggle(bool),
}

/// Result of normalizing a physical value. `clamped` flags values that fell
/// outside the descriptor's bounds and were pulled to 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalized {
    pub t: f64,
    pub clamped: bool,
}

impl Normalized {
    fn exact(t: f64) -> Self {
        Self { t, clamped: false }
    }
}

/// Convert a normalized 0..1 position into the descriptor's physical value.
pub fn to_physical(t: f64, d: &ParameterDescriptor) -> EngineResult<PhysicalValue> {
    if !t.is_finite() {
        return Err(EngineError::Domain {
            message: format!("non-finite normalized value for '{}'", d.semantic_id),
        });
    }
    let t = t.clamp(0.0, 1.0);

    match d.unit {
        ParameterUnit::Boolean => Ok(PhysicalValue::Toggle(t >= 0.5)),
        ParameterUnit::Stepped => {
            let n = d.step_labels.len();
            if n == 0 {
                return Err(EngineError::Domain {
                    message: format!("stepped parameter '{}' has no labels", d.semantic_id),
                });
            }
            let index = (t * (n - 1) as f64).round() as usize;
            let index = index.min(n - 1);
            Ok(PhysicalValue::Step {
                index,
                label: d.step_labels[index].clone(),
            })
        }
        _ => Ok(PhysicalValue::Continuous(continuous_to_physical(t, d)?)),
    }
}

/// Convert a physical value back to a normalized position, clamping values
/// outside the descriptor's bounds instead of failing.
pub fn to_normalized(value: &PhysicalValue, d: &ParameterDescriptor) -> EngineResult<Normalized> {
    match (value, d.unit) {
        (PhysicalValue::Toggle(on), ParameterUnit::Boolean) => {
            Ok(Normalized::exact(if *on { 1.0 } else { 0.0 }))
        }
        (PhysicalValue::Step { index, .. }, ParameterUnit::Stepped) => {
            let n = d.step_labels.len();
            if n == 0 {
                return Err(EngineError::Domain {
                    message: format!("stepped parameter '{}' has no labels", d.semantic_id),
                });
            }
            if n == 1 {
                return Ok(Normalized {
                    t: 0.0,
                    clamped: *index > 0,
                });
            }
            let clamped = *index > n - 1;
            let index = (*index).min(n - 1);
            Ok(Normalized {
                t: index as f64 / (n - 1) as f64,
                clamped,
            })
        }
        (PhysicalValue::Continuous(p), unit) if unit.is_continuous() => {
            continuous_to_normalized(*p, d)
        }
        _ => Err(EngineError::Domain {
            message: format!(
                "physical value does not match unit '{}' of '{}'",
                d.unit, d.semantic_id
            ),
        }),
    }
}

/// Translate a normalized value captured against `src` into the normalized
/// range of `dst`. Units must match; hz never maps to db.
pub fn translate(
    t: f64,
    src: &ParameterDescriptor,
    dst: &ParameterDescriptor,
) -> EngineResult<Normalized> {
    if src.unit != dst.unit {
        return Err(EngineError::IncompatibleUnit {
            from_unit: src.unit,
            to_unit: dst.unit,
        });
    }

    match src.unit {
        ParameterUnit::Stepped => translate_stepped(t, src, dst),
        _ => {
            let physical = to_physical(t, src)?;
            to_normalized(&physical, dst)
        }
    }
}

/// Stepped-to-stepped translation: case-insensitive label match first,
/// proportional index mapping when the label sets do not line up.
fn translate_stepped(
    t: f64,
    src: &ParameterDescriptor,
    dst: &ParameterDescriptor,
) -> EngineResult<Normalized> {
    let PhysicalValue::Step { index, label } = to_physical(t, src)? else {
        return Err(EngineError::Domain {
            message: format!("'{}' is not a stepped parameter", src.semantic_id),
        });
    };

    let dst_n = dst.step_labels.len();
    if dst_n == 0 {
        return Err(EngineError::Domain {
            message: format!("stepped parameter '{}' has no labels", dst.semantic_id),
        });
    }

    let label_lower = label.to_lowercase();
    let matched = dst
        .step_labels
        .iter()
        .position(|l| l.to_lowercase() == label_lower);

    let dst_index = match matched {
        Some(i) => i,
        None => {
            let src_n = src.step_labels.len();
            if src_n <= 1 {
                0
            } else {
                let scaled = index as f64 * (dst_n - 1) as f64 / (src_n - 1) as f64;
                (scaled.round() as usize).min(dst_n - 1)
            }
        }
    };

    to_normalized(
        &PhysicalValue::Step {
            index: dst_index,
            label: dst.step_labels[dst_index].clone(),
        },
        dst,
    )
}

fn continuous_to_physical(t: f64, d: &ParameterDescriptor) -> EngineResult<f64> {
    match d.curve {
        MappingCurve::Linear => Ok(d.min + t * (d.max - d.min)),
        MappingCurve::Logarithmic => {
            check_log_domain(d)?;
            Ok(d.min * (d.max / d.min).powf(t))
        }
        MappingCurve::Exponential => {
            check_log_domain(d)?;
            let span = d.max - d.min;
            Ok(d.min + span * (1.0 + t * span / d.min).ln() / (d.max / d.min).ln())
        }
        MappingCurve::Stepped => Err(EngineError::Domain {
            message: format!(
                "stepped curve on continuous unit '{}' of '{}'",
                d.unit, d.semantic_id
            ),
        }),
    }
}

fn continuous_to_normalized(p: f64, d: &ParameterDescriptor) -> EngineResult<Normalized> {
    if !p.is_finite() {
        return Err(EngineError::Domain {
            message: format!("non-finite physical value for '{}'", d.semantic_id),
        });
    }
    if p <= d.min {
        return Ok(Normalized {
            t: 0.0,
            clamped: p < d.min,
        });
    }
    if p >= d.max {
        return Ok(Normalized {
            t: 1.0,
            clamped: p > d.max,
        });
    }

    let t = match d.curve {
        MappingCurve::Linear => (p - d.min) / (d.max - d.min),
        MappingCurve::Logarithmic => {
            check_log_domain(d)?;
            (p / d.min).ln() / (d.max / d.min).ln()
        }
        MappingCurve::Exponential => {
            check_log_domain(d)?;
            let span = d.max - d.min;
            let u = (p - d.min) / span;
            d.min * ((d.max / d.min).powf(u) - 1.0) / span
        }
        MappingCurve::Stepped => {
            return Err(EngineError::Domain {
                message: format!(
                    "stepped curve on continuous unit '{}' of '{}'",
                    d.unit, d.semantic_id
                ),
            })
        }
    };

    Ok(Normalized::exact(t.clamp(0.0, 1.0)))
}

fn check_log_domain(d: &ParameterDescriptor) -> EngineResult<()> {
    if d.min <= 0.0 || d.max <= d.min {
        return Err(EngineError::Domain {
            message: format!(
                "{:?} curve on '{}' requires 0 < min < max (got {}..{})",
                d.curve, d.semantic_id, d.min, d.max
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainshare_core::ParameterDescriptor;

    fn freq() -> ParameterDescriptor {
        ParameterDescriptor::continuous(
            "Frequency",
            "eq_band_1_freq",
            ParameterUnit::Hz,
            MappingCurve::Logarithmic,
            20.0,
            20_000.0,
        )
    }

    fn gain() -> ParameterDescriptor {
        ParameterDescriptor::continuous(
            "Gain",
            "eq_band_1_gain",
            ParameterUnit::Db,
            MappingCurve::Linear,
            -24.0,
            24.0,
        )
    }

    fn attack() -> ParameterDescriptor {
        ParameterDescriptor::continuous(
            "Attack",
            "comp_attack",
            ParameterUnit::Ms,
            MappingCurve::Exponential,
            0.1,
            250.0,
        )
    }

    #[test]
    fn linear_endpoints_and_midpoint() {
        let d = gain();
        assert_eq!(to_physical(0.0, &d).unwrap(), PhysicalValue::Continuous(-24.0));
        assert_eq!(to_physical(1.0, &d).unwrap(), PhysicalValue::Continuous(24.0));
        assert_eq!(to_physical(0.5, &d).unwrap(), PhysicalValue::Continuous(0.0));
    }

    #[test]
    fn logarithmic_midpoint_is_geometric_mean() {
        let d = freq();
        let PhysicalValue::Continuous(p) = to_physical(0.5, &d).unwrap() else {
            panic!("expected continuous");
        };
        let expected = (20.0f64 * 20_000.0).sqrt();
        assert!((p - expected).abs() < 1e-6);
    }

    #[test]
    fn round_trip_within_tolerance() {
        for d in [gain(), freq(), attack()] {
            for i in 0..=20 {
                let t = i as f64 / 20.0;
                let physical = to_physical(t, &d).unwrap();
                let back = to_normalized(&physical, &d).unwrap();
                assert!(
                    (back.t - t).abs() < 1e-6,
                    "round trip failed for {:?} at t={}: got {}",
                    d.curve,
                    t,
                    back.t
                );
                assert!(!back.clamped);
            }
        }
    }

    #[test]
    fn curves_are_monotonic() {
        for d in [gain(), freq(), attack()] {
            let mut last = f64::NEG_INFINITY;
            for i in 0..=50 {
                let t = i as f64 / 50.0;
                let PhysicalValue::Continuous(p) = to_physical(t, &d).unwrap() else {
                    panic!("expected continuous");
                };
                assert!(p >= last, "{:?} not monotonic at t={}", d.curve, t);
                last = p;
            }
        }
    }

    #[test]
    fn out_of_range_physical_clamps() {
        let d = gain();
        let high = to_normalized(&PhysicalValue::Continuous(100.0), &d).unwrap();
        assert_eq!(high.t, 1.0);
        assert!(high.clamped);
        let low = to_normalized(&PhysicalValue::Continuous(-100.0), &d).unwrap();
        assert_eq!(low.t, 0.0);
        assert!(low.clamped);
    }

    #[test]
    fn log_curve_with_non_positive_min_is_domain_error() {
        let mut d = freq();
        d.min = 0.0;
        assert!(matches!(
            to_physical(0.5, &d),
            Err(EngineError::Domain { .. })
        ));
    }

    #[test]
    fn boolean_threshold() {
        let d = ParameterDescriptor::toggle("Auto Gain", "comp_auto_makeup");
        assert_eq!(to_physical(0.49, &d).unwrap(), PhysicalValue::Toggle(false));
        assert_eq!(to_physical(0.5, &d).unwrap(), PhysicalValue::Toggle(true));
        let t = to_normalized(&PhysicalValue::Toggle(true), &d).unwrap();
        assert_eq!(t.t, 1.0);
    }

    #[test]
    fn stepped_rounds_to_nearest_label() {
        let d = ParameterDescriptor::stepped("Slope", "filter_slope", &["6", "12", "24", "48"]);
        let PhysicalValue::Step { index, label } = to_physical(0.35, &d).unwrap() else {
            panic!("expected step");
        };
        assert_eq!(index, 1);
        assert_eq!(label, "12");
    }

    #[test]
    fn translate_identity_descriptor_is_exact() {
        let d = freq();
        let out = translate(0.5, &d, &d).unwrap();
        assert!((out.t - 0.5).abs() < 1e-9);
        assert!(!out.clamped);
    }

    #[test]
    fn translate_rejects_unit_mismatch() {
        let err = translate(0.5, &freq(), &gain()).unwrap_err();
        assert!(matches!(err, EngineError::IncompatibleUnit { .. }));
    }

    #[test]
    fn translate_clamps_narrower_target_range() {
        let wide = gain();
        let narrow = ParameterDescriptor::continuous(
            "Gain",
            "eq_band_1_gain",
            ParameterUnit::Db,
            MappingCurve::Linear,
            -12.0,
            12.0,
        );
        // t=1.0 on the wide range is +24 dB, past the narrow max.
        let out = translate(1.0, &wide, &narrow).unwrap();
        assert_eq!(out.t, 1.0);
        assert!(out.clamped);
    }

    #[test]
    fn stepped_translation_prefers_label_match() {
        let src = ParameterDescriptor::stepped("Slope", "filter_slope", &["6", "12", "24"]);
        let dst = ParameterDescriptor::stepped("Order", "filter_slope", &["12", "24", "36", "48"]);
        // t=1.0 -> "24" in src, which exists at index 1 in dst.
        let out = translate(1.0, &src, &dst).unwrap();
        assert!((out.t - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn stepped_translation_falls_back_to_proportional_index() {
        let src = ParameterDescriptor::stepped("Mode", "reverb_mode", &["Hall", "Room", "Plate"]);
        let dst = ParameterDescriptor::stepped("Type", "reverb_mode", &["A", "B", "C", "D", "E"]);
        // Middle step of src maps to the middle of dst.
        let out = translate(0.5, &src, &dst).unwrap();
        assert!((out.t - 0.5).abs() < 1e-9);
    }

    #[test]
    fn non_finite_input_is_rejected() {
        assert!(to_physical(f64::NAN, &gain()).is_err());
        assert!(to_normalized(&PhysicalValue::Continuous(f64::INFINITY), &gain()).is_err());
    }
}
