//! Match mode: fill the blanks in a partial spec from performance targets.
//!
//! Power and torque are linear in peak BMEP at fixed geometry and rpm, so
//! each target is inverted algebraically:
//!
//! ```text
//! required_torque = target_power / ω(target_rpm)      (or the torque target)
//! bmep_at_rpm     = required_torque · 2π·revs / Vd
//! required_peak   = bmep_at_rpm / profile_factor(fraction(target_rpm))
//! ```
//!
//! Dividing by the profile factor means feeding the resolved spec back
//! through the curve builder reproduces the target at the target rpm.
//! Multiple targets each yield an independent required peak; the solver
//! takes their mean and records the relative spread.
//!
//! Every defaulted or inferred value lowers confidence and is appended to
//! the assumption list, which is exhaustive over everything the caller did
//! not explicitly provide.

use crate::domain::{
    Cycle, EngineSpec, Fuel, Geometry, MatchResult, PartialSpec, ProfileKind, Target,
};
use crate::engine::curve::{
    bmep_pa_from_torque, displacement_from_bore_stroke, torque_nm_from_power_kw,
};
use crate::error::AppError;
use crate::profiles::{self, rpm_fraction};
use crate::units::{clamp, m3_to_l};

use std::f64::consts::PI;

const DEFAULT_IDLE_RPM: f64 = 800.0;
const DEFAULT_REDLINE_RPM: f64 = 7000.0;

/// Typical naturally-aspirated-to-mildly-boosted peak BMEP band (kPa).
/// Inferred values outside it cost confidence.
const TYPICAL_BMEP_KPA: (f64, f64) = (500.0, 1800.0);

// Fixed confidence penalties. Spread between disagreeing targets is
// penalized proportionally on top of these.
const PENALTY_DEFAULTED_PARAM: f64 = 0.05;
const PENALTY_CYLINDERS_FROM_DISP: f64 = 0.15;
const PENALTY_CYLINDERS_FALLBACK: f64 = 0.20;
const PENALTY_GEOMETRY_BACKOUT: f64 = 0.20;
const PENALTY_INFERRED_TARGET_RPM: f64 = 0.10;
const PENALTY_TORQUE_AS_PEAK: f64 = 0.05;
const PENALTY_BMEP_OUT_OF_BAND: f64 = 0.10;

/// Bore/stroke ratio implied by a profile shape.
fn bore_stroke_ratio(profile: ProfileKind) -> f64 {
    match profile {
        ProfileKind::TopEnd => 1.10,       // oversquare
        ProfileKind::TorqueBiased => 0.90, // undersquare
        ProfileKind::Balanced => 1.00,
    }
}

/// Profile-implied peak-power rpm as a fraction of redline.
fn peak_power_rpm(profile: ProfileKind, redline_rpm: f64) -> f64 {
    let frac = match profile {
        ProfileKind::TopEnd => 0.95,
        ProfileKind::TorqueBiased => 0.80,
        ProfileKind::Balanced => 0.88,
    };
    (frac * redline_rpm).round()
}

/// Deterministic cylinder-count buckets by displacement.
fn cylinders_from_displacement(disp_l: f64) -> u32 {
    if disp_l < 1.1 {
        3
    } else if disp_l < 2.6 {
        4
    } else if disp_l < 3.6 {
        6
    } else if disp_l < 5.5 {
        8
    } else {
        12
    }
}

/// Back out bore and stroke from per-cylinder volume and a bore/stroke ratio.
///
/// `V_cyl = (π/4)·bore²·stroke` with `bore = r·stroke` gives
/// `stroke = (4·V_cyl / (π·r²))^(1/3)`.
fn bore_stroke_from_displacement(disp_m3: f64, cylinders: u32, ratio: f64) -> (f64, f64) {
    let v_cyl = disp_m3 / cylinders as f64;
    let stroke_m = (4.0 * v_cyl / (PI * ratio * ratio)).cbrt();
    (ratio * stroke_m, stroke_m)
}

/// Solve a partial spec against performance targets.
///
/// `profile` is the load-profile the caller intends to run the result with;
/// `None` defaults to balanced (recorded as an assumption).
pub fn match_spec(
    partial: &PartialSpec,
    targets: &[Target],
    profile: Option<ProfileKind>,
) -> Result<MatchResult, AppError> {
    let mut confidence: f64 = 1.0;
    let mut assumptions: Vec<String> = Vec::new();

    // ---- Resolve the ambient parameters, recording every default ----
    let profile = profile.unwrap_or_else(|| {
        confidence -= PENALTY_DEFAULTED_PARAM;
        assumptions.push("Assumed load profile 'balanced' (none provided)".to_string());
        ProfileKind::Balanced
    });
    let cycle = partial.cycle.unwrap_or_else(|| {
        confidence -= PENALTY_DEFAULTED_PARAM;
        assumptions.push("Assumed 4-stroke cycle (none provided)".to_string());
        Cycle::FourStroke
    });
    let fuel = partial.fuel.unwrap_or_else(|| {
        assumptions.push("Assumed fuel 'petrol' (none provided)".to_string());
        Fuel::Petrol
    });
    if partial.bsfc_g_per_kwh.is_none() {
        confidence -= PENALTY_DEFAULTED_PARAM;
        assumptions.push(format!(
            "Assumed BSFC {:.0} g/kWh from fuel '{}' (none provided)",
            fuel.default_bsfc_g_per_kwh(),
            fuel.display_name()
        ));
    }
    let idle_rpm = partial.idle_rpm.unwrap_or_else(|| {
        assumptions.push(format!("Assumed idle rpm {DEFAULT_IDLE_RPM:.0} (none provided)"));
        DEFAULT_IDLE_RPM
    });
    let redline_rpm = partial.redline_rpm.unwrap_or_else(|| {
        assumptions.push(format!(
            "Assumed redline rpm {DEFAULT_REDLINE_RPM:.0} (none provided)"
        ));
        DEFAULT_REDLINE_RPM
    });

    // ---- Complete the geometry ----
    let (geometry, cylinders) = resolve_geometry(partial, profile, &mut confidence, &mut assumptions)?;

    let spec_shell = EngineSpec {
        cylinders,
        cycle,
        geometry,
        idle_rpm,
        redline_rpm,
        peak_bmep_pa: None,
        fuel,
        bsfc_g_per_kwh: partial.bsfc_g_per_kwh,
    };
    spec_shell.validate()?;
    let displacement_m3 = spec_shell.displacement_m3()?;
    let revs_per_power = cycle.revs_per_power();

    // ---- Resolve peak BMEP ----
    let template = profiles::template(profile);
    let mut required_bmep_kpa: Vec<f64> = Vec::new();

    let resolved_peak_pa = if let Some(fixed) = partial.peak_bmep_pa {
        // Explicitly supplied; never overridden by targets.
        required_bmep_kpa.push(fixed / 1000.0);
        fixed
    } else {
        if targets.is_empty() {
            return Err(AppError::UnderspecifiedTarget(
                "targets: no performance target and no fixed peak BMEP; nothing to solve for"
                    .to_string(),
            ));
        }

        for target in targets {
            let (required_torque_nm, factor) = match *target {
                Target::Power { kw, rpm } => {
                    let rpm = match rpm {
                        Some(r) => r,
                        None => {
                            let inferred = peak_power_rpm(profile, redline_rpm);
                            confidence -= PENALTY_INFERRED_TARGET_RPM;
                            assumptions.push(format!(
                                "Assumed peak power rpm {inferred:.0} from profile '{}'",
                                profile.display_name()
                            ));
                            inferred
                        }
                    };
                    let torque = torque_nm_from_power_kw(kw, rpm)?;
                    let x = rpm_fraction(rpm, idle_rpm, redline_rpm)?;
                    (torque, template.factor(x))
                }
                Target::Torque { nm, rpm } => match rpm {
                    Some(r) => {
                        let x = rpm_fraction(r, idle_rpm, redline_rpm)?;
                        (nm, template.factor(x))
                    }
                    None => {
                        confidence -= PENALTY_TORQUE_AS_PEAK;
                        assumptions.push(
                            "Treated torque target as peak torque (no rpm provided)".to_string(),
                        );
                        (nm, 1.0)
                    }
                },
            };

            if factor <= 0.0 {
                return Err(AppError::InvalidProfile(format!(
                    "points: profile '{}' factor is 0 at the target rpm; cannot invert",
                    profile.display_name()
                )));
            }

            let bmep_at_rpm = bmep_pa_from_torque(required_torque_nm, displacement_m3, revs_per_power);
            required_bmep_kpa.push(bmep_at_rpm / factor / 1000.0);
        }

        let mean_kpa = required_bmep_kpa.iter().sum::<f64>() / required_bmep_kpa.len() as f64;
        mean_kpa * 1000.0
    };

    // Pairwise spread between independently required peaks.
    let bmep_spread_rel = if required_bmep_kpa.len() > 1 {
        let min = required_bmep_kpa.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = required_bmep_kpa.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mean = resolved_peak_pa / 1000.0;
        let rel = if mean > 0.0 { (max - min) / mean } else { 0.0 };
        confidence -= rel.min(0.5);
        rel
    } else {
        0.0
    };

    let resolved_kpa = resolved_peak_pa / 1000.0;
    if partial.peak_bmep_pa.is_none()
        && (resolved_kpa < TYPICAL_BMEP_KPA.0 || resolved_kpa > TYPICAL_BMEP_KPA.1)
    {
        confidence -= PENALTY_BMEP_OUT_OF_BAND;
        assumptions.push(format!(
            "Inferred peak BMEP {resolved_kpa:.0} kPa sits outside the typical {:.0}-{:.0} kPa band",
            TYPICAL_BMEP_KPA.0, TYPICAL_BMEP_KPA.1
        ));
    }

    let engine = EngineSpec {
        peak_bmep_pa: Some(resolved_peak_pa),
        ..spec_shell
    };

    Ok(MatchResult {
        engine,
        confidence: clamp(confidence, 0.0, 1.0),
        assumptions,
        required_bmep_kpa,
        bmep_spread_rel,
    })
}

/// Fill in missing geometry deterministically.
///
/// Returns the authoritative geometry and the cylinder count.
fn resolve_geometry(
    partial: &PartialSpec,
    profile: ProfileKind,
    confidence: &mut f64,
    assumptions: &mut Vec<String>,
) -> Result<(Geometry, u32), AppError> {
    let mut cylinders = partial.cylinders;

    // Cylinder count from displacement buckets when missing.
    if cylinders.is_none() {
        if let Some(disp) = partial.displacement_m3 {
            let inferred = cylinders_from_displacement(m3_to_l(disp));
            *confidence -= PENALTY_CYLINDERS_FROM_DISP;
            assumptions.push(format!(
                "Assumed cylinders={inferred} from displacement bucket ({:.1} L)",
                m3_to_l(disp)
            ));
            cylinders = Some(inferred);
        } else {
            *confidence -= PENALTY_CYLINDERS_FALLBACK;
            assumptions.push("Assumed cylinders=4 (no cylinder count provided)".to_string());
            cylinders = Some(4);
        }
    }
    let cylinders = cylinders.unwrap_or(4);
    if cylinders == 0 {
        return Err(AppError::InvalidGeometry(
            "cylinders: must be > 0".to_string(),
        ));
    }

    match (partial.bore_m, partial.stroke_m, partial.displacement_m3) {
        (Some(bore), Some(stroke), disp) => {
            let derived = displacement_from_bore_stroke(bore, stroke, cylinders)?;
            if let Some(given) = disp {
                if given <= 0.0 {
                    return Err(AppError::InvalidGeometry(format!(
                        "displacement_m3: must be > 0, got {given}"
                    )));
                }
                if ((derived - given) / given).abs() > 1e-3 {
                    return Err(AppError::InvalidGeometry(format!(
                        "displacement_m3: contradicts bore/stroke (given {given:.6}, derived {derived:.6})"
                    )));
                }
            }
            Ok((Geometry::BoreStroke { bore_m: bore, stroke_m: stroke }, cylinders))
        }
        (Some(bore), None, Some(disp)) => {
            // Stroke is exactly derivable; no confidence cost.
            if bore <= 0.0 || disp <= 0.0 {
                return Err(AppError::InvalidGeometry(format!(
                    "bore_m/displacement_m3: must be > 0, got {bore}/{disp}"
                )));
            }
            let stroke = disp / ((PI / 4.0) * bore * bore * cylinders as f64);
            assumptions.push(format!(
                "Derived stroke {:.1} mm from bore and displacement",
                stroke * 1000.0
            ));
            Ok((Geometry::BoreStroke { bore_m: bore, stroke_m: stroke }, cylinders))
        }
        (None, Some(stroke), Some(disp)) => {
            if stroke <= 0.0 || disp <= 0.0 {
                return Err(AppError::InvalidGeometry(format!(
                    "stroke_m/displacement_m3: must be > 0, got {stroke}/{disp}"
                )));
            }
            let bore = (disp / ((PI / 4.0) * stroke * cylinders as f64)).sqrt();
            assumptions.push(format!(
                "Derived bore {:.1} mm from stroke and displacement",
                bore * 1000.0
            ));
            Ok((Geometry::BoreStroke { bore_m: bore, stroke_m: stroke }, cylinders))
        }
        (None, None, Some(disp)) => {
            if disp <= 0.0 {
                return Err(AppError::InvalidGeometry(format!(
                    "displacement_m3: must be > 0, got {disp}"
                )));
            }
            let ratio = bore_stroke_ratio(profile);
            let (bore, stroke) = bore_stroke_from_displacement(disp, cylinders, ratio);
            *confidence -= PENALTY_GEOMETRY_BACKOUT;
            assumptions.push(format!(
                "Assumed bore/stroke ratio {ratio:.2} from profile '{}'",
                profile.display_name()
            ));
            Ok((Geometry::BoreStroke { bore_m: bore, stroke_m: stroke }, cylinders))
        }
        _ => Err(AppError::InvalidGeometry(
            "displacement_m3: provide a displacement or bore + stroke".to_string(),
        )),
    }
}
