//! Analyze-mode report assembly.
//!
//! Glues the curve builder and the fuel model into one `Analysis` value and
//! attaches credibility warnings. Warnings are data on the result, not log
//! lines; the report layer decides how to print them.

use crate::domain::{Analysis, EngineSpec, RunConfig};
use crate::engine::curve::{build_curve, mean_piston_speed_mps};
use crate::engine::fuel::fuel_report;
use crate::error::AppError;
use crate::units::m3_to_l;

/// Run the full forward analysis for a resolved spec.
pub fn analyze(spec: &EngineSpec, cfg: &RunConfig) -> Result<Analysis, AppError> {
    let curve = build_curve(spec, cfg)?;
    let summary = curve.summary();

    let displacement_l = m3_to_l(spec.displacement_m3()?);
    let peak_bmep_kpa = spec.peak_bmep_pa.unwrap_or(0.0) / 1000.0;

    let (bsfc_g_per_kwh, fuel_wot, fuel_cruise) = fuel_report(spec, summary.peak_power_kw)?;

    let piston_speed_mps_at_redline = spec
        .stroke_m()
        .map(|s| mean_piston_speed_mps(s, spec.redline_rpm));

    let mut warnings = Vec::new();
    if let Some(ps) = piston_speed_mps_at_redline {
        if ps > 25.0 {
            warnings.push(format!(
                "piston_speed: very high ({ps:.1} m/s > 25). Expect durability risk."
            ));
        } else if ps > 20.0 {
            warnings.push(format!(
                "piston_speed: high ({ps:.1} m/s > 20). Racing-ish territory."
            ));
        }
    }
    if peak_bmep_kpa > 1600.0 {
        warnings.push(format!(
            "bmep: very high ({peak_bmep_kpa:.0} kPa > 1600). Likely boosted / highly tuned."
        ));
    } else if peak_bmep_kpa > 1200.0 {
        warnings.push(format!(
            "bmep: high ({peak_bmep_kpa:.0} kPa > 1200). NA engines may not sustain this."
        ));
    }

    Ok(Analysis {
        displacement_l,
        peak_bmep_kpa,
        summary,
        bsfc_g_per_kwh,
        fuel_wot,
        fuel_cruise,
        piston_speed_mps_at_redline,
        warnings,
        curve,
    })
}
