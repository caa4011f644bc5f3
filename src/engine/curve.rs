//! Curve generation and the BMEP↔torque↔power identities.
//!
//! The torque identity comes from work per power cycle:
//!
//! ```text
//! BMEP · Vd = torque · radians_per_cycle,   radians_per_cycle = 2π · revs_per_power
//! ```
//!
//! so a 4-stroke divides by 4π and a 2-stroke by 2π. Power is `torque · ω`.
//! Everything here is deterministic and linear in peak BMEP at fixed
//! geometry and rpm, which is what lets the Match solver invert it
//! algebraically instead of searching.

use crate::domain::{CurvePoint, CurveSet, EngineSpec, RunConfig};
use crate::error::AppError;
use crate::profiles::{self, LoadProfile, rpm_fraction};
use crate::units::rad_s_from_rpm;

use std::f64::consts::PI;

/// Total swept volume from bore, stroke and cylinder count.
pub fn displacement_from_bore_stroke(
    bore_m: f64,
    stroke_m: f64,
    cylinders: u32,
) -> Result<f64, AppError> {
    if bore_m <= 0.0 {
        return Err(AppError::InvalidGeometry(format!(
            "bore_m: must be > 0, got {bore_m}"
        )));
    }
    if stroke_m <= 0.0 {
        return Err(AppError::InvalidGeometry(format!(
            "stroke_m: must be > 0, got {stroke_m}"
        )));
    }
    if cylinders == 0 {
        return Err(AppError::InvalidGeometry(
            "cylinders: must be > 0".to_string(),
        ));
    }
    Ok((PI / 4.0) * bore_m * bore_m * stroke_m * cylinders as f64)
}

/// Mean piston speed in m/s.
///
/// Callers validate `stroke_m > 0` when assembling the `EngineSpec`.
pub fn mean_piston_speed_mps(stroke_m: f64, rpm: f64) -> f64 {
    2.0 * stroke_m * (rpm / 60.0)
}

/// Torque from BMEP at fixed geometry.
pub fn torque_nm_from_bmep(bmep_pa: f64, displacement_m3: f64, revs_per_power: f64) -> f64 {
    (bmep_pa * displacement_m3) / (2.0 * PI * revs_per_power)
}

/// Algebraic inverse of [`torque_nm_from_bmep`], used by the Match solver.
pub fn bmep_pa_from_torque(torque_nm: f64, displacement_m3: f64, revs_per_power: f64) -> f64 {
    (torque_nm * 2.0 * PI * revs_per_power) / displacement_m3
}

pub fn power_kw_from_torque(torque_nm: f64, rpm: f64) -> f64 {
    torque_nm * rad_s_from_rpm(rpm) / 1000.0
}

/// Torque needed to deliver a power level at an rpm.
pub fn torque_nm_from_power_kw(power_kw: f64, rpm: f64) -> Result<f64, AppError> {
    if rpm <= 0.0 {
        return Err(AppError::InvalidRange(format!(
            "rpm: must be > 0 to invert power, got {rpm}"
        )));
    }
    Ok((power_kw * 1000.0) / rad_s_from_rpm(rpm))
}

/// The rpm sample grid for a run: `rpm_min` to `rpm_max` inclusive.
///
/// The final step is fractional when the span is not a step multiple, so
/// `rpm_max` is always sampled exactly.
pub fn rpm_grid(cfg: &RunConfig) -> Result<Vec<f64>, AppError> {
    cfg.validate()?;

    let span = cfg.rpm_max - cfg.rpm_min;
    let steps = ((span / cfg.rpm_step) + 1e-9).floor() as usize;

    let mut rpms = Vec::with_capacity(steps + 2);
    for i in 0..=steps {
        let rpm = cfg.rpm_min + i as f64 * cfg.rpm_step;
        rpms.push(rpm.min(cfg.rpm_max));
    }
    if let Some(&last) = rpms.last() {
        if cfg.rpm_max - last > 1e-9 {
            rpms.push(cfg.rpm_max);
        }
    }
    Ok(rpms)
}

/// Build the full curve set for a spec using a built-in profile template.
pub fn build_curve(spec: &EngineSpec, cfg: &RunConfig) -> Result<CurveSet, AppError> {
    build_curve_with_profile(spec, cfg, profiles::template(cfg.profile))
}

/// Build the full curve set for a spec with an explicit (possibly custom)
/// load profile.
pub fn build_curve_with_profile(
    spec: &EngineSpec,
    cfg: &RunConfig,
    profile: &LoadProfile,
) -> Result<CurveSet, AppError> {
    spec.validate()?;
    let displacement_m3 = spec.displacement_m3()?;
    let peak_bmep_pa = spec.peak_bmep_pa.ok_or_else(|| {
        AppError::UnderspecifiedTarget(
            "peak_bmep_pa: not set on spec; supply it or resolve it with the match solver"
                .to_string(),
        )
    })?;

    let revs_per_power = spec.cycle.revs_per_power();
    let stroke_m = spec.stroke_m();
    let rpms = rpm_grid(cfg)?;

    let mut points = Vec::with_capacity(rpms.len());
    for rpm in rpms {
        let x = rpm_fraction(rpm, spec.idle_rpm, spec.redline_rpm)?;
        let factor = profile.factor(x);
        let bmep_pa = peak_bmep_pa * factor;
        let torque_nm = torque_nm_from_bmep(bmep_pa, displacement_m3, revs_per_power);
        let power_kw = power_kw_from_torque(torque_nm, rpm);

        points.push(CurvePoint {
            rpm,
            bmep_kpa: bmep_pa / 1000.0,
            torque_nm,
            power_kw,
            piston_speed_mps: stroke_m.map(|s| mean_piston_speed_mps(s, rpm)),
        });
    }

    Ok(CurveSet { points })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cycle, Fuel, Geometry, ProfileKind};
    use crate::units::cc_to_m3;

    fn spec_2l_4cyl(peak_bmep_kpa: f64) -> EngineSpec {
        EngineSpec {
            cylinders: 4,
            cycle: Cycle::FourStroke,
            geometry: Geometry::Displacement {
                displacement_m3: cc_to_m3(1998.0),
            },
            idle_rpm: 1000.0,
            redline_rpm: 8600.0,
            peak_bmep_pa: Some(peak_bmep_kpa * 1000.0),
            fuel: Fuel::Petrol,
            bsfc_g_per_kwh: None,
        }
    }

    fn cfg(rpm_min: f64, rpm_max: f64, rpm_step: f64) -> RunConfig {
        RunConfig {
            rpm_min,
            rpm_max,
            rpm_step,
            profile: ProfileKind::Balanced,
        }
    }

    #[test]
    fn torque_bmep_round_trip() {
        for &(bmep, disp, revs) in &[
            (1_200_000.0, 0.001998, 2.0),
            (800_000.0, 0.0032, 2.0),
            (950_000.0, 0.000125, 1.0),
        ] {
            let t = torque_nm_from_bmep(bmep, disp, revs);
            let back = bmep_pa_from_torque(t, disp, revs);
            assert!((back - bmep).abs() / bmep < 1e-12);
        }
    }

    #[test]
    fn four_stroke_divides_by_four_pi() {
        let t = torque_nm_from_bmep(1_200_000.0, 0.001998, 2.0);
        assert!((t - 1_200_000.0 * 0.001998 / (4.0 * PI)).abs() < 1e-9);
    }

    #[test]
    fn displacement_rejects_non_positive_inputs() {
        assert!(displacement_from_bore_stroke(0.0, 0.09, 4).is_err());
        assert!(displacement_from_bore_stroke(0.086, -1.0, 4).is_err());
        assert!(displacement_from_bore_stroke(0.086, 0.086, 0).is_err());
    }

    #[test]
    fn rpm_grid_spans_bounds_inclusively() {
        let rpms = rpm_grid(&cfg(1000.0, 7000.0, 100.0)).unwrap();
        assert_eq!(rpms[0], 1000.0);
        assert_eq!(*rpms.last().unwrap(), 7000.0);
        assert_eq!(rpms.len(), 61);
        for pair in rpms.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn rpm_grid_final_step_may_be_fractional() {
        let rpms = rpm_grid(&cfg(1000.0, 8600.0, 250.0)).unwrap();
        // 1000 + 30*250 = 8500, then a 100 rpm closing step.
        assert_eq!(rpms[rpms.len() - 2], 8500.0);
        assert_eq!(*rpms.last().unwrap(), 8600.0);
    }

    #[test]
    fn rpm_grid_rejects_bad_ranges() {
        assert!(matches!(
            rpm_grid(&cfg(7000.0, 1000.0, 100.0)).unwrap_err(),
            AppError::InvalidRange(_)
        ));
        assert!(matches!(
            rpm_grid(&cfg(1000.0, 7000.0, 0.0)).unwrap_err(),
            AppError::InvalidRange(_)
        ));
    }

    #[test]
    fn curve_rpms_monotone_and_span_exact() {
        let c = build_curve(&spec_2l_4cyl(1200.0), &cfg(1000.0, 8600.0, 100.0)).unwrap();
        assert_eq!(c.points[0].rpm, 1000.0);
        assert_eq!(c.points[c.points.len() - 1].rpm, 8600.0);
        for pair in c.points.windows(2) {
            assert!(pair[1].rpm > pair[0].rpm);
        }
    }

    #[test]
    fn peak_power_stays_under_theoretical_maximum() {
        // 1998 cc, 4-stroke, 1200 kPa, balanced profile.
        let spec = spec_2l_4cyl(1200.0);
        let c = build_curve(&spec, &cfg(1000.0, 8600.0, 100.0)).unwrap();
        let peak_kw = c.summary().peak_power_kw;

        let theoretical_kw = 1_200_000.0 * 0.001998 * rad_s_from_rpm(8600.0) / (4.0 * PI) / 1000.0;
        assert!(peak_kw < theoretical_kw);
        // The balanced profile still delivers a meaningful share of it.
        assert!(peak_kw > 0.5 * theoretical_kw);
    }

    #[test]
    fn piston_speed_present_only_with_known_stroke() {
        let c = build_curve(&spec_2l_4cyl(1200.0), &cfg(1000.0, 8600.0, 100.0)).unwrap();
        assert!(c.points[0].piston_speed_mps.is_none());

        let mut spec = spec_2l_4cyl(1200.0);
        spec.geometry = Geometry::BoreStroke {
            bore_m: 0.086,
            stroke_m: 0.086,
        };
        let c = build_curve(&spec, &cfg(1000.0, 8600.0, 100.0)).unwrap();
        let ps = c.points[c.points.len() - 1].piston_speed_mps.unwrap();
        assert!((ps - mean_piston_speed_mps(0.086, 8600.0)).abs() < 1e-12);
    }

    #[test]
    fn missing_peak_bmep_is_underspecified() {
        let mut spec = spec_2l_4cyl(1200.0);
        spec.peak_bmep_pa = None;
        assert!(matches!(
            build_curve(&spec, &cfg(1000.0, 8600.0, 100.0)).unwrap_err(),
            AppError::UnderspecifiedTarget(_)
        ));
    }
}
