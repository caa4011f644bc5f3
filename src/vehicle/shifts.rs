//! Upshift recommendations from the torque curve.
//!
//! For each gear pair, find the earliest rpm where wheel torque in the next
//! gear (after the rpm drop) is at least wheel torque in the current gear.
//! If that never happens, shift at redline.

use serde::{Deserialize, Serialize};

use crate::domain::{CurveSet, DrivetrainSpec, EngineSpec};
use crate::error::AppError;
use crate::vehicle::{resolve_drivetrain, speed_kph_from_rpm};

/// One recommended gear change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ShiftPoint {
    pub from_gear: usize,
    pub to_gear: usize,
    pub upshift_rpm: f64,
    pub post_shift_rpm: f64,
    pub speed_kph_at_shift: f64,
}

/// Recommend upshift points for every adjacent gear pair.
pub fn recommend_upshifts(
    curve: &CurveSet,
    engine: &EngineSpec,
    drivetrain: &DrivetrainSpec,
) -> Result<Vec<ShiftPoint>, AppError> {
    let dt = resolve_drivetrain(drivetrain)?;
    if curve.points.is_empty() {
        return Err(AppError::InvalidRange(
            "curve: no samples to evaluate shifts on".to_string(),
        ));
    }

    let curve_min = curve.points[0].rpm;
    let curve_max = curve.points[curve.points.len() - 1].rpm;
    let rpm_min = engine.idle_rpm.max(curve_min);
    let rpm_max = engine.redline_rpm.min(curve_max);

    let mut out = Vec::with_capacity(dt.gears.len().saturating_sub(1));

    for i in 0..dt.gears.len().saturating_sub(1) {
        let g1 = dt.gears[i];
        let g2 = dt.gears[i + 1];
        let ratio_drop = g2 / g1;

        // Earliest rpm (at curve resolution) where the next gear wins.
        let mut chosen: Option<(f64, f64)> = None;
        for p in &curve.points {
            let r = p.rpm;
            if r < rpm_min || r > rpm_max {
                continue;
            }
            let r_after = r * ratio_drop;
            if r_after < rpm_min || r_after > rpm_max {
                continue;
            }

            let wheel_before = curve.torque_nm_at(r) * g1;
            let wheel_after = curve.torque_nm_at(r_after) * g2;
            if wheel_after >= wheel_before {
                chosen = Some((r, r_after));
                break;
            }
        }

        let (upshift_rpm, post_shift_rpm) = chosen.unwrap_or((rpm_max, rpm_max * ratio_drop));

        out.push(ShiftPoint {
            from_gear: i + 1,
            to_gear: i + 2,
            upshift_rpm,
            post_shift_rpm,
            speed_kph_at_shift: speed_kph_from_rpm(
                upshift_rpm,
                g1,
                dt.final_drive,
                dt.tire_radius_m,
            )?,
        });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cycle, Fuel, Geometry, ProfileKind, RunConfig};
    use crate::engine::curve::build_curve;
    use crate::units::cc_to_m3;

    fn engine() -> EngineSpec {
        EngineSpec {
            cylinders: 4,
            cycle: Cycle::FourStroke,
            geometry: Geometry::Displacement {
                displacement_m3: cc_to_m3(1998.0),
            },
            idle_rpm: 1000.0,
            redline_rpm: 6800.0,
            peak_bmep_pa: Some(1_100_000.0),
            fuel: Fuel::Petrol,
            bsfc_g_per_kwh: None,
        }
    }

    fn drivetrain() -> DrivetrainSpec {
        DrivetrainSpec {
            gears: Some(vec![3.60, 2.19, 1.41, 1.12, 0.87, 0.69]),
            final_drive: Some(4.10),
            tire_radius_m: Some(0.31),
            drivetrain_efficiency: None,
        }
    }

    #[test]
    fn one_recommendation_per_gear_pair() {
        let spec = engine();
        let cfg = RunConfig {
            rpm_min: 1000.0,
            rpm_max: 6800.0,
            rpm_step: 100.0,
            profile: ProfileKind::Balanced,
        };
        let curve = build_curve(&spec, &cfg).unwrap();
        let shifts = recommend_upshifts(&curve, &spec, &drivetrain()).unwrap();

        assert_eq!(shifts.len(), 5);
        for (i, s) in shifts.iter().enumerate() {
            assert_eq!(s.from_gear, i + 1);
            assert_eq!(s.to_gear, i + 2);
            assert!(s.upshift_rpm <= spec.redline_rpm);
            assert!(s.post_shift_rpm < s.upshift_rpm);
            assert!(s.speed_kph_at_shift > 0.0);
        }
    }

    #[test]
    fn falling_torque_brings_the_shift_point_below_redline() {
        // The torque-biased profile drops to half its peak by redline, so the
        // post-shift point regains wheel torque well before the limiter.
        let spec = engine();
        let cfg = RunConfig {
            rpm_min: 1000.0,
            rpm_max: 6800.0,
            rpm_step: 50.0,
            profile: ProfileKind::TorqueBiased,
        };
        let curve = build_curve(&spec, &cfg).unwrap();
        let shifts = recommend_upshifts(&curve, &spec, &drivetrain()).unwrap();
        assert!(shifts.iter().any(|s| s.upshift_rpm < spec.redline_rpm));
    }

    #[test]
    fn missing_drivetrain_fields_are_named() {
        let spec = engine();
        let cfg = RunConfig {
            rpm_min: 1000.0,
            rpm_max: 6800.0,
            rpm_step: 100.0,
            profile: ProfileKind::Balanced,
        };
        let curve = build_curve(&spec, &cfg).unwrap();
        let dt = DrivetrainSpec::default();
        let err = recommend_upshifts(&curve, &spec, &dt).unwrap_err();
        assert!(format!("{err}").contains("gears"));
    }
}
