//! Vehicle layer: road-load model, per-gear speeds and top-speed estimate.
//!
//! This layer is an external consumer of the torque/power curve: it only
//! needs `curve(rpm) → (torque, power)` plus drivetrain ratios, never the
//! BMEP internals. The top-speed estimate is a deterministic scan over the
//! curve samples, not a solver.

use serde::{Deserialize, Serialize};

use crate::domain::{CurveSet, DrivetrainSpec, EngineSpec, VehicleSpec};
use crate::error::AppError;

pub mod shifts;

pub use shifts::{ShiftPoint, recommend_upshifts};

const G: f64 = 9.80665;

pub const DEFAULT_AIR_DENSITY_KG_M3: f64 = 1.225;
pub const DEFAULT_CRR: f64 = 0.012;
pub const DEFAULT_DRIVETRAIN_EFFICIENCY: f64 = 0.90;

/// Resolved drivetrain parameters (all fields required past this point).
pub(crate) struct ResolvedDrivetrain<'a> {
    pub gears: &'a [f64],
    pub final_drive: f64,
    pub tire_radius_m: f64,
    pub efficiency: f64,
}

pub(crate) fn resolve_drivetrain(drivetrain: &DrivetrainSpec) -> Result<ResolvedDrivetrain<'_>, AppError> {
    let gears = drivetrain
        .gears
        .as_deref()
        .filter(|g| !g.is_empty())
        .ok_or_else(|| AppError::InvalidVehicle("gears: required, none provided".to_string()))?;
    let final_drive = drivetrain
        .final_drive
        .ok_or_else(|| AppError::InvalidVehicle("final_drive: required, none provided".to_string()))?;
    let tire_radius_m = drivetrain
        .tire_radius_m
        .ok_or_else(|| AppError::InvalidVehicle("tire_radius_m: required, none provided".to_string()))?;
    for (i, &g) in gears.iter().enumerate() {
        if g <= 0.0 {
            return Err(AppError::InvalidVehicle(format!(
                "gears[{i}]: must be > 0, got {g}"
            )));
        }
    }
    if final_drive <= 0.0 {
        return Err(AppError::InvalidVehicle(format!(
            "final_drive: must be > 0, got {final_drive}"
        )));
    }
    if tire_radius_m <= 0.0 {
        return Err(AppError::InvalidVehicle(format!(
            "tire_radius_m: must be > 0, got {tire_radius_m}"
        )));
    }
    Ok(ResolvedDrivetrain {
        gears,
        final_drive,
        tire_radius_m,
        efficiency: drivetrain
            .drivetrain_efficiency
            .unwrap_or(DEFAULT_DRIVETRAIN_EFFICIENCY),
    })
}

/// Road speed in m/s for an engine rpm through a gear.
pub fn speed_mps_from_rpm(
    rpm: f64,
    gear_ratio: f64,
    final_drive: f64,
    tire_radius_m: f64,
) -> Result<f64, AppError> {
    if rpm < 0.0 {
        return Err(AppError::InvalidRange(format!(
            "rpm: must be >= 0, got {rpm}"
        )));
    }
    if gear_ratio <= 0.0 || final_drive <= 0.0 || tire_radius_m <= 0.0 {
        return Err(AppError::InvalidVehicle(format!(
            "gear_ratio/final_drive/tire_radius_m: must all be > 0, got \
             {gear_ratio}/{final_drive}/{tire_radius_m}"
        )));
    }

    let wheel_rpm = rpm / (gear_ratio * final_drive);
    let circumference_m = 2.0 * std::f64::consts::PI * tire_radius_m;
    Ok((wheel_rpm * circumference_m) / 60.0)
}

pub fn speed_kph_from_rpm(
    rpm: f64,
    gear_ratio: f64,
    final_drive: f64,
    tire_radius_m: f64,
) -> Result<f64, AppError> {
    speed_mps_from_rpm(rpm, gear_ratio, final_drive, tire_radius_m).map(|v| v * 3.6)
}

/// Power needed to hold speed `v_mps` on flat ground: aero drag + rolling
/// resistance.
pub fn road_load_power_w(
    v_mps: f64,
    mass_kg: f64,
    cd: f64,
    frontal_area_m2: f64,
    crr: f64,
    air_density_kg_m3: f64,
) -> Result<f64, AppError> {
    if v_mps < 0.0 {
        return Err(AppError::InvalidRange(format!(
            "v_mps: must be >= 0, got {v_mps}"
        )));
    }
    for (name, value) in [
        ("mass_kg", mass_kg),
        ("cd", cd),
        ("frontal_area_m2", frontal_area_m2),
        ("crr", crr),
        ("air_density_kg_m3", air_density_kg_m3),
    ] {
        if value <= 0.0 {
            return Err(AppError::InvalidVehicle(format!(
                "{name}: must be > 0, got {value}"
            )));
        }
    }

    let cda = cd * frontal_area_m2;
    let p_aero = 0.5 * air_density_kg_m3 * cda * v_mps.powi(3);
    let p_rr = crr * mass_kg * G * v_mps;
    Ok(p_aero + p_rr)
}

/// Road speed at redline for every gear, in km/h.
pub fn per_gear_redline_speeds_kph(
    engine: &EngineSpec,
    drivetrain: &DrivetrainSpec,
) -> Result<Vec<f64>, AppError> {
    let dt = resolve_drivetrain(drivetrain)?;
    dt.gears
        .iter()
        .map(|&g| speed_kph_from_rpm(engine.redline_rpm, g, dt.final_drive, dt.tire_radius_m))
        .collect()
}

/// Top-speed scan result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TopSpeed {
    pub speed_kph: f64,
    /// 1-based gear index; 0 when no sample had enough power.
    pub gear: usize,
    pub rpm: f64,
    pub drivetrain_efficiency: f64,
    pub air_density_kg_m3: f64,
    pub crr: f64,
}

/// Highest speed, over all gears and curve samples up to redline, where
/// available power covers road load.
pub fn estimate_top_speed(
    curve: &CurveSet,
    engine: &EngineSpec,
    vehicle: &VehicleSpec,
    drivetrain: &DrivetrainSpec,
) -> Result<TopSpeed, AppError> {
    let dt = resolve_drivetrain(drivetrain)?;
    let mass_kg = vehicle
        .mass_kg
        .ok_or_else(|| AppError::InvalidVehicle("mass_kg: required, none provided".to_string()))?;
    let cd = vehicle
        .cd
        .ok_or_else(|| AppError::InvalidVehicle("cd: required, none provided".to_string()))?;
    let frontal_area_m2 = vehicle.frontal_area_m2.ok_or_else(|| {
        AppError::InvalidVehicle("frontal_area_m2: required, none provided".to_string())
    })?;
    let crr = vehicle.crr.unwrap_or(DEFAULT_CRR);
    let rho = vehicle.air_density_kg_m3.unwrap_or(DEFAULT_AIR_DENSITY_KG_M3);

    let mut best = TopSpeed {
        speed_kph: 0.0,
        gear: 0,
        rpm: 0.0,
        drivetrain_efficiency: dt.efficiency,
        air_density_kg_m3: rho,
        crr,
    };

    for (gi, &gear) in dt.gears.iter().enumerate() {
        for p in &curve.points {
            if p.rpm > engine.redline_rpm {
                continue;
            }
            let v_mps = speed_mps_from_rpm(p.rpm, gear, dt.final_drive, dt.tire_radius_m)?;
            let p_avail_w = p.power_kw * 1000.0 * dt.efficiency;
            let p_req_w = road_load_power_w(v_mps, mass_kg, cd, frontal_area_m2, crr, rho)?;
            if p_avail_w >= p_req_w && v_mps * 3.6 > best.speed_kph {
                best.speed_kph = v_mps * 3.6;
                best.gear = gi + 1;
                best.rpm = p.rpm;
            }
        }
    }

    Ok(best)
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

    fn vehicle() -> VehicleSpec {
        VehicleSpec {
            mass_kg: Some(1500.0),
            cd: Some(0.29),
            frontal_area_m2: Some(2.2),
            crr: None,
            air_density_kg_m3: None,
        }
    }

    #[test]
    fn speed_is_linear_in_rpm() {
        let v1 = speed_mps_from_rpm(3000.0, 1.0, 4.1, 0.31).unwrap();
        let v2 = speed_mps_from_rpm(6000.0, 1.0, 4.1, 0.31).unwrap();
        assert!((v2 - 2.0 * v1).abs() < 1e-12);
    }

    #[test]
    fn speed_rejects_non_positive_drivetrain_values() {
        assert!(speed_mps_from_rpm(3000.0, 0.0, 4.1, 0.31).is_err());
        assert!(speed_mps_from_rpm(-1.0, 1.0, 4.1, 0.31).is_err());
    }

    #[test]
    fn road_load_grows_with_the_cube_of_speed() {
        let p20 = road_load_power_w(20.0, 1500.0, 0.29, 2.2, 0.012, 1.225).unwrap();
        let p40 = road_load_power_w(40.0, 1500.0, 0.29, 2.2, 0.012, 1.225).unwrap();
        // Aero dominates at speed: ratio is between 4x (pure rolling) and 8x
        // (pure aero).
        assert!(p40 / p20 > 4.0 && p40 / p20 < 8.0);
    }

    #[test]
    fn per_gear_speeds_decrease_with_shorter_gears() {
        let speeds = per_gear_redline_speeds_kph(&engine(), &drivetrain()).unwrap();
        assert_eq!(speeds.len(), 6);
        for pair in speeds.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn top_speed_lands_in_a_plausible_band() {
        let cfg = RunConfig {
            rpm_min: 1000.0,
            rpm_max: 6800.0,
            rpm_step: 100.0,
            profile: ProfileKind::Balanced,
        };
        let curve = build_curve(&engine(), &cfg).unwrap();
        let top = estimate_top_speed(&curve, &engine(), &vehicle(), &drivetrain()).unwrap();

        // ~90 kW in a 1500 kg sedan: expect a 180-260 km/h estimate.
        assert!(top.speed_kph > 180.0 && top.speed_kph < 260.0, "{top:?}");
        assert!(top.gear >= 4);
        assert_eq!(top.drivetrain_efficiency, DEFAULT_DRIVETRAIN_EFFICIENCY);
    }

    #[test]
    fn missing_vehicle_fields_are_named() {
        let cfg = RunConfig {
            rpm_min: 1000.0,
            rpm_max: 6800.0,
            rpm_step: 100.0,
            profile: ProfileKind::Balanced,
        };
        let curve = build_curve(&engine(), &cfg).unwrap();
        let mut veh = vehicle();
        veh.cd = None;
        let err = estimate_top_speed(&curve, &engine(), &veh, &drivetrain()).unwrap_err();
        assert!(format!("{err}").contains("cd"));
    }
}
