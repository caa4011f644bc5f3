//! Assumption presets: engine, vehicle and gearbox baselines.
//!
//! These are immutable, process-wide lookup tables. Applying a preset
//! produces plain spec values; the CLI layer merges them with explicit
//! flags, and explicit values always win.

use crate::domain::{DrivetrainSpec, Fuel, ProfileKind, VehicleSpec};
use crate::error::AppError;

#[derive(Debug, Clone, Copy)]
pub struct EnginePreset {
    pub name: &'static str,
    pub profile: ProfileKind,
    pub fuel: Fuel,
    pub bsfc_g_per_kwh: Option<f64>,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct VehiclePreset {
    pub name: &'static str,
    pub mass_kg: f64,
    pub cd: f64,
    pub frontal_area_m2: f64,
    pub crr: f64,
    pub air_density_kg_m3: f64,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct GearboxPreset {
    pub name: &'static str,
    pub gears: &'static [f64],
    pub final_drive: f64,
    pub tire_radius_m: f64,
    pub drivetrain_efficiency: f64,
    pub description: &'static str,
}

pub static ENGINE_PRESETS: &[EnginePreset] = &[
    EnginePreset {
        name: "na_street",
        profile: ProfileKind::Balanced,
        fuel: Fuel::Petrol,
        bsfc_g_per_kwh: None,
        description: "Naturally aspirated street engine (balanced curve, petrol BSFC default)",
    },
    EnginePreset {
        name: "na_torque",
        profile: ProfileKind::TorqueBiased,
        fuel: Fuel::Petrol,
        bsfc_g_per_kwh: None,
        description: "NA torque-biased (earlier peak, petrol BSFC default)",
    },
    EnginePreset {
        name: "turbo_sport",
        profile: ProfileKind::TopEnd,
        fuel: Fuel::Petrol,
        bsfc_g_per_kwh: Some(290.0),
        description: "Sport turbo-ish assumptions (top-end curve, slightly worse BSFC)",
    },
    EnginePreset {
        name: "diesel_torque",
        profile: ProfileKind::TorqueBiased,
        fuel: Fuel::Diesel,
        bsfc_g_per_kwh: None,
        description: "Diesel torque assumptions (diesel BSFC default)",
    },
    EnginePreset {
        name: "e85_performance",
        profile: ProfileKind::TopEnd,
        fuel: Fuel::E85,
        bsfc_g_per_kwh: None,
        description: "E85 performance assumptions (higher BSFC default)",
    },
];

pub static VEHICLE_PRESETS: &[VehiclePreset] = &[
    VehiclePreset {
        name: "hatch",
        mass_kg: 1200.0,
        cd: 0.30,
        frontal_area_m2: 2.1,
        crr: 0.012,
        air_density_kg_m3: 1.225,
        description: "Small hatchback baseline",
    },
    VehiclePreset {
        name: "sedan",
        mass_kg: 1500.0,
        cd: 0.29,
        frontal_area_m2: 2.2,
        crr: 0.012,
        air_density_kg_m3: 1.225,
        description: "Mid-size sedan baseline",
    },
    VehiclePreset {
        name: "suv",
        mass_kg: 1900.0,
        cd: 0.34,
        frontal_area_m2: 2.6,
        crr: 0.013,
        air_density_kg_m3: 1.225,
        description: "SUV baseline (bigger CdA + mass)",
    },
    VehiclePreset {
        name: "brick4wd",
        mass_kg: 2400.0,
        cd: 0.40,
        frontal_area_m2: 3.0,
        crr: 0.014,
        air_density_kg_m3: 1.225,
        description: "Big 4WD brick (worst aero)",
    },
];

pub static GEARBOX_PRESETS: &[GearboxPreset] = &[
    GearboxPreset {
        name: "6mt_typical",
        gears: &[3.60, 2.19, 1.41, 1.12, 0.87, 0.69],
        final_drive: 4.10,
        tire_radius_m: 0.31,
        drivetrain_efficiency: 0.90,
        description: "Typical 6MT ratios + 4.10 final + 0.31m tire",
    },
    GearboxPreset {
        name: "5mt_short",
        gears: &[3.55, 1.95, 1.29, 0.97, 0.78],
        final_drive: 4.30,
        tire_radius_m: 0.31,
        drivetrain_efficiency: 0.90,
        description: "Short 5MT (more acceleration oriented)",
    },
    GearboxPreset {
        name: "8at_typical",
        gears: &[4.71, 3.14, 2.11, 1.67, 1.29, 1.00, 0.84, 0.67],
        final_drive: 3.15,
        tire_radius_m: 0.31,
        drivetrain_efficiency: 0.88,
        description: "Typical 8AT ratios",
    },
];

fn unknown(kind: &str, name: &str, valid: Vec<&'static str>) -> AppError {
    AppError::UnknownPreset(format!(
        "{kind}: unknown preset '{name}' (valid: {})",
        valid.join(", ")
    ))
}

pub fn engine_preset(name: &str) -> Result<&'static EnginePreset, AppError> {
    ENGINE_PRESETS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| unknown("engine_preset", name, list_engine_presets()))
}

pub fn vehicle_preset(name: &str) -> Result<&'static VehiclePreset, AppError> {
    VEHICLE_PRESETS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| unknown("vehicle_preset", name, list_vehicle_presets()))
}

pub fn gearbox_preset(name: &str) -> Result<&'static GearboxPreset, AppError> {
    GEARBOX_PRESETS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| unknown("gearbox_preset", name, list_gearbox_presets()))
}

pub fn list_engine_presets() -> Vec<&'static str> {
    sorted_names(ENGINE_PRESETS.iter().map(|p| p.name))
}

pub fn list_vehicle_presets() -> Vec<&'static str> {
    sorted_names(VEHICLE_PRESETS.iter().map(|p| p.name))
}

pub fn list_gearbox_presets() -> Vec<&'static str> {
    sorted_names(GEARBOX_PRESETS.iter().map(|p| p.name))
}

fn sorted_names(names: impl Iterator<Item = &'static str>) -> Vec<&'static str> {
    let mut out: Vec<&'static str> = names.collect();
    out.sort_unstable();
    out
}

impl VehiclePreset {
    pub fn to_spec(&self) -> VehicleSpec {
        VehicleSpec {
            mass_kg: Some(self.mass_kg),
            cd: Some(self.cd),
            frontal_area_m2: Some(self.frontal_area_m2),
            crr: Some(self.crr),
            air_density_kg_m3: Some(self.air_density_kg_m3),
        }
    }
}

impl GearboxPreset {
    pub fn to_spec(&self) -> DrivetrainSpec {
        DrivetrainSpec {
            gears: Some(self.gears.to_vec()),
            final_drive: Some(self.final_drive),
            tire_radius_m: Some(self.tire_radius_m),
            drivetrain_efficiency: Some(self.drivetrain_efficiency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_name_resolves() {
        for name in list_engine_presets() {
            engine_preset(name).unwrap();
        }
        for name in list_vehicle_presets() {
            vehicle_preset(name).unwrap();
        }
        for name in list_gearbox_presets() {
            gearbox_preset(name).unwrap();
        }
    }

    #[test]
    fn unknown_names_error_with_the_valid_set() {
        let err = engine_preset("warp_drive").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("warp_drive"));
        assert!(msg.contains("na_street"));
    }

    #[test]
    fn listings_are_sorted() {
        let names = list_vehicle_presets();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn gearbox_preset_converts_to_a_usable_drivetrain() {
        let dt = gearbox_preset("6mt_typical").unwrap().to_spec();
        assert_eq!(dt.gears.as_ref().map(|g| g.len()), Some(6));
        assert_eq!(dt.final_drive, Some(4.10));
    }
}
