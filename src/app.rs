//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - assembles domain specs from flags and presets (explicit values win)
//! - runs analyze/match/design/vehicle through the library
//! - prints reports and writes optional exports

use clap::Parser;

use crate::cli::{AnalyzeArgs, Cli, Command, DesignArgs, MatchArgs, VehicleArgs};
use crate::domain::{
    Analysis, Constraints, DrivetrainSpec, EngineSpec, Fuel, Geometry, PartialSpec, ProfileKind,
    RunConfig, SearchSpace, Target, VehicleSpec,
};
use crate::engine::analyze;
use crate::error::AppError;
use crate::io::{load_run_json, save_run_json, write_candidates_csv, write_curves_csv, RunFile};
use crate::solver::design::{DesignRequest, search_designs};
use crate::solver::matching::match_spec;
use crate::units::{cc_to_m3, mm_to_m};
use crate::vehicle::{estimate_top_speed, per_gear_redline_speeds_kph, recommend_upshifts};

/// Entry point for the `eg` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Match(args) => handle_match(args),
        Command::Design(args) => handle_design(args),
        Command::Vehicle(args) => handle_vehicle(args),
        Command::Presets => handle_presets(),
    }
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let drivetrain = args
        .gearbox_preset
        .as_deref()
        .map(|name| crate::presets::gearbox_preset(name).map(|p| p.to_spec()))
        .transpose()?;

    if let Some(path) = &args.load_json {
        let mut run = load_run_json(path)?;
        let analysis = match (&run.analysis, args.recompute) {
            (Some(a), false) => a.clone(),
            _ => analyze(&run.engine, &run.run_config)?,
        };

        println!("{}", crate::report::format_analysis(&run.engine, &run.run_config, &analysis));
        if let Some(csv) = &args.export_csv {
            write_curves_csv(csv, &analysis.curve, drivetrain.as_ref().or(run.drivetrain.as_ref()))?;
        }
        if let Some(save) = &args.save_json {
            run.analysis = Some(analysis);
            save_run_json(save, &run)?;
        }
        return Ok(());
    }

    let (spec, cfg, assumptions) = assemble_analyze_spec(&args)?;
    let analysis = analyze(&spec, &cfg)?;

    println!("{}", crate::report::format_analysis(&spec, &cfg, &analysis));
    if !assumptions.is_empty() {
        println!("Assumptions:");
        for a in &assumptions {
            println!("  - {a}");
        }
    }

    if let Some(csv) = &args.export_csv {
        write_curves_csv(csv, &analysis.curve, drivetrain.as_ref())?;
    }
    if let Some(save) = &args.save_json {
        let mut run = RunFile::new(spec, cfg);
        run.assumptions = assumptions;
        run.drivetrain = drivetrain;
        run.analysis = Some(analysis);
        save_run_json(save, &run)?;
    }

    Ok(())
}

/// Build a fully resolved spec from analyze flags.
///
/// Resolution order for profile/fuel/BSFC: explicit flag, then engine
/// preset, then the built-in default (recorded as an assumption).
fn assemble_analyze_spec(
    args: &AnalyzeArgs,
) -> Result<(EngineSpec, RunConfig, Vec<String>), AppError> {
    let mut assumptions = Vec::new();

    let preset = args
        .engine_preset
        .as_deref()
        .map(crate::presets::engine_preset)
        .transpose()?;
    if let Some(p) = preset {
        assumptions.push(format!("Applied engine preset '{}'", p.name));
    }

    let profile = match args.profile.or(preset.map(|p| p.profile)) {
        Some(p) => p,
        None => {
            assumptions.push("Assumed load profile 'balanced' (none provided)".to_string());
            ProfileKind::Balanced
        }
    };
    let fuel = match args.fuel.or(preset.map(|p| p.fuel)) {
        Some(f) => f,
        None => {
            assumptions.push("Assumed fuel 'petrol' (none provided)".to_string());
            Fuel::Petrol
        }
    };
    let bsfc = args.bsfc.or(preset.and_then(|p| p.bsfc_g_per_kwh));
    if bsfc.is_none() {
        assumptions.push(format!(
            "Assumed BSFC {:.0} g/kWh from fuel '{}' (none provided)",
            fuel.default_bsfc_g_per_kwh(),
            fuel.display_name()
        ));
    }

    let geometry = match (args.disp_cc, args.bore_mm, args.stroke_mm) {
        (_, Some(bore_mm), Some(stroke_mm)) => {
            let geometry = Geometry::BoreStroke {
                bore_m: mm_to_m(bore_mm),
                stroke_m: mm_to_m(stroke_mm),
            };
            if let Some(cc) = args.disp_cc {
                // Both representations supplied: they must agree.
                let derived = crate::engine::displacement_from_bore_stroke(
                    mm_to_m(bore_mm),
                    mm_to_m(stroke_mm),
                    args.cyl.unwrap_or(4),
                )?;
                let given = cc_to_m3(cc);
                if ((derived - given) / given).abs() > 1e-3 {
                    return Err(AppError::InvalidGeometry(format!(
                        "disp_cc: contradicts bore/stroke (given {cc:.0} cc, derived {:.0} cc)",
                        derived * 1e6
                    )));
                }
            }
            geometry
        }
        (Some(cc), _, _) => Geometry::Displacement {
            displacement_m3: cc_to_m3(cc),
        },
        _ => {
            return Err(AppError::InvalidGeometry(
                "disp_cc: provide either --disp-cc or (--cyl + --bore-mm + --stroke-mm)"
                    .to_string(),
            ));
        }
    };

    let cylinders = match args.cyl {
        Some(c) => c,
        None => {
            assumptions.push("Assumed cylinders=4 (no cylinder count provided)".to_string());
            4
        }
    };

    let peak_bmep_kpa = args.peak_bmep_kpa.ok_or_else(|| {
        AppError::UnderspecifiedTarget(
            "peak_bmep_kpa: required unless --load-json is used".to_string(),
        )
    })?;

    let spec = EngineSpec {
        cylinders,
        cycle: args.cycle,
        geometry,
        idle_rpm: args.idle,
        redline_rpm: args.redline,
        peak_bmep_pa: Some(peak_bmep_kpa * 1000.0),
        fuel,
        bsfc_g_per_kwh: bsfc,
    };
    spec.validate()?;

    let cfg = RunConfig {
        rpm_min: args.rpm_min,
        rpm_max: args.rpm_max,
        rpm_step: args.rpm_step,
        profile,
    };
    cfg.validate()?;

    Ok((spec, cfg, assumptions))
}

fn handle_match(args: MatchArgs) -> Result<(), AppError> {
    let partial = PartialSpec {
        cylinders: args.cyl,
        cycle: args.cycle,
        bore_m: args.bore_mm.map(mm_to_m),
        stroke_m: args.stroke_mm.map(mm_to_m),
        displacement_m3: args.disp_cc.map(cc_to_m3),
        idle_rpm: args.idle,
        redline_rpm: args.redline,
        peak_bmep_pa: args.peak_bmep_kpa.map(|kpa| kpa * 1000.0),
        fuel: args.fuel,
        bsfc_g_per_kwh: args.bsfc,
    };

    let mut targets = Vec::new();
    if let Some(kw) = args.target_kw {
        targets.push(Target::Power {
            kw,
            rpm: args.target_kw_rpm,
        });
    }
    if let Some(nm) = args.target_nm {
        targets.push(Target::Torque {
            nm,
            rpm: args.target_nm_rpm,
        });
    }

    let result = match_spec(&partial, &targets, args.profile)?;
    println!("{}", crate::report::format_match(&result));

    if let Some(save) = &args.save_json {
        let cfg = RunConfig {
            rpm_min: result.engine.idle_rpm,
            rpm_max: result.engine.redline_rpm,
            rpm_step: 100.0,
            profile: args.profile.unwrap_or(ProfileKind::Balanced),
        };
        let analysis = analyze(&result.engine, &cfg)?;
        let mut run = RunFile::new(result.engine.clone(), cfg);
        run.assumptions = result.assumptions.clone();
        run.analysis = Some(analysis);
        save_run_json(save, &run)?;
    }

    Ok(())
}

fn handle_design(args: DesignArgs) -> Result<(), AppError> {
    let request = DesignRequest {
        target_power_kw: args.target_kw,
        target_power_rpm: args.target_kw_rpm,
        target_torque_nm: args.target_nm,
        redline_rpm: args.redline,
        idle_rpm: args.idle,
        profile: args.profile,
        cycle: args.cycle,
        fuel: args.fuel,
        bsfc_g_per_kwh: args.bsfc,
        top_n: args.top,
    };
    let space = SearchSpace {
        disp_min_cc: args.disp_min_cc,
        disp_max_cc: args.disp_max_cc,
        disp_step_cc: args.disp_step_cc,
        cylinders: args.cyl.clone(),
    };
    let constraints = Constraints {
        bmep_max_kpa: args.bmep_max_kpa,
        piston_speed_max_mps: args.piston_speed_max,
    };

    let outcome = search_designs(&request, &space, &constraints)?;
    println!("{}", crate::report::format_design(&request, &outcome));

    if let Some(csv) = &args.export_csv {
        write_candidates_csv(csv, &outcome.candidates)?;
    }

    Ok(())
}

fn handle_vehicle(args: VehicleArgs) -> Result<(), AppError> {
    let run = load_run_json(&args.load_json)?;
    let analysis: Analysis = match run.analysis {
        Some(a) => a,
        None => analyze(&run.engine, &run.run_config)?,
    };

    let vehicle = resolve_vehicle(&args, run.vehicle)?;
    let drivetrain = resolve_drivetrain_args(&args, run.drivetrain)?;

    let top = estimate_top_speed(&analysis.curve, &run.engine, &vehicle, &drivetrain)?;
    let redline_speeds = per_gear_redline_speeds_kph(&run.engine, &drivetrain)?;
    let shifts = recommend_upshifts(&analysis.curve, &run.engine, &drivetrain)?;

    println!(
        "{}",
        crate::report::format_vehicle(&top, &redline_speeds, &shifts)
    );
    Ok(())
}

/// Merge vehicle parameters: explicit flags over preset over run file.
fn resolve_vehicle(
    args: &VehicleArgs,
    from_run: Option<VehicleSpec>,
) -> Result<VehicleSpec, AppError> {
    let mut vehicle = from_run.unwrap_or_default();
    if let Some(name) = args.vehicle_preset.as_deref() {
        vehicle = crate::presets::vehicle_preset(name)?.to_spec();
    }
    if args.mass_kg.is_some() {
        vehicle.mass_kg = args.mass_kg;
    }
    if args.cd.is_some() {
        vehicle.cd = args.cd;
    }
    if args.frontal_area_m2.is_some() {
        vehicle.frontal_area_m2 = args.frontal_area_m2;
    }
    if args.crr.is_some() {
        vehicle.crr = args.crr;
    }
    if args.air_density.is_some() {
        vehicle.air_density_kg_m3 = args.air_density;
    }
    Ok(vehicle)
}

/// Merge drivetrain parameters: explicit flags over preset over run file.
fn resolve_drivetrain_args(
    args: &VehicleArgs,
    from_run: Option<DrivetrainSpec>,
) -> Result<DrivetrainSpec, AppError> {
    let mut drivetrain = from_run.unwrap_or_default();
    if let Some(name) = args.gearbox_preset.as_deref() {
        drivetrain = crate::presets::gearbox_preset(name)?.to_spec();
    }
    if args.gears.is_some() {
        drivetrain.gears = args.gears.clone();
    }
    if args.final_drive.is_some() {
        drivetrain.final_drive = args.final_drive;
    }
    if args.tire_radius_m.is_some() {
        drivetrain.tire_radius_m = args.tire_radius_m;
    }
    if args.drivetrain_eff.is_some() {
        drivetrain.drivetrain_efficiency = args.drivetrain_eff;
    }
    Ok(drivetrain)
}

fn handle_presets() -> Result<(), AppError> {
    println!("Load profiles:");
    for name in crate::profiles::list_profiles() {
        println!("  {name}");
    }

    println!("\nEngine presets:");
    for name in crate::presets::list_engine_presets() {
        let p = crate::presets::engine_preset(name)?;
        println!("  {:<16} {}", p.name, p.description);
    }

    println!("\nVehicle presets:");
    for name in crate::presets::list_vehicle_presets() {
        let p = crate::presets::vehicle_preset(name)?;
        println!("  {:<16} {}", p.name, p.description);
    }

    println!("\nGearbox presets:");
    for name in crate::presets::list_gearbox_presets() {
        let p = crate::presets::gearbox_preset(name)?;
        println!("  {:<16} {}", p.name, p.description);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze_args(argv: &[&str]) -> AnalyzeArgs {
        let mut full = vec!["eg", "analyze"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Analyze(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn analyze_spec_from_displacement_flags() {
        let args = analyze_args(&["--disp-cc", "1998", "--cyl", "4", "--peak-bmep-kpa", "1100"]);
        let (spec, cfg, assumptions) = assemble_analyze_spec(&args).unwrap();

        assert_eq!(spec.cylinders, 4);
        assert_eq!(spec.peak_bmep_pa, Some(1_100_000.0));
        assert_eq!(cfg.profile, ProfileKind::Balanced);
        // Profile, fuel and BSFC were all defaulted.
        assert_eq!(assumptions.len(), 3);
    }

    #[test]
    fn analyze_requires_peak_bmep_without_a_run_file() {
        let args = analyze_args(&["--disp-cc", "1998", "--cyl", "4"]);
        let err = assemble_analyze_spec(&args).unwrap_err();
        assert!(matches!(err, AppError::UnderspecifiedTarget(_)));
    }

    #[test]
    fn analyze_requires_some_geometry() {
        let args = analyze_args(&["--peak-bmep-kpa", "1100"]);
        let err = assemble_analyze_spec(&args).unwrap_err();
        assert!(matches!(err, AppError::InvalidGeometry(_)));
    }

    #[test]
    fn contradictory_cli_geometry_is_rejected() {
        let args = analyze_args(&[
            "--disp-cc",
            "3000",
            "--cyl",
            "4",
            "--bore-mm",
            "86",
            "--stroke-mm",
            "86",
            "--peak-bmep-kpa",
            "1100",
        ]);
        let err = assemble_analyze_spec(&args).unwrap_err();
        assert!(matches!(err, AppError::InvalidGeometry(_)));
    }

    #[test]
    fn engine_preset_fills_unset_flags_but_explicit_wins() {
        let args = analyze_args(&[
            "--disp-cc",
            "1998",
            "--cyl",
            "4",
            "--peak-bmep-kpa",
            "1500",
            "--engine-preset",
            "turbo_sport",
        ]);
        let (spec, cfg, _) = assemble_analyze_spec(&args).unwrap();
        assert_eq!(cfg.profile, ProfileKind::TopEnd);
        assert_eq!(spec.bsfc_g_per_kwh, Some(290.0));

        let args = analyze_args(&[
            "--disp-cc",
            "1998",
            "--cyl",
            "4",
            "--peak-bmep-kpa",
            "1500",
            "--engine-preset",
            "turbo_sport",
            "--profile",
            "balanced",
            "--bsfc",
            "310",
        ]);
        let (spec, cfg, _) = assemble_analyze_spec(&args).unwrap();
        assert_eq!(cfg.profile, ProfileKind::Balanced);
        assert_eq!(spec.bsfc_g_per_kwh, Some(310.0));
    }

    #[test]
    fn vehicle_merge_prefers_explicit_flags() {
        let full = vec![
            "eg",
            "vehicle",
            "--load-json",
            "run.json",
            "--vehicle-preset",
            "sedan",
            "--mass-kg",
            "1650",
        ];
        let args = match Cli::try_parse_from(full).unwrap().command {
            Command::Vehicle(args) => args,
            _ => unreachable!(),
        };
        let vehicle = resolve_vehicle(&args, None).unwrap();
        assert_eq!(vehicle.mass_kg, Some(1650.0));
        assert_eq!(vehicle.cd, Some(0.29));
    }
}
