//! Command-line parsing for the engine-performance estimator.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the physics/solver code. Units at the CLI edge
//! are the familiar garage units (cc, mm, kPa, kW, Nm); conversion to SI
//! happens in `app`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{Cycle, Fuel, ProfileKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "eg", version, about = "Engine performance estimator (BMEP-based curves)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build torque/power curves for a fully specified engine.
    Analyze(AnalyzeArgs),
    /// Fill the blanks in a partial spec from performance targets.
    Match(MatchArgs),
    /// Sweep a displacement x cylinder grid for feasible designs.
    Design(DesignArgs),
    /// Estimate top speed, per-gear speeds and shift points for a saved run.
    Vehicle(VehicleArgs),
    /// List the built-in load profiles and preset tables.
    Presets,
}

/// Options for `eg analyze`.
#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Total displacement in cc (alternative to --cyl + --bore-mm + --stroke-mm).
    #[arg(long)]
    pub disp_cc: Option<f64>,

    /// Cylinder count.
    #[arg(long)]
    pub cyl: Option<u32>,

    /// Bore in mm.
    #[arg(long)]
    pub bore_mm: Option<f64>,

    /// Stroke in mm.
    #[arg(long)]
    pub stroke_mm: Option<f64>,

    /// Engine cycle.
    #[arg(long, value_enum, default_value_t = Cycle::FourStroke)]
    pub cycle: Cycle,

    /// Idle rpm.
    #[arg(long, default_value_t = 800.0)]
    pub idle: f64,

    /// Redline rpm.
    #[arg(long, default_value_t = 6500.0)]
    pub redline: f64,

    /// Peak BMEP in kPa (required unless --load-json is used).
    #[arg(long)]
    pub peak_bmep_kpa: Option<f64>,

    /// Load profile (defaults to balanced, or the engine preset's profile).
    #[arg(long, value_enum)]
    pub profile: Option<ProfileKind>,

    /// Fuel (defaults to petrol, or the engine preset's fuel).
    #[arg(long, value_enum)]
    pub fuel: Option<Fuel>,

    /// BSFC override in g/kWh.
    #[arg(long)]
    pub bsfc: Option<f64>,

    /// Apply an engine assumption preset (see `eg presets`).
    #[arg(long)]
    pub engine_preset: Option<String>,

    /// Rpm sweep start.
    #[arg(long, default_value_t = 1000.0)]
    pub rpm_min: f64,

    /// Rpm sweep end.
    #[arg(long, default_value_t = 7000.0)]
    pub rpm_max: f64,

    /// Rpm sweep step.
    #[arg(long, default_value_t = 100.0)]
    pub rpm_step: f64,

    /// Export the curve samples to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_csv: Option<PathBuf>,

    /// Gearbox preset used for per-gear speed columns in the CSV export.
    #[arg(long)]
    pub gearbox_preset: Option<String>,

    /// Save the full run (inputs + curve) to JSON.
    #[arg(long, value_name = "JSON")]
    pub save_json: Option<PathBuf>,

    /// Load a previously saved run instead of specifying an engine.
    #[arg(long, value_name = "JSON")]
    pub load_json: Option<PathBuf>,

    /// Recompute the curve even when the loaded JSON already contains one.
    #[arg(long)]
    pub recompute: bool,
}

/// Options for `eg match`.
#[derive(Debug, Parser, Clone)]
pub struct MatchArgs {
    /// Total displacement in cc.
    #[arg(long)]
    pub disp_cc: Option<f64>,

    /// Cylinder count (inferred from displacement when omitted).
    #[arg(long)]
    pub cyl: Option<u32>,

    /// Bore in mm.
    #[arg(long)]
    pub bore_mm: Option<f64>,

    /// Stroke in mm.
    #[arg(long)]
    pub stroke_mm: Option<f64>,

    /// Engine cycle (assumed 4-stroke when omitted).
    #[arg(long, value_enum)]
    pub cycle: Option<Cycle>,

    /// Idle rpm (assumed 800 when omitted).
    #[arg(long)]
    pub idle: Option<f64>,

    /// Redline rpm (assumed 7000 when omitted).
    #[arg(long)]
    pub redline: Option<f64>,

    /// Fixed peak BMEP in kPa (skips inference from targets).
    #[arg(long)]
    pub peak_bmep_kpa: Option<f64>,

    /// Load profile (assumed balanced when omitted).
    #[arg(long, value_enum)]
    pub profile: Option<ProfileKind>,

    /// Fuel (assumed petrol when omitted).
    #[arg(long, value_enum)]
    pub fuel: Option<Fuel>,

    /// BSFC override in g/kWh.
    #[arg(long)]
    pub bsfc: Option<f64>,

    /// Target power in kW.
    #[arg(long)]
    pub target_kw: Option<f64>,

    /// Rpm at which the power target applies.
    #[arg(long)]
    pub target_kw_rpm: Option<f64>,

    /// Target torque in Nm.
    #[arg(long)]
    pub target_nm: Option<f64>,

    /// Rpm at which the torque target applies (peak torque when omitted).
    #[arg(long)]
    pub target_nm_rpm: Option<f64>,

    /// Save the completed run (resolved spec + curve) to JSON.
    #[arg(long, value_name = "JSON")]
    pub save_json: Option<PathBuf>,
}

/// Options for `eg design`.
#[derive(Debug, Parser, Clone)]
pub struct DesignArgs {
    /// Target peak power in kW.
    #[arg(long)]
    pub target_kw: f64,

    /// Rpm at which the power target applies (profile-implied when omitted).
    #[arg(long)]
    pub target_kw_rpm: Option<f64>,

    /// Optional peak torque target in Nm.
    #[arg(long)]
    pub target_nm: Option<f64>,

    /// Redline rpm for every candidate.
    #[arg(long, default_value_t = 7000.0)]
    pub redline: f64,

    /// Idle rpm for every candidate.
    #[arg(long, default_value_t = 800.0)]
    pub idle: f64,

    /// Load profile for every candidate.
    #[arg(long, value_enum, default_value_t = ProfileKind::Balanced)]
    pub profile: ProfileKind,

    /// Engine cycle for every candidate.
    #[arg(long, value_enum, default_value_t = Cycle::FourStroke)]
    pub cycle: Cycle,

    /// Fuel for every candidate.
    #[arg(long, value_enum, default_value_t = Fuel::Petrol)]
    pub fuel: Fuel,

    /// BSFC override in g/kWh.
    #[arg(long)]
    pub bsfc: Option<f64>,

    /// Reject candidates whose implied peak BMEP exceeds this (kPa).
    #[arg(long)]
    pub bmep_max_kpa: Option<f64>,

    /// Reject candidates whose redline piston speed exceeds this (m/s).
    #[arg(long)]
    pub piston_speed_max: Option<f64>,

    /// Displacement sweep start (cc).
    #[arg(long, default_value_t = 1000.0)]
    pub disp_min_cc: f64,

    /// Displacement sweep end (cc).
    #[arg(long, default_value_t = 6000.0)]
    pub disp_max_cc: f64,

    /// Displacement sweep step (cc).
    #[arg(long, default_value_t = 250.0)]
    pub disp_step_cc: f64,

    /// Candidate cylinder counts.
    #[arg(long, value_delimiter = ',', default_values_t = [3u32, 4, 6, 8])]
    pub cyl: Vec<u32>,

    /// Show the top-N candidates.
    #[arg(long, default_value_t = 5)]
    pub top: usize,

    /// Export the ranked candidates to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_csv: Option<PathBuf>,
}

/// Options for `eg vehicle`.
#[derive(Debug, Parser, Clone)]
pub struct VehicleArgs {
    /// Run JSON produced by `eg analyze --save-json` or `eg match --save-json`.
    #[arg(long, value_name = "JSON")]
    pub load_json: PathBuf,

    /// Apply a vehicle preset (see `eg presets`).
    #[arg(long)]
    pub vehicle_preset: Option<String>,

    /// Vehicle mass in kg.
    #[arg(long)]
    pub mass_kg: Option<f64>,

    /// Drag coefficient.
    #[arg(long)]
    pub cd: Option<f64>,

    /// Frontal area in m².
    #[arg(long)]
    pub frontal_area_m2: Option<f64>,

    /// Rolling resistance coefficient.
    #[arg(long)]
    pub crr: Option<f64>,

    /// Air density in kg/m³.
    #[arg(long)]
    pub air_density: Option<f64>,

    /// Apply a gearbox preset (see `eg presets`).
    #[arg(long)]
    pub gearbox_preset: Option<String>,

    /// Gear ratios, first to last.
    #[arg(long, value_delimiter = ',')]
    pub gears: Option<Vec<f64>>,

    /// Final drive ratio.
    #[arg(long)]
    pub final_drive: Option<f64>,

    /// Tire radius in m.
    #[arg(long)]
    pub tire_radius_m: Option<f64>,

    /// Drivetrain efficiency in (0, 1].
    #[arg(long)]
    pub drivetrain_eff: Option<f64>,
}
