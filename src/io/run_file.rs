//! Read/write run JSON files.
//!
//! The schema is defined by [`RunFile`]; `serde_json` does the heavy
//! lifting. Parent directories are created on save so paths like
//! `runs/out/foo.json` just work.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Analysis, DrivetrainSpec, EngineSpec, RunConfig, VehicleSpec};
use crate::error::AppError;

/// A persisted run: inputs, assumptions and computed outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFile {
    pub version: String,
    pub created: NaiveDate,
    pub engine: EngineSpec,
    pub run_config: RunConfig,
    /// Assumption strings carried over from match/analyze.
    pub assumptions: Vec<String>,
    pub vehicle: Option<VehicleSpec>,
    pub drivetrain: Option<DrivetrainSpec>,
    pub analysis: Option<Analysis>,
}

impl RunFile {
    /// Start a run file for the current tool version, dated today.
    pub fn new(engine: EngineSpec, run_config: RunConfig) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            created: chrono::Local::now().date_naive(),
            engine,
            run_config,
            assumptions: Vec::new(),
            vehicle: None,
            drivetrain: None,
            analysis: None,
        }
    }
}

/// Write a run JSON file, creating parent directories as needed.
pub fn save_run_json(path: &Path, run: &RunFile) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Io(format!(
                    "failed to create directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
    }

    let file = File::create(path)
        .map_err(|e| AppError::Io(format!("failed to create run JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, run)
        .map_err(|e| AppError::Io(format!("failed to write run JSON '{}': {e}", path.display())))?;
    Ok(())
}

/// Read a run JSON file.
pub fn load_run_json(path: &Path) -> Result<RunFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::Io(format!("failed to open run JSON '{}': {e}", path.display())))?;
    let run: RunFile = serde_json::from_reader(file)
        .map_err(|e| AppError::Io(format!("invalid run JSON '{}': {e}", path.display())))?;
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cycle, Fuel, Geometry, ProfileKind};
    use crate::engine::analyze;
    use crate::units::cc_to_m3;

    fn spec() -> EngineSpec {
        EngineSpec {
            cylinders: 4,
            cycle: Cycle::FourStroke,
            geometry: Geometry::Displacement {
                displacement_m3: cc_to_m3(1998.0),
            },
            idle_rpm: 1000.0,
            redline_rpm: 7000.0,
            peak_bmep_pa: Some(1_100_000.0),
            fuel: Fuel::Petrol,
            bsfc_g_per_kwh: None,
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("eg-curves-test-{}-{name}", std::process::id()))
    }

    #[test]
    fn run_file_round_trips_through_json() {
        let cfg = RunConfig {
            rpm_min: 1000.0,
            rpm_max: 7000.0,
            rpm_step: 100.0,
            profile: ProfileKind::Balanced,
        };
        let mut run = RunFile::new(spec(), cfg);
        run.assumptions.push("Assumed fuel 'petrol'".to_string());
        run.analysis = Some(analyze(&run.engine, &run.run_config).unwrap());

        let path = temp_path("roundtrip.json");
        save_run_json(&path, &run).unwrap();
        let loaded = load_run_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.engine, run.engine);
        assert_eq!(loaded.assumptions, run.assumptions);
        let a = loaded.analysis.unwrap();
        let b = run.analysis.unwrap();
        assert_eq!(a.curve.points.len(), b.curve.points.len());
        assert_eq!(a.summary.peak_power_kw, b.summary.peak_power_kw);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = temp_path("nested-dir");
        let path = dir.join("deeper/run.json");
        let run = RunFile::new(spec(), RunConfig::default());
        save_run_json(&path, &run).unwrap();
        assert!(path.exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn load_errors_name_the_file() {
        let path = temp_path("does-not-exist.json");
        let err = load_run_json(&path).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
        assert!(format!("{err}").contains("does-not-exist"));
    }
}
