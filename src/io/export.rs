//! Export curves and design candidates to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or
//! downstream scripts. Column sets are stable; optional columns (piston
//! speed, per-gear speeds) appear only when their inputs are present.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::{Candidate, CurveSet, DrivetrainSpec};
use crate::error::AppError;
use crate::units::m3_to_cc;
use crate::vehicle::speed_kph_from_rpm;

fn create(path: &Path) -> Result<File, AppError> {
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
    File::create(path)
        .map_err(|e| AppError::Io(format!("failed to create CSV '{}': {e}", path.display())))
}

fn write_row(file: &mut File, path: &Path, row: &str) -> Result<(), AppError> {
    writeln!(file, "{row}")
        .map_err(|e| AppError::Io(format!("failed to write CSV '{}': {e}", path.display())))
}

/// Write curve samples to CSV, with per-gear road speeds when a usable
/// drivetrain is supplied.
pub fn write_curves_csv(
    path: &Path,
    curve: &CurveSet,
    drivetrain: Option<&DrivetrainSpec>,
) -> Result<(), AppError> {
    let mut file = create(path)?;

    let with_piston_speed = curve.points.first().is_some_and(|p| p.piston_speed_mps.is_some());

    // Gear columns only when the drivetrain is complete.
    let gearing: Option<(&[f64], f64, f64)> = drivetrain.and_then(|dt| {
        match (dt.gears.as_deref(), dt.final_drive, dt.tire_radius_m) {
            (Some(gears), Some(fd), Some(r)) if !gears.is_empty() => Some((gears, fd, r)),
            _ => None,
        }
    });

    let mut header = String::from("rpm,bmep_kpa,torque_nm,power_kw");
    if with_piston_speed {
        header.push_str(",piston_speed_mps");
    }
    if let Some((gears, _, _)) = gearing {
        for gi in 1..=gears.len() {
            header.push_str(&format!(",speed_kph_g{gi}"));
        }
    }
    write_row(&mut file, path, &header)?;

    for p in &curve.points {
        let mut row = format!(
            "{:.0},{:.3},{:.3},{:.3}",
            p.rpm, p.bmep_kpa, p.torque_nm, p.power_kw
        );
        if with_piston_speed {
            row.push_str(&format!(",{:.3}", p.piston_speed_mps.unwrap_or(0.0)));
        }
        if let Some((gears, final_drive, tire_radius_m)) = gearing {
            for &g in gears {
                let kph = speed_kph_from_rpm(p.rpm, g, final_drive, tire_radius_m)?;
                row.push_str(&format!(",{kph:.2}"));
            }
        }
        write_row(&mut file, path, &row)?;
    }

    Ok(())
}

/// Write ranked design candidates to CSV.
pub fn write_candidates_csv(path: &Path, candidates: &[Candidate]) -> Result<(), AppError> {
    let mut file = create(path)?;

    write_row(
        &mut file,
        path,
        "rank,score,disp_cc,cyl,cycle,redline_rpm,peak_bmep_kpa,fuel,bsfc_g_per_kwh,\
         peak_power_kw,peak_power_rpm,peak_torque_nm,peak_torque_rpm,piston_speed_mps",
    )?;

    for (i, c) in candidates.iter().enumerate() {
        let disp_cc = c.engine.displacement_m3().map(m3_to_cc).unwrap_or(0.0);
        let row = format!(
            "{},{:.4},{:.0},{},{},{:.0},{:.1},{},{},{:.2},{:.0},{:.2},{:.0},{:.2}",
            i + 1,
            c.score,
            disp_cc,
            c.engine.cylinders,
            c.engine.cycle.display_name(),
            c.engine.redline_rpm,
            c.engine.peak_bmep_pa.unwrap_or(0.0) / 1000.0,
            c.engine.fuel.display_name(),
            c.engine
                .bsfc_g_per_kwh
                .map(|b| format!("{b:.0}"))
                .unwrap_or_default(),
            c.summary.peak_power_kw,
            c.summary.peak_power_rpm,
            c.summary.peak_torque_nm,
            c.summary.peak_torque_rpm,
            c.piston_speed_mps_at_redline,
        );
        write_row(&mut file, path, &row)?;
    }

    Ok(())
}
