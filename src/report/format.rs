//! Report formatting for the analyze/match/design/vehicle commands.

use crate::domain::{Analysis, EngineSpec, MatchResult, RunConfig};
use crate::solver::design::{DesignOutcome, DesignRequest};
use crate::units::{kpa_to_psi, kw_to_hp, m_to_mm, m3_to_l, nm_to_lbft};
use crate::vehicle::{ShiftPoint, TopSpeed};

/// Format the analyze summary block.
pub fn format_analysis(spec: &EngineSpec, cfg: &RunConfig, analysis: &Analysis) -> String {
    let mut out = String::new();

    out.push_str("=== eg - Engine Curve Analysis ===\n");
    out.push_str(&format!("Displacement: {:.3} L\n", analysis.displacement_l));
    out.push_str(&format!(
        "Layout: {} cylinders, {}",
        spec.cylinders,
        spec.cycle.display_name()
    ));
    if let (Some(bore), Some(stroke)) = (spec.bore_m(), spec.stroke_m()) {
        out.push_str(&format!(
            " | bore {:.1} mm x stroke {:.1} mm",
            m_to_mm(bore),
            m_to_mm(stroke)
        ));
    }
    out.push('\n');
    out.push_str(&format!("Profile: {}\n", cfg.profile.display_name()));
    out.push_str(&format!(
        "Rpm grid: [{:.0}, {:.0}] step {:.0}\n",
        cfg.rpm_min, cfg.rpm_max, cfg.rpm_step
    ));
    out.push_str(&format!(
        "Peak BMEP: {:.1} kPa ({:.1} psi)\n",
        analysis.peak_bmep_kpa,
        kpa_to_psi(analysis.peak_bmep_kpa)
    ));

    let s = &analysis.summary;
    out.push_str(&format!(
        "Peak torque: {:.1} Nm ({:.1} lbft) @ {:.0} rpm\n",
        s.peak_torque_nm,
        nm_to_lbft(s.peak_torque_nm),
        s.peak_torque_rpm
    ));
    out.push_str(&format!(
        "Peak power:  {:.1} kW ({:.1} hp) @ {:.0} rpm\n",
        s.peak_power_kw,
        kw_to_hp(s.peak_power_kw),
        s.peak_power_rpm
    ));

    out.push_str(&format!("Fuel: {}\n", spec.fuel.display_name()));
    out.push_str(&format!("BSFC: {:.0} g/kWh\n", analysis.bsfc_g_per_kwh));
    out.push_str(&format!(
        "Fuel @ peak power (WOT): {:.1} L/h ({:.1} kg/h)\n",
        analysis.fuel_wot.volume_l_per_h, analysis.fuel_wot.mass_kg_per_h
    ));
    out.push_str(&format!(
        "Fuel @ 20 kW cruise est: {:.1} L/h\n",
        analysis.fuel_cruise.volume_l_per_h
    ));

    if let Some(ps) = analysis.piston_speed_mps_at_redline {
        out.push_str(&format!("Piston speed @ redline: {ps:.2} m/s\n"));
    }

    if !analysis.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for w in &analysis.warnings {
            out.push_str(&format!("  [WARN] {w}\n"));
        }
    }

    out
}

/// Format a match result: the resolved spec plus confidence and assumptions.
pub fn format_match(result: &MatchResult) -> String {
    let mut out = String::new();

    out.push_str("=== eg - Match Result ===\n");
    let engine = &result.engine;
    if let Ok(disp) = engine.displacement_m3() {
        out.push_str(&format!("Displacement: {:.3} L\n", m3_to_l(disp)));
    }
    out.push_str(&format!(
        "Layout: {} cylinders, {}",
        engine.cylinders,
        engine.cycle.display_name()
    ));
    if let (Some(bore), Some(stroke)) = (engine.bore_m(), engine.stroke_m()) {
        out.push_str(&format!(
            " | bore {:.1} mm x stroke {:.1} mm",
            m_to_mm(bore),
            m_to_mm(stroke)
        ));
    }
    out.push('\n');

    if let Some(bmep) = engine.peak_bmep_pa {
        out.push_str(&format!(
            "Resolved peak BMEP: {:.1} kPa ({:.1} psi)\n",
            bmep / 1000.0,
            kpa_to_psi(bmep / 1000.0)
        ));
    }
    if result.required_bmep_kpa.len() > 1 {
        let list = result
            .required_bmep_kpa
            .iter()
            .map(|b| format!("{b:.0}"))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "Per-target required BMEP (kPa): {list} | spread {:.1}%\n",
            result.bmep_spread_rel * 100.0
        ));
    }
    out.push_str(&format!("Confidence: {:.2}\n", result.confidence));

    if result.assumptions.is_empty() {
        out.push_str("Assumptions: none\n");
    } else {
        out.push_str("Assumptions:\n");
        for a in &result.assumptions {
            out.push_str(&format!("  - {a}\n"));
        }
    }

    out
}

/// Format the ranked design table.
pub fn format_design(request: &DesignRequest, outcome: &DesignOutcome) -> String {
    let mut out = String::new();

    out.push_str("=== eg - Design Search ===\n");
    out.push_str(&format!(
        "Target: {:.1} kW | redline {:.0} rpm | profile {}\n",
        request.target_power_kw,
        request.redline_rpm,
        request.profile.display_name()
    ));
    out.push_str(&format!(
        "Evaluated {} combinations, rejected {} on constraints\n",
        outcome.evaluated, outcome.rejected
    ));
    for a in &outcome.assumptions {
        out.push_str(&format!("  - {a}\n"));
    }

    if let Some(warning) = &outcome.warning {
        out.push_str(&format!("\n[WARN] {warning}\n"));
        return out;
    }

    out.push_str(&format!(
        "\n{:<4} {:>7} {:>4} {:>10} {:>16} {:>10} {:>8}\n",
        "rank", "disp_l", "cyl", "bmep_kpa", "peak_power", "piston_ms", "dev_kw"
    ));
    for (i, c) in outcome.candidates.iter().enumerate() {
        let disp_l = c.engine.displacement_m3().map(m3_to_l).unwrap_or(0.0);
        out.push_str(&format!(
            "{:<4} {:>7.2} {:>4} {:>10.0} {:>9.1}kW@{:<5.0} {:>10.1} {:>8.2}\n",
            i + 1,
            disp_l,
            c.engine.cylinders,
            c.engine.peak_bmep_pa.unwrap_or(0.0) / 1000.0,
            c.summary.peak_power_kw,
            c.summary.peak_power_rpm,
            c.piston_speed_mps_at_redline,
            c.score
        ));
    }

    out
}

/// Format the vehicle block: top speed, per-gear speeds, shift points.
pub fn format_vehicle(
    top: &TopSpeed,
    redline_speeds_kph: &[f64],
    shifts: &[ShiftPoint],
) -> String {
    let mut out = String::new();

    out.push_str("=== eg - Vehicle Estimate ===\n");
    if top.gear == 0 {
        out.push_str("Top speed: not reachable with this curve (power below road load)\n");
    } else {
        out.push_str(&format!(
            "Top speed: {:.0} km/h in gear {} @ {:.0} rpm\n",
            top.speed_kph, top.gear, top.rpm
        ));
    }
    out.push_str(&format!(
        "Model: drivetrain eff {:.2} | rho {:.3} kg/m3 | crr {:.3}\n",
        top.drivetrain_efficiency, top.air_density_kg_m3, top.crr
    ));

    out.push_str("\nRedline speed per gear:\n");
    for (i, kph) in redline_speeds_kph.iter().enumerate() {
        out.push_str(&format!("  gear {}: {kph:.0} km/h\n", i + 1));
    }

    if !shifts.is_empty() {
        out.push_str("\nRecommended upshifts:\n");
        for s in shifts {
            out.push_str(&format!(
                "  {} -> {}: shift @ {:.0} rpm (drops to {:.0} rpm, {:.0} km/h)\n",
                s.from_gear, s.to_gear, s.upshift_rpm, s.post_shift_rpm, s.speed_kph_at_shift
            ));
        }
    }

    out
}
