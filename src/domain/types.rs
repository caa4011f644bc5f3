//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during curve generation and solving
//! - exported to JSON/CSV
//! - reloaded later to reproduce a report without re-deriving inputs

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Engine operating cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum Cycle {
    /// One power event every two crank revolutions.
    #[serde(rename = "4-stroke")]
    #[value(name = "4-stroke")]
    FourStroke,
    /// One power event per crank revolution.
    #[serde(rename = "2-stroke")]
    #[value(name = "2-stroke")]
    TwoStroke,
}

impl Cycle {
    /// Crank revolutions consumed per power stroke.
    pub fn revs_per_power(self) -> f64 {
        match self {
            Cycle::FourStroke => 2.0,
            Cycle::TwoStroke => 1.0,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Cycle::FourStroke => "4-stroke",
            Cycle::TwoStroke => "2-stroke",
        }
    }
}

/// Supported fuels.
///
/// The set is fixed; an unrecognized identifier is rejected with
/// `InvalidFuel`, never silently defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Fuel {
    Petrol,
    Diesel,
    E85,
}

impl Fuel {
    /// Parse a fuel identifier.
    pub fn parse(name: &str) -> Result<Fuel, AppError> {
        match name.trim().to_lowercase().as_str() {
            "petrol" => Ok(Fuel::Petrol),
            "diesel" => Ok(Fuel::Diesel),
            "e85" => Ok(Fuel::E85),
            other => Err(AppError::InvalidFuel(format!(
                "fuel: unsupported identifier '{other}' (supported: petrol, diesel, e85)"
            ))),
        }
    }

    /// Default BSFC in g/kWh.
    ///
    /// Engineering approximations for estimate mode, not measurements.
    pub fn default_bsfc_g_per_kwh(self) -> f64 {
        match self {
            Fuel::Petrol => 270.0,
            Fuel::Diesel => 230.0,
            Fuel::E85 => 320.0,
        }
    }

    /// Fuel density in kg/L.
    pub fn density_kg_per_l(self) -> f64 {
        match self {
            Fuel::Petrol => 0.745,
            Fuel::Diesel => 0.832,
            Fuel::E85 => 0.785,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Fuel::Petrol => "petrol",
            Fuel::Diesel => "diesel",
            Fuel::E85 => "e85",
        }
    }
}

/// Built-in load-profile shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    /// Earlier torque peak, falls off earlier.
    TorqueBiased,
    /// Middle-ish peak.
    Balanced,
    /// Later peak, better top end.
    TopEnd,
}

impl ProfileKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ProfileKind::TorqueBiased => "torque_biased",
            ProfileKind::Balanced => "balanced",
            ProfileKind::TopEnd => "top_end",
        }
    }
}

/// Authoritative geometry representation.
///
/// Exactly one representation is authoritative per `EngineSpec`; the other
/// is derived on demand, so the two can never diverge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Geometry {
    /// Total swept volume supplied directly (m³).
    Displacement { displacement_m3: f64 },
    /// Bore and stroke supplied (m); displacement derived.
    BoreStroke { bore_m: f64, stroke_m: f64 },
}

/// A fully resolvable engine specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSpec {
    pub cylinders: u32,
    pub cycle: Cycle,
    pub geometry: Geometry,
    pub idle_rpm: f64,
    pub redline_rpm: f64,
    /// Peak BMEP in Pa. `None` until resolved (e.g. by the Match solver).
    pub peak_bmep_pa: Option<f64>,
    pub fuel: Fuel,
    /// Caller-supplied BSFC override (g/kWh); falls back to the fuel default.
    pub bsfc_g_per_kwh: Option<f64>,
}

impl EngineSpec {
    /// Total displacement in m³, derived from bore/stroke when needed.
    pub fn displacement_m3(&self) -> Result<f64, AppError> {
        match self.geometry {
            Geometry::Displacement { displacement_m3 } => {
                if displacement_m3 <= 0.0 {
                    return Err(AppError::InvalidGeometry(format!(
                        "displacement_m3: must be > 0, got {displacement_m3}"
                    )));
                }
                Ok(displacement_m3)
            }
            Geometry::BoreStroke { bore_m, stroke_m } => {
                crate::engine::displacement_from_bore_stroke(bore_m, stroke_m, self.cylinders)
            }
        }
    }

    pub fn bore_m(&self) -> Option<f64> {
        match self.geometry {
            Geometry::Displacement { .. } => None,
            Geometry::BoreStroke { bore_m, .. } => Some(bore_m),
        }
    }

    pub fn stroke_m(&self) -> Option<f64> {
        match self.geometry {
            Geometry::Displacement { .. } => None,
            Geometry::BoreStroke { stroke_m, .. } => Some(stroke_m),
        }
    }

    /// Validate the non-geometry fields and the rpm band.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.cylinders == 0 {
            return Err(AppError::InvalidGeometry(
                "cylinders: must be > 0".to_string(),
            ));
        }
        if self.idle_rpm <= 0.0 {
            return Err(AppError::InvalidRange(format!(
                "idle_rpm: must be > 0, got {}",
                self.idle_rpm
            )));
        }
        if self.redline_rpm <= self.idle_rpm {
            return Err(AppError::InvalidRange(format!(
                "redline_rpm: must be > idle_rpm ({} <= {})",
                self.redline_rpm, self.idle_rpm
            )));
        }
        if let Some(bmep) = self.peak_bmep_pa {
            if bmep <= 0.0 {
                return Err(AppError::InvalidGeometry(format!(
                    "peak_bmep_pa: must be > 0, got {bmep}"
                )));
            }
        }
        if let Some(bsfc) = self.bsfc_g_per_kwh {
            if bsfc <= 0.0 {
                return Err(AppError::InvalidFuel(format!(
                    "bsfc_g_per_kwh: must be > 0, got {bsfc}"
                )));
            }
        }
        self.displacement_m3().map(|_| ())
    }

    /// BSFC to use: the caller's override or the fuel default.
    pub fn bsfc_or_default(&self) -> f64 {
        self.bsfc_g_per_kwh
            .unwrap_or_else(|| self.fuel.default_bsfc_g_per_kwh())
    }
}

/// A caller-supplied, possibly incomplete spec for the Match solver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialSpec {
    pub cylinders: Option<u32>,
    pub cycle: Option<Cycle>,
    pub bore_m: Option<f64>,
    pub stroke_m: Option<f64>,
    pub displacement_m3: Option<f64>,
    pub idle_rpm: Option<f64>,
    pub redline_rpm: Option<f64>,
    pub peak_bmep_pa: Option<f64>,
    pub fuel: Option<Fuel>,
    pub bsfc_g_per_kwh: Option<f64>,
}

/// Rpm sweep and profile selection for a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunConfig {
    pub rpm_min: f64,
    pub rpm_max: f64,
    pub rpm_step: f64,
    pub profile: ProfileKind,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            rpm_min: 1000.0,
            rpm_max: 7000.0,
            rpm_step: 100.0,
            profile: ProfileKind::Balanced,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.rpm_step <= 0.0 {
            return Err(AppError::InvalidRange(format!(
                "rpm_step: must be > 0, got {}",
                self.rpm_step
            )));
        }
        if self.rpm_min >= self.rpm_max {
            return Err(AppError::InvalidRange(format!(
                "rpm_max: must be > rpm_min ({} >= {})",
                self.rpm_min, self.rpm_max
            )));
        }
        Ok(())
    }
}

/// One sample of a generated curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CurvePoint {
    pub rpm: f64,
    pub bmep_kpa: f64,
    pub torque_nm: f64,
    pub power_kw: f64,
    /// Mean piston speed; present only when the stroke is known.
    pub piston_speed_mps: Option<f64>,
}

/// An immutable, rpm-ordered set of curve samples.
///
/// Created per request, never mutated, discarded after reporting/export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveSet {
    pub points: Vec<CurvePoint>,
}

impl CurveSet {
    /// Peak scalars over the produced discrete samples.
    ///
    /// Deliberately not an analytic peak; callers must not assume sub-step
    /// precision.
    pub fn summary(&self) -> CurveSummary {
        let mut s = CurveSummary {
            peak_torque_nm: 0.0,
            peak_torque_rpm: 0.0,
            peak_power_kw: 0.0,
            peak_power_rpm: 0.0,
        };
        for p in &self.points {
            if p.torque_nm > s.peak_torque_nm {
                s.peak_torque_nm = p.torque_nm;
                s.peak_torque_rpm = p.rpm;
            }
            if p.power_kw > s.peak_power_kw {
                s.peak_power_kw = p.power_kw;
                s.peak_power_rpm = p.rpm;
            }
        }
        s
    }

    /// Linear interpolation of power (kW) at an rpm, clamped to the grid ends.
    pub fn power_kw_at(&self, rpm: f64) -> f64 {
        interp(&self.points, rpm, |p| p.power_kw)
    }

    /// Linear interpolation of torque (N·m) at an rpm, clamped to the grid ends.
    pub fn torque_nm_at(&self, rpm: f64) -> f64 {
        interp(&self.points, rpm, |p| p.torque_nm)
    }
}

fn interp(points: &[CurvePoint], rpm: f64, y: impl Fn(&CurvePoint) -> f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    if rpm <= points[0].rpm {
        return y(&points[0]);
    }
    if rpm >= points[points.len() - 1].rpm {
        return y(&points[points.len() - 1]);
    }
    for pair in points.windows(2) {
        let (p0, p1) = (&pair[0], &pair[1]);
        if p0.rpm <= rpm && rpm <= p1.rpm {
            if p1.rpm == p0.rpm {
                return y(p0);
            }
            let t = (rpm - p0.rpm) / (p1.rpm - p0.rpm);
            return y(p0) + t * (y(p1) - y(p0));
        }
    }
    y(&points[points.len() - 1])
}

/// Discrete-sample peak scalars of a curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CurveSummary {
    pub peak_torque_nm: f64,
    pub peak_torque_rpm: f64,
    pub peak_power_kw: f64,
    pub peak_power_rpm: f64,
}

/// Fuel flow at a single power level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FuelFlow {
    pub mass_kg_per_h: f64,
    pub volume_l_per_h: f64,
}

/// One performance target for the Match solver.
///
/// A power target without an rpm is resolved against a profile-implied
/// peak-power rpm; a torque target without an rpm is treated as peak torque.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Power { kw: f64, rpm: Option<f64> },
    Torque { nm: f64, rpm: Option<f64> },
}

/// Output of the Match solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    /// Completed spec with `peak_bmep_pa` resolved.
    pub engine: EngineSpec,
    /// In `[0, 1]`; lower when targets disagree or values were defaulted.
    pub confidence: f64,
    /// Every defaulted or inferred value, human readable. Exhaustive.
    pub assumptions: Vec<String>,
    /// Independently required peak BMEP per target (kPa).
    pub required_bmep_kpa: Vec<f64>,
    /// Relative pairwise spread of the required BMEPs (0 for a single target).
    pub bmep_spread_rel: f64,
}

/// Displacement range (cc) and cylinder set swept by the Design search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSpace {
    pub disp_min_cc: f64,
    pub disp_max_cc: f64,
    pub disp_step_cc: f64,
    pub cylinders: Vec<u32>,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            disp_min_cc: 1000.0,
            disp_max_cc: 6000.0,
            disp_step_cc: 250.0,
            cylinders: vec![3, 4, 6, 8],
        }
    }
}

/// Optional mechanical ceilings applied during the Design search.
///
/// Read-only input; never mutated during the sweep.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub bmep_max_kpa: Option<f64>,
    pub piston_speed_max_mps: Option<f64>,
}

/// One fully evaluated engine configuration from the Design search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub engine: EngineSpec,
    pub summary: CurveSummary,
    pub piston_speed_mps_at_redline: f64,
    pub bmep_ok: bool,
    pub piston_speed_ok: bool,
    /// Absolute deviation of achieved peak power from the target (kW).
    pub score: f64,
}

/// Vehicle parameters for the road-load model.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VehicleSpec {
    pub mass_kg: Option<f64>,
    pub cd: Option<f64>,
    pub frontal_area_m2: Option<f64>,
    pub crr: Option<f64>,
    pub air_density_kg_m3: Option<f64>,
}

/// Gearbox and final-drive parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DrivetrainSpec {
    pub gears: Option<Vec<f64>>,
    pub final_drive: Option<f64>,
    pub tire_radius_m: Option<f64>,
    pub drivetrain_efficiency: Option<f64>,
}

/// Full Analyze output: curve, scalar block, and non-fatal warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub displacement_l: f64,
    pub peak_bmep_kpa: f64,
    pub summary: CurveSummary,
    pub bsfc_g_per_kwh: f64,
    /// Flow at WOT, evaluated at the discrete peak power.
    pub fuel_wot: FuelFlow,
    /// Flow at the fixed 20 kW cruise placeholder.
    pub fuel_cruise: FuelFlow,
    pub piston_speed_mps_at_redline: Option<f64>,
    pub warnings: Vec<String>,
    pub curve: CurveSet,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::m3_to_l;

    fn curve(points: &[(f64, f64)]) -> CurveSet {
        CurveSet {
            points: points
                .iter()
                .map(|&(rpm, power_kw)| CurvePoint {
                    rpm,
                    bmep_kpa: 0.0,
                    torque_nm: power_kw / 2.0,
                    power_kw,
                    piston_speed_mps: None,
                })
                .collect(),
        }
    }

    #[test]
    fn fuel_parse_rejects_unsupported_identifiers() {
        assert_eq!(Fuel::parse("Petrol").unwrap(), Fuel::Petrol);
        assert_eq!(Fuel::parse(" e85 ").unwrap(), Fuel::E85);
        let err = Fuel::parse("kerosene").unwrap_err();
        assert!(matches!(err, AppError::InvalidFuel(_)));
        assert!(format!("{err}").contains("kerosene"));
    }

    #[test]
    fn cycle_revs_per_power() {
        assert_eq!(Cycle::FourStroke.revs_per_power(), 2.0);
        assert_eq!(Cycle::TwoStroke.revs_per_power(), 1.0);
    }

    #[test]
    fn displacement_is_derivable_from_bore_stroke() {
        let spec = EngineSpec {
            cylinders: 4,
            cycle: Cycle::FourStroke,
            geometry: Geometry::BoreStroke {
                bore_m: 0.086,
                stroke_m: 0.086,
            },
            idle_rpm: 800.0,
            redline_rpm: 6500.0,
            peak_bmep_pa: None,
            fuel: Fuel::Petrol,
            bsfc_g_per_kwh: None,
        };
        let d = spec.displacement_m3().unwrap();
        // (pi/4) * 0.086^2 * 0.086 * 4 ~= 1.998 L
        assert!((m3_to_l(d) - 1.998).abs() < 0.01);
        assert_eq!(spec.stroke_m(), Some(0.086));
    }

    #[test]
    fn validate_flags_bad_rpm_band() {
        let mut spec = EngineSpec {
            cylinders: 4,
            cycle: Cycle::FourStroke,
            geometry: Geometry::Displacement {
                displacement_m3: 0.002,
            },
            idle_rpm: 800.0,
            redline_rpm: 6500.0,
            peak_bmep_pa: Some(1_000_000.0),
            fuel: Fuel::Petrol,
            bsfc_g_per_kwh: None,
        };
        spec.validate().unwrap();
        spec.redline_rpm = 500.0;
        assert!(matches!(
            spec.validate().unwrap_err(),
            AppError::InvalidRange(_)
        ));
    }

    #[test]
    fn bsfc_falls_back_to_fuel_default() {
        let mut spec = EngineSpec {
            cylinders: 4,
            cycle: Cycle::FourStroke,
            geometry: Geometry::Displacement {
                displacement_m3: 0.002,
            },
            idle_rpm: 800.0,
            redline_rpm: 6500.0,
            peak_bmep_pa: None,
            fuel: Fuel::Diesel,
            bsfc_g_per_kwh: None,
        };
        assert_eq!(spec.bsfc_or_default(), 230.0);
        spec.bsfc_g_per_kwh = Some(250.0);
        assert_eq!(spec.bsfc_or_default(), 250.0);
    }

    #[test]
    fn curve_summary_takes_discrete_maxima() {
        let c = curve(&[(1000.0, 10.0), (2000.0, 30.0), (3000.0, 20.0)]);
        let s = c.summary();
        assert_eq!(s.peak_power_kw, 30.0);
        assert_eq!(s.peak_power_rpm, 2000.0);
    }

    #[test]
    fn curve_interpolation_clamps_to_grid_ends() {
        let c = curve(&[(1000.0, 10.0), (2000.0, 30.0)]);
        assert_eq!(c.power_kw_at(500.0), 10.0);
        assert_eq!(c.power_kw_at(2500.0), 30.0);
        assert!((c.power_kw_at(1500.0) - 20.0).abs() < 1e-12);
    }
}
