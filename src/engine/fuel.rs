//! BSFC-based fuel-flow estimates.
//!
//! ```text
//! mass (kg/h)  = BSFC (g/kWh) · power (kW) / 1000
//! volume (L/h) = mass / density (kg/L)
//! ```
//!
//! Two fixed report points: WOT at peak power, and a cruise placeholder at
//! a constant 20 kW. The cruise point is intentionally not speed- or
//! load-dependent; it is a known simplification.

use crate::domain::{EngineSpec, Fuel, FuelFlow};
use crate::error::AppError;

/// Power level of the fixed cruise report point.
pub const CRUISE_POWER_KW: f64 = 20.0;

/// Fuel flow at a power level, with an explicit density.
pub fn fuel_flow_with_density(
    power_kw: f64,
    bsfc_g_per_kwh: f64,
    density_kg_per_l: f64,
) -> Result<FuelFlow, AppError> {
    if power_kw < 0.0 {
        return Err(AppError::InvalidRange(format!(
            "power_kw: must be >= 0, got {power_kw}"
        )));
    }
    if bsfc_g_per_kwh <= 0.0 {
        return Err(AppError::InvalidFuel(format!(
            "bsfc_g_per_kwh: must be > 0, got {bsfc_g_per_kwh}"
        )));
    }
    if density_kg_per_l <= 0.0 {
        return Err(AppError::InvalidFuel(format!(
            "density_kg_per_l: must be > 0, got {density_kg_per_l}"
        )));
    }

    let mass_kg_per_h = bsfc_g_per_kwh * power_kw / 1000.0;
    Ok(FuelFlow {
        mass_kg_per_h,
        volume_l_per_h: mass_kg_per_h / density_kg_per_l,
    })
}

/// Fuel flow at a power level using a fuel's built-in density.
pub fn fuel_flow(power_kw: f64, fuel: Fuel, bsfc_g_per_kwh: f64) -> Result<FuelFlow, AppError> {
    fuel_flow_with_density(power_kw, bsfc_g_per_kwh, fuel.density_kg_per_l())
}

/// Resolve a spec's BSFC and compute the WOT and cruise report points.
///
/// Returns `(bsfc_used, wot_flow, cruise_flow)`.
pub fn fuel_report(spec: &EngineSpec, peak_power_kw: f64) -> Result<(f64, FuelFlow, FuelFlow), AppError> {
    let bsfc = spec.bsfc_or_default();
    let wot = fuel_flow(peak_power_kw, spec.fuel, bsfc)?;
    let cruise = fuel_flow(CRUISE_POWER_KW, spec.fuel, bsfc)?;
    Ok((bsfc, wot, cruise))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn petrol_mass_flow_is_bit_exact_at_reference_point() {
        // 270 g/kWh at 160 kW -> 43.2 kg/h, exact in f64.
        let flow = fuel_flow(160.0, Fuel::Petrol, 270.0).unwrap();
        assert_eq!(flow.mass_kg_per_h, 43.2);
        assert!((flow.volume_l_per_h - 43.2 / 0.745).abs() < 1e-12);
    }

    #[test]
    fn diesel_uses_its_own_density() {
        let flow = fuel_flow(100.0, Fuel::Diesel, 230.0).unwrap();
        assert_eq!(flow.mass_kg_per_h, 23.0);
        assert!((flow.volume_l_per_h - 23.0 / 0.832).abs() < 1e-12);
    }

    #[test]
    fn rejects_non_positive_bsfc_and_density() {
        assert!(matches!(
            fuel_flow(100.0, Fuel::Petrol, 0.0).unwrap_err(),
            AppError::InvalidFuel(_)
        ));
        assert!(matches!(
            fuel_flow_with_density(100.0, 270.0, -0.5).unwrap_err(),
            AppError::InvalidFuel(_)
        ));
    }

    #[test]
    fn rejects_negative_power() {
        assert!(matches!(
            fuel_flow(-1.0, Fuel::Petrol, 270.0).unwrap_err(),
            AppError::InvalidRange(_)
        ));
    }
}
