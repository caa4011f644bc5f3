//! Unit conversions and angular-speed primitives.
//!
//! Internal calculations are SI throughout:
//!
//! - power: W
//! - torque: N·m
//! - pressure: Pa
//! - volume: m³
//!
//! The CLI and report layers convert at the edges (mm, cc, kPa, hp, lb·ft).

use std::f64::consts::PI;

/// Mechanical horsepower in watts.
pub const HP_TO_W: f64 = 745.699_871_582_270_2;
/// One pound-foot in newton-metres.
pub const LBFT_TO_NM: f64 = 1.355_817_948_331_400_4;
/// One psi in pascals.
pub const PSI_TO_PA: f64 = 6_894.757_293_168;

/// Crank angular speed in rad/s for a given rpm.
pub fn rad_s_from_rpm(rpm: f64) -> f64 {
    (2.0 * PI * rpm) / 60.0
}

pub fn kw_to_hp(kw: f64) -> f64 {
    (kw * 1000.0) / HP_TO_W
}

pub fn hp_to_kw(hp: f64) -> f64 {
    (hp * HP_TO_W) / 1000.0
}

pub fn nm_to_lbft(nm: f64) -> f64 {
    nm / LBFT_TO_NM
}

pub fn lbft_to_nm(lbft: f64) -> f64 {
    lbft * LBFT_TO_NM
}

pub fn kpa_to_psi(kpa: f64) -> f64 {
    (kpa * 1000.0) / PSI_TO_PA
}

pub fn psi_to_kpa(psi: f64) -> f64 {
    (psi * PSI_TO_PA) / 1000.0
}

pub fn cc_to_m3(cc: f64) -> f64 {
    cc * 1e-6
}

pub fn m3_to_cc(m3: f64) -> f64 {
    m3 * 1e6
}

pub fn m3_to_l(m3: f64) -> f64 {
    m3 * 1e3
}

pub fn l_to_m3(l: f64) -> f64 {
    l * 1e-3
}

pub fn mm_to_m(mm: f64) -> f64 {
    mm / 1000.0
}

pub fn m_to_mm(m: f64) -> f64 {
    m * 1000.0
}

/// Clamp `x` into `[lo, hi]`.
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    if x < lo {
        lo
    } else if x > hi {
        hi
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angular_speed_at_familiar_points() {
        assert!((rad_s_from_rpm(0.0)).abs() < 1e-12);
        // 60 rpm is one revolution per second.
        assert!((rad_s_from_rpm(60.0) - 2.0 * PI).abs() < 1e-12);
    }

    #[test]
    fn power_conversions_round_trip() {
        let kw = 160.0;
        assert!((hp_to_kw(kw_to_hp(kw)) - kw).abs() < 1e-9);
        // 1 hp is just under 0.746 kW.
        assert!((hp_to_kw(1.0) - 0.7457).abs() < 1e-4);
    }

    #[test]
    fn volume_conversions() {
        assert!((cc_to_m3(1998.0) - 0.001998).abs() < 1e-12);
        assert!((m3_to_l(0.001998) - 1.998).abs() < 1e-12);
        assert!((m3_to_cc(cc_to_m3(2500.0)) - 2500.0).abs() < 1e-9);
    }

    #[test]
    fn pressure_conversions_round_trip() {
        assert!((psi_to_kpa(kpa_to_psi(1200.0)) - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp(-0.5, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
        assert_eq!(clamp(1.5, 0.0, 1.0), 1.0);
    }
}
