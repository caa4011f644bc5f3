//! Normalized load-profile model.
//!
//! A load profile describes how effective output intensity (BMEP factor)
//! varies with engine-speed fraction. Profiles are piecewise-linear over
//! ordered control points `(rpm-fraction, factor)` with the fraction domain
//! clamped to `[0, 1]`, so lookups never extrapolate.
//!
//! The three built-in templates are process-wide immutable tables; custom
//! profiles go through [`LoadProfile::new`] and are passed in explicitly,
//! never registered in ambient state.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::domain::ProfileKind;
use crate::error::AppError;
use crate::units::clamp;

/// A named piecewise-linear load profile.
///
/// Invariants (enforced by [`LoadProfile::new`]):
/// - at least two control points
/// - fractions monotonically non-decreasing, first = 0, last = 1
/// - factors in `[0, 1]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadProfile {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

impl LoadProfile {
    /// Validate and build a profile from control points.
    pub fn new(name: impl Into<String>, points: Vec<(f64, f64)>) -> Result<Self, AppError> {
        let name = name.into();
        if points.len() < 2 {
            return Err(AppError::InvalidProfile(format!(
                "points: profile '{name}' needs at least 2 control points, got {}",
                points.len()
            )));
        }
        let first = points[0].0;
        let last = points[points.len() - 1].0;
        if first != 0.0 || last != 1.0 {
            return Err(AppError::InvalidProfile(format!(
                "points: profile '{name}' must span fractions [0, 1], got [{first}, {last}]"
            )));
        }
        for pair in points.windows(2) {
            if pair[1].0 < pair[0].0 {
                return Err(AppError::InvalidProfile(format!(
                    "points: profile '{name}' fractions must be non-decreasing ({} after {})",
                    pair[1].0, pair[0].0
                )));
            }
        }
        for &(x, y) in &points {
            if !(0.0..=1.0).contains(&y) || !y.is_finite() || !x.is_finite() {
                return Err(AppError::InvalidProfile(format!(
                    "points: profile '{name}' factor at fraction {x} out of [0, 1]: {y}"
                )));
            }
        }
        Ok(Self { name, points })
    }

    /// Interpolated factor at an rpm fraction.
    ///
    /// The fraction is clamped to `[0, 1]` first; at the domain ends this
    /// returns the boundary factor (flat clamp, not extrapolation).
    pub fn factor(&self, fraction: f64) -> f64 {
        let x = clamp(fraction, 0.0, 1.0);
        let pts = &self.points;

        if x <= pts[0].0 {
            return pts[0].1;
        }
        if x >= pts[pts.len() - 1].0 {
            return pts[pts.len() - 1].1;
        }

        for pair in pts.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            if x0 <= x && x <= x1 {
                if x1 == x0 {
                    return y0;
                }
                let t = (x - x0) / (x1 - x0);
                return y0 + t * (y1 - y0);
            }
        }

        pts[pts.len() - 1].1
    }
}

/// Rpm position as a fraction of the idle→redline band, clamped to `[0, 1]`.
pub fn rpm_fraction(rpm: f64, idle_rpm: f64, redline_rpm: f64) -> Result<f64, AppError> {
    if redline_rpm <= idle_rpm {
        return Err(AppError::InvalidRange(format!(
            "redline_rpm: must be > idle_rpm ({redline_rpm} <= {idle_rpm})"
        )));
    }
    Ok(clamp((rpm - idle_rpm) / (redline_rpm - idle_rpm), 0.0, 1.0))
}

static TEMPLATES: LazyLock<[LoadProfile; 3]> = LazyLock::new(|| {
    [
        // Earlier torque peak, falls off earlier.
        LoadProfile {
            name: "torque_biased".to_string(),
            points: vec![
                (0.00, 0.35),
                (0.15, 0.65),
                (0.35, 0.95),
                (0.45, 1.00),
                (0.60, 0.92),
                (0.75, 0.78),
                (0.90, 0.62),
                (1.00, 0.50),
            ],
        },
        // Middle-ish peak.
        LoadProfile {
            name: "balanced".to_string(),
            points: vec![
                (0.00, 0.30),
                (0.15, 0.62),
                (0.35, 0.90),
                (0.55, 1.00),
                (0.70, 0.95),
                (0.85, 0.82),
                (1.00, 0.70),
            ],
        },
        // Later peak, better top end.
        LoadProfile {
            name: "top_end".to_string(),
            points: vec![
                (0.00, 0.20),
                (0.20, 0.55),
                (0.40, 0.80),
                (0.60, 0.95),
                (0.72, 1.00),
                (0.85, 0.98),
                (1.00, 0.92),
            ],
        },
    ]
});

/// Built-in template for a profile kind.
pub fn template(kind: ProfileKind) -> &'static LoadProfile {
    match kind {
        ProfileKind::TorqueBiased => &TEMPLATES[0],
        ProfileKind::Balanced => &TEMPLATES[1],
        ProfileKind::TopEnd => &TEMPLATES[2],
    }
}

/// Names of the built-in profiles, sorted.
pub fn list_profiles() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = TEMPLATES.iter().map(|p| p.name.as_str()).collect();
    names.sort_unstable();
    names
}
