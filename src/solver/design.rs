//! Design mode: deterministic generate-filter-rank search.
//!
//! Why grid enumeration?
//! - It is deterministic given the same inputs/flags.
//! - The space is small (displacement range × cylinder set), so exhaustive
//!   evaluation beats any metaheuristic in both cost and explainability.
//!
//! Candidates are independent, so evaluation runs on rayon; the final
//! ranking is a deterministic sort, never completion order.

use rayon::prelude::*;

use crate::domain::{
    Candidate, Constraints, Cycle, Fuel, PartialSpec, ProfileKind, RunConfig, SearchSpace, Target,
};
use crate::engine::curve::{build_curve, mean_piston_speed_mps};
use crate::error::AppError;
use crate::solver::matching::match_spec;
use crate::units::cc_to_m3;

use std::f64::consts::PI;

/// Default candidate cap when the caller does not supply one.
pub const DEFAULT_TOP_N: usize = 5;

/// Targets and fixed parameters of a design search.
#[derive(Debug, Clone)]
pub struct DesignRequest {
    pub target_power_kw: f64,
    pub target_power_rpm: Option<f64>,
    pub target_torque_nm: Option<f64>,
    pub redline_rpm: f64,
    pub idle_rpm: f64,
    pub profile: ProfileKind,
    pub cycle: Cycle,
    pub fuel: Fuel,
    pub bsfc_g_per_kwh: Option<f64>,
    /// Ranked list cap; clamped to at least 1.
    pub top_n: usize,
}

impl Default for DesignRequest {
    fn default() -> Self {
        Self {
            target_power_kw: 0.0,
            target_power_rpm: None,
            target_torque_nm: None,
            redline_rpm: 7000.0,
            idle_rpm: 800.0,
            profile: ProfileKind::Balanced,
            cycle: Cycle::FourStroke,
            fuel: Fuel::Petrol,
            bsfc_g_per_kwh: None,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Ranked output of a design search.
#[derive(Debug, Clone)]
pub struct DesignOutcome {
    /// Surviving candidates, best first, capped at top-N.
    pub candidates: Vec<Candidate>,
    /// Fixed assumptions applied to every candidate.
    pub assumptions: Vec<String>,
    pub evaluated: usize,
    pub rejected: usize,
    /// Set when every evaluated candidate violated a constraint.
    pub warning: Option<String>,
}

/// Sweep the search space and return the ranked feasible candidates.
pub fn search_designs(
    request: &DesignRequest,
    space: &SearchSpace,
    constraints: &Constraints,
) -> Result<DesignOutcome, AppError> {
    if request.target_power_kw <= 0.0 {
        return Err(AppError::InvalidRange(format!(
            "target_power_kw: must be > 0, got {}",
            request.target_power_kw
        )));
    }

    let disp_values = displacement_grid(space)?;
    if space.cylinders.is_empty() {
        return Err(AppError::EmptySearchSpace(
            "cylinders: candidate cylinder set is empty".to_string(),
        ));
    }

    let mut pairs = Vec::with_capacity(disp_values.len() * space.cylinders.len());
    for &disp_cc in &disp_values {
        for &cyl in &space.cylinders {
            pairs.push((disp_cc, cyl));
        }
    }

    let cfg = RunConfig {
        rpm_min: request.idle_rpm,
        rpm_max: request.redline_rpm,
        rpm_step: 100.0,
        profile: request.profile,
    };

    let mut targets = vec![Target::Power {
        kw: request.target_power_kw,
        rpm: request.target_power_rpm,
    }];
    if let Some(nm) = request.target_torque_nm {
        targets.push(Target::Torque { nm, rpm: None });
    }

    // Candidates share no mutable state; evaluate them in parallel and sort
    // deterministically afterwards.
    let evaluated: Vec<Candidate> = pairs
        .par_iter()
        .filter_map(|&(disp_cc, cyl)| evaluate_candidate(request, &cfg, &targets, disp_cc, cyl))
        .collect();

    let total = evaluated.len();
    let mut feasible: Vec<Candidate> = Vec::with_capacity(total);
    let mut rejected = 0usize;
    for mut c in evaluated {
        let bmep_kpa = c.engine.peak_bmep_pa.unwrap_or(0.0) / 1000.0;
        c.bmep_ok = constraints.bmep_max_kpa.is_none_or(|max| bmep_kpa <= max);
        c.piston_speed_ok = constraints
            .piston_speed_max_mps
            .is_none_or(|max| c.piston_speed_mps_at_redline <= max);
        if c.bmep_ok && c.piston_speed_ok {
            feasible.push(c);
        } else {
            rejected += 1;
        }
    }

    // Rank ascending by power deviation; ties prefer mechanically gentler
    // (lower BMEP), then smaller, simpler engines. Total order keeps the
    // result independent of evaluation order.
    feasible.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| {
                let ba = a.engine.peak_bmep_pa.unwrap_or(f64::INFINITY);
                let bb = b.engine.peak_bmep_pa.unwrap_or(f64::INFINITY);
                ba.total_cmp(&bb)
            })
            .then_with(|| {
                let da = a.engine.displacement_m3().unwrap_or(f64::INFINITY);
                let db = b.engine.displacement_m3().unwrap_or(f64::INFINITY);
                da.total_cmp(&db)
            })
            .then_with(|| a.engine.cylinders.cmp(&b.engine.cylinders))
    });

    let warning = if feasible.is_empty() && total > 0 {
        Some(format!(
            "no feasible candidate: all {total} evaluated combinations violated a constraint"
        ))
    } else {
        None
    };

    feasible.truncate(request.top_n.max(1));

    Ok(DesignOutcome {
        candidates: feasible,
        assumptions: vec![
            "Assumed square geometry (bore = stroke) for every candidate".to_string(),
            format!(
                "Assumed load profile '{}' for every candidate",
                request.profile.display_name()
            ),
        ],
        evaluated: total,
        rejected,
        warning,
    })
}

/// Displacement grid in cc, min to max inclusive.
fn displacement_grid(space: &SearchSpace) -> Result<Vec<f64>, AppError> {
    if space.disp_min_cc <= 0.0 {
        return Err(AppError::EmptySearchSpace(format!(
            "disp_min_cc: must be > 0, got {}",
            space.disp_min_cc
        )));
    }
    if space.disp_max_cc < space.disp_min_cc {
        return Err(AppError::EmptySearchSpace(format!(
            "disp_max_cc: must be >= disp_min_cc ({} < {})",
            space.disp_max_cc, space.disp_min_cc
        )));
    }
    if space.disp_step_cc <= 0.0 {
        return Err(AppError::EmptySearchSpace(format!(
            "disp_step_cc: must be > 0, got {}",
            space.disp_step_cc
        )));
    }

    let span = space.disp_max_cc - space.disp_min_cc;
    let steps = ((span / space.disp_step_cc) + 1e-9).floor() as usize;
    let mut values = Vec::with_capacity(steps + 2);
    for i in 0..=steps {
        values.push((space.disp_min_cc + i as f64 * space.disp_step_cc).min(space.disp_max_cc));
    }
    if let Some(&last) = values.last() {
        if space.disp_max_cc - last > 1e-9 {
            values.push(space.disp_max_cc);
        }
    }
    Ok(values)
}

/// Evaluate one (displacement, cylinders) pair; `None` when the pair cannot
/// be matched to the targets at all.
fn evaluate_candidate(
    request: &DesignRequest,
    cfg: &RunConfig,
    targets: &[Target],
    disp_cc: f64,
    cylinders: u32,
) -> Option<Candidate> {
    let disp_m3 = cc_to_m3(disp_cc);

    // Square geometry backout: Vcyl = (pi/4)·s³ with bore = stroke.
    let v_cyl = disp_m3 / cylinders as f64;
    let stroke_m = (4.0 * v_cyl / PI).cbrt();

    let partial = PartialSpec {
        cylinders: Some(cylinders),
        cycle: Some(request.cycle),
        bore_m: Some(stroke_m),
        stroke_m: Some(stroke_m),
        idle_rpm: Some(request.idle_rpm),
        redline_rpm: Some(request.redline_rpm),
        fuel: Some(request.fuel),
        bsfc_g_per_kwh: request.bsfc_g_per_kwh,
        ..PartialSpec::default()
    };

    let matched = match_spec(&partial, targets, Some(request.profile)).ok()?;
    let curve = build_curve(&matched.engine, cfg).ok()?;
    let summary = curve.summary();

    Some(Candidate {
        piston_speed_mps_at_redline: mean_piston_speed_mps(stroke_m, request.redline_rpm),
        score: (summary.peak_power_kw - request.target_power_kw).abs(),
        engine: matched.engine,
        summary,
        bmep_ok: true,
        piston_speed_ok: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(target_kw: f64) -> DesignRequest {
        DesignRequest {
            target_power_kw: target_kw,
            redline_rpm: 7500.0,
            ..DesignRequest::default()
        }
    }

    fn one_element_space(disp_cc: f64, cyl: u32) -> SearchSpace {
        SearchSpace {
            disp_min_cc: disp_cc,
            disp_max_cc: disp_cc,
            disp_step_cc: 250.0,
            cylinders: vec![cyl],
        }
    }

    #[test]
    fn empty_cylinder_set_is_an_error() {
        let space = SearchSpace {
            cylinders: vec![],
            ..SearchSpace::default()
        };
        let err = search_designs(&request(150.0), &space, &Constraints::default()).unwrap_err();
        assert!(matches!(err, AppError::EmptySearchSpace(_)));
    }

    #[test]
    fn inverted_displacement_range_is_an_error() {
        let space = SearchSpace {
            disp_min_cc: 3000.0,
            disp_max_cc: 1000.0,
            ..SearchSpace::default()
        };
        let err = search_designs(&request(150.0), &space, &Constraints::default()).unwrap_err();
        assert!(matches!(err, AppError::EmptySearchSpace(_)));
    }

    #[test]
    fn non_positive_target_power_is_rejected() {
        let err = search_designs(
            &request(0.0),
            &SearchSpace::default(),
            &Constraints::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidRange(_)));
    }

    #[test]
    fn one_element_space_yields_exactly_one_candidate() {
        let outcome = search_designs(
            &request(150.0),
            &one_element_space(2000.0, 4),
            &Constraints::default(),
        )
        .unwrap();
        assert_eq!(outcome.evaluated, 1);
        assert_eq!(outcome.candidates.len(), 1);
        assert!(outcome.warning.is_none());

        let c = &outcome.candidates[0];
        assert_eq!(c.engine.cylinders, 4);
        // Square geometry: bore equals stroke.
        assert_eq!(c.engine.bore_m(), c.engine.stroke_m());
        // Matching drives the achieved peak power close to the target.
        assert!((c.summary.peak_power_kw - 150.0).abs() / 150.0 < 0.02);
    }

    #[test]
    fn one_element_space_can_yield_zero_under_a_tight_constraint() {
        let constraints = Constraints {
            bmep_max_kpa: Some(100.0),
            piston_speed_max_mps: None,
        };
        let outcome =
            search_designs(&request(150.0), &one_element_space(2000.0, 4), &constraints).unwrap();
        assert_eq!(outcome.evaluated, 1);
        assert_eq!(outcome.rejected, 1);
        assert!(outcome.candidates.is_empty());
        assert!(outcome.warning.is_some());
    }

    #[test]
    fn constraint_ceilings_filter_candidates() {
        let space = SearchSpace {
            disp_min_cc: 1000.0,
            disp_max_cc: 4000.0,
            disp_step_cc: 500.0,
            cylinders: vec![4, 6],
        };
        let unconstrained =
            search_designs(&request(200.0), &space, &Constraints::default()).unwrap();
        let constrained = search_designs(
            &request(200.0),
            &space,
            &Constraints {
                bmep_max_kpa: Some(2500.0),
                piston_speed_max_mps: Some(20.0),
            },
        )
        .unwrap();

        assert_eq!(unconstrained.evaluated, constrained.evaluated);
        assert!(constrained.rejected > 0);
        assert!(!constrained.candidates.is_empty());
        for c in &constrained.candidates {
            assert!(c.engine.peak_bmep_pa.unwrap() / 1000.0 <= 2500.0);
            assert!(c.piston_speed_mps_at_redline <= 20.0);
            assert!(c.bmep_ok && c.piston_speed_ok);
        }
    }

    #[test]
    fn ranking_is_ascending_in_power_deviation_then_bmep() {
        let space = SearchSpace {
            disp_min_cc: 1500.0,
            disp_max_cc: 3500.0,
            disp_step_cc: 250.0,
            cylinders: vec![4, 6],
        };
        let outcome = search_designs(&request(180.0), &space, &Constraints::default()).unwrap();
        assert!(outcome.candidates.len() > 1);
        for pair in outcome.candidates.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.score < b.score
                    || (a.score == b.score
                        && a.engine.peak_bmep_pa.unwrap() <= b.engine.peak_bmep_pa.unwrap())
            );
        }
    }

    #[test]
    fn top_n_caps_the_ranked_list() {
        let space = SearchSpace::default();
        let mut req = request(150.0);
        req.top_n = 3;
        let outcome = search_designs(&req, &space, &Constraints::default()).unwrap();
        assert!(outcome.candidates.len() <= 3);
        assert!(outcome.evaluated > 3);
    }

    #[test]
    fn displacement_grid_includes_both_ends() {
        let space = SearchSpace {
            disp_min_cc: 1000.0,
            disp_max_cc: 1999.0,
            disp_step_cc: 250.0,
            cylinders: vec![4],
        };
        let grid = displacement_grid(&space).unwrap();
        assert_eq!(grid[0], 1000.0);
        assert_eq!(*grid.last().unwrap(), 1999.0);
    }
}
