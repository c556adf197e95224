//! Cut synthesis. All functions here are pure: they never call a solver and never touch
//! shared state.
//!
//! A cut reads `eta_coefficient * eta >= constant + sum_j coefficients[j] * y[j]`.

use std::fmt;

use itertools::Itertools;
use shared::{Instance, LowerBound};

use crate::OPEN_THRESHOLD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutKind {
    /// Dual-derived, supporting hyperplane of the relaxed cost function.
    Optimality,
    /// Integer L-shaped cut, tight only at one binary vector.
    Integer,
    /// No `eta` term, removes vectors without any feasible allocation.
    Feasibility,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cut {
    pub kind: CutKind,
    pub eta_coefficient: f64,
    pub constant: f64,
    pub coefficients: Vec<f64>,
}

impl Cut {
    pub fn rhs_at(&self, facility_open: &[f64]) -> f64 {
        self.constant
            + self
                .coefficients
                .iter()
                .zip(facility_open.iter())
                .map(|(c, y)| c * y)
                .sum::<f64>()
    }

    /// Positive when `(y, eta)` violates the cut.
    pub fn violation(&self, facility_open: &[f64], eta: f64) -> f64 {
        self.rhs_at(facility_open) - self.eta_coefficient * eta
    }

    pub fn is_violated(&self, facility_open: &[f64], eta: f64, tolerance: f64) -> bool {
        self.violation(facility_open, eta) > tolerance
    }
}

impl fmt::Display for Cut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms = self
            .coefficients
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != 0.0)
            .map(|(j, c)| format!("{:+} y[{}]", c, j))
            .join(" ");
        write!(f, "{} eta >= {} {}", self.eta_coefficient, self.constant, terms)
    }
}

/// `eta >= sum_i mu[i] + sum_j capacity[j] * nu[j] * y[j]`
pub fn opportunity_cut(mu: &[f64], nu: &[f64], instance: &Instance) -> Cut {
    Cut {
        kind: CutKind::Optimality,
        eta_coefficient: 1.0,
        constant: mu.iter().sum(),
        coefficients: instance
            .facilities()
            .iter()
            .zip(nu.iter())
            .map(|(facility, nu)| facility.capacity * nu)
            .collect(),
    }
}

/// `eta >= (objective - L) * (sum_{S} y - sum_{not S} y - |S|) + objective`
///
/// Equals `objective` at the indicator vector of `open_set` and loses `objective - L` for
/// every facility that differs from it.
pub fn integer_cut(objective: f64, lower_bound: f64, open_set: &[usize], instance: &Instance) -> Cut {
    let slope = objective - lower_bound;
    let mut coefficients = vec![-slope; instance.num_facilities()];
    for &j in open_set {
        coefficients[j] = slope;
    }
    Cut {
        kind: CutKind::Integer,
        eta_coefficient: 1.0,
        constant: objective - slope * open_set.len() as f64,
        coefficients,
    }
}

/// `sum_j capacity[j] * y[j] >= sum_i demand[i]`, the exact condition for the relaxed
/// subproblem to be feasible.
pub fn capacity_feasibility_cut(instance: &Instance) -> Cut {
    Cut {
        kind: CutKind::Feasibility,
        eta_coefficient: 0.0,
        constant: instance.total_demand(),
        coefficients: instance.facilities().iter().map(|f| -f.capacity).collect(),
    }
}

/// `sum_{j not in S} y[j] >= 1`. Closing facilities never makes an allocation feasible
/// again, so every subset of an infeasible open set is cut off as well. `None` when every
/// facility is already open.
pub fn cover_cut(open_set: &[usize], instance: &Instance) -> Option<Cut> {
    if open_set.len() >= instance.num_facilities() {
        return None;
    }
    let mut coefficients = vec![-1.0; instance.num_facilities()];
    for &j in open_set {
        coefficients[j] = 0.0;
    }
    Some(Cut {
        kind: CutKind::Feasibility,
        eta_coefficient: 0.0,
        constant: 1.0,
        coefficients,
    })
}

/// Facilities with `y[j] > 0.5`. A value of exactly 0.5 counts as closed.
pub fn support_set(facility_open: &[f64]) -> Vec<usize> {
    facility_open
        .iter()
        .enumerate()
        .filter(|(_, y)| **y > OPEN_THRESHOLD)
        .map(|(j, _)| j)
        .collect()
}

/// Binary indicator of `open_set` over all facilities.
pub fn indicator(open_set: &[usize], num_facilities: usize) -> Vec<f64> {
    let mut y = vec![0.0; num_facilities];
    for &j in open_set {
        y[j] = 1.0;
    }
    y
}

pub fn lower_bound_value(rule: LowerBound, instance: &Instance) -> f64 {
    match rule {
        LowerBound::Zero => 0.0,
        LowerBound::Computed => instance.shipment_lower_bound(),
        LowerBound::Fixed(value) => value,
    }
}
