//! Transportation subproblem for a fixed facility-open vector.
//!
//! For a vector `y` the subproblem ships every customer's demand from the facilities,
//!
//! ```text
//! min  sum_i sum_j shipCost[i,j] * demand[i] * x[i,j]
//! s.t. sum_j x[i,j] >= 1                           (demand, dual mu[i] >= 0)
//!      sum_i demand[i] * x[i,j] <= capacity[j] * y[j]  (capacity, dual nu[j] <= 0)
//! ```
//!
//! with `x >= 0` in the relaxed form and `x` binary in the exact form. In the relaxed form
//! `x <= 1` is implied at every optimum and is left out, so the dual objective is exactly
//! `sum mu + sum capacity * y * nu`, which is what the optimality cut relies on.

use shared::Instance;

use crate::SolveError;

mod highs_backend;
pub use highs_backend::HighsSubproblem;

#[cfg(feature = "gurobi")]
mod gurobi_backend;
#[cfg(feature = "gurobi")]
pub use gurobi_backend::GurobiSubproblem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubproblemForm {
    /// Continuous shipments, reports duals.
    Relaxed,
    /// Binary shipments, objective only.
    Exact,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubproblemResult {
    Relaxed {
        objective: f64,
        mu: Vec<f64>,
        nu: Vec<f64>,
    },
    Integer {
        objective: f64,
    },
    /// No allocation ships every demand with the given capacities.
    Infeasible,
}

impl SubproblemResult {
    /// Infinity for an infeasible allocation, so that any finite estimate is violated.
    pub fn objective(&self) -> f64 {
        match self {
            SubproblemResult::Relaxed { objective, .. } => *objective,
            SubproblemResult::Integer { objective } => *objective,
            SubproblemResult::Infeasible => f64::INFINITY,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, SubproblemResult::Infeasible)
    }
}

/// A solver able to evaluate the subproblem. Every call opens its own solver session and
/// releases it before returning.
pub trait SubproblemSolver {
    fn evaluate(
        &self,
        instance: &Instance,
        facility_open: &[f64],
        form: SubproblemForm,
    ) -> Result<SubproblemResult, SolveError>;
}

impl<S: SubproblemSolver + ?Sized> SubproblemSolver for &S {
    fn evaluate(
        &self,
        instance: &Instance,
        facility_open: &[f64],
        form: SubproblemForm,
    ) -> Result<SubproblemResult, SolveError> {
        (**self).evaluate(instance, facility_open, form)
    }
}

/// Checks the length and clamps solver noise into [0, 1].
pub(crate) fn prepare_open_vector(
    instance: &Instance,
    facility_open: &[f64],
) -> Result<Vec<f64>, SolveError> {
    if facility_open.len() != instance.num_facilities() {
        return Err(SolveError::InvalidInput(format!(
            "facility vector has {} entries, instance has {} facilities",
            facility_open.len(),
            instance.num_facilities()
        )));
    }
    if let Some(value) = facility_open.iter().find(|v| !v.is_finite()) {
        return Err(SolveError::InvalidInput(format!("facility value {} is not finite", value)));
    }
    Ok(facility_open.iter().map(|v| v.clamp(0.0, 1.0)).collect())
}

/// `sum mu + sum capacity * y * nu`; equals the relaxed objective by strong duality.
pub fn dual_objective(instance: &Instance, facility_open: &[f64], mu: &[f64], nu: &[f64]) -> f64 {
    let demand_part: f64 = mu.iter().sum();
    let capacity_part: f64 = instance
        .facilities()
        .iter()
        .zip(facility_open.iter())
        .zip(nu.iter())
        .map(|((facility, y), nu)| facility.capacity * y * nu)
        .sum();
    demand_part + capacity_part
}
