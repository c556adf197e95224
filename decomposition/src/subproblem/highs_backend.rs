use highs::{Col, HighsModelStatus, RowProblem, Sense};
use log::{trace, warn};
use shared::Instance;

use crate::subproblem::{
    dual_objective, prepare_open_vector, SubproblemForm, SubproblemResult, SubproblemSolver,
};
use crate::SolveError;

/// Subproblem evaluation with HiGHS. Demand rows are added first, capacity rows second,
/// so the row duals split into `mu` and `nu` by position.
#[derive(Debug, Clone)]
pub struct HighsSubproblem {
    threads: i32,
}

impl Default for HighsSubproblem {
    fn default() -> Self {
        HighsSubproblem { threads: 1 }
    }
}

impl HighsSubproblem {
    pub fn new() -> Self {
        HighsSubproblem::default()
    }

    pub fn with_threads(threads: i32) -> Self {
        HighsSubproblem {
            threads: threads.max(1),
        }
    }
}

impl SubproblemSolver for HighsSubproblem {
    fn evaluate(
        &self,
        instance: &Instance,
        facility_open: &[f64],
        form: SubproblemForm,
    ) -> Result<SubproblemResult, SolveError> {
        let facility_open = prepare_open_vector(instance, facility_open)?;
        let num_customers = instance.num_customers();
        let num_facilities = instance.num_facilities();

        let mut pb = RowProblem::new();

        let x: Vec<Vec<Col>> = instance
            .customers()
            .iter()
            .map(|customer| {
                instance
                    .facilities()
                    .iter()
                    .map(|facility| {
                        let cost = instance.ship_cost(customer.index, facility.index) * customer.demand;
                        match form {
                            SubproblemForm::Relaxed => pb.add_column(cost, 0.0..),
                            SubproblemForm::Exact => pb.add_integer_column(cost, 0.0..=1.0),
                        }
                    })
                    .collect()
            })
            .collect();

        for row in x.iter() {
            pb.add_row(1.0.., row.iter().map(|&col| (col, 1.0)));
        }

        for facility in instance.facilities() {
            let available = facility.capacity * facility_open[facility.index];
            pb.add_row(
                ..=available,
                instance
                    .customers()
                    .iter()
                    .map(|customer| (x[customer.index][facility.index], customer.demand)),
            );
        }

        let mut model = pb.optimise(Sense::Minimise);
        model.make_quiet();
        model.set_option("threads", self.threads);
        if form == SubproblemForm::Exact {
            // the integer cut is only valid for the true optimum
            model.set_option("mip_rel_gap", 0.0);
        }

        let solved = model
            .try_solve()
            .map_err(|status| SolveError::Solver(format!("HiGHS run failed: {:?}", status)))?;

        match solved.status() {
            HighsModelStatus::Optimal => {}
            // costs are non-negative, so the subproblem is never unbounded
            HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
                trace!("Subproblem infeasible for {:?}", facility_open);
                return Ok(SubproblemResult::Infeasible);
            }
            status => {
                return Err(SolveError::Solver(format!(
                    "subproblem ended with status {:?}",
                    status
                )))
            }
        }

        let objective = solved.objective_value();

        match form {
            SubproblemForm::Exact => Ok(SubproblemResult::Integer { objective }),
            SubproblemForm::Relaxed => {
                let solution = solved.get_solution();
                let duals = solution.dual_rows();
                if duals.len() != num_customers + num_facilities {
                    return Err(SolveError::Solver(format!(
                        "expected {} row duals, got {}",
                        num_customers + num_facilities,
                        duals.len()
                    )));
                }
                let mu = duals[..num_customers].to_vec();
                let nu = duals[num_customers..].to_vec();

                let bound = dual_objective(instance, &facility_open, &mu, &nu);
                if (bound - objective).abs() > 1e-6 * objective.abs().max(1.0) {
                    warn!(
                        "Dual objective {} differs from subproblem objective {}",
                        bound, objective
                    );
                }

                Ok(SubproblemResult::Relaxed { objective, mu, nu })
            }
        }
    }
}
