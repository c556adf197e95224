use grb::prelude::*;
use grb::{Env, param};
use log::trace;
use shared::Instance;

use crate::subproblem::{prepare_open_vector, SubproblemForm, SubproblemResult, SubproblemSolver};
use crate::SolveError;

/// Subproblem evaluation with Gurobi. The environment is shared, each evaluation builds
/// and drops its own model.
pub struct GurobiSubproblem {
    env: Env,
}

impl GurobiSubproblem {
    pub fn new(threads: i32) -> Result<Self, SolveError> {
        let mut env = Env::new("")?;
        env.set(param::OutputFlag, 0)?;
        env.set(param::Threads, threads)?;
        env.set(param::Seed, 12345)?;
        Ok(GurobiSubproblem { env })
    }
}

impl SubproblemSolver for GurobiSubproblem {
    fn evaluate(
        &self,
        instance: &Instance,
        facility_open: &[f64],
        form: SubproblemForm,
    ) -> Result<SubproblemResult, SolveError> {
        let facility_open = prepare_open_vector(instance, facility_open)?;

        let mut model = Model::with_env("FLP_Sub", &self.env)?;
        model.set_attr(attr::ModelSense, grb::ModelSense::Minimize)?;

        let mut x: Vec<Vec<Var>> = Vec::with_capacity(instance.num_customers());
        for customer in instance.customers() {
            let mut row = Vec::with_capacity(instance.num_facilities());
            for facility in instance.facilities() {
                let cost = instance.ship_cost(customer.index, facility.index) * customer.demand;
                let name = format!("x[{},{}]", customer.id, facility.id);
                let var = match form {
                    SubproblemForm::Relaxed => model.add_var(&name, Continuous, cost, 0.0, INFINITY, [])?,
                    SubproblemForm::Exact => model.add_var(&name, Binary, cost, 0.0, 1.0, [])?,
                };
                row.push(var);
            }
            x.push(row);
        }

        let mut demand_constraints = Vec::with_capacity(instance.num_customers());
        for customer in instance.customers() {
            let mut lhs = LinExpr::new();
            for var in x[customer.index].iter() {
                lhs.add_term(1.0, *var);
            }
            demand_constraints.push(
                model.add_constr(&format!("Demand[{}]", customer.id), c!(lhs >= 1.0))?,
            );
        }

        let mut capacity_constraints = Vec::with_capacity(instance.num_facilities());
        for facility in instance.facilities() {
            let mut lhs = LinExpr::new();
            for customer in instance.customers() {
                lhs.add_term(customer.demand, x[customer.index][facility.index]);
            }
            let available = facility.capacity * facility_open[facility.index];
            capacity_constraints.push(
                model.add_constr(&format!("Capacity[{}]", facility.id), c!(lhs <= available))?,
            );
        }

        if form == SubproblemForm::Exact {
            // the integer cut is only valid for the true optimum
            model.set_param(param::MIPGap, 0.0)?;
            model.set_param(param::MIPGapAbs, 0.0)?;
        }

        model.optimize()?;

        match model.status()? {
            Status::Optimal => {}
            Status::Infeasible | Status::InfOrUnbd => {
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

        let objective = model.get_attr(attr::ObjVal)?;

        match form {
            SubproblemForm::Exact => Ok(SubproblemResult::Integer { objective }),
            SubproblemForm::Relaxed => {
                let mu = model.get_obj_attr_batch(attr::Pi, demand_constraints)?;
                let nu = model.get_obj_attr_batch(attr::Pi, capacity_constraints)?;
                Ok(SubproblemResult::Relaxed { objective, mu, nu })
            }
        }
    }
}
