use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;
use std::time::Instant;

use grb::callback::{CbResult, Callback, MIPNodeCtx, MIPSolCtx, Where};
use grb::prelude::*;
use grb::{param, Env};
use log::{error, info};
use shared::{DecompositionConfig, Instance};

use crate::callback::{BendersCallback, NodeStatus, SearchContext, SearchEvent};
use crate::cuts::Cut;
use crate::master::{MasterFormulation, Solution, SolutionMethod};
use crate::subproblem::GurobiSubproblem;
use crate::SolveError;

/// Branch-and-cut with Gurobi: one master model, cuts are added as lazy constraints from
/// the MIP solution and MIP node callbacks.
pub struct GurobiMaster {
    config: DecompositionConfig,
}

impl GurobiMaster {
    pub fn new(config: DecompositionConfig) -> Self {
        GurobiMaster { config }
    }
}

fn cut_constraint(cut: &Cut, y: &[Var], eta: Var) -> IneqExpr {
    let mut lhs = LinExpr::new();
    if cut.eta_coefficient != 0.0 {
        lhs.add_term(cut.eta_coefficient, eta);
    }
    for (&var, &c) in y.iter().zip(cut.coefficients.iter()) {
        if c != 0.0 {
            lhs.add_term(-c, var);
        }
    }
    let constant = cut.constant;
    c!(lhs >= constant)
}

struct IncumbentView<'c, 'm> {
    ctx: &'c MIPSolCtx<'m>,
    y: &'c [Var],
    eta: Var,
}

impl<'c, 'm> SearchContext for IncumbentView<'c, 'm> {
    fn facility_values(&self) -> Result<Vec<f64>, SolveError> {
        Ok(self.ctx.get_solution(self.y)?)
    }

    fn eta_value(&self) -> Result<f64, SolveError> {
        let values = self.ctx.get_solution(std::iter::once(self.eta))?;
        values
            .first()
            .copied()
            .ok_or_else(|| SolveError::Solver("no value for eta".to_string()))
    }

    fn add_lazy(&mut self, cut: Cut) -> Result<(), SolveError> {
        self.ctx
            .add_lazy(cut_constraint(&cut, self.y, self.eta))
            .map_err(|e| SolveError::Cut(e.to_string()))
    }
}

struct NodeView<'c, 'm> {
    ctx: &'c MIPNodeCtx<'m>,
    y: &'c [Var],
    eta: Var,
}

impl<'c, 'm> SearchContext for NodeView<'c, 'm> {
    fn facility_values(&self) -> Result<Vec<f64>, SolveError> {
        Ok(self.ctx.get_node_rel(self.y)?)
    }

    fn eta_value(&self) -> Result<f64, SolveError> {
        let values = self.ctx.get_node_rel(std::iter::once(self.eta))?;
        values
            .first()
            .copied()
            .ok_or_else(|| SolveError::Solver("no relaxation value for eta".to_string()))
    }

    fn add_lazy(&mut self, cut: Cut) -> Result<(), SolveError> {
        self.ctx
            .add_lazy(cut_constraint(&cut, self.y, self.eta))
            .map_err(|e| SolveError::Cut(e.to_string()))
    }
}

struct GurobiCallback<'a> {
    driver: BendersCallback<'a, GurobiSubproblem>,
    y: Vec<Var>,
    eta: Var,
    should_stop: Arc<AtomicBool>,
    failure: Option<SolveError>,
    nodes: u64,
}

impl<'a> Callback for GurobiCallback<'a> {
    fn callback(&mut self, w: Where) -> CbResult {
        if self.failure.is_some() {
            return Ok(());
        }

        let outcome = match w {
            Where::MIPSol(ctx) => {
                if self.should_stop.load(Relaxed) {
                    ctx.terminate();
                    return Ok(());
                }
                self.nodes = ctx.node_cnt()? as u64;
                let mut view = IncumbentView {
                    ctx: &ctx,
                    y: &self.y,
                    eta: self.eta,
                };
                self.driver.on_event(SearchEvent::IntegerCandidate, &mut view)
            }
            Where::MIPNode(ctx) => {
                if self.should_stop.load(Relaxed) {
                    ctx.terminate();
                    return Ok(());
                }
                let node_count = ctx.node_cnt()? as u64;
                self.nodes = node_count;
                let status = match ctx.status()? {
                    Status::Optimal => NodeStatus::Optimal,
                    Status::Infeasible => NodeStatus::Infeasible,
                    _ => NodeStatus::Other,
                };
                let mut view = NodeView {
                    ctx: &ctx,
                    y: &self.y,
                    eta: self.eta,
                };
                self.driver
                    .on_event(SearchEvent::RelaxationNode { status, node_count }, &mut view)
            }
            _ => return Ok(()),
        };

        // Gurobi only sees a generic callback failure, the cause is kept here
        if let Err(e) = outcome {
            error!("Decomposition callback failed: {}", e);
            self.failure = Some(e);
        }
        Ok(())
    }
}

impl SolutionMethod for GurobiMaster {
    fn run(&self, instance: &Instance, should_stop: Arc<AtomicBool>) -> Result<Solution, SolveError> {
        let start = Instant::now();

        let mut env = Env::new("")?;
        env.set(param::OutputFlag, 1)?;
        env.set(param::Threads, self.config.threads)?;
        env.set(param::LazyConstraints, 1)?;
        env.set(param::Seed, 12345)?;
        env.set(param::MIPGap, 0.0)?;
        if let Some(limit) = self.config.time_limit {
            env.set(param::TimeLimit, limit)?;
        }

        let solver = GurobiSubproblem::new(self.config.threads)?;
        let driver = BendersCallback::new(instance, solver, &self.config);
        let formulation = MasterFormulation::new(instance, driver.lower_bound());

        let mut model = Model::with_env("FLP_Master", &env)?;
        model.set_attr(attr::ModelSense, grb::ModelSense::Minimize)?;

        let mut y = Vec::with_capacity(instance.num_facilities());
        for (facility, &fixed_cost) in instance.facilities().iter().zip(formulation.fixed_costs.iter()) {
            y.push(model.add_var(&format!("y[{}]", facility.id), Binary, fixed_cost, 0.0, 1.0, [])?);
        }
        let eta = model.add_var("eta", Continuous, 1.0, formulation.eta_lower_bound, INFINITY, [])?;

        for (i, cut) in formulation.initial_cuts(instance).iter().enumerate() {
            model.add_constr(&format!("initialCut[{}]", i), cut_constraint(cut, &y, eta))?;
        }

        if let Some(path) = &self.config.master_model_output {
            model.update()?;
            model.write(path)?;
            info!("Wrote initial master to {}", path);
        }

        let mut callback = GurobiCallback {
            driver,
            y: y.clone(),
            eta,
            should_stop: should_stop.clone(),
            failure: None,
            nodes: 0,
        };

        {
            scoped_tracepoint!(_bd_master_optimize);
            model.optimize_with_callback(&mut callback)?;
        }

        if let Some(e) = callback.failure.take() {
            return Err(e);
        }
        if should_stop.load(Relaxed) {
            return Err(SolveError::StoppedByExternal);
        }

        match model.status()? {
            Status::Optimal => {}
            status => return Err(SolveError::MasterNotOptimal(format!("{:?}", status))),
        }

        let objective = model.get_attr(attr::ObjVal)?;
        let facility_values = model.get_obj_attr_batch(attr::X, y)?;
        let nodes = model.get_attr(attr::NodeCount)? as u64;

        info!("Branch-and-cut finished with objective {}", objective);
        Ok(Solution::new(
            instance,
            objective,
            facility_values,
            start.elapsed(),
            callback.driver.statistics(),
            nodes.max(callback.nodes),
        ))
    }
}
