//! The decomposition driver. A search engine hands it events together with a
//! [`SearchContext`]; the driver evaluates the subproblem at the point the engine is
//! looking at and submits a lazy cut whenever the master's `eta` underestimates the
//! shipment cost there.

use log::{debug, info, warn};
use shared::{DecompositionConfig, Instance, LowerBound};

use crate::cuts::{
    capacity_feasibility_cut, cover_cut, indicator, integer_cut, lower_bound_value,
    opportunity_cut, support_set, Cut,
};
use crate::statistics::{CutOrigin, CutStatistics};
use crate::subproblem::{SubproblemForm, SubproblemResult, SubproblemSolver};
use crate::SolveError;

#[cfg(feature = "perf_statistics")]
use crate::metrics::SubproblemTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Optimal,
    Infeasible,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEvent {
    /// The engine found an integer-feasible candidate.
    IntegerCandidate,
    /// The engine solved the relaxation at a tree node. `node_count` is the number of
    /// nodes explored so far.
    RelaxationNode { status: NodeStatus, node_count: u64 },
}

/// What the search engine offers at an event.
pub trait SearchContext {
    fn facility_values(&self) -> Result<Vec<f64>, SolveError>;
    fn eta_value(&self) -> Result<f64, SolveError>;
    /// Adds `cut` as a global constraint for the rest of the search.
    fn add_lazy(&mut self, cut: Cut) -> Result<(), SolveError>;
}

pub struct BendersCallback<'a, S: SubproblemSolver> {
    instance: &'a Instance,
    solver: S,
    violation_tolerance: f64,
    lower_bound: f64,
    integer_cuts: bool,
    statistics: CutStatistics,
    root_reported: bool,
}

impl<'a, S: SubproblemSolver> BendersCallback<'a, S> {
    pub fn new(instance: &'a Instance, solver: S, config: &DecompositionConfig) -> Self {
        let lower_bound = lower_bound_value(config.lower_bound, instance);
        if let LowerBound::Fixed(value) = config.lower_bound {
            if value > instance.shipment_lower_bound() {
                warn!(
                    "Fixed lower bound {} exceeds the provable bound {}, integer cuts may remove optimal solutions",
                    value,
                    instance.shipment_lower_bound()
                );
            }
        }

        BendersCallback {
            instance,
            solver,
            violation_tolerance: config.violation_tolerance,
            lower_bound,
            integer_cuts: config.integer_cuts,
            statistics: CutStatistics::new(),
            root_reported: false,
        }
    }

    pub fn statistics(&self) -> CutStatistics {
        self.statistics
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    /// Logs the root-node notice. Engines without node events call this themselves once
    /// their root phase is over. Returns `false` if the notice was already given.
    pub fn report_root_completed(&mut self) -> bool {
        if self.root_reported {
            return false;
        }
        self.root_reported = true;
        info!("Completed solving the root node. Proceeding with branch-and-bound...");
        true
    }

    /// Handles one event. Returns the origin of the submitted cut, or `None` if the point
    /// was accepted or skipped.
    pub fn on_event(
        &mut self,
        event: SearchEvent,
        ctx: &mut dyn SearchContext,
    ) -> Result<Option<CutOrigin>, SolveError> {
        match event {
            SearchEvent::IntegerCandidate => self.on_integer_candidate(ctx),
            SearchEvent::RelaxationNode { status, node_count } => {
                self.on_relaxation_node(status, node_count, ctx)
            }
        }
    }

    fn on_integer_candidate(
        &mut self,
        ctx: &mut dyn SearchContext,
    ) -> Result<Option<CutOrigin>, SolveError> {
        let facility_open = self.read_facility_values(ctx)?;
        let eta = ctx.eta_value()?;

        match self.evaluate(&facility_open, SubproblemForm::Relaxed)? {
            SubproblemResult::Infeasible => {
                debug!("Incumbent {:?} has no relaxed allocation", facility_open);
                let cut = capacity_feasibility_cut(self.instance);
                return self.submit(ctx, cut, CutOrigin::Feasibility).map(Some);
            }
            SubproblemResult::Relaxed { objective, mu, nu } => {
                if self.is_violated(objective, eta) {
                    debug!("Incumbent relaxed cost {} above eta {}", objective, eta);
                    let cut = opportunity_cut(&mu, &nu, self.instance);
                    return self.submit(ctx, cut, CutOrigin::IncumbentRelaxed).map(Some);
                }
            }
            SubproblemResult::Integer { .. } => {
                return Err(SolveError::Solver(
                    "relaxed evaluation returned an integer result".to_string(),
                ))
            }
        }

        if !self.integer_cuts {
            return Ok(None);
        }

        // the exact subproblem is evaluated at the binary point the integer cut is tight at
        let open_set = support_set(&facility_open);
        let binary = indicator(&open_set, self.instance.num_facilities());

        match self.evaluate(&binary, SubproblemForm::Exact)? {
            SubproblemResult::Infeasible => {
                debug!("Incumbent {:?} has no single-sourcing allocation", open_set);
                let cut = cover_cut(&open_set, self.instance).ok_or(SolveError::InstanceInfeasible)?;
                self.submit(ctx, cut, CutOrigin::Feasibility).map(Some)
            }
            SubproblemResult::Integer { objective } => {
                if self.is_violated(objective, eta) {
                    let cut = integer_cut(objective, self.lower_bound, &open_set, self.instance);
                    info!("Added integer L-shaped cut: {}", cut);
                    self.submit(ctx, cut, CutOrigin::IncumbentInteger).map(Some)
                } else {
                    Ok(None)
                }
            }
            SubproblemResult::Relaxed { .. } => Err(SolveError::Solver(
                "exact evaluation returned a relaxed result".to_string(),
            )),
        }
    }

    fn on_relaxation_node(
        &mut self,
        status: NodeStatus,
        node_count: u64,
        ctx: &mut dyn SearchContext,
    ) -> Result<Option<CutOrigin>, SolveError> {
        if node_count == 1 {
            self.report_root_completed();
        }

        if status != NodeStatus::Optimal {
            return Ok(None);
        }

        let facility_open = self.read_facility_values(ctx)?;
        let eta = ctx.eta_value()?;

        match self.evaluate(&facility_open, SubproblemForm::Relaxed)? {
            SubproblemResult::Infeasible => {
                let cut = capacity_feasibility_cut(self.instance);
                self.submit(ctx, cut, CutOrigin::Feasibility).map(Some)
            }
            SubproblemResult::Relaxed { objective, mu, nu } => {
                if self.is_violated(objective, eta) {
                    debug!("Node relaxed cost {} above eta {}", objective, eta);
                    let cut = opportunity_cut(&mu, &nu, self.instance);
                    self.submit(ctx, cut, CutOrigin::NodeRelaxed).map(Some)
                } else {
                    Ok(None)
                }
            }
            SubproblemResult::Integer { .. } => Err(SolveError::Solver(
                "relaxed evaluation returned an integer result".to_string(),
            )),
        }
    }

    /// Ties within the tolerance, scaled by the objective's magnitude, are not violations.
    fn is_violated(&self, objective: f64, eta: f64) -> bool {
        objective - eta > self.violation_tolerance * objective.abs().max(1.0)
    }

    fn read_facility_values(&self, ctx: &dyn SearchContext) -> Result<Vec<f64>, SolveError> {
        let values = ctx.facility_values()?;
        if values.len() != self.instance.num_facilities() {
            return Err(SolveError::InvalidInput(format!(
                "search engine reported {} facility values for {} facilities",
                values.len(),
                self.instance.num_facilities()
            )));
        }
        Ok(values)
    }

    fn evaluate(
        &self,
        facility_open: &[f64],
        form: SubproblemForm,
    ) -> Result<SubproblemResult, SolveError> {
        #[cfg(feature = "perf_statistics")]
        let _timer = SubproblemTimer::new();
        scoped_tracepoint!(_bd_subproblem);
        self.solver.evaluate(self.instance, facility_open, form)
    }

    // counted only once the engine has taken the cut
    fn submit(
        &mut self,
        ctx: &mut dyn SearchContext,
        cut: Cut,
        origin: CutOrigin,
    ) -> Result<CutOrigin, SolveError> {
        ctx.add_lazy(cut)?;
        self.statistics.record(origin);
        Ok(origin)
    }
}
