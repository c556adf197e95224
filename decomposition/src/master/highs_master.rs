use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;
use std::time::Instant;

use highs::{Col, HighsModelStatus, RowProblem, Sense};
use log::{debug, info};
use shared::{DecompositionConfig, Instance};

use crate::callback::{BendersCallback, NodeStatus, SearchContext, SearchEvent};
use crate::cuts::Cut;
use crate::master::{MasterFormulation, Solution, SolutionMethod};
use crate::subproblem::HighsSubproblem;
use crate::SolveError;

/// Benders cut loop around HiGHS. HiGHS has no lazy-constraint callback, so the master
/// is re-solved from scratch with every batch of cuts:
///
/// 1. root: the LP relaxation is offered as a relaxation node until no cut is produced
///    or `root_cut_rounds` is reached,
/// 2. the master MIP optimum is offered as an integer candidate until it is accepted.
pub struct HighsMaster {
    config: DecompositionConfig,
}

struct MasterPoint {
    facility_values: Vec<f64>,
    eta: f64,
    objective: f64,
}

/// Lazy cuts handed back by the driver are only collected here, the loop adds them to
/// the next master.
struct MasterContext<'p> {
    point: &'p MasterPoint,
    pending: Vec<Cut>,
}

impl<'p> MasterContext<'p> {
    fn new(point: &'p MasterPoint) -> Self {
        MasterContext {
            point,
            pending: Vec::new(),
        }
    }
}

impl<'p> SearchContext for MasterContext<'p> {
    fn facility_values(&self) -> Result<Vec<f64>, SolveError> {
        Ok(self.point.facility_values.clone())
    }

    fn eta_value(&self) -> Result<f64, SolveError> {
        Ok(self.point.eta)
    }

    fn add_lazy(&mut self, cut: Cut) -> Result<(), SolveError> {
        self.pending.push(cut);
        Ok(())
    }
}

impl HighsMaster {
    pub fn new(config: DecompositionConfig) -> Self {
        HighsMaster { config }
    }

    fn solve_master(
        &self,
        formulation: &MasterFormulation,
        cuts: &[Cut],
        integral: bool,
    ) -> Result<MasterPoint, SolveError> {
        let mut pb = RowProblem::new();

        let y: Vec<Col> = formulation
            .fixed_costs
            .iter()
            .map(|&fixed_cost| {
                if integral {
                    pb.add_integer_column(fixed_cost, 0.0..=1.0)
                } else {
                    pb.add_column(fixed_cost, 0.0..=1.0)
                }
            })
            .collect();
        let eta = pb.add_column(1.0, formulation.eta_lower_bound..);

        // eta_coefficient * eta - sum_j coefficients[j] * y[j] >= constant
        for cut in cuts {
            let terms: Vec<(Col, f64)> = std::iter::once((eta, cut.eta_coefficient))
                .chain(y.iter().zip(cut.coefficients.iter()).map(|(&col, &c)| (col, -c)))
                .filter(|(_, c)| *c != 0.0)
                .collect();
            pb.add_row(cut.constant.., terms);
        }

        let mut model = pb.optimise(Sense::Minimise);
        model.make_quiet();
        model.set_option("threads", self.config.threads.max(1));
        if integral {
            model.set_option("mip_rel_gap", 0.0);
        }
        if let Some(limit) = self.config.time_limit {
            model.set_option("time_limit", limit);
        }

        let solved = model
            .try_solve()
            .map_err(|status| SolveError::Solver(format!("HiGHS run failed: {:?}", status)))?;

        if solved.status() != HighsModelStatus::Optimal {
            return Err(SolveError::MasterNotOptimal(format!("{:?}", solved.status())));
        }

        let solution = solved.get_solution();
        let columns = solution.columns();
        if columns.len() != y.len() + 1 {
            return Err(SolveError::Solver(format!(
                "expected {} master columns, got {}",
                y.len() + 1,
                columns.len()
            )));
        }

        Ok(MasterPoint {
            facility_values: columns[..y.len()].to_vec(),
            eta: columns[y.len()],
            objective: solved.objective_value(),
        })
    }
}

impl SolutionMethod for HighsMaster {
    fn run(&self, instance: &Instance, should_stop: Arc<AtomicBool>) -> Result<Solution, SolveError> {
        let start = Instant::now();

        let mut callback = BendersCallback::new(
            instance,
            HighsSubproblem::with_threads(self.config.threads),
            &self.config,
        );
        let formulation = MasterFormulation::new(instance, callback.lower_bound());
        let mut cuts = formulation.initial_cuts(instance);
        if let Some(path) = &self.config.master_model_output {
            formulation.write_lp(instance, &cuts, path)?;
            info!("Wrote initial master to {}", path);
        }

        let mut root_rounds = 0;
        while root_rounds < self.config.root_cut_rounds {
            scoped_tracepoint!(_bd_root_round);
            if should_stop.load(Relaxed) {
                return Err(SolveError::StoppedByExternal);
            }

            let point = self.solve_master(&formulation, &cuts, false)?;
            root_rounds += 1;

            let mut context = MasterContext::new(&point);
            callback.on_event(
                SearchEvent::RelaxationNode {
                    status: NodeStatus::Optimal,
                    node_count: 0,
                },
                &mut context,
            )?;

            debug!("Root round {}: bound {}", root_rounds, point.objective);
            if context.pending.is_empty() {
                break;
            }
            cuts.extend(context.pending);
        }
        debug!(
            "Root cut loop finished after {} rounds with {} cuts",
            root_rounds,
            callback.statistics().total()
        );
        callback.report_root_completed();

        let mut master_solves: u64 = 0;
        loop {
            scoped_tracepoint!(_bd_cut_loop);
            if should_stop.load(Relaxed) {
                return Err(SolveError::StoppedByExternal);
            }
            if master_solves as usize >= self.config.max_master_iterations {
                return Err(SolveError::IterationLimit(master_solves as usize));
            }

            let point = {
                scoped_tracepoint!(_bd_master_optimize);
                self.solve_master(&formulation, &cuts, true)?
            };
            master_solves += 1;

            let mut context = MasterContext::new(&point);
            callback.on_event(SearchEvent::IntegerCandidate, &mut context)?;

            debug!(
                "Master solve {}: bound {}, {} new cuts",
                master_solves,
                point.objective,
                context.pending.len()
            );

            if context.pending.is_empty() {
                info!(
                    "Incumbent accepted after {} master solves, objective {}",
                    master_solves, point.objective
                );
                return Ok(Solution::new(
                    instance,
                    point.objective,
                    point.facility_values,
                    start.elapsed(),
                    callback.statistics(),
                    master_solves,
                ));
            }
            cuts.extend(context.pending);
        }
    }
}
