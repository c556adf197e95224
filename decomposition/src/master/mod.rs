use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use itertools::Itertools;
use shared::{FacilityId, Instance};

use crate::cuts::{capacity_feasibility_cut, support_set, Cut};
use crate::statistics::CutStatistics;
use crate::SolveError;

mod highs_master;
pub use highs_master::HighsMaster;

#[cfg(feature = "gurobi")]
mod gurobi_master;
#[cfg(feature = "gurobi")]
pub use gurobi_master::GurobiMaster;

#[derive(Debug, Clone)]
pub struct Solution {
    /// Fixed costs of the open facilities plus the final `eta`.
    pub objective: f64,
    pub open_facilities: Vec<FacilityId>,
    pub facility_values: Vec<f64>,
    pub solution_time: Duration,
    pub statistics: CutStatistics,
    /// Branch-and-bound nodes, or master solves for the iterative engine.
    pub nodes: u64,
}

impl Solution {
    pub(crate) fn new(
        instance: &Instance,
        objective: f64,
        facility_values: Vec<f64>,
        solution_time: Duration,
        statistics: CutStatistics,
        nodes: u64,
    ) -> Self {
        let open_facilities = support_set(&facility_values)
            .into_iter()
            .map(|j| instance.facilities()[j].id)
            .collect();
        Solution {
            objective,
            open_facilities,
            facility_values,
            solution_time,
            statistics,
            nodes,
        }
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Objective: {}", self.objective)?;
        writeln!(
            f,
            "Open facilities: [{}]",
            self.open_facilities.iter().map(|id| id.to_string()).join(", ")
        )?;
        writeln!(f, "Solution time: {:.2}s", self.solution_time.as_secs_f64())?;
        writeln!(f, "Cuts: {}", self.statistics)?;
        write!(f, "Nodes: {}", self.nodes)
    }
}

pub trait SolutionMethod {
    fn run(&self, instance: &Instance, should_stop: Arc<AtomicBool>) -> Result<Solution, SolveError>;
}

/// Master problem data shared by the engines:
///
/// ```text
/// min  sum_j fixedCost[j] * y[j] + eta
/// s.t. sum_j capacity[j] * y[j] >= sum_i demand[i]
///      eta >= L, y binary
/// ```
#[derive(Debug, Clone)]
pub struct MasterFormulation {
    pub fixed_costs: Vec<f64>,
    pub eta_lower_bound: f64,
}

impl MasterFormulation {
    pub fn new(instance: &Instance, eta_lower_bound: f64) -> Self {
        MasterFormulation {
            fixed_costs: instance.facilities().iter().map(|f| f.fixed_cost).collect(),
            eta_lower_bound,
        }
    }

    /// Rows present before the search starts.
    pub fn initial_cuts(&self, instance: &Instance) -> Vec<Cut> {
        vec![capacity_feasibility_cut(instance)]
    }

    /// Writes the master with the given rows in CPLEX LP format, named like the Gurobi
    /// model so both engines produce comparable files.
    pub fn write_lp(&self, instance: &Instance, cuts: &[Cut], path: &str) -> Result<(), SolveError> {
        let names: Vec<String> = instance
            .facilities()
            .iter()
            .map(|f| format!("y[{}]", f.id))
            .collect();
        let mut out = BufWriter::new(File::create(path)?);

        writeln!(out, "\\ FLP_Master")?;
        writeln!(out, "Minimize")?;
        let objective = self
            .fixed_costs
            .iter()
            .zip(names.iter())
            .map(|(c, name)| format!("{} {}", c, name))
            .chain(std::iter::once("eta".to_string()))
            .join(" + ");
        writeln!(out, " obj: {}", objective)?;

        writeln!(out, "Subject To")?;
        for (i, cut) in cuts.iter().enumerate() {
            let terms = std::iter::once((cut.eta_coefficient, "eta"))
                .chain(cut.coefficients.iter().zip(names.iter()).map(|(&c, n)| (-c, n.as_str())))
                .filter(|(c, _)| *c != 0.0)
                .map(|(c, name)| format!("{} {} {}", if c < 0.0 { "-" } else { "+" }, c.abs(), name))
                .join(" ");
            writeln!(out, " initialCut[{}]: {} >= {}", i, terms, cut.constant)?;
        }

        writeln!(out, "Bounds")?;
        writeln!(out, " eta >= {}", self.eta_lower_bound)?;
        writeln!(out, "Binaries")?;
        writeln!(out, " {}", names.join(" "))?;
        writeln!(out, "End")?;

        out.flush()?;
        Ok(())
    }
}
