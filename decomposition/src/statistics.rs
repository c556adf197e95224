use std::fmt;

#[cfg(feature = "perf_statistics")]
use crate::metrics::*;

/// Which inspection produced a cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutOrigin {
    /// Relaxed subproblem at an integer incumbent.
    IncumbentRelaxed,
    /// Exact subproblem at an integer incumbent.
    IncumbentInteger,
    /// Relaxed subproblem at a fractional node.
    NodeRelaxed,
    Feasibility,
}

/// Cut counters of one decomposition run. They only ever grow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CutStatistics {
    pub incumbent_relaxed: usize,
    pub incumbent_integer: usize,
    pub node_relaxed: usize,
    pub feasibility: usize,
}

impl CutStatistics {
    pub fn new() -> Self {
        CutStatistics::default()
    }

    pub fn record(&mut self, origin: CutOrigin) {
        match origin {
            CutOrigin::IncumbentRelaxed => {
                self.incumbent_relaxed += 1;
                #[cfg(feature = "perf_statistics")]
                CUTS_INCUMBENT_RELAXED.mark();
            }
            CutOrigin::IncumbentInteger => {
                self.incumbent_integer += 1;
                #[cfg(feature = "perf_statistics")]
                CUTS_INCUMBENT_INTEGER.mark();
            }
            CutOrigin::NodeRelaxed => {
                self.node_relaxed += 1;
                #[cfg(feature = "perf_statistics")]
                CUTS_NODE_RELAXED.mark();
            }
            CutOrigin::Feasibility => {
                self.feasibility += 1;
                #[cfg(feature = "perf_statistics")]
                CUTS_FEASIBILITY.mark();
            }
        }
    }

    pub fn get(&self, origin: CutOrigin) -> usize {
        match origin {
            CutOrigin::IncumbentRelaxed => self.incumbent_relaxed,
            CutOrigin::IncumbentInteger => self.incumbent_integer,
            CutOrigin::NodeRelaxed => self.node_relaxed,
            CutOrigin::Feasibility => self.feasibility,
        }
    }

    pub fn total(&self) -> usize {
        self.incumbent_relaxed + self.incumbent_integer + self.node_relaxed + self.feasibility
    }
}

impl fmt::Display for CutStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "incumbent/relaxed: {}, incumbent/integer: {}, node/relaxed: {}, feasibility: {}",
            self.incumbent_relaxed, self.incumbent_integer, self.node_relaxed, self.feasibility
        )
    }
}
