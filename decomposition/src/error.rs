use std::fmt;

#[derive(Debug)]
pub enum SolveError {
    /// The LP/MIP solver failed or ended in a status other than optimal or infeasible.
    Solver(String),
    MasterNotOptimal(String),
    /// Not even opening every facility admits a single-sourcing allocation.
    InstanceInfeasible,
    IterationLimit(usize),
    InvalidInput(String),
    /// The search engine refused a lazy cut.
    Cut(String),
    StoppedByExternal,
    Io(std::io::Error),
    #[cfg(feature = "gurobi")]
    Gurobi(grb::Error),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::Solver(msg) => write!(f, "solver failed: {}", msg),
            SolveError::MasterNotOptimal(status) => {
                write!(f, "master problem not solved to optimality: {}", status)
            }
            SolveError::InstanceInfeasible => {
                write!(f, "instance is infeasible even with every facility open")
            }
            SolveError::IterationLimit(n) => write!(f, "no converged master after {} iterations", n),
            SolveError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            SolveError::Cut(msg) => write!(f, "could not submit cut: {}", msg),
            SolveError::StoppedByExternal => write!(f, "stopped by external request"),
            SolveError::Io(e) => write!(f, "io: {}", e),
            #[cfg(feature = "gurobi")]
            SolveError::Gurobi(e) => write!(f, "gurobi: {}", e),
        }
    }
}

impl std::error::Error for SolveError {}

impl From<std::io::Error> for SolveError {
    fn from(e: std::io::Error) -> Self {
        SolveError::Io(e)
    }
}

#[cfg(feature = "gurobi")]
impl From<grb::Error> for SolveError {
    fn from(e: grb::Error) -> Self {
        SolveError::Gurobi(e)
    }
}
