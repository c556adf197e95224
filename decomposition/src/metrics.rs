extern crate dipstick;
use dipstick::*;

metrics! {
    pub CUTS_INCUMBENT_RELAXED : Marker = "cuts_incumbent_relaxed";
    pub CUTS_INCUMBENT_INTEGER : Marker = "cuts_incumbent_integer";
    pub CUTS_NODE_RELAXED : Marker = "cuts_node_relaxed";
    pub CUTS_FEASIBILITY : Marker = "cuts_feasibility";
    pub SUBPROBLEMS_SOLVED : Marker = "subproblems_solved";
    pub TIME_IN_SUBPROBLEM : Timer = "time_in_subproblem";
}

/// Counts one subproblem evaluation and times it until dropped.
pub struct SubproblemTimer {
    started: dipstick::TimeHandle,
}

#[allow(clippy::new_without_default)]
impl SubproblemTimer {
    pub fn new() -> Self {
        SUBPROBLEMS_SOLVED.mark();
        SubproblemTimer {
            started: TIME_IN_SUBPROBLEM.start(),
        }
    }
}

impl Drop for SubproblemTimer {
    fn drop(&mut self) {
        TIME_IN_SUBPROBLEM.stop(self.started);
    }
}
