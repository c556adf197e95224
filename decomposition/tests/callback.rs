use std::cell::RefCell;

use decomposition::callback::{BendersCallback, NodeStatus, SearchContext, SearchEvent};
use decomposition::cuts::{Cut, CutKind};
use decomposition::statistics::{CutOrigin, CutStatistics};
use decomposition::subproblem::{SubproblemForm, SubproblemResult, SubproblemSolver};
use decomposition::SolveError;
use shared::{DecompositionConfig, Instance};

fn two_by_two() -> Instance {
    Instance::from_data(
        &[1.0, 1.0],
        &[2.0, 2.0],
        &[10.0, 12.0],
        &[vec![1.0, 4.0], vec![4.0, 1.0]],
    )
    .unwrap()
}

fn relaxed(objective: f64) -> SubproblemResult {
    SubproblemResult::Relaxed {
        objective,
        mu: vec![4.0, 4.0],
        nu: vec![-1.5, 0.0],
    }
}

struct MockSolver {
    relaxed: SubproblemResult,
    exact: SubproblemResult,
    fail: bool,
    calls: RefCell<Vec<(Vec<f64>, SubproblemForm)>>,
}

impl MockSolver {
    fn new(relaxed: SubproblemResult, exact: SubproblemResult) -> Self {
        MockSolver {
            relaxed,
            exact,
            fail: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn forms(&self) -> Vec<SubproblemForm> {
        self.calls.borrow().iter().map(|(_, form)| *form).collect()
    }
}

impl SubproblemSolver for MockSolver {
    fn evaluate(
        &self,
        _instance: &Instance,
        facility_open: &[f64],
        form: SubproblemForm,
    ) -> Result<SubproblemResult, SolveError> {
        self.calls.borrow_mut().push((facility_open.to_vec(), form));
        if self.fail {
            return Err(SolveError::Solver("mock failure".to_string()));
        }
        Ok(match form {
            SubproblemForm::Relaxed => self.relaxed.clone(),
            SubproblemForm::Exact => self.exact.clone(),
        })
    }
}

struct MockContext {
    y: Vec<f64>,
    eta: f64,
    reject: bool,
    added: Vec<Cut>,
}

impl MockContext {
    fn new(y: Vec<f64>, eta: f64) -> Self {
        MockContext {
            y,
            eta,
            reject: false,
            added: Vec::new(),
        }
    }
}

impl SearchContext for MockContext {
    fn facility_values(&self) -> Result<Vec<f64>, SolveError> {
        Ok(self.y.clone())
    }

    fn eta_value(&self) -> Result<f64, SolveError> {
        Ok(self.eta)
    }

    fn add_lazy(&mut self, cut: Cut) -> Result<(), SolveError> {
        if self.reject {
            return Err(SolveError::Cut("lazy constraint rejected".to_string()));
        }
        self.added.push(cut);
        Ok(())
    }
}

const NODE: SearchEvent = SearchEvent::RelaxationNode {
    status: NodeStatus::Optimal,
    node_count: 3,
};

#[test]
fn test_incumbent_relaxed_cut_skips_exact_check() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Integer { objective: 9.0 });
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![1.0, 0.0], 0.0);

    let origin = callback.on_event(SearchEvent::IntegerCandidate, &mut ctx).unwrap();

    assert_eq!(origin, Some(CutOrigin::IncumbentRelaxed));
    assert_eq!(solver.forms(), vec![SubproblemForm::Relaxed]);
    assert_eq!(ctx.added.len(), 1);
    assert_eq!(ctx.added[0].kind, CutKind::Optimality);
    assert_eq!(ctx.added[0].constant, 8.0);
    assert_eq!(ctx.added[0].coefficients, vec![-3.0, 0.0]);
    assert_eq!(callback.statistics().incumbent_relaxed, 1);
    assert_eq!(callback.statistics().total(), 1);
}

#[test]
fn test_incumbent_integer_cut_at_rounded_point() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Integer { objective: 8.0 });
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![0.9999, 0.0001], 5.0);

    let origin = callback.on_event(SearchEvent::IntegerCandidate, &mut ctx).unwrap();

    assert_eq!(origin, Some(CutOrigin::IncumbentInteger));
    assert_eq!(solver.forms(), vec![SubproblemForm::Relaxed, SubproblemForm::Exact]);
    assert_eq!(solver.calls.borrow()[0].0, vec![0.9999, 0.0001]);
    assert_eq!(solver.calls.borrow()[1].0, vec![1.0, 0.0]);

    let cut = &ctx.added[0];
    assert_eq!(cut.kind, CutKind::Integer);
    assert!((cut.rhs_at(&[1.0, 0.0]) - 8.0).abs() < 1e-9);
    assert!((cut.rhs_at(&[1.0, 1.0]) - 0.0).abs() < 1e-9);
    assert_eq!(callback.statistics().incumbent_integer, 1);
}

#[test]
fn test_accepted_incumbent_adds_nothing() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Integer { objective: 8.0 });
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![1.0, 0.0], 8.0);

    assert_eq!(callback.on_event(SearchEvent::IntegerCandidate, &mut ctx).unwrap(), None);
    assert!(ctx.added.is_empty());
    assert_eq!(callback.statistics(), CutStatistics::default());
}

#[test]
fn test_ties_within_tolerance_are_not_violations() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Integer { objective: 5.0 });
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![1.0, 0.0], 5.0 - 1e-9);

    assert_eq!(callback.on_event(SearchEvent::IntegerCandidate, &mut ctx).unwrap(), None);
    assert_eq!(callback.on_event(NODE, &mut ctx).unwrap(), None);
    assert!(ctx.added.is_empty());
}

#[test]
fn test_integer_cuts_can_be_disabled() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Integer { objective: 8.0 });
    let config = DecompositionConfig {
        integer_cuts: false,
        ..DecompositionConfig::default()
    };
    let mut callback = BendersCallback::new(&instance, &solver, &config);
    let mut ctx = MockContext::new(vec![1.0, 0.0], 5.0);

    assert_eq!(callback.on_event(SearchEvent::IntegerCandidate, &mut ctx).unwrap(), None);
    assert_eq!(solver.forms(), vec![SubproblemForm::Relaxed]);
}

#[test]
fn test_node_cut() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Integer { objective: 8.0 });
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![0.5, 0.5], 1.0);

    assert_eq!(callback.on_event(NODE, &mut ctx).unwrap(), Some(CutOrigin::NodeRelaxed));
    // nodes never look at the exact subproblem
    assert_eq!(solver.forms(), vec![SubproblemForm::Relaxed]);
    assert_eq!(solver.calls.borrow()[0].0, vec![0.5, 0.5]);
    assert_eq!(callback.statistics().node_relaxed, 1);
}

#[test]
fn test_non_optimal_nodes_are_skipped() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Integer { objective: 8.0 });
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![0.5, 0.5], 0.0);

    for status in [NodeStatus::Infeasible, NodeStatus::Other] {
        let event = SearchEvent::RelaxationNode { status, node_count: 1 };
        assert_eq!(callback.on_event(event, &mut ctx).unwrap(), None);
    }
    assert!(solver.calls.borrow().is_empty());
    assert!(ctx.added.is_empty());
}

#[test]
fn test_relaxed_infeasibility_adds_capacity_cut() {
    let instance = two_by_two();
    let solver = MockSolver::new(SubproblemResult::Infeasible, SubproblemResult::Infeasible);
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![0.0, 0.0], 0.0);

    let origin = callback.on_event(SearchEvent::IntegerCandidate, &mut ctx).unwrap();

    assert_eq!(origin, Some(CutOrigin::Feasibility));
    assert_eq!(ctx.added[0].kind, CutKind::Feasibility);
    assert!(ctx.added[0].is_violated(&[0.0, 0.0], 0.0, 1e-9));
    assert_eq!(solver.forms(), vec![SubproblemForm::Relaxed]);
    assert_eq!(callback.statistics().feasibility, 1);
}

#[test]
fn test_exact_infeasibility_adds_cover_cut() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Infeasible);
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![1.0, 0.0], 5.0);

    let origin = callback.on_event(SearchEvent::IntegerCandidate, &mut ctx).unwrap();

    assert_eq!(origin, Some(CutOrigin::Feasibility));
    assert_eq!(ctx.added[0].coefficients, vec![0.0, -1.0]);
    assert!(ctx.added[0].is_violated(&[1.0, 0.0], 0.0, 1e-9));
}

#[test]
fn test_exact_infeasibility_with_everything_open() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Infeasible);
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![1.0, 1.0], 5.0);

    let result = callback.on_event(SearchEvent::IntegerCandidate, &mut ctx);

    assert!(matches!(result, Err(SolveError::InstanceInfeasible)));
    assert!(ctx.added.is_empty());
}

#[test]
fn test_rejected_cut_is_not_counted() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Integer { objective: 8.0 });
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![1.0, 0.0], 0.0);
    ctx.reject = true;

    assert!(matches!(
        callback.on_event(SearchEvent::IntegerCandidate, &mut ctx),
        Err(SolveError::Cut(_))
    ));
    assert!(callback.on_event(NODE, &mut ctx).is_err());
    assert_eq!(callback.statistics().total(), 0);
}

#[test]
fn test_solver_failure_propagates() {
    let instance = two_by_two();
    let mut solver = MockSolver::new(relaxed(5.0), SubproblemResult::Integer { objective: 8.0 });
    solver.fail = true;
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![1.0, 0.0], 0.0);

    assert!(matches!(
        callback.on_event(SearchEvent::IntegerCandidate, &mut ctx),
        Err(SolveError::Solver(_))
    ));
    assert!(ctx.added.is_empty());
    assert_eq!(callback.statistics().total(), 0);
}

#[test]
fn test_repeated_cuts_are_counted_each_time() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Integer { objective: 8.0 });
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![1.0, 0.0], 0.0);

    callback.on_event(SearchEvent::IntegerCandidate, &mut ctx).unwrap();
    callback.on_event(SearchEvent::IntegerCandidate, &mut ctx).unwrap();
    callback.on_event(NODE, &mut ctx).unwrap();

    assert_eq!(ctx.added[0], ctx.added[1]);
    assert_eq!(callback.statistics().incumbent_relaxed, 2);
    assert_eq!(callback.statistics().node_relaxed, 1);
    assert_eq!(callback.statistics().get(CutOrigin::IncumbentRelaxed), 2);
}

#[test]
fn test_wrong_number_of_facility_values() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Integer { objective: 8.0 });
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![1.0], 0.0);

    assert!(matches!(
        callback.on_event(SearchEvent::IntegerCandidate, &mut ctx),
        Err(SolveError::InvalidInput(_))
    ));
    assert!(solver.calls.borrow().is_empty());
}

#[test]
fn test_root_node_is_handled_like_any_node() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Integer { objective: 8.0 });
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![0.5, 0.5], 5.0);

    for _ in 0..2 {
        let event = SearchEvent::RelaxationNode {
            status: NodeStatus::Optimal,
            node_count: 1,
        };
        assert_eq!(callback.on_event(event, &mut ctx).unwrap(), None);
    }
    assert_eq!(solver.calls.borrow().len(), 2);
}

#[test]
fn test_root_notice_is_given_once() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Integer { objective: 8.0 });
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let mut ctx = MockContext::new(vec![0.5, 0.5], 5.0);

    assert!(callback.report_root_completed());
    assert!(!callback.report_root_completed());

    // a later first-node event does not repeat it
    let event = SearchEvent::RelaxationNode {
        status: NodeStatus::Optimal,
        node_count: 1,
    };
    callback.on_event(event, &mut ctx).unwrap();
    assert!(!callback.report_root_completed());
}

#[test]
fn test_first_node_event_gives_root_notice() {
    let instance = two_by_two();
    let solver = MockSolver::new(relaxed(5.0), SubproblemResult::Integer { objective: 8.0 });
    let mut ctx = MockContext::new(vec![0.5, 0.5], 5.0);

    // deeper nodes leave the notice pending
    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    callback.on_event(NODE, &mut ctx).unwrap();
    assert!(callback.report_root_completed());

    let mut callback = BendersCallback::new(&instance, &solver, &DecompositionConfig::default());
    let event = SearchEvent::RelaxationNode {
        status: NodeStatus::Optimal,
        node_count: 1,
    };
    callback.on_event(event, &mut ctx).unwrap();
    assert!(!callback.report_root_completed());
}
