#![cfg(feature = "gurobi")]

use decomposition::subproblem::{
    dual_objective, GurobiSubproblem, HighsSubproblem, SubproblemForm, SubproblemResult,
    SubproblemSolver,
};
use itertools::Itertools;
use shared::Instance;

#[test]
fn test_exact_objective_matches_highs_everywhere() {
    let instance = Instance::random(21, 8, 4).unwrap();
    let gurobi = GurobiSubproblem::new(1).unwrap();
    let highs = HighsSubproblem::new();

    for y in (0..instance.num_facilities())
        .map(|_| vec![0.0, 1.0])
        .multi_cartesian_product()
    {
        let a = gurobi.evaluate(&instance, &y, SubproblemForm::Exact).unwrap();
        let b = highs.evaluate(&instance, &y, SubproblemForm::Exact).unwrap();

        assert_eq!(a.is_infeasible(), b.is_infeasible(), "at {:?}", y);
        if !a.is_infeasible() {
            // both are proven optima, an integer cut built from either is valid
            assert!((a.objective() - b.objective()).abs() < 1e-6, "at {:?}", y);
        }
    }
}

#[test]
fn test_relaxed_duals_reproduce_objective() {
    let instance = Instance::random(22, 6, 3).unwrap();
    let gurobi = GurobiSubproblem::new(1).unwrap();

    let result = gurobi
        .evaluate(&instance, &[1.0, 1.0, 1.0], SubproblemForm::Relaxed)
        .unwrap();
    if let SubproblemResult::Relaxed { objective, mu, nu } = result {
        let value = dual_objective(&instance, &[1.0, 1.0, 1.0], &mu, &nu);
        assert!((value - objective).abs() < 1e-6);
    } else {
        panic!("relaxed subproblem infeasible with every facility open");
    }
}
