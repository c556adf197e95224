use decomposition::cuts::*;
use shared::{Instance, LowerBound};

fn two_by_two() -> Instance {
    Instance::from_data(
        &[1.0, 1.0],
        &[2.0, 2.0],
        &[10.0, 12.0],
        &[vec![1.0, 4.0], vec![4.0, 1.0]],
    )
    .unwrap()
}

fn three_facilities() -> Instance {
    Instance::from_data(
        &[2.0, 3.0],
        &[4.0, 4.0, 4.0],
        &[5.0, 6.0, 7.0],
        &[vec![1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0]],
    )
    .unwrap()
}

#[test]
fn test_opportunity_cut_coefficients() {
    let instance = two_by_two();
    let cut = opportunity_cut(&[4.0, 4.0], &[-3.0, 0.0], &instance);

    assert_eq!(cut.kind, CutKind::Optimality);
    assert_eq!(cut.eta_coefficient, 1.0);
    assert_eq!(cut.constant, 8.0);
    assert_eq!(cut.coefficients, vec![-6.0, 0.0]);
    assert_eq!(cut.rhs_at(&[1.0, 0.0]), 2.0);
    assert_eq!(cut.rhs_at(&[0.0, 1.0]), 8.0);
}

#[test]
fn test_integer_cut_is_tight_at_its_binary_vector() {
    let instance = three_facilities();
    let open_set = vec![0, 2];
    let cut = integer_cut(20.0, 0.0, &open_set, &instance);

    assert_eq!(cut.kind, CutKind::Integer);
    assert_eq!(cut.coefficients, vec![20.0, -20.0, 20.0]);
    assert_eq!(cut.constant, 20.0 - 40.0);
    assert!((cut.rhs_at(&[1.0, 0.0, 1.0]) - 20.0).abs() < 1e-9);
}

#[test]
fn test_integer_cut_degrades_with_each_mismatch() {
    let instance = three_facilities();
    let cut = integer_cut(20.0, 5.0, &[0, 2], &instance);

    // one facility differs
    assert!((cut.rhs_at(&[1.0, 1.0, 1.0]) - 5.0).abs() < 1e-9);
    assert!((cut.rhs_at(&[0.0, 0.0, 1.0]) - 5.0).abs() < 1e-9);
    // two facilities differ
    assert!((cut.rhs_at(&[0.0, 1.0, 1.0]) - (-10.0)).abs() < 1e-9);
    // all differ
    assert!((cut.rhs_at(&[0.0, 1.0, 0.0]) - (-25.0)).abs() < 1e-9);
}

#[test]
fn test_integer_cut_with_empty_open_set() {
    let instance = three_facilities();
    let cut = integer_cut(7.0, 0.0, &[], &instance);

    assert_eq!(cut.constant, 7.0);
    assert_eq!(cut.rhs_at(&[0.0, 0.0, 0.0]), 7.0);
    assert_eq!(cut.rhs_at(&[1.0, 0.0, 0.0]), 0.0);
}

#[test]
fn test_capacity_feasibility_cut() {
    let instance = three_facilities();
    let cut = capacity_feasibility_cut(&instance);

    assert_eq!(cut.kind, CutKind::Feasibility);
    assert_eq!(cut.eta_coefficient, 0.0);
    // 4 y0 + 4 y1 + 4 y2 >= 5
    assert!(cut.is_violated(&[1.0, 0.0, 0.0], 0.0, 1e-9));
    assert!(!cut.is_violated(&[1.0, 1.0, 0.0], 0.0, 1e-9));
    assert!(!cut.is_violated(&[1.0, 0.25, 0.0], 0.0, 1e-9));
}

#[test]
fn test_cover_cut() {
    let instance = three_facilities();
    let cut = cover_cut(&[1], &instance).unwrap();

    assert_eq!(cut.coefficients, vec![-1.0, 0.0, -1.0]);
    assert!(cut.is_violated(&[0.0, 1.0, 0.0], 0.0, 1e-9));
    assert!(!cut.is_violated(&[1.0, 1.0, 0.0], 0.0, 1e-9));
    assert!(!cut.is_violated(&[0.0, 0.0, 1.0], 0.0, 1e-9));

    assert!(cover_cut(&[0, 1, 2], &instance).is_none());
}

#[test]
fn test_support_set_threshold() {
    assert_eq!(support_set(&[0.0, 0.5, 0.51, 1.0]), vec![2, 3]);
    assert_eq!(support_set(&[]), Vec::<usize>::new());
    assert_eq!(indicator(&[2, 3], 5), vec![0.0, 0.0, 1.0, 1.0, 0.0]);
}

#[test]
fn test_violation_sign() {
    let instance = two_by_two();
    let cut = opportunity_cut(&[4.0, 4.0], &[-3.0, 0.0], &instance);

    assert_eq!(cut.violation(&[1.0, 0.0], 1.0), 1.0);
    assert!(cut.is_violated(&[1.0, 0.0], 1.0, 1e-6));
    assert!(!cut.is_violated(&[1.0, 0.0], 2.0, 1e-6));
}

#[test]
fn test_lower_bound_rules() {
    let instance = two_by_two();

    assert_eq!(lower_bound_value(LowerBound::Zero, &instance), 0.0);
    assert_eq!(lower_bound_value(LowerBound::Computed, &instance), 2.0);
    assert_eq!(lower_bound_value(LowerBound::Fixed(1.5), &instance), 1.5);
}

#[test]
fn test_display_lists_nonzero_terms() {
    let instance = three_facilities();
    let cut = cover_cut(&[1], &instance).unwrap();
    let text = cut.to_string();

    assert!(text.contains("y[0]"));
    assert!(!text.contains("y[1]"));
    assert!(text.contains("y[2]"));
}
