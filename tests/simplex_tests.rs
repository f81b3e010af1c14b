//! End-to-end tests for the simplex linear-programming core.

mod common;

use faer::{col, mat, Col};
use quadrix::simplex::{
    maximize, minimize, minimize_with_equalities, LpError, SimplexOptions,
};

const TOL: f64 = 1e-6;

fn options(big_m: Option<f64>) -> SimplexOptions<f64> {
    SimplexOptions {
        tol: TOL,
        big_m,
        ..SimplexOptions::default()
    }
}

#[test]
fn textbook_example() {
    // min -x1 + x2 over a bounded polygon; the optimal vertex is (5, 2).
    let f = col![-1.0, 1.0];
    let c = mat![
        [-4.0, -1.0],
        [1.0, -4.0],
        [2.0, -1.0],
        [-1.0, 0.0],
        [0.0, -1.0],
    ];
    let d = col![-5.0, -3.0, 8.0, 0.0, 0.0];

    for big_m in [None, Some(1e6)] {
        let x = minimize(f.as_ref(), c.as_ref(), d.as_ref(), &options(big_m)).unwrap();
        assert!((x[0] - 5.0).abs() < 1e-6);
        assert!((x[1] - 2.0).abs() < 1e-6);
    }
}

#[test]
fn maximize_negates_the_objective() {
    // max x1 + x2 s.t. x >= 0, x1 + x2 <= 3.
    let f = col![1.0, 1.0];
    let c = mat![[-1.0, 0.0], [0.0, -1.0], [1.0, 1.0]];
    let d = col![0.0, 0.0, 3.0];

    let xmax = maximize(f.as_ref(), c.as_ref(), d.as_ref(), &options(None)).unwrap();
    assert!((xmax[0] + xmax[1] - 3.0).abs() < 1e-6);

    let neg = col![-1.0, -1.0];
    let xmin = minimize(neg.as_ref(), c.as_ref(), d.as_ref(), &options(None)).unwrap();
    let obj_max = f[0] * xmax[0] + f[1] * xmax[1];
    let obj_min = f[0] * xmin[0] + f[1] * xmin[1];
    assert!((obj_max - obj_min).abs() < 1e-6);
}

#[test]
fn empty_objective_deduces_the_dimension() {
    // Zero objective: any feasible point will do.
    let f: Col<f64> = Col::zeros(0);
    let c = mat![[-1.0, 0.0], [0.0, -1.0], [1.0, 1.0]];
    let d = col![0.0, 0.0, 2.0];
    let x = minimize(f.as_ref(), c.as_ref(), d.as_ref(), &options(None)).unwrap();
    assert_eq!(x.nrows(), 2);
    assert!(x[0] >= -1e-9);
    assert!(x[1] >= -1e-9);
    assert!(x[0] + x[1] <= 2.0 + 1e-9);
}

#[test]
fn no_constraints_is_ill_defined() {
    let f = col![1.0];
    let c: faer::Mat<f64> = faer::Mat::zeros(0, 1);
    let d: Col<f64> = Col::zeros(0);
    let err = minimize(f.as_ref(), c.as_ref(), d.as_ref(), &options(None)).unwrap_err();
    assert!(matches!(err, LpError::IllDefined(_)));
}

#[test]
fn degenerate_rows_are_dropped_or_rejected() {
    // 0 <= 1 is dropped; the rest pins x = (0, 0).
    let f = col![1.0, 1.0];
    let c = mat![[0.0, 0.0], [-1.0, 0.0], [0.0, -1.0], [1.0, 1.0]];
    let d = col![1.0, 0.0, 0.0, 2.0];
    let x = minimize(f.as_ref(), c.as_ref(), d.as_ref(), &options(None)).unwrap();
    assert!(x[0].abs() < 1e-9);
    assert!(x[1].abs() < 1e-9);

    // 0 <= -1 is infeasible outright.
    let c = mat![[0.0, 0.0], [-1.0, 0.0], [0.0, -1.0]];
    let d = col![-1.0, 0.0, 0.0];
    let err = minimize(f.as_ref(), c.as_ref(), d.as_ref(), &options(None)).unwrap_err();
    assert!(matches!(err, LpError::Infeasible(_)));
}

#[test]
fn unbounded_problems_are_reported() {
    // min -x1 with x >= 0 and no upper bound.
    let f = col![-1.0, 0.0];
    let c = mat![[-1.0, 0.0], [0.0, -1.0]];
    let d = col![0.0, 0.0];
    for big_m in [None, Some(1e6)] {
        let err = minimize(f.as_ref(), c.as_ref(), d.as_ref(), &options(big_m)).unwrap_err();
        assert!(matches!(err, LpError::Unbounded(_)));
    }
}

#[test]
fn equalities_reduce_the_problem() {
    // min x1 + 2 x2 + 3 x3 s.t. x1 + x2 + x3 = 3, x >= 0: optimum (3, 0, 0).
    let f = col![1.0, 2.0, 3.0];
    let a = mat![[1.0, 1.0, 1.0]];
    let b = col![3.0];
    let c = mat![[-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]];
    let d = col![0.0, 0.0, 0.0];

    for big_m in [None, Some(1e6)] {
        let x = minimize_with_equalities(
            f.as_ref(),
            a.as_ref(),
            b.as_ref(),
            c.as_ref(),
            d.as_ref(),
            &options(big_m),
        )
        .unwrap();
        assert!((x[0] + x[1] + x[2] - 3.0).abs() < 1e-6);
        let obj = f[0] * x[0] + f[1] * x[1] + f[2] * x[2];
        assert!((obj - 3.0).abs() < 1e-5);
    }
}

#[test]
fn fully_determined_equalities_short_circuit() {
    let f = col![1.0, 1.0];
    let a = mat![[1.0, 0.0], [0.0, 1.0]];
    let b = col![1.0, 2.0];
    let d_ok = col![4.0];
    let c = mat![[1.0, 1.0]];

    let x = minimize_with_equalities(
        f.as_ref(),
        a.as_ref(),
        b.as_ref(),
        c.as_ref(),
        d_ok.as_ref(),
        &options(None),
    )
    .unwrap();
    assert!((x[0] - 1.0).abs() < 1e-9);
    assert!((x[1] - 2.0).abs() < 1e-9);

    // Same equalities, but the pinned point violates the inequality.
    let d_bad = col![2.0];
    let err = minimize_with_equalities(
        f.as_ref(),
        a.as_ref(),
        b.as_ref(),
        c.as_ref(),
        d_bad.as_ref(),
        &options(None),
    )
    .unwrap_err();
    assert!(matches!(err, LpError::Infeasible(_)));
}

#[test]
fn infeasible_equalities_are_reported() {
    let f = col![1.0, 1.0];
    let a = mat![[1.0, 0.0], [1.0, 0.0]];
    let b = col![1.0, 2.0];
    let c = mat![[1.0, 1.0]];
    let d = col![10.0];
    let err = minimize_with_equalities(
        f.as_ref(),
        a.as_ref(),
        b.as_ref(),
        c.as_ref(),
        d.as_ref(),
        &options(None),
    )
    .unwrap_err();
    assert!(matches!(err, LpError::Infeasible(_)));
}

#[test]
fn negative_optima_survive_the_variable_split() {
    // min x1 with 5 >= x1 >= -3 and no sign restriction.
    let f = col![1.0];
    let c = mat![[1.0], [-1.0]];
    let d = col![5.0, 3.0];
    for big_m in [None, Some(1e6)] {
        let x = minimize(f.as_ref(), c.as_ref(), d.as_ref(), &options(big_m)).unwrap();
        assert!((x[0] + 3.0).abs() < 1e-6);
    }
}

#[test]
fn fixture_suite_two_phase_and_big_m() {
    let paths = common::fixture_paths("lp_");
    assert_eq!(paths.len(), 204, "the LP fixture corpus has 204 cases");
    for path in paths {
        let fixture = common::load_lp(&path);
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        for big_m in [None, Some(1e6)] {
            let result = if fixture.a.nrows() > 0 {
                minimize_with_equalities(
                    fixture.f.as_ref(),
                    fixture.a.as_ref(),
                    fixture.b.as_ref(),
                    fixture.c.as_ref(),
                    fixture.d.as_ref(),
                    &options(big_m),
                )
            } else {
                minimize(
                    fixture.f.as_ref(),
                    fixture.c.as_ref(),
                    fixture.d.as_ref(),
                    &options(big_m),
                )
            };

            assert_eq!(
                fixture.feasible,
                result.is_ok(),
                "{name} (big_m {big_m:?}): feasibility mismatch: {result:?}"
            );

            let Ok(x) = result else { continue };
            assert_eq!(x.nrows(), fixture.x.nrows(), "{name}: dimension mismatch");

            let mut obj = 0.0;
            let mut obj_expected = 0.0;
            for i in 0..x.nrows() {
                obj += fixture.f[i] * x[i];
                obj_expected += fixture.f[i] * fixture.x[i];
            }
            let ftol = f64::max(TOL * obj_expected.abs(), TOL);
            assert!(
                (obj - obj_expected).abs() < ftol,
                "{name} (big_m {big_m:?}): objective {obj} does not match expected {obj_expected}"
            );
        }
    }
}
