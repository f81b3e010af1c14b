//! Simplex-based linear programming.
//!
//! Solves problems of the form
//!
//! ```text
//! minimize    fᵀ x
//! subject to  A x = b   (optional)
//!             C x ≤ d
//! ```
//!
//! Equality constraints are eliminated by a null-space projection (see
//! [`crate::linalg::projection`]); the remaining inequality-only problem
//! is brought to standard form by deducing variable signs, splitting
//! unrestricted variables, and adding slack and artificial variables, and
//! is then solved by dense tableau pivoting. Feasibility is established
//! either by the two-phase method or by a big-M penalty, selected through
//! [`SimplexOptions::big_m`].

pub(crate) mod domain;
pub(crate) mod tableau;

use faer::traits::math_utils;
use faer::{Col, ColRef, Mat, MatRef};
use thiserror::Error;

use crate::linalg::Factorization;
use crate::Scalar;

/// Reasons a simplex solve can halt without an optimal solution.
#[derive(Debug, Error)]
pub enum LpError {
    /// The constraint set admits no feasible point.
    #[error("infeasible problem: {0}")]
    Infeasible(String),

    /// The objective decreases without bound over the feasible set.
    #[error("unbounded problem: {0}")]
    Unbounded(String),

    /// The problem statement itself is ill-defined.
    #[error("ill-defined problem: {0}")]
    IllDefined(String),

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Options controlling a simplex solve.
#[derive(Debug, Clone, Copy)]
pub struct SimplexOptions<S> {
    /// Positive tolerance below which values are treated as zero.
    pub tol: S,

    /// Penalty weight for artificial variables. `None` selects the
    /// two-phase method; `Some(m)` selects the big-M method with penalty
    /// `m`, which should be several orders of magnitude larger than the
    /// objective and constraint coefficients.
    pub big_m: Option<S>,

    /// Factorization used to eliminate equality constraints.
    pub factorization: Factorization,
}

impl<S: Scalar> Default for SimplexOptions<S> {
    fn default() -> Self {
        Self {
            tol: math_utils::from_f64::<S>(1e-9),
            big_m: None,
            factorization: Factorization::default(),
        }
    }
}

impl<S: Scalar> SimplexOptions<S> {
    /// Options with the given tolerance and the two-phase method.
    pub fn with_tol(tol: S) -> Self {
        Self {
            tol,
            ..Self::default()
        }
    }
}

/// Minimizes `fᵀ x` subject to `C x ≤ d`.
///
/// An empty `f` stands for a zero objective; the decision dimension is
/// then deduced from `C`. Rows of `C` that are entirely zero within the
/// tolerance are dropped when their right-hand side is nonnegative and
/// reported as infeasible otherwise. A problem with no constraint rows is
/// ill-defined, since nothing bounds the decision variables.
pub fn minimize<S: Scalar>(
    f: ColRef<'_, S>,
    c: MatRef<'_, S>,
    d: ColRef<'_, S>,
    opts: &SimplexOptions<S>,
) -> Result<Col<S>, LpError> {
    assert!(opts.tol > S::zero(), "the tolerance must be positive");

    // An empty objective stands for all zeros; the decision dimension is
    // then read off the constraint matrix.
    let n;
    let f = if f.nrows() == 0 {
        n = c.ncols();
        assert!(n > 0, "the problem does not have any variable");
        Col::zeros(n)
    } else {
        n = f.nrows();
        f.to_owned()
    };
    assert_eq!(
        c.nrows(),
        d.nrows(),
        "C matrix and d vector have a different number of rows"
    );
    assert_eq!(c.ncols(), n, "C matrix has the wrong number of columns");

    if c.nrows() == 0 {
        return Err(LpError::IllDefined(
            "no constraints given, the problem is ill-defined".into(),
        ));
    }

    // Drop degenerate rows 0·x ≤ d_i with d_i ≥ 0; flag those with a
    // negative right-hand side as infeasible.
    let mut kept_c: Mat<S> = Mat::zeros(c.nrows(), n);
    let mut kept_d: Col<S> = Col::zeros(c.nrows());
    let mut m = 0;
    for i in 0..c.nrows() {
        let zero_row = (0..n).all(|j| crate::is_almost_zero(*c.get(i, j), opts.tol));
        if !zero_row {
            for j in 0..n {
                kept_c[(m, j)] = *c.get(i, j);
            }
            kept_d[m] = d[i];
            m += 1;
        } else if d[i] < S::zero() {
            return Err(LpError::Infeasible(format!(
                "found infeasible degenerate constraint (row {i})"
            )));
        }
    }
    kept_c.truncate(m, n);
    kept_d.truncate(m);
    if m < c.nrows() {
        log::debug!("dropped {} degenerate constraint rows", c.nrows() - m);
    }

    // Bring the problem to standard form: x = T w with w ≥ 0.
    let t = domain::transformation_matrix(kept_c.as_ref(), kept_d.as_ref(), opts.tol)?;
    let tt = t.transpose().to_owned();
    let fs: Col<S> = &tt * &f;
    let cs: Mat<S> = &kept_c * &t;
    let nv = t.ncols();

    let (mut tab, mut basic) = tableau::create_tableau(cs.as_ref(), kept_d.as_ref());
    let na = tab.ncols() - nv - m - 1;
    log::debug!(
        "simplex tableau: {m} constraints, {nv} working variables, {na} artificials"
    );

    match opts.big_m {
        Some(large) => tableau::big_m(fs.as_ref(), &mut tab, &mut basic, na, opts.tol, large)?,
        None => tableau::two_phase(fs.as_ref(), &mut tab, &mut basic, na, opts.tol)?,
    }

    // Read the working variables off the basis and map back to x.
    let last = tab.ncols() - 1;
    let mut w: Col<S> = Col::zeros(nv);
    for (i, &bv) in basic.iter().enumerate() {
        if bv < nv {
            w[bv] = tab[(i, last)];
        }
    }
    let x: Col<S> = &t * &w;

    debug_assert!(
        {
            let residual = &(&kept_c * &x) - &kept_d;
            (0..m).all(|i| residual[i] <= opts.tol)
        },
        "simplex reported success but the solution violates the constraints"
    );
    Ok(x)
}

/// Minimizes `fᵀ x` subject to `A x = b` and `C x ≤ d`.
///
/// The equalities are eliminated through a particular solution `x_eq` and
/// a kernel basis `Z`, and the reduced problem
/// `min (Zᵀf)ᵀ y  s.t.  (C Z) y ≤ d − C x_eq` is handed to [`minimize`].
/// When the equalities fully determine the decision vector, `x_eq` is
/// returned directly provided it satisfies the inequalities.
pub fn minimize_with_equalities<S: Scalar>(
    f: ColRef<'_, S>,
    a: MatRef<'_, S>,
    b: ColRef<'_, S>,
    c: MatRef<'_, S>,
    d: ColRef<'_, S>,
    opts: &SimplexOptions<S>,
) -> Result<Col<S>, LpError> {
    assert!(opts.tol > S::zero(), "the tolerance must be positive");
    let n = c.ncols();
    assert_eq!(a.ncols(), n, "A matrix has the wrong number of columns");
    assert_eq!(
        a.nrows(),
        b.nrows(),
        "A matrix and b vector have a different number of rows"
    );

    let f = if f.nrows() == 0 {
        Col::zeros(n)
    } else {
        assert_eq!(f.nrows(), n, "objective vector has the wrong length");
        f.to_owned()
    };

    let (xeq, z) = opts.factorization.projection(a, b);

    // If A x = b has no exact solution, xeq only minimizes the residual,
    // which cannot be accepted here.
    let residual = &(a * &xeq) - &b.to_owned();
    if residual.norm_l2() > opts.tol {
        return Err(LpError::Infeasible(
            "equality constraints are infeasible".into(),
        ));
    }
    log::debug!("equality elimination leaves {} degrees of freedom", z.ncols());

    if z.ncols() == 0 {
        // The equalities fully determine x; the inequalities can only
        // accept or reject it.
        let slack = &(c * &xeq) - &d.to_owned();
        for i in 0..slack.nrows() {
            if slack[i] > opts.tol {
                return Err(LpError::Infeasible(format!(
                    "the solution is fully determined by the equality constraints but \
                     violates inequality {i}"
                )));
            }
        }
        return Ok(xeq);
    }

    // Reduced problem in the kernel coordinates.
    let zt = z.transpose().to_owned();
    let fy: Col<S> = &zt * &f;
    let cy: Mat<S> = c * &z;
    let dy: Col<S> = &d.to_owned() - &(c * &xeq);

    let y = minimize(fy.as_ref(), cy.as_ref(), dy.as_ref(), opts)?;
    Ok(&xeq + &(&z * &y))
}

/// Maximizes `fᵀ x` subject to `C x ≤ d`.
///
/// Dispatches to [`minimize`] on the negated objective.
pub fn maximize<S: Scalar>(
    f: ColRef<'_, S>,
    c: MatRef<'_, S>,
    d: ColRef<'_, S>,
    opts: &SimplexOptions<S>,
) -> Result<Col<S>, LpError> {
    let neg = negated(f);
    minimize(neg.as_ref(), c, d, opts)
}

/// Maximizes `fᵀ x` subject to `A x = b` and `C x ≤ d`.
///
/// Dispatches to [`minimize_with_equalities`] on the negated objective.
pub fn maximize_with_equalities<S: Scalar>(
    f: ColRef<'_, S>,
    a: MatRef<'_, S>,
    b: ColRef<'_, S>,
    c: MatRef<'_, S>,
    d: ColRef<'_, S>,
    opts: &SimplexOptions<S>,
) -> Result<Col<S>, LpError> {
    let neg = negated(f);
    minimize_with_equalities(neg.as_ref(), a, b, c, d, opts)
}

fn negated<S: Scalar>(f: ColRef<'_, S>) -> Col<S> {
    Col::from_fn(f.nrows(), |i| -f[i])
}
