//! Dense simplex tableau: construction, pivoting, and the feasibility
//! drivers.
//!
//! The tableau has one row per constraint plus a bottom objective row.
//! Columns are laid out as `[working | slack | artificial | rhs]`. Rows
//! with a nonnegative right-hand side get a slack basic variable; rows
//! with a negative right-hand side are negated and get an artificial
//! basic variable that phase one (or the big-M penalty) must drive to
//! zero.

use faer::{ColRef, Mat, MatRef};

use super::LpError;
use crate::Scalar;

/// Builds the upper portion of the tableau and the initial basis.
///
/// Returns the `(m+1) × (n + m + n_a + 1)` tableau (bottom row zeroed)
/// and the basic-variable column index for each constraint row.
pub(crate) fn create_tableau<S: Scalar>(
    c: MatRef<'_, S>,
    d: ColRef<'_, S>,
) -> (Mat<S>, Vec<usize>) {
    let (m, n) = (c.nrows(), c.ncols());

    // One artificial variable per negative right-hand side.
    let na = (0..m).filter(|&i| d[i] < S::zero()).count();
    log::trace!("tableau uses {na} artificial variables");

    let dcol = n + m + na;
    let mut tab = Mat::zeros(m + 1, dcol + 1);
    let mut basic = vec![0usize; m];

    let mut ia = 0;
    for i in 0..m {
        if d[i] < S::zero() {
            basic[i] = n + m + ia;
            for j in 0..n {
                tab[(i, j)] = -*c.get(i, j);
            }
            tab[(i, n + i)] = -S::one();
            tab[(i, n + m + ia)] = S::one();
            tab[(i, dcol)] = -d[i];
            ia += 1;
        } else {
            basic[i] = n + i;
            for j in 0..n {
                tab[(i, j)] = *c.get(i, j);
            }
            tab[(i, n + i)] = S::one();
            tab[(i, dcol)] = d[i];
        }
    }

    (tab, basic)
}

/// One step of Gaussian elimination on the upper rows of the tableau.
///
/// Normalizes the leaving row by the pivot element, then clears the
/// entering column from every other constraint row. The bottom row is
/// left untouched; callers update it explicitly when they need to.
pub(crate) fn pivot<S: Scalar>(tab: &mut Mat<S>, enter: usize, leave: usize) {
    let rows = tab.nrows();
    let cols = tab.ncols();

    let inv = S::one() / tab[(leave, enter)];
    for j in 0..cols {
        tab[(leave, j)] = tab[(leave, j)] * inv;
    }

    for row in 0..rows - 1 {
        if row == leave {
            continue;
        }
        let factor = tab[(row, enter)];
        for j in 0..cols {
            tab[(row, j)] = tab[(row, j)] - factor * tab[(leave, j)];
        }
    }
}

/// Clears the bottom-row coefficient of every basic variable.
pub(crate) fn eliminate_objective<S: Scalar>(tab: &mut Mat<S>, basic: &[usize]) {
    let m = tab.nrows() - 1;
    let cols = tab.ncols();
    for (i, &bv) in basic.iter().enumerate() {
        let weight = tab[(m, bv)];
        for j in 0..cols {
            tab[(m, j)] = tab[(m, j)] - weight * tab[(i, j)];
        }
    }
}

/// Runs simplex pivoting until all bottom-row coefficients are
/// nonnegative.
///
/// The entering column is the first one attaining the most negative
/// bottom-row coefficient; the leaving row is the first one attaining the
/// minimum ratio. Fails with [`LpError::Unbounded`] when no row limits
/// the entering variable.
pub(crate) fn run_simplex<S: Scalar>(
    tab: &mut Mat<S>,
    basic: &mut [usize],
    tol: S,
) -> Result<(), LpError> {
    let m = tab.nrows() - 1;
    let n = tab.ncols() - 1;

    loop {
        let mut enter = 0;
        let mut min_coef = tab[(m, 0)];
        for j in 1..n {
            if tab[(m, j)] < min_coef {
                min_coef = tab[(m, j)];
                enter = j;
            }
        }
        if !(min_coef < -tol) {
            return Ok(());
        }

        let mut leave = None;
        let mut min_ratio = S::zero();
        for row in 0..m {
            if tab[(row, enter)] > tol {
                let ratio = tab[(row, n)] / tab[(row, enter)];
                if leave.is_none() || ratio < min_ratio {
                    leave = Some(row);
                    min_ratio = ratio;
                }
            }
        }
        let Some(leave) = leave else {
            return Err(LpError::Unbounded(
                "no positive coefficient found in the tableau for the entering variable: \
                 the problem is unbounded"
                    .into(),
            ));
        };
        log::trace!("pivot: entering column {enter}, leaving row {leave}");

        basic[leave] = enter;
        pivot(tab, enter, leave);

        // Nullify the objective weight of the new basic variable.
        let weight = tab[(m, enter)];
        for j in 0..=n {
            tab[(m, j)] = tab[(m, j)] - weight * tab[(leave, j)];
        }
    }
}

/// Two-phase driver: drive the artificials to zero, then optimize the
/// true objective with the artificial columns removed.
pub(crate) fn two_phase<S: Scalar>(
    objective: ColRef<'_, S>,
    tab: &mut Mat<S>,
    basic: &mut Vec<usize>,
    na: usize,
    tol: S,
) -> Result<(), LpError> {
    let m = tab.nrows() - 1;
    let nv = tab.ncols() - m - na - 1;

    if na > 0 {
        // Phase one: unit weight on every basic artificial, then pivot the
        // auxiliary objective to zero.
        for i in 0..m {
            if basic[i] >= nv + m {
                tab[(m, basic[i])] = S::one();
            }
        }
        eliminate_objective(tab, &*basic);
        run_simplex(tab, basic, tol)?;
        log::trace!("phase one pivoting completed");

        let last = tab.ncols() - 1;
        for i in 0..m {
            if basic[i] >= nv + m && tab[(i, last)] > tol {
                return Err(LpError::Infeasible(format!(
                    "after phase one, artificial variable a{} is still basic with a nonzero \
                     value",
                    basic[i] - nv - m
                )));
            }
        }

        // Swap any zero-valued basic artificial with a non-basic,
        // non-artificial column having a usable coefficient in its row.
        for i in 0..m {
            if basic[i] < nv + m {
                continue;
            }
            let mut candidate = None;
            for j in 0..nv + m {
                if !basic.contains(&j) && (tab[(i, j)] > tol || tab[(i, j)] < -tol) {
                    candidate = Some(j);
                    break;
                }
            }
            let Some(candidate) = candidate else {
                return Err(LpError::Internal(format!(
                    "after phase one, it was not possible to replace the artificial variable \
                     a{} with a non-basic, non-artificial variable",
                    basic[i] - nv - m
                )));
            };
            log::trace!("swapping artificial basic {} for column {candidate}", basic[i]);
            basic[i] = candidate;
            pivot(tab, candidate, i);
            debug_assert!(
                tab[(i, last)] > -tol,
                "swapping a zero-valued basic artificial produced a negative basic value"
            );
        }

        // Drop the artificial columns by moving the rhs column into their
        // place, then install the phase-two objective.
        for row in 0..=m {
            let v = tab[(row, last)];
            tab[(row, nv + m)] = v;
        }
        tab.truncate(m + 1, nv + m + 1);

        for j in 0..nv {
            tab[(m, j)] = objective[j];
        }
        for j in nv..nv + m + 1 {
            tab[(m, j)] = S::zero();
        }
        eliminate_objective(tab, &*basic);
    } else {
        // No artificials: the initial basis is feasible and entirely made
        // of slacks, so no elimination is needed.
        for j in 0..nv {
            tab[(m, j)] = objective[j];
        }
    }

    run_simplex(tab, basic, tol)
}

/// Big-M driver: optimize the true objective with a `large` penalty on
/// every basic artificial.
pub(crate) fn big_m<S: Scalar>(
    objective: ColRef<'_, S>,
    tab: &mut Mat<S>,
    basic: &mut [usize],
    na: usize,
    tol: S,
    large: S,
) -> Result<(), LpError> {
    let m = tab.nrows() - 1;
    let nv = tab.ncols() - m - na - 1;

    for j in 0..nv {
        tab[(m, j)] = objective[j];
    }
    for i in 0..m {
        if basic[i] >= nv + m {
            tab[(m, basic[i])] = large;
        }
    }
    eliminate_objective(tab, basic);
    run_simplex(tab, basic, tol)?;

    let last = tab.ncols() - 1;
    for i in 0..m {
        if basic[i] >= nv + m && tab[(i, last)] > tol {
            return Err(LpError::Infeasible(format!(
                "after pivoting, artificial variable a{} is still basic with a nonzero value",
                basic[i] - nv - m
            )));
        }
    }
    Ok(())
}
