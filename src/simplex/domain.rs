//! Variable-sign deduction and the nonnegative-variable transform.
//!
//! The tableau simplex requires every working variable to be nonnegative.
//! Single-variable rows of the constraint matrix are scanned for implied
//! sign restrictions, and a transform `T` is built such that `x = T w`
//! with `w ≥ 0`: one `+1` column per variable that may be positive, one
//! `−1` column per variable that may be negative.

use faer::{ColRef, Mat, MatRef};

use super::LpError;
use crate::Scalar;

/// Sign information deduced for one decision variable.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct VariableDomain {
    pub non_negative: bool,
    pub non_positive: bool,
    /// Constraint row the most recent deduction came from.
    pub row: usize,
}

/// Scans rows of `c` with a single nonzero entry for sign restrictions.
///
/// A row `γ·x_j ≤ δ` with `γ < 0, δ ≤ 0` implies `x_j ≥ 0`; with
/// `γ > 0, δ ≤ 0` it implies `x_j ≤ 0`. A non-negativity deduction
/// followed by a non-positivity deduction on the same variable is
/// rejected as contradictory.
pub(crate) fn deduce_domains<S: Scalar>(
    c: MatRef<'_, S>,
    d: ColRef<'_, S>,
    tol: S,
) -> Result<Vec<VariableDomain>, LpError> {
    let zero = |v: S| crate::is_almost_zero(v, tol);
    let (m, n) = (c.nrows(), c.ncols());
    let mut domains = vec![VariableDomain::default(); n];

    for row in 0..m {
        // Look for the single nonzero entry of this row, if any.
        let mut nzcol = None;
        let mut multiple = false;
        for col in 0..n {
            if !zero(*c.get(row, col)) {
                if nzcol.is_none() {
                    nzcol = Some(col);
                } else {
                    multiple = true;
                    break;
                }
            }
        }
        if multiple {
            continue;
        }

        // A row of zeros means a constraint of the form 0·x ≤ d; callers
        // filter those out, so hitting one here is a degenerate problem.
        let Some(col) = nzcol else {
            return Err(LpError::Infeasible(format!(
                "the constraint matrix has row {row} filled with zeros: the problem is degenerate"
            )));
        };

        let gamma = *c.get(row, col);
        let delta = d[row];
        if gamma < S::zero() && delta <= S::zero() {
            log::trace!("variable {col} has a non-negativity constraint (row {row})");
            domains[col].non_negative = true;
            domains[col].row = row;
        }
        if gamma > S::zero() && delta <= S::zero() {
            if domains[col].non_negative {
                return Err(LpError::Infeasible(format!(
                    "variable {col} has both a non-negativity constraint (row {}) and a \
                     non-positivity constraint (row {row})",
                    domains[col].row
                )));
            }
            log::trace!("variable {col} has a non-positivity constraint (row {row})");
            domains[col].non_positive = true;
            domains[col].row = row;
        }
    }

    Ok(domains)
}

/// Builds the transform `T` with `x = T w`, `w ≥ 0`, from deduced domains.
pub(crate) fn transform_from_domains<S: Scalar>(domains: &[VariableDomain]) -> Mat<S> {
    let n = domains.len();
    let nv: usize = domains
        .iter()
        .map(|dom| usize::from(!dom.non_negative) + usize::from(!dom.non_positive))
        .sum();

    let mut t = Mat::zeros(n, nv);
    let mut col = 0;
    for (i, dom) in domains.iter().enumerate() {
        if !dom.non_positive {
            t[(i, col)] = S::one();
            col += 1;
        }
        if !dom.non_negative {
            t[(i, col)] = -S::one();
            col += 1;
        }
    }
    debug_assert_eq!(col, nv);
    t
}

/// Deduces domains and returns the resulting transform in one step.
pub(crate) fn transformation_matrix<S: Scalar>(
    c: MatRef<'_, S>,
    d: ColRef<'_, S>,
    tol: S,
) -> Result<Mat<S>, LpError> {
    let domains = deduce_domains(c, d, tol)?;
    Ok(transform_from_domains::<S>(&domains))
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::{col, mat};

    const TOL: f64 = 1e-9;

    #[test]
    fn free_variables_split_into_two_columns() {
        // No single-variable rows: both variables stay free.
        let c = mat![[1.0, 1.0], [1.0, -1.0]];
        let d = col![1.0, 1.0];
        let t = transformation_matrix(c.as_ref(), d.as_ref(), TOL).unwrap();
        assert_eq!(t.nrows(), 2);
        assert_eq!(t.ncols(), 4);
        assert_eq!(t[(0, 0)], 1.0);
        assert_eq!(t[(0, 1)], -1.0);
        assert_eq!(t[(1, 2)], 1.0);
        assert_eq!(t[(1, 3)], -1.0);
    }

    #[test]
    fn nonnegativity_is_deduced_from_single_variable_rows() {
        // -x1 <= 0 pins x1 >= 0; x2 stays free.
        let c = mat![[-1.0, 0.0], [1.0, 1.0]];
        let d = col![0.0, 2.0];
        let domains = deduce_domains(c.as_ref(), d.as_ref(), TOL).unwrap();
        assert!(domains[0].non_negative);
        assert!(!domains[0].non_positive);
        assert!(!domains[1].non_negative);

        let t = transform_from_domains::<f64>(&domains);
        assert_eq!(t.ncols(), 3);
        assert_eq!(t[(0, 0)], 1.0);
    }

    #[test]
    fn nonpositivity_is_deduced_from_single_variable_rows() {
        // x1 <= -1 pins x1 <= 0.
        let c = mat![[1.0, 0.0]];
        let d = col![-1.0];
        let domains = deduce_domains(c.as_ref(), d.as_ref(), TOL).unwrap();
        assert!(domains[0].non_positive);

        let t = transform_from_domains::<f64>(&domains);
        // x1 contributes a single -1 column, x2 two columns.
        assert_eq!(t.ncols(), 3);
        assert_eq!(t[(0, 0)], -1.0);
    }

    #[test]
    fn positive_rhs_rows_imply_nothing() {
        // x1 <= 3 does not restrict the sign of x1.
        let c = mat![[1.0]];
        let d = col![3.0];
        let domains = deduce_domains(c.as_ref(), d.as_ref(), TOL).unwrap();
        assert!(!domains[0].non_negative);
        assert!(!domains[0].non_positive);
    }

    #[test]
    fn contradictory_domains_are_rejected() {
        // -x1 <= -1 (x1 >= 1) then x1 <= -1: contradiction.
        let c = mat![[-1.0], [1.0]];
        let d = col![-1.0, -1.0];
        let err = deduce_domains(c.as_ref(), d.as_ref(), TOL).unwrap_err();
        assert!(matches!(err, LpError::Infeasible(_)));
    }

    #[test]
    fn zero_rows_are_degenerate() {
        let c = mat![[0.0, 0.0]];
        let d = col![1.0];
        let err = deduce_domains(c.as_ref(), d.as_ref(), TOL).unwrap_err();
        assert!(matches!(err, LpError::Infeasible(_)));
    }
}
