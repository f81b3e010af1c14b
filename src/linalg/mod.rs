//! Rank-revealing dense linear algebra shared by the simplex and
//! active-set cores.
//!
//! The solvers need three capabilities beyond plain matrix products:
//! a least-squares solve that stays finite on rank-deficient and wide
//! systems, an orthonormal kernel basis, and a combined "particular
//! solution plus kernel" projection for equality constraints (see
//! [`projection`]). Each capability has an SVD-backed and a column-pivoted
//! QR-backed implementation, selected through [`Factorization`]; faer's
//! own `solve_lstsq` is not used because it neither truncates by numerical
//! rank nor accepts underdetermined systems.

pub mod projection;

use faer::linalg::solvers::{ColPivQr, Svd};
use faer::traits::math_utils;
use faer::{Col, ColRef, Mat, MatRef};
use num_traits::Float;

use crate::Scalar;

/// Which rank-revealing factorization backs kernel extraction and
/// least-squares solves.
///
/// The SVD is the more robust choice on rank-deficient or badly scaled
/// inputs and yields minimum-norm least-squares solutions. Column-pivoted
/// QR is cheaper and adequate when the constraint matrices are
/// well-conditioned; its least-squares solutions are basic (zeros in the
/// non-pivot coordinates) rather than minimum-norm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Factorization {
    /// Singular value decomposition.
    #[default]
    Svd,
    /// Column-pivoted QR.
    ColPivQr,
}

impl Factorization {
    /// Least-squares solution of `a x = b`.
    pub(crate) fn lstsq<S: Scalar>(self, a: MatRef<'_, S>, b: ColRef<'_, S>) -> Col<S> {
        match self {
            Factorization::Svd => svd_lstsq(a, b),
            Factorization::ColPivQr => qr_lstsq(a, b),
        }
    }

    /// Orthonormal basis of `ker(a)`, with zero columns when `a` has full
    /// column rank.
    pub(crate) fn kernel<S: Scalar>(self, a: MatRef<'_, S>) -> Mat<S> {
        match self {
            Factorization::Svd => svd_kernel(a),
            Factorization::ColPivQr => qr_kernel(a),
        }
    }

    /// Particular solution and kernel basis for `a x = b`.
    pub(crate) fn projection<S: Scalar>(
        self,
        a: MatRef<'_, S>,
        b: ColRef<'_, S>,
    ) -> (Col<S>, Mat<S>) {
        match self {
            Factorization::Svd => projection::svd_projection(a, b),
            Factorization::ColPivQr => projection::qr_projection(a, b),
        }
    }
}

/// Computes the SVD, treating a convergence failure as fatal.
pub(crate) fn svd<S: Scalar>(a: MatRef<'_, S>) -> Svd<S> {
    match Svd::new(a) {
        Ok(f) => f,
        Err(_) => panic!(
            "SVD failed to converge on a {}x{} matrix",
            a.nrows(),
            a.ncols()
        ),
    }
}

/// Numerical rank from the singular values, using the conventional
/// `eps * max(m, n) * s_max` cutoff.
pub(crate) fn svd_rank<S: Scalar>(f: &Svd<S>, nrows: usize, ncols: usize) -> usize {
    let size = Ord::min(nrows, ncols);
    if size == 0 {
        return 0;
    }
    let smax = f.S()[0];
    if !(smax > S::zero()) {
        return 0;
    }
    let dim = math_utils::from_f64::<S>(Ord::max(nrows, ncols) as f64);
    let cutoff = math_utils::eps::<S>() * dim * smax;
    (0..size).take_while(|&i| f.S()[i] > cutoff).count()
}

/// Numerical rank from the diagonal of the pivoted `R` factor.
pub(crate) fn qr_rank<S: Scalar>(f: &ColPivQr<S>, nrows: usize, ncols: usize) -> usize {
    let r = f.thin_R();
    let size = r.nrows();
    if size == 0 {
        return 0;
    }
    let rmax = Float::abs(*r.get(0, 0));
    if !(rmax > S::zero()) {
        return 0;
    }
    let dim = math_utils::from_f64::<S>(Ord::max(nrows, ncols) as f64);
    let cutoff = math_utils::eps::<S>() * dim * rmax;
    (0..size)
        .take_while(|&i| Float::abs(*r.get(i, i)) > cutoff)
        .count()
}

/// Minimum-norm least-squares solution of `a x = b` from a precomputed
/// full SVD.
pub(crate) fn svd_lstsq_factored<S: Scalar>(
    f: &Svd<S>,
    rank: usize,
    nrows: usize,
    ncols: usize,
    b: ColRef<'_, S>,
) -> Col<S> {
    let u = f.U();
    let v = f.V();
    let mut x = Col::zeros(ncols);
    for i in 0..rank {
        let mut coef = S::zero();
        for k in 0..nrows {
            coef = coef + *u.get(k, i) * b[k];
        }
        coef = coef / f.S()[i];
        for k in 0..ncols {
            x[k] = x[k] + coef * *v.get(k, i);
        }
    }
    x
}

/// Minimum-norm least-squares solution of `a x = b` via the SVD.
pub(crate) fn svd_lstsq<S: Scalar>(a: MatRef<'_, S>, b: ColRef<'_, S>) -> Col<S> {
    let f = svd(a);
    let rank = svd_rank(&f, a.nrows(), a.ncols());
    svd_lstsq_factored(&f, rank, a.nrows(), a.ncols(), b)
}

/// Basic least-squares solution of `a x = b` via column-pivoted QR.
///
/// With `A Π = Q R` and numerical rank `k`, solves the leading `k × k`
/// triangular system and scatters the result through the pivot
/// permutation; non-pivot coordinates stay zero.
pub(crate) fn qr_lstsq<S: Scalar>(a: MatRef<'_, S>, b: ColRef<'_, S>) -> Col<S> {
    let (m, n) = (a.nrows(), a.ncols());
    let f = ColPivQr::new(a);
    let rank = qr_rank(&f, m, n);
    let mut x = Col::zeros(n);
    if rank == 0 {
        return x;
    }

    let q = f.compute_thin_Q();
    let mut z = Col::zeros(rank);
    for i in 0..rank {
        for k in 0..m {
            z[i] = z[i] + q[(k, i)] * b[k];
        }
    }

    let r = f.thin_R();
    for i in (0..rank).rev() {
        let mut v = z[i];
        for j in i + 1..rank {
            v = v - *r.get(i, j) * z[j];
        }
        z[i] = v / *r.get(i, i);
    }

    let (fwd, _) = f.P().arrays();
    for k in 0..rank {
        x[fwd[k]] = z[k];
    }
    x
}

/// Orthonormal kernel basis of `a` from the trailing right singular
/// vectors.
pub(crate) fn svd_kernel<S: Scalar>(a: MatRef<'_, S>) -> Mat<S> {
    let f = svd(a);
    let rank = svd_rank(&f, a.nrows(), a.ncols());
    f.V().get(.., rank..).to_owned()
}

/// Orthonormal kernel basis of `a` from the trailing columns of the
/// orthogonal factor of `pivoted_qr(aᵀ)`.
pub(crate) fn qr_kernel<S: Scalar>(a: MatRef<'_, S>) -> Mat<S> {
    let at = a.transpose().to_owned();
    let f = ColPivQr::new(at.as_ref());
    let rank = qr_rank(&f, at.nrows(), at.ncols());
    let q = f.compute_Q();
    q.get(.., rank..).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::{col, mat};

    #[test]
    fn svd_lstsq_consistent_square() {
        let a = mat![[2.0, 0.0], [0.0, 4.0]];
        let b = col![2.0, 8.0];
        let x = svd_lstsq(a.as_ref(), b.as_ref());
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn svd_lstsq_is_minimum_norm_on_wide_systems() {
        // x1 + x2 = 2 has minimum-norm solution (1, 1).
        let a = mat![[1.0, 1.0]];
        let b = col![2.0];
        let x = svd_lstsq(a.as_ref(), b.as_ref());
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn qr_lstsq_minimizes_the_residual() {
        // Overdetermined and consistent.
        let a = mat![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let b = col![1.0, 2.0, 3.0];
        let x = qr_lstsq(a.as_ref(), b.as_ref());
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn qr_lstsq_handles_rank_deficiency() {
        // Two identical rows; any solution with x1 + x2 = 3 is optimal.
        let a = mat![[1.0, 1.0], [1.0, 1.0]];
        let b = col![3.0, 3.0];
        let x = qr_lstsq(a.as_ref(), b.as_ref());
        assert!((x[0] + x[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn kernels_annihilate_the_matrix() {
        let a = mat![[1.0, 2.0, 3.0]];
        for fact in [Factorization::Svd, Factorization::ColPivQr] {
            let z = fact.kernel(a.as_ref());
            assert_eq!(z.nrows(), 3);
            assert_eq!(z.ncols(), 2);
            let az = &a * &z;
            for j in 0..2 {
                assert!(az[(0, j)].abs() < 1e-12);
            }
            // Columns are orthonormal.
            let zt = z.transpose().to_owned();
            let ztz = &zt * &z;
            for i in 0..2 {
                for j in 0..2 {
                    let want = if i == j { 1.0 } else { 0.0 };
                    assert!((ztz[(i, j)] - want).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn full_column_rank_has_empty_kernel() {
        let a = mat![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        for fact in [Factorization::Svd, Factorization::ColPivQr] {
            let z = fact.kernel(a.as_ref());
            assert_eq!(z.nrows(), 2);
            assert_eq!(z.ncols(), 0);
        }
    }
}
