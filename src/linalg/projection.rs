//! Null-space projection for linear equality systems.
//!
//! Given `A x = b`, both routines return a particular solution `x_eq`
//! minimizing `‖A x − b‖` together with an orthonormal basis `Z` of
//! `ker(A)`, so the affine solution set can be parameterized as
//! `x = x_eq + Z y`. When `A` has full column rank the system admits no
//! remaining degrees of freedom and `Z` has zero columns.

use faer::linalg::solvers::ColPivQr;
use faer::{Col, ColRef, Mat, MatRef};

use super::{qr_lstsq, qr_rank, svd, svd_lstsq_factored, svd_rank};
use crate::Scalar;

/// Particular solution and kernel basis of `A x = b` via the SVD.
///
/// `x_eq` is the minimum-norm least-squares solution; `Z` collects the
/// right singular vectors beyond the numerical rank of `A`.
pub fn svd_projection<S: Scalar>(a: MatRef<'_, S>, b: ColRef<'_, S>) -> (Col<S>, Mat<S>) {
    let f = svd(a);
    let rank = svd_rank(&f, a.nrows(), a.ncols());
    let xeq = svd_lstsq_factored(&f, rank, a.nrows(), a.ncols(), b);
    let z = f.V().get(.., rank..).to_owned();
    (xeq, z)
}

/// Particular solution and kernel basis of `A x = b` via column-pivoted
/// QR.
///
/// `x_eq` is a least-squares solution (not necessarily minimum-norm);
/// `Z` collects the trailing columns of the orthogonal factor of
/// `pivoted_qr(Aᵀ)`. Cheaper than [`svd_projection`] and adequate when
/// `A` is well-conditioned.
pub fn qr_projection<S: Scalar>(a: MatRef<'_, S>, b: ColRef<'_, S>) -> (Col<S>, Mat<S>) {
    let xeq = qr_lstsq(a, b);

    let at = a.transpose().to_owned();
    let f = ColPivQr::new(at.as_ref());
    let rank = qr_rank(&f, at.nrows(), at.ncols());
    let q = f.compute_Q();
    let z = q.get(.., rank..).to_owned();
    (xeq, z)
}
