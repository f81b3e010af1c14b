//! Quadrix: dense convex optimization built on active-set and simplex methods.
//!
//! The crate solves least-squares shaped quadratic programs
//!
//! ```text
//! minimize    ‖Q x − r‖²
//! subject to  A x = b
//!             C x ≤ d
//! ```
//!
//! together with the linear programs that arise as feasibility subproblems
//! (and that are useful on their own):
//!
//! ```text
//! minimize    fᵀ x
//! subject to  A x = b
//!             C x ≤ d
//! ```
//!
//! # Algorithm
//!
//! Equality constraints are eliminated up front: a particular solution
//! `x_eq` of `A x = b` and an orthonormal basis `Z` of `ker(A)` are
//! extracted from a rank-revealing factorization (SVD or column-pivoted
//! QR, see [`linalg::Factorization`]), and the problem is restated in the
//! lower-dimensional variable `y` with `x = x_eq + Z y`. The quadratic
//! program is then solved by an **active-set method**: at each iterate a
//! step is computed inside the kernel of the currently active constraint
//! rows, a line search picks up the first blocking constraint, and
//! Lagrange multipliers decide which active constraints to release. The
//! linear program is solved by a dense **tableau simplex** with slack and
//! artificial variables, using either the two-phase method or a big-M
//! penalty for feasibility.
//!
//! All matrices are dense `faer` matrices over a caller-chosen real
//! scalar (`f64` or `f32`).
//!
//! # Example
//!
//! ```
//! use faer::{col, mat, Col};
//! use quadrix::qp::Solver;
//!
//! // minimize |x1 + x2 - 5|^2  s.t.  x1 - x2 = 10,  x1 + 4 x2 <= 0
//! let q = mat![[1.0, 1.0]];
//! let r = col![5.0];
//! let mut solver = Solver::with_objective(q.as_ref(), r.as_ref(), 1e-9);
//!
//! let a = mat![[1.0, -1.0]];
//! let b = col![10.0];
//! let c = mat![[1.0, 4.0]];
//! let d = col![0.0];
//! assert!(solver.set_constraints(a.as_ref(), b.as_ref(), c.as_ref(), d.as_ref()));
//!
//! let mut x: Col<f64> = Col::zeros(2);
//! assert!(solver.solve(&mut x));
//! assert!((x[0] - 7.5).abs() < 1e-6);
//! assert!((x[1] + 2.5).abs() < 1e-6);
//! ```

#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]

pub mod linalg;
pub mod qp;
pub mod simplex;

use faer::traits::RealField;
use num_traits::Float;

/// Scalar type the solvers are generic over.
///
/// Implemented for every type that is both a `faer` real field (so the
/// dense kernels and factorizations apply) and a `num_traits` float (so
/// ordinary `Copy` arithmetic and comparisons apply). In practice this
/// means `f32` and `f64`.
pub trait Scalar: RealField + Float {}
impl<T: RealField + Float> Scalar for T {}

/// The zero test every tolerance comparison goes through.
pub(crate) fn is_almost_zero<S: Scalar>(x: S, tol: S) -> bool {
    Float::abs(x) <= tol
}

pub use linalg::Factorization;
pub use linalg::projection::{qr_projection, svd_projection};
pub use qp::Solver;
pub use simplex::{LpError, SimplexOptions};
