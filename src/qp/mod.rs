//! Active-set quadratic programming.
//!
//! [`Solver`] minimizes `‖Q x − r‖²` subject to `A x = b` and `C x ≤ d`.
//! Equality constraints are removed once per constraint change through a
//! null-space projection `x = x_eq + Z y`, reducing the problem to
//!
//! ```text
//! minimize    ‖Q_y y − r_y‖²
//! subject to  C_y y ≤ d_y
//! ```
//!
//! with `Q_y = Q Z`, `r_y = r − Q x_eq`, `C_y = C Z`,
//! `d_y = d − C x_eq`. The reduced problem is solved by the active-set
//! iteration in [`active_set`]; the simplex core supplies feasible
//! starting points. Re-supplying inequalities of unchanged dimension
//! preserves the active set and the current iterate, which lets sequences
//! of similar problems warm-start each other.

mod active_set;

use faer::{Col, ColRef, Mat, MatRef};
use num_traits::Float;

use crate::linalg::Factorization;
use crate::Scalar;

/// Active-set solver for least-squares shaped quadratic programs.
///
/// The solver owns the problem data and all reduced matrices derived from
/// it. Constraint updates recompute the reduced data eagerly, so `solve`
/// touches nothing but the iterate and the active set. If a constraint
/// update reports infeasibility the constraints are cleared and the
/// solver falls back to the unconstrained least-squares problem on
/// `(Q, r)`.
#[derive(Debug, Clone)]
pub struct Solver<S: Scalar> {
    /// Tolerance used by all zero tests.
    tol: S,
    /// Number of decision variables.
    nx: usize,
    /// Number of rows of the objective.
    nr: usize,
    /// Dimension left after eliminating the equality constraints.
    ny: usize,
    /// Number of inequality constraints.
    mi: usize,
    /// Number of equality constraints.
    me: usize,
    /// Factorization used for projections, step computation, and
    /// multiplier solves.
    factorization: Factorization,

    /// Objective matrix.
    q: Mat<S>,
    /// Objective vector.
    r: Col<S>,

    /// Orthonormal basis of the kernel of the equality matrix; identity
    /// when no equalities are set.
    z: Mat<S>,
    /// Particular solution of the equality constraints.
    xeq: Col<S>,

    /// Reduced objective matrix `Q Z`.
    qy: Mat<S>,
    /// Reduced objective vector `r − Q x_eq`.
    ry: Col<S>,
    /// Reduced inequality matrix `C Z`.
    cy: Mat<S>,
    /// Reduced inequality vector `d − C x_eq`.
    dy: Col<S>,
    /// Unconstrained minimizer of the reduced objective.
    yu: Col<S>,
    /// Current iterate.
    yk: Col<S>,

    /// Rows of `(C_y, d_y)` selected by the active set, kept materialized
    /// for the step and multiplier solves.
    ca: Mat<S>,
    da: Col<S>,
    /// Indices of active inequality constraints, in activation order.
    active: Vec<usize>,
    /// Indices of inactive inequality constraints.
    inactive: Vec<usize>,
}

impl<S: Scalar> Solver<S> {
    /// Creates a solver for `nx` decision variables and an objective with
    /// `nr` rows, initialized to the zero objective with no constraints.
    ///
    /// Panics when either dimension is zero or the tolerance is not
    /// positive.
    pub fn new(nx: usize, nr: usize, tol: S) -> Self {
        assert!(nx >= 1, "at least one decision variable is required");
        assert!(nr >= 1, "at least one objective row is required");
        assert!(tol > S::zero(), "the tolerance must be positive");

        let mut solver = Self {
            tol,
            nx,
            nr,
            ny: nx,
            mi: 0,
            me: 0,
            factorization: Factorization::default(),
            q: Mat::zeros(nr, nx),
            r: Col::zeros(nr),
            z: Mat::identity(nx, nx),
            xeq: Col::zeros(nx),
            qy: Mat::zeros(nr, nx),
            ry: Col::zeros(nr),
            cy: Mat::zeros(0, nx),
            dy: Col::zeros(0),
            yu: Col::zeros(nx),
            yk: Col::zeros(nx),
            ca: Mat::zeros(0, nx),
            da: Col::zeros(0),
            active: Vec::new(),
            inactive: Vec::new(),
        };
        solver.reset_active_set();
        solver
    }

    /// Creates a solver with dimensions deduced from the objective.
    pub fn with_objective(q: MatRef<'_, S>, r: ColRef<'_, S>, tol: S) -> Self {
        let mut solver = Self::new(q.ncols(), q.nrows(), tol);
        solver.update_objective(q, r);
        solver
    }

    /// Selects the factorization used for kernel extraction and
    /// least-squares solves. The default is the SVD.
    pub fn with_factorization(mut self, factorization: Factorization) -> Self {
        self.factorization = factorization;
        self
    }

    /// The indices of the currently active inequality constraints, in
    /// activation order.
    pub fn active_set(&self) -> &[usize] {
        &self.active
    }

    /// Replaces the objective, keeping the constraints.
    ///
    /// Recomputes the reduced objective and the unconstrained minimizer.
    /// Panics on dimension mismatch.
    pub fn update_objective(&mut self, q: MatRef<'_, S>, r: ColRef<'_, S>) {
        assert_eq!(q.nrows(), self.nr, "Q matrix has the wrong number of rows");
        assert_eq!(q.ncols(), self.nx, "Q matrix has the wrong number of columns");
        assert_eq!(r.nrows(), self.nr, "r vector has the wrong number of rows");
        self.q = q.to_owned();
        self.r = r.to_owned();

        if self.me > 0 {
            if self.ny > 0 {
                self.qy = &self.q * &self.z;
                self.ry = &self.r - &(&self.q * &self.xeq);
            } else {
                self.qy = Mat::zeros(self.nr, 0);
                self.ry = Col::zeros(self.nr);
            }
        } else {
            self.qy = self.q.clone();
            self.ry = self.r.clone();
        }

        self.yu = if self.ny > 0 {
            self.factorization.lstsq(self.qy.as_ref(), self.ry.as_ref())
        } else {
            Col::zeros(0)
        };
    }

    /// Clears the active set, preventing the next solve from warm
    /// starting.
    pub fn reset_active_set(&mut self) {
        self.ca = Mat::zeros(0, self.ny);
        self.da = Col::zeros(0);
        self.active.clear();
        self.inactive = (0..self.mi).collect();
    }

    /// Removes all constraints and clears the active set.
    ///
    /// The solver is left with the unconstrained least-squares problem on
    /// `(Q, r)`.
    pub fn clear_constraints(&mut self) {
        self.z = Mat::identity(self.nx, self.nx);
        self.xeq = Col::zeros(self.nx);
        self.mi = 0;
        self.me = 0;
        self.ny = self.nx;
        self.cy = Mat::zeros(0, self.ny);
        self.dy = Col::zeros(0);
        self.reset_active_set();
        let (q, r) = (self.q.clone(), self.r.clone());
        self.update_objective(q.as_ref(), r.as_ref());
    }

    /// Replaces all constraints with the given inequalities.
    ///
    /// Removes any equality constraints and resets the active set.
    /// Returns `true` when the new constraints are feasible; otherwise
    /// the constraints are cleared and the solver falls back to the
    /// unconstrained problem.
    pub fn set_inequalities(&mut self, c: MatRef<'_, S>, d: ColRef<'_, S>) -> bool {
        let a: Mat<S> = Mat::zeros(0, self.nx);
        let b: Col<S> = Col::zeros(0);
        self.set_constraints(a.as_ref(), b.as_ref(), c, d)
    }

    /// Replaces all constraints with the given equalities and
    /// inequalities.
    ///
    /// The equalities are eliminated immediately through a null-space
    /// projection; the inequalities are then checked for feasibility with
    /// a simplex phase-one. Returns `true` when the combined constraint
    /// set is feasible; otherwise the constraints are cleared and the
    /// solver falls back to the unconstrained problem.
    pub fn set_constraints(
        &mut self,
        a: MatRef<'_, S>,
        b: ColRef<'_, S>,
        c: MatRef<'_, S>,
        d: ColRef<'_, S>,
    ) -> bool {
        assert_eq!(a.ncols(), self.nx, "A matrix has the wrong number of columns");
        assert_eq!(
            a.nrows(),
            b.nrows(),
            "A matrix and b vector have a different number of rows"
        );

        if a.nrows() == 0 {
            if self.me > 0 {
                log::debug!("removing pre-existing equality constraints");
                self.z = Mat::identity(self.nx, self.nx);
                self.xeq = Col::zeros(self.nx);
                self.me = 0;
                self.ny = self.nx;
                self.reset_active_set();
                let (q, r) = (self.q.clone(), self.r.clone());
                self.update_objective(q.as_ref(), r.as_ref());
            }
        } else {
            log::debug!("eliminating equality constraints via kernel projection");
            let (xeq, z) = self.factorization.projection(a, b);
            self.xeq = xeq;
            self.z = z;

            // An inexact particular solution means A x = b has no solution
            // at all.
            let residual = &(a * &self.xeq) - &b.to_owned();
            if residual.norm_l2() > self.tol {
                log::debug!("equality constraints are infeasible");
                self.clear_constraints();
                return false;
            }

            self.me = a.nrows();
            self.ny = self.z.ncols();
            self.reset_active_set();
            let (q, r) = (self.q.clone(), self.r.clone());
            self.update_objective(q.as_ref(), r.as_ref());
        }

        // Forcing the inequality count to zero makes the update below
        // re-check feasibility and rebuild the active set.
        self.mi = 0;
        self.update_inequalities(c, d)
    }

    /// Replaces the inequality constraints, keeping the equalities.
    ///
    /// When the number of inequalities is unchanged, the active set and
    /// the current iterate are preserved and feasibility is not retested;
    /// this is the warm-start path for sequences of similar problems.
    /// When the dimension changes, feasibility is established anew with a
    /// simplex phase-one; an infeasible outcome clears the constraints
    /// and returns `false`.
    pub fn update_inequalities(&mut self, c: MatRef<'_, S>, d: ColRef<'_, S>) -> bool {
        assert_eq!(c.ncols(), self.nx, "C matrix has the wrong number of columns");
        assert_eq!(
            c.nrows(),
            d.nrows(),
            "C matrix and d vector have a different number of rows"
        );

        self.cy = c.to_owned();
        self.dy = d.to_owned();

        if self.me > 0 {
            if c.nrows() > 0 {
                if self.ny > 0 {
                    // The order matters: d_y must be formed from the
                    // original C before C_y is overwritten by C Z.
                    let dy = &self.dy - &(&self.cy * &self.xeq);
                    self.dy = dy;
                    let cy = &self.cy * &self.z;
                    self.cy = cy;
                } else {
                    self.cy = Mat::zeros(c.nrows(), 0);
                    self.dy = Col::zeros(c.nrows());
                }
            } else {
                self.cy = Mat::zeros(0, self.ny);
                self.dy = Col::zeros(0);
            }
        }

        // A dimension change invalidates the active set and the iterate;
        // feasibility has to be established from scratch.
        if c.nrows() != self.mi {
            if c.nrows() > 0 {
                if self.ny > 0 {
                    if !self.feasible_inequalities() {
                        self.clear_constraints();
                        return false;
                    }
                } else {
                    // The equalities fully determine x; either xeq also
                    // satisfies the inequalities or the combined set is
                    // infeasible.
                    let slack = &(c * &self.xeq) - &d.to_owned();
                    let mut worst = S::zero();
                    for i in 0..slack.nrows() {
                        worst = Float::max(worst, slack[i]);
                    }
                    if worst > S::zero() {
                        log::debug!(
                            "equalities fully constrain the decision vector, but xeq violates \
                             the inequalities"
                        );
                        self.clear_constraints();
                        return false;
                    }
                }
            }

            self.mi = c.nrows();
            self.reset_active_set();
        }

        true
    }

    /// Establishes a strictly feasible iterate for the reduced
    /// inequalities with a simplex phase-one.
    fn feasible_inequalities(&mut self) -> bool {
        log::debug!("checking inequality feasibility with a simplex phase-one");
        let opts = crate::simplex::SimplexOptions {
            tol: self.tol,
            big_m: None,
            factorization: self.factorization,
        };
        let zero_objective: Col<S> = Col::zeros(self.ny);
        // Tightening the right-hand side by the tolerance drives the
        // iterate strictly into the interior.
        let strict_d = Col::from_fn(self.dy.nrows(), |i| self.dy[i] - self.tol);
        match crate::simplex::minimize(
            zero_objective.as_ref(),
            self.cy.as_ref(),
            strict_d.as_ref(),
            &opts,
        ) {
            Ok(y) => {
                self.yk = y;
            }
            Err(err) => {
                log::debug!("simplex phase-one failed: {err}");
                return false;
            }
        }
        // The phase-one solution must satisfy the untightened
        // constraints.
        let slack = &(&self.cy * &self.yk) - &self.dy;
        let mut worst = S::neg_infinity();
        for i in 0..slack.nrows() {
            worst = Float::max(worst, slack[i]);
        }
        if worst > S::zero() {
            log::debug!("simplex phase-one returned an invalid point");
            return false;
        }
        true
    }

    /// Solves the quadratic program.
    ///
    /// On input, `x` may carry a warm guess: when its dimension matches
    /// the reduced problem and the guess is feasible, the iteration
    /// starts from it. On success `x` receives the minimizer and `true`
    /// is returned; when no feasible point exists `x` is left untouched
    /// and `false` is returned.
    pub fn solve(&mut self, x: &mut Col<S>) -> bool {
        // A problem fully constrained by equalities has nothing to
        // optimize.
        if self.ny == 0 {
            *x = self.xeq.clone();
            return true;
        }

        let mut y = x.clone();
        if !self.solve_reduced(&mut y) {
            return false;
        }

        if self.me > 0 {
            *x = &self.xeq + &(&self.z * &y);
        } else {
            *x = y;
        }
        true
    }

    pub(crate) fn tol(&self) -> S {
        self.tol
    }
}
