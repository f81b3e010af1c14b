//! The active-set iteration over the reduced problem.
//!
//! Each iteration computes a step `p` that minimizes the reduced
//! objective inside the kernel of the active constraint rows, shortens it
//! to the first blocking inactive constraint, and either activates that
//! constraint or, after a full step, releases the active constraint with
//! the most negative Lagrange multiplier. The loop ends when a full step
//! is taken and no multiplier is negative.

use faer::Col;
use num_traits::Float;

use super::Solver;
use crate::Scalar;

/// Hard cap on active-set iterations; exceeding it is an internal error.
const MAX_ITERATIONS: usize = 1_000_000;

impl<S: Scalar> Solver<S> {
    /// Solves the reduced problem `min ‖Q_y y − r_y‖² s.t. C_y y ≤ d_y`.
    ///
    /// `y` doubles as an optional warm guess on input and receives the
    /// minimizer on success.
    pub(crate) fn solve_reduced(&mut self, y: &mut Col<S>) -> bool {
        // Without inequalities this is plain least squares.
        if self.mi == 0 {
            *y = self.yu.clone();
            return true;
        }

        // The iterate must have the reduced dimension before anything
        // else touches it.
        if self.yk.nrows() != self.ny {
            self.yk = Col::zeros(self.ny);
        }

        if !self.feasible_start(y) {
            log::debug!("failed to determine a feasible start for the optimization");
            return false;
        }
        log::trace!("starting active-set iteration with {} active constraints", self.active.len());

        let mut na = self.active.len();
        let mut iterations = 0usize;
        loop {
            iterations += 1;
            if iterations > MAX_ITERATIONS {
                panic!("the active-set iteration exceeded {MAX_ITERATIONS} iterations");
            }

            // Step direction: minimize the objective within the kernel of
            // the active rows, or head straight for the unconstrained
            // minimum when nothing is active.
            let p: Col<S> = if na > 0 {
                let w = self.factorization.kernel(self.ca.as_ref());
                if w.ncols() == 0 {
                    // The active set fully determines y.
                    Col::zeros(self.ny)
                } else {
                    let residual = &self.ry - &(&self.qy * &self.yk);
                    let qyw = &self.qy * &w;
                    let u = self.factorization.lstsq(qyw.as_ref(), residual.as_ref());
                    &w * &u
                }
            } else {
                &self.yu - &self.yk
            };

            // Largest step along p that keeps every inactive constraint
            // satisfied.
            let mut alpha = S::one();
            let mut blocking = None;
            for (i, &idx) in self.inactive.iter().enumerate() {
                let mut cp = S::zero();
                let mut cy = S::zero();
                for j in 0..self.ny {
                    cp = cp + self.cy[(idx, j)] * p[j];
                    cy = cy + self.cy[(idx, j)] * self.yk[j];
                }
                if cp > S::zero() {
                    let ai = (self.dy[idx] - cy) / cp;
                    if ai < alpha {
                        alpha = ai;
                        blocking = Some(i);
                    }
                }
            }

            if let Some(i) = blocking {
                let idx = self.inactive[i];
                log::trace!("activating constraint {idx} (step size {:?})", alpha);
                for j in 0..self.ny {
                    self.yk[j] = self.yk[j] + alpha * p[j];
                }

                // Materialize the new active row.
                self.ca.resize_with(na + 1, self.ny, |_, _| S::zero());
                for j in 0..self.ny {
                    self.ca[(na, j)] = self.cy[(idx, j)];
                }
                self.da.resize_with(na + 1, |_| S::zero());
                self.da[na] = self.dy[idx];

                na += 1;
                self.active.push(idx);
                self.inactive.remove(i);
                continue;
            }

            // Full step.
            for j in 0..self.ny {
                self.yk[j] = self.yk[j] + p[j];
            }

            if na == 0 {
                log::trace!("no active constraints and a full step: unconstrained minimum");
                *y = self.yk.clone();
                return true;
            }

            // Lagrange multipliers of the active rows; the factor two
            // from the gradient is folded into them. The most recently
            // activated constraint is exempt from release to avoid
            // immediate re-activation.
            let residual = &self.ry - &(&self.qy * &self.yk);
            let qyt = self.qy.transpose().to_owned();
            let gradient = &qyt * &residual;
            let cat = self.ca.transpose().to_owned();
            let half_mu = self.factorization.lstsq(cat.as_ref(), gradient.as_ref());

            let mut release = None;
            let mut mu_min = S::zero();
            for i in 0..na - 1 {
                if half_mu[i] < mu_min {
                    mu_min = half_mu[i];
                    release = Some(i);
                }
            }

            let Some(i) = release else {
                log::trace!("all multipliers nonnegative: optimal point reached");
                *y = self.yk.clone();
                return true;
            };

            log::trace!("deactivating constraint {} (row {i} of the active matrix)", self.active[i]);
            // Shift the trailing rows up one slot; the scalar loop keeps
            // the row copies free of aliasing.
            for row in i..na - 1 {
                for j in 0..self.ny {
                    self.ca[(row, j)] = self.ca[(row + 1, j)];
                }
                self.da[row] = self.da[row + 1];
            }
            na -= 1;
            self.ca.truncate(na, self.ny);
            self.da.truncate(na);
            self.inactive.push(self.active[i]);
            self.active.remove(i);
        }
    }

    /// Finds a feasible starting iterate, trying in order: the previous
    /// iterate, the caller's guess, the point determined by the active
    /// set, and finally a simplex phase-one.
    fn feasible_start(&mut self, y: &Col<S>) -> bool {
        let tol = self.tol();

        if self.residual_max(&self.yk) < tol {
            log::trace!("current iterate is a feasible start");
            return true;
        }

        if y.nrows() == self.ny && !(self.residual_max(y) > S::zero()) {
            log::trace!("caller-supplied guess is a feasible start");
            self.yk = y.clone();
            return true;
        }

        if self.ca.nrows() > 0 {
            self.yk = self.factorization.lstsq(self.ca.as_ref(), self.da.as_ref());
            if !(self.residual_max(&self.yk) > S::zero()) {
                log::trace!("active-set solution is a feasible start");
                return true;
            }
        }

        log::trace!("falling back to a simplex phase-one for a feasible start");
        self.feasible_inequalities()
    }

    /// Largest inequality violation `max_i (C_y y − d_y)_i`.
    fn residual_max(&self, y: &Col<S>) -> S {
        let mut worst = S::neg_infinity();
        for i in 0..self.cy.nrows() {
            let mut ci = S::zero();
            for j in 0..self.ny {
                ci = ci + self.cy[(i, j)] * y[j];
            }
            worst = Float::max(worst, ci - self.dy[i]);
        }
        worst
    }
}
