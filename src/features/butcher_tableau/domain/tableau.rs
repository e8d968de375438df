//! The named Runge-Kutta Butcher tableau catalogue.
//!
//! A pure data lookup, not an integrator: this crate hands a tableau's
//! coefficients to a caller's own time-stepping loop, the way the
//! reference implementation's `ButcherTableau` is consumed by a simulation
//! driver it doesn't itself contain.

use serde::{Deserialize, Serialize};

/// The seven predefined schemes. `Heun` has no entry in the retained
/// `ButcherTableau.hpp` enum, but spec.md's own data model keeps it, so it
/// is included here — see `DESIGN.md`'s Open Question log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableauName {
    Euler,
    RungeKutta2,
    RungeKutta3,
    Heun,
    RungeKutta4,
    ImplicitMidpoint2,
    GaussLegendre4,
}

/// One scheme's coefficients: `c` (stage times), `a` (the full, untruncated
/// stage-coupling matrix — nonzero above the diagonal for the two implicit
/// schemes), and `b` (final weights). `c.len() == a.len() == b.len()` is
/// the stage count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButcherTableau {
    name: TableauName,
    c: Vec<f64>,
    a: Vec<Vec<f64>>,
    b: Vec<f64>,
}

impl ButcherTableau {
    /// Builds the tableau for `name`. The coefficients are the standard
    /// literature values for each scheme (spec.md's own worked examples
    /// for `RungeKutta4` and `GaussLegendre4` are reproduced verbatim by
    /// `row`/`a_row` below).
    pub fn new(name: TableauName) -> Self {
        let (c, a, b): (Vec<f64>, Vec<Vec<f64>>, Vec<f64>) = match name {
            TableauName::Euler => (vec![0.0], vec![vec![0.0]], vec![1.0]),

            TableauName::RungeKutta2 => (
                vec![0.0, 0.5],
                vec![vec![0.0, 0.0], vec![0.5, 0.0]],
                vec![0.0, 1.0],
            ),

            TableauName::RungeKutta3 => (
                vec![0.0, 0.5, 1.0],
                vec![
                    vec![0.0, 0.0, 0.0],
                    vec![0.5, 0.0, 0.0],
                    vec![-1.0, 2.0, 0.0],
                ],
                vec![1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0],
            ),

            TableauName::Heun => (
                vec![0.0, 1.0 / 3.0, 2.0 / 3.0],
                vec![
                    vec![0.0, 0.0, 0.0],
                    vec![1.0 / 3.0, 0.0, 0.0],
                    vec![0.0, 2.0 / 3.0, 0.0],
                ],
                vec![1.0 / 4.0, 0.0, 3.0 / 4.0],
            ),

            TableauName::RungeKutta4 => (
                vec![0.0, 0.5, 0.5, 1.0],
                vec![
                    vec![0.0, 0.0, 0.0, 0.0],
                    vec![0.5, 0.0, 0.0, 0.0],
                    vec![0.0, 0.5, 0.0, 0.0],
                    vec![0.0, 0.0, 1.0, 0.0],
                ],
                vec![1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
            ),

            TableauName::ImplicitMidpoint2 => (
                vec![0.5],
                vec![vec![0.5]],
                vec![1.0],
            ),

            TableauName::GaussLegendre4 => {
                let r3 = 3f64.sqrt() / 6.0;
                (
                    vec![0.5 - r3, 0.5 + r3],
                    vec![
                        vec![0.25, 0.25 - r3],
                        vec![0.25 + r3, 0.25],
                    ],
                    vec![0.5, 0.5],
                )
            }
        };
        Self { name, c, a, b }
    }

    pub fn name(&self) -> TableauName {
        self.name
    }

    /// Number of stages (rows of `c`/`a`/`b`).
    pub fn stages(&self) -> usize {
        self.c.len()
    }

    pub fn c(&self) -> &[f64] {
        &self.c
    }

    pub fn b(&self) -> &[f64] {
        &self.b
    }

    /// The complete, untruncated coupling matrix — what `ImplicitMidpoint2`
    /// and `GaussLegendre4` need, since their coefficients sit on or above
    /// the diagonal, not only below it.
    pub fn full_matrix(&self) -> &[Vec<f64>] {
        &self.a
    }

    /// The row vector `(c_i, a_{i,1}, ..., a_{i,i})` for stage `i`
    /// (0-indexed), or the weight row `(b_1, ..., b_n)` for `i == stages()`.
    /// Truncated to the strictly-lower-triangular convention literally as
    /// spec.md describes it, even though the implicit schemes' own
    /// coefficients extend past the diagonal — see `a_row` for the
    /// untruncated version those schemes actually need.
    pub fn row(&self, i: usize) -> Vec<f64> {
        if i == self.stages() {
            return self.b.clone();
        }
        let mut row = Vec::with_capacity(i + 1);
        row.push(self.c[i]);
        row.extend_from_slice(&self.a[i][..i]);
        row
    }

    /// The untruncated row `(c_i, a_{i,1}, ..., a_{i,n})` for stage `i`.
    pub fn a_row(&self, i: usize) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.a[i].len() + 1);
        row.push(self.c[i]);
        row.extend_from_slice(&self.a[i]);
        row
    }
}
