//! Piecewise-linear lookup tables used by `LOOKUP_TABLE`/`APPLY_LOOKUP` nodes.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A piecewise-linear function given by parallel coordinate vectors.
///
/// `x` must be strictly increasing; this is the caller's responsibility to
/// uphold (mirroring the original, which never validated it either -
/// malformed tables simply produce a nonsensical interpolation rather than
/// a panic).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupTable {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl LookupTable {
    /// Builds a table from parallel coordinate vectors. Panics if the
    /// lengths differ or the table is empty.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        assert_eq!(x.len(), y.len(), "lookup table x/y length mismatch");
        assert!(!x.is_empty(), "lookup table must have at least one point");
        Self { x, y }
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Evaluates the table at `at`, clamping to the first/last value
    /// outside the table's domain and linearly interpolating within it.
    pub fn eval(&self, at: f64) -> f64 {
        if at <= self.x[0] {
            return self.y[0];
        }
        let last = self.x.len() - 1;
        if at >= self.x[last] {
            return self.y[last];
        }
        // Find the bracketing segment [x[i], x[i+1]] containing `at`.
        let i = match self
            .x
            .binary_search_by(|probe| probe.partial_cmp(&at).unwrap())
        {
            Ok(exact) => return self.y[exact],
            Err(insert_at) => insert_at - 1,
        };
        let (x0, x1) = (self.x[i], self.x[i + 1]);
        let (y0, y1) = (self.y[i], self.y[i + 1]);
        let t = (at - x0) / (x1 - x0);
        y0 + t * (y1 - y0)
    }

    /// Bit-exact structural equality, used when interning a table (two
    /// tables with identical coordinates are deduplicated to one).
    pub fn structural_eq(&self, other: &Self) -> bool {
        fn bits_eq(a: &[f64], b: &[f64]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(u, v)| u.to_bits() == v.to_bits())
        }
        bits_eq(&self.x, &other.x) && bits_eq(&self.y, &other.y)
    }

    /// Bit-exact structural hash, consistent with `structural_eq`.
    pub fn structural_hash(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        for v in self.x.iter().chain(self.y.iter()) {
            v.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}
