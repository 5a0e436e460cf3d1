use crate::CcError;

/// Absolute + relative comparison tolerance
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: f64,
    pub rel: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

impl Tolerances {
    /// Loose tolerance for accumulated quantities (ledger sums over a mission).
    pub fn accumulated() -> Self {
        Self {
            abs: 1e-6,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: f64, b: f64, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, CcError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CcError::NonFinite { what, value: v })
    }
}

/// Finite and strictly greater than zero.
pub fn ensure_positive(v: f64, what: &'static str) -> Result<f64, CcError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(CcError::OutOfRange { what, value: v })
    }
}

/// Finite and inside the closed interval `[lo, hi]`.
pub fn ensure_within(v: f64, lo: f64, hi: f64, what: &'static str) -> Result<f64, CcError> {
    let v = ensure_finite(v, what)?;
    if (lo..=hi).contains(&v) {
        Ok(v)
    } else {
        Err(CcError::OutOfRange { what, value: v })
    }
}

/// Percentage of `part` in `whole`, 0 when `whole` is zero.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole.abs() <= f64::EPSILON {
        0.0
    } else {
        100.0 * part / whole
    }
}
