//! # Operator input curves
//!
//! Operator demands are shaped by a monotone cubic interpolant of a small set of knots, so that
//! small stick deflections give fine control while full deflection still reaches the maximum.
//! Tangents are limited with the Fritsch-Carlson conditions, which keeps the curve monotone
//! between knots whenever the knots themselves are.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A monotone piecewise cubic Hermite curve.
#[derive(Debug, Clone, Serialize)]
pub struct MonotoneCurve {
    x: Vec<f64>,
    y: Vec<f64>,

    /// Tangent at each knot.
    m: Vec<f64>,
}

/// Maps a signed normalised operator input onto an output using a curve.
///
/// A deadband is removed from the input and the remaining range rescaled to `[0, 1]` before the
/// curve is sampled with the input's magnitude. The output carries the input's sign and is capped
/// at `max_output`.
#[derive(Debug, Clone, Serialize)]
pub struct InputMap {
    curve: MonotoneCurve,
    deadband: f64,
    max_output: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CurveError {
    #[error("A curve needs at least two knots, found {0}")]
    TooFewKnots(usize),

    #[error("Curve has {0} x knots but {1} y knots")]
    LengthMismatch(usize, usize),

    #[error("Curve knots must be finite")]
    NonFinite,

    #[error("Curve x knots must be strictly increasing")]
    NotIncreasing,

    #[error("Curve y knots must not decrease")]
    NotMonotone,

    #[error("The deadband must be in [0, 1), found {0}")]
    InvalidDeadband(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MonotoneCurve {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, CurveError> {
        if x.len() != y.len() {
            return Err(CurveError::LengthMismatch(x.len(), y.len()));
        }
        if x.len() < 2 {
            return Err(CurveError::TooFewKnots(x.len()));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(CurveError::NonFinite);
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(CurveError::NotIncreasing);
        }
        if y.windows(2).any(|w| w[1] < w[0]) {
            return Err(CurveError::NotMonotone);
        }

        let n = x.len();

        // Secant slopes of each interval
        let d: Vec<f64> = (0..n - 1)
            .map(|k| (y[k + 1] - y[k]) / (x[k + 1] - x[k]))
            .collect();

        let mut m = vec![0.0; n];
        m[0] = d[0];
        m[n - 1] = d[n - 2];
        for k in 1..n - 1 {
            m[k] = if d[k - 1] * d[k] <= 0.0 {
                0.0
            }
            else {
                0.5 * (d[k - 1] + d[k])
            };
        }

        for k in 0..n - 1 {
            if d[k] == 0.0 {
                m[k] = 0.0;
                m[k + 1] = 0.0;
                continue;
            }

            let a = m[k] / d[k];
            let b = m[k + 1] / d[k];
            let h = a.hypot(b);
            if h > 3.0 {
                let t = 3.0 / h;
                m[k] = t * a * d[k];
                m[k + 1] = t * b * d[k];
            }
        }

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            m,
        })
    }

    /// Sample the curve, clamping `x` into the knot range.
    pub fn value(&self, x: f64) -> f64 {
        let n = self.x.len();
        let x = x.max(self.x[0]).min(self.x[n - 1]);

        // Index of the interval containing x
        let k = self
            .x
            .partition_point(|xk| *xk <= x)
            .saturating_sub(1)
            .min(n - 2);

        let h = self.x[k + 1] - self.x[k];
        let t = (x - self.x[k]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * self.y[k] + h10 * h * self.m[k] + h01 * self.y[k + 1] + h11 * h * self.m[k + 1]
    }
}

impl InputMap {
    pub fn new(
        curve_x: &[f64],
        curve_y: &[f64],
        deadband: f64,
        max_output: f64,
    ) -> Result<Self, CurveError> {
        if !(0.0..1.0).contains(&deadband) {
            return Err(CurveError::InvalidDeadband(deadband));
        }

        Ok(Self {
            curve: MonotoneCurve::new(curve_x, curve_y)?,
            deadband,
            max_output,
        })
    }

    /// Map the input through the deadband and curve.
    pub fn lookup(&self, input: f64) -> f64 {
        let magnitude = input.abs().min(1.0);

        if magnitude < self.deadband || !input.is_finite() {
            return 0.0;
        }

        let rescaled = (magnitude - self.deadband) / (1.0 - self.deadband);
        let output = self.curve.value(rescaled).min(self.max_output);

        output.copysign(input)
    }

    /// Sample the curve directly, without the deadband.
    pub fn curve_value(&self, x: f64) -> f64 {
        self.curve.value(x)
    }

    pub fn deadband(&self) -> f64 {
        self.deadband
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    const THROTTLE_X: [f64; 11] = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];
    const THROTTLE_Y: [f64; 11] = [
        0.0, 0.042, 0.168, 0.378, 0.672, 1.050, 1.512, 2.508, 2.688, 3.402, 4.300,
    ];

    #[test]
    fn test_curve_passes_through_knots() {
        let curve = MonotoneCurve::new(&THROTTLE_X, &THROTTLE_Y).unwrap();

        for (x, y) in THROTTLE_X.iter().zip(THROTTLE_Y.iter()) {
            assert_abs_diff_eq!(curve.value(*x), *y, epsilon = 1e-12);
        }

        // Clamped outside the knots
        assert_abs_diff_eq!(curve.value(-1.0), 0.0);
        assert_abs_diff_eq!(curve.value(2.0), 4.3);
    }

    #[test]
    fn test_curve_monotone() {
        let curve = MonotoneCurve::new(&THROTTLE_X, &THROTTLE_Y).unwrap();

        let mut prev = curve.value(0.0);
        for i in 1..=1000 {
            let v = curve.value(i as f64 / 1000.0);
            assert!(v >= prev - 1e-12, "curve decreased at {}", i);
            prev = v;
        }
    }

    #[test]
    fn test_invalid_curves() {
        assert_eq!(
            MonotoneCurve::new(&[0.0], &[0.0]).unwrap_err(),
            CurveError::TooFewKnots(1)
        );
        assert_eq!(
            MonotoneCurve::new(&[0.0, 1.0], &[0.0]).unwrap_err(),
            CurveError::LengthMismatch(2, 1)
        );
        assert_eq!(
            MonotoneCurve::new(&[0.0, 0.0], &[0.0, 1.0]).unwrap_err(),
            CurveError::NotIncreasing
        );
        assert_eq!(
            MonotoneCurve::new(&[0.0, 1.0], &[1.0, 0.0]).unwrap_err(),
            CurveError::NotMonotone
        );
    }

    #[test]
    fn test_input_map() {
        let map = InputMap::new(&THROTTLE_X, &THROTTLE_Y, 0.1, 4.0).unwrap();

        assert_eq!(map.lookup(0.05), 0.0);
        assert_eq!(map.lookup(-0.05), 0.0);

        // Zero centred and odd
        assert_abs_diff_eq!(map.lookup(0.55), -map.lookup(-0.55), epsilon = 1e-12);
        assert_abs_diff_eq!(map.lookup(0.55), THROTTLE_Y[5], epsilon = 1e-12);

        // Capped at the maximum
        assert_abs_diff_eq!(map.lookup(1.0), 4.0);
        assert_abs_diff_eq!(map.lookup(-1.5), -4.0);
    }
}
