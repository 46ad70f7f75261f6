//! The classic geometric mechanism for differential privacy, and its
//! bounded derivative.
//!
//! The geometric mechanism (Ghosh, Roughgarden and Sundararajan,
//! <https://arxiv.org/pdf/0811.2841.pdf>) is the integer analogue of the
//! Laplace mechanism: it perturbs an exact count with two-sided discrete
//! geometric noise, `P(noise = k) ∝ q^|k|` with `q = exp(-ε/sensitivity)`.

use crate::mechanisms::traits::{
    check_epsilon_delta, Mechanism, MechanismError,
};
use crate::rng::Prng;

/// Closed integer output interval for the bounded mechanism.
///
/// `i64::MIN` / `i64::MAX` stand in for unbounded endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub lower: i64,
    pub upper: i64,
}

impl Bounds {
    pub fn new(lower: i64, upper: i64) -> Result<Self, MechanismError> {
        if lower > upper {
            return Err(MechanismError::InvalidBounds { lower, upper });
        }
        Ok(Self { lower, upper })
    }
}

/// The unbounded geometric mechanism, extended to allow for non-unity
/// sensitivity.
///
/// Sensitivity 0 (or `ε = +∞`) gives `scale = -∞` and the sampler
/// deterministically returns zero noise: a constant query needs no
/// randomization.
#[derive(Debug)]
pub struct GeometricMechanism {
    epsilon: f64,
    sensitivity: u32,
    scale: f64,
    prng: Prng,
}

impl GeometricMechanism {
    /// Constructs the mechanism, validating `epsilon` (positive or `+∞`).
    /// Delta is fixed at zero for this family.
    pub fn new(
        epsilon: f64,
        sensitivity: u32,
        prng: Prng,
    ) -> Result<Self, MechanismError> {
        check_epsilon_delta(epsilon, 0.0)?;
        let scale = if sensitivity > 0 {
            -epsilon / f64::from(sensitivity)
        } else {
            f64::NEG_INFINITY
        };
        Ok(Self {
            epsilon,
            sensitivity,
            scale,
            prng,
        })
    }

    pub fn sensitivity(&self) -> u32 {
        self.sensitivity
    }

    /// One two-sided geometric noise draw.
    ///
    /// A uniform variate in `[-0.5, 0.5)` is rescaled by `1 + q`; its sign
    /// picks the half-distribution and its magnitude is inverted through
    /// the geometric CDF. The rescale is what accounts for the probability
    /// mass of the 0 outcome being shared between the two halves; sampling
    /// sign and magnitude independently would double-count it.
    fn draw_noise(&mut self) -> i64 {
        let mut unif = self.prng.uniform_unit() - 0.5;
        unif *= 1.0 + self.scale.exp();
        let sgn: i64 = if unif < 0.0 { -1 } else { 1 };

        // Geometric inverse-CDF, ratio exp(-ε/sensitivity). With
        // scale = -∞ (zero sensitivity or infinite ε) this is 0 for every
        // draw. The magnitude is non-finite only for the measure-zero
        // unif == 0 draw, which we treat as zero noise.
        let magnitude = ((sgn as f64) * unif).ln() / self.scale;
        if magnitude.is_finite() {
            sgn * magnitude.floor() as i64
        } else {
            0
        }
    }
}

impl Mechanism for GeometricMechanism {
    fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn delta(&self) -> f64 {
        0.0
    }

    fn randomise(&mut self, value: i64) -> i64 {
        let noise = self.draw_noise();
        value.saturating_add(noise)
    }

    fn bias(&self, _value: i64) -> Result<f64, MechanismError> {
        Ok(0.0)
    }

    fn variance(&self, _value: i64) -> Result<f64, MechanismError> {
        let q = self.scale.exp();
        let leading_factor = (1.0 - q) / (1.0 + q);
        let geom_series = q / (1.0 - q);

        Ok(2.0
            * leading_factor
            * (geom_series
                + 3.0 * geom_series.powi(2)
                + 2.0 * geom_series.powi(3)))
    }
}

/// The bounded geometric mechanism: noisy values falling outside a
/// pre-described range are mapped back to the closest point within it.
#[derive(Debug)]
pub struct BoundedGeometricMechanism {
    inner: GeometricMechanism,
    bounds: Bounds,
}

impl BoundedGeometricMechanism {
    pub fn new(
        epsilon: f64,
        sensitivity: u32,
        bounds: Bounds,
        prng: Prng,
    ) -> Result<Self, MechanismError> {
        let inner = GeometricMechanism::new(epsilon, sensitivity, prng)?;
        Ok(Self { inner, bounds })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

impl Mechanism for BoundedGeometricMechanism {
    fn epsilon(&self) -> f64 {
        self.inner.epsilon()
    }

    fn delta(&self) -> f64 {
        0.0
    }

    /// Randomises `value`, then clamps the result into the bounds.
    fn randomise(&mut self, value: i64) -> i64 {
        self.inner
            .randomise(value)
            .clamp(self.bounds.lower, self.bounds.upper)
    }

    /// Truncation destroys the unbounded closed form.
    fn bias(&self, _value: i64) -> Result<f64, MechanismError> {
        Err(MechanismError::Unsupported("bias"))
    }

    /// Truncation destroys the unbounded closed form.
    fn variance(&self, _value: i64) -> Result<f64, MechanismError> {
        Err(MechanismError::Unsupported("variance"))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn geometric(epsilon: f64, sensitivity: u32) -> GeometricMechanism {
        GeometricMechanism::new(epsilon, sensitivity, Prng::from_seed(0))
            .unwrap()
    }

    #[test]
    fn rejects_bad_epsilon() {
        for epsilon in [0.0, -1.0, f64::NAN] {
            let result =
                GeometricMechanism::new(epsilon, 1, Prng::from_seed(0));
            assert!(matches!(
                result,
                Err(MechanismError::InvalidEpsilon(_))
            ));
        }
    }

    #[test]
    fn rejects_inverted_bounds() {
        assert!(matches!(
            Bounds::new(3, 2),
            Err(MechanismError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn bias_is_zero() {
        let mech = geometric(1.0, 1);
        assert_eq!(mech.bias(17).unwrap(), 0.0);
    }

    #[test]
    fn variance_matches_closed_form() {
        let mech = geometric(2.0, 1);
        let q = (-2.0f64).exp();
        let l = (1.0 - q) / (1.0 + q);
        let s = q / (1.0 - q);
        let expected = 2.0 * l * (s + 3.0 * s * s + 2.0 * s * s * s);
        assert_relative_eq!(mech.variance(0).unwrap(), expected);
    }

    #[test]
    fn variance_shrinks_with_growing_epsilon() {
        let loose = geometric(0.1, 1).variance(0).unwrap();
        let tight = geometric(5.0, 1).variance(0).unwrap();
        assert!(loose > tight);
        assert!(tight > 0.0);
    }

    #[test]
    fn infinite_epsilon_adds_no_noise() {
        let mut mech = geometric(f64::INFINITY, 1);
        for value in [-100, -1, 0, 1, 42, 1_000_000] {
            assert_eq!(mech.randomise(value), value);
        }
    }

    #[test]
    fn zero_sensitivity_adds_no_noise() {
        let mut mech = geometric(0.5, 0);
        for value in [-3, 0, 7] {
            assert_eq!(mech.randomise(value), value);
        }
    }

    #[test]
    fn fixed_seed_is_deterministic() {
        let mut a = geometric(0.5, 1);
        let mut b = geometric(0.5, 1);
        for _ in 0..200 {
            assert_eq!(a.randomise(10), b.randomise(10));
        }
    }

    #[test]
    fn noise_is_symmetric_in_aggregate() {
        // Sample mean over many draws should sit near the input value.
        let mut mech = geometric(1.0, 1);
        let n = 20_000;
        let sum: i64 = (0..n).map(|_| mech.randomise(0)).sum();
        let mean = sum as f64 / n as f64;
        let std_err = (mech.variance(0).unwrap() / n as f64).sqrt();
        assert!(mean.abs() < 5.0 * std_err, "mean {mean} too far from 0");
    }

    #[test]
    fn bounded_draws_stay_in_bounds() {
        let bounds = Bounds::new(0, 10).unwrap();
        let mut mech = BoundedGeometricMechanism::new(
            0.1,
            1,
            bounds,
            Prng::from_seed(3),
        )
        .unwrap();
        for value in [0, 5, 10] {
            for _ in 0..500 {
                let noisy = mech.randomise(value);
                assert!((0..=10).contains(&noisy));
            }
        }
    }

    #[test]
    fn degenerate_bounds_pin_the_output() {
        let bounds = Bounds::new(5, 5).unwrap();
        let mut mech = BoundedGeometricMechanism::new(
            1.0,
            1,
            bounds,
            Prng::from_seed(1),
        )
        .unwrap();
        for _ in 0..50 {
            assert_eq!(mech.randomise(0), 5);
        }
    }

    #[test]
    fn bounded_bias_and_variance_are_unsupported() {
        let bounds = Bounds::new(0, i64::MAX).unwrap();
        let mech =
            BoundedGeometricMechanism::new(1.0, 1, bounds, Prng::from_seed(0))
                .unwrap();
        assert!(matches!(
            mech.bias(0),
            Err(MechanismError::Unsupported("bias"))
        ));
        assert!(matches!(
            mech.variance(0),
            Err(MechanismError::Unsupported("variance"))
        ));
    }
}
