use thiserror::Error;

/// Error returned when constructing or querying a mechanism.
#[derive(Error, Debug)]
pub enum MechanismError {
    #[error("epsilon must be positive (or +∞), got {0}")]
    InvalidEpsilon(f64),

    #[error("delta must be in [0, 1], got {0}")]
    InvalidDelta(f64),

    #[error("delta must be zero for the geometric mechanism, got {0}")]
    NonZeroDelta(f64),

    #[error("lower bound {lower} exceeds upper bound {upper}")]
    InvalidBounds { lower: i64, upper: i64 },

    #[error("{0} is undefined for this mechanism")]
    Unsupported(&'static str),
}

/// Trait for integer-valued differentially private mechanisms.
///
/// A mechanism is constructed once per query with its privacy parameters
/// and generator, then applied to each exact value to be released.
pub trait Mechanism {
    /// Privacy parameter ε of the mechanism.
    fn epsilon(&self) -> f64;

    /// Privacy parameter δ of the mechanism.
    fn delta(&self) -> f64;

    /// Randomises `value` with the mechanism.
    fn randomise(&mut self, value: i64) -> i64;

    /// Bias of the mechanism at `value`, where a closed form exists.
    fn bias(&self, value: i64) -> Result<f64, MechanismError>;

    /// Variance of the mechanism at `value`, where a closed form exists.
    fn variance(&self, value: i64) -> Result<f64, MechanismError>;
}

/// Shared parameter validation: ε must be positive (`+∞` allowed, NaN
/// rejected), δ must lie in `[0, 1]`.
pub fn check_epsilon_delta(
    epsilon: f64,
    delta: f64,
) -> Result<(), MechanismError> {
    if epsilon.is_nan() || epsilon <= 0.0 {
        return Err(MechanismError::InvalidEpsilon(epsilon));
    }
    if delta.is_nan() || !(0.0..=1.0).contains(&delta) {
        return Err(MechanismError::InvalidDelta(delta));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_must_be_positive() {
        assert!(check_epsilon_delta(1.0, 0.0).is_ok());
        assert!(check_epsilon_delta(f64::INFINITY, 0.0).is_ok());
        assert!(matches!(
            check_epsilon_delta(0.0, 0.0),
            Err(MechanismError::InvalidEpsilon(_))
        ));
        assert!(matches!(
            check_epsilon_delta(-1.0, 0.0),
            Err(MechanismError::InvalidEpsilon(_))
        ));
        assert!(matches!(
            check_epsilon_delta(f64::NAN, 0.0),
            Err(MechanismError::InvalidEpsilon(_))
        ));
    }

    #[test]
    fn delta_must_be_a_probability() {
        assert!(check_epsilon_delta(1.0, 0.5).is_ok());
        assert!(matches!(
            check_epsilon_delta(1.0, -0.1),
            Err(MechanismError::InvalidDelta(_))
        ));
        assert!(matches!(
            check_epsilon_delta(1.0, 1.1),
            Err(MechanismError::InvalidDelta(_))
        ));
    }
}
