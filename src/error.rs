use thiserror::Error;

/// Errors raised while evaluating special functions and distributions.
///
/// All of these are deterministic: retrying the same call with the same
/// arguments fails the same way.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistError {
    /// A parameter lies outside the mathematical domain of the function
    /// or distribution family.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A probability argument is not in `[0, 1]`.
    #[error("probability {0} is outside [0, 1]")]
    ProbabilityOutOfRange(f64),

    /// An iterative routine exhausted its iteration cap before meeting its
    /// tolerance.
    #[error("{routine} did not converge after {iterations} iterations ({context})")]
    NonConvergence {
        routine: &'static str,
        iterations: usize,
        context: String,
    },
}

pub type Result<T> = std::result::Result<T, DistError>;

pub(crate) fn check_probability(p: f64) -> Result<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(DistError::ProbabilityOutOfRange(p))
    }
}

macro_rules! ensure_param {
    ($cond:expr, $($arg:tt)+) => {
        if !($cond) {
            return Err($crate::error::DistError::InvalidParameter(format!($($arg)+)));
        }
    };
}

pub(crate) use ensure_param;
