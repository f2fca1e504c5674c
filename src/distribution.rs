use rand::Rng;

use crate::error::Result;

/// Whether a distribution puts its mass on a continuum or on the integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportKind {
    Continuous,
    Discrete,
}

/// The closed interval on which a distribution puts its mass.
///
/// Bounds may be infinite. For discrete distributions both finite bounds
/// are integers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Support {
    pub lower: f64,
    pub upper: f64,
    pub kind: SupportKind,
}

impl Support {
    pub fn continuous(lower: f64, upper: f64) -> Self {
        Support {
            lower,
            upper,
            kind: SupportKind::Continuous,
        }
    }

    pub fn discrete(lower: f64, upper: f64) -> Self {
        Support {
            lower,
            upper,
            kind: SupportKind::Discrete,
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        let inside = self.lower <= x && x <= self.upper;
        match self.kind {
            SupportKind::Continuous => inside,
            SupportKind::Discrete => inside && x.fract() == 0.0,
        }
    }
}

/// A univariate parametric distribution with validated parameters.
///
/// For discrete families `pdf` is the probability mass function and `cdf`
/// is right-continuous: a non-integer argument is evaluated at its floor.
pub trait Univariate {
    fn support(&self) -> Support;

    /// Density (or mass) at `x`, zero outside the support.
    fn pdf(&self, x: f64) -> f64 {
        self.ln_pdf(x).exp()
    }

    /// Log density (or log mass) at `x`, `-inf` outside the support.
    fn ln_pdf(&self, x: f64) -> f64;

    /// P(X <= x).
    fn cdf(&self, x: f64) -> Result<f64>;

    /// Generalized inverse of the CDF: the smallest `x` with `cdf(x) >= p`.
    ///
    /// `quantile(0)` and `quantile(1)` are the support bounds, which may be
    /// infinite. Fails with `ProbabilityOutOfRange` outside `[0, 1]`.
    fn quantile(&self, p: f64) -> Result<f64>;

    /// Draw one realization using the caller's generator.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64>;

    fn mean(&self) -> f64;

    fn variance(&self) -> f64;
}
