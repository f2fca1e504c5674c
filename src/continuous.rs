//! Continuous parametric families.
//!
//! Families with an elementary CDF invert it in closed form. The others
//! evaluate their CDF through the incomplete beta and gamma functions and
//! bisect it for quantiles.

use rand::Rng;

use crate::{
    distribution::{Support, Univariate},
    error::{check_probability, ensure_param, Result},
    invert::{ContinuousInverter, InversionOptions},
    special::{
        beta_inc_reg, gamma_inc_reg, ln_beta_pos, ln_gamma_pos, std_normal_cdf, std_normal_quantile,
        xlogy,
    },
    variate,
};

fn positive(name: &str, value: f64) -> Result<f64> {
    ensure_param!(
        value.is_finite() && value > 0.0,
        "{name} must be positive and finite, got {value}"
    );
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    mean: f64,
    std_dev: f64,
}

impl Normal {
    pub fn new(mean: f64, std_dev: f64) -> Result<Self> {
        ensure_param!(mean.is_finite(), "normal mean must be finite, got {mean}");
        Ok(Normal {
            mean,
            std_dev: positive("normal standard deviation", std_dev)?,
        })
    }

    pub fn standard() -> Self {
        Normal {
            mean: 0.0,
            std_dev: 1.0,
        }
    }
}

impl Univariate for Normal {
    fn support(&self) -> Support {
        Support::continuous(f64::NEG_INFINITY, f64::INFINITY)
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.std_dev;
        -0.5 * z * z - self.std_dev.ln() - 0.5 * (2.0 * std::f64::consts::PI).ln()
    }

    fn cdf(&self, x: f64) -> Result<f64> {
        std_normal_cdf((x - self.mean) / self.std_dev)
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        Ok(self.mean + self.std_dev * std_normal_quantile(p)?)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        Ok(self.mean + self.std_dev * variate::standard_normal(rng))
    }

    fn mean(&self) -> f64 {
        self.mean
    }

    fn variance(&self) -> f64 {
        self.std_dev * self.std_dev
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    rate: f64,
}

impl Exponential {
    pub fn new(rate: f64) -> Result<Self> {
        Ok(Exponential {
            rate: positive("exponential rate", rate)?,
        })
    }
}

impl Univariate for Exponential {
    fn support(&self) -> Support {
        Support::continuous(0.0, f64::INFINITY)
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            return f64::NEG_INFINITY;
        }
        self.rate.ln() - self.rate * x
    }

    fn cdf(&self, x: f64) -> Result<f64> {
        if x <= 0.0 {
            return Ok(0.0);
        }
        Ok(-(-self.rate * x).exp_m1())
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        check_probability(p)?;
        Ok(-(-p).ln_1p() / self.rate)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        variate::exponential(rng, self.rate)
    }

    fn mean(&self) -> f64 {
        1.0 / self.rate
    }

    fn variance(&self) -> f64 {
        1.0 / (self.rate * self.rate)
    }
}

/// Gamma distribution in the shape/scale parametrization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gamma {
    shape: f64,
    scale: f64,
}

impl Gamma {
    pub fn new(shape: f64, scale: f64) -> Result<Self> {
        Ok(Gamma {
            shape: positive("gamma shape", shape)?,
            scale: positive("gamma scale", scale)?,
        })
    }

    /// Shape/rate parametrization, as used by conjugate Poisson models.
    pub fn with_rate(shape: f64, rate: f64) -> Result<Self> {
        Gamma::new(shape, 1.0 / positive("gamma rate", rate)?)
    }

    pub fn shape(&self) -> f64 {
        self.shape
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl Univariate for Gamma {
    fn support(&self) -> Support {
        Support::continuous(0.0, f64::INFINITY)
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            return f64::NEG_INFINITY;
        }
        let y = x / self.scale;
        xlogy(self.shape - 1.0, y) - y - ln_gamma_pos(self.shape) - self.scale.ln()
    }

    fn cdf(&self, x: f64) -> Result<f64> {
        if x <= 0.0 {
            return Ok(0.0);
        }
        gamma_inc_reg(self.shape, x / self.scale)
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        ContinuousInverter::new(|x| self.cdf(x), self.support(), InversionOptions::default())
            .quantile(p)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        variate::gamma(rng, self.shape, self.scale)
    }

    fn mean(&self) -> f64 {
        self.shape * self.scale
    }

    fn variance(&self) -> f64 {
        self.shape * self.scale * self.scale
    }
}

/// Chi-squared with `k` (possibly fractional) degrees of freedom, i.e.
/// `Gamma(k/2, 2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquared {
    dof: f64,
    gamma: Gamma,
}

impl ChiSquared {
    pub fn new(dof: f64) -> Result<Self> {
        let dof = positive("chi-squared degrees of freedom", dof)?;
        Ok(ChiSquared {
            dof,
            gamma: Gamma::new(dof / 2.0, 2.0)?,
        })
    }

    pub fn dof(&self) -> f64 {
        self.dof
    }
}

impl Univariate for ChiSquared {
    fn support(&self) -> Support {
        self.gamma.support()
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        self.gamma.ln_pdf(x)
    }

    fn cdf(&self, x: f64) -> Result<f64> {
        self.gamma.cdf(x)
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        self.gamma.quantile(p)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        self.gamma.sample(rng)
    }

    fn mean(&self) -> f64 {
        self.dof
    }

    fn variance(&self) -> f64 {
        2.0 * self.dof
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beta {
    a: f64,
    b: f64,
}

impl Beta {
    pub fn new(a: f64, b: f64) -> Result<Self> {
        Ok(Beta {
            a: positive("beta shape a", a)?,
            b: positive("beta shape b", b)?,
        })
    }
}

impl Univariate for Beta {
    fn support(&self) -> Support {
        Support::continuous(0.0, 1.0)
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        if !(0.0..=1.0).contains(&x) {
            return f64::NEG_INFINITY;
        }
        xlogy(self.a - 1.0, x) + xlogy(self.b - 1.0, 1.0 - x) - ln_beta_pos(self.a, self.b)
    }

    fn cdf(&self, x: f64) -> Result<f64> {
        beta_inc_reg(self.a, self.b, x.clamp(0.0, 1.0))
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        ContinuousInverter::new(|x| self.cdf(x), self.support(), InversionOptions::default())
            .quantile(p)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        variate::beta(rng, self.a, self.b)
    }

    fn mean(&self) -> f64 {
        self.a / (self.a + self.b)
    }

    fn variance(&self) -> f64 {
        let s = self.a + self.b;
        self.a * self.b / (s * s * (s + 1.0))
    }
}

/// Beta distribution moved to `[min, max]` by `y = min + (max - min) x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Beta4 {
    unit: Beta,
    min: f64,
    max: f64,
}

impl Beta4 {
    pub fn new(a: f64, b: f64, min: f64, max: f64) -> Result<Self> {
        ensure_param!(
            min.is_finite() && max.is_finite() && min < max,
            "four-parameter beta needs finite min < max, got [{min}, {max}]"
        );
        Ok(Beta4 {
            unit: Beta::new(a, b)?,
            min,
            max,
        })
    }

    fn width(&self) -> f64 {
        self.max - self.min
    }
}

impl Univariate for Beta4 {
    fn support(&self) -> Support {
        Support::continuous(self.min, self.max)
    }

    fn ln_pdf(&self, y: f64) -> f64 {
        self.unit.ln_pdf((y - self.min) / self.width()) - self.width().ln()
    }

    fn cdf(&self, y: f64) -> Result<f64> {
        self.unit.cdf((y - self.min) / self.width())
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        Ok(self.min + self.width() * self.unit.quantile(p)?)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        Ok(self.min + self.width() * self.unit.sample(rng)?)
    }

    fn mean(&self) -> f64 {
        self.min + self.width() * self.unit.mean()
    }

    fn variance(&self) -> f64 {
        self.width() * self.width() * self.unit.variance()
    }
}

/// Generalized Pareto distribution of Klugman, Panjer and Willmot.
///
/// With `u = x / (x + scale)`, `u` follows `Beta(shape2, shape1)`. Lomax
/// (Pareto type II) is the case `shape2 = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneralizedPareto {
    shape1: f64,
    shape2: f64,
    scale: f64,
    u: Beta,
}

impl GeneralizedPareto {
    pub fn new(shape1: f64, shape2: f64, scale: f64) -> Result<Self> {
        let shape1 = positive("generalized Pareto shape1", shape1)?;
        let shape2 = positive("generalized Pareto shape2", shape2)?;
        Ok(GeneralizedPareto {
            shape1,
            shape2,
            scale: positive("generalized Pareto scale", scale)?,
            u: Beta::new(shape2, shape1)?,
        })
    }

    pub fn lomax(scale: f64, shape: f64) -> Result<Self> {
        GeneralizedPareto::new(shape, 1.0, scale)
    }

    fn from_unit(&self, u: f64) -> f64 {
        if u >= 1.0 {
            f64::INFINITY
        } else {
            self.scale * u / (1.0 - u)
        }
    }

    /// `E[X^k]`, infinite unless `-shape2 < k < shape1`.
    fn raw_moment(&self, k: f64) -> f64 {
        if k <= -self.shape2 || k >= self.shape1 {
            return f64::INFINITY;
        }
        (k * self.scale.ln() + ln_beta_pos(self.shape1 - k, self.shape2 + k)
            - ln_beta_pos(self.shape1, self.shape2))
        .exp()
    }
}

impl Univariate for GeneralizedPareto {
    fn support(&self) -> Support {
        Support::continuous(0.0, f64::INFINITY)
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            return f64::NEG_INFINITY;
        }
        // x^(t-1) θ^a / (B(a, t) (x + θ)^(a+t))
        xlogy(self.shape2 - 1.0, x) + self.shape1 * self.scale.ln()
            - (self.shape1 + self.shape2) * (x + self.scale).ln()
            - ln_beta_pos(self.shape1, self.shape2)
    }

    fn cdf(&self, x: f64) -> Result<f64> {
        if x <= 0.0 {
            return Ok(0.0);
        }
        if x.is_infinite() {
            return Ok(1.0);
        }
        self.u.cdf(x / (x + self.scale))
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        Ok(self.from_unit(self.u.quantile(p)?))
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        Ok(self.from_unit(self.u.sample(rng)?))
    }

    fn mean(&self) -> f64 {
        self.raw_moment(1.0)
    }

    fn variance(&self) -> f64 {
        let m = self.mean();
        self.raw_moment(2.0) - m * m
    }
}
