//! Integer-valued families.
//!
//! Each CDF is right-continuous: a non-integer argument is evaluated at its
//! floor. Quantiles come from [`DiscreteInverter`] seeded with the family's
//! first three moments, and variates from inverting a uniform draw.

use rand::{distr::Open01, Rng};

use crate::{
    distribution::{Support, Univariate},
    error::{ensure_param, Result},
    invert::{CornishFisher, DiscreteInverter},
    special::{beta_inc_reg, gamma_inc_reg_upper, ln_choose, ln_gamma_pos, xlog1py, xlogy},
};

fn integer_arg(x: f64) -> Result<f64> {
    ensure_param!(!x.is_nan(), "cannot evaluate a CDF at NaN");
    Ok(x.floor())
}

fn unit_interval(name: &str, p: f64) -> Result<f64> {
    ensure_param!((0.0..=1.0).contains(&p), "{name} must lie in [0, 1], got {p}");
    Ok(p)
}

fn sample_by_inversion<D, R>(dist: &D, rng: &mut R) -> Result<f64>
where
    D: Univariate,
    R: Rng + ?Sized,
{
    let u: f64 = rng.sample(Open01);
    dist.quantile(u)
}

/// Successes in `n` independent trials.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binomial {
    n: u64,
    p: f64,
}

impl Binomial {
    pub fn new(n: u64, p: f64) -> Result<Self> {
        Ok(Binomial {
            n,
            p: unit_interval("binomial success probability", p)?,
        })
    }

    fn skewness(&self) -> f64 {
        let variance = self.variance();
        if variance == 0.0 {
            return 0.0;
        }
        (1.0 - 2.0 * self.p) / variance.sqrt()
    }
}

impl Univariate for Binomial {
    fn support(&self) -> Support {
        Support::discrete(0.0, self.n as f64)
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        if !self.support().contains(x) {
            return f64::NEG_INFINITY;
        }
        let k = x as u64;
        ln_choose(self.n, k) + xlogy(x, self.p) + xlog1py((self.n - k) as f64, -self.p)
    }

    fn cdf(&self, x: f64) -> Result<f64> {
        let k = integer_arg(x)?;
        if k < 0.0 {
            return Ok(0.0);
        }
        if k >= self.n as f64 {
            return Ok(1.0);
        }
        beta_inc_reg(self.n as f64 - k, k + 1.0, 1.0 - self.p)
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        let seed = CornishFisher {
            mean: self.mean(),
            std_dev: self.variance().sqrt(),
            skewness: self.skewness(),
        };
        DiscreteInverter::new(|x| self.cdf(x), self.support(), seed).quantile(p)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        sample_by_inversion(self, rng)
    }

    fn mean(&self) -> f64 {
        self.n as f64 * self.p
    }

    fn variance(&self) -> f64 {
        self.n as f64 * self.p * (1.0 - self.p)
    }
}

/// Failures before the `r`-th success, with real `r > 0` (the Polya form).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NegativeBinomial {
    r: f64,
    p: f64,
}

impl NegativeBinomial {
    pub fn new(r: f64, p: f64) -> Result<Self> {
        ensure_param!(
            r.is_finite() && r > 0.0,
            "negative binomial size must be positive, got {r}"
        );
        ensure_param!(
            p > 0.0 && p <= 1.0,
            "negative binomial success probability must lie in (0, 1], got {p}"
        );
        Ok(NegativeBinomial { r, p })
    }

    fn skewness(&self) -> f64 {
        if self.p == 1.0 {
            return 0.0;
        }
        (2.0 - self.p) / (self.r * (1.0 - self.p)).sqrt()
    }
}

impl Univariate for NegativeBinomial {
    fn support(&self) -> Support {
        Support::discrete(0.0, f64::INFINITY)
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        if !self.support().contains(x) {
            return f64::NEG_INFINITY;
        }
        ln_gamma_pos(x + self.r) - ln_gamma_pos(self.r) - ln_gamma_pos(x + 1.0)
            + self.r * self.p.ln()
            + xlog1py(x, -self.p)
    }

    fn cdf(&self, x: f64) -> Result<f64> {
        let k = integer_arg(x)?;
        if k < 0.0 {
            return Ok(0.0);
        }
        if k.is_infinite() {
            return Ok(1.0);
        }
        beta_inc_reg(self.r, k + 1.0, self.p)
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        let seed = CornishFisher {
            mean: self.mean(),
            std_dev: self.variance().sqrt(),
            skewness: self.skewness(),
        };
        DiscreteInverter::new(|x| self.cdf(x), self.support(), seed).quantile(p)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        sample_by_inversion(self, rng)
    }

    fn mean(&self) -> f64 {
        self.r * (1.0 - self.p) / self.p
    }

    fn variance(&self) -> f64 {
        self.r * (1.0 - self.p) / (self.p * self.p)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Poisson {
    lambda: f64,
}

impl Poisson {
    pub fn new(lambda: f64) -> Result<Self> {
        ensure_param!(
            lambda.is_finite() && lambda > 0.0,
            "poisson mean must be positive, got {lambda}"
        );
        Ok(Poisson { lambda })
    }
}

impl Univariate for Poisson {
    fn support(&self) -> Support {
        Support::discrete(0.0, f64::INFINITY)
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        if !self.support().contains(x) {
            return f64::NEG_INFINITY;
        }
        x * self.lambda.ln() - self.lambda - ln_gamma_pos(x + 1.0)
    }

    fn cdf(&self, x: f64) -> Result<f64> {
        let k = integer_arg(x)?;
        if k < 0.0 {
            return Ok(0.0);
        }
        if k.is_infinite() {
            return Ok(1.0);
        }
        gamma_inc_reg_upper(k + 1.0, self.lambda)
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        let seed = CornishFisher {
            mean: self.lambda,
            std_dev: self.lambda.sqrt(),
            skewness: 1.0 / self.lambda.sqrt(),
        };
        DiscreteInverter::new(|x| self.cdf(x), self.support(), seed).quantile(p)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        sample_by_inversion(self, rng)
    }

    fn mean(&self) -> f64 {
        self.lambda
    }

    fn variance(&self) -> f64 {
        self.lambda
    }
}

/// Successes in `draws` draws without replacement from a population of
/// `total` items of which `successes` are marked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hypergeometric {
    total: u64,
    successes: u64,
    draws: u64,
}

impl Hypergeometric {
    pub fn new(total: u64, successes: u64, draws: u64) -> Result<Self> {
        ensure_param!(
            successes <= total && draws <= total,
            "hypergeometric needs successes ({successes}) and draws ({draws}) \
             not above the population ({total})"
        );
        Ok(Hypergeometric {
            total,
            successes,
            draws,
        })
    }

    fn lower(&self) -> u64 {
        (self.draws + self.successes).saturating_sub(self.total)
    }

    fn upper(&self) -> u64 {
        self.draws.min(self.successes)
    }

    fn ln_pmf(&self, k: u64) -> f64 {
        ln_choose(self.successes, k) + ln_choose(self.total - self.successes, self.draws - k)
            - ln_choose(self.total, self.draws)
    }

    fn mode(&self) -> u64 {
        let (big_n, m, n) = (self.total as f64, self.successes as f64, self.draws as f64);
        ((n + 1.0) * (m + 1.0) / (big_n + 2.0)).floor() as u64
    }

    /// Sum of the pmf from `start` to the support bound in one direction,
    /// upward when `up` is set. Terms shrink away from the mode, so the sum
    /// stops once they no longer change it.
    fn tail_sum(&self, start: u64, up: bool) -> f64 {
        let (m, n) = (self.successes as f64, self.draws as f64);
        let rest = self.total as f64 - m - n;
        let mut j = start;
        let mut term = self.ln_pmf(j).exp();
        let mut sum = term;
        loop {
            let jf = j as f64;
            if up {
                if j >= self.upper() {
                    break;
                }
                term *= (m - jf) * (n - jf) / ((jf + 1.0) * (rest + jf + 1.0));
                j += 1;
            } else {
                if j <= self.lower() {
                    break;
                }
                term *= jf * (rest + jf) / ((m - jf + 1.0) * (n - jf + 1.0));
                j -= 1;
            }
            if term <= sum * f64::EPSILON * 1e-3 {
                break;
            }
            sum += term;
        }
        sum
    }

    fn skewness(&self) -> f64 {
        let (big_n, m, n) = (self.total as f64, self.successes as f64, self.draws as f64);
        let spread = n * m * (big_n - m) * (big_n - n);
        if big_n <= 2.0 || spread == 0.0 {
            return 0.0;
        }
        (big_n - 2.0 * m) * (big_n - 1.0).sqrt() * (big_n - 2.0 * n)
            / (spread.sqrt() * (big_n - 2.0))
    }
}

impl Univariate for Hypergeometric {
    fn support(&self) -> Support {
        Support::discrete(self.lower() as f64, self.upper() as f64)
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        if !self.support().contains(x) {
            return f64::NEG_INFINITY;
        }
        self.ln_pmf(x as u64)
    }

    fn cdf(&self, x: f64) -> Result<f64> {
        let k = integer_arg(x)?;
        if k < self.lower() as f64 {
            return Ok(0.0);
        }
        if k >= self.upper() as f64 {
            return Ok(1.0);
        }
        let k = k as u64;
        if k < self.mode() {
            Ok(self.tail_sum(k, false).min(1.0))
        } else {
            Ok((1.0 - self.tail_sum(k + 1, true)).clamp(0.0, 1.0))
        }
    }

    fn quantile(&self, p: f64) -> Result<f64> {
        let seed = CornishFisher {
            mean: self.mean(),
            std_dev: self.variance().sqrt(),
            skewness: self.skewness(),
        };
        DiscreteInverter::new(|x| self.cdf(x), self.support(), seed).quantile(p)
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        sample_by_inversion(self, rng)
    }

    fn mean(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.draws as f64 * self.successes as f64 / self.total as f64
    }

    fn variance(&self) -> f64 {
        let (big_n, m, n) = (self.total as f64, self.successes as f64, self.draws as f64);
        if big_n <= 1.0 {
            return 0.0;
        }
        n * (m / big_n) * ((big_n - m) / big_n) * ((big_n - n) / (big_n - 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn check_cdf<D: Univariate>(dist: &D, expected: &[f64]) {
        for (k, &want) in expected.iter().enumerate() {
            let got = dist.cdf(k as f64).unwrap();
            assert!((got - want).abs() <= 1e-5 * want, "k={k}: {got} vs {want}");
            // right-continuous between integers
            assert_eq!(dist.cdf(k as f64 + 0.5).unwrap(), got);
        }
    }

    #[test]
    fn binomial_cdf() {
        let d = Binomial::new(20, 0.3).unwrap();
        check_cdf(
            &d,
            &[
                0.000797923, 0.00763726, 0.0354831, 0.107087, 0.237508, 0.416371, 0.608010,
                0.772272, 0.886669, 0.952038, 0.982855, 0.994862,
            ],
        );
        assert_eq!(d.cdf(-0.5).unwrap(), 0.0);
        assert_eq!(d.cdf(20.0).unwrap(), 1.0);
    }

    #[test]
    fn poisson_cdf() {
        let d = Poisson::new(4.5).unwrap();
        check_cdf(
            &d,
            &[
                0.0111090, 0.0610995, 0.173578, 0.342296, 0.532104, 0.702930, 0.831051, 0.913414,
                0.959743, 0.982907, 0.993331, 0.997596,
            ],
        );
    }

    #[test]
    fn negative_binomial_cdf() {
        let d = NegativeBinomial::new(3.5, 0.4).unwrap();
        check_cdf(
            &d,
            &[
                0.0404772, 0.125479, 0.240232, 0.366460, 0.489532, 0.600297, 0.694448, 0.771113,
                0.831487, 0.877773, 0.912488, 0.938051, 0.956584, 0.969843, 0.979218,
            ],
        );
    }

    #[test]
    fn hypergeometric_cdf() {
        let d = Hypergeometric::new(50, 20, 10).unwrap();
        check_cdf(
            &d,
            &[
                0.00292486, 0.0307807, 0.139039, 0.364968, 0.645027, 0.860112, 0.963518, 0.994157,
                0.999491, 0.999982, 1.0,
            ],
        );
        assert_abs_diff_eq!(d.mean(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn hypergeometric_cdf_matches_direct_sum() {
        let d = Hypergeometric::new(400, 130, 170).unwrap();
        let mut direct = 0.0;
        for k in d.lower()..=d.upper() {
            direct += d.ln_pmf(k).exp();
            assert_abs_diff_eq!(d.cdf(k as f64).unwrap(), direct.min(1.0), epsilon = 1e-10);
        }
    }

    #[test]
    fn wide_hypergeometric_quantile() {
        let d = Hypergeometric::new(4_000_000, 1_500_000, 2_000_000).unwrap();
        let q = d.quantile(0.4).unwrap();
        assert!(d.cdf(q).unwrap() >= 0.4 * (1.0 - 64.0 * f64::EPSILON));
        assert!(d.cdf(q - 1.0).unwrap() < 0.4);
        assert_abs_diff_eq!(q, d.mean(), epsilon = 5.0 * d.variance().sqrt());
    }

    #[test]
    fn pmf_sums_to_one() {
        let b = Binomial::new(20, 0.3).unwrap();
        let total: f64 = (0..=20).map(|k| b.pdf(k as f64)).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);

        let h = Hypergeometric::new(50, 20, 10).unwrap();
        let total: f64 = (0..=10).map(|k| h.pdf(k as f64)).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);

        let nb = NegativeBinomial::new(3.5, 0.4).unwrap();
        let total: f64 = (0..400).map(|k| nb.pdf(k as f64)).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-10);
        assert_eq!(b.pdf(2.5), 0.0);
    }

    #[test]
    fn quantiles_at_the_edges() {
        let b = Binomial::new(20, 0.3).unwrap();
        assert_eq!(b.quantile(0.0).unwrap(), 0.0);
        assert_eq!(b.quantile(1.0).unwrap(), 20.0);
        assert_eq!(b.quantile(0.5).unwrap(), 6.0);
        // cdf(4) = 0.237508..., so anything just above maps to 5
        assert_eq!(b.quantile(0.2376).unwrap(), 5.0);

        let p = Poisson::new(4.5).unwrap();
        assert_eq!(p.quantile(1.0).unwrap(), f64::INFINITY);
        assert_eq!(p.quantile(0.99).unwrap(), 10.0);

        let h = Hypergeometric::new(50, 45, 10).unwrap();
        assert_eq!(h.quantile(0.0).unwrap(), 5.0);
        assert_eq!(h.quantile(1.0).unwrap(), 10.0);
        assert!(h.quantile(1.2).is_err());
    }

    #[test]
    fn large_poisson_quantile() {
        let p = Poisson::new(250_000.0).unwrap();
        let q = p.quantile(0.3).unwrap();
        assert!(p.cdf(q).unwrap() >= 0.3 * (1.0 - 64.0 * f64::EPSILON));
        assert!(p.cdf(q - 1.0).unwrap() < 0.3);
    }

    #[test]
    fn inversion_sampling_mean() {
        let mut rng = StdRng::seed_from_u64(42);
        let nb = NegativeBinomial::new(3.5, 0.4).unwrap();
        let n = 50_000;
        let mean = (0..n).map(|_| nb.sample(&mut rng).unwrap()).sum::<f64>() / n as f64;
        assert!((mean - 5.25).abs() < 0.1, "mean {mean}");
    }

    #[test]
    fn degenerate_probabilities_are_point_masses() {
        let mut rng = StdRng::seed_from_u64(42);

        let sure = Binomial::new(10, 1.0).unwrap();
        assert_eq!(sure.pdf(10.0), 1.0);
        assert_eq!(sure.pdf(9.0), 0.0);
        assert_eq!(sure.cdf(9.0).unwrap(), 0.0);
        assert_eq!(sure.cdf(10.0).unwrap(), 1.0);
        assert_eq!(sure.quantile(0.3).unwrap(), 10.0);
        assert_eq!(sure.variance(), 0.0);
        assert_eq!(sure.sample(&mut rng).unwrap(), 10.0);

        let never = Binomial::new(10, 0.0).unwrap();
        assert_eq!(never.pdf(0.0), 1.0);
        assert_eq!(never.pdf(1.0), 0.0);
        assert_eq!(never.cdf(0.0).unwrap(), 1.0);
        assert_eq!(never.quantile(0.7).unwrap(), 0.0);
        assert_eq!(never.sample(&mut rng).unwrap(), 0.0);

        let nb = NegativeBinomial::new(2.5, 1.0).unwrap();
        assert_abs_diff_eq!(nb.pdf(0.0), 1.0, epsilon = 1e-12);
        assert_eq!(nb.pdf(3.0), 0.0);
        assert_eq!(nb.cdf(0.0).unwrap(), 1.0);
        assert_eq!(nb.quantile(0.999).unwrap(), 0.0);
        assert_eq!(nb.mean(), 0.0);
        assert_eq!(nb.sample(&mut rng).unwrap(), 0.0);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(Binomial::new(10, 1.5).is_err());
        assert!(Binomial::new(10, -0.1).is_err());
        assert!(Binomial::new(10, f64::NAN).is_err());
        assert!(NegativeBinomial::new(2.0, 0.0).is_err());
        assert!(NegativeBinomial::new(0.0, 0.5).is_err());
        assert!(Poisson::new(-1.0).is_err());
        assert!(Hypergeometric::new(10, 11, 2).is_err());
        assert!(Binomial::new(10, 0.5).unwrap().cdf(f64::NAN).is_err());
    }
}
