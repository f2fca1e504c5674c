//! Log-posteriors of a few standard Bayesian models, ready to be sampled with
//! [`run_metropolis_gibbs`](crate::run_metropolis_gibbs).

use std::convert::Infallible;

use crate::{
    continuous::Gamma,
    distribution::Univariate,
    error::{ensure_param, Result},
    gibbs::LogPosterior,
    special::ln_beta_pos,
};

/// `ln(1 + e^x)` without overflow for large `x`.
fn softplus(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

/// `s * l - (s + f) * ln(1 + e^l)`, the log kernel of a binomial sample with
/// `s` successes and `f` failures at log-odds `l`.
fn logit_binomial_kernel(s: f64, f: f64, l: f64) -> f64 {
    s * l - (s + f) * softplus(l)
}

/// Log posterior of a 2x2 contingency table under a flat prior.
///
/// `theta1` is the log odds ratio and `theta2` the sum of the two log odds,
/// so the rows have log odds `(theta1 + theta2) / 2` and `(theta2 - theta1) / 2`.
pub fn log_ctable_post(s1: f64, f1: f64, s2: f64, f2: f64, theta1: f64, theta2: f64) -> f64 {
    let l1 = (theta1 + theta2) / 2.0;
    let l2 = (theta2 - theta1) / 2.0;
    logit_binomial_kernel(s1, f1, l1) + logit_binomial_kernel(s2, f2, l2)
}

/// Log posterior of `(logit eta, log K)` for the exchangeable binomial/beta
/// model: `y[i] ~ Binomial(n[i], p[i])` with `p[i] ~ Beta(K eta, K (1 - eta))`.
pub fn beta_bin_exch(theta1: f64, theta2: f64, y: &[f64], n: &[f64]) -> Result<f64> {
    ensure_param!(
        y.len() == n.len(),
        "got {} counts but {} sample sizes",
        y.len(),
        n.len()
    );
    Ok(beta_bin_exch_unchecked(theta1, theta2, y, n))
}

fn beta_bin_exch_unchecked(theta1: f64, theta2: f64, y: &[f64], n: &[f64]) -> f64 {
    let eta = 1.0 / (1.0 + (-theta1).exp());
    let k = theta2.exp();
    let likelihood: f64 = y
        .iter()
        .zip(n)
        .map(|(&y, &n)| {
            ln_beta_pos(k * eta + y, k * (1.0 - eta) + n - y)
                - ln_beta_pos(k * eta, k * (1.0 - eta))
        })
        .sum();
    likelihood + theta2 - 2.0 * softplus(theta2)
}

/// Log posterior of `theta = ln(lambda)` for Poisson counts with a
/// `Gamma(shape, rate)` prior on `lambda`.
pub fn log_poiss_gamma(theta: f64, counts: &[f64], shape: f64, rate: f64) -> Result<f64> {
    let model = PoissonGammaPosterior::new(counts.to_vec(), shape, rate)?;
    Ok(model.eval(theta))
}

/// [`log_ctable_post`] for fixed table counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CTablePosterior {
    s1: f64,
    f1: f64,
    s2: f64,
    f2: f64,
}

impl CTablePosterior {
    pub fn new(s1: f64, f1: f64, s2: f64, f2: f64) -> Result<Self> {
        ensure_param!(
            [s1, f1, s2, f2].iter().all(|c| c.is_finite() && *c >= 0.0),
            "table counts must be non-negative, got [{s1}, {f1}, {s2}, {f2}]"
        );
        Ok(CTablePosterior { s1, f1, s2, f2 })
    }
}

impl LogPosterior for CTablePosterior {
    type LogpError = Infallible;

    fn dim(&self) -> usize {
        2
    }

    fn logp(&mut self, position: &[f64]) -> std::result::Result<f64, Infallible> {
        Ok(log_ctable_post(self.s1, self.f1, self.s2, self.f2, position[0], position[1]))
    }
}

/// [`beta_bin_exch`] for fixed data.
#[derive(Debug, Clone, PartialEq)]
pub struct BetaBinExchPosterior {
    y: Vec<f64>,
    n: Vec<f64>,
}

impl BetaBinExchPosterior {
    pub fn new(y: Vec<f64>, n: Vec<f64>) -> Result<Self> {
        ensure_param!(
            y.len() == n.len(),
            "got {} counts but {} sample sizes",
            y.len(),
            n.len()
        );
        ensure_param!(
            y.iter().zip(&n).all(|(&y, &n)| 0.0 <= y && y <= n),
            "every count must lie between zero and its sample size"
        );
        Ok(BetaBinExchPosterior { y, n })
    }
}

impl LogPosterior for BetaBinExchPosterior {
    type LogpError = Infallible;

    fn dim(&self) -> usize {
        2
    }

    fn logp(&mut self, position: &[f64]) -> std::result::Result<f64, Infallible> {
        Ok(beta_bin_exch_unchecked(position[0], position[1], &self.y, &self.n))
    }
}

/// [`log_poiss_gamma`] for fixed counts and prior.
#[derive(Debug, Clone, PartialEq)]
pub struct PoissonGammaPosterior {
    prior: Gamma,
    likelihood: Gamma,
}

impl PoissonGammaPosterior {
    pub fn new(counts: Vec<f64>, shape: f64, rate: f64) -> Result<Self> {
        ensure_param!(!counts.is_empty(), "at least one count is needed");
        ensure_param!(
            counts.iter().all(|c| c.is_finite() && *c >= 0.0),
            "counts must be non-negative"
        );
        let total: f64 = counts.iter().sum();
        Ok(PoissonGammaPosterior {
            prior: Gamma::with_rate(shape, rate)?,
            // the likelihood in lambda is a Gamma(sum + 1, n) kernel
            likelihood: Gamma::with_rate(total + 1.0, counts.len() as f64)?,
        })
    }

    fn eval(&self, theta: f64) -> f64 {
        let lambda = theta.exp();
        self.likelihood.ln_pdf(lambda) + self.prior.ln_pdf(lambda) + theta
    }
}

impl LogPosterior for PoissonGammaPosterior {
    type LogpError = Infallible;

    fn dim(&self) -> usize {
        1
    }

    fn logp(&mut self, position: &[f64]) -> std::result::Result<f64, Infallible> {
        Ok(self.eval(position[0]))
    }
}
