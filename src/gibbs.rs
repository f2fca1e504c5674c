use std::convert::Infallible;

use rand::Rng;
use thiserror::Error;
use tracing::trace;

use crate::{sampler::Progress, variate::standard_normal};

/// Errors that happen when we evaluate the log-posterior
pub trait LogpError: std::error::Error {
    /// Unrecoverable errors stop the chain, recoverable ones reject the
    /// proposal that caused them.
    fn is_recoverable(&self) -> bool;
}

impl LogpError for Infallible {
    fn is_recoverable(&self) -> bool {
        match *self {}
    }
}

/// An unnormalized log-posterior density on `R^dim`.
pub trait LogPosterior {
    type LogpError: LogpError + Send + Sync + 'static;

    fn dim(&self) -> usize;

    /// Log density at `position`, up to an additive constant.
    ///
    /// Non-finite values are allowed and count as zero density.
    fn logp(&mut self, position: &[f64]) -> Result<f64, Self::LogpError>;
}

/// Adapts a plain closure into a [`LogPosterior`] that never fails.
#[derive(Debug, Clone)]
pub struct LogpFn<F> {
    dim: usize,
    func: F,
}

impl<F> LogpFn<F>
where
    F: FnMut(&[f64]) -> f64,
{
    pub fn new(dim: usize, func: F) -> Self {
        LogpFn { dim, func }
    }
}

impl<F> LogPosterior for LogpFn<F>
where
    F: FnMut(&[f64]) -> f64,
{
    type LogpError = Infallible;

    fn dim(&self) -> usize {
        self.dim
    }

    fn logp(&mut self, position: &[f64]) -> Result<f64, Infallible> {
        Ok((self.func)(position))
    }
}

#[derive(Error, Debug)]
pub enum GibbsError {
    #[error("start position is empty")]
    EmptyStart,
    #[error("expected {expected} values, got {found}")]
    ScaleMismatch { expected: usize, found: usize },
    #[error("proposal scale {value} for coordinate {index} is not positive and finite")]
    InvalidScale { index: usize, value: f64 },
    #[error("log-posterior at the start position is not finite: {0}")]
    InvalidStart(String),
    /// [`GibbsChain::draw`] was called before [`GibbsChain::set_position`].
    #[error("chain was drawn from before a start position was set")]
    NoPosition,
    #[error("Logp function returned unrecoverable error")]
    LogpFailure(Box<dyn std::error::Error + Send + Sync>),
}

/// A single Metropolis-within-Gibbs chain.
///
/// Each call to [`GibbsChain::draw`] performs one sweep: every coordinate in
/// turn gets a Gaussian random-walk proposal that is accepted with the usual
/// Metropolis probability.
pub struct GibbsChain<P, R>
where
    P: LogPosterior,
    R: Rng,
{
    logpost: P,
    rng: R,
    scale: Box<[f64]>,
    position: Box<[f64]>,
    proposal: Box<[f64]>,
    logp: Option<f64>,
    accepted: Box<[u64]>,
    chain: u64,
    draw_count: u64,
}

impl<P, R> GibbsChain<P, R>
where
    P: LogPosterior,
    R: Rng,
{
    pub fn new(logpost: P, scale: &[f64], chain: u64, rng: R) -> Result<Self, GibbsError> {
        let dim = logpost.dim();
        if dim == 0 {
            return Err(GibbsError::EmptyStart);
        }
        if scale.len() != dim {
            return Err(GibbsError::ScaleMismatch {
                expected: dim,
                found: scale.len(),
            });
        }
        if let Some(index) = scale.iter().position(|s| !(s.is_finite() && *s > 0.0)) {
            return Err(GibbsError::InvalidScale {
                index,
                value: scale[index],
            });
        }

        Ok(GibbsChain {
            logpost,
            rng,
            scale: scale.into(),
            position: vec![0f64; dim].into(),
            proposal: vec![0f64; dim].into(),
            logp: None,
            accepted: vec![0u64; dim].into(),
            chain,
            draw_count: 0,
        })
    }

    /// Move the chain to `start`. The log-posterior there must be finite.
    pub fn set_position(&mut self, start: &[f64]) -> Result<(), GibbsError> {
        if start.is_empty() {
            return Err(GibbsError::EmptyStart);
        }
        if start.len() != self.dim() {
            return Err(GibbsError::ScaleMismatch {
                expected: self.dim(),
                found: start.len(),
            });
        }
        let logp = match self.logpost.logp(start) {
            Ok(logp) if logp.is_finite() => logp,
            Ok(logp) => return Err(GibbsError::InvalidStart(logp.to_string())),
            Err(err) if err.is_recoverable() => {
                return Err(GibbsError::InvalidStart(err.to_string()))
            }
            Err(err) => return Err(GibbsError::LogpFailure(Box::new(err))),
        };
        self.position.copy_from_slice(start);
        self.proposal.copy_from_slice(start);
        self.logp = Some(logp);
        Ok(())
    }

    /// Run one sweep over all coordinates and return the new position.
    pub fn draw(&mut self) -> Result<(Box<[f64]>, Progress), GibbsError> {
        let mut logp = self.logp.ok_or(GibbsError::NoPosition)?;
        let mut num_accepted = 0;

        for j in 0..self.position.len() {
            self.proposal[j] = self.position[j] + standard_normal(&mut self.rng) * self.scale[j];
            let proposed = match self.logpost.logp(&self.proposal) {
                Ok(value) if value.is_finite() => Some(value),
                Ok(_) => None,
                Err(err) if err.is_recoverable() => {
                    trace!(chain = self.chain, coordinate = j, %err, "rejected proposal");
                    None
                }
                Err(err) => return Err(GibbsError::LogpFailure(Box::new(err))),
            };

            let u: f64 = self.rng.random();
            match proposed {
                Some(value) if u < (value - logp).min(0.0).exp() => {
                    self.position[j] = self.proposal[j];
                    logp = value;
                    self.accepted[j] += 1;
                    num_accepted += 1;
                }
                _ => self.proposal[j] = self.position[j],
            }
        }
        self.logp = Some(logp);

        let progress = Progress {
            draw: self.draw_count,
            chain: self.chain,
            logp,
            num_accepted,
        };
        self.draw_count += 1;
        Ok((self.position.clone(), progress))
    }

    pub fn dim(&self) -> usize {
        self.position.len()
    }

    pub fn chain(&self) -> u64 {
        self.chain
    }

    pub fn position(&self) -> &[f64] {
        &self.position
    }

    /// Accepted proposals per coordinate since the chain was created.
    pub fn accepted(&self) -> &[u64] {
        &self.accepted
    }
}
