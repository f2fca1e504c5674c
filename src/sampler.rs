use anyhow::{Context, Result};
use itertools::Itertools;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{
    gibbs::{GibbsChain, GibbsError, LogPosterior},
    trace::ChainTrace,
};

/// Settings for running several independent chains.
#[derive(Debug, Clone, Copy)]
pub struct GibbsSettings {
    /// The number of sweeps per chain.
    pub num_draws: u64,
    pub num_chains: usize,
    /// Every chain is seeded with this value and gets its own stream.
    pub seed: u64,
}

impl Default for GibbsSettings {
    fn default() -> Self {
        Self {
            num_draws: 1000,
            num_chains: 4,
            seed: 0,
        }
    }
}

/// Information about one sweep of a chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// The index of the sweep within its chain.
    pub draw: u64,
    pub chain: u64,
    /// Log-posterior at the position after the sweep.
    pub logp: f64,
    /// How many coordinates moved during the sweep.
    pub num_accepted: usize,
}

/// Run a single Metropolis-within-Gibbs chain for `iterations` sweeps.
///
/// `scale[j]` is the standard deviation of the random-walk proposal for
/// coordinate `j`. The returned trace holds one row per sweep and the number
/// of accepted proposals per coordinate.
pub fn run_metropolis_gibbs<P, R>(
    logpost: P,
    start: &[f64],
    iterations: u64,
    scale: &[f64],
    rng: &mut R,
) -> std::result::Result<ChainTrace, GibbsError>
where
    P: LogPosterior,
    R: Rng + ?Sized,
{
    run_chain(logpost, start, iterations, scale, 0, rng)
}

fn run_chain<P, R>(
    logpost: P,
    start: &[f64],
    iterations: u64,
    scale: &[f64],
    chain_id: u64,
    rng: &mut R,
) -> std::result::Result<ChainTrace, GibbsError>
where
    P: LogPosterior,
    R: Rng + ?Sized,
{
    let mut chain = GibbsChain::new(logpost, scale, chain_id, rng)?;
    chain.set_position(start)?;

    let dim = chain.dim();
    debug!(chain = chain_id, dim, iterations, "starting chain");

    let mut trace = ChainTrace::with_capacity(chain_id, dim, iterations as usize);
    for _ in 0..iterations {
        let (point, progress) = chain.draw()?;
        trace.append_value(&point, progress.logp);
    }
    let trace = trace.finalize(chain.accepted());

    let rates = trace.accept_rates();
    debug!(chain = chain_id, ?rates, "finished chain");
    for (coordinate, &count) in trace.accepted().iter().enumerate() {
        if count == 0 && iterations > 0 {
            warn!(
                chain = chain_id,
                coordinate, "no proposal was accepted, the proposal scale is probably too large"
            );
        }
    }
    Ok(trace)
}

/// Iterate over the draws of one chain as they are produced.
pub fn sample_sequentially<'a, P, R>(
    logpost: P,
    scale: &[f64],
    start: &[f64],
    draws: u64,
    chain: u64,
    rng: &'a mut R,
) -> std::result::Result<
    impl Iterator<Item = std::result::Result<(Box<[f64]>, Progress), GibbsError>> + 'a,
    GibbsError,
>
where
    P: LogPosterior + 'a,
    R: Rng + ?Sized,
{
    let mut sampler = GibbsChain::new(logpost, scale, chain, rng)?;
    sampler.set_position(start)?;
    Ok((0..draws).map(move |_| sampler.draw()))
}

/// Run `settings.num_chains` independent chains on the rayon thread pool.
///
/// `make_logpost` is called once per chain with the chain index, on the
/// thread that runs the chain. Chain `i` draws from a `ChaCha8Rng` seeded
/// with `settings.seed` on stream `i`, so the result does not depend on
/// scheduling.
pub fn sample_parallel<F, P>(
    make_logpost: F,
    start: &[f64],
    scale: &[f64],
    settings: &GibbsSettings,
) -> Result<Vec<ChainTrace>>
where
    F: Fn(u64) -> P + Sync,
    P: LogPosterior,
{
    let traces: Vec<ChainTrace> = (0..settings.num_chains as u64)
        .into_par_iter()
        .map(|chain_id| {
            let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
            rng.set_stream(chain_id);
            run_chain(
                make_logpost(chain_id),
                start,
                settings.num_draws,
                scale,
                chain_id,
                &mut rng,
            )
            .with_context(|| format!("Chain {chain_id} failed"))
        })
        .collect::<Result<_>>()?;

    debug!(
        chains = traces.len(),
        means = ?traces.iter().map(|t| t.mean()).collect_vec(),
        "finished sampling"
    );
    Ok(traces)
}
