use itertools::izip;

/// Draws of one finished chain, stored row-major: one row of `dim` values per
/// sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainTrace {
    chain: u64,
    dim: usize,
    draws: Vec<f64>,
    logp: Vec<f64>,
    accepted: Vec<u64>,
}

impl ChainTrace {
    pub(crate) fn with_capacity(chain: u64, dim: usize, num_draws: usize) -> Self {
        ChainTrace {
            chain,
            dim,
            draws: Vec::with_capacity(dim * num_draws),
            logp: Vec::with_capacity(num_draws),
            accepted: vec![0; dim],
        }
    }

    pub(crate) fn append_value(&mut self, point: &[f64], logp: f64) {
        debug_assert_eq!(point.len(), self.dim);
        self.draws.extend_from_slice(point);
        self.logp.push(logp);
    }

    pub(crate) fn finalize(mut self, accepted: &[u64]) -> Self {
        self.accepted.copy_from_slice(accepted);
        self
    }

    pub fn chain(&self) -> u64 {
        self.chain
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn num_draws(&self) -> usize {
        self.logp.len()
    }

    /// All draws as one row-major `num_draws x dim` slice.
    pub fn draws(&self) -> &[f64] {
        &self.draws
    }

    pub fn draw(&self, index: usize) -> Option<&[f64]> {
        self.draws.chunks_exact(self.dim).nth(index)
    }

    /// Log-posterior at the end of every sweep.
    pub fn logp(&self) -> &[f64] {
        &self.logp
    }

    pub fn accepted(&self) -> &[u64] {
        &self.accepted
    }

    /// Fraction of accepted proposals per coordinate.
    pub fn accept_rates(&self) -> Vec<f64> {
        let n = self.num_draws().max(1) as f64;
        self.accepted.iter().map(|&a| a as f64 / n).collect()
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        self.draws.iter().skip(index).step_by(self.dim).copied()
    }

    /// Per-coordinate mean over all draws.
    pub fn mean(&self) -> Vec<f64> {
        let mut sums = vec![0f64; self.dim];
        for row in self.draws.chunks_exact(self.dim) {
            for (sum, &x) in izip!(sums.iter_mut(), row) {
                *sum += x;
            }
        }
        let n = self.num_draws().max(1) as f64;
        sums.iter_mut().for_each(|s| *s /= n);
        sums
    }

    /// Drop the first `burn_in` draws, e.g. before computing posterior summaries.
    pub fn discard(&self, burn_in: usize) -> ChainTrace {
        let burn_in = burn_in.min(self.num_draws());
        ChainTrace {
            chain: self.chain,
            dim: self.dim,
            draws: self.draws[burn_in * self.dim..].to_vec(),
            logp: self.logp[burn_in..].to_vec(),
            accepted: self.accepted.clone(),
        }
    }
}
