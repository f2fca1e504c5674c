//! Numerical inversion of monotone CDFs.
//!
//! Continuous quantiles come from bisection over the support, with an
//! expanding search when a bound is infinite. Discrete quantiles start from a
//! Cornish-Fisher estimate, bracket the target with a doubling step and then
//! bisect on the integers.

use tracing::trace;

use crate::{
    distribution::Support,
    error::{check_probability, ensure_param, DistError, Result},
    special::std_normal_quantile,
};

/// Settings for numerical CDF inversion.
#[derive(Debug, Clone, Copy)]
pub struct InversionOptions {
    /// Bisection stops once the bracket is narrower than this. Below
    /// magnitude one the width is measured relative to the bracket bounds.
    pub precision: f64,
    /// Cap on bisection steps and on CDF evaluations in the discrete search.
    pub max_iter: usize,
    /// Cap on bracket doublings when a support bound is infinite.
    pub max_expansions: usize,
}

impl Default for InversionOptions {
    fn default() -> InversionOptions {
        InversionOptions {
            precision: 1e-9,
            max_iter: 10_000,
            max_expansions: 2_000,
        }
    }
}

/// Quantile by bisection: an `x` within `options.precision` of
/// `min{x : cdf(x) >= p}` on `[lower, upper]`.
///
/// `p = 0` returns `lower` and `p = 1` returns `upper`, either of which may
/// be infinite.
pub fn bisect<F>(cdf: F, lower: f64, upper: f64, p: f64, options: &InversionOptions) -> Result<f64>
where
    F: Fn(f64) -> Result<f64>,
{
    check_probability(p)?;
    ensure_param!(
        lower < upper && !lower.is_nan() && !upper.is_nan(),
        "bisection needs lower < upper, got [{lower}, {upper}]"
    );
    ensure_param!(options.precision > 0.0, "precision must be positive");

    if p == 0.0 {
        return Ok(lower);
    }
    if p == 1.0 {
        return Ok(upper);
    }

    let (mut lo, mut hi) = bracket(&cdf, lower, upper, p, options)?;

    let mut iterations = 0;
    while hi - lo > options.precision * lo.abs().max(hi.abs()).min(1.0) {
        let mid = lo + 0.5 * (hi - lo);
        if mid <= lo || mid >= hi {
            // no representable point left between the bounds
            break;
        }
        if cdf(mid)? >= p {
            hi = mid;
        } else {
            lo = mid;
        }
        iterations += 1;
        if iterations >= options.max_iter {
            return Err(DistError::NonConvergence {
                routine: "bisect",
                iterations,
                context: format!("p={p}, bracket=[{lo}, {hi}]"),
            });
        }
    }
    Ok(lo + 0.5 * (hi - lo))
}

/// Find finite `lo < hi` with `cdf(lo) < p <= cdf(hi)`, except that a finite
/// support bound is kept as is.
fn bracket<F>(
    cdf: &F,
    lower: f64,
    upper: f64,
    p: f64,
    options: &InversionOptions,
) -> Result<(f64, f64)>
where
    F: Fn(f64) -> Result<f64>,
{
    if lower.is_finite() && upper.is_finite() {
        return Ok((lower, upper));
    }

    let anchor = if lower.is_finite() {
        lower
    } else if upper.is_finite() {
        upper
    } else {
        0.0
    };
    let expand_up = if lower.is_finite() {
        true
    } else if upper.is_finite() {
        false
    } else {
        cdf(anchor)? < p
    };

    let mut step = 1.0;
    let mut inner = anchor;
    for expansion in 0..options.max_expansions {
        let outer = if expand_up { anchor + step } else { anchor - step };
        let reached = cdf(outer)? >= p;
        if reached == expand_up {
            trace!(expansion, inner, outer, "bracketed quantile");
            return Ok(if expand_up { (inner, outer) } else { (outer, inner) });
        }
        inner = outer;
        step *= 2.0;
    }

    Err(DistError::NonConvergence {
        routine: "bisect",
        iterations: options.max_expansions,
        context: format!("could not bracket p={p} starting from {anchor}"),
    })
}

/// A quantile function obtained by bisecting a continuous CDF.
#[derive(Debug, Clone)]
pub struct ContinuousInverter<F> {
    cdf: F,
    lower: f64,
    upper: f64,
    options: InversionOptions,
}

/// Turn a continuous, monotone CDF on `[lower, upper]` into a quantile function.
pub fn invert<F>(cdf: F, lower: f64, upper: f64, precision: f64) -> ContinuousInverter<F>
where
    F: Fn(f64) -> Result<f64>,
{
    ContinuousInverter {
        cdf,
        lower,
        upper,
        options: InversionOptions {
            precision,
            ..Default::default()
        },
    }
}

impl<F> ContinuousInverter<F>
where
    F: Fn(f64) -> Result<f64>,
{
    pub fn new(cdf: F, support: Support, options: InversionOptions) -> Self {
        ContinuousInverter {
            cdf,
            lower: support.lower,
            upper: support.upper,
            options,
        }
    }

    pub fn quantile(&self, p: f64) -> Result<f64> {
        bisect(&self.cdf, self.lower, self.upper, p, &self.options)
    }
}

/// The first three moments used to seed a discrete quantile search.
#[derive(Debug, Clone, Copy)]
pub struct CornishFisher {
    pub mean: f64,
    pub std_dev: f64,
    pub skewness: f64,
}

impl CornishFisher {
    /// Normal approximation with the skewness correction, rounded to an integer.
    pub fn estimate(&self, p: f64) -> Result<f64> {
        if self.std_dev == 0.0 {
            return Ok((self.mean + 0.5).floor());
        }
        let z = std_normal_quantile(p)?;
        let corrected = z + self.skewness * (z * z - 1.0) / 6.0;
        Ok((self.mean + self.std_dev * corrected + 0.5).floor())
    }
}

/// Supports at least this wide start the search with a coarse increment.
const COARSE_SEARCH_SPAN: f64 = 1e5;

/// A quantile function for an integer-valued distribution.
#[derive(Debug, Clone)]
pub struct DiscreteInverter<F> {
    cdf: F,
    lower: f64,
    upper: f64,
    seed: CornishFisher,
    options: InversionOptions,
}

impl<F> DiscreteInverter<F>
where
    F: Fn(f64) -> Result<f64>,
{
    pub fn new(cdf: F, support: Support, seed: CornishFisher) -> Self {
        DiscreteInverter {
            cdf,
            lower: support.lower,
            upper: support.upper,
            seed,
            options: InversionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: InversionOptions) -> Self {
        self.options = options;
        self
    }

    /// `min{k : cdf(k) >= p}`, with `p` shrunk by `64ε` first so that a CDF
    /// value that misses `p` by rounding still counts as reaching it.
    pub fn quantile(&self, p: f64) -> Result<f64> {
        check_probability(p)?;
        if p == 0.0 {
            return Ok(self.lower);
        }
        if p == 1.0 {
            return Ok(self.upper);
        }

        let p = p * (1.0 - 64.0 * f64::EPSILON);
        let mut y = self.seed.estimate(p)?;
        if !y.is_finite() {
            y = self.lower;
        }
        let y = y.clamp(self.lower, self.upper);

        let span = if self.upper.is_finite() {
            self.upper - self.lower
        } else {
            y - self.lower
        };
        let incr = if span.is_finite() && span >= COARSE_SEARCH_SPAN {
            (span * 0.001).floor()
        } else {
            1.0
        };

        let mut budget = self.options.max_iter;
        let (mut lo, mut hi) = match self.bracket(y, p, incr, &mut budget)? {
            Bracket::Exact(k) => return Ok(k),
            Bracket::Between(lo, hi) => (lo, hi),
        };

        // cdf(lo) < p <= cdf(hi)
        while hi - lo > 1.0 {
            self.spend(&mut budget, p, hi)?;
            let mid = lo + ((hi - lo) / 2.0).floor();
            if (self.cdf)(mid)? >= p {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Ok(hi)
    }

    /// Walk away from `y` with a step that doubles while the CDF stays on the
    /// same side of `p`.
    fn bracket(&self, mut y: f64, p: f64, mut incr: f64, budget: &mut usize) -> Result<Bracket> {
        if (self.cdf)(y)? >= p {
            loop {
                if y <= self.lower {
                    return Ok(Bracket::Exact(y));
                }
                self.spend(budget, p, y)?;
                let next = (y - incr).max(self.lower);
                if (self.cdf)(next)? < p {
                    return Ok(Bracket::Between(next, y));
                }
                y = next;
                incr *= 2.0;
            }
        } else {
            loop {
                self.spend(budget, p, y)?;
                let next = (y + incr).min(self.upper);
                if next >= self.upper || (self.cdf)(next)? >= p {
                    return Ok(Bracket::Between(y, next));
                }
                trace!(from = y, to = next, "expanding discrete quantile bracket");
                y = next;
                incr *= 2.0;
            }
        }
    }

    fn spend(&self, budget: &mut usize, p: f64, y: f64) -> Result<()> {
        if *budget == 0 {
            return Err(DistError::NonConvergence {
                routine: "discrete quantile search",
                iterations: self.options.max_iter,
                context: format!("p={p}, stopped at {y}"),
            });
        }
        *budget -= 1;
        Ok(())
    }
}

enum Bracket {
    Exact(f64),
    Between(f64, f64),
}
