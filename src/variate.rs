use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::{
    error::{ensure_param, DistError, Result},
    special::ln_gamma_pos,
};

/// Limits for the rejection loops used by the variate generators.
#[derive(Debug, Clone, Copy)]
pub struct RejectionOptions {
    /// Proposals drawn before giving up with `NonConvergence`.
    pub max_iter: usize,
}

impl Default for RejectionOptions {
    fn default() -> Self {
        Self {
            max_iter: 1_000_000,
        }
    }
}

/// Draw from `target` by rejection from an envelope distribution.
///
/// `envelope` is the density of the values produced by `propose`, and `k` must
/// satisfy `target(x) <= k * envelope(x)` everywhere. A proposal is accepted
/// when `U < target(x) / (k * envelope(x))`.
pub fn rejection_sample<R, T, E, P>(
    rng: &mut R,
    target: T,
    envelope: E,
    mut propose: P,
    k: f64,
    options: &RejectionOptions,
) -> Result<f64>
where
    R: Rng + ?Sized,
    T: Fn(f64) -> f64,
    E: Fn(f64) -> f64,
    P: FnMut(&mut R) -> f64,
{
    ensure_param!(k.is_finite() && k > 0.0, "envelope constant must be positive, got {k}");
    for _ in 0..options.max_iter {
        let x = propose(rng);
        let u: f64 = rng.random();
        if u < target(x) / (k * envelope(x)) {
            return Ok(x);
        }
    }
    Err(DistError::NonConvergence {
        routine: "rejection_sample",
        iterations: options.max_iter,
        context: format!("envelope constant {k}"),
    })
}

pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

pub fn exponential<R: Rng + ?Sized>(rng: &mut R, rate: f64) -> Result<f64> {
    ensure_param!(rate.is_finite() && rate > 0.0, "exponential rate must be positive, got {rate}");
    Ok(unit_exponential(rng) / rate)
}

fn unit_exponential<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // 1 - u lies in (0, 1], so the log is finite
    let u: f64 = rng.random();
    -(1.0 - u).ln()
}

/// Gamma variate with the given shape and scale (mean `shape * scale`).
///
/// Small integer shapes are sums of exponentials, shapes below one use
/// Ahrens-Dieter rejection and everything else uses Tadikamalla's
/// Laplace-envelope method.
pub fn gamma<R: Rng + ?Sized>(rng: &mut R, shape: f64, scale: f64) -> Result<f64> {
    ensure_param!(shape.is_finite() && shape > 0.0, "gamma shape must be positive, got {shape}");
    ensure_param!(scale.is_finite() && scale > 0.0, "gamma scale must be positive, got {scale}");
    let options = RejectionOptions::default();

    let x = if shape.fract() == 0.0 && shape <= 15.0 {
        (0..shape as usize).map(|_| unit_exponential(rng)).sum()
    } else if shape < 1.0 {
        gamma_small_shape(rng, shape, &options)?
    } else {
        gamma_tadikamalla(rng, shape, &options)?
    };
    Ok(x * scale)
}

/// Ahrens-Dieter GS: the envelope is `x^(shape-1)` on `[0, 1]` and `e^-x`
/// beyond, which dominates the unit gamma kernel for `shape < 1`.
fn gamma_small_shape<R: Rng + ?Sized>(
    rng: &mut R,
    shape: f64,
    options: &RejectionOptions,
) -> Result<f64> {
    let ln_norm = ln_gamma_pos(shape);
    let mass = 1.0 / shape + (-1f64).exp();

    let kernel = |x: f64| {
        if x <= 1.0 {
            x.powf(shape - 1.0)
        } else {
            (-x).exp()
        }
    };
    let target = |x: f64| {
        if x <= 0.0 {
            0.0
        } else {
            ((shape - 1.0) * x.ln() - x - ln_norm).exp()
        }
    };
    let envelope = |x: f64| kernel(x) / mass;
    let propose = |rng: &mut R| {
        let u: f64 = rng.random();
        let w = u * mass;
        if w < 1.0 / shape {
            (w * shape).powf(1.0 / shape)
        } else {
            1.0 - (1.0 - (w - 1.0 / shape) * std::f64::consts::E).ln()
        }
    };

    rejection_sample(rng, target, envelope, propose, mass * (-ln_norm).exp(), options)
}

/// Tadikamalla (1973), valid for `shape >= 1`.
fn gamma_tadikamalla<R: Rng + ?Sized>(
    rng: &mut R,
    shape: f64,
    options: &RejectionOptions,
) -> Result<f64> {
    let a = shape - 1.0;
    let b = 0.5 + 0.5 * (4.0 * shape - 3.0).sqrt();
    let c = a * (1.0 + b) / b;
    let d = (b - 1.0) / (a * b);
    let s = a / b;
    let p = 1.0 / (2.0 - (-s).exp());

    for _ in 0..options.max_iter {
        let u: f64 = rng.random();
        let (x, y) = if u > p {
            let mut e = -((1.0 - u) / (1.0 - p)).ln();
            while e > s {
                e -= s;
            }
            let x = a - b * e;
            (x, a - x)
        } else {
            let x = a - b * (u / p).ln();
            (x, x - a)
        };
        let u2: f64 = rng.random();
        if d * x > 0.0 && u2.ln() <= a * (d * x).ln() - x + y / b + c {
            return Ok(x);
        }
    }
    Err(DistError::NonConvergence {
        routine: "gamma (Tadikamalla)",
        iterations: options.max_iter,
        context: format!("shape {shape}"),
    })
}

/// Beta variate as `X / (X + Y)` with `X ~ Gamma(a)` and `Y ~ Gamma(b)`.
pub fn beta<R: Rng + ?Sized>(rng: &mut R, a: f64, b: f64) -> Result<f64> {
    ensure_param!(a.is_finite() && a > 0.0, "beta shape a must be positive, got {a}");
    ensure_param!(b.is_finite() && b > 0.0, "beta shape b must be positive, got {b}");
    let options = RejectionOptions::default();
    for _ in 0..options.max_iter {
        let x = gamma(rng, a, 1.0)?;
        let y = gamma(rng, b, 1.0)?;
        // both draws can underflow to zero for tiny shapes
        if x + y > 0.0 {
            return Ok(x / (x + y));
        }
    }
    Err(DistError::NonConvergence {
        routine: "beta variate",
        iterations: options.max_iter,
        context: format!("a={a}, b={b}"),
    })
}
