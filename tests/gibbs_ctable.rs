use approx::assert_abs_diff_eq;
use probab::{
    log_ctable_post, run_metropolis_gibbs, sample_parallel, CTablePosterior, GibbsError,
    GibbsSettings, LogPosterior, LogpError, LogpFn,
};
use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;

const TABLE: (f64, f64, f64, f64) = (6.0, 2.0, 3.0, 10.0);

/// Posterior mean of the contingency-table model by brute-force integration
/// over a grid that holds all but a negligible amount of the mass.
fn grid_posterior_mean() -> [f64; 2] {
    let (s1, f1, s2, f2) = TABLE;
    let step = 0.05;
    let peak = log_ctable_post(s1, f1, s2, f2, 2.6, 0.0);
    let mut total = 0.0;
    let mut first = 0.0;
    let mut second = 0.0;
    for i in 0..700 {
        let t1 = -15.0 + i as f64 * step;
        for j in 0..800 {
            let t2 = -20.0 + j as f64 * step;
            let w = (log_ctable_post(s1, f1, s2, f2, t1, t2) - peak).exp();
            total += w;
            first += w * t1;
            second += w * t2;
        }
    }
    [first / total, second / total]
}

#[test]
fn ctable_chain_matches_grid_integration() {
    let (s1, f1, s2, f2) = TABLE;
    let logpost = CTablePosterior::new(s1, f1, s2, f2).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let trace = run_metropolis_gibbs(logpost, &[1.0, 1.0], 200_000, &[2.0, 2.0], &mut rng).unwrap();

    for rate in trace.accept_rates() {
        assert!(rate > 0.0 && rate < 1.0, "acceptance rate {rate}");
    }

    let expected = grid_posterior_mean();
    // the exact values follow from digamma identities
    assert_abs_diff_eq!(expected[0], 2.612_301_587, epsilon = 1e-4);
    assert_abs_diff_eq!(expected[1], -0.045_634_921, epsilon = 1e-4);

    let mean = trace.discard(1_000).mean();
    assert_abs_diff_eq!(mean[0], expected[0], epsilon = 0.05);
    assert_abs_diff_eq!(mean[1], expected[1], epsilon = 0.05);
}

#[test]
fn ctable_parallel_chains_agree() {
    let (s1, f1, s2, f2) = TABLE;
    let settings = GibbsSettings {
        num_draws: 50_000,
        num_chains: 4,
        seed: 123,
    };
    let traces = sample_parallel(
        |_| LogpFn::new(2, move |t: &[f64]| log_ctable_post(s1, f1, s2, f2, t[0], t[1])),
        &[1.0, 1.0],
        &[2.0, 2.0],
        &settings,
    )
    .unwrap();

    assert_eq!(traces.len(), 4);
    for trace in &traces {
        assert_eq!(trace.num_draws(), 50_000);
        let mean = trace.discard(500).mean();
        assert_abs_diff_eq!(mean[0], 2.612, epsilon = 0.15);
        assert_abs_diff_eq!(mean[1], -0.046, epsilon = 0.15);
    }
}

/// A log-posterior backed by an external model that can fail.
struct FlakyModel {
    calls: usize,
    fail_at: usize,
}

#[derive(Error, Debug)]
enum FlakyError {
    #[error("model evaluation failed at call {0}")]
    Broken(usize),
}

impl LogpError for FlakyError {
    fn is_recoverable(&self) -> bool {
        false
    }
}

impl LogPosterior for FlakyModel {
    type LogpError = FlakyError;

    fn dim(&self) -> usize {
        2
    }

    fn logp(&mut self, position: &[f64]) -> Result<f64, FlakyError> {
        self.calls += 1;
        if self.calls >= self.fail_at {
            return Err(FlakyError::Broken(self.calls));
        }
        let (s1, f1, s2, f2) = TABLE;
        Ok(log_ctable_post(s1, f1, s2, f2, position[0], position[1]))
    }
}

#[test]
fn unrecoverable_model_error_stops_the_chain() {
    let model = FlakyModel {
        calls: 0,
        fail_at: 100,
    };
    let mut rng = StdRng::seed_from_u64(42);
    let err = run_metropolis_gibbs(model, &[1.0, 1.0], 1_000, &[2.0, 2.0], &mut rng).unwrap_err();
    match err {
        GibbsError::LogpFailure(inner) => {
            assert_eq!(inner.to_string(), "model evaluation failed at call 100")
        }
        other => panic!("unexpected error {other}"),
    }
}
