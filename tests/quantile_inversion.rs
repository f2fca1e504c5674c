use approx::assert_abs_diff_eq;
use probab::{
    beta_inc_reg, Beta, Beta4, Binomial, ChiSquared, DistError, Exponential, Gamma,
    GeneralizedPareto, Hypergeometric, NegativeBinomial, Normal, Poisson, Univariate,
};
use proptest::prelude::*;

/// The quantile is within `delta` of the exact one, i.e. the CDF crosses `p`
/// inside `[x - delta, x + delta]`.
fn continuous_round_trip<D: Univariate>(
    dist: &D,
    p: f64,
    delta: f64,
) -> std::result::Result<(), TestCaseError> {
    let x = dist.quantile(p).unwrap();
    let below = dist.cdf(x - delta).unwrap();
    let above = dist.cdf(x + delta).unwrap();
    prop_assert!(
        below <= p + 1e-12 && above >= p - 1e-12,
        "p={p}, x={x}, cdf in [{below}, {above}]"
    );
    Ok(())
}

fn discrete_round_trip<D: Univariate>(dist: &D, p: f64) -> std::result::Result<(), TestCaseError> {
    let k = dist.quantile(p).unwrap();
    prop_assert_eq!(k.fract(), 0.0);
    prop_assert!(dist.cdf(k).unwrap() >= p * (1.0 - 64.0 * f64::EPSILON), "p={p}, k={k}");
    if k > dist.support().lower {
        prop_assert!(dist.cdf(k - 1.0).unwrap() < p, "p={p}, k={k}");
    }
    Ok(())
}

proptest! {
    #[test]
    fn gamma_round_trip(shape in 0.2f64..30.0, scale in 0.1f64..10.0, p in 1e-6f64..(1.0 - 1e-6)) {
        continuous_round_trip(&Gamma::new(shape, scale).unwrap(), p, 1e-9)?;
    }

    #[test]
    fn beta_round_trip(a in 0.3f64..20.0, b in 0.3f64..20.0, p in 1e-6f64..(1.0 - 1e-6)) {
        continuous_round_trip(&Beta::new(a, b).unwrap(), p, 1e-9)?;
    }

    #[test]
    fn pareto_round_trip(shape1 in 0.5f64..10.0, shape2 in 0.5f64..5.0, p in 1e-4f64..0.99) {
        let dist = GeneralizedPareto::new(shape1, shape2, 2.0).unwrap();
        // the quantile is bisected in u = x / (x + scale), so its error grows with dx/du
        let x = dist.quantile(p).unwrap();
        let delta = 2e-9 * (x + 2.0).powi(2) / 2.0;
        continuous_round_trip(&dist, p, delta)?;
    }

    #[test]
    fn normal_and_exponential_round_trip(p in 1e-9f64..(1.0 - 1e-9)) {
        continuous_round_trip(&Normal::new(-3.0, 0.5).unwrap(), p, 1e-9)?;
        continuous_round_trip(&Exponential::new(3.0).unwrap(), p, 1e-9)?;
    }

    #[test]
    fn binomial_round_trip(n in 1u64..500, prob in 0.01f64..0.99, p in 0.0f64..1.0) {
        discrete_round_trip(&Binomial::new(n, prob).unwrap(), p)?;
    }

    #[test]
    fn negative_binomial_round_trip(r in 0.2f64..50.0, prob in 0.05f64..0.95, p in 0.0f64..0.9999) {
        discrete_round_trip(&NegativeBinomial::new(r, prob).unwrap(), p)?;
    }

    #[test]
    fn heavy_tailed_negative_binomial_round_trip(
        r in 0.005f64..0.05,
        prob in 1e-5f64..1e-3,
        p in 0.0f64..0.999,
    ) {
        let dist = NegativeBinomial::new(r, prob).unwrap();
        discrete_round_trip(&dist, p)?;
    }

    #[test]
    fn poisson_round_trip(lambda in 0.01f64..1e4, p in 0.0f64..0.9999) {
        discrete_round_trip(&Poisson::new(lambda).unwrap(), p)?;
    }

    #[test]
    fn hypergeometric_round_trip(
        total in 1u64..200,
        frac_m in 0.0f64..1.0,
        frac_n in 0.0f64..1.0,
        p in 0.0f64..1.0,
    ) {
        let successes = (frac_m * total as f64) as u64;
        let draws = (frac_n * total as f64) as u64;
        discrete_round_trip(&Hypergeometric::new(total, successes, draws).unwrap(), p)?;
    }

    #[test]
    fn quantiles_are_monotone(p1 in 0.0f64..1.0, p2 in 0.0f64..1.0) {
        let (lo, hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };
        let gamma = Gamma::new(2.5, 1.5).unwrap();
        prop_assert!(gamma.quantile(lo).unwrap() <= gamma.quantile(hi).unwrap());
        let beta = Beta::new(0.5, 3.0).unwrap();
        prop_assert!(beta.quantile(lo).unwrap() <= beta.quantile(hi).unwrap());
        let nb = NegativeBinomial::new(2.5, 0.3).unwrap();
        prop_assert!(nb.quantile(lo).unwrap() <= nb.quantile(hi).unwrap());
        let binom = Binomial::new(40, 0.7).unwrap();
        prop_assert!(binom.quantile(lo).unwrap() <= binom.quantile(hi).unwrap());
    }
}

#[test]
fn heavy_tailed_negative_binomial_quantiles_and_draws() {
    use rand::{rngs::StdRng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(7);
    for &(r, prob) in &[(0.01, 1e-4), (0.01, 3e-5), (0.005, 5e-5)] {
        let dist = NegativeBinomial::new(r, prob).unwrap();
        for &p in &[0.9, 0.95, 0.99, 0.995] {
            let k = dist.quantile(p).unwrap();
            let target = p * (1.0 - 64.0 * f64::EPSILON);
            assert!(dist.cdf(k).unwrap() >= target, "r={r}, prob={prob}, p={p}");
            assert!(dist.cdf(k - 1.0).unwrap() < p, "r={r}, prob={prob}, p={p}");
        }
        for _ in 0..200 {
            assert!(dist.sample(&mut rng).unwrap() >= 0.0);
        }
    }
}

#[test]
fn beta_reference_round_trip() {
    let dist = Beta::new(2.2, 1.33).unwrap();
    let p = dist.cdf(0.335).unwrap();
    assert_abs_diff_eq!(p, 0.131_093_432_433_063_6, epsilon = 1e-10);
    assert_abs_diff_eq!(dist.quantile(p).unwrap(), 0.335, epsilon = 1e-8);
}

#[test]
fn lomax_quantile_matches_incomplete_beta() {
    let (theta, alpha) = (1.0567, 2.1865);
    let lomax = GeneralizedPareto::lomax(theta, alpha).unwrap();
    let x = lomax.quantile(0.6543).unwrap();
    assert_abs_diff_eq!(x, 0.660_925_3, epsilon = 1e-6);
    let u = x / (x + theta);
    assert_abs_diff_eq!(beta_inc_reg(1.0, alpha, u).unwrap(), 0.6543, epsilon = 1e-9);
}

#[test]
fn boundary_quantiles() {
    fn check<D: Univariate>(dist: D) {
        let support = dist.support();
        assert_eq!(dist.quantile(0.0).unwrap(), support.lower);
        assert_eq!(dist.quantile(1.0).unwrap(), support.upper);
        assert!(matches!(dist.quantile(-1e-12), Err(DistError::ProbabilityOutOfRange(_))));
        assert!(matches!(dist.quantile(1.0 + 1e-12), Err(DistError::ProbabilityOutOfRange(_))));
        assert!(matches!(dist.quantile(f64::NAN), Err(DistError::ProbabilityOutOfRange(_))));
    }

    check(Normal::new(1.0, 2.0).unwrap());
    check(Exponential::new(2.0).unwrap());
    check(Gamma::new(0.3, 2.0).unwrap());
    check(ChiSquared::new(3.0).unwrap());
    check(Beta::new(0.5, 0.5).unwrap());
    check(Beta4::new(2.0, 3.0, -2.0, 5.0).unwrap());
    check(GeneralizedPareto::lomax(1.0, 2.0).unwrap());
    check(Binomial::new(12, 0.4).unwrap());
    check(NegativeBinomial::new(1.5, 0.2).unwrap());
    check(Poisson::new(3.0).unwrap());
    check(Hypergeometric::new(30, 10, 12).unwrap());

    assert_eq!(Normal::new(1.0, 2.0).unwrap().quantile(0.0).unwrap(), f64::NEG_INFINITY);
    assert_eq!(Poisson::new(3.0).unwrap().quantile(1.0).unwrap(), f64::INFINITY);
}
