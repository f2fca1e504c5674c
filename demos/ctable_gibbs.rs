//! Sample the posterior of a 2x2 contingency table with four parallel chains.
//!
//! Run with `RUST_LOG=probab=debug` to see per-chain events.

use anyhow::Result;
use probab::{sample_parallel, CTablePosterior, GibbsSettings};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (s1, f1, s2, f2) = (6.0, 2.0, 3.0, 10.0);
    let posterior = CTablePosterior::new(s1, f1, s2, f2)?;

    let settings = GibbsSettings {
        num_draws: 20_000,
        num_chains: 4,
        seed: 42,
    };
    let traces = sample_parallel(|_chain| posterior, &[1.0, 1.0], &[2.0, 2.0], &settings)?;

    println!("table: s1={s1} f1={f1} s2={s2} f2={f2}");
    println!(
        "{:>6} {:>12} {:>12} {:>10} {:>10}",
        "chain", "log OR", "log odds sum", "accept 1", "accept 2"
    );
    for trace in &traces {
        let mean = trace.discard(1_000).mean();
        let rates = trace.accept_rates();
        println!(
            "{:>6} {:>12.4} {:>12.4} {:>10.3} {:>10.3}",
            trace.chain(),
            mean[0],
            mean[1],
            rates[0],
            rates[1]
        );
    }

    let pooled: Vec<f64> = (0..2)
        .map(|j| {
            let column: Vec<f64> = traces
                .iter()
                .flat_map(|trace| trace.discard(1_000).column(j).collect::<Vec<_>>())
                .collect();
            column.iter().sum::<f64>() / column.len() as f64
        })
        .collect();
    println!("pooled posterior mean: ({:.4}, {:.4})", pooled[0], pooled[1]);

    let odds_ratio_positive = traces
        .iter()
        .flat_map(|trace| trace.column(0).collect::<Vec<_>>())
        .filter(|&log_or| log_or > 0.0)
        .count() as f64
        / traces.iter().map(|t| t.num_draws()).sum::<usize>() as f64;
    println!("P(log odds ratio > 0) ~ {odds_ratio_positive:.4}");
    Ok(())
}
