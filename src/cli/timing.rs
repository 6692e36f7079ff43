use anyhow::{ensure, Result};
use clap::Args;
use stealth::{TimingModel, DEFAULT_VARIANCE};

use crate::config::Config;

#[derive(Args, Clone, Debug)]
pub struct TimingArgs {
    /// Mean delay in milliseconds
    #[arg(long, default_value_t = 1000.0)]
    pub base_ms: f64,

    /// Relative spread; the band base·(1±variance) covers six standard deviations
    #[arg(long, default_value_t = DEFAULT_VARIANCE)]
    pub variance: f64,

    #[arg(long, default_value_t = 1000)]
    pub samples: usize,

    /// Seed for reproducible output (defaults to the configured tempo seed)
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub json: bool,
}

pub fn cmd_timing(args: TimingArgs, config: &Config) -> Result<()> {
    ensure!(args.samples > 0, "--samples must be at least 1");
    ensure!(
        args.base_ms.is_finite() && args.variance.is_finite(),
        "--base-ms and --variance must be finite"
    );

    let plan = config.tempo.clone();
    let model = match args.seed.or(plan.seed) {
        Some(seed) => TimingModel::seeded(plan, seed),
        None => TimingModel::new(plan),
    };
    let stats = model.sample_stats(args.base_ms, args.variance, args.samples);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!(
        "delay({}, {}) over {} samples",
        args.base_ms, args.variance, stats.samples
    );
    println!("  mean     {:.1} ms", stats.mean);
    println!("  std dev  {:.1} ms", stats.std_dev);
    println!("  min      {} ms", stats.min);
    println!("  max      {} ms", stats.max);
    println!("  negative {} (slept as 0)", stats.negative);
    Ok(())
}
