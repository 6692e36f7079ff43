//! Human-plausible pacing for replayed browser actions.
//!
//! [`TimingModel`] turns the base durations of a [`TempoPlan`] into Gaussian
//! delays and sleeps them on the tokio clock. The randomness source can be
//! seeded so that runs and tests are reproducible.

pub mod config;

pub use config::{
    load_plan_from_path, load_plan_from_reader, parse_plan_str, ConfigError, DelaySpec,
    MicroPausePlan, TempoPlan, DEFAULT_VARIANCE,
};

use std::f64::consts::PI;
use std::time::Duration;

use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Gaussian delay generator shared by the executor through an `Arc`.
pub struct TimingModel {
    plan: TempoPlan,
    rng: Mutex<StdRng>,
}

impl TimingModel {
    /// Seeds from `plan.seed` when present, otherwise from OS entropy.
    pub fn new(plan: TempoPlan) -> Self {
        let rng = match plan.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(plan, rng)
    }

    pub fn seeded(plan: TempoPlan, seed: u64) -> Self {
        Self::with_rng(plan, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(plan: TempoPlan, rng: StdRng) -> Self {
        Self {
            plan,
            rng: Mutex::new(rng),
        }
    }

    pub fn plan(&self) -> &TempoPlan {
        &self.plan
    }

    /// One sample from a normal distribution centred on `base_ms` whose
    /// `[base·(1-v), base·(1+v)]` band spans six standard deviations.
    ///
    /// The result is floored and may be negative; sleeps clamp it.
    pub fn delay(&self, base_ms: f64, variance: f64) -> i64 {
        let (u1, u2) = {
            let mut rng = self.rng.lock();
            // (0, 1] keeps ln(u1) finite
            let u1 = 1.0 - rng.gen::<f64>();
            let u2 = rng.gen::<f64>();
            (u1, u2)
        };
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        let lo = base_ms * (1.0 - variance);
        let hi = base_ms * (1.0 + variance);
        let std_dev = (hi - lo) / 6.0;
        (z * std_dev + base_ms).floor() as i64
    }

    pub fn delay_for(&self, spec: &DelaySpec) -> i64 {
        self.delay(spec.base_ms, spec.variance)
    }

    pub fn thinking_delay(&self) -> i64 {
        self.delay_for(&self.plan.thinking)
    }

    pub fn post_action_delay(&self) -> i64 {
        self.delay_for(&self.plan.post_action)
    }

    pub fn typing_delay(&self) -> i64 {
        self.delay_for(&self.plan.per_char)
    }

    /// Zero most of the time; a short hesitation with the plan's probability.
    pub fn micro_pause(&self) -> i64 {
        let hit = self.rng.lock().gen::<f64>() < self.plan.micro_pause.probability;
        if hit {
            self.delay_for(&self.plan.micro_pause.delay)
        } else {
            0
        }
    }

    pub fn hover_settle_delay(&self) -> i64 {
        self.delay_for(&self.plan.hover_settle)
    }

    pub fn scroll_pause_delay(&self) -> i64 {
        self.delay_for(&self.plan.scroll_pause)
    }

    pub fn nav_settle_delay(&self) -> i64 {
        self.delay_for(&self.plan.nav_settle)
    }

    pub fn hover_hold_delay(&self) -> i64 {
        self.delay_for(&self.plan.hover_hold)
    }

    pub fn wait_delay(&self, wait_ms: u64) -> i64 {
        self.delay(wait_ms as f64, self.plan.wait_variance)
    }

    /// Wall-clock duration for a computed delay: negatives clamp to zero and
    /// the plan's speed multiplier applies.
    pub fn sleep_duration(&self, delay_ms: i64) -> Duration {
        let clamped = delay_ms.max(0) as f64;
        let micros = (clamped * self.plan.speed.max(0.0) * 1000.0).round();
        Duration::from_micros(micros as u64)
    }

    pub async fn sleep(&self, delay_ms: i64) {
        let duration = self.sleep_duration(delay_ms);
        if duration.is_zero() {
            return;
        }
        debug!(delay_ms, slept_ms = duration.as_millis() as u64, "pacing");
        tokio::time::sleep(duration).await;
    }

    pub async fn think(&self) {
        self.sleep(self.thinking_delay()).await;
    }

    pub async fn after_action(&self) {
        self.sleep(self.post_action_delay()).await;
    }

    pub async fn between_keys(&self) {
        self.sleep(self.typing_delay()).await;
    }

    pub async fn hesitate(&self) {
        self.sleep(self.micro_pause()).await;
    }

    /// Summary statistics over `samples` draws of `delay(base_ms, variance)`.
    pub fn sample_stats(&self, base_ms: f64, variance: f64, samples: usize) -> DelayStats {
        let draws: Vec<i64> = (0..samples).map(|_| self.delay(base_ms, variance)).collect();
        DelayStats::from_samples(&draws)
    }
}

impl Default for TimingModel {
    fn default() -> Self {
        Self::new(TempoPlan::default())
    }
}

impl std::fmt::Debug for TimingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimingModel")
            .field("plan", &self.plan.name)
            .field("speed", &self.plan.speed)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DelayStats {
    pub samples: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: i64,
    pub max: i64,
    pub negative: usize,
}

impl DelayStats {
    pub fn from_samples(draws: &[i64]) -> Self {
        if draws.is_empty() {
            return Self::default();
        }
        let n = draws.len() as f64;
        let mean = draws.iter().map(|&d| d as f64).sum::<f64>() / n;
        let var = draws
            .iter()
            .map(|&d| {
                let diff = d as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / n;
        Self {
            samples: draws.len(),
            mean,
            std_dev: var.sqrt(),
            min: draws.iter().copied().min().unwrap_or_default(),
            max: draws.iter().copied().max().unwrap_or_default(),
            negative: draws.iter().filter(|&&d| d < 0).count(),
        }
    }
}
