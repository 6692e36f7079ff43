//! Tempo plans: the base durations and variances behind every humanised pause.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

/// Relative spread used when a caller does not supply one.
pub const DEFAULT_VARIANCE: f64 = 0.3;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize tempo plan: {0}")]
    Deserialize(String),
    #[error("invalid tempo plan: {0}")]
    Invalid(String),
}

/// Target mean and relative spread of one randomized delay.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DelaySpec {
    pub base_ms: f64,
    #[serde(default = "DelaySpec::default_variance")]
    pub variance: f64,
}

impl DelaySpec {
    pub const fn new(base_ms: f64, variance: f64) -> Self {
        Self { base_ms, variance }
    }

    fn default_variance() -> f64 {
        DEFAULT_VARIANCE
    }
}

/// Occasional hesitation between keystrokes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MicroPausePlan {
    #[serde(default = "MicroPausePlan::default_probability")]
    pub probability: f64,
    #[serde(default = "MicroPausePlan::default_delay")]
    pub delay: DelaySpec,
}

impl MicroPausePlan {
    fn default_probability() -> f64 {
        0.15
    }

    fn default_delay() -> DelaySpec {
        DelaySpec::new(180.0, 0.5)
    }
}

impl Default for MicroPausePlan {
    fn default() -> Self {
        Self {
            probability: Self::default_probability(),
            delay: Self::default_delay(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TempoPlan {
    #[serde(default = "TempoPlan::default_name")]
    pub name: String,
    #[serde(default = "TempoPlan::default_thinking")]
    pub thinking: DelaySpec,
    #[serde(default = "TempoPlan::default_post_action")]
    pub post_action: DelaySpec,
    #[serde(default = "TempoPlan::default_per_char")]
    pub per_char: DelaySpec,
    #[serde(default)]
    pub micro_pause: MicroPausePlan,
    #[serde(default = "TempoPlan::default_hover_settle")]
    pub hover_settle: DelaySpec,
    #[serde(default = "TempoPlan::default_scroll_pause")]
    pub scroll_pause: DelaySpec,
    #[serde(default = "TempoPlan::default_nav_settle")]
    pub nav_settle: DelaySpec,
    #[serde(default = "TempoPlan::default_hover_hold")]
    pub hover_hold: DelaySpec,
    #[serde(default = "TempoPlan::default_wait_variance")]
    pub wait_variance: f64,
    #[serde(default = "TempoPlan::default_scroll_step_px")]
    pub scroll_step_px: u32,
    /// Multiplier applied to every sleep; 0 disables sleeping.
    #[serde(default = "TempoPlan::default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl TempoPlan {
    fn default_name() -> String {
        "default".into()
    }

    fn default_thinking() -> DelaySpec {
        DelaySpec::new(350.0, 0.5)
    }

    fn default_post_action() -> DelaySpec {
        DelaySpec::new(450.0, 0.4)
    }

    fn default_per_char() -> DelaySpec {
        DelaySpec::new(70.0, 0.6)
    }

    fn default_hover_settle() -> DelaySpec {
        DelaySpec::new(120.0, 0.3)
    }

    fn default_scroll_pause() -> DelaySpec {
        DelaySpec::new(80.0, 0.4)
    }

    fn default_nav_settle() -> DelaySpec {
        DelaySpec::new(800.0, 0.3)
    }

    fn default_hover_hold() -> DelaySpec {
        DelaySpec::new(400.0, 0.3)
    }

    fn default_wait_variance() -> f64 {
        0.15
    }

    fn default_scroll_step_px() -> u32 {
        100
    }

    fn default_speed() -> f64 {
        1.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.speed.is_finite() || self.speed < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "speed must be a non-negative number, got {}",
                self.speed
            )));
        }
        if !(0.0..=1.0).contains(&self.micro_pause.probability) {
            return Err(ConfigError::Invalid(format!(
                "micro_pause.probability must be within [0, 1], got {}",
                self.micro_pause.probability
            )));
        }
        if self.scroll_step_px == 0 {
            return Err(ConfigError::Invalid("scroll_step_px must be positive".into()));
        }
        Ok(())
    }
}

impl Default for TempoPlan {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            thinking: Self::default_thinking(),
            post_action: Self::default_post_action(),
            per_char: Self::default_per_char(),
            micro_pause: MicroPausePlan::default(),
            hover_settle: Self::default_hover_settle(),
            scroll_pause: Self::default_scroll_pause(),
            nav_settle: Self::default_nav_settle(),
            hover_hold: Self::default_hover_hold(),
            wait_variance: Self::default_wait_variance(),
            scroll_step_px: Self::default_scroll_step_px(),
            speed: Self::default_speed(),
            seed: None,
        }
    }
}

pub fn load_plan_from_reader<R: Read>(mut reader: R) -> Result<TempoPlan, ConfigError> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    parse_plan_str(&buf)
}

pub fn load_plan_from_path(path: impl AsRef<Path>) -> Result<TempoPlan, ConfigError> {
    let file = File::open(path.as_ref())?;
    load_plan_from_reader(file)
}

/// Parse a plan written as JSON, falling back to YAML.
pub fn parse_plan_str(raw: &str) -> Result<TempoPlan, ConfigError> {
    let plan: TempoPlan = match serde_json::from_str(raw) {
        Ok(plan) => plan,
        Err(json_err) => serde_yaml::from_str(raw).map_err(|yaml_err| {
            ConfigError::Deserialize(format!(
                "json error: {}; yaml error: {}",
                json_err, yaml_err
            ))
        })?,
    };
    plan.validate()?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_pacing() {
        let plan = TempoPlan::default();
        assert_eq!(plan.thinking, DelaySpec::new(350.0, 0.5));
        assert_eq!(plan.post_action, DelaySpec::new(450.0, 0.4));
        assert_eq!(plan.per_char, DelaySpec::new(70.0, 0.6));
        assert_eq!(plan.micro_pause.probability, 0.15);
        assert_eq!(plan.micro_pause.delay, DelaySpec::new(180.0, 0.5));
        assert_eq!(plan.scroll_step_px, 100);
        assert_eq!(plan.speed, 1.0);
    }

    #[test]
    fn parses_partial_yaml() {
        let plan = parse_plan_str("name: brisk\nspeed: 0.5\nthinking:\n  base_ms: 100\n").unwrap();
        assert_eq!(plan.name, "brisk");
        assert_eq!(plan.speed, 0.5);
        assert_eq!(plan.thinking, DelaySpec::new(100.0, DEFAULT_VARIANCE));
        assert_eq!(plan.post_action, DelaySpec::new(450.0, 0.4));
    }

    #[test]
    fn parses_json() {
        let plan = parse_plan_str(r#"{"seed": 9, "wait_variance": 0.2}"#).unwrap();
        assert_eq!(plan.seed, Some(9));
        assert_eq!(plan.wait_variance, 0.2);
    }

    #[test]
    fn rejects_negative_speed() {
        let err = parse_plan_str("speed: -1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn reports_both_parse_errors() {
        let err = parse_plan_str("- [unclosed").unwrap_err();
        match err {
            ConfigError::Deserialize(msg) => {
                assert!(msg.contains("json error"));
                assert!(msg.contains("yaml error"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
