//! Matching knobs read from the environment once at startup.

use std::env;
use std::time::Duration;

use crate::domain::{RangePolicy, ThresholdPolicy};
use crate::error::AppError;
use crate::repos::RetryPolicy;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    pub thresholds: ThresholdPolicy,
    pub range_policy: RangePolicy,
    pub max_range_km: f64,
    pub sweep_interval: Duration,
    pub confirm_retry: RetryPolicy,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdPolicy::default(),
            range_policy: RangePolicy::default(),
            max_range_km: 100.0,
            sweep_interval: Duration::from_secs(60),
            confirm_retry: RetryPolicy::default(),
        }
    }
}

impl MatchConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let default_min =
            parse_var("MATCH_DEFAULT_THRESHOLD", defaults.thresholds.default_min())?;
        if default_min == 0 {
            return Err(AppError::config("MATCH_DEFAULT_THRESHOLD must be at least 1"));
        }
        let thresholds = match env::var("MATCH_THRESHOLDS") {
            Ok(raw) => parse_thresholds(&raw, default_min)?,
            Err(_) => ThresholdPolicy::new(default_min).with_activity("volleyball", 4),
        };

        let range_policy = match env::var("MATCH_RANGE_POLICY") {
            Ok(raw) => raw
                .parse::<RangePolicy>()
                .map_err(|e| AppError::config(format!("MATCH_RANGE_POLICY: {e}")))?,
            Err(_) => defaults.range_policy,
        };

        let max_range_km: f64 = parse_var("MATCH_MAX_RANGE_KM", defaults.max_range_km)?;
        if !max_range_km.is_finite() || max_range_km <= 0.0 {
            return Err(AppError::config("MATCH_MAX_RANGE_KM must be a positive number"));
        }

        let sweep_secs: u64 = parse_var(
            "EXPIRY_SWEEP_INTERVAL_SECS",
            defaults.sweep_interval.as_secs(),
        )?;
        if sweep_secs == 0 {
            return Err(AppError::config("EXPIRY_SWEEP_INTERVAL_SECS must be at least 1"));
        }

        let attempts: u32 = parse_var(
            "CONFIRM_MAX_ATTEMPTS",
            defaults.confirm_retry.max_attempts,
        )?;

        Ok(Self {
            thresholds,
            range_policy,
            max_range_km,
            sweep_interval: Duration::from_secs(sweep_secs),
            confirm_retry: RetryPolicy::default().with_max_attempts(attempts),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{name} has an invalid value '{raw}'"))),
        Err(_) => Ok(default),
    }
}

/// Parse `activity=min,activity=min`. Blank entries are skipped.
pub fn parse_thresholds(raw: &str, default_min: usize) -> Result<ThresholdPolicy, AppError> {
    let mut policy = ThresholdPolicy::new(default_min);
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((activity, min)) = entry.split_once('=') else {
            return Err(AppError::config(format!(
                "MATCH_THRESHOLDS entry '{entry}' is not activity=min"
            )));
        };
        let activity = activity.trim();
        let min: usize = min.trim().parse().map_err(|_| {
            AppError::config(format!("MATCH_THRESHOLDS entry '{entry}' has a bad minimum"))
        })?;
        if activity.is_empty() || min == 0 {
            return Err(AppError::config(format!(
                "MATCH_THRESHOLDS entry '{entry}' needs an activity and a minimum of at least 1"
            )));
        }
        policy = policy.with_activity(activity, min);
    }
    Ok(policy)
}
