use std::time::Duration as StdDuration;

use chrono::Duration;
use payguard_core_types::{window_duration, Amount, MAX_WINDOW_SECONDS};
use serde::{Deserialize, Serialize};

/// Thresholds for one firewall instance. Amounts are token base units.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FirewallConfig {
    pub daily_budget: Amount,
    pub high_spend_threshold: Amount,
    pub low_balance_threshold: Amount,
    pub rate_window_seconds: u64,
    pub rate_ceiling: usize,
    /// Fraction of the ceiling, in percent, above which a warning is raised.
    pub rate_warning_percent: u8,
    pub low_trust_threshold: u8,
    pub high_trust_threshold: u8,
    pub policy_timeout_ms: u64,
    /// Spend is booked even when the decision ends up REJECTED.
    pub book_spend_on_reject: bool,
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self {
            daily_budget: Amount::new(100_000_000),
            high_spend_threshold: Amount::new(20_000_000),
            low_balance_threshold: Amount::new(10_000_000),
            rate_window_seconds: 60,
            rate_ceiling: 10,
            rate_warning_percent: 80,
            low_trust_threshold: 15,
            high_trust_threshold: 80,
            policy_timeout_ms: 2_000,
            book_spend_on_reject: true,
        }
    }
}

impl FirewallConfig {
    pub fn rate_window(&self) -> Duration {
        window_duration(self.rate_window_seconds)
    }

    pub fn policy_timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.policy_timeout_ms)
    }

    /// Count strictly above which the rate warning fires (80 % of 10 is 8).
    pub fn rate_warning_count(&self) -> usize {
        self.rate_ceiling * usize::from(self.rate_warning_percent) / 100
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.rate_window_seconds == 0 {
            return Err("rate_window_seconds must be positive".into());
        }
        if self.rate_window_seconds > MAX_WINDOW_SECONDS {
            return Err(format!(
                "rate_window_seconds must be at most {MAX_WINDOW_SECONDS}"
            ));
        }
        if self.rate_ceiling == 0 {
            return Err("rate_ceiling must be positive".into());
        }
        if self.rate_warning_percent > 100 {
            return Err("rate_warning_percent must be at most 100".into());
        }
        if self.low_trust_threshold >= self.high_trust_threshold {
            return Err("low_trust_threshold must be below high_trust_threshold".into());
        }
        if self.high_trust_threshold > 100 {
            return Err("high_trust_threshold must be at most 100".into());
        }
        if self.low_balance_threshold > self.daily_budget {
            return Err("low_balance_threshold must not exceed daily_budget".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_thresholds() {
        let cfg = FirewallConfig::default();
        assert_eq!(cfg.daily_budget, Amount::new(100_000_000));
        assert_eq!(cfg.rate_warning_count(), 8);
        assert_eq!(cfg.policy_timeout(), StdDuration::from_secs(2));
        assert!(cfg.book_spend_on_reject);
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg: FirewallConfig = serde_yaml::from_str("rate_ceiling: 3\ndaily_budget: \"500\"\n").unwrap();
        assert_eq!(cfg.rate_ceiling, 3);
        assert_eq!(cfg.daily_budget, Amount::new(500));
        assert_eq!(cfg.high_trust_threshold, 80);
    }

    #[test]
    fn inconsistent_thresholds_fail_validation() {
        let cfg = FirewallConfig {
            low_trust_threshold: 90,
            ..FirewallConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn oversized_rate_window_fails_validation_and_clamps() {
        let cfg = FirewallConfig {
            rate_window_seconds: 10_000_000_000_000,
            ..FirewallConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert_eq!(cfg.rate_window(), Duration::seconds(MAX_WINDOW_SECONDS as i64));
    }
}
