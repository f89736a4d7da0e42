use std::sync::Arc;

use chrono::{DateTime, Utc};
use payguard_core_types::{normalize_address, Amount, SharedClock};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::budget::{BudgetLedger, MemoryBudgetLedger};
use crate::config::FirewallConfig;
use crate::errors::PolicyStoreError;
use crate::model::{Decision, FirewallDecision, FirewallRequest, ProviderContext, TransactionContext};
use crate::policy::{PolicyStore, PolicyVerdict};
use crate::rate::{MemoryRateWindowStore, RateKey, RateWindowStore};
use crate::risk::RiskAccumulator;

pub const NO_ISSUES_REASON: &str = "no issues detected";

/// Turns one transfer plus its provider evidence into an APPROVED/WARNING/REJECTED decision.
///
/// Rate and budget usage is recorded for every evaluation, including rejected ones (see
/// [`FirewallConfig::book_spend_on_reject`]).
#[derive(Clone)]
pub struct ExecutionFirewall {
    config: FirewallConfig,
    rates: Arc<dyn RateWindowStore>,
    ledger: Arc<dyn BudgetLedger>,
    policies: Option<Arc<dyn PolicyStore>>,
    clock: SharedClock,
}

impl ExecutionFirewall {
    pub fn new(config: FirewallConfig, clock: SharedClock) -> Self {
        Self {
            config,
            rates: Arc::new(MemoryRateWindowStore::new()),
            ledger: Arc::new(MemoryBudgetLedger::new()),
            policies: None,
            clock,
        }
    }

    pub fn with_policy_store(mut self, store: Arc<dyn PolicyStore>) -> Self {
        self.policies = Some(store);
        self
    }

    pub fn with_rate_store(mut self, store: Arc<dyn RateWindowStore>) -> Self {
        self.rates = store;
        self
    }

    pub fn with_budget_ledger(mut self, ledger: Arc<dyn BudgetLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn config(&self) -> &FirewallConfig {
        &self.config
    }

    /// Drops idle rate windows and budget days before today. Returns (windows, days) removed.
    pub fn prune(&self) -> (usize, usize) {
        let now = self.clock.now();
        let windows = self.rates.prune_idle(now, self.config.rate_window());
        let days = self.ledger.prune_before(now.date_naive());
        (windows, days)
    }

    pub async fn evaluate(&self, request: &FirewallRequest) -> FirewallDecision {
        let now = request.now.unwrap_or_else(|| self.clock.now());
        let tx = &request.tx;
        let caller = request.caller_key();
        let provider = request.provider.as_ref();
        let mut risk = RiskAccumulator::new();

        self.check_recipient(provider, &mut risk);
        self.check_trust(tx, provider, &mut risk);
        let rate_window_count = self.check_rate(tx, &caller, provider, now, &mut risk);
        let (remaining, pending_booking) = self.check_budget(tx, &caller, now, &mut risk);
        self.check_policies(tx, &mut risk).await;

        let decision = risk.decision();
        if pending_booking && decision != Decision::Rejected {
            self.ledger.book(now.date_naive(), &caller, tx.value);
        }

        let (risk_level, mut reasons, warnings, matched_policy_ids) = risk.into_parts();
        if decision == Decision::Approved && reasons.is_empty() {
            reasons.push(NO_ISSUES_REASON.to_string());
        }

        debug!(
            caller = %caller,
            decision = decision.as_str(),
            risk_level = risk_level.as_u8(),
            rate_window_count,
            "firewall evaluation complete"
        );

        FirewallDecision {
            decision,
            risk_level,
            reasons,
            warnings,
            matched_policy_ids,
            remaining_daily_budget: remaining,
            trust_score: provider.map(ProviderContext::trust),
            rate_window_count,
        }
    }

    fn check_recipient(&self, provider: Option<&ProviderContext>, risk: &mut RiskAccumulator) {
        let Some(provider) = provider else {
            return;
        };
        match (&provider.expected_recipient, &provider.recipient) {
            (Some(expected), Some(presented)) => {
                if normalize_address(expected) != normalize_address(presented) {
                    risk.reject(format!(
                        "recipient_mismatch: provider presented {presented} but {expected} was expected"
                    ));
                }
            }
            (None, Some(presented)) => {
                risk.warn(format!(
                    "recipient {presented} could not be verified against an expected address"
                ));
            }
            _ => {}
        }
    }

    fn check_trust(
        &self,
        tx: &TransactionContext,
        provider: Option<&ProviderContext>,
        risk: &mut RiskAccumulator,
    ) {
        let Some(provider) = provider else {
            return;
        };
        let score = provider.trust();
        if score <= self.config.low_trust_threshold {
            risk.warn(format!("low provider trust score {score}"));
            if tx.value >= self.config.high_spend_threshold {
                risk.reject(format!(
                    "low_trust_high_spend: value {} meets the high-spend threshold {} for a low-trust provider",
                    tx.value, self.config.high_spend_threshold
                ));
            }
        } else if score >= self.config.high_trust_threshold {
            risk.note(format!("high provider trust score {score}"));
        }
    }

    fn check_rate(
        &self,
        tx: &TransactionContext,
        caller: &str,
        provider: Option<&ProviderContext>,
        now: DateTime<Utc>,
        risk: &mut RiskAccumulator,
    ) -> usize {
        let provider_id = provider
            .map(|provider| provider.id.clone())
            .unwrap_or_else(|| normalize_address(&tx.to));
        let key = RateKey::new(provider_id, caller);
        let count = self.rates.record(&key, now, self.config.rate_window());

        if count > self.config.rate_ceiling {
            risk.reject(format!(
                "rate_limit_exceeded: {count} requests in {}s exceeds the ceiling of {}",
                self.config.rate_window_seconds, self.config.rate_ceiling
            ));
        } else if count > self.config.rate_warning_count() {
            risk.warn(format!(
                "approaching rate limit: {count} of {} requests in {}s",
                self.config.rate_ceiling, self.config.rate_window_seconds
            ));
        }
        count
    }

    /// Returns the remaining headroom and whether booking was deferred to the final decision.
    fn check_budget(
        &self,
        tx: &TransactionContext,
        caller: &str,
        now: DateTime<Utc>,
        risk: &mut RiskAccumulator,
    ) -> (Amount, bool) {
        let day = now.date_naive();
        let (total, deferred) = if self.config.book_spend_on_reject {
            (self.ledger.book(day, caller, tx.value), false)
        } else {
            (self.ledger.spent(day, caller).saturating_add(tx.value), true)
        };

        let budget = self.config.daily_budget;
        if total > budget {
            risk.reject(format!(
                "daily_budget_exceeded: {total} spent today exceeds the daily budget of {budget}"
            ));
            return (Amount::ZERO, deferred);
        }

        let remaining = budget.saturating_sub(total);
        if remaining <= self.config.low_balance_threshold {
            risk.warn(format!("low remaining daily budget: {remaining}"));
        }
        (remaining, deferred)
    }

    async fn check_policies(&self, tx: &TransactionContext, risk: &mut RiskAccumulator) {
        let Some(store) = &self.policies else {
            return;
        };
        let limit = self.config.policy_timeout();
        let listed = match timeout(limit, store.list_enabled_policies()).await {
            Ok(result) => result,
            Err(_) => Err(PolicyStoreError::Timeout(limit.as_millis() as u64)),
        };

        let policies = match listed {
            Ok(policies) => policies,
            Err(err) => {
                warn!(error = %err, "policy store lookup failed; continuing without policies");
                risk.warn(format!("policies could not be checked: {err}"));
                return;
            }
        };

        for policy in policies.iter().filter(|policy| policy.enabled) {
            match policy.check(&tx.to, tx.value) {
                PolicyVerdict::Violated(reason) => {
                    risk.reject(reason);
                    risk.match_policy(policy.id.clone());
                }
                PolicyVerdict::Pass => {}
                PolicyVerdict::NotApplicable => {
                    debug!(policy_id = %policy.id, kind = policy.config.kind(), "policy ignored");
                }
            }
        }
    }
}
