use crate::model::{Decision, RiskLevel};

/// Monotonic risk state for one evaluation. Risk only ever rises; a hard reject is sticky.
#[derive(Debug)]
pub struct RiskAccumulator {
    level: RiskLevel,
    hard_reject: bool,
    reasons: Vec<String>,
    warnings: Vec<String>,
    matched_policy_ids: Vec<String>,
}

impl Default for RiskAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskAccumulator {
    pub fn new() -> Self {
        Self {
            level: RiskLevel::Low,
            hard_reject: false,
            reasons: Vec::new(),
            warnings: Vec::new(),
            matched_policy_ids: Vec::new(),
        }
    }

    pub fn raise(&mut self, level: RiskLevel) {
        if level > self.level {
            self.level = level;
        }
    }

    pub fn force_reject(&mut self) {
        self.hard_reject = true;
        self.raise(RiskLevel::High);
    }

    pub fn note(&mut self, reason: impl Into<String>) {
        self.reasons.push(reason.into());
    }

    /// Raises to [`RiskLevel::Elevated`] and records the message as both warning and reason.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.raise(RiskLevel::Elevated);
        self.warnings.push(message.clone());
        self.reasons.push(message);
    }

    pub fn reject(&mut self, reason: impl Into<String>) {
        self.force_reject();
        self.reasons.push(reason.into());
    }

    pub fn match_policy(&mut self, policy_id: impl Into<String>) {
        self.matched_policy_ids.push(policy_id.into());
    }

    pub fn level(&self) -> RiskLevel {
        self.level
    }

    pub fn is_hard_rejected(&self) -> bool {
        self.hard_reject
    }

    pub fn decision(&self) -> Decision {
        if self.hard_reject || self.level == RiskLevel::High {
            Decision::Rejected
        } else if self.level == RiskLevel::Elevated {
            Decision::Warning
        } else {
            Decision::Approved
        }
    }

    pub fn into_parts(self) -> (RiskLevel, Vec<String>, Vec<String>, Vec<String>) {
        (
            self.level,
            self.reasons,
            self.warnings,
            self.matched_policy_ids,
        )
    }
}
