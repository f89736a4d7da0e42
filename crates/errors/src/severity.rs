use serde::{Deserialize, Serialize};

/// How loudly a failure should be reported. Client mistakes are `Info`; anything that smells of
/// tampering or a forged request is at least `Warn`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Critical,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Critical => "critical",
        }
    }

    /// Whether operators should see the failure without enabling debug logs.
    pub const fn is_alerting(self) -> bool {
        !matches!(self, Severity::Info)
    }
}
