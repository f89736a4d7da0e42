pub mod budget;
pub mod config;
pub mod errors;
pub mod firewall;
pub mod model;
pub mod policy;
pub mod rate;
pub mod risk;

pub use budget::{BudgetLedger, MemoryBudgetLedger};
pub use config::FirewallConfig;
pub use errors::PolicyStoreError;
pub use firewall::{ExecutionFirewall, NO_ISSUES_REASON};
pub use model::{
    Decision, FirewallDecision, FirewallRequest, ProviderContext, RiskLevel, TransactionContext,
};
pub use policy::{Policy, PolicyConfig, PolicyStore, PolicyVerdict, SpendingPeriod, StaticPolicyStore};
pub use rate::{MemoryRateWindowStore, RateKey, RateWindowStore};
pub use risk::RiskAccumulator;
