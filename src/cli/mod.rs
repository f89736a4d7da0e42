pub mod app;
pub mod check_config;
pub mod commands;
pub mod dispatch;
pub mod env;
pub mod evaluate;
pub mod keygen;
pub mod runtime;
pub mod serve;
pub mod sign;
pub mod version;

pub use check_config::{cmd_check_config, CheckConfigArgs};
pub use evaluate::{cmd_evaluate, EvaluateArgs};
pub use keygen::{cmd_keygen, KeygenArgs};
pub use serve::{cmd_serve, ServeArgs};
pub use sign::{cmd_sign, SignArgs};
pub use version::cmd_version;
