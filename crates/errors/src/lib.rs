//! Error domain shared by every PayGuard crate.
//!
//! Each failure carries a stable machine code (`replay_detected`, `invalid_signature`, ...) that
//! integrating agents branch on, plus the HTTP status it surfaces with.

pub mod code;
pub mod kind;
#[cfg(feature = "http")]
pub mod mapping_http;
pub mod model;
pub mod prelude;
pub mod render;
pub mod severity;
