use anyhow::Result;
use serde::Serialize;

/// Compile-time stamps written by `build.rs`.
#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub built_at: &'static str,
    pub commit: &'static str,
    pub branch: &'static str,
    pub profile: &'static str,
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        built_at: env!("PAYGUARD_BUILD_DATE"),
        commit: env!("PAYGUARD_GIT_HASH"),
        branch: env!("PAYGUARD_GIT_BRANCH"),
        profile: env!("PAYGUARD_BUILD_PROFILE"),
    }
}

pub fn cmd_version() -> Result<()> {
    let info = build_info();
    println!("payguard {} ({})", info.version, info.profile);
    println!("  built:  {}", info.built_at);
    println!("  commit: {} ({})", info.commit, info.branch);
    Ok(())
}
