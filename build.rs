use std::env;
use std::process::Command;

use chrono::{DateTime, Utc};

/// Stamps `payguard version`. Source tarballs built without `.git` take the commit from
/// `PAYGUARD_GIT_HASH`/`PAYGUARD_GIT_BRANCH`; `SOURCE_DATE_EPOCH` pins the build date.
fn main() {
    println!("cargo:rustc-env=PAYGUARD_BUILD_DATE={}", build_date());
    println!(
        "cargo:rustc-env=PAYGUARD_GIT_HASH={}",
        stamp("PAYGUARD_GIT_HASH", &["rev-parse", "--short", "HEAD"])
    );
    println!(
        "cargo:rustc-env=PAYGUARD_GIT_BRANCH={}",
        stamp("PAYGUARD_GIT_BRANCH", &["rev-parse", "--abbrev-ref", "HEAD"])
    );
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".into());
    println!("cargo:rustc-env=PAYGUARD_BUILD_PROFILE={profile}");

    for var in ["SOURCE_DATE_EPOCH", "PAYGUARD_GIT_HASH", "PAYGUARD_GIT_BRANCH"] {
        println!("cargo:rerun-if-env-changed={var}");
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
}

fn build_date() -> String {
    let pinned = env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
    pinned
        .unwrap_or_else(Utc::now)
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

fn stamp(var: &str, git_args: &[&str]) -> String {
    env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| git(git_args))
        .unwrap_or_else(|| "unknown".to_string())
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!value.is_empty()).then_some(value)
}
