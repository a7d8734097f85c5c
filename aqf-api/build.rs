//! Build identification for the `/` endpoint and the startup log line
//!
//! Emits `GIT_HASH`, `BUILD_TIMESTAMP` (UTC), `BUILD_PROFILE` and
//! `BUILD_TARGET`. Source tarballs and container builds have no `.git`, so
//! `AQF_GIT_HASH` may supply the hash instead.

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
}

fn git_hash() -> String {
    if let Some(hash) = std::env::var("AQF_GIT_HASH").ok().filter(|s| !s.trim().is_empty()) {
        return hash.trim().to_string();
    }

    let Some(hash) = git(&["rev-parse", "--short=8", "HEAD"])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    else {
        return "unknown".to_string();
    };

    let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
        .is_some_and(|status| !status.trim().is_empty());
    if dirty {
        format!("{}-dirty", hash)
    } else {
        hash
    }
}

fn main() {
    let build_timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let target = std::env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash());
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_timestamp);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
    println!("cargo:rustc-env=BUILD_TARGET={}", target);

    // No rerun-if directives: the script reruns on every build so the
    // timestamp and hash stay current.
}
