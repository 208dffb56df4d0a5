use std::process::Command;

const VERSION_ENV: &str = "TASKFLOW_VERSION";
const BUILD_VERSION_ENV: &str = "TASKFLOW_BUILD_VERSION";

/// Strips a leading `v` from tag-style versions (`v0.3.1` -> `0.3.1`).
fn strip_tag_prefix(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.strip_prefix('v') {
        Some(rest) if rest.starts_with(|ch: char| ch.is_ascii_digit()) => rest.to_string(),
        _ => trimmed.to_string(),
    }
}

fn describe_head() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()
        .filter(|output| output.status.success())?;

    let described = strip_tag_prefix(String::from_utf8(output.stdout).ok()?.as_str());
    (!described.is_empty()).then_some(described)
}

fn main() {
    println!("cargo:rerun-if-env-changed={VERSION_ENV}");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/packed-refs");

    let version = std::env::var(VERSION_ENV)
        .ok()
        .map(|value| strip_tag_prefix(&value))
        .filter(|value| !value.is_empty())
        .or_else(describe_head)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env={BUILD_VERSION_ENV}={version}");
}
