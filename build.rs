use std::env;
use std::process::Command;

const VERSION_ENV: &str = "COINDASH_VERSION";

fn main() {
    for var in ["GITHUB_REF", "GITHUB_REF_NAME", "GITHUB_REF_TYPE"] {
        println!("cargo:rerun-if-env-changed={var}");
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");

    let version = release_tag()
        .or_else(checked_out_tag)
        .map(|tag| tag.trim_start_matches('v').to_string())
        .filter(|tag| !tag.is_empty())
        .unwrap_or_else(|| env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".into()));

    println!("cargo:rustc-env={VERSION_ENV}={version}");
}

/// Tag name of a CI release build, if this is one.
fn release_tag() -> Option<String> {
    if env::var("GITHUB_REF_TYPE").ok()?.as_str() != "tag" {
        return None;
    }

    env::var("GITHUB_REF_NAME")
        .ok()
        .or_else(|| {
            env::var("GITHUB_REF")
                .ok()
                .and_then(|full| full.strip_prefix("refs/tags/").map(str::to_owned))
        })
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
}

/// Tag pointing exactly at HEAD in a local checkout.
fn checked_out_tag() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--exact-match"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8(output.stdout)
        .ok()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
}
