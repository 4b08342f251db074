// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=CAMERA_CONTROLS_VERSION");

    // Packagers can pin the version string (tarball builds have no .git)
    let version = std::env::var("CAMERA_CONTROLS_VERSION")
        .ok()
        .or_else(describe_head)
        .unwrap_or_else(|| std::env::var("CARGO_PKG_VERSION").unwrap_or_default());

    println!("cargo::rustc-env=CAMERA_CONTROLS_BUILD_VERSION={}", version);
}

/// `git describe` output with the leading `v` removed.
///
/// "v0.1.0" at a tag stays "0.1.0"; "v0.1.0-5-gabcdef1" becomes
/// "0.1.0+5.abcdef1" so the commit distance survives in `--version`.
fn describe_head() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--match", "v*"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let described = described.strip_prefix('v').unwrap_or(&described);

    let parts: Vec<&str> = described.rsplitn(3, '-').collect();
    if parts.len() == 3 {
        let hash = parts[0].strip_prefix('g').unwrap_or(parts[0]);
        Some(format!("{}+{}.{}", parts[2], parts[1], hash))
    } else {
        Some(described.to_string())
    }
}
