use anyhow::{Context, Result};
use chrono::TimeZone;
use std::env;
use std::fs;
use std::process::Command;
use vergen_gitcl::{Emitter, GitclBuilder};

fn main() -> Result<()> {
    // Generate git information
    let gitcl = GitclBuilder::default()
        .describe(true, true, Some("[0-9]*"))
        .build()?;

    let gitcl_res = Emitter::default()
        .idempotent()
        .fail_on_error()
        .add_instructions(&gitcl)
        .and_then(|emitter| emitter.emit());

    if let Err(e) = gitcl_res {
        eprintln!("error occurred while generating instructions: {e:?}");
        Emitter::default().idempotent().fail_on_error().emit()?;
        println!("cargo:rustc-env=VERGEN_GIT_DESCRIBE=unknown");
    }

    // Add build timestamp
    let now = match env::var("SOURCE_DATE_EPOCH") {
        Ok(val) => {
            let secs = val.parse::<i64>().context("SOURCE_DATE_EPOCH is not a number")?;
            chrono::Utc
                .timestamp_opt(secs, 0)
                .single()
                .context("SOURCE_DATE_EPOCH is out of range")?
        }
        Err(_) => chrono::Utc::now(),
    };

    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    );

    // Get spdif library version using cargo metadata
    let spdif_version = get_spdif_version_from_metadata().unwrap_or_else(|_| {
        read_spdif_version_fallback().unwrap_or_else(|_| "unknown".to_string())
    });
    println!("cargo:rustc-env=SPDIF_VERSION={spdif_version}");

    // Tell cargo to rerun this build script if the spdif Cargo.toml changes
    println!("cargo:rerun-if-changed=spdif/Cargo.toml");

    Ok(())
}

/// Get spdif version using cargo metadata (works with published and local dependencies)
fn get_spdif_version_from_metadata() -> Result<String> {
    let output = Command::new("cargo")
        .args(["metadata", "--format-version", "1"])
        .output()?;

    if !output.status.success() {
        anyhow::bail!("cargo metadata failed");
    }

    let metadata: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    // Workspace member (local development) or published package, by name
    let version = metadata["packages"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|package| package["name"].as_str() == Some("spdif"))
        .and_then(|package| package["version"].as_str());

    if let Some(version) = version {
        return Ok(version.to_string());
    }

    // Dependency graph ids look like "spdif 0.1.0 (registry+...)"
    let version = metadata["resolve"]["nodes"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|node| node["id"].as_str())
        .find_map(|id| id.strip_prefix("spdif "))
        .and_then(|rest| rest.split(' ').next());

    match version {
        Some(version) => Ok(version.to_string()),
        None => anyhow::bail!("spdif package not found in metadata"),
    }
}

/// Fallback: manually parse spdif/Cargo.toml (for edge cases)
fn read_spdif_version_fallback() -> Result<String> {
    let toml_content = fs::read_to_string("spdif/Cargo.toml")?;

    for line in toml_content.lines() {
        let line = line.trim();
        if line.starts_with("version") {
            if let Some((_, version_part)) = line.split_once('=') {
                let version = version_part.trim().trim_matches('"').trim_matches('\'');
                return Ok(version.to_string());
            }
        }
    }

    anyhow::bail!("Could not find version in spdif/Cargo.toml");
}
