use std::process::Command;

use anyhow::{Context, Result};

/// `ledgerbridge-common` is the only crate with optional tiers.
const FEATURE_COMBINATIONS: &[&[&str]] = &[
    &[], // default: domain re-exports only
    &["runtime"],
    &["test-utils"],
];

/// Check that every supported feature combination compiles on its own.
pub fn test_feature_matrix() -> Result<()> {
    println!("Testing {} ledgerbridge-common feature combinations...", FEATURE_COMBINATIONS.len());

    for (index, features) in FEATURE_COMBINATIONS.iter().enumerate() {
        let label = if features.is_empty() { "default".to_string() } else { features.join(",") };

        println!(
            "\n[{}/{}] cargo check -p ledgerbridge-common --no-default-features --features '{label}'",
            index + 1,
            FEATURE_COMBINATIONS.len(),
        );

        let mut command = Command::new("cargo");
        command.args(["check", "-p", "ledgerbridge-common", "--no-default-features"]);
        if !features.is_empty() {
            command.arg("--features").arg(features.join(","));
        }

        let status =
            command.status().with_context(|| format!("Failed to run cargo check for '{label}'"))?;
        if !status.success() {
            anyhow::bail!("Feature combination '{label}' failed to compile");
        }

        println!("✅ Features '{label}' compiled successfully");
    }

    Ok(())
}
