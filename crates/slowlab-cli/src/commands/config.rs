//! Effective configuration display.

use anyhow::{Context, Result};
use slowlab_config::LabConfig;

/// Prints the merged configuration as TOML.
pub fn show(config: &LabConfig) -> Result<()> {
    let rendered = config.to_toml().context("Failed to render configuration")?;
    print!("{rendered}");
    Ok(())
}
