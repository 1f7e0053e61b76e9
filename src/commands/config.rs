//! Config commands: show, path, set, reset.

use anyhow::Result;

use crate::config::{default_config_path, Config};
use crate::output::OutputControls;

/// Print the effective configuration.
pub fn show(output: &OutputControls) -> Result<()> {
    let config = Config::load_default()?;
    output.print(&config);
    Ok(())
}

pub fn path() -> Result<()> {
    println!("{}", default_config_path().display());
    Ok(())
}

/// Set one key and persist.
pub fn set(key: &str, value: &str, output: &OutputControls) -> Result<()> {
    let path = default_config_path();
    let mut config = Config::load_default()?;
    config.set(key, value)?;
    config.save(&path)?;

    if output.json {
        output.print(&config);
    } else {
        println!("Set {} = {} in {}", key, value, path.display());
    }
    Ok(())
}

/// Write the defaults back to disk.
pub fn reset(output: &OutputControls) -> Result<()> {
    let path = default_config_path();
    let config = Config::default();
    config.save(&path)?;

    if output.json {
        output.print(&config);
    } else {
        println!("Reset configuration in {}", path.display());
    }
    Ok(())
}
