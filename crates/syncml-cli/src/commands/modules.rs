use anyhow::{Context, Result};
use colored::*;
use syncml_dbapi::registry::{ModuleRegistry, default_module_config_path};

fn load_registry(config: Option<&str>) -> Result<ModuleRegistry> {
    let path = match config {
        Some(p) => p.to_string(),
        None => default_module_config_path()
            .to_str()
            .context("default module config path is not valid UTF-8")?
            .to_string(),
    };
    let registry = ModuleRegistry::from_path(&path)
        .with_context(|| format!("loading module configuration from {path}"))?;
    futures::executor::block_on(registry.load_all());
    Ok(registry)
}

/// Lists every successfully loaded module and its negotiated SDK
/// version / minimum-version requirement.
pub fn list(config: Option<&str>) -> Result<()> {
    let registry = load_registry(config)?;
    let plugins = registry.list();
    if plugins.is_empty() {
        println!("{}", "no modules loaded".yellow());
        return Ok(());
    }
    for plugin in plugins {
        let caps = plugin.capabilities();
        let min_version = caps.get("MinVersion").unwrap_or("-");
        let description = caps.get("Description").unwrap_or("");
        println!(
            "{}  {} {}",
            plugin.name().bold(),
            format!("(MinVersion {min_version})").dimmed(),
            description
        );
    }
    Ok(())
}

/// Prints the raw capability string fields for one configured module.
pub fn capabilities(config: Option<&str>, module: &str) -> Result<()> {
    let registry = load_registry(config)?;
    let plugin = futures::executor::block_on(registry.get(module))
        .with_context(|| format!("module '{module}' is not configured or failed to load"))?;
    let caps = plugin.capabilities();
    for key in [
        "MinVersion",
        "Description",
        "Manufacturer",
        "Plugin",
        "SubSystem",
        "SubVersion",
        "ADMIN_Info",
        "ItemAsKey",
        "AdminAsKey",
        "GlobContext",
    ] {
        if let Some(value) = caps.get(key) {
            println!("{:<12} {}", key.cyan(), value);
        }
    }
    Ok(())
}
