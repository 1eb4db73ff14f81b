use anyhow::Result;
use colored::*;
use syncml_dbapi::config::ModuleConfig;

/// Parses a module configuration file and reports what it declares,
/// without loading any of the plugins it names.
pub fn check(path: &str) -> Result<()> {
    let config = ModuleConfig::from_path(path)?;
    println!(
        "{} {} ({} module{}, legacy bridging {})",
        "OK".bright_green(),
        path,
        config.modules.len(),
        if config.modules.len() == 1 { "" } else { "s" },
        if config.legacy_bridging { "on" } else { "off" }
    );
    for entry in &config.modules {
        println!("  {} -> {}", entry.name.bold(), entry.path);
    }
    Ok(())
}
