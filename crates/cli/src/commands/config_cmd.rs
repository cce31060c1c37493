//! `loggerforge config`: Configuration management commands.

use loggerforge_config::AppConfig;

pub fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   Config parsed successfully");

            if config.compiler.command.is_none() {
                println!("   warning: no compiler configured; `check` and `build --check` are unavailable");
            }

            println!();
            println!("   Station:   {}", config.station_prefix.as_deref().unwrap_or("-"));
            println!("   Mode:      {}", config.defaults.mode);
            println!("   Scan:      {}", config.defaults.scan);
            println!("   Preserve:  {}", config.defaults.preserve_variables);
            println!(
                "   Compiler:  {}",
                config.compiler.command.as_deref().unwrap_or("-")
            );
            println!("   Extension: {}", config.output.extension);
        }
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn path() {
    println!("{}", AppConfig::config_path().display());
}
