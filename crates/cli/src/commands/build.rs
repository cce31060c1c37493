//! `loggerforge build`: Assemble a program file.

use std::path::PathBuf;

use chrono::NaiveDate;
use loggerforge_assembler::ProgramAssembler;
use loggerforge_config::{AppConfig, ProgramSpec};
use loggerforge_instruments::builtin_catalog;
use tracing::info;

use super::check::check_document;

pub async fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    date: Option<NaiveDate>,
    check: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let definition = ProgramSpec::load(&file)?;

    let created = date.unwrap_or_else(|| chrono::Local::now().date_naive());
    let request = definition.into_request(created, &config.defaults, config.station_prefix.as_deref());

    let catalog = builtin_catalog();
    let program = ProgramAssembler::new(&catalog).assemble(&request)?;

    match output {
        Some(path) => {
            let path = with_extension(path, &config.output.extension);
            tokio::fs::write(&path, &program.text)
                .await
                .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
            info!(path = %path.display(), "Program written");
        }
        None => print!("{}", program.text),
    }

    if check {
        check_document(&config, &program.text).await?;
    }

    Ok(())
}

/// Give `path` the configured extension unless it already has one.
fn with_extension(path: PathBuf, extension: &str) -> PathBuf {
    if path.extension().is_some() {
        path
    } else {
        path.with_extension(extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_added_only_when_missing() {
        assert_eq!(with_extension("out/station".into(), "CR1X"), PathBuf::from("out/station.CR1X"));
        assert_eq!(with_extension("station.cr6".into(), "CR1X"), PathBuf::from("station.cr6"));
    }
}
