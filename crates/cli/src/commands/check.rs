//! `loggerforge check`: External compile check.

use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use loggerforge_config::{AppConfig, CompilerConfig};
use loggerforge_core::{CheckError, CheckReport, SyntaxChecker};
use tokio::process::Command;
use tracing::{debug, info};

/// Runs the configured compiler on a temporary copy of the document.
pub struct CommandChecker {
    command: String,
    args: Vec<String>,
    extension: String,
}

impl CommandChecker {
    pub fn new(command: impl Into<String>, args: Vec<String>, extension: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args,
            extension: extension.into(),
        }
    }

    /// `None` when no compiler is configured.
    pub fn from_config(compiler: &CompilerConfig, extension: &str) -> Option<Self> {
        compiler
            .command
            .as_ref()
            .map(|c| Self::new(c.clone(), compiler.args.clone(), extension))
    }
}

#[async_trait]
impl SyntaxChecker for CommandChecker {
    fn name(&self) -> &str {
        &self.command
    }

    async fn check(&self, document: &str) -> Result<CheckReport, CheckError> {
        let mut file = tempfile::Builder::new()
            .prefix("loggerforge-")
            .suffix(&format!(".{}", self.extension))
            .tempfile()?;
        file.write_all(document.as_bytes())?;
        file.flush()?;

        debug!(command = %self.command, file = %file.path().display(), "Running compile check");
        let output = Command::new(&self.command)
            .args(&self.args)
            .arg(file.path())
            .output()
            .await
            .map_err(|e| CheckError::Launch {
                command: self.command.clone(),
                reason: e.to_string(),
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(CheckReport::from_run(output.status.success(), text))
    }
}

/// Check `document` with the configured compiler and fail on a bad report.
pub async fn check_document(config: &AppConfig, document: &str) -> Result<(), Box<dyn std::error::Error>> {
    let checker = CommandChecker::from_config(&config.compiler, &config.output.extension).ok_or(
        "No compiler configured (set compiler.command or LOGGERFORGE_COMPILER)",
    )?;

    let report = checker.check(document).await?;
    if !report.diagnostics.trim().is_empty() {
        eprintln!("{}", report.diagnostics.trim_end());
    }
    if !report.success {
        return Err(format!("Compile check with '{}' failed", checker.name()).into());
    }
    info!(compiler = checker.name(), "Compile check passed");
    Ok(())
}

pub async fn run(file: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let document = tokio::fs::read_to_string(&file)
        .await
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    check_document(&config, &document).await
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> CommandChecker {
        CommandChecker::new("sh", vec!["-c".into(), script.into()], "CR1X")
    }

    #[tokio::test]
    async fn document_reaches_the_compiler() {
        let checker = shell(r#"grep -q BeginProg "$0" && echo "Compiled OK""#);
        let report = checker.check("BeginProg\nEndProg\n").await.unwrap();
        assert!(report.success);
        assert_eq!(report.diagnostics.trim(), "Compiled OK");
    }

    #[tokio::test]
    async fn failed_output_fails_the_check() {
        let report = shell("echo 'line 3: Compile Failed'").check("x").await.unwrap();
        assert!(!report.success);
    }

    #[tokio::test]
    async fn nonzero_exit_fails_the_check() {
        let report = shell("exit 2").check("x").await.unwrap();
        assert!(!report.success);
    }

    #[tokio::test]
    async fn missing_compiler_is_a_launch_error() {
        let checker = CommandChecker::new("/nonexistent/compiler", vec![], "CR1X");
        assert!(matches!(
            checker.check("x").await,
            Err(CheckError::Launch { .. })
        ));
    }

    #[test]
    fn unconfigured_compiler() {
        assert!(CommandChecker::from_config(&CompilerConfig::default(), "CR1X").is_none());
    }
}
