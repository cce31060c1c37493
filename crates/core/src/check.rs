//! External compile check interface.
//!
//! The check runs after rendering and never influences it.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Outcome of running a document through the external compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub success: bool,
    /// Raw compiler output.
    pub diagnostics: String,
}

impl CheckReport {
    /// Interpret a finished compiler run. The compiler reports some
    /// failures with a zero exit status, so its output is checked too.
    pub fn from_run(exit_ok: bool, output: impl Into<String>) -> Self {
        let diagnostics = output.into();
        Self {
            success: exit_ok && !diagnostics.contains("Failed"),
            diagnostics,
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Failed to launch '{command}': {reason}")]
    Launch { command: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Validates a rendered document with an external tool.
#[async_trait]
pub trait SyntaxChecker: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    async fn check(&self, document: &str) -> std::result::Result<CheckReport, CheckError>;
}
