//! Error types for program assembly.
//!
//! Uses `thiserror` for ergonomic error definitions. Every variant is a
//! configuration error: assembly never retries and never returns a partial
//! document, so each message carries the identifiers a caller needs to fix
//! the input and try again.

use thiserror::Error;

/// The top-level error type for all LoggerForge operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // --- Instrument construction ---
    #[error("Instrument '{instrument}' is missing required setting '{setting}': {reason}")]
    InstrumentConfig {
        instrument: String,
        setting: String,
        reason: String,
    },

    #[error("Unknown instrument type: {0}")]
    UnknownInstrument(String),

    #[error("Invalid declaration in '{instrument}': {reason}")]
    InvalidDeclaration { instrument: String, reason: String },

    // --- Naming ---
    #[error("Duplicate variable name '{name}' (declared by '{first}' and '{second}')")]
    DuplicateVariableName {
        name: String,
        first: String,
        second: String,
    },

    #[error("Invalid variable name '{name}' in '{instrument}'")]
    InvalidVariableName { name: String, instrument: String },

    #[error("Unknown variable '{name}' referenced by '{instrument}'")]
    UnknownVariable { instrument: String, name: String },

    // --- Wiring ---
    #[error("Wiring role '{role}' not found on '{instrument}'")]
    WiringRoleNotFound { role: String, instrument: String },

    #[error("Wiring role '{role}' matches more than one wire on '{instrument}'")]
    AmbiguousWiringRole { role: String, instrument: String },

    #[error("Wiring role '{role}' on '{instrument}' is not connected to a terminal")]
    UnconnectedWiringRole { role: String, instrument: String },

    #[error("Invalid terminal: {0}")]
    InvalidTerminal(String),

    #[error("Invalid SDI-12 address: {0}")]
    InvalidAddress(String),

    // --- Tables ---
    #[error("Table '{table}' is defined incompatibly by '{first}' and '{second}': {detail}")]
    TableConflict {
        table: String,
        first: String,
        second: String,
        detail: String,
    },

    // --- Dependencies ---
    #[error("Missing dependency '{dependency}' for '{instrument}': {reason}")]
    MissingDependency {
        instrument: String,
        dependency: String,
        reason: String,
    },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Short machine-readable kind, for service boundaries that map errors
    /// onto client-facing responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InstrumentConfig { .. } => "instrument_config",
            Error::UnknownInstrument(_) => "unknown_instrument",
            Error::InvalidDeclaration { .. } => "invalid_declaration",
            Error::DuplicateVariableName { .. } => "duplicate_variable_name",
            Error::InvalidVariableName { .. } => "invalid_variable_name",
            Error::UnknownVariable { .. } => "unknown_variable",
            Error::WiringRoleNotFound { .. } => "wiring_role_not_found",
            Error::AmbiguousWiringRole { .. } => "ambiguous_wiring_role",
            Error::UnconnectedWiringRole { .. } => "unconnected_wiring_role",
            Error::InvalidTerminal(_) => "invalid_terminal",
            Error::InvalidAddress(_) => "invalid_address",
            Error::TableConflict { .. } => "table_conflict",
            Error::MissingDependency { .. } => "missing_dependency",
        }
    }
}
