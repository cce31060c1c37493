//! Program definition files.
//!
//! A program file names the program, optionally overrides the program
//! options, and lists its instruments in order:
//!
//! ```toml
//! name = "Lubrecht"
//! preserve_variables = true
//!
//! [[instruments]]
//! type = "Campbell_CR1000X_Battery"
//!
//! [[instruments]]
//! type = "Acclima_TDR310N"
//! label = "soil_10"
//! sdi12_address = 1
//! elevation = -10
//! name_inclusion = "both"
//!
//! [[instruments]]
//! type = "Sierra_RV50X"
//! [instruments.dependencies]
//! battery_voltage = { instrument = "Campbell_CR1000X_Battery", variable = "batt_volt" }
//! shutoff_voltage = { instrument = "Campbell_CR1000X_Battery", variable = "shutoff_voltage" }
//! ```
//!
//! JSON files carry the same structure.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use loggerforge_core::{
    DependencyTarget, ExecutionMode, InstrumentRequest, InstrumentSettings, NameInclusion,
    ProgramOptions, ProgramRequest, Scan, Sdi12Address, Terminal,
};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, ProgramDefaults};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSpec {
    pub name: String,

    /// Station line for the header; falls back to the configured prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ExecutionMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_variables: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan: Option<Scan>,

    #[serde(default)]
    pub instruments: Vec<InstrumentSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    #[serde(rename = "type")]
    pub type_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdi12_address: Option<Sdi12Address>,

    #[serde(default)]
    pub name_inclusion: NameInclusion,

    /// Role → terminal label. In JSON, `null` keeps an unconnected role
    /// unconnected; disconnecting a wired role is rejected.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub wiring: BTreeMap<String, Option<Terminal>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, DependencyTarget>,
}

impl ProgramSpec {
    /// Read a program file. The format follows the extension: `.toml` or
    /// `.json`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let parse_error = |reason: String| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason,
        };

        let definition: Self = match extension.as_deref() {
            Some("toml") => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            Some("json") => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            _ => {
                return Err(parse_error(
                    "program files must end in .toml or .json".into(),
                ));
            }
        };

        definition.validate()?;
        tracing::debug!(
            program = %definition.name,
            instruments = definition.instruments.len(),
            "Loaded program file {}",
            path.display()
        );
        Ok(definition)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationError("program name must not be empty".into()));
        }
        if self.name.contains(['\n', '\r']) {
            return Err(ConfigError::ValidationError(
                "program name must fit on one line".into(),
            ));
        }
        if let Some(position) = self.instruments.iter().position(|i| i.type_id.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "instrument #{} has no type",
                position + 1
            )));
        }
        if self.scan.is_some_and(|s| s.interval == 0) {
            return Err(ConfigError::ValidationError(
                "scan.interval must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Build an assembly request. Options left out of the file come from
    /// `defaults`; `station` falls back to `station_prefix`.
    pub fn into_request(
        self,
        created: NaiveDate,
        defaults: &ProgramDefaults,
        station_prefix: Option<&str>,
    ) -> ProgramRequest {
        let options = ProgramOptions {
            mode: self.mode.unwrap_or(defaults.mode),
            preserve_variables: self.preserve_variables.unwrap_or(defaults.preserve_variables),
            scan: self.scan.unwrap_or(defaults.scan),
            created,
            station: self.station.or_else(|| station_prefix.map(str::to_string)),
        };

        ProgramRequest {
            name: self.name,
            options,
            instruments: self.instruments.into_iter().map(InstrumentSpec::into_request).collect(),
        }
    }
}

impl InstrumentSpec {
    pub fn into_request(self) -> InstrumentRequest {
        InstrumentRequest {
            type_id: self.type_id,
            settings: InstrumentSettings {
                label: self.label,
                elevation: self.elevation,
                sdi12_address: self.sdi12_address,
                name_inclusion: self.name_inclusion,
                wiring: self.wiring,
                params: self.params,
            },
            dependencies: self.dependencies,
        }
    }
}
