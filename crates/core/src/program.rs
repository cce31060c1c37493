//! Program-level request types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dependency::DependencyTarget;
use crate::instrument::InstrumentSettings;
use crate::sequence::Scan;

/// The execution-mode directive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    Pipeline,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExecutionMode::Sequential => "SequentialMode",
            ExecutionMode::Pipeline => "PipelineMode",
        })
    }
}

/// Program-wide options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramOptions {
    pub mode: ExecutionMode,
    /// Emit `PreserveVariables` so values survive a reset.
    pub preserve_variables: bool,
    /// Base scan cadence.
    pub scan: Scan,
    /// Date written into the header. An explicit input so output stays
    /// deterministic.
    pub created: NaiveDate,
    /// Optional station line for the header.
    pub station: Option<String>,
}

impl ProgramOptions {
    pub fn new(created: NaiveDate) -> Self {
        Self {
            mode: ExecutionMode::default(),
            preserve_variables: false,
            scan: Scan::default(),
            created,
            station: None,
        }
    }
}

/// One instrument of a program request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRequest {
    pub type_id: String,
    #[serde(default)]
    pub settings: InstrumentSettings,
    /// Dependency name → where to take it from.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, DependencyTarget>,
}

impl InstrumentRequest {
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            settings: InstrumentSettings::default(),
            dependencies: BTreeMap::new(),
        }
    }

    pub fn settings(mut self, settings: InstrumentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn depends_on(
        mut self,
        dependency: impl Into<String>,
        instrument: impl Into<String>,
        variable: impl Into<String>,
    ) -> Self {
        self.dependencies.insert(
            dependency.into(),
            DependencyTarget {
                instrument: instrument.into(),
                variable: variable.into(),
            },
        );
        self
    }
}

/// An ordered list of instruments plus options: the input of one assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramRequest {
    pub name: String,
    pub options: ProgramOptions,
    pub instruments: Vec<InstrumentRequest>,
}
