//! Instrument trait: the abstraction over one physical device's
//! contribution to a program.
//!
//! An instrument owns its variables, wiring and tables. Everything else it
//! can contribute (tables, scan fragments, functions, a slow sequence) is an
//! optional facet: the default implementation answers `Ok(None)`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::dependency::{Dependency, Deps};
use crate::error::{Error, Result};
use crate::naming::{self, NameInclusion};
use crate::sequence::SlowSequence;
use crate::table::Table;
use crate::variable::{Declaration, Register, VariableSet};
use crate::wiring::{Terminal, Wiring};

/// Static description of an instrument type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Descriptor {
    /// Stable type identifier used in program files (e.g. `Setra_CS100`).
    pub type_id: &'static str,
    pub manufacturer: &'static str,
    pub model: &'static str,
    /// Measurement category (`Wind`, `Barometer`, ...).
    pub category: &'static str,
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.manufacturer, self.model, self.category)
    }
}

/// A single-character SDI-12 bus address (`0`-`9`, `a`-`z`, `A`-`Z`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct Sdi12Address(char);

impl Sdi12Address {
    pub fn as_char(&self) -> char {
        self.0
    }
}

impl std::str::FromStr for Sdi12Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphanumeric() => Ok(Self(c)),
            _ => Err(Error::InvalidAddress(s.to_string())),
        }
    }
}

/// Program files may give the address as a number or a string.
impl<'de> Deserialize<'de> for Sdi12Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n.to_string(),
            Raw::Text(s) => s,
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl From<Sdi12Address> for String {
    fn from(a: Sdi12Address) -> Self {
        a.0.to_string()
    }
}

impl fmt::Display for Sdi12Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-instance configuration supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSettings {
    /// Instance id; defaults to the type id. Dependencies refer to it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Placement elevation in centimetres (negative below ground).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdi12_address: Option<Sdi12Address>,

    #[serde(default)]
    pub name_inclusion: NameInclusion,

    /// Role → terminal overrides. `None` is accepted only for a role that is
    /// already unconnected.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub wiring: BTreeMap<String, Option<Terminal>>,

    /// Free-form type-specific values (calibration factors, hosts, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, serde_json::Value>,
}

impl InstrumentSettings {
    pub fn require_sdi12(&self, instrument: &str) -> Result<&Sdi12Address> {
        self.sdi12_address
            .as_ref()
            .ok_or_else(|| Error::InstrumentConfig {
                instrument: instrument.to_string(),
                setting: "sdi12_address".into(),
                reason: "this is an SDI-12 device and needs a bus address".into(),
            })
    }

    pub fn require_elevation(&self, instrument: &str) -> Result<i32> {
        self.elevation.ok_or_else(|| Error::InstrumentConfig {
            instrument: instrument.to_string(),
            setting: "elevation".into(),
            reason: "this device is deployed at depth and needs an elevation".into(),
        })
    }

    /// Numeric parameter, falling back to `default` when absent.
    pub fn param_f64(&self, instrument: &str, name: &str, default: Option<f64>) -> Result<f64> {
        match self.params.get(name) {
            Some(value) => value.as_f64().ok_or_else(|| Error::InstrumentConfig {
                instrument: instrument.to_string(),
                setting: name.to_string(),
                reason: format!("expected a number, got {value}"),
            }),
            None => default.ok_or_else(|| Error::InstrumentConfig {
                instrument: instrument.to_string(),
                setting: name.to_string(),
                reason: "required parameter not supplied".into(),
            }),
        }
    }

    /// String parameter, falling back to `default` when absent.
    pub fn param_str(&self, instrument: &str, name: &str, default: Option<&str>) -> Result<String> {
        match self.params.get(name) {
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(value) => Err(Error::InstrumentConfig {
                instrument: instrument.to_string(),
                setting: name.to_string(),
                reason: format!("expected a string, got {value}"),
            }),
            None => default.map(str::to_string).ok_or_else(|| Error::InstrumentConfig {
                instrument: instrument.to_string(),
                setting: name.to_string(),
                reason: "required parameter not supplied".into(),
            }),
        }
    }
}

/// The state every instrument owns, built once by [`InstrumentParts::assemble`].
#[derive(Debug, Clone)]
pub struct InstrumentParts {
    pub id: String,
    pub descriptor: Descriptor,
    pub wiring: Wiring,
    pub variables: VariableSet,
    pub dependencies: &'static [Dependency],
}

impl InstrumentParts {
    /// Build the owned state: declarations are validated, wiring overrides
    /// applied and the naming transform run.
    pub fn assemble(
        descriptor: Descriptor,
        settings: &InstrumentSettings,
        mut wiring: Wiring,
        declarations: Vec<Declaration>,
        dependencies: &'static [Dependency],
    ) -> Result<Self> {
        let id = settings
            .label
            .clone()
            .unwrap_or_else(|| descriptor.type_id.to_string());

        let mut variables = VariableSet::build(id.clone(), declarations)?;
        wiring.apply_overrides(&settings.wiring, &id)?;

        let address = settings.sdi12_address.as_ref().map(|a| a.to_string());
        if let Some(suffix) =
            settings
                .name_inclusion
                .suffix(&id, address.as_deref(), settings.elevation)?
        {
            naming::apply_suffix(&mut variables, &suffix);
        }

        Ok(Self {
            id,
            descriptor,
            wiring,
            variables,
            dependencies,
        })
    }

    /// Effective name of one of this instrument's variables.
    pub fn var(&self, name: &str) -> Result<&str> {
        self.variables.name(name)
    }

    pub fn register(&self, name: &str) -> Result<&Register> {
        self.variables.register(name)
    }

    pub fn terminal(&self, role: &str) -> Result<Terminal> {
        self.wiring.terminal(role, &self.id)
    }
}

/// The core Instrument trait.
///
/// Facets take the instrument's resolved dependencies so that logic can
/// reference a sibling's variable by its final name.
pub trait Instrument: Send + Sync {
    fn parts(&self) -> &InstrumentParts;

    fn id(&self) -> &str {
        &self.parts().id
    }

    fn descriptor(&self) -> &Descriptor {
        &self.parts().descriptor
    }

    fn wiring(&self) -> &Wiring {
        &self.parts().wiring
    }

    fn variables(&self) -> &VariableSet {
        &self.parts().variables
    }

    fn dependencies(&self) -> &[Dependency] {
        self.parts().dependencies
    }

    fn tables(&self, _deps: &Deps<'_>) -> Result<Option<Vec<Table>>> {
        Ok(None)
    }

    /// Statements run once before the main scan.
    fn pre_scan(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        Ok(None)
    }

    /// Main-scan logic.
    fn program(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        Ok(None)
    }

    /// Statements run after the table calls.
    fn post_scan(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        Ok(None)
    }

    fn slow_sequence(&self, _deps: &Deps<'_>) -> Result<Option<SlowSequence>> {
        Ok(None)
    }

    /// User-defined `Function ... EndFunction` bodies.
    fn functions(&self, _deps: &Deps<'_>) -> Result<Option<Vec<String>>> {
        Ok(None)
    }
}
