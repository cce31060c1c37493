//! Instrument catalog: maps stable type identifiers to constructors.
//!
//! A [`Catalog`] is assembled once through a [`CatalogBuilder`] and is
//! immutable afterwards; callers pass it explicitly to whatever needs to
//! instantiate instruments.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::dependency::Dependency;
use crate::error::{Error, Result};
use crate::instrument::{Descriptor, Instrument, InstrumentSettings};

/// Builds an instrument from per-instance settings.
pub type Constructor = fn(&InstrumentSettings) -> Result<Box<dyn Instrument>>;

/// Per-instance settings a type cannot be built without.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Requirements {
    pub sdi12_address: bool,
    pub elevation: bool,
    /// Names of `params` entries without a default.
    pub params: Vec<&'static str>,
}

/// Metadata and constructor for one instrument type.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub descriptor: Descriptor,
    pub requirements: Requirements,
    pub dependencies: &'static [Dependency],
    #[serde(skip)]
    constructor: Constructor,
}

impl CatalogEntry {
    pub fn new(descriptor: Descriptor, constructor: Constructor) -> Self {
        Self {
            descriptor,
            requirements: Requirements::default(),
            dependencies: &[],
            constructor,
        }
    }

    pub fn requires_sdi12(mut self) -> Self {
        self.requirements.sdi12_address = true;
        self
    }

    pub fn requires_elevation(mut self) -> Self {
        self.requirements.elevation = true;
        self
    }

    pub fn requires_param(mut self, name: &'static str) -> Self {
        self.requirements.params.push(name);
        self
    }

    pub fn dependencies(mut self, dependencies: &'static [Dependency]) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn instantiate(&self, settings: &InstrumentSettings) -> Result<Box<dyn Instrument>> {
        (self.constructor)(settings)
    }
}

/// Collects entries before the catalog is frozen.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entries: BTreeMap<&'static str, CatalogEntry>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry. A later entry with the same type id replaces the
    /// earlier one.
    pub fn register(mut self, entry: CatalogEntry) -> Self {
        let type_id = entry.descriptor.type_id;
        if self.entries.insert(type_id, entry).is_some() {
            warn!(instrument = type_id, "Instrument type registered twice; keeping the later entry");
        }
        self
    }

    pub fn build(self) -> Catalog {
        Catalog {
            entries: self.entries,
        }
    }
}

/// An immutable registry of instrument types, ordered by type id.
#[derive(Debug)]
pub struct Catalog {
    entries: BTreeMap<&'static str, CatalogEntry>,
}

impl Catalog {
    pub fn get(&self, type_id: &str) -> Option<&CatalogEntry> {
        self.entries.get(type_id)
    }

    /// Construct an instance of `type_id`.
    pub fn instantiate(&self, type_id: &str, settings: &InstrumentSettings) -> Result<Box<dyn Instrument>> {
        self.get(type_id)
            .ok_or_else(|| Error::UnknownInstrument(type_id.to_string()))?
            .instantiate(settings)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn type_ids(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
