//! Cross-instrument dependencies and their resolved bindings.
//!
//! Instruments stay immutable after construction. Resolution produces a
//! separate [`Bindings`] value that is handed to the render facets through
//! a per-instrument [`Deps`] view.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named variable an instrument needs from a sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub name: &'static str,
    pub description: &'static str,
}

/// Where a dependency should be taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyTarget {
    /// Id of the sibling instrument (its label, or its type id).
    pub instrument: String,
    /// Declared name of the variable on that sibling.
    pub variable: String,
}

/// A dependency resolved to a sibling's variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundVariable {
    pub instrument: String,
    pub variable: String,
    /// The sibling variable's final name.
    pub effective: String,
}

/// Resolved dependencies for every instrument of one program, indexed by
/// the instrument's position in the program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    by_instance: Vec<BTreeMap<String, BoundVariable>>,
}

impl Bindings {
    pub fn new(instances: usize) -> Self {
        Self {
            by_instance: vec![BTreeMap::new(); instances],
        }
    }

    pub fn bind(&mut self, instance: usize, dependency: &str, bound: BoundVariable) {
        if let Some(map) = self.by_instance.get_mut(instance) {
            map.insert(dependency.to_string(), bound);
        }
    }

    pub fn get(&self, instance: usize, dependency: &str) -> Option<&BoundVariable> {
        self.by_instance.get(instance)?.get(dependency)
    }

    /// The view handed to instrument `instance` while it renders.
    pub fn for_instance<'a>(&'a self, instance: usize, instrument: &'a str) -> Deps<'a> {
        Deps {
            instrument,
            source: match self.by_instance.get(instance) {
                Some(map) => Source::Bound(map),
                None => Source::Missing,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Source<'a> {
    Bound(&'a BTreeMap<String, BoundVariable>),
    Placeholders,
    Missing,
}

/// Read-only access to one instrument's resolved dependencies.
#[derive(Debug, Clone, Copy)]
pub struct Deps<'a> {
    instrument: &'a str,
    source: Source<'a>,
}

impl<'a> Deps<'a> {
    /// Shows every dependency as `<name>`; used when describing an
    /// instrument outside of a program.
    pub fn placeholders(instrument: &'a str) -> Self {
        Self {
            instrument,
            source: Source::Placeholders,
        }
    }

    /// Final name of the variable bound to `dependency`.
    pub fn name(&self, dependency: &str) -> Result<String> {
        match self.source {
            Source::Placeholders => Ok(format!("<{dependency}>")),
            Source::Bound(map) => map
                .get(dependency)
                .map(|b| b.effective.clone())
                .ok_or_else(|| self.missing(dependency)),
            Source::Missing => Err(self.missing(dependency)),
        }
    }

    fn missing(&self, dependency: &str) -> Error {
        Error::MissingDependency {
            instrument: self.instrument.to_string(),
            dependency: dependency.to_string(),
            reason: "not bound".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batt() -> BoundVariable {
        BoundVariable {
            instrument: "Campbell_CR1000X_Battery".into(),
            variable: "batt_volt".into(),
            effective: "batt_volt".into(),
        }
    }

    #[test]
    fn bound_dependency_resolves_to_effective_name() {
        let mut b = Bindings::new(2);
        b.bind(1, "battery_voltage", batt());
        let deps = b.for_instance(1, "Sierra_RV50X");
        assert_eq!(deps.name("battery_voltage").unwrap(), "batt_volt");
        assert_eq!(b.get(1, "battery_voltage").unwrap().instrument, "Campbell_CR1000X_Battery");
    }

    #[test]
    fn unbound_dependency_is_missing() {
        let b = Bindings::new(1);
        let err = b.for_instance(0, "Sierra_RV50X").name("battery_voltage").unwrap_err();
        assert!(matches!(
            err,
            Error::MissingDependency { instrument, dependency, .. }
                if instrument == "Sierra_RV50X" && dependency == "battery_voltage"
        ));
        assert!(b.for_instance(7, "x").name("y").is_err());
    }

    #[test]
    fn placeholders() {
        assert_eq!(
            Deps::placeholders("x").name("shutoff_voltage").unwrap(),
            "<shutoff_voltage>"
        );
    }
}
