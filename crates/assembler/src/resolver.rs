//! Dependency Resolver.
//!
//! Binds every declared dependency to a sibling instrument's variable using
//! the mapping supplied with each instrument request. Instruments are not
//! touched; the result is a separate [`Bindings`] value.

use loggerforge_core::{Bindings, BoundVariable, Error, Instrument, InstrumentRequest, Result};
use tracing::{debug, warn};

/// Resolve the dependencies of `instruments`, where `requests[i]` is the
/// request `instruments[i]` was built from.
pub fn resolve(instruments: &[Box<dyn Instrument>], requests: &[InstrumentRequest]) -> Result<Bindings> {
    let mut bindings = Bindings::new(instruments.len());

    for (index, (instrument, request)) in instruments.iter().zip(requests).enumerate() {
        let id = instrument.id();
        let missing = |dependency: &str, reason: String| Error::MissingDependency {
            instrument: id.to_string(),
            dependency: dependency.to_string(),
            reason,
        };

        for dependency in instrument.dependencies() {
            let target = request
                .dependencies
                .get(dependency.name)
                .ok_or_else(|| missing(dependency.name, "no source instrument and variable given".into()))?;

            let mut candidates = instruments
                .iter()
                .enumerate()
                .filter(|(_, other)| other.id() == target.instrument);
            let (source_index, source) = match (candidates.next(), candidates.next()) {
                (Some(hit), None) => hit,
                (None, _) => {
                    return Err(missing(
                        dependency.name,
                        format!("instrument '{}' is not part of the program", target.instrument),
                    ));
                }
                (Some(_), Some(_)) => {
                    return Err(missing(
                        dependency.name,
                        format!(
                            "more than one instrument is identified as '{}'; give them labels",
                            target.instrument
                        ),
                    ));
                }
            };
            if source_index == index {
                return Err(missing(
                    dependency.name,
                    "an instrument cannot satisfy its own dependency".into(),
                ));
            }

            let variable = source.variables().get(&target.variable).ok_or_else(|| {
                missing(
                    dependency.name,
                    format!("'{}' has no variable '{}'", target.instrument, target.variable),
                )
            })?;
            // Field-only names are never declared, so nothing can refer to them.
            if variable.is_field_only() {
                return Err(missing(
                    dependency.name,
                    format!("'{}' only labels table columns", target.variable),
                ));
            }
            let effective = variable.effective_name();

            debug!(
                instrument = %id,
                dependency = dependency.name,
                source = %target.instrument,
                variable = %effective,
                "Dependency bound"
            );
            bindings.bind(
                index,
                dependency.name,
                BoundVariable {
                    instrument: target.instrument.clone(),
                    variable: target.variable.clone(),
                    effective: effective.to_string(),
                },
            );
        }

        for name in request.dependencies.keys() {
            if !instrument.dependencies().iter().any(|d| d.name == name) {
                warn!(instrument = %id, dependency = %name, "Ignoring binding for an undeclared dependency");
            }
        }
    }

    Ok(bindings)
}
