//! Variable Naming Engine.
//!
//! Two passes: a per-instrument suffix transform applied at construction,
//! then a program-wide check that every effective name is a valid, unique
//! identifier.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::variable::VariableSet;

/// Longest identifier the target compiler accepts.
pub const MAX_IDENTIFIER_LEN: usize = 39;

/// Which per-instance metadata is appended to variable names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameInclusion {
    #[default]
    None,
    Sdi12,
    Elevation,
    Both,
}

impl NameInclusion {
    /// The suffix to append, or `None` when names are left alone.
    pub fn suffix(
        &self,
        instrument: &str,
        sdi12_address: Option<&str>,
        elevation: Option<i32>,
    ) -> Result<Option<String>> {
        let address = || {
            sdi12_address.ok_or_else(|| Error::InstrumentConfig {
                instrument: instrument.to_string(),
                setting: "sdi12_address".into(),
                reason: "variable names include the SDI-12 address".into(),
            })
        };
        let elevation = || {
            elevation.map(elevation_token).ok_or_else(|| Error::InstrumentConfig {
                instrument: instrument.to_string(),
                setting: "elevation".into(),
                reason: "variable names include the elevation".into(),
            })
        };

        Ok(match self {
            NameInclusion::None => None,
            NameInclusion::Sdi12 => Some(format!("_{}", address()?)),
            NameInclusion::Elevation => Some(format!("_{}", elevation()?)),
            NameInclusion::Both => Some(format!("_{}_{}", address()?, elevation()?)),
        })
    }
}

/// Elevations may be negative (below ground); `-` is not legal in a name.
fn elevation_token(elevation: i32) -> String {
    if elevation < 0 {
        format!("n{}", elevation.unsigned_abs())
    } else {
        elevation.to_string()
    }
}

/// Append `suffix` to every renameable variable in the set.
pub fn apply_suffix(variables: &mut VariableSet, suffix: &str) {
    for v in variables.renameable_mut() {
        let renamed = format!("{}{suffix}", v.name());
        v.set_rename(renamed);
    }
}

fn identifier() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").ok())
        .as_ref()
}

pub fn is_identifier(name: &str) -> bool {
    name.len() <= MAX_IDENTIFIER_LEN && identifier().is_some_and(|re| re.is_match(name))
}

/// Check effective names across every instrument, in program order.
///
/// The target dialect ignores case, so `BP` and `bp` collide. The first
/// collision found is reported with both owners.
pub fn ensure_unique<'a, I>(sets: I) -> Result<()>
where
    I: IntoIterator<Item = &'a VariableSet>,
{
    let mut owners: HashMap<String, &'a str> = HashMap::new();

    for set in sets {
        for v in set.iter() {
            let name = v.effective_name();
            if !is_identifier(name) {
                return Err(Error::InvalidVariableName {
                    name: name.to_string(),
                    instrument: set.owner().to_string(),
                });
            }
            if let Some(first) = owners.get(&name.to_ascii_lowercase()) {
                return Err(Error::DuplicateVariableName {
                    name: name.to_string(),
                    first: first.to_string(),
                    second: set.owner().to_string(),
                });
            }
            owners.insert(name.to_ascii_lowercase(), set.owner());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::{Register, Variable};

    fn set(owner: &str, names: &[&str]) -> VariableSet {
        VariableSet::build(owner, names.iter().map(|n| Variable::public(*n).into()).collect()).unwrap()
    }

    #[test]
    fn suffix_forms() {
        assert_eq!(NameInclusion::None.suffix("x", None, None).unwrap(), None);
        assert_eq!(
            NameInclusion::Sdi12.suffix("x", Some("3"), None).unwrap().as_deref(),
            Some("_3")
        );
        assert_eq!(
            NameInclusion::Elevation.suffix("x", None, Some(-20)).unwrap().as_deref(),
            Some("_n20")
        );
        assert_eq!(
            NameInclusion::Both.suffix("x", Some("a"), Some(200)).unwrap().as_deref(),
            Some("_a_200")
        );
    }

    #[test]
    fn suffix_needs_its_setting() {
        let err = NameInclusion::Elevation.suffix("Setra_CS100", None, None).unwrap_err();
        assert!(matches!(err, Error::InstrumentConfig { setting, .. } if setting == "elevation"));
        let err = NameInclusion::Both.suffix("Setra_CS100", None, Some(1)).unwrap_err();
        assert!(matches!(err, Error::InstrumentConfig { setting, .. } if setting == "sdi12_address"));
    }

    #[test]
    fn suffix_skips_register_base() {
        let mut vars = VariableSet::build(
            "soil",
            vec![
                Register::public("soil_1", 2).alias(1, "soil_vwc").alias(2, "soil_temp").into(),
                Variable::field("vwc").into(),
            ],
        )
        .unwrap();
        apply_suffix(&mut vars, "_n10");
        assert_eq!(vars.name("soil_1").unwrap(), "soil_1");
        assert_eq!(vars.name("soil_vwc").unwrap(), "soil_vwc_n10");
        assert_eq!(vars.name("vwc").unwrap(), "vwc_n10");
    }

    #[test]
    fn duplicate_across_instruments_names_both() {
        let a = set("Setra_CS100", &["bp"]);
        let b = set("Other", &["wind_spd", "bp"]);
        let err = ensure_unique([&a, &b]).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicateVariableName { name, first, second }
                if name == "bp" && first == "Setra_CS100" && second == "Other"
        ));
    }

    #[test]
    fn comparison_ignores_case() {
        let a = set("a", &["BP"]);
        let b = set("b", &["bp"]);
        assert!(ensure_unique([&a, &b]).is_err());
    }

    #[test]
    fn suffix_resolves_collision() {
        let a = set("a", &["bp"]);
        let mut b = set("b", &["bp"]);
        apply_suffix(&mut b, "_200");
        assert!(ensure_unique([&a, &b]).is_ok());
    }

    #[test]
    fn identifier_rules() {
        assert!(is_identifier("wind_spd"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(&"x".repeat(40)));
        assert!(is_identifier(&"x".repeat(39)));

        let bad = set("a", &["bad name"]);
        assert!(matches!(
            ensure_unique([&bad]),
            Err(Error::InvalidVariableName { .. })
        ));
    }
}
