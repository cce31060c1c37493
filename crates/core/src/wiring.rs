//! Wiring Model: physical terminals and the wire roles assigned to them.
//!
//! A [`Terminal`] is one connector on the datalogger panel. A [`Wiring`] maps
//! an instrument's wire roles (usually a wire colour) to terminals and knows
//! how to draw itself as a comment block.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A physical terminal on the datalogger wiring panel.
///
/// `Display` gives the code used as an instruction argument (single-ended
/// channel 7 is just `7`); [`Terminal::label`] gives the unambiguous panel
/// label (`SE7`) used in diagrams and configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Terminal {
    /// Control port `C1`..`C8`.
    C(u8),
    /// Serial port pair `ComC1`, `ComC3`, `ComC5`, `ComC7`.
    ComC(u8),
    /// Pulse channel `P1`..`P7`.
    P(u8),
    /// Voltage excitation `Vx1`, `Vx2`.
    Vx(u8),
    /// Single-ended analog input `SE1`..`SE16`.
    Se(u8),
    /// High side of differential pair `DIFF1H`..`DIFF8H`.
    DiffHigh(u8),
    /// Low side of differential pair `DIFF1L`..`DIFF8L`.
    DiffLow(u8),
    /// Switched 12 V `SW12_1`, `SW12_2`.
    Sw12(u8),
    /// RS-485 ground `RG1`, `RG2`.
    Rg(u8),
    AnalogGround,
    Ground,
    Power12V,
    Power5V,
}

impl Terminal {
    /// Canonical panel label, e.g. `SE7`, `DIFF2H`, `SW12_1`.
    pub fn label(&self) -> String {
        match self {
            Terminal::C(n) => format!("C{n}"),
            Terminal::ComC(n) => format!("ComC{n}"),
            Terminal::P(n) => format!("P{n}"),
            Terminal::Vx(n) => format!("Vx{n}"),
            Terminal::Se(n) => format!("SE{n}"),
            Terminal::DiffHigh(n) => format!("DIFF{n}H"),
            Terminal::DiffLow(n) => format!("DIFF{n}L"),
            Terminal::Sw12(n) => format!("SW12_{n}"),
            Terminal::Rg(n) => format!("RG{n}"),
            Terminal::AnalogGround => "AG".into(),
            Terminal::Ground => "G".into(),
            Terminal::Power12V => "12V".into(),
            Terminal::Power5V => "5V".into(),
        }
    }

    /// Whether the channel number is one the panel actually has.
    fn in_range(&self) -> bool {
        match *self {
            Terminal::C(n) | Terminal::DiffHigh(n) | Terminal::DiffLow(n) => (1..=8).contains(&n),
            Terminal::ComC(n) => matches!(n, 1 | 3 | 5 | 7),
            Terminal::P(n) => (1..=7).contains(&n),
            Terminal::Se(n) => (1..=16).contains(&n),
            Terminal::Vx(n) | Terminal::Sw12(n) | Terminal::Rg(n) => (1..=2).contains(&n),
            _ => true,
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Se(n) | Terminal::DiffHigh(n) | Terminal::DiffLow(n) => write!(f, "{n}"),
            other => f.write_str(&other.label()),
        }
    }
}

impl FromStr for Terminal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        let invalid = || Error::InvalidTerminal(s.to_string());
        let num = |digits: &str| digits.parse::<u8>().map_err(|_| invalid());

        let terminal = match upper.as_str() {
            "AG" => Terminal::AnalogGround,
            "G" | "GND" => Terminal::Ground,
            "12V" => Terminal::Power12V,
            "5V" => Terminal::Power5V,
            u if u.starts_with("SW12_") => Terminal::Sw12(num(&u[5..])?),
            u if u.starts_with("COMC") => Terminal::ComC(num(&u[4..])?),
            u if u.starts_with("COM") => Terminal::ComC(num(&u[3..])?),
            u if u.starts_with("DIFF") && u.ends_with('H') => {
                Terminal::DiffHigh(num(&u[4..u.len() - 1])?)
            }
            u if u.starts_with("DIFF") && u.ends_with('L') => {
                Terminal::DiffLow(num(&u[4..u.len() - 1])?)
            }
            u if u.starts_with("SE") => Terminal::Se(num(&u[2..])?),
            u if u.starts_with("VX") => Terminal::Vx(num(&u[2..])?),
            u if u.starts_with("RG") => Terminal::Rg(num(&u[2..])?),
            u if u.starts_with('C') => Terminal::C(num(&u[1..])?),
            u if u.starts_with('P') => Terminal::P(num(&u[1..])?),
            u if !u.is_empty() && u.bytes().all(|b| b.is_ascii_digit()) => Terminal::Se(num(u)?),
            _ => return Err(invalid()),
        };

        if terminal.in_range() {
            Ok(terminal)
        } else {
            Err(invalid())
        }
    }
}

impl TryFrom<String> for Terminal {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Terminal> for String {
    fn from(t: Terminal) -> Self {
        t.label()
    }
}

/// One wire of an instrument cable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wire {
    pub role: String,
    /// `None` when the wire is left unconnected by default.
    pub terminal: Option<Terminal>,
    pub description: String,
}

impl Wire {
    pub fn new(role: impl Into<String>, terminal: Terminal, description: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            terminal: Some(terminal),
            description: description.into(),
        }
    }

    pub fn unconnected(role: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            terminal: None,
            description: description.into(),
        }
    }

    fn diagram_line(&self) -> String {
        let role = format!("{}:", self.role);
        let label = self.terminal.map(|t| t.label()).unwrap_or_else(|| "--".into());
        format!("'{role:<8} {label:<8} {}", self.description)
            .trim_end()
            .to_string()
    }
}

/// The role → terminal mapping of one instrument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wiring {
    wires: Vec<Wire>,
    note: Option<String>,
}

impl Wiring {
    pub fn new(wires: Vec<Wire>) -> Self {
        Self { wires, note: None }
    }

    /// Free-text line printed under the diagram.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    pub fn is_empty(&self) -> bool {
        self.wires.is_empty()
    }

    fn find(&self, role: &str, instrument: &str) -> Result<usize> {
        let mut hits = self
            .wires
            .iter()
            .enumerate()
            .filter(|(_, w)| w.role.eq_ignore_ascii_case(role))
            .map(|(i, _)| i);

        match (hits.next(), hits.next()) {
            (Some(i), None) => Ok(i),
            (None, _) => Err(Error::WiringRoleNotFound {
                role: role.to_string(),
                instrument: instrument.to_string(),
            }),
            (Some(_), Some(_)) => Err(Error::AmbiguousWiringRole {
                role: role.to_string(),
                instrument: instrument.to_string(),
            }),
        }
    }

    /// Resolve a role (case-insensitive) to its terminal.
    pub fn terminal(&self, role: &str, instrument: &str) -> Result<Terminal> {
        let wire = &self.wires[self.find(role, instrument)?];
        wire.terminal.ok_or_else(|| Error::UnconnectedWiringRole {
            role: wire.role.clone(),
            instrument: instrument.to_string(),
        })
    }

    /// Replace default terminals with caller-supplied assignments.
    ///
    /// Every override key must name a declared role, and at most once; roles
    /// not mentioned keep their default. An override may connect a role that
    /// is unconnected by default but never disconnect a connected one.
    pub fn apply_overrides(
        &mut self,
        overrides: &BTreeMap<String, Option<Terminal>>,
        instrument: &str,
    ) -> Result<()> {
        let mut assigned = vec![false; self.wires.len()];
        for (role, terminal) in overrides {
            let i = self.find(role, instrument)?;
            if std::mem::replace(&mut assigned[i], true) {
                return Err(Error::AmbiguousWiringRole {
                    role: self.wires[i].role.clone(),
                    instrument: instrument.to_string(),
                });
            }
            match terminal {
                Some(terminal) => self.wires[i].terminal = Some(*terminal),
                None if self.wires[i].terminal.is_some() => {
                    return Err(Error::InstrumentConfig {
                        instrument: instrument.to_string(),
                        setting: "wiring".into(),
                        reason: format!("role '{}' is connected and cannot be disconnected", self.wires[i].role),
                    });
                }
                None => {}
            }
        }
        Ok(())
    }

    /// The comment block drawn in the program header.
    pub fn diagram(&self) -> String {
        let mut lines: Vec<String> = self.wires.iter().map(Wire::diagram_line).collect();
        if let Some(note) = &self.note {
            lines.push(format!("'{note}"));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn young() -> Wiring {
        Wiring::new(vec![
            Wire::new("Red", Terminal::P(1), "WS Signal"),
            Wire::new("White", Terminal::Vx(2), "WD Excite"),
            Wire::new("Green", Terminal::Se(7), "WD Signal"),
            Wire::new("Black", Terminal::AnalogGround, "Signal G"),
            Wire::unconnected("Shield", "not used"),
        ])
        .with_note("* NOTE: Ground to EARTH in junction box")
    }

    #[test]
    fn parse_labels_case_insensitively() {
        assert_eq!("se7".parse::<Terminal>().unwrap(), Terminal::Se(7));
        assert_eq!("7".parse::<Terminal>().unwrap(), Terminal::Se(7));
        assert_eq!("comc7".parse::<Terminal>().unwrap(), Terminal::ComC(7));
        assert_eq!("Diff2H".parse::<Terminal>().unwrap(), Terminal::DiffHigh(2));
        assert_eq!("sw12_1".parse::<Terminal>().unwrap(), Terminal::Sw12(1));
        assert_eq!("12v".parse::<Terminal>().unwrap(), Terminal::Power12V);
        assert_eq!("vx1".parse::<Terminal>().unwrap(), Terminal::Vx(1));
    }

    #[test]
    fn reject_out_of_range_and_garbage() {
        assert!("C9".parse::<Terminal>().is_err());
        assert!("ComC2".parse::<Terminal>().is_err());
        assert!("SE17".parse::<Terminal>().is_err());
        assert!("banana".parse::<Terminal>().is_err());
        assert!("".parse::<Terminal>().is_err());
    }

    #[test]
    fn call_code_versus_label() {
        assert_eq!(Terminal::Se(7).to_string(), "7");
        assert_eq!(Terminal::DiffHigh(2).to_string(), "2");
        assert_eq!(Terminal::DiffHigh(2).label(), "DIFF2H");
        assert_eq!(Terminal::ComC(7).to_string(), "ComC7");
        assert_eq!(Terminal::Sw12(2).to_string(), "SW12_2");
    }

    #[test]
    fn serde_uses_labels() {
        let json = serde_json::to_string(&Terminal::Se(13)).unwrap();
        assert_eq!(json, "\"SE13\"");
        let back: Terminal = serde_json::from_str("\"c4\"").unwrap();
        assert_eq!(back, Terminal::C(4));
        assert!(serde_json::from_str::<Terminal>("\"Z1\"").is_err());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(young().terminal("green", "wind").unwrap(), Terminal::Se(7));
    }

    #[test]
    fn lookup_errors() {
        let w = young();
        assert!(matches!(
            w.terminal("Purple", "wind"),
            Err(Error::WiringRoleNotFound { role, instrument }) if role == "Purple" && instrument == "wind"
        ));
        assert!(matches!(
            w.terminal("shield", "wind"),
            Err(Error::UnconnectedWiringRole { .. })
        ));

        let dup = Wiring::new(vec![
            Wire::new("Clear", Terminal::AnalogGround, ""),
            Wire::new("CLEAR", Terminal::Ground, ""),
        ]);
        assert!(matches!(
            dup.terminal("clear", "x"),
            Err(Error::AmbiguousWiringRole { .. })
        ));
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut w = young();
        let mut overrides = BTreeMap::new();
        overrides.insert("green".to_string(), Some(Terminal::Se(3)));
        overrides.insert("Shield".to_string(), Some(Terminal::Ground));
        w.apply_overrides(&overrides, "wind").unwrap();
        assert_eq!(w.terminal("Green", "wind").unwrap(), Terminal::Se(3));
        assert_eq!(w.terminal("Shield", "wind").unwrap(), Terminal::Ground);
        assert_eq!(w.terminal("Red", "wind").unwrap(), Terminal::P(1));

        let mut bad = BTreeMap::new();
        bad.insert("Orange".to_string(), Some(Terminal::C(1)));
        assert!(matches!(
            w.apply_overrides(&bad, "wind"),
            Err(Error::WiringRoleNotFound { .. })
        ));
    }

    #[test]
    fn case_variant_override_keys_conflict() {
        let mut w = young();
        let mut overrides = BTreeMap::new();
        overrides.insert("Green".to_string(), Some(Terminal::Se(3)));
        overrides.insert("green".to_string(), Some(Terminal::Se(9)));
        assert!(matches!(
            w.apply_overrides(&overrides, "wind"),
            Err(Error::AmbiguousWiringRole { role, instrument }) if role == "Green" && instrument == "wind"
        ));
    }

    #[test]
    fn connected_role_cannot_be_disconnected() {
        let mut w = young();
        let mut overrides = BTreeMap::new();
        overrides.insert("Black".to_string(), None);
        assert!(matches!(
            w.apply_overrides(&overrides, "wind"),
            Err(Error::InstrumentConfig { setting, reason, .. })
                if setting == "wiring" && reason.contains("'Black'")
        ));

        let mut noop = BTreeMap::new();
        noop.insert("shield".to_string(), None);
        w.apply_overrides(&noop, "wind").unwrap();
        assert_eq!(w.terminal("Black", "wind").unwrap(), Terminal::AnalogGround);
        assert!(w.terminal("Shield", "wind").is_err());
    }

    #[test]
    fn diagram_layout() {
        let d = young().diagram();
        let lines: Vec<&str> = d.lines().collect();
        assert_eq!(lines[0], "'Red:     P1       WS Signal");
        assert_eq!(lines[2], "'Green:   SE7      WD Signal");
        assert_eq!(lines[4], "'Shield:  --       not used");
        assert_eq!(lines[5], "'* NOTE: Ground to EARTH in junction box");
    }
}
