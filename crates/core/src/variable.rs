//! Variable Model: declared program variables and indexed registers.

use std::fmt;

use crate::call::Arg;
use crate::error::{Error, Result};

/// How a variable is declared in the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// Persists and is visible in the public table.
    Public,
    Const,
    /// Scratch variable, not visible outside the program.
    Dim,
    /// Logical name for one element of a register.
    Alias,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeclKind::Public => "Public",
            DeclKind::Const => "Const",
            DeclKind::Dim => "Dim",
            DeclKind::Alias => "Alias",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Float,
    Long,
    Boolean,
    /// Optional fixed length, `String * n`.
    String(Option<u32>),
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Float => f.write_str("Float"),
            DataType::Long => f.write_str("Long"),
            DataType::Boolean => f.write_str("Boolean"),
            DataType::String(None) => f.write_str("String"),
            DataType::String(Some(n)) => write!(f, "String * {n}"),
        }
    }
}

/// A single declared variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    kind: DeclKind,
    data_type: Option<DataType>,
    value: Option<String>,
    units: Option<String>,
    rename: Option<String>,
    field_only: bool,
}

impl Variable {
    fn with_kind(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            kind,
            data_type: None,
            value: None,
            units: None,
            rename: None,
            field_only: false,
        }
    }

    pub fn public(name: impl Into<String>) -> Self {
        Self::with_kind(name, DeclKind::Public)
    }

    pub fn dim(name: impl Into<String>) -> Self {
        Self::with_kind(name, DeclKind::Dim)
    }

    /// A constant always carries its value.
    pub fn constant(name: impl Into<String>, value: impl Into<Arg>) -> Self {
        let value: Arg = value.into();
        let mut v = Self::with_kind(name, DeclKind::Const);
        v.value = Some(value.into());
        v
    }

    /// A name that only labels a table output column. Renamed like any
    /// other variable, never declared.
    pub fn field(name: impl Into<String>) -> Self {
        let mut v = Self::with_kind(name, DeclKind::Public);
        v.field_only = true;
        v
    }

    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Initial value for a `Public` declaration.
    pub fn initial(mut self, value: impl Into<Arg>) -> Self {
        let value: Arg = value.into();
        self.value = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DeclKind {
        self.kind
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn unit(&self) -> Option<&str> {
        self.units.as_deref()
    }

    pub fn is_field_only(&self) -> bool {
        self.field_only
    }

    /// The rename override if one was set, otherwise the declared name.
    pub fn effective_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }

    pub(crate) fn set_rename(&mut self, name: String) {
        self.rename = Some(name);
    }

    fn units_suffix(&self) -> String {
        match &self.units {
            Some(u) => format!(" : Units {} = {u}", self.effective_name()),
            None => String::new(),
        }
    }

    fn declaration(&self) -> String {
        let mut line = format!("{} {}", self.kind, self.effective_name());
        if let Some(t) = &self.data_type {
            line.push_str(&format!(" As {t}"));
        }
        if let Some(v) = &self.value {
            line.push_str(&format!(" = {v}"));
        }
        line.push_str(&self.units_suffix());
        line
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.effective_name())
    }
}

/// One physical array with logical aliases for some of its elements.
///
/// The base name is a fixed hardware identifier and is never renamed;
/// aliases are ordinary variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    base: Variable,
    dimension: u32,
    aliases: Vec<(u32, Variable)>,
}

impl Register {
    pub fn public(name: impl Into<String>, dimension: u32) -> Self {
        Self {
            base: Variable::public(name),
            dimension,
            aliases: Vec::new(),
        }
    }

    pub fn dim(name: impl Into<String>, dimension: u32) -> Self {
        Self {
            base: Variable::dim(name),
            dimension,
            aliases: Vec::new(),
        }
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.base.data_type = Some(data_type);
        self
    }

    pub fn alias(mut self, index: u32, name: impl Into<String>) -> Self {
        self.aliases
            .push((index, Variable::with_kind(name, DeclKind::Alias)));
        self
    }

    pub fn alias_with_units(mut self, index: u32, name: impl Into<String>, units: &str) -> Self {
        self.aliases
            .push((index, Variable::with_kind(name, DeclKind::Alias).units(units)));
        self
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    pub fn dimension(&self) -> u32 {
        self.dimension
    }

    /// `base(index)`, for loops and direct element access.
    pub fn element(&self, index: impl fmt::Display) -> String {
        format!("{}({index})", self.base.name())
    }

    pub fn aliases(&self) -> impl Iterator<Item = (u32, &Variable)> {
        self.aliases.iter().map(|(i, v)| (*i, v))
    }

    fn declarations(&self) -> Vec<String> {
        let mut head = format!("{} {}({})", self.base.kind, self.base.name, self.dimension);
        if let Some(t) = &self.base.data_type {
            head.push_str(&format!(" As {t}"));
        }
        let mut lines = vec![head];
        for (index, alias) in &self.aliases {
            lines.push(format!(
                "Alias {}({index}) = {}{}",
                self.base.name,
                alias.effective_name(),
                alias.units_suffix()
            ));
        }
        lines
    }
}

/// A declaration contributed by an instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    Scalar(Variable),
    Register(Register),
}

impl From<Variable> for Declaration {
    fn from(v: Variable) -> Self {
        Declaration::Scalar(v)
    }
}

impl From<Register> for Declaration {
    fn from(r: Register) -> Self {
        Declaration::Register(r)
    }
}

fn declared(d: &Declaration) -> Box<dyn Iterator<Item = &Variable> + '_> {
    match d {
        Declaration::Scalar(v) => Box::new(std::iter::once(v)),
        Declaration::Register(r) => {
            Box::new(std::iter::once(&r.base).chain(r.aliases.iter().map(|(_, v)| v)))
        }
    }
}

fn renameable(d: &mut Declaration) -> Box<dyn Iterator<Item = &mut Variable> + '_> {
    match d {
        Declaration::Scalar(v) => Box::new(std::iter::once(v)),
        Declaration::Register(r) => Box::new(r.aliases.iter_mut().map(|(_, v)| v)),
    }
}

/// All variables owned by one instrument, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSet {
    owner: String,
    decls: Vec<Declaration>,
}

impl VariableSet {
    /// Validate and collect an instrument's declarations.
    ///
    /// Declared names must be unique within the instrument (compared without
    /// case) and register aliases must point inside their register.
    pub fn build(owner: impl Into<String>, decls: Vec<Declaration>) -> Result<Self> {
        let set = Self {
            owner: owner.into(),
            decls,
        };

        let mut seen: Vec<String> = Vec::new();
        for v in set.iter() {
            let key = v.name.to_ascii_lowercase();
            if seen.contains(&key) {
                return Err(Error::DuplicateVariableName {
                    name: v.name.clone(),
                    first: set.owner.clone(),
                    second: set.owner.clone(),
                });
            }
            seen.push(key);
        }

        for reg in set.registers() {
            if reg.dimension == 0 {
                return Err(Error::InvalidDeclaration {
                    instrument: set.owner.clone(),
                    reason: format!("register '{}' has no elements", reg.name()),
                });
            }
            let mut used = Vec::new();
            for (index, alias) in reg.aliases() {
                if index == 0 || index > reg.dimension {
                    return Err(Error::InvalidDeclaration {
                        instrument: set.owner.clone(),
                        reason: format!(
                            "alias '{}' points at {}({index}) outside 1..={}",
                            alias.name(),
                            reg.name(),
                            reg.dimension
                        ),
                    });
                }
                if used.contains(&index) {
                    return Err(Error::InvalidDeclaration {
                        instrument: set.owner.clone(),
                        reason: format!("{}({index}) is aliased twice", reg.name()),
                    });
                }
                used.push(index);
            }
        }

        Ok(set)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Every variable: scalars, register bases and their aliases.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.decls.iter().flat_map(declared)
    }

    pub fn registers(&self) -> impl Iterator<Item = &Register> {
        self.decls.iter().filter_map(|d| match d {
            Declaration::Register(r) => Some(r),
            Declaration::Scalar(_) => None,
        })
    }

    /// Look up by declared name.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.iter().find(|v| v.name == name)
    }

    /// Effective name of a declared variable.
    pub fn name(&self, name: &str) -> Result<&str> {
        self.get(name)
            .map(Variable::effective_name)
            .ok_or_else(|| Error::UnknownVariable {
                instrument: self.owner.clone(),
                name: name.to_string(),
            })
    }

    pub fn register(&self, name: &str) -> Result<&Register> {
        self.registers()
            .find(|r| r.name() == name)
            .ok_or_else(|| Error::UnknownVariable {
                instrument: self.owner.clone(),
                name: name.to_string(),
            })
    }

    /// Variables a rename transform may touch: everything except register
    /// bases.
    pub(crate) fn renameable_mut(&mut self) -> impl Iterator<Item = &mut Variable> {
        self.decls.iter_mut().flat_map(renameable)
    }

    /// Rendered declaration lines, skipping field-only variables.
    pub fn declarations(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for d in &self.decls {
            match d {
                Declaration::Scalar(v) if v.field_only => {}
                Declaration::Scalar(v) => lines.push(v.declaration()),
                Declaration::Register(r) => lines.extend(r.declarations()),
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hmp() -> VariableSet {
        VariableSet::build(
            "Vaisala_HMP155",
            vec![
                Register::public("rhtemp", 2)
                    .data_type(DataType::Float)
                    .alias_with_units(1, "rh", "%")
                    .alias_with_units(2, "air_temp", "deg C")
                    .into(),
                Variable::public("reset_hmp155").data_type(DataType::Boolean).into(),
                Variable::dim("SerialIngest").data_type(DataType::String(Some(26))).into(),
                Variable::constant("CRLF", "CHR(13)+CHR(10)").into(),
                Variable::field("air_temp_max").into(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn declaration_lines() {
        assert_eq!(
            hmp().declarations(),
            vec![
                "Public rhtemp(2) As Float",
                "Alias rhtemp(1) = rh : Units rh = %",
                "Alias rhtemp(2) = air_temp : Units air_temp = deg C",
                "Public reset_hmp155 As Boolean",
                "Dim SerialIngest As String * 26",
                "Const CRLF = CHR(13)+CHR(10)",
            ]
        );
    }

    #[test]
    fn public_with_units_and_initial_value() {
        let v = Variable::public("pluv_flag").initial(1);
        assert_eq!(v.declaration(), "Public pluv_flag = 1");
        let v = Variable::public("wind_spd").units("m s-1");
        assert_eq!(v.declaration(), "Public wind_spd : Units wind_spd = m s-1");
    }

    #[test]
    fn constant_always_has_value() {
        let c = Variable::constant("WS_multiplier", 0.1666);
        assert_eq!(c.value(), Some("0.1666"));
        assert_eq!(c.kind(), DeclKind::Const);
    }

    #[test]
    fn lookup_by_declared_name() {
        let set = hmp();
        assert_eq!(set.name("rh").unwrap(), "rh");
        assert_eq!(set.register("rhtemp").unwrap().element(1), "rhtemp(1)");
        assert!(matches!(
            set.name("nope"),
            Err(Error::UnknownVariable { name, .. }) if name == "nope"
        ));
    }

    #[test]
    fn rename_changes_effective_name_only() {
        let mut set = hmp();
        for v in set.renameable_mut() {
            let renamed = format!("{}_200", v.name());
            v.set_rename(renamed);
        }
        assert_eq!(set.name("rh").unwrap(), "rh_200");
        assert_eq!(set.get("rhtemp").unwrap().effective_name(), "rhtemp");
        assert!(set
            .declarations()
            .contains(&"Alias rhtemp(1) = rh_200 : Units rh_200 = %".to_string()));
    }

    #[test]
    fn duplicate_within_instrument_rejected() {
        let err = VariableSet::build(
            "x",
            vec![Variable::public("bp").into(), Variable::dim("BP").into()],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateVariableName { name, .. } if name == "BP"));
    }

    #[test]
    fn alias_outside_register_rejected() {
        let err = VariableSet::build("x", vec![Register::public("arr", 2).alias(3, "c").into()])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDeclaration { .. }));

        let err = VariableSet::build(
            "x",
            vec![Register::public("arr", 2).alias(1, "a").alias(1, "b").into()],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDeclaration { .. }));
    }
}
