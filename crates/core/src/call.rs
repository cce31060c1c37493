//! Call Library: formats a named instruction and its arguments.
//!
//! Everything here is pure: a [`Call`] is just a name and a list of already
//! rendered arguments, and its `Display` form is the text that lands in the
//! program (`Average(1,bp,IEEE4,False)`).

use std::fmt;

use crate::wiring::Terminal;

/// A single rendered argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg(String);

impl Arg {
    /// A string literal, wrapped in double quotes.
    pub fn quoted(text: impl AsRef<str>) -> Self {
        Self(format!("\"{}\"", text.as_ref()))
    }

    /// An unquoted token, passed through as written.
    pub fn raw(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for Arg {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Self(if b { "True" } else { "False" }.to_string())
    }
}

macro_rules! arg_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Arg {
                fn from(n: $t) -> Self {
                    Self(n.to_string())
                }
            }
        )*
    };
}

arg_from_number!(i32, i64, u8, u32, u64, usize, f64);

impl From<Terminal> for Arg {
    fn from(t: Terminal) -> Self {
        Self(t.to_string())
    }
}

impl From<Call> for Arg {
    fn from(c: Call) -> Self {
        Self(c.to_string())
    }
}

impl From<Arg> for String {
    fn from(a: Arg) -> Self {
        a.0
    }
}

/// A formatted instruction call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    name: String,
    args: Vec<Arg>,
}

impl Call {
    pub fn new(name: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Arg] {
        &self.args
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

impl From<Call> for String {
    fn from(c: Call) -> Self {
        c.to_string()
    }
}

/// Build a [`Call`] from a name and any arguments convertible into [`Arg`].
///
/// ```
/// use loggerforge_core::call;
///
/// let c = call!("PortSet", "C2", 1);
/// assert_eq!(c.to_string(), "PortSet(C2,1)");
/// ```
#[macro_export]
macro_rules! call {
    ($name:expr $(, $arg:expr)* $(,)?) => {
        $crate::call::Call::new($name, vec![$($crate::call::Arg::from($arg)),*])
    };
}

// ── Output instructions ──────────────────────────────────────────────────
//
// The table output instructions show up in nearly every instrument, so they
// get typed helpers. Everything else goes through `call!`.

/// `Average(Reps, Source, DataType, DisableVar)`
pub fn average(reps: u32, source: &str, data_type: &str, disable: impl Into<Arg>) -> Call {
    let disable: Arg = disable.into();
    crate::call!("Average", reps, source, data_type, disable)
}

/// `Sample(Reps, Source, DataType)`
pub fn sample(reps: u32, source: &str, data_type: &str) -> Call {
    crate::call!("Sample", reps, source, data_type)
}

/// `Maximum(Reps, Source, DataType, DisableVar, Time)`
pub fn maximum(reps: u32, source: &str, data_type: &str, disable: impl Into<Arg>, time: bool) -> Call {
    let disable: Arg = disable.into();
    crate::call!("Maximum", reps, source, data_type, disable, time)
}

/// `Minimum(Reps, Source, DataType, DisableVar, Time)`
pub fn minimum(reps: u32, source: &str, data_type: &str, disable: impl Into<Arg>, time: bool) -> Call {
    let disable: Arg = disable.into();
    crate::call!("Minimum", reps, source, data_type, disable, time)
}

/// `Totalize(Reps, Source, DataType, DisableVar)`
pub fn totalize(reps: u32, source: &str, data_type: &str, disable: impl Into<Arg>) -> Call {
    let disable: Arg = disable.into();
    crate::call!("Totalize", reps, source, data_type, disable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_without_spaces() {
        let c = crate::call!("WindVector", 1, "wind_spd", "wind_dir", "FP2", false, 0, 0, 0);
        assert_eq!(
            c.to_string(),
            "WindVector(1,wind_spd,wind_dir,FP2,False,0,0,0)"
        );
    }

    #[test]
    fn floats_and_quoted_strings() {
        let c = crate::call!("VoltSE", "bp", 1, "mV5000", 2, true, 0, 60, 0.2, 600);
        assert_eq!(c.to_string(), "VoltSE(bp,1,mV5000,2,True,0,60,0.2,600)");

        let c = crate::call!("FileOpen", Arg::quoted("USR:Dist2Gnd.txt"), Arg::quoted("r"), 0);
        assert_eq!(c.to_string(), "FileOpen(\"USR:Dist2Gnd.txt\",\"r\",0)");
    }

    #[test]
    fn nested_calls_and_terminals() {
        let inner = crate::call!("IfTime", 4, 5, "Min");
        let outer = crate::call!("Not", inner);
        assert_eq!(outer.to_string(), "Not(IfTime(4,5,Min))");

        let c = crate::call!("PulseCount", "wind_spd", 1, Terminal::P(1), 5, 1, 0.1666, 0);
        assert_eq!(c.to_string(), "PulseCount(wind_spd,1,P1,5,1,0.1666,0)");
    }

    #[test]
    fn empty_argument_list() {
        assert_eq!(crate::call!("Battery").to_string(), "Battery()");
    }

    #[test]
    fn output_helpers() {
        assert_eq!(average(1, "bp", "IEEE4", false).to_string(), "Average(1,bp,IEEE4,False)");
        assert_eq!(
            maximum(1, "wind_spd", "FP2", false, false).to_string(),
            "Maximum(1,wind_spd,FP2,False,False)"
        );
        assert_eq!(totalize(1, "ppt", "IEEE4", "pluv_flag").to_string(), "Totalize(1,ppt,IEEE4,pluv_flag)");
    }
}
