//! Control-flow blocks for program fragments.
//!
//! Instruments build their scan logic from plain lines plus these blocks.
//! Bodies are indented four spaces per nesting level, line by line, so a
//! nested block stays aligned however deep it sits.

use std::fmt;

use crate::call::Arg;

const INDENT: &str = "    ";

/// Indent every non-blank line of `text` by `level` steps of four spaces.
///
/// Blank lines are left empty so the output never carries trailing
/// whitespace.
pub fn indent(text: &str, level: usize) -> String {
    let prefix = INDENT.repeat(level);
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Join condition parts with single spaces: `["x", "<=", "0"]` → `x <= 0`.
pub fn condition<I, T>(parts: I) -> String
where
    I: IntoIterator<Item = T>,
    T: Into<Arg>,
{
    parts
        .into_iter()
        .map(|p| p.into().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A block body: an ordered list of lines (each may itself span lines).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body(Vec<String>);

impl Body {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(mut self, line: impl ToString) -> Self {
        self.0.push(line.to_string());
        self
    }

    pub fn push(&mut self, line: impl ToString) {
        self.0.push(line.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn render(&self) -> String {
        indent(&self.0.join("\n"), 1)
    }
}

impl<T: ToString> FromIterator<T> for Body {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(|l| l.to_string()).collect())
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("\n"))
    }
}

/// `If <cond> Then` … `ElseIf` … `Else` … `EndIf`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfBlock {
    condition: String,
    body: Body,
    else_ifs: Vec<(String, Body)>,
    otherwise: Option<Body>,
}

impl IfBlock {
    pub fn new(condition: impl ToString, body: Body) -> Self {
        Self {
            condition: condition.to_string(),
            body,
            else_ifs: Vec::new(),
            otherwise: None,
        }
    }

    pub fn else_if(mut self, condition: impl ToString, body: Body) -> Self {
        self.else_ifs.push((condition.to_string(), body));
        self
    }

    pub fn otherwise(mut self, body: Body) -> Self {
        self.otherwise = Some(body);
        self
    }
}

impl fmt::Display for IfBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "If {} Then", self.condition)?;
        if !self.body.is_empty() {
            writeln!(f, "{}", self.body.render())?;
        }
        for (cond, body) in &self.else_ifs {
            writeln!(f, "ElseIf {cond} Then")?;
            if !body.is_empty() {
                writeln!(f, "{}", body.render())?;
            }
        }
        if let Some(body) = &self.otherwise {
            writeln!(f, "Else")?;
            if !body.is_empty() {
                writeln!(f, "{}", body.render())?;
            }
        }
        f.write_str("EndIf")
    }
}

/// `For v = start To end [Step s]` … `Next v`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForLoop {
    var: String,
    start: String,
    end: String,
    step: Option<String>,
    body: Body,
}

impl ForLoop {
    pub fn new(var: impl ToString, start: impl Into<Arg>, end: impl Into<Arg>, body: Body) -> Self {
        Self {
            var: var.to_string(),
            start: start.into().to_string(),
            end: end.into().to_string(),
            step: None,
            body,
        }
    }

    pub fn step(mut self, step: impl Into<Arg>) -> Self {
        self.step = Some(step.into().to_string());
        self
    }
}

impl fmt::Display for ForLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "For {} = {} To {}", self.var, self.start, self.end)?;
        if let Some(step) = &self.step {
            write!(f, " Step {step}")?;
        }
        writeln!(f)?;
        if !self.body.is_empty() {
            writeln!(f, "{}", self.body.render())?;
        }
        write!(f, "Next {}", self.var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn if_else_renders_indented() {
        let block = IfBlock::new(
            condition(["wind_spd", "<=", "0"]),
            Body::new().line("wind_dir = NAN").line("wind_timer = 3"),
        )
        .otherwise(Body::new().line("wind_timer = 0"));

        assert_eq!(
            block.to_string(),
            "If wind_spd <= 0 Then\n    wind_dir = NAN\n    wind_timer = 3\nElse\n    wind_timer = 0\nEndIf"
        );
    }

    #[test]
    fn nested_blocks_indent_every_line() {
        let inner = IfBlock::new("door_timer > 14400", Body::new().line("door = 0"));
        let outer = IfBlock::new("CheckPort(C4)", Body::new().line(inner));
        assert_eq!(
            outer.to_string(),
            "If CheckPort(C4) Then\n    If door_timer > 14400 Then\n        door = 0\n    EndIf\nEndIf"
        );
    }

    #[test]
    fn else_if_arms_in_order() {
        let block = IfBlock::new("a", Body::new().line("x = 1"))
            .else_if("b", Body::new().line("x = 2"))
            .otherwise(Body::new().line("x = 3"));
        let text = block.to_string();
        let a = text.find("If a Then").unwrap();
        let b = text.find("ElseIf b Then").unwrap();
        let c = text.find("Else\n").unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn for_loop_with_step() {
        let l = ForLoop::new("i", 1, 82, Body::new().line("ChgCntDat(i) = NAN")).step(1);
        assert_eq!(
            l.to_string(),
            "For i = 1 To 82 Step 1\n    ChgCntDat(i) = NAN\nNext i"
        );
    }

    #[test]
    fn indent_leaves_blank_lines_empty() {
        assert_eq!(indent("a\n\nb", 2), "        a\n\n        b");
    }
}
