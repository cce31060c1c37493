//! Document renderer.
//!
//! Lays the merged pieces out in the one order the target compiler accepts:
//! header, system configuration, wiring, declarations, directives, tables,
//! functions, then the `BeginProg` ... `EndProg` body. Sections are separated
//! by one blank line and empty sections are left out.

use loggerforge_core::logic::indent;
use loggerforge_core::{Instrument, ProgramOptions, SlowSequence, Table};

/// Per-instrument code fragments, collected in program order.
#[derive(Debug, Default)]
pub(crate) struct Fragments {
    pub pre_scan: Vec<String>,
    pub program: Vec<String>,
    pub post_scan: Vec<String>,
    pub functions: Vec<String>,
}

impl Fragments {
    /// Functions are deduplicated by their text; the first copy keeps its
    /// place.
    pub fn add_function(&mut self, body: String) {
        if !self.functions.contains(&body) {
            self.functions.push(body);
        }
    }
}

pub(crate) struct Document<'a> {
    pub name: &'a str,
    pub options: &'a ProgramOptions,
    pub instruments: &'a [Box<dyn Instrument>],
    pub tables: &'a [Table],
    pub sequences: &'a [SlowSequence],
    pub fragments: &'a Fragments,
}

pub(crate) fn render(doc: &Document<'_>) -> String {
    let mut sections = vec![header(doc), system_configuration(doc.instruments)];

    sections.extend(
        doc.instruments
            .iter()
            .filter(|i| !i.wiring().is_empty())
            .map(|i| wiring_block(i.as_ref())),
    );

    let declarations: Vec<String> = doc
        .instruments
        .iter()
        .flat_map(|i| i.variables().declarations())
        .collect();
    if !declarations.is_empty() {
        sections.push(declarations.join("\n"));
    }

    let mut directives = Vec::new();
    if doc.options.preserve_variables {
        directives.push("PreserveVariables".to_string());
    }
    directives.push(doc.options.mode.to_string());
    sections.push(directives.join("\n"));

    sections.extend(doc.tables.iter().map(ToString::to_string));
    sections.extend(doc.fragments.functions.iter().cloned());
    sections.push(body(doc));

    let mut text = sections.join("\n\n");
    text.push('\n');
    text
}

fn header(doc: &Document<'_>) -> String {
    let mut lines = vec![
        format!("'Program: {}", doc.name),
        format!("'Date: {}", doc.options.created.format("%Y-%m-%d")),
    ];
    if let Some(station) = &doc.options.station {
        lines.push(format!("'Station: {station}"));
    }
    lines.join("\n")
}

fn system_configuration(instruments: &[Box<dyn Instrument>]) -> String {
    let mut lines = vec!["'System Configuration".to_string()];
    for instrument in instruments {
        let d = instrument.descriptor();
        let mut line = format!("'{}: {} {}", d.category, d.manufacturer, d.model);
        if instrument.id() != d.type_id {
            line.push_str(&format!(" ({})", instrument.id()));
        }
        lines.push(line);
    }
    lines.join("\n")
}

fn wiring_block(instrument: &dyn Instrument) -> String {
    let d = instrument.descriptor();
    format!(
        "'Wiring: {} ({} {})\n{}",
        instrument.id(),
        d.manufacturer,
        d.model,
        instrument.wiring().diagram()
    )
}

fn body(doc: &Document<'_>) -> String {
    let f = doc.fragments;
    let mut lines = vec!["BeginProg".to_string()];

    lines.extend(f.pre_scan.iter().map(|s| indent(s, 1)));
    lines.push(indent(&doc.options.scan.to_string(), 1));
    lines.extend(f.program.iter().map(|s| indent(s, 2)));
    lines.extend(doc.tables.iter().map(|t| indent(&t.trigger_statement(), 2)));
    lines.extend(f.post_scan.iter().map(|s| indent(s, 2)));
    lines.push(indent("NextScan", 1));

    for sequence in doc.sequences {
        lines.push(String::new());
        lines.push(indent(&sequence.to_string(), 1));
    }

    lines.push("EndProg".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use loggerforge_core::{
        Descriptor, InstrumentParts, InstrumentSettings, Scan, TableItem, Terminal, TimeUnit,
        Variable, Wire, Wiring,
    };

    const BARO: Descriptor = Descriptor {
        type_id: "Setra_CS100",
        manufacturer: "Setra",
        model: "CS100",
        category: "Barometer",
    };

    struct Baro(InstrumentParts);

    impl Instrument for Baro {
        fn parts(&self) -> &InstrumentParts {
            &self.0
        }
    }

    fn baro() -> Box<dyn Instrument> {
        let parts = InstrumentParts::assemble(
            BARO,
            &InstrumentSettings::default(),
            Wiring::new(vec![Wire::new("Blue", Terminal::Se(2), "Signal H")]),
            vec![Variable::public("bp").units("kPa").into()],
            &[],
        )
        .unwrap();
        Box::new(Baro(parts))
    }

    fn options() -> ProgramOptions {
        ProgramOptions::new(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap())
    }

    #[test]
    fn full_layout() {
        let instruments = vec![baro()];
        let tables = vec![Table::new("FiveMin").item(TableItem::new("Average(1,bp,IEEE4,False)"))];
        let sequences =
            vec![SlowSequence::new("soil", Scan::new(1, TimeUnit::Min)).line("SDI12Recorder(s)")];
        let mut fragments = Fragments {
            pre_scan: vec!["x = 1".into()],
            program: vec!["VoltSE(bp)\nbp = bp*0.1".into()],
            post_scan: vec!["flag = 1".into()],
            functions: Vec::new(),
        };
        fragments.add_function("Function F()\nEndFunction".into());
        fragments.add_function("Function F()\nEndFunction".into());

        let mut options = options();
        options.preserve_variables = true;
        options.station = Some("Test Site".into());

        let text = render(&Document {
            name: "Station",
            options: &options,
            instruments: &instruments,
            tables: &tables,
            sequences: &sequences,
            fragments: &fragments,
        });

        let expected = "\
'Program: Station
'Date: 2026-01-15
'Station: Test Site

'System Configuration
'Barometer: Setra CS100

'Wiring: Setra_CS100 (Setra CS100)
'Blue:    SE2      Signal H

Public bp : Units bp = kPa

PreserveVariables
SequentialMode

DataTable(FiveMin,True,-1)
    DataInterval(0,5,Min,10)
    CardOut(0,-1)

    Average(1,bp,IEEE4,False)
EndTable

Function F()
EndFunction

BeginProg
    x = 1
    Scan(5,Sec,0,0)
        VoltSE(bp)
        bp = bp*0.1
        CallTable FiveMin
        flag = 1
    NextScan

    SlowSequence 'soil
    Scan(1,Min,0,0)
        SDI12Recorder(s)
    NextScan
EndProg
";
        assert_eq!(text, expected);
    }

    #[test]
    fn empty_program_keeps_skeleton() {
        let fragments = Fragments::default();
        let text = render(&Document {
            name: "Empty",
            options: &options(),
            instruments: &[],
            tables: &[],
            sequences: &[],
            fragments: &fragments,
        });
        assert_eq!(
            text,
            "'Program: Empty\n'Date: 2026-01-15\n\n'System Configuration\n\nSequentialMode\n\nBeginProg\n    Scan(5,Sec,0,0)\n    NextScan\nEndProg\n"
        );
    }
}
