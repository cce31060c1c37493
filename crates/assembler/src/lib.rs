//! # LoggerForge Assembler
//!
//! Turns a [`ProgramRequest`] into one program document. Each stage is a
//! hard precondition for the next:
//!
//! 1. construct every instrument from the catalog
//! 2. check that effective variable names are unique
//! 3. resolve dependencies ([`resolver`])
//! 4. merge same-named tables ([`merge`])
//! 5. group same-id slow sequences ([`grouper`])
//! 6. render
//!
//! Assembly is synchronous and pure: the same request always produces the
//! same text, and any error aborts the run without partial output.

pub mod grouper;
pub mod merge;
pub mod resolver;

mod render;

use loggerforge_core::{
    Catalog, Deps, Descriptor, Instrument, ProgramRequest, Result, SlowSequence, Table, naming,
};
use tracing::{debug, info};

use crate::render::{Document, Fragments};

/// The result of a successful assembly.
#[derive(Debug, Clone)]
pub struct AssembledProgram {
    /// The complete document, newline-terminated.
    pub text: String,
    /// Merged tables in first-seen order.
    pub tables: Vec<Table>,
    /// Grouped slow sequences in first-seen order.
    pub sequences: Vec<SlowSequence>,
    /// Instance id and descriptor of every instrument, in program order.
    pub instruments: Vec<(String, Descriptor)>,
}

/// Assembles programs against one catalog.
pub struct ProgramAssembler<'c> {
    catalog: &'c Catalog,
}

impl<'c> ProgramAssembler<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    pub fn assemble(&self, request: &ProgramRequest) -> Result<AssembledProgram> {
        info!(
            program = %request.name,
            instruments = request.instruments.len(),
            "Assembling program"
        );

        let instruments = request
            .instruments
            .iter()
            .map(|r| {
                debug!(instrument = %r.type_id, "Constructing instrument");
                self.catalog.instantiate(&r.type_id, &r.settings)
            })
            .collect::<Result<Vec<_>>>()?;

        naming::ensure_unique(instruments.iter().map(|i| i.variables()))?;

        let bindings = resolver::resolve(&instruments, &request.instruments)?;

        let mut tables = Vec::new();
        let mut sequences = Vec::new();
        let mut fragments = Fragments::default();
        for (index, instrument) in instruments.iter().enumerate() {
            let id = instrument.id();
            let deps = bindings.for_instance(index, id);

            if let Some(t) = instrument.tables(&deps)? {
                tables.push((id, t));
            }
            if let Some(s) = instrument.slow_sequence(&deps)? {
                sequences.push((id, s));
            }
            fragments.pre_scan.extend(instrument.pre_scan(&deps)?);
            fragments.program.extend(instrument.program(&deps)?);
            fragments.post_scan.extend(instrument.post_scan(&deps)?);
            for function in instrument.functions(&deps)?.unwrap_or_default() {
                fragments.add_function(function);
            }
        }

        let tables = merge::merge_tables(tables)?;
        let sequences = grouper::group_sequences(sequences);

        let text = render::render(&Document {
            name: &request.name,
            options: &request.options,
            instruments: &instruments,
            tables: &tables,
            sequences: &sequences,
            fragments: &fragments,
        });

        info!(
            program = %request.name,
            tables = tables.len(),
            sequences = sequences.len(),
            bytes = text.len(),
            "Program assembled"
        );

        Ok(AssembledProgram {
            text,
            tables,
            sequences,
            instruments: instruments
                .iter()
                .map(|i| (i.id().to_string(), *i.descriptor()))
                .collect(),
        })
    }
}

/// Human-readable summary of one instrument on its own: wiring defaults,
/// declarations and every facet it provides. Dependencies are shown as
/// `<name>` placeholders.
pub fn describe(instrument: &dyn Instrument) -> Result<String> {
    let deps = Deps::placeholders(instrument.id());
    let mut sections = vec![instrument.descriptor().to_string()];

    if !instrument.wiring().is_empty() {
        sections.push(format!("Wiring Defaults:\n{}", instrument.wiring().diagram()));
    }
    sections.push(format!(
        "Variables:\n{}",
        instrument.variables().declarations().join("\n")
    ));
    if !instrument.dependencies().is_empty() {
        let lines: Vec<String> = instrument
            .dependencies()
            .iter()
            .map(|d| format!("<{}>: {}", d.name, d.description))
            .collect();
        sections.push(format!("Dependencies:\n{}", lines.join("\n")));
    }
    if let Some(tables) = instrument.tables(&deps)? {
        let tables: Vec<String> = tables.iter().map(ToString::to_string).collect();
        sections.push(format!("Defined Tables:\n{}", tables.join("\n\n")));
    }
    if let Some(functions) = instrument.functions(&deps)? {
        sections.push(format!("User-Defined Functions:\n{}", functions.join("\n\n")));
    }
    if let Some(pre) = instrument.pre_scan(&deps)? {
        sections.push(format!("Pre-Scan Logic:\n{pre}"));
    }
    if let Some(program) = instrument.program(&deps)? {
        sections.push(format!("Program Logic:\n{program}"));
    }
    if let Some(post) = instrument.post_scan(&deps)? {
        sections.push(format!("Post Table Call Logic:\n{post}"));
    }
    if let Some(sequence) = instrument.slow_sequence(&deps)? {
        sections.push(format!("Slow Sequence:\n{sequence}"));
    }

    Ok(sections.join("\n\n"))
}
