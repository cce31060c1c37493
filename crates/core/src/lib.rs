//! # LoggerForge Core
//!
//! Domain types, traits, and error definitions for assembling datalogger
//! programs from instrument fragments. This crate does no I/O: it defines
//! the model that the instrument definitions and the assembler build on.
//!
//! ## Layout
//!
//! - [`call`], [`logic`]: text builders for instructions and control flow
//! - [`variable`], [`wiring`], [`table`], [`sequence`]: what an instrument owns
//! - [`instrument`], [`dependency`], [`naming`]: the instrument contract
//! - [`catalog`]: the immutable type registry
//! - [`program`], [`check`]: request types and the external check seam

pub mod call;
pub mod catalog;
pub mod check;
pub mod dependency;
pub mod error;
pub mod instrument;
pub mod logic;
pub mod naming;
pub mod program;
pub mod sequence;
pub mod table;
pub mod variable;
pub mod wiring;

// Re-export key types at crate root for ergonomics
pub use call::{Arg, Call};
pub use catalog::{Catalog, CatalogBuilder, CatalogEntry, Constructor, Requirements};
pub use check::{CheckError, CheckReport, SyntaxChecker};
pub use dependency::{Bindings, BoundVariable, Dependency, DependencyTarget, Deps};
pub use error::{Error, Result};
pub use instrument::{Descriptor, Instrument, InstrumentParts, InstrumentSettings, Sdi12Address};
pub use logic::{Body, ForLoop, IfBlock};
pub use naming::NameInclusion;
pub use program::{ExecutionMode, InstrumentRequest, ProgramOptions, ProgramRequest};
pub use sequence::{Scan, SlowSequence, TimeUnit};
pub use table::{CardOut, DataInterval, Table, TableItem, TableSettings};
pub use variable::{DataType, DeclKind, Declaration, Register, Variable, VariableSet};
pub use wiring::{Terminal, Wire, Wiring};
