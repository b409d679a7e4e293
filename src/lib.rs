#![deny(missing_docs)]

//! qcbridge - chemistry-software input/output translation and job
//! diagnostics
//!
//! qcbridge generates input files for and parses output files from several
//! third-party quantum-chemistry and molecular-modeling programs (NWChem,
//! ORCA, xtb, Spartan and a generic QM/MM coupling driver), and classifies
//! failed runs against a library of known error patterns.
//!
//! # Overview
//!
//! Jobs are described as trees of [`Directive`]s: named, nestable blocks
//! holding keywords, child blocks and optional verbatim text. Each target
//! program has three adapters behind shared capabilities:
//!
//! - a [`DirectiveOrderer`](ordering::DirectiveOrderer) imposing the
//!   section/keyword order that program's grammar mandates (e.g. NWChem's
//!   `task` first, `start` last, `theory` before `operation`);
//! - an [`InputDialect`](writer::InputDialect) holding the program's
//!   section delimiters and keyword syntax, used by the shared renderer in
//!   [`writer`];
//! - an [`OutputAnalyzer`](analyzer::OutputAnalyzer) that fingerprints an
//!   output artifact by content and parses it into a structured
//!   [`Analysis`] (termination status, tagged energies, geometry blocks).
//!
//! The [`factory`] selects analyzers at runtime by probing fingerprints in
//! a fixed registration order, treating single files and directory
//! bundles (Spartan) uniformly. Failed runs are classified by the
//! [`error_patterns`] library, loaded once from a directory tree of
//! `*.err` files and shared read-only across diagnostic passes.
//!
//! # Quick Start
//!
//! ```no_run
//! use qcbridge::directive::{Directive, Keyword};
//! use qcbridge::factory;
//! use qcbridge::program::Program;
//! use qcbridge::writer::render;
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Render an NWChem input; ordering is imposed at render time.
//!     let mut task = Directive::new("task");
//!     task.add_keyword(Keyword::new("operation", "energy"));
//!     task.add_keyword(Keyword::new("theory", "dft"));
//!     let mut root = Directive::new("input");
//!     root.add_child(task);
//!     let text = render(&root, factory::dialect_for(Program::Nwchem).as_ref())?;
//!
//!     // Analyze whatever a finished job left behind.
//!     let analyzer = factory::analyzer_for(Path::new("job.out"))?;
//!     let analysis = analyzer.parse(Path::new("job.out"))?;
//!     println!("{}: {:?}", analysis.program, analysis.termination);
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency
//!
//! Directive trees are borrowed immutably by the renderer and never shared
//! across concurrent serializations; the pattern library is immutable
//! after load. Every analysis pass is stateless, so independent
//! (program, artifact) passes can run concurrently without locking.

pub mod analyzer;
/// Van-der-Waals clash detection value objects
pub mod clash;
pub mod directive;
/// Known-failure pattern library
pub mod error_patterns;
pub mod factory;
/// Built-in help topics
pub mod help;
pub mod nwchem;
pub mod orca;
pub mod ordering;
pub mod program;
pub mod qmmm;
/// Configuration management
pub mod settings;
pub mod spartan;
/// Named-capability façade
pub mod task;
/// Starter input templates
pub mod template;
pub mod writer;
pub mod xtb;

pub use analyzer::{Analysis, Termination};
pub use directive::{Directive, Keyword};
pub use program::Program;
