//! Input rendering for directive trees.
//!
//! [`render`] turns a directive tree into syntactically valid input text
//! for one target program. The per-program details (section delimiters,
//! keyword syntax, indentation, mandatory sections) live in that program's
//! [`InputDialect`] implementation; this module owns the shared walk:
//! validate the tree, sort every level with the program's orderer, then
//! emit open marker, keywords, body, children and close marker.
//!
//! Rendering borrows the tree immutably. Sorting happens on slices of
//! references, so the same tree rendered for two programs (or twice for
//! one) is never reordered in place and always yields identical text for
//! identical input.

use crate::directive::{Directive, Keyword};
use crate::ordering::DirectiveOrderer;
use crate::program::Program;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Error type for input rendering.
///
/// A directive tree that violates the target program's grammar is rejected
/// before any text is produced; the error names the program and the missing
/// element so the caller can diagnose the job description.
#[derive(Error, Debug)]
pub enum WriteError {
    /// A directive required by the program's grammar is absent.
    #[error("{program}: required directive `{name}` is missing")]
    MissingDirective {
        /// Target program whose grammar was violated
        program: Program,
        /// Name of the missing directive
        name: String,
    },
    /// A keyword required by the program's grammar is absent.
    #[error("{program}: directive `{directive}` is missing required keyword `{keyword}`")]
    MissingKeyword {
        /// Target program whose grammar was violated
        program: Program,
        /// Directive that lacks the keyword
        directive: String,
        /// Name of the missing keyword
        keyword: String,
    },
    /// File system error while writing the rendered input
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-program input formatting rules.
///
/// One implementation per supported program. The dialect owns its orderer
/// and its delimiter table; the delimiters are part of the program's public
/// contract and must match the target program's own parser exactly.
pub trait InputDialect {
    /// The program this dialect renders for.
    fn program(&self) -> Program;

    /// The ordering rules applied at every level of the tree.
    fn orderer(&self) -> &dyn DirectiveOrderer;

    /// Indentation unit, repeated per nesting depth.
    fn indent_unit(&self) -> &'static str;

    /// True if the directive renders as a single line carrying its keyword
    /// values, with no close marker (e.g. NWChem `task dft energy`).
    fn renders_inline(&self, directive: &Directive) -> bool;

    /// True if the open marker consumes the directive's keywords (e.g. the
    /// ORCA `* xyz <charge> <mult>` line). Inline directives imply this.
    fn keywords_in_marker(&self, directive: &Directive) -> bool {
        self.renders_inline(directive)
    }

    /// The section open marker. `keywords` holds the directive's keywords
    /// already sorted by the dialect's orderer; dialects that keep keywords
    /// on their own lines ignore it.
    fn open_marker(&self, directive: &Directive, keywords: &[&Keyword]) -> String;

    /// The section close marker, if the directive has one.
    fn close_marker(&self, directive: &Directive) -> Option<String>;

    /// Renders one keyword line (without indentation).
    fn keyword_line(&self, keyword: &Keyword) -> String;

    /// Checks the tree against the program's mandatory elements.
    fn validate(&self, root: &Directive) -> Result<(), WriteError>;
}

/// Renders a directive tree as input text for the dialect's program.
///
/// The root directive is an anonymous container: its keywords become
/// top-level lines and its children become the top-level sections; the root
/// itself emits no markers.
pub fn render(root: &Directive, dialect: &dyn InputDialect) -> Result<String, WriteError> {
    dialect.validate(root)?;

    let mut out = String::new();
    for keyword in sorted_keywords(root, dialect.orderer()) {
        out.push_str(&dialect.keyword_line(keyword));
        out.push('\n');
    }
    for child in sorted_children(root, dialect.orderer()) {
        emit(child, dialect, 0, &mut out);
    }
    Ok(out)
}

/// Renders a tree and writes it to `path`.
pub fn write_input(
    root: &Directive,
    dialect: &dyn InputDialect,
    path: &Path,
) -> Result<(), WriteError> {
    let text = render(root, dialect)?;
    fs::write(path, text)?;
    Ok(())
}

fn sorted_keywords<'a>(
    directive: &'a Directive,
    orderer: &dyn DirectiveOrderer,
) -> Vec<&'a Keyword> {
    let mut keywords: Vec<&Keyword> = directive.keywords().iter().collect();
    keywords.sort_by(|a, b| orderer.compare_keywords(a, b));
    keywords
}

fn sorted_children<'a>(
    directive: &'a Directive,
    orderer: &dyn DirectiveOrderer,
) -> Vec<&'a Directive> {
    let mut children: Vec<&Directive> = directive.children().iter().collect();
    children.sort_by(|a, b| orderer.compare_directives(a, b));
    children
}

fn emit(directive: &Directive, dialect: &dyn InputDialect, depth: usize, out: &mut String) {
    let orderer = dialect.orderer();
    let keywords = sorted_keywords(directive, orderer);
    let outer = dialect.indent_unit().repeat(depth);
    let inner = dialect.indent_unit().repeat(depth + 1);

    if dialect.renders_inline(directive) {
        out.push_str(&outer);
        out.push_str(&dialect.open_marker(directive, &keywords));
        out.push('\n');
        return;
    }

    out.push_str(&outer);
    out.push_str(&dialect.open_marker(directive, &keywords));
    out.push('\n');

    if !dialect.keywords_in_marker(directive) {
        for keyword in &keywords {
            out.push_str(&inner);
            out.push_str(&dialect.keyword_line(keyword));
            out.push('\n');
        }
    }

    if let Some(body) = directive.body() {
        for line in body.lines() {
            out.push_str(&inner);
            out.push_str(line);
            out.push('\n');
        }
    }

    for child in sorted_children(directive, orderer) {
        emit(child, dialect, depth + 1, out);
    }

    if let Some(close) = dialect.close_marker(directive) {
        out.push_str(&outer);
        out.push_str(&close);
        out.push('\n');
    }
}
