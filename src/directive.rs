//! Directive model for program input files.
//!
//! Chemistry program inputs are built from nested, named blocks. A
//! [`Directive`] is one such block: it has a name, an ordered list of
//! [`Keyword`]s, an ordered list of child directives, and an optional
//! free-text body (used for verbatim sections such as Cartesian
//! coordinates).
//!
//! The tree stores keywords and children in insertion order. The order in
//! which they appear in a rendered input file is decided later, at
//! serialization time, by the target program's
//! [`DirectiveOrderer`](crate::ordering::DirectiveOrderer), so two callers
//! building the same tree in different orders produce identical input text.
//!
//! Trees are owned by the job that builds them; the writer borrows them
//! immutably, so a tree handed to the writer can never be reordered or
//! mutated by rendering.
//!
//! # Examples
//!
//! ```
//! use qcbridge::directive::{Directive, Keyword};
//!
//! let mut task = Directive::new("task");
//! task.add_keyword(Keyword::new("operation", "energy"));
//! task.add_keyword(Keyword::new("theory", "dft"));
//!
//! let mut root = Directive::new("input");
//! root.add_child(task);
//! assert!(root.child("TASK").is_some());
//! ```

use serde::{Deserialize, Serialize};

/// A name plus one or more values, nested inside a directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    name: String,
    values: Vec<String>,
}

impl Keyword {
    /// Creates a keyword with a single value.
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            values: vec![value.to_string()],
        }
    }

    /// Creates a keyword with multiple values.
    pub fn with_values(name: &str, values: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// The keyword name as given at construction time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All values, in insertion order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// The first value, if any.
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(|v| v.as_str())
    }

    /// Appends another value.
    pub fn add_value(&mut self, value: &str) {
        self.values.push(value.to_string());
    }
}

/// A named, recursively nestable block of an input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    name: String,
    keywords: Vec<Keyword>,
    children: Vec<Directive>,
    body: Option<String>,
}

impl Directive {
    /// Creates an empty directive with the given name.
    ///
    /// Name case is preserved; whether it matters downstream is decided by
    /// the target program's adapter.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            keywords: Vec::new(),
            children: Vec::new(),
            body: None,
        }
    }

    /// The directive name as given at construction time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a keyword. Insertion order is preserved in storage.
    pub fn add_keyword(&mut self, keyword: Keyword) {
        self.keywords.push(keyword);
    }

    /// Appends a child directive. Insertion order is preserved in storage.
    pub fn add_child(&mut self, child: Directive) {
        self.children.push(child);
    }

    /// Looks up a keyword by name, case-insensitively. First match wins.
    pub fn keyword(&self, name: &str) -> Option<&Keyword> {
        self.keywords
            .iter()
            .find(|k| k.name.eq_ignore_ascii_case(name))
    }

    /// Looks up a child directive by name, case-insensitively. First match
    /// wins.
    pub fn child(&self, name: &str) -> Option<&Directive> {
        self.children
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// All keywords in insertion order.
    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    /// All child directives in insertion order.
    pub fn children(&self) -> &[Directive] {
        &self.children
    }

    /// The free-text body, if set.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Sets the free-text body (verbatim lines, e.g. coordinates).
    pub fn set_body(&mut self, body: &str) {
        self.body = Some(body.to_string());
    }

    /// True if the directive has no keywords, children or body.
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.children.is_empty() && self.body.is_none()
    }
}
