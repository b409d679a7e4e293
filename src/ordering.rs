//! Per-program ordering rules for directives and keywords.
//!
//! Each chemistry program's input grammar mandates where certain sections
//! and keywords must appear. A [`DirectiveOrderer`] is a three-way
//! comparator encoding those rules for one program family; the input writer
//! sorts every level of a directive tree with it before rendering.
//!
//! All orderers share the same shape: elements matching a fixed-position
//! rule sort to their mandated end regardless of name, and everything else
//! (including ties between two fixed-position elements of the same rank)
//! falls back to case-insensitive lexicographic name comparison. The result
//! is a total order, so sorting is stable and idempotent.
//!
//! Whether an orderer recognizes its special names case-sensitively differs
//! between programs and is a per-adapter flag rather than a global
//! convention; every orderer here documents and defaults its own flag.

use crate::directive::{Directive, Keyword};
use std::cmp::Ordering;

/// Three-way comparator over sibling directives and keywords of one
/// program family.
pub trait DirectiveOrderer {
    /// Compares two sibling directives for rendering order.
    fn compare_directives(&self, a: &Directive, b: &Directive) -> Ordering;

    /// Compares two keywords within the same directive.
    fn compare_keywords(&self, a: &Keyword, b: &Keyword) -> Ordering;

    /// Whether this orderer matches its special names case-sensitively.
    fn case_sensitive(&self) -> bool {
        false
    }
}

/// Case-insensitive lexicographic name comparison, the shared tie-breaker.
///
/// Names differing only in case compare equal on the primary key; the raw
/// byte comparison then keeps the order total and stable.
pub fn name_order(a: &str, b: &str) -> Ordering {
    let folded = a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase());
    if folded != Ordering::Equal {
        folded
    } else {
        a.cmp(b)
    }
}

fn matches_special(name: &str, special: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        name == special
    } else {
        name.eq_ignore_ascii_case(special)
    }
}

fn rank_in(name: &str, table: &[(&str, i32)], case_sensitive: bool, default: i32) -> i32 {
    for (special, rank) in table {
        if matches_special(name, special, case_sensitive) {
            return *rank;
        }
    }
    default
}

fn ranked(rank_a: i32, rank_b: i32, name_a: &str, name_b: &str) -> Ordering {
    rank_a.cmp(&rank_b).then_with(|| name_order(name_a, name_b))
}

/// NWChem ordering rules.
///
/// The `task` directive renders first. Startup-only directives (`restart`,
/// `scratch_dir`, `permanent_dir`, `memory`, `echo`) render after the
/// normal directives, and the literal `start` command is pinned last.
/// Within a directive, the `theory` keyword precedes `operation`, and both
/// precede the alphabetic remainder. NWChem keywords are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct NwchemOrderer {
    /// Match special names case-sensitively (NWChem grammar default: no).
    pub case_sensitive: bool,
}

const NWCHEM_DIRECTIVES: &[(&str, i32)] = &[
    ("task", 0),
    ("restart", 2),
    ("scratch_dir", 2),
    ("permanent_dir", 2),
    ("memory", 2),
    ("echo", 2),
    ("start", 3),
];

const NWCHEM_KEYWORDS: &[(&str, i32)] = &[("theory", 0), ("operation", 1)];

impl DirectiveOrderer for NwchemOrderer {
    fn compare_directives(&self, a: &Directive, b: &Directive) -> Ordering {
        let ra = rank_in(a.name(), NWCHEM_DIRECTIVES, self.case_sensitive, 1);
        let rb = rank_in(b.name(), NWCHEM_DIRECTIVES, self.case_sensitive, 1);
        ranked(ra, rb, a.name(), b.name())
    }

    fn compare_keywords(&self, a: &Keyword, b: &Keyword) -> Ordering {
        let ra = rank_in(a.name(), NWCHEM_KEYWORDS, self.case_sensitive, 2);
        let rb = rank_in(b.name(), NWCHEM_KEYWORDS, self.case_sensitive, 2);
        ranked(ra, rb, a.name(), b.name())
    }

    fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

/// QM/MM driver ordering rules: `topology` first, `hessian` last,
/// remainder alphabetic. Section names in this grammar are uppercase
/// literals, so matching defaults to case-sensitive.
#[derive(Debug, Clone)]
pub struct QmmmOrderer {
    /// Match special names case-sensitively (driver grammar default: yes).
    pub case_sensitive: bool,
}

impl Default for QmmmOrderer {
    fn default() -> Self {
        Self {
            case_sensitive: true,
        }
    }
}

const QMMM_DIRECTIVES: &[(&str, i32)] = &[("topology", 0), ("hessian", 2)];

impl DirectiveOrderer for QmmmOrderer {
    fn compare_directives(&self, a: &Directive, b: &Directive) -> Ordering {
        let ra = rank_in(a.name(), QMMM_DIRECTIVES, self.case_sensitive, 1);
        let rb = rank_in(b.name(), QMMM_DIRECTIVES, self.case_sensitive, 1);
        ranked(ra, rb, a.name(), b.name())
    }

    fn compare_keywords(&self, a: &Keyword, b: &Keyword) -> Ordering {
        name_order(a.name(), b.name())
    }

    fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

/// Spartan ordering rules: the `keywords` line first, then
/// `cell_definitions`, remainder alphabetic. Spartan section markers are
/// literal uppercase tokens, so matching defaults to case-sensitive.
#[derive(Debug, Clone)]
pub struct SpartanOrderer {
    /// Match special names case-sensitively (Spartan default: yes).
    pub case_sensitive: bool,
}

impl Default for SpartanOrderer {
    fn default() -> Self {
        Self {
            case_sensitive: true,
        }
    }
}

const SPARTAN_DIRECTIVES: &[(&str, i32)] = &[("keywords", 0), ("cell_definitions", 1)];

impl DirectiveOrderer for SpartanOrderer {
    fn compare_directives(&self, a: &Directive, b: &Directive) -> Ordering {
        let ra = rank_in(a.name(), SPARTAN_DIRECTIVES, self.case_sensitive, 2);
        let rb = rank_in(b.name(), SPARTAN_DIRECTIVES, self.case_sensitive, 2);
        ranked(ra, rb, a.name(), b.name())
    }

    fn compare_keywords(&self, a: &Keyword, b: &Keyword) -> Ordering {
        name_order(a.name(), b.name())
    }

    fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

/// ORCA ordering rules: the simple-input `keywords` line first, the `xyz`
/// coordinate block last, `%`-blocks alphabetic in between. Within the
/// coordinate block, `charge` precedes `mult`.
#[derive(Debug, Clone, Default)]
pub struct OrcaOrderer {
    /// Match special names case-sensitively (ORCA grammar default: no).
    pub case_sensitive: bool,
}

const ORCA_DIRECTIVES: &[(&str, i32)] = &[("xyz", 2)];

const ORCA_KEYWORDS: &[(&str, i32)] = &[("keywords", 0), ("charge", 1), ("mult", 2)];

impl DirectiveOrderer for OrcaOrderer {
    fn compare_directives(&self, a: &Directive, b: &Directive) -> Ordering {
        let ra = rank_in(a.name(), ORCA_DIRECTIVES, self.case_sensitive, 1);
        let rb = rank_in(b.name(), ORCA_DIRECTIVES, self.case_sensitive, 1);
        ranked(ra, rb, a.name(), b.name())
    }

    fn compare_keywords(&self, a: &Keyword, b: &Keyword) -> Ordering {
        let ra = rank_in(a.name(), ORCA_KEYWORDS, self.case_sensitive, 3);
        let rb = rank_in(b.name(), ORCA_KEYWORDS, self.case_sensitive, 3);
        ranked(ra, rb, a.name(), b.name())
    }

    fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

/// xtb ordering rules: `chrg` then `spin` first, remaining `$`-groups
/// alphabetic.
#[derive(Debug, Clone, Default)]
pub struct XtbOrderer {
    /// Match special names case-sensitively (xtb grammar default: no).
    pub case_sensitive: bool,
}

const XTB_DIRECTIVES: &[(&str, i32)] = &[("chrg", 0), ("spin", 1)];

impl DirectiveOrderer for XtbOrderer {
    fn compare_directives(&self, a: &Directive, b: &Directive) -> Ordering {
        let ra = rank_in(a.name(), XTB_DIRECTIVES, self.case_sensitive, 2);
        let rb = rank_in(b.name(), XTB_DIRECTIVES, self.case_sensitive, 2);
        ranked(ra, rb, a.name(), b.name())
    }

    fn compare_keywords(&self, a: &Keyword, b: &Keyword) -> Ordering {
        name_order(a.name(), b.name())
    }

    fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

/// Pure lexicographic ordering for generic tools with no fixed positions.
#[derive(Debug, Clone, Default)]
pub struct LexicalOrderer;

impl DirectiveOrderer for LexicalOrderer {
    fn compare_directives(&self, a: &Directive, b: &Directive) -> Ordering {
        name_order(a.name(), b.name())
    }

    fn compare_keywords(&self, a: &Keyword, b: &Keyword) -> Ordering {
        name_order(a.name(), b.name())
    }
}
