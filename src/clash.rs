//! Van-der-Waals clash detection over labeled atom sites.
//!
//! The molecule model itself lives in the caller's chemistry toolkit; this
//! module only needs labeled positions. Two sites clash when their
//! van-der-Waals radii overlap more than an allowance permits:
//!
//! ```text
//! overlap = vdw_sum - distance - allowance
//! ```
//!
//! A positive overlap signals a clash. Allowances are rules keyed by two
//! atom-type patterns (`*` wildcard, `,`-separated alternatives) matched
//! against the pair in either order; the first matching rule wins, and a
//! caller-supplied default applies when none matches.

use lazy_static::lazy_static;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

lazy_static! {
    /// Bondi van-der-Waals radii in Angstrom for common elements.
    static ref VDW_RADII: HashMap<&'static str, f64> = {
        let mut radii = HashMap::new();
        radii.insert("H", 1.20);
        radii.insert("C", 1.70);
        radii.insert("N", 1.55);
        radii.insert("O", 1.52);
        radii.insert("F", 1.47);
        radii.insert("Na", 2.27);
        radii.insert("Mg", 1.73);
        radii.insert("Si", 2.10);
        radii.insert("P", 1.80);
        radii.insert("S", 1.80);
        radii.insert("Cl", 1.75);
        radii.insert("K", 2.75);
        radii.insert("Br", 1.85);
        radii.insert("I", 1.98);
        radii
    };
}

/// Fallback radius for elements missing from the table.
const DEFAULT_VDW_RADIUS: f64 = 1.70;

/// Looks up the van-der-Waals radius for an element symbol.
pub fn vdw_radius(element: &str) -> Option<f64> {
    VDW_RADII.get(element).copied()
}

/// One labeled atom position, as supplied by the caller's molecule model.
#[derive(Debug, Clone)]
pub struct AtomSite {
    /// Display label (e.g. "O12")
    pub label: String,
    /// Atom type, element symbol optionally refined by a hybridization
    /// suffix (e.g. "C.3", "N.ar")
    pub atom_type: String,
    /// Cartesian position in Angstrom
    pub position: Point3<f64>,
}

impl AtomSite {
    /// Creates a site from label, type and coordinates.
    pub fn new(label: &str, atom_type: &str, x: f64, y: f64, z: f64) -> Self {
        Self {
            label: label.to_string(),
            atom_type: atom_type.to_string(),
            position: Point3::new(x, y, z),
        }
    }

    /// The element part of the atom type (up to the first `.`).
    pub fn element(&self) -> &str {
        self.atom_type
            .split('.')
            .next()
            .unwrap_or(&self.atom_type)
    }
}

/// A pattern over atom types: `,`-separated alternatives, `*` wildcard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypePattern {
    alternatives: Vec<String>,
}

impl TypePattern {
    /// Parses a pattern string like `"C.3,C.2"` or `"*"`.
    pub fn new(pattern: &str) -> Self {
        Self {
            alternatives: pattern.split(',').map(|p| p.trim().to_string()).collect(),
        }
    }

    /// True if any alternative matches the atom type. Matching is
    /// case-sensitive because atom-type labels are.
    pub fn matches(&self, atom_type: &str) -> bool {
        self.alternatives
            .iter()
            .any(|alt| alt == "*" || alt == atom_type)
    }
}

/// An allowance rule keyed by two atom-type patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VDWAllowance {
    pattern_a: TypePattern,
    pattern_b: TypePattern,
    /// Distance in Angstrom subtracted from the overlap for matching pairs
    pub allowance: f64,
}

impl VDWAllowance {
    /// Creates an allowance rule from two pattern strings.
    pub fn new(pattern_a: &str, pattern_b: &str, allowance: f64) -> Self {
        Self {
            pattern_a: TypePattern::new(pattern_a),
            pattern_b: TypePattern::new(pattern_b),
            allowance,
        }
    }

    /// True if the rule applies to the pair, in either order.
    pub fn matches(&self, type_a: &str, type_b: &str) -> bool {
        (self.pattern_a.matches(type_a) && self.pattern_b.matches(type_b))
            || (self.pattern_a.matches(type_b) && self.pattern_b.matches(type_a))
    }
}

/// One detected contact, constructed at detection time and immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomClash {
    /// Label of the first atom
    pub first: String,
    /// Label of the second atom
    pub second: String,
    /// Interatomic distance in Angstrom
    pub distance: f64,
    /// Sum of the pair's van-der-Waals radii
    pub vdw_sum: f64,
    /// Allowance applied to the pair
    pub allowance: f64,
}

impl AtomClash {
    /// How far the van-der-Waals spheres interpenetrate beyond the
    /// allowance. Positive values signal a clash.
    pub fn overlap(&self) -> f64 {
        self.vdw_sum - self.distance - self.allowance
    }
}

/// Scans all unordered site pairs and reports those with positive overlap.
///
/// For each pair, the first matching allowance rule applies;
/// `default_allowance` is used when no rule matches.
pub fn find_clashes(
    sites: &[AtomSite],
    allowances: &[VDWAllowance],
    default_allowance: f64,
) -> Vec<AtomClash> {
    let mut clashes = Vec::new();
    for (i, a) in sites.iter().enumerate() {
        for b in &sites[i + 1..] {
            let distance = nalgebra::distance(&a.position, &b.position);
            let vdw_sum = vdw_radius(a.element()).unwrap_or(DEFAULT_VDW_RADIUS)
                + vdw_radius(b.element()).unwrap_or(DEFAULT_VDW_RADIUS);
            let allowance = allowances
                .iter()
                .find(|rule| rule.matches(&a.atom_type, &b.atom_type))
                .map(|rule| rule.allowance)
                .unwrap_or(default_allowance);
            let clash = AtomClash {
                first: a.label.clone(),
                second: b.label.clone(),
                distance,
                vdw_sum,
                allowance,
            };
            if clash.overlap() > 0.0 {
                clashes.push(clash);
            }
        }
    }
    clashes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_formula() {
        let clash = AtomClash {
            first: "O1".to_string(),
            second: "H2".to_string(),
            distance: 2.0,
            vdw_sum: 3.4,
            allowance: 0.5,
        };
        assert!((clash.overlap() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_allowance_matches_unordered() {
        let rule = VDWAllowance::new("O.3", "H", 0.4);
        assert!(rule.matches("O.3", "H"));
        assert!(rule.matches("H", "O.3"));
        assert!(!rule.matches("H", "H"));
    }

    #[test]
    fn test_wildcard_and_alternatives() {
        let rule = VDWAllowance::new("C.2,C.3", "*", 0.2);
        assert!(rule.matches("C.3", "N.ar"));
        assert!(rule.matches("H", "C.2"));
        assert!(!rule.matches("N.ar", "O.3"));
    }

    #[test]
    fn test_find_clashes_applies_first_matching_rule() {
        // O and H at 2.0 A: vdw_sum = 1.52 + 1.20 = 2.72.
        let sites = vec![
            AtomSite::new("O1", "O.3", 0.0, 0.0, 0.0),
            AtomSite::new("H2", "H", 2.0, 0.0, 0.0),
        ];
        // Generous allowance suppresses the clash.
        let forgiving = [VDWAllowance::new("O.3", "H", 1.0)];
        assert!(find_clashes(&sites, &forgiving, 0.0).is_empty());
        // Without it, the pair overlaps by 0.72.
        let clashes = find_clashes(&sites, &[], 0.0);
        assert_eq!(clashes.len(), 1);
        assert!((clashes[0].overlap() - 0.72).abs() < 1e-9);
    }
}
