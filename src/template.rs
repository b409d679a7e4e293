//! Starter input templates for each supported program.
//!
//! Builds a canonical directive tree per program and renders it through the
//! program's own dialect, so the emitted skeleton always satisfies the
//! dialect's mandatory-element checks.

use crate::directive::{Directive, Keyword};
use crate::factory::dialect_for;
use crate::program::Program;
use crate::writer::{render, WriteError};

const WATER: &str = "O 0.00000000 0.00000000 0.22143053\n\
H 0.00000000 0.76323596 -0.44286106\n\
H 0.00000000 -0.76323596 -0.44286106";

/// Builds the canonical starter tree for `program`.
pub fn starter_input(program: Program) -> Directive {
    match program {
        Program::Nwchem => nwchem_starter(),
        Program::Spartan => spartan_starter(),
        Program::Orca => orca_starter(),
        Program::Xtb => xtb_starter(),
        Program::QmMm => qmmm_starter(),
    }
}

/// Renders the starter tree for `program` as input text.
pub fn render_starter(program: Program) -> Result<String, WriteError> {
    render(&starter_input(program), dialect_for(program).as_ref())
}

fn nwchem_starter() -> Directive {
    let mut root = Directive::new("input");

    let mut start = Directive::new("start");
    start.add_keyword(Keyword::new("name", "job"));
    root.add_child(start);

    let mut charge = Directive::new("charge");
    charge.add_keyword(Keyword::new("value", "0"));
    root.add_child(charge);

    let mut geometry = Directive::new("geometry");
    geometry.add_keyword(Keyword::new("units", "angstroms"));
    geometry.set_body(WATER);
    root.add_child(geometry);

    let mut basis = Directive::new("basis");
    basis.add_keyword(Keyword::with_values("*", &["library", "6-31g*"]));
    root.add_child(basis);

    let mut task = Directive::new("task");
    task.add_keyword(Keyword::new("theory", "dft"));
    task.add_keyword(Keyword::new("operation", "energy"));
    root.add_child(task);

    root
}

fn spartan_starter() -> Directive {
    let mut root = Directive::new("job");

    let mut keywords = Directive::new("keywords");
    keywords.add_keyword(Keyword::with_values("line", &["B3LYP", "6-31G*", "OPT"]));
    root.add_child(keywords);

    let mut molecule = Directive::new("molecule");
    molecule.set_body(WATER);
    root.add_child(molecule);

    root
}

fn orca_starter() -> Directive {
    let mut root = Directive::new("input");
    root.add_keyword(Keyword::with_values("keywords", &["B3LYP", "def2-SVP"]));

    let mut scf = Directive::new("scf");
    scf.add_keyword(Keyword::new("maxiter", "200"));
    root.add_child(scf);

    let mut xyz = Directive::new("xyz");
    xyz.add_keyword(Keyword::new("charge", "0"));
    xyz.add_keyword(Keyword::new("mult", "1"));
    xyz.set_body(WATER);
    root.add_child(xyz);

    root
}

fn xtb_starter() -> Directive {
    let mut root = Directive::new("xcontrol");

    let mut chrg = Directive::new("chrg");
    chrg.add_keyword(Keyword::new("value", "0"));
    root.add_child(chrg);

    let mut spin = Directive::new("spin");
    spin.add_keyword(Keyword::new("value", "0"));
    root.add_child(spin);

    let mut scc = Directive::new("scc");
    scc.add_keyword(Keyword::new("temp", "300.0"));
    root.add_child(scc);

    root
}

fn qmmm_starter() -> Directive {
    let mut root = Directive::new("job");

    let mut topology = Directive::new("topology");
    topology.set_body("O 1 qm\nH 2 qm\nH 3 qm");
    root.add_child(topology);

    let mut coupling = Directive::new("coupling");
    coupling.add_keyword(Keyword::new("scheme", "electrostatic"));
    root.add_child(coupling);

    root
}
