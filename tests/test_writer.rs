use qcbridge::directive::{Directive, Keyword};
use qcbridge::factory::dialect_for;
use qcbridge::program::Program;
use qcbridge::template::starter_input;
use qcbridge::writer::{render, WriteError};

/// Builds the NWChem water job with children and keywords inserted in a
/// deliberately scrambled order.
fn scrambled_nwchem_job() -> Directive {
    let mut root = Directive::new("input");

    let mut basis = Directive::new("basis");
    basis.add_keyword(Keyword::with_values("*", &["library", "6-31g*"]));
    root.add_child(basis);

    let mut start = Directive::new("start");
    start.add_keyword(Keyword::new("name", "water"));
    root.add_child(start);

    let mut task = Directive::new("task");
    task.add_keyword(Keyword::new("operation", "energy"));
    task.add_keyword(Keyword::new("theory", "dft"));
    root.add_child(task);

    let mut geometry = Directive::new("geometry");
    geometry.set_body("O 0.0 0.0 0.2214");
    root.add_child(geometry);

    root
}

/// The same job with everything inserted in rendering order.
fn ordered_nwchem_job() -> Directive {
    let mut root = Directive::new("input");

    let mut task = Directive::new("task");
    task.add_keyword(Keyword::new("theory", "dft"));
    task.add_keyword(Keyword::new("operation", "energy"));
    root.add_child(task);

    let mut basis = Directive::new("basis");
    basis.add_keyword(Keyword::with_values("*", &["library", "6-31g*"]));
    root.add_child(basis);

    let mut geometry = Directive::new("geometry");
    geometry.set_body("O 0.0 0.0 0.2214");
    root.add_child(geometry);

    let mut start = Directive::new("start");
    start.add_keyword(Keyword::new("name", "water"));
    root.add_child(start);

    root
}

#[test]
fn test_rendering_is_deterministic() {
    for program in Program::ALL {
        let dialect = dialect_for(program);
        let tree = starter_input(program);
        let first = render(&tree, dialect.as_ref()).unwrap();
        let second = render(&tree, dialect.as_ref()).unwrap();
        assert_eq!(first, second, "{} rendering must be deterministic", program);
    }
}

#[test]
fn test_ordering_is_independent_of_insertion_order() {
    let dialect = dialect_for(Program::Nwchem);
    let scrambled = render(&scrambled_nwchem_job(), dialect.as_ref()).unwrap();
    let ordered = render(&ordered_nwchem_job(), dialect.as_ref()).unwrap();
    assert_eq!(scrambled, ordered);
}

#[test]
fn test_task_renders_theory_before_operation() {
    // operation inserted before theory; the rendered line must still read
    // "task dft energy".
    let mut task = Directive::new("task");
    task.add_keyword(Keyword::new("operation", "energy"));
    task.add_keyword(Keyword::new("theory", "dft"));
    let mut root = Directive::new("input");
    root.add_child(task);

    let dialect = dialect_for(Program::Nwchem);
    let text = render(&root, dialect.as_ref()).unwrap();
    assert!(text.starts_with("task dft energy\n"), "got: {}", text);
}

#[test]
fn test_start_is_pinned_last_regardless_of_other_names() {
    let mut root = Directive::new("input");
    let mut task = Directive::new("task");
    task.add_keyword(Keyword::new("theory", "scf"));
    root.add_child(task);
    let mut start = Directive::new("start");
    start.add_keyword(Keyword::new("name", "job"));
    root.add_child(start);
    // "zmatrix" sorts after "start" alphabetically, but "start" stays last.
    let mut zmatrix = Directive::new("zmatrix");
    zmatrix.set_body("O");
    root.add_child(zmatrix);

    let dialect = dialect_for(Program::Nwchem);
    let text = render(&root, dialect.as_ref()).unwrap();
    let last = text.lines().last().unwrap();
    assert_eq!(last, "start job");
}

#[test]
fn test_missing_mandatory_section_is_rejected_per_program() {
    let empty = Directive::new("input");
    for program in [Program::Nwchem, Program::Orca, Program::QmMm, Program::Spartan] {
        let dialect = dialect_for(program);
        let err = render(&empty, dialect.as_ref()).unwrap_err();
        assert!(
            matches!(
                err,
                WriteError::MissingDirective { .. } | WriteError::MissingKeyword { .. }
            ),
            "{} accepted an empty job",
            program
        );
    }
}
