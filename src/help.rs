//! Built-in help text for the command line and the task surface.

/// General usage text.
pub fn general_help() -> &'static str {
    "\
qcbridge - input generation, output analysis and failure diagnosis
for quantum chemistry programs

USAGE:
  qcbridge analyze <artifact> [--json]
  qcbridge diagnose <artifact> [pattern_root]
  qcbridge template <program> [output_file]
  qcbridge help [topic]

ARTIFACTS:
  An artifact is a single output/log file or, for Spartan, the job
  directory bundle. The producing program is detected from content,
  never from the file name.

TOPICS:
  programs       supported programs and their artifact shapes
  patterns       error-pattern file format
  capabilities   the named capabilities behind each command
"
}

/// Help on the supported programs.
pub fn programs_help() -> &'static str {
    "\
SUPPORTED PROGRAMS

  nwchem    NWChem log files. Inputs are lowercase `name ... end`
            blocks; `task` renders first, `start` last.
  orca      ORCA log files. Inputs open with the `!` keyword line and
            close with the `* xyz <charge> <mult> ... *` block.
  xtb       xtb log files. Inputs are xcontrol `$`-groups.
  qmmm      QM/MM coupling driver logs. Inputs are uppercase sections
            closed by END<NAME>; the Hessian block closes with ENDHESS.
  spartan   Directory bundles with well-known files: input, output,
            status (COMPLETED on success), archive and cell.
"
}

/// Help on the error-pattern file format.
pub fn patterns_help() -> &'static str {
    "\
ERROR PATTERN FILES

  Pattern files end in `.err` and live anywhere below the pattern root
  (settings key [patterns] root, or the diagnose command argument).
  Files are loaded sorted by file name, so prefixes like 010_, 020_
  control diagnosis order.

  Format: `key: value` lines, `#` comments, and multi-line values
  between $START and $END.

    name: scf-no-convergence        (required)
    program: nwchem                 (optional, restricts matching)
    trigger: literal substring      (this or `regex`, exactly one)
    regex: ^\\s*segmentation fault
    category: convergence
    remedy:$START
    Raise the iteration limit.
    $END

  A malformed file is skipped with a warning; it never aborts a batch.
"
}

/// Help on the named capabilities of the task surface.
pub fn capabilities_help() -> &'static str {
    "\
CAPABILITIES

  analyze    params: artifact
             Detects the producing program and returns termination
             status and extracted properties.
  diagnose   params: artifact, patterns (optional root directory)
             Matches the artifact's text against the error-pattern
             library and returns every known failure that fires.
  template   params: program
             Returns a starter input file for the program.
"
}

/// Help text for one named capability, if it exists.
pub fn capability_help(name: &str) -> Option<&'static str> {
    match name {
        "analyze" => Some(
            "analyze: fingerprint an output artifact and extract termination \
             status, energies and geometry blocks.\nparams: artifact=<path>",
        ),
        "diagnose" => Some(
            "diagnose: match an output artifact against the known-failure \
             pattern library.\nparams: artifact=<path> patterns=<root>",
        ),
        "template" => Some("template: render a starter input file.\nparams: program=<name>"),
        _ => None,
    }
}

/// Help text for a named topic, if it exists.
pub fn topic_help(topic: &str) -> Option<&'static str> {
    match topic {
        "programs" => Some(programs_help()),
        "patterns" => Some(patterns_help()),
        "capabilities" => Some(capabilities_help()),
        _ => capability_help(topic),
    }
}
