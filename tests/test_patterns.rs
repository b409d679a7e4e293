use qcbridge::error_patterns::ErrorPatternLibrary;
use qcbridge::settings::Settings;
use qcbridge::task::{run_capability, TaskStatus};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

fn pattern_tree(name: &str) -> PathBuf {
    let root = env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&root);
    fs::create_dir_all(root.join("nwchem")).unwrap();

    // File names carry ordering prefixes; the tree layout does not matter.
    fs::write(
        root.join("nwchem").join("010_scf.err"),
        "name: scf-no-convergence\ntrigger: Calculation failed to converge\ncategory: convergence\n",
    )
    .unwrap();
    fs::write(
        root.join("030_disk.err"),
        "name: disk-full\ntrigger: No space left on device\ncategory: resources\n",
    )
    .unwrap();
    fs::write(
        root.join("020_memory.err"),
        "name: out-of-memory\nregex: insufficient memory\ncategory: resources\nremedy:$START\nRaise the memory directive.\n$END\n",
    )
    .unwrap();
    root
}

#[test]
fn test_loading_sorts_by_file_name_ascending() {
    let root = pattern_tree("qcbridge_it_pattern_sort");
    let library = ErrorPatternLibrary::load(&root).unwrap();
    fs::remove_dir_all(&root).unwrap();

    let names: Vec<&str> = library.patterns().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["scf-no-convergence", "out-of-memory", "disk-full"]);
}

#[test]
fn test_cooccurring_failures_all_match_in_order() {
    let root = pattern_tree("qcbridge_it_pattern_multi");
    let library = ErrorPatternLibrary::load(&root).unwrap();
    fs::remove_dir_all(&root).unwrap();

    let output = "\
step 12: Calculation failed to converge
attempting restart
write failed: No space left on device
";
    let matched = library.diagnose(output);
    let names: Vec<&str> = matched.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["scf-no-convergence", "disk-full"]);
}

#[test]
fn test_malformed_file_is_skipped_not_fatal() {
    let root = pattern_tree("qcbridge_it_pattern_malformed");
    fs::write(root.join("005_broken.err"), "this is not a pattern file\n").unwrap();
    fs::write(root.join("015_noend.err"), "name: x\ntrigger: y\nremedy:$START\n").unwrap();

    let library = ErrorPatternLibrary::load(&root).unwrap();
    fs::remove_dir_all(&root).unwrap();
    // The two malformed files are dropped, the three good ones survive.
    assert_eq!(library.patterns().len(), 3);
}

#[test]
fn test_diagnose_capability_reports_known_failures() {
    let root = pattern_tree("qcbridge_it_pattern_task");
    let artifact = env::temp_dir().join("qcbridge_it_failed.out");
    fs::write(
        &artifact,
        "SCF module entered\nCalculation failed to converge\nallocation: insufficient memory\n",
    )
    .unwrap();

    let mut params = HashMap::new();
    params.insert("artifact".to_string(), artifact.display().to_string());
    params.insert("patterns".to_string(), root.display().to_string());
    let outcome = run_capability("diagnose", &params, &Settings::default()).unwrap();

    fs::remove_file(&artifact).unwrap();
    fs::remove_dir_all(&root).unwrap();

    assert_eq!(outcome.status, TaskStatus::Completed);
    assert_eq!(outcome.outputs["matched"], "2");
    assert_eq!(outcome.outputs["match_0"], "scf-no-convergence");
    assert_eq!(outcome.outputs["match_1"], "out-of-memory");
}

#[test]
fn test_unclassified_failure_reports_no_matches() {
    let root = pattern_tree("qcbridge_it_pattern_none");
    let artifact = env::temp_dir().join("qcbridge_it_quiet.out");
    fs::write(&artifact, "nothing recognizable here\n").unwrap();

    let mut params = HashMap::new();
    params.insert("artifact".to_string(), artifact.display().to_string());
    params.insert("patterns".to_string(), root.display().to_string());
    let outcome = run_capability("diagnose", &params, &Settings::default()).unwrap();

    fs::remove_file(&artifact).unwrap();
    fs::remove_dir_all(&root).unwrap();

    assert_eq!(outcome.status, TaskStatus::Failed);
    assert_eq!(outcome.outputs["matched"], "0");
}
