//! qcbridge command-line interface.
//!
//! Commands:
//!
//! - `qcbridge analyze <artifact> [--json]` - detect the producing program
//!   and print termination status and extracted properties
//! - `qcbridge diagnose <artifact> [pattern_root]` - classify a failed run
//!   against the error-pattern library
//! - `qcbridge template <program> [output_file]` - emit a starter input
//! - `qcbridge help [topic]` - built-in documentation

use qcbridge::analyzer::Termination;
use qcbridge::error_patterns::ErrorPatternLibrary;
use qcbridge::factory;
use qcbridge::help;
use qcbridge::program::Program;
use qcbridge::settings::Settings;
use qcbridge::template;
use std::env;
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Stdout)
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print!("{}", help::general_help());
        process::exit(1);
    }

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            process::exit(1);
        }
    };

    let exit = match args[1].as_str() {
        "analyze" => run_analyze(&args[2..]),
        "diagnose" => run_diagnose(&args[2..], &settings),
        "template" => run_template(&args[2..]),
        "help" | "--help" | "-h" => run_help(&args[2..]),
        other => {
            eprintln!("Error: unknown command `{}`", other);
            print!("{}", help::general_help());
            1
        }
    };
    process::exit(exit);
}

fn run_analyze(args: &[String]) -> i32 {
    let mut json = false;
    let mut artifact = None;
    for arg in args {
        if arg == "--json" {
            json = true;
        } else {
            artifact = Some(arg.as_str());
        }
    }
    let artifact = match artifact {
        Some(path) => Path::new(path),
        None => {
            eprintln!("Usage: qcbridge analyze <artifact> [--json]");
            return 1;
        }
    };

    let analyzer = match factory::analyzer_for(artifact) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let analysis = match analyzer.parse(artifact) {
        Ok(analysis) => analysis,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if json {
        match serde_json::to_string_pretty(&analysis) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
        return 0;
    }

    println!("program:     {}", analysis.program);
    println!("termination: {:?}", analysis.termination);
    for property in analysis.scalars() {
        match &property.tag {
            Some(tag) => println!("{:24} {:>20.10}   [{}]", property.name, property.value, tag),
            None => println!("{:24} {:>20.10}", property.name, property.value),
        }
    }
    for property in analysis.all_series() {
        println!("{:24} {:>20.10}", property.name, property.value);
    }
    for block in &analysis.blocks {
        println!(
            "block `{}`: {} lines (from line {})",
            block.label,
            block.lines.len(),
            block.start_line
        );
    }
    for note in &analysis.notes {
        println!("note (line {}): {}", note.line, note.message);
    }
    if analysis.termination == Termination::Normal {
        0
    } else {
        2
    }
}

fn run_diagnose(args: &[String], settings: &Settings) -> i32 {
    let artifact = match args.first() {
        Some(path) => Path::new(path),
        None => {
            eprintln!("Usage: qcbridge diagnose <artifact> [pattern_root]");
            return 1;
        }
    };
    let root = args
        .get(1)
        .map(|r| Path::new(r).to_path_buf())
        .or_else(|| settings.pattern_root.clone());
    let root = match root {
        Some(root) => root,
        None => {
            eprintln!(
                "Error: no pattern root given and none configured under [patterns] in {}",
                qcbridge::settings::LOCAL_CONFIG
            );
            return 1;
        }
    };

    let library = match ErrorPatternLibrary::load(&root) {
        Ok(library) => library,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let text = match read_artifact_text(artifact) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    // Restrict to the producing program's patterns when it can be detected.
    let matched = match factory::analyzer_for(artifact) {
        Ok(analyzer) => {
            println!("program: {}", analyzer.program());
            library.diagnose_for(analyzer.program(), &text)
        }
        Err(_) => library.diagnose(&text),
    };

    // Known failures are reported before falling back to "unclassified".
    if matched.is_empty() {
        println!("no known error pattern matched; failure is unclassified");
        return 2;
    }
    for message in matched {
        match &message.category {
            Some(category) => println!("matched: {} [{}]", message.name, category),
            None => println!("matched: {}", message.name),
        }
        if let Some(remedy) = &message.remedy {
            for line in remedy.lines() {
                println!("    {}", line);
            }
        }
    }
    0
}

fn run_template(args: &[String]) -> i32 {
    let name = match args.first() {
        Some(name) => name,
        None => {
            eprintln!("Usage: qcbridge template <program> [output_file]");
            return 1;
        }
    };
    let program = match Program::from_name(name) {
        Some(program) => program,
        None => {
            eprintln!("Error: unknown program `{}`", name);
            eprintln!("Supported: nwchem, orca, xtb, qmmm, spartan");
            return 1;
        }
    };
    let text = match template::render_starter(program) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match args.get(1) {
        Some(path) => {
            if let Err(e) = fs::write(path, &text) {
                eprintln!("Error writing {}: {}", path, e);
                return 1;
            }
            println!("wrote {} template to {}", program, path);
        }
        None => print!("{}", text),
    }
    0
}

fn run_help(args: &[String]) -> i32 {
    match args.first() {
        None => {
            print!("{}", help::general_help());
            0
        }
        Some(topic) => match help::topic_help(topic) {
            Some(text) => {
                println!("{}", text);
                0
            }
            None => {
                eprintln!("Error: unknown help topic `{}`", topic);
                1
            }
        },
    }
}

fn read_artifact_text(artifact: &Path) -> std::io::Result<String> {
    if artifact.is_dir() {
        let output = artifact.join(qcbridge::spartan::OUTPUT_FILE);
        if output.is_file() {
            return fs::read_to_string(output);
        }
        let archive = artifact.join(qcbridge::spartan::ARCHIVE_FILE);
        if archive.is_file() {
            return fs::read_to_string(archive);
        }
        return Ok(String::new());
    }
    fs::read_to_string(artifact)
}
