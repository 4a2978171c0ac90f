//! Conformance lab CLI
//!
//! Entry point for the `conformance-lab` command-line tool.

use clap::{Parser, Subcommand};
use conformance_workbench::config::{EffectiveConfig, LabSettings};
use conformance_workbench::mock::{workbench, MockRepository};
use conformance_workbench::report::{self, RESULTS_FILE};
use conformance_workbench::{logging, TestLab, WorkPad, WorkbenchRunner};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// Exit code for configuration and report I/O errors
const EXIT_USAGE: i32 = 2;

#[derive(Parser)]
#[command(name = "conformance-lab")]
#[command(about = "Conformance test lab for metadata repositories", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the repository workbench against the in-memory repository
    Run {
        /// Path to lab config file (TOML)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Report directory (overrides output_dir)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the summary as JSON instead of text
        #[arg(long)]
        json: bool,

        /// Only run test cases whose id matches one of these patterns
        #[arg(long, value_delimiter = ',')]
        filter: Vec<String>,

        /// Do not wait for asynchronous test cases to go quiet
        #[arg(long)]
        no_wait: bool,
    },

    /// Print the summary of a saved test_lab_results.json
    Summarize {
        /// Path to a results file
        results: PathBuf,

        /// Print the summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        /// Path to lab config file (TOML)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output,
            json,
            filter,
            no_wait,
        } => run_lab(config, output, json, filter, no_wait),
        Commands::Summarize { results, json } => run_summarize(results, json),
        Commands::Config { config } => run_config(config),
    }
}

fn cli_overrides(output: Option<PathBuf>, filter: Vec<String>) -> Option<serde_json::Value> {
    let mut overrides = serde_json::Map::new();
    if let Some(output) = output {
        overrides.insert(
            "output_dir".to_string(),
            serde_json::Value::String(output.to_string_lossy().to_string()),
        );
    }
    if !filter.is_empty() {
        overrides.insert("filter".to_string(), serde_json::json!({ "include": filter }));
    }

    if overrides.is_empty() {
        None
    } else {
        Some(serde_json::Value::Object(overrides))
    }
}

fn load_config(
    config_path: Option<PathBuf>,
    overrides: Option<serde_json::Value>,
) -> (EffectiveConfig, LabSettings) {
    let effective = match EffectiveConfig::build(config_path.as_deref(), overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(EXIT_USAGE);
        }
    };
    match LabSettings::from_effective(&effective) {
        Ok(settings) => (effective, settings),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(EXIT_USAGE);
        }
    }
}

fn run_lab(
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    json_output: bool,
    filter: Vec<String>,
    no_wait: bool,
) {
    let (effective, settings) = load_config(config_path, cli_overrides(output, filter));

    if let Err(e) = logging::init_logging(&settings.log_level, settings.log_json) {
        eprintln!("Warning: could not initialise logging: {}", e);
    }

    let repository = Arc::new(MockRepository::new(settings.tut.server_name.clone()));
    let work_pad = Arc::new(
        WorkPad::new(workbench::workbench_identity(), workbench::profile_catalog())
            .with_tut(settings.tut.clone())
            .with_max_page_size(settings.max_page_size)
            .with_quiescence(settings.quiescence),
    );

    let registered = workbench::test_cases(&work_pad, repository, settings.event_timeout);
    let test_cases = match registered {
        Ok(cases) => cases,
        Err(e) => {
            eprintln!("Error registering test cases: {}", e);
            process::exit(EXIT_USAGE);
        }
    };

    let runner = WorkbenchRunner::new(Arc::clone(&work_pad), test_cases)
        .with_filter(settings.filter.clone())
        .with_poll_interval(settings.poll_interval);

    let mut lab = TestLab::new(Some(work_pad.tut().server_name.clone()));
    lab.add_work_pad(work_pad);

    runner.run();
    if !no_wait {
        runner.wait_for_completion(settings.completion_timeout);
    }
    runner.clean_up();

    let results = lab.test_lab_results();
    let effective = effective.with_run_id(lab.test_run_id());
    if let Err(e) = report::write_reports(&settings.output_dir, &results, &effective) {
        eprintln!("Error writing reports: {}", e);
        process::exit(EXIT_USAGE);
    }

    let summary = results.summary();
    if json_output {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing summary: {}", e);
                process::exit(EXIT_USAGE);
            }
        }
    } else {
        print!("{}", report::render_summary(&summary));
        println!();
        println!(
            "Reports written to: {}",
            settings.output_dir.join(RESULTS_FILE).display()
        );
    }

    process::exit(summary.exit_code());
}

fn run_summarize(path: PathBuf, json_output: bool) {
    let results = match report::load_results(&path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error reading {}: {}", path.display(), e);
            process::exit(EXIT_USAGE);
        }
    };

    let summary = results.summary();
    if json_output {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing summary: {}", e);
                process::exit(EXIT_USAGE);
            }
        }
    } else {
        print!("{}", report::render_summary(&summary));
    }

    process::exit(summary.exit_code());
}

fn run_config(config_path: Option<PathBuf>) {
    let (effective, _) = load_config(config_path, None);
    match effective.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing config: {}", e);
            process::exit(EXIT_USAGE);
        }
    }
}
