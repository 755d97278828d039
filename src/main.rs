use std::io::Write;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use junit_ingest::{
    ingest_paths,
    junit::{Status, Suite, Totals},
};

#[derive(Debug, Parser)]
#[command(
    version = std::env!("CARGO_PKG_VERSION"),
    name = "junit-ingest",
    about = "Normalize JUnit XML reports into suites, tests and totals"
)]
struct Cli {
    #[arg(
        required = true,
        value_delimiter = ',',
        value_parser = clap::builder::NonEmptyStringValueParser::new(),
        help = "JUnit XML files, directories or glob paths to ingest."
    )]
    junit_paths: Vec<String>,
    #[arg(long, help = "Print the ingested suites as JSON.")]
    json: bool,
    #[arg(
        long,
        env = "JUNIT_INGEST_STRICT",
        help = "Exit with a failure code when any test failed or errored."
    )]
    strict: bool,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

const LOG_FILTER_ENV: &str = "JUNIT_INGEST_LOG";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logger(cli.verbose.log_level_filter());
    match run(cli) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            log::error!("Error: {:?}", e);
            std::process::exit(exitcode::SOFTWARE);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let Cli {
        junit_paths,
        json,
        strict,
        ..
    } = cli;

    let suites = ingest_paths(junit_paths.as_slice())?;
    let totals: Totals = suites.iter().map(Suite::totals).sum();

    if json {
        println!("{}", serde_json::to_string_pretty(&suites)?);
    } else {
        print_summary(&suites, &totals);
    }

    if strict && !totals.is_success() {
        return Ok(exitcode::DATAERR);
    }
    Ok(exitcode::OK)
}

fn print_summary(suites: &[Suite], totals: &Totals) {
    for suite in suites {
        let name = if suite.name.is_empty() {
            "<unnamed>"
        } else {
            suite.name.as_str()
        };
        println!("{}: {}", name, suite.totals());
        for test in suite.tests() {
            if let (Status::Failed | Status::Error, Some(error)) = (test.status, &test.error) {
                println!("  {} {}: {}", test.status, test.name, error.message);
            }
        }
    }
    println!("total: {}", totals);
}

fn setup_logger(level: log::LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}: {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(level);
    // Explicit filters from the environment override the verbosity flags.
    if let Ok(filters) = std::env::var(LOG_FILTER_ENV) {
        builder.parse_filters(&filters);
    }
    builder.init();
}
