//! Cohort command-line interface

use anyhow::Result;
use clap::{Parser, Subcommand};
use octofhir_cohort::cli::output::{ColorMode, OutputFormat};
use octofhir_cohort::cli::{build, compare, infer, init_logging, loader, output, stats, validate};
use std::path::PathBuf;

/// Cohort command-line tool
#[derive(Parser)]
#[command(name = "cohort")]
#[command(author, version, about = "Patient screening filters and cohort comparison", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Pretty, global = true)]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Color output
    #[arg(long, value_enum, default_value_t = ColorMode::Auto, global = true)]
    color: ColorMode,

    /// Engine config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer column types and statistics of a data file
    Infer {
        /// Data file (JSON)
        data: PathBuf,

        /// Patient identifier column
        #[arg(short, long)]
        patient_id_column: Option<String>,
    },

    /// Validate filter files
    Validate {
        /// Filter files to validate
        files: Vec<PathBuf>,

        /// Data file whose schema the filters must match
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Strict mode (warnings as errors)
        #[arg(short, long)]
        strict: bool,
    },

    /// Build a cohort from a data file and a filter
    Build {
        /// Data file (JSON)
        data: PathBuf,

        /// Filter file (JSON)
        filter: PathBuf,

        /// Patient identifier column
        #[arg(short, long)]
        patient_id_column: Option<String>,

        /// Cohort id (generated when absent)
        #[arg(long)]
        id: Option<String>,

        /// Cohort name (default: filter file name)
        #[arg(short, long)]
        name: Option<String>,

        /// Study the cohort belongs to
        #[arg(long, default_value = "default")]
        study: String,

        /// Cohort files referenced by membership rules
        #[arg(long = "cohort")]
        cohorts: Vec<PathBuf>,

        /// Scan chunks in parallel
        #[arg(long)]
        parallel: bool,

        /// Give up after this many milliseconds
        #[arg(short, long = "timeout-ms")]
        timeout_ms: Option<u64>,
    },

    /// Compare cohort files
    Compare {
        /// Cohort files (JSON)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Sample values and statistics of one column
    Stats {
        /// Data file (JSON)
        data: PathBuf,

        /// Column name
        column: String,

        /// Number of sample values
        #[arg(short, long)]
        samples: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    output::setup_colors(cli.color);
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let engine = loader::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Infer {
            data,
            patient_id_column,
        } => {
            let config = infer::InferConfig {
                file: data,
                patient_id_column,
                engine,
                verbose: cli.verbose,
                output_format: cli.format,
                output_file: cli.output,
            };
            infer::infer(config).await
        }

        Commands::Validate { files, data, strict } => {
            let config = validate::ValidateConfig {
                files,
                data,
                strict,
                engine,
                verbose: cli.verbose,
            };
            validate::validate(config).await
        }

        Commands::Build {
            data,
            filter,
            patient_id_column,
            id,
            name,
            study,
            cohorts,
            parallel,
            timeout_ms,
        } => {
            let mut engine = engine;
            if parallel {
                engine = engine.with_parallel(true);
            }
            if timeout_ms.is_some() {
                engine = engine.with_deadline_ms(timeout_ms);
            }
            let config = build::BuildConfig {
                data,
                filter,
                patient_id_column,
                id,
                name,
                study,
                cohorts,
                engine,
                verbose: cli.verbose,
                output_format: cli.format,
                output_file: cli.output,
            };
            build::build(config).await
        }

        Commands::Compare { files } => {
            let config = compare::CompareConfig {
                files,
                engine,
                verbose: cli.verbose,
                output_format: cli.format,
                output_file: cli.output,
            };
            compare::compare(config).await
        }

        Commands::Stats { data, column, samples } => {
            let config = stats::StatsConfig {
                file: data,
                column,
                samples,
                engine,
                output_format: cli.format,
                output_file: cli.output,
            };
            stats::stats(config).await
        }
    }
}
