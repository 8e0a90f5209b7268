//! OHLCV feature pipeline CLI.
//!
//! Turns a candle table into a labelled feature table for direction
//! classifiers.

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "predictor")]
#[command(about = "Derive a labelled feature table from OHLCV candles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the feature table from an input candle file
    Build {
        /// Input table with timestamp,open,high,low,close,volume columns
        #[arg(short, long)]
        input: PathBuf,

        /// Output feature table
        #[arg(short, long)]
        output: PathBuf,

        /// Pipeline config (TOML); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write a JSON run summary to this path
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Field delimiter for input and output
        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },
    /// Print the output columns the pipeline would produce
    Columns {
        /// Pipeline config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Take extra columns from this input file's header
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },
    /// Print the default configuration as TOML
    Config,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            input,
            output,
            config,
            summary,
            delimiter,
        } => {
            let config = commands::load_config(config.as_deref())?;
            let delimiter = commands::delimiter_byte(delimiter)?;
            let run = commands::build(&input, &output, &config, summary.as_deref(), delimiter)?;
            tracing::info!(
                input_rows = run.input_rows,
                output_rows = run.output_rows,
                dropped_rows = run.dropped_rows,
                output = %output.display(),
                "features saved"
            );
        }
        Commands::Columns {
            config,
            input,
            delimiter,
        } => {
            let config = commands::load_config(config.as_deref())?;
            let delimiter = commands::delimiter_byte(delimiter)?;
            for column in commands::columns(&config, input.as_deref(), delimiter)? {
                println!("{column}");
            }
        }
        Commands::Config => {
            print!("{}", predictor_core::Config::default().to_toml_string()?);
        }
    }

    Ok(())
}
