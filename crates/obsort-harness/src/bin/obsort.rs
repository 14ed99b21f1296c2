//! CLI entrypoint for the oblivious sort harness.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use obsort_core::MergeSplitStrategy;
use obsort_harness::{EXIT_OK, SortRequest, run_sort};

/// Oblivious bucket sort over an untrusted bucket store.
#[derive(Debug, Parser)]
#[command(name = "obsort")]
#[command(about = "Oblivious bucket sort over an untrusted bucket store")]
struct Cli {
    /// Verbose logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sort a JSON array of {sort_key, payload} records.
    Sort {
        /// Input JSON file.
        input: PathBuf,
        /// Bucket capacity Z (power of two).
        #[arg(long, default_value_t = 512)]
        bucket_size: usize,
        /// MergeSplit realization.
        #[arg(long, value_enum, default_value_t = StrategyArg::Bitonic)]
        strategy: StrategyArg,
        /// Working window for the streaming realization.
        #[arg(long, default_value_t = MergeSplitStrategy::DEFAULT_WINDOW)]
        window: usize,
        /// Output path (stdout if omitted).
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Scatter-and-pad partition.
    Partition,
    /// In-memory bitonic network.
    Bitonic,
    /// Blocked streaming bitonic network.
    Streaming,
}

impl StrategyArg {
    fn resolve(self, window: usize) -> MergeSplitStrategy {
        match self {
            Self::Partition => MergeSplitStrategy::PartitionPad,
            Self::Bitonic => MergeSplitStrategy::Bitonic,
            Self::Streaming => MergeSplitStrategy::BitonicStreaming { window },
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );

    match cli.command {
        Command::Sort {
            input,
            bucket_size,
            strategy,
            window,
            output,
        } => {
            let request = SortRequest {
                input,
                bucket_capacity: bucket_size,
                strategy: strategy.resolve(window),
                output,
            };
            match run_sort(&request) {
                Ok(Some(rendered)) => {
                    println!("{rendered}");
                    ExitCode::from(EXIT_OK)
                }
                Ok(None) => ExitCode::from(EXIT_OK),
                Err(err) => {
                    eprintln!("obsort: {err}");
                    ExitCode::from(err.exit_code())
                }
            }
        }
    }
}
