#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "gk: classify edge lists as Tree, Cyclic or DAG",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Train a classifier from labelled edge lists",
        long_about = "Extract features from a labelled CSV table, search every configured \
                      model family, report on the validation split and save the \
                      classifier/extractor pair.",
        after_help = "EXAMPLES:\n    # Train with a held-out split carved from the table\n    gk train --train data/train.csv\n\n    # Use a separate validation table and output directory\n    gk train --train train.csv --validation val.csv --out models/"
    )]
    Train(cmd::train::TrainArgs),

    #[command(
        about = "Classify one edge list with a trained model",
        long_about = "Load the saved classifier/extractor pair and classify a JSON edge list.",
        after_help = "EXAMPLES:\n    # Classify a directed triangle\n    gk classify --edges '[[0, 1], [1, 2], [2, 0]]'\n\n    # Read a request body from a file\n    gk classify --file request.json --json"
    )]
    Classify(cmd::classify::ClassifyArgs),

    #[command(
        about = "Print the raw structural features of an edge list",
        long_about = "Parse an edge list with the tolerant parser and print every named feature.",
        after_help = "EXAMPLES:\n    # Tuple-style literal\n    gk features --edges '[(0, 1), (1, 2)]'\n\n    # Emit machine-readable output\n    gk features --edges '[[\"a\", \"b\"]]' --json"
    )]
    Features(cmd::features::FeaturesArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GRAPHKIND_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "graphkind=debug,info"
        } else {
            "graphkind=info,warn"
        })
    });

    let format = env::var("GRAPHKIND_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let output = cli.output_mode();

    match cli.command {
        Commands::Train(ref args) => cmd::train::run_train(args, output),
        Commands::Classify(ref args) => cmd::classify::run_classify(args, output),
        Commands::Features(ref args) => cmd::features::run_features(args, output),
    }
}
