use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::CommonArgs;

#[derive(Parser)]
#[command(
    author,
    version = env!("CARGO_PKG_VERSION"),
    about = "Benchmark reranking models against a trusted hosted baseline",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Benchmark run (the default when no subcommand is given)
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args)]
struct RunArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Ignore the cached baseline and query the trusted provider again
    #[arg(long)]
    regenerate_baseline: bool,

    /// Pre-load models on the server before timing
    #[arg(long)]
    warmup: bool,

    /// Single iteration per query
    #[arg(long, conflicts_with = "iterations")]
    quick: bool,

    /// Timed passes over the query set (default: from config or 3)
    #[arg(long, value_name = "N")]
    iterations: Option<usize>,

    /// Only benchmark candidates with this name (repeatable)
    #[arg(long = "model", value_name = "NAME")]
    models: Vec<String>,

    /// Output the report as JSON
    #[arg(short, long)]
    json: bool,

    /// Show per-query top documents
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load or generate the trusted baseline and show it
    Baseline {
        #[command(flatten)]
        common: CommonArgs,

        /// Query the trusted provider even if a valid cache exists
        #[arg(long)]
        regenerate: bool,
    },

    /// Check that the inference server is reachable
    Health {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// List the fixture corpus and queries
    Fixtures {
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let args = cli.run;
            commands::run::execute(commands::run::RunOptions {
                common: args.common,
                regenerate_baseline: args.regenerate_baseline,
                warmup: args.warmup,
                iterations: if args.quick { Some(1) } else { args.iterations },
                models: args.models,
                json: args.json,
                verbose: args.verbose,
            })
        }
        Some(Commands::Baseline { common, regenerate }) => {
            commands::baseline::execute(&common, regenerate)
        }
        Some(Commands::Health { common }) => commands::health::execute(&common),
        Some(Commands::Fixtures { common }) => commands::fixtures::execute(&common),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
