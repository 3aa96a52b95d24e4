//! cairo-fuzz - Replay, reproduce and minimize inputs for the cairo harness
//!
//! A command-line companion to the fuzz targets: runs corpus files through
//! a session outside of a fuzzing engine, replays the built-in reproducers
//! and shrinks crashing inputs.

mod minimize;
mod runner;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

use cairo_fuzz::{SessionConfig, DEFAULT_MAX_OPS, DEFAULT_SEED};

#[derive(Parser)]
#[command(name = "cairo-fuzz")]
#[command(version)]
#[command(about = "Replay, reproduce and minimize cairo fuzzing inputs", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one input, or every file in a directory, through a session
    Run {
        /// Input file or directory (default: up to 4096 bytes from stdin)
        path: Option<PathBuf>,

        /// Per-session deadline in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Maximum number of opcodes per session
        #[arg(long, default_value_t = DEFAULT_MAX_OPS)]
        max_ops: usize,

        /// Seed for the in-canvas jitter generator
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Write the final canvas of raster and recording sessions as PNG
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },

    /// Run a built-in reproducer (omit the name to list them)
    Repro {
        /// Reproducer name
        name: Option<String>,
    },

    /// Shrink an input that crashes an executable
    Minimize {
        /// Executable that takes the input file path as its only argument
        exe: PathBuf,

        /// Crashing input
        input: PathBuf,

        /// Where to write the minimized input
        output: PathBuf,

        /// Runs longer than this are killed and count as not crashing
        #[arg(long, default_value = "2000")]
        timeout_ms: u64,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            path,
            timeout_ms,
            max_ops,
            seed,
            dump_dir,
        } => {
            let config = SessionConfig {
                max_ops,
                seed,
                deadline: timeout_ms.map(Duration::from_millis),
                capture: dump_dir.is_some(),
                ..SessionConfig::default()
            };
            let runner = runner::Runner::new(config, dump_dir);
            let summary = match path {
                Some(path) => runner.run_path(&path)?,
                None => runner.run_stdin()?,
            };
            eprintln!(
                "Ran {} input(s), {} skipped, {} failed",
                summary.ran, summary.skipped, summary.failed
            );
        }

        Commands::Repro { name: None } => {
            for repro in cairo_fuzz::repro::ALL {
                println!("{:<20} {}", repro.name, repro.summary);
            }
        }

        Commands::Repro { name: Some(name) } => {
            let repro = cairo_fuzz::repro::find(&name)
                .ok_or_else(|| format!("Unknown reproducer '{name}'"))?;
            eprintln!("Running '{}': {}", repro.name, repro.summary);
            (repro.run)()?;
            eprintln!("'{}' completed without crashing", repro.name);
        }

        Commands::Minimize {
            exe,
            input,
            output,
            timeout_ms,
        } => {
            let data = std::fs::read(&input)
                .map_err(|e| format!("Failed to read '{}': {}", input.display(), e))?;
            let target = minimize::Subprocess::new(exe, Duration::from_millis(timeout_ms));

            eprintln!("Starting size: {} bytes", data.len());
            let minimized = minimize::minimize(data, |candidate| target.crashes(candidate))?;
            std::fs::write(&output, &minimized)?;
            eprintln!(
                "Final crash size: {} bytes -> '{}'",
                minimized.len(),
                output.display()
            );
        }
    }

    Ok(())
}
