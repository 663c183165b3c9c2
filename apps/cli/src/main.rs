mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hypr_segment_track::{Session, SyncConfig, UuidIdGen};
use tracing_subscriber::prelude::*;

use crate::commands::{ExportFormat, edit::EditOp};

#[derive(Parser)]
#[command(name = "segtrack", about = "Inspect, edit and export timed transcript segments")]
struct Cli {
    /// Transcript JSON: an array of `{score, start, end, text, words}` records.
    #[arg(short, long, env = "SEGTRACK_INPUT")]
    input: PathBuf,

    /// Optional JSON file overriding placeholder settings.
    #[arg(long, env = "SEGTRACK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the transcript and report ingest errors.
    Check,
    /// Print the flat view.
    Export {
        #[arg(short, long, env = "SEGTRACK_FORMAT", default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },
    /// Print the segment playing at a given offset.
    Cue {
        #[arg(long)]
        at_ms: i64,
    },
    /// Apply edits in order, then print the result.
    Edit {
        /// e.g. `append-after:0`, `remove:2`, `text:1:Hello`, `time:1:1000:2000`, `toggle:3`.
        #[arg(long = "op", required = true)]
        ops: Vec<EditOp>,

        #[arg(short, long, env = "SEGTRACK_FORMAT", default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<SyncConfig> {
    match path {
        Some(path) => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
        None => Ok(SyncConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let mut session = Session::open_with(&cli.input, UuidIdGen, config)?;

    tracing::info!(
        input = %cli.input.display(),
        segments = session.sync().track().len(),
        errors = session.errors().len(),
        "transcript_loaded"
    );

    match cli.command {
        Command::Check => commands::check(&session),
        Command::Export { format } => {
            println!("{}", commands::render(session.sync().flat_view(), &format)?);
            Ok(())
        }
        Command::Cue { at_ms } => commands::cue(&session, at_ms),
        Command::Edit { ops, format } => {
            commands::edit::apply(&mut session, &ops)?;
            println!("{}", commands::render(session.sync().flat_view(), &format)?);
            Ok(())
        }
    }
}
