use std::path::PathBuf;
use std::process;

use clap::Parser;

mod commands;
mod display;
mod executor;

use commands::Command;
use display::OutputMode;

/// Schema catalog console: load `_space` / `_index` select results and resolve names.
#[derive(Parser, Debug)]
#[command(name = "tnt-schema-console", version)]
struct Cli {
    /// Raw MessagePack select result from `_space` or `_vspace`.
    #[arg(short, long)]
    spaces: PathBuf,

    /// Raw MessagePack select result from `_index` or `_vindex`.
    #[arg(short, long)]
    indexes: Option<PathBuf>,

    /// Output results as machine-parseable JSON.
    #[arg(short, long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Pretty
    };

    let catalog = match executor::load_catalog(&cli.spaces, cli.indexes.as_deref()) {
        Ok(catalog) => catalog,
        Err(e) => {
            display::render_error(&e, &mode);
            process::exit(2);
        }
    };

    let result = executor::execute(&catalog, &cli.command);
    display::render(&result, &mode);
    if !result.found() {
        process::exit(1);
    }
}
