//! tdl - todo lists with a manual order per category and per day

use clap::Parser;
use tdl::cli::Cli;
use tdl::events::EventDestination;
use tdl::output::{emit_error, infer_command_name_from_args};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logs go to stderr and only when RUST_LOG holds a usable filter.
fn init_tracing() {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty() && raw.len() <= 4096)
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    init_tracing();

    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    // Events on stdout own the stream, so errors fall back to stderr text.
    let json = cli.json
        && EventDestination::parse(cli.events.as_deref()) != Some(EventDestination::Stdout);

    if let Err(err) = cli.run() {
        let _ = emit_error(&command, &err, json);
        std::process::exit(err.exit_code());
    }
}
