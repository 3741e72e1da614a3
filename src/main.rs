//! Burrow - entry point
//!
//! Parses the command line, installs the log subscriber and exits with the
//! command's status.

use burrow::Cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "burrow=debug,burrow_core=debug"
    } else {
        "burrow=warn,burrow_core=warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    std::process::exit(burrow::run(cli));
}
