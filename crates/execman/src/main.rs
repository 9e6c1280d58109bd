//! execman CLI - install and update executables from forge releases

mod cli;
mod commands;
mod context;
mod output;
mod version;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use context::Context;

#[tokio::main]
async fn main() -> Result<()> {
    // Must happen before any TLS operation (rustls 0.23+)
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let load = || Context::load(cli.config.as_ref(), cli.registry.clone(), cli.quiet);

    match cli.command {
        Commands::Install(args) => commands::install::run(args, &load()?).await,
        Commands::Check(args) => commands::check::run(args, &load()?).await,
        Commands::Update(args) => commands::update::run(args, &load()?).await,
        Commands::List(args) => commands::list::run(args, &load()?),
        Commands::Remove(args) => commands::remove::run(args, &load()?),
        Commands::Version(args) => commands::version::run(args),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // stderr keeps --json output on stdout parseable
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
