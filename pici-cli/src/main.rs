mod cli;
mod commands;
mod confirm;

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use cli::{Cli, Commands};
use pici::PiciError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let global = &cli.global;
    let result = match cli.command {
        Commands::Init => commands::init::execute(global),
        Commands::Start(args) => commands::start::execute(args, global),
        Commands::Resize(args) => commands::resize::execute(args, global),
        Commands::Flash(args) => commands::flash::execute(args, global),
        Commands::Export(args) => commands::export::execute(args, global),
        Commands::Backup(args) => commands::backup::execute(args, global),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_user_declined(&e) => {
            tracing::info!("Aborted");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn is_user_declined(e: &anyhow::Error) -> bool {
    e.downcast_ref::<PiciError>()
        .is_some_and(PiciError::is_user_declined)
}

/// `-v` enables debug output; `RUST_LOG` overrides both.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .try_init();
}
