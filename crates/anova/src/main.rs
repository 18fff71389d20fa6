mod cli;
mod commands;
mod config;
mod error;
mod menu;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Logs go to stderr so they never interleave with menu output.
fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never open a session
        Some(Command::Config(args)) => commands::config_cmd::handle(args, &cli.global),

        Some(Command::Completions(args)) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "anova", &mut std::io::stdout());
            Ok(())
        }

        Some(Command::Devices) => commands::devices::handle(&cli.global).await,

        Some(Command::Export(args)) => commands::export::handle(args, &cli.global).await,

        Some(Command::Interactive) | None => commands::interactive::handle(&cli.global).await,
    }
}
