mod app;
mod chat;
mod cli;
mod error;
mod telegram;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, ConfigAction};
use crate::error::BotError;

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
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), BotError> {
    match cli.command {
        Command::Run => app::run(&cli.global).await,
        Command::Check => app::check(&cli.global).await,
        Command::Config(args) => match args.action {
            ConfigAction::Path => {
                println!("{}", app::config_path(&cli.global).display());
                Ok(())
            }
            ConfigAction::Init => app::config_init(),
        },
    }
}
