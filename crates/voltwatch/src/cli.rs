//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "voltwatch",
    version,
    about = "Power-outage notification bot",
    long_about = "Watches a regional power-outage schedule and notifies Telegram \
                  subscribers before, at, and after each outage."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file path (defaults to the platform config directory)
    #[arg(long, global = true, env = "VOLTWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the schedule page URL
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Override the feed poll interval in minutes
    #[arg(long, global = true)]
    pub poll_minutes: Option<u64>,

    /// Override the subscription snapshot path
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the bot: poll the feed, serve chat commands, deliver notifications
    Run,

    /// Fetch the schedule once and print it (no Telegram involved)
    Check,

    /// Manage the configuration file
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the config file location
    Path,

    /// Write a default config file
    Init,
}
