use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "heraldbot")]
#[command(author, version, about = "Telegram bot for broadcasting announcements to subscribers", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot in normal mode
    Run,

    /// Run the bot in staging mode (uses staging environment variables)
    RunStaging,

    /// Validate configuration and the roster file, then exit
    CheckConfig,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
