use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tunerelay")]
#[command(author, version, about = "Telegram bot that relays direct media links and decodes playlist files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot with long polling (default)
    Run,

    /// Download one direct link through the pipeline and save it locally
    Fetch {
        /// http(s) link to the media file
        url: String,

        /// Directory the delivered file is copied into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
