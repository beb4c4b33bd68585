use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "takotako", version, about = "Sardonic auto-reply bot for Tako")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Poll the following feed and reply to recent posts, forever.
    Bot,
    /// Serve the comment endpoint over HTTP.
    Serve {
        /// Overrides BIND_ADDR.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Interactive console for trying out comments.
    Chat,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Bot)
    }
}
