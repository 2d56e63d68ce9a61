pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rawdog")]
#[command(about = "An RSS/Atom aggregator that merges feeds into one page", long_about = None)]
#[command(version)]
pub struct Cli {
    /// State directory (default: ~/.rawdog)
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// Read an additional config file after config.toml
    #[arg(short, long = "config", value_name = "FILE", global = true)]
    pub configs: Vec<PathBuf>,

    /// Print more detailed status information
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Fetch due feeds and store their articles
    Update {
        /// Update only this feed, whether or not it is due
        #[arg(short, long, value_name = "URL")]
        feed: Option<String>,
    },
    /// Write the output page
    Write,
    /// Update, then write
    Run,
    /// List the known feeds
    List,
    /// Print the page template in use
    ShowTemplate {
        /// Print the item template instead
        #[arg(long)]
        item: bool,
    },
}

impl Commands {
    /// Whether the command changes the saved state.
    pub fn mutates_state(&self) -> bool {
        matches!(self, Commands::Update { .. } | Commands::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update_with_feed() {
        let cli = Cli::parse_from(["rawdog", "-d", "/tmp/r", "update", "--feed", "https://a/"]);
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp/r")));
        assert_eq!(
            cli.command,
            Commands::Update {
                feed: Some("https://a/".into())
            }
        );
        assert!(cli.command.mutates_state());
    }

    #[test]
    fn test_repeated_config_files() {
        let cli = Cli::parse_from(["rawdog", "-c", "a.toml", "--config", "b.toml", "-v", "write"]);
        assert_eq!(cli.configs, vec![PathBuf::from("a.toml"), PathBuf::from("b.toml")]);
        assert!(cli.verbose);
        assert!(!cli.command.mutates_state());
    }

    #[test]
    fn test_show_item_template() {
        let cli = Cli::parse_from(["rawdog", "show-template", "--item"]);
        assert_eq!(cli.command, Commands::ShowTemplate { item: true });
    }
}
