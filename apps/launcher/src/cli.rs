//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Open Games Launcher - launch, update and follow your games")]
pub struct Args {
    /// Use this configuration file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List games in the catalog (default)
    List,
    /// Add a game for an executable
    Add {
        /// Path to the game executable
        executable: PathBuf,
    },
    /// Launch a game
    Play {
        /// Game id
        id: String,
    },
    /// Show a game's news bulletin
    News {
        /// Game id
        id: String,
    },
    /// Download and unpack a game's update
    Update {
        /// Game id
        id: String,
    },
    /// Open a game's working directory
    Open {
        /// Game id
        id: String,
    },
    /// Open a game's catalog file for editing
    Edit {
        /// Game id; opens the catalog folder when omitted
        id: Option<String>,
    },
}
