//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Ordered multi-root trees: reposition nodes between siblings and parents
#[derive(Parser, Debug)]
#[command(name = "dragtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Snapshot file, .toml or .json (default: `snapshot` from config)
    #[arg(short, long, global = true, env = "DRAGTREE_FILE", value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the tree ordered by position
    Show,

    /// Move a node before a sibling or to the end of a parent
    Move {
        /// Node to move
        item: String,

        /// Place the node just before this sibling
        #[arg(short, long, conflicts_with = "into")]
        before: Option<String>,

        /// Append the node to the children of this parent (default: end of root level)
        #[arg(short, long)]
        into: Option<String>,

        /// Report the changes without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Write the result here instead of overwriting the snapshot
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Check a snapshot for duplicate ids, numbering gaps and detached nodes
    Validate,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
