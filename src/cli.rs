//! CLI argument definitions

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tbread",
    version,
    about = "Terminal reader for the textbook platform",
    long_about = "Browse textbook categories and books, read topics with highlighted\n\
                  code blocks, track reading progress and rate textbooks."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Backend URL (overrides the config file)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Config file to use instead of the default
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open the interactive reader
    Read(ReadArgs),

    /// List categories and books with your progress
    Library,

    /// Print one topic to stdout
    Topic(TopicArgs),

    /// Store a session token
    Login {
        /// Token issued by the platform
        #[arg(long)]
        token: String,
    },

    /// Forget the stored session token
    Logout,

    /// Rate a textbook
    Rate {
        #[arg(value_name = "TEXTBOOK_ID")]
        textbook_id: String,

        /// Stars, 1 to 5
        #[arg(value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
    },

    /// Administration (requires an admin account)
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },

    /// Show or create the config file
    Config {
        /// Write a config file with the current settings
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
pub struct ReadArgs {
    /// Textbook to open (library when omitted)
    #[arg(value_name = "TEXTBOOK_ID")]
    pub textbook_id: Option<String>,

    /// Topic index, starting at 0 (book page when omitted)
    #[arg(value_name = "TOPIC_INDEX", requires = "textbook_id")]
    pub topic: Option<usize>,
}

#[derive(Args)]
pub struct TopicArgs {
    #[arg(value_name = "TEXTBOOK_ID")]
    pub textbook_id: String,

    /// Topic index, starting at 0
    #[arg(value_name = "TOPIC_INDEX")]
    pub index: usize,

    /// No colors or styles
    #[arg(long)]
    pub plain: bool,

    /// Wrap width (default: terminal width or 80)
    #[arg(long, value_name = "COLS")]
    pub width: Option<usize>,
}

#[derive(Subcommand)]
pub enum AdminCommand {
    /// Manage textbook categories
    Categories {
        #[command(subcommand)]
        command: CategoryCommand,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommand {
    /// List all categories
    List,

    /// Create a category
    Add(CategoryArgs),

    /// Replace a category's fields
    Edit {
        #[arg(value_name = "CATEGORY_ID")]
        id: String,

        #[command(flatten)]
        fields: CategoryArgs,
    },

    /// Delete a category
    Delete {
        #[arg(value_name = "CATEGORY_ID")]
        id: String,
    },
}

#[derive(Args)]
pub struct CategoryArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Image file to upload
    #[arg(long, value_name = "FILE")]
    pub image: Option<PathBuf>,
}
