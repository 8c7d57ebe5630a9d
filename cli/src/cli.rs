use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TreeOutputFormat {
    Json,
    Text,
}

#[derive(Parser)]
#[command(name = "hn-cli", version, about = "HowTo Naija comments CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read and write article comments on the hosted store.
    Comments {
        #[command(subcommand)]
        command: CommentCommands,
    },
}

#[derive(Subcommand)]
pub enum CommentCommands {
    /// Show the approved comments of an article as a reply tree.
    List {
        /// Article the comments belong to.
        #[arg(long)]
        article_id: String,
        #[arg(long, value_enum, default_value_t = TreeOutputFormat::Json)]
        format: TreeOutputFormat,
    },
    /// Submit a comment. It stays hidden until a moderator approves it.
    Post {
        #[arg(long)]
        article_id: String,
        #[arg(long)]
        content: String,
        /// Comment being replied to.
        #[arg(long)]
        parent_id: Option<String>,
        #[arg(long)]
        author_name: Option<String>,
        #[arg(long)]
        author_email: Option<String>,
        /// Signed-in session token; omit to post anonymously.
        #[arg(long, env = "HOWTO_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,
    },
    /// Replace the body of one of your comments.
    Edit {
        #[arg(long)]
        id: String,
        #[arg(long)]
        content: String,
        #[arg(long, env = "HOWTO_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,
    },
    /// Delete one of your comments. Replies are kept.
    Delete {
        #[arg(long)]
        id: String,
        #[arg(long, env = "HOWTO_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,
    },
    /// Build the reply tree from a JSON dump of comment rows, offline.
    Tree {
        /// JSON array of comment rows.
        #[arg(long)]
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = TreeOutputFormat::Text)]
        format: TreeOutputFormat,
    },
}
