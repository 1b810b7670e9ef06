use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Write, check and convert channel filter expressions
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true, env = "CHANNEL_FILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// When to use colors
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Field catalog for local checks, comma separated (overrides the config)
    #[arg(long, global = true, value_delimiter = ',')]
    pub fields: Option<Vec<String>>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split an expression into classified tokens
    Tokenize {
        /// Filter expression
        expression: String,
    },
    /// Validate an expression and report every problem found
    Validate {
        /// Filter expression
        expression: String,

        /// Also ask the server for an authoritative answer
        #[arg(long)]
        server: bool,
    },
    /// Convert an expression to its condition tree
    ToTree {
        /// Filter expression
        expression: String,

        /// Wrap the tree in a `{"root": ...}` envelope
        #[arg(long)]
        envelope: bool,
    },
    /// Render a stored tree, envelope or filter record as text
    ToText {
        /// JSON file, or `-` for stdin
        input: PathBuf,
    },
    /// Print the canonical form of an expression and what changed
    Normalize {
        /// Filter expression
        expression: String,
    },
    /// Run an expression against the configured source on the server
    Test {
        /// Filter expression
        expression: String,
    },
    /// List the fields an expression may use
    Fields,
    /// Validate each line read from stdin as an edit of the same expression
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
