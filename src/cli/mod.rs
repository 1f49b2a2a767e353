//! CLI module for Coursemate.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Coursemate - answers questions about your course materials
///
/// Indexes course documents and answers questions with a model that can
/// search lesson content and look up course outlines.
#[derive(Parser, Debug)]
#[command(name = "coursemate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Ask a single question about the indexed courses
    Ask {
        /// The question to ask
        question: String,
    },

    /// Start an interactive chat session
    Chat,

    /// Index course documents from a folder
    Ingest {
        /// Folder with .txt/.md course documents (defaults to courses.docs_dir)
        dir: Option<String>,

        /// Remove all indexed courses before ingesting
        #[arg(long)]
        clear: bool,
    },

    /// List indexed courses
    Courses,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["coursemate", "-vv", "ask", "What is MCP?"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask { question } => assert_eq!(question, "What is MCP?"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ingest_and_serve_defaults() {
        let cli = Cli::parse_from(["coursemate", "ingest", "--clear"]);
        assert!(matches!(cli.command, Commands::Ingest { dir: None, clear: true }));

        let cli = Cli::parse_from(["coursemate", "serve"]);
        assert!(matches!(cli.command, Commands::Serve { ref host, port: 8000 } if host == "127.0.0.1"));
    }
}
