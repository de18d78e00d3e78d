//! CLI interface for the STEM tutor
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for the terminal host.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tutor_sdk::Subject;

/// Adaptive STEM tutor
///
/// Classifies mathematics, physics and chemistry questions, explains them at
/// the learner's level using similar worked problems, and adapts that level
/// to feedback.
#[derive(Parser, Debug)]
#[command(name = "tutor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer a single question
    Ask {
        /// The question to explain
        question: String,

        /// Also generate a practice problem on the same concepts
        #[arg(long)]
        practice: bool,
    },

    /// Start an interactive tutoring session
    Session,

    /// Add reference problems to the knowledge store
    Ingest {
        /// Subject collection to add the file's problems to
        #[arg(long, requires = "file")]
        subject: Option<Subject>,

        /// Text file of problems separated by lines containing only `---`
        #[arg(requires = "subject", required_unless_present = "builtin")]
        file: Option<PathBuf>,

        /// Seed every subject with the built-in practice collection
        #[arg(long, conflicts_with_all = ["subject", "file"])]
        builtin: bool,
    },

    /// Write the practice problem collection as Markdown
    Report {
        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Manage stored API keys
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run system diagnostics
    Doctor,
}

/// Secret management actions
#[derive(Subcommand, Debug)]
pub enum SecretAction {
    /// Store a provider API key in the OS keychain
    Set {
        /// Provider name (openai, groq)
        provider: String,

        /// Key value; read from stdin when omitted
        #[arg(long)]
        value: Option<String>,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["tutor", "doctor"]);
        assert!(matches!(cli.command, Command::Doctor));
        assert!(!cli.json);
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["tutor", "--json", "--log", "debug", "session"]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));
        assert!(matches!(cli.command, Command::Session));
    }

    #[test]
    fn test_ask_command() {
        let cli = Cli::parse_from(["tutor", "ask", "Solve 2x + 3 = 7", "--practice"]);
        if let Command::Ask { question, practice } = cli.command {
            assert_eq!(question, "Solve 2x + 3 = 7");
            assert!(practice);
        } else {
            panic!("Expected Ask command");
        }
    }

    #[test]
    fn test_ingest_file() {
        let cli = Cli::parse_from(["tutor", "ingest", "--subject", "Physics", "problems.txt"]);
        if let Command::Ingest {
            subject,
            file,
            builtin,
        } = cli.command
        {
            assert_eq!(subject, Some(Subject::Physics));
            assert_eq!(file, Some(PathBuf::from("problems.txt")));
            assert!(!builtin);
        } else {
            panic!("Expected Ingest command");
        }
    }

    #[test]
    fn test_ingest_builtin() {
        let cli = Cli::parse_from(["tutor", "ingest", "--builtin"]);
        assert!(matches!(
            cli.command,
            Command::Ingest {
                builtin: true,
                subject: None,
                file: None
            }
        ));
    }

    #[test]
    fn test_ingest_rejects_bad_combinations() {
        assert!(Cli::try_parse_from(["tutor", "ingest"]).is_err());
        assert!(Cli::try_parse_from(["tutor", "ingest", "problems.txt"]).is_err());
        assert!(Cli::try_parse_from(["tutor", "ingest", "--subject", "biology", "p.txt"]).is_err());
        assert!(
            Cli::try_parse_from(["tutor", "ingest", "--builtin", "--subject", "physics", "p.txt"])
                .is_err()
        );
    }

    #[test]
    fn test_secret_set() {
        let cli = Cli::parse_from(["tutor", "secret", "set", "groq"]);
        if let Command::Secret {
            action: SecretAction::Set { provider, value },
        } = cli.command
        {
            assert_eq!(provider, "groq");
            assert!(value.is_none());
        } else {
            panic!("Expected Secret command");
        }
    }

    #[test]
    fn test_report_output() {
        let cli = Cli::parse_from(["tutor", "report", "--output", "problems.md"]);
        if let Command::Report { output } = cli.command {
            assert_eq!(output, Some(PathBuf::from("problems.md")));
        } else {
            panic!("Expected Report command");
        }
    }
}
