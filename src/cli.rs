use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::OutputFormat;
use crate::rules::{FilterAction, FilterTarget, ImportMode, MatchMode, DEFAULT_PRIORITY};

#[derive(Parser)]
#[command(name = "curlscrub")]
#[command(about = "Clean copied curl commands: drop or keep headers, query params, form fields and JSON fields with prioritized rules.")]
#[command(version)]
pub struct Cli {
    /// Rule and history database (default: $XDG_DATA_HOME/curlscrub/curlscrub.db)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// A command given as a file, stdin or inline.
#[derive(Args, Clone, Debug)]
pub struct InputArgs {
    /// File holding the command ("-" or omitted reads stdin)
    pub file: Option<PathBuf>,

    /// Command to process, given inline
    #[arg(short = 'c', long = "command", value_name = "CMD", conflicts_with = "file")]
    pub inline: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Filter a command with the stored rules and print the result
    Clean {
        #[command(flatten)]
        input: InputArgs,

        /// Use the rules in this export file instead of the stored rules
        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Emit one option per line with backslash continuations
        #[arg(long)]
        multiline: bool,

        /// Do not record this run in history
        #[arg(long)]
        no_history: bool,
    },

    /// Parse a command and print its structure as JSON
    Parse {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Manage filter rules
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },

    /// Show or clear the history of cleaned commands
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },

    /// Print the resolved configuration
    Config,

    /// Generate shell completions
    #[cfg(feature = "completions")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum RulesCommand {
    /// List stored rules in evaluation order
    List {
        /// Print rules as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a rule
    Add {
        /// Rule name
        #[arg(long)]
        name: String,

        #[arg(long, value_enum)]
        action: FilterAction,

        #[arg(long, value_enum)]
        target: FilterTarget,

        /// How the value is compared against field names
        #[arg(long = "match", value_enum, default_value = "exact")]
        match_mode: MatchMode,

        /// Value to match (not used by delete_all/keep_all)
        #[arg(long, default_value = "")]
        value: String,

        /// 0-100, higher runs first
        #[arg(long, default_value_t = DEFAULT_PRIORITY, allow_negative_numbers = true)]
        priority: i64,

        #[arg(long)]
        description: Option<String>,

        /// Store the rule disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Change fields of a rule
    Update {
        /// Rule id
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_enum)]
        action: Option<FilterAction>,

        #[arg(long, value_enum)]
        target: Option<FilterTarget>,

        #[arg(long = "match", value_enum)]
        match_mode: Option<MatchMode>,

        #[arg(long)]
        value: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        priority: Option<i64>,

        /// New description (empty clears it)
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a rule
    Remove {
        /// Rule id
        id: String,
    },

    /// Enable a rule
    Enable {
        /// Rule id
        id: String,
    },

    /// Disable a rule
    Disable {
        /// Rule id
        id: String,
    },

    /// Check the stored rules (or an export file) for errors and conflicts
    Validate {
        /// Export file to check instead of the stored rules
        file: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import rules from an export file
    Import {
        file: PathBuf,

        /// Replace the stored rules or append to them
        #[arg(long, value_enum, default_value = "replace")]
        mode: ImportMode,
    },

    /// Export rules as JSON
    Export {
        /// Write to FILE instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// List built-in rule templates
    Templates,

    /// Install a built-in rule template
    Template {
        /// Template name (see `rules templates`)
        name: String,
    },
}

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// Show recent cleaned commands, newest first
    List {
        /// Number of entries to show
        #[arg(long)]
        limit: Option<usize>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete all history
    Clear,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands, RulesCommand};
    use crate::rules::{FilterAction, FilterTarget, MatchMode};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_rule_add() {
        let cli = Cli::try_parse_from([
            "curlscrub", "--db", "x.db", "rules", "add", "--name", "utm", "--action", "delete",
            "--target", "query_params", "--match", "starts_with", "--value", "utm_",
        ])
        .expect("parse");
        assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("x.db")));
        match cli.command {
            Commands::Rules {
                command:
                    RulesCommand::Add {
                        action,
                        target,
                        match_mode,
                        priority,
                        ..
                    },
            } => {
                assert_eq!(action, FilterAction::Delete);
                assert_eq!(target, FilterTarget::QueryParams);
                assert_eq!(match_mode, MatchMode::StartsWith);
                assert_eq!(priority, 50);
            }
            _ => panic!("expected rules add"),
        }
    }

    #[test]
    fn inline_command_conflicts_with_file() {
        assert!(Cli::try_parse_from(["curlscrub", "clean", "cmd.sh", "-c", "curl x"]).is_err());
        assert!(Cli::try_parse_from(["curlscrub", "clean", "-c", "curl https://x.io"]).is_ok());
    }
}
