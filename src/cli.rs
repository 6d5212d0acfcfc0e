//! Command-line interface built on clap.
//!
//! Subcommands inspect the transition graph (`graph`, `validate`, `actions`),
//! run scripted scenarios (`demo`) and replay exported audit trails (`replay`).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use coopflow::demo::Scenario;
use coopflow::workflow::{Role, Status};

/// coopflow: approval workflow engine for cooperation agreements.
#[derive(Debug, Parser)]
#[command(name = "coopflow", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a configuration file (defaults to ./coopflow.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level regardless of configuration.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Roles accepted on the command line, mapped onto [`Role`].
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Partner,
    Office,
    ReviewingUnit,
    LegalOfficer,
    LegalBureau,
    Deputy,
    President,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Partner => Role::Partner,
            RoleArg::Office => Role::Office,
            RoleArg::ReviewingUnit => Role::ReviewingUnit,
            RoleArg::LegalOfficer => Role::LegalOfficer,
            RoleArg::LegalBureau => Role::LegalBureau,
            RoleArg::Deputy => Role::Deputy,
            RoleArg::President => Role::President,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScenarioArg {
    Happy,
    Revision,
    Fork,
    Unauthorized,
    All,
}

impl ScenarioArg {
    pub fn scenarios(self) -> Vec<Scenario> {
        match self {
            ScenarioArg::Happy => vec![Scenario::HappyPath],
            ScenarioArg::Revision => vec![Scenario::RevisionLoop],
            ScenarioArg::Fork => vec![Scenario::ParallelFork],
            ScenarioArg::Unauthorized => vec![Scenario::Unauthorized],
            ScenarioArg::All => Scenario::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Prints the transition table.
    Graph {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Builds and validates the transition registry.
    Validate,

    /// Lists the actions a role may take from a status.
    Actions {
        /// Current status, e.g. `legal_bureau_review`.
        #[arg(long)]
        status: Status,

        #[arg(long, value_enum)]
        role: RoleArg,
    },

    /// Runs scripted scenarios against in-memory collaborators.
    Demo {
        #[arg(long, value_enum, default_value = "all")]
        scenario: ScenarioArg,

        /// Writes the audit trail of every demo proposal to this JSON file.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Replays an exported audit trail and prints each proposal's status.
    Replay {
        /// JSON file written by `demo --export`.
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_actions_subcommand() {
        let cli = Cli::parse_from([
            "coopflow",
            "actions",
            "--status",
            "legal_bureau_review",
            "--role",
            "legal-bureau",
        ]);
        match cli.command {
            Command::Actions { status, role } => {
                assert_eq!(status, Status::LegalBureauReview);
                assert_eq!(Role::from(role), Role::LegalBureau);
            }
            _ => panic!("expected Actions command"),
        }
    }

    #[test]
    fn cli_rejects_unknown_status() {
        let result = Cli::try_parse_from([
            "coopflow", "actions", "--status", "approved", "--role", "office",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_demo_with_defaults() {
        let cli = Cli::parse_from(["coopflow", "--verbose", "demo"]);
        assert!(cli.verbose);
        match cli.command {
            Command::Demo { scenario, export } => {
                assert_eq!(scenario.scenarios().len(), 4);
                assert!(export.is_none());
            }
            _ => panic!("expected Demo command"),
        }
    }

    #[test]
    fn cli_parses_global_config() {
        let cli = Cli::parse_from(["coopflow", "graph", "--json", "--config", "alt.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert!(matches!(cli.command, Command::Graph { json: true }));
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
