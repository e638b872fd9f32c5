//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::Overrides;

/// List and close Azure DevOps work items assigned to a user.
#[derive(Debug, Parser)]
#[command(name = "witsweep", version, about)]
pub struct Cli {
    /// Profile from the config file to use.
    #[arg(short, long, global = true, env = "WITSWEEP_PROFILE")]
    pub profile: Option<String>,

    /// Organization name.
    #[arg(long = "org", global = true, env = "AZURE_DEVOPS_ORG")]
    pub organization: Option<String>,

    /// Project name.
    #[arg(long, global = true, env = "AZURE_DEVOPS_PROJECT")]
    pub project: Option<String>,

    /// Service root, e.g. an on-premises collection URL.
    #[arg(long, global = true, env = "AZURE_DEVOPS_URL")]
    pub base_url: Option<String>,

    /// Personal access token. Falls back to the profile's keyring entry.
    #[arg(long, global = true, env = "AZURE_DEVOPS_PAT", hide_env_values = true)]
    pub token: Option<String>,

    /// Config file to use instead of the default location.
    #[arg(long, global = true, env = "WITSWEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Mirror debug logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List open work items assigned to a user.
    List(QueryArgs),

    /// Close open work items assigned to a user.
    Close {
        #[command(flatten)]
        query: QueryArgs,

        /// Close without asking for confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// Store a personal access token in the OS keyring for a profile.
    ///
    /// The token is taken from --token / AZURE_DEVOPS_PAT or read from stdin.
    /// With --org and --project the profile is also written to the config file.
    Login {
        /// Profile name.
        name: String,
    },

    /// Remove a profile's personal access token from the OS keyring.
    Logout {
        /// Profile name.
        name: String,
    },
}

/// Which work items to sweep.
#[derive(Debug, Args)]
pub struct QueryArgs {
    /// Assignee name or e-mail; matched with CONTAINS.
    #[arg(required_unless_present = "wiql")]
    pub assignee: Option<String>,

    /// Use this WIQL query instead of the assignee filter.
    #[arg(long, conflicts_with = "assignee")]
    pub wiql: Option<String>,
}

impl Cli {
    /// Connection values supplied by flags or environment.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            profile: self.profile.clone(),
            organization: self.organization.clone(),
            project: self.project.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serial_test::serial;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    #[serial]
    fn test_list_with_assignee() {
        let cli = Cli::try_parse_from(["witsweep", "--org", "Olopo", "list", "stanly"]).unwrap();
        assert_eq!(cli.organization.as_deref(), Some("Olopo"));
        match cli.command {
            Command::List(args) => {
                assert_eq!(args.assignee.as_deref(), Some("stanly"));
                assert!(args.wiql.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn test_close_flags() {
        let cli = Cli::try_parse_from(["witsweep", "close", "stanly", "--yes", "--project", "ERP"])
            .unwrap();
        assert_eq!(cli.project.as_deref(), Some("ERP"));
        assert!(matches!(cli.command, Command::Close { yes: true, .. }));
    }

    #[test]
    #[serial]
    fn test_assignee_or_wiql_required() {
        assert!(Cli::try_parse_from(["witsweep", "list"]).is_err());
        assert!(Cli::try_parse_from([
            "witsweep",
            "list",
            "--wiql",
            "SELECT [System.Id] FROM workitems"
        ])
        .is_ok());
        assert!(Cli::try_parse_from([
            "witsweep",
            "list",
            "stanly",
            "--wiql",
            "SELECT [System.Id] FROM workitems"
        ])
        .is_err());
    }

    #[test]
    #[serial]
    fn test_env_supplies_organization() {
        std::env::set_var("AZURE_DEVOPS_ORG", "FromEnv");
        let cli = Cli::try_parse_from(["witsweep", "list", "stanly"]).unwrap();
        std::env::remove_var("AZURE_DEVOPS_ORG");

        assert_eq!(cli.overrides().organization.as_deref(), Some("FromEnv"));
    }

    #[test]
    #[serial]
    fn test_flag_beats_env() {
        std::env::set_var("AZURE_DEVOPS_PROJECT", "FromEnv");
        let cli =
            Cli::try_parse_from(["witsweep", "--project", "FromFlag", "list", "stanly"]).unwrap();
        std::env::remove_var("AZURE_DEVOPS_PROJECT");

        assert_eq!(cli.project.as_deref(), Some("FromFlag"));
    }
}
