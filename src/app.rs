//! Command execution.
//!
//! Configuration is resolved and validated here, once, before the first
//! request. The HTTP client is built once per run and handed to the sweep.

use std::io::{self, BufRead, IsTerminal, Write};

use tracing::{info, instrument};

use crate::api::{auth, Auth, DevOpsClient, WorkItemId};
use crate::cli::{Cli, Command, QueryArgs};
use crate::config::{Config, ConfigError, Profile};
use crate::error::{AppError, Result};
use crate::sweep::{ItemOutcome, Outcome, SweepMode, SweepObserver, SweepReport, Sweeper};
use crate::wiql::{self, WiqlQuery};

/// Run a parsed command line. Returns `true` when every attempted work item
/// succeeded.
pub async fn run(cli: Cli) -> Result<bool> {
    match &cli.command {
        Command::List(query) => sweep(&cli, query, SweepMode::ListOnly, true).await,
        Command::Close { query, yes } => sweep(&cli, query, SweepMode::Close, *yes).await,
        Command::Login { name } => login(&cli, name).map(|()| true),
        Command::Logout { name } => {
            auth::delete_token(name)?;
            println!("Removed the access token for profile '{}'.", name);
            Ok(true)
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// The token from flags/environment, else the profile's keyring entry.
fn resolve_auth(token: Option<&str>, profile: Option<&str>) -> Result<Auth> {
    if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(Auth::new(token));
    }

    match profile {
        Some(name) => Ok(Auth::from_keyring(name)?),
        None => Err(ConfigError::MissingValue {
            name: "personal access token",
            hint: "--token, AZURE_DEVOPS_PAT or 'witsweep login'",
        }
        .into()),
    }
}

/// The filter to run: a parsed `--wiql` query or the assignee filter.
fn build_query(args: &QueryArgs) -> Result<(WiqlQuery, String)> {
    match (&args.wiql, &args.assignee) {
        (Some(text), _) => Ok((wiql::parse(text)?, "matching the query".to_string())),
        (None, Some(name)) => Ok((
            WiqlQuery::assigned_and_open(name),
            format!("assigned to {}", name),
        )),
        (None, None) => Err(AppError::other("an assignee or --wiql query is required")),
    }
}

#[instrument(skip_all, fields(mode = ?mode))]
async fn sweep(cli: &Cli, args: &QueryArgs, mode: SweepMode, assume_yes: bool) -> Result<bool> {
    let (query, label) = build_query(args)?;
    check_confirmable(mode, assume_yes, io::stdin().is_terminal())?;

    let resolved = load_config(cli)?.resolve(&cli.overrides())?;
    let auth = resolve_auth(cli.token.as_deref(), resolved.name.as_deref())?;
    let client = DevOpsClient::new(&resolved.connection, auth)?;
    info!(
        organization = %resolved.connection.organization,
        project = %resolved.connection.project,
        "Configuration resolved"
    );

    let mut observer = ConsoleObserver {
        label: &label,
        confirm: !assume_yes,
    };
    let report = Sweeper::new(&client, mode)
        .run_with(&query, &mut observer)
        .await?;

    print_report(&report, &label);
    Ok(report.is_success())
}

/// Closing asks on stdin first; without a terminal there is nobody to answer.
fn check_confirmable(mode: SweepMode, assume_yes: bool, interactive: bool) -> Result<()> {
    if mode == SweepMode::Close && !assume_yes && !interactive {
        return Err(AppError::other(
            "stdin is not a terminal, so closing cannot be confirmed; pass --yes to close without asking",
        ));
    }
    Ok(())
}

/// The profile `login` should write, if any. Organization and project must be
/// given together.
fn login_profile(
    name: &str,
    organization: Option<&str>,
    project: Option<&str>,
    base_url: Option<&str>,
) -> Result<Option<Profile>> {
    let (organization, project) = match (organization, project) {
        (Some(organization), Some(project)) => (organization, project),
        (None, None) => return Ok(None),
        (Some(_), None) => {
            return Err(ConfigError::MissingValue {
                name: "project",
                hint: "--project together with --org",
            }
            .into())
        }
        (None, Some(_)) => {
            return Err(ConfigError::MissingValue {
                name: "organization",
                hint: "--org together with --project",
            }
            .into())
        }
    };

    let mut profile = Profile::new(name.to_string(), organization.to_string(), project.to_string());
    profile.base_url = base_url.map(str::to_string);
    profile.validate()?;
    Ok(Some(profile))
}

fn login(cli: &Cli, name: &str) -> Result<()> {
    let profile = login_profile(
        name,
        cli.organization.as_deref(),
        cli.project.as_deref(),
        cli.base_url.as_deref(),
    )?;

    let token = match cli.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => token.to_string(),
        None => prompt("Personal access token: ")?,
    };
    if token.is_empty() {
        return Err(AppError::other("no token given"));
    }

    if let Some(profile) = profile {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => Config::default_path()?,
        };
        let mut config = Config::load_from(&path)?;
        config.upsert_profile(profile);
        config.save_to(&path)?;
        println!("Saved profile '{}' to {}.", name, path.display());
    }

    auth::store_token(name, &token)?;
    println!("Stored the access token for profile '{}'.", name);
    Ok(())
}

/// Print a prompt and read one trimmed line from stdin.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Prints progress and asks before closing.
struct ConsoleObserver<'a> {
    label: &'a str,
    confirm: bool,
}

impl SweepObserver for ConsoleObserver<'_> {
    fn searched(&mut self, ids: &[WorkItemId]) -> bool {
        println!("Closing {} work items {}...", ids.len(), self.label);
        if !self.confirm {
            return true;
        }

        print_ids(ids);
        match prompt("Close these work items? [y/N] ") {
            Ok(answer) => answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"),
            Err(_) => false,
        }
    }

    fn item_finished(&mut self, item: &ItemOutcome) {
        match &item.outcome {
            Outcome::Closed => println!("Work item {} closed successfully.", item.id),
            Outcome::Failed { reason, .. } => {
                eprintln!("Failed to close work item {}: {}", item.id, reason)
            }
            Outcome::Listed => {}
        }
    }
}

fn print_ids(ids: &[WorkItemId]) {
    for id in ids {
        println!("  {}", id);
    }
}

fn print_report(report: &SweepReport, label: &str) {
    if report.found() == 0 {
        println!("No open work items {}.", label);
        return;
    }

    match report.mode {
        SweepMode::ListOnly => {
            println!("Total work items {}: {}", label, report.found());
            let ids: Vec<WorkItemId> = report.outcomes.iter().map(|i| i.id).collect();
            print_ids(&ids);
        }
        SweepMode::Close if report.declined => println!("Nothing was closed."),
        SweepMode::Close => println!(
            "Closed {} of {} work items, {} failed.",
            report.closed(),
            report.found(),
            report.failed()
        ),
    }
}
