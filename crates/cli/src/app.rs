//! Process entry: argument parsing, connection setup and mode selection
//!
//! Without a trailing command the interactive shell starts. With one, the
//! command runs once and its error decides the exit code.

use std::sync::Arc;

use anyhow::{Context as _, bail};
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, Shell};
use s3c_core::config::config_dir;
use s3c_core::environment::split_scheme;
use s3c_core::input::read_non_empty;
use s3c_core::{
    Config, ConfigManager, ConnectionTarget, EnvironmentManager, Error, LineSource, Session,
    TargetOrigin,
};
use s3c_s3::S3Client;
use tokio::runtime::Handle;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};
use crate::shell::{self, SessionSnapshot, ShellHelper, Terminal};

const HISTORY_FILE: &str = "history";

/// s3client - interactive shell for S3-compatible object storage
///
/// Browse buckets like directories, copy, move, upload and download objects.
/// Give a command after the options to run it once instead of starting the
/// shell.
#[derive(Parser, Debug)]
#[command(name = "s3client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Saved connection to use; created interactively when it does not exist
    #[arg(short = 'e', long = "env", value_name = "NAME")]
    pub env: Option<String>,

    /// Display name for a connection given by --url
    #[arg(long, requires = "url")]
    pub name: Option<String>,

    /// Endpoint of a connection given on the command line
    #[arg(long, conflicts_with = "env", requires_all = ["access_key", "secret_key"])]
    pub url: Option<String>,

    /// Access key for --url
    #[arg(long, requires = "url")]
    pub access_key: Option<String>,

    /// Secret key for --url
    #[arg(long, requires = "url")]
    pub secret_key: Option<String>,

    /// Bucket to enter after connecting to --url
    #[arg(long, requires = "url")]
    pub bucket_name: Option<String>,

    /// Disable colored output
    #[arg(long, default_value = "false")]
    pub no_color: bool,

    /// Disable progress spinners
    #[arg(long, default_value = "false")]
    pub no_progress: bool,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub debug: bool,

    /// Print a completion script for this program and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Command to run once instead of starting the shell
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Run the program and return its exit code
pub async fn run(cli: Cli) -> ExitCode {
    if let Some(shell) = cli.completions {
        print_completions(shell, &mut std::io::stdout());
        return ExitCode::Success;
    }

    let fallback = Formatter::new(OutputConfig {
        no_color: cli.no_color,
        no_progress: cli.no_progress,
    });
    match start(cli).await {
        Ok(code) => code,
        Err(err) => {
            fallback.error(&format!("{err:#}"));
            err.downcast_ref::<Error>()
                .map(ExitCode::from)
                .unwrap_or(ExitCode::GeneralError)
        }
    }
}

async fn start(cli: Cli) -> anyhow::Result<ExitCode> {
    let dir = config_dir().context("cannot determine the configuration directory")?;
    let config = ConfigManager::in_dir(&dir)
        .load()
        .context("failed to load settings")?;
    let formatter = Formatter::new(output_config(&cli, &config));
    let environments = EnvironmentManager::in_config_dir(&dir);
    let interactive = cli.command.is_empty();

    let snapshot = SessionSnapshot::default();
    let helper = ShellHelper::new(
        snapshot.clone(),
        Handle::current(),
        formatter.colors_enabled(),
    );
    let history = (interactive && config.defaults.history).then(|| dir.join(HISTORY_FILE));
    let mut terminal = Terminal::new(helper, history)?;

    let target = select_target(&cli, &environments, &mut terminal, &formatter)?;
    let from_command_line = target.origin == TargetOrigin::CommandLine;
    tracing::debug!(target = %target.key, endpoint = %target.endpoint, "connecting");
    let client = S3Client::new(&target)
        .await
        .with_context(|| format!("failed to connect to {}", target.endpoint))?;
    let default_bucket = target.default_bucket().map(str::to_string);
    let mut session = Session::new(target, Arc::new(client));

    if let Some(bucket) = default_bucket {
        if let Err(err) = session.enter_bucket(&bucket).await {
            formatter.error(&err.to_string());
            if from_command_line && !interactive {
                return Ok(ExitCode::GeneralError);
            }
        }
    }

    if interactive {
        shell::run(
            &mut session,
            &mut terminal,
            &formatter,
            &environments,
            &snapshot,
        )
        .await?;
        return Ok(ExitCode::Success);
    }

    match shell::execute_once(
        &mut session,
        &cli.command,
        &mut terminal,
        &formatter,
        &environments,
    )
    .await
    {
        Ok(()) => Ok(ExitCode::Success),
        Err(err) => {
            formatter.error(&err.to_string());
            Ok(ExitCode::from(&err))
        }
    }
}

fn output_config(cli: &Cli, config: &Config) -> OutputConfig {
    let colors = config
        .defaults
        .color
        .enabled(console::Term::stdout().is_term());
    OutputConfig {
        no_color: cli.no_color || !colors,
        no_progress: cli.no_progress || !config.defaults.progress,
    }
}

/// Pick the connection target from flags, a saved environment or a selection
fn select_target(
    cli: &Cli,
    environments: &EnvironmentManager,
    input: &mut dyn LineSource,
    formatter: &Formatter,
) -> anyhow::Result<ConnectionTarget> {
    if let Some(url) = &cli.url {
        let (Some(access_key), Some(secret_key)) = (&cli.access_key, &cli.secret_key) else {
            bail!("--url requires --access-key and --secret-key");
        };
        let name = cli
            .name
            .clone()
            .unwrap_or_else(|| split_scheme(url).0.to_string());
        let mut target = ConnectionTarget::from_url(name, url, access_key, secret_key);
        target.default_bucket = cli.bucket_name.clone();
        target.origin = TargetOrigin::CommandLine;
        return Ok(target);
    }

    if let Some(name) = &cli.env {
        return environments
            .load_or_create(name, input)
            .with_context(|| format!("cannot use environment {name:?}"));
    }

    let mut saved = environments.list()?;
    match saved.len() {
        0 => bail!(
            "No environment specified. Use \"-e {{name}}\" to create a new environment or use an existing one."
        ),
        1 => Ok(saved.remove(0)),
        _ => choose_target(saved, input, formatter),
    }
}

fn choose_target(
    mut saved: Vec<ConnectionTarget>,
    input: &mut dyn LineSource,
    formatter: &Formatter,
) -> anyhow::Result<ConnectionTarget> {
    let width = saved.iter().map(|t| t.key.len()).max().unwrap_or(0);
    formatter.println("Select environment:");
    for (i, target) in saved.iter().enumerate() {
        formatter.println(&format!(
            "  {}) {:<width$}  ->  {}",
            i + 1,
            target.key,
            target.endpoint
        ));
    }

    let answer = read_non_empty(input, "Selection> ")?;
    let index = answer
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=saved.len()).contains(n))
        .ok_or_else(|| Error::Argument(format!("invalid selection {answer:?}")))?;
    Ok(saved.swap_remove(index - 1))
}

fn print_completions<G: Generator>(generator: G, out: &mut dyn std::io::Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(generator, &mut cmd, name, out);
}
