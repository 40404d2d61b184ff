use anyhow::{bail, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

use crate::auth::Token;
use crate::cleanup::{default_workers, Janitor};
use crate::config::Config;
use crate::output::{print_plan, print_report};
use crate::providers::GitLabClient;

#[derive(Parser)]
#[command(name = "pipeline-janitor")]
#[command(author, version, about = "Retention cleanup for GitLab CI/CD pipelines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (searched in the working directory when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete pipelines that violate the configured retention policy
    Run {
        #[arg(short, long, env = "GITLAB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Overrides `host` from the configuration file
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Concurrent API requests (defaults to twice the CPU parallelism)
        #[arg(short, long)]
        workers: Option<usize>,
    },
    /// Write a sample configuration file
    Init {
        #[arg(short, long, default_value = "pipeline-janitor.yml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long, default_value_t = false)]
        force: bool,
    },
}

impl Cli {
    async fn execute_run(
        &self,
        token: Option<&str>,
        host: Option<&str>,
        workers: Option<usize>,
    ) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let targets = config.targets()?;

        let token = token
            .map(Token::from)
            .or_else(|| config.token.as_deref().map(Token::from))
            .filter(|token| !token.is_empty());
        if token.is_none() {
            bail!("A GitLab token is required: set `token` in the configuration or GITLAB_TOKEN");
        }

        let host = host.unwrap_or(&config.host);
        let workers = workers.or(config.workers).unwrap_or_else(default_workers);
        info!("Cleaning up pipelines on {host} with {workers} workers");

        print_plan(&config.options, &targets);

        let client = GitLabClient::new(host, token)?;
        info!("Using GitLab API at {}", client.api_url());
        let janitor = Janitor::new(&client, workers);
        let report = janitor.run(&config.options, &targets, Utc::now()).await?;

        print_report(&report);

        if !report.is_success() {
            bail!("{} operations failed", report.failures.len());
        }

        Ok(())
    }

    fn execute_init(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!(
                "{} already exists; pass --force to overwrite it",
                path.display()
            );
        }

        Config::sample().save(path)?;
        info!("Sample configuration written to: {}", path.display());
        eprintln!("Wrote {}; fill in `token` and `targets` before running", path.display());

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Run {
                token,
                host,
                workers,
            } => {
                self.execute_run(token.as_deref(), host.as_deref(), *workers)
                    .await
            }
            Commands::Init { path, force } => Self::execute_init(path, *force),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "pipeline-janitor",
            "--config",
            "custom.toml",
            "run",
            "--token",
            "glpat-x",
            "-H",
            "gitlab.example.com",
            "--workers",
            "3",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Commands::Run {
                token,
                host,
                workers,
            } => {
                assert_eq!(token.as_deref(), Some("glpat-x"));
                assert_eq!(host.as_deref(), Some("gitlab.example.com"));
                assert_eq!(workers, Some(3));
            }
            Commands::Init { .. } => panic!("expected run"),
        }
    }

    #[test]
    fn test_init_writes_sample_and_refuses_to_clobber() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("pipeline-janitor.yml");

        Cli::execute_init(&path, false).unwrap();
        assert!(Config::load(Some(&path)).is_ok());

        assert!(Cli::execute_init(&path, false).is_err());
        assert!(Cli::execute_init(&path, true).is_ok());
    }
}
