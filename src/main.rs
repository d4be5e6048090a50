use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Client;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod archive;
mod config;
mod deploy;
mod identity;
mod outputs;

use api::{CdfClient, FunctionsApi};
use config::{CiContext, Config};
use deploy::Orchestrator;
use outputs::OutputWriter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Platform API base URL (defaults to CDF_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Platform project (defaults to CDF_PROJECT)
    #[arg(long, global = true)]
    project: Option<String>,
    /// Directory containing the function source (defaults to FUNCTION_PATH)
    #[arg(long, global = true)]
    function_path: Option<String>,
    /// How long to wait for a deployment to become ready (e.g. 30s, 5m)
    #[arg(long, global = true, default_value = "5m")]
    wait_timeout: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deploy according to the CI event that triggered the run
    Run {},
    /// Deploy the commit under its sha tag and move the `latest` alias
    Push {},
    /// Deploy (or clean up) the branch-scoped PR function
    PullRequest {
        /// Only delete the existing PR deployment, do not redeploy
        #[arg(long)]
        delete_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.base_url, cli.project, cli.function_path)?;
    let ctx = CiContext::from_env()?;
    let wait_timeout = deploy::parse_duration(&cli.wait_timeout)?;

    let client = CdfClient::new(
        Client::new(),
        &config.base_url,
        &config.project,
        &config.api_key,
    );

    let login = client.login_status().await.context("Login check failed")?;
    if !login.logged_in {
        bail!("Invalid credentials for project '{}'", config.project);
    }
    info!("Logged in as user {} (project {})", login.user, login.project);

    let outputs = OutputWriter::from_env();
    let orchestrator = Orchestrator::new(&client, &outputs, wait_timeout);

    match &cli.command {
        Commands::Run {} => {
            info!(
                "Handling event {} on {}",
                ctx.event_name,
                ctx.ref_name.as_deref().unwrap_or("unknown ref")
            );
            match ctx.event_name.as_str() {
                "push" => {
                    orchestrator
                        .run_push(&config, &ctx.repository, ctx.short_sha()?)
                        .await?
                }
                "pull_request" => {
                    orchestrator
                        .run_pull_request(&config, &ctx.repository, ctx.head_ref()?, ctx.delete_only)
                        .await?
                }
                other => warn!("Nothing to do for event '{}'", other),
            }
        }
        Commands::Push {} => {
            orchestrator
                .run_push(&config, &ctx.repository, ctx.short_sha()?)
                .await?
        }
        Commands::PullRequest { delete_only } => {
            orchestrator
                .run_pull_request(
                    &config,
                    &ctx.repository,
                    ctx.head_ref()?,
                    *delete_only || ctx.delete_only,
                )
                .await?
        }
    }

    Ok(())
}
