//! The deploy/poll/replace orchestration.
//!
//! One run is a straight line: pack, upload, delete whatever holds the
//! identity, create, poll. The push flow then moves the `latest` alias to
//! the new artifact and removes the transient sha-tagged registration.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::api::models::{FileRef, FunctionSpec, FunctionStatus};
use crate::api::{DeleteOutcome, FunctionsApi};
use crate::archive;
use crate::config::Config;
use crate::identity;
use crate::outputs::OutputWriter;

/// How long to wait between status polls.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

pub struct Orchestrator<'a, C: FunctionsApi> {
    client: &'a C,
    outputs: &'a OutputWriter,
    wait_timeout: Duration,
}

impl<'a, C: FunctionsApi> Orchestrator<'a, C> {
    pub fn new(client: &'a C, outputs: &'a OutputWriter, wait_timeout: Duration) -> Self {
        Self {
            client,
            outputs,
            wait_timeout,
        }
    }

    /// Push flow: deploy under the sha identity, then move the `latest`
    /// alias to the same artifact and drop the sha-tagged registration.
    pub async fn run_push(&self, config: &Config, repository: &str, short_sha: &str) -> Result<()> {
        let sha_id = identity::sha_identity(repository, &config.function_path, short_sha);
        let artifact = self.upload(config, &sha_id).await?;

        self.delete_existing(&sha_id).await;
        self.deploy(artifact, &sha_id).await?;

        // Delete `latest` and recreate it immediately against the fresh,
        // already-validated artifact.
        let latest_id = identity::latest_identity(repository, &config.function_path);
        self.delete_existing(&latest_id).await;
        self.deploy(artifact, &latest_id).await?;

        self.delete_existing(&sha_id).await;
        Ok(())
    }

    /// Pull-request flow: one live deployment per PR branch. The stale
    /// registration is always removed first; `delete_only` stops there.
    pub async fn run_pull_request(
        &self,
        config: &Config,
        repository: &str,
        head_ref: &str,
        delete_only: bool,
    ) -> Result<()> {
        let pr_id = identity::pr_identity(repository, &config.function_path, head_ref);

        info!("Deleting potential old PR function");
        self.delete_existing(&pr_id).await;
        if delete_only {
            info!("Delete-only run, stopping after cleanup");
            return Ok(());
        }

        let artifact = self.upload(config, &pr_id).await?;
        self.deploy(artifact, &pr_id).await?;
        Ok(())
    }

    /// Poll until the platform reports Ready or the deadline passes.
    ///
    /// A timeout returns `false` and does not fail the run; a failed status
    /// lookup is fatal.
    pub async fn await_ready(&self, external_id: &str) -> Result<bool> {
        info!("Awaiting function {} to become ready", external_id);
        let start = Instant::now();
        loop {
            let status = self
                .client
                .function_status(external_id)
                .await
                .context("Failed to check function status")?;
            if status == FunctionStatus::Ready {
                return Ok(true);
            }
            if start.elapsed() >= self.wait_timeout {
                return Ok(false);
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn upload(&self, config: &Config, external_id: &str) -> Result<FileRef> {
        let file_name = identity::archive_name(external_id);
        info!("Packaging '{}'", config.function_path);
        let bytes = archive::pack_directory(Path::new(&config.function_path))?;
        info!("Uploading {} ({} bytes)", file_name, bytes.len());
        let artifact = self
            .client
            .upload_source(external_id, &file_name, bytes)
            .await
            .context("Failed to upload source archive")?;
        Ok(artifact)
    }

    /// Register the function, export the run outputs, wait for readiness.
    async fn deploy(&self, artifact: FileRef, external_id: &str) -> Result<()> {
        info!("Deploying function {}", external_id);
        let function = self
            .client
            .create_function(FunctionSpec {
                name: external_id.to_string(),
                external_id: external_id.to_string(),
                file_id: artifact.0,
            })
            .await
            .with_context(|| format!("Failed to create function '{}'", external_id))?;
        info!("Created function {} with id {}", external_id, function.id);

        self.outputs.set("functionId", &function.id.to_string())?;
        self.outputs.set("functionExternalId", &function.external_id)?;
        self.outputs.set("functionName", &function.name)?;

        if self.await_ready(external_id).await? {
            info!(
                "Successfully deployed function {} with id {}",
                external_id, function.id
            );
        } else {
            warn!(
                "Function {} (id {}) did not become ready within {:?}",
                external_id, function.id, self.wait_timeout
            );
        }
        Ok(())
    }

    /// Best-effort delete: every outcome is logged, nothing propagates.
    async fn delete_existing(&self, external_id: &str) {
        match self.client.delete_function(external_id).await {
            Ok(DeleteOutcome::Deleted) => {
                info!("Deleted function with externalId {}", external_id)
            }
            Ok(DeleteOutcome::NotFound) => {
                info!("No function registered under {}", external_id)
            }
            Err(err) => warn!("Did not delete function {}: {}", external_id, err),
        }
    }
}

/// Parse a duration string (e.g. "30s", "5m", "1h").
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.len() < 2 {
        bail!("Invalid duration '{}'. Use format like '30s', '5m', '1h'", s);
    }
    let (num_str, unit) = s.split_at(s.len() - 1);
    let num: u64 = num_str.parse().context("Invalid duration number")?;

    let duration = match unit {
        "s" => Duration::from_secs(num),
        "m" => Duration::from_secs(num * 60),
        "h" => Duration::from_secs(num * 3600),
        _ => bail!("Invalid duration unit '{}'. Use s, m, or h", unit),
    };

    Ok(duration)
}
