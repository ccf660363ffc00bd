use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::types::{DownloadTask, FetchError, GatewayError, TaskOutcome, TaskReport};

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Fixed worker count; archives are large, so this bounds both sockets
    /// and disk pressure.
    pub concurrency: usize,
    pub connect_timeout: Duration,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            concurrency: 6,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Create the output directory if missing and probe that it is writable.
pub fn ensure_output_dir(dir: &Path) -> Result<(), GatewayError> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(GatewayError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        std::fs::create_dir_all(dir).map_err(|err| GatewayError::OutputDir(err.to_string()))?;
    }
    tempfile::NamedTempFile::new_in(dir)
        .map_err(|err| GatewayError::OutputDir(format!("not writable: {err}")))?;
    Ok(())
}

/// Fixed-size pool of archive fetchers.
///
/// Tasks are independent: one failure is logged and reported, never
/// propagated to its siblings, and nothing is retried. Re-running against
/// the same directory skips archives that already landed.
pub struct DownloadPool {
    client: reqwest::Client,
    permits: Arc<Semaphore>,
    tasks: JoinSet<TaskReport>,
}

impl DownloadPool {
    pub fn new(settings: DownloadSettings) -> Result<Self, FetchError> {
        // No overall request timeout here: a multi-hundred-megabyte archive
        // legitimately takes a long time.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| FetchError::Network(err.to_string()))?;
        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(settings.concurrency.max(1))),
            tasks: JoinSet::new(),
        })
    }

    /// Queue one archive. Returns immediately; the fetch starts as soon as a
    /// worker permit frees up.
    pub fn submit(&mut self, task: DownloadTask) {
        let client = self.client.clone();
        let permits = Arc::clone(&self.permits);
        self.tasks.spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return TaskReport {
                        outcome: TaskOutcome::Failed("worker pool closed".to_string()),
                        task,
                    }
                }
            };
            let outcome = run_task(&client, &task).await;
            TaskReport { task, outcome }
        });
    }

    /// Wait for every queued task and collect the reports, in completion
    /// order.
    pub async fn finish(mut self) -> Vec<TaskReport> {
        let mut reports = Vec::new();
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(err) => warn!("download worker panicked: {err}"),
            }
        }
        reports
    }
}

async fn run_task(client: &reqwest::Client, task: &DownloadTask) -> TaskOutcome {
    if task.output_path.exists() {
        debug!("{} already present, skipping", task.output_path.display());
        return TaskOutcome::Skipped;
    }
    match stream_to_disk(client, &task.url, &task.output_path).await {
        Ok(bytes) => {
            info!("downloaded {} ({bytes} bytes)", task.output_path.display());
            TaskOutcome::Downloaded
        }
        Err(reason) => {
            warn!("download of {} failed: {reason}", task.output_path.display());
            TaskOutcome::Failed(reason)
        }
    }
}

/// Stream the body into `{path}.part`, then rename. A crashed or failed
/// fetch leaves only the part file behind, so a re-run fetches it again
/// instead of trusting a truncated archive.
async fn stream_to_disk(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
) -> Result<u64, String> {
    let part = part_path(path);
    let written = match write_part(client, url, &part).await {
        Ok(written) => written,
        Err(reason) => {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(reason);
        }
    };
    tokio::fs::rename(&part, path)
        .await
        .map_err(|err| err.to_string())?;
    Ok(written)
}

async fn write_part(client: &reqwest::Client, url: &str, part: &Path) -> Result<u64, String> {
    let response = client.get(url).send().await.map_err(|err| err.to_string())?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("http status {status}"));
    }

    let mut file = tokio::fs::File::create(part)
        .await
        .map_err(|err| err.to_string())?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|err| err.to_string())?;
        file.write_all(&chunk)
            .await
            .map_err(|err| err.to_string())?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|err| err.to_string())?;
    file.sync_all().await.map_err(|err| err.to_string())?;
    Ok(written)
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}
