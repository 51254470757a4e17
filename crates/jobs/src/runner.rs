//! The job runner: spawns background work and funnels its events back to
//! the single owner of the catalog.

use std::future::Future;
use std::path::PathBuf;

use opengames_archive::is_archive;
use opengames_catalog::{GameRecord, UpdateDescriptor};
use opengames_launch::{LaunchDispatcher, LaunchOutcome, ProcessLauncher, SystemLauncher};
use opengames_net::{BulletinFetcher, Downloader, HttpConfig, build_client, truncate_chars};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::error::JobError;
use crate::types::{JobEvent, JobHandle, JobId, JobKind, Submission};

/// Bulletin text beyond this many characters is dropped.
pub const DEFAULT_NEWS_MAX_CHARS: usize = 20_000;

/// Skip reason for a record without a bulletin source.
pub const NO_NEWS_URL: &str = "No news URL.";

/// Skip reason for an update descriptor that cannot be acted on.
pub const MISSING_UPDATE_FIELDS: &str = "Update block missing 'url' or 'dest'.";

/// Sender side handed to a running job.
struct JobContext {
    id: JobId,
    events: mpsc::UnboundedSender<JobEvent>,
}

impl JobContext {
    fn progress(&self, fraction: f64) {
        let _ = self.events.send(JobEvent::Progress {
            job: self.id,
            fraction,
        });
    }

    fn status(&self, message: &str) {
        let _ = self.events.send(JobEvent::Status {
            job: self.id,
            message: message.to_string(),
        });
    }
}

/// Runs launches on the caller and everything slow on the tokio runtime.
///
/// The runner belongs to the owner. Jobs never touch owner state; they
/// report through a channel the owner drains with [`JobRunner::try_drain`]
/// or [`JobRunner::recv`]. There is no cancellation: a job the owner no
/// longer cares about runs to completion and its events are ignored.
pub struct JobRunner<L: ProcessLauncher = SystemLauncher> {
    runtime: Handle,
    events_tx: mpsc::UnboundedSender<JobEvent>,
    events_rx: mpsc::UnboundedReceiver<JobEvent>,
    dispatcher: LaunchDispatcher<L>,
    downloader: Downloader,
    bulletins: BulletinFetcher,
    news_max_chars: usize,
    next_id: u64,
}

impl<L: ProcessLauncher> JobRunner<L> {
    /// Creates a runner spawning onto `runtime`.
    pub fn new(
        runtime: Handle,
        dispatcher: LaunchDispatcher<L>,
        http: &HttpConfig,
    ) -> Result<Self, JobError> {
        let client = build_client(http)?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            runtime,
            events_tx,
            events_rx,
            dispatcher,
            downloader: Downloader::new(client.clone()),
            bulletins: BulletinFetcher::new(client, http.bulletin_timeout),
            news_max_chars: DEFAULT_NEWS_MAX_CHARS,
            next_id: 0,
        })
    }

    /// Overrides the bulletin truncation limit.
    pub fn with_news_limit(mut self, max_chars: usize) -> Self {
        self.news_max_chars = max_chars;
        self
    }

    pub fn dispatcher(&self) -> &LaunchDispatcher<L> {
        &self.dispatcher
    }

    /// Launches the record's game. Runs synchronously; launching only
    /// starts the process or handler.
    pub fn launch(&self, record: &GameRecord) -> LaunchOutcome {
        self.dispatcher
            .launch(&record.game_path, Some(record.work_dir.as_str()), &record.args)
    }

    /// Starts fetching the record's bulletin.
    ///
    /// The successful `Done` event carries the text, truncated to the
    /// configured number of characters.
    pub fn fetch_bulletin(&mut self, record: &GameRecord) -> Submission {
        let url = record.news_url.trim().to_string();
        if url.is_empty() {
            return Submission::Skipped(NO_NEWS_URL.into());
        }

        let fetcher = self.bulletins.clone();
        let max_chars = self.news_max_chars;
        self.spawn(JobKind::Bulletin, move |ctx| async move {
            ctx.status("Fetching news…");
            let text = fetcher.fetch(&url).await?;
            Ok::<_, JobError>(truncate_chars(&text, max_chars).to_string())
        })
    }

    /// Starts downloading the record's update and unpacking it when the
    /// destination is a zip and `extract_to` is set.
    pub fn run_update(&mut self, record: &GameRecord) -> Submission {
        if !record.update.is_actionable() {
            return Submission::Skipped(MISSING_UPDATE_FIELDS.into());
        }

        let downloader = self.downloader.clone();
        let update = record.update.clone();
        self.spawn(JobKind::Update, move |ctx| update_job(ctx, downloader, update))
    }

    /// Returns every event already delivered, without waiting.
    pub fn try_drain(&mut self) -> Vec<JobEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Waits for the next event.
    ///
    /// The runner keeps a sender of its own, so this only returns `None`
    /// if the channel is closed, which does not happen while it is alive.
    pub async fn recv(&mut self) -> Option<JobEvent> {
        self.events_rx.recv().await
    }

    /// Spawns `job` plus a supervisor that reports its result, error or
    /// panic as the final `Done` event.
    fn spawn<F, Fut>(&mut self, kind: JobKind, job: F) -> Submission
    where
        F: FnOnce(JobContext) -> Fut,
        Fut: Future<Output = Result<String, JobError>> + Send + 'static,
    {
        self.next_id += 1;
        let id = JobId(self.next_id);
        let ctx = JobContext {
            id,
            events: self.events_tx.clone(),
        };

        info!(job = %id, %kind, "job started");
        let task = self.runtime.spawn(job(ctx));
        let events = self.events_tx.clone();

        self.runtime.spawn(async move {
            let (success, message) = match task.await {
                Ok(Ok(message)) => {
                    info!(job = %id, %kind, "job finished");
                    (true, message)
                }
                Ok(Err(e)) => {
                    warn!(job = %id, %kind, error = %e, "job failed");
                    (false, failure_message(kind, &e))
                }
                Err(e) => {
                    error!(job = %id, %kind, error = %e, "job aborted");
                    (false, failure_message(kind, &JobError::Task(e.to_string())))
                }
            };
            let _ = events.send(JobEvent::Done {
                job: id,
                success,
                message,
            });
        });

        Submission::Started(JobHandle { id, kind })
    }
}

async fn update_job(
    ctx: JobContext,
    downloader: Downloader,
    update: UpdateDescriptor,
) -> Result<String, JobError> {
    let dest = PathBuf::from(&update.dest);
    downloader
        .download(&update.url, &dest, |f| ctx.progress(f), |s| ctx.status(s))
        .await?;

    if is_archive(&update.dest) && !update.extract_to.trim().is_empty() {
        ctx.status("Extracting…");
        let extract_to = PathBuf::from(&update.extract_to);
        let archive = dest.clone();
        tokio::task::spawn_blocking(move || opengames_archive::extract(&archive, &extract_to))
            .await
            .map_err(|e| JobError::Task(e.to_string()))??;
    }

    Ok(format!("Saved to {}", update.dest))
}

fn failure_message(kind: JobKind, error: &JobError) -> String {
    match kind {
        JobKind::Bulletin => format!("News fetch failed: {error}"),
        JobKind::Update => format!("Download failed: {error}"),
    }
}
