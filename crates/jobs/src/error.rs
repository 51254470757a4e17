//! Job error types.

/// Errors a job can fail with. They never leave the job; the runner turns
/// them into a failed [`JobEvent::Done`](crate::JobEvent::Done).
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("{0}")]
    Net(#[from] opengames_net::NetError),

    #[error("{0}")]
    Archive(#[from] opengames_archive::ArchiveError),

    #[error("task failed: {0}")]
    Task(String),
}
