//! Job identifiers and the events jobs send to their owner.

use std::fmt;

/// Identifier of a submitted job, unique within one [`JobRunner`](crate::JobRunner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Fetch and truncate a record's bulletin.
    Bulletin,
    /// Download a record's update and unpack it if it is an archive.
    Update,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Bulletin => f.write_str("bulletin"),
            JobKind::Update => f.write_str("update"),
        }
    }
}

/// Returned for a job that was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobHandle {
    pub id: JobId,
    pub kind: JobKind,
}

/// Outcome of asking the runner for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The job is running; its events carry this handle's id.
    Started(JobHandle),
    /// The record lacks what the job needs. The reason is meant for the user.
    Skipped(String),
}

impl Submission {
    /// The handle, if the job was started.
    pub fn handle(&self) -> Option<JobHandle> {
        match self {
            Submission::Started(handle) => Some(*handle),
            Submission::Skipped(_) => None,
        }
    }
}

/// Event emitted by a running job.
///
/// Every started job ends with exactly one [`JobEvent::Done`].
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// Fraction complete in `0.0..=1.0`. Only sent when the total is known.
    Progress { job: JobId, fraction: f64 },
    /// Short human-readable phase change.
    Status { job: JobId, message: String },
    /// Final result. For a successful bulletin job `message` is the text.
    Done {
        job: JobId,
        success: bool,
        message: String,
    },
}

impl JobEvent {
    /// The job this event belongs to.
    pub fn job(&self) -> JobId {
        match self {
            JobEvent::Progress { job, .. }
            | JobEvent::Status { job, .. }
            | JobEvent::Done { job, .. } => *job,
        }
    }

    /// Returns `true` for the terminal event.
    pub fn is_done(&self) -> bool {
        matches!(self, JobEvent::Done { .. })
    }
}
