//! Background jobs for the launcher.
//!
//! [`JobRunner`] is the boundary between the owner of the catalog and
//! everything that may block: bulletin fetches and update downloads run
//! as tokio tasks and report back through [`JobEvent`]s, which the owner
//! drains on its own schedule. Launching stays on the caller.
//!
//! Failures and panics inside a job are reported as a failed
//! [`JobEvent::Done`]; they never reach the owner as errors.

pub mod error;
pub mod runner;
pub mod types;

pub use error::JobError;
pub use runner::{DEFAULT_NEWS_MAX_CHARS, JobRunner, MISSING_UPDATE_FIELDS, NO_NEWS_URL};
pub use types::{JobEvent, JobHandle, JobId, JobKind, Submission};
