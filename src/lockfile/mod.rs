//! Lockfile subsystem: deterministic, human-diffable record of resolved
//! package versions and their integrity tags.

pub mod store;

pub use store::{integrity_tag, Lockfile, LockfileEntry, LockfileError, LockfileStore, LOCKFILE_NAME, LOCKFILE_VERSION};
