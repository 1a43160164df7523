//! Deterministic lockfile persistence.
//!
//! # Responsibilities
//! - Read/write `latte-lock.json`
//! - Keep keys sorted at every nesting level so that semantically equal
//!   states serialize to byte-identical files
//! - Derive integrity tags for resolved package locations
//!
//! Known limitation: integrity tags hash the resolved URL string, not the
//! fetched content, so they cannot detect tampering or mirror
//! substitution. Package fetching is delegated externally and content
//! hashing is out of scope here.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current lockfile schema version.
pub const LOCKFILE_VERSION: &str = "1.0";

/// Name of the lockfile within a project directory.
pub const LOCKFILE_NAME: &str = "latte-lock.json";

/// One resolved package, keyed by `name@version` in the lockfile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockfileEntry {
    pub version: String,
    pub resolved: String,
    pub integrity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub dev: bool,
}

fn is_false(v: &bool) -> bool {
    !v
}

/// The whole persisted lockfile.
///
/// BTreeMaps give lexicographic key order regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(rename = "lockfileVersion")]
    pub lockfile_version: String,
    pub packages: BTreeMap<String, LockfileEntry>,
}

impl Default for Lockfile {
    fn default() -> Self {
        Self {
            lockfile_version: LOCKFILE_VERSION.to_string(),
            packages: BTreeMap::new(),
        }
    }
}

/// Errors from lockfile I/O.
#[derive(Debug, Error)]
pub enum LockfileError {
    #[error("lockfile I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("lockfile parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Reads and rewrites the lockfile for one project directory.
#[derive(Debug, Clone)]
pub struct LockfileStore {
    path: PathBuf,
}

impl LockfileStore {
    /// Store for the lockfile inside `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(LOCKFILE_NAME),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the lockfile; a missing file is an empty lockfile of the
    /// current schema version, not an error.
    pub fn read(&self) -> Result<Lockfile, LockfileError> {
        if !self.exists() {
            return Ok(Lockfile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Fully re-serialize the structure. Output is stable: sorted keys,
    /// two-space indentation, trailing newline.
    pub fn write(&self, lockfile: &Lockfile) -> Result<(), LockfileError> {
        let mut formatted = serde_json::to_string_pretty(lockfile)?;
        formatted.push('\n');
        fs::write(&self.path, formatted)?;
        Ok(())
    }

    /// Add (or replace) a package entry and rewrite the file.
    pub fn add_package(
        &self,
        name: &str,
        version: &str,
        resolved: &str,
        dependencies: Option<BTreeMap<String, String>>,
        dev: bool,
    ) -> Result<(), LockfileError> {
        let mut lockfile = self.read()?;
        lockfile.packages.insert(
            format!("{name}@{version}"),
            LockfileEntry {
                version: version.to_string(),
                resolved: resolved.to_string(),
                integrity: integrity_tag(resolved),
                dependencies: dependencies.filter(|d| !d.is_empty()),
                dev,
            },
        );
        self.write(&lockfile)
    }

    /// Remove a package entry and rewrite the file.
    pub fn remove_package(&self, name: &str, version: &str) -> Result<(), LockfileError> {
        let mut lockfile = self.read()?;
        lockfile.packages.remove(&format!("{name}@{version}"));
        self.write(&lockfile)
    }

    /// Look up an entry by name and version.
    pub fn get(&self, name: &str, version: &str) -> Result<Option<LockfileEntry>, LockfileError> {
        Ok(self.read()?.packages.remove(&format!("{name}@{version}")))
    }

    pub fn contains(&self, name: &str, version: &str) -> Result<bool, LockfileError> {
        Ok(self.get(name, version)?.is_some())
    }
}

/// Deterministic integrity tag over the resolved location string
/// (see the module-level limitation note).
pub fn integrity_tag(resolved: &str) -> String {
    let digest = Sha512::digest(resolved.as_bytes());
    format!(
        "sha512-{}",
        base64::engine::general_purpose::STANDARD.encode(digest)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> (LockfileStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("latte-lock-test-{}-{}", tag, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        (LockfileStore::new(&dir), dir)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (store, dir) = temp_store("empty");
        let lockfile = store.read().unwrap();
        assert_eq!(lockfile.lockfile_version, LOCKFILE_VERSION);
        assert!(lockfile.packages.is_empty());
        fs::remove_dir_all(dir).unwrap_or_default();
    }

    #[test]
    fn round_trip_preserves_structure() {
        let (store, dir) = temp_store("roundtrip");
        store
            .add_package(
                "left-pad",
                "1.3.0",
                "https://registry.npmjs.org/left-pad/-/left-pad-1.3.0.tgz",
                Some(BTreeMap::from([("b".to_string(), "^2.0.0".to_string()),
                                     ("a".to_string(), "^1.0.0".to_string())])),
                false,
            )
            .unwrap();

        let read_back = store.read().unwrap();
        let entry = &read_back.packages["left-pad@1.3.0"];
        assert_eq!(entry.version, "1.3.0");
        assert!(entry.integrity.starts_with("sha512-"));
        let deps = entry.dependencies.as_ref().unwrap();
        assert_eq!(deps.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        fs::remove_dir_all(dir).unwrap_or_default();
    }

    #[test]
    fn repeated_writes_are_byte_identical() {
        let (store, dir) = temp_store("stable");
        store
            .add_package("zeta", "2.0.0", "https://example.com/zeta-2.0.0.tgz", None, true)
            .unwrap();
        store
            .add_package("alpha", "1.0.0", "https://example.com/alpha-1.0.0.tgz", None, false)
            .unwrap();

        let first = fs::read(dir.join(LOCKFILE_NAME)).unwrap();
        let lockfile = store.read().unwrap();
        store.write(&lockfile).unwrap();
        let second = fs::read(dir.join(LOCKFILE_NAME)).unwrap();
        assert_eq!(first, second);

        // Keys come out sorted regardless of insertion order.
        let keys: Vec<_> = lockfile.packages.keys().collect();
        assert_eq!(keys, vec!["alpha@1.0.0", "zeta@2.0.0"]);
        fs::remove_dir_all(dir).unwrap_or_default();
    }

    #[test]
    fn remove_package_deletes_entry() {
        let (store, dir) = temp_store("remove");
        store
            .add_package("left-pad", "1.3.0", "https://example.com/lp.tgz", None, false)
            .unwrap();
        assert!(store.contains("left-pad", "1.3.0").unwrap());

        store.remove_package("left-pad", "1.3.0").unwrap();
        assert!(!store.contains("left-pad", "1.3.0").unwrap());
        fs::remove_dir_all(dir).unwrap_or_default();
    }

    #[test]
    fn dev_flag_omitted_when_false() {
        let (store, dir) = temp_store("devflag");
        store
            .add_package("left-pad", "1.3.0", "https://example.com/lp.tgz", None, false)
            .unwrap();
        let raw = fs::read_to_string(dir.join(LOCKFILE_NAME)).unwrap();
        assert!(!raw.contains("\"dev\""));
        assert!(!raw.contains("\"dependencies\""));
        fs::remove_dir_all(dir).unwrap_or_default();
    }

    #[test]
    fn integrity_is_deterministic_and_location_derived() {
        let a = integrity_tag("https://example.com/a.tgz");
        assert_eq!(a, integrity_tag("https://example.com/a.tgz"));
        assert_ne!(a, integrity_tag("https://example.com/b.tgz"));
    }
}
