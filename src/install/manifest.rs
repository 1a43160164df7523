//! package.json editing.
//!
//! Thin boundary wrapper: reads, creates and updates the project
//! manifest while preserving fields it does not understand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::install::InstallError;

/// The subset of package.json this tool edits, plus a passthrough for
/// everything else.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(
        default,
        rename = "devDependencies",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Reads and writes the manifest for one project directory.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join("package.json"),
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the manifest; a missing file reads as empty.
    pub fn read(&self) -> Result<Manifest, InstallError> {
        if !self.exists() {
            return Ok(Manifest::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn write(&self, manifest: &Manifest) -> Result<(), InstallError> {
        let mut formatted = serde_json::to_string_pretty(manifest)?;
        formatted.push('\n');
        fs::write(&self.path, formatted)?;
        Ok(())
    }

    /// Create a fresh manifest with sensible defaults.
    pub fn create(&self, name: &str, version: &str) -> Result<Manifest, InstallError> {
        let manifest = Manifest {
            name: Some(name.to_string()),
            version: Some(version.to_string()),
            description: Some(String::new()),
            author: Some(String::new()),
            ..Manifest::default()
        };
        self.write(&manifest)?;
        Ok(manifest)
    }

    /// Record a dependency. A package lives in exactly one of the two
    /// sections; adding to one removes it from the other.
    pub fn add_dependency(&self, name: &str, range: &str, dev: bool) -> Result<(), InstallError> {
        let mut manifest = self.read()?;
        if dev {
            manifest.dependencies.remove(name);
            manifest.dev_dependencies.insert(name.to_string(), range.to_string());
        } else {
            manifest.dev_dependencies.remove(name);
            manifest.dependencies.insert(name.to_string(), range.to_string());
        }
        self.write(&manifest)
    }

    pub fn remove_dependency(&self, name: &str) -> Result<(), InstallError> {
        let mut manifest = self.read()?;
        manifest.dependencies.remove(name);
        manifest.dev_dependencies.remove(name);
        self.write(&manifest)
    }

    /// All dependencies, optionally including dev.
    pub fn dependencies(&self, include_dev: bool) -> Result<BTreeMap<String, String>, InstallError> {
        let manifest = self.read()?;
        let mut deps = manifest.dependencies;
        if include_dev {
            deps.extend(manifest.dev_dependencies);
        }
        Ok(deps)
    }

    pub fn has_dependency(&self, name: &str) -> Result<bool, InstallError> {
        let manifest = self.read()?;
        Ok(manifest.dependencies.contains_key(name)
            || manifest.dev_dependencies.contains_key(name))
    }

    pub fn is_dev_dependency(&self, name: &str) -> Result<bool, InstallError> {
        Ok(self.read()?.dev_dependencies.contains_key(name))
    }
}
