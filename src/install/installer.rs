//! Package installation.
//!
//! Resolves package metadata from the upstream npm registry, delegates
//! the actual tree construction to the `npm` binary, and keeps the
//! local manifest and lockfile in step.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::install::manifest::ManifestStore;
use crate::lockfile::LockfileStore;

/// Upstream registry serving package metadata and tarballs.
pub const UPSTREAM_REGISTRY: &str = "https://registry.npmjs.org";

/// Errors from resolution or installation.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("lockfile error: {0}")]
    Lockfile(#[from] crate::lockfile::LockfileError),
    #[error("registry request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("package not found: {0}")]
    NotFound(String),
    #[error("npm exited with status {0}")]
    NpmFailed(std::process::ExitStatus),
}

/// Resolved view of one package version.
#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: String,
    pub tarball: String,
    pub dependencies: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct VersionMetadata {
    version: String,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    dist: DistMetadata,
}

#[derive(Deserialize)]
struct DistMetadata {
    tarball: String,
}

/// Installs packages into one project directory.
pub struct Installer {
    manifest: ManifestStore,
    lockfile: LockfileStore,
    http: reqwest::Client,
}

impl Installer {
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        let dir = project_dir.as_ref();
        Self {
            manifest: ManifestStore::new(dir),
            lockfile: LockfileStore::new(dir),
            http: reqwest::Client::new(),
        }
    }

    pub fn manifest(&self) -> &ManifestStore {
        &self.manifest
    }

    pub fn lockfile(&self) -> &LockfileStore {
        &self.lockfile
    }

    /// Resolve a package against the upstream registry.
    ///
    /// `spec` is a version or dist-tag; `None` means `latest`.
    pub async fn resolve(
        &self,
        name: &str,
        spec: Option<&str>,
    ) -> Result<ResolvedPackage, InstallError> {
        let url = format!(
            "{}/{}/{}",
            UPSTREAM_REGISTRY,
            name,
            spec.unwrap_or("latest")
        );
        tracing::debug!(package = %name, url = %url, "Resolving package");

        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(InstallError::NotFound(name.to_string()));
        }
        let metadata: VersionMetadata = response.error_for_status()?.json().await?;

        Ok(ResolvedPackage {
            name: name.to_string(),
            version: metadata.version,
            tarball: metadata.dist.tarball,
            dependencies: metadata.dependencies,
        })
    }

    /// Add one package: resolve, install via npm, then record it in the
    /// manifest and lockfile.
    pub async fn add(
        &self,
        name: &str,
        spec: Option<&str>,
        dev: bool,
    ) -> Result<ResolvedPackage, InstallError> {
        let resolved = self.resolve(name, spec).await?;
        let pinned = format!("{}@{}", resolved.name, resolved.version);

        tracing::info!(package = %pinned, dev, "Installing package");
        self.run_npm(&["install", &pinned, "--no-save"]).await?;

        self.manifest
            .add_dependency(&resolved.name, &format!("^{}", resolved.version), dev)?;
        let deps = if resolved.dependencies.is_empty() {
            None
        } else {
            Some(resolved.dependencies.clone())
        };
        self.lockfile.add_package(
            &resolved.name,
            &resolved.version,
            &resolved.tarball,
            deps,
            dev,
        )?;

        Ok(resolved)
    }

    /// Install everything the manifest lists, refreshing the lockfile.
    pub async fn install_all(&self) -> Result<usize, InstallError> {
        let deps = self.manifest.dependencies(true)?;
        if deps.is_empty() {
            tracing::info!("No dependencies to install");
            return Ok(0);
        }

        self.run_npm(&["install"]).await?;

        // The tree is already on disk at this point; a stale lockfile
        // entry is recoverable, a failed install is not.
        for (name, range) in &deps {
            let spec = range.trim_start_matches(['^', '~']);
            if let Err(e) = self.refresh_lock_entry(name, spec).await {
                tracing::warn!(package = %name, error = %e, "Lockfile entry not refreshed");
            }
        }

        Ok(deps.len())
    }

    async fn refresh_lock_entry(&self, name: &str, spec: &str) -> Result<(), InstallError> {
        let resolved = self.resolve(name, Some(spec)).await?;
        let dev = self.manifest.is_dev_dependency(name)?;
        let deps = if resolved.dependencies.is_empty() {
            None
        } else {
            Some(resolved.dependencies.clone())
        };
        self.lockfile
            .add_package(name, &resolved.version, &resolved.tarball, deps, dev)?;
        Ok(())
    }

    /// Remove a package from the tree, manifest, and lockfile.
    pub async fn remove(&self, name: &str) -> Result<(), InstallError> {
        tracing::info!(package = %name, "Removing package");
        self.run_npm(&["uninstall", name, "--no-save"]).await?;

        self.manifest.remove_dependency(name)?;
        let lock = self.lockfile.read()?;
        let versions: Vec<String> = lock
            .packages
            .iter()
            .filter(|(key, _)| {
                key.rsplit_once('@').map(|(n, _)| n == name).unwrap_or(false)
            })
            .map(|(_, entry)| entry.version.clone())
            .collect();
        for version in versions {
            self.lockfile.remove_package(name, &version)?;
        }
        Ok(())
    }

    async fn run_npm(&self, args: &[&str]) -> Result<(), InstallError> {
        let status = Command::new("npm")
            .args(args)
            .stdin(Stdio::null())
            .status()
            .await?;
        if !status.success() {
            return Err(InstallError::NpmFailed(status));
        }
        Ok(())
    }
}
