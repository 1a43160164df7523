//! Project-side installation: manifest editing, upstream resolution,
//! and delegation to the `npm` binary for tree construction.

pub mod installer;
pub mod manifest;

pub use installer::{InstallError, Installer, ResolvedPackage, UPSTREAM_REGISTRY};
pub use manifest::{Manifest, ManifestStore};
