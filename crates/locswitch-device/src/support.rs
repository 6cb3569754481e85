//! Platform support files and their recovery
//!
//! Mounting developer services on a device requires a disk image and its
//! signature matching the device's OS version. The [`SupportFileStore`] knows
//! where those live locally; a [`SupportFileRecovery`] fetches them when they
//! are missing.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// Files that must be present for an OS version
pub const SUPPORT_FILE_NAMES: [&str; 2] =
    ["DeveloperDiskImage.dmg", "DeveloperDiskImage.dmg.signature"];

/// Acquires a missing support file
///
/// May take a long time. Returns whether the files are now available;
/// no partial state is reported.
#[trait_variant::make(SupportFileRecovery: Send)]
pub trait LocalSupportFileRecovery {
    async fn download_support_file(&self, os: &str, version: &str) -> bool;
}

/// Local directory of support files laid out as `<root>/<os>/<version>/`
#[derive(Debug, Clone)]
pub struct SupportFileStore {
    root: PathBuf,
}

impl SupportFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the files for one OS version
    pub fn version_dir(&self, os: &str, version: &str) -> PathBuf {
        self.root.join(os).join(version)
    }

    /// True when every support file exists for this OS version
    pub fn has_support_file(&self, os: &str, version: &str) -> bool {
        let dir = self.version_dir(os, version);
        SUPPORT_FILE_NAMES
            .iter()
            .all(|name| dir.join(name).is_file())
    }
}

/// Recovery that copies support files from a mirror directory into the store
///
/// The mirror has the same `<os>/<version>/` layout as the store.
#[derive(Debug, Clone)]
pub struct MirrorRecovery {
    mirror: SupportFileStore,
    store: SupportFileStore,
}

impl MirrorRecovery {
    pub fn new(mirror: impl Into<PathBuf>, store: SupportFileStore) -> Self {
        Self {
            mirror: SupportFileStore::new(mirror),
            store,
        }
    }

    async fn copy_files(&self, os: &str, version: &str) -> std::io::Result<()> {
        let from = self.mirror.version_dir(os, version);
        let to = self.store.version_dir(os, version);
        tokio::fs::create_dir_all(&to).await?;

        for name in SUPPORT_FILE_NAMES {
            let bytes = tokio::fs::copy(from.join(name), to.join(name)).await?;
            debug!("Copied {} ({} bytes) into {}", name, bytes, to.display());
        }
        Ok(())
    }
}

impl SupportFileRecovery for MirrorRecovery {
    async fn download_support_file(&self, os: &str, version: &str) -> bool {
        if self.store.has_support_file(os, version) {
            return true;
        }
        if !self.mirror.has_support_file(os, version) {
            warn!(
                "No support files for {} {} in mirror {}",
                os,
                version,
                self.mirror.root().display()
            );
            return false;
        }

        info!("Fetching support files for {} {}", os, version);
        match self.copy_files(os, version).await {
            Ok(()) => self.store.has_support_file(os, version),
            Err(e) => {
                warn!("Failed to fetch support files for {} {}: {}", os, version, e);
                // Do not leave a half-copied version directory behind
                let _ = tokio::fs::remove_dir_all(self.store.version_dir(os, version)).await;
                false
            }
        }
    }
}
