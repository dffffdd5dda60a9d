use std::fs;
use std::path::{Path, PathBuf};

use pici_shared::errors::{PiciError, PiciResult};
use walkdir::WalkDir;

use crate::disk::ImageDescriptor;

/// Directory structure constants
pub mod dirs {
    /// Kernel modules shipped next to the kernel, relative to the base dir
    pub const KERNEL_MODULES_DIR: &str = "lib/modules";
}

// ============================================================================
// DIST LAYOUT (persistent volume)
// ============================================================================

/// Files of the emulated device on the persistent volume, and the read-only
/// base directory they are provisioned from.
#[derive(Clone, Debug)]
pub struct DistLayout {
    dist_dir: PathBuf,
    base_dir: PathBuf,
    image_file_name: String,
    kernel_file_name: String,
    dtb_file_name: Option<String>,
}

impl DistLayout {
    pub fn new(
        dist_dir: impl Into<PathBuf>,
        base_dir: impl Into<PathBuf>,
        image_file_name: impl Into<String>,
        kernel_file_name: impl Into<String>,
    ) -> Self {
        Self {
            dist_dir: dist_dir.into(),
            base_dir: base_dir.into(),
            image_file_name: image_file_name.into(),
            kernel_file_name: kernel_file_name.into(),
            dtb_file_name: None,
        }
    }

    pub fn with_dtb(mut self, dtb_file_name: impl Into<String>) -> Self {
        self.dtb_file_name = Some(dtb_file_name.into());
        self
    }

    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    /// The qcow2 image: <dist>/<image file>
    pub fn image_path(&self) -> PathBuf {
        self.dist_dir.join(&self.image_file_name)
    }

    pub fn image(&self) -> ImageDescriptor {
        ImageDescriptor::qcow2(self.image_path())
    }

    pub fn kernel_path(&self) -> PathBuf {
        self.dist_dir.join(&self.kernel_file_name)
    }

    pub fn dtb_path(&self) -> Option<PathBuf> {
        self.dtb_file_name
            .as_ref()
            .map(|name| self.dist_dir.join(name))
    }

    /// Fail with [`PiciError::MissingVolume`] unless the dist dir exists.
    pub fn require_volume(&self) -> PiciResult<()> {
        if self.dist_dir.is_dir() {
            tracing::debug!("Volume '{}' exists", self.dist_dir.display());
            Ok(())
        } else {
            Err(PiciError::MissingVolume(self.dist_dir.clone()))
        }
    }

    /// Entries copied from the base dir, relative to both directories.
    fn base_entries(&self) -> Vec<PathBuf> {
        let mut entries = vec![
            PathBuf::from(&self.image_file_name),
            PathBuf::from(&self.kernel_file_name),
        ];
        if let Some(dtb) = &self.dtb_file_name {
            entries.push(PathBuf::from(dtb));
        }
        entries.push(PathBuf::from(dirs::KERNEL_MODULES_DIR));
        entries
    }

    /// Copy every base file missing from the dist dir.
    ///
    /// Existing files are never overwritten. Base entries that do not exist
    /// either are skipped with a warning.
    pub fn provision(&self) -> PiciResult<ProvisionReport> {
        self.require_volume()?;

        let mut report = ProvisionReport::default();
        for entry in self.base_entries() {
            let dist = self.dist_dir.join(&entry);
            if dist.exists() {
                tracing::info!("'{}' already exists", entry.display());
                report.present.push(entry);
                continue;
            }

            let base = self.base_dir.join(&entry);
            if base.is_dir() {
                tracing::info!(
                    "No '{}' provided in volume, providing default one",
                    entry.display()
                );
                copy_tree(&base, &dist)?;
            } else if base.is_file() {
                tracing::info!(
                    "No '{}' provided in volume, providing default one",
                    entry.display()
                );
                if let Some(parent) = dist.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(&base, &dist)?;
            } else {
                tracing::warn!(
                    "No '{}' in volume or in '{}'",
                    entry.display(),
                    self.base_dir.display()
                );
                continue;
            }
            report.provided.push(entry);
        }
        Ok(report)
    }
}

/// Outcome of [`DistLayout::provision`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Copied from the base dir.
    pub provided: Vec<PathBuf>,
    /// Already on the volume.
    pub present: Vec<PathBuf>,
}

/// Recursive copy following symlinks; dangling links are skipped.
fn copy_tree(src: &Path, dst: &Path) -> PiciResult<()> {
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let dangling = e
                    .io_error()
                    .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound);
                if e.depth() > 0 && dangling {
                    tracing::debug!("Skipping dangling entry: {}", e);
                    continue;
                }
                return Err(PiciError::Io(std::io::Error::other(format!(
                    "failed to walk {}: {}",
                    src.display(),
                    e
                ))));
            }
        };

        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| PiciError::Io(std::io::Error::other(e)))?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(root: &Path) -> DistLayout {
        DistLayout::new(
            root.join("dist"),
            root.join("base"),
            "distro.qcow2",
            "kernel.img",
        )
    }

    #[test]
    fn test_paths() {
        let layout = DistLayout::new("/dist", "/base", "distro.qcow2", "kernel.img")
            .with_dtb("bcm2710.dtb");
        assert_eq!(layout.image_path(), PathBuf::from("/dist/distro.qcow2"));
        assert_eq!(layout.kernel_path(), PathBuf::from("/dist/kernel.img"));
        assert_eq!(layout.dtb_path(), Some(PathBuf::from("/dist/bcm2710.dtb")));
    }

    #[test]
    fn test_require_volume() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = layout(tmp.path());
        assert!(matches!(
            layout.require_volume(),
            Err(PiciError::MissingVolume(_))
        ));
        fs::create_dir(tmp.path().join("dist")).unwrap();
        layout.require_volume().unwrap();
    }

    #[test]
    fn test_provision_copies_missing_files_only() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("base");
        let dist = tmp.path().join("dist");
        fs::create_dir_all(base.join("lib/modules/6.1.0")).unwrap();
        fs::create_dir_all(&dist).unwrap();
        fs::write(base.join("distro.qcow2"), b"base image").unwrap();
        fs::write(base.join("kernel.img"), b"base kernel").unwrap();
        fs::write(base.join("lib/modules/6.1.0/modules.dep"), b"deps").unwrap();
        fs::write(dist.join("distro.qcow2"), b"my image").unwrap();

        let report = layout(tmp.path()).provision().unwrap();

        assert_eq!(report.present, vec![PathBuf::from("distro.qcow2")]);
        assert_eq!(
            report.provided,
            vec![PathBuf::from("kernel.img"), PathBuf::from("lib/modules")]
        );
        assert_eq!(fs::read(dist.join("distro.qcow2")).unwrap(), b"my image");
        assert_eq!(fs::read(dist.join("kernel.img")).unwrap(), b"base kernel");
        assert_eq!(
            fs::read(dist.join("lib/modules/6.1.0/modules.dep")).unwrap(),
            b"deps"
        );
    }

    #[test]
    fn test_provision_skips_absent_base_entries() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("base")).unwrap();
        fs::create_dir_all(tmp.path().join("dist")).unwrap();

        let report = layout(tmp.path()).provision().unwrap();
        assert!(report.provided.is_empty());
        assert!(report.present.is_empty());
    }
}
