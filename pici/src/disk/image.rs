//! Image file descriptors.

use std::path::{Path, PathBuf};

/// Disk image container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskFormat {
    /// Raw byte-for-byte disk image.
    Raw,
    /// QCOW2 (QEMU Copy-On-Write v2).
    Qcow2,
}

impl DiskFormat {
    /// Format name as `qemu-img` spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiskFormat::Raw => "raw",
            DiskFormat::Qcow2 => "qcow2",
        }
    }
}

/// A disk image on the host: path plus container format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    path: PathBuf,
    format: DiskFormat,
}

impl ImageDescriptor {
    pub fn new(path: impl Into<PathBuf>, format: DiskFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn qcow2(path: impl Into<PathBuf>) -> Self {
        Self::new(path, DiskFormat::Qcow2)
    }

    pub fn raw(path: impl Into<PathBuf>) -> Self {
        Self::new(path, DiskFormat::Raw)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> DiskFormat {
        self.format
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Path rendered for a tool argument.
    pub fn arg(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}
