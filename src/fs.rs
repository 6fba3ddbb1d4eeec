//! Filesystem access used by archive handles.
//!
//! The [`Archive`](crate::Archive) handle never touches the disk directly for
//! its own bookkeeping: existence checks, directory listing, directory
//! creation and extracted-file writes all go through a [`Filesystem`]
//! implementation. [`LocalFilesystem`] is the default and maps every call to
//! `std::fs`.
//!
//! Format providers read and write the archive file itself and are not routed
//! through this trait.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

/// Default mode for directories created during extraction.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Filesystem operations consumed by an archive handle.
pub trait Filesystem {
    /// Returns true if `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if `path` is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Returns true if `path` exists and the current process can write to
    /// it (for a directory: create files inside it).
    fn is_writable(&self, path: &Path) -> bool;

    /// Creates a directory.
    ///
    /// With `recursive`, missing parents are created and an existing
    /// directory is not an error. `mode` is applied on Unix platforms.
    fn make_directory(&self, path: &Path, mode: u32, recursive: bool) -> io::Result<()>;

    /// Lists the regular files directly inside `dir`, sorted by name.
    fn files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Lists the directories directly inside `dir`, sorted by name.
    ///
    /// Directory walks recurse into every returned path, so implementations
    /// must not return anything that leads back to an ancestor.
    fn directories(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Writes everything from `contents` to `path`, replacing any existing
    /// file, and returns the number of bytes written.
    fn put(&self, path: &Path, contents: &mut dyn Read) -> io::Result<u64>;

    /// Deletes the file at `path`.
    fn delete(&self, path: &Path) -> io::Result<()>;

    /// Sets the modification time of `path`.
    ///
    /// The default implementation does nothing.
    fn set_modified(&self, path: &Path, modified: SystemTime) -> io::Result<()> {
        let _ = (path, modified);
        Ok(())
    }
}

/// [`Filesystem`] backed by the local disk.
///
/// Symbolic links to files are listed as files. Symbolic links to
/// directories are not followed, so a link cycle cannot make a walk recurse
/// forever.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    fn list(dir: &Path, want_dirs: bool) -> io::Result<Vec<PathBuf>> {
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        let mut paths = Vec::new();
        for entry in walker {
            let entry = entry?;
            let file_type = entry.file_type();
            let keep = if want_dirs {
                file_type.is_dir()
            } else if file_type.is_symlink() {
                entry.path().is_file()
            } else {
                file_type.is_file()
            };

            if keep {
                paths.push(entry.into_path());
            } else if want_dirs && file_type.is_symlink() && entry.path().is_dir() {
                log::debug!("not following directory link {}", entry.path().display());
            }
        }
        Ok(paths)
    }
}

impl Filesystem for LocalFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_writable(&self, path: &Path) -> bool {
        match fs::metadata(path) {
            // Mode bits ignore ownership
            Ok(meta) if meta.is_dir() => tempfile::tempfile_in(path).is_ok(),
            Ok(_) => OpenOptions::new().write(true).open(path).is_ok(),
            Err(_) => false,
        }
    }

    fn make_directory(&self, path: &Path, mode: u32, recursive: bool) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(recursive);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;
        builder.create(path)
    }

    fn files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        Self::list(dir, false)
    }

    fn directories(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        Self::list(dir, true)
    }

    fn put(&self, path: &Path, contents: &mut dyn Read) -> io::Result<u64> {
        let mut writer = BufWriter::new(File::create(path)?);
        let written = io::copy(contents, &mut writer)?;
        writer.flush()?;
        Ok(written)
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn set_modified(&self, path: &Path, modified: SystemTime) -> io::Result<()> {
        filetime::set_file_mtime(path, filetime::FileTime::from_system_time(modified))
    }
}
