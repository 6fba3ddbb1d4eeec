//! Opening, closing and deleting archive files.

use std::path::{Path, PathBuf};

use super::Archive;
use crate::fs::Filesystem;
use crate::repository::{Format, Repository};
use crate::{Error, Result};

impl<F: Filesystem> Archive<F> {
    /// Binds this handle to the archive at `path`.
    ///
    /// If `path` does not exist the archive is staged as new and is written
    /// when the handle is closed. A format tag is resolved before any
    /// filesystem access, so an unknown tag fails without side effects.
    ///
    /// Any archive previously bound to the handle is closed first.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownFormat`] if `format` names no registered tag.
    /// - [`Error::NotWritable`] if the archive is new and its parent
    ///   directory cannot be written to.
    /// - Any error raised by the format provider while opening the file.
    pub fn make(&mut self, path: impl AsRef<Path>, format: impl Into<Format>) -> Result<&mut Self> {
        let path = path.as_ref();
        let format = format.into();

        let factory = match &format {
            Format::Tag(tag) => Some(self.registry.resolve(tag)?),
            Format::Instance(_) => None,
        };

        if factory.is_some() && !self.fs.exists(path) {
            let parent = parent_dir(path);
            if !self.fs.is_writable(&parent) {
                return Err(Error::NotWritable { path: parent });
            }
        }

        // Closing may write the file we are about to open
        self.close()?;
        let is_new = !self.fs.exists(path);

        let repository: Box<dyn Repository> = match (format, factory) {
            (_, Some(factory)) => factory(path, is_new)?,
            (Format::Instance(repository), None) => repository,
            (Format::Tag(tag), None) => return Err(Error::UnknownFormat { tag }),
        };

        log::debug!(
            "opened {} archive {} (new: {})",
            repository.format(),
            path.display(),
            is_new
        );
        self.repository = Some(repository);
        self.file_path = Some(path.to_path_buf());
        Ok(self)
    }

    /// Commits pending changes and releases the archive.
    ///
    /// Closing a handle with no open archive is a no-op. The handle is
    /// unbound afterwards, even if the commit fails: [`file_path`] returns
    /// `None` and the handle can be bound again with [`make`](Self::make).
    ///
    /// [`file_path`]: Self::file_path
    pub fn close(&mut self) -> Result<()> {
        let path = self.file_path.take();
        let Some(mut repository) = self.repository.take() else {
            return Ok(());
        };
        let result = repository.close();
        if let Some(path) = &path {
            log::debug!("closed archive {}", path.display());
        }
        result
    }

    /// Closes the archive and removes its file from disk.
    pub fn delete(&mut self) -> Result<()> {
        let path = self.file_path.clone();
        self.close()?;
        if let Some(path) = path {
            if self.fs.exists(&path) {
                self.fs.delete(&path)?;
                log::debug!("deleted archive {}", path.display());
            }
        }
        Ok(())
    }
}

impl<F: Filesystem> Drop for Archive<F> {
    fn drop(&mut self) {
        let path = self
            .file_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        if let Err(e) = self.close() {
            log::warn!("Failed to close archive {} on drop: {}", path, e);
        }
    }
}

/// Returns the directory that will hold `path`, treating a bare file name as
/// relative to the working directory.
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
