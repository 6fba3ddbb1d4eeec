//! The archive handle.
//!
//! [`Archive`] is the façade callers work with. It binds one open
//! [`Repository`], keeps the virtual folder cursor, and routes raw byte I/O
//! through a [`Filesystem`].
//!
//! # Example
//!
//! ```rust,no_run
//! use uniarch::{Archive, ExtractFlags};
//!
//! let mut archive = Archive::zip("site.zip")?;
//! archive
//!     .folder("public")
//!     .add("index.html")?
//!     .add("assets")?
//!     .home()
//!     .add_string("VERSION", "1.0.0")?;
//!
//! for name in archive.list_files()? {
//!     println!("{}", name);
//! }
//!
//! archive.folder("public");
//! archive.extract_to("./out", &["assets/"], ExtractFlags::WHITELIST)?;
//! archive.close()?;
//! # Ok::<(), uniarch::Error>(())
//! ```

mod add;
mod extraction;
mod open;
mod options;
mod remove;

pub use options::{ExtractOptions, ExtractResult, OverwritePolicy};

use std::path::{Path, PathBuf};

use crate::cursor::FolderCursor;
use crate::fs::{Filesystem, LocalFilesystem};
use crate::repository::{FormatRegistry, Repository};
use crate::{Error, Password, Result};

/// A handle on one open archive file.
///
/// The handle owns at most one [`Repository`]. It is closed explicitly with
/// [`close`](Self::close) or [`delete`](Self::delete), or automatically when
/// the handle is dropped.
///
/// Most methods return `&mut Self` so calls can be chained.
pub struct Archive<F: Filesystem = LocalFilesystem> {
    file_path: Option<PathBuf>,
    folder: FolderCursor,
    repository: Option<Box<dyn Repository>>,
    fs: F,
    registry: FormatRegistry,
}

impl Archive<LocalFilesystem> {
    /// Creates a handle with no open archive, backed by the local disk.
    pub fn new() -> Self {
        Self::with_filesystem(LocalFilesystem)
    }

    /// Opens (or stages creation of) the archive at `path`.
    ///
    /// `format` is a registered tag such as `"zip"` or a ready-made
    /// [`Repository`] boxed into a [`Format`](crate::repository::Format).
    pub fn open(
        path: impl AsRef<Path>,
        format: impl Into<crate::repository::Format>,
    ) -> Result<Self> {
        let mut archive = Self::new();
        archive.make(path, format)?;
        Ok(archive)
    }

    /// Opens or creates a zip archive.
    #[cfg(feature = "zip")]
    pub fn zip(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, "zip")
    }

    /// Opens or creates a plain tar archive.
    #[cfg(feature = "tar")]
    pub fn tar(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, "tar")
    }

    /// Opens or creates a gzip-compressed tar archive.
    #[cfg(feature = "gzip")]
    pub fn tgz(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(path, "tgz")
    }
}

impl Default for Archive<LocalFilesystem> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Filesystem> Archive<F> {
    /// Creates a handle with no open archive that performs its filesystem
    /// work through `fs`.
    pub fn with_filesystem(fs: F) -> Self {
        Self {
            file_path: None,
            folder: FolderCursor::default(),
            repository: None,
            fs,
            registry: FormatRegistry::with_defaults(),
        }
    }

    /// Replaces the format registry used by [`make`](Self::make).
    pub fn with_registry(mut self, registry: FormatRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Returns the format registry, for registering additional formats.
    pub fn registry_mut(&mut self) -> &mut FormatRegistry {
        &mut self.registry
    }

    /// Returns the filesystem provider.
    pub fn filesystem(&self) -> &F {
        &self.fs
    }

    /// Returns the path of the open archive, if any.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Returns true if an archive is open.
    pub fn is_open(&self) -> bool {
        self.repository.is_some()
    }

    /// Returns the open repository, if any.
    pub fn repository(&self) -> Option<&dyn Repository> {
        self.repository.as_deref()
    }

    fn repo(&self) -> Result<&dyn Repository> {
        self.repository.as_deref().ok_or(Error::NotOpen)
    }

    fn repo_mut(&mut self) -> Result<&mut (dyn Repository + 'static)> {
        self.repository.as_deref_mut().ok_or(Error::NotOpen)
    }

    // ------------------------------------------------------------------
    // Folder navigation
    // ------------------------------------------------------------------

    /// Sets the current virtual folder, verbatim.
    ///
    /// Subsequent adds store entries under this folder and extraction is
    /// scoped to it.
    pub fn folder(&mut self, path: impl Into<String>) -> &mut Self {
        self.folder.set(path);
        self
    }

    /// Returns to the archive root.
    pub fn home(&mut self) -> &mut Self {
        self.folder.home();
        self
    }

    /// Returns the raw current folder value ("" at the root).
    pub fn current_folder_path(&self) -> &str {
        self.folder.as_str()
    }

    /// Returns the entry-name prefix for the current folder.
    pub fn internal_path(&self) -> String {
        self.folder.internal_path()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Returns every entry name, in archive order.
    ///
    /// The current folder does not filter the listing.
    pub fn list_files(&self) -> Result<Vec<String>> {
        let repository = self.repo()?;
        let mut names = Vec::new();
        repository.each(&mut |name| names.push(name.to_string()));
        Ok(names)
    }

    /// Returns the entry names matching a regular expression, in archive
    /// order.
    #[cfg(feature = "regex")]
    pub fn list_files_matching(&self, pattern: &str) -> Result<Vec<String>> {
        let regex = compile_regex(pattern)?;
        let mut names = self.list_files()?;
        names.retain(|name| regex.is_match(name));
        Ok(names)
    }

    /// Returns the content of the entry named exactly `name`.
    ///
    /// # Errors
    ///
    /// [`Error::EntryNotFound`] if no such entry exists.
    pub fn file_content(&mut self, name: &str) -> Result<Vec<u8>> {
        let repository = self.repo_mut()?;
        if !repository.file_exists(name) {
            return Err(Error::entry_not_found(name));
        }
        repository.file_content(name)
    }

    /// Returns true if an entry named exactly `name` exists.
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.repo()?.file_exists(name))
    }

    /// Returns the repository status code (0 when the last operation
    /// succeeded).
    pub fn status(&self) -> Result<i32> {
        Ok(self.repo()?.status())
    }

    /// Returns the format tag of the open archive.
    pub fn archive_type(&self) -> Result<&str> {
        Ok(self.repo()?.format())
    }

    /// Sets the password for encrypted entries.
    ///
    /// Returns false if the archive format does not support encryption.
    pub fn use_password(&mut self, password: impl Into<Password>) -> Result<bool> {
        Ok(self.repo_mut()?.use_password(password.into()))
    }
}

impl<F: Filesystem> std::fmt::Debug for Archive<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("file_path", &self.file_path)
            .field("folder", &self.folder)
            .field("repository", &self.repository)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "regex")]
fn compile_regex(pattern: &str) -> Result<regex::Regex> {
    regex::Regex::new(pattern).map_err(|e| Error::InvalidRegex {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}
