//! Pluggable archive storage backends.
//!
//! A [`Repository`] owns the entries of one archive file in one concrete
//! container format. The [`Archive`](crate::Archive) handle talks to it
//! exclusively through this trait, so callers never need to know which format
//! backs a given archive.
//!
//! # Built-in Formats
//!
//! | Tag | Provider | Feature |
//! |-----|----------|---------|
//! | `zip` | [`ZipRepository`] | `zip` |
//! | `tar` | [`TarRepository`] | `tar` |
//! | `tgz` | [`TarRepository`] (gzip) | `gzip` |
//! | `memory` | [`MemoryRepository`] | always |
//!
//! # Custom Formats
//!
//! Register a factory function under a new tag:
//!
//! ```rust
//! use std::path::Path;
//! use uniarch::repository::{FormatRegistry, MemoryRepository, Repository};
//!
//! fn scratch(_path: &Path, _is_new: bool) -> uniarch::Result<Box<dyn Repository>> {
//!     Ok(Box::new(MemoryRepository::new()))
//! }
//!
//! let mut registry = FormatRegistry::with_defaults();
//! registry.register("scratch", scratch);
//! assert!(registry.resolve("SCRATCH").is_ok());
//! ```

mod memory;
mod table;

#[cfg(feature = "tar")]
mod tar_archive;
#[cfg(feature = "zip")]
mod zip_archive;

pub use memory::MemoryRepository;
pub(crate) use table::EntryTable;

#[cfg(feature = "tar")]
pub use tar_archive::{TarCompression, TarRepository};
#[cfg(feature = "zip")]
pub use zip_archive::ZipRepository;

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;

use crate::{Error, Password, Result, STATUS_OK};

/// Storage contract every archive format provider satisfies.
///
/// Entry names are full archive paths ("/"-delimited, no leading slash).
/// Directory entries end with a "/". Names are unique and enumerate in
/// insertion order; adding an existing name replaces its content in place.
///
/// Mutations may be staged in memory. They are guaranteed to reach the
/// archive file once [`close`](Self::close) returns successfully.
pub trait Repository {
    /// Returns the format tag of this provider (e.g. `"zip"`).
    fn format(&self) -> &str;

    /// Adds the file at `source` under `entry_name`.
    fn add_file(&mut self, source: &Path, entry_name: &str) -> Result<()>;

    /// Adds `content` under `entry_name`.
    fn add_from_string(&mut self, entry_name: &str, content: &[u8]) -> Result<()>;

    /// Adds an empty directory entry.
    ///
    /// A trailing "/" is appended to `entry_name` if missing.
    fn add_empty_dir(&mut self, entry_name: &str) -> Result<()>;

    /// Removes the entry named exactly `entry_name`.
    ///
    /// Returns true if an entry was removed.
    fn remove_file(&mut self, entry_name: &str) -> Result<bool>;

    /// Removes every entry whose name satisfies `predicate` and returns how
    /// many were removed.
    ///
    /// The default implementation calls [`remove_file`](Self::remove_file)
    /// once per match; providers override it to drop entries in one pass.
    fn remove_matching(&mut self, predicate: &mut dyn FnMut(&str) -> bool) -> Result<usize> {
        let mut doomed = Vec::new();
        self.each(&mut |name| {
            if predicate(name) {
                doomed.push(name.to_string());
            }
        });

        let mut removed = 0;
        for name in &doomed {
            if self.remove_file(name)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Returns true if an entry named exactly `entry_name` exists.
    fn file_exists(&self, entry_name: &str) -> bool;

    /// Returns a reader over the content of `entry_name`.
    fn file_stream(&mut self, entry_name: &str) -> Result<Box<dyn Read + '_>>;

    /// Returns the full content of `entry_name`.
    fn file_content(&mut self, entry_name: &str) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        self.file_stream(entry_name)?.read_to_end(&mut content)?;
        Ok(content)
    }

    /// Calls `visitor` once per stored entry name, in stored order.
    fn each(&self, visitor: &mut dyn FnMut(&str));

    /// Returns the stored modification time of `entry_name`, if the format
    /// records one.
    fn modified(&self, entry_name: &str) -> Option<SystemTime> {
        let _ = entry_name;
        None
    }

    /// Returns the status of the last operation: [`STATUS_OK`] or the
    /// [`Error::status_code`] of the last failure.
    fn status(&self) -> i32;

    /// Sets the password used to read (and, where supported, write)
    /// encrypted entries. Returns false if the format has no encryption.
    fn use_password(&mut self, password: Password) -> bool;

    /// Commits pending changes and releases the underlying file.
    ///
    /// Calling `close` more than once is a no-op.
    fn close(&mut self) -> Result<()>;
}

impl fmt::Debug for dyn Repository + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("format", &self.format())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Records the outcome of a repository operation in `status`.
pub(crate) fn track<T>(status: &mut i32, result: Result<T>) -> Result<T> {
    *status = match &result {
        Ok(_) => STATUS_OK,
        Err(e) => e.status_code(),
    };
    result
}

/// Ensures a directory entry name ends with "/".
pub(crate) fn dir_entry_name(entry_name: &str) -> String {
    if entry_name.ends_with('/') {
        entry_name.to_string()
    } else {
        format!("{}/", entry_name)
    }
}

/// Constructor for a format provider: `(archive path, is new archive)`.
pub type RepositoryFactory = fn(&Path, bool) -> Result<Box<dyn Repository>>;

/// Maps format tags to provider constructors.
///
/// Tags are matched case-insensitively.
#[derive(Clone)]
pub struct FormatRegistry {
    factories: Vec<(String, RepositoryFactory)>,
}

impl FormatRegistry {
    /// Creates a registry with no formats.
    pub fn empty() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Creates a registry with every built-in format enabled by the current
    /// feature set.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        #[cfg(feature = "zip")]
        registry.register("zip", |path, is_new| {
            Ok(Box::new(ZipRepository::open(path, is_new)?))
        });
        #[cfg(feature = "tar")]
        registry.register("tar", |path, is_new| {
            Ok(Box::new(TarRepository::open(path, is_new, TarCompression::None)?))
        });
        #[cfg(feature = "gzip")]
        registry.register("tgz", |path, is_new| {
            Ok(Box::new(TarRepository::open(path, is_new, TarCompression::Gzip)?))
        });
        registry.register("memory", |_, _| Ok(Box::new(MemoryRepository::new())));
        registry
    }

    /// Registers `factory` under `tag`, replacing any previous registration.
    pub fn register(&mut self, tag: &str, factory: RepositoryFactory) -> &mut Self {
        let tag = tag.to_ascii_lowercase();
        match self.factories.iter_mut().find(|(t, _)| *t == tag) {
            Some(slot) => slot.1 = factory,
            None => self.factories.push((tag, factory)),
        }
        self
    }

    /// Looks up the factory for `tag`.
    pub fn resolve(&self, tag: &str) -> Result<RepositoryFactory> {
        self.factories
            .iter()
            .find(|(t, _)| t.eq_ignore_ascii_case(tag))
            .map(|(_, factory)| *factory)
            .ok_or_else(|| Error::UnknownFormat {
                tag: tag.to_string(),
            })
    }

    /// Returns the registered tags, in registration order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(tag, _)| tag.as_str())
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tags()).finish()
    }
}

/// The format an archive handle should open: a registered tag or a provider
/// instance built by the caller.
pub enum Format {
    /// A tag resolved through the handle's [`FormatRegistry`].
    Tag(String),
    /// A ready-made provider.
    Instance(Box<dyn Repository>),
}

impl From<&str> for Format {
    fn from(tag: &str) -> Self {
        Self::Tag(tag.to_string())
    }
}

impl From<String> for Format {
    fn from(tag: String) -> Self {
        Self::Tag(tag)
    }
}

impl From<Box<dyn Repository>> for Format {
    fn from(repository: Box<dyn Repository>) -> Self {
        Self::Instance(repository)
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            Self::Instance(repository) => f.debug_tuple("Instance").field(repository).finish(),
        }
    }
}
