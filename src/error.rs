//! The crate-wide [`Error`] type and its [`Result<T>`] alias.
//!
//! Every failure an [`Archive`](crate::Archive) handle or a format provider
//! can report is a variant of [`Error`]. Providers additionally remember the
//! [`status_code`](Error::status_code) of their last failure.
//!
//! # Error Handling
//!
//! A missing entry only fails the call that asked for it:
//!
//! ```rust,no_run
//! use uniarch::{Archive, Error};
//!
//! fn read_config(path: &str) -> uniarch::Result<Vec<u8>> {
//!     let mut archive = Archive::zip(path)?;
//!     match archive.file_content("config.json") {
//!         Ok(bytes) => Ok(bytes),
//!         Err(Error::EntryNotFound { path }) => {
//!             eprintln!("{} has no {}", archive.file_path().unwrap().display(), path);
//!             Ok(Vec::new())
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::io;
use std::path::PathBuf;

/// Status code reported by [`Repository::status`] when the last operation
/// succeeded.
///
/// [`Repository::status`]: crate::repository::Repository::status
pub const STATUS_OK: i32 = 0;

/// The main error type for archive operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io], [`NotWritable`][Self::NotWritable] | File system operations |
/// | Format | [`UnknownFormat`][Self::UnknownFormat], [`InvalidFormat`][Self::InvalidFormat] | Bad tag or archive data |
/// | Lookup | [`EntryNotFound`][Self::EntryNotFound], [`NotOpen`][Self::NotOpen] | Missing entry or archive |
/// | Security | [`WrongPassword`][Self::WrongPassword], [`PathTraversal`][Self::PathTraversal] | Security checks |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A filesystem operation failed.
    ///
    /// This is also how a failed directory creation during extraction is
    /// reported. Extraction stops at the first such failure; files already
    /// written stay on disk.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A new archive cannot be created because its parent directory is not
    /// writable (or does not exist).
    #[error("Cannot create archive in {}: directory is not writable", path.display())]
    NotWritable {
        /// The directory that would hold the new archive.
        path: PathBuf,
    },

    /// The format tag does not name a registered format provider.
    ///
    /// This is raised by the [`FormatRegistry`](crate::repository::FormatRegistry)
    /// before any I/O happens against the archive path.
    #[error("Unknown archive format: {tag}")]
    UnknownFormat {
        /// The tag that was looked up.
        tag: String,
    },

    /// The archive data is invalid or could not be decoded by the provider.
    #[error("Invalid archive format: {0}")]
    InvalidFormat(String),

    /// The requested entry does not exist in the archive.
    ///
    /// This error only affects the call that raised it; the archive stays
    /// usable.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use uniarch::{Archive, Error};
    ///
    /// let mut archive = Archive::zip("data.zip")?;
    /// if let Err(Error::EntryNotFound { path }) = archive.file_content("missing.txt") {
    ///     eprintln!("Entry not found: {}", path);
    /// }
    /// # Ok::<(), Error>(())
    /// ```
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The entry name that was not found.
        path: String,
    },

    /// The handle has no open archive.
    #[error("No archive is open")]
    NotOpen,

    /// The password is incorrect.
    #[error("Wrong password{}", entry_name.as_deref().map(|n| format!(" for entry '{}'", n)).unwrap_or_default())]
    WrongPassword {
        /// The entry where the wrong password was detected (if known).
        entry_name: Option<String>,
    },

    /// An entry is encrypted but no password was supplied.
    #[error("Password required{}", entry_name.as_deref().map(|n| format!(" for entry '{}'", n)).unwrap_or_default())]
    PasswordRequired {
        /// The encrypted entry (if known).
        entry_name: Option<String>,
    },

    /// Path traversal detected while extracting an entry.
    ///
    /// Raised for entry names that are absolute or contain a `..` segment,
    /// before anything is written for that entry.
    #[error("Path traversal detected in entry: {path}")]
    PathTraversal {
        /// The offending entry name (relative to the current folder).
        path: String,
    },

    /// A destination file already exists and the overwrite policy forbids
    /// replacing it.
    #[error("File already exists: {}", path.display())]
    FileExists {
        /// The destination path.
        path: PathBuf,
    },

    /// An invalid regular expression pattern was provided.
    #[cfg(feature = "regex")]
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegex {
        /// The invalid regex pattern.
        pattern: String,
        /// Description of why the pattern is invalid.
        reason: String,
    },
}

impl Error {
    /// Returns the integer status code for this error.
    ///
    /// | Code | Meaning |
    /// |------|---------|
    /// | 0 | OK ([`STATUS_OK`]) |
    /// | 1 | I/O failure or not-writable target |
    /// | 2 | Invalid or unknown format |
    /// | 3 | Entry not found |
    /// | 4 | Wrong or missing password |
    /// | 5 | Unsafe path or existing destination |
    /// | 9 | Anything else |
    pub fn status_code(&self) -> i32 {
        match self {
            Self::Io(_) | Self::NotWritable { .. } => 1,
            Self::UnknownFormat { .. } | Self::InvalidFormat(_) => 2,
            Self::EntryNotFound { .. } => 3,
            Self::WrongPassword { .. } | Self::PasswordRequired { .. } => 4,
            Self::PathTraversal { .. } | Self::FileExists { .. } => 5,
            _ => 9,
        }
    }

    /// Returns true if this error reports a missing entry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntryNotFound { .. })
    }

    /// Returns the entry name associated with this error, if any.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Self::EntryNotFound { path } | Self::PathTraversal { path } => Some(path),
            Self::WrongPassword { entry_name } | Self::PasswordRequired { entry_name } => {
                entry_name.as_deref()
            }
            _ => None,
        }
    }

    /// Creates an [`Error::EntryNotFound`] for the given entry name.
    pub fn entry_not_found(path: impl Into<String>) -> Self {
        Self::EntryNotFound { path: path.into() }
    }
}

#[cfg(feature = "zip")]
impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        use zip::result::ZipError;

        match err {
            ZipError::Io(e) => Self::Io(e),
            ZipError::InvalidPassword => Self::WrongPassword { entry_name: None },
            ZipError::UnsupportedArchive(msg) if msg == ZipError::PASSWORD_REQUIRED => {
                Self::PasswordRequired { entry_name: None }
            }
            ZipError::FileNotFound => Self::EntryNotFound {
                path: String::new(),
            },
            other => Self::InvalidFormat(other.to_string()),
        }
    }
}

/// A specialized Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
