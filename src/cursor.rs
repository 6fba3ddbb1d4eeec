//! Virtual folder cursor used to compose archive entry names.
//!
//! The cursor is client-side navigation state. It is never written to the
//! archive; instead, every entry name written through an
//! [`Archive`](crate::Archive) handle is prefixed with the cursor's
//! [internal path](FolderCursor::internal_path) at write time.
//!
//! Folder paths use `/` as the separator regardless of the platform and carry
//! no leading or trailing slash. The empty string is the archive root.

use std::fmt;

/// Separator between segments of an archive entry name.
pub const SEPARATOR: char = '/';

/// The current virtual folder of an archive handle.
///
/// # Examples
///
/// ```
/// use uniarch::cursor::FolderCursor;
///
/// let mut cursor = FolderCursor::new("docs");
/// assert_eq!(cursor.internal_path(), "docs/");
/// assert_eq!(cursor.entry_name("readme.md"), "docs/readme.md");
///
/// cursor.push("api");
/// assert_eq!(cursor.as_str(), "docs/api");
///
/// cursor.home();
/// assert_eq!(cursor.internal_path(), "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FolderCursor(String);

impl FolderCursor {
    /// Creates a cursor pointing at `folder`, taken verbatim.
    pub fn new(folder: impl Into<String>) -> Self {
        Self(folder.into())
    }

    /// Replaces the current folder, verbatim.
    pub fn set(&mut self, folder: impl Into<String>) {
        self.0 = folder.into();
    }

    /// Returns to the archive root.
    pub fn home(&mut self) {
        self.0.clear();
    }

    /// Descends into `segment`.
    ///
    /// At the root this makes `segment` the folder; otherwise `segment` is
    /// appended after a separator.
    pub fn push(&mut self, segment: &str) {
        if !self.0.is_empty() {
            self.0.push(SEPARATOR);
        }
        self.0.push_str(segment);
    }

    /// Returns the raw folder value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the cursor is at the archive root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the prefix applied to entry names: the folder followed by a
    /// separator, or the empty string at the root.
    pub fn internal_path(&self) -> String {
        if self.0.is_empty() {
            String::new()
        } else {
            format!("{}{}", self.0, SEPARATOR)
        }
    }

    /// Composes the full entry name for `name` inside the current folder.
    pub fn entry_name(&self, name: &str) -> String {
        let mut full = self.internal_path();
        full.push_str(name);
        full
    }

    /// Strips the internal path from `entry_name`.
    ///
    /// Returns `None` if the entry lies outside the current folder. At the
    /// root every entry is in scope and is returned unchanged.
    pub fn scope<'a>(&self, entry_name: &'a str) -> Option<&'a str> {
        if self.0.is_empty() {
            return Some(entry_name);
        }
        entry_name
            .strip_prefix(self.0.as_str())
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
    }
}

impl fmt::Display for FolderCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FolderCursor {
    fn from(folder: &str) -> Self {
        Self::new(folder)
    }
}

impl AsRef<str> for FolderCursor {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
