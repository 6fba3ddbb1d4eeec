//! In-memory repository.

use std::io::Read;
use std::path::Path;

use super::{EntryTable, Repository, dir_entry_name, track};
use crate::{Error, Password, Result, STATUS_OK};

/// A repository that keeps every entry in memory and never touches disk.
///
/// Registered under the `memory` tag; the archive path is ignored. Useful for
/// scratch archives and tests.
///
/// # Example
///
/// ```rust
/// use uniarch::repository::{MemoryRepository, Repository};
///
/// let mut repo = MemoryRepository::new();
/// repo.add_from_string("hello.txt", b"Hello").unwrap();
/// assert_eq!(repo.file_content("hello.txt").unwrap(), b"Hello");
/// ```
#[derive(Debug, Default)]
pub struct MemoryRepository {
    entries: EntryTable<Vec<u8>>,
    status: i32,
}

impl MemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self {
            entries: EntryTable::new(),
            status: STATUS_OK,
        }
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Repository for MemoryRepository {
    fn format(&self) -> &str {
        "memory"
    }

    fn add_file(&mut self, source: &Path, entry_name: &str) -> Result<()> {
        let result = std::fs::read(source).map_err(Error::from).map(|data| {
            self.entries.upsert(entry_name, data);
        });
        track(&mut self.status, result)
    }

    fn add_from_string(&mut self, entry_name: &str, content: &[u8]) -> Result<()> {
        self.entries.upsert(entry_name, content.to_vec());
        self.status = STATUS_OK;
        Ok(())
    }

    fn add_empty_dir(&mut self, entry_name: &str) -> Result<()> {
        self.entries.upsert(dir_entry_name(entry_name), Vec::new());
        self.status = STATUS_OK;
        Ok(())
    }

    fn remove_file(&mut self, entry_name: &str) -> Result<bool> {
        self.status = STATUS_OK;
        Ok(self.entries.remove(entry_name).is_some())
    }

    fn remove_matching(&mut self, predicate: &mut dyn FnMut(&str) -> bool) -> Result<usize> {
        self.status = STATUS_OK;
        Ok(self.entries.retain(|name, _| !predicate(name)))
    }

    fn file_exists(&self, entry_name: &str) -> bool {
        self.entries.contains(entry_name)
    }

    fn file_stream(&mut self, entry_name: &str) -> Result<Box<dyn Read + '_>> {
        match self.entries.get(entry_name) {
            Some(data) => {
                self.status = STATUS_OK;
                Ok(Box::new(data.as_slice()))
            }
            None => {
                let err = Error::entry_not_found(entry_name);
                self.status = err.status_code();
                Err(err)
            }
        }
    }

    fn each(&self, visitor: &mut dyn FnMut(&str)) {
        self.entries.names().for_each(visitor);
    }

    fn status(&self) -> i32 {
        self.status
    }

    fn use_password(&mut self, _password: Password) -> bool {
        false
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
