//! Adding files, directories and in-memory content.

use std::io;
use std::path::Path;

use super::Archive;
use crate::fs::Filesystem;
use crate::{Error, Result};

impl<F: Filesystem> Archive<F> {
    /// Adds a file or a directory tree at the current folder.
    ///
    /// A file is stored under its base name. A directory is walked
    /// recursively and its files are stored under their path relative to it;
    /// the directory's own name is not part of the entry names. Empty
    /// subdirectories produce no entries.
    pub fn add(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        self.add_path(path.as_ref(), None)?;
        Ok(self)
    }

    /// Adds a file at the current folder under `rename_to`.
    ///
    /// If `path` is a directory, `rename_to` is ignored and the tree is added
    /// as with [`add`](Self::add).
    pub fn add_as(&mut self, path: impl AsRef<Path>, rename_to: &str) -> Result<&mut Self> {
        self.add_path(path.as_ref(), Some(rename_to))?;
        Ok(self)
    }

    /// Adds each path in order, as with [`add`](Self::add).
    ///
    /// Stops at the first failure; paths added before it stay in the archive.
    pub fn add_all<I, P>(&mut self, paths: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for path in paths {
            self.add_path(path.as_ref(), None)?;
        }
        Ok(self)
    }

    /// Stores `content` under `name` at the current folder.
    pub fn add_string(&mut self, name: &str, content: impl AsRef<[u8]>) -> Result<&mut Self> {
        let entry_name = self.folder.entry_name(name);
        self.repo_mut()?
            .add_from_string(&entry_name, content.as_ref())?;
        Ok(self)
    }

    /// Stores an empty directory entry `name/` at the current folder.
    pub fn add_empty_dir(&mut self, name: &str) -> Result<&mut Self> {
        let entry_name = self.folder.entry_name(name);
        self.repo_mut()?.add_empty_dir(&entry_name)?;
        Ok(self)
    }

    fn add_path(&mut self, path: &Path, rename_to: Option<&str>) -> Result<()> {
        self.repo()?;
        if self.fs.is_file(path) {
            let name = match rename_to {
                Some(name) => name.to_string(),
                None => base_file_name(path)?,
            };
            self.add_single_file(path, &name)
        } else {
            self.add_directory(path)
        }
    }

    fn add_single_file(&mut self, path: &Path, name: &str) -> Result<()> {
        let entry_name = self.folder.entry_name(name);
        log::debug!("adding {} as {}", path.display(), entry_name);
        self.repo_mut()?.add_file(path, &entry_name)
    }

    /// Walks `dir`: files first, then each subdirectory under a pushed
    /// folder segment. The cursor is restored before any error is returned.
    fn add_directory(&mut self, dir: &Path) -> Result<()> {
        for file in self.fs.files(dir)? {
            let name = base_file_name(&file)?;
            self.add_single_file(&file, &name)?;
        }

        for sub in self.fs.directories(dir)? {
            let segment = base_file_name(&sub)?;
            let saved = self.folder.clone();
            self.folder.push(&segment);
            let result = self.add_directory(&sub);
            self.folder = saved;
            result?;
        }
        Ok(())
    }
}

fn base_file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path has no file name: {}", path.display()),
            ))
        })
}
