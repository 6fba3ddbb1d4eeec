//! Zip format provider.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{AesMode, CompressionMethod, ZipArchive, ZipWriter};

use super::{EntryTable, Repository, dir_entry_name, track};
use crate::{Error, Password, Result, STATUS_OK};

/// Where the bytes of a zip entry currently live.
#[derive(Debug)]
enum ZipContent {
    /// Stored in the archive on disk, at this index of the central directory.
    Archived(usize),
    /// Added since the archive was opened.
    Data(Vec<u8>),
    /// Empty directory added since the archive was opened.
    Directory,
}

/// Repository for `.zip` archives.
///
/// Existing entries are indexed from the central directory on open and read
/// lazily. Additions and removals are staged in memory and written on
/// [`close`](Repository::close): the new archive is assembled in a sibling
/// temporary file which then replaces the original. Untouched plain entries
/// are copied raw, without decompressing them. Untouched encrypted entries
/// are decrypted and re-encrypted with AES-256, so rewriting an archive that
/// holds them requires the password; without it the commit fails with
/// [`Error::PasswordRequired`] and the original file is left as it was.
///
/// New entries are Deflate-compressed. After
/// [`use_password`](Repository::use_password) they are also AES-256
/// encrypted, and the password is used to decrypt existing entries.
pub struct ZipRepository {
    path: PathBuf,
    source: Option<ZipArchive<BufReader<File>>>,
    entries: EntryTable<ZipContent>,
    password: Option<Password>,
    dirty: bool,
    closed: bool,
    status: i32,
}

impl ZipRepository {
    /// Opens the zip archive at `path`, or stages a new one when `is_new`.
    ///
    /// A new archive is only written to disk once it has been modified and
    /// closed.
    pub fn open(path: impl AsRef<Path>, is_new: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut entries = EntryTable::new();

        let source = if is_new {
            None
        } else {
            let mut archive = ZipArchive::new(BufReader::new(File::open(&path)?))?;
            for index in 0..archive.len() {
                let file = archive.by_index_raw(index)?;
                entries.upsert(file.name(), ZipContent::Archived(index));
            }
            Some(archive)
        };

        log::debug!(
            "Opened zip archive '{}' ({} entries, new: {})",
            path.display(),
            entries.len(),
            is_new
        );

        Ok(Self {
            path,
            source,
            entries,
            password: None,
            dirty: false,
            closed: false,
            status: STATUS_OK,
        })
    }

    /// Returns the path of the archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if there are changes not yet written to disk.
    pub fn has_pending_changes(&self) -> bool {
        self.dirty
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::NotOpen)
        } else {
            Ok(())
        }
    }

    fn stage(&mut self, entry_name: &str, content: ZipContent) -> Result<()> {
        self.ensure_open()?;
        self.entries.upsert(entry_name, content);
        self.dirty = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let temp_path = temp_path_for(&self.path);
        if let Err(e) = self.write_to(&temp_path) {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                log::warn!(
                    "Failed to clean up '{}': {}",
                    temp_path.display(),
                    cleanup
                );
            }
            return Err(e);
        }

        // Release the old archive before replacing it
        self.source = None;
        fs::rename(&temp_path, &self.path)?;
        self.dirty = false;

        log::debug!(
            "Wrote {} entries to '{}'",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    fn write_to(&mut self, temp_path: &Path) -> Result<()> {
        let mut writer = ZipWriter::new(BufWriter::new(File::create(temp_path)?));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in self.entries.iter() {
            match content {
                ZipContent::Archived(index) => {
                    let archive = self.source.as_mut().ok_or(Error::NotOpen)?;
                    let encrypted = archive.by_index_raw(*index)?.encrypted();
                    if !encrypted {
                        writer.raw_copy_file(archive.by_index_raw(*index)?)?;
                        continue;
                    }

                    // Raw copies lose the AES header
                    let password = self.password.as_ref().ok_or_else(|| {
                        Error::PasswordRequired {
                            entry_name: Some(name.to_string()),
                        }
                    })?;
                    let mut file = archive
                        .by_index_decrypt(*index, password.as_bytes())
                        .map_err(|e| with_entry_name(e.into(), name))?;
                    writer.start_file(
                        name,
                        options.with_aes_encryption(AesMode::Aes256, password.expose()),
                    )?;
                    io::copy(&mut file, &mut writer)?;
                }
                ZipContent::Data(data) => {
                    match &self.password {
                        Some(password) => writer.start_file(
                            name,
                            options.with_aes_encryption(AesMode::Aes256, password.expose()),
                        )?,
                        None => writer.start_file(name, options)?,
                    }
                    writer.write_all(data)?;
                }
                ZipContent::Directory => writer.add_directory(name, options)?,
            }
        }

        let mut out = writer.finish()?;
        out.flush()?;
        Ok(())
    }
}

/// Opens a reader for `entry_name`, borrowing only the fields it needs.
fn open_entry<'a>(
    source: &'a mut Option<ZipArchive<BufReader<File>>>,
    entries: &'a EntryTable<ZipContent>,
    password: Option<&Password>,
    entry_name: &str,
) -> Result<Box<dyn Read + 'a>> {
    match entries.get(entry_name) {
        None => Err(Error::entry_not_found(entry_name)),
        Some(ZipContent::Data(data)) => Ok(Box::new(data.as_slice())),
        Some(ZipContent::Directory) => Ok(Box::new(io::empty())),
        Some(ZipContent::Archived(index)) => {
            let archive = source.as_mut().ok_or(Error::NotOpen)?;
            let file = match password {
                Some(password) => archive.by_index_decrypt(*index, password.as_bytes()),
                None => archive.by_index(*index),
            }
            .map_err(|e| with_entry_name(e.into(), entry_name))?;
            Ok(Box::new(file))
        }
    }
}

/// Attaches the entry name to password errors raised by the zip reader.
fn with_entry_name(err: Error, entry_name: &str) -> Error {
    match err {
        Error::WrongPassword { entry_name: None } => Error::WrongPassword {
            entry_name: Some(entry_name.to_string()),
        },
        Error::PasswordRequired { entry_name: None } => Error::PasswordRequired {
            entry_name: Some(entry_name.to_string()),
        },
        Error::EntryNotFound { .. } => Error::entry_not_found(entry_name),
        other => other,
    }
}

/// Returns `<path>.tmp`, next to the archive so the final rename stays on one
/// filesystem.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

impl Repository for ZipRepository {
    fn format(&self) -> &str {
        "zip"
    }

    fn add_file(&mut self, source: &Path, entry_name: &str) -> Result<()> {
        let result = fs::read(source)
            .map_err(Error::from)
            .and_then(|data| self.stage(entry_name, ZipContent::Data(data)));
        track(&mut self.status, result)
    }

    fn add_from_string(&mut self, entry_name: &str, content: &[u8]) -> Result<()> {
        let result = self.stage(entry_name, ZipContent::Data(content.to_vec()));
        track(&mut self.status, result)
    }

    fn add_empty_dir(&mut self, entry_name: &str) -> Result<()> {
        let result = self.stage(&dir_entry_name(entry_name), ZipContent::Directory);
        track(&mut self.status, result)
    }

    fn remove_file(&mut self, entry_name: &str) -> Result<bool> {
        let result = self.ensure_open().map(|()| {
            let removed = self.entries.remove(entry_name).is_some();
            self.dirty |= removed;
            removed
        });
        track(&mut self.status, result)
    }

    fn remove_matching(&mut self, predicate: &mut dyn FnMut(&str) -> bool) -> Result<usize> {
        let result = self.ensure_open().map(|()| {
            let removed = self.entries.retain(|name, _| !predicate(name));
            self.dirty |= removed > 0;
            removed
        });
        track(&mut self.status, result)
    }

    fn file_exists(&self, entry_name: &str) -> bool {
        self.entries.contains(entry_name)
    }

    fn file_stream(&mut self, entry_name: &str) -> Result<Box<dyn Read + '_>> {
        let result = open_entry(
            &mut self.source,
            &self.entries,
            self.password.as_ref(),
            entry_name,
        );
        track(&mut self.status, result)
    }

    fn each(&self, visitor: &mut dyn FnMut(&str)) {
        self.entries.names().for_each(visitor);
    }

    fn status(&self) -> i32 {
        self.status
    }

    fn use_password(&mut self, password: Password) -> bool {
        self.password = Some(password);
        true
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.commit();
        self.closed = true;
        self.source = None;
        track(&mut self.status, result)
    }
}

impl Drop for ZipRepository {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!(
                "Failed to close zip archive '{}': {}",
                self.path.display(),
                e
            );
        }
    }
}

impl std::fmt::Debug for ZipRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipRepository")
            .field("path", &self.path)
            .field("entries", &self.entries.len())
            .field("dirty", &self.dirty)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
