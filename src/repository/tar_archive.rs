//! Tar format provider, optionally gzip-compressed.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::{EntryTable, Repository, dir_entry_name, track};
use crate::{Error, Password, Result, STATUS_OK};

/// Compression wrapped around the tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TarCompression {
    /// Plain `.tar`.
    #[default]
    None,
    /// Gzip-compressed `.tar.gz` / `.tgz`.
    #[cfg(feature = "gzip")]
    Gzip,
}

impl TarCompression {
    fn tag(self) -> &'static str {
        match self {
            Self::None => "tar",
            #[cfg(feature = "gzip")]
            Self::Gzip => "tgz",
        }
    }
}

#[derive(Debug, Clone)]
struct TarEntry {
    data: Vec<u8>,
    modified: Option<SystemTime>,
    kind: TarKind,
}

impl TarEntry {
    fn file(data: Vec<u8>, modified: Option<SystemTime>) -> Self {
        Self {
            data,
            modified,
            kind: TarKind::File,
        }
    }

    fn directory(modified: Option<SystemTime>) -> Self {
        Self {
            data: Vec::new(),
            modified,
            kind: TarKind::Directory,
        }
    }

    fn is_listed(&self) -> bool {
        !matches!(self.kind, TarKind::Special { .. })
    }
}

#[derive(Debug, Clone)]
enum TarKind {
    File,
    Directory,
    /// Symlinks, hard links, devices and fifos. Written back verbatim on
    /// commit but never listed, read or extracted.
    Special {
        header: Box<tar::Header>,
        link: Option<PathBuf>,
    },
}

/// Repository for tar archives.
///
/// Tar has no central index, so the whole archive is read into memory on
/// open. Changes are written back on [`close`](Repository::close) through a
/// sibling temporary file. Modification times are kept per entry and exposed
/// through [`Repository::modified`]. Encryption is not supported.
///
/// Entries other than regular files and directories (symlinks, hard links,
/// devices, fifos) are hidden from listing and lookup, but they are kept and
/// written back unchanged when the archive is rewritten. Entry names are
/// stored without a leading `./`.
pub struct TarRepository {
    path: PathBuf,
    compression: TarCompression,
    entries: EntryTable<TarEntry>,
    dirty: bool,
    closed: bool,
    status: i32,
}

impl TarRepository {
    /// Opens the tar archive at `path`, or stages a new one when `is_new`.
    pub fn open(path: impl AsRef<Path>, is_new: bool, compression: TarCompression) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut entries = EntryTable::new();

        if !is_new {
            let reader = BufReader::new(File::open(&path)?);
            match compression {
                TarCompression::None => read_entries(reader, &mut entries)?,
                #[cfg(feature = "gzip")]
                TarCompression::Gzip => {
                    read_entries(flate2::read::GzDecoder::new(reader), &mut entries)?
                }
            }
        }

        log::debug!(
            "Opened {} archive '{}' ({} entries, new: {})",
            compression.tag(),
            path.display(),
            entries.len(),
            is_new
        );

        Ok(Self {
            path,
            compression,
            entries,
            dirty: false,
            closed: false,
            status: STATUS_OK,
        })
    }

    /// Returns the path of the archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the compression used for the archive file.
    pub fn compression(&self) -> TarCompression {
        self.compression
    }

    fn stage(&mut self, entry_name: &str, entry: TarEntry) -> Result<()> {
        if self.closed {
            return Err(Error::NotOpen);
        }
        self.entries.upsert(entry_name, entry);
        self.dirty = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let mut temp_name = self.path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp_path = self.path.with_file_name(temp_name);

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
        fs::rename(&temp_path, &self.path)?;
        self.dirty = false;

        log::debug!(
            "Wrote {} entries to '{}'",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    fn write_to(&self, temp_path: &Path) -> Result<()> {
        let file = BufWriter::new(File::create(temp_path)?);
        let mut out = match self.compression {
            TarCompression::None => self.write_entries(file)?,
            #[cfg(feature = "gzip")]
            TarCompression::Gzip => {
                let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
                self.write_entries(encoder)?.finish()?
            }
        };
        out.flush()?;
        Ok(())
    }

    fn write_entries<W: Write>(&self, writer: W) -> Result<W> {
        let mut builder = tar::Builder::new(writer);
        let now = unix_seconds(SystemTime::now());

        for (name, entry) in self.entries.iter() {
            if let TarKind::Special { header, link } = &entry.kind {
                let mut header = header.as_ref().clone();
                match link {
                    Some(target) => builder.append_link(&mut header, name, target)?,
                    None => {
                        header.set_size(entry.data.len() as u64);
                        builder.append_data(&mut header, name, entry.data.as_slice())?;
                    }
                }
                continue;
            }

            let mut header = tar::Header::new_gnu();
            header.set_mtime(entry.modified.map(unix_seconds).unwrap_or(now));

            if matches!(entry.kind, TarKind::Directory) {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder.append_data(&mut header, name, io::empty())?;
            } else {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_mode(0o644);
                header.set_size(entry.data.len() as u64);
                builder.append_data(&mut header, name, entry.data.as_slice())?;
            }
        }

        Ok(builder.into_inner()?)
    }
}

fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn read_entries<R: Read>(reader: R, entries: &mut EntryTable<TarEntry>) -> Result<()> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_type = entry.header().entry_type();
        let modified = entry
            .header()
            .mtime()
            .ok()
            .map(|secs| UNIX_EPOCH + Duration::from_secs(secs));
        let raw_name = entry.path()?.to_string_lossy().into_owned();
        let name = normalize_name(&raw_name);
        if name.is_empty() {
            // "./" itself
            continue;
        }

        if entry_type.is_dir() {
            entries.upsert(dir_entry_name(name), TarEntry::directory(modified));
        } else if entry_type.is_file() || entry_type.is_gnu_sparse() {
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            entries.upsert(name, TarEntry::file(data, modified));
        } else {
            log::debug!("Keeping tar entry '{}' of type {:?} unlisted", name, entry_type);
            let link = entry.link_name()?.map(|target| target.into_owned());
            let header = Box::new(entry.header().clone());
            let mut data = Vec::new();
            if link.is_none() {
                entry.read_to_end(&mut data)?;
            }
            entries.upsert(
                name,
                TarEntry {
                    data,
                    modified,
                    kind: TarKind::Special { header, link },
                },
            );
        }
    }

    Ok(())
}

/// Strips leading `./` segments, so `./docs/a.txt` is stored as `docs/a.txt`.
fn normalize_name(raw: &str) -> &str {
    let mut name = raw;
    while let Some(rest) = name.strip_prefix("./") {
        name = rest;
    }
    if name == "." { "" } else { name }
}

impl Repository for TarRepository {
    fn format(&self) -> &str {
        self.compression.tag()
    }

    fn add_file(&mut self, source: &Path, entry_name: &str) -> Result<()> {
        let result = fs::read(source)
            .and_then(|data| {
                let modified = fs::metadata(source)?.modified().ok();
                Ok(TarEntry::file(data, modified))
            })
            .map_err(Error::from)
            .and_then(|entry| self.stage(entry_name, entry));
        track(&mut self.status, result)
    }

    fn add_from_string(&mut self, entry_name: &str, content: &[u8]) -> Result<()> {
        let entry = TarEntry::file(content.to_vec(), Some(SystemTime::now()));
        let result = self.stage(entry_name, entry);
        track(&mut self.status, result)
    }

    fn add_empty_dir(&mut self, entry_name: &str) -> Result<()> {
        let entry = TarEntry::directory(Some(SystemTime::now()));
        let result = self.stage(&dir_entry_name(entry_name), entry);
        track(&mut self.status, result)
    }

    fn remove_file(&mut self, entry_name: &str) -> Result<bool> {
        if self.closed {
            return track(&mut self.status, Err(Error::NotOpen));
        }
        let removed = self.file_exists(entry_name);
        if removed {
            self.entries.remove(entry_name);
            self.dirty = true;
        }
        self.status = STATUS_OK;
        Ok(removed)
    }

    fn remove_matching(&mut self, predicate: &mut dyn FnMut(&str) -> bool) -> Result<usize> {
        if self.closed {
            return track(&mut self.status, Err(Error::NotOpen));
        }
        let removed = self
            .entries
            .retain(|name, entry| !(entry.is_listed() && predicate(name)));
        self.dirty |= removed > 0;
        self.status = STATUS_OK;
        Ok(removed)
    }

    fn file_exists(&self, entry_name: &str) -> bool {
        self.entries
            .get(entry_name)
            .is_some_and(TarEntry::is_listed)
    }

    fn file_stream(&mut self, entry_name: &str) -> Result<Box<dyn Read + '_>> {
        match self.entries.get(entry_name).filter(|e| e.is_listed()) {
            Some(entry) => {
                self.status = STATUS_OK;
                Ok(Box::new(entry.data.as_slice()))
            }
            None => track(&mut self.status, Err(Error::entry_not_found(entry_name))),
        }
    }

    fn each(&self, visitor: &mut dyn FnMut(&str)) {
        for (name, entry) in self.entries.iter() {
            if entry.is_listed() {
                visitor(name);
            }
        }
    }

    fn modified(&self, entry_name: &str) -> Option<SystemTime> {
        self.entries
            .get(entry_name)
            .filter(|e| e.is_listed())
            .and_then(|entry| entry.modified)
    }

    fn status(&self) -> i32 {
        self.status
    }

    fn use_password(&mut self, _password: Password) -> bool {
        false
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.commit();
        self.closed = true;
        track(&mut self.status, result)
    }
}

impl Drop for TarRepository {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!(
                "Failed to close tar archive '{}': {}",
                self.path.display(),
                e
            );
        }
    }
}

impl std::fmt::Debug for TarRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TarRepository")
            .field("path", &self.path)
            .field("compression", &self.compression)
            .field("entries", &self.entries.len())
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(repo: &TarRepository) -> Vec<String> {
        let mut names = Vec::new();
        repo.each(&mut |name| names.push(name.to_string()));
        names
    }

    fn round_trip(compression: TarCompression, file_name: &str) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(file_name);

        let mut repo = TarRepository::open(&path, true, compression).unwrap();
        repo.add_from_string("readme.txt", b"read me").unwrap();
        repo.add_empty_dir("assets").unwrap();
        repo.add_from_string("assets/logo.svg", b"<svg/>").unwrap();
        repo.close().unwrap();

        let mut repo = TarRepository::open(&path, false, compression).unwrap();
        assert_eq!(
            names(&repo),
            vec!["readme.txt", "assets/", "assets/logo.svg"]
        );
        assert_eq!(repo.file_content("assets/logo.svg").unwrap(), b"<svg/>");
        assert!(repo.modified("readme.txt").is_some());
    }

    #[test]
    fn test_plain_tar_round_trip() {
        round_trip(TarCompression::None, "plain.tar");
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn test_gzip_tar_round_trip() {
        round_trip(TarCompression::Gzip, "packed.tgz");
    }

    #[test]
    fn test_format_tag_follows_compression() {
        let temp = TempDir::new().unwrap();
        let repo = TarRepository::open(temp.path().join("a.tar"), true, TarCompression::None)
            .unwrap();
        assert_eq!(repo.format(), "tar");
    }

    #[test]
    fn test_add_file_keeps_mtime() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source.txt");
        fs::write(&source, b"data").unwrap();
        let when = UNIX_EPOCH + Duration::from_secs(1_500_000_000);
        filetime::set_file_mtime(&source, filetime::FileTime::from_system_time(when)).unwrap();

        let path = temp.path().join("times.tar");
        let mut repo = TarRepository::open(&path, true, TarCompression::None).unwrap();
        repo.add_file(&source, "source.txt").unwrap();
        repo.close().unwrap();

        let repo = TarRepository::open(&path, false, TarCompression::None).unwrap();
        assert_eq!(repo.modified("source.txt"), Some(when));
    }

    #[test]
    fn test_remove_rewrites_archive() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("remove.tar");

        let mut repo = TarRepository::open(&path, true, TarCompression::None).unwrap();
        repo.add_from_string("a", b"a").unwrap();
        repo.add_from_string("b", b"b").unwrap();
        repo.close().unwrap();

        let mut repo = TarRepository::open(&path, false, TarCompression::None).unwrap();
        assert!(repo.remove_file("a").unwrap());
        repo.close().unwrap();

        let repo = TarRepository::open(&path, false, TarCompression::None).unwrap();
        assert_eq!(names(&repo), vec!["b"]);
    }

    /// Writes a tar holding `real.txt` and a symlink `alias.txt` to it.
    fn tar_with_symlink(path: &Path) {
        let mut builder = tar::Builder::new(File::create(path).unwrap());

        let mut header = tar::Header::new_gnu();
        header.set_size(4);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, "real.txt", &b"real"[..])
            .unwrap();

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_mode(0o777);
        header.set_size(0);
        builder
            .append_link(&mut header, "alias.txt", "real.txt")
            .unwrap();

        builder.finish().unwrap();
    }

    #[test]
    fn test_special_entries_are_unlisted() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("links.tar");
        tar_with_symlink(&path);

        let mut repo = TarRepository::open(&path, false, TarCompression::None).unwrap();
        assert_eq!(names(&repo), vec!["real.txt"]);
        assert!(!repo.file_exists("alias.txt"));
        assert!(repo.file_content("alias.txt").unwrap_err().is_not_found());
        assert!(!repo.remove_file("alias.txt").unwrap());
        assert_eq!(repo.remove_matching(&mut |_| true).unwrap(), 1);
        assert!(names(&repo).is_empty());
    }

    #[test]
    fn test_rewrite_keeps_symlinks() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("links.tar");
        tar_with_symlink(&path);

        let mut repo = TarRepository::open(&path, false, TarCompression::None).unwrap();
        repo.add_from_string("new.txt", b"new").unwrap();
        repo.close().unwrap();

        let mut archive = tar::Archive::new(File::open(&path).unwrap());
        let mut found = Vec::new();
        for entry in archive.entries().unwrap() {
            let entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().into_owned();
            let link = entry
                .link_name()
                .unwrap()
                .map(|l| l.to_string_lossy().into_owned());
            found.push((name, entry.header().entry_type(), link));
        }

        assert_eq!(found.len(), 3);
        assert_eq!(found[0].0, "real.txt");
        assert_eq!(
            found[1],
            (
                "alias.txt".to_string(),
                tar::EntryType::Symlink,
                Some("real.txt".to_string())
            )
        );
        assert_eq!(found[2].0, "new.txt");
    }

    #[test]
    fn test_leading_dot_slash_is_stripped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dotted.tar");

        // tar::Builder normalizes paths, so write the raw names by hand
        let mut builder = tar::Builder::new(File::create(&path).unwrap());
        for (raw, entry_type, data) in [
            (&b"./"[..], tar::EntryType::Directory, &b""[..]),
            (&b"./docs/"[..], tar::EntryType::Directory, &b""[..]),
            (&b"./docs/a.txt"[..], tar::EntryType::Regular, &b"a"[..]),
        ] {
            let mut header = tar::Header::new_gnu();
            header.as_old_mut().name[..raw.len()].copy_from_slice(raw);
            header.set_entry_type(entry_type);
            header.set_mode(0o644);
            header.set_size(data.len() as u64);
            header.set_cksum();
            builder.append(&header, data).unwrap();
        }
        builder.finish().unwrap();

        let mut repo = TarRepository::open(&path, false, TarCompression::None).unwrap();
        assert_eq!(names(&repo), vec!["docs/", "docs/a.txt"]);
        assert_eq!(repo.file_content("docs/a.txt").unwrap(), b"a");
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("./a.txt"), "a.txt");
        assert_eq!(normalize_name("././a/b"), "a/b");
        assert_eq!(normalize_name("./"), "");
        assert_eq!(normalize_name("."), "");
        assert_eq!(normalize_name("a/./b"), "a/./b");
    }

    #[test]
    fn test_password_unsupported() {
        let temp = TempDir::new().unwrap();
        let mut repo =
            TarRepository::open(temp.path().join("p.tar"), true, TarCompression::None).unwrap();
        assert!(!repo.use_password(Password::new("secret")));
    }
}
