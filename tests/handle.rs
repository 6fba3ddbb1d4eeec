//! Archive handle lifecycle tests: opening, format resolution, closing,
//! custom filesystems and custom formats.

mod common;

use std::cell::RefCell;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::TempDir;
use uniarch::repository::MemoryRepository;
use uniarch::{
    Archive, Error, ExtractFlags, Filesystem, FormatRegistry, LocalFilesystem, Repository,
};

// =============================================================================
// Opening and format resolution
// =============================================================================

#[test]
fn test_unknown_format_fails_before_io() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.7z");

    let err = Archive::open(&path, "7z").unwrap_err();
    assert!(matches!(err, Error::UnknownFormat { ref tag } if tag == "7z"));
    assert_eq!(err.status_code(), 2);
    assert!(!path.exists());
}

#[test]
fn test_format_tags_are_case_insensitive() {
    let temp = TempDir::new().unwrap();
    let archive = Archive::open(temp.path().join("a"), "MEMORY").unwrap();
    assert_eq!(archive.archive_type().unwrap(), "memory");
}

#[test]
fn test_new_archive_in_missing_directory() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("no/such/dir/archive.zip");

    match Archive::open(&path, "memory") {
        Err(Error::NotWritable { path: parent }) => {
            assert_eq!(parent, temp.path().join("no/such/dir"));
        }
        other => panic!("Expected NotWritable, got: {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn test_new_archive_in_read_only_directory() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let locked = temp.path().join("locked");
    std::fs::create_dir(&locked).unwrap();
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

    let result = Archive::open(locked.join("archive.zip"), "memory").map(|_| ());
    let can_write = std::fs::write(locked.join("attempt"), b"x").is_ok();
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

    // Privileged users can write regardless of the mode bits
    if can_write {
        assert!(result.is_ok());
    } else {
        assert!(matches!(result, Err(Error::NotWritable { .. })));
    }
}

#[test]
fn test_existing_archive_is_opened_not_recreated() {
    for format in common::disk_formats() {
        let (_temp, path) = common::create_archive(format, &[("kept.txt", "kept")]);

        let mut archive = Archive::open(&path, format).unwrap();
        archive.add_string("added.txt", "added").unwrap();
        archive.close().unwrap();

        let archive = Archive::open(&path, format).unwrap();
        assert_eq!(
            archive.list_files().unwrap(),
            vec!["kept.txt", "added.txt"],
            "format {}",
            format
        );
    }
}

#[cfg(feature = "zip")]
#[test]
fn test_opening_garbage_reports_invalid_format() {
    let temp = TempDir::new().unwrap();
    let path = common::write_file(temp.path(), "garbage.zip", b"not an archive at all");

    let err = Archive::zip(&path).unwrap_err();
    assert!(matches!(err, Error::InvalidFormat(_) | Error::Io(_)));
}

// =============================================================================
// Closing
// =============================================================================

#[test]
fn test_close_on_never_opened_handle() {
    let mut archive = Archive::new();
    archive.close().unwrap();
    archive.close().unwrap();
    archive.delete().unwrap();
}

#[test]
fn test_operations_after_close_fail_with_not_open() {
    let mut archive = Archive::open("scratch", "memory").unwrap();
    archive.close().unwrap();

    assert!(matches!(archive.list_files(), Err(Error::NotOpen)));
    assert!(matches!(archive.file_content("x"), Err(Error::NotOpen)));
    assert!(matches!(archive.remove("x"), Err(Error::NotOpen)));
    assert!(matches!(archive.archive_type(), Err(Error::NotOpen)));
}

#[cfg(feature = "zip")]
#[test]
fn test_make_commits_previous_archive() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("first.zip");
    let second = temp.path().join("second.zip");

    let mut archive = Archive::new();
    archive.make(&first, "zip").unwrap().add_string("one.txt", "1").unwrap();
    archive.make(&second, "zip").unwrap().add_string("two.txt", "2").unwrap();

    // The first archive was written when the handle moved on
    assert!(first.exists());
    drop(archive);
    assert!(second.exists());

    let mut reopened = Archive::zip(&first).unwrap();
    assert_eq!(reopened.file_content("one.txt").unwrap(), b"1");
}

#[test]
fn test_untouched_new_archive_leaves_no_file() {
    for format in common::disk_formats() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(format!("empty.{}", format));

        let mut archive = Archive::open(&path, format).unwrap();
        archive.close().unwrap();
        assert!(!path.exists(), "format {}", format);
    }
}

// =============================================================================
// Custom formats
// =============================================================================

#[test]
fn test_repository_instance() {
    let mut repo = MemoryRepository::new();
    repo.add_from_string("preloaded.txt", b"ready").unwrap();
    let repo: Box<dyn Repository> = Box::new(repo);

    let mut archive = Archive::new();
    archive.make("anywhere", repo).unwrap();
    assert_eq!(archive.file_content("preloaded.txt").unwrap(), b"ready");
}

#[test]
fn test_custom_registry() {
    fn scratch(_: &Path, _: bool) -> uniarch::Result<Box<dyn Repository>> {
        let mut repo = MemoryRepository::new();
        repo.add_from_string("marker", b"scratch")?;
        Ok(Box::new(repo))
    }

    let mut registry = FormatRegistry::empty();
    registry.register("scratch", scratch);

    let mut archive = Archive::new().with_registry(registry);
    assert!(matches!(
        archive.make("x", "memory"),
        Err(Error::UnknownFormat { .. })
    ));

    archive.make("x", "Scratch").unwrap();
    assert_eq!(archive.file_content("marker").unwrap(), b"scratch");
}

// =============================================================================
// Custom filesystem
// =============================================================================

/// Local filesystem that records every file written through it.
#[derive(Default)]
struct RecordingFilesystem {
    written: RefCell<Vec<PathBuf>>,
}

impl Filesystem for RecordingFilesystem {
    fn exists(&self, path: &Path) -> bool {
        LocalFilesystem.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        LocalFilesystem.is_file(path)
    }

    fn is_writable(&self, path: &Path) -> bool {
        LocalFilesystem.is_writable(path)
    }

    fn make_directory(&self, path: &Path, mode: u32, recursive: bool) -> io::Result<()> {
        LocalFilesystem.make_directory(path, mode, recursive)
    }

    fn files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        LocalFilesystem.files(dir)
    }

    fn directories(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        LocalFilesystem.directories(dir)
    }

    fn put(&self, path: &Path, contents: &mut dyn Read) -> io::Result<u64> {
        self.written.borrow_mut().push(path.to_path_buf());
        LocalFilesystem.put(path, contents)
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        LocalFilesystem.delete(path)
    }

    fn set_modified(&self, path: &Path, modified: SystemTime) -> io::Result<()> {
        LocalFilesystem.set_modified(path, modified)
    }
}

#[test]
fn test_extraction_goes_through_filesystem() {
    let temp = TempDir::new().unwrap();
    let mut archive = Archive::with_filesystem(RecordingFilesystem::default());
    archive
        .make(temp.path().join("scratch"), "memory")
        .unwrap()
        .add_string("one.txt", "1")
        .unwrap()
        .add_string("two/three.txt", "3")
        .unwrap();

    let out = temp.path().join("out");
    archive
        .extract_to(&out, &["one"], ExtractFlags::WHITELIST)
        .unwrap();

    assert_eq!(
        *archive.filesystem().written.borrow(),
        vec![out.join("one.txt")]
    );
}
