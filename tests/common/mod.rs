//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use uniarch::Archive;

/// Writes `content` to `dir/relative`, creating parent directories.
pub fn write_file(dir: &Path, relative: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Creates a source tree used by the directory-walk tests:
///
/// ```text
/// root.txt
/// nested/inner.txt
/// nested/deeper/leaf.txt
/// empty/
/// ```
pub fn create_source_tree(dir: &Path) {
    write_file(dir, "root.txt", b"root");
    write_file(dir, "nested/inner.txt", b"inner");
    write_file(dir, "nested/deeper/leaf.txt", b"leaf");
    fs::create_dir_all(dir.join("empty")).expect("Failed to create empty directory");
}

/// Returns every file under `dir` as sorted "/"-separated relative paths.
pub fn list_tree(dir: &Path) -> Vec<String> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in fs::read_dir(dir).expect("Failed to read directory") {
            let path = entry.expect("Failed to read entry").path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let relative = path.strip_prefix(base).expect("Path outside base");
                let parts: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(parts.join("/"));
            }
        }
    }

    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}

/// Creates an archive of the given format in a fresh temp directory and
/// stores one string entry per `(name, content)` pair. The archive is closed
/// so its content is on disk.
pub fn create_archive(format: &str, entries: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let path = temp.path().join(format!("test.{}", format));

    let mut archive = Archive::open(&path, format).expect("Failed to open archive");
    for (name, content) in entries {
        archive
            .add_string(name, content)
            .expect("Failed to add entry");
    }
    archive.close().expect("Failed to close archive");

    (temp, path)
}

/// Formats with an on-disk representation, as enabled by the feature set.
pub fn disk_formats() -> Vec<&'static str> {
    let mut formats = Vec::new();
    if cfg!(feature = "zip") {
        formats.push("zip");
    }
    if cfg!(feature = "tar") {
        formats.push("tar");
    }
    if cfg!(feature = "gzip") {
        formats.push("tgz");
    }
    formats
}
