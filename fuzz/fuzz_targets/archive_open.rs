//! Fuzz target opening arbitrary bytes as each on-disk archive format.
//!
//! Run with: cargo +nightly fuzz run archive_open
//!
//! The first byte picks the format; the rest is written to a scratch file and
//! opened. Any entries that parse are listed and read. Errors are expected;
//! panics and hangs are not.

#![no_main]

use libfuzzer_sys::fuzz_target;
use uniarch::Archive;

const FORMATS: [&str; 3] = ["zip", "tar", "tgz"];

fuzz_target!(|data: &[u8]| {
    let Some((&selector, body)) = data.split_first() else {
        return;
    };
    let format = FORMATS[selector as usize % FORMATS.len()];

    let Ok(temp) = tempfile::TempDir::new() else {
        return;
    };
    let path = temp.path().join("input");
    if std::fs::write(&path, body).is_err() {
        return;
    }

    let Ok(mut archive) = Archive::open(&path, format) else {
        return;
    };
    if let Ok(names) = archive.list_files() {
        for name in names {
            let _ = archive.file_content(&name);
        }
    }
    // Nothing was modified, so closing must not rewrite the input
    let _ = archive.close();
});
