//! Fuzz target for extraction path safety.
//!
//! Run with: cargo +nightly fuzz run extract_paths
//!
//! Stores entries under arbitrary names and extracts them into a scratch
//! directory nested one level inside a sentinel directory. Whatever the
//! names, nothing may be written next to the destination.

#![no_main]

use libfuzzer_sys::fuzz_target;
use uniarch::{Archive, ExtractFlags};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(temp) = tempfile::TempDir::new() else {
        return;
    };
    let dest = temp.path().join("dest");

    let Ok(mut archive) = Archive::open(temp.path().join("scratch"), "memory") else {
        return;
    };
    for name in text.split('\n').filter(|n| !n.is_empty() && !n.contains('\0')) {
        let _ = archive.add_string(name, "x");
    }

    let none: [&str; 0] = [];
    let _ = archive.extract_to(&dest, &none, ExtractFlags::BLACKLIST);

    for entry in std::fs::read_dir(temp.path()).into_iter().flatten().flatten() {
        let name = entry.file_name();
        assert!(name == "dest", "wrote outside destination: {:?}", name);
    }
});
