//! # uniarch
//!
//! One handle for zip, tar and gzipped tar archives.
//!
//! An [`Archive`] binds a single archive file and exposes the same operations
//! regardless of its container format: adding files, directory trees and
//! in-memory content, removing entries, listing, reading entry content, and
//! selective extraction. Formats are pluggable through the
//! [`Repository`](repository::Repository) trait and resolved by tag through a
//! [`FormatRegistry`](repository::FormatRegistry).
//!
//! ## Quick Start
//!
//! ### Building an Archive
//!
//! ```rust,no_run
//! use uniarch::{Archive, Result};
//!
//! fn main() -> Result<()> {
//!     let mut archive = Archive::zip("backup.zip")?;
//!
//!     // Entry names are composed from the current folder
//!     archive
//!         .folder("config")
//!         .add("/etc/app/app.toml")?
//!         .add_string("generated.txt", "built by uniarch")?
//!         .home()
//!         .add("./data")?;
//!
//!     // Changes are written when the archive is closed (or dropped)
//!     archive.close()
//! }
//! ```
//!
//! ### Selective Extraction
//!
//! ```rust,no_run
//! use uniarch::{Archive, ExtractFlags, Result};
//!
//! fn main() -> Result<()> {
//!     let mut archive = Archive::tgz("release.tar.gz")?;
//!
//!     // Only entries under "bin/" whose relative name starts with "tool"
//!     let result = archive
//!         .folder("bin")
//!         .extract_to("./out", &["tool"], ExtractFlags::WHITELIST)?;
//!     println!("extracted {} entries", result.entries_extracted);
//!
//!     // Everything at the root except the docs folder
//!     archive
//!         .home()
//!         .extract_to("./full", &["docs/"], ExtractFlags::BLACKLIST)?;
//!     Ok(())
//! }
//! ```
//!
//! ### Encrypted Zip Entries
//!
//! ```rust,no_run
//! # #[cfg(feature = "zip")]
//! # fn main() -> uniarch::Result<()> {
//! use uniarch::Archive;
//!
//! let mut archive = Archive::zip("secret.zip")?;
//! archive.use_password("hunter2")?;
//! archive.add_string("keys.txt", "...")?;
//! archive.close()?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "zip"))]
//! # fn main() {}
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `zip` | Yes | Zip provider (Deflate, AES-256) |
//! | `tar` | Yes | Plain tar provider |
//! | `gzip` | Yes | Gzip-compressed tar provider (includes `tar`) |
//! | `regex` | No | Regex-based listing and extraction |
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`]. Format providers also record the
//! outcome of their last operation as an integer status, available through
//! [`Archive::status`]; it is `0` after success and
//! [`Error::status_code`] after a failure.
//!
//! ## Logging
//!
//! The crate logs through the [`log`](https://docs.rs/log) facade and installs
//! no logger of its own.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires **Rust 1.85** or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive;
pub mod cursor;
pub mod error;
pub mod fs;
pub mod password;
pub mod repository;
pub mod select;

pub use archive::{Archive, ExtractOptions, ExtractResult, OverwritePolicy};
pub use cursor::FolderCursor;
pub use error::{Error, Result, STATUS_OK};
pub use fs::{Filesystem, LocalFilesystem};
pub use password::Password;
pub use repository::{Format, FormatRegistry, Repository};
pub use select::{ExtractFlags, FilterPolicy, MatchMode};

#[cfg(feature = "zip")]
#[cfg_attr(docsrs, doc(cfg(feature = "zip")))]
pub use repository::ZipRepository;

#[cfg(feature = "tar")]
#[cfg_attr(docsrs, doc(cfg(feature = "tar")))]
pub use repository::{TarCompression, TarRepository};
