//! Extraction options and results.

use crate::select::ExtractFlags;

/// Policy for destination files that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Replace existing files.
    #[default]
    Overwrite,
    /// Leave existing files alone and count the entry as skipped.
    Skip,
    /// Fail with [`Error::FileExists`](crate::Error::FileExists).
    Error,
}

/// Options for [`Archive::extract_with`](crate::Archive::extract_with).
///
/// # Example
///
/// ```rust
/// use uniarch::{ExtractFlags, ExtractOptions, OverwritePolicy};
///
/// let options = ExtractOptions::new()
///     .flags(ExtractFlags::WHITELIST)
///     .overwrite(OverwritePolicy::Skip)
///     .preserve_modified(true);
/// assert_eq!(options.overwrite, OverwritePolicy::Skip);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Selection flags.
    pub flags: ExtractFlags,
    /// What to do when a destination file exists.
    pub overwrite: OverwritePolicy,
    /// Apply stored modification times to extracted files.
    pub preserve_modified: bool,
}

impl ExtractOptions {
    /// Creates default options: blacklist prefix matching, overwrite
    /// existing files, no timestamp preservation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the selection flags.
    pub fn flags(mut self, flags: ExtractFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the overwrite policy.
    pub fn overwrite(mut self, policy: OverwritePolicy) -> Self {
        self.overwrite = policy;
        self
    }

    /// Sets whether stored modification times are applied.
    pub fn preserve_modified(mut self, preserve: bool) -> Self {
        self.preserve_modified = preserve;
        self
    }
}

impl From<ExtractFlags> for ExtractOptions {
    fn from(flags: ExtractFlags) -> Self {
        Self::new().flags(flags)
    }
}

/// Summary of an extraction run.
#[must_use = "extraction results report how many entries were skipped"]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractResult {
    /// Entries written to the destination (files and directories).
    pub entries_extracted: usize,
    /// Entries in the current folder that were not written.
    pub entries_skipped: usize,
    /// Total file bytes written.
    pub bytes_extracted: u64,
}

impl ExtractResult {
    /// Returns true if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.entries_extracted == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::FilterPolicy;

    #[test]
    fn test_overwrite_policy_default() {
        assert_eq!(OverwritePolicy::default(), OverwritePolicy::Overwrite);
    }

    #[test]
    fn test_options_builder() {
        let opts = ExtractOptions::new()
            .flags(ExtractFlags::WHITELIST | ExtractFlags::EXACT_MATCH)
            .overwrite(OverwritePolicy::Error)
            .preserve_modified(true);

        assert_eq!(opts.flags.policy(), FilterPolicy::Include);
        assert_eq!(opts.overwrite, OverwritePolicy::Error);
        assert!(opts.preserve_modified);
    }

    #[test]
    fn test_options_from_flags() {
        let opts = ExtractOptions::from(ExtractFlags::WHITELIST);
        assert_eq!(opts.flags, ExtractFlags::WHITELIST);
        assert_eq!(opts.overwrite, OverwritePolicy::Overwrite);
        assert!(!opts.preserve_modified);
    }

    #[test]
    fn test_result_is_empty() {
        assert!(ExtractResult::default().is_empty());
        let result = ExtractResult {
            entries_extracted: 1,
            ..Default::default()
        };
        assert!(!result.is_empty());
    }
}
