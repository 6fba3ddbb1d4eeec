//! Selective extraction to the filesystem.

use std::path::{Component, Path, PathBuf};

use super::{Archive, ExtractOptions, ExtractResult, OverwritePolicy};
use crate::fs::{DEFAULT_DIR_MODE, Filesystem};
use crate::select::ExtractFlags;
use crate::{Error, Result};

impl<F: Filesystem> Archive<F> {
    /// Extracts the entries of the current folder into `dest`.
    ///
    /// Entry names are taken relative to the current folder; entries outside
    /// it are ignored. Each relative name is compared with `selectors` as
    /// directed by `flags` (see [`ExtractFlags`]). `dest` is created if
    /// missing, along with any intermediate directories.
    ///
    /// # Errors
    ///
    /// - [`Error::PathTraversal`] if a relative name would escape `dest`.
    /// - [`Error::Io`] if a directory or file cannot be written. Entries
    ///   already extracted are left in place.
    pub fn extract_to<S: AsRef<str>>(
        &mut self,
        dest: impl AsRef<Path>,
        selectors: &[S],
        flags: ExtractFlags,
    ) -> Result<ExtractResult> {
        self.extract_with(dest, selectors, &ExtractOptions::from(flags))
    }

    /// Extracts with full control over selection, overwriting and
    /// timestamps.
    pub fn extract_with<S: AsRef<str>>(
        &mut self,
        dest: impl AsRef<Path>,
        selectors: &[S],
        options: &ExtractOptions,
    ) -> Result<ExtractResult> {
        let flags = options.flags;
        self.extract_selected(dest.as_ref(), options, |relative| {
            flags.selects(relative, selectors)
        })
    }

    /// Extracts the entries of the current folder whose relative name
    /// matches `pattern`.
    #[cfg(feature = "regex")]
    pub fn extract_matching_regex(
        &mut self,
        dest: impl AsRef<Path>,
        pattern: &str,
    ) -> Result<ExtractResult> {
        let regex = super::compile_regex(pattern)?;
        self.extract_selected(dest.as_ref(), &ExtractOptions::new(), |relative| {
            regex.is_match(relative)
        })
    }

    fn extract_selected(
        &mut self,
        dest: &Path,
        options: &ExtractOptions,
        mut select: impl FnMut(&str) -> bool,
    ) -> Result<ExtractResult> {
        let Self {
            repository,
            fs,
            folder,
            ..
        } = self;
        let repository = repository.as_deref_mut().ok_or(Error::NotOpen)?;

        // Collect names first: streaming needs the repository mutably
        let mut names = Vec::new();
        repository.each(&mut |name| names.push(name.to_string()));

        fs.make_directory(dest, DEFAULT_DIR_MODE, true)?;

        let mut result = ExtractResult::default();
        for name in &names {
            let Some(relative) = folder.scope(name) else {
                continue;
            };
            if relative.is_empty() {
                // The folder's own directory entry
                continue;
            }
            if !select(relative) {
                log::debug!("skipping {}: not selected", name);
                result.entries_skipped += 1;
                continue;
            }

            let target = safe_join(dest, relative)?;

            if relative.ends_with('/') {
                fs.make_directory(&target, DEFAULT_DIR_MODE, true)?;
                result.entries_extracted += 1;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs.make_directory(parent, DEFAULT_DIR_MODE, true)?;
            }

            if fs.exists(&target) {
                match options.overwrite {
                    OverwritePolicy::Overwrite => {}
                    OverwritePolicy::Skip => {
                        log::debug!("skipping {}: {} exists", name, target.display());
                        result.entries_skipped += 1;
                        continue;
                    }
                    OverwritePolicy::Error => return Err(Error::FileExists { path: target }),
                }
            }

            let written = {
                let mut reader = repository.file_stream(name)?;
                fs.put(&target, &mut reader)?
            };

            if options.preserve_modified {
                if let Some(modified) = repository.modified(name) {
                    fs.set_modified(&target, modified)?;
                }
            }

            log::debug!("extracted {} ({} bytes)", name, written);
            result.entries_extracted += 1;
            result.bytes_extracted += written;
        }

        Ok(result)
    }
}

/// Joins `relative` onto `dest`, refusing names that could escape it.
fn safe_join(dest: &Path, relative: &str) -> Result<PathBuf> {
    let escapes = Path::new(relative).components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes {
        return Err(Error::PathTraversal {
            path: relative.to_string(),
        });
    }
    Ok(dest.join(relative))
}
