//! Removing entries.

use super::Archive;
use crate::Result;
use crate::fs::Filesystem;
use crate::select::prefix_match;

impl<F: Filesystem> Archive<F> {
    /// Removes the entry named exactly `name`.
    ///
    /// The current folder is not applied. Removing a missing entry is a
    /// no-op.
    pub fn remove(&mut self, name: &str) -> Result<&mut Self> {
        if self.repo_mut()?.remove_file(name)? {
            log::debug!("removed entry {}", name);
        }
        Ok(self)
    }

    /// Removes every entry whose full name starts with any of `prefixes`.
    ///
    /// Unlike [`remove`](Self::remove) this matches by prefix, so
    /// `remove_all(&["logs"])` also removes `logs.txt` and `logs/app.log`.
    pub fn remove_all<S: AsRef<str>>(&mut self, prefixes: &[S]) -> Result<&mut Self> {
        let removed = self
            .repo_mut()?
            .remove_matching(&mut |name| prefix_match(name, prefixes))?;
        log::debug!("removed {} entries by prefix", removed);
        Ok(self)
    }
}
