//! Insertion-ordered entry storage shared by the format providers.

use std::collections::HashMap;

/// Ordered map from entry name to a provider-specific payload.
///
/// Re-inserting an existing name replaces the payload and keeps the entry's
/// position.
#[derive(Debug, Clone)]
pub(crate) struct EntryTable<T> {
    entries: Vec<(String, T)>,
    index: HashMap<String, usize>,
}

impl<T> EntryTable<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Inserts or replaces `name`. Returns true if the name was new.
    pub(crate) fn upsert(&mut self, name: impl Into<String>, value: T) -> bool {
        let name = name.into();
        match self.index.get(&name) {
            Some(&pos) => {
                self.entries[pos].1 = value;
                false
            }
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
                true
            }
        }
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<T> {
        let pos = self.index.remove(name)?;
        let (_, value) = self.entries.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(value)
    }

    /// Keeps the entries for which `keep` returns true, in order, and
    /// returns how many were dropped.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&str, &T) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(name, value)| keep(name, value));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.index = self
                .entries
                .iter()
                .enumerate()
                .map(|(pos, (name, _))| (name.clone(), pos))
                .collect();
        }
        removed
    }

    pub(crate) fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for EntryTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_kept() {
        let mut table = EntryTable::new();
        table.upsert("foo.file", 1);
        table.upsert("bar.file", 2);
        table.upsert("subDir/sub.file", 3);

        let names: Vec<_> = table.names().collect();
        assert_eq!(names, vec!["foo.file", "bar.file", "subDir/sub.file"]);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut table = EntryTable::new();
        assert!(table.upsert("a", 1));
        assert!(table.upsert("b", 2));
        assert!(!table.upsert("a", 10));

        let items: Vec<_> = table.iter().map(|(n, v)| (n.to_string(), *v)).collect();
        assert_eq!(items, vec![("a".to_string(), 10), ("b".to_string(), 2)]);
    }

    #[test]
    fn test_remove_reindexes() {
        let mut table = EntryTable::new();
        table.upsert("a", 1);
        table.upsert("b", 2);
        table.upsert("c", 3);

        assert_eq!(table.remove("a"), Some(1));
        assert_eq!(table.remove("a"), None);
        assert_eq!(table.get("b"), Some(&2));
        assert_eq!(table.get("c"), Some(&3));
        assert_eq!(table.len(), 2);

        table.upsert("c", 30);
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(table.get("c"), Some(&30));
    }

    #[test]
    fn test_retain_drops_in_one_pass() {
        let mut table = EntryTable::new();
        for (pos, name) in ["logs/a", "keep", "logs/b", "tail"].into_iter().enumerate() {
            table.upsert(name, pos);
        }

        assert_eq!(table.retain(|name, _| !name.starts_with("logs/")), 2);
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["keep", "tail"]);
        assert_eq!(table.get("tail"), Some(&3));
        assert!(!table.contains("logs/a"));

        // Positions stay consistent for later updates
        table.upsert("keep", 10);
        assert_eq!(table.iter().next(), Some(("keep", &10)));
        assert_eq!(table.retain(|_, _| true), 0);
    }

    #[test]
    fn test_contains_and_empty() {
        let mut table = EntryTable::new();
        assert!(table.is_empty());
        table.upsert("x", ());
        assert!(table.contains("x"));
        assert!(!table.contains("y"));
        assert!(!table.is_empty());
    }
}
