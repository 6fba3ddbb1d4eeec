//! Entry selection for selective extraction.
//!
//! Extraction decides per entry whether to write it out by comparing the
//! entry's name (relative to the current folder) with a list of selector
//! strings. Two comparisons exist:
//!
//! - **prefix** (default): the name starts with any selector;
//! - **exact** ([`ExtractFlags::EXACT_MATCH`]): the name equals a selector.
//!
//! The [`FilterPolicy`] derived from the flags then turns the match result
//! into a decision: a whitelist keeps matches, a blacklist drops them.
//!
//! ```
//! use uniarch::select::{ExtractFlags, FilterPolicy, MatchMode};
//!
//! let flags = ExtractFlags::WHITELIST | ExtractFlags::EXACT_MATCH;
//! assert_eq!(flags.policy(), FilterPolicy::Include);
//! assert_eq!(flags.match_mode(), MatchMode::Exact);
//!
//! let selectors = ["foo"];
//! assert!(flags.selects("foo", &selectors));
//! assert!(!flags.selects("foo.log", &selectors));
//! ```

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Returns true if `name` equals any of `selectors`.
pub fn exact_match<S: AsRef<str>>(name: &str, selectors: &[S]) -> bool {
    selectors.iter().any(|s| s.as_ref() == name)
}

/// Returns true if `name` starts with any of `selectors`.
///
/// An empty selector matches every name.
pub fn prefix_match<S: AsRef<str>>(name: &str, selectors: &[S]) -> bool {
    selectors.iter().any(|s| name.starts_with(s.as_ref()))
}

/// How selector strings are compared with entry names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The entry name starts with a selector.
    #[default]
    Prefix,
    /// The entry name equals a selector.
    Exact,
}

impl MatchMode {
    /// Applies this comparison to `name`.
    pub fn matches<S: AsRef<str>>(self, name: &str, selectors: &[S]) -> bool {
        match self {
            Self::Prefix => prefix_match(name, selectors),
            Self::Exact => exact_match(name, selectors),
        }
    }
}

/// What a selector match means for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPolicy {
    /// Whitelist: keep matching entries only.
    Include,
    /// Blacklist: keep every entry that does not match.
    #[default]
    Exclude,
}

impl FilterPolicy {
    /// Returns whether an entry is kept, given whether it matched.
    pub fn keeps(self, matched: bool) -> bool {
        matched == (self == Self::Include)
    }
}

/// Bit flags controlling selective extraction.
///
/// Flags combine with `|`. When both [`WHITELIST`](Self::WHITELIST) and
/// [`BLACKLIST`](Self::BLACKLIST) are set, the whitelist wins. When neither
/// is set the blacklist policy applies, so the default flags with no
/// selectors extract everything.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtractFlags(u8);

impl ExtractFlags {
    /// Extract only entries matching a selector.
    pub const WHITELIST: Self = Self(1);
    /// Extract every entry except those matching a selector.
    pub const BLACKLIST: Self = Self(2);
    /// Compare names with selectors for equality instead of by prefix.
    pub const EXACT_MATCH: Self = Self(4);

    const ALL: u8 = 1 | 2 | 4;

    /// Creates flags from raw bits, dropping unknown bits.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the filter policy these flags select.
    pub fn policy(self) -> FilterPolicy {
        if self.contains(Self::WHITELIST) {
            FilterPolicy::Include
        } else {
            FilterPolicy::Exclude
        }
    }

    /// Returns the comparison these flags select.
    pub fn match_mode(self) -> MatchMode {
        if self.contains(Self::EXACT_MATCH) {
            MatchMode::Exact
        } else {
            MatchMode::Prefix
        }
    }

    /// Decides whether an entry with the given relative name is extracted.
    pub fn selects<S: AsRef<str>>(self, relative_name: &str, selectors: &[S]) -> bool {
        self.policy()
            .keeps(self.match_mode().matches(relative_name, selectors))
    }
}

impl Default for ExtractFlags {
    fn default() -> Self {
        Self::BLACKLIST
    }
}

impl BitOr for ExtractFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ExtractFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for ExtractFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Self::WHITELIST) {
            names.push("WHITELIST");
        }
        if self.contains(Self::BLACKLIST) {
            names.push("BLACKLIST");
        }
        if self.contains(Self::EXACT_MATCH) {
            names.push("EXACT_MATCH");
        }
        write!(f, "ExtractFlags({})", names.join(" | "))
    }
}
