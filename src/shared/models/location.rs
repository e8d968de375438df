//! Source-location types used by diagnostics and node usage tracking.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::symbol::Symbol;

/// A single line/column position within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A position within a named file; the unit diagnostics and node usage
/// lists are keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileLocation {
    pub file: Symbol,
    pub loc: Location,
}

impl FileLocation {
    pub fn new(file: impl Into<Symbol>, loc: Location) -> Self {
        Self {
            file: file.into(),
            loc,
        }
    }
}

impl PartialOrd for FileLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FileLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.file
            .as_str()
            .cmp(other.file.as_str())
            .then_with(|| self.loc.cmp(&other.loc))
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.loc)
    }
}
