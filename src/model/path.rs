// Test and suite addressing

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one test inside a suite file.
///
/// `path` is the chain of suite names ending with the test's own name, so it
/// is never empty for a well-formed test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestPath {
    pub file: String,
    pub path: Vec<String>,
}

/// Identifies a suite inside a suite file. An empty `path` is the file's root suite.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SuitePath {
    pub file: String,
    pub path: Vec<String>,
}

impl TestPath {
    pub fn new<I, S>(file: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            file: file.into(),
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// The test's own name (last path segment)
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or("")
    }

    /// The suite that directly contains this test.
    pub fn suite_path(&self) -> SuitePath {
        let len = self.path.len().saturating_sub(1);
        SuitePath {
            file: self.file.clone(),
            path: self.path[..len].to_vec(),
        }
    }
}

impl SuitePath {
    pub fn new<I, S>(file: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            file: file.into(),
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// Root suite of a file
    pub fn root(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            path: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Nesting depth, 0 for the root suite
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn name(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    /// The enclosing suite, or `None` for a root suite.
    pub fn parent(&self) -> Option<SuitePath> {
        if self.is_root() {
            return None;
        }
        Some(SuitePath {
            file: self.file.clone(),
            path: self.path[..self.path.len() - 1].to_vec(),
        })
    }

    /// Iterates this suite and every enclosing suite, innermost first.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
        }
    }

    /// True when `other` is this suite or nested (at any depth) inside it.
    pub fn contains_suite(&self, other: &SuitePath) -> bool {
        self.file == other.file && other.path.starts_with(&self.path)
    }

    /// True when the test lives in this suite or in one of its subsuites.
    pub fn contains_test(&self, test: &TestPath) -> bool {
        self.file == test.file
            && test.path.len() > self.path.len()
            && test.path.starts_with(&self.path)
    }
}

/// Iterator returned by [`SuitePath::ancestors`].
pub struct Ancestors {
    next: Option<SuitePath>,
}

impl Iterator for Ancestors {
    type Item = SuitePath;

    fn next(&mut self) -> Option<SuitePath> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

impl fmt::Display for TestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.path.join(" > "))
    }
}

impl fmt::Display for SuitePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "{}", self.file)
        } else {
            write!(f, "{}: {}", self.file, self.path.join(" > "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_path_of_root_level_test_is_root() {
        let test = TestPath::new("file.js", ["test"]);
        let suite = test.suite_path();
        assert!(suite.is_root());
        assert_eq!(suite.file, "file.js");
        assert_eq!(suite.parent(), None);
    }

    #[test]
    fn test_suite_path_drops_last_segment() {
        let test = TestPath::new("file.js", ["outer", "inner", "test"]);
        assert_eq!(test.suite_path(), SuitePath::new("file.js", ["outer", "inner"]));
        assert_eq!(test.name(), "test");
    }

    #[test]
    fn test_ancestors_innermost_first() {
        let suite = SuitePath::new("f", ["a", "b"]);
        let chain: Vec<SuitePath> = suite.ancestors().collect();
        assert_eq!(
            chain,
            vec![
                SuitePath::new("f", ["a", "b"]),
                SuitePath::new("f", ["a"]),
                SuitePath::root("f"),
            ]
        );
    }

    #[test]
    fn test_contains_respects_file_and_prefix() {
        let suite = SuitePath::new("f", ["a"]);
        assert!(suite.contains_test(&TestPath::new("f", ["a", "t"])));
        assert!(suite.contains_test(&TestPath::new("f", ["a", "b", "t"])));
        assert!(!suite.contains_test(&TestPath::new("f", ["b", "t"])));
        assert!(!suite.contains_test(&TestPath::new("g", ["a", "t"])));
        assert!(suite.contains_suite(&SuitePath::new("f", ["a", "b"])));
        assert!(suite.contains_suite(&suite));
        assert!(!suite.contains_suite(&SuitePath::root("f")));
    }

    #[test]
    fn test_serde_shape() {
        let test = TestPath::new("f", ["a", "t"]);
        let json = serde_json::to_value(&test).unwrap();
        assert_eq!(json, serde_json::json!({"file": "f", "path": ["a", "t"]}));
    }

    #[test]
    fn test_display() {
        assert_eq!(TestPath::new("f", ["a", "t"]).to_string(), "f: a > t");
        assert_eq!(SuitePath::root("f").to_string(), "f");
    }
}
