//! Structured addressing for nodes in a state tree.
//!
//! A [`Path`] names any node reachable from the root object, using the
//! dotted syntax `<field>[.<index>.<subfield>]*`:
//!
//! ```
//! use tessera_core::path::{Path, Segment};
//!
//! let path = Path::root().field("member").index(2).field("name");
//! assert_eq!(path.to_string(), "member.2.name");
//!
//! let parsed: Path = "member.2.name".parse().unwrap();
//! assert_eq!(parsed, path);
//! assert_eq!(parsed.last(), Some(&Segment::Field("name".to_string())));
//! ```
//!
//! Paths are values: every extension returns a new path and leaves the
//! receiver untouched.

use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A named field of an object
    Field(String),
    /// A zero-based row of a table
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{name}"),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// An immutable sequence of segments addressing a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The empty path, addressing the root object.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse the dotted syntax. The empty string is the root path.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for part in s.split('.') {
            if part.is_empty() {
                return Err(CoreError::invalid_path(format!("empty segment in '{s}'")));
            }
            if part.bytes().all(|b| b.is_ascii_digit()) {
                let index = part
                    .parse::<usize>()
                    .map_err(|e| CoreError::invalid_path(format!("'{part}' in '{s}': {e}")))?;
                segments.push(Segment::Index(index));
            } else {
                segments.push(Segment::Field(part.to_string()));
            }
        }

        if matches!(segments.first(), Some(Segment::Index(_))) {
            return Err(CoreError::invalid_path(format!(
                "'{s}' must start with a field name"
            )));
        }

        Ok(Self { segments })
    }

    /// Extend with a field name.
    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(name.into()));
        Self { segments }
    }

    /// Extend with a table index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// Concatenate `other` after `self`.
    pub fn join(&self, other: &Path) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// The path without its last segment, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when `self` addresses `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// True when any segment is a table index, i.e. the node lives inside a row.
    pub fn is_within_table(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Index(_)))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_display() {
        let path = Path::root().field("srcaddr").index(0).field("name");
        assert_eq!(path.to_string(), "srcaddr.0.name");
        assert_eq!(path.len(), 3);
        assert!(Path::root().to_string().is_empty());
    }

    #[test]
    fn test_parse_matrix() {
        assert_eq!(Path::parse("").unwrap(), Path::root());
        assert_eq!(
            Path::parse("a.10.b").unwrap().segments(),
            &[
                Segment::Field("a".into()),
                Segment::Index(10),
                Segment::Field("b".into())
            ]
        );

        assert!(Path::parse("a..b").is_err());
        assert!(Path::parse(".a").is_err());
        assert!(Path::parse("a.").is_err());
        assert!(Path::parse("0.a").is_err());
    }

    #[test]
    fn test_extension_does_not_mutate() {
        let base = Path::root().field("member");
        let row = base.index(1);
        assert_eq!(base.to_string(), "member");
        assert_eq!(row.to_string(), "member.1");
        assert_eq!(row.parent(), Some(base.clone()));
        assert!(base.is_prefix_of(&row));
        assert!(!row.is_prefix_of(&base));
    }

    #[test]
    fn test_join_and_table_detection() {
        let joined = Path::root()
            .field("rule")
            .join(&Path::root().index(3).field("dstaddr"));
        assert_eq!(joined.to_string(), "rule.3.dstaddr");
        assert!(joined.is_within_table());
        assert!(!Path::root().field("settings").is_within_table());
        assert_eq!(Path::root().parent(), None);
    }

    #[test]
    fn test_leading_index_only_via_builder() {
        assert!(Path::parse("3.dstaddr").is_err());
        assert_eq!(Path::root().index(3).field("dstaddr").to_string(), "3.dstaddr");
    }
}
