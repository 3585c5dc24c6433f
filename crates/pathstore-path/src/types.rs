//! Type definitions for structural paths.

use std::fmt;

use crate::{escape_component, is_valid_index};

/// A step in a path.
///
/// Keys address object members, indices address array elements. The tag
/// also decides which container kind is created when a write has to
/// materialize a missing level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index(_))
    }

    /// Parse a raw pointer token. Canonical decimal tokens become indices.
    pub fn from_token(token: &str) -> Self {
        if is_valid_index(token) {
            if let Ok(idx) = token.parse::<usize>() {
                return Segment::Index(idx);
            }
        }
        Segment::Key(token.to_string())
    }

    /// The object key this segment maps to.
    pub fn as_key(&self) -> String {
        match self {
            Segment::Key(key) => key.clone(),
            Segment::Index(idx) => idx.to_string(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(idx) => write!(f, "{idx}"),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<String> for Segment {
    fn from(key: String) -> Self {
        Segment::Key(key)
    }
}

impl From<usize> for Segment {
    fn from(idx: usize) -> Self {
        Segment::Index(idx)
    }
}

/// An ordered sequence of segments. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn new(segments: Vec<Segment>) -> Self {
        Path(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.0
    }

    pub fn push(&mut self, segment: impl Into<Segment>) {
        self.0.push(segment.into());
    }

    /// Returns a new path extended by one segment.
    pub fn child(&self, segment: impl Into<Segment>) -> Path {
        let mut out = self.clone();
        out.push(segment);
        out
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            return None;
        }
        Some(Path(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Strict ancestor check: `self` is a proper prefix of `other`.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && other.starts_with(self)
    }

    /// All prefixes of this path, root first and the path itself last.
    pub fn ancestors_and_self(&self) -> impl Iterator<Item = &[Segment]> + '_ {
        (0..=self.0.len()).map(move |i| &self.0[..i])
    }

    /// Formats the path as a JSON pointer (`""` for the root).
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for segment in &self.0 {
            out.push('/');
            match segment {
                Segment::Key(key) => out.push_str(&escape_component(key)),
                Segment::Index(idx) => out.push_str(&idx.to_string()),
            }
        }
        out
    }
}

/// Dotted label, e.g. `a.0.b`. The root renders as an empty string.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Path(segments)
    }
}

impl From<&[Segment]> for Path {
    fn from(segments: &[Segment]) -> Self {
        Path(segments.to_vec())
    }
}

impl FromIterator<Segment> for Path {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl AsRef<[Segment]> for Path {
    fn as_ref(&self) -> &[Segment] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(segments: Vec<Segment>) -> Path {
        Path::new(segments)
    }

    #[test]
    fn test_ancestors_and_self() {
        let path = p(vec!["a".into(), 1usize.into(), "b".into()]);
        let prefixes: Vec<&[Segment]> = path.ancestors_and_self().collect();
        assert_eq!(prefixes.len(), 4);
        assert!(prefixes[0].is_empty());
        assert_eq!(prefixes[3], path.segments());
        assert_eq!(prefixes[2], &[Segment::from("a"), Segment::Index(1)][..]);
    }

    #[test]
    fn test_root_has_single_prefix() {
        assert_eq!(Path::root().ancestors_and_self().count(), 1);
    }

    #[test]
    fn test_display_is_dotted() {
        assert_eq!(Path::root().to_string(), "");
        let path = p(vec!["todos".into(), 3usize.into(), "done".into()]);
        assert_eq!(path.to_string(), "todos.3.done");
    }

    #[test]
    fn test_to_pointer_escapes_keys() {
        let path = p(vec!["a/b".into(), "c~d".into(), 0usize.into()]);
        assert_eq!(path.to_pointer(), "/a~1b/c~0d/0");
    }

    #[test]
    fn test_ancestry() {
        let a = p(vec!["a".into()]);
        let ab = a.child("b");
        assert!(a.is_ancestor_of(&ab));
        assert!(!ab.is_ancestor_of(&a));
        assert!(!a.is_ancestor_of(&a));
        assert!(Path::root().is_ancestor_of(&a));
        assert_eq!(ab.parent(), Some(a));
        assert_eq!(Path::root().parent(), None);
    }

    #[test]
    fn test_from_token() {
        assert_eq!(Segment::from_token("0"), Segment::Index(0));
        assert_eq!(Segment::from_token("12"), Segment::Index(12));
        assert_eq!(Segment::from_token("012"), Segment::Key("012".into()));
        assert_eq!(Segment::from_token("-1"), Segment::Key("-1".into()));
        assert_eq!(Segment::from_token("x"), Segment::Key("x".into()));
    }
}
