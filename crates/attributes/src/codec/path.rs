//! Section paths: `Root.child.items[2]`.

use std::fmt;

use crate::container::{AttributeContainer, Child};
use crate::error::ResolveError;

/// One path segment: a name with an optional sequence index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub index: Option<usize>,
}

impl Segment {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    pub fn indexed(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }

    fn parse(text: &str) -> Result<Self, ResolveError> {
        let malformed = || ResolveError::MalformedSegment(text.to_owned());
        let text = text.trim();
        let (name, index) = match text.split_once('[') {
            None => (text, None),
            Some((name, rest)) => {
                let digits = rest.strip_suffix(']').ok_or_else(malformed)?;
                let index = digits.trim().parse::<usize>().map_err(|_| malformed())?;
                (name.trim_end(), Some(index))
            }
        };
        if name.is_empty() || name.contains(']') {
            return Err(malformed());
        }
        Ok(Self {
            name: name.to_owned(),
            index,
        })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{index}]", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A parsed section path. The first segment names the root kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionPath {
    segments: Vec<Segment>,
}

impl SectionPath {
    pub fn root(kind: &str) -> Self {
        Self {
            segments: vec![Segment::named(kind)],
        }
    }

    pub fn parse(text: &str) -> Result<Self, ResolveError> {
        if text.trim().is_empty() {
            return Err(ResolveError::MalformedSegment(text.to_owned()));
        }
        let segments = text
            .split('.')
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Path of a child segment under this one.
    pub fn join(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Walks the path from `root`, checking the first segment against the
    /// root's kind.
    pub fn resolve<'a>(
        &self,
        root: &'a AttributeContainer,
    ) -> Result<&'a AttributeContainer, ResolveError> {
        let Some((head, rest)) = self.segments.split_first() else {
            return Err(ResolveError::MalformedSegment(String::new()));
        };
        if head.index.is_some() {
            return Err(ResolveError::MalformedSegment(head.to_string()));
        }
        if head.name != root.kind() {
            return Err(ResolveError::RootMismatch {
                expected: head.name.clone(),
                actual: root.kind().to_owned(),
            });
        }

        rest.iter().try_fold(root, |current, segment| {
            let child = current
                .child_entry(&segment.name)
                .ok_or_else(|| ResolveError::UnknownChild(segment.name.clone()))?;
            match (child, segment.index) {
                (Child::Single(container), None) => Ok(container),
                (Child::Single(_), Some(_)) => {
                    Err(ResolveError::ExpectedSequence(segment.name.clone()))
                }
                (Child::Sequence(_), None) => Err(ResolveError::ExpectedSingle(segment.name.clone())),
                (Child::Sequence(items), Some(index)) => {
                    items.get(index).ok_or_else(|| ResolveError::IndexOutOfRange {
                        name: segment.name.clone(),
                        index,
                        len: items.len(),
                    })
                }
            }
        })
    }
}

impl fmt::Display for SectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
