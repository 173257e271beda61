//! Edit paths: dot-delimited addresses into the resume tree.
//!
//! `experience.1.highlights.0` and `experience[1].highlights[0]` parse to the same
//! segment list. A segment made only of ASCII digits is an array index; anything
//! else is an object key.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("edit path is empty")]
    Empty,

    #[error("empty segment at position {0}")]
    EmptySegment(usize),

    #[error("unterminated bracket in segment '{0}'")]
    UnterminatedBracket(String),

    #[error("invalid array index '{0}'")]
    InvalidIndex(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EditPath {
    segments: Vec<PathSegment>,
}

impl EditPath {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PathError::Empty);
        }

        let mut segments = Vec::new();
        for (position, part) in raw.split('.').enumerate() {
            if part.is_empty() {
                return Err(PathError::EmptySegment(position));
            }
            parse_part(part, &mut segments)?;
        }

        Ok(EditPath { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

/// Splits `name[1][2]` into a key followed by indices; bare digits become an index.
fn parse_part(part: &str, out: &mut Vec<PathSegment>) -> Result<(), PathError> {
    let (head, mut rest) = match part.find('[') {
        Some(pos) => (&part[..pos], &part[pos..]),
        None => (part, ""),
    };

    if !head.is_empty() {
        out.push(segment_from(head));
    } else if rest.is_empty() {
        return Err(PathError::EmptySegment(out.len()));
    }

    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .ok_or_else(|| PathError::UnterminatedBracket(part.to_string()))?;
        let close = inner
            .find(']')
            .ok_or_else(|| PathError::UnterminatedBracket(part.to_string()))?;
        let index = &inner[..close];
        let index = index
            .parse::<usize>()
            .map_err(|_| PathError::InvalidIndex(index.to_string()))?;
        out.push(PathSegment::Index(index));
        rest = &inner[close + 1..];
    }

    Ok(())
}

fn segment_from(part: &str) -> PathSegment {
    if part.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(index) = part.parse::<usize>() {
            return PathSegment::Index(index);
        }
    }
    PathSegment::Key(part.to_string())
}

impl FromStr for EditPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EditPath::parse(s)
    }
}

impl fmt::Display for EditPath {
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
