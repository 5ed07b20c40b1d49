//! Caps String Syntax
//!
//! Parses the textual form printed by [`Caps`]'s `Display` implementation:
//!
//! ```text
//! ANY
//! EMPTY
//! image/jpeg, width=1600, height=[600, 1200], framerate={15/1, 30/1}; image/png
//! ```
//!
//! Fields not mentioned keep their full range. GStreamer-style type hints
//! such as `width=(int)1600` or `framerate=(fraction)30/1` are accepted and
//! ignored.

use std::str::FromStr;

use thiserror::Error;

use crate::caps::{Caps, Structure};
use crate::value::{Fraction, ValueSet};

/// Errors produced while parsing caps strings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapsParseError {
    /// A structure did not start with a media type
    #[error("Missing media type in structure: {0:?}")]
    MissingMediaType(String),

    /// A field was not of the form `name=value`
    #[error("Malformed field: {0:?}")]
    MalformedField(String),

    /// The field name is not one of width, height or framerate
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// The field value could not be parsed
    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Offending text
        value: String,
    },
}

trait ParseScalar: Sized {
    fn parse_scalar(text: &str) -> Option<Self>;
}

impl ParseScalar for u32 {
    fn parse_scalar(text: &str) -> Option<Self> {
        text.parse().ok()
    }
}

impl ParseScalar for Fraction {
    fn parse_scalar(text: &str) -> Option<Self> {
        match text.split_once('/') {
            Some((numer, denom)) => Self::new(numer.trim().parse().ok()?, denom.trim().parse().ok()?),
            None => text.parse().ok().map(Self::from_integer),
        }
    }
}

impl FromStr for Fraction {
    type Err = CapsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_scalar(s.trim()).ok_or_else(|| CapsParseError::InvalidValue {
            field: "fraction".to_string(),
            value: s.to_string(),
        })
    }
}

/// Split on `sep` outside of `[...]` and `{...}` groups
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            _ if c == sep && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn strip_type_hint(value: &str) -> &str {
    let value = value.trim();
    if value.starts_with('(') {
        if let Some(end) = value.find(')') {
            return value[end + 1..].trim();
        }
    }
    value
}

fn parse_value_set<T>(field: &str, text: &str) -> Result<ValueSet<T>, CapsParseError>
where
    T: ParseScalar + Copy + Ord,
{
    let invalid = || CapsParseError::InvalidValue {
        field: field.to_string(),
        value: text.to_string(),
    };
    let text = strip_type_hint(text);

    if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        let (min, max) = inner.split_once(',').ok_or_else(invalid)?;
        let min = T::parse_scalar(min.trim()).ok_or_else(invalid)?;
        let max = T::parse_scalar(max.trim()).ok_or_else(invalid)?;
        if min > max {
            return Err(invalid());
        }
        return Ok(ValueSet::range(min, max));
    }

    if let Some(inner) = text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
        let values = inner
            .split(',')
            .map(|v| T::parse_scalar(v.trim()))
            .collect::<Option<Vec<T>>>()
            .ok_or_else(invalid)?;
        return ValueSet::from_values(values).ok_or_else(invalid);
    }

    T::parse_scalar(text).map(ValueSet::Fixed).ok_or_else(invalid)
}

fn parse_structure(text: &str) -> Result<Structure, CapsParseError> {
    let mut fields = split_top_level(text, ',').into_iter();
    let media_type = fields.next().map(str::trim).unwrap_or_default();
    if media_type.is_empty() || media_type.contains('=') {
        return Err(CapsParseError::MissingMediaType(text.trim().to_string()));
    }

    let mut structure = Structure::new(media_type);
    for field in fields {
        let (name, value) = field
            .split_once('=')
            .ok_or_else(|| CapsParseError::MalformedField(field.trim().to_string()))?;

        structure = match name.trim() {
            "width" => structure.with_width(parse_value_set("width", value)?),
            "height" => structure.with_height(parse_value_set("height", value)?),
            "framerate" => structure.with_framerate(parse_value_set("framerate", value)?),
            other => return Err(CapsParseError::UnknownField(other.to_string())),
        };
    }

    Ok(structure)
}

impl FromStr for Caps {
    type Err = CapsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "ANY" => return Ok(Self::Any),
            "" | "EMPTY" => return Ok(Self::empty()),
            _ => {}
        }

        split_top_level(s, ';')
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .map(parse_structure)
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Structures)
    }
}
