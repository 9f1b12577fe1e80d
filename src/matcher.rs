//! Route template parsing and structural matching
//!
//! A template is a `/`-delimited list of parts:
//!
//! - `recipes` - literal, must equal the segment
//! - `:id` - binds the segment to `id`
//! - `:id(\d+)` - binds `id` if the whole segment matches the regex; with a
//!   capture group, group 1 is bound instead of the whole segment
//! - `:(\d+)` - regex constraint without a binding
//! - `:` - binds the segment to the empty name
//! - `*` - matches any single segment and discards it
//!
//! Leading and trailing slashes in a template are ignored. A `/` inside a
//! regex's parentheses does not split the template.

use regex::Regex;

use crate::error::RouteError;
use crate::params::RouteParams;

/// A compiled route template
#[derive(Debug, Clone)]
pub struct RoutePattern {
    template: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile a template. Fails if a regex part does not compile.
    pub fn parse(template: &str) -> Result<Self, RouteError> {
        let segments = split_template(template)
            .into_iter()
            .map(|part| Segment::parse(part, template))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    /// The template as written
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Number of segments this template consumes
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Match against decoded path segments. Returns the path-bound
    /// parameters, or `None` if the structure differs.
    pub fn match_segments(&self, path_segments: &[&str]) -> Option<RouteParams> {
        if path_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = RouteParams::new();
        for (segment, &value) in self.segments.iter().zip(path_segments) {
            match segment {
                Segment::Static(expected) => {
                    if expected != value {
                        return None;
                    }
                }
                Segment::Param { name, constraint } => {
                    let bound = match constraint {
                        Some(constraint) => constraint.extract(value)?,
                        None => value,
                    };
                    if let Some(name) = name {
                        params.insert(name.clone(), bound.to_string());
                    }
                }
                Segment::Wildcard => {}
            }
        }

        Some(params)
    }
}

/// A single part of a route template
#[derive(Debug, Clone)]
pub enum Segment {
    /// Text that must match exactly
    Static(String),
    /// Captures a value; unnamed (regex-only) parameters only constrain
    Param {
        name: Option<String>,
        constraint: Option<Constraint>,
    },
    /// Matches any one segment
    Wildcard,
}

impl Segment {
    /// Parse one part of `template`.
    ///
    /// - "recipes" -> Static("recipes")
    /// - ":id" -> Param { name: Some("id"), constraint: None }
    /// - ":id(\\d+)" -> Param { name: Some("id"), constraint: Some(..) }
    /// - ":(\\d+)" -> Param { name: None, constraint: Some(..) }
    /// - ":" -> Param { name: Some(""), constraint: None }
    /// - "*" -> Wildcard
    pub fn parse(part: &str, template: &str) -> Result<Self, RouteError> {
        if part == "*" {
            return Ok(Segment::Wildcard);
        }

        let Some(rest) = part.strip_prefix(':') else {
            return Ok(Segment::Static(part.to_string()));
        };

        let (name, constraint) = match rest.find('(') {
            Some(open) if rest.ends_with(')') => {
                let pattern = &rest[open + 1..rest.len() - 1];
                let constraint = Constraint::new(pattern).map_err(|source| {
                    RouteError::InvalidPattern {
                        template: template.to_string(),
                        source,
                    }
                })?;
                (&rest[..open], Some(constraint))
            }
            _ => (rest, None),
        };

        // Only a regex part may go unnamed; a bare `:` binds the empty name.
        let name = (constraint.is_none() || !name.is_empty()).then(|| name.to_string());
        Ok(Segment::Param { name, constraint })
    }
}

/// Regex a parameter segment must match in full
#[derive(Debug, Clone)]
pub struct Constraint {
    regex: Regex,
}

impl Constraint {
    fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        Ok(Self { regex })
    }

    /// The value to bind for `segment`: capture group 1 when the pattern has
    /// one and it participated, the whole segment otherwise.
    pub fn extract<'a>(&self, segment: &'a str) -> Option<&'a str> {
        let captures = self.regex.captures(segment)?;
        captures
            .get(1)
            .or_else(|| captures.get(0))
            .map(|m| m.as_str())
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Splits on `/` outside parentheses, ignoring leading and trailing slashes.
fn split_template(template: &str) -> Vec<&str> {
    let trimmed = template.trim_start_matches('/');
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in trimmed.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => {
                parts.push(&trimmed[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&trimmed[start..]);

    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
}
