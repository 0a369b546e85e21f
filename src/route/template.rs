//! Route template parsing.
//!
//! # Syntax
//!
//! ```text
//! blog/{category}/{slug}          free variables
//! archive/{year}/{page=1}         optional with inline default
//! docs/{*path}                    trailing catch-all
//! post-{id}                       complex segment (literal + variable)
//! ```
//!
//! Variable kinds are decided together with the `defaults` map passed at
//! registration:
//!
//! | In URL | Default           | Kind                  |
//! |--------|-------------------|-----------------------|
//! | yes    | none              | [`VarKind::Free`]     |
//! | yes    | inline or map     | [`VarKind::Optional`] |
//! | no     | map               | [`VarKind::Fixed`]    |

use regex::Regex;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors raised while parsing a route template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unbalanced `{{` or `}}` in `{0}`")]
    Unbalanced(String),

    #[error("empty segment in `{0}`")]
    EmptySegment(String),

    #[error("empty variable name in `{0}`")]
    EmptyName(String),

    #[error("variable `{name}` appears more than once in `{template}`")]
    Duplicate { template: String, name: String },

    #[error("catch-all `{{*{name}}}` must be the whole last segment of `{template}`")]
    CatchAllPosition { template: String, name: String },

    #[error("variables `{first}` and `{second}` are adjacent in `{template}`")]
    AdjacentVariables {
        template: String,
        first: String,
        second: String,
    },

    #[error("variable `{name}` has both an inline default and a defaults entry in `{template}`")]
    ConflictingDefault { template: String, name: String },

    #[error("cannot compile `{template}`: {message}")]
    Regex { template: String, message: String },
}

/// How a route variable binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarKind {
    /// Not in the URL; the template pins this value.
    Fixed(String),
    /// In the URL; may be omitted, implying the default.
    Optional(String),
    /// In the URL; any value.
    Free,
}

/// A declared route variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteVariable {
    /// Lower-cased key
    pub key: String,
    pub kind: VarKind,
    /// `{*key}`: captures the rest of the path, slashes included
    pub catch_all: bool,
    /// Segment index, `None` for fixed variables
    pub segment: Option<usize>,
}

impl RouteVariable {
    pub fn default_value(&self) -> Option<&str> {
        match &self.kind {
            VarKind::Fixed(v) | VarKind::Optional(v) => Some(v),
            VarKind::Free => None,
        }
    }
}

/// Part of a path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    /// Index into [`RouteTemplate::variables`]
    Var(usize),
}

/// One `/`-delimited piece of the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub tokens: Vec<Token>,
}

impl Segment {
    /// The variable index if the segment is exactly one variable.
    pub fn sole_variable(&self) -> Option<usize> {
        match self.tokens.as_slice() {
            [Token::Var(i)] => Some(*i),
            _ => None,
        }
    }
}

/// A parsed and compiled route template.
#[derive(Debug, Clone)]
pub struct RouteTemplate {
    raw: String,
    segments: Vec<Segment>,
    variables: Vec<RouteVariable>,
    pattern: Regex,
}

impl RouteTemplate {
    /// Parse a template, resolving variable kinds against `defaults`.
    pub fn parse(raw: &str, defaults: &FxHashMap<String, String>) -> Result<Self, TemplateError> {
        let trimmed = raw.trim().trim_matches('/');
        let mut variables: Vec<RouteVariable> = Vec::new();
        let mut segments = Vec::new();

        if !trimmed.is_empty() {
            let parts: Vec<&str> = trimmed.split('/').collect();
            for (index, part) in parts.iter().enumerate() {
                if part.is_empty() {
                    return Err(TemplateError::EmptySegment(raw.to_string()));
                }
                let segment = parse_segment(raw, part, index, &mut variables, defaults)?;
                segments.push(segment);
            }
        }

        for var in variables.iter().filter(|v| v.catch_all) {
            let last = segments.len().saturating_sub(1);
            let alone = segments
                .get(last)
                .and_then(Segment::sole_variable)
                .is_some_and(|i| variables[i].key == var.key);
            if !alone {
                return Err(TemplateError::CatchAllPosition {
                    template: raw.to_string(),
                    name: var.key.clone(),
                });
            }
        }

        // Defaults naming keys absent from the URL pin those keys
        let mut fixed: Vec<(&String, &String)> = defaults
            .iter()
            .filter(|(k, _)| !variables.iter().any(|v| v.key == **k))
            .collect();
        fixed.sort();
        for (key, value) in fixed {
            variables.push(RouteVariable {
                key: key.clone(),
                kind: VarKind::Fixed(value.clone()),
                catch_all: false,
                segment: None,
            });
        }

        let pattern = compile_pattern(raw, &segments, &variables)?;

        Ok(Self {
            raw: raw.trim().to_string(),
            segments,
            variables,
            pattern,
        })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn variables(&self) -> &[RouteVariable] {
        &self.variables
    }

    pub fn variable(&self, key: &str) -> Option<&RouteVariable> {
        self.variables.iter().find(|v| v.key.eq_ignore_ascii_case(key))
    }

    /// True iff the variable at `index` can be left out of a rendered URL.
    pub fn is_omittable(&self, index: usize) -> bool {
        let var = &self.variables[index];
        matches!(var.kind, VarKind::Optional(_))
            && var
                .segment
                .is_some_and(|s| self.segments[s].sole_variable() == Some(index))
    }

    /// Anchored, case-insensitive pattern matching normalized route paths.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

impl std::fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parse one segment into literal and variable tokens.
fn parse_segment(
    raw: &str,
    part: &str,
    index: usize,
    variables: &mut Vec<RouteVariable>,
    defaults: &FxHashMap<String, String>,
) -> Result<Segment, TemplateError> {
    let unbalanced = || TemplateError::Unbalanced(raw.to_string());
    let mut tokens = Vec::new();
    let mut rest = part;

    while !rest.is_empty() {
        match rest.find(['{', '}']) {
            Some(pos) if rest[pos..].starts_with('}') => return Err(unbalanced()),
            Some(pos) => {
                if pos > 0 {
                    tokens.push(Token::Literal(rest[..pos].to_string()));
                }
                let body_start = pos + 1;
                let close = rest[body_start..].find('}').ok_or_else(unbalanced)? + body_start;
                let body = &rest[body_start..close];
                if body.contains('{') {
                    return Err(unbalanced());
                }
                if let Some(Token::Var(prev)) = tokens.last() {
                    return Err(TemplateError::AdjacentVariables {
                        template: raw.to_string(),
                        first: variables[*prev].key.clone(),
                        second: body.trim_start_matches('*').to_string(),
                    });
                }
                let var = parse_variable(raw, body, index, defaults)?;
                if variables.iter().any(|v| v.key == var.key) {
                    return Err(TemplateError::Duplicate {
                        template: raw.to_string(),
                        name: var.key,
                    });
                }
                tokens.push(Token::Var(variables.len()));
                variables.push(var);
                rest = &rest[close + 1..];
            }
            None => {
                tokens.push(Token::Literal(rest.to_string()));
                rest = "";
            }
        }
    }

    Ok(Segment { tokens })
}

/// Parse `key`, `key=default` or `*key` (the text between braces).
fn parse_variable(
    raw: &str,
    body: &str,
    segment: usize,
    defaults: &FxHashMap<String, String>,
) -> Result<RouteVariable, TemplateError> {
    let (catch_all, body) = match body.strip_prefix('*') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let (name, inline) = match body.split_once('=') {
        Some((name, default)) => (name, Some(default.trim())),
        None => (body, None),
    };
    let key = name.trim().to_lowercase();
    if key.is_empty() {
        return Err(TemplateError::EmptyName(raw.to_string()));
    }

    let kind = match (inline, defaults.get(&key)) {
        (Some(_), Some(_)) => {
            return Err(TemplateError::ConflictingDefault {
                template: raw.to_string(),
                name: key,
            });
        }
        (Some(d), None) => VarKind::Optional(d.to_string()),
        (None, Some(d)) => VarKind::Optional(d.clone()),
        (None, None) => VarKind::Free,
    };

    Ok(RouteVariable {
        key,
        kind,
        catch_all,
        segment: Some(segment),
    })
}

/// Regex group name for a variable index.
pub(crate) fn group_name(index: usize) -> String {
    format!("v{index}")
}

/// Build the anchored matcher.
///
/// The trailing run of omittable segments becomes nested optional groups:
/// `a/{x=1}/{y=2}` compiles to `^a(?:/(?P<v0>[^/]+)(?:/(?P<v1>[^/]+))?)?$`.
fn compile_pattern(
    raw: &str,
    segments: &[Segment],
    variables: &[RouteVariable],
) -> Result<Regex, TemplateError> {
    let omittable = |seg: &Segment| {
        seg.sole_variable()
            .is_some_and(|i| matches!(variables[i].kind, VarKind::Optional(_)))
    };
    let tail_start = segments
        .iter()
        .rposition(|s| !omittable(s))
        .map_or(0, |i| i + 1);

    let mut pattern = String::from("(?i)^");
    for (i, segment) in segments.iter().enumerate() {
        let sep = if i == 0 { "" } else { "/" };
        if i >= tail_start {
            pattern.push_str("(?:");
        }
        pattern.push_str(sep);
        for token in &segment.tokens {
            match token {
                Token::Literal(lit) => pattern.push_str(&regex::escape(lit)),
                Token::Var(v) => {
                    let body = if variables[*v].catch_all { ".+" } else { "[^/]+" };
                    pattern.push_str(&format!("(?P<{}>{body})", group_name(*v)));
                }
            }
        }
    }
    for _ in tail_start..segments.len() {
        pattern.push_str(")?");
    }
    pattern.push('$');

    Regex::new(&pattern).map_err(|e| TemplateError::Regex {
        template: raw.to_string(),
        message: e.to_string(),
    })
}
