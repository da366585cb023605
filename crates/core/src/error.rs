//! Validation error model.
//!
//! A [`ValidationError`] is an ordered list of [`ValidationIssue`]s. Each issue
//! is located by a path of [`PathSegment`]s inside the validated input, so
//! nested structs and lists can be reported as `address.lines.0`.

use core::fmt;

use thiserror::Error;
use validator::{ValidationError as Violation, ValidationErrors, ValidationErrorsKind};

/// One step in the location of a validation issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named field.
    Key(String),
    /// A position inside a list.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        Self::Key(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        Self::Key(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new<P>(path: impl IntoIterator<Item = P>, message: impl Into<String>) -> Self
    where
        P: Into<PathSegment>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    /// Dotted rendering of the path, e.g. `address.lines.0`.
    pub fn field(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Input failed schema validation.
///
/// Issues keep the order in which they were reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed with {} issue(s)", .issues.len())]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Shorthand for an error with exactly one issue.
    pub fn single<P>(path: impl IntoIterator<Item = P>, message: impl Into<String>) -> Self
    where
        P: Into<PathSegment>,
    {
        Self::new(vec![ValidationIssue::new(path, message)])
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<ValidationIssue> {
        self.issues
    }

    /// Flatten `validator`'s nested report into ordered issues.
    ///
    /// `validator` keys fields by their Rust name and keeps them in a hash map.
    /// `fields` pairs each top-level Rust name with its wire name, in
    /// declaration order: issues are ordered by that position (unknown fields
    /// last, by name) and reported under the wire name. Nested fields are
    /// ordered by name, list items by index.
    pub fn from_validator(errors: &ValidationErrors, fields: &[(&str, &str)]) -> Self {
        let mut issues = Vec::new();
        collect_issues(errors, fields, &mut Vec::new(), &mut issues);
        Self { issues }
    }
}

fn collect_issues(
    errors: &ValidationErrors,
    known_fields: &[(&str, &str)],
    prefix: &mut Vec<PathSegment>,
    out: &mut Vec<ValidationIssue>,
) {
    let mut fields: Vec<(usize, String, &ValidationErrorsKind)> = errors
        .errors()
        .iter()
        .map(|(name, kind)| {
            let name = name.to_string();
            let known = known_fields
                .iter()
                .enumerate()
                .find(|(_, (rust_name, _))| *rust_name == name.as_str());
            match known {
                Some((rank, (_, wire_name))) => (rank, wire_name.to_string(), kind),
                None => (usize::MAX, name, kind),
            }
        })
        .collect();
    fields.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

    for (_, name, kind) in fields {
        prefix.push(PathSegment::Key(name));
        match kind {
            ValidationErrorsKind::Field(violations) => {
                out.extend(violations.iter().map(|violation| ValidationIssue {
                    path: prefix.clone(),
                    message: describe(violation),
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_issues(inner, &[], prefix, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    prefix.push(PathSegment::Index(*index));
                    collect_issues(inner, &[], prefix, out);
                    prefix.pop();
                }
            }
        }
        prefix.pop();
    }
}

fn describe(violation: &Violation) -> String {
    if let Some(message) = &violation.message {
        return message.to_string();
    }

    match violation.code.as_ref() {
        "email" => "Invalid email address".to_string(),
        "required" => "Required".to_string(),
        "length" => match (violation.params.get("min"), violation.params.get("max")) {
            (Some(min), None) => format!("Must be at least {min} characters"),
            (None, Some(max)) => format!("Must be at most {max} characters"),
            (Some(min), Some(max)) => format!("Must be between {min} and {max} characters"),
            (None, None) => "Invalid length".to_string(),
        },
        code => format!("Failed `{code}` check"),
    }
}
