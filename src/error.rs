//! Errors surfaced by screen actions.
//!
//! Reads mask backend failures with demo data while demo mode is on and
//! otherwise return [`ReadError`]. Writes never mask: they abort and hand
//! the caller an [`ActionError`], whose [`ActionError::alert`] is what the
//! UI shows.

use std::fmt;

use thiserror::Error;

use crate::device::DeviceError;
use crate::gateway::GatewayError;

/// A blocking dialog for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub message: String,
}

impl Alert {
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Form field checked before a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Caption,
    Location,
    Comment,
    Email,
    Name,
    City,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Caption => "caption",
            Self::Location => "location",
            Self::Comment => "comment",
            Self::Email => "email",
            Self::Name => "name",
            Self::City => "city",
        };
        f.write_str(name)
    }
}

/// One rejected field and the reason shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProblem {
    pub field: Field,
    pub message: String,
}

/// Client-side rejection of a form; lists every failing field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.summary())]
pub struct ValidationError {
    problems: Vec<FieldProblem>,
}

impl ValidationError {
    #[must_use]
    pub fn single(field: Field, message: impl Into<String>) -> Self {
        Self {
            problems: vec![FieldProblem {
                field,
                message: message.into(),
            }],
        }
    }

    #[must_use]
    pub fn problems(&self) -> &[FieldProblem] {
        &self.problems
    }

    #[must_use]
    pub fn has(&self, field: Field) -> bool {
        self.problems.iter().any(|p| p.field == field)
    }

    fn summary(&self) -> String {
        self.problems
            .iter()
            .map(|p| p.message.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Collects field problems while a form is checked.
#[derive(Debug, Default)]
pub struct Validator {
    problems: Vec<FieldProblem>,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: Field, message: &str) {
        if !ok {
            self.problems.push(FieldProblem {
                field,
                message: message.to_string(),
            });
        }
    }

    /// # Errors
    ///
    /// Returns every recorded problem.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                problems: self.problems,
            })
        }
    }
}

/// Failure of a write action (comment, post, like, sign-in, profile).
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("sign-in required to {action}")]
    NotSignedIn { action: &'static str },
    #[error("post {0} is not on screen")]
    UnknownPost(String),
    #[error("nothing to submit")]
    NothingToSubmit,
    #[error("cannot {action} on demo data")]
    DemoData { action: &'static str },
    #[error("failed to {action}: {source}")]
    Backend {
        action: &'static str,
        #[source]
        source: GatewayError,
    },
    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl ActionError {
    #[must_use]
    pub fn backend(action: &'static str, source: GatewayError) -> Self {
        Self::Backend { action, source }
    }

    /// The dialog shown for this failure.
    #[must_use]
    pub fn alert(&self) -> Alert {
        match self {
            Self::Validation(e) => Alert::new("Error", e.to_string()),
            Self::NotSignedIn { action } => Alert::new("Error", format!("Please log in to {action}")),
            Self::UnknownPost(_) => Alert::new("Error", "This post is no longer available"),
            Self::NothingToSubmit => Alert::new("Error", "Nothing to submit yet"),
            Self::DemoData { action } => Alert::new(
                "Offline",
                format!("Unable to {action} while showing demo data. Pull to refresh and try again."),
            ),
            Self::Backend { action, .. } => match *action {
                "create post" => Alert::new("Error", "Failed to create post. Please try again."),
                other => Alert::new("Error", format!("Failed to {other}")),
            },
            Self::Device(DeviceError::PermissionDenied(capability)) => Alert::new(
                "Permission denied",
                format!("Please grant {capability} permission to continue"),
            ),
            Self::Device(e) => Alert::new("Error", e.to_string()),
        }
    }
}

/// A read that failed with demo mode switched off.
#[derive(Debug, Error)]
#[error("failed to load {what}: {source}")]
pub struct ReadError {
    pub what: &'static str,
    #[source]
    pub source: GatewayError,
}

impl ReadError {
    #[must_use]
    pub fn alert(&self) -> Alert {
        Alert::new("Error", format!("Failed to load {}", self.what))
    }
}
