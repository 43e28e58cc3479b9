//! Problem entity, drafts, and pre-persistence validation.
//!
//! A problem is the unit of work graders operate on: a statement, a
//! reference solution, and a pair of structured payloads (`example`,
//! `output`) describing the expected input/output shape. The structured
//! payloads stay typed (`serde_json::Value`) in memory; only the store
//! adapter sees their encoded-blob form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by draft validation.
///
/// Validation is a pure function of the in-memory draft; a failed
/// validation performs no side effect and nothing reaches the store.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The title is empty or whitespace-only.
    #[error("Title must not be empty")]
    EmptyTitle,

    /// The description is empty or whitespace-only.
    #[error("Description must not be empty")]
    EmptyDescription,
}

/// Caller-supplied payload for creating a problem.
///
/// The poster identity is deliberately absent: it comes from the
/// authenticated session and is attached by the orchestration layer,
/// never bound from client input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDraft {
    /// Problem title shown in listings.
    pub title: String,
    /// Full problem statement.
    pub description: String,
    /// Structured example input.
    pub example: serde_json::Value,
    /// Structured expected output.
    pub output: serde_json::Value,
    /// Reference solution used by graders.
    pub solution: String,
}

impl ProblemDraft {
    /// Creates a new draft.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        example: serde_json::Value,
        output: serde_json::Value,
        solution: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            example,
            output,
            solution: solution.into(),
        }
    }

    /// Validates the draft before any persistence attempt.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        Ok(())
    }
}

/// A fully materialized problem as seen by readers.
///
/// `example` and `output` are decoded back into structured values by the
/// shared codec; the blob representation never leaves the store adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetail {
    /// Store-assigned identifier, immutable after creation.
    pub problem_id: i64,
    /// Problem title.
    pub title: String,
    /// Full problem statement.
    pub description: String,
    /// Structured example input.
    pub example: serde_json::Value,
    /// Structured expected output.
    pub output: serde_json::Value,
    /// Identity of the creating user.
    pub poster: String,
}

/// List projection of a problem (no payloads, no solution).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemSummary {
    /// Store-assigned identifier.
    pub problem_id: i64,
    /// Problem title.
    pub title: String,
    /// Identity of the creating user.
    pub poster: String,
    /// Whether a data file has been attached.
    pub has_data: bool,
    /// When the problem was created.
    pub created_at: DateTime<Utc>,
}
