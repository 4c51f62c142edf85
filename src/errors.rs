//! Typed error hierarchy for the board backend.
//!
//! `BoardError` covers the four failure classes the API surfaces:
//! validation (400), missing project/task (404), AI generation failures
//! (500 with a fixed public message), and unexpected store failures (500).
//! Display strings here are for server-side logs; the HTTP layer maps each
//! variant to its public `{message}` body in `board::api`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Project {id} not found")]
    ProjectNotFound { id: i64 },

    #[error("Task {id} not found")]
    TaskNotFound { id: i64 },

    /// Missing or malformed required input. The message is the public
    /// validation text returned to the client.
    #[error("{0}")]
    Validation(String),

    /// The external generation call failed. `public` is the fixed message
    /// the client sees; `source` carries the real cause for the logs.
    #[error("AI generation failed: {source}")]
    AiGeneration {
        public: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Database error: {0}")]
    Database(#[source] anyhow::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
