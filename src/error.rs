//! Pipeline error taxonomy
//!
//! Three failure classes, all fatal to the current document run: input
//! preconditions checked before any processing, internal offset-consistency
//! violations that signal a reconciliation bug, and failures propagated from
//! the external analysis engine. Empty or degenerate sections are not errors.

use thiserror::Error;

use crate::engine::EngineError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The document failed validation before any processing began.
    #[error("precondition not met: {0}")]
    Precondition(String),

    /// Offset reconciliation produced an impossible state. Continuing would
    /// silently corrupt offsets, so the run aborts instead.
    #[error("internal consistency violated: {0}")]
    Inconsistency(String),

    /// The analysis or coreference engine failed. Not retried here; retry
    /// policy belongs to the caller.
    #[error("analysis engine failure")]
    Engine(#[from] EngineError),
}
