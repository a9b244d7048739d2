//! Error types for the pdf-revive library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`RepairError`] — **Fatal**: the repair call cannot proceed at all
//!   (input file missing, invalid configuration, output not writable).
//!   Returned as `Err(RepairError)` from the top-level entry points.
//!
//! * [`StageError`] — **Non-fatal**: a single recovery stage failed. A stage
//!   failure is the *normal* way the pipeline advances: the orchestrator
//!   records the reason and moves on to the next, more aggressive stage.
//!   A `StageError` never crosses the pipeline boundary as an `Err`; it only
//!   surfaces inside [`crate::outcome::RepairOutcome::Unrecoverable`] once
//!   every stage has been exhausted.
//!
//! The separation keeps the orchestrator's control flow exception-free: the
//! only user-visible error condition is "everything failed", and even that is
//! a value, not an `Err`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-revive library.
///
/// Stage-level failures use [`StageError`] and are stored in
/// [`crate::outcome::AttemptRecord`] rather than propagated here.
#[derive(Debug, Error)]
pub enum RepairError {
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure of one recovery stage.
///
/// Every error internal to a stage — parser failures, engine binding
/// problems, process launch errors, scratch-file trouble — is caught at the
/// stage boundary and translated into one of these variants. Only programmer
/// bugs (panics) escape a stage.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum StageError {
    /// The parser could not build any coherent document structure.
    #[error("structural parse failed: {detail}")]
    Structural { detail: String },

    /// The parser succeeded but found zero pages / zero recoverable content.
    #[error("no recoverable content: {detail}")]
    EmptyResult { detail: String },

    /// External process launch failure, non-zero exit, or missing output file.
    #[error("external tool failed: {detail}")]
    ExternalTool { detail: String },

    /// The external process exceeded its time budget and was killed.
    ///
    /// Treated exactly like any other stage failure — the pipeline proceeds
    /// to the next stage rather than aborting.
    #[error("external tool timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Scratch-file creation or engine-binding failure.
    #[error("resource error: {detail}")]
    Resource { detail: String },
}
