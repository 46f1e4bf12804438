use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by generation operations.
#[derive(Error, Debug)]
pub enum GenError {
    /// The request was rejected before any network call was made.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The workflow template could not be read from disk.
    #[error("Failed to load workflow template {path:?}: {source}")]
    TemplateLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The workflow template file was not valid JSON.
    #[error("Workflow template {path:?} is not valid JSON: {source}")]
    TemplateParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// ComfyUI rejected the submitted workflow with a non-success status.
    #[error("ComfyUI rejected the workflow (HTTP {status}): {body}")]
    Submit { status: u16, body: String },

    /// The queued workflow had node-level errors.
    #[error("Workflow node errors: {0}")]
    NodeErrors(String),

    /// The history endpoint returned a non-success, non-404 status.
    #[error("Failed to fetch job history (HTTP {status}): {body}")]
    History { status: u16, body: String },

    /// Timed out waiting for the job to produce outputs.
    #[error("Timed out waiting for generation results")]
    Timeout,

    /// The job completed but reported no output images.
    #[error("Generation finished but produced no images")]
    EmptyResult,

    /// The generation was cancelled via its cancellation signal.
    #[error("Generation was cancelled")]
    Cancelled,

    /// The response from ComfyUI was missing expected fields.
    #[error("{0}")]
    InvalidResponse(String),

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GenError>;
