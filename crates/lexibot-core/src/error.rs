use thiserror::Error;

/// Error taxonomy for the pipeline and the query service.
///
/// Build-time variants (`Ingest`, `IndexBuild`) are fatal to the batch job;
/// serve-time variants are isolated per request. `BadRequest` maps to a
/// client error status, everything else to a server error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Ingestion failed for {file}: {reason}")]
    Ingest { file: String, reason: String },

    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error("Startup failed: {0}")]
    Startup(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
