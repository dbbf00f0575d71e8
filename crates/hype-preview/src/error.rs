use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that prevent the preview server from starting or keep it from
/// accepting connections. Per-request failures never surface here.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("cannot serve root directory {path}: {source}")]
    Root { path: PathBuf, source: io::Error },

    #[error("failed to listen on {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error("preview server stopped: {0}")]
    Serve(#[source] io::Error),
}

pub type PreviewResult<T> = Result<T, PreviewError>;
