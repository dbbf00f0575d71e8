use std::io;
use thiserror::Error;

/// Failure raised by the conversion pipeline.
///
/// The grammar accepts any input, so this only surfaces when the HTML
/// formatter cannot write its output.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to format html: {0}")]
    Format(#[from] io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;
