use std::io;
use std::path::PathBuf;

use hype_render::RenderError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
    InputNotFound = 2,
    OutputExists = 3,
    Io = 4,
    Conversion = 5,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("file {} not found", path.display())]
    InputNotFound { path: PathBuf },

    #[error("file {} already exists, use --force to overwrite", path.display())]
    OutputAlreadyExists { path: PathBuf },

    #[error("failed to read {source_name}: {source}")]
    Read { source_name: String, source: io::Error },

    #[error("failed to write {target_name}: {source}")]
    Write { target_name: String, source: io::Error },

    #[error(transparent)]
    Conversion(#[from] RenderError),
}

impl ConvertError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InputNotFound { .. } => ExitCode::InputNotFound,
            Self::OutputAlreadyExists { .. } => ExitCode::OutputExists,
            Self::Read { .. } | Self::Write { .. } => ExitCode::Io,
            Self::Conversion(_) => ExitCode::Conversion,
        }
    }
}

pub type ConvertResult<T> = Result<T, ConvertError>;
