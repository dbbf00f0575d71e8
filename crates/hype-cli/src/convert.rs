use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use hype_render::{convert, ConversionConfig};
use tracing::debug;

use crate::error::{ConvertError, ConvertResult};
use crate::fs::write_output;

/// Where markdown is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    /// Absent paths and `-` select standard input.
    pub fn from_arg(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) if path != Path::new("-") => Input::File(path),
            _ => Input::Stdin,
        }
    }

    fn describe(&self) -> String {
        match self {
            Input::Stdin => "standard input".to_owned(),
            Input::File(path) => path.display().to_string(),
        }
    }
}

/// Where rendered HTML is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    /// Absent paths and `-` select standard output.
    pub fn from_arg(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) if path != Path::new("-") => Output::File(path),
            _ => Output::Stdout,
        }
    }

    fn describe(&self) -> String {
        match self {
            Output::Stdout => "standard output".to_owned(),
            Output::File(path) => path.display().to_string(),
        }
    }
}

/// One-shot markdown to HTML conversion.
#[derive(Debug, Clone)]
pub struct ConvertCommand {
    pub input: Input,
    pub output: Output,
    pub force: bool,
    pub conversion: ConversionConfig,
}

/// Summary of a completed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOutcome {
    pub input_bytes: usize,
    pub output_bytes: usize,
}

impl ConvertCommand {
    /// Run against the process's standard streams.
    pub fn run(&self) -> ConvertResult<ConvertOutcome> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(&mut stdin.lock(), &mut stdout.lock())
    }

    /// Run with explicit standard streams.
    ///
    /// Preconditions are checked before anything is read or written: a
    /// missing input or an existing output (without `force`) aborts with
    /// the output left untouched.
    pub fn run_with<R: Read, W: Write>(
        &self,
        stdin: &mut R,
        stdout: &mut W,
    ) -> ConvertResult<ConvertOutcome> {
        self.check_preconditions()?;

        let markdown = self.read_input(stdin)?;
        let html = convert(&markdown, self.conversion)?;
        self.write_html(stdout, &html)?;

        debug!(
            input = %self.input.describe(),
            output = %self.output.describe(),
            bytes = html.len(),
            "conversion complete"
        );

        Ok(ConvertOutcome {
            input_bytes: markdown.len(),
            output_bytes: html.len(),
        })
    }

    fn check_preconditions(&self) -> ConvertResult<()> {
        if let Input::File(path) = &self.input {
            if !path.exists() {
                return Err(ConvertError::InputNotFound { path: path.clone() });
            }
        }

        // A dangling symlink still occupies the output name.
        if let Output::File(path) = &self.output {
            if fs::symlink_metadata(path).is_ok() && !self.force {
                return Err(ConvertError::OutputAlreadyExists { path: path.clone() });
            }
        }

        Ok(())
    }

    fn read_input<R: Read>(&self, stdin: &mut R) -> ConvertResult<Vec<u8>> {
        let read = match &self.input {
            Input::Stdin => {
                let mut buffer = Vec::new();
                stdin.read_to_end(&mut buffer).map(|_| buffer)
            }
            Input::File(path) => fs::read(path),
        };

        read.map_err(|source| ConvertError::Read {
            source_name: self.input.describe(),
            source,
        })
    }

    fn write_html<W: Write>(&self, stdout: &mut W, html: &[u8]) -> ConvertResult<()> {
        let written = match &self.output {
            Output::Stdout => write_stdout(stdout, html),
            Output::File(path) => write_output(path, html),
        };

        written.map_err(|source| ConvertError::Write {
            target_name: self.output.describe(),
            source,
        })
    }
}

fn write_stdout<W: Write>(stdout: &mut W, html: &[u8]) -> io::Result<()> {
    match stdout.write_all(html).and_then(|_| stdout.flush()) {
        Ok(()) => Ok(()),
        Err(err) if should_ignore_pipe_error(&err) => Ok(()),
        Err(err) => Err(err),
    }
}

fn should_ignore_pipe_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::WouldBlock
    )
}
