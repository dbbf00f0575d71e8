//! Command-line front end for hype: `convert` renders a single document,
//! `preview` serves a directory of documents over HTTP.

pub mod convert;
pub mod error;
pub mod fs;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hype_config::{Config, LoadOptions, Overrides};
use hype_preview::PreviewServer;
use hype_render::ConversionConfig;
use tracing::{debug, info};

pub use convert::{ConvertCommand, ConvertOutcome, Input, Output};
pub use error::{ConvertError, ExitCode};

#[derive(Parser, Debug)]
#[command(
    name = "hype",
    version,
    about = "A pretty *hype* CLI to help convert Markdown to hypertext markup language (HTML)"
)]
pub struct Cli {
    /// User configuration file, YAML or TOML (default: <config dir>/hyperc.yaml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Ignore extensions to Markdown syntax
    #[arg(short, long, global = true)]
    basic: bool,

    /// Log additional diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transform Markdown into HTML
    Convert(ConvertArgs),
    /// Preview the Markdown files within a directory in a web browser
    Preview(PreviewArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// File to read Markdown from (default: standard input)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// File to write HTML to (default: standard output)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Allow output to overwrite a file if it already exists
    #[arg(short, long)]
    force: bool,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Root directory for the server to serve files from (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Port for the server to listen on (default: 1411)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address for the server to listen on (default: 127.0.0.1)
    #[arg(short = 'H', long)]
    host: Option<String>,
}

impl Cli {
    /// Command-line values that take precedence over every other layer.
    fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            basic: self.basic.then_some(true),
            verbose: self.verbose.then_some(true),
            ..Overrides::default()
        };

        match &self.command {
            Command::Convert(args) => {
                overrides.force = args.force.then_some(true);
            }
            Command::Preview(args) => {
                overrides.root = args.root.clone();
                overrides.port = args.port;
                overrides.host = args.host.clone();
            }
        }

        overrides
    }
}

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut options = LoadOptions::default().with_overrides(cli.overrides());
    if let Some(path) = &cli.config {
        options = options.with_config_path(path);
    }
    let config = Config::load(options).context("failed to load configuration")?;

    logging::init(config.verbose);
    if let Some(path) = config.sources.config_file() {
        info!(path = %path.display(), "using config file");
    }

    let conversion = ConversionConfig::from_basic_flag(config.basic);
    debug!(extensions = ?conversion.extensions(), "conversion configured");

    match cli.command {
        Command::Convert(args) => handle_convert(&config, conversion, args),
        Command::Preview(_) => handle_preview(&config, conversion),
    }
}

fn handle_convert(config: &Config, conversion: ConversionConfig, args: ConvertArgs) -> Result<i32> {
    let command = ConvertCommand {
        input: Input::from_arg(args.input),
        output: Output::from_arg(args.output),
        force: config.convert.force,
        conversion,
    };

    match command.run() {
        Ok(_) => Ok(ExitCode::Success as i32),
        Err(err) => {
            eprintln!("hype: {err}");
            Ok(err.exit_code() as i32)
        }
    }
}

fn handle_preview(config: &Config, conversion: ConversionConfig) -> Result<i32> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let preview = &config.preview;
    runtime.block_on(async {
        let server = PreviewServer::bind(&preview.root, &preview.host, preview.port, conversion)
            .await?;
        let address = server.local_addr()?;
        info!(
            root = %server.root().display(),
            url = %format!("http://{address}/"),
            "listening for connections"
        );
        server.serve().await
    })?;

    Ok(ExitCode::Success as i32)
}
