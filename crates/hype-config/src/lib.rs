//! Configuration primitives and loader for hype.
//!
//! Settings are resolved from four layers, lowest precedence first:
//! built-in defaults → configuration file → `HYPE_*` environment variables →
//! command-line flags. Each resolved value remembers the layer it came from so
//! relative paths can be anchored to the right directory.

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// File names looked up inside the platform configuration directory, in
/// order. The first one that exists wins.
pub const CONFIG_FILE_NAMES: [&str; 3] = ["hyperc.yaml", "hyperc.yml", "hyperc.toml"];

/// Prefix scoping environment variables to this tool.
pub const ENV_PREFIX: &str = "HYPE_";

pub const DEFAULT_PORT: u16 = 1411;
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Complete configuration resolved from every layer.
#[derive(Clone, Debug)]
pub struct Config {
    /// Disable Markdown extensions.
    pub basic: bool,
    /// Emit additional diagnostics.
    pub verbose: bool,
    pub convert: ConvertSettings,
    pub preview: PreviewSettings,
    pub sources: ConfigSources,
}

/// Settings that govern `hype convert`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertSettings {
    pub force: bool,
}

/// Settings that govern `hype preview`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewSettings {
    pub root: PathBuf,
    pub port: u16,
    pub host: String,
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

impl ConfigSources {
    /// Path of the configuration file that contributed settings, if any.
    pub fn config_file(&self) -> Option<&Path> {
        self.layers
            .iter()
            .find(|layer| layer.kind == ConfigSourceKind::File)
            .and_then(|layer| layer.path.as_deref())
    }
}

/// Specific layer of configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn new(kind: ConfigSourceKind, base_dir: PathBuf) -> Self {
        ConfigSource {
            kind,
            path: None,
            base_dir,
        }
    }

    fn for_file(path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind: ConfigSourceKind::File,
            path: Some(path),
            base_dir,
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    File,
    Environment,
    Flags,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::File => "config file",
            ConfigSourceKind::Environment => "environment",
            ConfigSourceKind::Flags => "command-line flags",
        };
        f.write_str(label)
    }
}

/// Values supplied explicitly on the command line. `None` leaves the lower
/// layers in charge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overrides {
    pub basic: Option<bool>,
    pub verbose: Option<bool>,
    pub force: Option<bool>,
    pub root: Option<PathBuf>,
    pub port: Option<u16>,
    pub host: Option<String>,
}

impl Overrides {
    fn is_empty(&self) -> bool {
        self == &Overrides::default()
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub env: Option<Vec<(String, String)>>,
    pub overrides: Overrides,
}

impl LoadOptions {
    /// Use an explicit configuration file instead of the platform default.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Directory searched for [`CONFIG_FILE_NAMES`] when no explicit path is set.
    pub fn with_config_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    /// Replace the process environment with the given variables.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("config file {path} not found")]
    FileNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: ConfigParseError,
    },
    #[error("invalid value '{value}' for {key}: expected {expected}")]
    InvalidEnv {
        key: String,
        value: String,
        expected: &'static str,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

/// Syntax errors from either supported file format.
#[derive(Debug, Error)]
pub enum ConfigParseError {
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Syntax of a configuration file, chosen from its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// `.toml` files are TOML; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }

    fn parse(self, contents: &str) -> Result<RawConfig, ConfigParseError> {
        match self {
            ConfigFormat::Toml => Ok(toml::from_str(contents)?),
            // An empty YAML document has no mapping to deserialize.
            ConfigFormat::Yaml if contents.trim().is_empty() => Ok(RawConfig::default()),
            ConfigFormat::Yaml => Ok(serde_yaml::from_str(contents)?),
        }
    }
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;

        let default_source = ConfigSource::new(ConfigSourceKind::Default, working_dir.clone());
        let mut merged = defaults_layer(&default_source);
        let mut layers = vec![default_source];

        let config_path = match options.config_path {
            Some(path) => {
                let path = make_absolute(&path, &working_dir);
                if !path.exists() {
                    return Err(ConfigError::FileNotFound { path });
                }
                Some(path)
            }
            None => options
                .config_dir
                .or_else(dirs::config_dir)
                .and_then(|dir| {
                    CONFIG_FILE_NAMES
                        .iter()
                        .map(|name| dir.join(name))
                        .find(|path| path.is_file())
                }),
        };

        if let Some(path) = config_path {
            debug!(path = %path.display(), "loading config file");
            let source = ConfigSource::for_file(path.clone());
            merged.merge(load_layer(&path, &source)?);
            layers.push(source);
        }

        let env_vars: Vec<(String, String)> = match options.env {
            Some(vars) => vars,
            None => env::vars().collect(),
        };
        let env_source = ConfigSource::new(ConfigSourceKind::Environment, working_dir.clone());
        let env_layer = env_layer(&env_vars, &env_source)?;
        if !env_layer.is_empty() {
            merged.merge(env_layer);
            layers.push(env_source);
        }

        if !options.overrides.is_empty() {
            let flag_source = ConfigSource::new(ConfigSourceKind::Flags, working_dir.clone());
            merged.merge(flags_layer(options.overrides, &flag_source));
            layers.push(flag_source);
        }

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            basic: resolved.basic,
            verbose: resolved.verbose,
            convert: resolved.convert,
            preview: resolved.preview,
            sources: ConfigSources {
                working_directory: working_dir,
                layers,
            },
        })
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: &ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.into(),
        source: err,
    })?;
    let raw = ConfigFormat::from_path(path)
        .parse(&contents)
        .map_err(|err| ConfigError::Parse {
            path: path.into(),
            source: err,
        })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: &ConfigSource) -> PartialConfig {
    PartialConfig {
        basic: Some(Located::new(false, source.clone())),
        verbose: Some(Located::new(false, source.clone())),
        force: Some(Located::new(false, source.clone())),
        root: Some(Located::new(PathBuf::from("."), source.clone())),
        port: Some(Located::new(DEFAULT_PORT, source.clone())),
        host: Some(Located::new(DEFAULT_HOST.to_owned(), source.clone())),
    }
}

fn env_layer(vars: &[(String, String)], source: &ConfigSource) -> Result<PartialConfig, ConfigError> {
    let vars: BTreeMap<&str, &str> = vars
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(ENV_PREFIX)
                .map(|name| (name, value.as_str()))
        })
        .collect();

    let flag = |name: &str| -> Result<Option<Located<bool>>, ConfigError> {
        vars.get(name)
            .map(|value| parse_bool(name, value).map(|parsed| Located::new(parsed, source.clone())))
            .transpose()
    };

    let port = vars
        .get("PORT")
        .map(|value| {
            value
                .trim()
                .parse::<u16>()
                .map(|port| Located::new(port, source.clone()))
                .map_err(|_| invalid_env("PORT", value, "a port number"))
        })
        .transpose()?;

    Ok(PartialConfig {
        basic: flag("BASIC")?,
        verbose: flag("VERBOSE")?,
        force: flag("FORCE")?,
        root: vars
            .get("ROOT")
            .map(|value| Located::new(PathBuf::from(value), source.clone())),
        port,
        host: vars
            .get("HOST")
            .map(|value| Located::new((*value).to_owned(), source.clone())),
    })
}

fn flags_layer(overrides: Overrides, source: &ConfigSource) -> PartialConfig {
    let locate = |value| Located::new(value, source.clone());
    PartialConfig {
        basic: overrides.basic.map(locate),
        verbose: overrides.verbose.map(locate),
        force: overrides.force.map(locate),
        root: overrides
            .root
            .map(|root| Located::new(root, source.clone())),
        port: overrides
            .port
            .map(|port| Located::new(port, source.clone())),
        host: overrides
            .host
            .map(|host| Located::new(host, source.clone())),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid_env(name, value, "a boolean")),
    }
}

fn invalid_env(name: &str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidEnv {
        key: format!("{ENV_PREFIX}{name}"),
        value: value.to_owned(),
        expected,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    basic: Option<bool>,
    verbose: Option<bool>,
    #[serde(default)]
    convert: RawConvert,
    #[serde(default)]
    preview: RawPreview,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConvert {
    force: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPreview {
    root: Option<PathBuf>,
    port: Option<u16>,
    host: Option<String>,
}

impl RawConfig {
    fn into_partial(self, source: &ConfigSource) -> PartialConfig {
        let locate_bool = |value: bool| Located::new(value, source.clone());
        PartialConfig {
            basic: self.basic.map(locate_bool),
            verbose: self.verbose.map(locate_bool),
            force: self.convert.force.map(locate_bool),
            root: self
                .preview
                .root
                .map(|root| Located::new(root, source.clone())),
            port: self
                .preview
                .port
                .map(|port| Located::new(port, source.clone())),
            host: self
                .preview
                .host
                .map(|host| Located::new(host, source.clone())),
        }
    }
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    basic: Option<Located<bool>>,
    verbose: Option<Located<bool>>,
    force: Option<Located<bool>>,
    root: Option<Located<PathBuf>>,
    port: Option<Located<u16>>,
    host: Option<Located<String>>,
}

struct ResolvedConfig {
    basic: bool,
    verbose: bool,
    convert: ConvertSettings,
    preview: PreviewSettings,
}

impl PartialConfig {
    fn is_empty(&self) -> bool {
        self.basic.is_none()
            && self.verbose.is_none()
            && self.force.is_none()
            && self.root.is_none()
            && self.port.is_none()
            && self.host.is_none()
    }

    fn merge(&mut self, other: PartialConfig) {
        if other.basic.is_some() {
            self.basic = other.basic;
        }
        if other.verbose.is_some() {
            self.verbose = other.verbose;
        }
        if other.force.is_some() {
            self.force = other.force;
        }
        if other.root.is_some() {
            self.root = other.root;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.host.is_some() {
            self.host = other.host;
        }
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let fallback = || ConfigSource::new(ConfigSourceKind::Default, PathBuf::from("."));
        let mut errors = Vec::new();

        let root = self
            .root
            .unwrap_or_else(|| Located::new(PathBuf::from("."), fallback()));
        let port = self
            .port
            .unwrap_or_else(|| Located::new(DEFAULT_PORT, fallback()));
        let host = self
            .host
            .unwrap_or_else(|| Located::new(DEFAULT_HOST.to_owned(), fallback()));

        if port.value == 0 {
            errors.push(ConfigValidationError::new(
                Some(port.source.clone()),
                "preview.port must be between 1 and 65535".into(),
            ));
        }

        if host.value.trim().is_empty() {
            errors.push(ConfigValidationError::new(
                Some(host.source.clone()),
                "preview.host cannot be empty".into(),
            ));
        }

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        Ok(ResolvedConfig {
            basic: self.basic.map(|flag| flag.value).unwrap_or(false),
            verbose: self.verbose.map(|flag| flag.value).unwrap_or(false),
            convert: ConvertSettings {
                force: self.force.map(|flag| flag.value).unwrap_or(false),
            },
            preview: PreviewSettings {
                root: resolve_path(&root),
                port: port.value,
                host: host.value,
            },
        })
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    let path = &located.value;
    if path.is_absolute() {
        path.clone()
    } else if path == Path::new(".") {
        located.source.base_dir.clone()
    } else {
        located.source.base_dir.join(path)
    }
}

/// Collection of validation failures reported together.
#[derive(Clone, Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError { source, message }
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}
