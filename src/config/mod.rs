//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{
    net::SocketAddr,
    num::NonZeroUsize,
    path::PathBuf,
    str::FromStr,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::surface::{CompilationSection, ConfigurationSource};

pub use cli::{CheckArgs, CliArgs, Command, ServeArgs, ServeOverrides, SiteOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "veneer";
const ENV_PREFIX: &str = "VENEER";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_VIEWS_DIR: &str = "views";
const DEFAULT_CONTENT_FILE: &str = "content.toml";
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000/";
const DEFAULT_CACHE_RESPONSE_LIMIT: u64 = 200;
const DEFAULT_CACHE_BODY_LIMIT_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub views: ViewSettings,
    pub content: ContentSettings,
    pub cache: CacheSettings,
    /// `None` when the configuration has no `[compilation]` table.
    pub compilation: Option<CompilationSection>,
    pub surface: SurfaceSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub directory: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub file: PathBuf,
    /// Always ends with `/` so node paths join beneath it.
    pub base_url: Url,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub response_limit: NonZeroUsize,
    pub body_limit_bytes: NonZeroUsize,
}

#[derive(Debug, Clone, Default)]
pub struct SurfaceSettings {
    /// Template rendered for failed requests; the built-in page when unset.
    pub error_template: Option<String>,
}

impl ConfigurationSource for Settings {
    fn compilation_section(&self) -> Option<CompilationSection> {
        self.compilation
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Check(args)) => raw.apply_site_overrides(&args.site),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    views: RawViewSettings,
    content: RawContentSettings,
    cache: RawCacheSettings,
    compilation: Option<RawCompilationSettings>,
    surface: RawSurfaceSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(limit) = overrides.cache_response_limit {
            self.cache.response_limit = Some(limit);
        }
        if let Some(debug) = overrides.debug {
            self.compilation.get_or_insert_with(Default::default).debug = Some(debug);
        }

        self.apply_site_overrides(&overrides.site);
    }

    fn apply_site_overrides(&mut self, overrides: &SiteOverrides) {
        if let Some(directory) = overrides.views_directory.as_ref() {
            self.views.directory = Some(directory.clone());
        }
        if let Some(file) = overrides.content_file.as_ref() {
            self.content.file = Some(file.clone());
        }
        if let Some(base_url) = overrides.base_url.as_ref() {
            self.content.base_url = Some(base_url.clone());
        }
        if let Some(template) = overrides.error_template.as_ref() {
            self.surface.error_template = Some(template.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            views,
            content,
            cache,
            compilation,
            surface,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            views: build_view_settings(views)?,
            content: build_content_settings(content)?,
            cache: build_cache_settings(cache)?,
            compilation: compilation.map(|raw| CompilationSection {
                debug: raw.debug.unwrap_or(false),
            }),
            surface: build_surface_settings(surface),
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_view_settings(views: RawViewSettings) -> Result<ViewSettings, LoadError> {
    let directory = views
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_VIEWS_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "views.directory",
            "path must not be empty",
        ));
    }

    Ok(ViewSettings { directory })
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let file = content
        .file
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_FILE));
    if file.as_os_str().is_empty() {
        return Err(LoadError::invalid("content.file", "path must not be empty"));
    }

    let raw_url = content
        .base_url
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let mut base_url = Url::parse(raw_url.trim())
        .map_err(|err| LoadError::invalid("content.base_url", format!("invalid url: {err}")))?;
    if base_url.cannot_be_a_base() {
        return Err(LoadError::invalid(
            "content.base_url",
            "url cannot be used as a base",
        ));
    }
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }

    Ok(ContentSettings { file, base_url })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let response_limit = non_zero_usize(
        cache.response_limit.unwrap_or(DEFAULT_CACHE_RESPONSE_LIMIT),
        "cache.response_limit",
    )?;
    let body_limit_bytes = non_zero_usize(
        cache
            .body_limit_bytes
            .unwrap_or(DEFAULT_CACHE_BODY_LIMIT_BYTES),
        "cache.body_limit_bytes",
    )?;

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        response_limit,
        body_limit_bytes,
    })
}

fn build_surface_settings(surface: RawSurfaceSettings) -> SurfaceSettings {
    let error_template = surface.error_template.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    SurfaceSettings { error_template }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawViewSettings {
    directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    file: Option<PathBuf>,
    base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    response_limit: Option<u64>,
    body_limit_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCompilationSettings {
    debug: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSurfaceSettings {
    error_template: Option<String>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}
