use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the Veneer binary.
#[derive(Debug, Parser)]
#[command(name = "veneer", version, about = "Veneer front-end server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "VENEER_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Serve the content tree over HTTP.
    Serve(Box<ServeArgs>),
    /// Verify every content node resolves to a template file.
    Check(CheckArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub site: SiteOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct SiteOverrides {
    /// Override the views directory.
    #[arg(long = "views-directory", value_name = "PATH")]
    pub views_directory: Option<PathBuf>,

    /// Override the content tree file.
    #[arg(long = "content-file", value_name = "PATH")]
    pub content_file: Option<PathBuf>,

    /// Override the public base URL used for absolute content URLs.
    #[arg(long = "content-base-url", value_name = "URL")]
    pub base_url: Option<String>,

    /// Override the template used for custom error pages.
    #[arg(long = "error-template", value_name = "NAME")]
    pub error_template: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub site: SiteOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Toggle the output cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the maximum number of cached responses.
    #[arg(long = "cache-response-limit", value_name = "COUNT")]
    pub cache_response_limit: Option<u64>,

    /// Set compilation debug mode; debug mode shows diagnostics instead of error views.
    #[arg(
        long = "debug",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub debug: Option<bool>,
}
