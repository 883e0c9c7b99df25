use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::warn;
use url::Url;

use crate::api::BackendConfig;
use crate::domain::AppError;
use crate::ui::{parse_hex_color, WindowSettings};

pub const DEFAULT_API_PORT: u16 = 8080;
pub const DEFAULT_WEB_PORT: u16 = 8081;

/// Environment variable naming an optional PNG/ICO window icon.
pub const ICON_ENV: &str = "DOCSHELL_WINDOW_ICON";

#[derive(Debug, Parser)]
#[command(
    name = "docshell",
    version,
    about = "Open the PSDocling web interface in a native window"
)]
pub struct Cli {
    /// Port of the backend API
    pub api_port: Option<String>,

    /// Port of the web interface
    pub web_port: Option<String>,

    /// Host both services listen on
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Health checks before giving up
    #[arg(long, default_value_t = 30)]
    pub health_attempts: u32,

    /// Seconds to wait between health checks
    #[arg(long, default_value_t = 1.0)]
    pub health_delay: f64,

    /// Window background as #rrggbb
    #[arg(long, default_value = "#0f1115")]
    pub background: String,

    /// Start in borderless fullscreen
    #[arg(long)]
    pub fullscreen: bool,

    /// Enable the webview developer tools
    #[arg(long)]
    pub devtools: bool,
}

#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub backend: BackendConfig,
    pub web_url: Url,
    pub health_attempts: u32,
    pub health_delay: Duration,
    pub window: WindowSettings,
}

/// Parse a port argument, falling back to `default` (with a warning) when
/// it is not a valid port number.
pub fn parse_port(raw: Option<&str>, default: u16, label: &str) -> u16 {
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid {} port: {}, using default {}", label, value, default);
            default
        }),
    }
}

fn service_url(host: &str, port: u16) -> Result<Url, AppError> {
    Url::parse(&format!("http://{}:{}", host, port))
        .map_err(|e| AppError::Config(format!("invalid host '{}': {}", host, e)))
}

impl LauncherConfig {
    pub fn from_cli(cli: Cli) -> Result<Self, AppError> {
        let api_port = parse_port(cli.api_port.as_deref(), DEFAULT_API_PORT, "API");
        let web_port = parse_port(cli.web_port.as_deref(), DEFAULT_WEB_PORT, "Web");

        let health_delay = Duration::try_from_secs_f64(cli.health_delay).map_err(|_| {
            AppError::Config(format!("invalid health delay: {}", cli.health_delay))
        })?;

        let mut window = WindowSettings {
            fullscreen: cli.fullscreen,
            devtools: cli.devtools,
            icon: std::env::var_os(ICON_ENV).map(PathBuf::from),
            ..WindowSettings::default()
        };
        match parse_hex_color(&cli.background) {
            Some(color) => window.background = color,
            None => warn!("Invalid background color: {}, using default", cli.background),
        }

        Ok(Self {
            backend: BackendConfig::new(service_url(&cli.host, api_port)?),
            web_url: service_url(&cli.host, web_port)?,
            health_attempts: cli.health_attempts,
            health_delay,
            window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("docshell").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port(None, 8080, "API"), 8080);
        assert_eq!(parse_port(Some("9000"), 8080, "API"), 9000);
        assert_eq!(parse_port(Some("abc"), 8080, "API"), 8080);
        assert_eq!(parse_port(Some("70000"), 8081, "Web"), 8081);
    }

    #[test]
    fn test_defaults() {
        let config = LauncherConfig::from_cli(cli(&[])).unwrap();
        assert_eq!(config.backend.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.web_url.as_str(), "http://localhost:8081/");
        assert_eq!(config.health_attempts, 30);
        assert_eq!(config.health_delay, Duration::from_secs(1));
        assert_eq!(config.window.background, (0x0f, 0x11, 0x15, 0xff));
    }

    #[test]
    fn test_positional_ports_with_invalid_fallback() {
        let config = LauncherConfig::from_cli(cli(&["9090", "oops"])).unwrap();
        assert_eq!(config.backend.base_url.port(), Some(9090));
        assert_eq!(config.web_url.port(), Some(8081));
    }

    #[test]
    fn test_invalid_background_keeps_default() {
        let config = LauncherConfig::from_cli(cli(&["--background", "blue"])).unwrap();
        assert_eq!(config.window.background, WindowSettings::default().background);
    }

    #[test]
    fn test_negative_delay_is_rejected() {
        let result = LauncherConfig::from_cli(cli(&["--health-delay=-1"]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
