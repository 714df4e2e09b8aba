use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BACKEND_ORIGIN: &str = "http://localhost:8000";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_EXTERNAL_PROBE_URL: &str = "https://httpbin.org/get";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Where `/api/*` is forwarded to.
    pub backend_origin: String,
    pub bind: SocketAddr,
    pub timeout: Duration,
    /// Built wasm UI, served at `/` when set.
    pub ui_dir: Option<PathBuf>,
    pub external_probe_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DASHBOARD_API_URL must be an absolute http(s) URL, got '{0}'")]
    InvalidOrigin(String),
    #[error("DASHBOARD_BIND '{value}' is not a socket address: {source}")]
    InvalidBind {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("DASHBOARD_TIMEOUT_MS '{0}' is not a positive number of milliseconds")]
    InvalidTimeout(String),
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            backend_origin: DEFAULT_BACKEND_ORIGIN.into(),
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3000),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            ui_dir: None,
            external_probe_url: DEFAULT_EXTERNAL_PROBE_URL.into(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend_origin = var("DASHBOARD_API_URL").unwrap_or_else(|| DEFAULT_BACKEND_ORIGIN.into());
        let backend_origin = validate_origin(&backend_origin)?;

        let bind_raw = var("DASHBOARD_BIND").unwrap_or_else(|| DEFAULT_BIND.into());
        let bind = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::InvalidBind {
                value: bind_raw.clone(),
                source,
            })?;

        let timeout = match var("DASHBOARD_TIMEOUT_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
            None => Duration::from_millis(DEFAULT_TIMEOUT_MS),
        };

        Ok(Self {
            backend_origin,
            bind,
            timeout,
            ui_dir: var("DASHBOARD_UI_DIR").map(PathBuf::from),
            external_probe_url: var("DASHBOARD_EXTERNAL_PROBE_URL")
                .unwrap_or_else(|| DEFAULT_EXTERNAL_PROBE_URL.into()),
        })
    }

    /// How this server reaches itself, for probing the proxy path.
    pub fn self_origin(&self) -> String {
        let ip = match self.bind.ip() {
            ip if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            ip => ip,
        };
        format!("http://{}", SocketAddr::new(ip, self.bind.port()))
    }
}

fn validate_origin(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    match reqwest::Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(trimmed.to_string())
        }
        _ => Err(ConfigError::InvalidOrigin(raw.to_string())),
    }
}
