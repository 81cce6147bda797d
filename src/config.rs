use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use dotenvy::Error as DotenvError;
use thiserror::Error;

const DEFAULT_VERSION: &str = "1.0.0";
const DEFAULT_URLS: &str = "http://localhost:8080";
const DEFAULT_HTTP_PORT: u16 = 80;
const VERSION_ENV: &str = "APP_VERSION";
const URLS_ENV: &str = "ASPNETCORE_URLS";
const PORT_ENV: &str = "PORT";

/// Configuration consumed by the service before it binds its listener.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    /// Raw `ASPNETCORE_URLS` value the bind address was derived from.
    pub urls: String,
    pub version: String,
}

impl ServiceConfig {
    /// Loads configuration from `APP_VERSION`, `ASPNETCORE_URLS` and `PORT`.
    ///
    /// Values from a local `.env` file (parsed via [`dotenvy::dotenv_override`]) override whatever
    /// is already set in the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_env_overrides()?;

        let version = env::var(VERSION_ENV).unwrap_or_else(|_| DEFAULT_VERSION.to_owned());
        let urls = env::var(URLS_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_URLS.to_owned());

        let mut bind_addr = parse_urls(&urls)?;
        if let Some(port) = port_override() {
            bind_addr.set_port(port);
        }

        Ok(Self {
            bind_addr,
            urls,
            version,
        })
    }

    /// Returns a builder for programmatic overrides.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }
}

impl Default for ServiceConfig {
    /// Binds to `127.0.0.1:8080` and reports version `1.0.0`.
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
            urls: DEFAULT_URLS.to_owned(),
            version: DEFAULT_VERSION.to_owned(),
        }
    }
}

/// Builder type for [`ServiceConfig`].
#[derive(Default, Clone, Debug)]
pub struct ServiceConfigBuilder {
    bind_addr: Option<SocketAddr>,
    version: Option<String>,
}

impl ServiceConfigBuilder {
    /// Sets the address for the Axum listener.
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = Some(addr);
        self
    }

    /// Sets the version string reported by `/` and `/metrics`.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Builds the final configuration.
    pub fn build(self) -> ServiceConfig {
        let defaults = ServiceConfig::default();
        let bind_addr = self.bind_addr.unwrap_or(defaults.bind_addr);
        let urls = match self.bind_addr {
            Some(addr) => format!("http://{addr}"),
            None => defaults.urls,
        };

        ServiceConfig {
            bind_addr,
            urls,
            version: self.version.unwrap_or(defaults.version),
        }
    }
}

/// Errors that can occur while building [`ServiceConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid listen url: {0}")]
    InvalidUrl(String),
    #[error("unsupported scheme in listen url {0}: only http is served")]
    UnsupportedScheme(String),
    #[error("invalid port in listen url: {0}")]
    InvalidPort(String),
    #[error("failed to load .env overrides: {0}")]
    Dotenv(#[from] DotenvError),
}

fn load_env_overrides() -> Result<(), ConfigError> {
    match dotenvy::dotenv_override() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::Dotenv(err)),
    }
}

fn port_override() -> Option<u16> {
    env::var(PORT_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
}

/// Resolves the first entry of a `;`-separated listen url list into a socket address.
///
/// `+`, `*` and unresolved host names bind every interface, `localhost` binds loopback.
pub fn parse_urls(urls: &str) -> Result<SocketAddr, ConfigError> {
    let first = urls
        .split(';')
        .map(str::trim)
        .find(|entry| !entry.is_empty())
        .ok_or_else(|| ConfigError::InvalidUrl(urls.to_owned()))?;

    parse_url(first)
}

fn parse_url(url: &str) -> Result<SocketAddr, ConfigError> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| ConfigError::InvalidUrl(url.to_owned()))?;
    if !scheme.eq_ignore_ascii_case("http") {
        return Err(ConfigError::UnsupportedScheme(url.to_owned()));
    }

    let authority = rest.split('/').next().unwrap_or_default();
    if authority.is_empty() {
        return Err(ConfigError::InvalidUrl(url.to_owned()));
    }

    let (host, port) =
        split_authority(authority).ok_or_else(|| ConfigError::InvalidUrl(url.to_owned()))?;
    let port = match port {
        Some(port) => port
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(url.to_owned()))?,
        None => DEFAULT_HTTP_PORT,
    };

    Ok(SocketAddr::new(resolve_host(host), port))
}

fn split_authority(authority: &str) -> Option<(&str, Option<&str>)> {
    if let Some(bracketed) = authority.strip_prefix('[') {
        let (host, tail) = bracketed.split_once(']')?;
        return match tail {
            "" => Some((host, None)),
            _ => Some((host, Some(tail.strip_prefix(':')?))),
        };
    }

    match authority.rsplit_once(':') {
        Some((host, port)) => Some((host, Some(port))),
        None => Some((authority, None)),
    }
}

fn resolve_host(host: &str) -> IpAddr {
    match host {
        "+" | "*" => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        _ if host.eq_ignore_ascii_case("localhost") => IpAddr::V4(Ipv4Addr::LOCALHOST),
        _ => host.parse::<IpAddr>().unwrap_or_else(|_| {
            tracing::warn!(%host, "listen host is not an ip address; binding all interfaces");
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        }),
    }
}
