use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub services: ServiceEndpoints,
    pub session: SessionConfig,
    pub registration: RegistrationSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let timeout_ms = env::var("RENTIFY_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "10000".to_string())
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidTimeout)?;
        let request_timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));

        let services = ServiceEndpoints {
            user: service_url("RENTIFY_USER_SERVICE_URL", "http://localhost:8081/api")?,
            property: service_url("RENTIFY_PROPERTY_SERVICE_URL", "http://localhost:8082/api")?,
            document: service_url("RENTIFY_DOCUMENT_SERVICE_URL", "http://localhost:8083/api")?,
            application: service_url(
                "RENTIFY_APPLICATION_SERVICE_URL",
                "http://localhost:8084/api",
            )?,
            contact: service_url("RENTIFY_CONTACT_SERVICE_URL", "http://localhost:8085/api")?,
            request_timeout,
        };

        let session_path = env::var("RENTIFY_SESSION_PATH")
            .unwrap_or_else(|_| ".rentify/session.json".to_string());

        let affiliate_domains = env::var("RENTIFY_AFFILIATE_DOMAINS")
            .map(|raw| parse_domains(&raw))
            .unwrap_or_else(|_| RegistrationSettings::default().affiliate_domains);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            services,
            session: SessionConfig {
                path: PathBuf::from(session_path),
            },
            registration: RegistrationSettings { affiliate_domains },
        })
    }
}

fn service_url(key: &'static str, default: &str) -> Result<String, ConfigError> {
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    let value = value.trim().trim_end_matches('/').to_string();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value)
    } else {
        Err(ConfigError::InvalidServiceUrl { key })
    }
}

fn parse_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|domain| domain.trim().trim_start_matches('@').to_ascii_lowercase())
        .filter(|domain| !domain.is_empty())
        .collect()
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Base URLs of the backend microservices plus the shared request timeout.
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub user: String,
    pub property: String,
    pub document: String,
    pub application: String,
    pub contact: String,
    pub request_timeout: Option<Duration>,
}

/// Where the persisted session record lives.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub path: PathBuf,
}

/// Knobs used when building the account-creation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSettings {
    pub affiliate_domains: Vec<String>,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            affiliate_domains: vec!["duocuc.cl".to_string(), "profesor.duoc.cl".to_string()],
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout,
    InvalidServiceUrl { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "RENTIFY_REQUEST_TIMEOUT_MS must be a whole number of milliseconds")
            }
            ConfigError::InvalidServiceUrl { key } => {
                write!(f, "{key} must be an http:// or https:// URL")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTimeout
            | ConfigError::InvalidServiceUrl { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "RENTIFY_USER_SERVICE_URL",
            "RENTIFY_PROPERTY_SERVICE_URL",
            "RENTIFY_DOCUMENT_SERVICE_URL",
            "RENTIFY_APPLICATION_SERVICE_URL",
            "RENTIFY_CONTACT_SERVICE_URL",
            "RENTIFY_REQUEST_TIMEOUT_MS",
            "RENTIFY_SESSION_PATH",
            "RENTIFY_AFFILIATE_DOMAINS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.services.user, "http://localhost:8081/api");
        assert_eq!(config.services.contact, "http://localhost:8085/api");
        assert_eq!(
            config.services.request_timeout,
            Some(Duration::from_millis(10_000))
        );
        assert_eq!(config.session.path, PathBuf::from(".rentify/session.json"));
        assert_eq!(
            config.registration.affiliate_domains,
            vec!["duocuc.cl".to_string(), "profesor.duoc.cl".to_string()]
        );
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn zero_timeout_disables_request_deadline() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RENTIFY_REQUEST_TIMEOUT_MS", "0");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.services.request_timeout, None);
        reset_env();
    }

    #[test]
    fn rejects_service_urls_without_scheme() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RENTIFY_DOCUMENT_SERVICE_URL", "localhost:8083/api");
        match AppConfig::load() {
            Err(ConfigError::InvalidServiceUrl { key }) => {
                assert_eq!(key, "RENTIFY_DOCUMENT_SERVICE_URL")
            }
            other => panic!("expected invalid service url, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn affiliate_domains_are_normalized() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("RENTIFY_AFFILIATE_DOMAINS", " @DuocUC.cl , ,example.edu");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.registration.affiliate_domains,
            vec!["duocuc.cl".to_string(), "example.edu".to_string()]
        );
        reset_env();
    }
}
