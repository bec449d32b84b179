use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_EXCHANGE_RATE_URL: &str = "https://dolarapi.com/v1/dolares/oficial";

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
    pub registry: RegistryConfig,
    pub exchange: ExchangeConfig,
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

        let bank_rates_csv = env::var("BANK_RATES_CSV")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            registry: RegistryConfig { bank_rates_csv },
            exchange: ExchangeConfig::from_env()?,
        })
    }
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

/// Where the reference tables come from at startup.
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    pub bank_rates_csv: Option<PathBuf>,
}

/// Upstream dollar quote settings.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub url: String,
    pub timeout: Duration,
    pub fallback_rate: f64,
    pub disabled: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_EXCHANGE_RATE_URL.to_string(),
            timeout: Duration::from_millis(2500),
            fallback_rate: 1000.0,
            disabled: false,
        }
    }
}

impl ExchangeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let url = env::var("EXCHANGE_RATE_URL").unwrap_or(defaults.url);

        let timeout = match env::var("EXCHANGE_RATE_TIMEOUT_MS") {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(millis) if millis > 0 => Duration::from_millis(millis),
                _ => return Err(ConfigError::InvalidExchangeTimeout),
            },
            Err(_) => defaults.timeout,
        };

        let fallback_rate = match env::var("EXCHANGE_RATE_FALLBACK") {
            Ok(raw) => match raw.trim().parse::<f64>() {
                Ok(rate) if rate.is_finite() && rate > 0.0 => rate,
                _ => return Err(ConfigError::InvalidExchangeFallback),
            },
            Err(_) => defaults.fallback_rate,
        };

        let disabled = env::var("EXCHANGE_RATE_DISABLED")
            .map(|raw| matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            url,
            timeout,
            fallback_rate,
            disabled,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidExchangeTimeout,
    InvalidExchangeFallback,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidExchangeTimeout => write!(
                f,
                "EXCHANGE_RATE_TIMEOUT_MS must be a positive number of milliseconds"
            ),
            ConfigError::InvalidExchangeFallback => {
                write!(f, "EXCHANGE_RATE_FALLBACK must be a positive number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidExchangeTimeout
            | ConfigError::InvalidExchangeFallback => None,
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
            "BANK_RATES_CSV",
            "EXCHANGE_RATE_URL",
            "EXCHANGE_RATE_TIMEOUT_MS",
            "EXCHANGE_RATE_FALLBACK",
            "EXCHANGE_RATE_DISABLED",
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
        assert!(config.registry.bank_rates_csv.is_none());
        assert_eq!(config.exchange.url, DEFAULT_EXCHANGE_RATE_URL);
        assert_eq!(config.exchange.timeout, Duration::from_millis(2500));
        assert!(!config.exchange.disabled);
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
    fn reads_exchange_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("EXCHANGE_RATE_TIMEOUT_MS", "800");
        env::set_var("EXCHANGE_RATE_FALLBACK", "1250.5");
        env::set_var("EXCHANGE_RATE_DISABLED", "true");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.exchange.timeout, Duration::from_millis(800));
        assert_eq!(config.exchange.fallback_rate, 1250.5);
        assert!(config.exchange.disabled);
        reset_env();
    }

    #[test]
    fn rejects_non_positive_fallback_rate() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("EXCHANGE_RATE_FALLBACK", "0");
        let err = AppConfig::load().expect_err("zero fallback rejected");
        assert!(matches!(err, ConfigError::InvalidExchangeFallback));
        reset_env();
    }

    #[test]
    fn rejects_invalid_port() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PORT", "not-a-port");
        let err = AppConfig::load().expect_err("port rejected");
        assert!(matches!(err, ConfigError::InvalidPort));
        reset_env();
    }
}
