use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_DATABASE: &str = "webssh";
pub const DEFAULT_MAX_POOL_SIZE: u32 = 10;
pub const DEFAULT_MIN_IDLE: u32 = 1;
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 30_000;

/// The root configuration structure, i.e. the `webssh` namespace.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    /// The primary datasource, `webssh.first.*`.
    #[serde(default)]
    pub first: RawDataSource,
}

impl Settings {
    /// Validates the primary datasource, optionally replacing the configured
    /// host with the one given on the command line.
    pub fn data_source(&self, host_override: Option<&str>) -> Result<DataSourceConfig, ConfigError> {
        self.first.validate(host_override)
    }

    /// Layers `over` on top of `self`: every key set in `over` wins.
    pub fn overlay(self, over: Settings) -> Settings {
        Settings {
            first: self.first.overlay(over.first),
        }
    }
}

/// `webssh.first.*` exactly as it was read. Nothing here has been checked yet.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawDataSource {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub driver: Option<String>,
    #[serde(alias = "session_name")]
    pub session_name: Option<String>,
    /// Pool tuning, `webssh.first.configuration.*`.
    #[serde(default)]
    pub configuration: RawPoolTuning,
}

/// `webssh.first.configuration.*` exactly as it was read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawPoolTuning {
    #[serde(alias = "maximum_pool_size")]
    pub maximum_pool_size: Option<u32>,
    #[serde(alias = "minimum_idle")]
    pub minimum_idle: Option<u32>,
    #[serde(alias = "connection_timeout_ms")]
    pub connection_timeout_ms: Option<u64>,
    #[serde(alias = "idle_timeout_ms")]
    pub idle_timeout_ms: Option<u64>,
    #[serde(alias = "max_lifetime_ms")]
    pub max_lifetime_ms: Option<u64>,
}

impl fmt::Debug for RawDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDataSource")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("driver", &self.driver)
            .field("session_name", &self.session_name)
            .field("configuration", &self.configuration)
            .finish()
    }
}

impl RawDataSource {
    pub fn overlay(self, over: RawDataSource) -> RawDataSource {
        RawDataSource {
            host: over.host.or(self.host),
            port: over.port.or(self.port),
            username: over.username.or(self.username),
            password: over.password.or(self.password),
            database: over.database.or(self.database),
            driver: over.driver.or(self.driver),
            session_name: over.session_name.or(self.session_name),
            configuration: self.configuration.overlay(over.configuration),
        }
    }

    /// Parses and validates every field, applying explicit defaults.
    ///
    /// Nothing in here touches the network; a configuration that fails this
    /// step never reaches the pool.
    pub fn validate(&self, host_override: Option<&str>) -> Result<DataSourceConfig, ConfigError> {
        let host = match host_override.or(self.host.as_deref()) {
            Some(host) => validate_host(host)?,
            None => return Err(ConfigError::missing("webssh.first.host")),
        };
        let username = required(&self.username, "webssh.first.username")?;
        let password = self
            .password
            .clone()
            .ok_or_else(|| ConfigError::missing("webssh.first.password"))?;
        let session_name = required(&self.session_name, "webssh.first.session-name")?;

        let driver = match self.driver.as_deref() {
            Some(driver) => driver.parse::<Driver>()?,
            None => Driver::Postgres,
        };
        let port = match self.port {
            Some(0) => return Err(ConfigError::invalid("webssh.first.port", "port must be non-zero")),
            Some(port) => port,
            None => DEFAULT_PORT,
        };
        let database = match self.database.as_deref().map(str::trim) {
            Some("") => {
                return Err(ConfigError::invalid("webssh.first.database", "must not be empty"));
            }
            Some(database) => database.to_string(),
            None => DEFAULT_DATABASE.to_string(),
        };

        Ok(DataSourceConfig {
            host,
            port,
            username,
            password,
            database,
            driver,
            session_name,
            pool: self.configuration.validate()?,
        })
    }
}

impl RawPoolTuning {
    pub fn overlay(self, over: RawPoolTuning) -> RawPoolTuning {
        RawPoolTuning {
            maximum_pool_size: over.maximum_pool_size.or(self.maximum_pool_size),
            minimum_idle: over.minimum_idle.or(self.minimum_idle),
            connection_timeout_ms: over.connection_timeout_ms.or(self.connection_timeout_ms),
            idle_timeout_ms: over.idle_timeout_ms.or(self.idle_timeout_ms),
            max_lifetime_ms: over.max_lifetime_ms.or(self.max_lifetime_ms),
        }
    }

    pub fn validate(&self) -> Result<PoolTuning, ConfigError> {
        let max_size = self.maximum_pool_size.unwrap_or(DEFAULT_MAX_POOL_SIZE);
        if max_size == 0 {
            return Err(ConfigError::invalid(
                "webssh.first.configuration.maximum-pool-size",
                "must be at least 1",
            ));
        }

        let min_idle = self.minimum_idle.unwrap_or(DEFAULT_MIN_IDLE.min(max_size));
        if min_idle > max_size {
            return Err(ConfigError::invalid(
                "webssh.first.configuration.minimum-idle",
                format!("{min_idle} exceeds maximum-pool-size {max_size}"),
            ));
        }

        let timeout_ms = self
            .connection_timeout_ms
            .unwrap_or(DEFAULT_CONNECTION_TIMEOUT_MS);
        if timeout_ms == 0 {
            return Err(ConfigError::invalid(
                "webssh.first.configuration.connection-timeout-ms",
                "must be greater than zero",
            ));
        }

        Ok(PoolTuning {
            max_size,
            min_idle,
            connection_timeout: Duration::from_millis(timeout_ms),
            idle_timeout: self.idle_timeout_ms.map(Duration::from_millis),
            max_lifetime: self.max_lifetime_ms.map(Duration::from_millis),
        })
    }
}

/// Validated datasource for the primary pool. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct DataSourceConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub driver: Driver,
    pub session_name: String,
    pub pool: PoolTuning,
}

impl fmt::Debug for DataSourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("driver", &self.driver)
            .field("session_name", &self.session_name)
            .field("pool", &self.pool)
            .finish()
    }
}

/// Bounded-checkout discipline handed to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolTuning {
    pub max_size: u32,
    pub min_idle: u32,
    /// How long a checkout (and the initial connect) may wait.
    pub connection_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolTuning {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_POOL_SIZE,
            min_idle: DEFAULT_MIN_IDLE,
            connection_timeout: Duration::from_millis(DEFAULT_CONNECTION_TIMEOUT_MS),
            idle_timeout: None,
            max_lifetime: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Postgres,
}

impl FromStr for Driver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            other => Err(ConfigError::invalid(
                "webssh.first.driver",
                format!("unsupported driver '{other}'"),
            )),
        }
    }
}

/// Blank values are rejected; anything else is kept exactly as written.
fn required(value: &Option<String>, key: &str) -> Result<String, ConfigError> {
    match value {
        None => Err(ConfigError::missing(key)),
        Some(value) if value.trim().is_empty() => Err(ConfigError::invalid(key, "must not be empty")),
        Some(value) => Ok(value.clone()),
    }
}

/// Accepts an IP literal (IPv6 optionally bracketed) or a DNS hostname.
fn validate_host(raw: &str) -> Result<String, ConfigError> {
    const KEY: &str = "webssh.first.host";

    let host = raw.trim();
    if host.is_empty() {
        return Err(ConfigError::invalid(KEY, "must not be empty"));
    }

    let unbracketed = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if unbracketed.parse::<IpAddr>().is_ok() {
        return Ok(unbracketed.to_string());
    }

    if host.len() > 253 {
        return Err(ConfigError::invalid(KEY, "hostname longer than 253 characters"));
    }
    for label in host.split('.') {
        if label.is_empty() || label.len() > 63 {
            return Err(ConfigError::invalid(KEY, format!("'{host}' is not a valid hostname")));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(ConfigError::invalid(KEY, format!("'{host}' is not a valid hostname")));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::invalid(KEY, format!("'{host}' is not a valid hostname")));
        }
    }

    Ok(host.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> RawDataSource {
        RawDataSource {
            host: Some("db.local".into()),
            username: Some("svc".into()),
            password: Some("x".into()),
            session_name: Some("intranet".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_applies_defaults() {
        let config = raw().validate(None).unwrap();
        assert_eq!(config.host, "db.local");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.database, DEFAULT_DATABASE);
        assert_eq!(config.driver, Driver::Postgres);
        assert_eq!(config.session_name, "intranet");
        assert_eq!(config.pool, PoolTuning::default());
    }

    #[test]
    fn test_host_override_wins() {
        let config = raw().validate(Some("127.0.0.1")).unwrap();
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_override_supplies_missing_host() {
        let mut source = raw();
        source.host = None;
        let config = source.validate(Some("10.0.0.7")).unwrap();
        assert_eq!(config.host, "10.0.0.7");
    }

    #[test]
    fn test_missing_required_keys() {
        for key in [
            "webssh.first.host",
            "webssh.first.username",
            "webssh.first.password",
            "webssh.first.session-name",
        ] {
            let mut source = raw();
            match key {
                "webssh.first.host" => source.host = None,
                "webssh.first.username" => source.username = None,
                "webssh.first.password" => source.password = None,
                _ => source.session_name = None,
            }
            match source.validate(None) {
                Err(ConfigError::MissingKey(k)) => assert_eq!(k, key),
                other => panic!("expected missing {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_session_name_is_not_trimmed() {
        let mut source = raw();
        source.session_name = Some(" Intranet-01 ".into());
        let config = source.validate(None).unwrap();
        assert_eq!(config.session_name, " Intranet-01 ");
    }

    #[test]
    fn test_empty_session_name_is_invalid() {
        let mut source = raw();
        source.session_name = Some("   ".into());
        assert!(matches!(
            source.validate(None),
            Err(ConfigError::InvalidValue { key, .. }) if key == "webssh.first.session-name"
        ));
    }

    #[test]
    fn test_unparsable_hosts() {
        for host in ["", "db local", "bad..host", "-lead.example", "db/1", "under,score"] {
            let mut source = raw();
            source.host = Some(host.into());
            assert!(
                matches!(source.validate(None), Err(ConfigError::InvalidValue { .. })),
                "host {host:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_ip_hosts() {
        assert_eq!(validate_host("192.168.1.10").unwrap(), "192.168.1.10");
        assert_eq!(validate_host("[::1]").unwrap(), "::1");
        assert_eq!(validate_host(" fe80::1 ").unwrap(), "fe80::1");
    }

    #[test]
    fn test_unsupported_driver() {
        let mut source = raw();
        source.driver = Some("mysql".into());
        assert!(matches!(
            source.validate(None),
            Err(ConfigError::InvalidValue { key, .. }) if key == "webssh.first.driver"
        ));

        source.driver = Some("PostgreSQL".into());
        assert_eq!(source.validate(None).unwrap().driver, Driver::Postgres);
    }

    #[test]
    fn test_pool_tuning_bounds() {
        let zero_max = RawPoolTuning {
            maximum_pool_size: Some(0),
            ..Default::default()
        };
        assert!(zero_max.validate().is_err());

        let idle_over_max = RawPoolTuning {
            maximum_pool_size: Some(2),
            minimum_idle: Some(3),
            ..Default::default()
        };
        assert!(idle_over_max.validate().is_err());

        let zero_timeout = RawPoolTuning {
            connection_timeout_ms: Some(0),
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_pool_tuning_values() {
        let tuning = RawPoolTuning {
            maximum_pool_size: Some(4),
            minimum_idle: Some(2),
            connection_timeout_ms: Some(1500),
            idle_timeout_ms: Some(60_000),
            max_lifetime_ms: None,
        }
        .validate()
        .unwrap();

        assert_eq!(tuning.max_size, 4);
        assert_eq!(tuning.min_idle, 2);
        assert_eq!(tuning.connection_timeout, Duration::from_millis(1500));
        assert_eq!(tuning.idle_timeout, Some(Duration::from_secs(60)));
        assert_eq!(tuning.max_lifetime, None);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = raw().validate(None).unwrap();
        let printed = format!("{config:?}");
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("password: \"x\""));
        assert!(!format!("{:?}", raw()).contains("\"x\""));
    }
}
