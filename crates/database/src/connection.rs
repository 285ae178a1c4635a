use crate::error::DbError;
use configuration::{DataSourceConfig, PoolTuning};
use log::LevelFilter;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::future::Future;

/// Reported to the server as `application_name`.
pub const APPLICATION_NAME: &str = "webssh";

/// Level every executed statement is echoed at. Visible under the default
/// `info` filter.
pub const STATEMENT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Builds the primary connection pool from a validated datasource.
///
/// The bootstrap only ever talks to the pool through this trait.
pub trait PoolFactory {
    fn connect(
        &self,
        config: &DataSourceConfig,
    ) -> impl Future<Output = Result<PgPool, DbError>> + Send;
}

/// The production factory: connects eagerly and fails on the first error.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgPoolFactory;

impl PoolFactory for PgPoolFactory {
    async fn connect(&self, config: &DataSourceConfig) -> Result<PgPool, DbError> {
        connect(config).await
    }
}

/// Establishes the primary connection pool to the PostgreSQL database.
///
/// At least one physical connection is opened before this returns, so an
/// unreachable host or a rejected login surfaces here rather than on first
/// use. A stalled connect is bounded by `connection_timeout` and surfaces as
/// `sqlx::Error::PoolTimedOut`. Nothing is retried beyond that window.
pub async fn connect(config: &DataSourceConfig) -> Result<PgPool, DbError> {
    tracing::info!(
        host = %config.host,
        port = config.port,
        database = %config.database,
        username = %config.username,
        "Connecting primary pool."
    );

    let pool = pool_options(&config.pool)
        .connect_with(connect_options(config))
        .await
        .inspect_err(|e| tracing::error!(host = %config.host, error = %e, "Primary pool could not be initialized."))?;

    tracing::info!(
        max_connections = config.pool.max_size,
        min_connections = config.pool.min_idle,
        open = pool.size(),
        "Primary pool ready."
    );

    Ok(pool)
}

/// Every connection the pool opens, including the first eager one, echoes its SQL.
pub fn connect_options(config: &DataSourceConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .password(&config.password)
        .database(&config.database)
        .application_name(APPLICATION_NAME)
        .log_statements(STATEMENT_LOG_LEVEL)
}

/// Maps the configured bounded-checkout discipline onto sqlx.
pub fn pool_options(tuning: &PoolTuning) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(tuning.max_size)
        .min_connections(tuning.min_idle)
        .acquire_timeout(tuning.connection_timeout)
        .idle_timeout(tuning.idle_timeout)
        .max_lifetime(tuning.max_lifetime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use configuration::Driver;
    use std::time::Duration;

    fn unreachable() -> DataSourceConfig {
        DataSourceConfig {
            host: "127.0.0.1".into(),
            // Nothing listens here.
            port: 1,
            username: "svc".into(),
            password: "x".into(),
            database: "webssh".into(),
            driver: Driver::Postgres,
            session_name: "intranet".into(),
            pool: PoolTuning {
                max_size: 2,
                min_idle: 0,
                connection_timeout: Duration::from_millis(300),
                idle_timeout: None,
                max_lifetime: None,
            },
        }
    }

    #[test]
    fn test_pool_options_follow_tuning() {
        let tuning = PoolTuning {
            max_size: 7,
            min_idle: 3,
            connection_timeout: Duration::from_secs(2),
            idle_timeout: Some(Duration::from_secs(60)),
            max_lifetime: None,
        };
        let options = pool_options(&tuning);
        assert_eq!(options.get_max_connections(), 7);
        assert_eq!(options.get_min_connections(), 3);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(2));
        assert_eq!(options.get_idle_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(options.get_max_lifetime(), None);
    }

    #[test]
    fn test_connect_options_follow_config() {
        let options = connect_options(&unreachable());
        assert_eq!(options.get_host(), "127.0.0.1");
        assert_eq!(options.get_port(), 1);
        assert_eq!(options.get_username(), "svc");
        assert_eq!(options.get_database(), Some("webssh"));
        assert_eq!(options.get_application_name(), Some(APPLICATION_NAME));
    }

    #[tokio::test]
    async fn test_pool_is_built_with_statement_echo() {
        let config = unreachable();
        let pool = pool_options(&config.pool).connect_lazy_with(connect_options(&config));

        let options = format!("{:?}", pool.connect_options());
        assert!(options.contains("statements_level: Info"), "{options}");

        let defaults = format!("{:?}", PgConnectOptions::new());
        assert!(!defaults.contains("statements_level: Info"), "{defaults}");
    }

    #[tokio::test]
    async fn test_unreachable_host_fails_at_construction() {
        let result = PgPoolFactory.connect(&unreachable()).await;
        assert!(matches!(result, Err(DbError::ConnectionError(_))));
    }
}
