#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use configuration::settings::Settings;
use configuration::{DataSourceConfig, load_settings_from_str};
use database::{DbError, PoolFactory, connect_options, pool_options};
use sqlx::PgPool;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Credentials of the local PostgreSQL container used by the ignored tests.
pub const POSTGRES_HOST: &str = "127.0.0.1";
pub const POSTGRES_PORT: u16 = 5432;
pub const POSTGRES_USER: &str = "postgres";
pub const POSTGRES_PASSWORD: &str = "secret";
pub const POSTGRES_DATABASE: &str = "testdb";

pub fn skip_if_no_postgres() -> bool {
    env::var("SKIP_POSTGRES_TESTS").is_ok()
}

pub fn raw_args(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Settings for the documented end-to-end scenario.
pub fn intranet_settings() -> Settings {
    load_settings_from_str(
        r#"
        [first]
        host = "db.local"
        username = "svc"
        password = "x"
        session-name = "intranet"

        [first.configuration]
        minimum-idle = 0
        "#,
    )
    .expect("scenario settings must parse")
}

/// A syntactically valid datasource nobody answers on.
pub fn unreachable_settings() -> Settings {
    load_settings_from_str(
        r#"
        [first]
        host = "127.0.0.1"
        port = 1
        username = "svc"
        password = "x"
        session-name = "intranet"

        [first.configuration]
        minimum-idle = 0
        connection-timeout-ms = 500
        "#,
    )
    .expect("unreachable settings must parse")
}

/// Settings pointing at the local PostgreSQL container.
pub fn postgres_settings() -> Settings {
    load_settings_from_str(&format!(
        r#"
        [first]
        host = "{POSTGRES_HOST}"
        port = {POSTGRES_PORT}
        username = "{POSTGRES_USER}"
        password = "{POSTGRES_PASSWORD}"
        database = "{POSTGRES_DATABASE}"
        session-name = "intranet"

        [first.configuration]
        maximum-pool-size = 4
        connection-timeout-ms = 5000
        "#
    ))
    .expect("postgres settings must parse")
}

/// Hands out lazy pools, which open nothing until first use, and counts requests.
#[derive(Debug, Default)]
pub struct CountingFactory {
    calls: AtomicUsize,
}

impl CountingFactory {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PoolFactory for &CountingFactory {
    async fn connect(&self, config: &DataSourceConfig) -> Result<PgPool, DbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(pool_options(&config.pool).connect_lazy_with(connect_options(config)))
    }
}

/// Generate a unique table name for a test
pub fn test_table_name(test_name: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let thread_id = std::thread::current().id();
    let mut hasher = DefaultHasher::new();
    test_name.hash(&mut hasher);
    format!("{thread_id:?}").hash(&mut hasher);

    format!("webssh_tx_test_{:x}", hasher.finish())
}
