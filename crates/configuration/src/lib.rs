use crate::error::ConfigError;
use crate::settings::Settings;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{DataSourceConfig, Driver, PoolTuning, RawDataSource, RawPoolTuning};

/// Settings file looked up when `WEBSSH_CONFIG` is not set (any extension `config` understands).
pub const DEFAULT_SETTINGS_FILE: &str = "webssh";
/// Names an alternative settings file.
pub const SETTINGS_FILE_ENV: &str = "WEBSSH_CONFIG";
/// Prefix of the environment overrides, e.g. `WEBSSH__FIRST__HOST`.
pub const ENV_PREFIX: &str = "WEBSSH";

/// The environment source for the `webssh` namespace.
///
/// `WEBSSH__FIRST__CONFIGURATION__MAXIMUM_POOL_SIZE` maps to
/// `webssh.first.configuration.maximum-pool-size`.
///
/// Values stay strings; numeric fields are converted on deserialization, so
/// a password such as `0123` is never reinterpreted as a number.
pub fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
}

/// Loads the application settings.
///
/// This function is the primary entry point for this crate. It loads `.env`,
/// reads the optional settings file, and overlays the `WEBSSH__*` environment
/// on top of it. The two layers are deserialized separately so that a
/// `session-name` in the file and a `SESSION_NAME` in the environment land on
/// the same field. Field validation happens later, in [`Settings::data_source`].
pub fn load_settings() -> Result<Settings, ConfigError> {
    // A missing .env is not an error; the variables may come from the real environment.
    dotenvy::dotenv().ok();

    let file = std::env::var(SETTINGS_FILE_ENV).unwrap_or_else(|_| DEFAULT_SETTINGS_FILE.to_string());
    tracing::debug!(file = %file, "Loading settings.");

    let from_file = deserialize_layer(config::File::with_name(&file).required(false))?;
    let from_env = deserialize_layer(environment())?;

    Ok(from_file.overlay(from_env))
}

/// Deserializes settings from TOML text, without consulting the environment.
pub fn load_settings_from_str(toml: &str) -> Result<Settings, ConfigError> {
    deserialize_layer(config::File::from_str(toml, config::FileFormat::Toml))
}

fn deserialize_layer<S>(source: S) -> Result<Settings, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let builder = config::Config::builder().add_source(source).build()?;

    // Attempt to deserialize the layer into our raw `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;

    Ok(settings)
}
