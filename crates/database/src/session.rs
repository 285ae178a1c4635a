use crate::error::DbError;
use std::collections::BTreeMap;
use std::fmt;

/// The recognized session options. No other keys ever appear in a
/// [`SessionProperties`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionOption {
    Weaving,
    SessionName,
    LoggingExceptions,
    LoggingSession,
    LoggingParameters,
    NativeSql,
}

impl SessionOption {
    pub const ALL: [SessionOption; 6] = [
        SessionOption::Weaving,
        SessionOption::SessionName,
        SessionOption::LoggingExceptions,
        SessionOption::LoggingSession,
        SessionOption::LoggingParameters,
        SessionOption::NativeSql,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SessionOption::Weaving => "weaving",
            SessionOption::SessionName => "session-name",
            SessionOption::LoggingExceptions => "logging.exceptions",
            SessionOption::LoggingSession => "logging.session",
            SessionOption::LoggingParameters => "logging.parameters",
            SessionOption::NativeSql => "native-sql",
        }
    }
}

impl fmt::Display for SessionOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Whether runtime instrumentation is available to the persistence layer.
///
/// Entities here do their own lazy loading, so this is informational: it is
/// recorded in the session properties and logged, nothing more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeavingMode {
    /// A global `tracing` dispatcher is installed.
    Dynamic,
    Static,
}

impl WeavingMode {
    /// Checks the process right now. The answer is never cached.
    ///
    /// The binary installs its subscriber before bootstrapping, so a running
    /// service always reports `Dynamic` (`"true"`). `Static` only shows up
    /// when the crate is used without logging set up, as in unit tests.
    pub fn detect() -> Self {
        if tracing::dispatcher::has_been_set() {
            WeavingMode::Dynamic
        } else {
            WeavingMode::Static
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeavingMode::Dynamic => "true",
            WeavingMode::Static => "static",
        }
    }
}

/// Session-level behaviour of the persistence unit. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProperties {
    values: BTreeMap<SessionOption, String>,
}

impl SessionProperties {
    /// Builds the fixed property set for `session_name`, detecting the weaving mode.
    pub fn build(session_name: &str) -> Result<Self, DbError> {
        Self::build_with(session_name, WeavingMode::detect())
    }

    pub fn build_with(session_name: &str, weaving: WeavingMode) -> Result<Self, DbError> {
        if session_name.trim().is_empty() {
            return Err(DbError::InvalidSessionName(session_name.to_string()));
        }

        let enabled = || "true".to_string();
        let values = BTreeMap::from([
            (SessionOption::Weaving, weaving.as_str().to_string()),
            (SessionOption::SessionName, session_name.to_string()),
            (SessionOption::LoggingExceptions, enabled()),
            (SessionOption::LoggingSession, enabled()),
            (SessionOption::LoggingParameters, enabled()),
            (SessionOption::NativeSql, enabled()),
        ]);

        tracing::debug!(session = %session_name, weaving = weaving.as_str(), "Session properties built.");

        Ok(Self { values })
    }

    pub fn get(&self, option: SessionOption) -> &str {
        self.values.get(&option).map(String::as_str).unwrap_or_default()
    }

    pub fn is_enabled(&self, option: SessionOption) -> bool {
        self.get(option) == "true"
    }

    pub fn session_name(&self) -> &str {
        self.get(SessionOption::SessionName)
    }

    pub fn weaving(&self) -> &str {
        self.get(SessionOption::Weaving)
    }

    /// `(key, value)` pairs in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.values
            .iter()
            .map(|(option, value)| (option.key(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
