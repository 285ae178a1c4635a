//! Ordered construction of the persistence layer.
//!
//! Stages run strictly one after another on the calling task, each consuming
//! what the previous one produced:
//!
//! `UNSTARTED → ARGS_VALIDATED → POOL_READY → SESSION_CONFIGURED →
//! PERSISTENCE_BOUND → TRANSACTION_READY`
//!
//! The first error moves the bootstrap to `FAILED` and every later call is
//! refused. The process has to start over.

use crate::args::{self, StartupArguments};
use crate::error::BootstrapError;
use configuration::error::ConfigError;
use configuration::settings::Settings;
use configuration::DataSourceConfig;
use core_types::{BootstrapStage, StageError};
use database::{
    DbError, PERSISTENCE_UNIT_NAME, PersistenceUnit, PoolFactory, SessionProperties,
    TransactionManager,
};
use sqlx::PgPool;
use std::sync::Arc;

/// The fully bootstrapped persistence layer, handed to every consumer.
///
/// Cloning is cheap: all parts are shared.
#[derive(Debug, Clone)]
pub struct AppContext {
    data_source: Arc<DataSourceConfig>,
    pool: PgPool,
    unit: Arc<PersistenceUnit>,
    transactions: Arc<TransactionManager>,
}

impl AppContext {
    pub fn data_source(&self) -> &DataSourceConfig {
        &self.data_source
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn unit(&self) -> &Arc<PersistenceUnit> {
        &self.unit
    }

    pub fn transactions(&self) -> &Arc<TransactionManager> {
        &self.transactions
    }

    /// Closes the primary pool. Only the process owner calls this, on the way out.
    pub async fn shutdown(self) {
        self.pool.close().await;
        tracing::info!(unit = self.unit.name(), "Primary pool closed.");
    }
}

/// Drives the stages in order, holding each stage's output for the next.
pub struct Bootstrap<F> {
    factory: F,
    stage: BootstrapStage,
    arguments: Option<StartupArguments>,
    data_source: Option<DataSourceConfig>,
    pool: Option<PgPool>,
    session: Option<SessionProperties>,
    unit: Option<Arc<PersistenceUnit>>,
}

impl<F: PoolFactory> Bootstrap<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            stage: BootstrapStage::Unstarted,
            arguments: None,
            data_source: None,
            pool: None,
            session: None,
            unit: None,
        }
    }

    pub fn stage(&self) -> BootstrapStage {
        self.stage
    }

    pub fn arguments(&self) -> Option<&StartupArguments> {
        self.arguments.as_ref()
    }

    /// `UNSTARTED → ARGS_VALIDATED`. Allocates nothing downstream on failure.
    pub fn validate_args(&mut self, raw: &[String]) -> Result<(), BootstrapError> {
        self.check(BootstrapStage::ArgsValidated)?;

        let arguments = args::validate(raw).map_err(|e| self.fail(e.into()))?;
        tracing::info!(argument = %arguments.raw(), "Argument read.");

        self.arguments = Some(arguments);
        self.enter(BootstrapStage::ArgsValidated);
        Ok(())
    }

    /// `ARGS_VALIDATED → POOL_READY`.
    ///
    /// Validates the datasource first, so a misconfiguration never opens a
    /// socket, then asks the factory for the pool.
    pub async fn connect_pool(&mut self, settings: &Settings) -> Result<(), BootstrapError> {
        self.check(BootstrapStage::PoolReady)?;

        let host_override = self.arguments.as_ref().and_then(StartupArguments::database_host);
        let data_source = settings
            .data_source(host_override)
            .map_err(|e| self.fail(e.into()))?;

        let result = self.factory.connect(&data_source).await;
        let pool = result.map_err(|e| self.fail(e.into()))?;

        self.data_source = Some(data_source);
        self.pool = Some(pool);
        self.enter(BootstrapStage::PoolReady);
        Ok(())
    }

    /// `POOL_READY → SESSION_CONFIGURED`.
    pub fn configure_session(&mut self) -> Result<(), BootstrapError> {
        self.check(BootstrapStage::SessionConfigured)?;

        let session_name = match &self.data_source {
            Some(data_source) => data_source.session_name.clone(),
            None => {
                let error = ConfigError::MissingKey("webssh.first.session-name".to_string());
                return Err(self.fail(error.into()));
            }
        };
        let session = SessionProperties::build(&session_name).map_err(|e| self.fail(e.into()))?;

        self.session = Some(session);
        self.enter(BootstrapStage::SessionConfigured);
        Ok(())
    }

    /// `SESSION_CONFIGURED → PERSISTENCE_BOUND`.
    ///
    /// Binding with the pool or the session missing is a `BindingError`.
    pub fn bind_persistence(&mut self) -> Result<(), BootstrapError> {
        self.refuse_if_failed()?;

        let missing = match (&self.pool, &self.session) {
            (None, _) => Some("connection pool"),
            (_, None) => Some("session properties"),
            _ => None,
        };
        if let Some(missing) = missing {
            let error = DbError::BindingError {
                unit: PERSISTENCE_UNIT_NAME,
                missing,
            };
            return Err(self.fail(error.into()));
        }
        self.check(BootstrapStage::PersistenceBound)?;

        let unit = PersistenceUnit::bind(self.pool.as_ref(), self.session.clone())
            .map_err(|e| self.fail(e.into()))?;

        self.unit = Some(Arc::new(unit));
        self.enter(BootstrapStage::PersistenceBound);
        Ok(())
    }

    /// `PERSISTENCE_BOUND → TRANSACTION_READY`, yielding the context.
    pub fn ready(&mut self) -> Result<AppContext, BootstrapError> {
        self.refuse_if_failed()?;

        let (Some(unit), Some(pool), Some(data_source)) =
            (self.unit.clone(), self.pool.clone(), self.data_source.clone())
        else {
            let error = DbError::BindingError {
                unit: PERSISTENCE_UNIT_NAME,
                missing: "persistence unit",
            };
            return Err(self.fail(error.into()));
        };
        self.check(BootstrapStage::TransactionReady)?;

        let transactions = Arc::new(TransactionManager::new(Arc::clone(&unit)));
        self.enter(BootstrapStage::TransactionReady);

        Ok(AppContext {
            data_source: Arc::new(data_source),
            pool,
            unit,
            transactions,
        })
    }

    fn refuse_if_failed(&self) -> Result<(), BootstrapError> {
        if self.stage == BootstrapStage::Failed {
            return Err(StageError::AlreadyFailed.into());
        }
        Ok(())
    }

    /// Out-of-order calls fail the bootstrap too, unless it already finished:
    /// a ready bootstrap refuses the call and stays ready.
    fn check(&mut self, to: BootstrapStage) -> Result<(), BootstrapError> {
        self.refuse_if_failed()?;
        match self.stage.advance(to) {
            Ok(_) => Ok(()),
            Err(e) if self.stage == BootstrapStage::TransactionReady => {
                tracing::warn!(stage = %self.stage, "{e}");
                Err(e.into())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    fn enter(&mut self, to: BootstrapStage) {
        tracing::info!(from = %self.stage, to = %to, "Bootstrap stage reached.");
        self.stage = to;
    }

    fn fail(&mut self, error: BootstrapError) -> BootstrapError {
        match &error {
            BootstrapError::Argument(_) => {
                tracing::warn!(stage = %self.stage, kind = error.kind(), "{error}");
            }
            _ => {
                tracing::error!(stage = %self.stage, kind = error.kind(), "{error}");
            }
        }
        self.stage = BootstrapStage::Failed;
        error
    }
}

/// Runs the whole sequence.
///
/// `load` is only called once the arguments have been accepted, so a rejected
/// invocation reads no configuration and builds no pool.
pub async fn run<F, L>(raw: &[String], load: L, factory: F) -> Result<AppContext, BootstrapError>
where
    F: PoolFactory,
    L: FnOnce() -> Result<Settings, ConfigError>,
{
    let mut bootstrap = Bootstrap::new(factory);
    bootstrap.validate_args(raw)?;

    let settings = load().map_err(|e| bootstrap.fail(e.into()))?;

    bootstrap.connect_pool(&settings).await?;
    bootstrap.configure_session()?;
    bootstrap.bind_persistence()?;
    bootstrap.ready()
}
