use crate::error::DbError;
use crate::persistence::PersistenceUnit;
use sqlx::{Postgres, Transaction};
use std::sync::Arc;

/// Transaction boundaries over one persistence unit.
///
/// Holds nothing but the unit; isolation and locking are the database's own.
#[derive(Debug, Clone)]
pub struct TransactionManager {
    unit: Arc<PersistenceUnit>,
}

impl TransactionManager {
    /// Takes an already-bound unit, so a manager can never exist before it.
    pub fn new(unit: Arc<PersistenceUnit>) -> Self {
        tracing::debug!(unit = unit.name(), "Transaction manager ready.");
        Self { unit }
    }

    pub fn unit(&self) -> &PersistenceUnit {
        &self.unit
    }

    pub fn unit_name(&self) -> &str {
        self.unit.name()
    }

    /// Checks a connection out of the shared pool and opens a transaction on it.
    ///
    /// Waiting for a free connection is bounded by the pool's checkout timeout.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, DbError> {
        let tx = self
            .unit
            .pool()
            .begin()
            .await
            .map_err(DbError::transaction("begin"))?;
        tracing::trace!(unit = self.unit.name(), "Transaction started.");
        Ok(tx)
    }

    pub async fn commit(&self, tx: Transaction<'static, Postgres>) -> Result<(), DbError> {
        tx.commit().await.map_err(DbError::transaction("commit"))?;
        tracing::trace!(unit = self.unit.name(), "Transaction committed.");
        Ok(())
    }

    pub async fn rollback(&self, tx: Transaction<'static, Postgres>) -> Result<(), DbError> {
        tx.rollback().await.map_err(DbError::transaction("rollback"))?;
        tracing::trace!(unit = self.unit.name(), "Transaction rolled back.");
        Ok(())
    }
}
