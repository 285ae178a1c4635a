use crate::error::DbError;
use crate::session::SessionProperties;
use sqlx::PgPool;

/// Identity of the one persistence unit this process binds.
pub const PERSISTENCE_UNIT_NAME: &str = "intranet";

/// A connection pool bound to its session properties under a fixed name.
///
/// The unit owns its properties and shares the pool: cloning a `PgPool`
/// hands out another reference to the same set of connections. Binding twice
/// therefore yields two equivalent, independent units over one pool; the
/// bootstrap binds once and distributes the unit behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PersistenceUnit {
    name: &'static str,
    pool: PgPool,
    properties: SessionProperties,
}

impl PersistenceUnit {
    /// Binds `pool` and `properties` into the `intranet` unit.
    ///
    /// Schema generation is never enabled. Binding leaves the pool untouched:
    /// SQL echo is part of the connect options the pool was built with.
    pub fn bind(
        pool: Option<&PgPool>,
        properties: Option<SessionProperties>,
    ) -> Result<Self, DbError> {
        let pool = pool.ok_or(DbError::BindingError {
            unit: PERSISTENCE_UNIT_NAME,
            missing: "connection pool",
        })?;
        let properties = properties.ok_or(DbError::BindingError {
            unit: PERSISTENCE_UNIT_NAME,
            missing: "session properties",
        })?;

        let unit = Self {
            name: PERSISTENCE_UNIT_NAME,
            pool: pool.clone(),
            properties,
        };

        tracing::info!(
            unit = unit.name,
            session = %unit.properties.session_name(),
            weaving = %unit.properties.weaving(),
            show_sql = unit.show_sql(),
            generate_ddl = unit.generate_ddl(),
            "Persistence unit bound."
        );

        Ok(unit)
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn properties(&self) -> &SessionProperties {
        &self.properties
    }

    /// Startup never creates or alters schema objects.
    pub fn generate_ddl(&self) -> bool {
        false
    }

    pub fn show_sql(&self) -> bool {
        true
    }
}
