//! # Webssh Database Crate
//!
//! This crate brings the persistence layer up and hands it to the rest of
//! the application. It owns everything between a validated
//! `DataSourceConfig` and a usable transaction boundary.
//!
//! ## Architectural Principles
//!
//! - **Fail fast:** The pool opens a real connection while it is being built.
//!   An unreachable host or a rejected login is a startup error, never a
//!   first-request error.
//! - **One pool, shared:** `PgPool` is reference counted. The persistence unit
//!   and the transaction manager share the pool; neither closes it.
//! - **No schema side effects:** Binding the persistence unit never creates
//!   or alters tables.
//!
//! ## Public API
//!
//! - `PoolFactory` / `PgPoolFactory` / `connect`: build the primary pool.
//! - `SessionProperties`: the fixed session option set.
//! - `PersistenceUnit`: the pool bound to its session properties as `intranet`.
//! - `TransactionManager`: begin/commit/rollback over the unit.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod persistence;
pub mod session;
pub mod transaction;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{PgPoolFactory, PoolFactory, connect, connect_options, pool_options};
pub use error::DbError;
pub use persistence::{PERSISTENCE_UNIT_NAME, PersistenceUnit};
pub use session::{SessionOption, SessionProperties, WeavingMode};
pub use transaction::TransactionManager;
