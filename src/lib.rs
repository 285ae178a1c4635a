//! Startup and persistence bootstrap for the webssh service.
//!
//! The binary validates its single `--bd` argument, builds the primary
//! PostgreSQL pool from the `webssh.first` settings, and hands an
//! [`AppContext`] carrying the transaction manager to the rest of the service.

pub mod args;
pub mod bootstrap;
pub mod error;
pub mod telemetry;

pub use bootstrap::{AppContext, Bootstrap, run};
pub use error::BootstrapError;
