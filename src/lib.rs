//! Carbon Nigrani backend
//!
//! Coal-mine methane emission calculator plus the account, notification and
//! dashboard endpoints around it.
//!
//! - [`emissions`]: reference tables and the emission formulas
//! - [`auth`]: password hashing, bearer tokens, the route guard
//! - [`database`]: Postgres pool and repositories
//! - [`api`]: axum router and handlers
//! - [`config`]: environment configuration
//! - [`error`]: the HTTP error type

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod emissions;
pub mod error;

pub use error::AppError;
