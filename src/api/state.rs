//! Shared application state.

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::JwtConfig;
use crate::database::{EmissionRepository, NotificationRepository, UserRepository};
use crate::emissions::EmissionCalculator;

/// Cheap to clone; every field is a handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub calculator: Arc<EmissionCalculator>,
    pub jwt: JwtConfig,
    pub users: UserRepository,
    pub notifications: NotificationRepository,
    pub emissions: EmissionRepository,
}

impl AppState {
    pub fn new(pool: PgPool, calculator: Arc<EmissionCalculator>, jwt: JwtConfig) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            emissions: EmissionRepository::new(pool.clone()),
            pool,
            calculator,
            jwt,
        }
    }
}
