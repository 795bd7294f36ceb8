//! Database connection pool management

use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use std::time::Duration;
use tracing::info;

use crate::InfrastructureError;

/// Create a MySQL connection pool
///
/// # Arguments
///
/// * `url` - MySQL connection URL
/// * `max_connections` - Upper bound on pooled connections
pub async fn create_pool(url: &str, max_connections: u32) -> Result<MySqlPool, InfrastructureError> {
    info!(max_connections, "Creating MySQL connection pool");

    let pool = MySqlPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(url)
        .await
        .map_err(InfrastructureError::Database)?;

    info!("MySQL connection pool created successfully");
    Ok(pool)
}
