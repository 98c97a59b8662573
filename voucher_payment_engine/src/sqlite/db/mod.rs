pub mod orders;

use log::debug;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;

use crate::traits::OrderStoreError;

/// Create a connection pool for the given database URL, creating the database file if needed.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, OrderStoreError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| OrderStoreError::BackendError(format!("Invalid database URL ({url}): {e}")))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    debug!("📝️ Connected to database {url}");
    Ok(pool)
}
