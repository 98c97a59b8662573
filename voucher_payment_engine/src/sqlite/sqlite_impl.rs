//! `SqliteOrderStore` is the durable [`OrderStore`] backend: one row per order id, with the
//! fill-once merge guards expressed in the upsert statement itself.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::db::{new_pool, orders};
use crate::{
    db_types::{Order, OrderId},
    traits::{OrderStore, OrderStoreError},
};

#[derive(Clone)]
pub struct SqliteOrderStore {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteOrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteOrderStore ({:?})", self.pool)
    }
}

impl SqliteOrderStore {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, OrderStoreError> {
        let pool = new_pool(url, max_connections).await?;
        let mut conn = pool.acquire().await?;
        orders::create_tables(&mut conn).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl OrderStore for SqliteOrderStore {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_order_id(order_id, &mut conn).await
    }

    async fn upsert_order(&self, order: &Order) -> Result<(), OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::upsert_order(order, &mut conn).await
    }

    async fn mark_synced(&self, order_id: &OrderId, at: DateTime<Utc>) -> Result<bool, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::mark_synced(order_id, at, &mut conn).await
    }
}
