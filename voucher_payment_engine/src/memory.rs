//! An in-memory [`OrderStore`] backend.
//!
//! Used by the test suites, and as the fallback backend for deployments where no durable storage
//! is available (the engine is specified to keep working, minus restart durability, when the
//! store is degraded).

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    db_types::{Order, OrderId},
    traits::{OrderStore, OrderStoreError},
};

#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

impl OrderStore for MemoryOrderStore {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        Ok(self.orders.read().await.get(order_id).cloned())
    }

    async fn upsert_order(&self, order: &Order) -> Result<(), OrderStoreError> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.order_id) {
            Some(stored) => {
                // Same fill-once guards as the SQL backend: a concurrent writer's data survives a
                // writer that read before it landed.
                stored.status = order.status;
                stored.amount = order.amount;
                if stored.form_data.is_none() {
                    stored.form_data = order.form_data.clone();
                }
                if stored.service_name.is_none() {
                    stored.service_name = order.service_name.clone();
                }
                if stored.gateway_tx_id.is_none() {
                    stored.gateway_tx_id = order.gateway_tx_id.clone();
                }
                if stored.synced_at.is_none() {
                    stored.synced_at = order.synced_at;
                }
                stored.updated_at = order.updated_at;
            },
            None => {
                orders.insert(order.order_id.clone(), order.clone());
            },
        }
        Ok(())
    }

    async fn mark_synced(&self, order_id: &OrderId, at: DateTime<Utc>) -> Result<bool, OrderStoreError> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(order_id) {
            Some(order) if order.synced_at.is_none() => {
                order.synced_at = Some(at);
                order.updated_at = at;
                Ok(true)
            },
            Some(_) => Ok(false),
            None => Err(OrderStoreError::BackendError(format!("Order {order_id} does not exist"))),
        }
    }
}
