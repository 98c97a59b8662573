use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderSyncedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_synced_producer: Vec<EventProducer<OrderSyncedEvent>>,
}

pub struct EventHandlers {
    pub on_order_synced: Option<EventHandler<OrderSyncedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_synced = hooks.on_order_synced.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_synced }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_synced {
            result.order_synced_producer.push(handler.subscribe());
        }
        result
    }

    pub fn start_handlers(self) {
        if let Some(handler) = self.on_order_synced {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_synced: Option<Handler<OrderSyncedEvent>>,
}

impl EventHooks {
    pub fn on_order_synced<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderSyncedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_synced = Some(Arc::new(f));
        self
    }
}
