use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};

use souq_domain::id::OrderId;

use crate::domain::repository::ChangeNotifier;
use crate::domain::types::OrderChangeEvent;
use crate::error::HandoffServiceError;

/// In-process fan-out of order changes: one broadcast channel per watched order.
///
/// Channels are created on first subscribe and dropped once the last receiver is gone,
/// so unwatched orders cost nothing. Publishing to an order nobody watches is a no-op.
#[derive(Clone)]
pub struct OrderChangeHub {
    channels: Arc<RwLock<HashMap<OrderId, broadcast::Sender<OrderChangeEvent>>>>,
    buffer: usize,
}

impl OrderChangeHub {
    /// `buffer` is the number of undelivered events a slow watcher may fall behind by
    /// before it starts missing events.
    pub fn new(buffer: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            buffer: buffer.max(1),
        }
    }

    pub async fn subscribe(&self, order_id: OrderId) -> broadcast::Receiver<OrderChangeEvent> {
        let mut guard = self.channels.write().await;
        guard
            .entry(order_id)
            .or_insert_with(|| broadcast::channel(self.buffer).0)
            .subscribe()
    }

    /// Drop the order's channel if nobody is listening any more. Call after dropping a
    /// receiver.
    pub async fn release(&self, order_id: OrderId) {
        let mut guard = self.channels.write().await;
        if guard
            .get(&order_id)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            guard.remove(&order_id);
        }
    }

    pub async fn watcher_count(&self, order_id: OrderId) -> usize {
        let guard = self.channels.read().await;
        guard.get(&order_id).map_or(0, |tx| tx.receiver_count())
    }

    pub async fn watched_orders(&self) -> usize {
        self.channels.read().await.len()
    }
}

impl ChangeNotifier for OrderChangeHub {
    async fn publish(&self, event: OrderChangeEvent) -> Result<(), HandoffServiceError> {
        let order_id = event.order_id;
        let delivered = {
            let guard = self.channels.read().await;
            match guard.get(&order_id) {
                Some(tx) => tx.send(event).is_ok(),
                None => return Ok(()),
            }
        };
        // Every receiver went away without releasing.
        if !delivered {
            self.release(order_id).await;
        }
        Ok(())
    }
}
