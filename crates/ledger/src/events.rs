//! In-process publish/subscribe channel for ledger change notifications.
//!
//! One process-scoped [`EventBus`] is shared (it is cheaply `Clone`) between
//! the ledger service, which publishes, and any number of listeners, which
//! mirror derived state such as a running total. Delivery is synchronous and
//! in registration order; nothing is persisted, so there is no delivery
//! guarantee across restarts.

use std::collections::HashMap;
use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use crate::Transaction;

/// The two kinds of ledger change notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    TransactionAdded,
    TransactionDeleted,
}

/// Opaque handle returned by [`EventBus::subscribe`], used to deregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&Transaction) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<EventKind, Vec<(u64, Listener)>>>,
}

/// Typed in-memory event fan-out.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Registry>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for one event kind.
    ///
    /// Listeners stay registered until [`unsubscribe`](Self::unsubscribe) is
    /// called with the returned id; components with a shorter lifetime than
    /// the bus must deregister on teardown.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&Transaction) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let mut listeners = self
            .registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        listeners
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        SubscriptionId(id)
    }

    /// Removes a listener. Unknown ids are ignored.
    pub fn unsubscribe(&self, kind: EventKind, subscription: SubscriptionId) {
        let mut listeners = self
            .registry
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(registered) = listeners.get_mut(&kind) {
            registered.retain(|(id, _)| *id != subscription.0);
        }
    }

    /// Delivers `transaction` to every listener registered for `kind` at the
    /// moment of the call. A publish with zero listeners is a no-op.
    pub fn publish(&self, kind: EventKind, transaction: &Transaction) {
        // Snapshot the listener set so handlers can subscribe/unsubscribe
        // without deadlocking on the registry lock.
        let snapshot: Vec<Listener> = {
            let listeners = self
                .registry
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            listeners
                .get(&kind)
                .map(|registered| registered.iter().map(|(_, l)| Arc::clone(l)).collect())
                .unwrap_or_default()
        };

        tracing::debug!(?kind, listeners = snapshot.len(), "publishing ledger event");
        for listener in snapshot {
            listener(transaction);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_transaction() -> Transaction {
        Transaction {
            id: 1,
            unique_identifier: Uuid::new_v4(),
            description: "coffee".to_string(),
            amount_total_cents: 350,
            transaction_date_utc: Utc::now(),
            is_deleted: false,
        }
    }

    #[test]
    fn publish_reaches_subscribed_listener() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        bus.subscribe(EventKind::TransactionAdded, move |tx| {
            sink.lock().unwrap().push(tx.clone());
        });

        let tx = sample_transaction();
        bus.publish(EventKind::TransactionAdded, &tx);
        bus.publish(EventKind::TransactionDeleted, &tx);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], tx);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(0u32));

        let sink = Arc::clone(&seen);
        let subscription = bus.subscribe(EventKind::TransactionDeleted, move |_| {
            *sink.lock().unwrap() += 1;
        });

        let tx = sample_transaction();
        bus.publish(EventKind::TransactionDeleted, &tx);
        bus.unsubscribe(EventKind::TransactionDeleted, subscription);
        bus.publish(EventKind::TransactionDeleted, &tx);

        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn publish_without_listeners_is_noop() {
        let bus = EventBus::new();
        bus.publish(EventKind::TransactionAdded, &sample_transaction());
    }
}
