//! Process-local publish/subscribe for cache-invalidation events.
//!
//! Replaces the "statically-injected cache listener" pattern with an
//! explicit bus constructed once at startup and passed by dependency:
//! publishers call [`MutationEventBus::publish`] after a successful commit;
//! subscribers register once and are invoked fire-and-forget so a slow
//! subscriber never blocks the mutating caller.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use qryvanta_core::{PrincipalId, TenantId};

/// A data-model mutation that may invalidate cached decisions, per §4.4's
/// invalidation table.
#[derive(Debug, Clone)]
pub enum MutationEvent {
    /// A `UserRole` edge was inserted, deleted, or updated.
    UserRoleChanged {
        /// Tenant the affected user belongs to.
        tenant_id: TenantId,
        /// External principal id of the affected user.
        principal: PrincipalId,
    },
    /// A `RolePermission` edge was inserted, deleted, or updated.
    RolePermissionChanged {
        /// Tenant the affected role belongs to.
        tenant_id: TenantId,
    },
    /// A policy was updated, deleted, published, or archived.
    PolicyChanged {
        /// Tenant the affected policy belongs to.
        tenant_id: TenantId,
    },
    /// A user's status or attributes changed.
    UserChanged {
        /// Tenant the affected user belongs to.
        tenant_id: TenantId,
        /// External principal id of the affected user.
        principal: PrincipalId,
    },
    /// A role's hierarchy (parent pointer) changed.
    RoleHierarchyChanged {
        /// Tenant the affected role belongs to.
        tenant_id: TenantId,
    },
}

/// A handler invoked for every published event. Implementations must not
/// perform long blocking work inline with the caller's expectations; the bus
/// itself already dispatches on a spawned task, but handlers should still
/// keep their own work bounded (e.g. enqueue rather than synchronously
/// drain).
#[async_trait]
pub trait MutationEventSubscriber: Send + Sync {
    /// Handles one published event.
    async fn handle(&self, event: MutationEvent);
}

/// Process-local event bus. Subscribers register once at startup via
/// [`MutationEventBus::subscribe`]; publishers call
/// [`MutationEventBus::publish`] after their transaction commits.
#[derive(Clone, Default)]
pub struct MutationEventBus {
    subscribers: Arc<RwLock<Vec<Arc<dyn MutationEventSubscriber>>>>,
}

impl MutationEventBus {
    /// Creates an empty event bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber. Intended to be called only during
    /// composition-root startup.
    pub fn subscribe(&self, subscriber: Arc<dyn MutationEventSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    /// Publishes an event to every registered subscriber. Each subscriber is
    /// dispatched on its own spawned task so a slow or failing subscriber
    /// cannot block the publisher nor the other subscribers; this is the
    /// at-most-once in-process delivery promised by §4.8.
    pub fn publish(&self, event: MutationEvent) {
        let subscribers = self.subscribers.read().clone();

        for subscriber in subscribers {
            let event = event.clone();
            tokio::spawn(async move {
                subscriber.handle(event).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingSubscriber {
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MutationEventSubscriber for CountingSubscriber {
        async fn handle(&self, _event: MutationEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn publish_notifies_all_subscribers() {
        let bus = MutationEventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe(Arc::new(CountingSubscriber {
            count: count.clone(),
        }));
        bus.subscribe(Arc::new(CountingSubscriber {
            count: count.clone(),
        }));

        bus.publish(MutationEvent::PolicyChanged {
            tenant_id: TenantId::new(),
        });

        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
