//! Block-applied notifications.
//!
//! Listeners are invoked inline on the committing thread after the block's
//! indices are fully written and the write lock is released; keep handlers fast
//! to avoid stalling parsing. Each subscription is revoked independently by
//! dropping its [`BlockSubscription`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use bsq_types::Block;

type Listener = Arc<dyn Fn(&Block) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

#[derive(Clone, Default)]
pub struct BlockListeners {
    registry: Arc<Mutex<Registry>>,
}

impl BlockListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&Block) + Send + Sync + 'static) -> BlockSubscription {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, Arc::new(listener));
        BlockSubscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Call every listener once with `block`.
    ///
    /// The registry lock is not held while listeners run, so a listener may
    /// subscribe or unsubscribe without deadlocking.
    pub fn notify(&self, block: &Block) {
        let snapshot: Vec<Listener> = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .values()
            .cloned()
            .collect();
        for listener in snapshot {
            listener(block);
        }
    }

    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps a listener registered until dropped.
#[must_use = "dropping the subscription unregisters the listener"]
pub struct BlockSubscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl BlockSubscription {
    pub fn unsubscribe(self) {}

    /// Keep the listener registered for the lifetime of the store.
    pub fn detach(self) {
        std::mem::forget(self);
    }
}

impl Drop for BlockSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .remove(&self.id);
        }
    }
}
