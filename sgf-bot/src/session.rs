//! Per-user session store
//!
//! Holds at most one [`Collector`] per user id. Each user id has its own
//! async mutex: events for the same user are processed one at a time, while
//! events for different users proceed concurrently. Abandoned sessions are
//! kept until reset or overwritten. A slot left empty is removed from the
//! map on [`SessionStore::release`] unless another event is waiting on it.

use crate::collector::Collector;
use sgf_common::UserId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

type Slot = Arc<Mutex<Option<Collector>>>;

// Owners of an idle slot: the map entry, the guard's handle and the
// guard's lock.
const IDLE_SLOT_OWNERS: usize = 3;

/// Collector state keyed by user id
#[derive(Clone, Default)]
pub struct SessionStore {
    slots: Arc<RwLock<HashMap<UserId, Slot>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the critical section for `user`
    ///
    /// Waits while another event for the same user is being handled. The
    /// returned guard gives exclusive access to that user's session until it
    /// is released or dropped. Pass it to [`SessionStore::release`] once the
    /// event is handled.
    pub async fn lock(&self, user: UserId) -> SessionGuard {
        let existing = self.slots.read().await.get(&user).cloned();

        let slot = match existing {
            Some(slot) => slot,
            None => {
                let mut slots = self.slots.write().await;
                Arc::clone(
                    slots
                        .entry(user)
                        .or_insert_with(|| Arc::new(Mutex::new(None))),
                )
            }
        };

        let guard = Arc::clone(&slot).lock_owned().await;
        SessionGuard { user, slot, guard }
    }

    /// Leave the critical section, dropping the slot if it is empty
    ///
    /// A slot another event already holds a handle to is kept, so that event
    /// still sees the session it queued for.
    pub async fn release(&self, session: SessionGuard) {
        if session.get().is_some() {
            return;
        }

        let mut slots = self.slots.write().await;
        let idle = slots.get(&session.user).is_some_and(|slot| {
            Arc::ptr_eq(slot, &session.slot) && Arc::strong_count(slot) == IDLE_SLOT_OWNERS
        });
        if idle {
            slots.remove(&session.user);
        }
    }

    /// Snapshot of the user's collector
    pub async fn get(&self, user: UserId) -> Option<Collector> {
        let session = self.lock(user).await;
        let collector = session.get().cloned();
        self.release(session).await;
        collector
    }

    /// Store (or overwrite) the user's collector
    pub async fn put(&self, user: UserId, collector: Collector) {
        self.lock(user).await.put(collector);
    }

    /// Drop the user's collector
    pub async fn clear(&self, user: UserId) {
        let mut session = self.lock(user).await;
        session.clear();
        self.release(session).await;
    }

    /// Number of user ids holding a slot, empty or not
    pub async fn tracked_users(&self) -> usize {
        self.slots.read().await.len()
    }

    /// Number of users with a collector in progress
    ///
    /// Sessions locked by an in-flight event are counted as active.
    pub async fn active_sessions(&self) -> usize {
        let slots = self.slots.read().await;
        slots
            .values()
            .filter(|slot| match slot.try_lock() {
                Ok(guard) => guard.is_some(),
                Err(_) => true,
            })
            .count()
    }
}

/// Exclusive access to one user's session
pub struct SessionGuard {
    user: UserId,
    slot: Slot,
    guard: OwnedMutexGuard<Option<Collector>>,
}

impl SessionGuard {
    pub fn user(&self) -> UserId {
        self.user
    }

    pub fn get(&self) -> Option<&Collector> {
        self.guard.as_ref()
    }

    /// Current collector, creating one with `init` if there is none
    pub fn get_or_create(&mut self, init: impl FnOnce() -> Collector) -> &Collector {
        self.guard.get_or_insert_with(init)
    }

    /// Remove and return the collector, leaving the session empty
    pub fn take(&mut self) -> Option<Collector> {
        self.guard.take()
    }

    pub fn put(&mut self, collector: Collector) {
        *self.guard = Some(collector);
    }

    pub fn clear(&mut self) {
        *self.guard = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sgf_common::config::InputMode;
    use sgf_common::ElementSet;
    use std::time::Duration;

    fn collector() -> Collector {
        Collector::new(
            InputMode::Grid,
            Arc::new(ElementSet::new(["C", "Mn"]).unwrap()),
        )
    }

    #[tokio::test]
    async fn test_put_get_clear() {
        let store = SessionStore::new();
        assert!(store.get(1).await.is_none());

        store.put(1, collector()).await;
        assert_eq!(store.get(1).await, Some(collector()));
        assert!(store.get(2).await.is_none());
        assert_eq!(store.active_sessions().await, 1);

        store.clear(1).await;
        assert!(store.get(1).await.is_none());
        assert_eq!(store.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_get_or_create_keeps_existing() {
        let store = SessionStore::new();
        let mut guard = store.lock(5).await;
        guard.get_or_create(collector);
        assert!(guard.get().is_some());

        let other = Collector::new(
            InputMode::Guided,
            Arc::new(ElementSet::new(["C"]).unwrap()),
        );
        let current = guard.get_or_create(|| other);
        assert_eq!(current.mode(), InputMode::Grid);
    }

    #[tokio::test]
    async fn test_same_user_events_are_serialized() {
        let store = SessionStore::new();
        let guard = store.lock(7).await;

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut guard = store.lock(7).await;
                guard.put(collector());
            })
        };

        // Second lock for the same user must wait for the first guard
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert!(store.get(7).await.is_some());
    }

    #[tokio::test]
    async fn test_empty_slots_are_released() {
        let store = SessionStore::new();

        for user in 0..100 {
            assert!(store.get(user).await.is_none());
        }
        assert_eq!(store.tracked_users().await, 0);

        store.put(1, collector()).await;
        assert_eq!(store.tracked_users().await, 1);

        store.clear(1).await;
        assert_eq!(store.tracked_users().await, 0);
    }

    #[tokio::test]
    async fn test_release_keeps_slot_with_waiter() {
        let store = SessionStore::new();
        let guard = store.lock(3).await;

        let waiter = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut guard = store.lock(3).await;
                guard.put(collector());
                store.release(guard).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        store.release(guard).await;
        waiter.await.unwrap();

        assert_eq!(store.get(3).await, Some(collector()));
        assert_eq!(store.tracked_users().await, 1);
    }

    #[tokio::test]
    async fn test_different_users_do_not_block() {
        let store = SessionStore::new();
        let _held = store.lock(1).await;

        let other = tokio::time::timeout(Duration::from_millis(200), store.lock(2)).await;
        assert!(other.is_ok(), "Lock for another user should not wait");
    }
}
