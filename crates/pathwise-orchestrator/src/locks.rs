use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;

type SlotMap = HashMap<String, Arc<tokio::sync::Mutex<()>>>;

/// One async mutex per session id, created on demand.
///
/// Entries are dropped again once nobody holds or waits on them, so the map
/// only ever holds sessions with an operation in flight.
#[derive(Debug, Default)]
pub struct SessionLocks {
    slots: Arc<Mutex<SlotMap>>,
}

/// Exclusive access to one session until dropped.
pub struct SessionGuard {
    session_id: String,
    slots: Arc<Mutex<SlotMap>>,
    slot: Arc<tokio::sync::Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other operation on `session_id` is in flight.
    pub async fn acquire(&self, session_id: &str) -> SessionGuard {
        let slot = {
            let mut slots = self.slots.lock();
            slots
                .entry(session_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        let guard = slot.clone().lock_owned().await;
        SessionGuard {
            session_id: session_id.to_string(),
            slots: self.slots.clone(),
            slot,
            guard: Some(guard),
        }
    }

    /// Number of sessions with a live lock entry.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        // Release first so a waiter can take the lock, then prune under the map lock.
        drop(self.guard.take());
        let mut slots = self.slots.lock();
        // One reference in the map, one here: nobody else holds or waits.
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.session_id);
        }
    }
}
