//! Change notifications raised around writes.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock,
    },
};

use serde_json::Value;

/// Raised before a write. Listeners see it in registration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangingEvent {
    pub key: String,
    /// The value stored when the event was raised, `None` if the key was empty.
    pub old_value: Option<Value>,
    pub new_value: Value,
    /// Whether a listener before this one voted to cancel.
    pub cancel: bool,
}

/// Raised after a write that was not canceled.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangedEvent {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Value,
}

impl From<ChangingEvent> for ChangedEvent {
    fn from(event: ChangingEvent) -> Self {
        Self { key: event.key, old_value: event.old_value, new_value: event.new_value }
    }
}

/// A changing listener's vote on the pending write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    #[default]
    Proceed,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) type ChangingListener = dyn Fn(&ChangingEvent) -> anyhow::Result<Verdict> + Send + Sync;
pub(crate) type ChangedListener = dyn Fn(&ChangedEvent) -> anyhow::Result<()> + Send + Sync;

pub(crate) struct Listeners<F: ?Sized> {
    entries: RwLock<Vec<(ListenerId, Arc<F>)>>,
    next_id: AtomicU64,
}

impl<F: ?Sized> Listeners<F> {
    pub(crate) fn subscribe(&self, listener: Arc<F>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().unwrap_or_else(PoisonError::into_inner).push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(entry, _)| *entry != id);
        entries.len() != before
    }

    /// Copies the list so listeners may (un)subscribe while an event is dispatched.
    fn snapshot(&self) -> Vec<Arc<F>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).iter().map(|(_, listener)| listener.clone()).collect()
    }
}

impl Listeners<ChangingListener> {
    /// Runs every listener, folding their verdicts into `event.cancel`. Stops at the first failing listener.
    pub(crate) fn dispatch(&self, event: &mut ChangingEvent) -> anyhow::Result<()> {
        for listener in self.snapshot() {
            if listener(&*event)? == Verdict::Cancel {
                event.cancel = true;
            }
        }

        Ok(())
    }
}

impl Listeners<ChangedListener> {
    /// Runs every listener, stopping at the first failure.
    pub(crate) fn dispatch(&self, event: &ChangedEvent) -> anyhow::Result<()> {
        self.snapshot().iter().try_for_each(|listener| listener(event))
    }
}

impl<F: ?Sized> Default for Listeners<F> {
    fn default() -> Self {
        Self { entries: RwLock::new(Vec::new()), next_id: AtomicU64::new(0) }
    }
}

impl<F: ?Sized> fmt::Debug for Listeners<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.entries.read().unwrap_or_else(PoisonError::into_inner).len();
        f.debug_struct("Listeners").field("count", &count).finish()
    }
}
