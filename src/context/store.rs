//! Mutable key-value store describing current application state.
//!
//! The store is read-copy-update: readers take O(1) [`ContextSnapshot`]s
//! (an `Arc` clone of the underlying map) and never block writers. Writers
//! serialize under a single mutex and swap in a freshly built map, so an
//! in-flight snapshot is never mutated underneath an expression evaluation.
//!
//! Subscribers receive one immutable [`ChangeSet`] per mutation batch,
//! synchronously, in subscription order. A mutation issued from inside a
//! notification callback is queued and applied after the current pass
//! completes (it fires its own notification); it is never lost and never
//! deadlocks.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

use super::value::ContextValue;
use super::ContextView;

/// One key transition inside a [`ChangeSet`].
#[derive(Clone, Debug, PartialEq)]
pub struct Change {
    pub key: String,
    pub old: ContextValue,
    pub new: ContextValue,
}

/// Immutable snapshot of one mutation batch, delivered to subscribers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.changes.iter().map(|c| c.key.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.changes.iter().any(|c| c.key == key)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Handle returned by [`ContextStore::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type SubscriberFn = Arc<dyn Fn(&ChangeSet) + Send + Sync>;

/// A consistent, immutable view of the store at one point in time.
///
/// Cheap to clone; expression evaluation always runs against a snapshot so
/// store mutation cannot interleave with a single evaluation.
#[derive(Clone, Debug, Default)]
pub struct ContextSnapshot {
    map: Arc<HashMap<String, ContextValue>>,
}

impl ContextSnapshot {
    pub fn get(&self, key: &str) -> ContextValue {
        self.map.get(key).cloned().unwrap_or(ContextValue::Null)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(|k| k.as_str())
    }
}

impl ContextView for ContextSnapshot {
    fn value(&self, key: &str) -> ContextValue {
        self.get(key)
    }
}

/// One pending mutation batch: `(key, Some(value))` to set, `(key, None)` to
/// remove.
type Batch = Vec<(String, Option<ContextValue>)>;

struct StoreInner {
    map: Arc<HashMap<String, ContextValue>>,
    subscribers: Vec<(SubscriptionId, SubscriberFn)>,
    next_subscription: u64,
    /// True while a notification pass is running; mutations arriving during
    /// the pass are parked in `queued` instead of recursing.
    notifying: bool,
    queued: VecDeque<Batch>,
}

/// Mutable context store with change notification.
///
/// Owned by one [`Application`](crate::app::Application) instance; separate
/// instances share nothing.
pub struct ContextStore {
    inner: Mutex<StoreInner>,
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                map: Arc::new(HashMap::new()),
                subscribers: Vec::new(),
                next_subscription: 0,
                notifying: false,
                queued: VecDeque::new(),
            }),
        }
    }

    /// Current value for `key`. Missing keys read as [`ContextValue::Null`].
    pub fn get(&self, key: &str) -> ContextValue {
        self.inner
            .lock()
            .map
            .get(key)
            .cloned()
            .unwrap_or(ContextValue::Null)
    }

    /// Set one key. Fires one notification if the value actually changed.
    pub fn set(&self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.mutate(vec![(key.into(), Some(value.into()))]);
    }

    /// Remove one key. The key subsequently reads as `Null`.
    pub fn remove(&self, key: &str) {
        self.mutate(vec![(key.to_string(), None)]);
    }

    /// Apply several key updates atomically with respect to notification:
    /// subscribers see exactly one [`ChangeSet`] for the whole batch.
    pub fn update<K, V, I>(&self, entries: I)
    where
        K: Into<String>,
        V: Into<ContextValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let batch: Batch = entries
            .into_iter()
            .map(|(k, v)| (k.into(), Some(v.into())))
            .collect();
        self.mutate(batch);
    }

    /// O(1) consistent snapshot of the whole store.
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            map: Arc::clone(&self.inner.lock().map),
        }
    }

    /// Subscribe to change notifications. Callbacks fire synchronously, in
    /// subscription order, after each effective mutation batch.
    pub fn subscribe(&self, f: impl Fn(&ChangeSet) + Send + Sync + 'static) -> SubscriptionId {
        let mut inner = self.inner.lock();
        let id = SubscriptionId(inner.next_subscription);
        inner.next_subscription += 1;
        inner.subscribers.push((id, Arc::new(f)));
        id
    }

    /// Remove a subscription. No-op if already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.lock().subscribers.retain(|(sid, _)| *sid != id);
    }

    fn mutate(&self, batch: Batch) {
        let mut inner = self.inner.lock();
        if inner.notifying {
            // Re-entrant mutation from a subscriber callback: park it for
            // after the current notification pass.
            debug!(pending = inner.queued.len() + 1, "context mutation queued during notification");
            inner.queued.push_back(batch);
            return;
        }

        let Some((change_set, subscribers)) = Self::apply(&mut inner, batch) else {
            return;
        };
        inner.notifying = true;
        drop(inner);

        self.notify(change_set, subscribers);

        // Drain mutations queued by subscribers, one batch (and one
        // notification) at a time.
        loop {
            let mut inner = self.inner.lock();
            let Some(next) = inner.queued.pop_front() else {
                inner.notifying = false;
                return;
            };
            match Self::apply(&mut inner, next) {
                Some((change_set, subscribers)) => {
                    drop(inner);
                    self.notify(change_set, subscribers);
                }
                None => continue,
            }
        }
    }

    /// Build the next map revision and the change set. Returns `None` when
    /// the batch is a no-op (every key already held its target value).
    fn apply(
        inner: &mut StoreInner,
        batch: Batch,
    ) -> Option<(ChangeSet, Vec<SubscriberFn>)> {
        let mut changes = Vec::new();
        let mut next = (*inner.map).clone();
        for (key, value) in batch {
            let old = next.get(&key).cloned().unwrap_or(ContextValue::Null);
            let new = match value {
                Some(v) => {
                    next.insert(key.clone(), v.clone());
                    v
                }
                None => {
                    next.remove(&key);
                    ContextValue::Null
                }
            };
            if old != new {
                changes.push(Change { key, old, new });
            }
        }
        if changes.is_empty() {
            return None;
        }
        inner.map = Arc::new(next);
        let subscribers = inner.subscribers.iter().map(|(_, f)| Arc::clone(f)).collect();
        Some((ChangeSet { changes }, subscribers))
    }

    fn notify(&self, change_set: ChangeSet, subscribers: Vec<SubscriberFn>) {
        for subscriber in subscribers {
            subscriber(&change_set);
        }
    }
}
