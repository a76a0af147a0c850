//! Shared, observable settings.
//!
//! The store owns the current [`PostFxSettings`] behind a read/write lock and
//! tells subscribers which key changed. Subscriptions disconnect on drop, so a
//! pipeline torn down before the store stops receiving notifications.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use super::{PostFxSettings, SettingKey, SettingValue};
use crate::error::SettingsError;

type Listener = Arc<dyn Fn(SettingKey) + Send + Sync>;

struct StoreInner {
    settings: RwLock<PostFxSettings>,
    listeners: Mutex<HashMap<u64, Listener>>,
    next_id: AtomicU64,
}

/// Cloneable handle to a shared settings snapshot.
#[derive(Clone)]
pub struct SettingsStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("settings", &*self.inner.settings.read())
            .field("listeners", &self.inner.listeners.lock().len())
            .finish()
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(PostFxSettings::default())
    }
}

impl SettingsStore {
    pub fn new(settings: PostFxSettings) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                settings: RwLock::new(settings),
                listeners: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Clone of the current settings.
    pub fn snapshot(&self) -> PostFxSettings {
        self.inner.settings.read().clone()
    }

    /// Run `f` against the current settings without cloning them.
    pub fn read<R>(&self, f: impl FnOnce(&PostFxSettings) -> R) -> R {
        f(&self.inner.settings.read())
    }

    pub fn get(&self, key: SettingKey) -> SettingValue {
        self.inner.settings.read().get(key)
    }

    /// Assign one setting. Listeners run only when the stored value changed,
    /// after the lock is released.
    pub fn set(&self, key: SettingKey, value: SettingValue) -> Result<(), SettingsError> {
        let changed = {
            let mut settings = self.inner.settings.write();
            if settings.get(key) == value {
                false
            } else {
                settings.set(key, value)?;
                true
            }
        };
        if changed {
            self.notify(key);
        }
        Ok(())
    }

    /// Assign a setting by its host-visible name.
    pub fn set_by_name(&self, name: &str, value: SettingValue) -> Result<(), SettingsError> {
        self.set(SettingKey::from_name(name)?, value)
    }

    /// Replace every setting at once and notify each key whose value moved.
    pub fn replace(&self, settings: PostFxSettings) {
        let changed: Vec<SettingKey> = {
            let mut current = self.inner.settings.write();
            let changed = SettingKey::ALL
                .iter()
                .copied()
                .filter(|&key| current.get(key) != settings.get(key))
                .collect();
            *current = settings;
            changed
        };
        for key in changed {
            self.notify(key);
        }
    }

    /// Register a change listener. The listener stays connected until the
    /// returned [`Subscription`] is dropped.
    pub fn subscribe(&self, listener: impl Fn(SettingKey) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().insert(id, Arc::new(listener));
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    fn notify(&self, key: SettingKey) {
        let listeners: Vec<Listener> = self.inner.listeners.lock().values().cloned().collect();
        tracing::trace!(key = key.name(), listeners = listeners.len(), "setting changed");
        for listener in listeners {
            listener(key);
        }
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }
}

/// Live connection between a listener and a [`SettingsStore`].
#[must_use = "dropping a Subscription disconnects its listener"]
pub struct Subscription {
    id: u64,
    store: Weak<StoreInner>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.listeners.lock().remove(&self.id);
        }
    }
}

/// Collects changed keys so they can be applied on the render thread.
///
/// Keys are recorded once each, in first-change order, until drained.
#[derive(Debug)]
pub struct ChangeQueue {
    pending: Arc<Mutex<Vec<SettingKey>>>,
    _subscription: Subscription,
}

impl ChangeQueue {
    pub fn attach(store: &SettingsStore) -> Self {
        let pending = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&pending);
        let subscription = store.subscribe(move |key| {
            let mut pending = sink.lock();
            if !pending.contains(&key) {
                pending.push(key);
            }
        });
        Self {
            pending,
            _subscription: subscription,
        }
    }

    /// Take every key recorded since the last drain.
    pub fn drain(&self) -> Vec<SettingKey> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}
