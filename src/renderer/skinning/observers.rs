//! Bounds-changed observer registry
//!
//! Each instance owns a [`BoundsObservers`] map keyed by observer identity.
//! Proxy listeners are keyed by the listening instance, so severing a proxy
//! link is a single `unregister` and a destroyed listener can never be
//! notified again. The registry also carries the instance's re-entrancy guard.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::scene::RendererId;

/// Handle returned by [`SkinnedInstances::subscribe`](super::SkinnedInstances::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserverKey {
    /// Another instance mirroring these bounds.
    Proxy(RendererId),
    External(ObserverId),
}

/// Payload-less bounds-changed callback. Observers re-read the published box.
pub type BoundsCallback = Box<dyn FnMut() + Send>;

enum Listener {
    Proxy,
    Callback(BoundsCallback),
}

#[derive(Default)]
pub struct BoundsObservers {
    listeners: FxHashMap<ObserverKey, Listener>,
    next_external: u64,
    dispatching: bool,
}

impl BoundsObservers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` as a proxy of this instance. Returns `false` if it already was.
    pub fn register_proxy(&mut self, listener: RendererId) -> bool {
        self.listeners.insert(ObserverKey::Proxy(listener), Listener::Proxy).is_none()
    }

    pub fn subscribe(&mut self, callback: BoundsCallback) -> ObserverId {
        let id = ObserverId(self.next_external);
        self.next_external += 1;
        self.listeners.insert(ObserverKey::External(id), Listener::Callback(callback));
        id
    }

    /// Removes one observer. Removing an absent observer is a no-op.
    pub fn unregister(&mut self, key: ObserverKey) -> bool {
        self.listeners.remove(&key).is_some()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    #[must_use]
    pub fn contains(&self, key: ObserverKey) -> bool {
        self.listeners.contains_key(&key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Instances currently registered as proxies of this one.
    pub fn proxy_listeners(&self) -> impl Iterator<Item = RendererId> + '_ {
        self.listeners.keys().filter_map(|key| match key {
            ObserverKey::Proxy(id) => Some(*id),
            ObserverKey::External(_) => None,
        })
    }

    /// Starts a notification round: runs external callbacks and returns the
    /// proxy listeners the caller must forward to.
    ///
    /// Returns `None` while a round for this instance is already running;
    /// the nested notification is dropped.
    pub fn begin_dispatch(&mut self) -> Option<SmallVec<[RendererId; 4]>> {
        if self.dispatching {
            return None;
        }
        self.dispatching = true;

        let mut proxies = SmallVec::new();
        for (key, listener) in &mut self.listeners {
            match (key, listener) {
                (ObserverKey::Proxy(id), Listener::Proxy) => proxies.push(*id),
                (_, Listener::Callback(callback)) => callback(),
                (ObserverKey::External(_), Listener::Proxy) => {}
            }
        }
        proxies.sort_unstable();
        Some(proxies)
    }

    pub fn end_dispatch(&mut self) {
        self.dispatching = false;
    }
}

impl fmt::Debug for BoundsObservers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundsObservers")
            .field("keys", &self.listeners.keys().collect::<Vec<_>>())
            .field("dispatching", &self.dispatching)
            .finish()
    }
}
