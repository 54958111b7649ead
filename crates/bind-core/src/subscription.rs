#![forbid(unsafe_code)]

//! Revocable observer registrations.
//!
//! A [`Subscription`] is an identity token handed out by
//! [`Observable::bind`](crate::Observable::bind). It holds only a weak
//! back-reference to the registry that issued it, so keeping a subscription
//! around never keeps an observable alive, and unsubscribing after the
//! observable is gone is a no-op.
//!
//! [`SubscriptionContainer`] groups subscriptions that share a lifetime
//! (typically a screen or a view model) so they can be revoked together.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of one observer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Allocate a fresh id. Ids are never reused within a process.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something a [`Subscription`] can ask to drop its registration.
///
/// Implemented by the observable registry; tests implement it to observe
/// unsubscribe calls directly.
pub trait Unbind {
    /// Remove the observer registered under `subscription`. Unknown
    /// subscriptions are ignored.
    fn unbind(&self, subscription: &Subscription);
}

/// Handle to a single observer registration.
///
/// Cloning produces another handle to the same registration; equality and
/// hashing are by [`SubscriptionId`].
#[derive(Clone)]
pub struct Subscription {
    id: SubscriptionId,
    unbinder: Weak<dyn Unbind>,
}

impl Subscription {
    /// Create a subscription with a fresh id that unbinds through `unbinder`.
    ///
    /// Only a weak reference to `unbinder` is kept.
    #[must_use]
    pub fn new<U: Unbind + 'static>(unbinder: &Rc<U>) -> Self {
        let unbinder: Weak<dyn Unbind> = Rc::downgrade(unbinder) as Weak<dyn Unbind>;
        Self {
            id: SubscriptionId::next(),
            unbinder,
        }
    }

    /// Identifier of this registration.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Whether the issuing registry is still alive.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.unbinder.strong_count() > 0
    }

    /// Hand this subscription to `container`, which will revoke it on
    /// [`SubscriptionContainer::unsubscribe`] or when dropped.
    pub fn add_to(self, container: &mut SubscriptionContainer) {
        container.push(self);
    }

    /// Revoke the registration. Safe to call any number of times, and a
    /// no-op once the issuing registry has been dropped.
    pub fn unsubscribe(&self) {
        match self.unbinder.upgrade() {
            Some(unbinder) => {
                trace!(subscription = self.id.get(), "unsubscribe");
                unbinder.unbind(self);
            }
            None => trace!(subscription = self.id.get(), "unsubscribe on dropped owner"),
        }
    }
}

impl PartialEq for Subscription {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Subscription {}

impl Hash for Subscription {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Ordered group of subscriptions revoked together.
///
/// Dropping the container revokes whatever it still holds.
#[derive(Debug, Default)]
pub struct SubscriptionContainer {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionContainer {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subscription.
    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the container holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Held subscriptions in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Subscription> {
        self.subscriptions.iter()
    }

    /// Unsubscribe every held subscription, in insertion order, and clear.
    pub fn unsubscribe(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

impl Extend<Subscription> for SubscriptionContainer {
    fn extend<I: IntoIterator<Item = Subscription>>(&mut self, iter: I) {
        self.subscriptions.extend(iter);
    }
}

impl FromIterator<Subscription> for SubscriptionContainer {
    fn from_iter<I: IntoIterator<Item = Subscription>>(iter: I) -> Self {
        Self {
            subscriptions: iter.into_iter().collect(),
        }
    }
}

impl Drop for SubscriptionContainer {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
