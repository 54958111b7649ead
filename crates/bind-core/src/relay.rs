#![forbid(unsafe_code)]

//! Stateless pulse signals.
//!
//! A [`Relay`] dispatches exactly like an [`Observable`] but forgets each
//! value once dispatch completes, so late observers never see past
//! emissions. Use it for events ("button tapped", "refresh requested")
//! rather than state.

use std::fmt;
use std::rc::Rc;

use crate::observable::{Observable, Retention};
use crate::printer::Printer;
use crate::subscription::Subscription;

/// An observable that never retains its last value.
pub struct Relay<T> {
    output: Observable<T>,
}

impl<T> Clone for Relay<T> {
    fn clone(&self) -> Self {
        Self {
            output: self.output.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Relay<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.output, f)
    }
}

impl<T: Clone + 'static> Default for Relay<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Relay<T> {
    /// Create a relay with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: Observable::build(None, None, Retention::Pulse),
        }
    }

    /// Create a relay that writes debug traces to `printer`.
    #[must_use]
    pub fn with_printer(printer: Rc<dyn Printer>) -> Self {
        Self {
            output: Observable::build(None, Some(printer), Retention::Pulse),
        }
    }

    /// Dispatch `value` to every observer without retaining it.
    pub fn update(&self, value: T) {
        self.output.update(value);
    }

    /// Register `callback`. Never replays.
    pub fn bind(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.output.bind(callback)
    }

    /// Remove the observer registered under `subscription`.
    pub fn unbind(&self, subscription: &Subscription) {
        self.output.unbind(subscription);
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.output.observer_count()
    }

    /// The underlying observable, for use with the combinators.
    ///
    /// Its stored value is `None` except while a dispatch is in flight.
    #[must_use]
    pub fn as_observable(&self) -> &Observable<T> {
        &self.output
    }
}

impl<T: Clone + fmt::Debug + 'static> Relay<T> {
    /// Turn on debug tracing under `label`.
    #[must_use]
    pub fn debug(&self, label: impl Into<String>) -> Self {
        let _ = self.output.debug(label);
        self.clone()
    }
}

impl Relay<()> {
    /// Dispatch a unit pulse.
    pub fn fire(&self) {
        self.update(());
    }
}

impl<T> AsRef<Observable<T>> for Relay<T> {
    fn as_ref(&self) -> &Observable<T> {
        &self.output
    }
}

impl<T> From<Relay<T>> for Observable<T> {
    fn from(relay: Relay<T>) -> Self {
        relay.output
    }
}
