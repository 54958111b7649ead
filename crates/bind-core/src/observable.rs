#![forbid(unsafe_code)]

//! Observable value with replay-on-subscribe and synchronous dispatch.
//!
//! # Design
//!
//! [`Observable<T>`] wraps an optional value and an ordered observer registry
//! in shared, reference-counted storage (`Rc<RefCell<..>>`). Every call to
//! [`update`](Observable::update) stores the value and invokes each observer
//! in registration order. A new observer immediately receives the stored
//! value, if there is one.
//!
//! # Reentrancy
//!
//! No `RefCell` borrow is held while observer callbacks run: the registry is
//! snapshotted (cloned `Rc` callbacks) before dispatch. Callbacks may
//! therefore `update`, `bind` or `unbind` any observable, including the one
//! dispatching. Changes to the registry made during a dispatch take effect
//! from the next dispatch on.
//!
//! # Ownership
//!
//! Observers are owned by the observable they are registered on. Derived
//! observables built by the combinators are captured strongly by their
//! source's observers, so a chain lives as long as its head. Nothing keeps a
//! source alive on behalf of its derivatives.
//!
//! # Performance
//!
//! | Operation     | Complexity                  |
//! |---------------|-----------------------------|
//! | `value()`     | O(1) + clone                |
//! | `update()`    | O(S) where S = observers    |
//! | `bind()`      | O(1) amortized              |
//! | `unbind()`    | O(S)                        |

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::printer::{Printer, StdoutPrinter};
use crate::subscription::{Subscription, SubscriptionId, Unbind};

/// An observer callback.
type Callback<T> = Rc<dyn Fn(&T)>;

/// Whether an observable keeps the value it dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Retention {
    /// Keep the last stored value and replay it to new observers.
    Store,
    /// Forget the value as soon as dispatch completes (relay).
    Pulse,
}

impl Retention {
    fn kind_name(self) -> &'static str {
        match self {
            Self::Store => "Observable",
            Self::Pulse => "Relay",
        }
    }
}

struct DebugTrace<T> {
    label: String,
    render: fn(&T) -> String,
}

/// Shared interior for [`Observable<T>`].
pub(crate) struct ObservableInner<T> {
    value: Option<T>,
    /// Registration order is dispatch order.
    observers: Vec<(SubscriptionId, Callback<T>)>,
    trace: Option<DebugTrace<T>>,
    printer: Option<Rc<dyn Printer>>,
    retention: Retention,
}

impl<T> Unbind for RefCell<ObservableInner<T>> {
    fn unbind(&self, subscription: &Subscription) {
        let id = subscription.id();
        // The callback may own subscriptions of its own; drop it after the
        // borrow is released.
        let removed = {
            let mut inner = self.borrow_mut();
            inner
                .observers
                .iter()
                .position(|(observer, _)| *observer == id)
                .map(|index| inner.observers.remove(index))
        };
        trace!(subscription = id.get(), found = removed.is_some(), "unbind");
        drop(removed);
    }
}

/// A shared, subscribable value.
///
/// Cloning an `Observable` creates a new handle to the **same** state: both
/// handles see the same value and share observers. Any handle may call
/// [`update`](Self::update).
///
/// # Invariants
///
/// 1. `value()` reflects the most recent stored update.
/// 2. `bind` replays the stored value synchronously iff one is stored.
/// 3. Observers are invoked in registration order.
/// 4. After `unbind`, an observer is not invoked by any later dispatch.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

// Manual Clone: shares the same Rc.
impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct(inner.retention.kind_name())
            .field("value", &inner.value)
            .field("observer_count", &inner.observers.len())
            .field("label", &inner.trace.as_ref().map(|trace| &trace.label))
            .finish()
    }
}

impl<T: Clone + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Create an observable with no value and no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None, None, Retention::Store)
    }

    /// Create an observable seeded with `value`.
    #[must_use]
    pub fn with_value(value: T) -> Self {
        Self::build(Some(value), None, Retention::Store)
    }

    /// Create an observable that writes debug traces to `printer`.
    #[must_use]
    pub fn with_printer(value: Option<T>, printer: Rc<dyn Printer>) -> Self {
        Self::build(value, Some(printer), Retention::Store)
    }

    pub(crate) fn build(
        value: Option<T>,
        printer: Option<Rc<dyn Printer>>,
        retention: Retention,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                observers: Vec::new(),
                trace: None,
                printer,
                retention,
            })),
        }
    }

    /// Clone of the stored value, if any.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.inner.borrow().value.clone()
    }

    /// Access the stored value by reference without cloning.
    ///
    /// The closure must not update this observable.
    pub fn with<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.inner.borrow().value.as_ref())
    }

    /// Whether a value is stored.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.inner.borrow().value.is_some()
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// Whether both handles point to the same observable.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Non-owning handle to this observable.
    #[must_use]
    pub fn downgrade(&self) -> WeakObservable<T> {
        WeakObservable {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Store `value` and dispatch it to every observer.
    pub fn update(&self, value: T) {
        self.update_with(value, true);
    }

    /// Dispatch `value` to every observer, storing it first when
    /// `should_store` is set.
    ///
    /// Observers see a snapshot of the registry taken after the store; a
    /// callback that binds or unbinds during dispatch affects only later
    /// dispatches.
    pub fn update_with(&self, value: T, should_store: bool) {
        self.emit_trace(|ctx| {
            vec![
                "---".to_owned(),
                format!(
                    "Will update value for {} ({}) to {}",
                    ctx.label,
                    ctx.type_tag,
                    ctx.describe(&value)
                ),
                format!("To bindings: {}", ctx.registry),
            ]
        });

        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            let previous = if should_store {
                inner.value.replace(value.clone())
            } else {
                None
            };
            let callbacks: Vec<Callback<T>> = inner
                .observers
                .iter()
                .map(|(_, callback)| Rc::clone(callback))
                .collect();
            drop(inner);
            drop(previous);
            callbacks
        };

        trace!(observers = callbacks.len(), stored = should_store, "dispatch");
        for callback in &callbacks {
            callback(&value);
        }

        self.emit_trace(|ctx| {
            vec![
                format!(
                    "Did update value for {} ({}) to {}",
                    ctx.label,
                    ctx.type_tag,
                    ctx.describe(&value)
                ),
                format!("To bindings: {}", ctx.registry),
            ]
        });

        let cleared = {
            let mut inner = self.inner.borrow_mut();
            match inner.retention {
                Retention::Pulse => inner.value.take(),
                Retention::Store => None,
            }
        };
        drop(cleared);
    }

    /// Register `callback` and return the handle that revokes it.
    ///
    /// If a value is stored, `callback` is invoked with it before `bind`
    /// returns.
    pub fn bind(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let subscription = Subscription::new(&self.inner);
        let callback: Callback<T> = Rc::new(callback);
        let replay = {
            let mut inner = self.inner.borrow_mut();
            inner
                .observers
                .push((subscription.id(), Rc::clone(&callback)));
            inner.value.clone()
        };
        trace!(
            subscription = subscription.id().get(),
            replay = replay.is_some(),
            "bind"
        );

        self.emit_trace(|ctx| {
            vec![
                "---".to_owned(),
                format!("Binding {} ({}) to (Function)", ctx.label, ctx.type_tag),
                format!("To bindings: {}", ctx.registry),
            ]
        });

        if let Some(value) = replay {
            self.emit_trace(|ctx| {
                vec![format!(
                    "Initial value for {} ({}) is {}",
                    ctx.label,
                    ctx.type_tag,
                    ctx.describe(&value)
                )]
            });
            callback(&value);
        }

        subscription
    }

    /// Remove the observer registered under `subscription`. Unknown or
    /// already removed subscriptions are ignored.
    pub fn unbind(&self, subscription: &Subscription) {
        self.inner.unbind(subscription);
    }

    /// Seed the observable with `value` unless one is already stored.
    ///
    /// Seeding is an ordinary [`update`](Self::update): observers already
    /// bound are dispatched to.
    #[must_use]
    pub fn initial(&self, value: T) -> Self {
        if !self.has_value() {
            self.update(value);
        }
        self.clone()
    }

    fn emit_trace(&self, lines: impl FnOnce(&TraceContext<'_, T>) -> Vec<String>) {
        let (printer, lines) = {
            let inner = self.inner.borrow();
            let Some(trace) = &inner.trace else {
                return;
            };
            let ctx = TraceContext {
                label: &trace.label,
                type_tag: type_tag::<T>(inner.retention),
                registry: registry_repr(&inner.observers),
                render: trace.render,
            };
            (inner.printer.clone(), lines(&ctx))
        };

        for line in &lines {
            match &printer {
                Some(printer) => printer.print(line),
                None => StdoutPrinter.print(line),
            }
        }
    }
}

impl<T: Clone + fmt::Debug + 'static> Observable<T> {
    /// Turn on debug tracing under `label`.
    ///
    /// Every subsequent bind and update writes its trace lines to the
    /// injected printer (stdout when none was injected).
    #[must_use]
    pub fn debug(&self, label: impl Into<String>) -> Self {
        self.inner.borrow_mut().trace = Some(DebugTrace {
            label: label.into(),
            render: render_debug::<T>,
        });
        self.clone()
    }
}

impl Observable<bool> {
    /// Update with the negation of the stored value. No-op when empty.
    pub fn invert(&self) {
        if let Some(current) = self.value() {
            self.update(!current);
        }
    }
}

/// Non-owning handle to an [`Observable`].
pub struct WeakObservable<T> {
    inner: Weak<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for WeakObservable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for WeakObservable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObservable")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<T> WeakObservable<T> {
    /// Strong handle, if the observable is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Observable<T>> {
        self.inner.upgrade().map(|inner| Observable { inner })
    }
}

struct TraceContext<'a, T> {
    label: &'a str,
    type_tag: String,
    registry: String,
    render: fn(&T) -> String,
}

impl<T> TraceContext<'_, T> {
    fn describe(&self, value: &T) -> String {
        (self.render)(value)
    }
}

fn render_debug<T: fmt::Debug>(value: &T) -> String {
    format!("{value:?}")
}

fn type_tag<T>(retention: Retention) -> String {
    format!(
        "{}<{}>",
        retention.kind_name(),
        short_type_name(std::any::type_name::<T>())
    )
}

fn registry_repr<T>(observers: &[(SubscriptionId, Callback<T>)]) -> String {
    let entries: Vec<String> = observers
        .iter()
        .map(|(id, _)| format!("Subscription({id}): (Function)"))
        .collect();
    format!("[{}]", entries.join(", "))
}

/// Strip module paths from a `std::any::type_name` string.
///
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
        } else {
            out.push(c);
            if !(c.is_alphanumeric() || c == '_') {
                segment_start = out.len();
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
