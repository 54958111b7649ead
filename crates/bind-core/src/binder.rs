#![forbid(unsafe_code)]

//! Weak-target property writers.
//!
//! A [`Binder<V>`] turns "set property P of object O to V" into a plain
//! function of `V`. The object is captured weakly: once it is released,
//! writing through the binder does nothing. UI teardown code therefore never
//! has to unbind before dropping a widget.
//!
//! Widget adapters are written as traits implemented on [`Bindable<W>`] for
//! each concrete widget type `W`:
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use bind_core::{Bindable, BindableCompatible, Binder, Observable};
//!
//! #[derive(Default)]
//! struct Label {
//!     text: RefCell<String>,
//! }
//!
//! impl BindableCompatible for Label {}
//!
//! trait LabelBindings {
//!     fn text(&self) -> Binder<String>;
//! }
//!
//! impl LabelBindings for Bindable<Label> {
//!     fn text(&self) -> Binder<String> {
//!         Binder::new(self.target(), |label: &Label, text: &String| {
//!             *label.text.borrow_mut() = text.clone();
//!         })
//!     }
//! }
//!
//! let label = Rc::new(Label::default());
//! let title = Observable::new();
//! title.bind_to(&label.binding().text());
//! title.update("Inbox".to_string());
//! assert_eq!(*label.text.borrow(), "Inbox");
//! ```

use std::fmt;
use std::rc::{Rc, Weak};

use crate::observable::Observable;
use crate::subscription::Subscription;

/// One-way value sink writing into a weakly held target.
pub struct Binder<V> {
    binding: Rc<dyn Fn(&V)>,
}

impl<V> Clone for Binder<V> {
    fn clone(&self) -> Self {
        Self {
            binding: Rc::clone(&self.binding),
        }
    }
}

impl<V> fmt::Debug for Binder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder").finish_non_exhaustive()
    }
}

impl<V: 'static> Binder<V> {
    /// Create a binder that calls `binding(target, value)` while `target` is
    /// alive. Only a weak reference to `target` is kept.
    #[must_use]
    pub fn new<Target: 'static>(
        target: &Rc<Target>,
        binding: impl Fn(&Target, &V) + 'static,
    ) -> Self {
        let target: Weak<Target> = Rc::downgrade(target);
        Self {
            binding: Rc::new(move |value: &V| {
                if let Some(target) = target.upgrade() {
                    binding(&target, value);
                }
            }),
        }
    }

    /// Write `value` to the target. Silent no-op if the target is gone.
    pub fn on(&self, value: &V) {
        (self.binding)(value);
    }
}

/// Namespace on which per-widget adapter traits are implemented.
pub struct Bindable<Target> {
    target: Rc<Target>,
}

impl<Target> Bindable<Target> {
    /// Wrap `target`.
    #[must_use]
    pub fn new(target: Rc<Target>) -> Self {
        Self { target }
    }

    /// The wrapped target, for building binders.
    #[must_use]
    pub fn target(&self) -> &Rc<Target> {
        &self.target
    }
}

impl<Target> fmt::Debug for Bindable<Target> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindable").finish_non_exhaustive()
    }
}

/// Marker for types that expose a [`Bindable`] namespace.
pub trait BindableCompatible: Sized {
    /// Adapter namespace for this object.
    fn binding(self: &Rc<Self>) -> Bindable<Self> {
        Bindable::new(Rc::clone(self))
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Bind `binder` as an observer.
    pub fn bind_to(&self, binder: &Binder<T>) -> Subscription {
        let binder = binder.clone();
        self.bind(move |value| binder.on(value))
    }

    /// Bind each binder independently.
    pub fn bind_to_all<'a>(&self, binders: impl IntoIterator<Item = &'a Binder<T>>) {
        for binder in binders {
            self.bind_to(binder);
        }
    }
}
