#![forbid(unsafe_code)]

//! Observable values and weak-target binders for UI data binding.
//!
//! # Role
//! `bind-core` is the engine behind one-way data binding: a producer updates
//! an [`Observable`], every bound observer runs synchronously, and
//! [`Binder`]s write the value into widget properties without keeping the
//! widgets alive.
//!
//! # Primary pieces
//! - **Observable**: optional current value, ordered observers, replay on bind.
//! - **Relay**: observable that forgets each value after dispatch.
//! - **Combinators**: `map`, `flat_map`, `filter`, `reduce`,
//!   `ignoring_duplicates`, [`combine`], [`combine_all`], [`merge`], `initial`.
//! - **Subscription / SubscriptionContainer**: revocable registrations.
//! - **Binder / Bindable**: weak-target writers and the adapter namespace.
//! - **Printer**: injectable sink for per-observable debug traces.
//!
//! # Threading
//! Everything is single-threaded (`Rc<RefCell<..>>`); dispatch happens inline
//! on the caller's stack and may re-enter freely.
//!
//! ```
//! use bind_core::{Observable, combine};
//!
//! let width = Observable::with_value(3);
//! let height = Observable::new();
//! let area = combine(&width, &height).map(|(w, h)| w * h);
//!
//! assert_eq!(area.value(), None);
//! height.update(4);
//! assert_eq!(area.value(), Some(12));
//! ```

pub mod binder;
pub mod combinators;
#[cfg(feature = "tracing-subscriber")]
pub mod logging;
pub mod observable;
pub mod printer;
pub mod relay;
pub mod subscription;

pub use binder::{Bindable, BindableCompatible, Binder};
pub use combinators::{combine, combine_all, merge};
pub use observable::{Observable, WeakObservable};
pub use printer::{
    CapturingPrinter, Printer, PrinterConfig, PrinterDestination, StdoutPrinter, TracingPrinter,
    WriterPrinter,
};
pub use relay::Relay;
pub use subscription::{Subscription, SubscriptionContainer, SubscriptionId, Unbind};
