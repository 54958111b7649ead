#![forbid(unsafe_code)]

//! Functional operators over [`Observable`].
//!
//! Every operator is built from `bind` and `update` alone: it creates a new
//! observable, binds a callback on its source(s) that updates the new
//! observable, and returns it. The returned observable is kept alive by the
//! source's registry, so chains need no explicit ownership.
//!
//! [`combine`] and [`combine_all`] hold their inputs weakly; the result never
//! keeps its sources alive.

use std::cell::RefCell;
use std::rc::Rc;

use crate::observable::{Observable, WeakObservable};

impl<T: Clone + 'static> Observable<T> {
    /// Observable of `transform(v)` for every `v` this one emits.
    #[must_use]
    pub fn map<U: Clone + 'static>(&self, transform: impl Fn(&T) -> U + 'static) -> Observable<U> {
        let output = Observable::new();
        let target = output.clone();
        self.bind(move |value| target.update(transform(value)));
        output
    }

    /// Flatten the observables produced by `transform`.
    ///
    /// Each emission binds the freshly produced inner observable and forwards
    /// whatever it emits. Subscriptions to earlier inner observables are kept,
    /// so an inner observable returned more than once is forwarded once per
    /// time it was returned.
    #[must_use]
    pub fn flat_map<U: Clone + 'static>(
        &self,
        transform: impl Fn(&T) -> Observable<U> + 'static,
    ) -> Observable<U> {
        let output = Observable::new();
        let target = output.clone();
        self.bind(move |value| {
            let inner = transform(value);
            let target = target.clone();
            inner.bind(move |inner_value| target.update(inner_value.clone()));
        });
        output
    }

    /// Observable that only re-emits values for which `predicate` holds.
    ///
    /// Rejected values leave the result untouched: it keeps the last value
    /// that passed.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Observable<T> {
        let output = Observable::new();
        let target = output.clone();
        self.bind(move |value| {
            if predicate(value) {
                target.update(value.clone());
            }
        });
        output
    }

    /// Running accumulation of the emitted values.
    ///
    /// On each emission the result is updated with
    /// `next_partial_result(current_or_initial, v)`, where the accumulator is
    /// the result's own stored value.
    #[must_use]
    pub fn reduce<R: Clone + 'static>(
        &self,
        initial: R,
        next_partial_result: impl Fn(R, &T) -> R + 'static,
    ) -> Observable<R> {
        let output = Observable::new();
        let target = output.clone();
        self.bind(move |value| {
            let accumulated = target.value().unwrap_or_else(|| initial.clone());
            target.update(next_partial_result(accumulated, value));
        });
        output
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Observable that drops consecutive repeats.
    ///
    /// `A, A, A, B, B, A` emits `A, B, A`. The comparison is seeded with the
    /// current value, so a seeded source is not replayed and the result stays
    /// empty until the source changes.
    #[must_use]
    pub fn ignoring_duplicates(&self) -> Observable<T> {
        let previous = RefCell::new(self.value());
        self.filter(move |value| {
            let repeated = previous.borrow().as_ref() == Some(value);
            if !repeated {
                previous.replace(Some(value.clone()));
            }
            !repeated
        })
    }
}

/// Pair the latest values of two observables.
///
/// Emits nothing until both sides hold a value; afterwards every emission of
/// either side produces one pair with the other side's latest value.
#[must_use]
pub fn combine<A, B>(first: &Observable<A>, second: &Observable<B>) -> Observable<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    let output = Observable::new();

    let target = output.clone();
    let other = second.downgrade();
    first.bind(move |a| {
        if let Some(b) = other.upgrade().and_then(|second| second.value()) {
            target.update((a.clone(), b));
        }
    });

    let target = output.clone();
    let other = first.downgrade();
    second.bind(move |b| {
        if let Some(a) = other.upgrade().and_then(|first| first.value()) {
            target.update((a, b.clone()));
        }
    });

    output
}

/// Snapshot the values of `outputs`, in order, whenever any of them emits.
///
/// Emits only once every source that is still alive holds a value and none
/// has been dropped.
#[must_use]
pub fn combine_all<T: Clone + 'static>(outputs: &[Observable<T>]) -> Observable<Vec<T>> {
    let output = Observable::new();
    let sources: Rc<[WeakObservable<T>]> = outputs.iter().map(Observable::downgrade).collect();

    for source in outputs {
        let target = output.clone();
        let sources = Rc::clone(&sources);
        source.bind(move |_| {
            let values: Vec<T> = sources
                .iter()
                .filter_map(WeakObservable::upgrade)
                .filter_map(|source| source.value())
                .collect();
            if values.len() == sources.len() {
                target.update(values);
            }
        });
    }

    output
}

/// Interleave the emissions of two observables.
#[must_use]
pub fn merge<T: Clone + 'static>(first: &Observable<T>, second: &Observable<T>) -> Observable<T> {
    let output = Observable::new();
    for source in [first, second] {
        let target = output.clone();
        source.bind(move |value| target.update(value.clone()));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::Relay;
    use std::cell::Cell;

    fn record<T: Clone + 'static>(output: &Observable<T>) -> Rc<RefCell<Vec<T>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        output.bind(move |value| sink.borrow_mut().push(value.clone()));
        log
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Count {
        One,
        Two,
    }

    #[test]
    fn map_chain() {
        let source = Observable::new();
        let mapped = source.map(|count: &Count| match count {
            Count::One => "one",
            Count::Two => "two",
        });
        let log = record(&mapped);

        source.update(Count::One);
        source.update(Count::Two);
        source.update(Count::One);

        assert_eq!(*log.borrow(), vec!["one", "two", "one"]);
        assert_eq!(mapped.value(), Some("one"));
    }

    #[test]
    fn map_replays_seeded_source() {
        let source = Observable::with_value(3);
        let doubled = source.map(|v| v * 2);
        assert_eq!(doubled.value(), Some(6));
    }

    #[test]
    fn flat_map_forwards_inner_values() {
        let source = Observable::new();
        let flattened = source.flat_map(|count: &Count| match count {
            Count::One => Observable::with_value("one".to_string()),
            Count::Two => Observable::with_value("two".to_string()),
        });

        source.update(Count::One);
        assert_eq!(flattened.value().as_deref(), Some("one"));

        source.update(Count::Two);
        assert_eq!(flattened.value().as_deref(), Some("two"));

        source.update(Count::One);
        assert_eq!(flattened.value().as_deref(), Some("one"));
    }

    #[test]
    fn flat_map_accumulates_inner_subscriptions() {
        let inner = Observable::<i32>::new();
        let source = Observable::new();
        let shared = inner.clone();
        let flattened = source.flat_map(move |_: &()| shared.clone());
        let log = record(&flattened);

        source.update(());
        source.update(());
        source.update(());
        assert_eq!(inner.observer_count(), 3);

        inner.update(7);
        assert_eq!(*log.borrow(), vec![7, 7, 7]);
    }

    #[test]
    fn filter_keeps_last_passing_value() {
        let source = Observable::new();
        let filtered = source.filter(|s: &String| s.contains("test"));

        source.update("first test".to_string());
        assert_eq!(filtered.value().as_deref(), Some("first test"));

        source.update("not".to_string());
        assert_eq!(filtered.value().as_deref(), Some("first test"));

        source.update("second test".to_string());
        assert_eq!(filtered.value().as_deref(), Some("second test"));
    }

    #[test]
    fn merge_interleaves() {
        let first = Observable::new();
        let second = Observable::new();
        let merged = merge(&first, &second);
        assert_eq!(merged.value(), None);

        first.update(1);
        assert_eq!(merged.value(), Some(1));
        first.update(2);
        assert_eq!(merged.value(), Some(2));
        second.update(1);
        assert_eq!(merged.value(), Some(1));
        second.update(5);
        assert_eq!(merged.value(), Some(5));
    }

    #[test]
    fn reduce_value_type() {
        let source = Observable::new();
        let reduced = source.reduce(0, |acc, v: &i32| acc + v);
        let log = record(&reduced);

        for value in [1, 2, 3, 4, 5] {
            source.update(value);
        }

        assert_eq!(*log.borrow(), vec![1, 3, 6, 10, 15]);
        assert_eq!(reduced.value(), Some(15));
    }

    #[test]
    fn reduce_shared_accumulator() {
        let source = Observable::new();
        let reduced = source.reduce(
            Rc::new(RefCell::new(String::new())),
            |acc, number: &i32| {
                acc.borrow_mut().push_str(&number.to_string());
                acc
            },
        );

        for value in [1, 2, 3, 4, 5] {
            source.update(value);
        }

        let text = reduced.value().map(|acc| acc.borrow().clone());
        assert_eq!(text.as_deref(), Some("12345"));
    }

    #[test]
    fn reduce_reentrant_updates_fold_in_emission_order() {
        let source = Observable::<i32>::new();
        let reduced = source.reduce(0, |acc, v: &i32| acc + v);
        let log = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&log);
        let feedback = source.clone();
        reduced.bind(move |total: &i32| {
            sink.borrow_mut().push(*total);
            if *total < 3 {
                feedback.update(1);
            }
        });

        source.update(1);

        assert_eq!(*log.borrow(), vec![1, 2, 3]);
        assert_eq!(reduced.value(), Some(3));
    }

    #[test]
    fn ignoring_duplicates_suppresses_runs() {
        let source = Observable::new();
        let distinct = source.ignoring_duplicates();
        let log = record(&distinct);

        for value in [true, true, true, false, false, true] {
            source.update(value);
        }

        assert_eq!(*log.borrow(), vec![true, false, true]);
    }

    #[test]
    fn ignoring_duplicates_skips_seeded_value() {
        let source = Observable::with_value(true);
        let distinct = source.ignoring_duplicates();
        assert_eq!(distinct.value(), None);

        let log = record(&distinct);
        source.update(true);
        source.update(false);

        assert_eq!(*log.borrow(), vec![false]);
    }

    #[test]
    fn combine_waits_for_both_sides() {
        let first = Observable::new();
        let second = Observable::new();
        let log = record(&combine(&first, &second));

        first.update(true);
        assert!(log.borrow().is_empty());

        second.update(true);
        assert_eq!(*log.borrow(), vec![(true, true)]);

        first.update(false);
        assert_eq!(*log.borrow(), vec![(true, true), (false, true)]);
    }

    #[test]
    fn combine_two_types() {
        let flag = Observable::new();
        let name = Observable::new();
        let combined = combine(&flag, &name);

        flag.update(true);
        assert_eq!(combined.value(), None);

        name.update("test".to_string());
        assert_eq!(combined.value(), Some((true, "test".to_string())));

        flag.update(false);
        assert_eq!(combined.value(), Some((false, "test".to_string())));
    }

    #[test]
    fn combine_does_not_keep_inputs_alive() {
        let first = Observable::with_value(1);
        let second = Observable::new();
        let combined = combine(&first, &second);
        let weak_first = first.downgrade();

        drop(first);
        assert!(weak_first.upgrade().is_none());

        second.update(2);
        assert_eq!(combined.value(), None);
    }

    #[test]
    fn combine_with_relay_never_uses_stale_pulse() {
        let relay = Relay::new();
        let state = Observable::new();
        let log = record(&combine(relay.as_observable(), &state));

        relay.update('x');
        state.update(1);
        assert!(log.borrow().is_empty());

        relay.update('y');
        assert_eq!(*log.borrow(), vec![('y', 1)]);

        state.update(2);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn combine_all_waits_for_every_source() {
        let outputs: Vec<Observable<bool>> = (0..3).map(|_| Observable::new()).collect();
        let combined = combine_all(&outputs);

        outputs[0].update(true);
        outputs[1].update(true);
        assert_eq!(combined.value(), None);

        outputs[2].update(true);
        assert_eq!(combined.value(), Some(vec![true, true, true]));

        outputs[0].update(false);
        assert_eq!(combined.value(), Some(vec![false, true, true]));
    }

    #[test]
    fn combine_all_stops_when_a_source_is_dropped() {
        let mut outputs: Vec<Observable<u8>> = (0..2).map(|_| Observable::new()).collect();
        let combined = combine_all(&outputs);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        combined.bind(move |_| count_clone.set(count_clone.get() + 1));

        outputs[1].update(1);
        drop(outputs.remove(1));
        outputs[0].update(2);

        assert_eq!(count.get(), 0);
    }

    #[test]
    fn initial_on_function_chain() {
        let left = Observable::with_value(3);
        let right = Observable::new();

        let combined = combine(&left, &right).map(|(a, b)| a + b).initial(20);
        assert_eq!(combined.value(), Some(20));

        left.update(4);
        assert_eq!(combined.value(), Some(20));

        right.update(6);
        assert_eq!(combined.value(), Some(10));
    }
}
