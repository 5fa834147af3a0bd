//! Lifecycle hooks with explicit cancellation.
//!
//! Listeners are registered against named lifecycle points and run in
//! registration order. A listener returns [`Flow::Cancel`] to short-circuit
//! the point it is attached to; the first cancel wins and later listeners for
//! that point are not invoked.

use std::collections::HashMap;
use std::hash::Hash;

/// Outcome of a lifecycle listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Proceed with the step the listener observed.
    Continue,
    /// Abort the step. What "abort" means is defined by the firing site.
    Cancel,
}

impl Flow {
    #[inline]
    #[must_use]
    pub fn is_cancel(self) -> bool {
        matches!(self, Flow::Cancel)
    }
}

/// A listener attached to a lifecycle point over context `Ctx`.
pub type Listener<Ctx> = Box<dyn FnMut(&mut Ctx) -> Flow>;

/// Ordered listener lists keyed by lifecycle point.
///
/// `E` is the event key (an enum of named lifecycle points), `Ctx` the
/// mutable context handed to every listener. Listeners may request a
/// redispatch through the context; the firing site observes that after the
/// fire returns.
pub struct Hooks<E, Ctx> {
    slots: HashMap<E, Vec<Listener<Ctx>>>,
}

impl<E: Eq + Hash + Copy, Ctx> Hooks<E, Ctx> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// Attach a listener to a lifecycle point. Listeners fire in the order
    /// they were attached.
    pub fn attach<F>(&mut self, event: E, listener: F)
    where
        F: FnMut(&mut Ctx) -> Flow + 'static,
    {
        self.slots.entry(event).or_default().push(Box::new(listener));
    }

    /// Fire a lifecycle point. Returns [`Flow::Cancel`] as soon as any
    /// listener cancels, [`Flow::Continue`] otherwise (including when no
    /// listener is attached).
    pub fn fire(&mut self, event: E, ctx: &mut Ctx) -> Flow {
        if let Some(listeners) = self.slots.get_mut(&event) {
            for listener in listeners.iter_mut() {
                if listener(ctx).is_cancel() {
                    return Flow::Cancel;
                }
            }
        }
        Flow::Continue
    }

    /// Whether any listener is attached to the given point.
    #[must_use]
    pub fn has_listeners(&self, event: E) -> bool {
        self.slots.get(&event).is_some_and(|l| !l.is_empty())
    }

    /// Remove every listener for one point.
    pub fn detach_all(&mut self, event: E) {
        self.slots.remove(&event);
    }

    /// Remove every listener for every point.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl<E: Eq + Hash + Copy, Ctx> Default for Hooks<E, Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Point {
        A,
        B,
    }

    #[test]
    fn fire_runs_listeners_in_attach_order() {
        let mut hooks: Hooks<Point, Vec<u32>> = Hooks::new();
        hooks.attach(Point::A, |seen: &mut Vec<u32>| {
            seen.push(1);
            Flow::Continue
        });
        hooks.attach(Point::A, |seen: &mut Vec<u32>| {
            seen.push(2);
            Flow::Continue
        });

        let mut seen = Vec::new();
        assert_eq!(hooks.fire(Point::A, &mut seen), Flow::Continue);
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn first_cancel_short_circuits() {
        let mut hooks: Hooks<Point, Vec<u32>> = Hooks::new();
        hooks.attach(Point::A, |seen: &mut Vec<u32>| {
            seen.push(1);
            Flow::Cancel
        });
        hooks.attach(Point::A, |seen: &mut Vec<u32>| {
            seen.push(2);
            Flow::Continue
        });

        let mut seen = Vec::new();
        assert_eq!(hooks.fire(Point::A, &mut seen), Flow::Cancel);
        assert_eq!(seen, vec![1]);
    }

    #[test]
    fn unattached_point_continues() {
        let mut hooks: Hooks<Point, ()> = Hooks::new();
        hooks.attach(Point::A, |_| Flow::Cancel);
        assert_eq!(hooks.fire(Point::B, &mut ()), Flow::Continue);
        assert!(hooks.has_listeners(Point::A));
        assert!(!hooks.has_listeners(Point::B));
    }
}
