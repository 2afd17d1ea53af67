//! Readiness gate for the embed API
//!
//! The iframe API script loads once per page. Techs mounted before it is
//! ready wait here; when the page-wide ready signal fires the queue is drained
//! in mount order exactly once and the gate stays open for good.

use crate::types::InstanceId;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info};

/// Shared handle to a gate
pub type SharedGate<T> = Rc<RefCell<ReadinessGate<T>>>;

/// Outcome of admitting a tech
#[derive(Debug)]
pub enum Admission<T> {
    /// API already loaded; initialize immediately
    Ready(T),
    /// Queued until [`ReadinessGate::open`]
    Queued,
}

/// Queue of techs waiting for the embed API
#[derive(Debug)]
pub struct ReadinessGate<T> {
    api_ready: bool,
    queue: Vec<(InstanceId, T)>,
}

impl<T> Default for ReadinessGate<T> {
    fn default() -> Self {
        Self {
            api_ready: false,
            queue: Vec::new(),
        }
    }
}

impl<T> ReadinessGate<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh gate behind a shared handle
    pub fn shared() -> SharedGate<T> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn is_api_ready(&self) -> bool {
        self.api_ready
    }

    /// Number of techs still waiting
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_queued(&self, id: InstanceId) -> bool {
        self.queue.iter().any(|(queued, _)| *queued == id)
    }

    /// Hand back `item` if the API is ready, otherwise queue it
    pub fn admit(&mut self, id: InstanceId, item: T) -> Admission<T> {
        if self.api_ready {
            return Admission::Ready(item);
        }
        if !self.is_queued(id) {
            debug!(instance = %id, position = self.queue.len(), "Tech queued for embed API");
            self.queue.push((id, item));
        }
        Admission::Queued
    }

    /// Remove a tech that is going away before the API loaded
    pub fn withdraw(&mut self, id: InstanceId) -> Option<T> {
        let index = self.queue.iter().position(|(queued, _)| *queued == id)?;
        debug!(instance = %id, "Tech withdrawn from readiness queue");
        Some(self.queue.remove(index).1)
    }

    /// Latch the API as ready and drain the queue in admission order.
    ///
    /// Only the first call returns anything.
    pub fn open(&mut self) -> Vec<(InstanceId, T)> {
        if self.api_ready {
            return Vec::new();
        }
        self.api_ready = true;
        let drained = std::mem::take(&mut self.queue);
        info!(queued = drained.len(), "Embed API ready");
        drained
    }
}

/// Per-thread gate used when the host does not inject one.
///
/// The embed API is a page-wide singleton and everything runs on the page's
/// single thread, so "process-wide" means this thread.
pub fn global<T: 'static>() -> SharedGate<T> {
    use std::any::{Any, TypeId};
    use std::collections::HashMap;

    thread_local! {
        static GATES: RefCell<HashMap<TypeId, Rc<dyn Any>>> = RefCell::new(HashMap::new());
    }

    GATES.with(|gates| {
        let mut gates = gates.borrow_mut();
        let entry = gates
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Rc::new(RefCell::new(ReadinessGate::<T>::new())) as Rc<dyn Any>)
            .clone();
        match entry.downcast::<RefCell<ReadinessGate<T>>>() {
            Ok(gate) => gate,
            // Keyed by TypeId, so the downcast cannot miss
            Err(_) => ReadinessGate::shared(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_then_open_in_order() {
        let mut gate = ReadinessGate::new();
        let ids: Vec<_> = (0..3).map(|_| InstanceId::new()).collect();

        for (n, id) in ids.iter().enumerate() {
            assert!(matches!(gate.admit(*id, n), Admission::Queued));
        }
        assert_eq!(gate.pending(), 3);

        let drained = gate.open();
        assert_eq!(drained.iter().map(|(_, n)| *n).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(gate.is_api_ready());
        assert_eq!(gate.pending(), 0);

        // Second open is a no-op
        assert!(gate.open().is_empty());
    }

    #[test]
    fn test_withdraw_before_open() {
        let mut gate = ReadinessGate::new();
        let a = InstanceId::new();
        let b = InstanceId::new();
        gate.admit(a, "a");
        gate.admit(b, "b");

        assert_eq!(gate.withdraw(a), Some("a"));
        assert_eq!(gate.withdraw(a), None);

        let drained = gate.open();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].1, "b");
    }

    #[test]
    fn test_admit_after_open_is_immediate() {
        let mut gate = ReadinessGate::new();
        gate.open();
        assert!(matches!(gate.admit(InstanceId::new(), 7), Admission::Ready(7)));
        assert_eq!(gate.pending(), 0);
    }

    #[test]
    fn test_admit_twice_queues_once() {
        let mut gate = ReadinessGate::new();
        let id = InstanceId::new();
        gate.admit(id, 1);
        gate.admit(id, 1);
        assert_eq!(gate.pending(), 1);
    }

    #[test]
    fn test_global_is_shared_per_type() {
        let first = global::<u64>();
        let second = global::<u64>();
        assert!(Rc::ptr_eq(&first, &second));

        let other = global::<String>();
        assert!(!other.borrow().is_api_ready());
    }
}
