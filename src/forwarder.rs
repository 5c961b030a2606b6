//! Event forwarding from the JVMTI callbacks to the bound managed target.
//!
//! ```text
//!  MonitorContendedEnter ──┐
//!                          ├──> Forwarder::forward ──> Direct: upcall on this thread
//!  MonitorContendedEntered ┘                      └──> Queued: pin refs, try_send
//!                                                          │
//!                                      monitor-event-forwarder ──> upcall, unpin
//! ```
//!
//! The target sits behind an [`ArcSwapOption`]: every event does one
//! lock-free load, and a rebind never waits for in-flight deliveries. An
//! in-flight delivery holds its own `Arc` to the old target, which is
//! released when that delivery returns.

use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use log::{debug, trace};

use crate::error::Result;
use crate::queue::{EventQueue, RefPinning};
use crate::sys::jni::{jobject, jthread, JNIEnv};
use crate::sys::jvmti::{
    jvmtiEvent, JVMTI_EVENT_MONITOR_CONTENDED_ENTER, JVMTI_EVENT_MONITOR_CONTENDED_ENTERED,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A thread blocked on a monitor another thread owns.
    Wait,
    /// The blocked thread acquired the monitor.
    Entered,
}

impl EventKind {
    /// Both kinds, in the order they are enabled.
    pub const ALL: [EventKind; 2] = [EventKind::Wait, EventKind::Entered];

    pub fn jvmti_event(self) -> jvmtiEvent {
        match self {
            EventKind::Wait => JVMTI_EVENT_MONITOR_CONTENDED_ENTER,
            EventKind::Entered => JVMTI_EVENT_MONITOR_CONTENDED_ENTERED,
        }
    }

    /// Name of the static managed method this kind is delivered to.
    pub fn method_name(self) -> &'static str {
        match self {
            EventKind::Wait => "onMonitorWait",
            EventKind::Entered => "onMonitorEntered",
        }
    }
}

/// One contention event. In synchronous mode the references are the
/// runtime's local references for the callback; in queued mode they are
/// global references owned by the queue until delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorEvent {
    pub kind: EventKind,
    pub thread: jthread,
    pub object: jobject,
}

// Only queued events cross threads, and those carry global references.
unsafe impl Send for MonitorEvent {}

impl MonitorEvent {
    pub fn new(kind: EventKind, thread: jthread, object: jobject) -> Self {
        MonitorEvent { kind, thread, object }
    }
}

/// Receives forwarded events. Implemented by the managed-method target and
/// by test doubles.
pub trait ContentionListener: Send + Sync {
    /// Called with the JNI environment of the delivering thread.
    fn on_event(&self, jni: *mut JNIEnv, event: &MonitorEvent);
}

pub(crate) type TargetSlot = ArcSwapOption<Box<dyn ContentionListener>>;

#[derive(Default)]
pub(crate) struct Counters {
    waits: AtomicU64,
    entered: AtomicU64,
    unrouted: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    pub(crate) fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    fn snapshot(&self) -> BridgeStats {
        BridgeStats {
            waits: self.waits.load(Ordering::Relaxed),
            entered: self.entered.load(Ordering::Relaxed),
            unrouted: self.unrouted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Diagnostic counters. Not synchronized with each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// `onMonitorWait` upcalls made.
    pub waits: u64,
    /// `onMonitorEntered` upcalls made.
    pub entered: u64,
    /// Events skipped because no target was bound.
    pub unrouted: u64,
    /// Events discarded because the delivery queue was full or closed.
    pub dropped: u64,
}

/// Hands `event` to the currently bound target, if any.
pub(crate) fn deliver(target: &TargetSlot, counters: &Counters, jni: *mut JNIEnv, event: &MonitorEvent) {
    match target.load_full() {
        Some(listener) => {
            trace!("forwarding {:?}", event);
            listener.on_event(jni, event);
            let counter = match event.kind {
                EventKind::Wait => &counters.waits,
                EventKind::Entered => &counters.entered,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
        None => {
            counters.unrouted.fetch_add(1, Ordering::Relaxed);
            debug!("no target bound, skipping {:?}", event.kind);
        }
    }
}

enum Dispatch {
    Direct,
    Queued(EventQueue),
}

pub struct Forwarder {
    target: Arc<TargetSlot>,
    counters: Arc<Counters>,
    dispatch: Dispatch,
}

impl Forwarder {
    /// Upcalls on the contending thread before the callback returns.
    pub fn synchronous() -> Self {
        Forwarder {
            target: Arc::new(ArcSwapOption::empty()),
            counters: Arc::new(Counters::default()),
            dispatch: Dispatch::Direct,
        }
    }

    /// Hands events to a bounded queue of `capacity` drained by one worker.
    pub fn queued(capacity: usize, pinning: Arc<dyn RefPinning>) -> Self {
        let target = Arc::new(ArcSwapOption::empty());
        let counters = Arc::new(Counters::default());
        let queue = EventQueue::new(capacity, pinning, Arc::clone(&target), Arc::clone(&counters));
        Forwarder {
            target,
            counters,
            dispatch: Dispatch::Queued(queue),
        }
    }

    /// Replaces the target. Deliveries already running keep the old one.
    pub fn install(&self, target: Box<dyn ContentionListener>) {
        self.target.store(Some(Arc::new(target)));
    }

    /// Unbinds without releasing the target: at unload the VM can no longer
    /// service the `DeleteGlobalRef` its drop would issue.
    pub fn forget(&self) {
        if let Some(target) = self.target.swap(None) {
            mem::forget(target);
        }
    }

    /// Starts the queue worker if there is one. Must run in the live phase
    /// since the worker attaches to the VM.
    pub fn prepare(&self) -> Result<()> {
        match &self.dispatch {
            Dispatch::Direct => Ok(()),
            Dispatch::Queued(queue) => queue.start(),
        }
    }

    pub fn forward(&self, jni: *mut JNIEnv, event: MonitorEvent) {
        match &self.dispatch {
            Dispatch::Direct => deliver(&self.target, &self.counters, jni, &event),
            Dispatch::Queued(queue) => queue.submit(jni, event),
        }
    }

    pub fn stats(&self) -> BridgeStats {
        self.counters.snapshot()
    }

    /// Stops accepting queued events; the worker drains and exits.
    pub fn close(&self) {
        if let Dispatch::Queued(queue) = &self.dispatch {
            queue.close();
        }
    }

    /// Waits for the queue worker to exit. Call after [`close`](Self::close).
    pub fn join(&self) {
        if let Dispatch::Queued(queue) = &self.dispatch {
            queue.join();
        }
    }
}
