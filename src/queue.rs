//! Queued delivery: a bounded channel drained by one attached worker.
//!
//! Contending threads never block here. `submit` promotes the event's
//! references to global references and `try_send`s; a full queue drops the
//! event.
//!
//! A dropped wait keeps its pinned references in a small ledger until the
//! same thread's entered arrives for the same monitor; that entered is
//! dropped too, so the worker never delivers an entered without its wait.
//! The ledger holds at most one entry per contending thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};

use crate::error::{AgentError, Result};
use crate::forwarder::{deliver, Counters, EventKind, MonitorEvent, TargetSlot};
use crate::sys::jni::{jint, JNIEnv};

pub const WORKER_THREAD_NAME: &str = "monitor-event-forwarder";

/// Keeps event references alive across the thread hop and attaches the
/// worker. The JVM implementation lives on [`JavaVm`](crate::vm::JavaVm).
pub trait RefPinning: Send + Sync + 'static {
    /// Returns an event whose references stay valid on another thread, or
    /// `None` if they could not be pinned.
    fn pin(&self, jni: *mut JNIEnv, event: &MonitorEvent) -> Option<MonitorEvent>;
    /// Releases references returned by `pin`.
    fn unpin(&self, jni: *mut JNIEnv, event: &MonitorEvent);
    /// Whether `a` and `b` name the same thread and monitor. References are
    /// compared by value unless the implementation knows better.
    fn same_pair(&self, _jni: *mut JNIEnv, a: &MonitorEvent, b: &MonitorEvent) -> bool {
        a.thread == b.thread && a.object == b.object
    }
    fn attach_worker(&self) -> std::result::Result<*mut JNIEnv, jint>;
    fn detach_worker(&self);
}

type Ready = std::result::Result<(), (jint, Receiver<MonitorEvent>)>;

pub(crate) struct EventQueue {
    sender: RwLock<Option<Sender<MonitorEvent>>>,
    // Parked here until the worker takes it.
    receiver: Mutex<Option<Receiver<MonitorEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    // Pinned waits that were dropped, awaiting their entered.
    orphaned_waits: Mutex<Vec<MonitorEvent>>,
    pinning: Arc<dyn RefPinning>,
    target: Arc<TargetSlot>,
    counters: Arc<Counters>,
}

impl EventQueue {
    pub(crate) fn new(
        capacity: usize,
        pinning: Arc<dyn RefPinning>,
        target: Arc<TargetSlot>,
        counters: Arc<Counters>,
    ) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        EventQueue {
            sender: RwLock::new(Some(tx)),
            receiver: Mutex::new(Some(rx)),
            worker: Mutex::new(None),
            orphaned_waits: Mutex::new(Vec::new()),
            pinning,
            target,
            counters,
        }
    }

    /// Spawns the worker and waits until it is attached. No-op once started.
    pub(crate) fn start(&self) -> Result<()> {
        let mut receiver = self.receiver.lock();
        let Some(rx) = receiver.take() else {
            return Ok(());
        };

        let (ready_tx, ready_rx) = bounded::<Ready>(1);
        let pinning = Arc::clone(&self.pinning);
        let target = Arc::clone(&self.target);
        let counters = Arc::clone(&self.counters);

        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(rx, ready_tx, pinning, target, counters));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                // The closure, and the receiver with it, is gone.
                error!("failed to spawn {}: {}", WORKER_THREAD_NAME, e);
                return Err(AgentError::WorkerAttach(crate::sys::jni::JNI_ERR));
            }
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {
                *self.worker.lock() = Some(handle);
                info!("{} attached", WORKER_THREAD_NAME);
                Ok(())
            }
            Ok(Err((code, rx))) => {
                let _ = handle.join();
                *receiver = Some(rx);
                Err(AgentError::WorkerAttach(code))
            }
            Err(_) => {
                let _ = handle.join();
                Err(AgentError::WorkerAttach(crate::sys::jni::JNI_ERR))
            }
        }
    }

    pub(crate) fn submit(&self, jni: *mut JNIEnv, event: MonitorEvent) {
        let sender = self.sender.read();
        let Some(tx) = sender.as_ref() else {
            self.note_drop(event, "queue closed");
            return;
        };
        if event.kind == EventKind::Entered && self.take_orphaned_wait(jni, &event) {
            self.note_drop(event, "its wait was dropped");
            return;
        }
        let Some(pinned) = self.pinning.pin(jni, &event) else {
            self.note_drop(event, "could not pin references");
            return;
        };
        match tx.try_send(pinned) {
            Ok(()) => {}
            Err(TrySendError::Full(ev)) => self.reject(jni, ev, "queue full"),
            Err(TrySendError::Disconnected(ev)) => self.reject(jni, ev, "worker gone"),
        }
    }

    fn reject(&self, jni: *mut JNIEnv, event: MonitorEvent, why: &str) {
        match event.kind {
            EventKind::Wait => self.orphaned_waits.lock().push(event),
            EventKind::Entered => self.pinning.unpin(jni, &event),
        }
        self.note_drop(event, why);
    }

    /// Removes and releases the dropped wait matching `entered`, if any.
    fn take_orphaned_wait(&self, jni: *mut JNIEnv, entered: &MonitorEvent) -> bool {
        let mut orphaned = self.orphaned_waits.lock();
        let Some(i) = orphaned.iter().position(|w| self.pinning.same_pair(jni, w, entered)) else {
            return false;
        };
        let wait = orphaned.swap_remove(i);
        drop(orphaned);
        self.pinning.unpin(jni, &wait);
        true
    }

    fn note_drop(&self, event: MonitorEvent, why: &str) {
        let before = self.counters.record_dropped();
        if before == 0 {
            warn!("dropping {:?} event: {} (further drops logged at debug)", event.kind, why);
        } else {
            debug!("dropping {:?} event: {}", event.kind, why);
        }
    }

    /// Closes the sending side. Idempotent.
    pub(crate) fn close(&self) {
        if self.sender.write().take().is_some() {
            debug!("event queue closed");
        }
    }

    pub(crate) fn join(&self) {
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                error!("{} panicked", WORKER_THREAD_NAME);
            }
        }
    }
}

fn run_worker(
    rx: Receiver<MonitorEvent>,
    ready: Sender<Ready>,
    pinning: Arc<dyn RefPinning>,
    target: Arc<TargetSlot>,
    counters: Arc<Counters>,
) {
    let jni = match pinning.attach_worker() {
        Ok(jni) => jni,
        Err(code) => {
            error!("{} could not attach: JNI code {}", WORKER_THREAD_NAME, code);
            let _ = ready.send(Err((code, rx)));
            return;
        }
    };
    let _ = ready.send(Ok(()));
    drop(ready);

    for event in rx.iter() {
        deliver(&target, &counters, jni, &event);
        pinning.unpin(jni, &event);
    }

    pinning.detach_worker();
    debug!("{} exiting", WORKER_THREAD_NAME);
}
