//! The bridge context: bound target, lifecycle state, and the toggle.
//!
//! ```text
//!            bind              enable              disable
//!  Unbound ───────> Bound ──────────> Enabled ──────────> Disabled
//!                     ^                  ^                   │
//!                     │ bind (rebind)    └───── enable ──────┘
//! ```
//!
//! Lifecycle operations are serialized by one mutex. The mutex is never
//! held across an upcall: forwarding only touches the [`Forwarder`], so a
//! managed callback may call bind, enable or disable itself.

use log::{info, warn};
use parking_lot::Mutex;

use crate::capability::{CapabilityNegotiator, CapabilitySet, InstrumentationHost};
use crate::error::{AgentError, Result};
use crate::forwarder::{BridgeStats, ContentionListener, EventKind, Forwarder, MonitorEvent};
use crate::sys::jni::JNIEnv;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No managed target yet; enable is refused.
    Unbound,
    /// Target bound, notifications off.
    Bound,
    /// Capability held and both event kinds enabled.
    Enabled,
    /// Notifications turned off again; the target stays bound.
    Disabled,
}

pub struct MonitorBridge<H: InstrumentationHost> {
    host: H,
    state: Mutex<BridgeState>,
    forwarder: Forwarder,
}

impl<H: InstrumentationHost> MonitorBridge<H> {
    pub fn new(host: H, forwarder: Forwarder) -> Self {
        MonitorBridge {
            host,
            state: Mutex::new(BridgeState::Unbound),
            forwarder,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn state(&self) -> BridgeState {
        *self.state.lock()
    }

    pub fn stats(&self) -> BridgeStats {
        self.forwarder.stats()
    }

    /// Installs `target` as the destination of both event kinds, replacing
    /// any previous target.
    pub fn bind(&self, target: Box<dyn ContentionListener>) {
        let mut state = self.state.lock();
        self.forwarder.install(target);
        if *state == BridgeState::Unbound {
            *state = BridgeState::Bound;
        }
        info!("managed callback target bound ({:?})", *state);
    }

    /// Acquires `can_generate_monitor_events` and enables both event kinds.
    /// Returns `Ok(false)` if already enabled.
    pub fn enable(&self) -> Result<bool> {
        let mut state = self.state.lock();
        match *state {
            BridgeState::Unbound => return Err(AgentError::NotBound),
            BridgeState::Enabled => return Ok(false),
            BridgeState::Bound | BridgeState::Disabled => {}
        }

        self.forwarder.prepare()?;

        let negotiator = CapabilityNegotiator::new(&self.host);
        let acquired = negotiator.add(CapabilitySet::monitor_events())?;

        for (i, kind) in EventKind::ALL.iter().enumerate() {
            if let Err(e) = self.host.set_event_notification_mode(true, kind.jvmti_event()) {
                warn!("enabling {:?} events failed, rolling back: {}", kind, e);
                self.roll_back(&EventKind::ALL[..i], acquired);
                return Err(e);
            }
        }

        *state = BridgeState::Enabled;
        info!("monitor contention events enabled");
        Ok(true)
    }

    fn roll_back(&self, enabled: &[EventKind], acquired: bool) {
        for kind in enabled {
            if let Err(e) = self.host.set_event_notification_mode(false, kind.jvmti_event()) {
                warn!("rollback: disabling {:?} events failed: {}", kind, e);
            }
        }
        if acquired {
            if let Err(e) = CapabilityNegotiator::new(&self.host).relinquish(CapabilitySet::monitor_events()) {
                warn!("rollback: relinquishing capability failed: {}", e);
            }
        }
    }

    /// Disables both event kinds, then relinquishes the capability.
    /// Returns `Ok(false)` if notifications were not enabled.
    pub fn disable(&self) -> Result<bool> {
        let mut state = self.state.lock();
        if *state != BridgeState::Enabled {
            return Ok(false);
        }

        // Events must be off before the capability goes away. Until both
        // steps succeed the bridge stays Enabled so a retry redoes them.
        for kind in EventKind::ALL {
            self.host.set_event_notification_mode(false, kind.jvmti_event())?;
        }
        CapabilityNegotiator::new(&self.host).relinquish(CapabilitySet::monitor_events())?;
        *state = BridgeState::Disabled;
        info!("monitor contention events disabled");
        Ok(true)
    }

    pub fn forward(&self, jni: *mut JNIEnv, event: MonitorEvent) {
        self.forwarder.forward(jni, event);
    }

    /// Turns notifications off, unbinds the target and closes the queue.
    /// The bridge ends Unbound; a closed queue stays closed. The target's
    /// references are leaked rather than released through a dying VM.
    pub fn shutdown(&self) {
        if let Err(e) = self.disable() {
            warn!("shutdown: disabling notifications failed: {}", e);
        }
        let mut state = self.state.lock();
        self.forwarder.forget();
        self.forwarder.close();
        *state = BridgeState::Unbound;
        info!("monitor bridge shut down");
    }

    /// Waits for the queue worker to exit after [`shutdown`](Self::shutdown).
    pub fn join_worker(&self) {
        self.forwarder.join();
    }
}
