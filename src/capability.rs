//! Capability negotiation with the host runtime.
//!
//! The only capability this agent ever touches is
//! `can_generate_monitor_events`. Everything goes through
//! [`InstrumentationHost`] so the negotiation and toggle logic can run
//! against a recording host in tests.

use std::fmt;

use log::debug;

use crate::error::{AgentError, Result};
use crate::sys::jvmti::{jvmtiCapabilities, jvmtiEvent};

/// A set of JVMTI capabilities.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(jvmtiCapabilities);

impl CapabilitySet {
    pub fn empty() -> Self {
        CapabilitySet::default()
    }

    /// The set holding only `can_generate_monitor_events`.
    pub fn monitor_events() -> Self {
        let mut caps = jvmtiCapabilities::default();
        caps.set_can_generate_monitor_events(true);
        CapabilitySet(caps)
    }

    pub fn from_raw(caps: jvmtiCapabilities) -> Self {
        CapabilitySet(caps)
    }

    pub fn as_raw(&self) -> &jvmtiCapabilities {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.bits() == [0; 4]
    }

    /// `true` if every capability in `other` is also in `self`.
    pub fn contains(&self, other: CapabilitySet) -> bool {
        self.intersection(other) == other
    }

    pub fn union(&self, other: CapabilitySet) -> Self {
        self.zip_with(other, |a, b| a | b)
    }

    pub fn intersection(&self, other: CapabilitySet) -> Self {
        self.zip_with(other, |a, b| a & b)
    }

    /// Capabilities in `self` that are not in `other`.
    pub fn difference(&self, other: CapabilitySet) -> Self {
        self.zip_with(other, |a, b| a & !b)
    }

    fn zip_with(&self, other: CapabilitySet, op: impl Fn(u32, u32) -> u32) -> Self {
        let (a, b) = (self.0.bits(), other.0.bits());
        let mut out = [0u32; 4];
        for i in 0..4 {
            out[i] = op(a[i], b[i]);
        }
        CapabilitySet(jvmtiCapabilities::from_bits(out))
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0.bits();
        write!(f, "CapabilitySet({:08x}_{:08x}_{:08x}_{:08x})", b[3], b[2], b[1], b[0])
    }
}

/// The slice of the JVMTI environment the bridge depends on.
pub trait InstrumentationHost: Send + Sync {
    fn capabilities(&self) -> Result<CapabilitySet>;
    fn potential_capabilities(&self) -> Result<CapabilitySet>;
    fn add_capabilities(&self, caps: CapabilitySet) -> Result<()>;
    fn relinquish_capabilities(&self, caps: CapabilitySet) -> Result<()>;
    /// Globally enables or disables delivery of one event type.
    fn set_event_notification_mode(&self, enable: bool, event: jvmtiEvent) -> Result<()>;
}

/// Read-modify-write of the granted capability set.
///
/// Not synchronized itself; callers serialize lifecycle operations.
pub struct CapabilityNegotiator<'h, H: InstrumentationHost + ?Sized> {
    host: &'h H,
}

impl<'h, H: InstrumentationHost + ?Sized> CapabilityNegotiator<'h, H> {
    pub fn new(host: &'h H) -> Self {
        CapabilityNegotiator { host }
    }

    pub fn query(&self) -> Result<CapabilitySet> {
        self.host.capabilities()
    }

    pub fn potential(&self) -> Result<CapabilitySet> {
        self.host.potential_capabilities()
    }

    /// Requests `wanted`. Returns `Ok(false)` without calling the runtime
    /// when everything in `wanted` is already granted.
    pub fn add(&self, wanted: CapabilitySet) -> Result<bool> {
        let granted = self.query()?;
        let missing = wanted.difference(granted);
        if missing.is_empty() {
            debug!("capabilities {:?} already granted", wanted);
            return Ok(false);
        }

        if !self.potential()?.contains(missing) {
            return Err(AgentError::CapabilityUnavailable);
        }
        self.host.add_capabilities(missing)?;
        debug!("added capabilities {:?}", missing);
        Ok(true)
    }

    /// Releases whatever part of `held` is currently granted. Returns
    /// `Ok(false)` without calling the runtime when none of it is.
    pub fn relinquish(&self, held: CapabilitySet) -> Result<bool> {
        let granted = self.query()?;
        let releasing = held.intersection(granted);
        if releasing.is_empty() {
            return Ok(false);
        }
        self.host.relinquish_capabilities(releasing)?;
        debug!("relinquished capabilities {:?}", releasing);
        Ok(true)
    }
}
