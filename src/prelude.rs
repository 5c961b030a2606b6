//! Common imports for embedding or testing the bridge.

pub use crate::bridge::{BridgeState, MonitorBridge};
pub use crate::capability::{CapabilityNegotiator, CapabilitySet, InstrumentationHost};
pub use crate::config::{AgentOptions, Delivery};
pub use crate::env::{GlobalRef, JavaVm, JniEnv, Jvmti};
pub use crate::error::{AgentError, Result};
pub use crate::forwarder::{BridgeStats, ContentionListener, EventKind, Forwarder, MonitorEvent};
pub use crate::queue::RefPinning;
pub use crate::sys::{jni, jvmti};
