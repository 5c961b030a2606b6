//! Process-wide bridge and the raw JVMTI callback table.
//!
//! JVMTI callbacks are plain C functions with no user-data pointer, so the
//! trampolines below find the bridge through a `OnceLock` installed at load.

use std::sync::OnceLock;

use log::debug;

use crate::bridge::MonitorBridge;
use crate::env::Jvmti;
use crate::error::{AgentError, Result};
use crate::forwarder::{EventKind, MonitorEvent};
use crate::sys::jni;
use crate::sys::jvmti;

pub type AgentBridge = MonitorBridge<Jvmti>;

static BRIDGE: OnceLock<AgentBridge> = OnceLock::new();

/// The installed bridge, or `NotInitialized` if the agent was not loaded.
pub fn bridge() -> Result<&'static AgentBridge> {
    BRIDGE.get().ok_or(AgentError::NotInitialized)
}

pub fn is_installed() -> bool {
    BRIDGE.get().is_some()
}

/// Installs the bridge. Runs once per process; later calls fail.
pub fn install(bridge: AgentBridge) -> Result<&'static AgentBridge> {
    BRIDGE.set(bridge).map_err(|_| AgentError::AlreadyInitialized)?;
    self::bridge()
}

/// Callback table with only the two contention handlers set.
pub fn monitor_callbacks() -> jvmti::jvmtiEventCallbacks {
    jvmti::jvmtiEventCallbacks {
        MonitorContendedEnter: Some(on_contended_enter),
        MonitorContendedEntered: Some(on_contended_entered),
        ..Default::default()
    }
}

pub fn register_callbacks(jvmti: &Jvmti) -> Result<()> {
    jvmti
        .set_event_callbacks(monitor_callbacks())
        .map_err(AgentError::jvmti("SetEventCallbacks"))?;
    debug!("contention callbacks registered");
    Ok(())
}

fn dispatch(jni_env: *mut jni::JNIEnv, event: MonitorEvent) {
    if let Some(bridge) = BRIDGE.get() {
        bridge.forward(jni_env, event);
    }
}

unsafe extern "system" fn on_contended_enter(
    _jvmti_env: *mut jvmti::jvmtiEnv,
    jni_env: *mut jni::JNIEnv,
    thread: jni::jthread,
    object: jni::jobject,
) {
    dispatch(jni_env, MonitorEvent::new(EventKind::Wait, thread, object));
}

unsafe extern "system" fn on_contended_entered(
    _jvmti_env: *mut jvmti::jvmtiEnv,
    jni_env: *mut jni::JNIEnv,
    thread: jni::jthread,
    object: jni::jobject,
) {
    dispatch(jni_env, MonitorEvent::new(EventKind::Entered, thread, object));
}
