//! Agent entry points called by the JVM.
//!
//! ```bash
//! java -agentpath:./libmonitor_contention_agent.so=delivery=queued,capacity=4096 MyApp
//! ```

#![allow(non_snake_case)]

use std::borrow::Cow;
use std::ffi::{c_char, c_void, CStr};
use std::sync::Arc;

use log::{error, info};

use crate::bridge::MonitorBridge;
use crate::config::{AgentOptions, Delivery, DEFAULT_LOG_FILTER};
use crate::env::Jvmti;
use crate::error::{AgentError, Result};
use crate::forwarder::Forwarder;
use crate::logging::init_logging;
use crate::registry::{self, AgentBridge};
use crate::sys::jni;
use crate::vm::JavaVm;

/// Wires the bridge into a running or starting VM: JVMTI handle, callback
/// table, forwarder per `options`. No capability is requested here.
pub fn start(vm: *mut jni::JavaVM, options: &AgentOptions) -> Result<&'static AgentBridge> {
    if registry::is_installed() {
        return Err(AgentError::AlreadyInitialized);
    }
    let jvmti = Jvmti::new(vm).map_err(|code| AgentError::Jni { op: "GetEnv(JVMTI)", code })?;
    registry::register_callbacks(&jvmti)?;

    let forwarder = match options.delivery {
        Delivery::Synchronous => Forwarder::synchronous(),
        Delivery::Queued { capacity } => {
            // Jvmti::new already rejected a null vm.
            let pinning = unsafe { JavaVm::from_raw(vm) };
            Forwarder::queued(capacity, Arc::new(pinning))
        }
    };
    registry::install(MonitorBridge::new(jvmti, forwarder))
}

unsafe fn boot(vm: *mut jni::JavaVM, options: *mut c_char, entry: &str) -> jni::jint {
    let raw: Cow<'_, str> = if options.is_null() {
        Cow::Borrowed("")
    } else {
        CStr::from_ptr(options).to_string_lossy()
    };

    let options = match AgentOptions::parse(&raw) {
        Ok(options) => options,
        Err(e) => {
            init_logging(DEFAULT_LOG_FILTER);
            error!("{}: bad agent options `{}`: {}", entry, raw, e);
            return jni::JNI_ERR;
        }
    };
    init_logging(&options.log_filter);

    match start(vm, &options) {
        Ok(_) => {
            info!("{}: monitor contention agent loaded ({:?})", entry, options.delivery);
            jni::JNI_OK
        }
        Err(e) => {
            error!("{}: {}", entry, e);
            jni::JNI_ERR
        }
    }
}

#[no_mangle]
pub unsafe extern "system" fn Agent_OnLoad(
    vm: *mut jni::JavaVM,
    options: *mut c_char,
    _reserved: *mut c_void,
) -> jni::jint {
    boot(vm, options, "Agent_OnLoad")
}

#[no_mangle]
pub unsafe extern "system" fn Agent_OnAttach(
    vm: *mut jni::JavaVM,
    options: *mut c_char,
    _reserved: *mut c_void,
) -> jni::jint {
    boot(vm, options, "Agent_OnAttach")
}

#[no_mangle]
pub unsafe extern "system" fn Agent_OnUnload(_vm: *mut jni::JavaVM) {
    // The VM is dead here; the worker is left to exit on its own.
    if let Ok(bridge) = registry::bridge() {
        bridge.shutdown();
    }
}
