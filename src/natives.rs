//! JNI exports for `org.aim.mainagent.CEventAgentAdapter`.
//!
//! ```java
//! static native void init();
//! static native void activateMonitorEvents();
//! static native void deactivateMonitorEvents();
//! static native void printlnNonBlocking(String text);
//! ```
//!
//! `init` binds the calling class itself as the callback target. Failures
//! surface as `java.lang.IllegalStateException`.

#![allow(non_snake_case)]

use std::io::Write;

use log::{debug, error, warn};

use crate::binder::ManagedTarget;
use crate::env::JniEnv;
use crate::error::Result;
use crate::registry;
use crate::sys::jni;

const ILLEGAL_STATE: &str = "java/lang/IllegalStateException";

fn throw_on_error(env: &JniEnv, op: &str, result: Result<()>) {
    let Err(e) = result else { return };
    warn!("{} failed: {}", op, e);
    // A pending exception (e.g. from the JVM itself) takes precedence.
    if env.exception_check() {
        return;
    }
    if let Err(te) = env.throw_new(ILLEGAL_STATE, &format!("{}: {}", op, e)) {
        error!("could not throw IllegalStateException: {}", te);
    }
}

#[no_mangle]
pub unsafe extern "system" fn Java_org_aim_mainagent_CEventAgentAdapter_init(
    env: *mut jni::JNIEnv,
    class: jni::jclass,
) {
    let jni = JniEnv::from_raw(env);
    let result = registry::bridge().and_then(|bridge| {
        let target = ManagedTarget::resolve(&jni, class)?;
        bridge.bind(Box::new(target));
        Ok(())
    });
    throw_on_error(&jni, "init", result);
}

#[no_mangle]
pub unsafe extern "system" fn Java_org_aim_mainagent_CEventAgentAdapter_activateMonitorEvents(
    env: *mut jni::JNIEnv,
    _class: jni::jclass,
) {
    let jni = JniEnv::from_raw(env);
    let result = registry::bridge().and_then(|bridge| bridge.enable()).map(|changed| {
        if !changed {
            debug!("monitor events already enabled");
        }
    });
    throw_on_error(&jni, "activateMonitorEvents", result);
}

#[no_mangle]
pub unsafe extern "system" fn Java_org_aim_mainagent_CEventAgentAdapter_deactivateMonitorEvents(
    env: *mut jni::JNIEnv,
    _class: jni::jclass,
) {
    let jni = JniEnv::from_raw(env);
    let result = registry::bridge().and_then(|bridge| bridge.disable()).map(|changed| {
        if !changed {
            debug!("monitor events were not enabled");
        }
    });
    throw_on_error(&jni, "deactivateMonitorEvents", result);
}

/// Prints without going through `System.out`, whose monitor may be the
/// very one under contention.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aim_mainagent_CEventAgentAdapter_printlnNonBlocking(
    env: *mut jni::JNIEnv,
    _class: jni::jclass,
    text: jni::jstring,
) {
    let jni = JniEnv::from_raw(env);
    if let Some(line) = jni.get_string_utf(text) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }
}
