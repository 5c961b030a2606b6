//! Resolution of the managed callback methods.

use log::warn;

use crate::env::{GlobalRef, JniEnv};
use crate::error::{AgentError, Result};
use crate::forwarder::{ContentionListener, EventKind, MonitorEvent};
use crate::sys::jni;

/// `static void m(Thread, Object)`
pub const CALLBACK_SIGNATURE: &str = "(Ljava/lang/Thread;Ljava/lang/Object;)V";

/// A managed class with both callback methods resolved.
///
/// Only built fully resolved, so a bridge never holds half a target.
pub struct ManagedTarget {
    class: GlobalRef,
    on_wait: jni::jmethodID,
    on_entered: jni::jmethodID,
}

// Method IDs stay valid on all threads while the class is loaded, and the
// global ref keeps it loaded.
unsafe impl Send for ManagedTarget {}
unsafe impl Sync for ManagedTarget {}

impl ManagedTarget {
    /// Looks up `onMonitorWait` and `onMonitorEntered` on `class`.
    ///
    /// A missing method clears the pending `NoSuchMethodError` and returns
    /// [`AgentError::MethodNotFound`].
    pub fn resolve(env: &JniEnv, class: jni::jclass) -> Result<Self> {
        if class.is_null() {
            return Err(AgentError::NullReference);
        }
        let on_wait = lookup(env, class, EventKind::Wait)?;
        let on_entered = lookup(env, class, EventKind::Entered)?;
        let class = GlobalRef::new(env, class)?.ok_or(AgentError::Jni {
            op: "NewGlobalRef",
            code: jni::JNI_ENOMEM,
        })?;
        Ok(ManagedTarget { class, on_wait, on_entered })
    }

    pub fn class(&self) -> jni::jclass {
        self.class.get()
    }

    pub fn method_id(&self, kind: EventKind) -> jni::jmethodID {
        match kind {
            EventKind::Wait => self.on_wait,
            EventKind::Entered => self.on_entered,
        }
    }
}

fn lookup(env: &JniEnv, class: jni::jclass, kind: EventKind) -> Result<jni::jmethodID> {
    let name = kind.method_name();
    env.get_static_method_id(class, name, CALLBACK_SIGNATURE).ok_or_else(|| {
        if env.exception_check() {
            env.exception_clear();
        }
        AgentError::MethodNotFound {
            name,
            signature: CALLBACK_SIGNATURE,
        }
    })
}

impl ContentionListener for ManagedTarget {
    fn on_event(&self, jni: *mut jni::JNIEnv, event: &MonitorEvent) {
        let env = unsafe { JniEnv::from_raw(jni) };
        let args = [jni::jvalue { l: event.thread }, jni::jvalue { l: event.object }];
        env.call_static_void_method(self.class.get(), self.method_id(event.kind), &args);

        // Never let a callback exception escape into the contending thread.
        if env.exception_check() {
            warn!("{} threw; describing and clearing", event.kind.method_name());
            env.exception_describe();
            env.exception_clear();
        }
    }
}
