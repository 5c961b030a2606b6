// monitor-contention-agent/src/jvmti_wrapper.rs
use crate::capability::{CapabilitySet, InstrumentationHost};
use crate::error::{AgentError, Result};
use crate::sys::jni;
use crate::sys::jvmti::{self, jvmtiError};
use std::ptr;

/// Fetches a function pointer from the JVMTI table, or returns
/// `NOT_AVAILABLE` from the enclosing function if the slot is empty.
macro_rules! jvmti_fn {
    ($env:expr, $name:ident) => {
        match (*(*$env).functions).$name {
            Some(f) => f,
            None => return Err(jvmtiError::NOT_AVAILABLE),
        }
    };
}

fn check(err: jvmtiError) -> std::result::Result<(), jvmtiError> {
    if err.is_ok() {
        Ok(())
    } else {
        Err(err)
    }
}

/// A safe wrapper around the raw JVMTI Environment pointer.
pub struct Jvmti {
    env: *mut jvmti::jvmtiEnv,
}

// The JVMTI environment pointer is valid on every thread; the functions
// this wrapper calls are all documented as callable from any thread.
unsafe impl Send for Jvmti {}
unsafe impl Sync for Jvmti {}

impl Jvmti {
    /// Connects to the JVM and retrieves the JVMTI environment.
    pub fn new(vm: *mut jni::JavaVM) -> std::result::Result<Self, jni::jint> {
        if vm.is_null() {
            return Err(jni::JNI_EINVAL);
        }
        let mut env_ptr: *mut std::ffi::c_void = ptr::null_mut();

        unsafe {
            // vm: *mut JavaVM = *mut *const JNIInvokeInterface_
            let get_env_fn = (**vm).GetEnv;
            let res = get_env_fn(vm, &mut env_ptr, jvmti::JVMTI_VERSION_1_2);

            if res != jni::JNI_OK {
                return Err(res);
            }
        }

        if env_ptr.is_null() {
            return Err(jni::JNI_ERR);
        }
        Ok(Jvmti {
            env: env_ptr as *mut jvmti::jvmtiEnv,
        })
    }

    /// Create a Jvmti wrapper from a raw jvmtiEnv pointer
    ///
    /// # Safety
    /// The caller must ensure the pointer is valid for the duration of use.
    pub unsafe fn from_raw(env: *mut jvmti::jvmtiEnv) -> Self {
        Jvmti { env }
    }

    /// Get the raw jvmtiEnv pointer
    pub fn raw(&self) -> *mut jvmti::jvmtiEnv {
        self.env
    }

    pub fn get_capabilities(&self) -> std::result::Result<jvmti::jvmtiCapabilities, jvmtiError> {
        let mut caps = jvmti::jvmtiCapabilities::default();
        unsafe {
            let f = jvmti_fn!(self.env, GetCapabilities);
            check(f(self.env, &mut caps))?;
        }
        Ok(caps)
    }

    pub fn get_potential_capabilities(&self) -> std::result::Result<jvmti::jvmtiCapabilities, jvmtiError> {
        let mut caps = jvmti::jvmtiCapabilities::default();
        unsafe {
            let f = jvmti_fn!(self.env, GetPotentialCapabilities);
            check(f(self.env, &mut caps))?;
        }
        Ok(caps)
    }

    pub fn add_capabilities(&self, caps: &jvmti::jvmtiCapabilities) -> std::result::Result<(), jvmtiError> {
        unsafe {
            let f = jvmti_fn!(self.env, AddCapabilities);
            check(f(self.env, caps))
        }
    }

    pub fn relinquish_capabilities(&self, caps: &jvmti::jvmtiCapabilities) -> std::result::Result<(), jvmtiError> {
        unsafe {
            let f = jvmti_fn!(self.env, RelinquishCapabilities);
            check(f(self.env, caps))
        }
    }

    pub fn set_event_callbacks(&self, callbacks: jvmti::jvmtiEventCallbacks) -> std::result::Result<(), jvmtiError> {
        let size = std::mem::size_of::<jvmti::jvmtiEventCallbacks>() as jni::jint;
        unsafe {
            let f = jvmti_fn!(self.env, SetEventCallbacks);
            check(f(self.env, &callbacks, size))
        }
    }

    /// Enables or disables one event type, globally when `thread` is null.
    pub fn set_event_notification_mode(
        &self,
        enable: bool,
        event_type: jvmti::jvmtiEvent,
        thread: jni::jthread,
    ) -> std::result::Result<(), jvmtiError> {
        let mode = if enable { jvmti::JVMTI_ENABLE } else { jvmti::JVMTI_DISABLE };
        unsafe {
            let f = jvmti_fn!(self.env, SetEventNotificationMode);
            check(f(self.env, mode, event_type, thread))
        }
    }

    pub fn get_phase(&self) -> std::result::Result<jni::jint, jvmtiError> {
        let mut phase: jni::jint = 0;
        unsafe {
            let f = jvmti_fn!(self.env, GetPhase);
            check(f(self.env, &mut phase))?;
        }
        Ok(phase)
    }
}

impl InstrumentationHost for Jvmti {
    fn capabilities(&self) -> Result<CapabilitySet> {
        self.get_capabilities()
            .map(CapabilitySet::from_raw)
            .map_err(AgentError::jvmti("GetCapabilities"))
    }

    fn potential_capabilities(&self) -> Result<CapabilitySet> {
        self.get_potential_capabilities()
            .map(CapabilitySet::from_raw)
            .map_err(AgentError::jvmti("GetPotentialCapabilities"))
    }

    fn add_capabilities(&self, caps: CapabilitySet) -> Result<()> {
        Jvmti::add_capabilities(self, caps.as_raw()).map_err(AgentError::jvmti("AddCapabilities"))
    }

    fn relinquish_capabilities(&self, caps: CapabilitySet) -> Result<()> {
        Jvmti::relinquish_capabilities(self, caps.as_raw())
            .map_err(AgentError::jvmti("RelinquishCapabilities"))
    }

    fn set_event_notification_mode(&self, enable: bool, event: jvmti::jvmtiEvent) -> Result<()> {
        Jvmti::set_event_notification_mode(self, enable, event, ptr::null_mut())
            .map_err(AgentError::jvmti("SetEventNotificationMode"))
    }
}
