//! Handle to the running JavaVM.
//!
//! The agent never creates a VM; it receives one in `Agent_OnLoad` or looks
//! it up through `GetJavaVM`. This wrapper only resolves per-thread JNI
//! environments and attaches or detaches native threads.

use std::ffi::CString;
use std::ptr;

use crate::env::JniEnv;
use crate::forwarder::MonitorEvent;
use crate::queue::{RefPinning, WORKER_THREAD_NAME};
use crate::sys::jni;

#[derive(Copy, Clone, Debug)]
pub struct JavaVm {
    vm: *mut jni::JavaVM,
}

// A JavaVM pointer is process-wide and valid on every thread.
unsafe impl Send for JavaVm {}
unsafe impl Sync for JavaVm {}

impl JavaVm {
    /// # Safety
    /// `vm` must be the live `JavaVM*` of this process.
    pub unsafe fn from_raw(vm: *mut jni::JavaVM) -> Self {
        JavaVm { vm }
    }

    /// Return the raw `JavaVM*` pointer.
    pub fn raw(&self) -> *mut jni::JavaVM {
        self.vm
    }

    /// The JNI environment of the current thread, if it is attached.
    pub fn current_env(&self) -> Result<JniEnv, jni::jint> {
        let mut env_ptr: *mut std::os::raw::c_void = ptr::null_mut();
        let res = unsafe { crate::jvm_call!(self.vm, GetEnv, &mut env_ptr, jni::JNI_VERSION_1_6) };
        if res != jni::JNI_OK || env_ptr.is_null() {
            return Err(res);
        }
        Ok(unsafe { JniEnv::from_raw(env_ptr as *mut jni::JNIEnv) })
    }

    /// Attach the current thread as a daemon so it never holds up VM exit.
    pub fn attach_current_thread_as_daemon(&self, name: &str) -> Result<JniEnv, jni::jint> {
        let c_name = CString::new(name).map_err(|_| jni::JNI_EINVAL)?;
        let mut args = jni::JavaVMAttachArgs {
            version: jni::JNI_VERSION_1_6,
            name: c_name.as_ptr() as *mut _,
            group: ptr::null_mut(),
        };
        let mut env_ptr: *mut std::os::raw::c_void = ptr::null_mut();
        let res = unsafe {
            crate::jvm_call!(
                self.vm,
                AttachCurrentThreadAsDaemon,
                &mut env_ptr,
                &mut args as *mut jni::JavaVMAttachArgs as *mut std::os::raw::c_void
            )
        };
        if res != jni::JNI_OK || env_ptr.is_null() {
            return Err(res);
        }
        Ok(unsafe { JniEnv::from_raw(env_ptr as *mut jni::JNIEnv) })
    }

    /// Detach the current thread from the JVM.
    pub fn detach_current_thread(&self) -> Result<(), jni::jint> {
        let res = unsafe { crate::jvm_call!(self.vm, DetachCurrentThread) };
        if res != jni::JNI_OK {
            return Err(res);
        }
        Ok(())
    }
}

impl RefPinning for JavaVm {
    fn pin(&self, jni: *mut jni::JNIEnv, event: &MonitorEvent) -> Option<MonitorEvent> {
        let env = unsafe { JniEnv::from_raw(jni) };
        let thread = env.new_global_ref(event.thread);
        let object = env.new_global_ref(event.object);
        if thread.is_null() || object.is_null() {
            for r in [thread, object] {
                if !r.is_null() {
                    env.delete_global_ref(r);
                }
            }
            return None;
        }
        Some(MonitorEvent::new(event.kind, thread, object))
    }

    fn unpin(&self, jni: *mut jni::JNIEnv, event: &MonitorEvent) {
        let env = unsafe { JniEnv::from_raw(jni) };
        env.delete_global_ref(event.thread);
        env.delete_global_ref(event.object);
    }

    fn same_pair(&self, jni: *mut jni::JNIEnv, a: &MonitorEvent, b: &MonitorEvent) -> bool {
        let env = unsafe { JniEnv::from_raw(jni) };
        env.is_same_object(a.thread, b.thread) && env.is_same_object(a.object, b.object)
    }

    fn attach_worker(&self) -> Result<*mut jni::JNIEnv, jni::jint> {
        self.attach_current_thread_as_daemon(WORKER_THREAD_NAME).map(|env| env.raw())
    }

    fn detach_worker(&self) {
        if let Err(code) = self.detach_current_thread() {
            log::warn!("{} failed to detach: JNI code {}", WORKER_THREAD_NAME, code);
        }
    }
}
