//! Safe wrapper around the JNI environment.
//!
//! Covers what the agent needs on the managed side of the bridge: resolving
//! static methods, upcalls, exception hygiene, reference management and
//! string access.
//!
//! # Example
//!
//! ```rust,ignore
//! use monitor_contention_agent::jni_wrapper::JniEnv;
//!
//! fn describe(jni: *mut jni::JNIEnv, text: jni::jstring) {
//!     let env = unsafe { JniEnv::from_raw(jni) };
//!
//!     if let Some(s) = env.get_string_utf(text) {
//!         println!("{s}");
//!     }
//!
//!     if env.exception_check() {
//!         env.exception_describe();
//!         env.exception_clear();
//!     }
//! }
//! ```

use crate::error::{AgentError, Result};
use crate::sys::jni;
use crate::vm::JavaVm;
use std::ffi::{CStr, CString};
use std::ptr;

/// Safe wrapper around a JNI environment pointer.
///
/// # Thread Safety
///
/// A `JniEnv` is tied to a specific thread and cannot be sent across threads.
/// Each JVM thread has its own JNI environment.
pub struct JniEnv {
    env: *mut jni::JNIEnv,
}

impl JniEnv {
    /// Creates a JniEnv wrapper from a raw pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure the pointer is valid and comes from the current thread.
    pub unsafe fn from_raw(env: *mut jni::JNIEnv) -> Self {
        JniEnv { env }
    }

    /// Returns the raw JNI environment pointer.
    pub fn raw(&self) -> *mut jni::JNIEnv {
        self.env
    }

    // =========================================================================
    // Classes and methods
    // =========================================================================

    /// Finds a class by its fully qualified name ("java/lang/String").
    pub fn find_class(&self, name: &str) -> Option<jni::jclass> {
        let c_name = CString::new(name).ok()?;
        unsafe {
            let vtable = *self.env;
            let cls = ((*vtable).FindClass)(self.env, c_name.as_ptr());
            if cls.is_null() { None } else { Some(cls) }
        }
    }

    /// Resolves a static method. A failed lookup leaves `NoSuchMethodError`
    /// pending; the caller decides whether to clear it.
    pub fn get_static_method_id(&self, cls: jni::jclass, name: &str, sig: &str) -> Option<jni::jmethodID> {
        let c_name = CString::new(name).ok()?;
        let c_sig = CString::new(sig).ok()?;
        unsafe {
            let vtable = *self.env;
            let mid = ((*vtable).GetStaticMethodID)(self.env, cls, c_name.as_ptr(), c_sig.as_ptr());
            if mid.is_null() { None } else { Some(mid) }
        }
    }

    /// Calls a static void method with the given arguments.
    pub fn call_static_void_method(&self, cls: jni::jclass, method: jni::jmethodID, args: &[jni::jvalue]) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).CallStaticVoidMethodA)(self.env, cls, method, args.as_ptr());
        }
    }

    // =========================================================================
    // Exceptions
    // =========================================================================

    /// Throws a new exception of the named class.
    pub fn throw_new(&self, class_name: &str, msg: &str) -> Result<()> {
        let cls = self.find_class(class_name).ok_or(AgentError::Jni {
            op: "FindClass",
            code: jni::JNI_ERR,
        })?;
        // Interior NULs would truncate the message; replace them.
        let c_msg = CString::new(msg.replace('\0', "?")).unwrap_or_default();
        let res = unsafe {
            let vtable = *self.env;
            ((*vtable).ThrowNew)(self.env, cls, c_msg.as_ptr())
        };
        self.delete_local_ref(cls);
        if res != jni::JNI_OK {
            return Err(AgentError::Jni { op: "ThrowNew", code: res });
        }
        Ok(())
    }

    /// Checks if an exception is pending.
    pub fn exception_check(&self) -> bool {
        unsafe {
            let vtable = *self.env;
            ((*vtable).ExceptionCheck)(self.env) != jni::JNI_FALSE
        }
    }

    /// Prints the pending exception and its backtrace to stderr.
    pub fn exception_describe(&self) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).ExceptionDescribe)(self.env);
        }
    }

    /// Clears any pending exception.
    pub fn exception_clear(&self) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).ExceptionClear)(self.env);
        }
    }

    // =========================================================================
    // References
    // =========================================================================

    pub fn new_global_ref(&self, obj: jni::jobject) -> jni::jobject {
        unsafe {
            let vtable = *self.env;
            ((*vtable).NewGlobalRef)(self.env, obj)
        }
    }

    pub fn delete_global_ref(&self, obj: jni::jobject) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).DeleteGlobalRef)(self.env, obj);
        }
    }

    /// Whether two references, local or global, denote the same object.
    pub fn is_same_object(&self, a: jni::jobject, b: jni::jobject) -> bool {
        unsafe {
            let vtable = *self.env;
            ((*vtable).IsSameObject)(self.env, a, b) == jni::JNI_TRUE
        }
    }

    pub fn delete_local_ref(&self, obj: jni::jobject) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).DeleteLocalRef)(self.env, obj);
        }
    }

    // =========================================================================
    // Strings
    // =========================================================================

    /// Copies a Java string out as Rust `String`. Modified UTF-8 that is not
    /// valid UTF-8 (supplementary characters, embedded NUL) is converted lossily.
    pub fn get_string_utf(&self, s: jni::jstring) -> Option<String> {
        if s.is_null() {
            return None;
        }
        unsafe {
            let vtable = *self.env;
            let chars = ((*vtable).GetStringUTFChars)(self.env, s, ptr::null_mut());
            if chars.is_null() {
                return None;
            }
            let out = CStr::from_ptr(chars).to_string_lossy().into_owned();
            ((*vtable).ReleaseStringUTFChars)(self.env, s, chars);
            Some(out)
        }
    }

    // =========================================================================
    // VM
    // =========================================================================

    pub fn get_java_vm(&self) -> Result<JavaVm> {
        let mut vm: *mut jni::JavaVM = ptr::null_mut();
        let res = unsafe {
            let vtable = *self.env;
            ((*vtable).GetJavaVM)(self.env, &mut vm)
        };
        if res != jni::JNI_OK || vm.is_null() {
            return Err(AgentError::Jni { op: "GetJavaVM", code: res });
        }
        Ok(unsafe { JavaVm::from_raw(vm) })
    }
}

/// RAII guard for a JNI global reference.
///
/// Global references outlive the thread that created them, so the guard
/// keeps the VM rather than a `JNIEnv` and releases through whichever
/// attached thread drops it.
pub struct GlobalRef {
    vm: JavaVm,
    obj: jni::jobject,
}

// Global references are valid on any thread.
unsafe impl Send for GlobalRef {}
unsafe impl Sync for GlobalRef {}

impl GlobalRef {
    /// Promotes `obj` to a global reference. Returns `None` for null or
    /// when the VM is out of memory.
    pub fn new(env: &JniEnv, obj: jni::jobject) -> Result<Option<GlobalRef>> {
        if obj.is_null() {
            return Ok(None);
        }
        let vm = env.get_java_vm()?;
        let global = env.new_global_ref(obj);
        if global.is_null() {
            return Ok(None);
        }
        Ok(Some(GlobalRef { vm, obj: global }))
    }

    pub fn get(&self) -> jni::jobject {
        self.obj
    }
}

impl Drop for GlobalRef {
    fn drop(&mut self) {
        match self.vm.current_env() {
            Ok(env) => env.delete_global_ref(self.obj),
            // Dropped on a detached thread or after VM death; nothing to release into.
            Err(code) => log::debug!("leaking global ref {:p}: GetEnv returned {}", self.obj, code),
        }
    }
}
