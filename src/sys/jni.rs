// monitor-contention-agent/src/sys/jni.rs
//
// JNI (Java Native Interface) bindings for the calls this agent makes.
//
// The function table keeps every slot at its jni.h index so the layout
// matches the JDK header (JDK 8 through 24). Slots the agent never calls
// are typed as opaque pointers and grouped into padding arrays named after
// the indices they cover.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use std::ffi::c_void;
use std::os::raw::c_char;

// =============================================================================
// Primitive Types
// =============================================================================

pub type jint = i32;
pub type jlong = i64;
pub type jbyte = i8;
pub type jboolean = u8;
pub type jchar = u16;
pub type jshort = i16;
pub type jfloat = f32;
pub type jdouble = f64;
pub type jsize = jint;

// =============================================================================
// Reference Types (opaque pointers)
// =============================================================================

pub type jobject = *mut c_void;
pub type jclass = jobject;
pub type jstring = jobject;
pub type jthread = jobject;
pub type jthrowable = jobject;

pub type jmethodID = *mut c_void;

// =============================================================================
// jvalue Union
// =============================================================================

#[repr(C)]
#[derive(Copy, Clone)]
pub union jvalue {
    pub z: jboolean,
    pub b: jbyte,
    pub c: jchar,
    pub s: jshort,
    pub i: jint,
    pub j: jlong,
    pub f: jfloat,
    pub d: jdouble,
    pub l: jobject,
}

// =============================================================================
// Constants
// =============================================================================

pub const JNI_OK: jint = 0;
pub const JNI_ERR: jint = -1;
pub const JNI_EDETACHED: jint = -2;
pub const JNI_EVERSION: jint = -3;
pub const JNI_ENOMEM: jint = -4;
pub const JNI_EEXIST: jint = -5;
pub const JNI_EINVAL: jint = -6;

pub const JNI_TRUE: jboolean = 1;
pub const JNI_FALSE: jboolean = 0;

pub const JNI_VERSION_1_6: jint = 0x00010006;
pub const JNI_VERSION_1_8: jint = 0x00010008;

// =============================================================================
// JNINativeInterface_ - The JNI function table (vtable)
// =============================================================================
//
// JNIEnv is a pointer to a pointer to this struct. 236 slots total.

#[repr(C)]
pub struct JNINativeInterface_ {
    // 0-3: Reserved
    pub reserved: [*mut c_void; 4],

    // 4-5: GetVersion, DefineClass
    pub _slots_4_5: [*mut c_void; 2],

    // 6: FindClass
    pub FindClass: unsafe extern "system" fn(env: *mut JNIEnv, name: *const c_char) -> jclass,

    // 7-13: Reflection, class hierarchy, Throw
    pub _slots_7_13: [*mut c_void; 7],

    // 14: ThrowNew
    pub ThrowNew:
        unsafe extern "system" fn(env: *mut JNIEnv, clazz: jclass, msg: *const c_char) -> jint,

    // 15: ExceptionOccurred
    pub _slot_15: [*mut c_void; 1],

    // 16-17: ExceptionDescribe, ExceptionClear
    pub ExceptionDescribe: unsafe extern "system" fn(env: *mut JNIEnv),
    pub ExceptionClear: unsafe extern "system" fn(env: *mut JNIEnv),

    // 18-20: FatalError, PushLocalFrame, PopLocalFrame
    pub _slots_18_20: [*mut c_void; 3],

    // 21-23: References
    pub NewGlobalRef: unsafe extern "system" fn(env: *mut JNIEnv, lobj: jobject) -> jobject,
    pub DeleteGlobalRef: unsafe extern "system" fn(env: *mut JNIEnv, gref: jobject),
    pub DeleteLocalRef: unsafe extern "system" fn(env: *mut JNIEnv, obj: jobject),

    // 24: IsSameObject
    pub IsSameObject: unsafe extern "system" fn(env: *mut JNIEnv, obj1: jobject, obj2: jobject) -> jboolean,

    // 25-112: NewLocalRef through Set<Type>Field
    pub _slots_25_112: [*mut c_void; 88],

    // 113: GetStaticMethodID
    pub GetStaticMethodID: unsafe extern "system" fn(
        env: *mut JNIEnv,
        clazz: jclass,
        name: *const c_char,
        sig: *const c_char,
    ) -> jmethodID,

    // 114-142: CallStatic<Type>Method variants up to CallStaticVoidMethodV
    pub _slots_114_142: [*mut c_void; 29],

    // 143: CallStaticVoidMethodA
    pub CallStaticVoidMethodA: unsafe extern "system" fn(
        env: *mut JNIEnv,
        cls: jclass,
        methodID: jmethodID,
        args: *const jvalue,
    ),

    // 144-168: Static fields, NewString, GetStringUTFLength
    pub _slots_144_168: [*mut c_void; 25],

    // 169-170: UTF string access
    pub GetStringUTFChars: unsafe extern "system" fn(
        env: *mut JNIEnv,
        str: jstring,
        isCopy: *mut jboolean,
    ) -> *const c_char,
    pub ReleaseStringUTFChars:
        unsafe extern "system" fn(env: *mut JNIEnv, str: jstring, chars: *const c_char),

    // 171-218: Arrays, natives registration, MonitorEnter/Exit
    pub _slots_171_218: [*mut c_void; 48],

    // 219: GetJavaVM
    pub GetJavaVM: unsafe extern "system" fn(env: *mut JNIEnv, vm: *mut *mut JavaVM) -> jint,

    // 220-227: String regions, critical access, weak globals
    pub _slots_220_227: [*mut c_void; 8],

    // 228: ExceptionCheck
    pub ExceptionCheck: unsafe extern "system" fn(env: *mut JNIEnv) -> jboolean,

    // 229-235: Direct buffers, GetObjectRefType, GetModule, IsVirtualThread,
    // GetStringUTFLengthAsLong
    pub _slots_229_235: [*mut c_void; 7],
}

/// JNIEnv is directly the vtable pointer (C ABI definition)
pub type JNIEnv = *const JNINativeInterface_;

// =============================================================================
// JNIInvokeInterface_ - The JavaVM function table
// =============================================================================

#[repr(C)]
pub struct JNIInvokeInterface_ {
    pub reserved0: *mut c_void,
    pub reserved1: *mut c_void,
    pub reserved2: *mut c_void,

    pub DestroyJavaVM: unsafe extern "system" fn(vm: *mut JavaVM) -> jint,
    pub AttachCurrentThread:
        unsafe extern "system" fn(vm: *mut JavaVM, penv: *mut *mut c_void, args: *mut c_void) -> jint,
    pub DetachCurrentThread: unsafe extern "system" fn(vm: *mut JavaVM) -> jint,
    pub GetEnv:
        unsafe extern "system" fn(vm: *mut JavaVM, penv: *mut *mut c_void, version: jint) -> jint,
    pub AttachCurrentThreadAsDaemon:
        unsafe extern "system" fn(vm: *mut JavaVM, penv: *mut *mut c_void, args: *mut c_void) -> jint,
}

/// JavaVM is directly the vtable pointer (C ABI definition)
pub type JavaVM = *const JNIInvokeInterface_;

#[repr(C)]
pub struct JavaVMAttachArgs {
    pub version: jint,
    pub name: *mut c_char,
    pub group: jobject,
}

// =============================================================================
// Helper macros
// =============================================================================

/// Calls a JavaVM function through the vtable.
/// vm_ptr: *mut JavaVM = *mut *const JNIInvokeInterface_
#[macro_export]
macro_rules! jvm_call {
    ($vm:expr, $func:ident $(, $args:expr)*) => {{
        let vm_ptr = $vm;
        ((**vm_ptr).$func)(vm_ptr $(, $args)*)
    }};
}
