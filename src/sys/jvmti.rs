// monitor-contention-agent/src/sys/jvmti.rs
//
// JVMTI (JVM Tool Interface) bindings for the calls this agent makes.
//
// As in jni.rs, the function and callback tables keep their header layout;
// unused slots are opaque padding. Function numbers in comments are the
// 1-based numbers from jvmti.h, so function N sits at struct slot N-1.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use std::fmt;
use std::os::raw::c_void;
use std::ptr;

use crate::sys::jni::{jint, jobject, jthread, JNIEnv};

// --- Constants ---
pub const JVMTI_VERSION_1_2: jint = 0x30010200;

pub type jvmtiEvent = u32;

pub const JVMTI_EVENT_MONITOR_CONTENDED_ENTER: jvmtiEvent = 75;
pub const JVMTI_EVENT_MONITOR_CONTENDED_ENTERED: jvmtiEvent = 76;

// --- Phases ---
pub const JVMTI_PHASE_ONLOAD: jint = 1;
pub const JVMTI_PHASE_PRIMORDIAL: jint = 2;
pub const JVMTI_PHASE_START: jint = 6;
pub const JVMTI_PHASE_LIVE: jint = 4;
pub const JVMTI_PHASE_DEAD: jint = 8;

pub const JVMTI_ENABLE: jint = 1;
pub const JVMTI_DISABLE: jint = 0;

// --- Error Codes ---

/// Raw `jvmtiError` code.
///
/// A transparent newtype rather than an enum: the runtime may hand back
/// codes this crate has no name for, and those must stay representable.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct jvmtiError(pub u32);

impl jvmtiError {
    pub const NONE: Self = Self(0);
    pub const INVALID_THREAD: Self = Self(10);
    pub const INVALID_OBJECT: Self = Self(20);
    pub const INVALID_CLASS: Self = Self(21);
    pub const NOT_AVAILABLE: Self = Self(98);
    pub const MUST_POSSESS_CAPABILITY: Self = Self(99);
    pub const NULL_POINTER: Self = Self(100);
    pub const ABSENT_INFORMATION: Self = Self(101);
    pub const INVALID_EVENT_TYPE: Self = Self(102);
    pub const ILLEGAL_ARGUMENT: Self = Self(103);
    pub const OUT_OF_MEMORY: Self = Self(110);
    pub const ACCESS_DENIED: Self = Self(111);
    pub const WRONG_PHASE: Self = Self(112);
    pub const INTERNAL: Self = Self(113);
    pub const UNATTACHED_THREAD: Self = Self(115);
    pub const INVALID_ENVIRONMENT: Self = Self(116);

    pub fn is_ok(self) -> bool {
        self == Self::NONE
    }

    /// The `JVMTI_ERROR_*` suffix for known codes.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::NONE => "NONE",
            Self::INVALID_THREAD => "INVALID_THREAD",
            Self::INVALID_OBJECT => "INVALID_OBJECT",
            Self::INVALID_CLASS => "INVALID_CLASS",
            Self::NOT_AVAILABLE => "NOT_AVAILABLE",
            Self::MUST_POSSESS_CAPABILITY => "MUST_POSSESS_CAPABILITY",
            Self::NULL_POINTER => "NULL_POINTER",
            Self::ABSENT_INFORMATION => "ABSENT_INFORMATION",
            Self::INVALID_EVENT_TYPE => "INVALID_EVENT_TYPE",
            Self::ILLEGAL_ARGUMENT => "ILLEGAL_ARGUMENT",
            Self::OUT_OF_MEMORY => "OUT_OF_MEMORY",
            Self::ACCESS_DENIED => "ACCESS_DENIED",
            Self::WRONG_PHASE => "WRONG_PHASE",
            Self::INTERNAL => "INTERNAL",
            Self::UNATTACHED_THREAD => "UNATTACHED_THREAD",
            Self::INVALID_ENVIRONMENT => "INVALID_ENVIRONMENT",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for jvmtiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "JVMTI_ERROR_{}", name),
            None => write!(f, "JVMTI_ERROR({})", self.0),
        }
    }
}

impl fmt::Display for jvmtiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "JVMTI_ERROR_{} ({})", name, self.0),
            None => write!(f, "unknown JVMTI error ({})", self.0),
        }
    }
}

// --- Capabilities ---

/// `jvmtiCapabilities`: 128 bits of C bitfields, LSB first in each word.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct jvmtiCapabilities {
    bits: [u32; 4],
}

impl jvmtiCapabilities {
    fn set_bit(&mut self, bit_offset: usize, value: bool) {
        let word_index = bit_offset / 32;
        let bit_index = bit_offset % 32;
        if value {
            self.bits[word_index] |= 1 << bit_index;
        } else {
            self.bits[word_index] &= !(1 << bit_index);
        }
    }

    fn get_bit(&self, bit_offset: usize) -> bool {
        let word_index = bit_offset / 32;
        let bit_index = bit_offset % 32;
        (self.bits[word_index] & (1 << bit_index)) != 0
    }

    pub fn from_bits(bits: [u32; 4]) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> [u32; 4] {
        self.bits
    }

    // [6]
    pub fn set_can_get_current_contended_monitor(&mut self, v: bool) { self.set_bit(6, v); }
    pub fn can_get_current_contended_monitor(&self) -> bool { self.get_bit(6) }

    // [7]
    pub fn set_can_get_monitor_info(&mut self, v: bool) { self.set_bit(7, v); }
    pub fn can_get_monitor_info(&self) -> bool { self.get_bit(7) }

    // [28]
    pub fn set_can_generate_monitor_events(&mut self, v: bool) { self.set_bit(28, v); }
    pub fn can_generate_monitor_events(&self) -> bool { self.get_bit(28) }
}

// --- Function Table ---

pub type JvmtiSetEventNotificationModeFn = unsafe extern "system" fn(env: *mut jvmtiEnv, mode: jint, event_type: jvmtiEvent, event_thread: jthread) -> jvmtiError;
pub type JvmtiGetCapabilitiesFn = unsafe extern "system" fn(env: *mut jvmtiEnv, capabilities_ptr: *mut jvmtiCapabilities) -> jvmtiError;
pub type JvmtiSetEventCallbacksFn = unsafe extern "system" fn(env: *mut jvmtiEnv, callbacks: *const jvmtiEventCallbacks, size_of_callbacks: jint) -> jvmtiError;
pub type JvmtiGetPhaseFn = unsafe extern "system" fn(env: *mut jvmtiEnv, phase_ptr: *mut jint) -> jvmtiError;
pub type JvmtiGetPotentialCapabilitiesFn = unsafe extern "system" fn(env: *mut jvmtiEnv, capabilities_ptr: *mut jvmtiCapabilities) -> jvmtiError;
pub type JvmtiAddCapabilitiesFn = unsafe extern "system" fn(env: *mut jvmtiEnv, capabilities_ptr: *const jvmtiCapabilities) -> jvmtiError;
pub type JvmtiRelinquishCapabilitiesFn = unsafe extern "system" fn(env: *mut jvmtiEnv, capabilities_ptr: *const jvmtiCapabilities) -> jvmtiError;

#[repr(C)]
pub struct jvmtiInterface_1_ {
    /*   1: RESERVED */
    pub reserved1: *mut c_void,
    /*   2: Set Event Notification Mode */
    pub SetEventNotificationMode: Option<JvmtiSetEventNotificationModeFn>,
    /*   3-88: Modules, threads, frames, heap, raw monitors, classes ... */
    pub _slots_3_88: [*mut c_void; 86],
    /*  89: Get Capabilities */
    pub GetCapabilities: Option<JvmtiGetCapabilitiesFn>,
    /*  90-121: Stack traces, TLS, heap iteration, JNI function table */
    pub _slots_90_121: [*mut c_void; 32],
    /* 122: Set Event Callbacks */
    pub SetEventCallbacks: Option<JvmtiSetEventCallbacksFn>,
    /* 123-132: Extensions, environment disposal, error names, properties */
    pub _slots_123_132: [*mut c_void; 10],
    /* 133: Get Phase */
    pub GetPhase: Option<JvmtiGetPhaseFn>,
    /* 134-139: Timers */
    pub _slots_134_139: [*mut c_void; 6],
    /* 140: Get Potential Capabilities */
    pub GetPotentialCapabilities: Option<JvmtiGetPotentialCapabilitiesFn>,
    /* 141: RESERVED */
    pub reserved141: *mut c_void,
    /* 142: Add Capabilities */
    pub AddCapabilities: Option<JvmtiAddCapabilitiesFn>,
    /* 143: Relinquish Capabilities */
    pub RelinquishCapabilities: Option<JvmtiRelinquishCapabilitiesFn>,
    /* 144-156: Processors, class versions, local storage, heap sampling ... */
    pub _slots_144_156: [*mut c_void; 13],
}

impl Default for jvmtiInterface_1_ {
    fn default() -> Self {
        Self {
            reserved1: ptr::null_mut(),
            SetEventNotificationMode: None,
            _slots_3_88: [ptr::null_mut(); 86],
            GetCapabilities: None,
            _slots_90_121: [ptr::null_mut(); 32],
            SetEventCallbacks: None,
            _slots_123_132: [ptr::null_mut(); 10],
            GetPhase: None,
            _slots_134_139: [ptr::null_mut(); 6],
            GetPotentialCapabilities: None,
            reserved141: ptr::null_mut(),
            AddCapabilities: None,
            RelinquishCapabilities: None,
            _slots_144_156: [ptr::null_mut(); 13],
        }
    }
}

#[repr(C)]
pub struct jvmtiEnv {
    pub functions: *const jvmtiInterface_1_,
}

// --- Event Callbacks ---

pub type JvmtiMonitorContendedEnterFn = unsafe extern "system" fn(
    jvmti_env: *mut jvmtiEnv, jni_env: *mut JNIEnv, thread: jthread, object: jobject
);
pub type JvmtiMonitorContendedEnteredFn = unsafe extern "system" fn(
    jvmti_env: *mut jvmtiEnv, jni_env: *mut JNIEnv, thread: jthread, object: jobject
);

/// `jvmtiEventCallbacks`, one slot per event number starting at 50
/// (`VMInit`) and ending at 86 (`SampledObjectAlloc`).
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct jvmtiEventCallbacks {
    /* 50-74: VMInit .. MonitorWaited, including reserved72 */
    pub _slots_50_74: [*mut c_void; 25],
    /* 75 */
    pub MonitorContendedEnter: Option<JvmtiMonitorContendedEnterFn>,
    /* 76 */
    pub MonitorContendedEntered: Option<JvmtiMonitorContendedEnteredFn>,
    /* 77-86: reserved77-79, ResourceExhausted .. SampledObjectAlloc */
    pub _slots_77_86: [*mut c_void; 10],
}

impl Default for jvmtiEventCallbacks {
    fn default() -> Self {
        Self {
            _slots_50_74: [ptr::null_mut(); 25],
            MonitorContendedEnter: None,
            MonitorContendedEntered: None,
            _slots_77_86: [ptr::null_mut(); 10],
        }
    }
}
