//! Safe wrappers around the raw JVMTI, JNI and JavaVM pointers.
//!
//! - [`Jvmti`]: capabilities, event callbacks, notification modes, phase
//! - [`JniEnv`]: static method lookup and upcalls, exceptions, references,
//!   strings
//! - [`JavaVm`]: per-thread environments, daemon attach and detach
//! - [`GlobalRef`]: deletes its global reference when dropped
//!
//! ```rust,ignore
//! use monitor_contention_agent::env::Jvmti;
//! use monitor_contention_agent::sys::jvmti;
//!
//! let jvmti_env = Jvmti::new(vm)?;
//! let caps = jvmti_env.get_potential_capabilities()?;
//! if caps.can_generate_monitor_events() {
//!     jvmti_env.set_event_notification_mode(
//!         true,
//!         jvmti::JVMTI_EVENT_MONITOR_CONTENDED_ENTER,
//!         std::ptr::null_mut(), // all threads
//!     )?;
//! }
//! ```

pub use crate::jni_wrapper::{GlobalRef, JniEnv};
pub use crate::jvmti_wrapper::Jvmti;
pub use crate::vm::JavaVm;
