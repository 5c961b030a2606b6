//! Raw FFI bindings: JNI and JVMTI types and function tables.
//!
//! Only the table slots this agent calls are typed; see each file's header.

pub mod jni;
pub mod jvmti;
