//! # monitor-contention-agent
//!
//! A JVMTI agent that forwards monitor contention to managed code.
//!
//! Every time a thread blocks on a monitor another thread owns
//! (`MonitorContendedEnter`) and every time it then acquires that monitor
//! (`MonitorContendedEntered`), the agent calls a static method on a
//! managed class:
//!
//! ```java
//! static void onMonitorWait(Thread thread, Object monitor);
//! static void onMonitorEntered(Thread thread, Object monitor);
//! ```
//!
//! The managed side drives the lifecycle through the natives of
//! `org.aim.mainagent.CEventAgentAdapter`: `init()` binds the adapter
//! class as the target, `activateMonitorEvents()` and
//! `deactivateMonitorEvents()` toggle delivery at runtime.
//!
//! ## Usage
//!
//! ```bash
//! cargo build --release
//! java -agentpath:./target/release/libmonitor_contention_agent.so MyApp
//! java -agentpath:./target/release/libmonitor_contention_agent.so=delivery=queued,capacity=4096,log=debug MyApp
//! ```
//!
//! See [`config`] for the option grammar.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          JVM entry points (agent, natives)               │
//! │   Agent_OnLoad / OnAttach / OnUnload, adapter natives    │
//! ├─────────────────────────────────────────────────────────┤
//! │                 Bridge (registry, bridge)                │
//! │   OnceLock singleton, callback trampolines,              │
//! │   Unbound → Bound → Enabled → Disabled toggle            │
//! ├─────────────────────────────────────────────────────────┤
//! │   capability  │  binder           │  forwarder / queue   │
//! │   negotiation │  ManagedTarget    │  sync or queued      │
//! ├─────────────────────────────────────────────────────────┤
//! │              Safe wrappers (env module)                  │
//! │   Jvmti, JniEnv, JavaVm, GlobalRef                       │
//! ├─────────────────────────────────────────────────────────┤
//! │              Raw FFI Bindings (sys module)               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Caller obligations
//!
//! In the default synchronous mode the upcall runs on the contending thread
//! while the JVM is inside its monitor-enter path. The managed callbacks
//! must not block indefinitely and must not try to enter the monitor they
//! are told about. Queued delivery removes that constraint at the cost of
//! possibly dropping events under load.

pub mod sys;
pub mod env;
pub mod prelude;

pub mod agent;
pub mod binder;
pub mod bridge;
pub mod capability;
pub mod config;
pub mod error;
pub mod forwarder;
pub mod logging;
pub mod natives;
pub mod queue;
pub mod registry;
pub mod vm;

// Implementation modules (use `env` module for the public API)
#[doc(hidden)]
pub mod jvmti_wrapper;
#[doc(hidden)]
pub mod jni_wrapper;

pub use crate::sys::jni;
pub use crate::sys::jvmti;

pub use bridge::{BridgeState, MonitorBridge};
pub use error::{AgentError, Result};
