use thiserror::Error;

use crate::config::OptionsError;
use crate::sys::jni::jint;
use crate::sys::jvmti::jvmtiError;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("JVMTI {op} failed: {code}")]
    Jvmti { op: &'static str, code: jvmtiError },

    #[error("JNI {op} failed with code {code}")]
    Jni { op: &'static str, code: jint },

    #[error("can_generate_monitor_events is not available in this VM or phase")]
    CapabilityUnavailable,

    #[error("no managed callback target is bound; call init() first")]
    NotBound,

    #[error("static method {name}{signature} not found on the target class")]
    MethodNotFound {
        name: &'static str,
        signature: &'static str,
    },

    #[error("null reference passed where an object was required")]
    NullReference,

    #[error("agent bridge already initialized")]
    AlreadyInitialized,

    #[error("agent bridge not initialized (agent was not loaded through Agent_OnLoad)")]
    NotInitialized,

    #[error("could not attach forwarding worker to the JVM (code {0})")]
    WorkerAttach(jint),

    #[error(transparent)]
    Options(#[from] OptionsError),
}

impl AgentError {
    pub(crate) fn jvmti(op: &'static str) -> impl FnOnce(jvmtiError) -> AgentError {
        move |code| AgentError::Jvmti { op, code }
    }
}
