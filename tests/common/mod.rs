//! Test doubles: in-process JVMTI / JNI / JavaVM function tables whose
//! entries record what the agent asks of them, plus pure-Rust hosts and
//! listeners for the bridge logic.
//!
//! Each fake is `#[repr(C)]` with the env pointer as its first field, so the
//! `extern "system"` entries can cast the env pointer they receive back to
//! the fake. Fakes are leaked; tests hold `&'static` references.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::ffi::{c_char, c_void, CStr};
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use monitor_contention_agent::capability::{CapabilitySet, InstrumentationHost};
use monitor_contention_agent::forwarder::{ContentionListener, EventKind, MonitorEvent};
use monitor_contention_agent::sys::jni::{self, jint, JNIEnv, JNIInvokeInterface_, JNINativeInterface_, JavaVM};
use monitor_contention_agent::sys::jvmti::{self, jvmtiCapabilities, jvmtiEnv, jvmtiError, jvmtiInterface_1_};
use monitor_contention_agent::{AgentError, Result};

pub fn obj(n: usize) -> jni::jobject {
    n as jni::jobject
}

// =============================================================================
// Fake JVMTI
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JvmtiCall {
    GetCapabilities,
    GetPotentialCapabilities,
    AddCapabilities([u32; 4]),
    RelinquishCapabilities([u32; 4]),
    SetEventCallbacks,
    SetEventNotificationMode { mode: jint, event: u32, thread: usize },
    GetPhase,
}

#[derive(Default)]
pub struct JvmtiState {
    pub granted: [u32; 4],
    pub potential: [u32; 4],
    pub calls: Vec<JvmtiCall>,
    pub callbacks: Option<jvmti::jvmtiEventCallbacks>,
    pub callbacks_size: jint,
    pub enabled: HashSet<u32>,
    pub fail: HashMap<&'static str, jvmtiError>,
    pub phase: jint,
}

// The recorded callback table holds raw padding pointers that are never read.
unsafe impl Send for JvmtiState {}

#[repr(C)]
pub struct FakeJvmti {
    env: jvmtiEnv,
    table: Box<jvmtiInterface_1_>,
    pub state: Mutex<JvmtiState>,
}

unsafe impl Send for FakeJvmti {}
unsafe impl Sync for FakeJvmti {}

unsafe fn fake_jvmti<'a>(env: *mut jvmtiEnv) -> &'a FakeJvmti {
    &*(env as *const FakeJvmti)
}

fn fail_or_none(state: &JvmtiState, op: &str) -> Option<jvmtiError> {
    state.fail.get(op).copied()
}

unsafe extern "system" fn jvmti_get_capabilities(env: *mut jvmtiEnv, out: *mut jvmtiCapabilities) -> jvmtiError {
    let mut s = fake_jvmti(env).state.lock().unwrap();
    s.calls.push(JvmtiCall::GetCapabilities);
    if let Some(e) = fail_or_none(&s, "GetCapabilities") {
        return e;
    }
    *out = jvmtiCapabilities::from_bits(s.granted);
    jvmtiError::NONE
}

unsafe extern "system" fn jvmti_get_potential_capabilities(env: *mut jvmtiEnv, out: *mut jvmtiCapabilities) -> jvmtiError {
    let mut s = fake_jvmti(env).state.lock().unwrap();
    s.calls.push(JvmtiCall::GetPotentialCapabilities);
    if let Some(e) = fail_or_none(&s, "GetPotentialCapabilities") {
        return e;
    }
    *out = jvmtiCapabilities::from_bits(s.potential);
    jvmtiError::NONE
}

unsafe extern "system" fn jvmti_add_capabilities(env: *mut jvmtiEnv, caps: *const jvmtiCapabilities) -> jvmtiError {
    let mut s = fake_jvmti(env).state.lock().unwrap();
    let bits = (*caps).bits();
    s.calls.push(JvmtiCall::AddCapabilities(bits));
    if let Some(e) = fail_or_none(&s, "AddCapabilities") {
        return e;
    }
    for i in 0..4 {
        if bits[i] & !s.potential[i] != 0 {
            return jvmtiError::NOT_AVAILABLE;
        }
        s.granted[i] |= bits[i];
    }
    jvmtiError::NONE
}

unsafe extern "system" fn jvmti_relinquish_capabilities(env: *mut jvmtiEnv, caps: *const jvmtiCapabilities) -> jvmtiError {
    let mut s = fake_jvmti(env).state.lock().unwrap();
    let bits = (*caps).bits();
    s.calls.push(JvmtiCall::RelinquishCapabilities(bits));
    if let Some(e) = fail_or_none(&s, "RelinquishCapabilities") {
        return e;
    }
    for i in 0..4 {
        s.granted[i] &= !bits[i];
    }
    jvmtiError::NONE
}

unsafe extern "system" fn jvmti_set_event_callbacks(
    env: *mut jvmtiEnv,
    callbacks: *const jvmti::jvmtiEventCallbacks,
    size: jint,
) -> jvmtiError {
    let mut s = fake_jvmti(env).state.lock().unwrap();
    s.calls.push(JvmtiCall::SetEventCallbacks);
    if let Some(e) = fail_or_none(&s, "SetEventCallbacks") {
        return e;
    }
    s.callbacks = Some(*callbacks);
    s.callbacks_size = size;
    jvmtiError::NONE
}

unsafe extern "system" fn jvmti_set_event_notification_mode(
    env: *mut jvmtiEnv,
    mode: jint,
    event: jvmti::jvmtiEvent,
    thread: jni::jthread,
) -> jvmtiError {
    let mut s = fake_jvmti(env).state.lock().unwrap();
    s.calls.push(JvmtiCall::SetEventNotificationMode { mode, event, thread: thread as usize });
    if let Some(e) = fail_or_none(&s, "SetEventNotificationMode") {
        return e;
    }
    if mode == jvmti::JVMTI_ENABLE {
        let bit = 1u32 << 28;
        if s.granted[0] & bit == 0 {
            return jvmtiError::MUST_POSSESS_CAPABILITY;
        }
        s.enabled.insert(event);
    } else {
        s.enabled.remove(&event);
    }
    jvmtiError::NONE
}

unsafe extern "system" fn jvmti_get_phase(env: *mut jvmtiEnv, out: *mut jint) -> jvmtiError {
    let mut s = fake_jvmti(env).state.lock().unwrap();
    s.calls.push(JvmtiCall::GetPhase);
    *out = s.phase;
    jvmtiError::NONE
}

impl FakeJvmti {
    pub fn new() -> &'static FakeJvmti {
        Self::with_table(|_| {})
    }

    /// Builds the fake after letting `edit` blank out or replace entries.
    pub fn with_table(edit: impl FnOnce(&mut jvmtiInterface_1_)) -> &'static FakeJvmti {
        let mut table = jvmtiInterface_1_::default();
        table.GetCapabilities = Some(jvmti_get_capabilities);
        table.GetPotentialCapabilities = Some(jvmti_get_potential_capabilities);
        table.AddCapabilities = Some(jvmti_add_capabilities);
        table.RelinquishCapabilities = Some(jvmti_relinquish_capabilities);
        table.SetEventCallbacks = Some(jvmti_set_event_callbacks);
        table.SetEventNotificationMode = Some(jvmti_set_event_notification_mode);
        table.GetPhase = Some(jvmti_get_phase);
        edit(&mut table);

        let table = Box::new(table);
        let env = jvmtiEnv { functions: &*table };
        let mut potential = jvmtiCapabilities::default();
        potential.set_can_generate_monitor_events(true);
        potential.set_can_get_monitor_info(true);
        let state = JvmtiState {
            potential: potential.bits(),
            phase: jvmti::JVMTI_PHASE_LIVE,
            ..Default::default()
        };
        Box::leak(Box::new(FakeJvmti { env, table, state: Mutex::new(state) }))
    }

    pub fn raw(&'static self) -> *mut jvmtiEnv {
        &self.env as *const jvmtiEnv as *mut jvmtiEnv
    }

    pub fn calls(&self) -> Vec<JvmtiCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn fail(&self, op: &'static str, err: jvmtiError) {
        self.state.lock().unwrap().fail.insert(op, err);
    }

    pub fn granted(&self) -> [u32; 4] {
        self.state.lock().unwrap().granted
    }

    pub fn enabled(&self) -> HashSet<u32> {
        self.state.lock().unwrap().enabled.clone()
    }

    pub fn callbacks(&self) -> Option<jvmti::jvmtiEventCallbacks> {
        self.state.lock().unwrap().callbacks
    }
}

// =============================================================================
// Fake JNI
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upcall {
    pub class: usize,
    pub method: usize,
    pub thread: usize,
    pub object: usize,
}

#[derive(Default)]
pub struct JniState {
    pub classes: HashMap<String, usize>,
    pub methods: HashMap<(usize, String, String), usize>,
    pub upcalls: Vec<Upcall>,
    pub pending_exception: bool,
    pub throwing_methods: HashSet<usize>,
    pub thrown: Vec<(String, String)>,
    pub described: usize,
    pub cleared: usize,
    /// global ref -> referent
    pub globals: HashMap<usize, usize>,
    pub globals_deleted: usize,
    pub locals_deleted: usize,
    pub strings_released: usize,
    next_id: usize,
}

impl JniState {
    fn next(&mut self) -> usize {
        self.next_id += 0x10;
        0x10_0000 + self.next_id
    }

    fn resolve(&self, r: usize) -> usize {
        self.globals.get(&r).copied().unwrap_or(r)
    }
}

#[repr(C)]
pub struct FakeJni {
    table_ptr: *const JNINativeInterface_,
    table: Box<JNINativeInterface_>,
    vm: AtomicPtr<JavaVM>,
    pub state: Mutex<JniState>,
}

unsafe impl Send for FakeJni {}
unsafe impl Sync for FakeJni {}

unsafe fn fake_jni<'a>(env: *mut JNIEnv) -> &'a FakeJni {
    &*(env as *const FakeJni)
}

unsafe extern "system" fn jni_find_class(env: *mut JNIEnv, name: *const c_char) -> jni::jclass {
    let s = fake_jni(env).state.lock().unwrap();
    let name = CStr::from_ptr(name).to_string_lossy().into_owned();
    s.classes.get(&name).map_or(ptr::null_mut(), |c| *c as jni::jclass)
}

unsafe extern "system" fn jni_throw_new(env: *mut JNIEnv, cls: jni::jclass, msg: *const c_char) -> jint {
    let mut s = fake_jni(env).state.lock().unwrap();
    let cls = cls as usize;
    let class_name = s
        .classes
        .iter()
        .find(|(_, c)| **c == cls)
        .map(|(n, _)| n.clone())
        .unwrap_or_default();
    let msg = CStr::from_ptr(msg).to_string_lossy().into_owned();
    s.thrown.push((class_name, msg));
    s.pending_exception = true;
    jni::JNI_OK
}

unsafe extern "system" fn jni_exception_describe(env: *mut JNIEnv) {
    let mut s = fake_jni(env).state.lock().unwrap();
    s.described += 1;
    s.pending_exception = false;
}

unsafe extern "system" fn jni_exception_clear(env: *mut JNIEnv) {
    let mut s = fake_jni(env).state.lock().unwrap();
    s.cleared += 1;
    s.pending_exception = false;
}

unsafe extern "system" fn jni_exception_check(env: *mut JNIEnv) -> jni::jboolean {
    let s = fake_jni(env).state.lock().unwrap();
    if s.pending_exception { jni::JNI_TRUE } else { jni::JNI_FALSE }
}

unsafe extern "system" fn jni_new_global_ref(env: *mut JNIEnv, obj: jni::jobject) -> jni::jobject {
    if obj.is_null() {
        return ptr::null_mut();
    }
    let mut s = fake_jni(env).state.lock().unwrap();
    let id = s.next();
    let referent = s.resolve(obj as usize);
    s.globals.insert(id, referent);
    id as jni::jobject
}

unsafe extern "system" fn jni_delete_global_ref(env: *mut JNIEnv, gref: jni::jobject) {
    let mut s = fake_jni(env).state.lock().unwrap();
    if s.globals.remove(&(gref as usize)).is_some() {
        s.globals_deleted += 1;
    }
}

unsafe extern "system" fn jni_is_same_object(env: *mut JNIEnv, a: jni::jobject, b: jni::jobject) -> jni::jboolean {
    let s = fake_jni(env).state.lock().unwrap();
    (s.resolve(a as usize) == s.resolve(b as usize)) as jni::jboolean
}

unsafe extern "system" fn jni_delete_local_ref(env: *mut JNIEnv, _obj: jni::jobject) {
    fake_jni(env).state.lock().unwrap().locals_deleted += 1;
}

unsafe extern "system" fn jni_get_static_method_id(
    env: *mut JNIEnv,
    cls: jni::jclass,
    name: *const c_char,
    sig: *const c_char,
) -> jni::jmethodID {
    let mut s = fake_jni(env).state.lock().unwrap();
    let key = (
        s.resolve(cls as usize),
        CStr::from_ptr(name).to_string_lossy().into_owned(),
        CStr::from_ptr(sig).to_string_lossy().into_owned(),
    );
    if let Some(mid) = s.methods.get(&key).copied() {
        return mid as jni::jmethodID;
    }
    // NoSuchMethodError
    s.pending_exception = true;
    ptr::null_mut()
}

unsafe extern "system" fn jni_call_static_void_method_a(
    env: *mut JNIEnv,
    cls: jni::jclass,
    method: jni::jmethodID,
    args: *const jni::jvalue,
) {
    let mut s = fake_jni(env).state.lock().unwrap();
    let thread = (*args).l as usize;
    let object = (*args.add(1)).l as usize;
    let call = Upcall {
        class: s.resolve(cls as usize),
        method: method as usize,
        thread: s.resolve(thread),
        object: s.resolve(object),
    };
    s.upcalls.push(call);
    if s.throwing_methods.contains(&(method as usize)) {
        s.pending_exception = true;
    }
}

unsafe extern "system" fn jni_get_string_utf_chars(
    _env: *mut JNIEnv,
    s: jni::jstring,
    _is_copy: *mut jni::jboolean,
) -> *const c_char {
    // Test strings are NUL-terminated byte strings passed as the jstring.
    s as *const c_char
}

unsafe extern "system" fn jni_release_string_utf_chars(env: *mut JNIEnv, _s: jni::jstring, _chars: *const c_char) {
    fake_jni(env).state.lock().unwrap().strings_released += 1;
}

unsafe extern "system" fn jni_get_java_vm(env: *mut JNIEnv, vm: *mut *mut JavaVM) -> jint {
    let fake = fake_jni(env);
    let p = fake.vm.load(Ordering::SeqCst);
    if p.is_null() {
        return jni::JNI_ERR;
    }
    *vm = p;
    jni::JNI_OK
}

impl FakeJni {
    fn new() -> &'static FakeJni {
        let table = Box::new(JNINativeInterface_ {
            reserved: [ptr::null_mut(); 4],
            _slots_4_5: [ptr::null_mut(); 2],
            FindClass: jni_find_class,
            _slots_7_13: [ptr::null_mut(); 7],
            ThrowNew: jni_throw_new,
            _slot_15: [ptr::null_mut(); 1],
            ExceptionDescribe: jni_exception_describe,
            ExceptionClear: jni_exception_clear,
            _slots_18_20: [ptr::null_mut(); 3],
            NewGlobalRef: jni_new_global_ref,
            DeleteGlobalRef: jni_delete_global_ref,
            DeleteLocalRef: jni_delete_local_ref,
            IsSameObject: jni_is_same_object,
            _slots_25_112: [ptr::null_mut(); 88],
            GetStaticMethodID: jni_get_static_method_id,
            _slots_114_142: [ptr::null_mut(); 29],
            CallStaticVoidMethodA: jni_call_static_void_method_a,
            _slots_144_168: [ptr::null_mut(); 25],
            GetStringUTFChars: jni_get_string_utf_chars,
            ReleaseStringUTFChars: jni_release_string_utf_chars,
            _slots_171_218: [ptr::null_mut(); 48],
            GetJavaVM: jni_get_java_vm,
            _slots_220_227: [ptr::null_mut(); 8],
            ExceptionCheck: jni_exception_check,
            _slots_229_235: [ptr::null_mut(); 7],
        });
        let table_ptr: *const JNINativeInterface_ = &*table;
        let mut state = JniState::default();
        state.classes.insert("java/lang/IllegalStateException".to_string(), 0xE000);
        Box::leak(Box::new(FakeJni {
            table_ptr,
            table,
            vm: AtomicPtr::new(ptr::null_mut()),
            state: Mutex::new(state),
        }))
    }

    pub fn table(&self) -> &JNINativeInterface_ {
        &self.table
    }

    pub fn raw(&'static self) -> *mut JNIEnv {
        &self.table_ptr as *const *const JNINativeInterface_ as *mut JNIEnv
    }

    /// Registers a class reachable through `FindClass` and as a target.
    pub fn define_class(&self, name: &str, id: usize) -> jni::jclass {
        self.state.lock().unwrap().classes.insert(name.to_string(), id);
        id as jni::jclass
    }

    pub fn define_static(&self, class: jni::jclass, name: &str, sig: &str) -> jni::jmethodID {
        let mut s = self.state.lock().unwrap();
        let id = s.next();
        s.methods.insert((class as usize, name.to_string(), sig.to_string()), id);
        id as jni::jmethodID
    }

    pub fn throw_from(&self, method: jni::jmethodID) {
        self.state.lock().unwrap().throwing_methods.insert(method as usize);
    }

    pub fn upcalls(&self) -> Vec<Upcall> {
        self.state.lock().unwrap().upcalls.clone()
    }

    pub fn live_globals(&self) -> usize {
        self.state.lock().unwrap().globals.len()
    }

    pub fn thrown(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().thrown.clone()
    }

    pub fn pending_exception(&self) -> bool {
        self.state.lock().unwrap().pending_exception
    }

    pub fn set_pending_exception(&self, pending: bool) {
        self.state.lock().unwrap().pending_exception = pending;
    }
}

// =============================================================================
// Fake JavaVM
// =============================================================================

#[repr(C)]
pub struct FakeVm {
    table_ptr: *const JNIInvokeInterface_,
    table: Box<JNIInvokeInterface_>,
    jni_env: *mut JNIEnv,
    jvmti_env: *mut jvmtiEnv,
    pub attached: Mutex<Vec<String>>,
    pub detached: AtomicUsize,
}

unsafe impl Send for FakeVm {}
unsafe impl Sync for FakeVm {}

unsafe fn fake_vm<'a>(vm: *mut JavaVM) -> &'a FakeVm {
    &*(vm as *const FakeVm)
}

unsafe extern "system" fn vm_destroy(_vm: *mut JavaVM) -> jint {
    jni::JNI_ERR
}

unsafe extern "system" fn vm_get_env(vm: *mut JavaVM, penv: *mut *mut c_void, version: jint) -> jint {
    let fake = fake_vm(vm);
    if version & 0x3000_0000 == 0x3000_0000 {
        if fake.jvmti_env.is_null() {
            return jni::JNI_EVERSION;
        }
        *penv = fake.jvmti_env as *mut c_void;
    } else {
        *penv = fake.jni_env as *mut c_void;
    }
    jni::JNI_OK
}

unsafe extern "system" fn vm_attach(vm: *mut JavaVM, penv: *mut *mut c_void, args: *mut c_void) -> jint {
    let fake = fake_vm(vm);
    let name = if args.is_null() {
        String::new()
    } else {
        let args = &*(args as *const jni::JavaVMAttachArgs);
        if args.name.is_null() { String::new() } else { CStr::from_ptr(args.name).to_string_lossy().into_owned() }
    };
    fake.attached.lock().unwrap().push(name);
    *penv = fake.jni_env as *mut c_void;
    jni::JNI_OK
}

unsafe extern "system" fn vm_detach(vm: *mut JavaVM) -> jint {
    fake_vm(vm).detached.fetch_add(1, Ordering::SeqCst);
    jni::JNI_OK
}

impl FakeVm {
    pub fn raw(&'static self) -> *mut JavaVM {
        &self.table_ptr as *const *const JNIInvokeInterface_ as *mut JavaVM
    }
}

/// A JavaVM, its one JNI env and, optionally, a JVMTI env.
pub struct FakeJvm {
    pub vm: &'static FakeVm,
    pub jni: &'static FakeJni,
    pub jvmti: Option<&'static FakeJvmti>,
}

impl FakeJvm {
    pub fn new() -> FakeJvm {
        Self::build(Some(FakeJvmti::new()))
    }

    pub fn without_jvmti() -> FakeJvm {
        Self::build(None)
    }

    fn build(jvmti: Option<&'static FakeJvmti>) -> FakeJvm {
        let jni = FakeJni::new();
        let table = Box::new(JNIInvokeInterface_ {
            reserved0: ptr::null_mut(),
            reserved1: ptr::null_mut(),
            reserved2: ptr::null_mut(),
            DestroyJavaVM: vm_destroy,
            AttachCurrentThread: vm_attach,
            DetachCurrentThread: vm_detach,
            GetEnv: vm_get_env,
            AttachCurrentThreadAsDaemon: vm_attach,
        });
        let table_ptr: *const JNIInvokeInterface_ = &*table;
        let vm: &'static FakeVm = Box::leak(Box::new(FakeVm {
            table_ptr,
            table,
            jni_env: jni.raw(),
            jvmti_env: jvmti.map_or(ptr::null_mut(), |j| j.raw()),
            attached: Mutex::new(Vec::new()),
            detached: AtomicUsize::new(0),
        }));
        jni.vm.store(vm.raw(), Ordering::SeqCst);
        FakeJvm { vm, jni, jvmti }
    }

    pub fn jvmti(&self) -> &'static FakeJvmti {
        self.jvmti.expect("FakeJvm built without JVMTI")
    }
}

// =============================================================================
// Pure-Rust host and listener
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Capabilities,
    Potential,
    Add(CapabilitySet),
    Relinquish(CapabilitySet),
    Notify { enable: bool, event: u32 },
}

pub struct HostState {
    pub granted: CapabilitySet,
    pub potential: CapabilitySet,
    pub calls: Vec<HostCall>,
    pub fail_enable: Option<u32>,
    pub fail_disable: Option<u32>,
    pub fail_relinquish: usize,
}

/// An `InstrumentationHost` that records calls and can fail on demand.
pub struct RecordingHost {
    pub state: Mutex<HostState>,
}

impl RecordingHost {
    pub fn new() -> Self {
        RecordingHost::with_potential(CapabilitySet::monitor_events())
    }

    pub fn with_potential(potential: CapabilitySet) -> Self {
        RecordingHost {
            state: Mutex::new(HostState {
                granted: CapabilitySet::empty(),
                potential,
                calls: Vec::new(),
                fail_enable: None,
                fail_disable: None,
                fail_relinquish: 0,
            }),
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn granted(&self) -> CapabilitySet {
        self.state.lock().unwrap().granted
    }

    pub fn grant(&self, caps: CapabilitySet) {
        let mut s = self.state.lock().unwrap();
        s.granted = s.granted.union(caps);
    }

    pub fn fail_enable(&self, event: Option<u32>) {
        self.state.lock().unwrap().fail_enable = event;
    }

    pub fn fail_disable(&self, event: Option<u32>) {
        self.state.lock().unwrap().fail_disable = event;
    }

    /// Makes the next `times` relinquish calls fail.
    pub fn fail_relinquish(&self, times: usize) {
        self.state.lock().unwrap().fail_relinquish = times;
    }

    pub fn notify_calls(&self) -> Vec<HostCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, HostCall::Notify { .. }))
            .collect()
    }
}

impl InstrumentationHost for RecordingHost {
    fn capabilities(&self) -> Result<CapabilitySet> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(HostCall::Capabilities);
        Ok(s.granted)
    }

    fn potential_capabilities(&self) -> Result<CapabilitySet> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(HostCall::Potential);
        Ok(s.potential)
    }

    fn add_capabilities(&self, caps: CapabilitySet) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(HostCall::Add(caps));
        s.granted = s.granted.union(caps);
        Ok(())
    }

    fn relinquish_capabilities(&self, caps: CapabilitySet) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(HostCall::Relinquish(caps));
        if s.fail_relinquish > 0 {
            s.fail_relinquish -= 1;
            return Err(AgentError::Jvmti {
                op: "RelinquishCapabilities",
                code: jvmtiError::INTERNAL,
            });
        }
        s.granted = s.granted.difference(caps);
        Ok(())
    }

    fn set_event_notification_mode(&self, enable: bool, event: u32) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(HostCall::Notify { enable, event });
        let failing = if enable { s.fail_enable } else { s.fail_disable };
        if failing == Some(event) {
            return Err(AgentError::Jvmti {
                op: "SetEventNotificationMode",
                code: jvmtiError::WRONG_PHASE,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seen {
    pub kind: EventKind,
    pub thread: usize,
    pub object: usize,
    pub jni: usize,
}

/// A listener that records every event, shareable with the test body.
#[derive(Clone, Default)]
pub struct RecordingListener {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn boxed(&self) -> Box<dyn ContentionListener> {
        Box::new(self.clone())
    }
}

impl ContentionListener for RecordingListener {
    fn on_event(&self, jni: *mut JNIEnv, event: &MonitorEvent) {
        self.seen.lock().unwrap().push(Seen {
            kind: event.kind,
            thread: event.thread as usize,
            object: event.object as usize,
            jni: jni as usize,
        });
    }
}

pub fn wait(thread: usize, object: usize) -> MonitorEvent {
    MonitorEvent::new(EventKind::Wait, obj(thread), obj(object))
}

pub fn entered(thread: usize, object: usize) -> MonitorEvent {
    MonitorEvent::new(EventKind::Entered, obj(thread), obj(object))
}
