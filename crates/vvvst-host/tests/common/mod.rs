//! In-process stand-in for the engine library.
//!
//! The exported operations are plain `extern "C-unwind"` functions. Each plug-in
//! instance carries the statistics object that was current on the thread
//! that created it, so tests running in parallel never share counters.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::ffi::{c_char, c_void, CStr, CString};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use vvvst_host::ffi::{self, symbols, Plugin, PluginUi, Version};
use vvvst_host::{BridgeError, Engine, NativeWindow, SymbolSource, UiHost};

pub const MOCK_VERSION: Version = Version {
    major: 0,
    minor: 14,
    patch: 2,
};
pub const MOCK_NAME: &str = "vvvst-mock";

#[derive(Default)]
pub struct MockStats {
    pub plugins_created: AtomicUsize,
    pub plugins_dropped: AtomicUsize,
    pub ui_attempts: AtomicUsize,
    pub uis_created: AtomicUsize,
    pub uis_dropped: AtomicUsize,
    pub idles: AtomicUsize,
    pub resizes: AtomicUsize,
    pub runs: AtomicUsize,
    pub strings_released: AtomicUsize,
    /// Upcoming `plugin_ui_new` calls that return null.
    pub ui_failures: AtomicUsize,
    pub last_frames: AtomicUsize,
    pub last_playing: AtomicBool,
    pub last_sample: AtomicI64,
    pub last_sample_rate: Mutex<f32>,
    pub last_size: Mutex<Option<(usize, usize, f64)>>,
    pub last_window: AtomicUsize,
    pub state: Mutex<Vec<u8>>,
    live_uis: Mutex<HashSet<usize>>,
    /// Editor calls that arrived with a pointer that was never created or already dropped.
    pub stale_ui_calls: AtomicUsize,
    /// Editors dropped after their plug-in was already gone.
    pub uis_outliving_plugin: AtomicUsize,
}

impl MockStats {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn check_live(&self, ui: *const PluginUi) {
        if !self.live_uis.lock().contains(&(ui as usize)) {
            self.stale_ui_calls.fetch_add(1, Ordering::SeqCst);
        }
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Arc<MockStats>>> = RefCell::new(None);
}

fn current() -> Arc<MockStats> {
    CURRENT
        .with(|current| current.borrow().clone())
        .unwrap_or_default()
}

struct MockPlugin {
    stats: Arc<MockStats>,
}

struct MockUi {
    stats: Arc<MockStats>,
}

unsafe fn stats_of(plugin: *const Plugin) -> Arc<MockStats> {
    Arc::clone(&(*(plugin as *const MockPlugin)).stats)
}

unsafe extern "C-unwind" fn get_version() -> Version {
    MOCK_VERSION
}

unsafe extern "C-unwind" fn get_plugin_name() -> *const c_char {
    match CString::new(MOCK_NAME) {
        Ok(name) => name.into_raw(),
        Err(_) => std::ptr::null(),
    }
}

unsafe extern "C-unwind" fn cstring_drop(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    drop(CString::from_raw(s));
    current().strings_released.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C-unwind" fn plugin_new() -> *mut Plugin {
    let stats = current();
    stats.plugins_created.fetch_add(1, Ordering::SeqCst);
    Box::into_raw(Box::new(MockPlugin { stats })) as *mut Plugin
}

/// Like the real engine, rejects state that is not UTF-8 by panicking.
unsafe extern "C-unwind" fn plugin_set_state(plugin: *const Plugin, state: *const c_char) {
    let stats = stats_of(plugin);
    let state = CStr::from_ptr(state);
    if state.to_str().is_err() {
        panic!("engine state is not valid UTF-8");
    }
    *stats.state.lock() = state.to_bytes().to_vec();
}

unsafe extern "C-unwind" fn plugin_get_state(plugin: *const Plugin) -> *mut c_char {
    let stats = stats_of(plugin);
    let state = stats.state.lock().clone();
    match CString::new(state) {
        Ok(state) => state.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

unsafe extern "C-unwind" fn plugin_run(
    plugin: *const Plugin,
    outputs: *mut *mut f32,
    sample_rate: f32,
    sample_count: usize,
    is_playing: bool,
    current_sample: i64,
) {
    let stats = &(*(plugin as *const MockPlugin)).stats;
    stats.runs.fetch_add(1, Ordering::SeqCst);
    stats.last_frames.store(sample_count, Ordering::SeqCst);
    stats.last_playing.store(is_playing, Ordering::SeqCst);
    stats.last_sample.store(current_sample, Ordering::SeqCst);
    *stats.last_sample_rate.lock() = sample_rate;

    let channels = std::slice::from_raw_parts(outputs, ffi::NUM_OUTPUTS);
    for (index, &channel) in channels.iter().enumerate() {
        std::slice::from_raw_parts_mut(channel, sample_count).fill(index as f32);
    }
}

unsafe extern "C-unwind" fn plugin_drop(plugin: *mut Plugin) {
    let plugin = Box::from_raw(plugin as *mut MockPlugin);
    plugin.stats.plugins_dropped.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C-unwind" fn plugin_ui_new(
    handle: usize,
    plugin: *const Plugin,
    width: usize,
    height: usize,
    scale_factor: f64,
) -> *mut PluginUi {
    let stats = stats_of(plugin);
    stats.ui_attempts.fetch_add(1, Ordering::SeqCst);
    let refused = stats
        .ui_failures
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if refused {
        return std::ptr::null_mut();
    }

    stats.uis_created.fetch_add(1, Ordering::SeqCst);
    stats.last_window.store(handle, Ordering::SeqCst);
    *stats.last_size.lock() = Some((width, height, scale_factor));
    let ui = Box::into_raw(Box::new(MockUi {
        stats: Arc::clone(&stats),
    }));
    stats.live_uis.lock().insert(ui as usize);
    ui as *mut PluginUi
}

unsafe extern "C-unwind" fn plugin_ui_set_size(
    plugin_ui: *const PluginUi,
    width: usize,
    height: usize,
    scale_factor: f64,
) {
    let stats = &(*(plugin_ui as *const MockUi)).stats;
    stats.check_live(plugin_ui);
    stats.resizes.fetch_add(1, Ordering::SeqCst);
    *stats.last_size.lock() = Some((width, height, scale_factor));
}

unsafe extern "C-unwind" fn plugin_ui_idle(plugin_ui: *const PluginUi) {
    let stats = &(*(plugin_ui as *const MockUi)).stats;
    stats.check_live(plugin_ui);
    stats.idles.fetch_add(1, Ordering::SeqCst);
}

unsafe extern "C-unwind" fn plugin_ui_drop(plugin_ui: *mut PluginUi) {
    let ui = Box::from_raw(plugin_ui as *mut MockUi);
    let stats = &ui.stats;
    if !stats.live_uis.lock().remove(&(plugin_ui as usize)) {
        stats.stale_ui_calls.fetch_add(1, Ordering::SeqCst);
    }
    if stats.plugins_dropped.load(Ordering::SeqCst) > 0 {
        stats.uis_outliving_plugin.fetch_add(1, Ordering::SeqCst);
    }
    stats.uis_dropped.fetch_add(1, Ordering::SeqCst);
}

/// Symbol table backed by the functions above.
pub struct MockSymbols {
    missing: Vec<&'static str>,
    null: Vec<&'static str>,
    lookups: Mutex<HashMap<&'static str, usize>>,
}

impl MockSymbols {
    pub fn lookups(&self, name: &str) -> usize {
        self.lookups.lock().get(name).copied().unwrap_or(0)
    }
}

impl SymbolSource for MockSymbols {
    fn symbol(&self, name: &'static str) -> Result<*const c_void, BridgeError> {
        *self.lookups.lock().entry(name).or_default() += 1;
        if self.missing.contains(&name) {
            return Err(BridgeError::MissingSymbol(name));
        }
        if self.null.contains(&name) {
            return Ok(std::ptr::null());
        }
        let address = match name {
            symbols::GET_VERSION => get_version as ffi::GetVersionFn as *const c_void,
            symbols::GET_PLUGIN_NAME => get_plugin_name as ffi::GetPluginNameFn as *const c_void,
            symbols::CSTRING_DROP => cstring_drop as ffi::CStringDropFn as *const c_void,
            symbols::PLUGIN_NEW => plugin_new as ffi::PluginNewFn as *const c_void,
            symbols::PLUGIN_SET_STATE => plugin_set_state as ffi::PluginSetStateFn as *const c_void,
            symbols::PLUGIN_GET_STATE => plugin_get_state as ffi::PluginGetStateFn as *const c_void,
            symbols::PLUGIN_RUN => plugin_run as ffi::PluginRunFn as *const c_void,
            symbols::PLUGIN_DROP => plugin_drop as ffi::PluginDropFn as *const c_void,
            symbols::PLUGIN_UI_NEW => plugin_ui_new as ffi::PluginUiNewFn as *const c_void,
            symbols::PLUGIN_UI_SET_SIZE => {
                plugin_ui_set_size as ffi::PluginUiSetSizeFn as *const c_void
            }
            symbols::PLUGIN_UI_IDLE => plugin_ui_idle as ffi::PluginUiIdleFn as *const c_void,
            symbols::PLUGIN_UI_DROP => plugin_ui_drop as ffi::PluginUiDropFn as *const c_void,
            _ => return Err(BridgeError::MissingSymbol(name)),
        };
        Ok(address)
    }
}

pub struct MockEngine {
    pub engine: Arc<Engine>,
    pub symbols: Arc<MockSymbols>,
    pub stats: Arc<MockStats>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::build(&[], &[])
    }

    /// Engine whose library does not export `missing`.
    pub fn without(missing: &[&'static str]) -> Self {
        Self::build(missing, &[])
    }

    /// Engine whose library exports `null` with a null address.
    pub fn with_null(null: &[&'static str]) -> Self {
        Self::build(&[], null)
    }

    fn build(missing: &[&'static str], null: &[&'static str]) -> Self {
        let stats = Arc::new(MockStats::default());
        CURRENT.with(|current| *current.borrow_mut() = Some(Arc::clone(&stats)));
        let symbols = Arc::new(MockSymbols {
            missing: missing.to_vec(),
            null: null.to_vec(),
            lookups: Mutex::new(HashMap::new()),
        });
        let engine = Arc::new(Engine::new(Arc::clone(&symbols) as Arc<dyn SymbolSource>));
        Self {
            engine,
            symbols,
            stats,
        }
    }
}

/// Host editor base with fixed geometry.
pub struct FakeWindow {
    pub window: NativeWindow,
    pub width: u32,
    pub height: u32,
    pub scale_factor: f64,
}

impl Default for FakeWindow {
    fn default() -> Self {
        Self {
            window: NativeWindow(0xBEEF),
            width: 1080,
            height: 720,
            scale_factor: 1.5,
        }
    }
}

impl UiHost for FakeWindow {
    fn native_window(&self) -> NativeWindow {
        self.window
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn scale_factor(&self) -> f64 {
        self.scale_factor
    }
}

/// Zeroed output buffers plus the pointer array the engine expects.
pub struct Outputs {
    pub channels: Vec<Vec<f32>>,
    pub pointers: Vec<*mut f32>,
}

impl Outputs {
    pub fn new(channels: usize, frames: usize) -> Self {
        let mut channels: Vec<Vec<f32>> = (0..channels).map(|_| vec![0.0; frames]).collect();
        let pointers = channels.iter_mut().map(|c| c.as_mut_ptr()).collect();
        Self { channels, pointers }
    }
}
