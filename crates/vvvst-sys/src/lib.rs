//! Raw bindings for the C ABI exported by the vvvst engine library.
//!
//! Nothing in here is safe to call directly. The engine owns every object
//! behind these pointers; `vvvst-host` wraps them in types that uphold the
//! create/destroy pairing.

#![no_std]

use core::ffi::c_char;
use core::marker::{PhantomData, PhantomPinned};

/// Opaque audio-processing instance owned by the engine.
#[repr(C)]
pub struct Plugin {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// Opaque editor instance owned by the engine.
#[repr(C)]
pub struct PluginUi {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// Engine version reported for host display.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

// Exported as `extern "C-unwind"`; an engine panic may unwind through any of these.
pub type GetVersionFn = unsafe extern "C-unwind" fn() -> Version;
pub type GetPluginNameFn = unsafe extern "C-unwind" fn() -> *const c_char;
pub type CStringDropFn = unsafe extern "C-unwind" fn(s: *mut c_char);
pub type PluginNewFn = unsafe extern "C-unwind" fn() -> *mut Plugin;
pub type PluginSetStateFn =
    unsafe extern "C-unwind" fn(plugin: *const Plugin, state: *const c_char);
pub type PluginGetStateFn = unsafe extern "C-unwind" fn(plugin: *const Plugin) -> *mut c_char;
pub type PluginRunFn = unsafe extern "C-unwind" fn(
    plugin: *const Plugin,
    outputs: *mut *mut f32,
    sample_rate: f32,
    sample_count: usize,
    is_playing: bool,
    current_sample: i64,
);
pub type PluginDropFn = unsafe extern "C-unwind" fn(plugin: *mut Plugin);
pub type PluginUiNewFn = unsafe extern "C-unwind" fn(
    handle: usize,
    plugin: *const Plugin,
    width: usize,
    height: usize,
    scale_factor: f64,
) -> *mut PluginUi;
pub type PluginUiSetSizeFn = unsafe extern "C-unwind" fn(
    plugin_ui: *const PluginUi,
    width: usize,
    height: usize,
    scale_factor: f64,
);
pub type PluginUiIdleFn = unsafe extern "C-unwind" fn(plugin_ui: *const PluginUi);
pub type PluginUiDropFn = unsafe extern "C-unwind" fn(plugin_ui: *mut PluginUi);

/// Exported symbol names, in the order the engine's generated header lists them.
pub mod symbols {
    pub const GET_VERSION: &str = "get_version";
    pub const GET_PLUGIN_NAME: &str = "get_plugin_name";
    pub const CSTRING_DROP: &str = "cstring_drop";
    pub const PLUGIN_NEW: &str = "plugin_new";
    pub const PLUGIN_SET_STATE: &str = "plugin_set_state";
    pub const PLUGIN_GET_STATE: &str = "plugin_get_state";
    pub const PLUGIN_RUN: &str = "plugin_run";
    pub const PLUGIN_DROP: &str = "plugin_drop";
    pub const PLUGIN_UI_NEW: &str = "plugin_ui_new";
    pub const PLUGIN_UI_SET_SIZE: &str = "plugin_ui_set_size";
    pub const PLUGIN_UI_IDLE: &str = "plugin_ui_idle";
    pub const PLUGIN_UI_DROP: &str = "plugin_ui_drop";

    pub const ALL: [&str; 12] = [
        GET_VERSION,
        GET_PLUGIN_NAME,
        CSTRING_DROP,
        PLUGIN_NEW,
        PLUGIN_SET_STATE,
        PLUGIN_GET_STATE,
        PLUGIN_RUN,
        PLUGIN_DROP,
        PLUGIN_UI_NEW,
        PLUGIN_UI_SET_SIZE,
        PLUGIN_UI_IDLE,
        PLUGIN_UI_DROP,
    ];
}

/// Base name of the engine library, without platform prefix or extension.
pub const ENGINE_LIBRARY_NAME: &str = "vvvst_impl";

/// Number of output channels `plugin_run` writes to.
pub const NUM_OUTPUTS: usize = 64;
