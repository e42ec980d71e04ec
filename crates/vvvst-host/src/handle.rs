//! Owners for the two opaque objects the engine hands out.
//!
//! A [`PluginHandle`] is created once per plug-in instance and shared as an
//! `Arc` between the plug-in adapter and any editor. A [`UiHandle`] belongs to
//! exactly one editor and keeps its plug-in alive, so the engine never sees a
//! `plugin_drop` while an editor built on that plug-in still exists. Each
//! wrapper calls the matching destroy operation exactly once, from `Drop`.

use std::ffi::{CStr, CString};
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

use vvvst_sys::{
    Plugin, PluginDropFn, PluginRunFn, PluginUi, PluginUiDropFn, PluginUiIdleFn, PluginUiSetSizeFn,
};

use crate::engine::Engine;
use crate::error::BridgeError;
use crate::host::NativeWindow;

/// Shared owner of one engine plug-in instance.
pub struct PluginHandle {
    raw: NonNull<Plugin>,
    engine: Arc<Engine>,
    run_fn: PluginRunFn,
    drop_fn: PluginDropFn,
}

// The engine synchronizes access to its instances internally; this side only
// ever passes the pointer through.
unsafe impl Send for PluginHandle {}
unsafe impl Sync for PluginHandle {}

impl PluginHandle {
    /// Ask the engine for a new instance.
    pub fn new(engine: Arc<Engine>) -> Result<Arc<Self>, BridgeError> {
        // Bind what the audio thread and teardown need before the instance exists.
        let run_fn = engine.bound.plugin_run()?;
        let drop_fn = engine.bound.plugin_drop()?;
        let raw = NonNull::new(engine.plugin_new()?).ok_or(BridgeError::NullPlugin)?;
        tracing::debug!("engine plug-in instance created");

        Ok(Arc::new(Self {
            raw,
            engine,
            run_fn,
            drop_fn,
        }))
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Borrowed pointer for engine calls that take `const Plugin *`.
    pub fn as_ptr(&self) -> *const Plugin {
        self.raw.as_ptr()
    }

    /// Copy of the engine's current state blob.
    ///
    /// The engine buffer is released with `cstring_drop` before this returns.
    pub fn state(&self) -> Result<CString, BridgeError> {
        let cstring_drop = self.engine.bound.cstring_drop()?;
        let raw = unsafe { self.engine.plugin_get_state(self.as_ptr())? };
        if raw.is_null() {
            return Ok(CString::default());
        }
        let state = unsafe { CStr::from_ptr(raw) }.to_owned();
        unsafe { cstring_drop(raw) };
        tracing::debug!(bytes = state.as_bytes().len(), "exported engine state");
        Ok(state)
    }

    pub fn set_state(&self, state: &CStr) -> Result<(), BridgeError> {
        tracing::debug!(bytes = state.to_bytes().len(), "importing engine state");
        unsafe { self.engine.plugin_set_state(self.as_ptr(), state.as_ptr()) }
    }

    /// Render one block.
    ///
    /// # Safety
    /// `outputs` must point at [`vvvst_sys::NUM_OUTPUTS`] channel buffers, each
    /// valid for `frames` samples.
    #[inline]
    pub unsafe fn run(
        &self,
        outputs: *mut *mut f32,
        sample_rate: f32,
        frames: usize,
        is_playing: bool,
        current_sample: i64,
    ) {
        (self.run_fn)(
            self.as_ptr(),
            outputs,
            sample_rate,
            frames,
            is_playing,
            current_sample,
        );
    }
}

impl Drop for PluginHandle {
    fn drop(&mut self) {
        unsafe { (self.drop_fn)(self.raw.as_ptr()) };
        tracing::debug!("engine plug-in instance dropped");
    }
}

impl fmt::Debug for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHandle")
            .field("raw", &self.raw)
            .finish()
    }
}

/// Exclusive owner of one engine editor.
pub struct UiHandle {
    raw: NonNull<PluginUi>,
    set_size_fn: PluginUiSetSizeFn,
    idle_fn: PluginUiIdleFn,
    drop_fn: PluginUiDropFn,
    // Dropped after `drop_fn` has run.
    plugin: Arc<PluginHandle>,
}

unsafe impl Send for UiHandle {}
unsafe impl Sync for UiHandle {}

impl UiHandle {
    /// Build an editor inside `window`.
    ///
    /// `Ok(None)` means the engine declined, typically because the host has
    /// not finished realizing the window yet. Errors are missing symbols.
    pub fn new(
        window: NativeWindow,
        plugin: &Arc<PluginHandle>,
        width: u32,
        height: u32,
        scale_factor: f64,
    ) -> Result<Option<Self>, BridgeError> {
        let engine = plugin.engine();
        let set_size_fn = engine.bound.plugin_ui_set_size()?;
        let idle_fn = engine.bound.plugin_ui_idle()?;
        let drop_fn = engine.bound.plugin_ui_drop()?;

        let raw = unsafe {
            engine.plugin_ui_new(
                window.0,
                plugin.as_ptr(),
                width as usize,
                height as usize,
                scale_factor,
            )?
        };

        Ok(NonNull::new(raw).map(|raw| Self {
            raw,
            set_size_fn,
            idle_fn,
            drop_fn,
            plugin: Arc::clone(plugin),
        }))
    }

    pub fn plugin(&self) -> &Arc<PluginHandle> {
        &self.plugin
    }

    pub fn set_size(&self, width: u32, height: u32, scale_factor: f64) {
        unsafe {
            (self.set_size_fn)(
                self.raw.as_ptr(),
                width as usize,
                height as usize,
                scale_factor,
            )
        };
    }

    pub fn idle(&self) {
        unsafe { (self.idle_fn)(self.raw.as_ptr()) };
    }
}

impl Drop for UiHandle {
    fn drop(&mut self) {
        unsafe { (self.drop_fn)(self.raw.as_ptr()) };
        tracing::debug!("engine editor dropped");
    }
}

impl fmt::Debug for UiHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UiHandle").field("raw", &self.raw).finish()
    }
}
