use std::ffi::{c_char, c_void, CStr};
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use vvvst_sys::{
    symbols, CStringDropFn, GetPluginNameFn, GetVersionFn, Plugin, PluginDropFn, PluginGetStateFn,
    PluginNewFn, PluginRunFn, PluginSetStateFn, PluginUi, PluginUiDropFn, PluginUiIdleFn,
    PluginUiNewFn, PluginUiSetSizeFn, Version,
};

use crate::error::BridgeError;
use crate::lazy::LazyShared;
use crate::library::{self, LibraryResolver};

/// Anything symbols can be looked up in. Implemented by [`library::EngineLibrary`].
pub trait SymbolSource: Send + Sync {
    /// Address of the exported symbol `name`.
    fn symbol(&self, name: &'static str) -> Result<*const c_void, BridgeError>;
}

macro_rules! bound_symbols {
    ($($field:ident: $ty:ty = $name:expr;)*) => {
        /// One lazily resolved function pointer per exported operation.
        pub(crate) struct BoundSymbols {
            source: Arc<dyn SymbolSource>,
            $($field: OnceCell<$ty>,)*
        }

        impl BoundSymbols {
            fn new(source: Arc<dyn SymbolSource>) -> Self {
                Self {
                    source,
                    $($field: OnceCell::new(),)*
                }
            }

            $(
                pub(crate) fn $field(&self) -> Result<$ty, BridgeError> {
                    self.$field
                        .get_or_try_init(|| {
                            let address = self.source.symbol($name)?;
                            if address.is_null() {
                                tracing::error!(symbol = $name, "engine exports a null symbol");
                                return Err(BridgeError::MissingSymbol($name));
                            }
                            Ok(unsafe { std::mem::transmute::<*const c_void, $ty>(address) })
                        })
                        .copied()
                }
            )*

            fn missing(&self) -> Vec<&'static str> {
                let mut missing = Vec::new();
                $(
                    if self.$field().is_err() {
                        missing.push($name);
                    }
                )*
                missing
            }
        }
    };
}

bound_symbols! {
    get_version: GetVersionFn = symbols::GET_VERSION;
    get_plugin_name: GetPluginNameFn = symbols::GET_PLUGIN_NAME;
    cstring_drop: CStringDropFn = symbols::CSTRING_DROP;
    plugin_new: PluginNewFn = symbols::PLUGIN_NEW;
    plugin_set_state: PluginSetStateFn = symbols::PLUGIN_SET_STATE;
    plugin_get_state: PluginGetStateFn = symbols::PLUGIN_GET_STATE;
    plugin_run: PluginRunFn = symbols::PLUGIN_RUN;
    plugin_drop: PluginDropFn = symbols::PLUGIN_DROP;
    plugin_ui_new: PluginUiNewFn = symbols::PLUGIN_UI_NEW;
    plugin_ui_set_size: PluginUiSetSizeFn = symbols::PLUGIN_UI_SET_SIZE;
    plugin_ui_idle: PluginUiIdleFn = symbols::PLUGIN_UI_IDLE;
    plugin_ui_drop: PluginUiDropFn = symbols::PLUGIN_UI_DROP;
}

/// Typed entry points into the engine library.
///
/// Each operation is resolved the first time it is called and cached for the
/// lifetime of the engine. The wrappers return whatever the engine returned;
/// ownership rules for the pointers involved are documented on
/// [`crate::handle`], which is the only intended caller.
pub struct Engine {
    pub(crate) bound: BoundSymbols,
}

static PROCESS_ENGINE: LazyShared<Engine> = LazyShared::new();

impl Engine {
    pub fn new(source: Arc<dyn SymbolSource>) -> Self {
        Self {
            bound: BoundSymbols::new(source),
        }
    }

    /// Bind to the library the given resolver loads.
    pub fn load(resolver: &LibraryResolver) -> Result<Self, BridgeError> {
        let library = resolver.library()?;
        Ok(Self::new(library))
    }

    /// The engine bound to the process-wide library.
    pub fn process() -> Result<Arc<Engine>, BridgeError> {
        PROCESS_ENGINE.get_or_try_init(|| Engine::load(library::process_resolver()))
    }

    /// Names of exported operations that cannot be resolved. Resolving them
    /// here also primes the cache.
    pub fn missing_symbols(&self) -> Vec<&'static str> {
        self.bound.missing()
    }

    pub fn get_version(&self) -> Result<Version, BridgeError> {
        let get_version = self.bound.get_version()?;
        Ok(unsafe { get_version() })
    }

    /// The returned string is engine-owned; release it with [`Engine::cstring_drop`].
    pub fn get_plugin_name(&self) -> Result<*const c_char, BridgeError> {
        let get_plugin_name = self.bound.get_plugin_name()?;
        Ok(unsafe { get_plugin_name() })
    }

    /// # Safety
    /// `s` must be null or a string handed out by this engine and not yet released.
    pub unsafe fn cstring_drop(&self, s: *mut c_char) -> Result<(), BridgeError> {
        let cstring_drop = self.bound.cstring_drop()?;
        cstring_drop(s);
        Ok(())
    }

    /// Copy of the engine's display name; the engine buffer is released before returning.
    pub fn plugin_name(&self) -> Result<String, BridgeError> {
        let cstring_drop = self.bound.cstring_drop()?;
        let raw = self.get_plugin_name()?;
        if raw.is_null() {
            return Ok(String::new());
        }
        let name = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
        unsafe { cstring_drop(raw as *mut c_char) };
        Ok(name)
    }

    pub fn plugin_new(&self) -> Result<*mut Plugin, BridgeError> {
        let plugin_new = self.bound.plugin_new()?;
        Ok(unsafe { plugin_new() })
    }

    /// # Safety
    /// `plugin` must be a live handle from [`Engine::plugin_new`] and `state`
    /// a valid NUL-terminated string.
    pub unsafe fn plugin_set_state(
        &self,
        plugin: *const Plugin,
        state: *const c_char,
    ) -> Result<(), BridgeError> {
        let plugin_set_state = self.bound.plugin_set_state()?;
        plugin_set_state(plugin, state);
        Ok(())
    }

    /// # Safety
    /// `plugin` must be a live handle. The result is engine-owned.
    pub unsafe fn plugin_get_state(&self, plugin: *const Plugin) -> Result<*mut c_char, BridgeError> {
        let plugin_get_state = self.bound.plugin_get_state()?;
        Ok(plugin_get_state(plugin))
    }

    /// # Safety
    /// `plugin` must be a live handle and `outputs` must point at
    /// [`vvvst_sys::NUM_OUTPUTS`] buffers of at least `sample_count` samples.
    pub unsafe fn plugin_run(
        &self,
        plugin: *const Plugin,
        outputs: *mut *mut f32,
        sample_rate: f32,
        sample_count: usize,
        is_playing: bool,
        current_sample: i64,
    ) -> Result<(), BridgeError> {
        let plugin_run = self.bound.plugin_run()?;
        plugin_run(
            plugin,
            outputs,
            sample_rate,
            sample_count,
            is_playing,
            current_sample,
        );
        Ok(())
    }

    /// # Safety
    /// `plugin` must be a live handle; it is dangling afterwards.
    pub unsafe fn plugin_drop(&self, plugin: *mut Plugin) -> Result<(), BridgeError> {
        let plugin_drop = self.bound.plugin_drop()?;
        plugin_drop(plugin);
        Ok(())
    }

    /// # Safety
    /// `plugin` must be a live handle and `handle` a native window the host owns.
    pub unsafe fn plugin_ui_new(
        &self,
        handle: usize,
        plugin: *const Plugin,
        width: usize,
        height: usize,
        scale_factor: f64,
    ) -> Result<*mut PluginUi, BridgeError> {
        let plugin_ui_new = self.bound.plugin_ui_new()?;
        Ok(plugin_ui_new(handle, plugin, width, height, scale_factor))
    }

    /// # Safety
    /// `plugin_ui` must be a live editor handle.
    pub unsafe fn plugin_ui_set_size(
        &self,
        plugin_ui: *const PluginUi,
        width: usize,
        height: usize,
        scale_factor: f64,
    ) -> Result<(), BridgeError> {
        let plugin_ui_set_size = self.bound.plugin_ui_set_size()?;
        plugin_ui_set_size(plugin_ui, width, height, scale_factor);
        Ok(())
    }

    /// # Safety
    /// `plugin_ui` must be a live editor handle.
    pub unsafe fn plugin_ui_idle(&self, plugin_ui: *const PluginUi) -> Result<(), BridgeError> {
        let plugin_ui_idle = self.bound.plugin_ui_idle()?;
        plugin_ui_idle(plugin_ui);
        Ok(())
    }

    /// # Safety
    /// `plugin_ui` must be a live editor handle; it is dangling afterwards.
    pub unsafe fn plugin_ui_drop(&self, plugin_ui: *mut PluginUi) -> Result<(), BridgeError> {
        let plugin_ui_drop = self.bound.plugin_ui_drop()?;
        plugin_ui_drop(plugin_ui);
        Ok(())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}
