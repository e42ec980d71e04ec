//! Host-side shell for the vvvst engine.
//!
//! The plug-in binary contains no audio, state or editor logic of its own.
//! Everything is forwarded to an engine library that is located next to the
//! plug-in module and loaded on first use. This crate provides:
//!
//! - [`LibraryResolver`]: finds and loads that library once per process.
//! - [`Engine`]: resolves the exported C operations lazily into typed calls.
//! - [`PluginHandle`] / [`UiHandle`]: owners for the engine's opaque objects
//!   that call the matching destroy operation exactly once.
//! - [`EnginePlugin`] / [`EngineUi`]: the host-facing adapters.

mod config;
mod engine;
mod error;
pub mod handle;
pub mod host;
pub mod info;
mod lazy;
mod library;
mod plugin;
mod ui;

pub use config::{
    data_dir, settings_path, BridgeSettings, ResolverConfig, ENGINE_DIR_ENV, ENGINE_NAME_ENV,
};
pub use engine::{Engine, SymbolSource};
pub use error::BridgeError;
pub use handle::{PluginHandle, UiHandle};
pub use host::{
    AudioPort, EditorSize, MidiEvent, NativeWindow, PluginCallbacks, PluginDescriptor,
    ProcessContext, StateDescriptor, StateHint, TimePosition, UiCallbacks, UiHost,
};
pub use lazy::LazyShared;
pub use library::{module_dir, process_resolver, resolve, EngineLibrary, LibraryResolver};
pub use plugin::EnginePlugin;
pub use ui::{EngineUi, RetryState};

/// Re-export the raw bindings for users that need to drop down to the ABI.
pub use vvvst_sys as ffi;
