use std::ffi::{CStr, CString};
use std::sync::Arc;

use vvvst_sys::Version;

use crate::engine::Engine;
use crate::error::BridgeError;
use crate::handle::PluginHandle;
use crate::host::{
    AudioPort, MidiEvent, PluginCallbacks, PluginDescriptor, ProcessContext, StateDescriptor,
};
use crate::info;
use crate::library::LibraryResolver;

/// Host plug-in instance backed by one engine plug-in.
#[derive(Debug)]
pub struct EnginePlugin {
    handle: Arc<PluginHandle>,
    version: Version,
}

impl EnginePlugin {
    /// Create an instance on the process-wide engine, loading it if needed.
    ///
    /// Fails when the engine library cannot be found, loaded or bound; the
    /// host should treat that as a failed instantiation.
    pub fn new() -> Result<Self, BridgeError> {
        Self::with_engine(Engine::process()?)
    }

    /// Create an instance on an engine bound to the library `resolver` loads.
    pub fn with_resolver(resolver: &LibraryResolver) -> Result<Self, BridgeError> {
        Self::with_engine(Arc::new(Engine::load(resolver)?))
    }

    pub fn with_engine(engine: Arc<Engine>) -> Result<Self, BridgeError> {
        let version = engine.get_version()?;
        let handle = PluginHandle::new(engine)?;
        tracing::info!(?version, "plug-in instance created");
        Ok(Self { handle, version })
    }

    /// The shared engine instance. Editors keep a clone of this.
    pub fn handle(&self) -> &Arc<PluginHandle> {
        &self.handle
    }

    pub fn engine_version(&self) -> Version {
        self.version
    }

    pub fn engine_name(&self) -> Result<String, BridgeError> {
        self.handle.engine().plugin_name()
    }
}

impl PluginCallbacks for EnginePlugin {
    fn descriptor(&self) -> &'static PluginDescriptor {
        &info::DESCRIPTOR
    }

    fn version(&self) -> u32 {
        info::packed_version(self.version)
    }

    fn init_audio_port(&self, _input: bool, index: u32) -> AudioPort {
        info::audio_port(index)
    }

    fn init_state(&self, _index: u32) -> StateDescriptor {
        info::state_descriptor()
    }

    fn state(&self, _key: &str) -> Result<CString, BridgeError> {
        self.handle.state()
    }

    fn set_state(&mut self, _key: &str, value: &CStr) -> Result<(), BridgeError> {
        self.handle.set_state(value)
    }

    fn run(
        &mut self,
        _inputs: &[*const f32],
        outputs: &mut [*mut f32],
        frames: u32,
        _midi_events: &[MidiEvent],
        context: &ProcessContext,
    ) {
        debug_assert!(
            outputs.len() >= vvvst_sys::NUM_OUTPUTS,
            "host supplied {} output channels, the engine writes {}",
            outputs.len(),
            vvvst_sys::NUM_OUTPUTS
        );
        // The engine always writes every output channel.
        if outputs.len() < vvvst_sys::NUM_OUTPUTS {
            return;
        }
        unsafe {
            self.handle.run(
                outputs.as_mut_ptr(),
                context.sample_rate as f32,
                frames as usize,
                context.time.playing,
                context.time.signed_frame(),
            );
        }
    }
}
