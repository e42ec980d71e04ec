//! The contract the host plug-in framework drives.
//!
//! The framework itself (instantiation, audio callbacks, editor windows) is
//! external. These traits are the surface it calls into; the adapters in
//! [`crate::plugin`] and [`crate::ui`] implement them by forwarding to the
//! engine.

use std::ffi::{CStr, CString};

use crate::error::BridgeError;

/// Platform window the host created for the editor (HWND, NSView, X11 window).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NativeWindow(pub usize);

/// Transport information for the current block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimePosition {
    pub playing: bool,
    /// Position in samples at the start of the block.
    pub frame: u64,
}

impl TimePosition {
    /// Some hosts briefly report negative positions, which reach us wrapped
    /// around as huge unsigned values. Reinterpret instead of converting.
    #[inline]
    pub fn signed_frame(&self) -> i64 {
        self.frame as i64
    }
}

/// Per-block timing context supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessContext {
    pub sample_rate: f64,
    pub time: TimePosition,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MidiEvent {
    pub frame: u32,
    pub size: u32,
    pub data: [u8; 4],
}

/// Port description returned from [`PluginCallbacks::init_audio_port`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPort {
    pub group_id: u32,
    pub name: String,
    pub symbol: String,
}

/// Encoding hint attached to a state entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateHint {
    /// The value is opaque binary data encoded as base64.
    Base64Blob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateDescriptor {
    pub key: &'static str,
    pub default_value: &'static str,
    pub hint: StateHint,
}

/// Initial editor geometry advertised to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorSize {
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

/// Static identity the host reads before it creates an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginDescriptor {
    pub name: &'static str,
    pub brand: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub maker: &'static str,
    pub home_page: &'static str,
    pub license: &'static str,
    pub uri: &'static str,
    pub brand_id: [u8; 4],
    pub unique_id: [u8; 4],
    pub clap_id: &'static str,
    pub is_synth: bool,
    pub num_inputs: u32,
    pub num_outputs: u32,
    pub editor: EditorSize,
}

/// Plug-in lifecycle callbacks.
///
/// `run` is called on the realtime thread; everything else on the main thread.
pub trait PluginCallbacks: Send {
    fn descriptor(&self) -> &'static PluginDescriptor;
    /// Version packed as `0x00MMmmpp`.
    fn version(&self) -> u32;

    fn init_audio_port(&self, input: bool, index: u32) -> AudioPort;
    fn init_state(&self, index: u32) -> StateDescriptor;
    fn state(&self, key: &str) -> Result<CString, BridgeError>;
    fn set_state(&mut self, key: &str, value: &CStr) -> Result<(), BridgeError>;

    fn run(
        &mut self,
        inputs: &[*const f32],
        outputs: &mut [*mut f32],
        frames: u32,
        midi_events: &[MidiEvent],
        context: &ProcessContext,
    );
}

/// What the host's editor base exposes to the editor implementation.
pub trait UiHost: Send + Sync {
    fn native_window(&self) -> NativeWindow;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn scale_factor(&self) -> f64;
}

/// Editor lifecycle callbacks. Construction and destruction map to the
/// implementor's constructor and `Drop`.
pub trait UiCallbacks: Send + Sync {
    fn on_resize(&self, width: u32, height: u32);
    fn idle(&self);
    fn parameter_changed(&self, _index: u32, _value: f32) {}
    fn state_changed(&self, _key: &str, _value: &CStr) {}
}
