use vvvst_sys::Version;

use crate::host::{AudioPort, EditorSize, PluginDescriptor, StateDescriptor, StateHint};

pub const BRAND: &str = "Voicevox";
pub const NAME: &str = if cfg!(debug_assertions) {
    "VOICEVOX (Debug)"
} else {
    "VOICEVOX"
};
pub const LABEL: &str = if cfg!(debug_assertions) {
    "vvvst_debug"
} else {
    "vvvst"
};
pub const DESCRIPTION: &str = "VST plugin for Voicevox.";
pub const MAKER: &str = "Nanashi. (https://sevenc7c.com)";
pub const HOME_PAGE: &str = "https://github.com/sevenc-nanashi/vvvst-dpf-rust/";
pub const LICENSE: &str = "LGPLv3";
pub const URI: &str = "https://github.com/sevenc-nanashi/vvvst-dpf-rust/";
pub const BRAND_ID: [u8; 4] = *b"ScNs";
pub const UNIQUE_ID: [u8; 4] = if cfg!(debug_assertions) {
    *b"VvsD"
} else {
    *b"Vvst"
};
pub const CLAP_ID: &str = if cfg!(debug_assertions) {
    "com.sevenc-nanashi.vvvst-dpf-rust-debug"
} else {
    "com.sevenc-nanashi.vvvst-dpf-rust"
};

pub const IS_SYNTH: bool = true;
pub const NUM_INPUTS: u32 = 0;
pub const NUM_OUTPUTS: u32 = vvvst_sys::NUM_OUTPUTS as u32;

pub const UI_DEFAULT_WIDTH: u32 = 1080;
pub const UI_DEFAULT_HEIGHT: u32 = 720;
pub const UI_USER_RESIZABLE: bool = true;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    name: NAME,
    brand: BRAND,
    label: LABEL,
    description: DESCRIPTION,
    maker: MAKER,
    home_page: HOME_PAGE,
    license: LICENSE,
    uri: URI,
    brand_id: BRAND_ID,
    unique_id: UNIQUE_ID,
    clap_id: CLAP_ID,
    is_synth: IS_SYNTH,
    num_inputs: NUM_INPUTS,
    num_outputs: NUM_OUTPUTS,
    editor: EditorSize {
        width: UI_DEFAULT_WIDTH,
        height: UI_DEFAULT_HEIGHT,
        resizable: UI_USER_RESIZABLE,
    },
};

/// Key of the single state entry carrying the engine blob.
pub const STATE_KEY: &str = "state";

/// Pack an engine version into the host's `0x00MMmmpp` word.
pub fn packed_version(version: Version) -> u32 {
    (u32::from(version.major) << 16) | (u32::from(version.minor) << 8) | u32::from(version.patch)
}

/// Ports come in stereo pairs: `Channel 1` covers indices 0 and 1, and so on.
pub fn audio_port(index: u32) -> AudioPort {
    let channel = index / 2 + 1;
    AudioPort {
        group_id: index / 2,
        name: format!("Channel {channel}"),
        symbol: format!("channel_{channel}"),
    }
}

pub fn state_descriptor() -> StateDescriptor {
    StateDescriptor {
        key: STATE_KEY,
        default_value: "",
        hint: StateHint::Base64Blob,
    }
}
