use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Overrides the directory the engine library is loaded from.
pub const ENGINE_DIR_ENV: &str = "VVVST_ENGINE_DIR";
/// Overrides the engine library base name.
pub const ENGINE_NAME_ENV: &str = "VVVST_ENGINE_NAME";

/// Where the resolver looks for the engine library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Directory holding the engine library. `None` means next to the
    /// plug-in module itself.
    pub library_dir: Option<PathBuf>,
    /// Base library name; the platform prefix and extension are added on load.
    pub library_name: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            library_dir: None,
            library_name: vvvst_sys::ENGINE_LIBRARY_NAME.to_string(),
        }
    }
}

/// Persisted bridge settings stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSettings {
    pub engine_dir: Option<PathBuf>,
    pub library_name: Option<String>,
}

impl BridgeSettings {
    pub fn read(path: &Path) -> Result<Option<Self>, BridgeError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

/// `<config dir>/voicevox_vst`, shared with the engine's own data.
pub fn data_dir() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("voicevox_vst"))
}

pub fn settings_path() -> Option<PathBuf> {
    Some(data_dir()?.join("bridge.json"))
}

impl ResolverConfig {
    /// Defaults, then the settings file, then the environment.
    pub fn load() -> Self {
        let mut config = Self::default();
        if let Some(path) = settings_path() {
            match BridgeSettings::read(&path) {
                Ok(Some(settings)) => config.apply_settings(settings),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "ignoring bridge settings")
                }
            }
        }
        config.apply_env(|key| std::env::var_os(key));
        config
    }

    pub fn apply_settings(&mut self, settings: BridgeSettings) {
        if let Some(dir) = settings.engine_dir {
            self.library_dir = Some(dir);
        }
        if let Some(name) = settings.library_name.filter(|name| !name.is_empty()) {
            self.library_name = name;
        }
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<OsString>) {
        if let Some(dir) = var(ENGINE_DIR_ENV).filter(|dir| !dir.is_empty()) {
            self.library_dir = Some(PathBuf::from(dir));
        }
        if let Some(name) = var(ENGINE_NAME_ENV).and_then(|name| name.into_string().ok()) {
            if !name.is_empty() {
                self.library_name = name;
            }
        }
    }

    /// Platform file name, e.g. `libvvvst_impl.so` or `vvvst_impl.dll`.
    pub fn library_file_name(&self) -> OsString {
        libloading::library_filename(&self.library_name)
    }
}
