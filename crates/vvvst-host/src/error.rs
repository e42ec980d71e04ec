use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while locating, loading or binding the engine library.
///
/// Every variant is fatal for the plug-in instance that hit it: without the
/// engine there is nothing left to forward to.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("engine library not found at {0}")]
    MissingBinary(PathBuf),
    #[error("failed to load engine library: {0}")]
    LibraryLoad(#[from] libloading::Error),
    #[error("unable to determine the plug-in module path: {0}")]
    ModulePath(String),
    #[error("engine library does not export `{0}`")]
    MissingSymbol(&'static str),
    #[error("engine returned a null plug-in instance")]
    NullPlugin,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid bridge settings: {0}")]
    Settings(#[from] serde_json::Error),
}
