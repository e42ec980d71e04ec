use std::ffi::c_void;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use once_cell::sync::Lazy;

use crate::config::ResolverConfig;
use crate::engine::SymbolSource;
use crate::error::BridgeError;
use crate::lazy::LazyShared;

/// The mapped engine binary.
pub struct EngineLibrary {
    path: PathBuf,
    library: Library,
}

impl EngineLibrary {
    /// Load the engine library at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BridgeError::MissingBinary(path.to_path_buf()));
        }

        let library = unsafe { Library::new(path) }?;
        tracing::info!(path = %path.display(), "loaded engine library");
        Ok(Self {
            path: path.to_path_buf(),
            library,
        })
    }

    /// Path to the engine dynamic library.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SymbolSource for EngineLibrary {
    fn symbol(&self, name: &'static str) -> Result<*const c_void, BridgeError> {
        let symbol = unsafe { self.library.get::<*const c_void>(name.as_bytes()) }.map_err(|err| {
            tracing::error!(symbol = name, %err, "engine symbol lookup failed");
            BridgeError::MissingSymbol(name)
        })?;
        Ok(*symbol)
    }
}

impl fmt::Debug for EngineLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineLibrary")
            .field("path", &self.path)
            .finish()
    }
}

/// Locates the engine library and loads it at most once.
pub struct LibraryResolver {
    config: ResolverConfig,
    library: LazyShared<EngineLibrary>,
}

impl LibraryResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            library: LazyShared::new(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Full path the engine library is expected at.
    pub fn library_path(&self) -> Result<PathBuf, BridgeError> {
        let dir = match &self.config.library_dir {
            Some(dir) => dir.clone(),
            None => module_dir()?,
        };
        Ok(dir.join(self.config.library_file_name()))
    }

    /// Returns the loaded library, loading it on first use.
    ///
    /// Safe to call from any thread. Once a load succeeds every later call
    /// returns the same library; a failed load is reported and retried by the
    /// next caller.
    pub fn library(&self) -> Result<Arc<EngineLibrary>, BridgeError> {
        self.library
            .get_or_try_init(|| EngineLibrary::load(self.library_path()?))
            .map_err(|err| {
                tracing::error!(%err, "engine library unavailable");
                err
            })
    }

    pub fn is_loaded(&self) -> bool {
        self.library.get().is_some()
    }
}

static RESOLVER: Lazy<LibraryResolver> = Lazy::new(|| LibraryResolver::new(ResolverConfig::load()));

/// The resolver shared by every plug-in instance in this process.
pub fn process_resolver() -> &'static LibraryResolver {
    &RESOLVER
}

/// Loads (or returns the already loaded) process-wide engine library.
pub fn resolve() -> Result<Arc<EngineLibrary>, BridgeError> {
    RESOLVER.library()
}

/// Directory of the module this code is linked into, i.e. the plug-in binary.
pub fn module_dir() -> Result<PathBuf, BridgeError> {
    let path = module_path()?;
    path.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| BridgeError::ModulePath(format!("{} has no parent", path.display())))
}

#[cfg(unix)]
fn module_path() -> Result<PathBuf, BridgeError> {
    use std::ffi::{CStr, OsStr};
    use std::os::unix::ffi::OsStrExt;

    let mut info: libc::Dl_info = unsafe { std::mem::zeroed() };
    let addr = module_path as *const () as *const libc::c_void;
    if unsafe { libc::dladdr(addr, &mut info) } == 0 || info.dli_fname.is_null() {
        return Err(BridgeError::ModulePath(
            "dladdr could not map the plug-in module".into(),
        ));
    }
    let name = unsafe { CStr::from_ptr(info.dli_fname) };
    Ok(PathBuf::from(OsStr::from_bytes(name.to_bytes())))
}

#[cfg(windows)]
fn module_path() -> Result<PathBuf, BridgeError> {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    use windows_sys::Win32::Foundation::HMODULE;
    use windows_sys::Win32::System::LibraryLoader::{
        GetModuleFileNameW, GetModuleHandleExW, GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS,
        GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
    };

    let mut module: HMODULE = 0;
    let addr = module_path as *const () as *const u16;
    let flags =
        GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS | GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT;
    if unsafe { GetModuleHandleExW(flags, addr, &mut module) } == 0 {
        return Err(BridgeError::ModulePath(
            std::io::Error::last_os_error().to_string(),
        ));
    }

    let mut buf = vec![0u16; 1024];
    loop {
        let len = unsafe { GetModuleFileNameW(module, buf.as_mut_ptr(), buf.len() as u32) } as usize;
        if len == 0 {
            return Err(BridgeError::ModulePath(
                std::io::Error::last_os_error().to_string(),
            ));
        }
        // A full buffer means the path was truncated.
        if len < buf.len() {
            buf.truncate(len);
            break;
        }
        buf.resize(buf.len() * 2, 0);
    }
    Ok(PathBuf::from(OsString::from_wide(&buf)))
}
