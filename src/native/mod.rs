//! Loading the native core.
//!
//! The core is opened with `libloading` the same way the GPU runtimes are
//! loaded elsewhere: the library handle lives as long as the owning struct
//! and typed entry points are copied out of it on demand.

pub mod exports;
pub mod prim;

use std::ffi::{c_char, CString};
use std::path::{Path, PathBuf};

use libloading::Library;

use crate::error::{import_hint, BootstrapError, BootstrapResult};
use crate::platform::Platform;

pub use exports::{ExportTable, ExportedSymbol, SymbolGroup, DEFAULT_ALIASES, DEFAULT_GROUPS};
pub use prim::NativePrimController;

type IsCompiledWithAvxFn = unsafe extern "C" fn() -> bool;
type SetLibPathFn = unsafe extern "C" fn(*const c_char);

/// An opened native core and the symbols re-exported from it.
#[derive(Debug)]
pub struct NativeCore {
    path: PathBuf,
    exports: ExportTable,
    lib: Library,
}

impl NativeCore {
    /// Open the core. Failure is fatal and carries a remediation hint.
    pub fn open(path: &Path, platform: Platform) -> BootstrapResult<Self> {
        // SAFETY: the native core's initialisers only register its own ops.
        let lib = unsafe { Library::new(path) }.map_err(|source| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.display().to_string()));
            BootstrapError::CoreOpen {
                path: path.to_path_buf(),
                hint: import_hint(platform.is_windows(), exe_dir.as_deref()),
                source,
            }
        })?;
        log::info!("opened native core {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            exports: ExportTable::default(),
            lib,
        })
    }

    /// Resolve the exported symbol groups and apply the aliases.
    pub fn resolve_exports(
        &mut self,
        groups: &[SymbolGroup],
        aliases: &[(&'static str, &'static str)],
    ) -> BootstrapResult<()> {
        let mut table = ExportTable::resolve(&self.lib, &self.path, groups)?;
        table.apply_aliases(aliases);
        self.exports = table;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exports(&self) -> &ExportTable {
        &self.exports
    }

    /// Copy out a typed entry point.
    ///
    /// # Safety
    /// `F` must match the symbol's real signature.
    pub unsafe fn function<F: Copy>(&self, name: &str) -> Option<F> {
        self.lib.get::<F>(name.as_bytes()).ok().map(|sym| *sym)
    }

    /// Whether the core was built with AVX kernels, if it says.
    pub fn is_compiled_with_avx(&self) -> Option<bool> {
        // SAFETY: signature fixed by the core's C ABI.
        let f = unsafe { self.function::<IsCompiledWithAvxFn>("is_compiled_with_avx") }?;
        Some(unsafe { f() })
    }

    /// Hand the install `libs` directory to the core. Returns `false` when
    /// the core has no such entry point or the path is not representable.
    pub fn set_lib_path(&self, dir: &Path) -> bool {
        let Ok(c_dir) = CString::new(dir.to_string_lossy().into_owned()) else {
            return false;
        };
        // SAFETY: signature fixed by the core's C ABI.
        match unsafe { self.function::<SetLibPathFn>("_set_paddle_lib_path") } {
            Some(f) => {
                unsafe { f(c_dir.as_ptr()) };
                log::debug!("lib path set to {}", dir.display());
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_core_reports_hint() {
        let err = NativeCore::open(Path::new("/nonexistent/libpaddle.so"), Platform::Linux).unwrap_err();
        match &err {
            BootstrapError::CoreOpen { path, hint, .. } => {
                assert_eq!(path, Path::new("/nonexistent/libpaddle.so"));
                assert!(hint.contains("LD_LIBRARY_PATH"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(err.to_string().contains("failed to open native core"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn foreign_library_has_no_build_info() {
        let core = NativeCore::open(Path::new("libc.so.6"), Platform::Linux).unwrap();
        assert_eq!(core.is_compiled_with_avx(), None);
        assert!(!core.set_lib_path(Path::new("/tmp")));
        assert!(core.exports().is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn resolve_fails_on_foreign_library() {
        let mut core = NativeCore::open(Path::new("libc.so.6"), Platform::Linux).unwrap();
        let err = core.resolve_exports(DEFAULT_GROUPS, DEFAULT_ALIASES).unwrap_err();
        assert!(matches!(err, BootstrapError::MissingSymbol { group: "core", .. }));
    }
}
