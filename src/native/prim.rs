use std::collections::BTreeSet;
use std::ffi::{c_char, CString};

use super::NativeCore;
use crate::prim::PrimController;

type SetEnabledFn = unsafe extern "C" fn(bool);
type IsEnabledFn = unsafe extern "C" fn() -> bool;
type SetBlacklistFn = unsafe extern "C" fn(*const *const c_char, usize);

/// Prim state owned by the native core.
#[derive(Clone, Copy)]
pub struct NativePrimController<'core> {
    _core: &'core NativeCore,
    set_fwd: SetEnabledFn,
    set_bwd: SetEnabledFn,
    set_eager: SetEnabledFn,
    set_all: SetEnabledFn,
    is_fwd: IsEnabledFn,
    is_bwd: IsEnabledFn,
    is_eager: IsEnabledFn,
    set_bwd_blacklist: SetBlacklistFn,
}

impl<'core> NativePrimController<'core> {
    /// `None` if the core lacks any prim entry point.
    pub fn new(core: &'core NativeCore) -> Option<Self> {
        // SAFETY: signatures fixed by the core's C ABI.
        unsafe {
            Some(Self {
                _core: core,
                set_fwd: core.function("__set_fwd_prim_enabled")?,
                set_bwd: core.function("__set_bwd_prim_enabled")?,
                set_eager: core.function("__set_eager_prim_enabled")?,
                set_all: core.function("__set_all_prim_enabled")?,
                is_fwd: core.function("_is_fwd_prim_enabled")?,
                is_bwd: core.function("_is_bwd_prim_enabled")?,
                is_eager: core.function("_is_eager_prim_enabled")?,
                set_bwd_blacklist: core.function("_set_bwd_prim_blacklist")?,
            })
        }
    }
}

impl std::fmt::Debug for NativePrimController<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativePrimController")
            .field("core", &self._core.path())
            .finish_non_exhaustive()
    }
}

impl PrimController for NativePrimController<'_> {
    fn set_fwd_prim_enabled(&mut self, enabled: bool) {
        unsafe { (self.set_fwd)(enabled) }
    }

    fn set_bwd_prim_enabled(&mut self, enabled: bool) {
        unsafe { (self.set_bwd)(enabled) }
    }

    fn set_eager_prim_enabled(&mut self, enabled: bool) {
        unsafe { (self.set_eager)(enabled) }
    }

    fn set_all_prim_enabled(&mut self, enabled: bool) {
        unsafe { (self.set_all)(enabled) }
    }

    fn is_fwd_prim_enabled(&self) -> bool {
        unsafe { (self.is_fwd)() }
    }

    fn is_bwd_prim_enabled(&self) -> bool {
        unsafe { (self.is_bwd)() }
    }

    fn is_eager_prim_enabled(&self) -> bool {
        unsafe { (self.is_eager)() }
    }

    fn set_bwd_prim_blacklist(&mut self, ops: &BTreeSet<String>) {
        // Op names never contain NUL; any that do cannot name a real op.
        let names: Vec<CString> = ops.iter().filter_map(|op| CString::new(op.as_str()).ok()).collect();
        let ptrs: Vec<*const c_char> = names.iter().map(|n| n.as_ptr()).collect();
        unsafe { (self.set_bwd_blacklist)(ptrs.as_ptr(), ptrs.len()) }
    }
}
