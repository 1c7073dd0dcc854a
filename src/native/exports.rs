//! Symbol groups exported by the native core and the resolved export table.

use std::collections::BTreeMap;
use std::ffi::c_void;
use std::path::Path;

use libloading::Library;

use crate::error::{BootstrapError, BootstrapResult};

/// A named set of symbols the core must (or may) export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolGroup {
    pub name: &'static str,
    pub symbols: &'static [&'static str],
    pub required: bool,
    /// Only exported by non-Windows builds.
    pub unix_only: bool,
}

impl SymbolGroup {
    pub fn applies_here(&self) -> bool {
        !self.unix_only || cfg!(not(windows))
    }
}

pub const CORE_SYMBOLS: SymbolGroup = SymbolGroup {
    name: "core",
    symbols: &[
        "__unittest_throw_exception__",
        "_append_python_callable_object_and_return_id",
        "_cleanup",
        "_create_loaded_parameter",
        "_cuda_synchronize",
        "_device_synchronize",
        "_dygraph_debug_level",
        "_get_all_register_op_kernels",
        "_get_amp_attrs",
        "_get_amp_op_list",
        "_get_current_stream",
        "_get_eager_deletion_vars",
        "_get_phi_kernel_name",
        "_get_registered_phi_kernels",
        "_get_use_default_grad_op_desc_maker_ops",
        "_is_compiled_with_heterps",
        "_is_dygraph_debug_enabled",
        "_is_program_version_supported",
        "_Profiler",
        "_ProfilerResult",
        "_promote_types_if_complex_exists",
        "_RecordEvent",
        "_Scope",
        "_set_amp_op_list",
        "_set_cached_executor_build_strategy",
        "_set_current_stream",
        "_set_eager_deletion_mode",
        "_set_fuse_parameter_group_size",
        "_set_fuse_parameter_memory_size",
        "_set_paddle_lib_path",
        "_set_warmup",
        "_switch_tracer",
        "_test_enforce_gpu_success",
        "_xpu_device_synchronize",
        "Tensor",
    ],
    required: true,
    unix_only: false,
};

pub const CUSTOM_DEVICE_SYMBOLS: SymbolGroup = SymbolGroup {
    name: "custom_device",
    symbols: &[
        "CustomDeviceEvent",
        "CustomDeviceStream",
        "_get_current_custom_device_stream",
        "_set_current_custom_device_stream",
        "_synchronize_custom_device",
    ],
    required: true,
    unix_only: false,
};

pub const PRIM_SYMBOLS: SymbolGroup = SymbolGroup {
    name: "prim",
    symbols: &[
        "__set_all_prim_enabled",
        "__set_bwd_prim_enabled",
        "__set_eager_prim_enabled",
        "__set_fwd_prim_enabled",
        "_add_skip_comp_ops",
        "_is_bwd_prim_enabled",
        "_is_eager_prim_enabled",
        "_is_fwd_prim_enabled",
        "_remove_skip_comp_ops",
        "_set_bwd_prim_blacklist",
        "_set_prim_target_grad_name",
    ],
    required: true,
    unix_only: false,
};

pub const TYPE_PROMOTION_SYMBOLS: SymbolGroup = SymbolGroup {
    name: "type_promotion",
    symbols: &["need_type_promotion", "get_promote_dtype"],
    required: true,
    unix_only: false,
};

pub const SHARED_MEMORY_SYMBOLS: SymbolGroup = SymbolGroup {
    name: "shared_memory",
    symbols: &[
        "_array_to_share_memory_tensor",
        "_cleanup_mmap_fds",
        "_convert_to_tensor_list",
        "_erase_process_pids",
        "_remove_tensor_list_mmap_fds",
        "_set_max_memory_map_allocation_pool_size",
        "_set_process_pids",
        "_set_process_signal_handler",
        "_throw_error_if_process_failed",
    ],
    required: true,
    unix_only: true,
};

pub const CINN_SYMBOLS: SymbolGroup = SymbolGroup {
    name: "cinn",
    symbols: &["is_run_with_cinn"],
    required: true,
    unix_only: false,
};

/// `is_compiled_with_avx`; older cores may lack it.
pub const BUILD_INFO_SYMBOLS: SymbolGroup = SymbolGroup {
    name: "build_info",
    symbols: &["is_compiled_with_avx"],
    required: false,
    unix_only: false,
};

pub const DEFAULT_GROUPS: &[SymbolGroup] = &[
    CORE_SYMBOLS,
    CUSTOM_DEVICE_SYMBOLS,
    PRIM_SYMBOLS,
    TYPE_PROMOTION_SYMBOLS,
    SHARED_MEMORY_SYMBOLS,
    CINN_SYMBOLS,
    BUILD_INFO_SYMBOLS,
];

/// `(alias, target)` pairs added after resolution. Every target is in a
/// required default group.
pub const DEFAULT_ALIASES: &[(&str, &str)] = &[("LoDTensor", "Tensor")];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportedSymbol {
    pub group: &'static str,
    /// Address inside the owning library; only valid while it stays loaded.
    pub addr: usize,
}

impl ExportedSymbol {
    pub fn as_ptr(&self) -> *const c_void {
        self.addr as *const c_void
    }
}

/// Names re-exported from the native core.
#[derive(Debug, Clone, Default)]
pub struct ExportTable {
    symbols: BTreeMap<&'static str, ExportedSymbol>,
}

impl ExportTable {
    /// Resolve every group applicable on this platform. A missing symbol in a
    /// required group is fatal; optional groups keep what they find.
    pub fn resolve(lib: &Library, lib_path: &Path, groups: &[SymbolGroup]) -> BootstrapResult<Self> {
        let mut table = Self::default();
        for group in groups.iter().filter(|g| g.applies_here()) {
            for &name in group.symbols {
                // SAFETY: only the symbol address is read, nothing is called.
                let found = unsafe { lib.get::<*mut c_void>(name.as_bytes()) };
                match found {
                    Ok(sym) => {
                        table.symbols.insert(
                            name,
                            ExportedSymbol {
                                group: group.name,
                                addr: *sym as usize,
                            },
                        );
                    }
                    Err(e) if group.required => {
                        log::debug!("{name}: {e}");
                        return Err(BootstrapError::MissingSymbol {
                            path: lib_path.to_path_buf(),
                            group: group.name,
                            symbol: name.to_string(),
                        });
                    }
                    Err(_) => log::debug!("optional symbol {name} not exported"),
                }
            }
        }
        log::debug!("resolved {} exports from {}", table.len(), lib_path.display());
        Ok(table)
    }

    /// Make `alias` refer to the same symbol as `target`. Returns `false`
    /// when `target` was not exported.
    pub fn alias(&mut self, alias: &'static str, target: &str) -> bool {
        match self.symbols.get(target).copied() {
            Some(sym) => {
                self.symbols.insert(alias, sym);
                true
            }
            None => false,
        }
    }

    pub fn apply_aliases(&mut self, aliases: &[(&'static str, &'static str)]) {
        for &(alias, target) in aliases {
            if !self.alias(alias, target) {
                log::debug!("alias {alias} skipped, {target} not exported");
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ExportedSymbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.symbols.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
