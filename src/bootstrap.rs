//! The startup sequence.

use std::path::{Path, PathBuf};

use crate::cpu::{avx_core_unsupported, avx_mismatch, probe_avx, AvxReport};
use crate::discovery::{augment_dll_search_path, resolve_lib_dir, set_custom_device_root};
use crate::env::EnvSource;
use crate::error::{Advisory, BootstrapError, BootstrapResult, FlagError, Outcome};
use crate::flags::{FeatureFlags, CUSTOM_DEVICE_ROOT};
use crate::libc::{detect_libc, LibcInfo};
use crate::native::{NativeCore, NativePrimController};
use crate::options::BootstrapOptions;
use crate::platform::Platform;
use crate::preload::{PreloadedDso, StaticTlsWorkaround};
use crate::prim::{check_and_set_prim_all_enabled, PrimConfig};
use crate::report::BootstrapReport;
use crate::shell::CommandRunner;

/// A usable native core plus everything the bootstrap decided on the way.
#[derive(Debug)]
pub struct Runtime {
    // Dropped before the preloaded helpers it links against.
    core: NativeCore,
    preloaded: Vec<PreloadedDso>,
    prim: PrimConfig,
    platform: Platform,
    libc: Option<LibcInfo>,
    avx: AvxReport,
    lib_dir: Option<PathBuf>,
    custom_device_root: Option<String>,
    flags: FeatureFlags,
}

impl Runtime {
    pub fn core(&self) -> &NativeCore {
        &self.core
    }

    pub fn preloaded(&self) -> &[PreloadedDso] {
        &self.preloaded
    }

    pub fn prim_config(&self) -> &PrimConfig {
        &self.prim
    }

    pub fn prim_config_mut(&mut self) -> &mut PrimConfig {
        &mut self.prim
    }

    pub fn libc(&self) -> Option<&LibcInfo> {
        self.libc.as_ref()
    }

    pub fn avx(&self) -> AvxReport {
        self.avx
    }

    pub fn lib_dir(&self) -> Option<&Path> {
        self.lib_dir.as_deref()
    }

    pub fn flags(&self) -> FeatureFlags {
        self.flags
    }

    pub fn prim_controller(&self) -> Option<NativePrimController<'_>> {
        NativePrimController::new(&self.core)
    }

    /// Apply `FLAGS_prim_*` to the core's prim state.
    pub fn sync_prim_flags(&self, env: &dyn EnvSource) -> Result<(), FlagError> {
        match self.prim_controller() {
            Some(mut ctl) => check_and_set_prim_all_enabled(env, &mut ctl),
            None => {
                log::warn!("native core exposes no prim controller, FLAGS_prim_* ignored");
                Ok(())
            }
        }
    }

    pub fn report(&self, advisories: &[Advisory]) -> BootstrapReport {
        BootstrapReport {
            platform: self.platform,
            libc: self.libc.clone(),
            avx: self.avx,
            core_compiled_with_avx: self.core.is_compiled_with_avx(),
            core_path: self.core.path().to_path_buf(),
            preloaded: self.preloaded.iter().map(|d| d.path.clone()).collect(),
            exports: self.core.exports().len(),
            lib_dir: self.lib_dir.clone(),
            custom_device_root: self.custom_device_root.clone(),
            flags: self.flags,
            prim: self.prim.clone(),
            advisories: advisories.to_vec(),
        }
    }
}

/// Run the startup sequence: search path setup, static-TLS preload, core
/// open, export resolution, AVX check and install path wiring.
pub fn bootstrap(
    options: &BootstrapOptions,
    env: &dyn EnvSource,
    runner: &dyn CommandRunner,
) -> BootstrapResult<Outcome<Runtime>> {
    options.validate()?;
    let platform = options.platform;
    let layout = options.layout();
    let core_path = layout.core_path();
    let mut advisories = Vec::new();

    if !core_path.exists() {
        return Err(BootstrapError::CoreMissing { path: core_path });
    }

    if platform.is_windows() && augment_dll_search_path(env, &layout).is_none() {
        log::warn!(
            "could not add {} to PATH, dependent DLLs may fail to load",
            layout.core_dir.display()
        );
    }

    // ── static TLS workaround ───────────────────────────────────────────
    let libc = if platform == Platform::Linux {
        detect_libc(runner)
    } else {
        None
    };
    match &libc {
        Some(info) => log::info!("detected {info}"),
        None if platform == Platform::Linux => log::debug!("could not determine the C library"),
        None => {}
    }

    let workaround = StaticTlsWorkaround {
        platform,
        libc: libc.as_ref(),
        core_so: Some(core_path.as_path()),
        dso_name: &options.preload_dso,
    };
    let mut preloaded = Vec::new();
    match workaround.apply(runner) {
        Ok(Some(dso)) => preloaded.push(dso),
        Ok(None) => {}
        Err(advisory) => {
            log::warn!("Can not preload {}.so", options.preload_dso);
            advisories.push(advisory);
        }
    }

    let (avx, avx_advisories) = probe_avx(platform, runner).into_parts();
    for advisory in &avx_advisories {
        log::warn!("{advisory}");
    }
    advisories.extend(avx_advisories);

    // ── open and re-export ──────────────────────────────────────────────
    let mut core = match NativeCore::open(&core_path, platform) {
        Ok(core) => core,
        Err(e) => {
            log::error!("Can not import paddle core while this file exists: {}", core_path.display());
            return Err(e);
        }
    };

    if let Err(e) = core.resolve_exports(&options.symbol_groups, &options.aliases) {
        log::error!("Can not import paddle core while this file exists: {}", core_path.display());
        if avx_core_unsupported(avx.supported, core.is_compiled_with_avx()) {
            log::error!(
                "Your machine doesn't support AVX, but the installed PaddlePaddle is avx core, \
                 you should reinstall paddlepaddle with no-avx core."
            );
        }
        return Err(e);
    }
    log::info!("re-exported {} symbols from the native core", core.exports().len());

    if let Some(advisory) = avx_mismatch(avx.supported, core.is_compiled_with_avx()) {
        log::warn!("{advisory}");
        advisories.push(advisory);
    }

    // ── install paths ───────────────────────────────────────────────────
    let site_dirs = options.effective_site_dirs();
    let lib_dir = resolve_lib_dir(&site_dirs, options.user_site.as_deref(), |p| p.exists());
    let custom_device_root = match &lib_dir {
        Some(dir) => {
            if !core.set_lib_path(dir) {
                advisories.push(Advisory::LibPathNotForwarded { lib_dir: dir.clone() });
            }
            Some(set_custom_device_root(env, dir, |p| p.exists()))
        }
        None => {
            log::debug!("no paddle/libs under {site_dirs:?}");
            advisories.push(Advisory::LibDirNotFound);
            env.var(CUSTOM_DEVICE_ROOT)
        }
    };

    let runtime = Runtime {
        core,
        preloaded,
        prim: PrimConfig::new(),
        platform,
        libc,
        avx,
        lib_dir,
        custom_device_root,
        flags: FeatureFlags::from_env(env),
    };
    Ok(Outcome::with_advisories(runtime, advisories))
}
