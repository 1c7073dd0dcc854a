//! Bootstrap configuration.

use std::path::{Path, PathBuf};

use crate::discovery::{CoreLayout, DEFAULT_CORE_NAME};
use crate::env::EnvSource;
use crate::error::{BootstrapError, BootstrapResult};
use crate::native::{SymbolGroup, DEFAULT_ALIASES, DEFAULT_GROUPS};
use crate::platform::Platform;
use crate::preload::STATIC_TLS_DSO;

pub const ENV_CORE_DIR: &str = "PADDLE_BOOTSTRAP_CORE_DIR";
pub const ENV_SITE_DIRS: &str = "PADDLE_BOOTSTRAP_SITE_DIRS";
pub const ENV_USER_SITE: &str = "PADDLE_BOOTSTRAP_USER_SITE";

#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    pub platform: Platform,
    /// Directory holding the native core, normally `<site>/paddle/base`.
    pub core_dir: PathBuf,
    pub lib_name: String,
    /// Site directories searched for `paddle/libs`, in order. Empty means
    /// "derive from `core_dir`".
    pub site_dirs: Vec<PathBuf>,
    pub user_site: Option<PathBuf>,
    pub preload_dso: String,
    pub symbol_groups: Vec<SymbolGroup>,
    pub aliases: Vec<(&'static str, &'static str)>,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        let core_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            platform: Platform::current(),
            core_dir,
            lib_name: DEFAULT_CORE_NAME.to_string(),
            site_dirs: Vec::new(),
            user_site: None,
            preload_dso: STATIC_TLS_DSO.to_string(),
            symbol_groups: DEFAULT_GROUPS.to_vec(),
            aliases: DEFAULT_ALIASES.to_vec(),
        }
    }
}

impl BootstrapOptions {
    /// Defaults, overridden by `PADDLE_BOOTSTRAP_*` variables.
    pub fn from_env(env: &dyn EnvSource) -> Self {
        let mut opts = Self::default();
        if let Some(dir) = env.var(ENV_CORE_DIR).filter(|v| !v.is_empty()) {
            opts.core_dir = PathBuf::from(dir);
        }
        if let Some(dirs) = env.var(ENV_SITE_DIRS) {
            opts.site_dirs = std::env::split_paths(&dirs)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        if let Some(user) = env.var(ENV_USER_SITE).filter(|v| !v.is_empty()) {
            opts.user_site = Some(PathBuf::from(user));
        }
        opts
    }

    pub fn with_core_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.core_dir = dir.into();
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_site_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.site_dirs = dirs;
        self
    }

    pub fn with_user_site(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_site = Some(dir.into());
        self
    }

    pub fn with_symbol_groups(mut self, groups: Vec<SymbolGroup>) -> Self {
        self.symbol_groups = groups;
        self
    }

    pub fn validate(&self) -> BootstrapResult<()> {
        if self.lib_name.is_empty() {
            return Err(BootstrapError::InvalidConfig("core library name is empty".into()));
        }
        if self.lib_name.contains(['/', '\\']) {
            return Err(BootstrapError::InvalidConfig(format!(
                "core library name `{}` must not contain a path separator",
                self.lib_name
            )));
        }
        Ok(())
    }

    pub fn layout(&self) -> CoreLayout {
        let mut layout = CoreLayout::new(&self.core_dir, self.platform);
        layout.lib_name = self.lib_name.clone();
        layout
    }

    /// Site directories to search; `<core_dir>/../..` when none are given.
    pub fn effective_site_dirs(&self) -> Vec<PathBuf> {
        if !self.site_dirs.is_empty() {
            return self.site_dirs.clone();
        }
        self.core_dir
            .parent()
            .and_then(Path::parent)
            .map(|site| vec![site.to_path_buf()])
            .unwrap_or_default()
    }
}
