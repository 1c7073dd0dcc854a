//! Serializable summary of a bootstrap run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cpu::AvxReport;
use crate::error::Advisory;
use crate::flags::FeatureFlags;
use crate::libc::LibcInfo;
use crate::platform::Platform;
use crate::prim::PrimConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapReport {
    pub platform: Platform,
    pub libc: Option<LibcInfo>,
    pub avx: AvxReport,
    pub core_compiled_with_avx: Option<bool>,
    pub core_path: PathBuf,
    pub preloaded: Vec<PathBuf>,
    pub exports: usize,
    pub lib_dir: Option<PathBuf>,
    pub custom_device_root: Option<String>,
    pub flags: FeatureFlags,
    pub prim: PrimConfig,
    pub advisories: Vec<Advisory>,
}

impl BootstrapReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
