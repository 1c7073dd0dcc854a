//! Error taxonomy for the bootstrap sequence.
//!
//! Failures are split in two classes. [`BootstrapError`] means the native core
//! cannot be used and is returned as `Err`. [`Advisory`] means something
//! optional went wrong (a preload, a CPU probe, a performance hint) and is
//! carried next to the successful value in an [`Outcome`].

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal bootstrap failures.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("native core not found at {}", path.display())]
    CoreMissing { path: PathBuf },
    #[error("failed to open native core {}\n{hint}", path.display())]
    CoreOpen {
        path: PathBuf,
        hint: String,
        #[source]
        source: libloading::Error,
    },
    #[error("native core {} does not export required symbol `{symbol}` ({group})", path.display())]
    MissingSymbol {
        path: PathBuf,
        group: &'static str,
        symbol: String,
    },
    #[error("invalid bootstrap configuration: {0}")]
    InvalidConfig(String),
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Errors raised by strict environment flag handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlagError {
    #[error("flag {flag} should be true or false, got `{value}`")]
    NotBoolean { flag: String, value: String },
    #[error("flag {0} is not set")]
    Unset(String),
    #[error("only FLAGS_prim_forward/FLAGS_prim_backward/FLAGS_prim_all can be synced, got {0}")]
    UnknownFlag(String),
}

/// Non-fatal findings collected while bootstrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Advisory {
    /// A helper shared object could not be preloaded.
    PreloadFailed { dso: String, reason: String },
    /// The CPU feature probe could not run; AVX is treated as absent.
    CpuProbeFailed { source: String, reason: String },
    /// The host supports AVX but the installed core was built without it.
    AvxCoreMissing,
    /// The install `libs` directory was not found in any site directory.
    LibDirNotFound,
    /// The core does not export a way to receive the lib directory.
    LibPathNotForwarded { lib_dir: PathBuf },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::PreloadFailed { dso, reason } => {
                write!(f, "Load {dso} failed: {reason}")
            }
            Advisory::CpuProbeFailed { source, reason } => {
                write!(f, "Can not get the AVX flag from {source}: {reason}")
            }
            Advisory::AvxCoreMissing => write!(
                f,
                "Hint: Your machine support AVX, but the installed paddlepaddle doesn't have avx core. \
                 Hence, no-avx core with worse performance will be imported. If you like, you could \
                 reinstall paddlepaddle by 'python -m pip install --force-reinstall paddlepaddle-gpu[==version]' \
                 to get better performance."
            ),
            Advisory::LibDirNotFound => write!(f, "paddle libs directory not found in any site directory"),
            Advisory::LibPathNotForwarded { lib_dir } => write!(
                f,
                "native core does not accept a lib path, {} was not forwarded",
                lib_dir.display()
            ),
        }
    }
}

/// A successful value together with the advisories raised while producing it.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: T,
    pub advisories: Vec<Advisory>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            advisories: Vec::new(),
        }
    }

    pub fn with_advisories(value: T, advisories: Vec<Advisory>) -> Self {
        Self { value, advisories }
    }

    pub fn is_clean(&self) -> bool {
        self.advisories.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            advisories: self.advisories,
        }
    }

    /// Split into the value and its advisories.
    pub fn into_parts(self) -> (T, Vec<Advisory>) {
        (self.value, self.advisories)
    }
}

/// Remediation hint attached to a failed core open.
pub fn import_hint(windows: bool, executable_dir: Option<&str>) -> String {
    if windows {
        let dir = executable_dir.unwrap_or("<python install dir>");
        format!(
            "NOTE: You may need to run \"set PATH={dir};%PATH%\" if you encounter \"DLL load failed\" errors. \
             If you have python installed in other directory, replace \"{dir}\" with your own directory."
        )
    } else {
        "NOTE: You may need to run \"export LD_LIBRARY_PATH=/usr/local/lib:$LD_LIBRARY_PATH\" \
         if you encounter \"libmkldnn.so not found\" errors. If you have python installed in other \
         directory, replace \"/usr/local/lib\" with your own directory."
            .to_string()
    }
}
