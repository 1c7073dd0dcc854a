//! Host platform identification.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Other
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "darwin",
            Self::Windows => "windows",
            Self::Other => "other",
        }
    }

    /// File suffix of the native core; the core ships as a Python extension.
    pub fn core_suffix(&self) -> &'static str {
        match self {
            Self::Windows => "pyd",
            _ => "so",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Self::Windows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_pyd_only_on_windows() {
        assert_eq!(Platform::Windows.core_suffix(), "pyd");
        assert_eq!(Platform::Linux.core_suffix(), "so");
        assert_eq!(Platform::MacOs.core_suffix(), "so");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn current_on_linux() {
        assert_eq!(Platform::current(), Platform::Linux);
    }
}
