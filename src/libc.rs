//! C library detection and version ordering.
//!
//! glibc before 2.23 cannot dlopen a library with static TLS once more than
//! 14 other shared objects are loaded ("cannot load any more object with
//! static TLS"). `libgomp` is such a library, which is why the bootstrap
//! preloads it on old glibc (see [`crate::preload`]).

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shell::CommandRunner;

/// First glibc release without the static-TLS slot limit.
pub const STATIC_TLS_FIXED_GLIBC: &str = "2.23";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibcKind {
    Glibc,
    Musl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibcInfo {
    pub kind: LibcKind,
    pub version: String,
}

impl fmt::Display for LibcInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            LibcKind::Glibc => "glibc",
            LibcKind::Musl => "musl",
        };
        write!(f, "{kind} {}", self.version)
    }
}

/// Numeric dotted version with trailing `.0` groups removed, so `2.23.0`
/// and `2.23` are the same version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(Vec<u64>);

impl Version {
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts: Vec<&str> = s.trim().split('.').collect();
        while parts.len() > 1 && parts.last().is_some_and(|p| is_zero_group(p)) {
            parts.pop();
        }
        parts
            .into_iter()
            .map(|p| {
                if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    p.parse::<u64>().ok()
                }
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

fn is_zero_group(p: &str) -> bool {
    !p.is_empty() && p.bytes().all(|b| b == b'0')
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

/// `a < b` by numeric components. Absent or unparsable versions never
/// compare as less.
pub fn less_than_ver(a: Option<&str>, b: Option<&str>) -> bool {
    match (a.and_then(Version::parse), b.and_then(Version::parse)) {
        (Some(a), Some(b)) => a < b,
        _ => false,
    }
}

/// Detect the system C library through `ldd`.
pub fn detect_libc(runner: &dyn CommandRunner) -> Option<LibcInfo> {
    if let Some(version) = runner
        .run("ldd --version")
        .and_then(|out| last_token_of_line(&out, "ldd"))
    {
        return Some(LibcInfo {
            kind: LibcKind::Glibc,
            version,
        });
    }

    // musl's ldd prints its banner to stderr and exits non-zero.
    runner
        .run("ldd 2>&1")
        .and_then(|out| last_token_of_line(&out, "Version"))
        .map(|version| LibcInfo {
            kind: LibcKind::Musl,
            version,
        })
}

fn last_token_of_line(output: &str, needle: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains(needle))
        .and_then(|line| line.split_whitespace().last())
        .map(str::to_string)
}

/// Whether the `libgomp` preload is needed for this C library.
pub fn needs_static_tls_workaround(libc: Option<&LibcInfo>) -> bool {
    match libc {
        Some(info) if info.kind == LibcKind::Glibc => {
            less_than_ver(Some(info.version.as_str()), Some(STATIC_TLS_FIXED_GLIBC))
        }
        _ => false,
    }
}
