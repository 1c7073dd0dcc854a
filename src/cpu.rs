//! Host AVX detection.
//!
//! x86 hosts answer through CPUID via `is_x86_feature_detected!`. Other
//! architectures never have AVX, but the text probes are still consulted so
//! that emulated x86 environments report what the kernel exposes.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{Advisory, Outcome};
use crate::platform::Platform;
use crate::shell::{CommandRunner, ShellRunner};

/// Which source answered the AVX question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvxProbe {
    Cpuid,
    ProcCpuinfo,
    Sysctl,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvxReport {
    pub supported: bool,
    pub probe: AvxProbe,
}

static AVX: OnceLock<bool> = OnceLock::new();

/// Whether the host supports AVX. Detected once per process.
pub fn avx_supported() -> bool {
    *AVX.get_or_init(|| {
        let (report, advisories) = probe_avx(Platform::current(), &ShellRunner).into_parts();
        for advisory in &advisories {
            log::warn!("{advisory}");
        }
        log::debug!("AVX supported: {} ({:?})", report.supported, report.probe);
        report.supported
    })
}

/// Case-insensitive `avx` anywhere in a feature listing.
pub fn text_reports_avx(text: &str) -> bool {
    text.to_ascii_lowercase().contains("avx")
}

pub fn probe_avx(platform: Platform, runner: &dyn CommandRunner) -> Outcome<AvxReport> {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        let _ = (platform, runner);
        Outcome::clean(AvxReport {
            supported: std::is_x86_feature_detected!("avx"),
            probe: AvxProbe::Cpuid,
        })
    }
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    {
        probe_avx_text(platform, runner)
    }
}

// ── host/core mismatch ──────────────────────────────────────────────────

/// The performance hint for an AVX host running a core built without AVX.
/// An unknown core build raises nothing.
pub fn avx_mismatch(host_avx: bool, core_avx: Option<bool>) -> Option<Advisory> {
    (host_avx && core_avx == Some(false)).then_some(Advisory::AvxCoreMissing)
}

/// Whether a failed core load is explained by an AVX core on a host without
/// AVX. Only a core that reports its build can be blamed.
pub fn avx_core_unsupported(host_avx: bool, core_avx: Option<bool>) -> bool {
    !host_avx && core_avx == Some(true)
}

// ── text probes ─────────────────────────────────────────────────────────

pub fn probe_avx_text(platform: Platform, runner: &dyn CommandRunner) -> Outcome<AvxReport> {
    match platform {
        Platform::Linux => match std::fs::read_to_string("/proc/cpuinfo") {
            Ok(text) => Outcome::clean(AvxReport {
                supported: text_reports_avx(&text),
                probe: AvxProbe::ProcCpuinfo,
            }),
            Err(e) => unavailable(Advisory::CpuProbeFailed {
                source: "/proc/cpuinfo".into(),
                reason: e.to_string(),
            }),
        },
        Platform::MacOs => {
            let supported = ["sysctl machdep.cpu.features", "sysctl machdep.cpu.leaf7_features"]
                .iter()
                .any(|cmd| runner.run(cmd).is_some_and(|out| text_reports_avx(&out)));
            Outcome::clean(AvxReport {
                supported,
                probe: AvxProbe::Sysctl,
            })
        }
        Platform::Windows | Platform::Other => unavailable(Advisory::CpuProbeFailed {
            source: platform.name().into(),
            reason: "no AVX probe for this platform".into(),
        }),
    }
}

fn unavailable(advisory: Advisory) -> Outcome<AvxReport> {
    Outcome::with_advisories(
        AvxReport {
            supported: false,
            probe: AvxProbe::Unavailable,
        },
        vec![advisory],
    )
}
