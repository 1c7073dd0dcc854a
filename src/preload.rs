//! Static-TLS preload workaround.
//!
//! On glibc < 2.23 the core fails to open once `libgomp` (static TLS) is
//! loaded after more than 14 other shared objects. Loading the exact
//! `libgomp` the core links against before the core itself avoids it.

use std::path::{Path, PathBuf};

use libloading::Library;

use crate::error::Advisory;
use crate::libc::{needs_static_tls_workaround, LibcInfo};
use crate::platform::Platform;
use crate::shell::{shell_quote, CommandRunner};

pub const STATIC_TLS_DSO: &str = "libgomp";

/// A shared object kept open for the lifetime of the runtime.
#[derive(Debug)]
pub struct PreloadedDso {
    pub name: String,
    pub path: PathBuf,
    _lib: Library,
}

/// Third field of the first `ldd` line naming `dso_name`:
/// `libgomp.so.1 => /lib/x86_64-linux-gnu/libgomp.so.1 (0x...)`.
pub fn dso_path_from_ldd(ldd_output: &str, dso_name: &str) -> Option<PathBuf> {
    ldd_output
        .lines()
        .find(|line| line.contains(dso_name))
        .and_then(|line| line.split_whitespace().nth(2))
        .filter(|field| !field.starts_with('(') && *field != "not")
        .map(PathBuf::from)
}

/// Resolve where `core_so` picks up `dso_name` from.
pub fn get_dso_path(
    core_so: Option<&Path>,
    dso_name: &str,
    runner: &dyn CommandRunner,
) -> Option<PathBuf> {
    let core_so = core_so?;
    if dso_name.is_empty() {
        return None;
    }
    let output = runner.run(&format!("ldd {}", shell_quote(&core_so.to_string_lossy())))?;
    dso_path_from_ldd(&output, dso_name)
}

pub fn load_dso(path: &Path) -> Result<Library, Advisory> {
    // SAFETY: `path` is where the core's own `ldd` resolution finds the DSO,
    // so the core would load it anyway. Loading runs its initialisers.
    unsafe { Library::new(path) }.map_err(|e| Advisory::PreloadFailed {
        dso: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Decides and performs the `libgomp` preload.
#[derive(Debug, Clone)]
pub struct StaticTlsWorkaround<'a> {
    pub platform: Platform,
    pub libc: Option<&'a LibcInfo>,
    pub core_so: Option<&'a Path>,
    pub dso_name: &'a str,
}

impl<'a> StaticTlsWorkaround<'a> {
    pub fn applies(&self) -> bool {
        self.platform == Platform::Linux && needs_static_tls_workaround(self.libc)
    }

    /// Preload the DSO when needed. `Ok(None)` means nothing had to be done
    /// or `ldd` could not name the DSO; `Err` is always advisory.
    pub fn apply(&self, runner: &dyn CommandRunner) -> Result<Option<PreloadedDso>, Advisory> {
        if !self.applies() {
            return Ok(None);
        }
        if let Some(libc) = self.libc {
            log::info!("{libc} predates the static TLS fix, preloading {}", self.dso_name);
        }

        let Some(path) = get_dso_path(self.core_so, self.dso_name, runner) else {
            log::debug!("ldd did not report {} for the core", self.dso_name);
            return Ok(None);
        };

        match load_dso(&path) {
            Ok(lib) => {
                log::info!("preloaded {}", path.display());
                Ok(Some(PreloadedDso {
                    name: self.dso_name.to_string(),
                    path,
                    _lib: lib,
                }))
            }
            Err(advisory) => {
                log::warn!("{advisory}");
                Err(advisory)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libc::LibcKind;

    const LDD: &str = "\tlinux-vdso.so.1 (0x00007ffd)\n\
        \tlibgomp.so.1 => /usr/lib/x86_64-linux-gnu/libgomp.so.1 (0x00007f10)\n\
        \tlibc.so.6 => /lib/x86_64-linux-gnu/libc.so.6 (0x00007f20)";

    fn old_glibc() -> LibcInfo {
        LibcInfo {
            kind: LibcKind::Glibc,
            version: "2.17".into(),
        }
    }

    #[test]
    fn ldd_third_field_is_the_path() {
        assert_eq!(
            dso_path_from_ldd(LDD, "libgomp"),
            Some(PathBuf::from("/usr/lib/x86_64-linux-gnu/libgomp.so.1"))
        );
        assert_eq!(dso_path_from_ldd(LDD, "libmkl"), None);
        assert_eq!(dso_path_from_ldd(LDD, "linux-vdso"), None);
        assert_eq!(dso_path_from_ldd("libgomp.so.1 => not found", "libgomp"), None);
    }

    #[test]
    fn missing_core_skips_ldd() {
        let runner = |_: &str| -> Option<String> { panic!("ldd must not run") };
        assert_eq!(get_dso_path(None, "libgomp", &runner), None);
    }

    #[test]
    fn ldd_gets_core_path_as_one_word() {
        let seen = std::cell::RefCell::new(String::new());
        let runner = |cmd: &str| {
            *seen.borrow_mut() = cmd.to_string();
            Some(LDD.to_string())
        };
        let path = get_dso_path(Some(Path::new("/opt/my site/libpaddle.so")), "libgomp", &runner);
        assert_eq!(path, Some(PathBuf::from("/usr/lib/x86_64-linux-gnu/libgomp.so.1")));
        assert_eq!(seen.into_inner(), format!("ldd {}", shell_quote("/opt/my site/libpaddle.so")));
    }

    #[test]
    fn workaround_only_on_old_glibc_linux() {
        let libc = old_glibc();
        let mut w = StaticTlsWorkaround {
            platform: Platform::Linux,
            libc: Some(&libc),
            core_so: Some(Path::new("/x/libpaddle.so")),
            dso_name: STATIC_TLS_DSO,
        };
        assert!(w.applies());
        w.platform = Platform::MacOs;
        assert!(!w.applies());

        let new = LibcInfo {
            kind: LibcKind::Glibc,
            version: "2.31".into(),
        };
        w.platform = Platform::Linux;
        w.libc = Some(&new);
        assert!(!w.applies());
        assert!(w.apply(&|_: &str| -> Option<String> { panic!("ldd must not run") }).unwrap().is_none());
    }

    #[test]
    fn unloadable_dso_is_advisory() {
        let libc = old_glibc();
        let w = StaticTlsWorkaround {
            platform: Platform::Linux,
            libc: Some(&libc),
            core_so: Some(Path::new("/x/libpaddle.so")),
            dso_name: STATIC_TLS_DSO,
        };
        let runner = |_: &str| {
            Some("libgomp.so.1 => /nonexistent/libgomp.so.1 (0x0)".to_string())
        };
        match w.apply(&runner) {
            Err(Advisory::PreloadFailed { dso, .. }) => {
                assert_eq!(dso, "/nonexistent/libgomp.so.1")
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
