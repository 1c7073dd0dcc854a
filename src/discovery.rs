//! Locating the native core and the install-relative library directories.

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::env::EnvSource;
use crate::flags::CUSTOM_DEVICE_ROOT;
use crate::platform::Platform;

pub const DEFAULT_CORE_NAME: &str = "libpaddle";

/// Where the native core is expected to live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreLayout {
    pub core_dir: PathBuf,
    pub lib_name: String,
    pub suffix: String,
}

impl CoreLayout {
    pub fn new(core_dir: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            core_dir: core_dir.into(),
            lib_name: DEFAULT_CORE_NAME.to_string(),
            suffix: platform.core_suffix().to_string(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.lib_name, self.suffix)
    }

    pub fn core_path(&self) -> PathBuf {
        self.core_dir.join(self.file_name())
    }

    pub fn core_exists(&self) -> bool {
        self.core_path().exists()
    }

    /// Bundled third-party DLLs, `<core_dir>/../libs`.
    pub fn third_party_lib_dir(&self) -> PathBuf {
        self.core_dir.join("..").join("libs")
    }
}

/// Return the first candidate for which `exists` holds. Candidates after the
/// match are never queried.
pub fn find_first_existing<I, F>(candidates: I, mut exists: F) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
    F: FnMut(&Path) -> bool,
{
    candidates.into_iter().find(|p| exists(p.as_path()))
}

/// Prepend the core directory and its bundled `libs` directory to `PATH` so
/// the loader can resolve the core's DLL dependencies. Only Windows needs it.
pub fn augment_dll_search_path(env: &dyn EnvSource, layout: &CoreLayout) -> Option<OsString> {
    let mut paths = vec![layout.core_dir.clone(), layout.third_party_lib_dir()];
    if let Some(existing) = env.var("PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    let joined = std::env::join_paths(paths).ok()?;
    env.set_var("PATH", &joined.to_string_lossy());
    log::debug!("augmented PATH for core at {:?}", layout.core_dir);
    Some(joined)
}

/// Find `<site>/paddle/libs`, first over the site directories in order and
/// then in the per-user site directory.
pub fn resolve_lib_dir<F>(site_dirs: &[PathBuf], user_site: Option<&Path>, exists: F) -> Option<PathBuf>
where
    F: FnMut(&Path) -> bool,
{
    let candidates = site_dirs
        .iter()
        .map(PathBuf::as_path)
        .chain(user_site)
        .map(|site| site.join("paddle").join("libs"));
    find_first_existing(candidates, exists)
}

/// `<lib_dir>/../../paddle_custom_device`.
pub fn custom_device_dir(lib_dir: &Path) -> PathBuf {
    lib_dir.join("..").join("..").join("paddle_custom_device")
}

/// Default `CUSTOM_DEVICE_ROOT` unless the user already set it. Returns the
/// value now in effect.
pub fn set_custom_device_root<F>(env: &dyn EnvSource, lib_dir: &Path, exists: F) -> String
where
    F: FnOnce(&Path) -> bool,
{
    if let Some(current) = env.var(CUSTOM_DEVICE_ROOT) {
        return current;
    }
    let candidate = custom_device_dir(lib_dir);
    let value = if exists(&candidate) {
        normalize_lexically(&candidate).to_string_lossy().into_owned()
    } else {
        String::new()
    };
    env.set_var(CUSTOM_DEVICE_ROOT, &value);
    log::debug!("{CUSTOM_DEVICE_ROOT} defaulted to {value:?}");
    value
}

/// Collapse `.` and `..` components without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use std::cell::RefCell;

    #[test]
    fn first_existing_stops_at_match() {
        let asked = RefCell::new(Vec::new());
        let candidates = vec![
            PathBuf::from("/a"),
            PathBuf::from("/b"),
            PathBuf::from("/c"),
        ];
        let found = find_first_existing(candidates, |p| {
            asked.borrow_mut().push(p.to_path_buf());
            p == Path::new("/b")
        });
        assert_eq!(found, Some(PathBuf::from("/b")));
        assert_eq!(
            asked.into_inner(),
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }

    #[test]
    fn lib_dir_prefers_site_dirs_over_user_site() {
        let sites = vec![PathBuf::from("/s1"), PathBuf::from("/s2")];
        let user = PathBuf::from("/home/u/.local/site");
        let found = resolve_lib_dir(&sites, Some(user.as_path()), |p| {
            p == Path::new("/s2/paddle/libs") || p.starts_with("/home")
        });
        assert_eq!(found, Some(PathBuf::from("/s2/paddle/libs")));

        let found = resolve_lib_dir(&sites, Some(user.as_path()), |p| p.starts_with("/home"));
        assert_eq!(found, Some(user.join("paddle").join("libs")));

        assert_eq!(resolve_lib_dir(&sites, None, |_| false), None);
    }

    #[test]
    fn custom_device_root_is_normalized() {
        let env = MapEnv::new();
        let value = set_custom_device_root(&env, Path::new("/site/paddle/libs"), |_| true);
        assert_eq!(value, "/site/paddle_custom_device");
        assert_eq!(env.var(CUSTOM_DEVICE_ROOT).as_deref(), Some("/site/paddle_custom_device"));
    }

    #[test]
    fn custom_device_root_defaults_to_empty() {
        let env = MapEnv::new();
        assert_eq!(set_custom_device_root(&env, Path::new("/x/libs"), |_| false), "");
        assert_eq!(env.var(CUSTOM_DEVICE_ROOT).as_deref(), Some(""));
    }

    #[test]
    fn custom_device_root_keeps_user_value() {
        let env = MapEnv::new().with(CUSTOM_DEVICE_ROOT, "/opt/devices");
        let value = set_custom_device_root(&env, Path::new("/x/libs"), |_| panic!("not probed"));
        assert_eq!(value, "/opt/devices");
    }

    #[test]
    fn normalize_handles_leading_parents_and_root() {
        assert_eq!(normalize_lexically(Path::new("a/./b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize_lexically(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize_lexically(Path::new("/..")), PathBuf::from("/"));
        assert_eq!(normalize_lexically(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn core_path_uses_platform_suffix() {
        let layout = CoreLayout::new("/site/paddle/base", Platform::Windows);
        assert_eq!(layout.core_path(), PathBuf::from("/site/paddle/base/libpaddle.pyd"));
    }

    #[cfg(unix)]
    #[test]
    fn unjoinable_dll_search_path_leaves_path_alone() {
        let env = MapEnv::new().with("PATH", "/usr/bin");
        let layout = CoreLayout::new("/site:odd/paddle/base", Platform::Windows);
        assert_eq!(augment_dll_search_path(&env, &layout), None);
        assert_eq!(env.var("PATH").as_deref(), Some("/usr/bin"));
    }

    #[test]
    fn dll_search_path_is_prepended() {
        let env = MapEnv::new().with("PATH", "/usr/bin");
        let layout = CoreLayout::new("/site/paddle/base", Platform::Linux);
        augment_dll_search_path(&env, &layout).unwrap();
        let path = env.var("PATH").unwrap();
        let parts: Vec<PathBuf> = std::env::split_paths(&path).collect();
        assert_eq!(parts[0], PathBuf::from("/site/paddle/base"));
        assert_eq!(parts[1], PathBuf::from("/site/paddle/base/../libs"));
        assert_eq!(parts[2], PathBuf::from("/usr/bin"));
    }
}
