//! Environment access and flag value parsing.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::FlagError;

/// Read/write view of process environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
    fn set_var(&self, key: &str, value: &str);
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set_var(&self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }
}

/// In-memory environment, used by tests and embedders that sandbox startup.
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: &str, value: &str) -> Self {
        self.set_var(key, value);
        self
    }

    pub fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map still holds valid strings.
        self.vars.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set_var(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }
}

/// `"1"` or `"true"` in any letter case.
pub fn is_truthy(value: Option<&str>) -> bool {
    match value {
        Some(v) => v == "1" || v.eq_ignore_ascii_case("true"),
        None => false,
    }
}

/// Truthy check of a named variable.
pub fn flag_enabled(env: &dyn EnvSource, key: &str) -> bool {
    is_truthy(env.var(key).as_deref())
}

/// Parse a flag that must be spelled `true` or `false` (any case).
pub fn parse_strict_bool(flag: &str, value: &str) -> Result<bool, FlagError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(FlagError::NotBoolean {
            flag: flag.to_string(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_accepts_one_and_true_in_any_case() {
        for v in ["1", "true", "TRUE", "True", "tRuE"] {
            assert!(is_truthy(Some(v)), "{v}");
        }
    }

    #[test]
    fn truthy_rejects_everything_else() {
        for v in ["0", "false", "FALSE", "", "yes", "on", " 1", "2"] {
            assert!(!is_truthy(Some(v)), "{v}");
        }
        assert!(!is_truthy(None));
    }

    #[test]
    fn strict_bool_rejects_numeric_spelling() {
        assert_eq!(parse_strict_bool("F", "False"), Ok(false));
        assert_eq!(parse_strict_bool("F", "TRUE"), Ok(true));
        assert!(matches!(
            parse_strict_bool("F", "1"),
            Err(FlagError::NotBoolean { .. })
        ));
    }

    #[test]
    fn map_env_set_and_remove() {
        let env = MapEnv::new().with("A", "1");
        assert!(flag_enabled(&env, "A"));
        env.remove("A");
        assert_eq!(env.var("A"), None);
    }
}
