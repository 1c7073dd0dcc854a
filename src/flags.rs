//! Named feature flags read from the environment.

use serde::{Deserialize, Serialize};

use crate::env::{flag_enabled, EnvSource};

pub const FLAGS_PRIM_FORWARD: &str = "FLAGS_prim_forward";
pub const FLAGS_PRIM_BACKWARD: &str = "FLAGS_prim_backward";
pub const FLAGS_PRIM_ALL: &str = "FLAGS_prim_all";
pub const FLAGS_PRIM_LOG: &str = "FLAGS_prim_log";
pub const FLAGS_PRIM_SKIP_DYNAMIC: &str = "FLAGS_prim_skip_dynamic";
pub const FLAGS_PRIM_ENABLE_DYNAMIC: &str = "FLAGS_prim_enable_dynamic";
pub const FLAGS_ENABLE_AUTO_RECOMPUTE: &str = "FLAGS_enable_auto_recompute";
pub const FLAGS_MODEL_RETURN_DATA: &str = "FLAGS_model_return_data";
pub const CUSTOM_DEVICE_ROOT: &str = "CUSTOM_DEVICE_ROOT";

/// Models return the data used for output checks.
pub fn model_return_data(env: &dyn EnvSource) -> bool {
    flag_enabled(env, FLAGS_MODEL_RETURN_DATA)
}

pub fn enable_prim_skip_dynamic_shape(env: &dyn EnvSource) -> bool {
    flag_enabled(env, FLAGS_PRIM_SKIP_DYNAMIC)
}

pub fn enable_prim_dynamic_shape(env: &dyn EnvSource) -> bool {
    flag_enabled(env, FLAGS_PRIM_ENABLE_DYNAMIC)
}

pub fn enable_auto_recompute(env: &dyn EnvSource) -> bool {
    flag_enabled(env, FLAGS_ENABLE_AUTO_RECOMPUTE)
}

/// Prim state logging only turns on for the exact value `1`.
pub fn prim_log_enabled(env: &dyn EnvSource) -> bool {
    env.var(FLAGS_PRIM_LOG).as_deref() == Some("1")
}

/// Snapshot of every truthy flag at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub model_return_data: bool,
    pub prim_skip_dynamic: bool,
    pub prim_enable_dynamic: bool,
    pub auto_recompute: bool,
    pub prim_log: bool,
}

impl FeatureFlags {
    pub fn from_env(env: &dyn EnvSource) -> Self {
        Self {
            model_return_data: model_return_data(env),
            prim_skip_dynamic: enable_prim_skip_dynamic_shape(env),
            prim_enable_dynamic: enable_prim_dynamic_shape(env),
            auto_recompute: enable_auto_recompute(env),
            prim_log: prim_log_enabled(env),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;

    #[test]
    fn each_flag_is_read_independently() {
        let env = MapEnv::new()
            .with(FLAGS_MODEL_RETURN_DATA, "TRUE")
            .with(FLAGS_PRIM_SKIP_DYNAMIC, "0")
            .with(FLAGS_PRIM_ENABLE_DYNAMIC, "1")
            .with(FLAGS_ENABLE_AUTO_RECOMPUTE, "false");
        let flags = FeatureFlags::from_env(&env);
        assert_eq!(
            flags,
            FeatureFlags {
                model_return_data: true,
                prim_skip_dynamic: false,
                prim_enable_dynamic: true,
                auto_recompute: false,
                prim_log: false,
            }
        );
    }

    #[test]
    fn unset_flags_are_disabled() {
        assert_eq!(FeatureFlags::from_env(&MapEnv::new()), FeatureFlags::default());
    }

    #[test]
    fn prim_log_requires_literal_one() {
        assert!(!prim_log_enabled(&MapEnv::new().with(FLAGS_PRIM_LOG, "true")));
        assert!(prim_log_enabled(&MapEnv::new().with(FLAGS_PRIM_LOG, "1")));
    }
}
