//! Prim toggles driven by callers and by `FLAGS_prim_*`.
//!
//! Precedence, highest first: explicit `set_prim_all_enabled`,
//! `FLAGS_prim_all`, explicit forward/backward setters, then
//! `FLAGS_prim_forward` / `FLAGS_prim_backward`.

use std::collections::BTreeSet;

use crate::env::{parse_strict_bool, EnvSource};
use crate::error::FlagError;
use crate::flags::{prim_log_enabled, FLAGS_PRIM_ALL, FLAGS_PRIM_BACKWARD, FLAGS_PRIM_FORWARD};

use super::PrimController;

pub fn is_all_prim_enabled(ctl: &dyn PrimController) -> bool {
    ctl.is_fwd_prim_enabled() && ctl.is_bwd_prim_enabled()
}

fn log_forward(ctl: &dyn PrimController) {
    log::info!("forward prim enabled: {}", ctl.is_fwd_prim_enabled());
}

fn log_backward(ctl: &dyn PrimController) {
    log::info!("backward prim enabled: {}", ctl.is_bwd_prim_enabled());
}

fn log_all(ctl: &dyn PrimController) {
    log::info!("all prim enabled: {}", is_all_prim_enabled(ctl));
}

pub fn set_prim_forward_enabled(ctl: &mut dyn PrimController, env: &dyn EnvSource, value: bool) {
    ctl.set_fwd_prim_enabled(value);
    if prim_log_enabled(env) {
        log_forward(ctl);
    }
}

pub fn set_prim_backward_enabled(ctl: &mut dyn PrimController, env: &dyn EnvSource, value: bool) {
    ctl.set_bwd_prim_enabled(value);
    if prim_log_enabled(env) {
        log_backward(ctl);
    }
}

pub fn set_prim_eager_enabled(ctl: &mut dyn PrimController, env: &dyn EnvSource, value: bool) {
    ctl.set_eager_prim_enabled(value);
    if prim_log_enabled(env) {
        log::info!("eager prim enabled: {}", ctl.is_eager_prim_enabled());
    }
}

pub fn set_prim_all_enabled(ctl: &mut dyn PrimController, env: &dyn EnvSource, value: bool) {
    ctl.set_all_prim_enabled(value);
    if prim_log_enabled(env) {
        log_all(ctl);
    }
}

/// Hand the deduplicated op names to the controller's backward blacklist.
pub fn set_prim_backward_blacklist<I, S>(ctl: &mut dyn PrimController, ops: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let ops: BTreeSet<String> = ops.into_iter().map(Into::into).collect();
    ctl.set_bwd_prim_blacklist(&ops);
}

/// Apply the strict boolean value of one of the three prim flags. The state
/// is logged unconditionally once applied.
pub fn sync_stat_with_flag(
    flag: &str,
    env: &dyn EnvSource,
    ctl: &mut dyn PrimController,
) -> Result<bool, FlagError> {
    if ![FLAGS_PRIM_FORWARD, FLAGS_PRIM_BACKWARD, FLAGS_PRIM_ALL].contains(&flag) {
        return Err(FlagError::UnknownFlag(flag.to_string()));
    }
    let raw = env.var(flag).ok_or_else(|| FlagError::Unset(flag.to_string()))?;
    let value = parse_strict_bool(flag, &raw)?;

    match flag {
        FLAGS_PRIM_FORWARD => {
            ctl.set_fwd_prim_enabled(value);
            log_forward(ctl);
        }
        FLAGS_PRIM_BACKWARD => {
            ctl.set_bwd_prim_enabled(value);
            log_backward(ctl);
        }
        _ => {
            ctl.set_all_prim_enabled(value);
            log_all(ctl);
        }
    }
    Ok(value)
}

fn sync_or_log(
    flag: &str,
    env: &dyn EnvSource,
    ctl: &mut dyn PrimController,
    log_current: fn(&dyn PrimController),
) -> Result<(), FlagError> {
    if env.var(flag).is_some() {
        sync_stat_with_flag(flag, env, ctl).map(|_| ())
    } else {
        if prim_log_enabled(env) {
            log_current(ctl);
        }
        Ok(())
    }
}

/// `FLAGS_prim_all` wins when set; otherwise backward then forward are
/// synced from their own flags.
pub fn check_and_set_prim_all_enabled(
    env: &dyn EnvSource,
    ctl: &mut dyn PrimController,
) -> Result<(), FlagError> {
    if env.var(FLAGS_PRIM_ALL).is_some() {
        return sync_stat_with_flag(FLAGS_PRIM_ALL, env, ctl).map(|_| ());
    }
    sync_or_log(FLAGS_PRIM_BACKWARD, env, ctl, log_backward)?;
    sync_or_log(FLAGS_PRIM_FORWARD, env, ctl, log_forward)
}
