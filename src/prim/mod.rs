//! Prim (primitive decomposition) configuration.
//!
//! Prim rewriting replaces ops with compositions of simpler primitive ops,
//! independently for the forward and backward pass.

pub mod config;
pub mod controller;
pub mod rules;
pub mod sync;

pub use config::PrimConfig;
pub use controller::{PrimController, PrimState};
pub use rules::{decomp_unused_outputs, ops_contain_none, BatchNormAttrs};
pub use sync::{
    check_and_set_prim_all_enabled, is_all_prim_enabled, set_prim_all_enabled,
    set_prim_backward_blacklist, set_prim_backward_enabled, set_prim_eager_enabled,
    set_prim_forward_enabled, sync_stat_with_flag,
};
