use std::collections::BTreeSet;

/// Owner of the prim enablement state.
///
/// The forward, backward and eager flags are independent; "all" sets forward
/// and backward together.
pub trait PrimController {
    fn set_fwd_prim_enabled(&mut self, enabled: bool);
    fn set_bwd_prim_enabled(&mut self, enabled: bool);
    fn set_eager_prim_enabled(&mut self, enabled: bool);
    fn set_all_prim_enabled(&mut self, enabled: bool) {
        self.set_fwd_prim_enabled(enabled);
        self.set_bwd_prim_enabled(enabled);
    }

    fn is_fwd_prim_enabled(&self) -> bool;
    fn is_bwd_prim_enabled(&self) -> bool;
    fn is_eager_prim_enabled(&self) -> bool;

    /// Replace the set of ops whose backward is never decomposed.
    fn set_bwd_prim_blacklist(&mut self, ops: &BTreeSet<String>);
}

/// In-process prim state, used when no native core provides one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimState {
    pub fwd: bool,
    pub bwd: bool,
    pub eager: bool,
    pub bwd_blacklist: BTreeSet<String>,
}

impl PrimController for PrimState {
    fn set_fwd_prim_enabled(&mut self, enabled: bool) {
        self.fwd = enabled;
    }

    fn set_bwd_prim_enabled(&mut self, enabled: bool) {
        self.bwd = enabled;
    }

    fn set_eager_prim_enabled(&mut self, enabled: bool) {
        self.eager = enabled;
    }

    fn is_fwd_prim_enabled(&self) -> bool {
        self.fwd
    }

    fn is_bwd_prim_enabled(&self) -> bool {
        self.bwd
    }

    fn is_eager_prim_enabled(&self) -> bool {
        self.eager
    }

    fn set_bwd_prim_blacklist(&mut self, ops: &BTreeSet<String>) {
        self.bwd_blacklist = ops.clone();
    }
}
