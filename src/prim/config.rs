use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Mutable prim configuration.
///
/// Ops in `forward_blacklist` are never replaced by their composite rule;
/// `composite_ops_record` lists ops whose decomposition has been applied.
/// Both sets only grow, or are reset wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimConfig {
    pub forward_blacklist: BTreeSet<String>,
    pub composite_ops_record: BTreeSet<String>,
}

impl PrimConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_forward_blacklist<I, S>(&mut self, ops: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forward_blacklist.extend(ops.into_iter().map(Into::into));
    }

    pub fn reset_forward_blacklist(&mut self) {
        self.forward_blacklist = BTreeSet::new();
    }

    pub fn is_forward_blacklisted(&self, op: &str) -> bool {
        self.forward_blacklist.contains(op)
    }

    /// Returns `false` if the op was already recorded.
    pub fn record_composite_op(&mut self, op: impl Into<String>) -> bool {
        self.composite_ops_record.insert(op.into())
    }

    pub fn reset_composite_ops_record(&mut self) {
        self.composite_ops_record.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blacklist_has_set_semantics() {
        let mut cfg = PrimConfig::new();
        cfg.set_forward_blacklist(["softmax", "gelu"]);
        cfg.set_forward_blacklist(["softmax"]);
        cfg.set_forward_blacklist(vec!["gelu".to_string(), "layer_norm".to_string()]);
        assert_eq!(cfg.forward_blacklist.len(), 3);
        assert!(cfg.is_forward_blacklisted("layer_norm"));
    }

    #[test]
    fn reset_empties_blacklist() {
        let mut cfg = PrimConfig::new();
        cfg.set_forward_blacklist(["softmax"]);
        cfg.reset_forward_blacklist();
        assert!(cfg.forward_blacklist.is_empty());
        assert!(!cfg.is_forward_blacklisted("softmax"));
    }

    #[test]
    fn composite_record_dedups() {
        let mut cfg = PrimConfig::new();
        assert!(cfg.record_composite_op("batch_norm"));
        assert!(!cfg.record_composite_op("batch_norm"));
        assert_eq!(cfg.composite_ops_record.len(), 1);
    }
}
