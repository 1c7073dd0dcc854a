//! Argument bookkeeping for composite (decomposed) ops.
//!
//! Some composite rules drop inputs or outputs of the original op. Those
//! arguments end up absent in the processed program and must be exempted
//! from argument checks.

/// Attributes of `batch_norm` that decide which outputs its rule produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchNormAttrs {
    pub is_test: bool,
    pub trainable_statistics: bool,
    pub use_global_stats: bool,
}

impl BatchNormAttrs {
    /// Running statistics are used instead of batch statistics.
    pub fn uses_running_stats(&self) -> bool {
        (self.is_test && !self.trainable_statistics) || self.use_global_stats
    }
}

/// Arguments the composite rule of `op` leaves absent, or `None` if the op
/// has no such arguments.
pub fn ops_contain_none(op: &str, batch_norm: Option<&BatchNormAttrs>) -> Option<Vec<&'static str>> {
    match op {
        "batch_norm" => {
            let attrs = batch_norm.copied().unwrap_or_default();
            if attrs.uses_running_stats() {
                Some(vec!["ReserveSpace", "SavedMean", "SavedVariance"])
            } else {
                Some(vec!["ReserveSpace"])
            }
        }
        "flatten_contiguous_range" | "squeeze2" | "unsqueeze2" => Some(vec!["XShape"]),
        _ => None,
    }
}

/// Output indices that a decomposed op returns as none to keep its output
/// count unchanged (intermediates such as `xshape`).
pub fn decomp_unused_outputs(op: &str) -> &'static [usize] {
    match op {
        "pd_op.squeeze" | "pd_op.unsqueeze" => &[1],
        "pd_op.batch_norm" => &[5],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_norm_inference_drops_saved_stats() {
        let attrs = BatchNormAttrs {
            is_test: true,
            ..Default::default()
        };
        assert_eq!(
            ops_contain_none("batch_norm", Some(&attrs)),
            Some(vec!["ReserveSpace", "SavedMean", "SavedVariance"])
        );
    }

    #[test]
    fn batch_norm_training_keeps_saved_stats() {
        let attrs = BatchNormAttrs {
            is_test: true,
            trainable_statistics: true,
            use_global_stats: false,
        };
        assert_eq!(ops_contain_none("batch_norm", Some(&attrs)), Some(vec!["ReserveSpace"]));

        let global = BatchNormAttrs {
            use_global_stats: true,
            ..attrs
        };
        assert!(global.uses_running_stats());
    }

    #[test]
    fn shape_ops_drop_xshape() {
        for op in ["flatten_contiguous_range", "squeeze2", "unsqueeze2"] {
            assert_eq!(ops_contain_none(op, None), Some(vec!["XShape"]));
        }
        assert_eq!(ops_contain_none("matmul", None), None);
    }

    #[test]
    fn unused_output_indices() {
        assert_eq!(decomp_unused_outputs("pd_op.squeeze"), &[1]);
        assert_eq!(decomp_unused_outputs("pd_op.batch_norm"), &[5]);
        assert!(decomp_unused_outputs("pd_op.relu").is_empty());
    }
}
