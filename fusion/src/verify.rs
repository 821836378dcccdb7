//! Fusion kind verification.

use kiln_ir::{Computation, FusionKind};
use snafu::ensure;

use crate::emission::is_reduction_from_or_to_contiguous_dimensions;
use crate::error::*;

/// Check that every fusion rooted at a contiguous reduction is an input fusion.
///
/// The classifiers treat a violation as fatal. Running this first turns it
/// into a recoverable error. Nested fused computations are checked too.
pub fn verify_fusion_kinds(computation: &Computation) -> Result<()> {
    for instr in computation.instructions() {
        let Some(fusion) = instr.as_fusion() else {
            continue;
        };
        let root = fusion.root();
        let rooted_at_reduction = if fusion.is_multi_output() {
            root.operands().any(is_reduction_from_or_to_contiguous_dimensions)
        } else {
            is_reduction_from_or_to_contiguous_dimensions(root)
        };
        ensure!(
            !rooted_at_reduction || fusion.kind() == FusionKind::Input,
            FusionKindMismatchSnafu {
                fusion: instr.name(),
                computation: computation.name(),
                kind: fusion.kind(),
            }
        );
        verify_fusion_kinds(fusion.computation())?;
    }
    Ok(())
}
