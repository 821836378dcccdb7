//! Operand and output budget of a merged fusion.
//!
//! The target caps kernel arguments, and the exact number a fusion will need
//! is only known after buffer assignment. The cap in
//! [`FusionConfig`](crate::FusionConfig) bounds operands plus outputs instead.

use std::collections::HashSet;

use kiln_ir::InstrRef;

use crate::config::FusionConfig;

/// Output buffers of a fusion made from `a` and `b`.
///
/// Can be off by one, e.g. when a new multi-output fusion adds its tuple
/// buffer or when `a` has no user besides `b`. The cap is loose enough to
/// absorb that.
pub(crate) fn output_buffer_count(a: InstrRef<'_>, b: InstrRef<'_>) -> usize {
    a.shape().subshape_count() + b.shape().subshape_count()
}

/// Upper bound on operands plus outputs from raw operand counts.
///
/// The minus one accounts for a producer/consumer edge between `a` and `b`.
pub(crate) fn estimated_operands_and_outputs(a: InstrRef<'_>, b: InstrRef<'_>) -> usize {
    (a.operand_count() + b.operand_count()).saturating_sub(1) + output_buffer_count(a, b)
}

/// Exact operands plus outputs: the distinct operands of both instructions,
/// minus any edge between them, which is being fused away.
pub(crate) fn exact_operands_and_outputs(a: InstrRef<'_>, b: InstrRef<'_>) -> usize {
    let mut operands: HashSet<InstrRef<'_>> = a.operands().chain(b.operands()).collect();
    operands.remove(&a);
    operands.remove(&b);
    operands.len() + output_buffer_count(a, b)
}

/// Whether fusing `a` and `b` would exceed the configured operand cap.
pub fn fusion_would_be_too_large(a: InstrRef<'_>, b: InstrRef<'_>, config: &FusionConfig) -> bool {
    let cap = config.max_operands_and_outputs_per_fusion;
    if estimated_operands_and_outputs(a, b) <= cap {
        return false;
    }
    exact_operands_and_outputs(a, b) > cap
}
