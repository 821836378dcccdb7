//! Single-instruction classifiers.
//!
//! Each predicate answers whether one instruction can take part in a fusion
//! at all, and under which kernel emission strategy.

use kiln_ir::{FusionKind, FusionView, InstrRef, Opcode};

use crate::emission::is_reduction_from_or_to_contiguous_dimensions;

/// Fusion whose root (or, for a multi-output fusion, one of the root's
/// operands) is a contiguous-dimension reduction.
///
/// # Panics
///
/// Panics if such a fusion is not of kind [`FusionKind::Input`]. That graph
/// is inconsistent and kernels generated from it would be wrong.
pub fn is_reduce_input_fusion(instr: InstrRef<'_>) -> bool {
    let Some(fusion) = instr.as_fusion() else {
        return false;
    };
    let rooted_at_reduction = if fusion.is_multi_output() {
        fusion.root().operands().any(is_reduction_from_or_to_contiguous_dimensions)
    } else {
        is_reduction_from_or_to_contiguous_dimensions(fusion.root())
    };
    if rooted_at_reduction {
        assert_input_kind(fusion);
    }
    rooted_at_reduction
}

fn assert_input_kind(fusion: FusionView<'_>) {
    if fusion.kind() == FusionKind::Input {
        return;
    }
    let what = if fusion.is_multi_output() { "multi-output fusion" } else { "fusion" };
    tracing::error!(fusion = %fusion.instr().name(), kind = %fusion.kind(), "{what} rooted at reduction is not an input fusion");
    panic!("{what} rooted at reduction-to-vector op must be of kind kInput: {}", fusion.instr());
}

/// Reduction that needs input fusion emission, directly or as a fusion root.
///
/// Variadic (tuple-shaped) reductions are never input-fusible.
pub fn is_input_fusible_reduction(instr: InstrRef<'_>) -> bool {
    if instr.opcode() == Opcode::Reduce && instr.shape().is_tuple() {
        return false;
    }
    is_reduce_input_fusion(instr) || is_reduction_from_or_to_contiguous_dimensions(instr)
}

/// Scatter, or an input fusion rooted at a scatter.
pub fn is_input_fusible_scatter(instr: InstrRef<'_>) -> bool {
    match instr.opcode() {
        Opcode::Scatter => true,
        Opcode::Fusion => instr
            .as_fusion()
            .is_some_and(|fusion| fusion.kind() == FusionKind::Input && fusion.root().opcode() == Opcode::Scatter),
        _ => false,
    }
}

/// Fusible under the input fusion strategy.
pub fn is_input_fusible(instr: InstrRef<'_>) -> bool {
    instr.is_fusible() && (is_input_fusible_reduction(instr) || is_input_fusible_scatter(instr))
}

/// Fusible under the loop fusion strategy.
///
/// Get-tuple-element is left out: an unfused one becomes an address
/// computation at the top of its consuming kernel.
pub fn is_loop_fusible(instr: InstrRef<'_>) -> bool {
    if !instr.is_fusible() {
        return false;
    }
    if instr.is_elementwise() && instr.operand_count() > 0 {
        return true;
    }
    match instr.opcode() {
        Opcode::Bitcast
        | Opcode::Broadcast
        | Opcode::Concatenate
        | Opcode::DynamicSlice
        | Opcode::DynamicUpdateSlice
        | Opcode::Gather
        | Opcode::Iota
        | Opcode::Pad
        | Opcode::ReduceWindow
        | Opcode::Reshape
        | Opcode::Reverse
        | Opcode::Slice
        | Opcode::Constant
        | Opcode::Transpose => true,
        Opcode::Fusion => instr.is_loop_fusion(),
        Opcode::Reduce => !instr.shape().is_tuple() && !is_reduction_from_or_to_contiguous_dimensions(instr),
        _ => false,
    }
}

pub fn is_fusible(instr: InstrRef<'_>) -> bool {
    is_input_fusible(instr) || is_loop_fusible(instr)
}

/// Whether `instr` can be the root of a multi-output fusion.
///
/// Scatter is excluded; its emitter has no multi-output form.
pub fn is_fusible_as_multi_output_fusion_root(instr: InstrRef<'_>) -> bool {
    instr.is_fusible() && (is_input_fusible_reduction(instr) || instr.is_loop_fusion() || instr.is_elementwise())
}
