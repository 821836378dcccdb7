//! Kernel emission facts the fusion rules depend on.
//!
//! The kernel emitter lowers two families of instructions specially: reductions
//! whose reduced or kept dimensions are physically contiguous (emitted as
//! tiled row or column reductions) and instructions handed to vendor
//! libraries. Fusion decisions must agree with the emitter on both.

use kiln_dtype::ElementType;
use kiln_ir::{ArrayShape, InstrRef, Opcode};
use smallvec::SmallVec;

/// Threads per warp on the target.
pub const WARP_SIZE: i64 = 32;

pub const CUBLAS_GEMM_CALL_TARGET: &str = "__cublas$gemm";
pub const CUDNN_CONV_FORWARD_CALL_TARGET: &str = "__cudnn$convForward";
pub const CUDNN_CONV_BACKWARD_INPUT_CALL_TARGET: &str = "__cudnn$convBackwardInput";
pub const CUDNN_CONV_BACKWARD_FILTER_CALL_TARGET: &str = "__cudnn$convBackwardFilter";
pub const CUDNN_CONV_BIAS_ACTIVATION_FORWARD_CALL_TARGET: &str = "__cudnn$convBiasActivationForward";
pub const CUDNN_BATCH_NORM_FORWARD_INFERENCE_CALL_TARGET: &str = "__cudnn$batchNormForwardInference";
pub const CUDNN_BATCH_NORM_FORWARD_TRAINING_CALL_TARGET: &str = "__cudnn$batchNormForwardTraining";
pub const CUDNN_BATCH_NORM_BACKWARD_CALL_TARGET: &str = "__cudnn$batchNormBackward";
pub const CUSOLVER_POTRF_CALL_TARGET: &str = "__cusolver$potrf";

const LIBRARY_CALL_TARGETS: [&str; 9] = [
    CUBLAS_GEMM_CALL_TARGET,
    CUDNN_CONV_FORWARD_CALL_TARGET,
    CUDNN_CONV_BACKWARD_INPUT_CALL_TARGET,
    CUDNN_CONV_BACKWARD_FILTER_CALL_TARGET,
    CUDNN_CONV_BIAS_ACTIVATION_FORWARD_CALL_TARGET,
    CUDNN_BATCH_NORM_FORWARD_INFERENCE_CALL_TARGET,
    CUDNN_BATCH_NORM_FORWARD_TRAINING_CALL_TARGET,
    CUDNN_BATCH_NORM_BACKWARD_CALL_TARGET,
    CUSOLVER_POTRF_CALL_TARGET,
];

// ============================================================================
// REDUCTIONS
// ============================================================================

/// A reduction collapsed to three physical components.
///
/// `dimensions` is ordered major to minor. For a row reduction the reduced
/// component is `dimensions[2]`; for a column reduction it is `dimensions[1]`
/// and the kept component is `dimensions[2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReductionDimensions {
    pub is_row_reduction: bool,
    pub dimensions: [i64; 3],
}

/// Collapse a `reduce` into row or column form.
///
/// Returns `None` for anything that is not an array-input reduce, and for
/// reductions where neither the kept nor the reduced dimensions are
/// consecutive in the input layout.
pub fn reduction_dimensions(reduce: InstrRef<'_>) -> Option<ReductionDimensions> {
    if reduce.opcode() != Opcode::Reduce || reduce.operand_count() == 0 {
        return None;
    }
    let input = reduce.operand(0).shape().as_array()?;
    let reduced = reduce.dimensions();
    let kept: SmallVec<[usize; 4]> = (0..input.rank()).filter(|d| !reduced.contains(d)).collect();
    let layout = input.layout();

    if layout.are_dimensions_consecutive(&kept) {
        let [major, kept_size, minor] = partition_by_middle(input, &kept);
        if kept_size == 1 {
            return Some(ReductionDimensions { is_row_reduction: true, dimensions: [1, 1, major * minor] });
        }
        if minor == 1 {
            return Some(ReductionDimensions { is_row_reduction: false, dimensions: [1, major, kept_size] });
        }
        return Some(ReductionDimensions { is_row_reduction: true, dimensions: [major, kept_size, minor] });
    }

    if layout.are_dimensions_consecutive(reduced) {
        let [major, reduced_size, minor] = partition_by_middle(input, reduced);
        if minor == 1 {
            return Some(ReductionDimensions { is_row_reduction: true, dimensions: [1, major, reduced_size] });
        }
        return Some(ReductionDimensions { is_row_reduction: false, dimensions: [major, reduced_size, minor] });
    }

    None
}

/// Products of the dimensions physically before, inside and after `middle`.
///
/// `middle` must be consecutive in the layout.
fn partition_by_middle(shape: &ArrayShape, middle: &[usize]) -> [i64; 3] {
    let mut parts = [1i64; 3];
    let mut stage = 0;
    for dim in shape.layout().major_to_minor() {
        let size = shape.dims()[dim];
        if middle.contains(&dim) {
            stage = 1;
            parts[1] *= size;
        } else {
            if stage == 1 {
                stage = 2;
            }
            parts[stage] *= size;
        }
    }
    parts
}

/// Whether `instr` is a reduce the emitter lowers as a tiled row or column
/// reduction rather than elementally.
pub fn is_reduction_from_or_to_contiguous_dimensions(instr: InstrRef<'_>) -> bool {
    if instr.opcode() != Opcode::Reduce {
        return false;
    }
    if instr.shape().element_type() == Some(ElementType::C128) {
        return false;
    }
    let Some(ReductionDimensions { is_row_reduction, dimensions: [_, d1, d2] }) = reduction_dimensions(instr) else {
        return false;
    };
    if is_row_reduction { d2 >= WARP_SIZE } else { d1 >= WARP_SIZE && d2 >= WARP_SIZE }
}

// ============================================================================
// LIBRARY CALLS
// ============================================================================

/// Rank-2 dot with a GEMM-supported output type and non-empty operands.
pub fn is_matrix_multiplication(dot: InstrRef<'_>) -> bool {
    if dot.opcode() != Opcode::Dot || dot.operand_count() != 2 {
        return false;
    }
    let (Some(lhs), Some(rhs), Some(output)) =
        (dot.operand(0).shape().as_array(), dot.operand(1).shape().as_array(), dot.shape().as_array())
    else {
        return false;
    };
    let type_is_allowed = matches!(
        output.element_type(),
        ElementType::F16 | ElementType::F32 | ElementType::F64 | ElementType::C64 | ElementType::C128
    );
    lhs.rank() == 2
        && rhs.rank() == 2
        && output.rank() == 2
        && type_is_allowed
        && !lhs.is_zero_element()
        && !rhs.is_zero_element()
}

/// Whether the emitter hands `instr` to a vendor library.
pub fn is_implemented_as_library_call(instr: InstrRef<'_>) -> bool {
    match instr.opcode() {
        Opcode::Dot => is_matrix_multiplication(instr),
        Opcode::CustomCall => instr.custom_call_target().is_some_and(|target| LIBRARY_CALL_TARGETS.contains(&target)),
        _ => false,
    }
}
