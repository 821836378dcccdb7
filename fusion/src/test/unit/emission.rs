use kiln_dtype::ElementType;
use kiln_ir::{Computation, Opcode, Shape};
use test_case::test_case;

use crate::emission::*;
use crate::test::helpers::*;

fn reduce_of(input: Shape, dims: &[usize]) -> (Computation, kiln_ir::InstrId) {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(input);
    let reduce = add_reduce(&mut comp, p0, dims);
    (comp, reduce)
}

#[test_case(&[1024], &[0], true, [1, 1, 1024]; "full_reduce")]
#[test_case(&[16, 64], &[1], true, [1, 16, 64]; "minor_dim")]
#[test_case(&[64, 64], &[0], false, [1, 64, 64]; "major_dim")]
#[test_case(&[8, 64, 4], &[0, 2], true, [8, 64, 4]; "kept_in_the_middle")]
#[test_case(&[8, 1, 64], &[0, 2], true, [1, 1, 512]; "kept_degenerate")]
#[test_case(&[4, 8, 64], &[1], false, [4, 8, 64]; "reduced_in_the_middle")]
fn test_reduction_dimensions(dims: &[i64], reduced: &[usize], is_row_reduction: bool, expected: [i64; 3]) {
    let (comp, reduce) = reduce_of(f32(dims), reduced);
    assert_eq!(
        reduction_dimensions(comp.instr(reduce)),
        Some(ReductionDimensions { is_row_reduction, dimensions: expected })
    );
}

#[test]
fn test_reduction_dimensions_follow_layout() {
    // Column-major input: logical dim 0 is physically minor.
    let (comp, reduce) = reduce_of(f32_with_layout(&[64, 16], &[0, 1]), &[0]);
    assert_eq!(
        reduction_dimensions(comp.instr(reduce)),
        Some(ReductionDimensions { is_row_reduction: true, dimensions: [1, 16, 64] })
    );
}

#[test]
fn test_scattered_dimensions_are_not_contiguous() {
    let (comp, reduce) = reduce_of(f32(&[32, 32, 32, 32]), &[1, 3]);
    assert_eq!(reduction_dimensions(comp.instr(reduce)), None);
    assert!(!is_reduction_from_or_to_contiguous_dimensions(comp.instr(reduce)));
}

#[test_case(&[1024], &[0], true; "long_row")]
#[test_case(&[16], &[0], false; "short_row")]
#[test_case(&[64, 64], &[0], true; "wide_column")]
#[test_case(&[64, 16], &[0], false; "narrow_column")]
#[test_case(&[16, 64], &[0], false; "short_column")]
fn test_warp_size_threshold(dims: &[i64], reduced: &[usize], expected: bool) {
    let (comp, reduce) = reduce_of(f32(dims), reduced);
    assert_eq!(is_reduction_from_or_to_contiguous_dimensions(comp.instr(reduce)), expected);
}

#[test]
fn test_complex128_reduction_is_not_contiguous() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(Shape::array(ElementType::C128, [1024]));
    let init = comp.constant(Shape::scalar(ElementType::C128));
    let reduce = comp.reduce(p0, init, &[0]).unwrap();
    assert!(!is_reduction_from_or_to_contiguous_dimensions(comp.instr(reduce)));
}

#[test]
fn test_non_reduce_is_not_contiguous_reduction() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[1024]));
    let exp = comp.unary(Opcode::Exp, p0).unwrap();
    assert!(!is_reduction_from_or_to_contiguous_dimensions(comp.instr(exp)));
    assert_eq!(reduction_dimensions(comp.instr(exp)), None);
}

#[test]
fn test_gemm_dot_is_library_call() {
    let mut comp = Computation::new("entry");
    let lhs = comp.parameter(f32(&[32, 16]));
    let rhs = comp.parameter(f32(&[16, 8]));
    let dot = comp.instruction().opcode(Opcode::Dot).shape(f32(&[32, 8])).operands(vec![lhs, rhs]).call().unwrap();
    assert!(is_matrix_multiplication(comp.instr(dot)));
    assert!(is_implemented_as_library_call(comp.instr(dot)));
}

#[test]
fn test_integer_dot_is_not_library_call() {
    let mut comp = Computation::new("entry");
    let s32 = |dims: [i64; 2]| Shape::array(ElementType::S32, dims);
    let lhs = comp.parameter(s32([32, 16]));
    let rhs = comp.parameter(s32([16, 8]));
    let dot = comp.instruction().opcode(Opcode::Dot).shape(s32([32, 8])).operands(vec![lhs, rhs]).call().unwrap();
    assert!(!is_implemented_as_library_call(comp.instr(dot)));
}

#[test]
fn test_empty_or_batched_dot_is_not_library_call() {
    let mut comp = Computation::new("entry");
    let empty = comp.parameter(f32(&[0, 16]));
    let rhs = comp.parameter(f32(&[16, 8]));
    let dot = comp.instruction().opcode(Opcode::Dot).shape(f32(&[0, 8])).operands(vec![empty, rhs]).call().unwrap();
    assert!(!is_implemented_as_library_call(comp.instr(dot)));

    let lhs = comp.parameter(f32(&[2, 32, 16]));
    let rhs = comp.parameter(f32(&[2, 16, 8]));
    let dot = comp.instruction().opcode(Opcode::Dot).shape(f32(&[2, 32, 8])).operands(vec![lhs, rhs]).call().unwrap();
    assert!(!is_implemented_as_library_call(comp.instr(dot)));
}

#[test_case(CUBLAS_GEMM_CALL_TARGET, true; "cublas_gemm")]
#[test_case(CUDNN_CONV_FORWARD_CALL_TARGET, true; "cudnn_conv")]
#[test_case(CUDNN_BATCH_NORM_BACKWARD_CALL_TARGET, true; "cudnn_batch_norm")]
#[test_case(CUSOLVER_POTRF_CALL_TARGET, true; "cusolver")]
#[test_case("my_custom_kernel", false; "user_kernel")]
fn test_custom_call_library_targets(target: &str, expected: bool) {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[32, 32]));
    let call = comp
        .instruction()
        .opcode(Opcode::CustomCall)
        .shape(f32(&[32, 32]))
        .operands(vec![p0])
        .custom_call_target(target)
        .call()
        .unwrap();
    assert_eq!(is_implemented_as_library_call(comp.instr(call)), expected);
}
