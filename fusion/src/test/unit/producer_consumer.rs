use kiln_dtype::ElementType;
use kiln_ir::{Computation, FusionKind, Opcode, Shape};

use crate::decision::{FusionDecision, Rejection};
use crate::emission::CUBLAS_GEMM_CALL_TARGET;
use crate::producer_consumer::*;
use crate::test::helpers::*;

#[test]
fn test_elementwise_into_contiguous_reduce() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[1024]));
    let p1 = comp.parameter(f32(&[1024]));
    let add = comp.binary(Opcode::Add, p0, p1).unwrap();
    let reduce = add_reduce(&mut comp, add, &[0]);
    let (add, reduce) = (comp.instr(add), comp.instr(reduce));

    assert!(is_producer_consumer_fusible(add, reduce));
    assert_eq!(choose_fusion_kind(add, reduce), FusionKind::Input);
}

#[test]
fn test_elementwise_into_elementwise() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[1024]));
    let exp = comp.unary(Opcode::Exp, p0).unwrap();
    let neg = comp.unary(Opcode::Negate, exp).unwrap();
    let (exp, neg) = (comp.instr(exp), comp.instr(neg));

    assert_eq!(explain_producer_consumer_fusible(exp, neg), FusionDecision::Accept);
    assert_eq!(choose_fusion_kind(exp, neg), FusionKind::Loop);
}

#[test]
fn test_fusion_kind_ignores_producer() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[1024]));
    let fusion = comp.fusion(FusionKind::Input, &[p0], reduce_body(f32(&[1024]), &[0])).unwrap();
    let exp = comp.unary(Opcode::Exp, p0).unwrap();
    let neg = comp.unary(Opcode::Negate, exp).unwrap();

    assert_eq!(choose_fusion_kind(comp.instr(fusion), comp.instr(neg)), FusionKind::Loop);
    assert_eq!(choose_fusion_kind(comp.instr(exp), comp.instr(fusion)), FusionKind::Input);
}

#[test]
fn test_producer_must_be_loop_fusible() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[1024]));
    let reduce = add_reduce(&mut comp, p0, &[0]);
    let neg = comp.unary(Opcode::Negate, reduce).unwrap();

    assert_eq!(
        explain_producer_consumer_fusible(comp.instr(reduce), comp.instr(neg)),
        FusionDecision::Reject(Rejection::ProducerNotLoopFusible)
    );
    assert!(!is_producer_consumer_fusible(comp.instr(p0), comp.instr(reduce)));
}

#[test]
fn test_consumer_must_be_fusible() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[4]));
    let exp = comp.unary(Opcode::Exp, p0).unwrap();
    let tuple = comp.tuple(&[exp]).unwrap();

    assert_eq!(
        explain_producer_consumer_fusible(comp.instr(exp), comp.instr(tuple)),
        FusionDecision::Reject(Rejection::ConsumerNotFusible)
    );
}

#[test]
fn test_multi_output_producer_is_rejected() {
    let mut body = Computation::new("fused");
    let fp0 = body.parameter(f32(&[1024]));
    let exp = body.unary(Opcode::Exp, fp0).unwrap();
    let log = body.unary(Opcode::Log, fp0).unwrap();
    body.tuple(&[exp, log]).unwrap();

    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[1024]));
    let fusion = comp.fusion(FusionKind::Loop, &[p0], body).unwrap();
    let gte = comp.get_tuple_element(fusion, 0).unwrap();
    let neg = comp.unary(Opcode::Negate, gte).unwrap();

    assert_eq!(
        explain_producer_consumer_fusible(comp.instr(fusion), comp.instr(neg)),
        FusionDecision::Reject(Rejection::ProducerIsMultiOutputFusion)
    );
}

#[test]
fn test_bitcast_of_gemm_stays_unfused() {
    let mut comp = Computation::new("entry");
    let lhs = comp.parameter(f32(&[32, 16]));
    let rhs = comp.parameter(f32(&[16, 64]));
    let dot = comp.instruction().opcode(Opcode::Dot).shape(f32(&[32, 64])).operands(vec![lhs, rhs]).call().unwrap();
    let transpose = comp.transpose(dot, &[1, 0]).unwrap();
    let neg = comp.unary(Opcode::Negate, transpose).unwrap();
    let flatten = comp.reshape(dot, &[2048]).unwrap();
    let exp = comp.unary(Opcode::Exp, flatten).unwrap();

    assert_eq!(
        explain_producer_consumer_fusible(comp.instr(transpose), comp.instr(neg)),
        FusionDecision::Reject(Rejection::BitcastOfLibraryCall)
    );
    // A real reshape is not a bitcast candidate.
    assert!(is_producer_consumer_fusible(comp.instr(flatten), comp.instr(exp)));
}

#[test]
fn test_degenerate_reshape_of_custom_gemm_stays_unfused() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[32, 64]));
    let gemm = comp
        .instruction()
        .opcode(Opcode::CustomCall)
        .shape(f32(&[32, 64]))
        .operands(vec![p0])
        .custom_call_target(CUBLAS_GEMM_CALL_TARGET)
        .call()
        .unwrap();
    let reshape = comp.reshape(gemm, &[32, 1, 64]).unwrap();
    let neg = comp.unary(Opcode::Negate, reshape).unwrap();

    assert!(!is_producer_consumer_fusible(comp.instr(reshape), comp.instr(neg)));
}

fn scalar_into_loop_fusion(constant: Shape) -> bool {
    let mut body = Computation::new("fused");
    let fp0 = body.parameter(f32(&[4]));
    let fp1 = body.parameter(constant.clone());
    let splat = body.instruction().opcode(Opcode::Broadcast).shape(f32(&[4])).operands(vec![fp1]).call().unwrap();
    body.binary(Opcode::Multiply, fp0, splat).unwrap();

    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[4]));
    let c = comp.constant(constant);
    let fusion = comp.fusion(FusionKind::Loop, &[p0, c], body).unwrap();
    is_producer_consumer_fusible(comp.instr(c), comp.instr(fusion))
}

#[test]
fn test_scalar_constant_into_loop_fusion() {
    assert!(scalar_into_loop_fusion(scalar_f32()));
    assert!(scalar_into_loop_fusion(f32(&[1, 1])));
    assert!(!scalar_into_loop_fusion(f32(&[4])));
}

#[test]
fn test_constant_only_fuses_into_existing_fusion() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[4]));
    let scalar = comp.constant(scalar_f32());
    let splat = comp.broadcast(scalar, &[4], &[]).unwrap();
    let vector = comp.constant(f32(&[4]));
    let add = comp.binary(Opcode::Add, p0, vector).unwrap();

    assert_eq!(
        explain_producer_consumer_fusible(comp.instr(scalar), comp.instr(splat)),
        FusionDecision::Reject(Rejection::ConstantIntoNonFusion)
    );
    assert_eq!(
        explain_producer_consumer_fusible(comp.instr(vector), comp.instr(add)),
        FusionDecision::Reject(Rejection::NonScalarConstant)
    );
}

#[test]
fn test_multi_output_sibling_of_reduce() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[1024]));
    let exp = comp.unary(Opcode::Exp, p0).unwrap();
    let reduce = add_reduce(&mut comp, exp, &[0]);

    assert!(is_producer_consumer_multi_output_fusible(comp.instr(exp), comp.instr(reduce)));
}

#[test]
fn test_multi_output_rejections() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[1024]));
    let exp = comp.unary(Opcode::Exp, p0).unwrap();
    let reduce = add_reduce(&mut comp, exp, &[0]);
    let other = comp.parameter(f32(&[512]));
    let other_exp = comp.unary(Opcode::Exp, other).unwrap();
    let indices = comp.parameter(Shape::array(ElementType::S32, [8]));
    let updates = comp.parameter(f32(&[8]));
    let scatter = comp.scatter(exp, indices, updates).unwrap();

    assert_eq!(
        explain_producer_consumer_multi_output_fusible(comp.instr(reduce), comp.instr(exp)),
        FusionDecision::Reject(Rejection::ProducerNotLoopFusible)
    );
    assert_eq!(
        explain_producer_consumer_multi_output_fusible(comp.instr(exp), comp.instr(scatter)),
        FusionDecision::Reject(Rejection::NotMultiOutputRoot)
    );
    assert_eq!(
        explain_producer_consumer_multi_output_fusible(comp.instr(other_exp), comp.instr(reduce)),
        FusionDecision::Reject(Rejection::IncompatibleShapes)
    );
}

#[test]
fn test_multi_output_checks_layouts_for_any_consumer() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32_with_layout(&[32, 64], &[1, 0]));
    let p1 = comp.parameter(f32_with_layout(&[32, 64], &[0, 1]));
    let exp = comp.unary(Opcode::Exp, p0).unwrap();
    let add = comp
        .instruction()
        .opcode(Opcode::Add)
        .shape(f32_with_layout(&[32, 64], &[1, 0]))
        .operands(vec![exp, p1])
        .call()
        .unwrap();

    assert_eq!(
        explain_producer_consumer_multi_output_fusible(comp.instr(exp), comp.instr(add)),
        FusionDecision::Reject(Rejection::UnfriendlyLayouts)
    );
}
