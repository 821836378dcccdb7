use kiln_ir::{Computation, Opcode};

use crate::config::FusionConfig;
use crate::decision::{FusionDecision, Rejection};
use crate::heuristics::*;
use crate::test::helpers::*;

#[test]
fn test_reduce_consumer_is_accepted() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[1024]));
    let exp = comp.unary(Opcode::Exp, p0).unwrap();
    let reduce = add_reduce(&mut comp, exp, &[0]);

    assert!(should_fuse_producer_consumer_mof(comp.instr(exp), comp.instr(reduce), &FusionConfig::default()));
}

#[test]
fn test_elementwise_consumer_needs_experimental_path() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[1024]));
    let exp = comp.unary(Opcode::Exp, p0).unwrap();
    let neg = comp.unary(Opcode::Negate, exp).unwrap();
    let (exp, neg) = (comp.instr(exp), comp.instr(neg));

    assert_eq!(
        explain_should_fuse_producer_consumer_mof(exp, neg, &FusionConfig::default()),
        FusionDecision::Reject(Rejection::NotInputFusibleReduction)
    );
    assert_eq!(
        explain_should_fuse_producer_consumer_mof(exp, neg, &FusionConfig::experimental()),
        FusionDecision::Accept
    );
}

#[test]
fn test_consumer_must_be_multi_output_root() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[32, 64]));
    let exp = comp.unary(Opcode::Exp, p0).unwrap();
    let transpose = comp.transpose(exp, &[1, 0]).unwrap();

    for config in [FusionConfig::default(), FusionConfig::experimental()] {
        assert_eq!(
            explain_should_fuse_producer_consumer_mof(comp.instr(exp), comp.instr(transpose), &config),
            FusionDecision::Reject(Rejection::NotMultiOutputRoot)
        );
    }
}

#[test]
fn test_constant_producer_is_rejected() {
    let mut comp = Computation::new("entry");
    let c = comp.constant(f32(&[1024]));
    let reduce = add_reduce(&mut comp, c, &[0]);

    assert_eq!(
        explain_should_fuse_producer_consumer_mof(comp.instr(c), comp.instr(reduce), &FusionConfig::default()),
        FusionDecision::Reject(Rejection::ConstantProducer)
    );
}

#[test]
fn test_incompatible_producer_is_rejected() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[512]));
    let exp = comp.unary(Opcode::Exp, p0).unwrap();
    let p1 = comp.parameter(f32(&[1024]));
    let reduce = add_reduce(&mut comp, p1, &[0]);

    assert_eq!(
        explain_should_fuse_producer_consumer_mof(comp.instr(exp), comp.instr(reduce), &FusionConfig::default()),
        FusionDecision::Reject(Rejection::IncompatibleShapes)
    );
}

#[test]
fn test_too_large_is_rejected() {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[1024]));
    let exp = comp.unary(Opcode::Exp, p0).unwrap();
    let reduce = add_reduce(&mut comp, exp, &[0]);
    let config = FusionConfig::builder().max_operands_and_outputs_per_fusion(3).build();

    // {p0, init} plus two outputs.
    assert_eq!(
        explain_should_fuse_producer_consumer_mof(comp.instr(exp), comp.instr(reduce), &config),
        FusionDecision::Reject(Rejection::TooLarge)
    );
}
