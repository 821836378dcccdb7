use std::thread;

use kiln_ir::{Computation, InstrRef, Opcode};

use crate::classify::is_fusible;
use crate::config::FusionConfig;
use crate::heuristics::{postpone_fusion, should_fuse_producer_consumer_mof};
use crate::producer_consumer::{choose_fusion_kind, is_producer_consumer_fusible};
use crate::test::helpers::*;

fn graph() -> Computation {
    let mut comp = Computation::new("entry");
    let p0 = comp.parameter(f32(&[32, 1024]));
    let p1 = comp.parameter(f32(&[32, 1024]));
    let add = comp.binary(Opcode::Add, p0, p1).unwrap();
    let exp = comp.unary(Opcode::Exp, add).unwrap();
    let half = comp.convert(exp, kiln_dtype::ElementType::F16).unwrap();
    let neg = comp.unary(Opcode::Negate, half).unwrap();
    let rows = add_reduce(&mut comp, exp, &[1]);
    let total = add_reduce(&mut comp, add, &[0, 1]);
    let scalar = comp.constant(scalar_f32());
    let transpose = comp.transpose(add, &[1, 0]).unwrap();
    comp.tuple(&[neg, rows, total, scalar, transpose]).unwrap();
    comp
}

type Answers = Vec<(bool, bool, bool, bool, bool)>;

fn decide_all(comp: &Computation, config: &FusionConfig) -> Answers {
    let instrs: Vec<InstrRef<'_>> = comp.instructions().collect();
    let mut answers = Vec::with_capacity(instrs.len() * instrs.len());
    for &producer in &instrs {
        for &consumer in &instrs {
            answers.push((
                is_fusible(consumer),
                is_producer_consumer_fusible(producer, consumer),
                should_fuse_producer_consumer_mof(producer, consumer, config),
                postpone_fusion(producer, consumer, config),
                choose_fusion_kind(producer, consumer) == kiln_ir::FusionKind::Input,
            ));
        }
    }
    answers
}

#[test]
fn test_concurrent_decisions_match_sequential() {
    let comp = graph();
    let config = FusionConfig::experimental();
    let expected = decide_all(&comp, &config);

    let results: Vec<Answers> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| decide_all(&comp, &config))).collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    for result in results {
        assert_eq!(result, expected);
    }
}
