//! Pairwise fusion rules.

use kiln_ir::{FusionKind, InstrRef, Opcode};

use crate::classify::{
    is_fusible, is_fusible_as_multi_output_fusion_root, is_input_fusible, is_input_fusible_reduction, is_loop_fusible,
};
use crate::decision::{FusionDecision, Rejection};
use crate::emission::is_implemented_as_library_call;
use crate::layout::layouts_are_reduce_input_fusion_friendly;
use crate::shapes::shapes_compatible_for_multi_output_fusion;

/// Whether `producer` may be fused into `consumer`.
pub fn is_producer_consumer_fusible(producer: InstrRef<'_>, consumer: InstrRef<'_>) -> bool {
    explain_producer_consumer_fusible(producer, consumer).is_accepted()
}

/// [`is_producer_consumer_fusible`] with the failing rule.
pub fn explain_producer_consumer_fusible(producer: InstrRef<'_>, consumer: InstrRef<'_>) -> FusionDecision {
    if !is_loop_fusible(producer) {
        return Rejection::ProducerNotLoopFusible.into();
    }
    if !is_fusible(consumer) {
        return Rejection::ConsumerNotFusible.into();
    }
    if producer.is_multi_output_fusion() {
        return Rejection::ProducerIsMultiOutputFusion.into();
    }
    if is_input_fusible_reduction(consumer) && !layouts_are_reduce_input_fusion_friendly(producer, consumer) {
        return Rejection::UnfriendlyLayouts.into();
    }
    // A bitcast of a library call result stays free only while unfused.
    if producer.could_be_bitcast() && is_implemented_as_library_call(producer.operand(0)) {
        return Rejection::BitcastOfLibraryCall.into();
    }
    // Unfused constants are emitted out of line; only scalars are worth
    // pulling into an existing fusion.
    if producer.opcode() == Opcode::Constant {
        if !producer.shape().is_effective_scalar() {
            return Rejection::NonScalarConstant.into();
        }
        if consumer.opcode() != Opcode::Fusion {
            return Rejection::ConstantIntoNonFusion.into();
        }
    }
    FusionDecision::Accept
}

/// Whether `producer` may join `consumer` in a multi-output fusion.
///
/// The layout check applies even when the consumer is not a reduction.
pub fn is_producer_consumer_multi_output_fusible(producer: InstrRef<'_>, consumer: InstrRef<'_>) -> bool {
    explain_producer_consumer_multi_output_fusible(producer, consumer).is_accepted()
}

/// [`is_producer_consumer_multi_output_fusible`] with the failing rule.
pub fn explain_producer_consumer_multi_output_fusible(producer: InstrRef<'_>, consumer: InstrRef<'_>) -> FusionDecision {
    if !is_loop_fusible(producer) {
        return Rejection::ProducerNotLoopFusible.into();
    }
    if !is_fusible_as_multi_output_fusion_root(consumer) {
        return Rejection::NotMultiOutputRoot.into();
    }
    if !shapes_compatible_for_multi_output_fusion(producer, consumer) {
        return Rejection::IncompatibleShapes.into();
    }
    if !layouts_are_reduce_input_fusion_friendly(producer, consumer) {
        return Rejection::UnfriendlyLayouts.into();
    }
    FusionDecision::Accept
}

/// Fusion kind for merging `producer` into `consumer`.
///
/// Only the consumer matters.
pub fn choose_fusion_kind(_producer: InstrRef<'_>, consumer: InstrRef<'_>) -> FusionKind {
    if is_input_fusible(consumer) { FusionKind::Input } else { FusionKind::Loop }
}
