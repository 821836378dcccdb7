//! Top-level fusion heuristics.
//!
//! [`should_fuse_producer_consumer_mof`] gates multi-output fusion and
//! [`postpone_fusion`] decides whether a downcast should wait for the
//! multi-output phase instead of being fused into its consumer now.

use kiln_ir::{InstrRef, Opcode};

use crate::classify::{is_fusible_as_multi_output_fusion_root, is_input_fusible_reduction};
use crate::config::FusionConfig;
use crate::decision::{FusionDecision, Rejection};
use crate::limits::fusion_would_be_too_large;
use crate::producer_consumer::explain_producer_consumer_multi_output_fusible;

/// Whether `producer` should be multi-output fused with `consumer`.
pub fn should_fuse_producer_consumer_mof(producer: InstrRef<'_>, consumer: InstrRef<'_>, config: &FusionConfig) -> bool {
    explain_should_fuse_producer_consumer_mof(producer, consumer, config).is_accepted()
}

/// [`should_fuse_producer_consumer_mof`] with the failing rule.
#[tracing::instrument(skip_all, fields(producer = %producer.name(), consumer = %consumer.name()))]
pub fn explain_should_fuse_producer_consumer_mof(
    producer: InstrRef<'_>,
    consumer: InstrRef<'_>,
    config: &FusionConfig,
) -> FusionDecision {
    if !is_fusible_as_multi_output_fusion_root(consumer) {
        tracing::debug!(consumer = %consumer.name(), "consumer cannot be a multi-output fusion root");
        return Rejection::NotMultiOutputRoot.into();
    }
    if !is_input_fusible_reduction(consumer) {
        if !config.experimental_multi_output_fusion {
            tracing::debug!(consumer = %consumer.name(), "consumer is not an input-fusible reduction");
            return Rejection::NotInputFusibleReduction.into();
        }
        tracing::info!(consumer = %consumer.name(), "experimental multi-output fusion");
    }

    let decision = explain_producer_consumer_multi_output_fusible(producer, consumer);
    if let FusionDecision::Reject(rejection) = decision {
        tracing::debug!(producer = %producer.name(), consumer = %consumer.name(), %rejection, "not fusible");
        return decision;
    }
    // Constant fusion is left to the single-output pass.
    if producer.opcode() == Opcode::Constant {
        tracing::debug!(producer = %producer.name(), "producer is a constant");
        return Rejection::ConstantProducer.into();
    }
    if fusion_would_be_too_large(producer, consumer, config) {
        tracing::debug!(producer = %producer.name(), consumer = %consumer.name(), "fusion would be too large");
        return Rejection::TooLarge.into();
    }
    FusionDecision::Accept
}

/// Convert that shrinks its operand.
fn is_downcast(instr: InstrRef<'_>) -> bool {
    instr.opcode() == Opcode::Convert && instr.operand(0).shape().byte_size() > instr.shape().byte_size()
}

/// Downcast directly, or a single-operand loop fusion rooted at one.
fn is_downcast_like(instr: InstrRef<'_>) -> bool {
    is_downcast(instr)
        || (instr.is_loop_fusion() && instr.operand_count() == 1 && instr.as_fusion().is_some_and(|f| is_downcast(f.root())))
}

/// Whether `producer` is a downcast worth fusing into its own producer later.
pub(crate) fn is_postponable_downcast(producer: InstrRef<'_>, consumer: InstrRef<'_>) -> bool {
    if is_downcast(producer) {
        // Adjacent downcasts merge now into one larger downcast.
        if is_downcast_like(consumer) {
            return false;
        }
        // Nothing upstream of a parameter to merge with.
        return producer.operand(0).opcode() != Opcode::Parameter;
    }

    let Some(fusion) = producer.as_fusion() else {
        return false;
    };
    if !producer.is_loop_fusion() || producer.operand_count() != 1 {
        return false;
    }
    let root = fusion.root();
    is_downcast(root)
        || (root.opcode() == Opcode::Convert && producer.operand(0).shape().byte_size() > producer.shape().byte_size())
}

/// Whether fusing downcast `producer` into `consumer` should be postponed.
///
/// A downcast is better fused into the instruction it converts, which may
/// only happen in the later multi-output phase. Postponing requires that
/// merge to be possible now, and that it cannot create a cycle.
///
/// The cycle check is local and conservative: when the future producer has
/// several users, any such user reading another instruction that itself has
/// operands counts as a possible cycle. It rejects many safe cases.
#[tracing::instrument(skip_all, fields(producer = %producer.name(), consumer = %consumer.name()))]
pub fn postpone_fusion(producer: InstrRef<'_>, consumer: InstrRef<'_>, config: &FusionConfig) -> bool {
    if !is_postponable_downcast(producer, consumer) {
        tracing::trace!("no operation to postpone");
        return false;
    }

    let future_producer = producer.operand(0);
    if !should_fuse_producer_consumer_mof(future_producer, producer, config) {
        return false;
    }

    if future_producer.user_count() > 1 {
        let may_cycle = future_producer
            .users()
            .any(|user| user.operands().any(|operand| operand.operand_count() > 0 && operand != future_producer));
        if may_cycle {
            tracing::debug!(
                users = ?producer.users().map(|u| u.name()).collect::<Vec<_>>(),
                future_users = ?future_producer.users().map(|u| u.name()).collect::<Vec<_>>(),
                "not postponing, possible cycle"
            );
            return false;
        }
    }

    true
}
