//! Explained fusion decisions.
//!
//! A rejection is a normal outcome, not an error. The `explain_*` entry points
//! return a [`FusionDecision`] naming the rule that failed so drivers and
//! tooling can report it; the boolean entry points discard the reason.

use derive_more::Display;

/// Rule that turned a fusion down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Rejection {
    #[display("producer is not loop-fusible")]
    ProducerNotLoopFusible,

    #[display("consumer is not fusible")]
    ConsumerNotFusible,

    #[display("producer is a multi-output fusion")]
    ProducerIsMultiOutputFusion,

    #[display("operand layouts are unfriendly to reduce input fusion")]
    UnfriendlyLayouts,

    #[display("producer could become a bitcast of a library call")]
    BitcastOfLibraryCall,

    #[display("constant is not an effective scalar")]
    NonScalarConstant,

    #[display("constant may only be fused into an existing fusion")]
    ConstantIntoNonFusion,

    #[display("consumer cannot be a multi-output fusion root")]
    NotMultiOutputRoot,

    #[display("consumer is not an input-fusible reduction")]
    NotInputFusibleReduction,

    #[display("loop shapes are incompatible")]
    IncompatibleShapes,

    #[display("constants are never multi-output fused")]
    ConstantProducer,

    #[display("fusion would exceed the operand and output limit")]
    TooLarge,
}

/// Outcome of a fusion query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum FusionDecision {
    #[display("accept")]
    Accept,
    #[display("reject: {_0}")]
    Reject(Rejection),
}

impl FusionDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept)
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Accept => None,
            Self::Reject(rejection) => Some(*rejection),
        }
    }
}

impl From<Rejection> for FusionDecision {
    fn from(rejection: Rejection) -> Self {
        Self::Reject(rejection)
    }
}

impl From<FusionDecision> for bool {
    fn from(decision: FusionDecision) -> Self {
        decision.is_accepted()
    }
}
