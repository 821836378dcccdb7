//! Common imports for fusion drivers.

pub use crate::{
    FusionConfig, FusionDecision, Rejection, choose_fusion_kind, fusion_would_be_too_large, is_fusible,
    is_input_fusible, is_loop_fusible, is_producer_consumer_fusible, is_producer_consumer_multi_output_fusible,
    postpone_fusion, should_fuse_producer_consumer_mof,
};
pub use kiln_ir::{Computation, FusionKind, InstrId, InstrRef, Opcode, Shape};
