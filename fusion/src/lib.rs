//! Fusion legality and fusion heuristics for GPU kernel generation.
//!
//! Given an immutable instruction graph with shapes, layouts and fusion kinds
//! already assigned, this crate answers the questions a fusion driver asks:
//! can an instruction be fused at all, can a producer be merged into a
//! consumer (single- or multi-output), which fusion kind results, and should
//! a merge be postponed to a later phase. Nothing here mutates the graph, and
//! all queries are safe to issue concurrently against a shared graph.
//!
//! # Module Organization
//!
//! - [`classify`] - Single-instruction classifiers
//! - [`layout`] - Layout friendliness of reduce input fusions
//! - [`shapes`] - Real heroes and multi-output shape compatibility
//! - [`producer_consumer`] - Pairwise rules and fusion kind selection
//! - [`limits`] - Operand and output budget
//! - [`heuristics`] - Multi-output gate and downcast postponement
//! - [`emission`] - Contiguous reductions and library calls
//! - [`decision`] - Explained accept/reject outcomes
//! - [`config`] - Engine configuration
//! - [`verify`] - Fusion kind verification

pub mod classify;
pub mod config;
pub mod decision;
pub mod emission;
pub mod error;
pub mod heuristics;
pub mod layout;
pub mod limits;
pub mod prelude;
pub mod producer_consumer;
pub mod shapes;
pub mod verify;


pub use classify::{
    is_fusible, is_fusible_as_multi_output_fusion_root, is_input_fusible, is_input_fusible_reduction,
    is_input_fusible_scatter, is_loop_fusible, is_reduce_input_fusion,
};
pub use config::{FusionConfig, MAX_OPERANDS_AND_OUTPUTS_PER_FUSION};
pub use decision::{FusionDecision, Rejection};
pub use emission::{ReductionDimensions, is_implemented_as_library_call, is_reduction_from_or_to_contiguous_dimensions};
pub use error::{Error, Result};
pub use heuristics::{explain_should_fuse_producer_consumer_mof, postpone_fusion, should_fuse_producer_consumer_mof};
pub use layout::layouts_are_reduce_input_fusion_friendly;
pub use limits::fusion_would_be_too_large;
pub use producer_consumer::{
    choose_fusion_kind, explain_producer_consumer_fusible, explain_producer_consumer_multi_output_fusible,
    is_producer_consumer_fusible, is_producer_consumer_multi_output_fusible,
};
pub use shapes::{real_hero, shapes_compatible_for_multi_output_fusion};
pub use verify::verify_fusion_kinds;
