//! Instruction storage.
//!
//! Instructions are owned by their [`Computation`] and addressed by
//! [`InstrId`]. Read access goes through [`InstrRef`](crate::InstrRef).

use smallvec::SmallVec;

use crate::{computation::Computation, opcode::Opcode, shape::Shape};

slotmap::new_key_type! {
    /// Stable identifier of an instruction within its computation.
    pub struct InstrId;
}

/// Kernel emission strategy of a fused sub-computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum FusionKind {
    /// Elementwise-style computation sharing one per-output-element loop.
    #[strum(serialize = "kLoop")]
    Loop,
    /// Rooted at a reduction or scatter, which need specialized emission.
    #[strum(serialize = "kInput")]
    Input,
}

/// Nested computation owned by a fusion instruction.
#[derive(Debug, Clone)]
pub struct FusedComputation {
    pub(crate) kind: FusionKind,
    pub(crate) root: InstrId,
    pub(crate) computation: Box<Computation>,
}

/// One node of the dataflow graph.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub(crate) name: String,
    pub(crate) opcode: Opcode,
    pub(crate) shape: Shape,
    /// Non-owning references into the same computation.
    pub(crate) operands: SmallVec<[InstrId; 4]>,
    /// Reduce dimensions, transpose permutation, or broadcast mapping.
    pub(crate) dimensions: SmallVec<[usize; 4]>,
    pub(crate) tuple_index: Option<usize>,
    pub(crate) parameter_number: Option<usize>,
    pub(crate) custom_call_target: Option<String>,
    pub(crate) side_effecting: bool,
    pub(crate) fused: Option<FusedComputation>,
}
