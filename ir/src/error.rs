use snafu::Snafu;

use crate::{opcode::Opcode, shape::Shape};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Graph construction errors.
///
/// The graph is immutable once built, so every structural problem is reported
/// while instructions are added.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Layout is not a permutation of the array's dimensions.
    #[snafu(display("layout {minor_to_major:?} is not a permutation of 0..{rank}"))]
    InvalidLayout { minor_to_major: Vec<usize>, rank: usize },

    /// Negative dimension size.
    #[snafu(display("shape contains negative dimension in {dims:?}"))]
    NegativeDimension { dims: Vec<i64> },

    /// Operand id does not belong to this computation.
    #[snafu(display("operand {index} of {opcode} does not belong to computation {computation}"))]
    UnknownOperand { opcode: Opcode, index: usize, computation: String },

    /// Instruction id does not belong to this computation.
    #[snafu(display("instruction does not belong to computation {computation}"))]
    UnknownInstruction { computation: String },

    /// Fixed-arity opcode with the wrong number of operands.
    #[snafu(display("{opcode} expects {expected} operands, got {actual}"))]
    ArityMismatch { opcode: Opcode, expected: usize, actual: usize },

    /// Opcode requires array operands.
    #[snafu(display("{opcode} requires an array operand, got {shape}"))]
    ExpectedArray { opcode: Opcode, shape: Box<Shape> },

    /// Elementwise operands disagree on dimensions.
    #[snafu(display("shape mismatch in {opcode}: {lhs} vs {rhs}"))]
    ShapeMismatch { opcode: Opcode, lhs: Box<Shape>, rhs: Box<Shape> },

    /// Reduce or broadcast dimension out of range.
    #[snafu(display("dimension {dim} is invalid for {opcode} over rank {rank}"))]
    InvalidDimension { opcode: Opcode, dim: usize, rank: usize },

    /// Transpose permutation is not a permutation of the operand rank.
    #[snafu(display("invalid permutation {permutation:?}: expected permutation of 0..{rank}"))]
    InvalidPermutation { permutation: Vec<usize>, rank: usize },

    /// Reshape changes the element count.
    #[snafu(display("reshape size mismatch: input has {input} elements, output has {output}"))]
    ReshapeSizeMismatch { input: i64, output: i64 },

    /// Tuple index past the end.
    #[snafu(display("tuple index {index} out of bounds for tuple with {size} elements"))]
    TupleIndexOutOfBounds { index: usize, size: usize },

    /// Fused computation parameters do not line up with the fusion operands.
    #[snafu(display("fused computation {computation} has {expected} parameters but fusion has {actual} operands"))]
    FusionParameterCountMismatch { computation: String, expected: usize, actual: usize },

    /// Computation used before its root was set.
    #[snafu(display("computation {computation} has no root instruction"))]
    MissingRoot { computation: String },
}
