//! Read-only handles into a computation.
//!
//! [`InstrRef`] is a `Copy` pair of a computation borrow and an instruction
//! id. Every accessor the fusion engine needs lives here, including the
//! [`FusionView`] capability query for instructions that wrap a fused
//! sub-computation.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::computation::Computation;
use crate::instruction::{FusedComputation, FusionKind, InstrId, Instruction};
use crate::opcode::Opcode;
use crate::shape::Shape;

/// Borrowed handle to one instruction.
///
/// Two handles are equal when they name the same instruction of the same
/// computation.
#[derive(Clone, Copy)]
pub struct InstrRef<'a> {
    computation: &'a Computation,
    id: InstrId,
}

impl PartialEq for InstrRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.computation, other.computation)
    }
}

impl Eq for InstrRef<'_> {}

impl Hash for InstrRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.computation, state);
        self.id.hash(state);
    }
}

// Show only the name, avoiding recursion through operands
impl fmt::Debug for InstrRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstrRef({})", self.name())
    }
}

impl fmt::Display for InstrRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{} = {} {}(", self.name(), self.shape(), self.opcode())?;
        for (i, operand) in self.operands().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "%{}", operand.name())?;
        }
        write!(f, ")")?;
        if let Some(fusion) = self.as_fusion() {
            write!(f, ", kind={}", fusion.kind())?;
        }
        Ok(())
    }
}

impl<'a> InstrRef<'a> {
    pub(crate) fn new(computation: &'a Computation, id: InstrId) -> Self {
        Self { computation, id }
    }

    fn instruction(&self) -> &'a Instruction {
        &self.computation.instructions[self.id]
    }

    pub fn id(&self) -> InstrId {
        self.id
    }

    /// The computation owning this instruction.
    pub fn computation(&self) -> &'a Computation {
        self.computation
    }

    pub fn name(&self) -> &'a str {
        &self.instruction().name
    }

    pub fn opcode(&self) -> Opcode {
        self.instruction().opcode
    }

    pub fn shape(&self) -> &'a Shape {
        &self.instruction().shape
    }

    /// Reduce dimensions, transpose permutation, or broadcast mapping.
    pub fn dimensions(&self) -> &'a [usize] {
        &self.instruction().dimensions
    }

    pub fn tuple_index(&self) -> Option<usize> {
        self.instruction().tuple_index
    }

    pub fn parameter_number(&self) -> Option<usize> {
        self.instruction().parameter_number
    }

    pub fn custom_call_target(&self) -> Option<&'a str> {
        self.instruction().custom_call_target.as_deref()
    }

    // =========================================================================
    // Graph traversal
    // =========================================================================

    pub fn operand_count(&self) -> usize {
        self.instruction().operands.len()
    }

    /// Operand at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.operand_count()`.
    pub fn operand(&self, index: usize) -> InstrRef<'a> {
        Self::new(self.computation, self.instruction().operands[index])
    }

    pub fn operands(&self) -> impl ExactSizeIterator<Item = InstrRef<'a>> + 'a {
        let computation = self.computation;
        self.instruction().operands.iter().map(move |&id| Self::new(computation, id))
    }

    /// Distinct consumers of this instruction, in the order they were added.
    pub fn users(&self) -> impl ExactSizeIterator<Item = InstrRef<'a>> + 'a {
        let computation = self.computation;
        let users = computation.users.get(self.id).map(|users| users.as_slice()).unwrap_or(&[]);
        users.iter().map(move |&id| Self::new(computation, id))
    }

    pub fn user_count(&self) -> usize {
        self.computation.users.get(self.id).map_or(0, |users| users.len())
    }

    // =========================================================================
    // Fusion capability
    // =========================================================================

    /// View into the fused sub-computation, if this is a fusion.
    pub fn as_fusion(&self) -> Option<FusionView<'a>> {
        self.instruction().fused.as_ref().map(|fused| FusionView { instr: *self, fused })
    }

    pub fn fusion_kind(&self) -> Option<FusionKind> {
        self.as_fusion().map(|fusion| fusion.kind())
    }

    pub fn is_loop_fusion(&self) -> bool {
        self.fusion_kind() == Some(FusionKind::Loop)
    }

    pub fn is_input_fusion(&self) -> bool {
        self.fusion_kind() == Some(FusionKind::Input)
    }

    /// Fusion whose fused root is a tuple of outputs.
    pub fn is_multi_output_fusion(&self) -> bool {
        self.as_fusion().is_some_and(|fusion| fusion.is_multi_output())
    }

    // =========================================================================
    // Instruction properties
    // =========================================================================

    pub fn has_side_effect(&self) -> bool {
        self.opcode().has_side_effect() || (self.opcode() == Opcode::CustomCall && self.instruction().side_effecting)
    }

    /// Elementwise opcodes, constants, and fusions made only of elementwise work.
    pub fn is_elementwise(&self) -> bool {
        match self.opcode() {
            Opcode::Constant => true,
            Opcode::Fusion => self.as_fusion().is_some_and(|fusion| {
                fusion.instructions().all(|fused| fused.opcode() == Opcode::Parameter || fused.is_elementwise())
            }),
            opcode => opcode.is_elementwise(),
        }
    }

    /// Whether this instruction may be placed inside any fused computation.
    ///
    /// This is the opcode-level precondition; the fusion engine layers its
    /// kernel-emission rules on top.
    pub fn is_fusible(&self) -> bool {
        match self.opcode() {
            Opcode::Domain | Opcode::Parameter | Opcode::While | Opcode::Conditional | Opcode::Call => false,
            Opcode::Fusion | Opcode::Map | Opcode::Reduce | Opcode::ReduceWindow => true,
            Opcode::Rng => self.user_count() <= 1,
            _ => !self.has_side_effect(),
        }
    }

    /// Transposes, and reshapes that only insert or delete size-1 dimensions.
    ///
    /// Either may be lowered to a zero-cost reinterpretation of its operand
    /// once layouts are final.
    pub fn could_be_bitcast(&self) -> bool {
        match self.opcode() {
            Opcode::Transpose => true,
            Opcode::Reshape => {
                let (Some(output), Some(input)) = (self.shape().as_array(), self.operand(0).shape().as_array()) else {
                    return false;
                };
                output.non_degenerate_dims() == input.non_degenerate_dims()
            }
            _ => false,
        }
    }
}

/// Capability view of a fusion instruction's nested computation.
#[derive(Clone, Copy)]
pub struct FusionView<'a> {
    instr: InstrRef<'a>,
    fused: &'a FusedComputation,
}

impl fmt::Debug for FusionView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FusionView")
            .field("fusion", &self.instr.name())
            .field("kind", &self.fused.kind)
            .field("root", &self.root().name())
            .finish()
    }
}

impl<'a> FusionView<'a> {
    /// The fusion instruction itself.
    pub fn instr(&self) -> InstrRef<'a> {
        self.instr
    }

    pub fn kind(&self) -> FusionKind {
        self.fused.kind
    }

    pub fn computation(&self) -> &'a Computation {
        &self.fused.computation
    }

    /// Root of the fused computation.
    pub fn root(&self) -> InstrRef<'a> {
        InstrRef::new(&self.fused.computation, self.fused.root)
    }

    /// Fused parameters, ordered like the fusion's operands.
    pub fn parameters(&self) -> impl ExactSizeIterator<Item = InstrRef<'a>> + 'a {
        let computation: &'a Computation = &self.fused.computation;
        computation.parameters()
    }

    pub fn instructions(&self) -> impl Iterator<Item = InstrRef<'a>> + 'a {
        let computation: &'a Computation = &self.fused.computation;
        computation.instructions()
    }

    pub fn is_multi_output(&self) -> bool {
        self.root().opcode() == Opcode::Tuple
    }
}
