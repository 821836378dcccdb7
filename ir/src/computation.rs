//! Computation arena and graph construction.
//!
//! A [`Computation`] owns its instructions and maintains the reverse
//! adjacency (users) index. Operand and user lists are only ever changed
//! together, here, so they stay consistent. Once built, a computation is
//! read through [`InstrRef`] handles and is safe to share across threads.

use bon::bon;
use kiln_dtype::ElementType;
use slotmap::{SecondaryMap, SlotMap};
use smallvec::SmallVec;
use snafu::{OptionExt, ensure};

use crate::error::*;
use crate::instruction::{FusedComputation, FusionKind, InstrId, Instruction};
use crate::opcode::Opcode;
use crate::shape::{ArrayShape, Layout, Shape};
use crate::view::InstrRef;

/// Ordered collection of instructions with a single root.
#[derive(Debug, Clone)]
pub struct Computation {
    name: String,
    pub(crate) instructions: SlotMap<InstrId, Instruction>,
    pub(crate) users: SecondaryMap<InstrId, SmallVec<[InstrId; 4]>>,
    parameters: Vec<InstrId>,
    root: Option<InstrId>,
    last_added: Option<InstrId>,
}

impl Computation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: SlotMap::with_key(),
            users: SecondaryMap::new(),
            parameters: Vec::new(),
            root: None,
            last_added: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn contains(&self, id: InstrId) -> bool {
        self.instructions.contains_key(id)
    }

    /// Handle to an instruction of this computation.
    pub fn get(&self, id: InstrId) -> Option<InstrRef<'_>> {
        self.contains(id).then(|| InstrRef::new(self, id))
    }

    /// Handle to an instruction of this computation.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not created by this computation.
    pub fn instr(&self, id: InstrId) -> InstrRef<'_> {
        assert!(self.contains(id), "instruction {id:?} does not belong to computation {}", self.name);
        InstrRef::new(self, id)
    }

    /// All instructions in insertion order.
    pub fn instructions(&self) -> impl Iterator<Item = InstrRef<'_>> + '_ {
        self.instructions.keys().map(move |id| InstrRef::new(self, id))
    }

    /// Parameters ordered by parameter number.
    pub fn parameters(&self) -> impl ExactSizeIterator<Item = InstrRef<'_>> + '_ {
        self.parameters.iter().map(move |&id| InstrRef::new(self, id))
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Explicit root, or the most recently added instruction.
    pub fn root(&self) -> Option<InstrRef<'_>> {
        self.root.or(self.last_added).map(|id| InstrRef::new(self, id))
    }

    pub fn set_root(&mut self, id: InstrId) -> Result<()> {
        ensure!(self.contains(id), UnknownInstructionSnafu { computation: self.name.clone() });
        self.root = Some(id);
        Ok(())
    }

    fn array_shape(&self, opcode: Opcode, id: InstrId) -> Result<&ArrayShape> {
        let shape = &self.instructions[id].shape;
        shape.as_array().with_context(|| ExpectedArraySnafu { opcode, shape: Box::new(shape.clone()) })
    }

    fn check_operands(&self, opcode: Opcode, operands: &[InstrId]) -> Result<()> {
        for (index, &operand) in operands.iter().enumerate() {
            ensure!(
                self.contains(operand),
                UnknownOperandSnafu { opcode, index, computation: self.name.clone() }
            );
        }
        Ok(())
    }
}

#[bon]
impl Computation {
    /// Add an instruction with an explicitly given shape.
    ///
    /// This is the general entry point; the convenience constructors below
    /// infer shapes for the common opcodes and delegate here.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use kiln_ir::{Computation, Opcode, shape::Shape};
    /// # use kiln_dtype::ElementType;
    /// let mut comp = Computation::new("entry");
    /// let f32x8 = Shape::array(ElementType::F32, [8]);
    /// let p = comp.parameter(f32x8.clone());
    /// let neg = comp.instruction().opcode(Opcode::Negate).shape(f32x8).operands(vec![p]).call().unwrap();
    /// assert_eq!(comp.instr(p).users().next().map(|u| u.id()), Some(neg));
    /// ```
    #[builder]
    pub fn instruction(
        &mut self,
        opcode: Opcode,
        shape: Shape,
        #[builder(default)] operands: Vec<InstrId>,
        #[builder(default)] dimensions: Vec<usize>,
        #[builder(into)] name: Option<String>,
        tuple_index: Option<usize>,
        #[builder(into)] custom_call_target: Option<String>,
        #[builder(default)] side_effecting: bool,
        fused: Option<(FusionKind, Computation)>,
    ) -> Result<InstrId> {
        self.check_operands(opcode, &operands)?;
        if let Some(expected) = opcode.arity() {
            ensure!(operands.len() == expected, ArityMismatchSnafu { opcode, expected, actual: operands.len() });
        }

        let fused = match fused {
            Some((kind, computation)) => {
                ensure!(
                    computation.parameter_count() == operands.len(),
                    FusionParameterCountMismatchSnafu {
                        computation: computation.name.clone(),
                        expected: computation.parameter_count(),
                        actual: operands.len(),
                    }
                );
                let root = computation
                    .root
                    .or(computation.last_added)
                    .with_context(|| MissingRootSnafu { computation: computation.name.clone() })?;
                Some(FusedComputation { kind, root, computation: Box::new(computation) })
            }
            None => None,
        };

        let parameter_number = (opcode == Opcode::Parameter).then_some(self.parameters.len());
        let name = name.unwrap_or_else(|| format!("{opcode}.{}", self.instructions.len()));
        let id = self.instructions.insert(Instruction {
            name,
            opcode,
            shape,
            operands: operands.iter().copied().collect(),
            dimensions: dimensions.into_iter().collect(),
            tuple_index,
            parameter_number,
            custom_call_target,
            side_effecting,
            fused,
        });

        self.users.insert(id, SmallVec::new());
        for (i, &operand) in operands.iter().enumerate() {
            // An instruction using the same operand twice is still one user.
            if !operands[..i].contains(&operand) {
                self.users[operand].push(id);
            }
        }
        if parameter_number.is_some() {
            self.parameters.push(id);
        }
        self.last_added = Some(id);
        Ok(id)
    }
}

// =========================================================================
// Convenience constructors
// =========================================================================

impl Computation {
    pub fn parameter(&mut self, shape: Shape) -> InstrId {
        let name = format!("p{}", self.parameters.len());
        self.add_leaf(Opcode::Parameter, shape, name)
    }

    pub fn constant(&mut self, shape: Shape) -> InstrId {
        let name = format!("constant.{}", self.instructions.len());
        self.add_leaf(Opcode::Constant, shape, name)
    }

    pub fn iota(&mut self, shape: Shape) -> InstrId {
        let name = format!("iota.{}", self.instructions.len());
        self.add_leaf(Opcode::Iota, shape, name)
    }

    fn add_leaf(&mut self, opcode: Opcode, shape: Shape, name: String) -> InstrId {
        let id = self.instructions.insert(Instruction {
            name,
            opcode,
            shape,
            operands: SmallVec::new(),
            dimensions: SmallVec::new(),
            tuple_index: None,
            parameter_number: (opcode == Opcode::Parameter).then_some(self.parameters.len()),
            custom_call_target: None,
            side_effecting: false,
            fused: None,
        });
        self.users.insert(id, SmallVec::new());
        if opcode == Opcode::Parameter {
            self.parameters.push(id);
        }
        self.last_added = Some(id);
        id
    }

    /// Elementwise unary op keeping the operand's shape.
    pub fn unary(&mut self, opcode: Opcode, operand: InstrId) -> Result<InstrId> {
        self.check_operands(opcode, &[operand])?;
        let shape = Shape::Array(self.array_shape(opcode, operand)?.clone());
        self.instruction().opcode(opcode).shape(shape).operands(vec![operand]).call()
    }

    /// Elementwise conversion to `element_type`; dimensions and layout are kept.
    pub fn convert(&mut self, operand: InstrId, element_type: ElementType) -> Result<InstrId> {
        self.check_operands(Opcode::Convert, &[operand])?;
        let shape = Shape::Array(self.array_shape(Opcode::Convert, operand)?.with_element_type(element_type));
        self.instruction().opcode(Opcode::Convert).shape(shape).operands(vec![operand]).call()
    }

    /// Elementwise binary op; `compare` yields `pred`.
    pub fn binary(&mut self, opcode: Opcode, lhs: InstrId, rhs: InstrId) -> Result<InstrId> {
        self.check_operands(opcode, &[lhs, rhs])?;
        let lhs_shape = self.array_shape(opcode, lhs)?;
        let rhs_shape = self.array_shape(opcode, rhs)?;
        ensure!(
            lhs_shape.dims() == rhs_shape.dims(),
            ShapeMismatchSnafu {
                opcode,
                lhs: Box::new(Shape::Array(lhs_shape.clone())),
                rhs: Box::new(Shape::Array(rhs_shape.clone())),
            }
        );
        let shape = match opcode {
            Opcode::Compare => lhs_shape.with_element_type(ElementType::Pred),
            _ => lhs_shape.clone(),
        };
        self.instruction().opcode(opcode).shape(Shape::Array(shape)).operands(vec![lhs, rhs]).call()
    }

    /// Reduce `input` over `dimensions` with the scalar `init` value.
    ///
    /// The result keeps the remaining dimensions in logical order with the
    /// default layout.
    pub fn reduce(&mut self, input: InstrId, init: InstrId, dimensions: &[usize]) -> Result<InstrId> {
        self.check_operands(Opcode::Reduce, &[input, init])?;
        let input_shape = self.array_shape(Opcode::Reduce, input)?;
        let rank = input_shape.rank();
        for &dim in dimensions {
            ensure!(dim < rank, InvalidDimensionSnafu { opcode: Opcode::Reduce, dim, rank });
        }
        let kept = (0..rank).filter(|d| !dimensions.contains(d)).map(|d| input_shape.dims()[d]);
        let shape = Shape::array(input_shape.element_type(), kept);
        self.instruction()
            .opcode(Opcode::Reduce)
            .shape(shape)
            .operands(vec![input, init])
            .dimensions(dimensions.to_vec())
            .call()
    }

    /// Variadic reduce producing a tuple of one result per input.
    pub fn variadic_reduce(&mut self, inputs: &[InstrId], inits: &[InstrId], dimensions: &[usize]) -> Result<InstrId> {
        let operands: Vec<InstrId> = inputs.iter().chain(inits).copied().collect();
        self.check_operands(Opcode::Reduce, &operands)?;
        let mut elements = Vec::with_capacity(inputs.len());
        for &input in inputs {
            let input_shape = self.array_shape(Opcode::Reduce, input)?;
            let rank = input_shape.rank();
            for &dim in dimensions {
                ensure!(dim < rank, InvalidDimensionSnafu { opcode: Opcode::Reduce, dim, rank });
            }
            let kept = (0..rank).filter(|d| !dimensions.contains(d)).map(|d| input_shape.dims()[d]);
            elements.push(Shape::array(input_shape.element_type(), kept));
        }
        self.instruction()
            .opcode(Opcode::Reduce)
            .shape(Shape::Tuple(elements))
            .operands(operands)
            .dimensions(dimensions.to_vec())
            .call()
    }

    /// Transpose with output dimension `i` taken from operand dimension `permutation[i]`.
    pub fn transpose(&mut self, operand: InstrId, permutation: &[usize]) -> Result<InstrId> {
        self.check_operands(Opcode::Transpose, &[operand])?;
        let input_shape = self.array_shape(Opcode::Transpose, operand)?;
        let rank = input_shape.rank();
        ensure!(
            Layout::new(permutation.iter().copied(), rank).is_ok(),
            InvalidPermutationSnafu { permutation: permutation.to_vec(), rank }
        );
        let shape = Shape::array(input_shape.element_type(), permutation.iter().map(|&d| input_shape.dims()[d]));
        self.instruction()
            .opcode(Opcode::Transpose)
            .shape(shape)
            .operands(vec![operand])
            .dimensions(permutation.to_vec())
            .call()
    }

    pub fn reshape(&mut self, operand: InstrId, dims: &[i64]) -> Result<InstrId> {
        self.check_operands(Opcode::Reshape, &[operand])?;
        let input_shape = self.array_shape(Opcode::Reshape, operand)?;
        let output: i64 = dims.iter().product();
        ensure!(
            input_shape.element_count() == output,
            ReshapeSizeMismatchSnafu { input: input_shape.element_count(), output }
        );
        let shape = Shape::array(input_shape.element_type(), dims.iter().copied());
        self.instruction().opcode(Opcode::Reshape).shape(shape).operands(vec![operand]).call()
    }

    /// Broadcast `operand` into `dims`; operand dimension `i` maps to output dimension `mapping[i]`.
    pub fn broadcast(&mut self, operand: InstrId, dims: &[i64], mapping: &[usize]) -> Result<InstrId> {
        self.check_operands(Opcode::Broadcast, &[operand])?;
        let input_shape = self.array_shape(Opcode::Broadcast, operand)?;
        ensure!(
            mapping.len() == input_shape.rank(),
            ArityMismatchSnafu { opcode: Opcode::Broadcast, expected: input_shape.rank(), actual: mapping.len() }
        );
        for &dim in mapping {
            ensure!(dim < dims.len(), InvalidDimensionSnafu { opcode: Opcode::Broadcast, dim, rank: dims.len() });
        }
        let shape = Shape::array(input_shape.element_type(), dims.iter().copied());
        self.instruction()
            .opcode(Opcode::Broadcast)
            .shape(shape)
            .operands(vec![operand])
            .dimensions(mapping.to_vec())
            .call()
    }

    /// Scatter `updates` into a copy of `operand` at `indices`.
    pub fn scatter(&mut self, operand: InstrId, indices: InstrId, updates: InstrId) -> Result<InstrId> {
        self.check_operands(Opcode::Scatter, &[operand, indices, updates])?;
        let shape = self.instructions[operand].shape.clone();
        self.instruction().opcode(Opcode::Scatter).shape(shape).operands(vec![operand, indices, updates]).call()
    }

    pub fn tuple(&mut self, elements: &[InstrId]) -> Result<InstrId> {
        self.check_operands(Opcode::Tuple, elements)?;
        let shape = Shape::tuple(elements.iter().map(|&id| self.instructions[id].shape.clone()));
        self.instruction().opcode(Opcode::Tuple).shape(shape).operands(elements.to_vec()).call()
    }

    pub fn get_tuple_element(&mut self, tuple: InstrId, index: usize) -> Result<InstrId> {
        self.check_operands(Opcode::GetTupleElement, &[tuple])?;
        let elements = self.instructions[tuple].shape.tuple_elements();
        let shape = elements.get(index).context(TupleIndexOutOfBoundsSnafu { index, size: elements.len() })?.clone();
        self.instruction()
            .opcode(Opcode::GetTupleElement)
            .shape(shape)
            .operands(vec![tuple])
            .tuple_index(index)
            .call()
    }

    /// Fusion instruction wrapping `fused`; its shape is the fused root's shape.
    pub fn fusion(&mut self, kind: FusionKind, operands: &[InstrId], fused: Computation) -> Result<InstrId> {
        let shape = fused.root().with_context(|| MissingRootSnafu { computation: fused.name.clone() })?.shape().clone();
        let name = format!("fusion.{}", self.instructions.len());
        self.instruction()
            .opcode(Opcode::Fusion)
            .shape(shape)
            .operands(operands.to_vec())
            .name(name)
            .fused((kind, fused))
            .call()
    }
}
