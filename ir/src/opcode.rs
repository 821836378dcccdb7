//! Instruction opcodes.

/// Closed set of instruction opcodes.
///
/// Displayed in the kebab-case spelling of textual programs (`dynamic-slice`,
/// `get-tuple-element`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::Display, strum::EnumString, strum::AsRefStr, strum::EnumIter, strum::EnumCount)]
#[strum(serialize_all = "kebab-case")]
pub enum Opcode {
    // Elementwise unary
    Abs,
    Ceil,
    Clz,
    Convert,
    BitcastConvert,
    Copy,
    Cos,
    Exp,
    #[strum(serialize = "exponential-minus-one")]
    Expm1,
    Floor,
    Imag,
    IsFinite,
    Log,
    #[strum(serialize = "log-plus-one")]
    Log1p,
    Negate,
    Not,
    #[strum(serialize = "popcnt")]
    PopulationCount,
    Real,
    RoundNearestAfz,
    Rsqrt,
    Sign,
    #[strum(serialize = "sine")]
    Sin,
    Sqrt,
    Tanh,

    // Elementwise binary
    Add,
    Atan2,
    Complex,
    Compare,
    Divide,
    Maximum,
    Minimum,
    Multiply,
    Power,
    Remainder,
    And,
    Or,
    Xor,
    ShiftLeft,
    ShiftRightArithmetic,
    ShiftRightLogical,
    Subtract,

    // Elementwise ternary
    Select,
    Clamp,

    // Elementwise variadic
    Map,

    // Leaves
    Parameter,
    Constant,
    Iota,
    Rng,

    // Data movement
    Bitcast,
    Broadcast,
    Concatenate,
    DynamicSlice,
    DynamicUpdateSlice,
    Gather,
    Pad,
    Reshape,
    Reverse,
    Slice,
    Transpose,

    // Reductions and scatter
    Reduce,
    ReduceWindow,
    Scatter,
    Sort,

    // Tuples
    Tuple,
    GetTupleElement,

    // Library-backed and structural
    Dot,
    Convolution,
    CustomCall,
    Fusion,
    While,
    Conditional,
    Call,
    Domain,

    // Communication
    Send,
    Recv,
    Infeed,
    Outfeed,
}

impl Opcode {
    pub const fn is_elementwise_unary(&self) -> bool {
        use Opcode::*;
        matches!(
            self,
            Abs | Ceil
                | Clz
                | Convert
                | BitcastConvert
                | Copy
                | Cos
                | Exp
                | Expm1
                | Floor
                | Imag
                | IsFinite
                | Log
                | Log1p
                | Negate
                | Not
                | PopulationCount
                | Real
                | RoundNearestAfz
                | Rsqrt
                | Sign
                | Sin
                | Sqrt
                | Tanh
        )
    }

    pub const fn is_elementwise_binary(&self) -> bool {
        use Opcode::*;
        matches!(
            self,
            Add | Atan2
                | Complex
                | Compare
                | Divide
                | Maximum
                | Minimum
                | Multiply
                | Power
                | Remainder
                | And
                | Or
                | Xor
                | ShiftLeft
                | ShiftRightArithmetic
                | ShiftRightLogical
                | Subtract
        )
    }

    pub const fn is_elementwise_ternary(&self) -> bool {
        matches!(self, Self::Select | Self::Clamp)
    }

    /// Opcodes whose every output element depends only on the same element of each operand.
    ///
    /// Constants and fusions are elementwise depending on their contents; see
    /// [`InstrRef::is_elementwise`](crate::InstrRef::is_elementwise).
    pub const fn is_elementwise(&self) -> bool {
        self.is_elementwise_unary()
            || self.is_elementwise_binary()
            || self.is_elementwise_ternary()
            || matches!(self, Self::Map)
    }

    /// Operand count for fixed-arity opcodes.
    pub const fn arity(&self) -> Option<usize> {
        use Opcode::*;
        if self.is_elementwise_unary() {
            return Some(1);
        }
        if self.is_elementwise_binary() {
            return Some(2);
        }
        if self.is_elementwise_ternary() {
            return Some(3);
        }
        match self {
            Parameter | Constant | Iota | Infeed => Some(0),
            Bitcast | Broadcast | Reshape | Reverse | Slice | Transpose | GetTupleElement => Some(1),
            Pad | Gather | Dot | Convolution | Outfeed | Send => Some(2),
            Scatter => Some(3),
            _ => None,
        }
    }

    /// Opcodes with observable effects beyond their result.
    ///
    /// Custom calls may additionally be marked side-effecting per instruction.
    pub const fn has_side_effect(&self) -> bool {
        matches!(self, Self::Send | Self::Recv | Self::Infeed | Self::Outfeed | Self::Rng)
    }
}
