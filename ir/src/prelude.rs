//! Common imports for building and inspecting instruction graphs.
//!
//! ```rust,ignore
//! use kiln_ir::prelude::*;
//! ```

pub use crate::computation::Computation;
pub use crate::instruction::{FusionKind, InstrId};
pub use crate::opcode::Opcode;
pub use crate::shape::{ArrayShape, Layout, Shape};
pub use crate::view::{FusionView, InstrRef};

pub use kiln_dtype::ElementType;
