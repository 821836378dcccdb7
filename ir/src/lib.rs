//! Instruction graph model consumed by the kiln fusion engine.
//!
//! The graph is built by upstream passes and treated as immutable by the
//! fusion engine. Shapes, layouts and fusion kinds are already assigned.
//!
//! # Module Organization
//!
//! - [`shape`] - Array and tuple shapes, physical layouts
//! - [`opcode`] - Closed opcode enumeration and opcode-level classification
//! - [`instruction`] - Instruction storage, fusion kinds, instruction ids
//! - [`computation`] - Instruction arena, users index, graph construction
//! - [`view`] - Read-only handles (`InstrRef`, `FusionView`)
//! - [`error`] - Graph construction errors

pub mod computation;
pub mod error;
pub mod instruction;
pub mod opcode;
pub mod prelude;
pub mod shape;
pub mod view;

#[cfg(any(test, feature = "proptest"))]
pub mod proptest_gen;


pub use computation::Computation;
pub use error::{Error, Result};
pub use instruction::{FusionKind, InstrId};
pub use opcode::Opcode;
pub use shape::{ArrayShape, Layout, Shape};
pub use view::{FusionView, InstrRef};

pub use kiln_dtype::ElementType;
