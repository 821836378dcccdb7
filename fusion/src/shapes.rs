//! Shape compatibility for multi-output fusion.
//!
//! A multi-output kernel shares one parallel loop nest across all of its
//! outputs, so every root must agree on the shape of that nest.

use kiln_ir::{InstrRef, Shape};
use smallvec::SmallVec;

use crate::emission::is_reduction_from_or_to_contiguous_dimensions;

/// The instruction that decides which emitter lowers `instr`.
///
/// For a multi-output fusion this prefers a contiguous reduction among the
/// root's operands, since it carries the most constraints, and falls back to
/// the first operand. A single-output fusion is represented by its root.
pub fn real_hero(instr: InstrRef<'_>) -> InstrRef<'_> {
    let Some(fusion) = instr.as_fusion() else {
        return instr;
    };
    let root = fusion.root();
    if !fusion.is_multi_output() {
        return root;
    }
    root.operands()
        .find(|&operand| is_reduction_from_or_to_contiguous_dimensions(operand))
        .unwrap_or_else(|| root.operand(0))
}

/// Iteration space of a hero.
///
/// A contiguous reduction iterates over its input, not its output.
pub fn loop_shape(hero: InstrRef<'_>) -> &Shape {
    if is_reduction_from_or_to_contiguous_dimensions(hero) { hero.operand(0).shape() } else { hero.shape() }
}

fn reduced_dimensions(reduce: InstrRef<'_>) -> SmallVec<[usize; 4]> {
    let mut dims: SmallVec<[usize; 4]> = reduce.dimensions().iter().copied().collect();
    dims.sort_unstable();
    dims
}

/// Whether `a` and `b` can share one multi-output kernel loop.
///
/// Two contiguous-reduction heroes must also produce identical output shapes
/// over the same reduced dimensions. The loop shapes must then match up to
/// floating point precision.
pub fn shapes_compatible_for_multi_output_fusion(a: InstrRef<'_>, b: InstrRef<'_>) -> bool {
    let hero_a = real_hero(a);
    let hero_b = real_hero(b);

    if is_reduction_from_or_to_contiguous_dimensions(hero_a)
        && is_reduction_from_or_to_contiguous_dimensions(hero_b)
        && (hero_a.shape() != hero_b.shape() || reduced_dimensions(hero_a) != reduced_dimensions(hero_b))
    {
        return false;
    }

    loop_shape(hero_a).equal_ignoring_fp_precision(loop_shape(hero_b))
}
