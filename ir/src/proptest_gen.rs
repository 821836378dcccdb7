use kiln_dtype::ElementType;
use proptest::prelude::*;

use crate::shape::Shape;

/// Dimension sizes straddling the 32-wide warp threshold used by reduction emission.
pub const DIM_SIZES: [i64; 5] = [1, 4, 16, 32, 64];

/// Physical layout permutation for `rank` dimensions.
pub fn layout_generator(rank: usize) -> impl Strategy<Value = Vec<usize>> {
    Just((0..rank).collect::<Vec<_>>()).prop_shuffle()
}

/// Array shape of rank `1..=max_rank` with an arbitrary layout.
pub fn array_shape_generator(max_rank: usize) -> impl Strategy<Value = Shape> {
    (ElementType::float_generator(), 1..=max_rank)
        .prop_flat_map(|(element_type, rank)| {
            (Just(element_type), prop::collection::vec(prop::sample::select(DIM_SIZES.to_vec()), rank), layout_generator(rank))
        })
        .prop_map(|(element_type, dims, layout)| {
            Shape::array_with_layout(element_type, dims, layout).expect("generated layout is a permutation")
        })
}
