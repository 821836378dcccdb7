//! Layout compatibility for reduce input fusions.

use kiln_ir::{InstrRef, Layout};
use smallvec::SmallVec;

type Params<'a> = SmallVec<[InstrRef<'a>; 8]>;

/// Leaf parameters of `instr`: a fusion's own parameters, otherwise its operands.
fn append_params<'a>(instr: InstrRef<'a>, params: &mut Params<'a>) {
    match instr.as_fusion() {
        Some(fusion) => params.extend(fusion.parameters()),
        None => params.extend(instr.operands()),
    }
}

/// Whether a reduce input fusion of `producer` and `reduce` reads its
/// operands in a cache-friendly order.
///
/// Collects the leaf parameters of both instructions and takes the layout of
/// the first parameter with the highest rank. Every array parameter must
/// either have a lower rank or exactly that layout. Both arguments feed the
/// same parameter pool, so their order does not affect the result.
pub fn layouts_are_reduce_input_fusion_friendly(producer: InstrRef<'_>, reduce: InstrRef<'_>) -> bool {
    let mut params = Params::new();
    append_params(producer, &mut params);
    append_params(reduce, &mut params);

    let mut max_rank: Option<(usize, &Layout)> = None;
    for param in &params {
        if let Some(array) = param.shape().as_array()
            && max_rank.is_none_or(|(rank, _)| array.rank() > rank)
        {
            max_rank = Some((array.rank(), array.layout()));
        }
    }
    let Some((max_rank, max_rank_layout)) = max_rank else {
        return true;
    };

    params.iter().all(|param| match param.shape().as_array() {
        Some(array) => array.rank() < max_rank || array.layout() == max_rank_layout,
        None => true,
    })
}
