//! Shapes and layouts.
//!
//! A [`Shape`] is either an array (element type, logical dimensions and a
//! physical [`Layout`]) or a tuple of nested shapes. Layouts are only
//! meaningful for arrays.

use std::fmt;

use kiln_dtype::ElementType;
use smallvec::SmallVec;
use snafu::ensure;

use crate::{Result, error::*};

/// Logical dimension sizes.
///
/// Inline capacity of 4 covers the common ranks without heap allocation.
pub type Dims = SmallVec<[i64; 4]>;

/// Size in bytes of one entry of a tuple's pointer table.
pub const TUPLE_POINTER_BYTES: usize = 8;

// =========================================================================
// Layout
// =========================================================================

/// Physical ordering of an array's dimensions, from most minor to most major.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Layout {
    minor_to_major: SmallVec<[usize; 4]>,
}

impl Layout {
    /// Create a layout, validating that it permutes `0..rank`.
    pub fn new(minor_to_major: impl IntoIterator<Item = usize>, rank: usize) -> Result<Self> {
        let minor_to_major: SmallVec<[usize; 4]> = minor_to_major.into_iter().collect();
        ensure!(
            is_permutation(&minor_to_major, rank),
            InvalidLayoutSnafu { minor_to_major: minor_to_major.to_vec(), rank }
        );
        Ok(Self { minor_to_major })
    }

    /// Row-major layout: the last logical dimension is the most minor.
    pub fn default_for_rank(rank: usize) -> Self {
        Self { minor_to_major: (0..rank).rev().collect() }
    }

    pub fn minor_to_major(&self) -> &[usize] {
        &self.minor_to_major
    }

    /// Dimensions ordered from most major to most minor.
    pub fn major_to_minor(&self) -> impl Iterator<Item = usize> + '_ {
        self.minor_to_major.iter().rev().copied()
    }

    pub fn rank(&self) -> usize {
        self.minor_to_major.len()
    }

    /// Whether `dims` occupy a contiguous run of physical positions.
    ///
    /// An empty set is trivially consecutive.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use kiln_ir::shape::Layout;
    /// let layout = Layout::new([2, 1, 0], 3).unwrap();
    /// assert!(layout.are_dimensions_consecutive(&[0, 1]));
    /// assert!(!layout.are_dimensions_consecutive(&[0, 2]));
    /// ```
    pub fn are_dimensions_consecutive(&self, dims: &[usize]) -> bool {
        let mut positions: SmallVec<[usize; 4]> = SmallVec::with_capacity(dims.len());
        for dim in dims {
            match self.minor_to_major.iter().position(|d| d == dim) {
                Some(position) => positions.push(position),
                None => return false,
            }
        }
        positions.sort_unstable();
        positions.windows(2).all(|pair| pair[1] == pair[0] + 1)
    }
}

fn is_permutation(candidate: &[usize], rank: usize) -> bool {
    if candidate.len() != rank {
        return false;
    }
    let mut seen: SmallVec<[bool; 8]> = smallvec::smallvec![false; rank];
    for &dim in candidate {
        if dim >= rank || seen[dim] {
            return false;
        }
        seen[dim] = true;
    }
    true
}

// =========================================================================
// Shape
// =========================================================================

/// Array-shaped value descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayShape {
    element_type: ElementType,
    dims: Dims,
    layout: Layout,
}

impl ArrayShape {
    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn dims(&self) -> &[i64] {
        &self.dims
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn element_count(&self) -> i64 {
        self.dims.iter().product()
    }

    /// Product of the sizes of `dims`.
    pub fn dims_product(&self, dims: impl IntoIterator<Item = usize>) -> i64 {
        dims.into_iter().map(|d| self.dims[d]).product()
    }

    pub fn is_zero_element(&self) -> bool {
        self.dims.contains(&0)
    }

    /// Logical dimensions with every size-1 dimension removed.
    pub fn non_degenerate_dims(&self) -> Dims {
        self.dims.iter().copied().filter(|&d| d != 1).collect()
    }

    /// Same dimensions and layout with another element type.
    pub fn with_element_type(&self, element_type: ElementType) -> Self {
        Self { element_type, ..self.clone() }
    }
}

/// Shape of an instruction's result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    Array(ArrayShape),
    Tuple(Vec<Shape>),
}

impl Shape {
    /// Array with the default row-major layout.
    ///
    /// # Panics
    ///
    /// Panics if any dimension is negative.
    pub fn array(element_type: ElementType, dims: impl IntoIterator<Item = i64>) -> Self {
        let dims: Dims = dims.into_iter().collect();
        assert!(dims.iter().all(|&d| d >= 0), "negative dimension in {dims:?}");
        let layout = Layout::default_for_rank(dims.len());
        Self::Array(ArrayShape { element_type, dims, layout })
    }

    /// Array with an explicit `minor_to_major` layout.
    pub fn array_with_layout(
        element_type: ElementType,
        dims: impl IntoIterator<Item = i64>,
        minor_to_major: impl IntoIterator<Item = usize>,
    ) -> Result<Self> {
        let dims: Dims = dims.into_iter().collect();
        ensure!(dims.iter().all(|&d| d >= 0), NegativeDimensionSnafu { dims: dims.to_vec() });
        let layout = Layout::new(minor_to_major, dims.len())?;
        Ok(Self::Array(ArrayShape { element_type, dims, layout }))
    }

    /// Rank-0 array.
    pub fn scalar(element_type: ElementType) -> Self {
        Self::array(element_type, [])
    }

    pub fn tuple(elements: impl IntoIterator<Item = Shape>) -> Self {
        Self::Tuple(elements.into_iter().collect())
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, Self::Tuple(_))
    }

    pub fn as_array(&self) -> Option<&ArrayShape> {
        match self {
            Self::Array(array) => Some(array),
            Self::Tuple(_) => None,
        }
    }

    pub fn tuple_elements(&self) -> &[Shape] {
        match self {
            Self::Tuple(elements) => elements,
            Self::Array(_) => &[],
        }
    }

    /// Rank of an array shape; `None` for tuples.
    pub fn rank(&self) -> Option<usize> {
        self.as_array().map(ArrayShape::rank)
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.as_array().map(ArrayShape::layout)
    }

    pub fn element_type(&self) -> Option<ElementType> {
        self.as_array().map(ArrayShape::element_type)
    }

    /// Number of nodes in the shape tree, the shape itself included.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use kiln_ir::shape::Shape;
    /// # use kiln_dtype::ElementType;
    /// let f32x4 = Shape::array(ElementType::F32, [4]);
    /// assert_eq!(f32x4.subshape_count(), 1);
    /// assert_eq!(Shape::tuple([f32x4.clone(), f32x4]).subshape_count(), 3);
    /// ```
    pub fn subshape_count(&self) -> usize {
        match self {
            Self::Array(_) => 1,
            Self::Tuple(elements) => 1 + elements.iter().map(Shape::subshape_count).sum::<usize>(),
        }
    }

    /// Bytes needed to hold a value of this shape.
    ///
    /// Tuples count only their top-level pointer table.
    pub fn byte_size(&self) -> usize {
        match self {
            Self::Array(array) => array.element_count() as usize * array.element_type.bytes(),
            Self::Tuple(elements) => elements.len() * TUPLE_POINTER_BYTES,
        }
    }

    /// Array with exactly one element, whatever its rank.
    pub fn is_effective_scalar(&self) -> bool {
        self.as_array().is_some_and(|array| array.dims.iter().all(|&d| d == 1))
    }

    /// Structural equality in which any two floating point element types match.
    pub fn equal_ignoring_fp_precision(&self, other: &Shape) -> bool {
        match (self, other) {
            (Self::Array(lhs), Self::Array(rhs)) => {
                lhs.element_type.same_ignoring_fp_precision(&rhs.element_type)
                    && lhs.dims == rhs.dims
                    && lhs.layout == rhs.layout
            }
            (Self::Tuple(lhs), Self::Tuple(rhs)) => {
                lhs.len() == rhs.len() && lhs.iter().zip(rhs).all(|(l, r)| l.equal_ignoring_fp_precision(r))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array(array) => {
                write!(f, "{}[", array.element_type)?;
                for (i, dim) in array.dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{dim}")?;
                }
                write!(f, "]{{")?;
                for (i, dim) in array.layout.minor_to_major.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{dim}")?;
                }
                write!(f, "}}")
            }
            Self::Tuple(elements) => {
                write!(f, "(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, ")")
            }
        }
    }
}
