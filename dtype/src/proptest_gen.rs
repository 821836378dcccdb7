use crate::*;
use proptest::prelude::*;

#[rustfmt::skip]
impl ElementType {
    pub fn int_generator() -> impl Strategy<Value = Self> {
        prop_oneof![
            Just(Self::S8), Just(Self::S16), Just(Self::S32), Just(Self::S64),
            Just(Self::U8), Just(Self::U16), Just(Self::U32), Just(Self::U64)
        ]
    }

    pub fn float_generator() -> impl Strategy<Value = Self> {
        prop_oneof![Just(Self::F16), Just(Self::BF16), Just(Self::F32), Just(Self::F64)]
    }

    /// Every type that can back an array buffer.
    pub fn array_generator() -> impl Strategy<Value = Self> {
        any::<Self>().prop_filter("token has no storage", |ty| ty.is_array_type())
    }
}
