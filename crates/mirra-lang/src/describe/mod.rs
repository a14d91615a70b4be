//! Nominal descriptors: portable recipes that rebuild a construct against an
//! equivalent domain.
//!
//! A recipe is a tree of factory invocations. [`Describer`] produces it from
//! wrapped constructs and [`reconstruct`] evaluates it again. Anything that
//! cannot be re-derived from a recipe (local variables, error, union,
//! intersection and executable types, synthetic constructs, constructs of a
//! domain that has no recipe itself) is not describable, and neither is
//! anything that depends on it.

mod describer;
mod descriptor;
mod eval;

pub use describer::{Describe, Describer, MAX_FIXED_ARITY, describe_list, describe_map};
pub use descriptor::{Descriptor, Factory};
pub use eval::{
    Value, reconstruct, reconstruct_annotation, reconstruct_element, reconstruct_type,
};
