//! Uniform wrappers over native elements and types.
//!
//! A wrapper holds its domain and a native handle. The first access that
//! needs the native construct binds it under the domain lock; afterwards the
//! bound record is read without locking. Every accessor is total over kinds
//! and answers a neutral value (an empty list, a `None` type, `None`) when
//! the kind has no such property.

mod annotation;
mod element;
mod memo;
mod ty;

pub use annotation::{UniversalAnnotation, UniversalValue};
pub use element::{ElementSource, UniversalElement};
pub use ty::{TypeSource, UniversalType};
