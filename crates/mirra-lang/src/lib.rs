//! Domain-neutral access to a compiler semantic model.
//!
//! Elements and types are reached through a [`domain::Domain`], wrapped in
//! [`universal`] wrappers that serialize native access behind the domain
//! lock, and can be turned into portable [`describe`] recipes. A live model
//! outside of any compilation is provided by [`runtime`].

pub mod config;
pub mod describe;
pub mod domain;
pub mod error;
pub mod runtime;
pub mod synthetic;
pub mod universal;

#[cfg(test)]
pub(crate) mod test;

pub mod prelude {
    pub use crate::{
        config::RuntimeConfig,
        describe::{Describe, Descriptor, Factory, Value, reconstruct},
        domain::{Domain, ModelDomain},
        error::{EvalError, LangError, LangResult},
        runtime::{Runtime, RuntimeHandle},
        synthetic::{Annotations, SyntheticAnnotation, SyntheticElement, SyntheticValue},
        universal::{UniversalAnnotation, UniversalElement, UniversalType, UniversalValue},
    };
}
