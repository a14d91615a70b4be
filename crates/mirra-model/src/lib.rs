//! A compiler semantic model: elements and types entered from declarations,
//! completed lazily, and related by a small type algebra.
//!
//! The model is single-threaded. Share it as a [`SharedModel`] and hold the
//! lock for every call.

use std::sync::Arc;

pub mod algebra;
pub mod annotation;
pub mod compiler;
mod complete;
pub mod decl;
pub mod element;
pub mod error;
pub mod model;
pub mod platform;
pub mod print;
pub mod types;

#[cfg(test)]
pub(crate) mod test;

pub use mirra_utils::interner::StrKey as Name;

pub type SharedModel = Arc<parking_lot::Mutex<model::Model>>;

pub mod prelude {
    pub use crate::{
        Name, SharedModel,
        annotation::{AnnotationMirror, AnnotationValue},
        compiler::{Compilation, CompileOptions, CompileSummary, TaskListener},
        decl::{CompilationUnit, MemberDecl, MethodDecl, TypeDecl, TypeRef},
        element::{ElementId, ElementKind, ElementRecord, Modifier, NestingKind},
        error::{CompileError, ModelError, ModelResult},
        model::Model,
        print::DisplayWithModel,
        types::{TypeId, TypeKind, TypeRecord},
    };
}
