use ecow::EcoString;
use miette::Diagnostic;
use mirra_utils::errors::Errors;
use thiserror::Error;

use crate::{element::ElementId, types::TypeId};

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ModelError {
    #[error("illegal argument: {0}")]
    #[diagnostic(code(mirra::model::illegal_argument))]
    IllegalArgument(String),
    #[error("`{0}` is already declared")]
    #[diagnostic(code(mirra::model::duplicate))]
    Duplicate(EcoString),
    #[error("unknown element {0}")]
    #[diagnostic(code(mirra::model::unknown_element))]
    UnknownElement(ElementId),
    #[error("unknown type {0}")]
    #[diagnostic(code(mirra::model::unknown_type))]
    UnknownType(TypeId),
}

impl ModelError {
    pub fn illegal(message: impl Into<String>) -> Self {
        Self::IllegalArgument(message.into())
    }
}

#[derive(Debug, Clone, Error, Diagnostic)]
pub enum CompileError {
    #[error("compilation `{name}` failed to enter its declarations:\n{diagnostics}")]
    #[diagnostic(code(mirra::compile::enter))]
    Enter {
        name: String,
        diagnostics: Errors<ModelError>,
    },
    #[error("compilation `{name}` has erroneous elements: {}", elements.join(", "))]
    #[diagnostic(code(mirra::compile::analyze))]
    Analyze { name: String, elements: Vec<EcoString> },
}
