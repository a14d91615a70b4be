use std::{sync::Arc, time::Duration};

use miette::Diagnostic;
use mirra_model::error::{CompileError, ModelError};
use thiserror::Error;

use crate::describe::Factory;

pub type LangResult<T> = Result<T, LangError>;

#[derive(Debug, Clone, Error, Diagnostic)]
pub enum LangError {
    #[error("invalid argument: {0}")]
    #[diagnostic(code(mirra::lang::invalid_argument))]
    InvalidArgument(String),
    #[error("runtime model initialization failed")]
    #[diagnostic(code(mirra::runtime::initialization))]
    Initialization(#[source] Arc<CompileError>),
    #[error("runtime model task exited before signaling: {0}")]
    #[diagnostic(code(mirra::runtime::task_exited))]
    TaskExited(String),
    #[error("runtime model was not ready within {0:?}")]
    #[diagnostic(code(mirra::runtime::timeout))]
    Timeout(Duration),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),
}

impl LangError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Failure to evaluate a descriptor against a domain.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum EvalError {
    #[error("descriptor belongs to another domain")]
    #[diagnostic(
        code(mirra::eval::domain_mismatch),
        help("evaluate against a domain whose own descriptor matches the recipe")
    )]
    DomainMismatch,
    #[error("`{factory}` takes {expected} arguments, got {found}")]
    #[diagnostic(code(mirra::eval::arity))]
    Arity {
        factory: Factory,
        expected: usize,
        found: usize,
    },
    #[error("{0} does not resolve in this domain")]
    #[diagnostic(code(mirra::eval::unresolved))]
    Unresolved(String),
    #[error("{context} must be {expected}")]
    #[diagnostic(code(mirra::eval::shape))]
    Shape {
        context: String,
        expected: &'static str,
    },
    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Runtime(#[from] LangError),
}
