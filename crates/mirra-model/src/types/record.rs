use ecow::EcoString;

use super::{TypeId, TypeKind};
use crate::element::ElementId;

/// The immutable shape of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRecord {
    Primitive(TypeKind),
    /// `None`, `Void`, `Package` or `Module`.
    NoType(TypeKind),
    Null,
    Array {
        component: TypeId,
    },
    /// A usage of a type element. Zero `arguments` on a generic element is the raw usage.
    Declared {
        enclosing: TypeId,
        element: ElementId,
        arguments: Vec<TypeId>,
    },
    Error {
        name: EcoString,
        element: Option<ElementId>,
    },
    TypeVar {
        element: ElementId,
        upper: TypeId,
        lower: TypeId,
    },
    Wildcard {
        extends: Option<TypeId>,
        super_bound: Option<TypeId>,
    },
    Executable {
        type_variables: Vec<TypeId>,
        receiver: TypeId,
        parameters: Vec<TypeId>,
        return_type: TypeId,
        thrown: Vec<TypeId>,
    },
    Union(Vec<TypeId>),
    Intersection(Vec<TypeId>),
}

impl TypeRecord {
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Primitive(kind) | Self::NoType(kind) => *kind,
            Self::Null => TypeKind::Null,
            Self::Array { .. } => TypeKind::Array,
            Self::Declared { .. } => TypeKind::Declared,
            Self::Error { .. } => TypeKind::Error,
            Self::TypeVar { .. } => TypeKind::TypeVar,
            Self::Wildcard { .. } => TypeKind::Wildcard,
            Self::Executable { .. } => TypeKind::Executable,
            Self::Union(_) => TypeKind::Union,
            Self::Intersection(_) => TypeKind::Intersection,
        }
    }

    /// The element a declared, error or type-variable type stands for.
    pub fn element(&self) -> Option<ElementId> {
        match self {
            Self::Declared { element, .. } | Self::TypeVar { element, .. } => Some(*element),
            Self::Error { element, .. } => *element,
            _ => None,
        }
    }

    pub fn arguments(&self) -> &[TypeId] {
        match self {
            Self::Declared { arguments, .. } => arguments,
            _ => &[],
        }
    }
}
