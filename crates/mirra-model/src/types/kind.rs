use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Discriminant of a type.
#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TypeKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
    Void,
    None,
    Null,
    Array,
    Declared,
    Error,
    TypeVar,
    Wildcard,
    Package,
    Module,
    Executable,
    Union,
    Intersection,
}

impl TypeKind {
    pub const PRIMITIVES: [TypeKind; 8] = [
        TypeKind::Boolean,
        TypeKind::Byte,
        TypeKind::Short,
        TypeKind::Int,
        TypeKind::Long,
        TypeKind::Char,
        TypeKind::Float,
        TypeKind::Double,
    ];

    pub fn is_primitive(self) -> bool {
        Self::PRIMITIVES.contains(&self)
    }

    pub fn is_no_type(self) -> bool {
        matches!(self, Self::None | Self::Void | Self::Package | Self::Module)
    }

    /// Kinds whose values are references (and may therefore be type arguments).
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            Self::Array
                | Self::Declared
                | Self::Error
                | Self::TypeVar
                | Self::Null
                | Self::Union
                | Self::Intersection
        )
    }

    /// The source spelling of a primitive or `void`.
    pub fn keyword(self) -> Option<&'static str> {
        Some(match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Char => "char",
            Self::Float => "float",
            Self::Double => "double",
            Self::Void => "void",
            _ => return None,
        })
    }

    /// Primitive widening rank; `char` widens to `int` but not to `short`.
    pub(crate) fn widens_to(self, target: Self) -> bool {
        use TypeKind::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => target == Double,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TypeKind;

    #[test]
    fn primitive_widening() {
        assert!(TypeKind::Byte.widens_to(TypeKind::Double));
        assert!(TypeKind::Char.widens_to(TypeKind::Int));
        assert!(!TypeKind::Char.widens_to(TypeKind::Short));
        assert!(!TypeKind::Boolean.widens_to(TypeKind::Int));
        assert!(!TypeKind::Double.widens_to(TypeKind::Float));
    }

    #[test]
    fn keywords_only_exist_for_primitives_and_void() {
        assert_eq!(TypeKind::Int.keyword(), Some("int"));
        assert_eq!(TypeKind::Void.keyword(), Some("void"));
        assert_eq!(TypeKind::Declared.keyword(), None);
    }
}
