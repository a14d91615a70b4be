use derive_more::Display;
use ecow::EcoString;
use serde::{Deserialize, Serialize};

use crate::{annotation::AnnotationMirror, types::TypeId};

mirra_utils::define_id!(
    /// Handle of an element inside a [`crate::model::Model`].
    ElementId
);

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ElementKind {
    Module,
    Package,
    Class,
    Interface,
    Enum,
    Record,
    AnnotationType,
    Constructor,
    Method,
    Field,
    EnumConstant,
    Parameter,
    LocalVariable,
    ExceptionParameter,
    ResourceVariable,
    BindingVariable,
    TypeParameter,
    RecordComponent,
}

impl ElementKind {
    pub fn is_type(self) -> bool {
        matches!(
            self,
            Self::Class | Self::Interface | Self::Enum | Self::Record | Self::AnnotationType
        )
    }

    pub fn is_class(self) -> bool {
        matches!(self, Self::Class | Self::Enum | Self::Record)
    }

    pub fn is_interface(self) -> bool {
        matches!(self, Self::Interface | Self::AnnotationType)
    }

    pub fn is_executable(self) -> bool {
        matches!(self, Self::Constructor | Self::Method)
    }

    pub fn is_variable(self) -> bool {
        matches!(
            self,
            Self::Field
                | Self::EnumConstant
                | Self::Parameter
                | Self::LocalVariable
                | Self::ExceptionParameter
                | Self::ResourceVariable
                | Self::BindingVariable
        )
    }

    /// Variables that only exist inside a method body.
    pub fn is_local(self) -> bool {
        matches!(
            self,
            Self::LocalVariable
                | Self::ExceptionParameter
                | Self::ResourceVariable
                | Self::BindingVariable
        )
    }

    /// Elements that may declare type parameters.
    pub fn is_parameterizable(self) -> bool {
        self.is_type() || self.is_executable()
    }
}

#[derive(
    Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Modifier {
    #[display("public")]
    Public,
    #[display("protected")]
    Protected,
    #[display("private")]
    Private,
    #[display("abstract")]
    Abstract,
    #[display("default")]
    Default,
    #[display("static")]
    Static,
    #[display("sealed")]
    Sealed,
    #[display("final")]
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NestingKind {
    TopLevel,
    Member,
    Local,
}

/// A completed element.
///
/// Records are produced once by completion and never mutated afterwards, so a
/// holder of an `Arc<ElementRecord>` may read it without the model lock.
/// Fields that do not apply to the element's kind hold their neutral value
/// (an empty list, [`TypeId::NONE`], `None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecord {
    pub id: ElementId,
    pub kind: ElementKind,
    pub simple_name: EcoString,
    pub qualified_name: EcoString,
    pub enclosing: Option<ElementId>,
    pub enclosed: Vec<ElementId>,
    pub modifiers: Vec<Modifier>,
    pub nesting: NestingKind,
    /// The prototypical type of the element.
    pub as_type: TypeId,
    pub type_parameters: Vec<ElementId>,
    pub superclass: TypeId,
    pub interfaces: Vec<TypeId>,
    pub bounds: Vec<TypeId>,
    pub generic_element: Option<ElementId>,
    pub parameters: Vec<ElementId>,
    pub return_type: TypeId,
    pub thrown_types: Vec<TypeId>,
    pub varargs: bool,
    pub record_components: Vec<ElementId>,
    pub annotations: Vec<AnnotationMirror>,
    /// Set when completion could not resolve part of the declaration.
    pub erroneous: bool,
}

impl ElementRecord {
    pub fn new(id: ElementId, kind: ElementKind, simple_name: impl Into<EcoString>) -> Self {
        let simple_name = simple_name.into();
        Self {
            id,
            kind,
            qualified_name: simple_name.clone(),
            simple_name,
            enclosing: None,
            enclosed: Vec::new(),
            modifiers: Vec::new(),
            nesting: NestingKind::TopLevel,
            as_type: TypeId::NONE,
            type_parameters: Vec::new(),
            superclass: TypeId::NONE,
            interfaces: Vec::new(),
            bounds: Vec::new(),
            generic_element: None,
            parameters: Vec::new(),
            return_type: TypeId::NONE,
            thrown_types: Vec::new(),
            varargs: false,
            record_components: Vec::new(),
            annotations: Vec::new(),
            erroneous: false,
        }
    }

    pub fn with_enclosing(mut self, enclosing: Option<ElementId>) -> Self {
        self.enclosing = enclosing;
        self
    }

    pub fn with_type(mut self, ty: TypeId) -> Self {
        self.as_type = ty;
        self
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn is_static(&self) -> bool {
        self.has_modifier(Modifier::Static)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_families_do_not_overlap() {
        for kind in [
            ElementKind::Class,
            ElementKind::Method,
            ElementKind::Field,
            ElementKind::TypeParameter,
        ] {
            let families = [kind.is_type(), kind.is_executable(), kind.is_variable()];
            assert!(families.iter().filter(|f| **f).count() <= 1, "{kind}");
        }
        assert!(ElementKind::LocalVariable.is_local());
        assert!(!ElementKind::Parameter.is_local());
    }

    #[test]
    fn fresh_records_are_neutral() {
        let record = ElementRecord::new(ElementId::from_usize(0), ElementKind::Field, "x");
        assert_eq!(record.qualified_name, "x");
        assert_eq!(record.as_type, TypeId::NONE);
        assert!(record.enclosed.is_empty());
        assert!(!record.is_static());
    }
}
