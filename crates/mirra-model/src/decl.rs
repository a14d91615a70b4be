//! Unresolved declarations as the front end enters them.
//!
//! Types are referenced textually (`TypeRef`) and only resolved when the
//! declaring element is completed.

use ecow::EcoString;
use serde::{Deserialize, Serialize};

use crate::{
    element::{ElementKind, Modifier},
    types::TypeKind,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    Primitive(TypeKind),
    Void,
    /// A type element by qualified or simple name.
    Named {
        name: EcoString,
        #[serde(default)]
        args: Vec<TypeRef>,
    },
    /// A type variable in scope.
    Var(EcoString),
    Array(Box<TypeRef>),
    Wildcard {
        extends: Option<Box<TypeRef>>,
        super_bound: Option<Box<TypeRef>>,
    },
}

impl TypeRef {
    pub const BOOLEAN: Self = Self::Primitive(TypeKind::Boolean);
    pub const INT: Self = Self::Primitive(TypeKind::Int);
    pub const LONG: Self = Self::Primitive(TypeKind::Long);
    pub const CHAR: Self = Self::Primitive(TypeKind::Char);
    pub const DOUBLE: Self = Self::Primitive(TypeKind::Double);

    pub fn named(name: impl Into<EcoString>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<EcoString>, args: impl IntoIterator<Item = TypeRef>) -> Self {
        Self::Named {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    pub fn var(name: impl Into<EcoString>) -> Self {
        Self::Var(name.into())
    }

    pub fn array(component: TypeRef) -> Self {
        Self::Array(Box::new(component))
    }

    pub fn wildcard() -> Self {
        Self::Wildcard {
            extends: None,
            super_bound: None,
        }
    }

    pub fn extends(bound: TypeRef) -> Self {
        Self::Wildcard {
            extends: Some(Box::new(bound)),
            super_bound: None,
        }
    }

    pub fn super_of(bound: TypeRef) -> Self {
        Self::Wildcard {
            extends: None,
            super_bound: Some(Box::new(bound)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDecl {
    pub name: EcoString,
    #[serde(default)]
    pub bounds: Vec<TypeRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueDecl {
    Bool(bool),
    Int(i64),
    Str(EcoString),
    Type(TypeRef),
    EnumConstant { ty: TypeRef, name: EcoString },
    Array(Vec<ValueDecl>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationDecl {
    pub annotation_type: TypeRef,
    #[serde(default)]
    pub values: Vec<(EcoString, ValueDecl)>,
}

impl AnnotationDecl {
    pub fn new(annotation_type: TypeRef) -> Self {
        Self {
            annotation_type,
            values: Vec::new(),
        }
    }

    pub fn value(mut self, name: impl Into<EcoString>, value: ValueDecl) -> Self {
        self.values.push((name.into(), value));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: EcoString,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub type_parameters: Vec<TypeParamDecl>,
    #[serde(default)]
    pub parameters: Vec<(EcoString, TypeRef)>,
    pub return_type: TypeRef,
    #[serde(default)]
    pub thrown: Vec<TypeRef>,
    #[serde(default)]
    pub varargs: bool,
    #[serde(default)]
    pub annotations: Vec<AnnotationDecl>,
}

impl MethodDecl {
    pub fn new(name: impl Into<EcoString>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            modifiers: Vec::new(),
            type_parameters: Vec::new(),
            parameters: Vec::new(),
            return_type,
            thrown: Vec::new(),
            varargs: false,
            annotations: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<EcoString>, ty: TypeRef) -> Self {
        self.parameters.push((name.into(), ty));
        self
    }

    pub fn type_param(
        mut self,
        name: impl Into<EcoString>,
        bounds: impl IntoIterator<Item = TypeRef>,
    ) -> Self {
        self.type_parameters.push(TypeParamDecl {
            name: name.into(),
            bounds: bounds.into_iter().collect(),
        });
        self
    }

    pub fn throws(mut self, ty: TypeRef) -> Self {
        self.thrown.push(ty);
        self
    }

    pub fn varargs(mut self) -> Self {
        self.varargs = true;
        self
    }

    pub fn modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.modifiers.extend(modifiers);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberDecl {
    Field {
        name: EcoString,
        ty: TypeRef,
        #[serde(default)]
        modifiers: Vec<Modifier>,
    },
    EnumConstant(EcoString),
    Method(MethodDecl),
    /// Constructors ignore the return type of their `MethodDecl`.
    Constructor(MethodDecl),
    RecordComponent {
        name: EcoString,
        ty: TypeRef,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub kind: ElementKind,
    pub name: EcoString,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub type_parameters: Vec<TypeParamDecl>,
    #[serde(default)]
    pub superclass: Option<TypeRef>,
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    #[serde(default)]
    pub nested: Vec<TypeDecl>,
    #[serde(default)]
    pub annotations: Vec<AnnotationDecl>,
}

impl TypeDecl {
    pub fn new(kind: ElementKind, name: impl Into<EcoString>) -> Self {
        Self {
            kind,
            name: name.into(),
            modifiers: vec![Modifier::Public],
            type_parameters: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            nested: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn class(name: impl Into<EcoString>) -> Self {
        Self::new(ElementKind::Class, name)
    }

    pub fn interface(name: impl Into<EcoString>) -> Self {
        Self::new(ElementKind::Interface, name)
    }

    pub fn enumeration(name: impl Into<EcoString>) -> Self {
        Self::new(ElementKind::Enum, name)
    }

    pub fn record(name: impl Into<EcoString>) -> Self {
        Self::new(ElementKind::Record, name)
    }

    pub fn annotation(name: impl Into<EcoString>) -> Self {
        Self::new(ElementKind::AnnotationType, name)
    }

    pub fn modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.modifiers.extend(modifiers);
        self
    }

    pub fn type_param(
        mut self,
        name: impl Into<EcoString>,
        bounds: impl IntoIterator<Item = TypeRef>,
    ) -> Self {
        self.type_parameters.push(TypeParamDecl {
            name: name.into(),
            bounds: bounds.into_iter().collect(),
        });
        self
    }

    pub fn extends(mut self, superclass: TypeRef) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn implements(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn field(mut self, name: impl Into<EcoString>, ty: TypeRef) -> Self {
        self.members.push(MemberDecl::Field {
            name: name.into(),
            ty,
            modifiers: Vec::new(),
        });
        self
    }

    pub fn constant(mut self, name: impl Into<EcoString>, ty: TypeRef) -> Self {
        self.members.push(MemberDecl::Field {
            name: name.into(),
            ty,
            modifiers: vec![Modifier::Public, Modifier::Static, Modifier::Final],
        });
        self
    }

    pub fn enum_constant(mut self, name: impl Into<EcoString>) -> Self {
        self.members.push(MemberDecl::EnumConstant(name.into()));
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.members.push(MemberDecl::Method(method));
        self
    }

    pub fn constructor(mut self, constructor: MethodDecl) -> Self {
        self.members.push(MemberDecl::Constructor(constructor));
        self
    }

    pub fn component(mut self, name: impl Into<EcoString>, ty: TypeRef) -> Self {
        self.members.push(MemberDecl::RecordComponent {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn nested(mut self, decl: TypeDecl) -> Self {
        self.nested.push(decl);
        self
    }

    pub fn annotated(mut self, annotation: AnnotationDecl) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// The declarations of one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationUnit {
    #[serde(default)]
    pub module: Option<EcoString>,
    pub package: EcoString,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

impl CompilationUnit {
    pub fn new(package: impl Into<EcoString>) -> Self {
        Self {
            module: None,
            package: package.into(),
            types: Vec::new(),
        }
    }

    pub fn in_module(mut self, module: impl Into<EcoString>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_load_from_json() {
        let json = r#"{
            "package": "app",
            "types": [{
                "kind": "Class",
                "name": "Box",
                "type_parameters": [{ "name": "T" }],
                "members": [{ "Field": { "name": "value", "ty": { "Var": "T" } } }]
            }]
        }"#;

        let unit: CompilationUnit = serde_json::from_str(json).unwrap();
        let expected = CompilationUnit::new("app")
            .with(TypeDecl::class("Box").type_param("T", []).field("value", TypeRef::var("T")));

        assert_eq!(unit.types[0].members, expected.types[0].members);
        assert_eq!(unit.types[0].type_parameters, expected.types[0].type_parameters);
        assert!(unit.types[0].modifiers.is_empty());
    }
}
