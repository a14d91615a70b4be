use derive_more::Display;
use ecow::EcoString;
use mirra_model::{element::ElementKind, types::TypeKind};
use serde::{Deserialize, Serialize};

/// A factory a recipe may invoke.
///
/// Model factories take the domain's own recipe as their first argument.
/// Collection factories do not.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Factory {
    #[display("runtime_domain")]
    RuntimeDomain,
    #[display("name")]
    Name,
    #[display("module_element")]
    ModuleElement,
    #[display("package_element")]
    PackageElement,
    #[display("type_element")]
    TypeElement,
    #[display("type_parameter_element")]
    TypeParameterElement,
    #[display("executable_element")]
    ExecutableElement,
    #[display("variable_element")]
    VariableElement,
    #[display("record_component_element")]
    RecordComponentElement,
    #[display("declared_type")]
    DeclaredType,
    #[display("array_type")]
    ArrayType,
    #[display("primitive_type")]
    PrimitiveType,
    #[display("no_type")]
    NoType,
    #[display("null_type")]
    NullType,
    #[display("type_variable")]
    TypeVariable,
    #[display("wildcard_type")]
    WildcardType,
    #[display("annotation")]
    Annotation,
    /// A list of exactly `arity` elements.
    #[display("list_of/{arity}")]
    ListOf { arity: u8 },
    /// A list of any length.
    #[display("list_of_array")]
    ListOfArray,
    /// A map of exactly `arity` key-value pairs, given flat.
    #[display("map_of/{arity}")]
    MapOf { arity: u8 },
    /// A map of any number of [`Factory::MapEntry`] arguments.
    #[display("map_of_entries")]
    MapOfEntries,
    #[display("map_entry")]
    MapEntry,
}

impl Factory {
    /// The exact argument count, counting the domain, or `None` when any
    /// count is accepted.
    pub fn arity(self) -> Option<usize> {
        use Factory::*;
        Some(match self {
            RuntimeDomain => 0,
            NullType => 1,
            Name | ModuleElement | PackageElement | TypeElement | ArrayType | PrimitiveType
            | NoType | TypeVariable | MapEntry => 2,
            TypeParameterElement | VariableElement | RecordComponentElement | WildcardType
            | Annotation => 3,
            DeclaredType => 4,
            ExecutableElement => 5,
            ListOf { arity } => arity as usize,
            MapOf { arity } => 2 * arity as usize,
            ListOfArray | MapOfEntries => return None,
        })
    }

    pub fn takes_domain(self) -> bool {
        !matches!(
            self,
            Self::RuntimeDomain
                | Self::ListOf { .. }
                | Self::ListOfArray
                | Self::MapOf { .. }
                | Self::MapOfEntries
                | Self::MapEntry
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Descriptor {
    Null,
    Bool(bool),
    Int(i64),
    Str(EcoString),
    ElementKind(ElementKind),
    TypeKind(TypeKind),
    Invoke {
        factory: Factory,
        args: Vec<Descriptor>,
    },
}

impl Descriptor {
    pub fn invoke(factory: Factory, args: impl IntoIterator<Item = Descriptor>) -> Self {
        Self::Invoke {
            factory,
            args: args.into_iter().collect(),
        }
    }

    pub fn str(value: impl Into<EcoString>) -> Self {
        Self::Str(value.into())
    }

    pub fn factory(&self) -> Option<Factory> {
        match self {
            Self::Invoke { factory, .. } => Some(*factory),
            _ => None,
        }
    }

    pub fn args(&self) -> &[Descriptor] {
        match self {
            Self::Invoke { args, .. } => args,
            _ => &[],
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
