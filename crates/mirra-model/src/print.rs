use std::fmt;

use crate::{
    element::{ElementId, ElementKind},
    model::Model,
    types::{TypeId, TypeRecord},
};

/// Formatting of handles that need the model to be readable.
pub trait DisplayWithModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>, model: &Model) -> fmt::Result;
}

pub struct WithModel<'a, T> {
    pub value: T,
    pub model: &'a Model,
}

impl<T> fmt::Display for WithModel<'_, T>
where
    T: DisplayWithModel,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f, self.model)
    }
}

impl Model {
    pub fn display<T: DisplayWithModel>(&self, value: T) -> WithModel<'_, T> {
        WithModel { value, model: self }
    }
}

fn comma_separated(f: &mut fmt::Formatter<'_>, model: &Model, items: &[TypeId]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.fmt(f, model)?;
    }
    Ok(())
}

fn separated(
    f: &mut fmt::Formatter<'_>,
    model: &Model,
    items: &[TypeId],
    separator: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        item.fmt(f, model)?;
    }
    Ok(())
}

impl DisplayWithModel for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>, model: &Model) -> fmt::Result {
        let record = model.ty(*self);
        match &*record {
            TypeRecord::Primitive(kind) | TypeRecord::NoType(kind) => match kind.keyword() {
                Some(keyword) => f.write_str(keyword),
                None => write!(f, "{}", kind.to_string().to_lowercase()),
            },
            TypeRecord::Null => f.write_str("null"),
            TypeRecord::Array { component } => {
                component.fmt(f, model)?;
                f.write_str("[]")
            }
            TypeRecord::Declared {
                enclosing,
                element,
                arguments,
            } => {
                if *enclosing != TypeId::NONE {
                    enclosing.fmt(f, model)?;
                    let simple = model.slot(*element).map(|slot| slot.simple_name.as_str());
                    write!(f, ".{}", simple.unwrap_or("?"))?;
                } else {
                    element.fmt(f, model)?;
                }
                if !arguments.is_empty() {
                    f.write_str("<")?;
                    comma_separated(f, model, arguments)?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeRecord::Error { name, .. } => f.write_str(name),
            TypeRecord::TypeVar { element, .. } => element.fmt(f, model),
            TypeRecord::Wildcard {
                extends,
                super_bound,
            } => {
                f.write_str("?")?;
                if let Some(bound) = extends {
                    f.write_str(" extends ")?;
                    bound.fmt(f, model)?;
                }
                if let Some(bound) = super_bound {
                    f.write_str(" super ")?;
                    bound.fmt(f, model)?;
                }
                Ok(())
            }
            TypeRecord::Executable {
                type_variables,
                parameters,
                return_type,
                thrown,
                ..
            } => {
                if !type_variables.is_empty() {
                    f.write_str("<")?;
                    comma_separated(f, model, type_variables)?;
                    f.write_str(">")?;
                }
                f.write_str("(")?;
                comma_separated(f, model, parameters)?;
                f.write_str(")")?;
                return_type.fmt(f, model)?;
                if !thrown.is_empty() {
                    f.write_str(" throws ")?;
                    comma_separated(f, model, thrown)?;
                }
                Ok(())
            }
            TypeRecord::Union(alternatives) => separated(f, model, alternatives, " | "),
            TypeRecord::Intersection(bounds) => separated(f, model, bounds, " & "),
        }
    }
}

/// Types, packages and modules print qualified, executables print their
/// parameter types once completed, anything else prints its simple name.
impl DisplayWithModel for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>, model: &Model) -> fmt::Result {
        let Some(slot) = model.slot(*self) else {
            return write!(f, "<unknown {self}>");
        };
        match slot.kind {
            ElementKind::Module | ElementKind::Package => f.write_str(&slot.qualified_name),
            kind if kind.is_type() => f.write_str(&slot.qualified_name),
            kind if kind.is_executable() => {
                f.write_str(&slot.simple_name)?;
                let Some(record) = model.record(*self) else {
                    return Ok(());
                };
                f.write_str("(")?;
                for (i, &param) in record.parameters.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match model.record(param) {
                        Some(param) => param.as_type.fmt(f, model)?,
                        None => f.write_str("?")?,
                    }
                }
                f.write_str(")")
            }
            _ => f.write_str(&slot.simple_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        element::ElementKind,
        test::{declared, platform_model},
        types::{TypeId, TypeKind},
    };

    #[test]
    fn types_print_like_source() {
        let mut model = platform_model();
        let string = declared(&mut model, "lang.String", &[]);
        let list = declared(&mut model, "util.List", &[string]);
        let int = TypeId::primitive(TypeKind::Int).unwrap();
        let ints = model.array_type(int).unwrap();
        let wildcard = model.wildcard_type(None, Some(string)).unwrap();

        assert_eq!(model.display(string).to_string(), "lang.String");
        assert_eq!(model.display(list).to_string(), "util.List<lang.String>");
        assert_eq!(model.display(ints).to_string(), "int[]");
        assert_eq!(model.display(wildcard).to_string(), "? super lang.String");
        assert_eq!(model.display(TypeId::VOID).to_string(), "void");
        assert_eq!(model.display(TypeId::NONE).to_string(), "none");
    }

    #[test]
    fn executables_print_their_signature() {
        let mut model = platform_model();
        let list = model.type_element("util.List").unwrap();
        let int = TypeId::primitive(TypeKind::Int).unwrap();
        let get = model
            .executable_element(list, ElementKind::Method, "get", &[int])
            .unwrap();

        assert_eq!(model.display(get).to_string(), "get(int)");
        assert_eq!(model.display(list).to_string(), "util.List");
    }
}
