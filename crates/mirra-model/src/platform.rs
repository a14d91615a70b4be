//! The built-in declarations every compilation sees.

use crate::{
    decl::{AnnotationDecl, CompilationUnit, MethodDecl, TypeDecl, TypeRef, ValueDecl},
    element::Modifier,
    error::ModelResult,
    model::Model,
};

pub const MODULE: &str = "base";
pub const LANG: &str = "lang";
pub const UTIL: &str = "util";

pub const OBJECT: &str = "lang.Object";
pub const STRING: &str = "lang.String";
pub const ENUM: &str = "lang.Enum";
pub const RECORD: &str = "lang.Record";

fn var(name: &str) -> TypeRef {
    TypeRef::var(name)
}

fn string() -> TypeRef {
    TypeRef::named("String")
}

fn lang() -> CompilationUnit {
    let runtime = AnnotationDecl::new(TypeRef::named("Retention")).value(
        "value",
        ValueDecl::EnumConstant {
            ty: TypeRef::named("RetentionPolicy"),
            name: "RUNTIME".into(),
        },
    );

    CompilationUnit::new(LANG)
        .in_module(MODULE)
        .with(
            TypeDecl::class("Object")
                .constructor(MethodDecl::new("<init>", TypeRef::Void).modifiers([Modifier::Public]))
                .method(MethodDecl::new("equals", TypeRef::BOOLEAN).param("other", TypeRef::named("Object")))
                .method(MethodDecl::new("hashCode", TypeRef::INT))
                .method(MethodDecl::new("toString", string())),
        )
        .with(
            TypeDecl::interface("Comparable")
                .type_param("T", [])
                .method(MethodDecl::new("compareTo", TypeRef::INT).param("other", var("T"))),
        )
        .with(TypeDecl::interface("Iterable").type_param("T", []))
        .with(
            TypeDecl::class("String")
                .modifiers([Modifier::Final])
                .implements(TypeRef::generic("Comparable", [string()]))
                .method(MethodDecl::new("length", TypeRef::INT))
                .method(MethodDecl::new("charAt", TypeRef::CHAR).param("index", TypeRef::INT)),
        )
        .with(
            TypeDecl::class("Number")
                .modifiers([Modifier::Abstract])
                .method(MethodDecl::new("intValue", TypeRef::INT).modifiers([Modifier::Abstract])),
        )
        .with(
            TypeDecl::class("Integer")
                .modifiers([Modifier::Final])
                .extends(TypeRef::named("Number"))
                .implements(TypeRef::generic("Comparable", [TypeRef::named("Integer")]))
                .constant("MAX_VALUE", TypeRef::INT)
                .method(
                    MethodDecl::new("valueOf", TypeRef::named("Integer"))
                        .modifiers([Modifier::Public, Modifier::Static])
                        .param("value", TypeRef::INT),
                ),
        )
        .with(
            TypeDecl::class("Enum")
                .modifiers([Modifier::Abstract])
                .type_param("E", [TypeRef::generic("Enum", [var("E")])])
                .implements(TypeRef::generic("Comparable", [var("E")]))
                .method(MethodDecl::new("name", string()))
                .method(MethodDecl::new("ordinal", TypeRef::INT)),
        )
        .with(TypeDecl::class("Record").modifiers([Modifier::Abstract]))
        .with(TypeDecl::class("Throwable").method(MethodDecl::new("getMessage", string())))
        .with(TypeDecl::class("Exception").extends(TypeRef::named("Throwable")))
        .with(TypeDecl::annotation("Deprecated").annotated(runtime.clone()))
        .with(
            TypeDecl::enumeration("RetentionPolicy")
                .enum_constant("SOURCE")
                .enum_constant("CLASS")
                .enum_constant("RUNTIME"),
        )
        .with(
            TypeDecl::annotation("Retention")
                .method(MethodDecl::new("value", TypeRef::named("RetentionPolicy")))
                .annotated(runtime),
        )
}

fn util() -> CompilationUnit {
    CompilationUnit::new(UTIL)
        .in_module(MODULE)
        .with(
            TypeDecl::interface("Collection")
                .type_param("E", [])
                .extends(TypeRef::generic("Iterable", [var("E")]))
                .method(MethodDecl::new("size", TypeRef::INT))
                .method(MethodDecl::new("add", TypeRef::BOOLEAN).param("element", var("E"))),
        )
        .with(
            TypeDecl::interface("List")
                .type_param("E", [])
                .extends(TypeRef::generic("Collection", [var("E")]))
                .method(MethodDecl::new("get", var("E")).param("index", TypeRef::INT))
                .method(
                    MethodDecl::new("set", var("E"))
                        .param("index", TypeRef::INT)
                        .param("element", var("E")),
                ),
        )
        .with(
            TypeDecl::class("ArrayList")
                .type_param("E", [])
                .implements(TypeRef::generic("List", [var("E")]))
                .constructor(MethodDecl::new("<init>", TypeRef::Void))
                .constructor(MethodDecl::new("<init>", TypeRef::Void).param("capacity", TypeRef::INT)),
        )
        .with(
            TypeDecl::interface("Map")
                .type_param("K", [])
                .type_param("V", [])
                .method(MethodDecl::new("get", var("V")).param("key", TypeRef::named("Object")))
                .method(
                    MethodDecl::new("put", var("V"))
                        .param("key", var("K"))
                        .param("value", var("V")),
                )
                .nested(
                    TypeDecl::interface("Entry")
                        .type_param("K", [])
                        .type_param("V", [])
                        .method(MethodDecl::new("getKey", var("K")))
                        .method(MethodDecl::new("getValue", var("V"))),
                ),
        )
        .with(
            TypeDecl::class("HashMap")
                .type_param("K", [])
                .type_param("V", [])
                .implements(TypeRef::generic("Map", [var("K"), var("V")]))
                .constructor(MethodDecl::new("<init>", TypeRef::Void)),
        )
}

/// The platform declarations, `lang` first.
pub fn units() -> Vec<CompilationUnit> {
    vec![lang(), util()]
}

/// Enters the platform into `model`.
pub fn install(model: &mut Model) -> ModelResult<()> {
    for unit in units() {
        let module = model.declare_module(MODULE);
        let package = model.declare_package(Some(module), &unit.package);
        for decl in unit.types {
            model.declare_type(package, decl)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;

    #[test]
    fn platform_completes_without_errors() {
        let mut model = Model::with_platform().unwrap();
        let types: Vec<_> = model.type_elements().collect();
        for ty in types {
            let record = model.complete(ty);
            assert!(!record.erroneous, "{}", record.qualified_name);
        }

        let entry = model.type_element("util.Map.Entry").unwrap();
        assert_eq!(model.element_kind(entry), Some(ElementKind::Interface));
        assert!(model.complete(entry).is_static());
    }

    #[test]
    fn packages_belong_to_the_base_module() {
        let mut model = Model::with_platform().unwrap();
        let base = model.module_element(MODULE).unwrap();
        let lang = model.package_element(LANG).unwrap();

        assert_eq!(model.complete(lang).enclosing, Some(base));
        let module = model.complete(base);
        assert_eq!(module.enclosed.len(), 2);
    }
}
