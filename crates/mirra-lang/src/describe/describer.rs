use std::collections::BTreeMap;

use ecow::EcoString;
use log::trace;
use mirra_model::{
    element::ElementKind,
    types::{TypeId, TypeKind, TypeRecord},
};

use crate::{
    describe::{Descriptor, Factory},
    domain::Domain,
    universal::{UniversalAnnotation, UniversalElement, UniversalType, UniversalValue},
};

/// Collections up to this size are rebuilt with a fixed-arity factory.
pub const MAX_FIXED_ARITY: usize = 10;

/// Constructs that can produce their own recipe.
pub trait Describe {
    /// The recipe, or `None` when this or anything it depends on is not
    /// describable.
    fn describe(&self) -> Option<Descriptor>;
}

/// Describes constructs of one domain.
#[derive(Debug, Clone)]
pub struct Describer {
    domain: Descriptor,
    identity: usize,
}

impl Describer {
    /// `None` when the domain itself is not describable, in which case
    /// nothing of it is.
    pub fn new(domain: &dyn Domain) -> Option<Self> {
        Some(Self {
            domain: domain.describe()?,
            identity: domain.identity(),
        })
    }

    fn owns(&self, domain: &dyn Domain) -> bool {
        domain.identity() == self.identity
    }

    fn invoke(&self, factory: Factory, args: impl IntoIterator<Item = Descriptor>) -> Descriptor {
        Descriptor::invoke(factory, std::iter::once(self.domain.clone()).chain(args))
    }

    fn name(&self, name: &str) -> Descriptor {
        self.invoke(Factory::Name, [Descriptor::str(name)])
    }

    pub fn element(&self, element: &UniversalElement) -> Option<Descriptor> {
        if !self.owns(&**element.domain()) {
            return None;
        }
        let record = element.record();
        let descriptor = match record.kind {
            ElementKind::Module => {
                self.invoke(Factory::ModuleElement, [self.name(&record.qualified_name)])
            }
            ElementKind::Package => {
                self.invoke(Factory::PackageElement, [self.name(&record.qualified_name)])
            }
            kind if kind.is_type() => {
                self.invoke(Factory::TypeElement, [self.name(&record.qualified_name)])
            }
            kind if kind.is_executable() => {
                let enclosing = self.element(&element.enclosing_element()?)?;
                // Erased parameter types identify an overload without
                // recursing into the executable's own type variables.
                let parameters = describe_list(
                    element
                        .parameters()
                        .iter()
                        .map(|param| self.ty(&param.as_type().erasure())),
                )?;
                self.invoke(
                    Factory::ExecutableElement,
                    [
                        enclosing,
                        Descriptor::ElementKind(kind),
                        self.name(&record.simple_name),
                        parameters,
                    ],
                )
            }
            ElementKind::Field | ElementKind::EnumConstant | ElementKind::Parameter => {
                let enclosing = self.element(&element.enclosing_element()?)?;
                self.invoke(
                    Factory::VariableElement,
                    [enclosing, self.name(&record.simple_name)],
                )
            }
            ElementKind::TypeParameter => {
                let generic = self.element(&element.generic_element()?)?;
                self.invoke(
                    Factory::TypeParameterElement,
                    [generic, self.name(&record.simple_name)],
                )
            }
            ElementKind::RecordComponent => {
                let record_element = self.element(&element.enclosing_element()?)?;
                self.invoke(
                    Factory::RecordComponentElement,
                    [record_element, self.name(&record.simple_name)],
                )
            }
            kind => {
                trace!("{kind} `{}` is not describable", record.simple_name);
                return None;
            }
        };
        Some(descriptor)
    }

    pub fn ty(&self, ty: &UniversalType) -> Option<Descriptor> {
        if !self.owns(&**ty.domain()) {
            return None;
        }
        let descriptor = match &**ty.record() {
            TypeRecord::Primitive(kind) => {
                self.invoke(Factory::PrimitiveType, [Descriptor::TypeKind(*kind)])
            }
            TypeRecord::NoType(kind @ (TypeKind::None | TypeKind::Void)) => {
                self.invoke(Factory::NoType, [Descriptor::TypeKind(*kind)])
            }
            TypeRecord::Null => self.invoke(Factory::NullType, []),
            TypeRecord::Array { .. } => {
                self.invoke(Factory::ArrayType, [self.ty(&ty.component_type())?])
            }
            TypeRecord::Declared { enclosing, .. } => {
                let enclosing = if *enclosing == TypeId::NONE {
                    Descriptor::Null
                } else {
                    self.ty(&ty.enclosing_type())?
                };
                let element = self.element(&ty.as_element()?)?;
                let arguments = describe_list(ty.type_arguments().iter().map(|arg| self.ty(arg)))?;
                self.invoke(Factory::DeclaredType, [enclosing, element, arguments])
            }
            TypeRecord::TypeVar { .. } => {
                self.invoke(Factory::TypeVariable, [self.element(&ty.as_element()?)?])
            }
            TypeRecord::Wildcard { .. } => self.invoke(
                Factory::WildcardType,
                [
                    self.optional_ty(ty.extends_bound().as_ref())?,
                    self.optional_ty(ty.super_bound().as_ref())?,
                ],
            ),
            record => {
                trace!("{} types are not describable", record.kind());
                return None;
            }
        };
        Some(descriptor)
    }

    /// An absent type is described as [`Descriptor::Null`].
    fn optional_ty(&self, ty: Option<&UniversalType>) -> Option<Descriptor> {
        match ty {
            Some(ty) => self.ty(ty),
            None => Some(Descriptor::Null),
        }
    }

    pub fn annotation(&self, annotation: &UniversalAnnotation) -> Option<Descriptor> {
        if !self.owns(&**annotation.domain()) {
            return None;
        }
        let annotation_type = self.ty(&annotation.annotation_type())?;
        let values = describe_map(
            annotation
                .values()
                .iter()
                .map(|(name, value)| (Descriptor::str(name.clone()), self.value(value))),
        )?;
        Some(self.invoke(Factory::Annotation, [annotation_type, values]))
    }

    pub fn value(&self, value: &UniversalValue) -> Option<Descriptor> {
        match value {
            UniversalValue::Bool(b) => Some(Descriptor::Bool(*b)),
            UniversalValue::Int(i) => Some(Descriptor::Int(*i)),
            UniversalValue::Str(s) => Some(Descriptor::Str(s.clone())),
            UniversalValue::Type(ty) => self.ty(ty),
            UniversalValue::EnumConstant(constant) => self.element(constant),
            UniversalValue::Array(values) => describe_list(values.iter().map(|v| self.value(v))),
        }
    }
}

/// Describes a list, choosing the fixed-arity factory for its length when
/// there is one.
pub fn describe_list<I>(items: I) -> Option<Descriptor>
where
    I: IntoIterator<Item = Option<Descriptor>>,
{
    let items: Vec<Descriptor> = items.into_iter().collect::<Option<_>>()?;
    let factory = match u8::try_from(items.len()) {
        Ok(arity) if items.len() <= MAX_FIXED_ARITY => Factory::ListOf { arity },
        _ => Factory::ListOfArray,
    };
    Some(Descriptor::invoke(factory, items))
}

/// Describes a map in key order, choosing the fixed-arity factory for its
/// size when there is one and falling back to a list of entries.
pub fn describe_map<I>(entries: I) -> Option<Descriptor>
where
    I: IntoIterator<Item = (Descriptor, Option<Descriptor>)>,
{
    let entries: Vec<(Descriptor, Descriptor)> = entries
        .into_iter()
        .map(|(key, value)| Some((key, value?)))
        .collect::<Option<_>>()?;
    match u8::try_from(entries.len()) {
        Ok(arity) if entries.len() <= MAX_FIXED_ARITY => Some(Descriptor::invoke(
            Factory::MapOf { arity },
            entries.into_iter().flat_map(|(key, value)| [key, value]),
        )),
        _ => Some(Descriptor::invoke(
            Factory::MapOfEntries,
            entries
                .into_iter()
                .map(|(key, value)| Descriptor::invoke(Factory::MapEntry, [key, value])),
        )),
    }
}

impl Describe for Descriptor {
    fn describe(&self) -> Option<Descriptor> {
        Some(self.clone())
    }
}

impl Describe for bool {
    fn describe(&self) -> Option<Descriptor> {
        Some(Descriptor::Bool(*self))
    }
}

impl Describe for i64 {
    fn describe(&self) -> Option<Descriptor> {
        Some(Descriptor::Int(*self))
    }
}

impl Describe for str {
    fn describe(&self) -> Option<Descriptor> {
        Some(Descriptor::str(self))
    }
}

impl Describe for EcoString {
    fn describe(&self) -> Option<Descriptor> {
        Some(Descriptor::Str(self.clone()))
    }
}

impl Describe for ElementKind {
    fn describe(&self) -> Option<Descriptor> {
        Some(Descriptor::ElementKind(*self))
    }
}

impl Describe for TypeKind {
    fn describe(&self) -> Option<Descriptor> {
        Some(Descriptor::TypeKind(*self))
    }
}

/// Absence is described as [`Descriptor::Null`].
impl<T: Describe> Describe for Option<T> {
    fn describe(&self) -> Option<Descriptor> {
        match self {
            Some(value) => value.describe(),
            None => Some(Descriptor::Null),
        }
    }
}

impl<T: Describe> Describe for [T] {
    fn describe(&self) -> Option<Descriptor> {
        describe_list(self.iter().map(Describe::describe))
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn describe(&self) -> Option<Descriptor> {
        self.as_slice().describe()
    }
}

impl<T: Describe> Describe for BTreeMap<EcoString, T> {
    fn describe(&self) -> Option<Descriptor> {
        describe_map(
            self.iter()
                .map(|(key, value)| (Descriptor::Str(key.clone()), value.describe())),
        )
    }
}

impl Describe for UniversalElement {
    fn describe(&self) -> Option<Descriptor> {
        Describer::new(&**self.domain())?.element(self)
    }
}

impl Describe for UniversalType {
    fn describe(&self) -> Option<Descriptor> {
        Describer::new(&**self.domain())?.ty(self)
    }
}

impl Describe for UniversalAnnotation {
    fn describe(&self) -> Option<Descriptor> {
        Describer::new(&**self.domain())?.annotation(self)
    }
}

impl Describe for UniversalValue {
    fn describe(&self) -> Option<Descriptor> {
        match self {
            Self::Bool(b) => b.describe(),
            Self::Int(i) => i.describe(),
            Self::Str(s) => s.describe(),
            Self::Type(ty) => ty.describe(),
            Self::EnumConstant(constant) => constant.describe(),
            Self::Array(values) => values.describe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mirra_model::{
        decl::{CompilationUnit, MethodDecl, TypeDecl, TypeRef},
        model::Model,
    };
    use parking_lot::Mutex;

    use super::*;
    use crate::{
        domain::ModelDomain,
        test::{declared, element, opaque_domain, platform_domain},
    };

    #[test]
    fn lists_pick_the_fixed_arity_form() {
        let small: Vec<i64> = (0..3).collect();
        let large: Vec<i64> = (0..11).collect();

        assert_eq!(small.describe().unwrap().factory(), Some(Factory::ListOf { arity: 3 }));
        assert_eq!(Vec::<i64>::new().describe().unwrap().factory(), Some(Factory::ListOf { arity: 0 }));
        let large = large.describe().unwrap();
        assert_eq!(large.factory(), Some(Factory::ListOfArray));
        assert_eq!(large.args().len(), 11);
    }

    #[test]
    fn maps_are_described_in_key_order() {
        let map: BTreeMap<EcoString, i64> = [("b".into(), 2), ("a".into(), 1)].into_iter().collect();
        let descriptor = map.describe().unwrap();

        assert_eq!(descriptor.factory(), Some(Factory::MapOf { arity: 2 }));
        assert_eq!(descriptor.args()[0], Descriptor::str("a"));
        assert_eq!(descriptor.args()[3], Descriptor::Int(2));

        let large: BTreeMap<EcoString, i64> = (0..12).map(|i| (EcoString::from(format!("k{i:02}")), i)).collect();
        let descriptor = large.describe().unwrap();
        assert_eq!(descriptor.factory(), Some(Factory::MapOfEntries));
        assert_eq!(descriptor.args()[0].factory(), Some(Factory::MapEntry));
    }

    #[test]
    fn failures_propagate_through_aggregates() {
        let items = vec![Some(Descriptor::Null), None];
        assert_eq!(describe_list(items), None);
        assert_eq!(describe_map([(Descriptor::str("k"), None)]), None);
        assert_eq!(None::<i64>.describe(), Some(Descriptor::Null));
    }

    #[test]
    fn undescribable_domains_describe_nothing() {
        let domain = opaque_domain();
        let string = element(&domain, "lang.String");

        assert!(Describer::new(&*domain).is_none());
        assert_eq!(string.describe(), None);
        assert_eq!(string.as_type().describe(), None);
    }

    #[test]
    fn absent_enclosing_types_are_null() {
        let domain = platform_domain();
        let string = declared(&domain, "lang.String", &[]);

        let descriptor = string.describe().unwrap();
        assert_eq!(descriptor.factory(), Some(Factory::DeclaredType));
        assert_eq!(descriptor.args()[1], Descriptor::Null);
        assert_eq!(descriptor.args()[3].factory(), Some(Factory::ListOf { arity: 0 }));
    }

    #[test]
    fn executables_are_described_by_erased_signature() {
        let domain = platform_domain();
        let set = element(&domain, "util.List").enclosed("set").unwrap();

        let descriptor = set.describe().unwrap();
        let parameters = &descriptor.args()[4];
        assert_eq!(parameters.factory(), Some(Factory::ListOf { arity: 2 }));
        // `E` erases to the top type.
        let erased = &parameters.args()[1];
        assert_eq!(erased.factory(), Some(Factory::DeclaredType));
        assert_eq!(erased.args()[2], element(&domain, "lang.Object").describe().unwrap());
    }

    #[test]
    fn undescribable_parts_fail_the_whole_recipe() {
        let mut model = Model::with_platform().unwrap();
        model
            .declare_unit(
                &CompilationUnit::new("app").with(
                    TypeDecl::class("Broken")
                        .field("missing", TypeRef::named("Missing"))
                        .method(
                            MethodDecl::new("take", TypeRef::Void)
                                .param("value", TypeRef::named("Missing")),
                        )
                        .method(MethodDecl::new("run", TypeRef::Void)),
                ),
            )
            .unwrap();
        let domain = ModelDomain::runtime(Arc::new(Mutex::new(model))).into_dyn();

        let broken = element(&domain, "app.Broken");
        let run = broken.enclosed("run").unwrap();
        let take = broken.enclosed("take").unwrap();
        let error = broken.enclosed("missing").unwrap().as_type();
        let string = declared(&domain, "lang.String", &[]);
        let object = declared(&domain, "lang.Object", &[]);
        assert_eq!(error.kind(), TypeKind::Error);

        let (local, union, intersection) = {
            let mut model = domain.lock();
            let local = model
                .declare_local(run.delegate(), ElementKind::LocalVariable, "count", &TypeRef::INT)
                .unwrap();
            let union = model.union_type(vec![string.delegate(), object.delegate()]);
            let intersection = model.intersection_type(vec![object.delegate(), string.delegate()]);
            (local, union, intersection)
        };

        assert!(broken.describe().is_some());
        assert!(run.describe().is_some());

        assert_eq!(UniversalElement::of(local, &domain).describe(), None);
        assert_eq!(UniversalType::of(union, &domain).describe(), None);
        assert_eq!(UniversalType::of(intersection, &domain).describe(), None);
        assert_eq!(error.describe(), None);
        assert_eq!(run.as_type().kind(), TypeKind::Executable);
        assert_eq!(run.as_type().describe(), None);

        // Failure of a part propagates to everything built from it.
        assert_eq!(declared(&domain, "util.List", &[&error]).describe(), None);
        assert_eq!(take.describe(), None);
        assert_eq!(take.parameters()[0].describe(), None);
        assert_eq!(vec![string.clone(), error].describe(), None);
    }
}
