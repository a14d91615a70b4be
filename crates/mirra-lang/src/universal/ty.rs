use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock},
};

use log::trace;
use mirra_model::{
    platform,
    types::{TypeId, TypeKind, TypeRecord},
};

use crate::{
    domain::Domain,
    error::{LangError, LangResult},
    universal::{UniversalElement, memo::Memo},
};

/// Anything a type wrapper can be made from.
pub enum TypeSource {
    Native(TypeId),
    Universal(UniversalType),
}

impl From<TypeId> for TypeSource {
    fn from(id: TypeId) -> Self {
        Self::Native(id)
    }
}

impl From<UniversalType> for TypeSource {
    fn from(ty: UniversalType) -> Self {
        Self::Universal(ty)
    }
}

impl From<&UniversalType> for TypeSource {
    fn from(ty: &UniversalType) -> Self {
        Self::Universal(ty.clone())
    }
}

/// One concrete value for every type kind.
///
/// Equality is the domain's type sameness, so a usage of a type and the
/// type's prototypical usage compare equal when the model says they are the
/// same type. Hashing only looks at the kind and the declaring element,
/// which sameness always preserves.
#[derive(Clone)]
pub struct UniversalType(Arc<Inner>);

struct Inner {
    domain: Arc<dyn Domain>,
    delegate: TypeId,
    binding: OnceLock<Arc<TypeRecord>>,
    erasure: Memo<Erasure>,
}

/// Memoized erasure. `Itself` avoids a wrapper holding a reference to itself.
enum Erasure {
    Itself,
    Other(UniversalType),
}

impl UniversalType {
    /// Wraps a native type. Wrapping a wrapper returns it unchanged.
    pub fn of(source: impl Into<TypeSource>, domain: &Arc<dyn Domain>) -> Self {
        match source.into() {
            TypeSource::Universal(ty) => ty,
            TypeSource::Native(delegate) => Self(Arc::new(Inner {
                domain: domain.clone(),
                delegate,
                binding: OnceLock::new(),
                erasure: Memo::new(),
            })),
        }
    }

    pub fn of_opt<S>(source: Option<S>, domain: &Arc<dyn Domain>) -> Option<Self>
    where
        S: Into<TypeSource>,
    {
        source.map(|source| Self::of(source, domain))
    }

    /// The `None` no-type of a domain.
    pub fn none(domain: &Arc<dyn Domain>) -> Self {
        Self::of(TypeId::NONE, domain)
    }

    pub fn domain(&self) -> &Arc<dyn Domain> {
        &self.0.domain
    }

    pub fn delegate(&self) -> TypeId {
        self.0.delegate
    }

    /// Native identity, for use as an opaque map key.
    pub fn key(&self) -> (usize, TypeId) {
        (self.0.domain.identity(), self.0.delegate)
    }

    pub fn is_bound(&self) -> bool {
        self.0.binding.get().is_some()
    }

    /// The native record, bound under the domain lock on first use. Binding
    /// also completes the element a declared type refers to.
    pub fn record(&self) -> &Arc<TypeRecord> {
        self.0.binding.get_or_init(|| {
            let mut model = self.0.domain.lock();
            trace!("binding type {}", self.0.delegate);
            let record = model.ty(self.0.delegate);
            if let TypeRecord::Declared { element, .. } = &*record {
                model.complete(*element);
            }
            record
        })
    }

    fn ty(&self, id: TypeId) -> UniversalType {
        UniversalType::of(id, &self.0.domain)
    }

    fn types(&self, ids: &[TypeId]) -> Vec<UniversalType> {
        ids.iter().map(|&id| self.ty(id)).collect()
    }

    fn none_type(&self) -> UniversalType {
        self.ty(TypeId::NONE)
    }

    fn compatible(&self, other: &UniversalType) -> bool {
        self.0.domain.same(&*other.0.domain)
    }

    pub fn kind(&self) -> TypeKind {
        self.record().kind()
    }

    /// Component of an array; the `None` type otherwise.
    pub fn component_type(&self) -> UniversalType {
        match &**self.record() {
            TypeRecord::Array { component } => self.ty(*component),
            _ => self.none_type(),
        }
    }

    pub fn type_arguments(&self) -> Vec<UniversalType> {
        match &**self.record() {
            TypeRecord::Declared { arguments, .. } => self.types(arguments),
            _ => Vec::new(),
        }
    }

    /// Enclosing type of a declared type; the `None` type when there is none.
    pub fn enclosing_type(&self) -> UniversalType {
        match &**self.record() {
            TypeRecord::Declared { enclosing, .. } => self.ty(*enclosing),
            _ => self.none_type(),
        }
    }

    /// The element of a declared, error or variable type.
    pub fn as_element(&self) -> Option<UniversalElement> {
        self.record()
            .element()
            .map(|id| UniversalElement::of(id, &self.0.domain))
    }

    pub fn upper_bound(&self) -> UniversalType {
        match &**self.record() {
            TypeRecord::TypeVar { upper, .. } => self.ty(*upper),
            _ => self.none_type(),
        }
    }

    pub fn lower_bound(&self) -> UniversalType {
        match &**self.record() {
            TypeRecord::TypeVar { lower, .. } => self.ty(*lower),
            _ => self.none_type(),
        }
    }

    pub fn extends_bound(&self) -> Option<UniversalType> {
        match &**self.record() {
            TypeRecord::Wildcard { extends, .. } => extends.map(|id| self.ty(id)),
            _ => None,
        }
    }

    pub fn super_bound(&self) -> Option<UniversalType> {
        match &**self.record() {
            TypeRecord::Wildcard { super_bound, .. } => super_bound.map(|id| self.ty(id)),
            _ => None,
        }
    }

    pub fn parameter_types(&self) -> Vec<UniversalType> {
        match &**self.record() {
            TypeRecord::Executable { parameters, .. } => self.types(parameters),
            _ => Vec::new(),
        }
    }

    pub fn return_type(&self) -> UniversalType {
        match &**self.record() {
            TypeRecord::Executable { return_type, .. } => self.ty(*return_type),
            _ => self.none_type(),
        }
    }

    pub fn receiver_type(&self) -> UniversalType {
        match &**self.record() {
            TypeRecord::Executable { receiver, .. } => self.ty(*receiver),
            _ => self.none_type(),
        }
    }

    pub fn thrown_types(&self) -> Vec<UniversalType> {
        match &**self.record() {
            TypeRecord::Executable { thrown, .. } => self.types(thrown),
            _ => Vec::new(),
        }
    }

    pub fn type_variables(&self) -> Vec<UniversalType> {
        match &**self.record() {
            TypeRecord::Executable { type_variables, .. } => self.types(type_variables),
            _ => Vec::new(),
        }
    }

    pub fn alternatives(&self) -> Vec<UniversalType> {
        match &**self.record() {
            TypeRecord::Union(alternatives) => self.types(alternatives),
            _ => Vec::new(),
        }
    }

    pub fn bounds(&self) -> Vec<UniversalType> {
        match &**self.record() {
            TypeRecord::Intersection(bounds) => self.types(bounds),
            _ => Vec::new(),
        }
    }

    /// The primitive kind of a primitive type.
    pub fn as_primitive_kind(&self) -> LangResult<TypeKind> {
        let kind = self.kind();
        if kind.is_primitive() {
            Ok(kind)
        } else {
            Err(LangError::invalid(format!("{self} is not a primitive type")))
        }
    }

    /// Whether this is a usage of the top reference type.
    pub fn is_object(&self) -> bool {
        match &**self.record() {
            TypeRecord::Declared { element, .. } => {
                self.0.domain.type_element(platform::OBJECT) == Some(*element)
            }
            _ => false,
        }
    }

    /// Whether this is a declared type with type arguments.
    pub fn is_parameterized(&self) -> bool {
        !self.record().arguments().is_empty()
    }

    /// Whether this is the raw usage of a generic type, or an array whose
    /// element type is one.
    pub fn is_raw(&self) -> bool {
        match self.kind() {
            TypeKind::Declared => !self.is_parameterized() && self.is_generic(),
            TypeKind::Array => self.element_type().is_raw(),
            _ => false,
        }
    }

    /// Whether this is a usage of a generic type element.
    pub fn is_generic(&self) -> bool {
        self.kind() == TypeKind::Declared
            && self.as_element().is_some_and(|element| element.is_generic())
    }

    /// The innermost component of a (possibly nested) array; the type itself
    /// for non-arrays.
    pub fn element_type(&self) -> UniversalType {
        let mut current = self.clone();
        while current.kind() == TypeKind::Array {
            current = current.component_type();
        }
        current
    }

    /// The erasure, computed once per wrapper.
    pub fn erasure(&self) -> UniversalType {
        let erasure = self.0.erasure.get_or_compute(|| {
            let erased = self.0.domain.erasure(self.0.delegate);
            if erased == self.0.delegate {
                Erasure::Itself
            } else {
                Erasure::Other(self.ty(erased))
            }
        });
        match &*erasure {
            Erasure::Itself => self.clone(),
            Erasure::Other(ty) => ty.clone(),
        }
    }

    pub fn direct_supertypes(&self) -> Vec<UniversalType> {
        let supertypes = self.0.domain.lock().direct_supertypes(self.0.delegate);
        self.types(&supertypes)
    }

    /// Subtyping; wrappers from different domains are never related.
    pub fn is_subtype_of(&self, other: &UniversalType) -> bool {
        self.compatible(other) && self.0.domain.lock().is_subtype(self.0.delegate, other.0.delegate)
    }

    pub fn is_assignable_to(&self, other: &UniversalType) -> bool {
        self.compatible(other) && self.0.domain.is_assignable(self.0.delegate, other.0.delegate)
    }

    /// The type of `member` when viewed as a member of this type.
    pub fn as_member_of(&self, member: &UniversalElement) -> LangResult<UniversalType> {
        if !self.0.domain.same(&**member.domain()) {
            return Err(LangError::invalid(format!(
                "{member:?} belongs to another domain than {self:?}"
            )));
        }
        let ty = self
            .0
            .domain
            .as_member_of(self.0.delegate, member.delegate())?;
        Ok(self.ty(ty))
    }
}

impl PartialEq for UniversalType {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        self.compatible(other)
            && (self.0.delegate == other.0.delegate
                || self.0.domain.same_type(self.0.delegate, other.0.delegate))
    }
}

impl Eq for UniversalType {}

impl Hash for UniversalType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let record = self.record();
        record.kind().hash(state);
        match &**record {
            TypeRecord::Declared { element, .. } | TypeRecord::TypeVar { element, .. } => {
                element.hash(state)
            }
            TypeRecord::Array { component } => self.ty(*component).hash(state),
            _ => {}
        }
    }
}

/// Takes the domain lock.
impl fmt::Display for UniversalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = self.0.domain.lock();
        write!(f, "{}", model.display(self.0.delegate))
    }
}

impl fmt::Debug for UniversalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tuple = f.debug_tuple("UniversalType");
        tuple.field(&self.0.delegate);
        if let Some(record) = self.0.binding.get() {
            tuple.field(&record.kind());
        }
        tuple.finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::test::{declared, element, platform_domain};

    #[test]
    fn usages_equal_the_prototypical_type() {
        let domain = platform_domain();
        let string = element(&domain, "lang.String");
        let usage = declared(&domain, "lang.String", &[]);

        assert_ne!(usage.delegate(), string.as_type().delegate());
        assert_eq!(usage, string.as_type());

        let set: HashSet<_> = [usage.clone(), string.as_type()].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn wrapping_is_idempotent() {
        let domain = platform_domain();
        let string = declared(&domain, "lang.String", &[]);
        let again = UniversalType::of(&string, &domain);
        assert!(Arc::ptr_eq(&string.0, &again.0));
        assert_eq!(UniversalType::of_opt(None::<TypeId>, &domain), None);
    }

    #[test]
    fn derived_predicates() {
        let domain = platform_domain();
        let string = declared(&domain, "lang.String", &[]);
        let list_of_string = declared(&domain, "util.List", &[&string]);
        let raw_list = declared(&domain, "util.List", &[]);
        let raw_array = UniversalType::of(domain.array_type(raw_list.delegate()).unwrap(), &domain);
        let nested = UniversalType::of(domain.array_type(raw_array.delegate()).unwrap(), &domain);

        assert!(declared(&domain, "lang.Object", &[]).is_object());
        assert!(!string.is_object());
        assert!(list_of_string.is_parameterized());
        assert!(!list_of_string.is_raw());
        assert!(raw_list.is_raw());
        assert!(nested.is_raw());
        assert_eq!(nested.element_type(), raw_list);
        assert!(list_of_string.is_generic());
        assert!(!string.is_generic());
    }

    #[test]
    fn erasure_is_memoized_and_idempotent() {
        let domain = platform_domain();
        let string = declared(&domain, "lang.String", &[]);
        let list = declared(&domain, "util.List", &[&string]);

        let erased = list.erasure();
        assert!(erased.is_raw());
        assert!(Arc::ptr_eq(&erased.0, &list.erasure().0));
        assert_eq!(erased.erasure(), erased);
        assert!(Arc::ptr_eq(&string.erasure().0, &string.0));
    }

    #[test]
    fn accessors_are_total_over_kinds() {
        let domain = platform_domain();
        let string = declared(&domain, "lang.String", &[]);
        let int = UniversalType::of(domain.primitive_type(TypeKind::Int).unwrap(), &domain);

        assert_eq!(string.component_type().kind(), TypeKind::None);
        assert!(int.type_arguments().is_empty());
        assert_eq!(int.enclosing_type().kind(), TypeKind::None);
        assert!(int.as_element().is_none());
        assert_eq!(string.upper_bound().kind(), TypeKind::None);
        assert!(string.extends_bound().is_none());
        assert!(string.parameter_types().is_empty());

        assert_eq!(int.as_primitive_kind().unwrap(), TypeKind::Int);
        assert!(matches!(string.as_primitive_kind(), Err(LangError::InvalidArgument(_))));
    }

    #[test]
    fn relations_delegate_to_the_model() {
        let domain = platform_domain();
        let string = declared(&domain, "lang.String", &[]);
        let object = declared(&domain, "lang.Object", &[]);
        let array_list = declared(&domain, "util.ArrayList", &[&string]);
        let list = declared(&domain, "util.List", &[&string]);

        assert!(string.is_subtype_of(&object));
        assert!(array_list.is_assignable_to(&list));
        assert!(!list.is_assignable_to(&array_list));
        assert!(array_list.direct_supertypes().contains(&list));

        let get = element(&domain, "util.List").enclosed("get").unwrap();
        let member = array_list.as_member_of(&get).unwrap();
        assert_eq!(member.return_type(), string);

        let other = platform_domain();
        assert!(!string.is_subtype_of(&declared(&other, "lang.Object", &[])));
    }

    #[test]
    fn display_and_debug() {
        let domain = platform_domain();
        let string = declared(&domain, "lang.String", &[]);
        let list = declared(&domain, "util.List", &[&string]);

        assert_eq!(list.to_string(), "util.List<lang.String>");
        assert!(format!("{list:?}").starts_with("UniversalType("));
    }
}
