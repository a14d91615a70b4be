use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock},
};

use ecow::EcoString;
use log::trace;
use mirra_model::{
    element::{ElementId, ElementKind, ElementRecord, Modifier, NestingKind},
    types::TypeId,
};

use crate::{
    domain::Domain,
    universal::{UniversalAnnotation, UniversalType},
};

/// Anything an element wrapper can be made from.
pub enum ElementSource {
    Native(ElementId),
    Universal(UniversalElement),
}

impl From<ElementId> for ElementSource {
    fn from(id: ElementId) -> Self {
        Self::Native(id)
    }
}

impl From<UniversalElement> for ElementSource {
    fn from(element: UniversalElement) -> Self {
        Self::Universal(element)
    }
}

impl From<&UniversalElement> for ElementSource {
    fn from(element: &UniversalElement) -> Self {
        Self::Universal(element.clone())
    }
}

/// One concrete value for every element kind.
///
/// Equality is the domain's sameness: two wrappers are equal when they come
/// from the same domain and denote the same element, however they were
/// obtained.
#[derive(Clone)]
pub struct UniversalElement(Arc<Inner>);

struct Inner {
    domain: Arc<dyn Domain>,
    delegate: ElementId,
    binding: OnceLock<Arc<ElementRecord>>,
}

impl UniversalElement {
    /// Wraps a native element. Wrapping a wrapper returns it unchanged.
    pub fn of(source: impl Into<ElementSource>, domain: &Arc<dyn Domain>) -> Self {
        match source.into() {
            ElementSource::Universal(element) => element,
            ElementSource::Native(delegate) => Self(Arc::new(Inner {
                domain: domain.clone(),
                delegate,
                binding: OnceLock::new(),
            })),
        }
    }

    pub fn of_opt<S>(source: Option<S>, domain: &Arc<dyn Domain>) -> Option<Self>
    where
        S: Into<ElementSource>,
    {
        source.map(|source| Self::of(source, domain))
    }

    pub fn domain(&self) -> &Arc<dyn Domain> {
        &self.0.domain
    }

    pub fn delegate(&self) -> ElementId {
        self.0.delegate
    }

    /// Native identity, for use as an opaque map key.
    pub fn key(&self) -> (usize, ElementId) {
        (self.0.domain.identity(), self.0.delegate)
    }

    pub fn is_bound(&self) -> bool {
        self.0.binding.get().is_some()
    }

    /// The completed native record, bound under the domain lock on first use.
    pub fn record(&self) -> &Arc<ElementRecord> {
        self.0.binding.get_or_init(|| {
            let mut model = self.0.domain.lock();
            trace!("binding element {}", self.0.delegate);
            model.complete(self.0.delegate)
        })
    }

    fn element(&self, id: ElementId) -> UniversalElement {
        UniversalElement::of(id, &self.0.domain)
    }

    fn elements(&self, ids: &[ElementId]) -> Vec<UniversalElement> {
        ids.iter().map(|&id| self.element(id)).collect()
    }

    fn ty(&self, id: TypeId) -> UniversalType {
        UniversalType::of(id, &self.0.domain)
    }

    fn types(&self, ids: &[TypeId]) -> Vec<UniversalType> {
        ids.iter().map(|&id| self.ty(id)).collect()
    }

    pub fn kind(&self) -> ElementKind {
        self.record().kind
    }

    pub fn simple_name(&self) -> &EcoString {
        &self.record().simple_name
    }

    /// The qualified name of modules, packages and types; empty otherwise.
    pub fn qualified_name(&self) -> &str {
        let record = self.record();
        match record.kind {
            ElementKind::Module | ElementKind::Package => &record.qualified_name,
            kind if kind.is_type() => &record.qualified_name,
            _ => "",
        }
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.record().modifiers
    }

    pub fn is_static(&self) -> bool {
        self.record().is_static()
    }

    /// Nesting of a type element; `None` for other kinds.
    pub fn nesting_kind(&self) -> Option<NestingKind> {
        let record = self.record();
        record.kind.is_type().then_some(record.nesting)
    }

    /// Whether completion left parts of the declaration unresolved.
    pub fn is_erroneous(&self) -> bool {
        self.record().erroneous
    }

    pub fn enclosing_element(&self) -> Option<UniversalElement> {
        self.record().enclosing.map(|id| self.element(id))
    }

    pub fn enclosed_elements(&self) -> Vec<UniversalElement> {
        self.elements(&self.record().enclosed)
    }

    /// The first enclosed element with the given simple name.
    pub fn enclosed(&self, simple_name: &str) -> Option<UniversalElement> {
        self.enclosed_elements()
            .into_iter()
            .find(|element| element.simple_name() == simple_name)
    }

    /// The prototypical type of the element.
    pub fn as_type(&self) -> UniversalType {
        self.ty(self.record().as_type)
    }

    pub fn type_parameters(&self) -> Vec<UniversalElement> {
        let record = self.record();
        match record.kind {
            kind if kind.is_parameterizable() => self.elements(&record.type_parameters),
            _ => Vec::new(),
        }
    }

    /// Superclass of a class; the `None` type for interfaces, the top
    /// class and other kinds.
    pub fn superclass(&self) -> UniversalType {
        let record = self.record();
        match record.kind {
            kind if kind.is_class() => self.ty(record.superclass),
            _ => self.ty(TypeId::NONE),
        }
    }

    pub fn interfaces(&self) -> Vec<UniversalType> {
        let record = self.record();
        match record.kind {
            kind if kind.is_type() => self.types(&record.interfaces),
            _ => Vec::new(),
        }
    }

    pub fn bounds(&self) -> Vec<UniversalType> {
        let record = self.record();
        match record.kind {
            ElementKind::TypeParameter => self.types(&record.bounds),
            _ => Vec::new(),
        }
    }

    pub fn generic_element(&self) -> Option<UniversalElement> {
        self.record().generic_element.map(|id| self.element(id))
    }

    pub fn parameters(&self) -> Vec<UniversalElement> {
        let record = self.record();
        match record.kind {
            kind if kind.is_executable() => self.elements(&record.parameters),
            _ => Vec::new(),
        }
    }

    /// Return type of an executable; the `None` type for other kinds.
    pub fn return_type(&self) -> UniversalType {
        let record = self.record();
        match record.kind {
            kind if kind.is_executable() => self.ty(record.return_type),
            _ => self.ty(TypeId::NONE),
        }
    }

    pub fn thrown_types(&self) -> Vec<UniversalType> {
        let record = self.record();
        match record.kind {
            kind if kind.is_executable() => self.types(&record.thrown_types),
            _ => Vec::new(),
        }
    }

    pub fn is_varargs(&self) -> bool {
        self.record().varargs
    }

    pub fn record_components(&self) -> Vec<UniversalElement> {
        let record = self.record();
        match record.kind {
            ElementKind::Record => self.elements(&record.record_components),
            _ => Vec::new(),
        }
    }

    pub fn annotations(&self) -> Vec<UniversalAnnotation> {
        self.record()
            .annotations
            .iter()
            .map(|mirror| UniversalAnnotation::new(mirror.clone(), &self.0.domain))
            .collect()
    }

    /// Whether the element declares type parameters.
    pub fn is_generic(&self) -> bool {
        let record = self.record();
        record.kind.is_parameterizable() && !record.type_parameters.is_empty()
    }
}

impl PartialEq for UniversalElement {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.delegate == other.0.delegate && self.0.domain.same(&*other.0.domain))
    }
}

impl Eq for UniversalElement {}

impl Hash for UniversalElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.delegate.hash(state);
    }
}

/// Takes the domain lock.
impl fmt::Display for UniversalElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = self.0.domain.lock();
        write!(f, "{}", model.display(self.0.delegate))
    }
}

impl fmt::Debug for UniversalElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tuple = f.debug_tuple("UniversalElement");
        tuple.field(&self.0.delegate);
        if let Some(record) = self.0.binding.get() {
            tuple.field(&record.kind).field(&record.simple_name);
        }
        tuple.finish()
    }
}
