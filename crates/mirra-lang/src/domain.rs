//! The lock-scoped capability every construct is resolved against.

use std::{fmt, sync::Arc};

use ecow::EcoString;
use mirra_model::{
    Name, SharedModel,
    element::{ElementId, ElementKind},
    error::ModelResult,
    model::Model,
    types::{TypeId, TypeKind},
};
use parking_lot::MutexGuard;

use crate::describe::{Descriptor, Factory};

/// Provenance of constructs and the only way to reach the native model.
///
/// Every operation on the model runs while the guard returned by
/// [`Domain::lock`] is held. The lock is not reentrant: code holding it must
/// not call back into wrappers, which take it themselves.
pub trait Domain: Send + Sync + fmt::Debug {
    fn lock(&self) -> MutexGuard<'_, Model>;

    /// The recipe that re-derives this domain, or `None` if constructs of this
    /// domain cannot be described.
    fn describe(&self) -> Option<Descriptor>;

    /// Native identity of the domain.
    fn identity(&self) -> usize {
        std::ptr::from_ref(self).cast::<()>() as usize
    }

    fn same(&self, other: &dyn Domain) -> bool {
        self.identity() == other.identity()
    }

    /// Interns `value` in the model's name table.
    fn name(&self, value: &str) -> Name {
        self.lock().name(value)
    }

    /// The text behind an interned name, `None` for a name of another model.
    fn name_text(&self, name: Name) -> Option<EcoString> {
        self.lock().name_str(name).cloned()
    }

    fn qualified_name(&self, element: ElementId) -> Option<EcoString> {
        self.lock().qualified_name(element).cloned()
    }

    fn module_element(&self, name: &str) -> Option<ElementId> {
        self.lock().module_element(name)
    }

    fn package_element(&self, name: &str) -> Option<ElementId> {
        self.lock().package_element(name)
    }

    fn type_element(&self, name: &str) -> Option<ElementId> {
        self.lock().type_element(name)
    }

    fn type_parameter_element(&self, generic: ElementId, name: &str) -> Option<ElementId> {
        self.lock().type_parameter_element(generic, name)
    }

    fn executable_element(
        &self,
        enclosing: ElementId,
        kind: ElementKind,
        name: &str,
        parameter_types: &[TypeId],
    ) -> Option<ElementId> {
        self.lock()
            .executable_element(enclosing, kind, name, parameter_types)
    }

    fn variable_element(&self, enclosing: ElementId, name: &str) -> Option<ElementId> {
        self.lock().variable_element(enclosing, name)
    }

    fn record_component_element(&self, record: ElementId, name: &str) -> Option<ElementId> {
        self.lock().record_component_element(record, name)
    }

    fn declared_type(
        &self,
        enclosing: Option<TypeId>,
        element: ElementId,
        arguments: &[TypeId],
    ) -> ModelResult<TypeId> {
        self.lock().declared_type(enclosing, element, arguments)
    }

    fn array_type(&self, component: TypeId) -> ModelResult<TypeId> {
        self.lock().array_type(component)
    }

    fn primitive_type(&self, kind: TypeKind) -> ModelResult<TypeId> {
        self.lock().primitive_type(kind)
    }

    fn no_type(&self, kind: TypeKind) -> ModelResult<TypeId> {
        self.lock().no_type(kind)
    }

    fn null_type(&self) -> TypeId {
        self.lock().null_type()
    }

    fn type_variable(&self, element: ElementId) -> ModelResult<TypeId> {
        self.lock().type_variable(element)
    }

    fn wildcard_type(&self, extends: Option<TypeId>, super_bound: Option<TypeId>) -> ModelResult<TypeId> {
        self.lock().wildcard_type(extends, super_bound)
    }

    fn same_type(&self, a: TypeId, b: TypeId) -> bool {
        self.lock().same_type(a, b)
    }

    fn is_assignable(&self, a: TypeId, b: TypeId) -> bool {
        self.lock().is_assignable(a, b)
    }

    fn erasure(&self, ty: TypeId) -> TypeId {
        self.lock().erasure(ty)
    }

    fn as_member_of(&self, containing: TypeId, element: ElementId) -> ModelResult<TypeId> {
        self.lock().as_member_of(containing, element)
    }
}

/// A domain over a shared native model.
pub struct ModelDomain {
    model: SharedModel,
    descriptor: Option<Descriptor>,
}

impl ModelDomain {
    /// A domain whose constructs are not describable.
    pub fn new(model: SharedModel) -> Self {
        Self {
            model,
            descriptor: None,
        }
    }

    /// A domain that re-derives itself from `descriptor`.
    pub fn describable(model: SharedModel, descriptor: Descriptor) -> Self {
        Self {
            model,
            descriptor: Some(descriptor),
        }
    }

    /// The domain of the process-wide runtime model.
    pub fn runtime(model: SharedModel) -> Self {
        Self::describable(model, Descriptor::invoke(Factory::RuntimeDomain, []))
    }

    pub fn model(&self) -> &SharedModel {
        &self.model
    }

    pub fn into_dyn(self) -> Arc<dyn Domain> {
        Arc::new(self)
    }
}

impl fmt::Debug for ModelDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDomain")
            .field("model", &Arc::as_ptr(&self.model))
            .field("describable", &self.descriptor.is_some())
            .finish()
    }
}

impl Domain for ModelDomain {
    fn lock(&self) -> MutexGuard<'_, Model> {
        self.model.lock()
    }

    fn describe(&self) -> Option<Descriptor> {
        self.descriptor.clone()
    }

    /// Domains over the same model are the same domain.
    fn identity(&self) -> usize {
        Arc::as_ptr(&self.model).cast::<()>() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::shared_platform;

    #[test]
    fn domains_over_one_model_are_the_same() {
        let model = shared_platform();
        let a = ModelDomain::new(model.clone());
        let b = ModelDomain::runtime(model);
        let c = ModelDomain::new(shared_platform());

        assert!(a.same(&b));
        assert!(!a.same(&c));
        assert!(a.describe().is_none());
        assert_eq!(b.describe(), Some(Descriptor::invoke(Factory::RuntimeDomain, [])));
    }

    #[test]
    fn provided_operations_run_under_the_lock() {
        let domain = ModelDomain::new(shared_platform());
        let string = domain.type_element("lang.String").unwrap();
        let ty = domain.declared_type(None, string, &[]).unwrap();

        assert!(domain.same_type(ty, ty));
        assert_eq!(domain.erasure(ty), ty);
        assert!(domain.primitive_type(TypeKind::Declared).is_err());
        assert_eq!(domain.qualified_name(string).as_deref(), Some("lang.String"));
    }

    #[test]
    fn names_are_interned_once() {
        let domain = ModelDomain::new(shared_platform());
        let first = domain.name("util.Map.Entry");
        let again = domain.name("util.Map.Entry");
        let other = domain.name("util.Map");

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(domain.name_text(first).as_deref(), Some("util.Map.Entry"));

        let foreign = ModelDomain::new(Arc::new(parking_lot::Mutex::new(Model::new())));
        assert_eq!(foreign.name_text(other), None);
    }
}
