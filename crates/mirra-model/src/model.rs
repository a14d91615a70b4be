use std::{fmt, sync::Arc};

use ecow::{EcoString, eco_format};
use indexmap::IndexMap;
use log::{trace, warn};
use mirra_utils::{errors::Errors, interner::StrInterner};

use crate::{
    Name,
    decl::{CompilationUnit, TypeDecl, TypeRef},
    element::{ElementId, ElementKind, ElementRecord, NestingKind},
    error::{ModelError, ModelResult},
    platform,
    types::{TypeId, TypeKind, TypeRecord},
};

/// The native semantic model: an arena of elements and types.
///
/// Elements are entered as declarations and completed on first touch. The
/// model is not synchronized; callers share it behind [`crate::SharedModel`]
/// and must hold that lock for every call, including reads, because reads
/// may complete elements.
pub struct Model {
    pub(crate) names: StrInterner,
    pub(crate) elements: Vec<ElementSlot>,
    pub(crate) types: Vec<Arc<TypeRecord>>,
    pub(crate) modules: IndexMap<EcoString, ElementId>,
    pub(crate) packages: IndexMap<EcoString, ElementId>,
    pub(crate) type_elements: IndexMap<EcoString, ElementId>,
    pub(crate) object_type: Option<TypeId>,
    pub(crate) completions: usize,
}

pub(crate) struct ElementSlot {
    pub(crate) kind: ElementKind,
    pub(crate) simple_name: EcoString,
    pub(crate) qualified_name: EcoString,
    pub(crate) enclosing: Option<ElementId>,
    /// Entered children: packages of a module, types of a package, nested
    /// types of a type, locals of an executable.
    pub(crate) children: Vec<ElementId>,
    /// Number of declared type parameters, known before completion.
    pub(crate) arity: usize,
    pub(crate) state: SlotState,
}

pub(crate) enum SlotState {
    Pending(Pending),
    Completing,
    Complete(Arc<ElementRecord>),
}

pub(crate) enum Pending {
    Module,
    Package,
    Type(Box<TypeDecl>),
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("elements", &self.elements.len())
            .field("types", &self.types.len())
            .field("completions", &self.completions)
            .finish()
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    pub fn new() -> Self {
        Self {
            names: StrInterner::new(),
            elements: Vec::new(),
            types: TypeId::preallocated().map(Arc::new).collect(),
            modules: IndexMap::new(),
            packages: IndexMap::new(),
            type_elements: IndexMap::new(),
            object_type: None,
            completions: 0,
        }
    }

    /// A model with the built-in platform entered.
    pub fn with_platform() -> ModelResult<Self> {
        let mut model = Self::new();
        platform::install(&mut model)?;
        Ok(model)
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// How many elements have been completed so far.
    pub fn completions(&self) -> usize {
        self.completions
    }
}

// Names
impl Model {
    pub fn name(&mut self, value: &str) -> Name {
        self.names.intern(value)
    }

    pub fn name_str(&self, name: Name) -> Option<&EcoString> {
        self.names.get(name)
    }
}

// Entering
impl Model {
    pub fn declare_module(&mut self, name: &str) -> ElementId {
        if let Some(&id) = self.modules.get(name) {
            return id;
        }
        let id = self.reserve(ElementKind::Module, name, name, None, 0);
        self.set_state(id, SlotState::Pending(Pending::Module));
        self.modules.insert(name.into(), id);
        id
    }

    pub fn declare_package(&mut self, module: Option<ElementId>, name: &str) -> ElementId {
        if let Some(&id) = self.packages.get(name) {
            return id;
        }
        let simple = name.rsplit('.').next().unwrap_or(name);
        let id = self.reserve(ElementKind::Package, simple, name, module, 0);
        self.set_state(id, SlotState::Pending(Pending::Package));
        self.packages.insert(name.into(), id);
        if let Some(module) = module {
            self.add_child(module, id);
        }
        id
    }

    /// Enters a type declaration (and its nested declarations) into a package.
    pub fn declare_type(&mut self, package: ElementId, decl: TypeDecl) -> ModelResult<ElementId> {
        let slot = self
            .slot(package)
            .ok_or(ModelError::UnknownElement(package))?;
        if slot.kind != ElementKind::Package {
            return Err(ModelError::illegal(format!(
                "`{}` is not a package",
                slot.qualified_name
            )));
        }
        let prefix = slot.qualified_name.clone();
        self.declare_type_in(package, &prefix, decl)
    }

    fn declare_type_in(
        &mut self,
        enclosing: ElementId,
        prefix: &str,
        mut decl: TypeDecl,
    ) -> ModelResult<ElementId> {
        if !decl.kind.is_type() {
            return Err(ModelError::illegal(format!(
                "`{}` is declared as {}, which is not a type kind",
                decl.name, decl.kind
            )));
        }
        let qualified = if prefix.is_empty() {
            decl.name.clone()
        } else {
            eco_format!("{prefix}.{}", decl.name)
        };
        if self.type_elements.contains_key(&qualified) {
            return Err(ModelError::Duplicate(qualified));
        }

        let nested = std::mem::take(&mut decl.nested);
        let id = self.reserve(
            decl.kind,
            decl.name.clone(),
            qualified.clone(),
            Some(enclosing),
            decl.type_parameters.len(),
        );
        self.set_state(id, SlotState::Pending(Pending::Type(Box::new(decl))));
        self.type_elements.insert(qualified.clone(), id);
        self.add_child(enclosing, id);
        trace!("entered `{qualified}` as {id}");

        for inner in nested {
            self.declare_type_in(id, &qualified, inner)?;
        }
        Ok(id)
    }

    /// Enters every declaration of `unit`, collecting all failures.
    pub fn declare_unit(&mut self, unit: &CompilationUnit) -> Result<Vec<ElementId>, Errors<ModelError>> {
        let module = unit.module.as_deref().map(|m| self.declare_module(m));
        let package = self.declare_package(module, &unit.package);

        let mut errors = Errors::new();
        let mut entered = Vec::with_capacity(unit.types.len());
        for decl in &unit.types {
            match self.declare_type(package, decl.clone()) {
                Ok(id) => entered.push(id),
                Err(err) => errors.push(err),
            }
        }
        errors.into_result(entered)
    }

    /// Enters a variable local to an executable, as attribution of a body would.
    pub fn declare_local(
        &mut self,
        owner: ElementId,
        kind: ElementKind,
        name: &str,
        ty: &TypeRef,
    ) -> ModelResult<ElementId> {
        if !kind.is_local() {
            return Err(ModelError::illegal(format!("{kind} is not a local variable kind")));
        }
        let owner_record = self.complete(owner);
        if !owner_record.kind.is_executable() {
            return Err(ModelError::illegal(format!(
                "`{}` is not an executable",
                owner_record.qualified_name
            )));
        }

        let mut cx = self.resolution_for(owner);
        let ty = self.resolve(ty, &mut cx);
        let mut record = ElementRecord::new(ElementId::from_usize(0), kind, name)
            .with_enclosing(Some(owner))
            .with_type(ty);
        record.nesting = NestingKind::Local;
        record.erroneous = cx.has_errors();
        let id = self.alloc_complete(record);
        self.add_child(owner, id);
        Ok(id)
    }

    pub(crate) fn reserve(
        &mut self,
        kind: ElementKind,
        simple_name: impl Into<EcoString>,
        qualified_name: impl Into<EcoString>,
        enclosing: Option<ElementId>,
        arity: usize,
    ) -> ElementId {
        let id = ElementId::from_usize(self.elements.len());
        self.elements.push(ElementSlot {
            kind,
            simple_name: simple_name.into(),
            qualified_name: qualified_name.into(),
            enclosing,
            children: Vec::new(),
            arity,
            state: SlotState::Completing,
        });
        id
    }

    /// Allocates an element that is complete from the start.
    pub(crate) fn alloc_complete(&mut self, mut record: ElementRecord) -> ElementId {
        let id = self.reserve(
            record.kind,
            record.simple_name.clone(),
            record.qualified_name.clone(),
            record.enclosing,
            record.type_parameters.len(),
        );
        record.id = id;
        self.set_state(id, SlotState::Complete(Arc::new(record)));
        id
    }

    /// Publishes the record of a reserved element.
    pub(crate) fn finish(&mut self, record: ElementRecord) -> Arc<ElementRecord> {
        let id = record.id;
        let record = Arc::new(record);
        self.set_state(id, SlotState::Complete(record.clone()));
        record
    }

    fn set_state(&mut self, id: ElementId, state: SlotState) {
        if let Some(slot) = self.elements.get_mut(id.as_usize()) {
            slot.state = state;
        }
    }

    fn add_child(&mut self, parent: ElementId, child: ElementId) {
        let Some(slot) = self.elements.get_mut(parent.as_usize()) else {
            return;
        };
        slot.children.push(child);
        // Containers are cheap to complete again; anything already bound keeps its snapshot.
        if matches!(slot.state, SlotState::Complete(_)) {
            match slot.kind {
                ElementKind::Module => slot.state = SlotState::Pending(Pending::Module),
                ElementKind::Package => slot.state = SlotState::Pending(Pending::Package),
                _ => {}
            }
        }
    }
}

// Lookup
impl Model {
    pub fn module_element(&self, name: &str) -> Option<ElementId> {
        self.modules.get(name).copied()
    }

    pub fn package_element(&self, name: &str) -> Option<ElementId> {
        self.packages.get(name).copied()
    }

    pub fn type_element(&self, qualified_name: &str) -> Option<ElementId> {
        self.type_elements.get(qualified_name).copied()
    }

    /// The top reference type's element, if the platform is installed.
    pub fn object_element(&self) -> Option<ElementId> {
        self.type_element(platform::OBJECT)
    }

    pub fn modules(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.modules.values().copied()
    }

    pub fn packages(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.packages.values().copied()
    }

    pub fn type_elements(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.type_elements.values().copied()
    }

    /// The kind of an element, known without completing it.
    pub fn element_kind(&self, id: ElementId) -> Option<ElementKind> {
        self.slot(id).map(|slot| slot.kind)
    }

    pub fn qualified_name(&self, id: ElementId) -> Option<&EcoString> {
        self.slot(id).map(|slot| &slot.qualified_name)
    }

    pub fn is_complete(&self, id: ElementId) -> bool {
        self.slot(id)
            .is_some_and(|slot| matches!(slot.state, SlotState::Complete(_)))
    }

    /// The record of an already completed element.
    pub fn record(&self, id: ElementId) -> Option<&Arc<ElementRecord>> {
        match &self.slot(id)?.state {
            SlotState::Complete(record) => Some(record),
            _ => None,
        }
    }

    pub fn ty(&self, id: TypeId) -> Arc<TypeRecord> {
        match self.types.get(id.as_usize()) {
            Some(record) => record.clone(),
            None => {
                warn!("type {id} does not belong to this model");
                Arc::new(TypeRecord::Error {
                    name: "<unknown>".into(),
                    element: None,
                })
            }
        }
    }

    pub fn type_kind(&self, id: TypeId) -> TypeKind {
        self.ty(id).kind()
    }

    pub(crate) fn slot(&self, id: ElementId) -> Option<&ElementSlot> {
        self.elements.get(id.as_usize())
    }

    pub(crate) fn alloc_type(&mut self, record: TypeRecord) -> TypeId {
        let id = TypeId::from_usize(self.types.len());
        self.types.push(Arc::new(record));
        id
    }

    pub(crate) fn replace_type(&mut self, id: TypeId, record: TypeRecord) {
        if let Some(slot) = self.types.get_mut(id.as_usize()) {
            *slot = Arc::new(record);
        }
    }

    /// A usage of the top reference type, or [`TypeId::NONE`] without a platform.
    pub fn object_type(&mut self) -> TypeId {
        if let Some(ty) = self.object_type {
            return ty;
        }
        let Some(object) = self.object_element() else {
            return TypeId::NONE;
        };
        let ty = self.alloc_type(TypeRecord::Declared {
            enclosing: TypeId::NONE,
            element: object,
            arguments: Vec::new(),
        });
        self.object_type = Some(ty);
        ty
    }
}

// Factories
impl Model {
    pub fn primitive_type(&self, kind: TypeKind) -> ModelResult<TypeId> {
        TypeId::primitive(kind)
            .ok_or_else(|| ModelError::illegal(format!("{kind} is not a primitive kind")))
    }

    pub fn no_type(&self, kind: TypeKind) -> ModelResult<TypeId> {
        match kind {
            TypeKind::None | TypeKind::Void => Ok(TypeId::no_type(kind).unwrap_or(TypeId::NONE)),
            _ => Err(ModelError::illegal(format!("{kind} is not a no-type kind"))),
        }
    }

    pub fn null_type(&self) -> TypeId {
        TypeId::NULL
    }

    pub fn array_type(&mut self, component: TypeId) -> ModelResult<TypeId> {
        let kind = self.known_kind(component)?;
        if !(kind.is_primitive() || kind.is_reference()) || kind == TypeKind::Null {
            return Err(ModelError::illegal(format!(
                "{kind} cannot be the component of an array"
            )));
        }
        Ok(self.alloc_type(TypeRecord::Array { component }))
    }

    /// A usage of a type element; no `arguments` on a generic element yields its raw usage.
    pub fn declared_type(
        &mut self,
        enclosing: Option<TypeId>,
        element: ElementId,
        arguments: &[TypeId],
    ) -> ModelResult<TypeId> {
        let slot = self.slot(element).ok_or(ModelError::UnknownElement(element))?;
        if !slot.kind.is_type() {
            return Err(ModelError::illegal(format!(
                "`{}` is not a type element",
                slot.qualified_name
            )));
        }
        if !arguments.is_empty() && arguments.len() != slot.arity {
            return Err(ModelError::illegal(format!(
                "`{}` takes {} type arguments, got {}",
                slot.qualified_name,
                slot.arity,
                arguments.len()
            )));
        }
        for &arg in arguments {
            let kind = self.known_kind(arg)?;
            if !(kind.is_reference() || kind == TypeKind::Wildcard) || kind == TypeKind::Null {
                return Err(ModelError::illegal(format!("{kind} cannot be a type argument")));
            }
        }
        let enclosing = match enclosing {
            Some(ty) => match self.known_kind(ty)? {
                TypeKind::Declared | TypeKind::None => ty,
                kind => {
                    return Err(ModelError::illegal(format!(
                        "{kind} cannot enclose a declared type"
                    )));
                }
            },
            None => TypeId::NONE,
        };
        Ok(self.alloc_type(TypeRecord::Declared {
            enclosing,
            element,
            arguments: arguments.to_vec(),
        }))
    }

    pub fn wildcard_type(
        &mut self,
        extends: Option<TypeId>,
        super_bound: Option<TypeId>,
    ) -> ModelResult<TypeId> {
        if extends.is_some() && super_bound.is_some() {
            return Err(ModelError::illegal("a wildcard has at most one bound"));
        }
        if let Some(bound) = extends.or(super_bound) {
            let kind = self.known_kind(bound)?;
            if !kind.is_reference() || kind == TypeKind::Null {
                return Err(ModelError::illegal(format!("{kind} cannot bound a wildcard")));
            }
        }
        Ok(self.alloc_type(TypeRecord::Wildcard {
            extends,
            super_bound,
        }))
    }

    /// The type variable declared by a type parameter element.
    pub fn type_variable(&mut self, element: ElementId) -> ModelResult<TypeId> {
        match self.element_kind(element) {
            Some(ElementKind::TypeParameter) => Ok(self.complete(element).as_type),
            Some(kind) => Err(ModelError::illegal(format!("{kind} does not declare a type variable"))),
            None => Err(ModelError::UnknownElement(element)),
        }
    }

    /// The kind of a type of this model; foreign handles are rejected.
    fn known_kind(&self, id: TypeId) -> ModelResult<TypeKind> {
        self.types
            .get(id.as_usize())
            .map(|record| record.kind())
            .ok_or(ModelError::UnknownType(id))
    }

    pub fn intersection_type(&mut self, bounds: Vec<TypeId>) -> TypeId {
        self.alloc_type(TypeRecord::Intersection(bounds))
    }

    pub fn union_type(&mut self, alternatives: Vec<TypeId>) -> TypeId {
        self.alloc_type(TypeRecord::Union(alternatives))
    }
}

// Member queries
impl Model {
    /// Finds a constructor or method by name and the erasure of its parameter types.
    pub fn executable_element(
        &mut self,
        enclosing: ElementId,
        kind: ElementKind,
        name: &str,
        parameter_types: &[TypeId],
    ) -> Option<ElementId> {
        if !kind.is_executable() {
            return None;
        }
        let owner = self.complete(enclosing);
        let wanted: Vec<TypeId> = parameter_types.iter().map(|&t| self.erasure(t)).collect();

        owner.enclosed.iter().copied().find(|&member| {
            let record = self.complete(member);
            record.kind == kind
                && record.simple_name == name
                && record.parameters.len() == wanted.len()
                && record.parameters.iter().zip(&wanted).all(|(&param, &want)| {
                    let ty = self.complete(param).as_type;
                    let erased = self.erasure(ty);
                    self.same_type(erased, want)
                })
        })
    }

    /// Finds a field or enum constant of a type, or a parameter of an executable.
    pub fn variable_element(&mut self, enclosing: ElementId, name: &str) -> Option<ElementId> {
        let owner = self.complete(enclosing);
        let candidates = if owner.kind.is_executable() {
            &owner.parameters
        } else {
            &owner.enclosed
        };
        candidates.iter().copied().find(|&member| {
            let record = self.complete(member);
            matches!(
                record.kind,
                ElementKind::Field | ElementKind::EnumConstant | ElementKind::Parameter
            ) && record.simple_name == name
        })
    }

    pub fn type_parameter_element(&mut self, generic: ElementId, name: &str) -> Option<ElementId> {
        let owner = self.complete(generic);
        owner
            .type_parameters
            .iter()
            .copied()
            .find(|&param| self.complete(param).simple_name == name)
    }

    pub fn record_component_element(&mut self, record: ElementId, name: &str) -> Option<ElementId> {
        let owner = self.complete(record);
        owner
            .record_components
            .iter()
            .copied()
            .find(|&component| self.complete(component).simple_name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        decl::{MethodDecl, TypeDecl, TypeRef},
        test::platform_model,
    };

    #[test]
    fn declarations_are_completed_lazily() {
        let mut model = platform_model();
        let list = model.type_element("util.List").unwrap();

        assert!(!model.is_complete(list));
        let record = model.complete(list);
        assert!(model.is_complete(list));
        assert_eq!(record.kind, ElementKind::Interface);
        assert_eq!(record.type_parameters.len(), 1);

        let before = model.completions();
        let again = model.complete(list);
        assert!(Arc::ptr_eq(&record, &again));
        assert_eq!(model.completions(), before);
    }

    #[test]
    fn duplicate_types_are_rejected() {
        let mut model = platform_model();
        let lang = model.package_element("lang").unwrap();

        let err = model.declare_type(lang, TypeDecl::class("Object")).unwrap_err();
        assert_eq!(err, ModelError::Duplicate("lang.Object".into()));
    }

    #[test]
    fn factories_validate_kinds() {
        let mut model = platform_model();
        let list = model.type_element("util.List").unwrap();
        let string = model.type_element("lang.String").unwrap();
        let string = model.declared_type(None, string, &[]).unwrap();

        assert!(model.primitive_type(TypeKind::Declared).is_err());
        assert!(model.no_type(TypeKind::Package).is_err());
        assert!(model.array_type(TypeId::VOID).is_err());
        assert!(model.wildcard_type(Some(string), Some(string)).is_err());
        assert!(model.declared_type(None, list, &[string, string]).is_err());
        assert!(model.declared_type(None, list, &[TypeId::primitive(TypeKind::Int).unwrap()]).is_err());

        let list_of_string = model.declared_type(None, list, &[string]).unwrap();
        assert_eq!(model.ty(list_of_string).arguments(), &[string]);
    }

    #[test]
    fn foreign_type_handles_are_rejected() {
        let mut model = platform_model();
        let list = model.type_element("util.List").unwrap();
        let foreign = TypeId::from_usize(1_000_000);

        assert_eq!(model.array_type(foreign), Err(ModelError::UnknownType(foreign)));
        assert_eq!(
            model.declared_type(None, list, &[foreign]),
            Err(ModelError::UnknownType(foreign))
        );
        assert_eq!(
            model.wildcard_type(Some(foreign), None),
            Err(ModelError::UnknownType(foreign))
        );
    }

    #[test]
    fn unresolved_references_mark_the_element_erroneous() {
        let mut model = platform_model();
        let app = model.declare_package(None, "app");
        let broken = model
            .declare_type(app, TypeDecl::class("Broken").field("missing", TypeRef::named("Nowhere")))
            .unwrap();

        let record = model.complete(broken);
        assert!(record.erroneous);
        let field = model.complete(record.enclosed[0]);
        assert_eq!(model.type_kind(field.as_type), TypeKind::Error);
    }

    #[test]
    fn members_are_found_by_erased_signature() {
        let mut model = platform_model();
        let list = model.type_element("util.List").unwrap();
        let int = TypeId::primitive(TypeKind::Int).unwrap();

        let get = model.executable_element(list, ElementKind::Method, "get", &[int]);
        assert!(get.is_some());
        assert!(model.executable_element(list, ElementKind::Method, "get", &[]).is_none());

        let object = model.object_type();
        let set = model.executable_element(list, ElementKind::Method, "set", &[int, object]);
        assert!(set.is_some());

        let e = model.type_parameter_element(list, "E").unwrap();
        assert_eq!(model.element_kind(e), Some(ElementKind::TypeParameter));
    }

    #[test]
    fn locals_are_not_enclosed_members() {
        let mut model = platform_model();
        let app = model.declare_package(None, "app");
        let main = model
            .declare_type(
                app,
                TypeDecl::class("Main").method(MethodDecl::new("run", TypeRef::Void).param("n", TypeRef::INT)),
            )
            .unwrap();
        let run = model.complete(main).enclosed[0];

        let local = model
            .declare_local(run, ElementKind::LocalVariable, "count", &TypeRef::INT)
            .unwrap();
        assert_eq!(model.complete(local).enclosing, Some(run));
        assert!(!model.complete(run).enclosed.contains(&local));
        assert!(model.variable_element(run, "count").is_none());
        assert!(model.variable_element(run, "n").is_some());

        assert!(model.declare_local(main, ElementKind::LocalVariable, "x", &TypeRef::INT).is_err());
    }
}
