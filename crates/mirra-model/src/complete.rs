//! Completion: turning an entered declaration into an [`ElementRecord`].

use std::{collections::BTreeMap, sync::Arc};

use ecow::EcoString;
use log::{debug, warn};

use crate::{
    annotation::{AnnotationMirror, AnnotationValue},
    decl::{AnnotationDecl, MemberDecl, MethodDecl, TypeDecl, TypeParamDecl, TypeRef, ValueDecl},
    element::{ElementId, ElementKind, ElementRecord, Modifier, NestingKind},
    model::{Model, Pending, SlotState},
    platform,
    types::{TypeId, TypeRecord},
};

/// Name resolution state of one completion.
#[derive(Debug, Clone, Default)]
pub(crate) struct Resolution {
    package: EcoString,
    owner: EcoString,
    scope: Vec<(EcoString, TypeId)>,
    unresolved: Vec<EcoString>,
}

impl Resolution {
    fn new(package: EcoString, owner: EcoString) -> Self {
        Self {
            package,
            owner,
            ..Self::default()
        }
    }

    fn lookup_var(&self, name: &str) -> Option<TypeId> {
        self.scope
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|&(_, ty)| ty)
    }

    pub(crate) fn has_errors(&self) -> bool {
        !self.unresolved.is_empty()
    }
}

impl Model {
    /// Completes an element, returning its immutable record.
    ///
    /// Completion never fails: unresolvable parts become error types and the
    /// record is marked erroneous. An id from another model yields an
    /// erroneous placeholder.
    pub fn complete(&mut self, id: ElementId) -> Arc<ElementRecord> {
        let Some(slot) = self.elements.get_mut(id.as_usize()) else {
            warn!("element {id} does not belong to this model");
            let mut record = ElementRecord::new(id, ElementKind::Class, "<unknown>");
            record.erroneous = true;
            return Arc::new(record);
        };

        let pending = match std::mem::replace(&mut slot.state, SlotState::Completing) {
            SlotState::Complete(record) => {
                slot.state = SlotState::Complete(record.clone());
                return record;
            }
            SlotState::Completing => {
                warn!("cyclic completion of `{}`", slot.qualified_name);
                let mut record = ElementRecord::new(id, slot.kind, slot.simple_name.clone())
                    .with_enclosing(slot.enclosing);
                record.qualified_name = slot.qualified_name.clone();
                record.erroneous = true;
                return Arc::new(record);
            }
            SlotState::Pending(pending) => pending,
        };

        let record = match pending {
            Pending::Module => self.complete_container(id, TypeId::MODULE),
            Pending::Package => self.complete_container(id, TypeId::PACKAGE),
            Pending::Type(decl) => self.complete_type(id, *decl),
        };
        self.completions += 1;

        if record.erroneous {
            warn!("completed {} `{}` with errors", record.kind, record.qualified_name);
        } else {
            debug!("completed {} `{}`", record.kind, record.qualified_name);
        }
        self.finish(record)
    }

    fn complete_container(&self, id: ElementId, as_type: TypeId) -> ElementRecord {
        let Some(slot) = self.slot(id) else {
            return ElementRecord::new(id, ElementKind::Package, "").with_type(as_type);
        };
        let mut record = ElementRecord::new(id, slot.kind, slot.simple_name.clone())
            .with_enclosing(slot.enclosing)
            .with_type(as_type);
        record.qualified_name = slot.qualified_name.clone();
        record.enclosed = slot.children.clone();
        record
    }

    fn complete_type(&mut self, id: ElementId, decl: TypeDecl) -> ElementRecord {
        let (qualified, enclosing, nested) = match self.slot(id) {
            Some(slot) => (
                slot.qualified_name.clone(),
                slot.enclosing,
                slot.children.clone(),
            ),
            None => (decl.name.clone(), None, Vec::new()),
        };
        let nesting = match enclosing.and_then(|e| self.element_kind(e)) {
            Some(kind) if kind.is_type() => NestingKind::Member,
            _ => NestingKind::TopLevel,
        };

        let mut modifiers = decl.modifiers.clone();
        if nesting == NestingKind::Member
            && decl.kind != ElementKind::Class
            && !modifiers.contains(&Modifier::Static)
        {
            modifiers.push(Modifier::Static);
        }

        let mut cx = Resolution::new(self.package_of(id), qualified.clone());
        if nesting == NestingKind::Member && !modifiers.contains(&Modifier::Static) {
            cx.scope = self.scope_of(enclosing);
        }

        let type_parameters = self.enter_type_parameters(id, &decl.type_parameters, &mut cx);
        let as_type = self.alloc_type(TypeRecord::Declared {
            enclosing: TypeId::NONE,
            element: id,
            arguments: type_parameters.iter().map(|&(_, var)| var).collect(),
        });

        let superclass = match decl.kind {
            ElementKind::Enum => self.platform_type(platform::ENUM, vec![as_type]),
            ElementKind::Record => self.platform_type(platform::RECORD, Vec::new()),
            ElementKind::Class => match &decl.superclass {
                Some(superclass) => self.resolve(superclass, &mut cx),
                None if qualified == platform::OBJECT => TypeId::NONE,
                None => self.object_type(),
            },
            _ => TypeId::NONE,
        };
        let mut interfaces: Vec<TypeId> = decl
            .interfaces
            .iter()
            .map(|iface| self.resolve(iface, &mut cx))
            .collect();
        if decl.kind.is_interface() {
            if let Some(superclass) = &decl.superclass {
                let ty = self.resolve(superclass, &mut cx);
                interfaces.insert(0, ty);
            }
        }

        let mut enclosed = Vec::with_capacity(decl.members.len() + nested.len());
        let mut record_components = Vec::new();
        for member in &decl.members {
            let member = match member {
                MemberDecl::Field {
                    name,
                    ty,
                    modifiers,
                } => {
                    let ty = self.resolve(ty, &mut cx);
                    let mut record = ElementRecord::new(id, ElementKind::Field, name.clone())
                        .with_enclosing(Some(id))
                        .with_type(ty);
                    record.modifiers = modifiers.clone();
                    record.nesting = NestingKind::Member;
                    self.alloc_complete(record)
                }
                MemberDecl::EnumConstant(name) => {
                    let mut record = ElementRecord::new(id, ElementKind::EnumConstant, name.clone())
                        .with_enclosing(Some(id))
                        .with_type(as_type);
                    record.modifiers = vec![Modifier::Public, Modifier::Static, Modifier::Final];
                    record.nesting = NestingKind::Member;
                    self.alloc_complete(record)
                }
                MemberDecl::Method(method) => {
                    self.enter_executable(id, ElementKind::Method, method, as_type, &mut cx)
                }
                MemberDecl::Constructor(method) => {
                    self.enter_executable(id, ElementKind::Constructor, method, as_type, &mut cx)
                }
                MemberDecl::RecordComponent { name, ty } => {
                    let ty = self.resolve(ty, &mut cx);
                    let mut record =
                        ElementRecord::new(id, ElementKind::RecordComponent, name.clone())
                            .with_enclosing(Some(id))
                            .with_type(ty);
                    record.nesting = NestingKind::Member;
                    let component = self.alloc_complete(record);
                    record_components.push(component);
                    component
                }
            };
            enclosed.push(member);
        }
        enclosed.extend(nested);

        let annotations = self.resolve_annotations(&decl.annotations, &mut cx);

        let mut record = ElementRecord::new(id, decl.kind, decl.name.clone())
            .with_enclosing(enclosing)
            .with_type(as_type);
        record.qualified_name = qualified;
        record.enclosed = enclosed;
        record.modifiers = modifiers;
        record.nesting = nesting;
        record.type_parameters = type_parameters.into_iter().map(|(tp, _)| tp).collect();
        record.superclass = superclass;
        record.interfaces = interfaces;
        record.record_components = record_components;
        record.annotations = annotations;
        record.erroneous = cx.has_errors();
        record
    }

    /// Enters type parameter elements and their variables, resolving bounds
    /// only once every variable of the list is in scope.
    fn enter_type_parameters(
        &mut self,
        owner: ElementId,
        decls: &[TypeParamDecl],
        cx: &mut Resolution,
    ) -> Vec<(ElementId, TypeId)> {
        let mut entered = Vec::with_capacity(decls.len());
        for decl in decls {
            let param = self.reserve(
                ElementKind::TypeParameter,
                decl.name.clone(),
                decl.name.clone(),
                Some(owner),
                0,
            );
            let var = self.alloc_type(TypeRecord::TypeVar {
                element: param,
                upper: TypeId::NONE,
                lower: TypeId::NULL,
            });
            cx.scope.push((decl.name.clone(), var));
            entered.push((param, var));
        }

        for (decl, &(param, var)) in decls.iter().zip(&entered) {
            let bounds: Vec<TypeId> = decl.bounds.iter().map(|b| self.resolve(b, cx)).collect();
            let upper = match bounds.as_slice() {
                [] => self.object_type(),
                [bound] => *bound,
                _ => self.intersection_type(bounds.clone()),
            };
            self.replace_type(
                var,
                TypeRecord::TypeVar {
                    element: param,
                    upper,
                    lower: TypeId::NULL,
                },
            );

            let mut record = ElementRecord::new(param, ElementKind::TypeParameter, decl.name.clone())
                .with_enclosing(Some(owner))
                .with_type(var);
            record.generic_element = Some(owner);
            record.bounds = if bounds.is_empty() { vec![upper] } else { bounds };
            self.finish(record);
        }
        entered
    }

    fn enter_executable(
        &mut self,
        owner: ElementId,
        kind: ElementKind,
        method: &MethodDecl,
        owner_type: TypeId,
        cx: &mut Resolution,
    ) -> ElementId {
        let name: EcoString = match kind {
            ElementKind::Constructor => "<init>".into(),
            _ => method.name.clone(),
        };
        let id = self.reserve(
            kind,
            name.clone(),
            name.clone(),
            Some(owner),
            method.type_parameters.len(),
        );
        let errors_before = cx.unresolved.len();
        let depth = cx.scope.len();

        let type_parameters = self.enter_type_parameters(id, &method.type_parameters, cx);
        let return_type = match kind {
            ElementKind::Constructor => TypeId::VOID,
            _ => self.resolve(&method.return_type, cx),
        };

        let mut parameters = Vec::with_capacity(method.parameters.len());
        let mut parameter_types = Vec::with_capacity(method.parameters.len());
        for (param_name, param_type) in &method.parameters {
            let ty = self.resolve(param_type, cx);
            let mut record = ElementRecord::new(id, ElementKind::Parameter, param_name.clone())
                .with_enclosing(Some(id))
                .with_type(ty);
            record.nesting = NestingKind::Local;
            parameters.push(self.alloc_complete(record));
            parameter_types.push(ty);
        }
        let thrown: Vec<TypeId> = method.thrown.iter().map(|t| self.resolve(t, cx)).collect();
        let annotations = self.resolve_annotations(&method.annotations, cx);
        cx.scope.truncate(depth);

        let is_static = method.modifiers.contains(&Modifier::Static);
        let receiver = if is_static || kind == ElementKind::Constructor {
            TypeId::NONE
        } else {
            owner_type
        };
        let executable = self.alloc_type(TypeRecord::Executable {
            type_variables: type_parameters.iter().map(|&(_, var)| var).collect(),
            receiver,
            parameters: parameter_types,
            return_type,
            thrown: thrown.clone(),
        });

        let mut record = ElementRecord::new(id, kind, name)
            .with_enclosing(Some(owner))
            .with_type(executable);
        record.modifiers = method.modifiers.clone();
        record.nesting = NestingKind::Member;
        record.type_parameters = type_parameters.into_iter().map(|(tp, _)| tp).collect();
        record.parameters = parameters;
        record.return_type = return_type;
        record.thrown_types = thrown;
        record.varargs = method.varargs;
        record.annotations = annotations;
        record.erroneous = cx.unresolved.len() > errors_before;
        self.finish(record);
        id
    }

    /// The resolution context of code inside `element`.
    pub(crate) fn resolution_for(&mut self, element: ElementId) -> Resolution {
        let owner = self
            .enclosing_type(element)
            .and_then(|ty| self.qualified_name(ty).cloned())
            .unwrap_or_default();
        let mut cx = Resolution::new(self.package_of(element), owner);
        cx.scope = self.scope_of(Some(element));
        cx
    }

    /// Type variables visible from `start`, outermost first.
    fn scope_of(&mut self, start: Option<ElementId>) -> Vec<(EcoString, TypeId)> {
        let mut frames = Vec::new();
        let mut current = start;
        while let Some(id) = current {
            let Some(kind) = self.element_kind(id) else {
                break;
            };
            if !kind.is_parameterizable() {
                break;
            }
            let record = self.complete(id);
            let frame: Vec<(EcoString, TypeId)> = record
                .type_parameters
                .iter()
                .map(|&param| {
                    let param = self.complete(param);
                    (param.simple_name.clone(), param.as_type)
                })
                .collect();
            frames.push(frame);

            let inherits = kind.is_executable() || (kind == ElementKind::Class && !record.is_static());
            current = if inherits { record.enclosing } else { None };
        }
        frames.into_iter().rev().flatten().collect()
    }

    fn package_of(&self, id: ElementId) -> EcoString {
        let mut current = Some(id);
        while let Some(slot) = current.and_then(|id| self.slot(id)) {
            if slot.kind == ElementKind::Package {
                return slot.qualified_name.clone();
            }
            current = slot.enclosing;
        }
        EcoString::new()
    }

    fn enclosing_type(&self, id: ElementId) -> Option<ElementId> {
        let mut current = Some(id);
        while let Some(id) = current {
            let slot = self.slot(id)?;
            if slot.kind.is_type() {
                return Some(id);
            }
            current = slot.enclosing;
        }
        None
    }

    fn platform_type(&mut self, name: &str, arguments: Vec<TypeId>) -> TypeId {
        match self.type_element(name) {
            Some(element) => self.alloc_type(TypeRecord::Declared {
                enclosing: TypeId::NONE,
                element,
                arguments,
            }),
            None => TypeId::NONE,
        }
    }

    pub(crate) fn resolve(&mut self, ty: &TypeRef, cx: &mut Resolution) -> TypeId {
        match ty {
            TypeRef::Primitive(kind) => match TypeId::primitive(*kind) {
                Some(ty) => ty,
                None => self.unresolved(kind.to_string().into(), cx),
            },
            TypeRef::Void => TypeId::VOID,
            TypeRef::Var(name) => match cx.lookup_var(name) {
                Some(var) => var,
                None => self.unresolved(name.clone(), cx),
            },
            TypeRef::Named { name, args } => {
                let Some(element) = self.find_type_element(name, cx) else {
                    return self.unresolved(name.clone(), cx);
                };
                let arity = self.slot(element).map_or(0, |slot| slot.arity);
                if !args.is_empty() && args.len() != arity {
                    return self.unresolved(name.clone(), cx);
                }
                let arguments = args.iter().map(|arg| self.resolve(arg, cx)).collect();
                self.alloc_type(TypeRecord::Declared {
                    enclosing: TypeId::NONE,
                    element,
                    arguments,
                })
            }
            TypeRef::Array(component) => {
                let component = self.resolve(component, cx);
                self.alloc_type(TypeRecord::Array { component })
            }
            TypeRef::Wildcard {
                extends,
                super_bound,
            } => {
                let extends = extends.as_deref().map(|bound| self.resolve(bound, cx));
                let super_bound = super_bound.as_deref().map(|bound| self.resolve(bound, cx));
                self.alloc_type(TypeRecord::Wildcard {
                    extends,
                    super_bound,
                })
            }
        }
    }

    /// Member types of the owner, then qualified names, then the current
    /// package, then the implicitly imported `lang` package.
    fn find_type_element(&self, name: &str, cx: &Resolution) -> Option<ElementId> {
        let mut owner = cx.owner.as_str();
        while !owner.is_empty() {
            if let Some(id) = self.type_element(&format!("{owner}.{name}")) {
                return Some(id);
            }
            owner = owner.rsplit_once('.').map_or("", |(outer, _)| outer);
        }
        self.type_element(name)
            .or_else(|| self.type_element(&format!("{}.{name}", cx.package)))
            .or_else(|| self.type_element(&format!("{}.{name}", platform::LANG)))
    }

    fn unresolved(&mut self, name: EcoString, cx: &mut Resolution) -> TypeId {
        debug!("cannot resolve `{name}` in `{}`", cx.owner);
        cx.unresolved.push(name.clone());
        self.alloc_type(TypeRecord::Error {
            name,
            element: None,
        })
    }

    fn resolve_annotations(
        &mut self,
        decls: &[AnnotationDecl],
        cx: &mut Resolution,
    ) -> Vec<AnnotationMirror> {
        decls
            .iter()
            .map(|decl| {
                let annotation_type = self.resolve(&decl.annotation_type, cx);
                let values: BTreeMap<EcoString, AnnotationValue> = decl
                    .values
                    .iter()
                    .map(|(name, value)| (name.clone(), self.resolve_value(value, cx)))
                    .collect();
                AnnotationMirror {
                    annotation_type,
                    values,
                }
            })
            .collect()
    }

    fn resolve_value(&mut self, value: &ValueDecl, cx: &mut Resolution) -> AnnotationValue {
        match value {
            ValueDecl::Bool(b) => AnnotationValue::Bool(*b),
            ValueDecl::Int(i) => AnnotationValue::Int(*i),
            ValueDecl::Str(s) => AnnotationValue::Str(s.clone()),
            ValueDecl::Type(ty) => AnnotationValue::Type(self.resolve(ty, cx)),
            ValueDecl::EnumConstant { ty, name } => {
                let ty = self.resolve(ty, cx);
                let constant = self.ty(ty).element().and_then(|enumeration| {
                    self.complete(enumeration)
                        .enclosed
                        .iter()
                        .copied()
                        .find(|&member| {
                            self.record(member).is_some_and(|record| {
                                record.kind == ElementKind::EnumConstant && record.simple_name == *name
                            })
                        })
                });
                match constant {
                    Some(constant) => AnnotationValue::EnumConstant(constant),
                    None => {
                        cx.unresolved.push(name.clone());
                        AnnotationValue::Str(name.clone())
                    }
                }
            }
            ValueDecl::Array(values) => {
                AnnotationValue::Array(values.iter().map(|v| self.resolve_value(v, cx)).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        decl::{MethodDecl, TypeDecl, TypeRef},
        element::{ElementKind, Modifier, NestingKind},
        test::platform_model,
        types::{TypeId, TypeKind, TypeRecord},
    };

    #[test]
    fn type_parameters_may_refer_to_each_other() {
        let mut model = platform_model();
        let app = model.declare_package(None, "app");
        let pair = model
            .declare_type(
                app,
                TypeDecl::class("Pair")
                    .type_param("A", [TypeRef::var("B")])
                    .type_param("B", []),
            )
            .unwrap();

        let record = model.complete(pair);
        assert!(!record.erroneous);
        let a = model.complete(record.type_parameters[0]);
        let b = model.complete(record.type_parameters[1]);
        assert_eq!(a.bounds, vec![b.as_type]);
        assert_eq!(a.generic_element, Some(pair));

        let TypeRecord::TypeVar { upper, .. } = &*model.ty(a.as_type) else {
            panic!("expected a type variable");
        };
        assert_eq!(*upper, b.as_type);
    }

    #[test]
    fn implicit_superclasses_follow_the_kind() {
        let mut model = platform_model();
        let object = model.object_element().unwrap();
        let object_record = model.complete(object);
        assert_eq!(object_record.superclass, TypeId::NONE);

        let policy = model.type_element("lang.RetentionPolicy").unwrap();
        let policy = model.complete(policy);
        let superclass = model.ty(policy.superclass);
        assert_eq!(superclass.element(), model.type_element("lang.Enum"));
        assert_eq!(superclass.arguments(), &[policy.as_type]);

        let list = model.type_element("util.List").unwrap();
        assert_eq!(model.complete(list).superclass, TypeId::NONE);
    }

    #[test]
    fn member_types_see_outer_type_variables_unless_static() {
        let mut model = platform_model();
        let app = model.declare_package(None, "app");
        let outer = model
            .declare_type(
                app,
                TypeDecl::class("Outer")
                    .type_param("T", [])
                    .nested(TypeDecl::class("Inner").field("value", TypeRef::var("T")))
                    .nested(
                        TypeDecl::class("Nested")
                            .modifiers([Modifier::Static])
                            .field("value", TypeRef::var("T")),
                    ),
            )
            .unwrap();

        let inner = model.type_element("app.Outer.Inner").unwrap();
        let inner = model.complete(inner);
        assert!(!inner.erroneous);
        assert_eq!(inner.nesting, NestingKind::Member);
        assert_eq!(inner.enclosing, Some(outer));

        let nested = model.type_element("app.Outer.Nested").unwrap();
        assert!(model.complete(nested).erroneous);

        let outer = model.complete(outer);
        assert!(outer.enclosed.contains(&inner.id));
    }

    #[test]
    fn executables_get_parameters_and_signature() {
        let mut model = platform_model();
        let app = model.declare_package(None, "app");
        let util = model
            .declare_type(
                app,
                TypeDecl::class("Util").method(
                    MethodDecl::new("first", TypeRef::var("T"))
                        .modifiers([Modifier::Static])
                        .type_param("T", [])
                        .param("items", TypeRef::generic("util.List", [TypeRef::var("T")]))
                        .throws(TypeRef::named("Exception")),
                ),
            )
            .unwrap();

        let record = model.complete(util);
        assert!(!record.erroneous);

        let method = model.complete(record.enclosed[0]);
        assert_eq!(method.kind, ElementKind::Method);
        assert_eq!(method.type_parameters.len(), 1);
        assert_eq!(method.parameters.len(), 1);
        assert_eq!(method.thrown_types.len(), 1);
        assert_eq!(model.type_kind(method.return_type), TypeKind::TypeVar);
        let TypeRecord::Executable { receiver, .. } = &*model.ty(method.as_type) else {
            panic!("expected an executable type");
        };
        assert_eq!(*receiver, TypeId::NONE);
    }

    #[test]
    fn annotations_resolve_enum_constants() {
        let mut model = platform_model();
        let retention = model.type_element("lang.Retention").unwrap();
        let record = model.complete(retention);

        let mirror = &record.annotations[0];
        assert_eq!(model.ty(mirror.annotation_type).element(), Some(retention));
        let value = &mirror.values["value"];
        let crate::annotation::AnnotationValue::EnumConstant(constant) = value else {
            panic!("expected an enum constant, got {value:?}");
        };
        assert_eq!(model.complete(*constant).simple_name, "RUNTIME");
    }
}
