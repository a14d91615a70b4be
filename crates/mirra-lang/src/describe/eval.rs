use std::{collections::BTreeMap, sync::Arc};

use ecow::EcoString;
use log::debug;
use mirra_model::{
    Name,
    annotation::{AnnotationMirror, AnnotationValue},
    element::{ElementId, ElementKind},
    types::{TypeId, TypeKind},
};
use mirra_utils::as_variant;

use crate::{
    describe::{Descriptor, Factory},
    domain::Domain,
    error::EvalError,
    runtime,
    universal::{UniversalAnnotation, UniversalElement, UniversalType},
};

/// What a descriptor evaluates to.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(EcoString),
    /// A name interned in the evaluating domain.
    Name(Name),
    ElementKind(ElementKind),
    TypeKind(TypeKind),
    Domain(Arc<dyn Domain>),
    Element(UniversalElement),
    Type(UniversalType),
    Annotation(UniversalAnnotation),
    List(Vec<Value>),
    /// Key-value pairs in recipe order.
    Map(Vec<(Value, Value)>),
    Entry(Box<(Value, Value)>),
}

impl Value {
    pub fn as_element(&self) -> Option<&UniversalElement> {
        as_variant!(self, Self::Element)
    }

    pub fn as_type(&self) -> Option<&UniversalType> {
        as_variant!(self, Self::Type)
    }

    pub fn as_annotation(&self) -> Option<&UniversalAnnotation> {
        as_variant!(self, Self::Annotation)
    }

    pub fn as_domain(&self) -> Option<&Arc<dyn Domain>> {
        as_variant!(self, Self::Domain)
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        as_variant!(self, Self::List)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Evaluates `descriptor` against `domain`.
pub fn reconstruct(descriptor: &Descriptor, domain: &Arc<dyn Domain>) -> Result<Value, EvalError> {
    debug!("reconstructing {:?}", descriptor.factory());
    Evaluator::new(domain).eval(descriptor)
}

pub fn reconstruct_type(
    descriptor: &Descriptor,
    domain: &Arc<dyn Domain>,
) -> Result<UniversalType, EvalError> {
    match reconstruct(descriptor, domain)? {
        Value::Type(ty) => Ok(ty),
        _ => Err(shape("descriptor", "a type")),
    }
}

pub fn reconstruct_element(
    descriptor: &Descriptor,
    domain: &Arc<dyn Domain>,
) -> Result<UniversalElement, EvalError> {
    match reconstruct(descriptor, domain)? {
        Value::Element(element) => Ok(element),
        _ => Err(shape("descriptor", "an element")),
    }
}

pub fn reconstruct_annotation(
    descriptor: &Descriptor,
    domain: &Arc<dyn Domain>,
) -> Result<UniversalAnnotation, EvalError> {
    match reconstruct(descriptor, domain)? {
        Value::Annotation(annotation) => Ok(annotation),
        _ => Err(shape("descriptor", "an annotation")),
    }
}

fn shape(context: impl Into<String>, expected: &'static str) -> EvalError {
    EvalError::Shape {
        context: context.into(),
        expected,
    }
}

struct Evaluator<'a> {
    domain: &'a Arc<dyn Domain>,
    descriptor: Option<Descriptor>,
}

impl<'a> Evaluator<'a> {
    fn new(domain: &'a Arc<dyn Domain>) -> Self {
        Self {
            domain,
            descriptor: domain.describe(),
        }
    }

    fn eval(&self, descriptor: &Descriptor) -> Result<Value, EvalError> {
        Ok(match descriptor {
            Descriptor::Null => Value::Null,
            Descriptor::Bool(b) => Value::Bool(*b),
            Descriptor::Int(i) => Value::Int(*i),
            Descriptor::Str(s) => Value::Str(s.clone()),
            Descriptor::ElementKind(kind) => Value::ElementKind(*kind),
            Descriptor::TypeKind(kind) => Value::TypeKind(*kind),
            Descriptor::Invoke { factory, args } => self.invoke(*factory, args)?,
        })
    }

    fn invoke(&self, factory: Factory, args: &[Descriptor]) -> Result<Value, EvalError> {
        if let Some(expected) = factory.arity()
            && args.len() != expected
        {
            return Err(EvalError::Arity {
                factory,
                expected,
                found: args.len(),
            });
        }

        let args = if factory.takes_domain() {
            let (domain, rest) = args.split_first().ok_or(EvalError::Arity {
                factory,
                expected: 1,
                found: 0,
            })?;
            self.check_domain(domain)?;
            rest
        } else {
            args
        };

        match factory {
            Factory::RuntimeDomain => self.runtime_domain().map(Value::Domain),
            Factory::Name => {
                let text = self.str(&args[0], "name")?;
                Ok(Value::Name(self.domain.name(&text)))
            }
            Factory::ModuleElement => {
                let name = self.name(&args[0])?;
                let id = self.domain.module_element(&name);
                self.found(id, || format!("module `{name}`"))
            }
            Factory::PackageElement => {
                let name = self.name(&args[0])?;
                let id = self.domain.package_element(&name);
                self.found(id, || format!("package `{name}`"))
            }
            Factory::TypeElement => {
                let name = self.name(&args[0])?;
                let id = self.domain.type_element(&name);
                self.found(id, || format!("type `{name}`"))
            }
            Factory::TypeParameterElement => {
                let generic = self.element(&args[0], "generic element")?;
                let name = self.name(&args[1])?;
                let id = self.domain.type_parameter_element(generic, &name);
                self.found(id, || format!("type parameter `{name}`"))
            }
            Factory::ExecutableElement => {
                let enclosing = self.element(&args[0], "enclosing element")?;
                let Value::ElementKind(kind) = self.eval(&args[1])? else {
                    return Err(shape("executable kind", "an element kind"));
                };
                let name = self.name(&args[2])?;
                let parameters = self
                    .list(&args[3], "parameter types")?
                    .iter()
                    .map(|param| self.type_of(param, "parameter type"))
                    .collect::<Result<Vec<_>, _>>()?;
                let id = self
                    .domain
                    .executable_element(enclosing, kind, &name, &parameters);
                self.found(id, || format!("{kind} `{name}`"))
            }
            Factory::VariableElement => {
                let enclosing = self.element(&args[0], "enclosing element")?;
                let name = self.name(&args[1])?;
                let id = self.domain.variable_element(enclosing, &name);
                self.found(id, || format!("variable `{name}`"))
            }
            Factory::RecordComponentElement => {
                let record = self.element(&args[0], "record")?;
                let name = self.name(&args[1])?;
                let id = self.domain.record_component_element(record, &name);
                self.found(id, || format!("record component `{name}`"))
            }
            Factory::DeclaredType => {
                let enclosing = self.optional_type(&args[0], "enclosing type")?;
                let element = self.element(&args[1], "type element")?;
                let arguments = self
                    .list(&args[2], "type arguments")?
                    .iter()
                    .map(|arg| self.type_of(arg, "type argument"))
                    .collect::<Result<Vec<_>, _>>()?;
                let ty = self.domain.declared_type(enclosing, element, &arguments)?;
                Ok(self.wrap_type(ty))
            }
            Factory::ArrayType => {
                let component = self.ty(&args[0], "component type")?;
                Ok(self.wrap_type(self.domain.array_type(component)?))
            }
            Factory::PrimitiveType => {
                let kind = self.type_kind(&args[0])?;
                Ok(self.wrap_type(self.domain.primitive_type(kind)?))
            }
            Factory::NoType => {
                let kind = self.type_kind(&args[0])?;
                Ok(self.wrap_type(self.domain.no_type(kind)?))
            }
            Factory::NullType => Ok(self.wrap_type(self.domain.null_type())),
            Factory::TypeVariable => {
                let element = self.element(&args[0], "type parameter")?;
                Ok(self.wrap_type(self.domain.type_variable(element)?))
            }
            Factory::WildcardType => {
                let extends = self.optional_type(&args[0], "extends bound")?;
                let super_bound = self.optional_type(&args[1], "super bound")?;
                Ok(self.wrap_type(self.domain.wildcard_type(extends, super_bound)?))
            }
            Factory::Annotation => self.annotation(&args[0], &args[1]),
            Factory::ListOf { .. } | Factory::ListOfArray => args
                .iter()
                .map(|arg| self.eval(arg))
                .collect::<Result<_, _>>()
                .map(Value::List),
            Factory::MapOf { .. } => args
                .chunks_exact(2)
                .map(|pair| Ok((self.eval(&pair[0])?, self.eval(&pair[1])?)))
                .collect::<Result<_, EvalError>>()
                .map(Value::Map),
            Factory::MapOfEntries => args
                .iter()
                .map(|arg| match self.eval(arg)? {
                    Value::Entry(entry) => Ok(*entry),
                    _ => Err(shape("map argument", "an entry")),
                })
                .collect::<Result<_, _>>()
                .map(Value::Map),
            Factory::MapEntry => Ok(Value::Entry(Box::new((
                self.eval(&args[0])?,
                self.eval(&args[1])?,
            )))),
        }
    }

    /// The recipe's domain must be the one it is evaluated against.
    fn check_domain(&self, descriptor: &Descriptor) -> Result<(), EvalError> {
        if self.descriptor.as_ref() == Some(descriptor) {
            Ok(())
        } else {
            Err(EvalError::DomainMismatch)
        }
    }

    /// The evaluating domain when it is the runtime domain, otherwise the
    /// process-wide runtime model.
    fn runtime_domain(&self) -> Result<Arc<dyn Domain>, EvalError> {
        if self.descriptor == Some(Descriptor::invoke(Factory::RuntimeDomain, [])) {
            return Ok(self.domain.clone());
        }
        Ok(runtime::get()?.domain())
    }

    fn found(
        &self,
        id: Option<ElementId>,
        what: impl FnOnce() -> String,
    ) -> Result<Value, EvalError> {
        id.map(|id| Value::Element(UniversalElement::of(id, self.domain)))
            .ok_or_else(|| EvalError::Unresolved(what()))
    }

    fn wrap_type(&self, ty: TypeId) -> Value {
        Value::Type(UniversalType::of(ty, self.domain))
    }

    fn str(&self, descriptor: &Descriptor, context: &str) -> Result<EcoString, EvalError> {
        match descriptor {
            Descriptor::Str(s) => Ok(s.clone()),
            _ => Err(shape(context, "a string")),
        }
    }

    fn name(&self, descriptor: &Descriptor) -> Result<EcoString, EvalError> {
        match self.eval(descriptor)? {
            Value::Name(name) => self
                .domain
                .name_text(name)
                .ok_or_else(|| EvalError::Unresolved(format!("name {name}"))),
            _ => Err(shape("name argument", "a name")),
        }
    }

    fn type_kind(&self, descriptor: &Descriptor) -> Result<TypeKind, EvalError> {
        match self.eval(descriptor)? {
            Value::TypeKind(kind) => Ok(kind),
            _ => Err(shape("kind argument", "a type kind")),
        }
    }

    fn list(&self, descriptor: &Descriptor, context: &str) -> Result<Vec<Value>, EvalError> {
        match self.eval(descriptor)? {
            Value::List(items) => Ok(items),
            _ => Err(shape(context, "a list")),
        }
    }

    fn element(&self, descriptor: &Descriptor, context: &str) -> Result<ElementId, EvalError> {
        match self.eval(descriptor)? {
            Value::Element(element) => Ok(element.delegate()),
            _ => Err(shape(context, "an element")),
        }
    }

    fn ty(&self, descriptor: &Descriptor, context: &str) -> Result<TypeId, EvalError> {
        let value = self.eval(descriptor)?;
        self.type_of(&value, context)
    }

    fn type_of(&self, value: &Value, context: &str) -> Result<TypeId, EvalError> {
        match value {
            Value::Type(ty) => Ok(ty.delegate()),
            _ => Err(shape(context, "a type")),
        }
    }

    fn optional_type(
        &self,
        descriptor: &Descriptor,
        context: &str,
    ) -> Result<Option<TypeId>, EvalError> {
        match self.eval(descriptor)? {
            Value::Null => Ok(None),
            value => self.type_of(&value, context).map(Some),
        }
    }

    fn annotation(
        &self,
        annotation_type: &Descriptor,
        values: &Descriptor,
    ) -> Result<Value, EvalError> {
        let annotation_type = self.ty(annotation_type, "annotation type")?;
        let Value::Map(pairs) = self.eval(values)? else {
            return Err(shape("annotation values", "a map"));
        };
        let values = pairs
            .into_iter()
            .map(|(key, value)| {
                let Value::Str(key) = key else {
                    return Err(shape("annotation member name", "a string"));
                };
                let value = self.annotation_value(value, &key)?;
                Ok((key, value))
            })
            .collect::<Result<BTreeMap<_, _>, EvalError>>()?;
        let mirror = AnnotationMirror {
            annotation_type,
            values,
        };
        Ok(Value::Annotation(UniversalAnnotation::new(mirror, self.domain)))
    }

    fn annotation_value(&self, value: Value, member: &str) -> Result<AnnotationValue, EvalError> {
        Ok(match value {
            Value::Bool(b) => AnnotationValue::Bool(b),
            Value::Int(i) => AnnotationValue::Int(i),
            Value::Str(s) => AnnotationValue::Str(s),
            Value::Type(ty) => AnnotationValue::Type(ty.delegate()),
            Value::Element(element) if element.kind() == ElementKind::EnumConstant => {
                AnnotationValue::EnumConstant(element.delegate())
            }
            Value::List(items) => AnnotationValue::Array(
                items
                    .into_iter()
                    .map(|item| self.annotation_value(item, member))
                    .collect::<Result<_, _>>()?,
            ),
            _ => return Err(shape(format!("value of `{member}`"), "an annotation value")),
        })
    }
}
