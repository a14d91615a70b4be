//! Relations between types: sameness, erasure, subtyping and member views.

use std::collections::{HashSet, VecDeque};

use crate::{
    element::ElementId,
    error::{ModelError, ModelResult},
    model::Model,
    types::{TypeId, TypeKind, TypeRecord},
};

/// Upper-bound chains deeper than this are treated as cyclic.
const MAX_BOUND_DEPTH: usize = 64;

impl Model {
    /// Structural type sameness.
    ///
    /// Unlike subtyping this is an equivalence: wildcards compare by their
    /// bounds and error types only equal themselves.
    pub fn same_type(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        let (ra, rb) = (self.ty(a), self.ty(b));
        match (&*ra, &*rb) {
            (TypeRecord::Primitive(x), TypeRecord::Primitive(y))
            | (TypeRecord::NoType(x), TypeRecord::NoType(y)) => x == y,
            (TypeRecord::Null, TypeRecord::Null) => true,
            (TypeRecord::Array { component: x }, TypeRecord::Array { component: y }) => {
                self.same_type(*x, *y)
            }
            (
                TypeRecord::Declared {
                    enclosing: ea,
                    element: xa,
                    arguments: aa,
                },
                TypeRecord::Declared {
                    enclosing: eb,
                    element: xb,
                    arguments: ab,
                },
            ) => xa == xb && self.same_type(*ea, *eb) && self.same_types(aa, ab),
            (TypeRecord::TypeVar { element: x, .. }, TypeRecord::TypeVar { element: y, .. }) => {
                x == y
            }
            (
                TypeRecord::Wildcard {
                    extends: ea,
                    super_bound: sa,
                },
                TypeRecord::Wildcard {
                    extends: eb,
                    super_bound: sb,
                },
            ) => self.same_bound(*ea, *eb) && self.same_bound(*sa, *sb),
            (
                TypeRecord::Executable {
                    type_variables: va,
                    parameters: pa,
                    return_type: ra,
                    thrown: ta,
                    ..
                },
                TypeRecord::Executable {
                    type_variables: vb,
                    parameters: pb,
                    return_type: rb,
                    thrown: tb,
                    ..
                },
            ) => {
                va.len() == vb.len()
                    && self.same_types(pa, pb)
                    && self.same_type(*ra, *rb)
                    && self.same_types(ta, tb)
            }
            (TypeRecord::Union(xs), TypeRecord::Union(ys))
            | (TypeRecord::Intersection(xs), TypeRecord::Intersection(ys)) => {
                xs.len() == ys.len()
                    && xs.iter().all(|&x| ys.iter().any(|&y| self.same_type(x, y)))
            }
            _ => false,
        }
    }

    fn same_types(&self, a: &[TypeId], b: &[TypeId]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| self.same_type(x, y))
    }

    fn same_bound(&self, a: Option<TypeId>, b: Option<TypeId>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => self.same_type(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Type erasure. Returns `ty` itself when it is already erased, so
    /// erasing twice yields the same handle.
    pub fn erasure(&mut self, ty: TypeId) -> TypeId {
        self.erasure_at(ty, 0)
    }

    fn erasure_at(&mut self, ty: TypeId, depth: usize) -> TypeId {
        if depth > MAX_BOUND_DEPTH {
            return self.object_type();
        }
        let record = self.ty(ty);
        match &*record {
            TypeRecord::Declared {
                enclosing,
                element,
                arguments,
            } => {
                let erased_enclosing = if *enclosing == TypeId::NONE {
                    TypeId::NONE
                } else {
                    self.erasure_at(*enclosing, depth + 1)
                };
                if arguments.is_empty() && erased_enclosing == *enclosing {
                    ty
                } else {
                    self.alloc_type(TypeRecord::Declared {
                        enclosing: erased_enclosing,
                        element: *element,
                        arguments: Vec::new(),
                    })
                }
            }
            TypeRecord::Array { component } => {
                let erased = self.erasure_at(*component, depth + 1);
                if erased == *component {
                    ty
                } else {
                    self.alloc_type(TypeRecord::Array { component: erased })
                }
            }
            TypeRecord::TypeVar { upper, .. } => self.erasure_at(*upper, depth + 1),
            TypeRecord::Wildcard { extends, .. } => match extends {
                Some(bound) => self.erasure_at(*bound, depth + 1),
                None => self.object_type(),
            },
            TypeRecord::Intersection(bounds) | TypeRecord::Union(bounds) => match bounds.first() {
                Some(&first) => self.erasure_at(first, depth + 1),
                None => ty,
            },
            TypeRecord::Executable {
                receiver,
                parameters,
                return_type,
                thrown,
                ..
            } => {
                let receiver = self.erasure_at(*receiver, depth + 1);
                let parameters = parameters
                    .iter()
                    .map(|&p| self.erasure_at(p, depth + 1))
                    .collect();
                let return_type = self.erasure_at(*return_type, depth + 1);
                let thrown = thrown.iter().map(|&t| self.erasure_at(t, depth + 1)).collect();
                self.alloc_type(TypeRecord::Executable {
                    type_variables: Vec::new(),
                    receiver,
                    parameters,
                    return_type,
                    thrown,
                })
            }
            _ => ty,
        }
    }

    pub fn is_subtype(&mut self, a: TypeId, b: TypeId) -> bool {
        self.is_subtype_at(a, b, 0)
    }

    fn is_subtype_at(&mut self, a: TypeId, b: TypeId, depth: usize) -> bool {
        if depth > MAX_BOUND_DEPTH {
            return false;
        }
        if self.same_type(a, b) {
            return true;
        }
        let (ra, rb) = (self.ty(a), self.ty(b));
        match (&*ra, &*rb) {
            (TypeRecord::Error { .. }, _) | (_, TypeRecord::Error { .. }) => true,
            (TypeRecord::Primitive(x), TypeRecord::Primitive(y)) => x.widens_to(*y),
            (TypeRecord::Null, target) => target.kind().is_reference(),
            (_, TypeRecord::Intersection(bounds)) => {
                bounds.iter().all(|&bound| self.is_subtype_at(a, bound, depth + 1))
            }
            (TypeRecord::Intersection(bounds), _) => {
                bounds.iter().any(|&bound| self.is_subtype_at(bound, b, depth + 1))
            }
            (TypeRecord::Union(alternatives), _) => {
                alternatives.iter().all(|&alt| self.is_subtype_at(alt, b, depth + 1))
            }
            (TypeRecord::TypeVar { upper, .. }, _) => self.is_subtype_at(*upper, b, depth + 1),
            (_, TypeRecord::TypeVar { lower, .. }) if *lower != TypeId::NULL => {
                self.is_subtype_at(a, *lower, depth + 1)
            }
            (TypeRecord::Array { component: ca }, TypeRecord::Array { component: cb }) => {
                let (ka, kb) = (self.type_kind(*ca), self.type_kind(*cb));
                if ka.is_primitive() || kb.is_primitive() {
                    ka == kb
                } else {
                    self.is_subtype_at(*ca, *cb, depth + 1)
                }
            }
            (TypeRecord::Array { .. }, TypeRecord::Declared { element, .. }) => {
                Some(*element) == self.object_element()
            }
            (TypeRecord::Declared { .. }, TypeRecord::Declared { element, arguments, .. }) => {
                let Some(view) = self.as_super(a, *element) else {
                    return false;
                };
                if arguments.is_empty() {
                    return true;
                }
                let actual = self.ty(view).arguments().to_vec();
                // Unchecked conversion from a raw type.
                if actual.is_empty() {
                    return true;
                }
                actual.len() == arguments.len()
                    && actual
                        .iter()
                        .zip(arguments)
                        .all(|(&s, &t)| self.contains(t, s, depth + 1))
            }
            _ => false,
        }
    }

    /// Whether type argument `t` contains type argument `s`.
    fn contains(&mut self, t: TypeId, s: TypeId, depth: usize) -> bool {
        let target = self.ty(t);
        let TypeRecord::Wildcard {
            extends,
            super_bound,
        } = &*target
        else {
            return self.same_type(t, s);
        };
        let source = self.ty(s);
        match (extends, super_bound) {
            (Some(bound), _) => {
                let upper = match &*source {
                    TypeRecord::Wildcard {
                        extends: Some(upper),
                        ..
                    } => *upper,
                    TypeRecord::Wildcard { .. } => self.object_type(),
                    _ => s,
                };
                self.is_subtype_at(upper, *bound, depth)
            }
            (None, Some(bound)) => match &*source {
                TypeRecord::Wildcard {
                    super_bound: Some(lower),
                    ..
                } => self.is_subtype_at(*bound, *lower, depth),
                TypeRecord::Wildcard { .. } => false,
                _ => self.is_subtype_at(*bound, s, depth),
            },
            (None, None) => true,
        }
    }

    /// Assignability without boxing: subtyping plus unchecked conversion,
    /// which [`Model::is_subtype`] already admits.
    pub fn is_assignable(&mut self, a: TypeId, b: TypeId) -> bool {
        self.is_subtype(a, b)
    }

    /// The supertype of `ty` whose element is `element`, with type
    /// arguments substituted along the way.
    pub fn as_super(&mut self, ty: TypeId, element: ElementId) -> Option<TypeId> {
        let mut queue = VecDeque::from([ty]);
        let mut seen = HashSet::new();
        while let Some(current) = queue.pop_front() {
            let record = self.ty(current);
            match &*record {
                TypeRecord::Declared { element: e, .. } => {
                    if *e == element {
                        return Some(current);
                    }
                    if !seen.insert(*e) {
                        continue;
                    }
                }
                TypeRecord::TypeVar { .. } | TypeRecord::Intersection(_) => {}
                _ => continue,
            }
            queue.extend(self.direct_supertypes(current));
        }
        None
    }

    /// Immediate supertypes, superclass first, with the declared type's
    /// arguments substituted. Raw types have erased supertypes.
    pub fn direct_supertypes(&mut self, ty: TypeId) -> Vec<TypeId> {
        let record = self.ty(ty);
        match &*record {
            TypeRecord::Declared {
                element, arguments, ..
            } => {
                let declaration = self.complete(*element);
                if !declaration.kind.is_type() {
                    return Vec::new();
                }
                let mut supers = Vec::with_capacity(declaration.interfaces.len() + 1);
                if declaration.superclass != TypeId::NONE {
                    supers.push(declaration.superclass);
                } else if declaration.kind.is_interface() {
                    let object = self.object_type();
                    if object != TypeId::NONE {
                        supers.push(object);
                    }
                }
                supers.extend(declaration.interfaces.iter().copied());

                if declaration.type_parameters.is_empty() {
                    supers
                } else if arguments.is_empty() {
                    supers.into_iter().map(|s| self.erasure(s)).collect()
                } else {
                    supers
                        .into_iter()
                        .map(|s| self.substitute(s, &declaration.type_parameters, arguments))
                        .collect()
                }
            }
            TypeRecord::TypeVar { upper, .. } => match &*self.ty(*upper) {
                TypeRecord::Intersection(bounds) => bounds.clone(),
                _ => vec![*upper],
            },
            TypeRecord::Intersection(bounds) => bounds.clone(),
            TypeRecord::Array { .. } => {
                let object = self.object_type();
                if object == TypeId::NONE { Vec::new() } else { vec![object] }
            }
            _ => Vec::new(),
        }
    }

    /// Replaces the type variables declared by `from` with `to`.
    pub fn substitute(&mut self, ty: TypeId, from: &[ElementId], to: &[TypeId]) -> TypeId {
        if from.is_empty() {
            return ty;
        }
        let record = self.ty(ty);
        match &*record {
            TypeRecord::TypeVar { element, .. } => from
                .iter()
                .position(|param| param == element)
                .and_then(|index| to.get(index).copied())
                .unwrap_or(ty),
            TypeRecord::Declared {
                enclosing,
                element,
                arguments,
            } => {
                let substituted: Vec<TypeId> =
                    arguments.iter().map(|&a| self.substitute(a, from, to)).collect();
                if substituted == *arguments {
                    ty
                } else {
                    self.alloc_type(TypeRecord::Declared {
                        enclosing: *enclosing,
                        element: *element,
                        arguments: substituted,
                    })
                }
            }
            TypeRecord::Array { component } => {
                let substituted = self.substitute(*component, from, to);
                if substituted == *component {
                    ty
                } else {
                    self.alloc_type(TypeRecord::Array {
                        component: substituted,
                    })
                }
            }
            TypeRecord::Wildcard {
                extends,
                super_bound,
            } => {
                let extends = extends.map(|b| self.substitute(b, from, to));
                let super_bound = super_bound.map(|b| self.substitute(b, from, to));
                self.alloc_type(TypeRecord::Wildcard {
                    extends,
                    super_bound,
                })
            }
            TypeRecord::Executable {
                type_variables,
                receiver,
                parameters,
                return_type,
                thrown,
            } => {
                let parameters = parameters.iter().map(|&p| self.substitute(p, from, to)).collect();
                let return_type = self.substitute(*return_type, from, to);
                let thrown = thrown.iter().map(|&t| self.substitute(t, from, to)).collect();
                let receiver = self.substitute(*receiver, from, to);
                self.alloc_type(TypeRecord::Executable {
                    type_variables: type_variables.clone(),
                    receiver,
                    parameters,
                    return_type,
                    thrown,
                })
            }
            TypeRecord::Intersection(bounds) => {
                let bounds = bounds.iter().map(|&b| self.substitute(b, from, to)).collect();
                self.alloc_type(TypeRecord::Intersection(bounds))
            }
            TypeRecord::Union(alternatives) => {
                let alternatives = alternatives.iter().map(|&a| self.substitute(a, from, to)).collect();
                self.alloc_type(TypeRecord::Union(alternatives))
            }
            _ => ty,
        }
    }

    /// The type of `element` viewed as a member of `containing`.
    pub fn as_member_of(&mut self, containing: TypeId, element: ElementId) -> ModelResult<TypeId> {
        if self.type_kind(containing) != TypeKind::Declared {
            return Err(ModelError::illegal(format!(
                "{} is not a declared type",
                self.display(containing)
            )));
        }
        let member = self.complete(element);
        let Some(owner) = member.enclosing else {
            return Ok(member.as_type);
        };
        let owner = self.complete(owner);
        if member.is_static() || !owner.kind.is_type() {
            return Ok(member.as_type);
        }

        let Some(view) = self.as_super(containing, owner.id) else {
            return Err(ModelError::illegal(format!(
                "`{}` is not a member of {}",
                member.simple_name,
                self.display(containing)
            )));
        };
        let arguments = self.ty(view).arguments().to_vec();
        if owner.type_parameters.is_empty() {
            Ok(member.as_type)
        } else if arguments.is_empty() {
            Ok(self.erasure(member.as_type))
        } else {
            Ok(self.substitute(member.as_type, &owner.type_parameters, &arguments))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        element::ElementKind,
        test::{declared, platform_model},
        types::{TypeId, TypeKind, TypeRecord},
    };

    #[test]
    fn erasure_is_idempotent() {
        let mut model = platform_model();
        let string = declared(&mut model, "lang.String", &[]);
        let list = declared(&mut model, "util.List", &[string]);

        let erased = model.erasure(list);
        assert!(model.ty(erased).arguments().is_empty());
        assert_eq!(model.erasure(erased), erased);
        assert_eq!(model.erasure(string), string);

        let int = TypeId::primitive(TypeKind::Int).unwrap();
        assert_eq!(model.erasure(int), int);
    }

    #[test]
    fn type_variables_erase_to_their_bound() {
        let mut model = platform_model();
        let comparable = model.type_element("lang.Comparable").unwrap();
        let t = model.complete(comparable).type_parameters[0];
        let var = model.complete(t).as_type;

        let erased = model.erasure(var);
        assert_eq!(model.ty(erased).element(), model.object_element());
    }

    #[test]
    fn subtyping_follows_declared_supertypes() {
        let mut model = platform_model();
        let string = declared(&mut model, "lang.String", &[]);
        let object = model.object_type();
        let array_list = declared(&mut model, "util.ArrayList", &[string]);
        let list_of_string = declared(&mut model, "util.List", &[string]);
        let list_of_object = declared(&mut model, "util.List", &[object]);
        let raw_list = declared(&mut model, "util.List", &[]);

        assert!(model.is_subtype(array_list, list_of_string));
        assert!(model.is_subtype(array_list, raw_list));
        assert!(!model.is_subtype(list_of_string, list_of_object));
        assert!(model.is_subtype(string, object));
        assert!(!model.is_subtype(object, string));

        let number = declared(&mut model, "lang.Number", &[]);
        let extends_number = model.wildcard_type(Some(number), None).unwrap();
        let list_of_some_number = declared(&mut model, "util.List", &[extends_number]);
        let integer = declared(&mut model, "lang.Integer", &[]);
        let list_of_integer = declared(&mut model, "util.List", &[integer]);
        assert!(model.is_assignable(list_of_integer, list_of_some_number));
        assert!(!model.is_assignable(list_of_string, list_of_some_number));
    }

    #[test]
    fn primitives_widen() {
        let mut model = platform_model();
        let int = TypeId::primitive(TypeKind::Int).unwrap();
        let long = TypeId::primitive(TypeKind::Long).unwrap();
        assert!(model.is_subtype(int, long));
        assert!(!model.is_subtype(long, int));
    }

    #[test]
    fn direct_supertypes_substitute_arguments() {
        let mut model = platform_model();
        let string = declared(&mut model, "lang.String", &[]);
        let array_list = declared(&mut model, "util.ArrayList", &[string]);

        let supers = model.direct_supertypes(array_list);
        let list = model.type_element("util.List");
        let list_view = supers
            .iter()
            .copied()
            .find(|&s| model.ty(s).element() == list)
            .unwrap();
        assert_eq!(model.ty(list_view).arguments(), &[string]);
    }

    #[test]
    fn members_are_viewed_through_the_containing_type() {
        let mut model = platform_model();
        let string = declared(&mut model, "lang.String", &[]);
        let list_of_string = declared(&mut model, "util.ArrayList", &[string]);
        let list = model.type_element("util.List").unwrap();
        let get = model
            .complete(list)
            .enclosed
            .iter()
            .copied()
            .find(|&m| model.record(m).is_some_and(|r| r.kind == ElementKind::Method && r.simple_name == "get"))
            .unwrap();

        let member = model.as_member_of(list_of_string, get).unwrap();
        let TypeRecord::Executable { return_type, .. } = &*model.ty(member) else {
            panic!("expected an executable type");
        };
        assert!(model.same_type(*return_type, string));

        let int = TypeId::primitive(TypeKind::Int).unwrap();
        assert!(model.as_member_of(int, get).is_err());
    }

    #[test]
    fn wildcards_compare_structurally() {
        let mut model = platform_model();
        let number = declared(&mut model, "lang.Number", &[]);
        let a = model.wildcard_type(Some(number), None).unwrap();
        let b = model.wildcard_type(Some(number), None).unwrap();
        let c = model.wildcard_type(None, Some(number)).unwrap();
        assert!(model.same_type(a, b));
        assert!(!model.same_type(a, c));
    }
}
