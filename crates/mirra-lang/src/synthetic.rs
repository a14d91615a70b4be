//! Caller-built elements and annotations that live outside any domain.
//!
//! Synthetic nodes are plain shared data. Their annotation lists stay mutable
//! after construction, so an element may end up annotated with an annotation
//! whose type is the element itself. Such graphs are reference counted and
//! stay alive until a holder breaks the cycle with [`Annotations::clear`].

use std::{
    collections::{BTreeMap, HashSet, VecDeque},
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use ecow::EcoString;
use mirra_model::element::ElementKind;
use parking_lot::RwLock;

use crate::{
    describe::{Describe, Descriptor},
    universal::UniversalElement,
};

/// A fabricated element. Equality is node identity.
#[derive(Clone)]
pub struct SyntheticElement(Arc<ElementNode>);

struct ElementNode {
    name: EcoString,
    kind: ElementKind,
    annotations: Annotations,
}

/// Live handle to the annotation list of a synthetic element.
///
/// Every clone observes the same list.
#[derive(Clone, Default)]
pub struct Annotations(Arc<RwLock<Vec<SyntheticAnnotation>>>);

/// A fabricated annotation whose type is a synthetic element.
#[derive(Clone)]
pub struct SyntheticAnnotation(Arc<AnnotationNode>);

struct AnnotationNode {
    annotation_type: SyntheticElement,
    values: RwLock<BTreeMap<EcoString, SyntheticValue>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntheticValue {
    Bool(bool),
    Int(i64),
    Str(EcoString),
    Element(SyntheticElement),
    Annotation(SyntheticAnnotation),
    Array(Vec<SyntheticValue>),
}

impl SyntheticElement {
    pub fn new(name: impl Into<EcoString>, kind: ElementKind) -> Self {
        Self(Arc::new(ElementNode {
            name: name.into(),
            kind,
            annotations: Annotations::default(),
        }))
    }

    pub fn name(&self) -> &EcoString {
        &self.0.name
    }

    pub fn kind(&self) -> ElementKind {
        self.0.kind
    }

    /// The live annotation list, not a copy.
    pub fn annotations(&self) -> &Annotations {
        &self.0.annotations
    }

    /// Name-and-kind comparison against a domain element.
    pub fn matches(&self, element: &UniversalElement) -> bool {
        self.kind() == element.kind() && *element.simple_name() == self.0.name
    }

    /// Every element reachable from this one through annotation types and
    /// element-valued annotation members, starting with this element. Each
    /// element and annotation is visited once, so cyclic graphs terminate.
    pub fn reachable(&self) -> Vec<SyntheticElement> {
        let mut elements = HashSet::new();
        let mut annotations = HashSet::new();
        let mut queue = VecDeque::from([Node::Element(self.clone())]);
        let mut reachable = Vec::new();

        while let Some(node) = queue.pop_front() {
            match node {
                Node::Element(element) => {
                    if !elements.insert(element.id()) {
                        continue;
                    }
                    queue.extend(element.annotations().snapshot().into_iter().map(Node::Annotation));
                    reachable.push(element);
                }
                Node::Annotation(annotation) => {
                    if !annotations.insert(annotation.id()) {
                        continue;
                    }
                    queue.push_back(Node::Element(annotation.annotation_type().clone()));
                    queue.extend(annotation.values().into_values().map(Node::Value));
                }
                Node::Value(SyntheticValue::Element(element)) => queue.push_back(Node::Element(element)),
                Node::Value(SyntheticValue::Annotation(annotation)) => {
                    queue.push_back(Node::Annotation(annotation))
                }
                Node::Value(SyntheticValue::Array(values)) => {
                    queue.extend(values.into_iter().map(Node::Value))
                }
                Node::Value(SyntheticValue::Bool(_) | SyntheticValue::Int(_) | SyntheticValue::Str(_)) => {}
            }
        }
        reachable
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for SyntheticElement {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SyntheticElement {}

impl Hash for SyntheticElement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for SyntheticElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntheticElement")
            .field("name", &self.0.name)
            .field("kind", &self.0.kind)
            .field("annotations", &self.0.annotations.len())
            .finish()
    }
}

impl fmt::Display for SyntheticElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// Synthetic nodes have no provenance in a domain.
impl Describe for SyntheticElement {
    fn describe(&self) -> Option<Descriptor> {
        None
    }
}

impl Annotations {
    pub fn push(&self, annotation: SyntheticAnnotation) {
        self.0.write().push(annotation);
    }

    /// Detaches every annotation, breaking any cycle through this list.
    pub fn clear(&self) {
        self.0.write().clear();
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }

    /// The annotations attached right now.
    pub fn snapshot(&self) -> Vec<SyntheticAnnotation> {
        self.0.read().clone()
    }
}

impl fmt::Debug for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.read().iter().map(|a| a.annotation_type()))
            .finish()
    }
}

impl SyntheticAnnotation {
    pub fn new(annotation_type: SyntheticElement) -> Self {
        Self(Arc::new(AnnotationNode {
            annotation_type,
            values: RwLock::default(),
        }))
    }

    pub fn with_value(self, name: impl Into<EcoString>, value: SyntheticValue) -> Self {
        self.set_value(name, value);
        self
    }

    pub fn annotation_type(&self) -> &SyntheticElement {
        &self.0.annotation_type
    }

    /// Sets a member value; visible to every holder of this annotation.
    pub fn set_value(&self, name: impl Into<EcoString>, value: SyntheticValue) {
        self.0.values.write().insert(name.into(), value);
    }

    pub fn value(&self, name: &str) -> Option<SyntheticValue> {
        self.0.values.read().get(name).cloned()
    }

    pub fn values(&self) -> BTreeMap<EcoString, SyntheticValue> {
        self.0.values.read().clone()
    }
}

impl SyntheticAnnotation {
    fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for SyntheticAnnotation {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SyntheticAnnotation {}

impl Hash for SyntheticAnnotation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for SyntheticAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0.annotation_type)
    }
}

impl Describe for SyntheticAnnotation {
    fn describe(&self) -> Option<Descriptor> {
        None
    }
}

/// Work item of [`SyntheticElement::reachable`].
enum Node {
    Element(SyntheticElement),
    Annotation(SyntheticAnnotation),
    Value(SyntheticValue),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{element, platform_domain};

    #[test]
    fn an_element_can_be_annotated_with_itself() {
        let marker = SyntheticElement::new("Marker", ElementKind::AnnotationType);
        let annotations = marker.annotations().clone();
        assert!(annotations.is_empty());

        marker.annotations().push(SyntheticAnnotation::new(marker.clone()));

        assert_eq!(annotations.len(), 1);
        let annotation = &marker.annotations().snapshot()[0];
        assert_eq!(annotation.annotation_type(), &marker);
        assert_eq!(marker.reachable(), vec![marker.clone()]);
    }

    #[test]
    fn traversal_terminates_on_indirect_cycles() {
        let a = SyntheticElement::new("A", ElementKind::AnnotationType);
        let b = SyntheticElement::new("B", ElementKind::AnnotationType);
        let c = SyntheticElement::new("C", ElementKind::Class);

        a.annotations().push(SyntheticAnnotation::new(b.clone()));
        b.annotations().push(
            SyntheticAnnotation::new(a.clone())
                .with_value("target", SyntheticValue::Array(vec![SyntheticValue::Element(c.clone())])),
        );

        assert_eq!(a.reachable(), vec![a.clone(), b.clone(), c]);
        assert_eq!(b.reachable()[1], a);
    }

    #[test]
    fn traversal_terminates_on_annotations_valued_with_themselves() {
        let marker = SyntheticElement::new("Marker", ElementKind::AnnotationType);
        let target = SyntheticElement::new("Target", ElementKind::Class);
        let annotation = SyntheticAnnotation::new(marker.clone());
        annotation.set_value("self", SyntheticValue::Annotation(annotation.clone()));
        annotation.set_value(
            "nested",
            SyntheticValue::Array(vec![
                SyntheticValue::Annotation(annotation.clone()),
                SyntheticValue::Element(target.clone()),
            ]),
        );
        marker.annotations().push(annotation.clone());

        assert_eq!(marker.reachable(), vec![marker.clone(), target]);

        // Breaks the value cycle so both nodes can be reclaimed.
        annotation.set_value("self", SyntheticValue::Bool(false));
        annotation.set_value("nested", SyntheticValue::Array(Vec::new()));
        marker.annotations().clear();
    }

    #[test]
    fn clearing_breaks_the_cycle() {
        let marker = SyntheticElement::new("Marker", ElementKind::AnnotationType);
        marker.annotations().push(SyntheticAnnotation::new(marker.clone()));
        let weak = Arc::downgrade(&marker.0);

        marker.annotations().clear();
        drop(marker);

        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn values_are_shared_between_holders() {
        let target = SyntheticElement::new("Target", ElementKind::AnnotationType);
        let annotation = SyntheticAnnotation::new(target.clone());
        let other = annotation.clone();

        annotation.set_value("value", SyntheticValue::Int(3));

        assert_eq!(other.value("value"), Some(SyntheticValue::Int(3)));
        assert_eq!(other, annotation);
        assert_ne!(SyntheticAnnotation::new(target), annotation);
    }

    #[test]
    fn synthetic_nodes_match_domain_elements_by_name() {
        let domain = platform_domain();
        let string = element(&domain, "lang.String");

        assert!(SyntheticElement::new("String", ElementKind::Class).matches(&string));
        assert!(!SyntheticElement::new("String", ElementKind::Interface).matches(&string));
        assert!(!SyntheticElement::new("Object", ElementKind::Class).matches(&string));
        assert_eq!(SyntheticElement::new("String", ElementKind::Class).describe(), None);
    }
}
