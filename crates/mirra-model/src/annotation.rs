use std::collections::BTreeMap;

use ecow::EcoString;

use crate::{element::ElementId, types::TypeId};

/// A resolved annotation attached to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationMirror {
    pub annotation_type: TypeId,
    /// Explicitly given values, keyed by annotation element name.
    pub values: BTreeMap<EcoString, AnnotationValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    Bool(bool),
    Int(i64),
    Str(EcoString),
    Type(TypeId),
    EnumConstant(ElementId),
    Array(Vec<AnnotationValue>),
}
