use std::{collections::BTreeMap, sync::Arc};

use ecow::EcoString;
use mirra_model::annotation::{AnnotationMirror, AnnotationValue};

use crate::{
    domain::Domain,
    universal::{UniversalElement, UniversalType},
};

/// A native annotation together with the domain it was read from.
#[derive(Clone, Debug)]
pub struct UniversalAnnotation {
    domain: Arc<dyn Domain>,
    mirror: AnnotationMirror,
}

/// An annotation member value with its handles wrapped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UniversalValue {
    Bool(bool),
    Int(i64),
    Str(EcoString),
    Type(UniversalType),
    EnumConstant(UniversalElement),
    Array(Vec<UniversalValue>),
}

impl UniversalAnnotation {
    pub fn new(mirror: AnnotationMirror, domain: &Arc<dyn Domain>) -> Self {
        Self {
            domain: domain.clone(),
            mirror,
        }
    }

    pub fn domain(&self) -> &Arc<dyn Domain> {
        &self.domain
    }

    pub fn mirror(&self) -> &AnnotationMirror {
        &self.mirror
    }

    pub fn annotation_type(&self) -> UniversalType {
        UniversalType::of(self.mirror.annotation_type, &self.domain)
    }

    /// Explicitly given member values, ordered by member name.
    pub fn values(&self) -> BTreeMap<EcoString, UniversalValue> {
        self.mirror
            .values
            .iter()
            .map(|(name, value)| (name.clone(), UniversalValue::of(value, &self.domain)))
            .collect()
    }

    pub fn value(&self, name: &str) -> Option<UniversalValue> {
        self.mirror
            .values
            .get(name)
            .map(|value| UniversalValue::of(value, &self.domain))
    }
}

impl PartialEq for UniversalAnnotation {
    fn eq(&self, other: &Self) -> bool {
        self.domain.same(&*other.domain)
            && self.annotation_type() == other.annotation_type()
            && self.values() == other.values()
    }
}

impl Eq for UniversalAnnotation {}

impl UniversalValue {
    pub fn of(value: &AnnotationValue, domain: &Arc<dyn Domain>) -> Self {
        match value {
            AnnotationValue::Bool(b) => Self::Bool(*b),
            AnnotationValue::Int(i) => Self::Int(*i),
            AnnotationValue::Str(s) => Self::Str(s.clone()),
            AnnotationValue::Type(ty) => Self::Type(UniversalType::of(*ty, domain)),
            AnnotationValue::EnumConstant(constant) => {
                Self::EnumConstant(UniversalElement::of(*constant, domain))
            }
            AnnotationValue::Array(values) => {
                Self::Array(values.iter().map(|v| Self::of(v, domain)).collect())
            }
        }
    }

    pub fn to_native(&self) -> AnnotationValue {
        match self {
            Self::Bool(b) => AnnotationValue::Bool(*b),
            Self::Int(i) => AnnotationValue::Int(*i),
            Self::Str(s) => AnnotationValue::Str(s.clone()),
            Self::Type(ty) => AnnotationValue::Type(ty.delegate()),
            Self::EnumConstant(constant) => AnnotationValue::EnumConstant(constant.delegate()),
            Self::Array(values) => AnnotationValue::Array(values.iter().map(Self::to_native).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use mirra_model::element::ElementKind;

    use super::*;
    use crate::test::{element, platform_domain};

    #[test]
    fn annotations_wrap_their_values() {
        let domain = platform_domain();
        let deprecated = element(&domain, "lang.Deprecated");

        let annotations = deprecated.annotations();
        assert_eq!(annotations.len(), 1);
        let retention = &annotations[0];
        assert_eq!(retention.annotation_type().as_element(), Some(element(&domain, "lang.Retention")));

        let Some(UniversalValue::EnumConstant(policy)) = retention.value("value") else {
            panic!("expected an enum constant");
        };
        assert_eq!(policy.kind(), ElementKind::EnumConstant);
        assert_eq!(policy.simple_name(), "RUNTIME");
        assert_eq!(UniversalValue::EnumConstant(policy.clone()).to_native(), retention.mirror().values["value"]);
    }

    #[test]
    fn equal_annotations_compare_by_content() {
        let domain = platform_domain();
        let deprecated = element(&domain, "lang.Deprecated").annotations();
        let retention = element(&domain, "lang.Retention").annotations();
        assert_eq!(deprecated, retention);
    }
}
