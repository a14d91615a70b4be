mod kind;
mod record;

pub use kind::*;
pub use record::*;

mirra_utils::define_id!(
    /// Handle of a type inside a [`crate::model::Model`].
    TypeId
);

/// Types every model allocates up front, in this order.
impl TypeId {
    pub const NONE: Self = Self::from_usize(0);
    pub const VOID: Self = Self::from_usize(1);
    pub const PACKAGE: Self = Self::from_usize(2);
    pub const MODULE: Self = Self::from_usize(3);
    pub const NULL: Self = Self::from_usize(4);

    const FIRST_PRIMITIVE: usize = 5;

    /// The preallocated handle of a primitive type.
    pub fn primitive(kind: TypeKind) -> Option<Self> {
        TypeKind::PRIMITIVES
            .iter()
            .position(|&k| k == kind)
            .map(|offset| Self::from_usize(Self::FIRST_PRIMITIVE + offset))
    }

    /// The preallocated handle of a no-type.
    pub fn no_type(kind: TypeKind) -> Option<Self> {
        match kind {
            TypeKind::None => Some(Self::NONE),
            TypeKind::Void => Some(Self::VOID),
            TypeKind::Package => Some(Self::PACKAGE),
            TypeKind::Module => Some(Self::MODULE),
            _ => None,
        }
    }

    pub(crate) fn preallocated() -> impl Iterator<Item = TypeRecord> {
        [
            TypeRecord::NoType(TypeKind::None),
            TypeRecord::NoType(TypeKind::Void),
            TypeRecord::NoType(TypeKind::Package),
            TypeRecord::NoType(TypeKind::Module),
            TypeRecord::Null,
        ]
        .into_iter()
        .chain(TypeKind::PRIMITIVES.into_iter().map(TypeRecord::Primitive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preallocated_handles_match_their_records() {
        let records: Vec<_> = TypeId::preallocated().collect();

        assert_eq!(records[TypeId::NONE.as_usize()].kind(), TypeKind::None);
        assert_eq!(records[TypeId::VOID.as_usize()].kind(), TypeKind::Void);
        assert_eq!(records[TypeId::NULL.as_usize()].kind(), TypeKind::Null);
        for kind in TypeKind::PRIMITIVES {
            let id = TypeId::primitive(kind).unwrap();
            assert_eq!(records[id.as_usize()].kind(), kind);
        }
        assert_eq!(TypeId::primitive(TypeKind::Declared), None);
    }
}
