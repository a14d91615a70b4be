// Id { u32 }
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name {
            id: u32,
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "#{}", self.id)
            }
        }

        impl $name {
            /// Panics when `index` does not fit the `u32` handle space; arenas
            /// are limited to `u32::MAX + 1` entries.
            pub const fn from_usize(index: usize) -> Self {
                match Self::try_from_usize(index) {
                    Some(id) => id,
                    None => panic!(concat!(stringify!($name), " space exhausted")),
                }
            }

            pub const fn try_from_usize(index: usize) -> Option<Self> {
                if index > u32::MAX as usize {
                    None
                } else {
                    Some(Self { id: index as u32 })
                }
            }

            pub fn as_usize(&self) -> usize {
                self.id as usize
            }

            pub fn id(&self) -> u32 {
                self.id
            }
        }
    };
}

#[cfg(test)]
mod tests {
    crate::define_id!(
        /// Only used to exercise the macro.
        SampleId
    );

    #[test]
    fn ids_round_trip_through_usize() {
        let id = SampleId::from_usize(7);
        assert_eq!(id.as_usize(), 7);
        assert_eq!(id.id(), 7);
        assert_eq!(format!("{id:?}"), "SampleId(7)");
        assert_eq!(id.to_string(), "#7");
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn out_of_range_indices_do_not_alias() {
        let last = u32::MAX as usize;
        assert_eq!(SampleId::try_from_usize(last).map(|id| id.id()), Some(u32::MAX));
        assert_eq!(SampleId::try_from_usize(last + 1), None);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    #[should_panic(expected = "SampleId space exhausted")]
    fn exhausting_the_handle_space_panics() {
        SampleId::from_usize(u32::MAX as usize + 1);
    }

    #[test]
    fn ids_order_by_index() {
        let id = SampleId::from_usize(3);
        assert!(SampleId::from_usize(2) < id);
    }
}
