use crate::{model::Model, types::TypeId};

pub fn platform_model() -> Model {
    Model::with_platform().unwrap()
}

/// A usage of the named type element with the given arguments.
pub fn declared(model: &mut Model, name: &str, arguments: &[TypeId]) -> TypeId {
    let element = model
        .type_element(name)
        .unwrap_or_else(|| panic!("no type element `{name}`"));
    model.declared_type(None, element, arguments).unwrap()
}
