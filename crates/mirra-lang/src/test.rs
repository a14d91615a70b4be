use std::sync::Arc;

use mirra_model::{SharedModel, model::Model};
use parking_lot::Mutex;

use crate::{
    domain::{Domain, ModelDomain},
    universal::{UniversalElement, UniversalType},
};

pub fn shared_platform() -> SharedModel {
    Arc::new(Mutex::new(Model::with_platform().unwrap()))
}

/// A describable domain over a fresh platform model.
pub fn platform_domain() -> Arc<dyn Domain> {
    ModelDomain::runtime(shared_platform()).into_dyn()
}

/// A domain over a fresh platform model that has no recipe.
pub fn opaque_domain() -> Arc<dyn Domain> {
    ModelDomain::new(shared_platform()).into_dyn()
}

pub fn element(domain: &Arc<dyn Domain>, name: &str) -> UniversalElement {
    let id = domain
        .type_element(name)
        .unwrap_or_else(|| panic!("no type element `{name}`"));
    UniversalElement::of(id, domain)
}

/// A usage of the named type element with the given arguments.
pub fn declared(domain: &Arc<dyn Domain>, name: &str, arguments: &[&UniversalType]) -> UniversalType {
    let element = element(domain, name);
    let arguments: Vec<_> = arguments.iter().map(|arg| arg.delegate()).collect();
    let ty = domain
        .declared_type(None, element.delegate(), &arguments)
        .unwrap();
    UniversalType::of(ty, domain)
}
