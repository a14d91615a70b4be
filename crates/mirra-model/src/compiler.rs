//! A miniature compilation run that only enters declarations and hands the
//! resulting model to a listener.

use std::sync::Arc;

use ecow::EcoString;
use log::{debug, info};
use mirra_utils::errors::Errors;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{
    SharedModel,
    decl::CompilationUnit,
    element::ElementId,
    error::CompileError,
    model::Model,
    platform,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub name: String,
    /// Enter the built-in `lang` and `util` declarations.
    pub platform: bool,
    /// Complete every entered type and reject erroneous ones. When false
    /// the run does no real compiling.
    pub analyze: bool,
    pub units: Vec<CompilationUnit>,
    /// Complete every entered type before the model is handed out.
    pub eager_completion: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            name: "mirra".to_owned(),
            platform: true,
            analyze: false,
            units: Vec::new(),
            eager_completion: false,
        }
    }
}

impl CompileOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Observer of a compilation's phases.
pub trait TaskListener {
    /// Called once declarations are entered, before the model is shared.
    fn entered(&mut self, _types: usize) {}

    /// Called when the model becomes available. The model stays valid for
    /// as long as anyone holds the handle, but the run does not return
    /// before this call does.
    fn model_ready(&mut self, model: &SharedModel);
}

impl<F> TaskListener for F
where
    F: FnMut(&SharedModel),
{
    fn model_ready(&mut self, model: &SharedModel) {
        self(model)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileSummary {
    pub name: String,
    pub entered: usize,
    pub completed: usize,
}

#[derive(Debug, Clone)]
pub struct Compilation {
    options: CompileOptions,
}

impl Compilation {
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn run(&self, listener: &mut dyn TaskListener) -> Result<CompileSummary, CompileError> {
        let name = self.options.name.clone();
        info!("compilation `{name}` starting");

        let mut model = Model::new();
        let platform_units = if self.options.platform {
            platform::units()
        } else {
            Vec::new()
        };

        let mut diagnostics = Errors::new();
        let mut entered = 0;
        for unit in platform_units.iter().chain(&self.options.units) {
            match model.declare_unit(unit) {
                Ok(ids) => entered += ids.len(),
                Err(errors) => diagnostics.extend(errors),
            }
        }
        if diagnostics.has_errors() {
            return Err(CompileError::Enter { name, diagnostics });
        }
        listener.entered(entered);

        if self.options.eager_completion || self.options.analyze {
            let types: Vec<ElementId> = model.type_elements().collect();
            let erroneous: Vec<EcoString> = types
                .into_iter()
                .map(|ty| model.complete(ty))
                .filter(|record| record.erroneous)
                .map(|record| record.qualified_name.clone())
                .collect();
            if self.options.analyze && !erroneous.is_empty() {
                return Err(CompileError::Analyze {
                    name,
                    elements: erroneous,
                });
            }
        }

        let completed = model.completions();
        let shared: SharedModel = Arc::new(Mutex::new(model));
        debug!("compilation `{name}` model ready");
        listener.model_ready(&shared);
        debug!("compilation `{name}` tearing down");

        Ok(CompileSummary {
            name,
            entered,
            completed,
        })
    }
}
