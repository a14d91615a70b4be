use std::time::Duration;

use mirra_model::compiler::CompileOptions;
use serde::{Deserialize, Serialize};

/// Settings of the runtime model bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Name of the thread hosting the model.
    pub thread_name: String,
    /// How long `get` waits for the model. Waits forever when unset.
    pub init_timeout_ms: Option<u64>,
    pub compile: CompileOptions,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            thread_name: "mirra-runtime".to_owned(),
            init_timeout_ms: None,
            compile: CompileOptions {
                name: "mirra-runtime".to_owned(),
                ..CompileOptions::default()
            },
        }
    }
}

impl RuntimeConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn init_timeout(&self) -> Option<Duration> {
        self.init_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = RuntimeConfig::from_json(r#"{ "init_timeout_ms": 250 }"#).unwrap();

        assert_eq!(config.thread_name, "mirra-runtime");
        assert_eq!(config.init_timeout(), Some(Duration::from_millis(250)));
        assert!(config.compile.platform);
        assert!(!config.compile.analyze);
        assert_eq!(RuntimeConfig::default().init_timeout(), None);
    }
}
