//! Registry configuration.

use lineage_common::limits::{
    DEFAULT_MARKER_PREFIX, DEFAULT_ROOT_NAME, MAX_CONSTRUCTOR_DEPTH, MAX_HIERARCHY_DEPTH,
};
use serde::{Deserialize, Serialize};

use crate::errors::{ClassError, Result};

/// Options fixed when a `ClassRegistry` is created.
///
/// Every field is optional in JSON form:
///
/// ```json
/// { "rootName": "Object", "markerPrefix": "Any", "maxConstructorDepth": 16 }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryOptions {
    /// Name of the root class.
    pub root_name: String,
    /// Prepended to a class name to name its abstract marker.
    pub marker_prefix: String,
    pub max_constructor_depth: u32,
    pub max_hierarchy_depth: u32,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            marker_prefix: DEFAULT_MARKER_PREFIX.to_string(),
            max_constructor_depth: MAX_CONSTRUCTOR_DEPTH,
            max_hierarchy_depth: MAX_HIERARCHY_DEPTH,
        }
    }
}

impl RegistryOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if !crate::compiler::is_identifier(&self.root_name) {
            return Err(ClassError::InvalidOptions(format!(
                "root name `{}` is not an identifier",
                self.root_name
            )));
        }
        // An empty prefix would give every marker its class's name.
        if !crate::compiler::is_identifier(&self.marker_prefix) {
            return Err(ClassError::InvalidOptions(format!(
                "marker prefix `{}` is not an identifier",
                self.marker_prefix
            )));
        }
        if self.max_constructor_depth == 0 || self.max_hierarchy_depth == 0 {
            return Err(ClassError::InvalidOptions(
                "depth limits must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
