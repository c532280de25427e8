//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object (or no config at
//! all) yields the standard engine: direct-edge subtyping, single-brand
//! casts, and the stdlib error brand.

use serde::Deserialize;

use crate::types::EvalError;

/// Brand of `{message}` error values unless a bundle overrides it.
pub const DEFAULT_ERROR_BRAND: &str = "org.accordproject.ergo.stdlib.ErgoErrorResponse";

/// How the brand registry answers subtype queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subtyping {
    /// Only edges listed in the bundle count.
    #[default]
    Declared,
    /// The reflexive-transitive closure of the listed edges, cached at load.
    Transitive,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub subtyping: Subtyping,
    /// Allow casts against several target brands at once (conjunction).
    pub multi_brand_cast: bool,
    /// Maximum expression nesting evaluated before aborting.
    pub max_depth: usize,
    pub error_brand: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            subtyping: Subtyping::Declared,
            multi_brand_cast: false,
            max_depth: 512,
            error_brand: DEFAULT_ERROR_BRAND.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(v: &serde_json::Value) -> Result<EngineConfig, EvalError> {
        let config: EngineConfig =
            serde_json::from_value(v.clone()).map_err(|e| EvalError::Config {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<EngineConfig, EvalError> {
        let v: serde_json::Value = serde_json::from_str(s).map_err(|e| EvalError::Config {
            message: e.to_string(),
        })?;
        EngineConfig::from_json(&v)
    }

    pub(crate) fn validate(&self) -> Result<(), EvalError> {
        if self.max_depth == 0 {
            return Err(EvalError::Config {
                message: "max_depth must be at least 1".to_string(),
            });
        }
        if self.error_brand.is_empty() {
            return Err(EvalError::Config {
                message: "error_brand must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
