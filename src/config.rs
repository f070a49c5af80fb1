use serde::Deserialize;

use crate::error::ConfigError;
use crate::grammar::{LSystem, RuleRecord, SymbolEncoding};
use crate::mesh::MeshParams;
use crate::skeleton::TurtleParams;

fn default_seed() -> u64 {
    42
}

/// Rule table section of a tree document
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GrammarConfig {
    #[serde(default)]
    pub encoding: SymbolEncoding,
    pub axiom: String,
    #[serde(default)]
    pub iterations: u32,
    #[serde(default)]
    pub rules: Vec<RuleRecord>,
}

impl GrammarConfig {
    pub fn build(&self) -> Result<LSystem, ConfigError> {
        LSystem::new(self.encoding, &self.axiom, self.iterations, &self.rules)
    }
}

/// Complete YAML description of one tree.
///
/// ```yaml
/// seed: 7
/// grammar:
///   axiom: "F"
///   iterations: 3
///   rules:
///     - { predecessor: "F", replacement: "F[+F]F[-F]F" }
/// turtle: { angle: 25.0, radius_bound: { policy: floor, min: 0.01 } }
/// mesh: { sides: 8 }
/// ```
///
/// Everything except `grammar.axiom` has a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TreeConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    pub grammar: GrammarConfig,
    #[serde(default)]
    pub turtle: TurtleParams,
    #[serde(default)]
    pub mesh: MeshParams,
}

impl TreeConfig {
    /// Parse and check numeric parameters. Rule text is checked when the
    /// grammar is built.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: TreeConfig =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Yaml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.turtle.validate()?;
        self.mesh.validate()
    }
}
