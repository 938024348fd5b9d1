use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Arc56Network, MethodDescription};
use crate::ABIError;

/// Whether an action may run when creating the app, calling it later, both, or never.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallConfigValue {
    #[default]
    Never,
    Call,
    Create,
    All,
}

impl CallConfigValue {
    pub fn allows_create(self) -> bool {
        matches!(self, CallConfigValue::Create | CallConfigValue::All)
    }

    pub fn allows_call(self) -> bool {
        matches!(self, CallConfigValue::Call | CallConfigValue::All)
    }
}

/// Per on-completion action config, keyed the way ARC-32 writes it (`no_op`, `opt_in`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionCallConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_op: Option<CallConfigValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opt_in: Option<CallConfigValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_out: Option<CallConfigValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_application: Option<CallConfigValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_application: Option<CallConfigValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodHints {
    #[serde(default)]
    pub call_config: ActionCallConfig,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateCounts {
    #[serde(default)]
    pub num_uints: u64,
    #[serde(default)]
    pub num_byte_slices: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Arc32State {
    #[serde(default)]
    pub global: StateCounts,
    #[serde(default)]
    pub local: StateCounts,
}

/// The embedded ARC-4 contract description.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Arc32Contract {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub methods: Vec<MethodDescription>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub networks: HashMap<String, Arc56Network>,
}

/// ARC-32 application specification.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Arc32AppSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Call config per method signature.
    #[serde(default)]
    pub hints: HashMap<String, MethodHints>,
    #[serde(default)]
    pub bare_call_config: ActionCallConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<Arc32Contract>,
    /// Some generators only list methods at the top level.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDescription>,
    #[serde(default)]
    pub state: Arc32State,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub networks: HashMap<String, Arc56Network>,
}

impl Arc32AppSpec {
    pub fn from_json(json: &str) -> Result<Self, ABIError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Methods from `contract.methods`, falling back to the top-level list.
    pub fn methods(&self) -> &[MethodDescription] {
        match &self.contract {
            Some(contract) if !contract.methods.is_empty() => &contract.methods,
            _ => &self.methods,
        }
    }

    pub fn contract_name(&self) -> Option<&str> {
        self.contract
            .as_ref()
            .map(|c| c.name.as_str())
            .filter(|name| !name.is_empty())
            .or(self.name.as_deref())
    }

    /// Deployments known per genesis hash, from either location.
    pub fn networks(&self) -> HashMap<String, Arc56Network> {
        let mut networks = self.networks.clone();
        if let Some(contract) = &self.contract {
            networks.extend(contract.networks.clone());
        }
        networks
    }
}
