//! One canonical view of a contract interface, whichever JSON format it arrived in.
//!
//! ARC-32 documents carry `hints` keyed by method signature and a `bare_call_config`;
//! ARC-56 documents carry `actions` on every method and `bareActions`. Both are reduced to a
//! [`CallConfig`] per method so the planner never looks at raw JSON.

use crate::error::DeployError;
use algomint_abi::ABIMethod;
use algomint_abi::app_spec::{
    ActionCallConfig, Actions, Arc32AppSpec, Arc56AppSpec, CallConfigValue, CallOnComplete,
    CreateOnComplete, MethodDescription,
};
use algomint_transact::{OnApplicationComplete, StateSchema};
use log::debug;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

const DEFAULT_CONTRACT_NAME: &str = "Contract";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceFormat {
    Arc32,
    Arc56,
}

/// Which on-completion actions a method (or bare call) allows, and when.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallConfig {
    pub no_op: CallConfigValue,
    pub opt_in: CallConfigValue,
    pub close_out: CallConfigValue,
    pub update_application: CallConfigValue,
    pub delete_application: CallConfigValue,
}

impl CallConfig {
    /// Actions in planning order.
    pub fn actions(&self) -> [(OnApplicationComplete, CallConfigValue); 5] {
        [
            (OnApplicationComplete::NoOp, self.no_op),
            (OnApplicationComplete::OptIn, self.opt_in),
            (OnApplicationComplete::CloseOut, self.close_out),
            (
                OnApplicationComplete::UpdateApplication,
                self.update_application,
            ),
            (
                OnApplicationComplete::DeleteApplication,
                self.delete_application,
            ),
        ]
    }

    /// First action configured with exactly `value`.
    pub fn find(&self, value: CallConfigValue) -> Option<OnApplicationComplete> {
        self.actions()
            .into_iter()
            .find(|(_, configured)| *configured == value)
            .map(|(action, _)| action)
    }

    /// First action allowed at creation.
    pub fn create_action(&self) -> Option<OnApplicationComplete> {
        self.actions()
            .into_iter()
            .find(|(_, configured)| configured.allows_create())
            .map(|(action, _)| action)
    }

    pub fn allows_create(&self) -> bool {
        self.create_action().is_some()
    }

    pub fn allows_call(&self) -> bool {
        self.actions().iter().any(|(_, value)| value.allows_call())
    }

    /// Callable on an existing app but never at creation.
    pub fn is_call_only(&self) -> bool {
        self.allows_call() && !self.allows_create()
    }

    fn slot(&mut self, action: OnApplicationComplete) -> Option<&mut CallConfigValue> {
        match action {
            OnApplicationComplete::NoOp => Some(&mut self.no_op),
            OnApplicationComplete::OptIn => Some(&mut self.opt_in),
            OnApplicationComplete::CloseOut => Some(&mut self.close_out),
            OnApplicationComplete::UpdateApplication => Some(&mut self.update_application),
            OnApplicationComplete::DeleteApplication => Some(&mut self.delete_application),
            OnApplicationComplete::ClearState => None,
        }
    }

    fn allow(&mut self, action: OnApplicationComplete, create: bool) {
        if let Some(value) = self.slot(action) {
            *value = match (*value, create) {
                (CallConfigValue::Never, true) => CallConfigValue::Create,
                (CallConfigValue::Never, false) => CallConfigValue::Call,
                (CallConfigValue::Call, true) | (CallConfigValue::Create, false) => {
                    CallConfigValue::All
                }
                (unchanged, _) => unchanged,
            };
        }
    }
}

impl From<&ActionCallConfig> for CallConfig {
    fn from(config: &ActionCallConfig) -> Self {
        Self {
            no_op: config.no_op.unwrap_or_default(),
            opt_in: config.opt_in.unwrap_or_default(),
            close_out: config.close_out.unwrap_or_default(),
            update_application: config.update_application.unwrap_or_default(),
            delete_application: config.delete_application.unwrap_or_default(),
        }
    }
}

impl From<&Actions> for CallConfig {
    fn from(actions: &Actions) -> Self {
        let mut config = CallConfig::default();
        for action in &actions.create {
            let action = match action {
                CreateOnComplete::NoOp => OnApplicationComplete::NoOp,
                CreateOnComplete::OptIn => OnApplicationComplete::OptIn,
                CreateOnComplete::DeleteApplication => OnApplicationComplete::DeleteApplication,
            };
            config.allow(action, true);
        }
        for action in &actions.call {
            let action = match action {
                CallOnComplete::NoOp => OnApplicationComplete::NoOp,
                CallOnComplete::OptIn => OnApplicationComplete::OptIn,
                CallOnComplete::CloseOut => OnApplicationComplete::CloseOut,
                CallOnComplete::ClearState => OnApplicationComplete::ClearState,
                CallOnComplete::UpdateApplication => OnApplicationComplete::UpdateApplication,
                CallOnComplete::DeleteApplication => OnApplicationComplete::DeleteApplication,
            };
            config.allow(action, false);
        }
        config
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceMethod {
    pub method: ABIMethod,
    pub call_config: CallConfig,
    pub readonly: bool,
}

impl InterfaceMethod {
    pub fn name(&self) -> &str {
        &self.method.name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceSpec {
    pub name: String,
    pub format: InterfaceFormat,
    /// In declaration order.
    pub methods: Vec<InterfaceMethod>,
    pub bare_call_config: CallConfig,
    pub global_schema: StateSchema,
    pub local_schema: StateSchema,
    /// App id per genesis hash.
    pub networks: BTreeMap<String, u64>,
    raw: Value,
}

impl InterfaceSpec {
    pub fn from_json(json: &str) -> Result<Self, DeployError> {
        let value: Value = serde_json::from_str(json).map_err(|e| DeployError::InterfaceSpec {
            message: format!("Interface spec is not valid JSON: {}", e),
        })?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, DeployError> {
        let spec = match detect_format(&value)? {
            InterfaceFormat::Arc32 => {
                let spec: Arc32AppSpec = parse(&value)?;
                Self::from_arc32(&spec, value)?
            }
            InterfaceFormat::Arc56 => {
                let spec: Arc56AppSpec = parse(&value)?;
                Self::from_arc56(&spec, value)?
            }
        };
        debug!(
            "Loaded {:?} interface '{}' with {} methods",
            spec.format,
            spec.name,
            spec.methods.len()
        );
        Ok(spec)
    }

    fn from_arc32(spec: &Arc32AppSpec, raw: Value) -> Result<Self, DeployError> {
        let methods = spec
            .methods()
            .iter()
            .map(|description| -> Result<InterfaceMethod, DeployError> {
                let method = to_method(description)?;
                let call_config = method
                    .signature()
                    .ok()
                    .and_then(|signature| spec.hints.get(&signature))
                    .map(|hints| CallConfig::from(&hints.call_config))
                    .unwrap_or_default();
                Ok(InterfaceMethod {
                    method,
                    call_config,
                    readonly: description.readonly.unwrap_or(false),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: spec
                .contract_name()
                .unwrap_or(DEFAULT_CONTRACT_NAME)
                .to_string(),
            format: InterfaceFormat::Arc32,
            methods,
            bare_call_config: CallConfig::from(&spec.bare_call_config),
            global_schema: StateSchema {
                num_uints: spec.state.global.num_uints,
                num_byte_slices: spec.state.global.num_byte_slices,
            },
            local_schema: StateSchema {
                num_uints: spec.state.local.num_uints,
                num_byte_slices: spec.state.local.num_byte_slices,
            },
            networks: spec
                .networks()
                .into_iter()
                .map(|(genesis, network)| (genesis, network.app_id))
                .collect(),
            raw,
        })
    }

    fn from_arc56(spec: &Arc56AppSpec, raw: Value) -> Result<Self, DeployError> {
        let methods = spec
            .methods
            .iter()
            .map(|m| -> Result<InterfaceMethod, DeployError> {
                Ok(InterfaceMethod {
                    method: to_method(&m.description)?,
                    call_config: CallConfig::from(&m.actions),
                    readonly: m.description.readonly.unwrap_or(false),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: if spec.name.is_empty() {
                DEFAULT_CONTRACT_NAME.to_string()
            } else {
                spec.name.clone()
            },
            format: InterfaceFormat::Arc56,
            methods,
            bare_call_config: CallConfig::from(&spec.bare_actions),
            global_schema: StateSchema {
                num_uints: spec.state.schema.global.ints,
                num_byte_slices: spec.state.schema.global.bytes,
            },
            local_schema: StateSchema {
                num_uints: spec.state.schema.local.ints,
                num_byte_slices: spec.state.schema.local.bytes,
            },
            networks: spec
                .networks
                .iter()
                .map(|(genesis, network)| (genesis.clone(), network.app_id))
                .collect(),
            raw,
        })
    }

    pub fn method(&self, name: &str) -> Option<&InterfaceMethod> {
        self.methods.iter().find(|m| m.name() == name)
    }

    pub fn app_id_for(&self, genesis_hash: &str) -> Option<u64> {
        self.networks.get(genesis_hash).copied()
    }

    /// Records a deployment under `networks`, in the canonical view and the source JSON.
    pub fn record_network(&mut self, genesis_hash: &str, app_id: u64) {
        self.networks.insert(genesis_hash.to_string(), app_id);
        if let Value::Object(root) = &mut self.raw {
            let networks = root
                .entry("networks")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(networks) = networks {
                networks.insert(genesis_hash.to_string(), json!({ "appID": app_id }));
            }
        }
    }

    /// The source document, including any recorded networks.
    pub fn to_json(&self) -> &Value {
        &self.raw
    }
}

fn detect_format(value: &Value) -> Result<InterfaceFormat, DeployError> {
    let Value::Object(root) = value else {
        return Err(DeployError::InterfaceSpec {
            message: "Interface spec must be a JSON object".to_string(),
        });
    };
    let has = |key: &str| root.contains_key(key);

    if has("hints") || has("bare_call_config") || has("contract") {
        return Ok(InterfaceFormat::Arc32);
    }
    let methods_have_actions = root
        .get("methods")
        .and_then(Value::as_array)
        .is_some_and(|methods| methods.iter().any(|m| m.get("actions").is_some()));
    if has("bareActions") || has("arcs") || methods_have_actions {
        return Ok(InterfaceFormat::Arc56);
    }
    if has("methods") {
        return Ok(InterfaceFormat::Arc32);
    }
    Err(DeployError::InterfaceSpec {
        message: "Interface spec is neither ARC-32 nor ARC-56".to_string(),
    })
}

fn parse<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T, DeployError> {
    serde_json::from_value(value.clone()).map_err(|e| DeployError::InterfaceSpec {
        message: e.to_string(),
    })
}

fn to_method(description: &MethodDescription) -> Result<ABIMethod, DeployError> {
    description
        .to_abi_method()
        .map_err(|e| DeployError::InterfaceSpec {
            message: format!("Method '{}' is invalid: {}", description.name, e),
        })
}
