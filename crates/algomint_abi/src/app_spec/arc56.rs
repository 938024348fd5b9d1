use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::MethodDescription;
use crate::ABIError;

/// On-completion actions an ARC-56 method or bare call allows on an existing app.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CallOnComplete {
    NoOp,
    OptIn,
    CloseOut,
    ClearState,
    UpdateApplication,
    DeleteApplication,
}

/// On-completion actions an ARC-56 method or bare call allows at creation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CreateOnComplete {
    NoOp,
    OptIn,
    DeleteApplication,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actions {
    /// Allowed when the app id is 0.
    #[serde(default)]
    pub create: Vec<CreateOnComplete>,
    /// Allowed on an existing app.
    #[serde(default)]
    pub call: Vec<CallOnComplete>,
}

pub type BareActions = Actions;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Arc56Method {
    #[serde(flatten)]
    pub description: MethodDescription,
    #[serde(default)]
    pub actions: Actions,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Arc56Network {
    #[serde(rename = "appID")]
    pub app_id: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaCounts {
    #[serde(default)]
    pub ints: u64,
    #[serde(default)]
    pub bytes: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schema {
    #[serde(default)]
    pub global: SchemaCounts,
    #[serde(default)]
    pub local: SchemaCounts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct State {
    #[serde(default)]
    pub schema: Schema,
}

/// ARC-56 application specification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Arc56AppSpec {
    pub name: String,
    #[serde(default)]
    pub arcs: Vec<u32>,
    pub methods: Vec<Arc56Method>,
    #[serde(rename = "bareActions", default)]
    pub bare_actions: BareActions,
    #[serde(default)]
    pub state: State,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub networks: HashMap<String, Arc56Network>,
}

impl Arc56AppSpec {
    pub fn from_json(json: &str) -> Result<Self, ABIError> {
        Ok(serde_json::from_str(json)?)
    }
}
