//! Serde models for the JSON application specifications compilers emit.
//!
//! Only the parts that matter for creating and calling an app are modelled; unknown
//! fields are ignored so specs from newer toolchains still parse.
mod arc32;
mod arc56;

pub use arc32::{
    ActionCallConfig, Arc32AppSpec, Arc32Contract, Arc32State, CallConfigValue, MethodHints,
    StateCounts,
};
pub use arc56::{
    Actions, Arc56AppSpec, Arc56Method, Arc56Network, BareActions, CallOnComplete,
    CreateOnComplete, Schema, SchemaCounts, State,
};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{
    ABIError, ABIMethod, ABIMethodArg, ABIMethodArgType, ABIType, constants::VOID_RETURN_TYPE,
};

/// An ARC-4 method description as it appears inside both spec formats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodDescription {
    pub name: String,
    #[serde(default)]
    pub args: Vec<MethodArgDescription>,
    #[serde(default)]
    pub returns: ReturnDescription,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readonly: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MethodArgDescription {
    #[serde(rename = "type")]
    pub arg_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReturnDescription {
    #[serde(rename = "type")]
    pub return_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

impl Default for ReturnDescription {
    fn default() -> Self {
        Self {
            return_type: VOID_RETURN_TYPE.to_string(),
            desc: None,
        }
    }
}

impl MethodDescription {
    /// Parses the declared types into an [`ABIMethod`], keeping argument names.
    pub fn to_abi_method(&self) -> Result<ABIMethod, ABIError> {
        let args = self
            .args
            .iter()
            .enumerate()
            .map(|(i, arg)| -> Result<ABIMethodArg, ABIError> {
                let arg_type = ABIMethodArgType::from_str(&arg.arg_type).map_err(|e| {
                    ABIError::validation(format!(
                        "Argument {} of method '{}': {}",
                        i, self.name, e
                    ))
                })?;
                Ok(ABIMethodArg {
                    arg_type,
                    name: arg.name.clone().or_else(|| Some(format!("arg{}", i))),
                    description: arg.desc.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let returns = match self.returns.return_type.as_str() {
            VOID_RETURN_TYPE | "" => None,
            other => Some(other.parse::<ABIType>().map_err(|e| {
                ABIError::validation(format!("Return type of method '{}': {}", self.name, e))
            })?),
        };

        let mut method = ABIMethod::new(self.name.clone(), args, returns);
        method.readonly = self.readonly.unwrap_or(false);
        method.description = self.desc.clone();
        method.signature()?;
        Ok(method)
    }
}
