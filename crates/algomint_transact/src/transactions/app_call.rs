//! Application call transactions: create an app or call an existing one.

use crate::address::Address;
use crate::constants::{
    MAX_ACCOUNT_REFERENCES, MAX_APP_ARGS, MAX_APP_REFERENCES, MAX_ARGS_SIZE,
    MAX_ASSET_REFERENCES, MAX_EXTRA_PROGRAM_PAGES, MAX_GLOBAL_STATE_KEYS, MAX_LOCAL_STATE_KEYS,
    MAX_OVERALL_REFERENCES, PROGRAM_PAGE_SIZE,
};
use crate::traits::Validate;
use crate::utils::{is_empty_vec_opt, is_zero, is_zero_opt};
use crate::{Transaction, TransactionHeader};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use serde_with::{Bytes, serde_as, skip_serializing_none};

/// What happens to the app, or the sender's local state, after the approval program runs.
#[derive(Serialize_repr, Deserialize_repr, Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
#[repr(u8)]
pub enum OnApplicationComplete {
    #[default]
    NoOp = 0,
    OptIn = 1,
    CloseOut = 2,
    /// Runs the clear state program; cannot be rejected.
    ClearState = 3,
    UpdateApplication = 4,
    DeleteApplication = 5,
}

impl OnApplicationComplete {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnApplicationComplete::NoOp => "NoOp",
            OnApplicationComplete::OptIn => "OptIn",
            OnApplicationComplete::CloseOut => "CloseOut",
            OnApplicationComplete::ClearState => "ClearState",
            OnApplicationComplete::UpdateApplication => "UpdateApplication",
            OnApplicationComplete::DeleteApplication => "DeleteApplication",
        }
    }
}

/// Number of global or local state slots an app reserves.
#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct StateSchema {
    #[serde(rename = "nui")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub num_uints: u64,

    #[serde(rename = "nbs")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub num_byte_slices: u64,
}

impl StateSchema {
    pub fn total(&self) -> u64 {
        self.num_uints + self.num_byte_slices
    }
}

#[serde_as]
#[skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Builder)]
#[builder(
    name = AppCallTransactionBuilder,
    setter(strip_option),
    build_fn(name = "build_fields")
)]
pub struct AppCallTransactionFields {
    #[serde(flatten)]
    pub header: TransactionHeader,

    /// 0 creates a new application.
    #[serde(rename = "apid")]
    #[serde(skip_serializing_if = "is_zero")]
    #[serde(default)]
    pub app_id: u64,

    #[serde(rename = "apan")]
    #[serde(skip_serializing_if = "is_no_op")]
    #[serde(default)]
    pub on_complete: OnApplicationComplete,

    #[serde(rename = "apap")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    #[builder(default)]
    pub approval_program: Option<Vec<u8>>,

    #[serde(rename = "apsu")]
    #[serde_as(as = "Option<Bytes>")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    #[builder(default)]
    pub clear_state_program: Option<Vec<u8>>,

    #[serde(rename = "apgs")]
    #[serde(default)]
    #[builder(default)]
    pub global_state_schema: Option<StateSchema>,

    #[serde(rename = "apls")]
    #[serde(default)]
    #[builder(default)]
    pub local_state_schema: Option<StateSchema>,

    #[serde(rename = "apep")]
    #[serde(skip_serializing_if = "is_zero_opt")]
    #[serde(default)]
    #[builder(default)]
    pub extra_program_pages: Option<u64>,

    /// App arguments; for ABI calls the method selector comes first.
    #[serde(rename = "apaa")]
    #[serde_as(as = "Option<Vec<Bytes>>")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    #[builder(default)]
    pub args: Option<Vec<Vec<u8>>>,

    /// Accounts beyond the sender; referenced from index 1.
    #[serde(rename = "apat")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    #[builder(default)]
    pub account_references: Option<Vec<Address>>,

    /// Apps beyond the called one; referenced from index 1.
    #[serde(rename = "apfa")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    #[builder(default)]
    pub app_references: Option<Vec<u64>>,

    /// Referenced from index 0.
    #[serde(rename = "apas")]
    #[serde(skip_serializing_if = "is_empty_vec_opt")]
    #[serde(default)]
    #[builder(default)]
    pub asset_references: Option<Vec<u64>>,
}

impl AppCallTransactionBuilder {
    pub fn build(&self) -> Result<Transaction, AppCallTransactionBuilderError> {
        self.build_fields().map(Transaction::AppCall)
    }
}

fn is_no_op(on_complete: &OnApplicationComplete) -> bool {
    matches!(on_complete, OnApplicationComplete::NoOp)
}

fn len_of<T>(values: &Option<Vec<T>>) -> usize {
    values.as_ref().map_or(0, Vec::len)
}

impl AppCallTransactionFields {
    pub fn is_create(&self) -> bool {
        self.app_id == 0
    }
}

impl Validate for AppCallTransactionFields {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let args = self.args.as_deref().unwrap_or_default();
        if args.len() > MAX_APP_ARGS {
            errors.push(format!(
                "{} app arguments exceed the limit of {}",
                args.len(),
                MAX_APP_ARGS
            ));
        }
        let args_size: usize = args.iter().map(Vec::len).sum();
        if args_size > MAX_ARGS_SIZE {
            errors.push(format!(
                "App arguments total {} bytes, more than {}",
                args_size, MAX_ARGS_SIZE
            ));
        }

        let accounts = len_of(&self.account_references);
        let apps = len_of(&self.app_references);
        let assets = len_of(&self.asset_references);
        for (label, count, max) in [
            ("account", accounts, MAX_ACCOUNT_REFERENCES),
            ("app", apps, MAX_APP_REFERENCES),
            ("asset", assets, MAX_ASSET_REFERENCES),
        ] {
            if count > max {
                errors.push(format!("{} {} references exceed the limit of {}", count, label, max));
            }
        }
        if accounts + apps + assets > MAX_OVERALL_REFERENCES {
            errors.push(format!(
                "{} foreign references exceed the overall limit of {}",
                accounts + apps + assets,
                MAX_OVERALL_REFERENCES
            ));
        }

        if self.is_create() {
            let approval = self.approval_program.as_deref().unwrap_or_default();
            let clear = self.clear_state_program.as_deref().unwrap_or_default();
            if approval.is_empty() || clear.is_empty() {
                errors.push("App creation needs both an approval and a clear program".to_string());
            }
            if self.on_complete == OnApplicationComplete::ClearState {
                errors.push("An app cannot be created with ClearState".to_string());
            }

            let extra_pages = self.extra_program_pages.unwrap_or(0);
            if extra_pages > MAX_EXTRA_PROGRAM_PAGES {
                errors.push(format!(
                    "{} extra program pages exceed the limit of {}",
                    extra_pages, MAX_EXTRA_PROGRAM_PAGES
                ));
            }
            let capacity = PROGRAM_PAGE_SIZE * (1 + extra_pages as usize);
            if approval.len() + clear.len() > capacity {
                errors.push(format!(
                    "Programs total {} bytes but {} extra pages allow {}",
                    approval.len() + clear.len(),
                    extra_pages,
                    capacity
                ));
            }

            let global = self.global_state_schema.unwrap_or_default();
            if global.total() > MAX_GLOBAL_STATE_KEYS {
                errors.push(format!(
                    "Global schema declares {} keys, more than {}",
                    global.total(),
                    MAX_GLOBAL_STATE_KEYS
                ));
            }
            let local = self.local_state_schema.unwrap_or_default();
            if local.total() > MAX_LOCAL_STATE_KEYS {
                errors.push(format!(
                    "Local schema declares {} keys, more than {}",
                    local.total(),
                    MAX_LOCAL_STATE_KEYS
                ));
            }
        } else if self.approval_program.is_some() && self.on_complete != OnApplicationComplete::UpdateApplication {
            errors.push("Programs can only be set when creating or updating an app".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
