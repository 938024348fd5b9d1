//! The transaction envelope. Deployment only ever creates or calls applications, so the
//! envelope carries a single `appl` variant.

mod app_call;
mod common;

pub use app_call::{
    AppCallTransactionBuilder, AppCallTransactionBuilderError, AppCallTransactionFields,
    OnApplicationComplete, StateSchema,
};
pub use common::{TransactionHeader, TransactionHeaderBuilder, TransactionHeaderBuilderError};

use crate::error::AlgoMintTransactError;
use crate::traits::{AlgorandMsgpack, EstimateTransactionSize, TransactionId, Validate};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(tag = "type")]
pub enum Transaction {
    #[serde(rename = "appl")]
    AppCall(AppCallTransactionFields),
}

/// How the fee of a transaction is derived when no flat fee is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParams {
    pub fee_per_byte: u64,
    pub min_fee: u64,
    pub extra_fee: Option<u64>,
    pub max_fee: Option<u64>,
}

impl Transaction {
    pub fn header(&self) -> &TransactionHeader {
        match self {
            Transaction::AppCall(a) => &a.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut TransactionHeader {
        match self {
            Transaction::AppCall(a) => &mut a.header,
        }
    }

    pub fn app_call(&self) -> &AppCallTransactionFields {
        match self {
            Transaction::AppCall(a) => a,
        }
    }

    /// Returns a copy with `fee = max(fee_per_byte * estimated_size, min_fee) + extra_fee`.
    pub fn assign_fee(&self, request: FeeParams) -> Result<Transaction, AlgoMintTransactError> {
        let mut tx = self.clone();
        let mut calculated_fee: u64 = 0;

        if request.fee_per_byte > 0 {
            let estimated_size = tx.estimate_size()?;
            calculated_fee = request.fee_per_byte * estimated_size as u64;
        }

        if calculated_fee < request.min_fee {
            calculated_fee = request.min_fee;
        }

        if let Some(extra_fee) = request.extra_fee {
            calculated_fee += extra_fee;
        }

        if let Some(max_fee) = request.max_fee {
            if calculated_fee > max_fee {
                return Err(AlgoMintTransactError::InputError {
                    message: format!(
                        "Transaction fee {} µALGO is greater than max fee {} µALGO",
                        calculated_fee, max_fee
                    ),
                });
            }
        }

        tx.header_mut().fee = Some(calculated_fee);
        Ok(tx)
    }
}

impl AlgorandMsgpack for Transaction {
    const PREFIX: &'static [u8] = b"TX";
}

impl TransactionId for Transaction {}

impl EstimateTransactionSize for Transaction {}

impl Validate for Transaction {
    fn validate(&self) -> Result<(), Vec<String>> {
        match self {
            Transaction::AppCall(a) => a.validate(),
        }
    }
}
