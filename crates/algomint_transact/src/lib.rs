//! Algorand wire primitives needed to create and call applications: addresses, the
//! application call transaction, and canonical msgpack encoding with transaction ids.
mod address;
pub mod constants;
mod error;
mod traits;
mod transactions;
mod utils;

pub use address::Address;
pub use constants::*;
pub use error::AlgoMintTransactError;
pub use traits::{AlgorandMsgpack, EstimateTransactionSize, TransactionId, Validate};
pub use transactions::{
    AppCallTransactionBuilder, AppCallTransactionBuilderError, AppCallTransactionFields,
    FeeParams, OnApplicationComplete, StateSchema, Transaction, TransactionHeader,
    TransactionHeaderBuilder, TransactionHeaderBuilderError,
};
pub use utils::{extra_pages_for, genesis_hash_from_base64};
