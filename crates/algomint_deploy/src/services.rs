//! Collaborators the orchestrator drives but does not implement: program compilation and
//! network parameters, the user's wallet, and the node that accepts transactions.

use crate::network::{AlgorandNetwork, SuggestedParams};
use algomint_transact::{Address, StateSchema, Transaction};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct PreparationRequest {
    pub sender: Address,
    pub approval_source: String,
    pub clear_source: String,
    pub network: AlgorandNetwork,
    /// Storage the app declares, for services that fund or size the app up front.
    pub global_schema: StateSchema,
    pub local_schema: StateSchema,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedNetwork {
    pub approval_compiled: Vec<u8>,
    pub clear_compiled: Vec<u8>,
    pub extra_pages: u64,
    pub suggested_params: SuggestedParams,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubmissionReceipt {
    pub transaction_id: String,
    /// Link supplied by the submitter, if it builds its own.
    pub explorer_url: Option<String>,
    /// The created app, 0 for calls of an existing app.
    pub app_id: u64,
    pub logs: Vec<Vec<u8>>,
}

/// Compiles the programs and fetches suggested params.
#[async_trait]
pub trait NetworkPreparation: Send + Sync {
    async fn prepare(&self, request: &PreparationRequest) -> Result<PreparedNetwork, String>;
}

/// Signs transactions, usually by asking the user's wallet.
///
/// Returns one encoded signed transaction per input. Errors are free text; wallet phrases
/// such as "user rejected" or "modal closed" are treated as the user backing out.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign_transactions(&self, transactions: &[Transaction]) -> Result<Vec<Vec<u8>>, String>;
}

/// Sends signed transactions and waits for confirmation.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit(
        &self,
        signed: &[Vec<u8>],
        network: AlgorandNetwork,
        max_rounds_to_wait: u64,
    ) -> Result<SubmissionReceipt, String>;
}
