#![allow(dead_code)]

use algomint_deploy::{
    AlgorandNetwork, InterfaceSpec, NetworkPreparation, PreparationRequest, PreparedNetwork,
    SubmissionReceipt, SuggestedParams, TransactionSigner, TransactionSubmitter,
};
use algomint_transact::{AlgorandMsgpack, Transaction};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub const SENDER: &str = "MO2H6ZU47Q36GJ6GVHUKGEBEQINN7ZWVACMWZQGIYUOE3RBSRVYHV4ACJI";
pub const TESTNET_GENESIS_HASH: &str = "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=";
pub const ABI_RETURN_PREFIX: [u8; 4] = [0x15, 0x1f, 0x7c, 0x75];

/// Initialize logging for tests. Safe to call from every test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .format_target(true)
            .format_module_path(false)
            .try_init();
    });
}

pub fn testnet_params() -> SuggestedParams {
    SuggestedParams {
        fee: 0,
        first_valid: 1000,
        last_valid: 2000,
        genesis_hash: TESTNET_GENESIS_HASH.to_string(),
        genesis_id: "testnet-v1.0".to_string(),
        flat_fee: false,
        min_fee: 1000,
    }
}

/// A token whose `mint` method may run at creation and returns the minted supply.
pub fn token_interface() -> InterfaceSpec {
    InterfaceSpec::from_value(json!({
        "hints": {
            "mint(string,uint64)uint64": { "call_config": { "no_op": "CREATE" } }
        },
        "state": {
            "global": { "num_uints": 1, "num_byte_slices": 1 },
            "local": { "num_uints": 0, "num_byte_slices": 0 }
        },
        "contract": {
            "name": "Token",
            "methods": [{
                "name": "mint",
                "args": [{ "type": "string", "name": "symbol" }, { "type": "uint64", "name": "supply" }],
                "returns": { "type": "uint64" }
            }]
        }
    }))
    .unwrap()
}

/// A vault created bare, then initialized with a reference to a registry app.
pub fn vault_interface() -> InterfaceSpec {
    InterfaceSpec::from_value(json!({
        "hints": {
            "setup(application)void": { "call_config": { "no_op": "CALL" } }
        },
        "bare_call_config": { "no_op": "CREATE" },
        "contract": {
            "name": "Vault",
            "methods": [{
                "name": "setup",
                "args": [{ "type": "application", "name": "registry" }],
                "returns": { "type": "void" }
            }]
        }
    }))
    .unwrap()
}

pub fn uint64_return_log(value: u64) -> Vec<u8> {
    let mut log = ABI_RETURN_PREFIX.to_vec();
    log.extend_from_slice(&value.to_be_bytes());
    log
}

#[derive(Debug, Default)]
pub struct MockPreparation {
    pub params: Option<SuggestedParams>,
    pub failure: Option<String>,
    pub requests: Mutex<Vec<PreparationRequest>>,
}

impl MockPreparation {
    pub fn requests(&self) -> Vec<PreparationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NetworkPreparation for MockPreparation {
    async fn prepare(&self, request: &PreparationRequest) -> Result<PreparedNetwork, String> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(message) = &self.failure {
            return Err(message.clone());
        }
        assert_eq!(request.network, AlgorandNetwork::TestNet);
        Ok(PreparedNetwork {
            approval_compiled: vec![0x0a, 0x81, 0x01, 0x43],
            clear_compiled: vec![0x0a, 0x81, 0x01, 0x43],
            extra_pages: 0,
            suggested_params: self.params.clone().unwrap_or_else(testnet_params),
        })
    }
}

/// Answers each signing request with the next scripted reply, `Ok` meaning "approve".
#[derive(Debug, Default)]
pub struct ScriptedSigner {
    replies: Mutex<VecDeque<Result<(), String>>>,
    pub signed: Mutex<Vec<Transaction>>,
}

impl ScriptedSigner {
    pub fn new(replies: Vec<Result<(), String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            signed: Mutex::new(Vec::new()),
        }
    }

    pub fn approving() -> Self {
        Self::new(vec![Ok(()), Ok(())])
    }

    pub fn signed(&self) -> Vec<Transaction> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionSigner for ScriptedSigner {
    async fn sign_transactions(&self, transactions: &[Transaction]) -> Result<Vec<Vec<u8>>, String> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted reply".to_string()));
        reply?;
        self.signed
            .lock()
            .unwrap()
            .extend(transactions.iter().cloned());
        transactions
            .iter()
            .map(|t| t.encode().map_err(|e| e.to_string()))
            .collect()
    }
}

/// Confirms submissions with queued receipts, optionally after a delay.
#[derive(Debug, Default)]
pub struct MockSubmitter {
    receipts: Mutex<VecDeque<SubmissionReceipt>>,
    pub delay: Option<Duration>,
    pub submitted: Mutex<usize>,
}

impl MockSubmitter {
    pub fn new(receipts: Vec<SubmissionReceipt>) -> Self {
        Self {
            receipts: Mutex::new(receipts.into()),
            delay: None,
            submitted: Mutex::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn submitted(&self) -> usize {
        *self.submitted.lock().unwrap()
    }
}

#[async_trait]
impl TransactionSubmitter for MockSubmitter {
    async fn submit(
        &self,
        signed: &[Vec<u8>],
        _network: AlgorandNetwork,
        _max_rounds_to_wait: u64,
    ) -> Result<SubmissionReceipt, String> {
        assert_eq!(signed.len(), 1);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        *self.submitted.lock().unwrap() += 1;
        self.receipts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| "node unavailable".to_string())
    }
}

pub fn receipt(transaction_id: &str, app_id: u64, logs: Vec<Vec<u8>>) -> SubmissionReceipt {
    SubmissionReceipt {
        transaction_id: transaction_id.to_string(),
        explorer_url: None,
        app_id,
        logs,
    }
}
