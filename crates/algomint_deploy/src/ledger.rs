use crate::network::AlgorandNetwork;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A confirmed deployment. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployedContractRecord {
    pub contract_name: String,
    pub app_id: u64,
    pub app_address: String,
    /// The create transaction.
    pub transaction_id: String,
    /// The initialization call of a two-phase deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_phase_transaction_id: Option<String>,
    pub explorer_url: String,
    pub network: AlgorandNetwork,
    pub deployed_at: DateTime<Utc>,
    /// The interface spec as it was deployed.
    pub interface_spec: serde_json::Value,
    /// Decoded return value of the create or initialization method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi_return: Option<serde_json::Value>,
}

/// Append-only list of confirmed deployments for the current session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentLedger {
    records: Vec<DeployedContractRecord>,
}

impl DeploymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: DeployedContractRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[DeployedContractRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Most recent deployment of `contract_name` (case-insensitive) on `network`.
    pub fn latest(
        &self,
        contract_name: &str,
        network: AlgorandNetwork,
    ) -> Option<&DeployedContractRecord> {
        self.records
            .iter()
            .rev()
            .find(|r| r.network == network && r.contract_name.eq_ignore_ascii_case(contract_name))
    }

    pub fn latest_app_id(&self, contract_name: &str, network: AlgorandNetwork) -> Option<u64> {
        self.latest(contract_name, network).map(|r| r.app_id)
    }
}
