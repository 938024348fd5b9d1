use crate::error::DeployError;
use algomint_transact::{Byte32, genesis_hash_from_base64};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Represents the different Algorand networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorandNetwork {
    /// Local development network
    LocalNet,
    /// Algorand TestNet
    #[default]
    TestNet,
    /// Algorand MainNet
    MainNet,
}

impl AlgorandNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorandNetwork::LocalNet => "localnet",
            AlgorandNetwork::TestNet => "testnet",
            AlgorandNetwork::MainNet => "mainnet",
        }
    }

    pub fn is_localnet(&self) -> bool {
        matches!(self, AlgorandNetwork::LocalNet)
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self, AlgorandNetwork::MainNet)
    }

    /// Get the expected genesis ID for this network
    pub fn expected_genesis_id(&self) -> Option<&'static str> {
        match self {
            AlgorandNetwork::LocalNet => None,
            AlgorandNetwork::TestNet => Some("testnet-v1.0"),
            AlgorandNetwork::MainNet => Some("mainnet-v1.0"),
        }
    }

    /// Default transaction link; `{txid}` is replaced with the transaction id.
    pub fn default_explorer_template(&self) -> &'static str {
        match self {
            AlgorandNetwork::LocalNet => "https://lora.algokit.io/localnet/transaction/{txid}",
            AlgorandNetwork::TestNet => "https://testnet.explorer.perawallet.app/tx/{txid}",
            AlgorandNetwork::MainNet => "https://explorer.perawallet.app/tx/{txid}",
        }
    }
}

impl Display for AlgorandNetwork {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorandNetwork {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "localnet" | "local" => Ok(AlgorandNetwork::LocalNet),
            "testnet" => Ok(AlgorandNetwork::TestNet),
            "mainnet" => Ok(AlgorandNetwork::MainNet),
            other => Err(DeployError::validation(format!(
                "Unknown network '{}', expected localnet, testnet or mainnet",
                other
            ))),
        }
    }
}

/// Network parameters a transaction is built against, as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedParams {
    /// Fee per byte, or the flat fee when `flat_fee` is set.
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    /// Base64, as algod reports it.
    pub genesis_hash: String,
    pub genesis_id: String,
    #[serde(default)]
    pub flat_fee: bool,
    pub min_fee: u64,
}

impl SuggestedParams {
    pub fn genesis_hash_bytes(&self) -> Result<Byte32, DeployError> {
        Ok(genesis_hash_from_base64(&self.genesis_hash)?)
    }

    /// Checks the parameters belong to `network` and describe a usable validity window.
    pub fn validate_for(&self, network: AlgorandNetwork) -> Result<(), DeployError> {
        if self.last_valid < self.first_valid {
            return Err(DeployError::validation(format!(
                "Validity window is inverted: first valid {} is after last valid {}",
                self.first_valid, self.last_valid
            )));
        }
        if let Some(expected) = network.expected_genesis_id() {
            if self.genesis_id != expected {
                return Err(DeployError::validation(format!(
                    "Suggested params are for '{}' but the deployment targets {} ({})",
                    self.genesis_id, network, expected
                )));
            }
        }
        Ok(())
    }
}
