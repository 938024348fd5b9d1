//! Smart contract deployment for Algorand: picks how to create an app from its interface
//! description, encodes the create arguments with foreign references, builds the
//! transactions and drives signing and submission through a small state machine.
pub mod builder;
pub mod config;
pub mod error;
pub mod interface;
pub mod ledger;
pub mod network;
pub mod orchestrator;
pub mod plan;
pub mod planner;
pub mod resolver;
pub mod services;
pub mod stage;
pub mod values;

pub use builder::{BuildContext, TransactionBuilder};
pub use config::{DeployConfig, DeploymentEvent, DeploymentEvents};
pub use error::DeployError;
pub use interface::{CallConfig, InterfaceFormat, InterfaceMethod, InterfaceSpec};
pub use ledger::{DeployedContractRecord, DeploymentLedger};
pub use network::{AlgorandNetwork, SuggestedParams};
pub use orchestrator::{
    DeploymentOrchestrator, DeploymentOutcome, DeploymentRequest, DeploymentResult,
};
pub use plan::DeploymentPlan;
pub use planner::{CreateMethodPlanner, MethodSelection, PlanMode, PlanOutline, SelectionStrategy};
pub use resolver::{
    ContractDependency, ForeignReferenceSet, ReferenceResolver, ResolvedDependency,
    resolve_dependencies,
};
pub use services::{
    NetworkPreparation, PreparationRequest, PreparedNetwork, SubmissionReceipt,
    TransactionSigner, TransactionSubmitter,
};
pub use stage::DeploymentStage;
pub use values::{abi_value_to_json, parse_value};
