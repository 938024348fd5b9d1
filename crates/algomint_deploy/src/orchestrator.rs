use crate::builder::{BuildContext, TransactionBuilder};
use crate::config::{DeployConfig, DeploymentEvent, DeploymentEvents};
use crate::error::DeployError;
use crate::interface::InterfaceSpec;
use crate::ledger::{DeployedContractRecord, DeploymentLedger};
use crate::plan::DeploymentPlan;
use crate::planner::CreateMethodPlanner;
use crate::resolver::{ContractDependency, ReferenceResolver, resolve_dependencies};
use crate::services::{
    NetworkPreparation, PreparationRequest, SubmissionReceipt, TransactionSigner,
    TransactionSubmitter,
};
use crate::stage::DeploymentStage;
use crate::values::abi_value_to_json;
use algomint_abi::ABIReturn;
use algomint_transact::{Address, Transaction, TransactionId};
use chrono::Utc;
use derive_more::Debug;
use log::{error, info, warn};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

/// One contract to deploy.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub sender: Address,
    pub approval_source: String,
    pub clear_source: String,
    pub interface: InterfaceSpec,
    /// Raw create arguments in declared order.
    pub create_args: Vec<Value>,
    pub dependencies: Vec<ContractDependency>,
}

#[derive(Debug, Clone)]
pub struct DeploymentResult {
    pub record: DeployedContractRecord,
    /// The interface with the new app id recorded under its network.
    pub interface: InterfaceSpec,
    pub plan: DeploymentPlan,
    pub abi_return: Option<ABIReturn>,
}

#[derive(Debug, Clone)]
pub enum DeploymentOutcome {
    Deployed(Box<DeploymentResult>),
    /// The user declined to sign; nothing was submitted.
    Cancelled { stage: DeploymentStage },
}

impl DeploymentOutcome {
    pub fn deployed(&self) -> Option<&DeploymentResult> {
        match self {
            DeploymentOutcome::Deployed(result) => Some(result),
            DeploymentOutcome::Cancelled { .. } => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DeploymentOutcome::Cancelled { .. })
    }
}

/// Drives a deployment from preparation to confirmation.
///
/// Deploying takes `&mut self`, so one orchestrator runs at most one deployment at a time.
/// Confirmed deployments are appended to the orchestrator's ledger.
#[derive(Debug)]
pub struct DeploymentOrchestrator {
    config: DeployConfig,
    #[debug(skip)]
    preparation: Arc<dyn NetworkPreparation>,
    #[debug(skip)]
    signer: Arc<dyn TransactionSigner>,
    #[debug(skip)]
    submitter: Arc<dyn TransactionSubmitter>,
    planner: CreateMethodPlanner,
    ledger: DeploymentLedger,
    events: DeploymentEvents,
    stage: DeploymentStage,
    last_action: String,
}

impl DeploymentOrchestrator {
    pub fn new(
        config: DeployConfig,
        preparation: Arc<dyn NetworkPreparation>,
        signer: Arc<dyn TransactionSigner>,
        submitter: Arc<dyn TransactionSubmitter>,
    ) -> Result<Self, DeployError> {
        config.validate()?;
        Ok(Self {
            config,
            preparation,
            signer,
            submitter,
            planner: CreateMethodPlanner::default(),
            ledger: DeploymentLedger::new(),
            events: DeploymentEvents::default(),
            stage: DeploymentStage::Idle,
            last_action: String::new(),
        })
    }

    pub fn with_ledger(mut self, ledger: DeploymentLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn with_planner(mut self, planner: CreateMethodPlanner) -> Self {
        self.planner = planner;
        self
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    pub fn stage(&self) -> DeploymentStage {
        self.stage
    }

    pub fn ledger(&self) -> &DeploymentLedger {
        &self.ledger
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeploymentEvent> {
        self.events.subscribe()
    }

    /// Runs one deployment.
    ///
    /// A user cancelling the first signature returns `Ok(Cancelled)`. Cancelling the second
    /// signature returns [`DeployError::PartialDeployment`], since the app is already live.
    /// Either way the orchestrator goes back to `Idle` and nothing is recorded. Every other
    /// problem leaves it `Failed`.
    pub async fn deploy(
        &mut self,
        request: DeploymentRequest,
    ) -> Result<DeploymentOutcome, DeployError> {
        if self.stage.is_terminal() {
            self.transition(DeploymentStage::Idle, "start new deployment")?;
        }
        let snapshot = self.ledger.clone();

        match self.run(request, &snapshot).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    async fn run(
        &mut self,
        request: DeploymentRequest,
        ledger: &DeploymentLedger,
    ) -> Result<DeploymentOutcome, DeployError> {
        let network = self.config.network;

        self.transition(DeploymentStage::Preparing, "prepare network")?;
        let prepared = self
            .preparation
            .prepare(&PreparationRequest {
                sender: request.sender,
                approval_source: request.approval_source.clone(),
                clear_source: request.clear_source.clone(),
                network,
                global_schema: request.interface.global_schema,
                local_schema: request.interface.local_schema,
            })
            .await
            .map_err(|message| DeployError::Preparation {
                stage: self.stage,
                action: self.last_action.clone(),
                message,
            })?;
        prepared
            .suggested_params
            .validate_for(network)
            .map_err(|e| self.located(e))?;

        self.transition(DeploymentStage::Building, "resolve dependencies")?;
        let dependencies = resolve_dependencies(&request.dependencies, ledger, network)
            .map_err(|e| self.located(e))?;

        self.act("plan create method");
        let outline = self
            .planner
            .plan(&request.interface)
            .map_err(|e| self.located(e))?;

        self.act("encode create arguments");
        let resolver = ReferenceResolver::new(ledger, network, request.sender, &dependencies);
        let plan = DeploymentPlan::assemble(
            outline,
            &resolver,
            &request.create_args,
            self.config.allow_degraded_create,
        )
        .map_err(|e| self.located(e))?;
        for warning in &plan.warnings {
            self.events.emit(DeploymentEvent::Warning {
                message: warning.clone(),
            });
        }

        self.act("build create transaction");
        let context = BuildContext {
            sender: request.sender,
            approval_program: prepared.approval_compiled,
            clear_state_program: prepared.clear_compiled,
            global_schema: request.interface.global_schema,
            local_schema: request.interface.local_schema,
            extra_pages: prepared.extra_pages,
            params: prepared.suggested_params,
        };
        let builder = TransactionBuilder::new(self.config.validity_window);
        let create = builder
            .build_create(&context, &plan)
            .map_err(|e| self.located(e))?;
        let create_id = create.id().map_err(|e| self.located(e.into()))?;

        self.transition(DeploymentStage::AwaitingSignature, "sign create transaction")?;
        let signed = match self.sign(&create).await {
            Ok(signed) => signed,
            Err(e) if e.is_cancellation() => {
                info!("Deployment of '{}' cancelled at signing", request.interface.name);
                self.transition(DeploymentStage::Idle, "cancelled by user")?;
                return Ok(DeploymentOutcome::Cancelled {
                    stage: DeploymentStage::AwaitingSignature,
                });
            }
            Err(e) => return Err(e),
        };

        self.transition(DeploymentStage::Submitting, "submit create transaction")?;
        let receipt = self.submit(&signed, &create_id).await?;
        if receipt.app_id == 0 {
            return Err(DeployError::Submission {
                stage: self.stage,
                action: self.last_action.clone(),
                transaction_id: receipt.transaction_id.clone(),
                message: "Confirmed without an app id".to_string(),
            });
        }
        let app_id = receipt.app_id;
        info!("Created app {} in transaction {}", app_id, receipt.transaction_id);

        let mut return_logs = receipt.logs.clone();
        let mut second_phase_transaction_id = None;
        if plan.is_two_phase() {
            self.transition(
                DeploymentStage::AwaitingSecondSignature,
                "sign initialization call",
            )?;
            let dependency_ids: Vec<u64> = dependencies.iter().map(|d| d.app_id).collect();
            let call = builder
                .build_post_create_call(&context, &plan, app_id, &dependency_ids)
                .map_err(|e| self.partial(app_id, None, e.to_string()))?;
            let call_id = call
                .id()
                .map_err(|e| self.partial(app_id, None, e.to_string()))?;
            let signed = match self.sign(&call).await {
                Ok(signed) => signed,
                Err(e) if e.is_cancellation() => {
                    let error = self.partial(
                        app_id,
                        Some(call_id),
                        "the user cancelled the initialization call".to_string(),
                    );
                    self.transition(DeploymentStage::Idle, "cancelled by user")?;
                    return Err(error);
                }
                Err(e) => return Err(self.partial(app_id, Some(call_id), e.to_string())),
            };

            self.transition(
                DeploymentStage::SubmittingSecond,
                "submit initialization call",
            )?;
            let second = self
                .submit(&signed, &call_id)
                .await
                .map_err(|e| self.partial(app_id, Some(call_id.clone()), e.to_string()))?;
            return_logs = second.logs;
            second_phase_transaction_id = Some(second.transaction_id);
        }

        let abi_return = match &plan.method {
            Some(method) => method.decode_return(&return_logs).unwrap_or_else(|e| {
                warn!("Could not decode the return value of '{}': {}", method.name, e);
                None
            }),
            None => None,
        };

        let SubmissionReceipt {
            transaction_id,
            explorer_url,
            ..
        } = receipt;
        let explorer_url = explorer_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.config.explorer_url(&transaction_id));

        let mut interface = request.interface;
        let record = DeployedContractRecord {
            contract_name: interface.name.clone(),
            app_id,
            app_address: Address::from_app_id(app_id).to_string(),
            transaction_id: transaction_id.clone(),
            second_phase_transaction_id,
            explorer_url,
            network,
            deployed_at: Utc::now(),
            interface_spec: interface.to_json().clone(),
            abi_return: abi_return
                .as_ref()
                .map(|r| abi_value_to_json(&r.return_value)),
        };
        interface.record_network(&context.params.genesis_hash, app_id);
        self.ledger.append(record.clone());

        self.transition(DeploymentStage::Confirmed, "record deployment")?;
        self.events.emit(DeploymentEvent::Confirmed {
            app_id,
            transaction_id,
        });
        info!(
            "Deployed '{}' as app {} on {} ({})",
            record.contract_name, app_id, network, record.explorer_url
        );

        Ok(DeploymentOutcome::Deployed(Box::new(DeploymentResult {
            record,
            interface,
            plan,
            abi_return,
        })))
    }

    async fn sign(&self, transaction: &Transaction) -> Result<Vec<Vec<u8>>, DeployError> {
        let signed = self
            .signer
            .sign_transactions(std::slice::from_ref(transaction))
            .await
            .map_err(|message| {
                DeployError::from_signer_message(message, self.stage, self.last_action.clone())
            })?;
        if signed.len() != 1 {
            return Err(DeployError::Signing {
                stage: self.stage,
                action: self.last_action.clone(),
                message: format!("Expected 1 signed transaction, got {}", signed.len()),
            });
        }
        Ok(signed)
    }

    /// Submits one signed transaction and waits for confirmation, bounded by the submit timeout.
    ///
    /// `transaction_id` is computed before signing so failures can name it; a timed out
    /// transaction may still confirm.
    async fn submit(
        &self,
        signed: &[Vec<u8>],
        transaction_id: &str,
    ) -> Result<SubmissionReceipt, DeployError> {
        let submission = self.submitter.submit(
            signed,
            self.config.network,
            self.config.max_rounds_to_wait,
        );
        match tokio::time::timeout(self.config.submit_timeout, submission).await {
            Ok(Ok(receipt)) => Ok(receipt),
            Ok(Err(message)) => Err(DeployError::Submission {
                stage: self.stage,
                action: self.last_action.clone(),
                transaction_id: transaction_id.to_string(),
                message,
            }),
            Err(_) => {
                warn!(
                    "Transaction {} timed out and may still confirm",
                    transaction_id
                );
                Err(DeployError::Submission {
                    stage: self.stage,
                    action: self.last_action.clone(),
                    transaction_id: transaction_id.to_string(),
                    message: format!(
                        "Timed out after {}s; the transaction may still confirm",
                        self.config.submit_timeout.as_secs_f64()
                    ),
                })
            }
        }
    }

    fn transition(&mut self, next: DeploymentStage, action: &str) -> Result<(), DeployError> {
        let from = self.stage;
        if !from.can_transition_to(next) {
            return Err(DeployError::validation(format!(
                "Cannot move from {} to {}",
                from, next
            )));
        }
        self.stage = next;
        self.last_action = action.to_string();
        info!("Deployment stage {} -> {} ({})", from, next, action);
        self.events.emit(DeploymentEvent::StageChanged {
            from,
            to: next,
            action: action.to_string(),
        });
        Ok(())
    }

    fn act(&mut self, action: &str) {
        self.last_action = action.to_string();
    }

    fn located(&self, error: DeployError) -> DeployError {
        error.at(self.stage, self.last_action.clone())
    }

    fn partial(&self, app_id: u64, transaction_id: Option<String>, message: String) -> DeployError {
        warn!("App {} is live but was not initialized: {}", app_id, message);
        DeployError::PartialDeployment {
            app_id,
            stage: self.stage,
            action: self.last_action.clone(),
            transaction_id,
            message,
        }
    }

    fn fail(&mut self, error: &DeployError) {
        error!("Deployment failed: {}", error);
        if self.stage.can_transition_to(DeploymentStage::Failed) {
            let action = self.last_action.clone();
            // Illegal transitions are ruled out by the check above
            let _ = self.transition(DeploymentStage::Failed, &action);
        }
    }
}
